// LabBench - Peripheral Co-Simulation Bench
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use clap::Parser;
use labbench_config::{BenchScript, BenchStep, SystemManifest};
use labbench_core::clock::SimTime;
use labbench_core::initiator::Initiator;
use labbench_core::machine::Machine;
use labbench_core::SimError;
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

const EXIT_PASS: u8 = 0;
const EXIT_ASSERT_FAIL: u8 = 1;
const EXIT_CONFIG_ERROR: u8 = 2;
const EXIT_RUNTIME_ERROR: u8 = 3;

const REPORT_SCHEMA_VERSION: &str = "1.0";

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "LabBench Peripheral Co-Simulation Bench",
    long_about = None
)]
struct Cli {
    /// Path to the system manifest (YAML); defaults to the built-in bench board
    #[arg(short, long)]
    system: Option<PathBuf>,

    /// Path to a bench script (YAML); defaults to the built-in data-ready sequence
    #[arg(long)]
    script: Option<PathBuf>,

    /// Write the run report (JSON) to this file instead of stdout
    #[arg(long)]
    report: Option<PathBuf>,

    /// Enable verbose tracing
    #[arg(short, long)]
    trace: bool,
}

#[derive(Debug, Serialize)]
struct StepFailure {
    step: usize,
    detail: String,
}

#[derive(Debug, Serialize)]
struct RunReport {
    schema_version: &'static str,
    system: String,
    script: String,
    steps_executed: usize,
    failures: Vec<StepFailure>,
    service_cycles: u64,
    finished_at_ns: u64,
    targets: serde_json::Value,
}

/// The original bench sequence: arm the device, observe ready still clear,
/// wait out the service delay, collect the sample and watch the ready bit
/// fall on the data read.
fn default_script(manifest: &SystemManifest) -> BenchScript {
    let base = manifest
        .peripherals
        .first()
        .map(|p| p.base_address)
        .unwrap_or(0x4000_0000);

    BenchScript {
        schema_version: "1.0".to_string(),
        name: "data-ready-cycle".to_string(),
        steps: vec![
            BenchStep::Write {
                address: base,
                value: 0x1,
            },
            BenchStep::Read {
                address: base + 0x4,
                expect: Some(0x0),
                mask: Some(0x1),
            },
            BenchStep::Advance { duration_us: 200 },
            BenchStep::Read {
                address: base + 0x4,
                expect: Some(0x1),
                mask: Some(0x1),
            },
            BenchStep::Read {
                address: base + 0x8,
                expect: None,
                mask: None,
            },
            BenchStep::Read {
                address: base + 0x4,
                expect: Some(0x0),
                mask: Some(0x1),
            },
        ],
    }
}

fn run_script(
    machine: &mut Machine,
    script: &BenchScript,
) -> Result<Vec<StepFailure>, SimError> {
    let mut failures = Vec::new();
    let mut tb = Initiator::new(machine);

    for (idx, step) in script.steps.iter().enumerate() {
        match step {
            BenchStep::Write { address, value } => {
                info!(
                    step = idx,
                    address = format_args!("{address:#x}"),
                    value = format_args!("{value:#x}"),
                    "Write"
                );
                tb.write_register(*address, *value)?;
            }
            BenchStep::Read {
                address,
                expect,
                mask,
            } => {
                let value = tb.read_register(*address)?;
                info!(
                    step = idx,
                    address = format_args!("{address:#x}"),
                    value = format_args!("{value:#x}"),
                    "Read"
                );
                if let Some(expected) = expect {
                    let mask = mask.unwrap_or(u32::MAX);
                    if value & mask != expected & mask {
                        failures.push(StepFailure {
                            step: idx,
                            detail: format!(
                                "read {address:#x}: got {value:#x}, expected {expected:#x} (mask {mask:#x})"
                            ),
                        });
                    }
                }
            }
            BenchStep::Advance { duration_us } => {
                tb.wait(SimTime::from_us(*duration_us));
                info!(step = idx, now = %tb.now(), "Advance");
            }
        }
    }

    Ok(failures)
}

fn emit_report(report: &RunReport, path: Option<&PathBuf>) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    match path {
        Some(p) => std::fs::write(p, json)?,
        None => println!("{json}"),
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Keep stdout clean for the JSON report.
    if cli.trace {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_writer(std::io::stderr)
            .init();
    }

    let manifest = match &cli.system {
        Some(path) => match SystemManifest::from_file(path) {
            Ok(m) => m,
            Err(e) => {
                error!("Failed to load system manifest: {e:#}");
                return ExitCode::from(EXIT_CONFIG_ERROR);
            }
        },
        None => SystemManifest::default_bench(),
    };

    let script = match &cli.script {
        Some(path) => match BenchScript::from_file(path) {
            Ok(s) => s,
            Err(e) => {
                error!("Failed to load bench script: {e:#}");
                return ExitCode::from(EXIT_CONFIG_ERROR);
            }
        },
        None => default_script(&manifest),
    };

    let mut machine = match Machine::from_config(&manifest) {
        Ok(m) => m,
        Err(e) => {
            error!("Failed to build machine: {e:#}");
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };

    let failures = match run_script(&mut machine, &script) {
        Ok(failures) => failures,
        Err(e) => {
            error!("Bench run aborted: {e}");
            return ExitCode::from(EXIT_RUNTIME_ERROR);
        }
    };

    let report = RunReport {
        schema_version: REPORT_SCHEMA_VERSION,
        system: manifest.name.clone(),
        script: script.name.clone(),
        steps_executed: script.steps.len(),
        failures,
        service_cycles: machine.service_cycles(),
        finished_at_ns: machine.now().as_ns(),
        targets: machine.target_snapshots(),
    };

    if let Err(e) = emit_report(&report, cli.report.as_ref()) {
        error!("Failed to emit run report: {e:#}");
        return ExitCode::from(EXIT_RUNTIME_ERROR);
    }

    if report.failures.is_empty() {
        info!(
            cycles = report.service_cycles,
            finished_at = format_args!("{} ns", report.finished_at_ns),
            "Bench passed"
        );
        ExitCode::from(EXIT_PASS)
    } else {
        error!(failures = report.failures.len(), "Bench failed");
        ExitCode::from(EXIT_ASSERT_FAIL)
    }
}
