// LabBench - Peripheral Co-Simulation Bench
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default schema version for YAML configs
fn default_schema_version() -> String {
    "1.0".to_string()
}

fn default_access_cost_ns() -> u64 {
    10
}

fn default_service_delay_us() -> u64 {
    100
}

fn default_seed() -> u32 {
    1
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MemoryRange {
    pub base: u64,
    pub size: String, // e.g. "256KB"
}

/// Timing constants for a data-ready peripheral instance.
///
/// `access_cost_ns` is the synchronous bus access latency annotated per
/// completed transaction; `service_delay_us` is how long the device takes
/// to produce a sample after being armed.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TimingProfile {
    #[serde(default = "default_access_cost_ns")]
    pub access_cost_ns: u64,
    #[serde(default = "default_service_delay_us")]
    pub service_delay_us: u64,
    #[serde(default = "default_seed")]
    pub seed: u32,
}

impl Default for TimingProfile {
    fn default() -> Self {
        Self {
            access_cost_ns: default_access_cost_ns(),
            service_delay_us: default_service_delay_us(),
            seed: default_seed(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PeripheralConfig {
    pub id: String,
    pub base_address: u64,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub timing: TimingProfile,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SystemManifest {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
    pub name: String,
    pub flash: MemoryRange,
    pub ram: MemoryRange,
    pub peripherals: Vec<PeripheralConfig>,
}

impl SystemManifest {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let f = std::fs::File::open(&path)
            .with_context(|| format!("Failed to open system manifest at {:?}", path.as_ref()))?;
        let manifest: Self =
            serde_yaml::from_reader(f).context("Failed to parse System Manifest YAML")?;
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn validate(&self) -> Result<()> {
        if self.schema_version != "1.0" {
            anyhow::bail!(
                "Unsupported schema_version '{}'. Supported versions: '1.0'",
                self.schema_version
            );
        }

        parse_size(&self.flash.size).context("Invalid flash size")?;
        parse_size(&self.ram.size).context("Invalid ram size")?;

        for p in &self.peripherals {
            if p.id.trim().is_empty() {
                anyhow::bail!("Peripheral id cannot be empty");
            }
        }

        Ok(())
    }

    /// The default bench board: Cortex-M style memory map with one
    /// data-ready peripheral on the peripheral bus.
    pub fn default_bench() -> Self {
        Self {
            schema_version: default_schema_version(),
            name: "labbench-default".to_string(),
            flash: MemoryRange {
                base: 0x0800_0000,
                size: "256KB".to_string(),
            },
            ram: MemoryRange {
                base: 0x2000_0000,
                size: "64KB".to_string(),
            },
            peripherals: vec![PeripheralConfig {
                id: "dev0".to_string(),
                base_address: 0x4000_0000,
                size: Some("4KB".to_string()),
                timing: TimingProfile::default(),
            }],
        }
    }
}

/// One scripted initiator action against the machine.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum BenchStep {
    Write {
        address: u64,
        value: u32,
    },
    Read {
        address: u64,
        #[serde(default)]
        expect: Option<u32>,
        #[serde(default)]
        mask: Option<u32>,
    },
    Advance {
        duration_us: u64,
    },
}

/// Deterministic, CI-friendly bench scenario replayed by the runner.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct BenchScript {
    pub schema_version: String,
    pub name: String,
    #[serde(with = "serde_yaml::with::singleton_map_recursive")]
    pub steps: Vec<BenchStep>,
}

impl BenchScript {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read bench script at {:?}", path.as_ref()))?;
        let script: Self =
            serde_yaml::from_str(&contents).context("Failed to parse Bench Script YAML")?;
        script.validate()?;
        Ok(script)
    }

    pub fn validate(&self) -> Result<()> {
        if self.schema_version != "1.0" {
            anyhow::bail!(
                "Unsupported schema_version '{}'. Supported versions: '1.0'",
                self.schema_version
            );
        }

        if self.steps.is_empty() {
            anyhow::bail!("Bench script must contain at least one step");
        }

        Ok(())
    }
}

pub fn parse_size(size_str: &str) -> Result<u64> {
    use human_size::{Byte, Size, SpecificSize};
    let s: Size = size_str
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid size format: {}", e))?;
    let bytes: SpecificSize<Byte> = s.into();
    Ok(bytes.value() as u64)
}
