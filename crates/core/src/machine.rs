// LabBench - Peripheral Co-Simulation Bench
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::bus::{SystemBus, TargetEntry};
use crate::clock::SimTime;
use crate::memory::LinearMemory;
use crate::peripherals::data_ready::DataReadyModel;
use crate::peripherals::service::DataReadyService;
use crate::{BusTransaction, ResponseStatus};
use anyhow::Context;
use labbench_config::{parse_size, SystemManifest};

/// Default window size for peripherals that do not specify one.
const DEFAULT_TARGET_WINDOW: u64 = 0x1000;

/// A bench machine: the bus, the device service loops and the virtual
/// clock, advanced as a single discrete-event timeline.
pub struct Machine {
    pub bus: SystemBus,
    services: Vec<DataReadyService>,
    now: SimTime,
}

impl Machine {
    pub fn new(bus: SystemBus) -> Self {
        Self {
            bus,
            services: Vec::new(),
            now: SimTime::ZERO,
        }
    }

    /// Build a machine from a system manifest: memories from the declared
    /// ranges, one data-ready device per peripheral entry.
    pub fn from_config(manifest: &SystemManifest) -> anyhow::Result<Self> {
        manifest.validate()?;

        let flash_size = parse_size(&manifest.flash.size).context("Invalid flash size")?;
        let ram_size = parse_size(&manifest.ram.size).context("Invalid ram size")?;
        let bus = SystemBus::with_memories(
            LinearMemory::new(flash_size as usize, manifest.flash.base),
            LinearMemory::new(ram_size as usize, manifest.ram.base),
        );

        let mut machine = Self::new(bus);
        for p_cfg in &manifest.peripherals {
            let size = match &p_cfg.size {
                Some(size) => parse_size(size)
                    .with_context(|| format!("Invalid window size for peripheral '{}'", p_cfg.id))?,
                None => DEFAULT_TARGET_WINDOW,
            };

            let (model, service) = DataReadyModel::new(&p_cfg.timing);
            machine.bus.attach(TargetEntry {
                name: p_cfg.id.clone(),
                base: p_cfg.base_address,
                size,
                dev: Box::new(model),
            });
            machine.register_service(service);
        }

        Ok(machine)
    }

    pub fn register_service(&mut self, service: DataReadyService) {
        self.services.push(service);
    }

    pub fn now(&self) -> SimTime {
        self.now
    }

    /// Issue one transaction against the bus.
    ///
    /// The annotated access cost lands on the machine clock once the
    /// transaction completes; failed transactions leave the clock
    /// untouched. Services then observe the new time, so a trigger raised
    /// by the write is consumed at this same timestamp.
    pub fn transport(&mut self, txn: &mut BusTransaction) {
        let mut delay = SimTime::ZERO;
        self.bus.transport(txn, &mut delay);
        if txn.response == ResponseStatus::Ok {
            self.now += delay;
        }
        for service in &mut self.services {
            service.poll(self.now);
        }
    }

    /// Advance simulated time up to `target`, hopping from service
    /// deadline to service deadline so every timed action lands at its
    /// exact timestamp.
    pub fn run_until(&mut self, target: SimTime) {
        loop {
            let now = self.now;
            let next = self
                .services
                .iter_mut()
                .filter_map(|s| s.poll(now))
                .min();
            match next {
                Some(deadline) if deadline <= target => self.now = deadline,
                _ => break,
            }
        }
        if target > self.now {
            self.now = target;
        }
    }

    pub fn advance(&mut self, duration: SimTime) {
        self.run_until(self.now + duration);
    }

    /// Completed trigger-to-ready cycles across all services.
    pub fn service_cycles(&self) -> u64 {
        self.services.iter().map(|s| s.cycles_completed()).sum()
    }

    /// Register-level snapshot of every mapped target, keyed by name.
    pub fn target_snapshots(&self) -> serde_json::Value {
        let map: serde_json::Map<String, serde_json::Value> = self
            .bus
            .targets
            .iter()
            .map(|t| (t.name.clone(), t.dev.snapshot()))
            .collect();
        serde_json::Value::Object(map)
    }
}
