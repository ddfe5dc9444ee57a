// LabBench - Peripheral Co-Simulation Bench
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::clock::SimTime;
use crate::memory::LinearMemory;
use crate::{BusCommand, BusTarget, BusTransaction, ResponseStatus, PAYLOAD_LEN};

/// A device mapped into an address window on the bus.
#[derive(Debug)]
pub struct TargetEntry {
    pub name: String,
    pub base: u64,
    pub size: u64,
    pub dev: Box<dyn BusTarget>,
}

/// System interconnect: flat flash and ram windows plus the mapped
/// transaction targets.
#[derive(Debug)]
pub struct SystemBus {
    pub flash: LinearMemory,
    pub ram: LinearMemory,
    pub targets: Vec<TargetEntry>,
}

impl Default for SystemBus {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemBus {
    /// Default board map: 256 KiB flash at 0x0800_0000, 64 KiB sram at
    /// 0x2000_0000, peripherals attached separately.
    pub fn new() -> Self {
        Self {
            flash: LinearMemory::new(256 * 1024, 0x0800_0000),
            ram: LinearMemory::new(64 * 1024, 0x2000_0000),
            targets: Vec::new(),
        }
    }

    pub fn with_memories(flash: LinearMemory, ram: LinearMemory) -> Self {
        Self {
            flash,
            ram,
            targets: Vec::new(),
        }
    }

    pub fn attach(&mut self, entry: TargetEntry) {
        tracing::debug!(
            name = entry.name.as_str(),
            base = format_args!("{:#x}", entry.base),
            size = entry.size,
            "Attached bus target"
        );
        self.targets.push(entry);
    }

    /// Route a transaction to the owning window.
    ///
    /// Mapped targets get the transaction as-is; flash/ram honor plain
    /// word loads and stores under the same 4-byte contract. Addresses
    /// outside every window come back as `AddressError`.
    pub fn transport(&mut self, txn: &mut BusTransaction, delay: &mut SimTime) {
        for t in &mut self.targets {
            if txn.address >= t.base && txn.address < t.base + t.size {
                t.dev.transport(txn, delay);
                return;
            }
        }

        if txn.data.len() != PAYLOAD_LEN {
            txn.response = ResponseStatus::GenericError;
            return;
        }

        match txn.command {
            BusCommand::Read => {
                let value = self
                    .ram
                    .read_u32(txn.address)
                    .or_else(|| self.flash.read_u32(txn.address));
                match value {
                    Some(v) => {
                        txn.data.copy_from_slice(&v.to_le_bytes());
                        txn.response = ResponseStatus::Ok;
                    }
                    None => txn.response = ResponseStatus::AddressError,
                }
            }
            BusCommand::Write => {
                let value =
                    u32::from_le_bytes([txn.data[0], txn.data[1], txn.data[2], txn.data[3]]);
                if self.ram.write_u32(txn.address, value) || self.flash.write_u32(txn.address, value)
                {
                    txn.response = ResponseStatus::Ok;
                } else {
                    txn.response = ResponseStatus::AddressError;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::peripherals::data_ready::DataReadyModel;
    use labbench_config::TimingProfile;

    fn bus_with_device() -> SystemBus {
        let (model, _service) = DataReadyModel::new(&TimingProfile::default());
        let mut bus = SystemBus::new();
        bus.attach(TargetEntry {
            name: "dev0".to_string(),
            base: 0x4000_0000,
            size: 0x1000,
            dev: Box::new(model),
        });
        bus
    }

    #[test]
    fn test_routes_to_mapped_target() {
        let mut bus = bus_with_device();
        let mut delay = SimTime::ZERO;

        let mut txn = BusTransaction::write(0x4000_0000, 0x1);
        bus.transport(&mut txn, &mut delay);
        assert_eq!(txn.response, ResponseStatus::Ok);
        assert_eq!(delay, SimTime::from_ns(10));

        let mut txn = BusTransaction::read(0x4000_0000);
        bus.transport(&mut txn, &mut delay);
        assert_eq!(txn.value(), Some(0x1));
    }

    #[test]
    fn test_ram_and_flash_word_access() {
        let mut bus = bus_with_device();
        let mut delay = SimTime::ZERO;

        let mut txn = BusTransaction::write(0x2000_0000, 0xDEAD_BEEF);
        bus.transport(&mut txn, &mut delay);
        assert_eq!(txn.response, ResponseStatus::Ok);

        let mut txn = BusTransaction::read(0x2000_0000);
        bus.transport(&mut txn, &mut delay);
        assert_eq!(txn.value(), Some(0xDEAD_BEEF));

        let mut txn = BusTransaction::read(0x0800_0000);
        bus.transport(&mut txn, &mut delay);
        assert_eq!(txn.response, ResponseStatus::Ok);
        assert_eq!(txn.value(), Some(0));
    }

    #[test]
    fn test_unrouted_address_is_address_error() {
        let mut bus = bus_with_device();
        let mut delay = SimTime::ZERO;

        let mut txn = BusTransaction::read(0x6000_0000);
        bus.transport(&mut txn, &mut delay);
        assert_eq!(txn.response, ResponseStatus::AddressError);
        assert_eq!(delay, SimTime::ZERO);
    }

    #[test]
    fn test_memory_rejects_short_payload() {
        let mut bus = bus_with_device();
        let mut delay = SimTime::ZERO;

        let mut txn = BusTransaction::read(0x2000_0000);
        txn.data.truncate(1);
        bus.transport(&mut txn, &mut delay);
        assert_eq!(txn.response, ResponseStatus::GenericError);
    }
}
