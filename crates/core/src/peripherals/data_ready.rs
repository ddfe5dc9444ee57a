// LabBench - Peripheral Co-Simulation Bench
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::clock::SimTime;
use crate::peripherals::registers::{
    ControlFlags, RegisterFile, CTRL_REG_OFFSET, DATA_REG_OFFSET,
};
use crate::peripherals::service::DataReadyService;
use crate::peripherals::trigger::Trigger;
use crate::{BusCommand, BusTarget, BusTransaction, ResponseStatus, SimError, SimResult, PAYLOAD_LEN};
use labbench_config::TimingProfile;
use std::sync::{Arc, Mutex};

/// Address window decoded by the model. Matches the original register map:
/// 0x00 CTRL, 0x04 STATUS, 0x08 DATA.
const OFFSET_MASK: u64 = 0xFF;

/// Transaction-handling front half of the data-ready peripheral.
///
/// Register state is shared with a [`DataReadyService`] that produces a
/// sample some time after software arms the device; the mutex keeps the
/// handler's stores and the service's data+ready latch serialized.
#[derive(Debug)]
pub struct DataReadyModel {
    regs: Arc<Mutex<RegisterFile>>,
    trigger: Trigger,
    access_cost: SimTime,
}

impl DataReadyModel {
    /// Build the model together with its service half.
    pub fn new(timing: &TimingProfile) -> (Self, DataReadyService) {
        let regs = Arc::new(Mutex::new(RegisterFile::new()));
        let trigger = Trigger::new();
        let service = DataReadyService::new(
            Arc::clone(&regs),
            trigger.clone(),
            SimTime::from_us(timing.service_delay_us),
            timing.seed,
        );
        let model = Self {
            regs,
            trigger,
            access_cost: SimTime::from_ns(timing.access_cost_ns),
        };
        (model, service)
    }

    /// Validate and apply one transaction against the register file.
    /// Failure paths leave the registers and the trigger untouched.
    fn handle(&mut self, txn: &mut BusTransaction) -> SimResult<()> {
        if txn.data.len() != PAYLOAD_LEN {
            return Err(SimError::MalformedRequest {
                len: txn.data.len(),
            });
        }

        let offset = txn.address & OFFSET_MASK;
        // Poisoning can only come from a panicked holder; the register
        // file is still consistent, so recover the guard.
        let mut regs = self.regs.lock().unwrap_or_else(|e| e.into_inner());

        match txn.command {
            BusCommand::Read => {
                let value = regs.read(offset)?;
                txn.data.copy_from_slice(&value.to_le_bytes());
            }
            BusCommand::Write => {
                let value =
                    u32::from_le_bytes([txn.data[0], txn.data[1], txn.data[2], txn.data[3]]);
                regs.write(offset, value)?;
                match offset {
                    CTRL_REG_OFFSET => {
                        if ControlFlags::from_bits_truncate(value).contains(ControlFlags::ENABLE) {
                            self.trigger.raise();
                        }
                    }
                    DATA_REG_OFFSET => {
                        tracing::debug!(value = format_args!("{value:#x}"), "Data register written");
                    }
                    _ => {}
                }
            }
        }

        Ok(())
    }
}

impl BusTarget for DataReadyModel {
    fn transport(&mut self, txn: &mut BusTransaction, delay: &mut SimTime) {
        txn.response = match self.handle(txn) {
            Ok(()) => {
                *delay += self.access_cost;
                ResponseStatus::Ok
            }
            Err(SimError::MalformedRequest { len }) => {
                tracing::warn!(len, "Rejected transaction with malformed payload");
                ResponseStatus::GenericError
            }
            Err(_) => ResponseStatus::AddressError,
        };
    }

    fn snapshot(&self) -> serde_json::Value {
        match self.regs.lock() {
            Ok(regs) => serde_json::to_value(&*regs).unwrap_or(serde_json::Value::Null),
            Err(_) => serde_json::Value::Null,
        }
    }
}
