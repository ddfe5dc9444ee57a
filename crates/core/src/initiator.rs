// LabBench - Peripheral Co-Simulation Bench
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::clock::SimTime;
use crate::machine::Machine;
use crate::{BusTransaction, SimError, SimResult};

/// Bus master driving the bench: builds 4-byte register transactions
/// against the machine and escalates failed outcomes to the caller.
pub struct Initiator<'a> {
    machine: &'a mut Machine,
}

impl<'a> Initiator<'a> {
    pub fn new(machine: &'a mut Machine) -> Self {
        Self { machine }
    }

    pub fn write_register(&mut self, address: u64, value: u32) -> SimResult<()> {
        let mut txn = BusTransaction::write(address, value);
        self.machine.transport(&mut txn);
        if txn.is_response_error() {
            tracing::error!(
                address = format_args!("{address:#x}"),
                response = ?txn.response,
                "Write transaction failed"
            );
            return Err(SimError::Transaction(txn.response));
        }
        Ok(())
    }

    pub fn read_register(&mut self, address: u64) -> SimResult<u32> {
        let mut txn = BusTransaction::read(address);
        self.machine.transport(&mut txn);
        if txn.is_response_error() {
            tracing::error!(
                address = format_args!("{address:#x}"),
                response = ?txn.response,
                "Read transaction failed"
            );
            return Err(SimError::Transaction(txn.response));
        }
        txn.value()
            .ok_or(SimError::MalformedRequest { len: txn.data.len() })
    }

    /// Let simulated time pass between accesses.
    pub fn wait(&mut self, duration: SimTime) {
        self.machine.advance(duration);
    }

    pub fn now(&self) -> SimTime {
        self.machine.now()
    }
}
