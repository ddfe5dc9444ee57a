// LabBench - Peripheral Co-Simulation Bench
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::{SimError, SimResult};
use bitflags::bitflags;

pub const CTRL_REG_OFFSET: u64 = 0x00;
pub const STATUS_REG_OFFSET: u64 = 0x04;
pub const DATA_REG_OFFSET: u64 = 0x08;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ControlFlags: u32 {
        /// Arms the data-ready service. Plain level, never auto-cleared.
        const ENABLE = 1 << 0;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct StatusFlags: u32 {
        /// Fresh, unread data is available.
        const DATA_READY = 1 << 0;
    }
}

/// Guarded holder for the three architectural registers of the data-ready
/// peripheral. Zero-initialized, alive for the whole run.
///
/// STATUS is hardware-owned: software can only observe it, and the ready
/// bit moves through exactly two paths — set by [`latch_sample`] and
/// cleared by a DATA read.
///
/// [`latch_sample`]: RegisterFile::latch_sample
#[derive(Debug, Default, serde::Serialize)]
pub struct RegisterFile {
    control: u32,
    status: u32,
    data: u32,
}

impl RegisterFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a register. Reading DATA clears the ready bit; no other
    /// register has read side effects.
    pub fn read(&mut self, offset: u64) -> SimResult<u32> {
        match offset {
            CTRL_REG_OFFSET => Ok(self.control),
            STATUS_REG_OFFSET => Ok(self.status),
            DATA_REG_OFFSET => {
                let value = self.data;
                self.status &= !StatusFlags::DATA_READY.bits();
                Ok(value)
            }
            _ => Err(SimError::UnmappedAddress(offset)),
        }
    }

    /// Store into a software-writable register. STATUS rejects external
    /// writes, surfaced as the same unmapped-address error kind.
    pub fn write(&mut self, offset: u64, value: u32) -> SimResult<()> {
        match offset {
            CTRL_REG_OFFSET => {
                self.control = value;
                Ok(())
            }
            DATA_REG_OFFSET => {
                self.data = value;
                Ok(())
            }
            _ => Err(SimError::UnmappedAddress(offset)),
        }
    }

    /// Hardware-side store: the fresh sample and the ready bit land
    /// together. This path never clears ready.
    pub fn latch_sample(&mut self, value: u32) {
        self.data = value;
        self.status |= StatusFlags::DATA_READY.bits();
    }

    pub fn control(&self) -> u32 {
        self.control
    }

    pub fn status(&self) -> u32 {
        self.status
    }

    pub fn data_ready(&self) -> bool {
        StatusFlags::from_bits_truncate(self.status).contains(StatusFlags::DATA_READY)
    }
}
