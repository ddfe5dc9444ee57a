// LabBench - Peripheral Co-Simulation Bench
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

pub mod bus;
pub mod clock;
pub mod initiator;
pub mod machine;
pub mod memory;
pub mod peripherals;

pub use clock::SimTime;

#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("Malformed request: payload length {len}, expected 4")]
    MalformedRequest { len: usize },
    #[error("Unmapped address {0:#x}")]
    UnmappedAddress(u64),
    #[error("Transaction failed with response {0:?}")]
    Transaction(ResponseStatus),
}

pub type SimResult<T> = Result<T, SimError>;

/// Register accesses carry exactly one 32-bit word.
pub const PAYLOAD_LEN: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusCommand {
    Read,
    Write,
}

/// Transaction outcome reported back to the initiator.
///
/// `Incomplete` is the pre-dispatch default; a target that handles the
/// transaction always replaces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    #[default]
    Incomplete,
    Ok,
    AddressError,
    GenericError,
}

/// A bus request descriptor. One lives per access and is discarded by the
/// caller once the synchronous outcome has been produced.
#[derive(Debug, Clone)]
pub struct BusTransaction {
    pub command: BusCommand,
    pub address: u64,
    pub data: Vec<u8>,
    pub response: ResponseStatus,
}

impl BusTransaction {
    pub fn read(address: u64) -> Self {
        Self {
            command: BusCommand::Read,
            address,
            data: vec![0; PAYLOAD_LEN],
            response: ResponseStatus::Incomplete,
        }
    }

    pub fn write(address: u64, value: u32) -> Self {
        Self {
            command: BusCommand::Write,
            address,
            data: value.to_le_bytes().to_vec(),
            response: ResponseStatus::Incomplete,
        }
    }

    /// The payload as a little-endian word, when it is well-formed.
    pub fn value(&self) -> Option<u32> {
        let bytes: [u8; PAYLOAD_LEN] = self.data.as_slice().try_into().ok()?;
        Some(u32::from_le_bytes(bytes))
    }

    pub fn is_response_error(&self) -> bool {
        self.response != ResponseStatus::Ok
    }
}

/// Narrow capability interface a memory-mapped device exposes to the bus.
///
/// `transport` is wholly synchronous: the outcome lands on the transaction
/// before the call returns, and the access cost is annotated onto the
/// initiator's local time `delay` exactly once per successful transaction.
pub trait BusTarget: std::fmt::Debug + Send {
    fn transport(&mut self, txn: &mut BusTransaction, delay: &mut SimTime);

    fn snapshot(&self) -> serde_json::Value {
        serde_json::Value::Null
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_constructors() {
        let txn = BusTransaction::read(0x4000_0004);
        assert_eq!(txn.command, BusCommand::Read);
        assert_eq!(txn.data.len(), PAYLOAD_LEN);
        assert_eq!(txn.response, ResponseStatus::Incomplete);
        assert!(txn.is_response_error());

        let txn = BusTransaction::write(0x4000_0000, 0x1234_5678);
        assert_eq!(txn.data, vec![0x78, 0x56, 0x34, 0x12]);
        assert_eq!(txn.value(), Some(0x1234_5678));
    }

    #[test]
    fn test_value_rejects_short_payload() {
        let mut txn = BusTransaction::read(0);
        txn.data.truncate(2);
        assert_eq!(txn.value(), None);
    }
}
