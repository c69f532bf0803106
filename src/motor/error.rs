// Error taxonomy and the classification applied after every exchange

use tracing::warn;

use super::registers::Register;
use super::transport::{CommResult, DeviceErrorFlags, TransactionResult};

/// Errors surfaced by motor operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Ax12Error {
    #[error("Motor id {0} is reserved (valid ids are 0..=253)")]
    InvalidId(u8),

    #[error("Register {register} is read-only")]
    ReadOnlyRegister { register: Register },

    #[error("Value {value} does not fit {width}-byte register {register}", width = .register.width().bytes())]
    ValueOutOfRange { register: Register, value: u32 },

    #[error("{operation} expects a value in {min}..={max}, got {value}")]
    OutOfDomain {
        operation: &'static str,
        value: u16,
        min: u16,
        max: u16,
    },

    #[error("Communication with motor {id} failed: {kind}")]
    Communication { id: u8, kind: CommResult },

    /// The exchange completed but the motor flagged a fault. For reads, the
    /// value that came with the status packet is kept.
    #[error("Motor {id} reported: {flags}")]
    Device {
        id: u8,
        flags: DeviceErrorFlags,
        value: Option<u16>,
    },
}

impl Ax12Error {
    /// True when the error was raised locally and nothing went on the wire
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Ax12Error::InvalidId(_)
                | Ax12Error::ReadOnlyRegister { .. }
                | Ax12Error::ValueOutOfRange { .. }
                | Ax12Error::OutOfDomain { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Ax12Error>;

/// Turn a raw transaction result into success or a typed error.
///
/// Communication failures win over device errors: if the exchange itself
/// failed, the error byte is as untrustworthy as the value.
pub fn classify(id: u8, result: TransactionResult, value: Option<u16>) -> Result<()> {
    if result.comm != CommResult::Success {
        warn!("Motor {}: {}", id, result.comm);
        return Err(Ax12Error::Communication {
            id,
            kind: result.comm,
        });
    }

    if !result.device_error.is_empty() {
        warn!("Motor {}: {}", id, result.device_error);
        return Err(Ax12Error::Device {
            id,
            flags: result.device_error,
            value,
        });
    }

    Ok(())
}
