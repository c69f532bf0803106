// Transport boundary: one addressed exchange with a motor on the bus
//
// The controller only relies on this trait. `SerialTransport` in
// `protocol.rs` is the hardware implementation.

use bitflags::bitflags;
use serde::Serialize;
use std::fmt;

use super::registers::Width;

/// Outcome of the bus exchange itself, independent of what the motor reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(rename_all = "snake_case")]
pub enum CommResult {
    #[error("transaction succeeded")]
    Success,
    #[error("port is in use")]
    PortBusy,
    #[error("failed to transmit instruction packet")]
    TxFail,
    #[error("failed to receive status packet")]
    RxFail,
    #[error("no status packet received before timeout")]
    RxTimeout,
    #[error("incorrect status packet")]
    RxCorrupt,
    #[error("port is not available")]
    NotAvailable,
}

bitflags! {
    /// Error byte of a Protocol 1.0 status packet
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DeviceErrorFlags: u8 {
        const INPUT_VOLTAGE = 0x01;
        const ANGLE_LIMIT = 0x02;
        const OVERHEATING = 0x04;
        const RANGE = 0x08;
        const CHECKSUM = 0x10;
        const OVERLOAD = 0x20;
        const INSTRUCTION = 0x40;
    }
}

const DEVICE_ERROR_TEXT: [(DeviceErrorFlags, &str); 7] = [
    (DeviceErrorFlags::INPUT_VOLTAGE, "input voltage error"),
    (DeviceErrorFlags::ANGLE_LIMIT, "angle limit error"),
    (DeviceErrorFlags::OVERHEATING, "overheat error"),
    (DeviceErrorFlags::RANGE, "out of range error"),
    (DeviceErrorFlags::CHECKSUM, "checksum error"),
    (DeviceErrorFlags::OVERLOAD, "overload error"),
    (DeviceErrorFlags::INSTRUCTION, "instruction code error"),
];

impl fmt::Display for DeviceErrorFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "no error");
        }
        let mut first = true;
        for (flag, text) in DEVICE_ERROR_TEXT {
            if self.contains(flag) {
                if !first {
                    write!(f, ", ")?;
                }
                write!(f, "{}", text)?;
                first = false;
            }
        }
        // Bit 7 is undefined on the AX-12 but may still arrive on the wire
        let unknown = self.bits() & !Self::all().bits();
        if unknown != 0 {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "unknown bits 0x{:02X}", unknown)?;
        }
        Ok(())
    }
}

impl Serialize for DeviceErrorFlags {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.bits())
    }
}

/// Raw result of one exchange, consumed by classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionResult {
    pub comm: CommResult,
    pub device_error: DeviceErrorFlags,
}

impl TransactionResult {
    pub const fn success() -> Self {
        Self {
            comm: CommResult::Success,
            device_error: DeviceErrorFlags::empty(),
        }
    }

    pub const fn comm_failure(comm: CommResult) -> Self {
        Self {
            comm,
            device_error: DeviceErrorFlags::empty(),
        }
    }

    /// Successful exchange carrying the raw error byte from the status packet
    pub const fn with_device_error(bits: u8) -> Self {
        Self {
            comm: CommResult::Success,
            device_error: DeviceErrorFlags::from_bits_retain(bits),
        }
    }
}

/// Failures while setting up the port (before any register exchange)
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("Port {0} is not open")]
    NotOpen(String),

    #[error("Unsupported bit rate: {0}")]
    UnsupportedBitRate(u32),
}

/// Byte-level access to the bus
///
/// Implementations perform exactly one request/response exchange per call
/// and never retry. Callers must hold exclusive access for the duration of
/// a call, which `Bus` guarantees.
pub trait Transport: Send {
    fn open(&mut self) -> Result<(), PortError>;

    fn set_bit_rate(&mut self, rate: u32) -> Result<(), PortError>;

    fn close(&mut self);

    fn write_bytes(&mut self, id: u8, address: u8, width: Width, value: u16) -> TransactionResult;

    /// The returned value is only meaningful when the exchange succeeded
    fn read_bytes(&mut self, id: u8, address: u8, width: Width) -> (u16, TransactionResult);
}
