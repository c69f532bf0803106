// AX-12 servo access over a Dynamixel Protocol 1.0 bus
//
// Provides:
// - The control table (register addresses, widths, access)
// - A transport trait and its serial implementation
// - A shared bus that serializes exchanges
// - Per-motor operations with typed, classified errors

mod bus;
mod controller;
pub mod error;
#[cfg(test)]
mod mock;
pub mod protocol;
pub mod registers;
pub mod transport;

pub use bus::Bus;
pub use controller::{Ax12, Direction, Load, MAX_MOTOR_ID};
pub use error::{Ax12Error, Result};
pub use protocol::SerialTransport;
pub use registers::{Register, RegisterDescriptor, Width};
pub use transport::{CommResult, DeviceErrorFlags, PortError, TransactionResult, Transport};
