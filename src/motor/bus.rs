// Shared, serialized access to one transport
//
// The bus is half-duplex: one exchange at a time. Every motor handle holds a
// clone of the same `Bus` and takes the lock for exactly one exchange.

use std::sync::{Arc, Mutex};
use tracing::{info, warn};

use super::controller::Ax12;
use super::error::{Ax12Error, Result};
use super::transport::{CommResult, PortError, Transport};

pub struct Bus<T: Transport> {
    transport: Arc<Mutex<T>>,
}

impl<T: Transport> Clone for Bus<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
        }
    }
}

impl<T: Transport> Bus<T> {
    /// Wrap a transport that may not be open yet
    pub fn new(transport: T) -> Self {
        Self {
            transport: Arc::new(Mutex::new(transport)),
        }
    }

    /// Open the port and set the bit rate
    pub fn connect(transport: T, baudrate: u32) -> std::result::Result<Self, PortError> {
        let bus = Self::new(transport);
        bus.open()?;
        bus.set_bit_rate(baudrate)?;
        Ok(bus)
    }

    pub fn open(&self) -> std::result::Result<(), PortError> {
        self.with_port(|t| t.open())?;
        info!("Port opened");
        Ok(())
    }

    pub fn set_bit_rate(&self, rate: u32) -> std::result::Result<(), PortError> {
        self.with_port(|t| t.set_bit_rate(rate))
    }

    pub fn close(&self) {
        match self.transport.lock() {
            Ok(mut t) => t.close(),
            // Closing is still safe: the port is dropped, not framed
            Err(poisoned) => poisoned.into_inner().close(),
        }
    }

    /// Handle for the motor with the given id
    pub fn motor(&self, id: u8) -> Result<Ax12<T>> {
        Ax12::new(self.clone(), id)
    }

    fn with_port<R>(
        &self,
        f: impl FnOnce(&mut T) -> std::result::Result<R, PortError>,
    ) -> std::result::Result<R, PortError> {
        match self.transport.lock() {
            Ok(mut t) => f(&mut *t),
            Err(poisoned) => f(&mut *poisoned.into_inner()),
        }
    }

    /// Run one exchange with exclusive access to the transport.
    ///
    /// A poisoned lock means an earlier exchange panicked part way through,
    /// so the line framing can't be trusted; report the port as busy.
    pub(crate) fn transact<R>(&self, id: u8, f: impl FnOnce(&mut T) -> R) -> Result<R> {
        let mut transport = self.transport.lock().map_err(|_| {
            warn!("Bus lock poisoned, refusing exchange with motor {}", id);
            Ax12Error::Communication {
                id,
                kind: CommResult::PortBusy,
            }
        })?;
        Ok(f(&mut *transport))
    }
}
