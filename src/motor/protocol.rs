// Dynamixel Protocol 1.0 serial transport
//
// Instruction packet: [0xFF, 0xFF, ID, Length, Instruction, Params..., Checksum]
// Status packet:      [0xFF, 0xFF, ID, Length, Error, Params..., Checksum]
// Length counts everything after itself, checksum included.

use serialport::{self, ClearBuffer, SerialPort};
use std::io::{self, Read, Write};
use std::time::Duration;
use tracing::{debug, info};

use super::registers::Width;
use super::transport::{CommResult, PortError, TransactionResult, Transport};
use crate::config::{BusConfig, DEFAULT_BAUDRATE, DEFAULT_TIMEOUT_MS};

/// Packet header bytes
const HEADER: [u8; 2] = [0xFF, 0xFF];

/// Bit rates the AX-12 can be configured for
const SUPPORTED_BAUDRATES: [u32; 7] = [9_600, 19_200, 57_142, 115_200, 200_000, 500_000, 1_000_000];

/// Instructions used by register access
#[repr(u8)]
#[derive(Debug, Clone, Copy)]
pub enum Instruction {
    Read = 0x02,
    Write = 0x03,
}

/// Checksum over id, length, instruction/error and params
fn checksum(data: &[u8]) -> u8 {
    let sum: u16 = data.iter().map(|&b| b as u16).sum();
    (!sum & 0xFF) as u8
}

/// Build a packet with header and checksum
fn build_packet(id: u8, instruction: Instruction, params: &[u8]) -> Vec<u8> {
    let length = (params.len() + 2) as u8; // params + instruction + checksum
    let mut packet = Vec::with_capacity(6 + params.len());

    packet.extend_from_slice(&HEADER);
    packet.push(id);
    packet.push(length);
    packet.push(instruction as u8);
    packet.extend_from_slice(params);
    packet.push(checksum(&packet[2..]));

    packet
}

fn write_params(address: u8, width: Width, value: u16) -> Vec<u8> {
    let [lo, hi] = value.to_le_bytes();
    match width {
        Width::Byte => vec![address, lo],
        Width::Word => vec![address, lo, hi],
    }
}

/// Parsed status packet
#[derive(Debug, Clone, PartialEq, Eq)]
struct Status {
    error: u8,
    params: Vec<u8>,
}

fn map_read_error(err: io::Error) -> CommResult {
    match err.kind() {
        io::ErrorKind::TimedOut | io::ErrorKind::UnexpectedEof | io::ErrorKind::WouldBlock => {
            CommResult::RxTimeout
        }
        _ => CommResult::RxFail,
    }
}

/// Read one status packet. Any framing problem is reported as `RxCorrupt`.
fn read_status<R: Read>(port: &mut R, expected_id: u8) -> Result<Status, CommResult> {
    let mut head = [0u8; 4];
    port.read_exact(&mut head).map_err(map_read_error)?;

    if head[..2] != HEADER {
        debug!("Invalid header: {:02X?}", &head[..2]);
        return Err(CommResult::RxCorrupt);
    }

    let id = head[2];
    let length = head[3] as usize;
    if id != expected_id {
        debug!("ID mismatch: expected {}, got {}", expected_id, id);
        return Err(CommResult::RxCorrupt);
    }
    if length < 2 {
        debug!("Status packet too short: length {}", length);
        return Err(CommResult::RxCorrupt);
    }

    // error + params + checksum
    let mut remaining = vec![0u8; length];
    port.read_exact(&mut remaining).map_err(map_read_error)?;

    let (body, received) = remaining.split_at(length - 1);
    let mut checksum_data = vec![id, length as u8];
    checksum_data.extend_from_slice(body);
    if checksum(&checksum_data) != received[0] {
        debug!("Checksum mismatch for motor {}", id);
        return Err(CommResult::RxCorrupt);
    }

    Ok(Status {
        error: body[0],
        params: body[1..].to_vec(),
    })
}

/// Send one instruction packet and wait for its status packet
fn exchange<P: Read + Write>(
    port: &mut P,
    id: u8,
    instruction: Instruction,
    params: &[u8],
) -> Result<Status, CommResult> {
    let packet = build_packet(id, instruction, params);
    port.write_all(&packet)
        .and_then(|_| port.flush())
        .map_err(|e| {
            debug!("Write to motor {} failed: {}", id, e);
            CommResult::TxFail
        })?;
    read_status(port, id)
}

fn write_exchange<P: Read + Write>(
    port: &mut P,
    id: u8,
    address: u8,
    width: Width,
    value: u16,
) -> TransactionResult {
    let params = write_params(address, width, value);
    match exchange(port, id, Instruction::Write, &params) {
        Ok(status) => TransactionResult::with_device_error(status.error),
        Err(comm) => TransactionResult::comm_failure(comm),
    }
}

fn read_exchange<P: Read + Write>(
    port: &mut P,
    id: u8,
    address: u8,
    width: Width,
) -> (u16, TransactionResult) {
    let params = [address, width.bytes()];
    let status = match exchange(port, id, Instruction::Read, &params) {
        Ok(status) => status,
        Err(comm) => return (0, TransactionResult::comm_failure(comm)),
    };

    let value = match (width, status.params.as_slice()) {
        (Width::Byte, [lo, ..]) => *lo as u16,
        (Width::Word, [lo, hi, ..]) => u16::from_le_bytes([*lo, *hi]),
        _ => {
            debug!(
                "Motor {}: expected {} data bytes, got {}",
                id,
                width.bytes(),
                status.params.len()
            );
            return (0, TransactionResult::comm_failure(CommResult::RxCorrupt));
        }
    };
    (value, TransactionResult::with_device_error(status.error))
}

/// Transport over a USB/TTL serial adapter
pub struct SerialTransport {
    port_name: String,
    baudrate: u32,
    timeout: Duration,
    port: Option<Box<dyn SerialPort>>,
}

impl SerialTransport {
    pub fn new(port_name: &str) -> Self {
        Self {
            port_name: port_name.to_string(),
            baudrate: DEFAULT_BAUDRATE,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            port: None,
        }
    }

    pub fn from_config(config: &BusConfig) -> Self {
        Self {
            port_name: config.port.clone(),
            baudrate: config.baudrate,
            timeout: Duration::from_millis(config.timeout_ms),
            port: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.port.is_some()
    }

    /// Get the port, dropping any stale bytes left from an earlier exchange
    fn ready_port(&mut self) -> Result<&mut Box<dyn SerialPort>, CommResult> {
        let port = self.port.as_mut().ok_or(CommResult::NotAvailable)?;
        if let Err(e) = port.clear(ClearBuffer::Input) {
            debug!("Failed to clear input buffer: {}", e);
            return Err(CommResult::PortBusy);
        }
        Ok(port)
    }
}

impl Transport for SerialTransport {
    fn open(&mut self) -> Result<(), PortError> {
        info!("Opening {} at {} bps", self.port_name, self.baudrate);
        let port = serialport::new(&self.port_name, self.baudrate)
            .timeout(self.timeout)
            .open()?;
        self.port = Some(port);
        Ok(())
    }

    fn set_bit_rate(&mut self, rate: u32) -> Result<(), PortError> {
        if !SUPPORTED_BAUDRATES.contains(&rate) {
            return Err(PortError::UnsupportedBitRate(rate));
        }
        let port = self
            .port
            .as_mut()
            .ok_or_else(|| PortError::NotOpen(self.port_name.clone()))?;
        port.set_baud_rate(rate)?;
        self.baudrate = rate;
        info!("Bit rate set to {}", rate);
        Ok(())
    }

    fn close(&mut self) {
        if self.port.take().is_some() {
            info!("Closed {}", self.port_name);
        }
    }

    fn write_bytes(&mut self, id: u8, address: u8, width: Width, value: u16) -> TransactionResult {
        match self.ready_port() {
            Ok(port) => write_exchange(port, id, address, width, value),
            Err(comm) => TransactionResult::comm_failure(comm),
        }
    }

    fn read_bytes(&mut self, id: u8, address: u8, width: Width) -> (u16, TransactionResult) {
        match self.ready_port() {
            Ok(port) => read_exchange(port, id, address, width),
            Err(comm) => (0, TransactionResult::comm_failure(comm)),
        }
    }
}
