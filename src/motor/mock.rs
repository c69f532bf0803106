// In-memory transport for tests: a 256-byte register file that echoes writes

use std::collections::VecDeque;

use super::registers::Width;
use super::transport::{CommResult, PortError, TransactionResult, Transport};

pub(crate) struct MockTransport {
    pub memory: [u8; 256],
    pub open: bool,
    pub bit_rate: Option<u32>,
    /// Number of register exchanges performed
    pub calls: usize,
    /// Results handed out before falling back to success
    pub script: VecDeque<TransactionResult>,
    /// (id, address, width) of every exchange, in order
    pub log: Vec<(u8, u8, Width)>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            memory: [0; 256],
            open: false,
            bit_rate: None,
            calls: 0,
            script: VecDeque::new(),
            log: Vec::new(),
        }
    }

    /// Preload a register value as the motor would report it
    pub fn poke(&mut self, address: u8, width: Width, value: u16) {
        let [lo, hi] = value.to_le_bytes();
        self.memory[address as usize] = lo;
        if width == Width::Word {
            self.memory[address as usize + 1] = hi;
        }
    }

    pub fn peek(&self, address: u8, width: Width) -> u16 {
        let lo = self.memory[address as usize];
        match width {
            Width::Byte => lo as u16,
            Width::Word => u16::from_le_bytes([lo, self.memory[address as usize + 1]]),
        }
    }

    fn next_result(&mut self, id: u8, address: u8, width: Width) -> TransactionResult {
        self.calls += 1;
        self.log.push((id, address, width));
        self.script
            .pop_front()
            .unwrap_or_else(TransactionResult::success)
    }
}

impl Transport for MockTransport {
    fn open(&mut self) -> Result<(), PortError> {
        self.open = true;
        Ok(())
    }

    fn set_bit_rate(&mut self, rate: u32) -> Result<(), PortError> {
        self.bit_rate = Some(rate);
        Ok(())
    }

    fn close(&mut self) {
        self.open = false;
    }

    fn write_bytes(&mut self, id: u8, address: u8, width: Width, value: u16) -> TransactionResult {
        let result = self.next_result(id, address, width);
        if result.comm == CommResult::Success {
            self.poke(address, width, value);
        }
        result
    }

    fn read_bytes(&mut self, id: u8, address: u8, width: Width) -> (u16, TransactionResult) {
        let result = self.next_result(id, address, width);
        (self.peek(address, width), result)
    }
}
