// Motor-level operations for one AX-12 on the bus
//
// Each operation is exactly one register exchange through `read_register`
// or `write_register`, and both of those go through `classify`.

use serde::Serialize;
use tracing::debug;

use super::bus::Bus;
use super::error::{classify, Ax12Error, Result};
use super::registers::Register;
use super::transport::Transport;
use crate::config::{MAX_GOAL_VAL, MIN_GOAL_VAL};

/// Highest id a single motor can have; 254 is broadcast
pub const MAX_MOTOR_ID: u8 = 253;

/// Direction bit shared by present load and present speed
const DIRECTION_BIT: u16 = 0x400;
const MAGNITUDE_MASK: u16 = 0x3FF;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    CounterClockwise,
    Clockwise,
}

/// Present load as reported by the motor.
///
/// Raw values 0-1023 are load in the counter-clockwise direction, 1024-2047
/// the same scale in the clockwise direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Load {
    pub raw: u16,
    pub direction: Direction,
    pub magnitude: u16,
}

impl Load {
    pub fn from_raw(raw: u16) -> Self {
        let direction = if raw & DIRECTION_BIT != 0 {
            Direction::Clockwise
        } else {
            Direction::CounterClockwise
        };
        Self {
            raw,
            direction,
            magnitude: raw & MAGNITUDE_MASK,
        }
    }

    /// Counter-clockwise positive
    pub fn signed(&self) -> i16 {
        match self.direction {
            Direction::CounterClockwise => self.magnitude as i16,
            Direction::Clockwise => -(self.magnitude as i16),
        }
    }
}

/// Handle for one motor. Holds no state beyond its id and the shared bus.
pub struct Ax12<T: Transport> {
    id: u8,
    bus: Bus<T>,
}

impl<T: Transport> Clone for Ax12<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            bus: self.bus.clone(),
        }
    }
}

impl<T: Transport> Ax12<T> {
    pub fn new(bus: Bus<T>, id: u8) -> Result<Self> {
        if id > MAX_MOTOR_ID {
            return Err(Ax12Error::InvalidId(id));
        }
        Ok(Self { id, bus })
    }

    pub fn id(&self) -> u8 {
        self.id
    }

    /// Write one register. Nothing is sent if the register is read-only or
    /// the value does not fit its width.
    pub fn write_register(&self, register: Register, value: u32) -> Result<()> {
        let desc = register.descriptor();
        if !register.is_writable() {
            return Err(Ax12Error::ReadOnlyRegister { register });
        }
        if !desc.width.fits(value) {
            return Err(Ax12Error::ValueOutOfRange { register, value });
        }

        debug!("Write to motor {}: reg={}, value={}", self.id, register, value);
        let result = self.bus.transact(self.id, |t| {
            t.write_bytes(self.id, desc.address, desc.width, value as u16)
        })?;
        classify(self.id, result, None)
    }

    /// Read one register. The value is only returned once the exchange is
    /// classified as a success.
    pub fn read_register(&self, register: Register) -> Result<u16> {
        let desc = register.descriptor();
        let (value, result) = self
            .bus
            .transact(self.id, |t| t.read_bytes(self.id, desc.address, desc.width))?;
        classify(self.id, result, Some(value))?;
        debug!("Read from motor {}: reg={}, value={}", self.id, register, value);
        Ok(value)
    }

    fn write_in_domain(&self, operation: &'static str, register: Register, value: u16) -> Result<()> {
        if !(MIN_GOAL_VAL..=MAX_GOAL_VAL).contains(&value) {
            return Err(Ax12Error::OutOfDomain {
                operation,
                value,
                min: MIN_GOAL_VAL,
                max: MAX_GOAL_VAL,
            });
        }
        self.write_register(register, value as u32)
    }

    pub fn enable_torque(&self) -> Result<()> {
        self.write_register(Register::TorqueEnable, 1)
    }

    pub fn disable_torque(&self) -> Result<()> {
        self.write_register(Register::TorqueEnable, 0)
    }

    pub fn torque_enabled(&self) -> Result<bool> {
        Ok(self.read_register(Register::TorqueEnable)? != 0)
    }

    /// Write goal position in ticks, 0..=1023 (0-300 degrees)
    pub fn set_position(&self, position: u16) -> Result<()> {
        self.write_in_domain("set_position", Register::GoalPosition, position)
    }

    /// Read present position in ticks
    pub fn get_position(&self) -> Result<u16> {
        self.read_register(Register::PresentPosition)
    }

    /// Set the speed used to reach the goal position, 0..=1023.
    /// 0 means the fastest the supply allows.
    pub fn set_moving_speed(&self, speed: u16) -> Result<()> {
        self.write_in_domain("set_moving_speed", Register::MovingSpeed, speed)
    }

    pub fn get_moving_speed(&self) -> Result<u16> {
        self.read_register(Register::MovingSpeed)
    }

    /// Raw present speed; bit 10 carries the direction as for load
    pub fn get_present_speed(&self) -> Result<u16> {
        self.read_register(Register::PresentSpeed)
    }

    pub fn led_on(&self) -> Result<()> {
        self.write_register(Register::Led, 1)
    }

    pub fn led_off(&self) -> Result<()> {
        self.write_register(Register::Led, 0)
    }

    pub fn get_load(&self) -> Result<Load> {
        self.read_register(Register::PresentLoad).map(Load::from_raw)
    }

    /// Internal temperature in degrees Celsius
    pub fn get_temperature(&self) -> Result<u16> {
        self.read_register(Register::PresentTemperature)
    }

    /// Supply voltage in volts, at the register's 0.1 V resolution
    pub fn get_voltage(&self) -> Result<f32> {
        let raw = self.read_register(Register::PresentVoltage)?;
        Ok(raw as f32 / 10.0)
    }

    pub fn set_torque_limit(&self, limit: u16) -> Result<()> {
        self.write_in_domain("set_torque_limit", Register::TorqueLimit, limit)
    }

    pub fn get_torque_limit(&self) -> Result<u16> {
        self.read_register(Register::TorqueLimit)
    }

    /// True while the motor is still travelling to its goal position
    pub fn is_moving(&self) -> Result<bool> {
        Ok(self.read_register(Register::Moving)? != 0)
    }
}
