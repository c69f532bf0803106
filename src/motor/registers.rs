// AX-12 control table (Dynamixel Protocol 1.0, RAM area)
//
// Every register the controller touches is listed here exactly once.
// Two-byte registers are little-endian, low byte at `address`.
// Present temperature is read as a word starting at 43; the high byte is
// the registered-instruction flag at 44.

use serde::Serialize;
use std::fmt;

/// Number of bytes a register occupies on the device
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Width {
    Byte = 1,
    Word = 2,
}

impl Width {
    /// Largest value the register can hold
    pub const fn max_value(self) -> u32 {
        match self {
            Width::Byte => 0xFF,
            Width::Word => 0xFFFF,
        }
    }

    pub const fn bytes(self) -> u8 {
        self as u8
    }

    pub const fn fits(self, value: u32) -> bool {
        value <= self.max_value()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Access {
    ReadOnly,
    ReadWrite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    Flag,
    Ticks,
    Speed,
    Torque,
    Load,
    DeciVolts,
    Celsius,
}

/// Registers used by the motor controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Register {
    TorqueEnable,
    Led,
    GoalPosition,
    MovingSpeed,
    TorqueLimit,
    PresentPosition,
    PresentSpeed,
    PresentLoad,
    PresentVoltage,
    PresentTemperature,
    Moving,
}

/// Static description of one control table entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RegisterDescriptor {
    pub name: &'static str,
    pub address: u8,
    pub width: Width,
    pub access: Access,
    pub unit: Unit,
}

const fn entry(
    name: &'static str,
    address: u8,
    width: Width,
    access: Access,
    unit: Unit,
) -> RegisterDescriptor {
    RegisterDescriptor {
        name,
        address,
        width,
        access,
        unit,
    }
}

use Access::{ReadOnly, ReadWrite};
use Width::{Byte, Word};

/// The full control table, ordered by address
pub const CONTROL_TABLE: [(Register, RegisterDescriptor); 11] = [
    (Register::TorqueEnable, entry("torque_enable", 24, Byte, ReadWrite, Unit::Flag)),
    (Register::Led, entry("led", 25, Byte, ReadWrite, Unit::Flag)),
    (Register::GoalPosition, entry("goal_position", 30, Word, ReadWrite, Unit::Ticks)),
    (Register::MovingSpeed, entry("moving_speed", 32, Word, ReadWrite, Unit::Speed)),
    (Register::TorqueLimit, entry("torque_limit", 34, Word, ReadWrite, Unit::Torque)),
    (Register::PresentPosition, entry("present_position", 36, Word, ReadOnly, Unit::Ticks)),
    (Register::PresentSpeed, entry("present_speed", 38, Word, ReadOnly, Unit::Speed)),
    (Register::PresentLoad, entry("present_load", 40, Word, ReadOnly, Unit::Load)),
    (Register::PresentVoltage, entry("present_voltage", 42, Byte, ReadOnly, Unit::DeciVolts)),
    (Register::PresentTemperature, entry("present_temperature", 43, Word, ReadOnly, Unit::Celsius)),
    (Register::Moving, entry("moving", 46, Byte, ReadOnly, Unit::Flag)),
];

impl Register {
    pub const fn descriptor(self) -> RegisterDescriptor {
        // Index matches declaration order of the enum
        CONTROL_TABLE[self as usize].1
    }

    pub const fn address(self) -> u8 {
        self.descriptor().address
    }

    pub const fn width(self) -> Width {
        self.descriptor().width
    }

    pub const fn is_writable(self) -> bool {
        matches!(self.descriptor().access, Access::ReadWrite)
    }

    /// Iterate over every register in the table
    pub fn all() -> impl Iterator<Item = Register> {
        CONTROL_TABLE.iter().map(|(reg, _)| *reg)
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let desc = self.descriptor();
        write!(f, "{} (0x{:02X})", desc.name, desc.address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_descriptor_lookup_matches_table() {
        for (reg, desc) in CONTROL_TABLE {
            assert_eq!(reg.descriptor(), desc, "table out of order at {:?}", reg);
        }
    }

    #[test]
    fn test_addresses_do_not_overlap() {
        let mut used = HashSet::new();
        for reg in Register::all() {
            let desc = reg.descriptor();
            for offset in 0..desc.width.bytes() {
                assert!(
                    used.insert(desc.address + offset),
                    "{} overlaps another register",
                    reg
                );
            }
        }
    }

    #[test]
    fn test_known_addresses() {
        assert_eq!(Register::TorqueEnable.address(), 24);
        assert_eq!(Register::GoalPosition.address(), 30);
        assert_eq!(Register::GoalPosition.width(), Width::Word);
        assert_eq!(Register::PresentVoltage.address(), 42);
        assert_eq!(Register::PresentVoltage.width(), Width::Byte);
        assert_eq!(Register::PresentTemperature.address(), 43);
        assert_eq!(Register::PresentTemperature.width(), Width::Word);
        assert_eq!(Register::Moving.address(), 46);
    }

    #[test]
    fn test_width_limits() {
        assert!(Width::Byte.fits(255));
        assert!(!Width::Byte.fits(256));
        assert!(Width::Word.fits(65535));
        assert!(!Width::Word.fits(65536));
    }

    #[test]
    fn test_present_registers_are_read_only() {
        assert!(!Register::PresentPosition.is_writable());
        assert!(!Register::Moving.is_writable());
        assert!(Register::GoalPosition.is_writable());
        assert!(Register::Led.is_writable());
    }

    #[test]
    fn test_display() {
        assert_eq!(Register::GoalPosition.to_string(), "goal_position (0x1E)");
    }
}
