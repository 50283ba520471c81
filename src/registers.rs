//! Register map of the LC709203F and the typed values stored in it

use crate::fmt::bitflags;

/// Magic word that has to be written to the RSOC initialization registers
pub const RSOC_INIT_WORD: u16 = 0xAA55;

/// Every register of the gauge is 16 bits wide and addressed by a single byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Register {
    BeforeRsoc = 0x04,
    ThermistorB = 0x06,
    InitialRsoc = 0x07,
    CellTemperature = 0x08,
    CellVoltage = 0x09,
    CurrentDirection = 0x0A,
    /// Adjustment pack application
    Apa = 0x0B,
    /// Adjustment pack thermistor
    Apt = 0x0C,
    Rsoc = 0x0D,
    /// Indicator to empty
    Ite = 0x0F,
    IcVersion = 0x11,
    /// "Change of the parameter" in the datasheet
    BatteryProfile = 0x12,
    AlarmLowRsoc = 0x13,
    AlarmLowCellVoltage = 0x14,
    IcPowerMode = 0x15,
    StatusBit = 0x16,
    NumberOfParameter = 0x1A,
}

/// Which transactions a register accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Access {
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

impl Access {
    pub fn readable(self) -> bool {
        matches!(self, Access::ReadOnly | Access::ReadWrite)
    }

    pub fn writable(self) -> bool {
        matches!(self, Access::WriteOnly | Access::ReadWrite)
    }
}

/// What one LSB of the raw register value means
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Unit {
    Raw,
    Millivolts,
    Percent,
    TenthPercent,
    /// 0.1 K
    DeciKelvin,
}

/// Set of values the chip accepts on write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Domain {
    Any,
    Range(u16, u16),
    OneOf(&'static [u16]),
}

impl Domain {
    pub fn contains(&self, value: u16) -> bool {
        match *self {
            Domain::Any => true,
            Domain::Range(min, max) => (min..=max).contains(&value),
            Domain::OneOf(values) => values.contains(&value),
        }
    }
}

/// -20 °C .. 60 °C in 0.1 K steps
pub const CELL_TEMPERATURE_MIN: u16 = 0x09E4;
pub const CELL_TEMPERATURE_MAX: u16 = 0x0D04;

impl Register {
    /// Register index as sent on the wire
    pub const fn addr(self) -> u8 {
        self as u8
    }

    pub const fn access(self) -> Access {
        match self {
            Register::BeforeRsoc | Register::InitialRsoc => Access::WriteOnly,
            Register::CellVoltage
            | Register::Ite
            | Register::IcVersion
            | Register::NumberOfParameter => Access::ReadOnly,
            _ => Access::ReadWrite,
        }
    }

    pub const fn unit(self) -> Unit {
        match self {
            Register::CellVoltage | Register::AlarmLowCellVoltage => Unit::Millivolts,
            Register::Rsoc | Register::AlarmLowRsoc => Unit::Percent,
            Register::Ite => Unit::TenthPercent,
            Register::CellTemperature => Unit::DeciKelvin,
            _ => Unit::Raw,
        }
    }

    /// Values accepted by a write. Read-only registers report `Domain::Any`,
    /// they are rejected on access mode before the domain is looked at.
    pub const fn domain(self) -> Domain {
        match self {
            Register::BeforeRsoc | Register::InitialRsoc => Domain::OneOf(&[RSOC_INIT_WORD]),
            Register::CellTemperature => {
                Domain::Range(CELL_TEMPERATURE_MIN, CELL_TEMPERATURE_MAX)
            }
            Register::CurrentDirection => Domain::OneOf(&[0x0000, 0x0001, 0xFFFF]),
            Register::Apa => Domain::Range(0x0000, 0x00FF),
            Register::Rsoc | Register::AlarmLowRsoc => Domain::Range(0, 100),
            Register::BatteryProfile | Register::StatusBit => Domain::OneOf(&[0, 1]),
            Register::IcPowerMode => Domain::OneOf(&[1, 2]),
            _ => Domain::Any,
        }
    }
}

/// Operating mode of the gauge, stored in the IC power mode register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerMode {
    Operate,
    Sleep,
}

impl From<PowerMode> for u16 {
    fn from(mode: PowerMode) -> Self {
        match mode {
            PowerMode::Operate => 0x0001,
            PowerMode::Sleep => 0x0002,
        }
    }
}

impl TryFrom<u16> for PowerMode {
    type Error = u16;

    fn try_from(code: u16) -> Result<Self, Self::Error> {
        match code {
            0x0001 => Ok(Self::Operate),
            0x0002 => Ok(Self::Sleep),
            other => Err(other),
        }
    }
}

/// Battery profile selector. Which one fits depends on the cell chemistry,
/// the datasheet lists the nominal and charging voltages for both
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BatteryProfile {
    Zero,
    One,
}

impl From<BatteryProfile> for u16 {
    fn from(profile: BatteryProfile) -> Self {
        match profile {
            BatteryProfile::Zero => 0,
            BatteryProfile::One => 1,
        }
    }
}

impl TryFrom<u16> for BatteryProfile {
    type Error = u16;

    fn try_from(code: u16) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Zero),
            1 => Ok(Self::One),
            other => Err(other),
        }
    }
}

/// Nominal pack capacities with their APA codes taken from the datasheet table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PackSize {
    Mah100,
    Mah200,
    Mah400,
    Mah500,
    Mah1000,
    Mah2000,
    Mah3000,
}

impl PackSize {
    /// Code for the APA register
    pub const fn apa(self) -> u8 {
        match self {
            PackSize::Mah100 => 0x08,
            PackSize::Mah200 => 0x0B,
            PackSize::Mah400 => 0x0E,
            PackSize::Mah500 => 0x10,
            PackSize::Mah1000 => 0x19,
            PackSize::Mah2000 => 0x2D,
            PackSize::Mah3000 => 0x36,
        }
    }

    pub const fn capacity_mah(self) -> u16 {
        match self {
            PackSize::Mah100 => 100,
            PackSize::Mah200 => 200,
            PackSize::Mah400 => 400,
            PackSize::Mah500 => 500,
            PackSize::Mah1000 => 1000,
            PackSize::Mah2000 => 2000,
            PackSize::Mah3000 => 3000,
        }
    }
}

/// Direction of the current flow used by the gauge for its estimation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CurrentDirection {
    Auto,
    Charge,
    Discharge,
}

impl From<CurrentDirection> for u16 {
    fn from(direction: CurrentDirection) -> Self {
        match direction {
            CurrentDirection::Auto => 0x0000,
            CurrentDirection::Charge => 0x0001,
            CurrentDirection::Discharge => 0xFFFF,
        }
    }
}

impl TryFrom<u16> for CurrentDirection {
    type Error = u16;

    fn try_from(code: u16) -> Result<Self, Self::Error> {
        match code {
            0x0000 => Ok(Self::Auto),
            0x0001 => Ok(Self::Charge),
            0xFFFF => Ok(Self::Discharge),
            other => Err(other),
        }
    }
}

bitflags! {
    /// Contents of the status bit register
    pub struct StatusBits: u16 {
        /// Temperature is measured through the TSENSE thermistor instead of
        /// being written by the host over I2C
        const THERMISTOR_MODE = 1 << 0;
    }
}

impl From<u16> for StatusBits {
    fn from(value: u16) -> Self {
        StatusBits::from_bits_truncate(value)
    }
}
