#![cfg_attr(not(test), no_std)]

//! A small driver for the LC709203F battery fuel gauge.
//!
//! The gauge exposes everything through a handful of 16-bit registers, each
//! transfer protected by a CRC-8. This crate maps those registers to typed
//! accessors on top of the [`embedded-hal`] I2C traits, blocking by default
//! and async with the `async` feature.
//!
//! ```ignore
//! use lc709203f::{Config, Lc709203f, PackSize, DEFAULT_ADDRESS};
//!
//! let mut gauge = Lc709203f::new(i2c, DEFAULT_ADDRESS);
//! gauge.init(&Config {
//!     pack_size: PackSize::Mah2000,
//!     ..Default::default()
//! })?;
//!
//! let volts = gauge.cell_voltage()?;
//! let percent = gauge.cell_percent()?;
//! ```
//!
//! The driver keeps no state besides the bus and the address. Nothing is
//! retried: some registers are not safe to blindly write twice, so retry
//! policy is left to the caller. Sharing the bus with other devices is also
//! the caller's business, e.g. through `embedded-hal-bus`.
//!
//! [`embedded-hal`]: https://docs.rs/embedded-hal

pub(crate) mod fmt;

pub mod blocking;
pub mod protocol;
pub mod registers;
pub mod units;

#[cfg(feature = "async")]
pub mod asynchronous;

#[cfg(test)]
pub(crate) mod sim;

pub use blocking::Lc709203f;
pub use registers::*;

/// Fixed 7-bit address of the chip
pub const DEFAULT_ADDRESS: u8 = 0x0B;

/// Chip error type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// The transport failed (NACK, timeout, arbitration loss, no device)
    Bus(E),
    /// The register does not support the requested access
    InvalidRegister(Register),
    /// The value is outside of what the register holds
    OutOfRangeValue { register: Register, value: u16 },
    /// The word read back did not match its CRC
    Crc { register: Register },
}

impl<E> From<E> for Error<E> {
    fn from(e: E) -> Self {
        Self::Bus(e)
    }
}

/// Settings applied by `init`. The defaults are a single 500 mAh LiPo cell
/// with the temperature reported by the host over I2C
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    pub power_mode: PowerMode,
    pub pack_size: PackSize,
    pub battery_profile: BatteryProfile,
    /// B-constant of the NTC on TSENSE. `None` keeps I2C temperature mode,
    /// `Some` programs the constant and switches to thermistor mode
    pub thermistor_b_constant: Option<u16>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            power_mode: PowerMode::Operate,
            pack_size: PackSize::Mah500,
            battery_profile: BatteryProfile::One,
            thermistor_b_constant: None,
        }
    }
}
