//! Blocking driver on top of [`embedded_hal::i2c::I2c`]

use embedded_hal::i2c;

use crate::{
    protocol::{self, READ_LEN},
    registers::*,
    units, Config, Error,
};

/// Chip handle
pub struct Lc709203f<I> {
    i2c: I,
    addr: u8,
}

impl<I, E> Lc709203f<I>
where
    I: i2c::I2c<Error = E>,
{
    /// Creates the driver instance. Does not talk to the chip, call `init` once
    /// the gauge has finished its power-on sequence
    pub fn new(i2c: I, addr: u8) -> Self {
        Self { i2c, addr }
    }

    /// Gives the bus back
    pub fn release(self) -> I {
        self.i2c
    }

    /// Reads a raw word from the register
    pub fn read(&mut self, register: Register) -> Result<u16, Error<E>> {
        protocol::check_readable(register)?;

        let mut response = [0; READ_LEN];
        self.i2c
            .write_read(self.addr, &[register.addr()], &mut response)?;

        let value = protocol::decode_read(self.addr, register, &response)?;
        trace!("read {:?}: {:#x}", register, value);

        Ok(value)
    }

    /// Writes a raw word to the register
    pub fn write(&mut self, register: Register, value: u16) -> Result<(), Error<E>> {
        protocol::check_writable(register, value)?;

        trace!("write {:?}: {:#x}", register, value);

        let request = protocol::encode_write(self.addr, register, value);
        self.i2c.write(self.addr, &request)?;

        Ok(())
    }

    /// Reads the register and converts the word using one of the [`units`]
    /// functions or any other pure conversion
    pub fn read_scaled<T, F>(&mut self, register: Register, convert: F) -> Result<T, Error<E>>
    where
        F: FnOnce(u16) -> T,
    {
        self.read(register).map(convert)
    }

    /// Reads a register holding one of the typed values
    fn read_typed<T>(&mut self, register: Register) -> Result<T, Error<E>>
    where
        T: TryFrom<u16, Error = u16>,
    {
        let raw = self.read(register)?;
        T::try_from(raw).map_err(|value| Error::OutOfRangeValue { register, value })
    }

    /// Reads a register whose typed value has a narrower range than the word,
    /// e.g. percentages
    fn read_checked<T, F>(&mut self, register: Register, convert: F) -> Result<T, Error<E>>
    where
        F: FnOnce(u16) -> Option<T>,
    {
        let raw = self.read(register)?;
        convert(raw).ok_or(Error::OutOfRangeValue {
            register,
            value: raw,
        })
    }

    /// Applies the configuration and restarts the state of charge estimation.
    /// This is the first thing to call after the chip has powered up
    pub fn init(&mut self, config: &Config) -> Result<(), Error<E>> {
        info!("initializing the gauge...");

        self.set_power_mode(config.power_mode)?;
        self.set_pack_size(config.pack_size)?;
        self.set_battery_profile(config.battery_profile)?;

        match config.thermistor_b_constant {
            Some(b) => {
                self.set_thermistor_b_constant(b)?;
                self.set_thermistor_enabled(true)?;
            }
            None => self.set_thermistor_enabled(false)?,
        }

        self.init_rsoc()?;

        info!("gauge initialized!");

        Ok(())
    }

    /// Restarts the state of charge calculation from the current cell voltage
    pub fn init_rsoc(&mut self) -> Result<(), Error<E>> {
        debug!("initializing RSOC");
        self.write(Register::InitialRsoc, RSOC_INIT_WORD)
    }

    /// Same as `init_rsoc`, but uses the voltage sampled right after power-on,
    /// before the load was connected
    pub fn before_rsoc(&mut self) -> Result<(), Error<E>> {
        debug!("initializing RSOC from the power-on sample");
        self.write(Register::BeforeRsoc, RSOC_INIT_WORD)
    }

    /// Reads the cell voltage in millivolts
    pub fn cell_voltage_mv(&mut self) -> Result<u16, Error<E>> {
        self.read_scaled(Register::CellVoltage, units::millivolts)
    }

    /// Reads the cell voltage in volts
    pub fn cell_voltage(&mut self) -> Result<f32, Error<E>> {
        self.read_scaled(Register::CellVoltage, units::volts)
    }

    /// Remaining capacity in percent with 0.1 % resolution (ITE)
    pub fn cell_percent(&mut self) -> Result<f32, Error<E>> {
        self.read_checked(Register::Ite, units::tenth_percent_checked)
    }

    /// Remaining capacity in whole percent (RSOC)
    pub fn relative_state_of_charge(&mut self) -> Result<u8, Error<E>> {
        self.read_checked(Register::Rsoc, units::percent)
    }

    /// Cell temperature in degrees Celsius, either measured by the thermistor
    /// or the last value written by the host
    pub fn cell_temperature(&mut self) -> Result<f32, Error<E>> {
        self.read_scaled(Register::CellTemperature, units::celsius)
    }

    /// Reports the cell temperature to the gauge. Only allowed in I2C
    /// temperature mode, the chip owns the register when the thermistor is on
    pub fn set_cell_temperature(&mut self, celsius: f32) -> Result<(), Error<E>> {
        if self.thermistor_enabled()? {
            return Err(Error::InvalidRegister(Register::CellTemperature));
        }

        self.write(Register::CellTemperature, units::celsius_to_raw(celsius))
    }

    pub fn ic_version(&mut self) -> Result<u16, Error<E>> {
        self.read(Register::IcVersion)
    }

    /// Identifier of the battery profile set built into the chip
    pub fn number_of_parameter(&mut self) -> Result<u16, Error<E>> {
        self.read(Register::NumberOfParameter)
    }

    pub fn power_mode(&mut self) -> Result<PowerMode, Error<E>> {
        self.read_typed(Register::IcPowerMode)
    }

    pub fn set_power_mode(&mut self, mode: PowerMode) -> Result<(), Error<E>> {
        debug!("power mode: {:?}", mode);
        self.write(Register::IcPowerMode, mode.into())
    }

    pub fn battery_profile(&mut self) -> Result<BatteryProfile, Error<E>> {
        self.read_typed(Register::BatteryProfile)
    }

    pub fn set_battery_profile(&mut self, profile: BatteryProfile) -> Result<(), Error<E>> {
        self.write(Register::BatteryProfile, profile.into())
    }

    /// Raw adjustment pack application value
    pub fn apa(&mut self) -> Result<u8, Error<E>> {
        let raw = self.read(Register::Apa)?;
        u8::try_from(raw).map_err(|_| Error::OutOfRangeValue {
            register: Register::Apa,
            value: raw,
        })
    }

    pub fn set_apa(&mut self, apa: u8) -> Result<(), Error<E>> {
        self.write(Register::Apa, apa.into())
    }

    /// Programs the APA value matching one of the nominal pack capacities
    pub fn set_pack_size(&mut self, size: PackSize) -> Result<(), Error<E>> {
        debug!("pack size: {} mAh", size.capacity_mah());
        self.set_apa(size.apa())
    }

    /// Adjustment pack thermistor value
    pub fn apt(&mut self) -> Result<u16, Error<E>> {
        self.read(Register::Apt)
    }

    pub fn set_apt(&mut self, apt: u16) -> Result<(), Error<E>> {
        self.write(Register::Apt, apt)
    }

    pub fn thermistor_b_constant(&mut self) -> Result<u16, Error<E>> {
        self.read(Register::ThermistorB)
    }

    pub fn set_thermistor_b_constant(&mut self, b: u16) -> Result<(), Error<E>> {
        self.write(Register::ThermistorB, b)
    }

    pub fn status_bits(&mut self) -> Result<StatusBits, Error<E>> {
        self.read_scaled(Register::StatusBit, StatusBits::from)
    }

    pub fn set_status_bits(&mut self, bits: StatusBits) -> Result<(), Error<E>> {
        self.write(Register::StatusBit, bits.bits())
    }

    /// Is the temperature measured through the thermistor on TSENSE?
    pub fn thermistor_enabled(&mut self) -> Result<bool, Error<E>> {
        Ok(self.status_bits()?.contains(StatusBits::THERMISTOR_MODE))
    }

    pub fn set_thermistor_enabled(&mut self, enabled: bool) -> Result<(), Error<E>> {
        let mut bits = StatusBits::empty();
        bits.set(StatusBits::THERMISTOR_MODE, enabled);
        self.set_status_bits(bits)
    }

    pub fn current_direction(&mut self) -> Result<CurrentDirection, Error<E>> {
        self.read_typed(Register::CurrentDirection)
    }

    pub fn set_current_direction(&mut self, direction: CurrentDirection) -> Result<(), Error<E>> {
        self.write(Register::CurrentDirection, direction.into())
    }

    /// Low RSOC alarm threshold in percent, `None` when the alarm is off
    pub fn alarm_low_rsoc(&mut self) -> Result<Option<u8>, Error<E>> {
        let percent = self.read_checked(Register::AlarmLowRsoc, units::percent)?;
        Ok((percent != 0).then_some(percent))
    }

    pub fn set_alarm_low_rsoc(&mut self, percent: Option<u8>) -> Result<(), Error<E>> {
        self.write(Register::AlarmLowRsoc, percent.unwrap_or(0).into())
    }

    /// Low cell voltage alarm threshold in millivolts, `None` when the alarm is off
    pub fn alarm_low_cell_voltage(&mut self) -> Result<Option<u16>, Error<E>> {
        let mv = self.read_scaled(Register::AlarmLowCellVoltage, units::millivolts)?;
        Ok((mv != 0).then_some(mv))
    }

    pub fn set_alarm_low_cell_voltage(&mut self, mv: Option<u16>) -> Result<(), Error<E>> {
        self.write(Register::AlarmLowCellVoltage, mv.unwrap_or(0))
    }
}
