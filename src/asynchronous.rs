//! Async driver on top of [`embedded_hal_async::i2c::I2c`]. Same registers,
//! same checks, same errors as the blocking one.

use embedded_hal_async::i2c;

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
    /// Creates the driver instance
    pub fn new(i2c: I, addr: u8) -> Self {
        Self { i2c, addr }
    }

    /// Gives the bus back
    pub fn release(self) -> I {
        self.i2c
    }

    /// Reads a raw word from the register
    pub async fn read(&mut self, register: Register) -> Result<u16, Error<E>> {
        protocol::check_readable(register)?;

        let mut response = [0; READ_LEN];
        self.i2c
            .write_read(self.addr, &[register.addr()], &mut response)
            .await?;

        let value = protocol::decode_read(self.addr, register, &response)?;
        trace!("read {:?}: {:#x}", register, value);

        Ok(value)
    }

    /// Writes a raw word to the register
    pub async fn write(&mut self, register: Register, value: u16) -> Result<(), Error<E>> {
        protocol::check_writable(register, value)?;

        trace!("write {:?}: {:#x}", register, value);

        let request = protocol::encode_write(self.addr, register, value);
        self.i2c.write(self.addr, &request).await?;

        Ok(())
    }

    /// Reads the register and converts the word using one of the [`units`]
    /// functions or any other pure conversion
    pub async fn read_scaled<T, F>(&mut self, register: Register, convert: F) -> Result<T, Error<E>>
    where
        F: FnOnce(u16) -> T,
    {
        self.read(register).await.map(convert)
    }

    async fn read_typed<T>(&mut self, register: Register) -> Result<T, Error<E>>
    where
        T: TryFrom<u16, Error = u16>,
    {
        let raw = self.read(register).await?;
        T::try_from(raw).map_err(|value| Error::OutOfRangeValue { register, value })
    }

    /// Reads a register whose typed value has a narrower range than the word,
    /// e.g. percentages
    async fn read_checked<T, F>(&mut self, register: Register, convert: F) -> Result<T, Error<E>>
    where
        F: FnOnce(u16) -> Option<T>,
    {
        let raw = self.read(register).await?;
        convert(raw).ok_or(Error::OutOfRangeValue {
            register,
            value: raw,
        })
    }

    /// Applies the configuration and restarts the state of charge estimation
    pub async fn init(&mut self, config: &Config) -> Result<(), Error<E>> {
        info!("initializing the gauge...");

        self.set_power_mode(config.power_mode).await?;
        self.set_pack_size(config.pack_size).await?;
        self.set_battery_profile(config.battery_profile).await?;

        match config.thermistor_b_constant {
            Some(b) => {
                self.set_thermistor_b_constant(b).await?;
                self.set_thermistor_enabled(true).await?;
            }
            None => self.set_thermistor_enabled(false).await?,
        }

        self.init_rsoc().await?;

        info!("gauge initialized!");

        Ok(())
    }

    pub async fn init_rsoc(&mut self) -> Result<(), Error<E>> {
        debug!("initializing RSOC");
        self.write(Register::InitialRsoc, RSOC_INIT_WORD).await
    }

    pub async fn before_rsoc(&mut self) -> Result<(), Error<E>> {
        debug!("initializing RSOC from the power-on sample");
        self.write(Register::BeforeRsoc, RSOC_INIT_WORD).await
    }

    pub async fn cell_voltage_mv(&mut self) -> Result<u16, Error<E>> {
        self.read_scaled(Register::CellVoltage, units::millivolts)
            .await
    }

    pub async fn cell_voltage(&mut self) -> Result<f32, Error<E>> {
        self.read_scaled(Register::CellVoltage, units::volts).await
    }

    pub async fn cell_percent(&mut self) -> Result<f32, Error<E>> {
        self.read_checked(Register::Ite, units::tenth_percent_checked)
            .await
    }

    pub async fn relative_state_of_charge(&mut self) -> Result<u8, Error<E>> {
        self.read_checked(Register::Rsoc, units::percent).await
    }

    pub async fn cell_temperature(&mut self) -> Result<f32, Error<E>> {
        self.read_scaled(Register::CellTemperature, units::celsius)
            .await
    }

    /// Reports the cell temperature to the gauge, I2C temperature mode only
    pub async fn set_cell_temperature(&mut self, celsius: f32) -> Result<(), Error<E>> {
        if self.thermistor_enabled().await? {
            return Err(Error::InvalidRegister(Register::CellTemperature));
        }

        self.write(Register::CellTemperature, units::celsius_to_raw(celsius))
            .await
    }

    pub async fn ic_version(&mut self) -> Result<u16, Error<E>> {
        self.read(Register::IcVersion).await
    }

    pub async fn number_of_parameter(&mut self) -> Result<u16, Error<E>> {
        self.read(Register::NumberOfParameter).await
    }

    pub async fn power_mode(&mut self) -> Result<PowerMode, Error<E>> {
        self.read_typed(Register::IcPowerMode).await
    }

    pub async fn set_power_mode(&mut self, mode: PowerMode) -> Result<(), Error<E>> {
        debug!("power mode: {:?}", mode);
        self.write(Register::IcPowerMode, mode.into()).await
    }

    pub async fn battery_profile(&mut self) -> Result<BatteryProfile, Error<E>> {
        self.read_typed(Register::BatteryProfile).await
    }

    pub async fn set_battery_profile(&mut self, profile: BatteryProfile) -> Result<(), Error<E>> {
        self.write(Register::BatteryProfile, profile.into()).await
    }

    pub async fn apa(&mut self) -> Result<u8, Error<E>> {
        let raw = self.read(Register::Apa).await?;
        u8::try_from(raw).map_err(|_| Error::OutOfRangeValue {
            register: Register::Apa,
            value: raw,
        })
    }

    pub async fn set_apa(&mut self, apa: u8) -> Result<(), Error<E>> {
        self.write(Register::Apa, apa.into()).await
    }

    pub async fn set_pack_size(&mut self, size: PackSize) -> Result<(), Error<E>> {
        debug!("pack size: {} mAh", size.capacity_mah());
        self.set_apa(size.apa()).await
    }

    pub async fn apt(&mut self) -> Result<u16, Error<E>> {
        self.read(Register::Apt).await
    }

    pub async fn set_apt(&mut self, apt: u16) -> Result<(), Error<E>> {
        self.write(Register::Apt, apt).await
    }

    pub async fn thermistor_b_constant(&mut self) -> Result<u16, Error<E>> {
        self.read(Register::ThermistorB).await
    }

    pub async fn set_thermistor_b_constant(&mut self, b: u16) -> Result<(), Error<E>> {
        self.write(Register::ThermistorB, b).await
    }

    pub async fn status_bits(&mut self) -> Result<StatusBits, Error<E>> {
        self.read_scaled(Register::StatusBit, StatusBits::from)
            .await
    }

    pub async fn set_status_bits(&mut self, bits: StatusBits) -> Result<(), Error<E>> {
        self.write(Register::StatusBit, bits.bits()).await
    }

    pub async fn thermistor_enabled(&mut self) -> Result<bool, Error<E>> {
        Ok(self
            .status_bits()
            .await?
            .contains(StatusBits::THERMISTOR_MODE))
    }

    pub async fn set_thermistor_enabled(&mut self, enabled: bool) -> Result<(), Error<E>> {
        let mut bits = StatusBits::empty();
        bits.set(StatusBits::THERMISTOR_MODE, enabled);
        self.set_status_bits(bits).await
    }

    pub async fn current_direction(&mut self) -> Result<CurrentDirection, Error<E>> {
        self.read_typed(Register::CurrentDirection).await
    }

    pub async fn set_current_direction(
        &mut self,
        direction: CurrentDirection,
    ) -> Result<(), Error<E>> {
        self.write(Register::CurrentDirection, direction.into())
            .await
    }

    pub async fn alarm_low_rsoc(&mut self) -> Result<Option<u8>, Error<E>> {
        let percent = self
            .read_checked(Register::AlarmLowRsoc, units::percent)
            .await?;
        Ok((percent != 0).then_some(percent))
    }

    pub async fn set_alarm_low_rsoc(&mut self, percent: Option<u8>) -> Result<(), Error<E>> {
        self.write(Register::AlarmLowRsoc, percent.unwrap_or(0).into())
            .await
    }

    pub async fn alarm_low_cell_voltage(&mut self) -> Result<Option<u16>, Error<E>> {
        let mv = self
            .read_scaled(Register::AlarmLowCellVoltage, units::millivolts)
            .await?;
        Ok((mv != 0).then_some(mv))
    }

    pub async fn set_alarm_low_cell_voltage(&mut self, mv: Option<u16>) -> Result<(), Error<E>> {
        self.write(Register::AlarmLowCellVoltage, mv.unwrap_or(0))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{sim::SimGauge, DEFAULT_ADDRESS};
    use embassy_futures::block_on;
    use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};

    #[test]
    fn reads_telemetry() {
        let mut sim = SimGauge::new();
        let mut gauge = Lc709203f::new(&mut sim, DEFAULT_ADDRESS);

        block_on(async {
            assert_eq!(gauge.cell_voltage_mv().await, Ok(3700));
            assert_eq!(gauge.cell_percent().await, Ok(60.0));
            assert_eq!(gauge.power_mode().await, Ok(PowerMode::Operate));
        });
    }

    #[test]
    fn init_applies_default_config() {
        let mut sim = SimGauge::new();

        block_on(async {
            Lc709203f::new(&mut sim, DEFAULT_ADDRESS)
                .init(&Config::default())
                .await
                .unwrap();
        });

        let expected: [(u8, u16); 5] = [
            (Register::IcPowerMode.addr(), 0x0001),
            (Register::Apa.addr(), 0x0010),
            (Register::BatteryProfile.addr(), 0x0001),
            (Register::StatusBit.addr(), 0x0000),
            (Register::InitialRsoc.addr(), 0xAA55),
        ];
        assert_eq!(sim.writes, expected);
    }

    #[test]
    fn access_and_bus_errors() {
        let mut sim = SimGauge::new();

        block_on(async {
            let mut gauge = Lc709203f::new(&mut sim, DEFAULT_ADDRESS);

            assert_eq!(
                gauge.read(Register::InitialRsoc).await,
                Err(Error::InvalidRegister(Register::InitialRsoc))
            );
            assert_eq!(
                gauge.write(Register::IcVersion, 1).await,
                Err(Error::InvalidRegister(Register::IcVersion))
            );

            let sim = gauge.release();
            assert_eq!(sim.transactions, 0);
            sim.nack = true;

            let mut gauge = Lc709203f::new(sim, DEFAULT_ADDRESS);
            assert_eq!(
                gauge.set_power_mode(PowerMode::Sleep).await,
                Err(Error::Bus(ErrorKind::NoAcknowledge(
                    NoAcknowledgeSource::Address
                )))
            );
        });

        assert!(sim.writes.is_empty());
    }

    #[test]
    fn host_temperature_only_in_i2c_mode() {
        let mut sim = SimGauge::new();

        block_on(async {
            let mut gauge = Lc709203f::new(&mut sim, DEFAULT_ADDRESS);

            gauge.set_cell_temperature(30.0).await.unwrap();
            assert!((gauge.cell_temperature().await.unwrap() - 30.0).abs() < 0.1);

            gauge.set_thermistor_enabled(true).await.unwrap();
            assert_eq!(gauge.thermistor_enabled().await, Ok(true));
            assert_eq!(
                gauge.set_cell_temperature(20.0).await,
                Err(Error::InvalidRegister(Register::CellTemperature))
            );
        });

        assert_eq!(sim.get(Register::CellTemperature), 3032);
    }

    #[test]
    fn corrupted_crc_is_detected() {
        let mut sim = SimGauge::new();
        sim.corrupt_crc = true;

        block_on(async {
            let mut gauge = Lc709203f::new(&mut sim, DEFAULT_ADDRESS);
            assert_eq!(
                gauge.read_scaled(Register::CellVoltage, units::volts).await,
                Err(Error::Crc {
                    register: Register::CellVoltage
                })
            );
        });
    }

    #[test]
    fn read_scaled_converts_the_word() {
        let mut sim = SimGauge::new();

        block_on(async {
            let mut gauge = Lc709203f::new(&mut sim, DEFAULT_ADDRESS);
            assert_eq!(
                gauge.read_scaled(Register::Ite, units::tenth_percent).await,
                Ok(60.0)
            );
            assert_eq!(
                gauge.read_scaled(Register::CellVoltage, units::millivolts).await,
                Ok(3700)
            );
        });
    }

    #[test]
    fn out_of_range_writes_are_rejected() {
        let mut sim = SimGauge::new();

        block_on(async {
            let mut gauge = Lc709203f::new(&mut sim, DEFAULT_ADDRESS);

            assert_eq!(
                gauge.set_alarm_low_rsoc(Some(101)).await,
                Err(Error::OutOfRangeValue {
                    register: Register::AlarmLowRsoc,
                    value: 101
                })
            );
            assert_eq!(
                gauge.write(Register::InitialRsoc, 0x1234).await,
                Err(Error::OutOfRangeValue {
                    register: Register::InitialRsoc,
                    value: 0x1234
                })
            );
            assert_eq!(
                gauge.set_cell_temperature(100.0).await,
                Err(Error::OutOfRangeValue {
                    register: Register::CellTemperature,
                    value: 3732
                })
            );
        });

        assert!(sim.writes.is_empty());
    }

    #[test]
    fn percentages_past_full_are_rejected() {
        let mut sim = SimGauge::new();
        sim.set(Register::Rsoc, 300);
        sim.set(Register::AlarmLowRsoc, 150);
        sim.set(Register::Ite, 0xFFFF);

        block_on(async {
            let mut gauge = Lc709203f::new(&mut sim, DEFAULT_ADDRESS);

            assert_eq!(
                gauge.relative_state_of_charge().await,
                Err(Error::OutOfRangeValue {
                    register: Register::Rsoc,
                    value: 300
                })
            );
            assert_eq!(
                gauge.alarm_low_rsoc().await,
                Err(Error::OutOfRangeValue {
                    register: Register::AlarmLowRsoc,
                    value: 150
                })
            );
            assert_eq!(
                gauge.cell_percent().await,
                Err(Error::OutOfRangeValue {
                    register: Register::Ite,
                    value: 0xFFFF
                })
            );
        });
    }
}
