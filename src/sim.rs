//! Simulated gauge used by the unit tests. Speaks the CRC-protected word
//! protocol and stores whatever is written to it.

use embedded_hal::i2c::{self, ErrorKind, NoAcknowledgeSource, Operation};

use crate::{protocol::crc8, registers::Register, DEFAULT_ADDRESS};

const REGISTER_COUNT: usize = 0x20;

pub(crate) struct SimGauge {
    pub addr: u8,
    pub regs: [u16; REGISTER_COUNT],
    /// NACK every transaction from now on
    pub nack: bool,
    /// Flip a bit of the CRC on reads
    pub corrupt_crc: bool,
    pub transactions: usize,
    /// Register index and value of every accepted write, in order
    pub writes: Vec<(u8, u16)>,
}

impl SimGauge {
    pub fn new() -> Self {
        let mut regs = [0; REGISTER_COUNT];
        regs[Register::ThermistorB.addr() as usize] = 0x0D34;
        regs[Register::CellTemperature.addr() as usize] = 0x0BA6;
        regs[Register::CellVoltage.addr() as usize] = 3700;
        regs[Register::Apa.addr() as usize] = 0x10;
        regs[Register::Rsoc.addr() as usize] = 60;
        regs[Register::Ite.addr() as usize] = 0x0258;
        regs[Register::IcVersion.addr() as usize] = 0x2717;
        regs[Register::AlarmLowRsoc.addr() as usize] = 8;
        regs[Register::IcPowerMode.addr() as usize] = 1;
        regs[Register::NumberOfParameter.addr() as usize] = 0x0301;

        Self {
            addr: DEFAULT_ADDRESS,
            regs,
            nack: false,
            corrupt_crc: false,
            transactions: 0,
            writes: Vec::new(),
        }
    }

    pub fn set(&mut self, register: Register, value: u16) {
        self.regs[register.addr() as usize] = value;
    }

    pub fn get(&self, register: Register) -> u16 {
        self.regs[register.addr() as usize]
    }

    fn read_word(&mut self, index: u8, out: &mut [u8]) -> Result<(), ErrorKind> {
        let value = *self
            .regs
            .get(index as usize)
            .ok_or(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data))?;

        let [lo, hi] = value.to_le_bytes();
        let mut crc = crc8(&[self.addr << 1, index, (self.addr << 1) | 1, lo, hi]);
        if self.corrupt_crc {
            crc ^= 0x01;
        }

        out.copy_from_slice(&[lo, hi, crc]);
        Ok(())
    }

    fn write_word(&mut self, frame: &[u8]) -> Result<(), ErrorKind> {
        let [index, lo, hi, crc] = *frame else {
            return Err(ErrorKind::Other);
        };

        // The real chip NACKs the CRC byte when it does not match
        if crc8(&[self.addr << 1, index, lo, hi]) != crc {
            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data));
        }

        let value = u16::from_le_bytes([lo, hi]);
        let slot = self
            .regs
            .get_mut(index as usize)
            .ok_or(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data))?;

        *slot = value;
        self.writes.push((index, value));
        Ok(())
    }
}

impl i2c::ErrorType for SimGauge {
    type Error = ErrorKind;
}

impl i2c::I2c for SimGauge {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        self.transactions += 1;

        if self.nack || address != self.addr {
            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
        }

        match operations {
            [Operation::Write(index), Operation::Read(out)] if index.len() == 1 && out.len() == 3 => {
                self.read_word(index[0], out)
            }
            [Operation::Write(frame)] => self.write_word(frame),
            _ => Err(ErrorKind::Other),
        }
    }
}

#[cfg(feature = "async")]
impl embedded_hal_async::i2c::I2c for SimGauge {
    async fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        i2c::I2c::transaction(self, address, operations)
    }
}
