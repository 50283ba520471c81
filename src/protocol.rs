//! Framing of the word protocol spoken by the gauge.
//!
//! Every transfer carries a 16-bit little-endian word protected by a CRC-8
//! (polynomial 0x07) that also covers the address bytes seen on the wire:
//!
//! ```text
//! read:  S addr+W reg Sr addr+R lo hi crc P     crc = CRC8(addr+W, reg, addr+R, lo, hi)
//! write: S addr+W reg lo hi crc P               crc = CRC8(addr+W, reg, lo, hi)
//! ```

use byteorder::{ByteOrder, LittleEndian};

use crate::{registers::Register, Error};

/// Bytes returned by a register read: the word and its CRC
pub(crate) const READ_LEN: usize = 3;

/// Bytes sent by a register write: index, the word and its CRC
pub(crate) const WRITE_LEN: usize = 4;

const CRC_POLYNOMIAL: u8 = 0x07;

/// CRC-8 used by the gauge (CRC-8/SMBus: no reflection, zero init, no final xor)
pub fn crc8(data: &[u8]) -> u8 {
    let mut crc: u8 = 0;

    for b in data.iter() {
        crc ^= *b;
        for _ in 0..8 {
            crc = if crc & 0x80 != 0 {
                (crc << 1) ^ CRC_POLYNOMIAL
            } else {
                crc << 1
            };
        }
    }

    crc
}

/// Bails out before touching the bus if the register cannot be read
pub(crate) fn check_readable<E>(register: Register) -> Result<(), Error<E>> {
    if register.access().readable() {
        Ok(())
    } else {
        Err(Error::InvalidRegister(register))
    }
}

/// Bails out before touching the bus if the register cannot be written
/// or the chip would not accept the value
pub(crate) fn check_writable<E>(register: Register, value: u16) -> Result<(), Error<E>> {
    if !register.access().writable() {
        return Err(Error::InvalidRegister(register));
    }

    if !register.domain().contains(value) {
        return Err(Error::OutOfRangeValue { register, value });
    }

    Ok(())
}

/// Builds the payload of a register write
pub(crate) fn encode_write(addr: u8, register: Register, value: u16) -> [u8; WRITE_LEN] {
    let mut frame = [register.addr(), 0, 0, 0];
    LittleEndian::write_u16(&mut frame[1..3], value);

    let crc = crc8(&[addr << 1, frame[0], frame[1], frame[2]]);
    frame[3] = crc;

    frame
}

/// Validates the response of a register read and extracts the word
pub(crate) fn decode_read<E>(
    addr: u8,
    register: Register,
    response: &[u8; READ_LEN],
) -> Result<u16, Error<E>> {
    let [lo, hi, crc] = *response;
    let expected = crc8(&[addr << 1, register.addr(), (addr << 1) | 1, lo, hi]);

    if crc != expected {
        return Err(Error::Crc { register });
    }

    Ok(LittleEndian::read_u16(&response[..2]))
}
