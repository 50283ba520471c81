//! Pure conversions between raw register codes and physical units.
//! Any of these can be handed to `read_scaled`.

/// 0 °C expressed in 0.1 K
const ZERO_CELSIUS_DECI_KELVIN: f32 = 2731.5;

pub fn millivolts(raw: u16) -> u16 {
    raw
}

pub fn volts(raw: u16) -> f32 {
    raw as f32 / 1000.0
}

/// Percentage from a register counting in 1 % steps (RSOC, alarm threshold).
/// `None` past 100 %
pub fn percent(raw: u16) -> Option<u8> {
    u8::try_from(raw).ok().filter(|p| *p <= 100)
}

/// Percentage from a register counting in 0.1 % steps (ITE)
pub fn tenth_percent(raw: u16) -> f32 {
    raw as f32 / 10.0
}

/// Same as `tenth_percent`, `None` past 100 %
pub fn tenth_percent_checked(raw: u16) -> Option<f32> {
    (raw <= 1000).then(|| tenth_percent(raw))
}

/// Cell temperature register code (0.1 K) to degrees Celsius
pub fn celsius(raw: u16) -> f32 {
    (raw as f32 - ZERO_CELSIUS_DECI_KELVIN) / 10.0
}

/// Degrees Celsius to the cell temperature register code, rounded to the nearest 0.1 K.
/// Saturates at the ends of the `u16` range, the caller is expected to check the domain.
pub fn celsius_to_raw(celsius: f32) -> u16 {
    let deci_kelvin = celsius * 10.0 + ZERO_CELSIUS_DECI_KELVIN;
    (deci_kelvin + 0.5) as u16
}
