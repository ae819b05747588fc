/*
 * SPDX-FileCopyrightText: 2025 UnionTech Software Technology Co., Ltd.
 *
 * SPDX-License-Identifier: GPL-2.0-or-later
 */
//! Linear analog encoding of sensor readings.
//!
//! A reading `y` is carried as a one-byte code `x` with
//! `y = (M * x + B * 10^bExp) * 10^rExp`. M and B are 10-bit signed,
//! the exponents 4-bit signed.

use crate::error::{IpmiError, IpmiResult};

const MAX_INT10: f64 = 0x1FF as f64;
const MIN_INT10: f64 = -0x200 as f64;
const MAX_INT4: i8 = 7;
const MIN_INT4: i8 = -8;

pub const DEFAULT_SENSOR_MAX: f64 = 127.0;
pub const DEFAULT_SENSOR_MIN: f64 = -128.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LinearizationParams {
    pub m: i16,
    pub b: i16,
    pub r_exp: i8,
    pub b_exp: i8,
    pub signed: bool,
}

fn base_in_range(base: f64) -> bool {
    (MIN_INT10..=MAX_INT10).contains(&base)
}

/// Grow `base` to use as many of the 10 bits as possible, then shrink it
/// back into range, moving the decimal exponent along.
fn scale_float_exp(base: &mut f64, exp: &mut i8) -> bool {
    if *base == 0.0 {
        return true;
    }
    while base_in_range(*base) && *exp > MIN_INT4 {
        *base *= 10.0;
        *exp -= 1;
    }
    while !base_in_range(*base) && *exp < MAX_INT4 {
        *base /= 10.0;
        *exp += 1;
    }
    base_in_range(*base)
}

/// Strip trailing decimal zeros from `ibase` into the exponent.
fn normalize_int_exp(ibase: &mut i16, exp: &mut i8, dbase: &mut f64) {
    loop {
        if *ibase == 0 {
            *exp = 0;
            break;
        }
        if *ibase % 10 != 0 || *exp >= MAX_INT4 {
            break;
        }
        *ibase /= 10;
        *dbase /= 10.0;
        *exp += 1;
    }
}

/// Fit M, B and the exponents so that the 256 codes span `[min, max]`.
///
/// NaN bounds take the default signed-byte range; an empty or inverted
/// range falls back to `[-128, 127]` as a whole. Infinite bounds cannot be
/// fitted.
pub fn derive_params(min: f64, max: f64) -> IpmiResult<LinearizationParams> {
    if min.is_infinite() || max.is_infinite() {
        return Err(IpmiError::ResponseError(format!(
            "sensor range [{}, {}] is not finite",
            min, max
        )));
    }
    let mut min = if min.is_nan() { DEFAULT_SENSOR_MIN } else { min };
    let mut max = if max.is_nan() { DEFAULT_SENSOR_MAX } else { max };
    if max <= min {
        min = DEFAULT_SENSOR_MIN;
        max = DEFAULT_SENSOR_MAX;
    }

    let signed = min < 0.0;
    let lowest_x = if signed { -128.0 } else { 0.0 };

    let mut r_exp: i8 = 0;
    let mut b_exp: i8 = 0;

    let mut dm = (max - min) / 255.0;
    if !scale_float_exp(&mut dm, &mut r_exp) {
        return Err(IpmiError::ResponseError(format!(
            "multiplier {} exceeds scale (rExp {})",
            dm, r_exp
        )));
    }
    let mut m = dm.round() as i16;
    normalize_int_exp(&mut m, &mut r_exp, &mut dm);
    if m == 0 {
        return Err(IpmiError::ResponseError(
            "multiplier range below scale".to_string(),
        ));
    }

    let mut db = 10f64.powi(-(r_exp as i32) - b_exp as i32)
        * (min - dm * 10f64.powi(r_exp as i32) * lowest_x);
    if !scale_float_exp(&mut db, &mut b_exp) {
        return Err(IpmiError::ResponseError(format!(
            "offset {} (bExp {}) exceeds multiplier scale",
            db, b_exp
        )));
    }
    let mut b = db.round() as i16;
    normalize_int_exp(&mut b, &mut b_exp, &mut db);

    Ok(LinearizationParams {
        m,
        b,
        r_exp,
        b_exp,
        signed,
    })
}

impl LinearizationParams {
    /// Physical value to one-byte code, clamped to the code range.
    /// Callers handle NaN before getting here.
    pub fn encode(&self, value: f64) -> u8 {
        let m = self.m as f64;
        let b = self.b as f64;
        let x = 10f64.powi(-(self.r_exp as i32))
            * (value - b * 10f64.powi(self.r_exp as i32 + self.b_exp as i32))
            / m;
        let scaled = x.round() as i32;
        if self.signed {
            scaled.clamp(i8::MIN as i32, i8::MAX as i32) as i8 as u8
        } else {
            scaled.clamp(u8::MIN as i32, u8::MAX as i32) as u8
        }
    }

    pub fn decode(&self, raw: u8) -> f64 {
        let x = if self.signed {
            raw as i8 as f64
        } else {
            raw as f64
        };
        (self.m as f64 * x + self.b as f64 * 10f64.powi(self.b_exp as i32))
            * 10f64.powi(self.r_exp as i32)
    }

    /// Size of one code step in physical units.
    pub fn step(&self) -> f64 {
        (self.m as f64).abs() * 10f64.powi(self.r_exp as i32)
    }

    /// Analog fields of a full sensor record, in wire order: M lsb,
    /// M msb + tolerance, B lsb, B msb + accuracy, accuracy + direction,
    /// R/B exponents.
    pub fn sdr_bytes(&self) -> [u8; 6] {
        let (m_lsb, m_msb) = split_10bit(self.m);
        let (b_lsb, b_msb) = split_10bit(self.b);
        [
            m_lsb,
            m_msb,
            b_lsb,
            b_msb,
            0,
            pack_exponents(self.r_exp, self.b_exp),
        ]
    }
}

/// Split a 10-bit two's-complement value into its low byte and a byte
/// carrying bits 9:8 in positions 7:6. The lower six bits of the second
/// byte belong to the neighbouring tolerance/accuracy field and stay 0.
pub fn split_10bit(value: i16) -> (u8, u8) {
    let raw = (value as u16) & 0x3ff;
    ((raw & 0xff) as u8, ((raw >> 8) as u8) << 6)
}

/// R exponent in the high nibble, B exponent in the low nibble, both
/// 4-bit two's complement.
pub fn pack_exponents(r_exp: i8, b_exp: i8) -> u8 {
    (((r_exp as u8) & 0x0f) << 4) | ((b_exp as u8) & 0x0f)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_within_step(min: f64, max: f64) {
        let p = derive_params(min, max).unwrap();
        let step = p.step();
        for i in 0..=200 {
            let v = min + (max - min) * (i as f64) / 200.0;
            let back = p.decode(p.encode(v));
            assert!(
                (back - v).abs() <= step + 1e-9,
                "range [{}, {}]: {} decoded as {} (step {})",
                min,
                max,
                v,
                back,
                step
            );
        }
    }

    #[test]
    fn test_temperature_range() {
        let p = derive_params(-40.0, 125.0).unwrap();
        assert_eq!(
            p,
            LinearizationParams {
                m: 65,
                b: 428,
                r_exp: -2,
                b_exp: 1,
                signed: true
            }
        );
        assert_eq!(p.encode(-40.0), (-127i8) as u8);
        assert_eq!(p.encode(125.0), 126);
    }

    #[test]
    fn test_default_range_is_identity() {
        let p = derive_params(-128.0, 127.0).unwrap();
        assert_eq!((p.m, p.b, p.r_exp, p.b_exp, p.signed), (1, 0, 0, 0, true));
        assert_eq!(p.encode(-5.4), (-5i8) as u8);
        assert_eq!(p.decode(0xfb), -5.0);
    }

    #[test]
    fn test_unsigned_voltage_range() {
        let p = derive_params(0.0, 3.3).unwrap();
        assert!(!p.signed);
        assert_eq!((p.m, p.r_exp, p.b), (129, -4, 0));
        assert_eq!(p.encode(10.0), 255);
        assert_eq!(p.encode(-1.0), 0);
    }

    #[test]
    fn test_decode_within_one_step() {
        assert_within_step(-40.0, 125.0);
        assert_within_step(0.0, 3.3);
        assert_within_step(0.0, 16000.0);
        assert_within_step(-128.0, 127.0);
        assert_within_step(0.0, 255.0);
        assert_within_step(-12.5, 12.5);
    }

    #[test]
    fn test_degenerate_ranges_fall_back() {
        let default = derive_params(DEFAULT_SENSOR_MIN, DEFAULT_SENSOR_MAX).unwrap();
        assert_eq!(derive_params(5.0, 5.0).unwrap(), default);
        assert_eq!(derive_params(f64::NAN, f64::NAN).unwrap(), default);
        assert_eq!(derive_params(10.0, 1.0).unwrap(), default);
        assert!(derive_params(0.0, f64::INFINITY).is_err());
        assert!(derive_params(f64::NEG_INFINITY, 0.0).is_err());
    }

    #[test]
    fn test_split_10bit_bit_positions() {
        assert_eq!(split_10bit(65), (65, 0x00));
        assert_eq!(split_10bit(0x1ff), (0xff, 0x40));
        assert_eq!(split_10bit(-1), (0xff, 0xc0));
        assert_eq!(split_10bit(-512), (0x00, 0x80));
        assert_eq!(split_10bit(-3), (0xfd, 0xc0));
    }

    #[test]
    fn test_pack_exponents() {
        assert_eq!(pack_exponents(-2, 1), 0xe1);
        assert_eq!(pack_exponents(0, 0), 0x00);
        assert_eq!(pack_exponents(7, -8), 0x78);
        assert_eq!(pack_exponents(-8, -1), 0x8f);
    }

    #[test]
    fn test_sdr_bytes_layout() {
        let p = derive_params(-40.0, 125.0).unwrap();
        // B = 428 = 0x1ac
        assert_eq!(p.sdr_bytes(), [65, 0x00, 0xac, 0x40, 0x00, 0xe1]);
    }
}
