//! IBM System/360 single-precision hexadecimal floats (SEG-Y format code 1).
//!
//! Layout: 1 sign bit, 7-bit excess-64 base-16 exponent, 24-bit fraction.
//! value = (-1)^sign * 0.fraction * 16^(exponent - 64)

const FRACTION_MASK: u32 = 0x00ff_ffff;
const FRACTION_SCALE: f64 = 16_777_216.0; // 2^24

pub fn ibm_to_f32(bits: u32) -> f32 {
    let sign = if bits >> 31 == 1 { -1.0 } else { 1.0 };
    let exponent = ((bits >> 24) & 0x7f) as i32;
    let fraction = bits & FRACTION_MASK;
    if fraction == 0 {
        return 0.0;
    }
    let value = fraction as f64 / FRACTION_SCALE * 16f64.powi(exponent - 64);
    (sign * value) as f32
}

/// Encode an `f32` as an IBM float. Non-finite inputs encode as zero;
/// magnitudes beyond the IBM range saturate, those below it flush to zero.
pub fn f32_to_ibm(value: f32) -> u32 {
    if !value.is_finite() || value == 0.0 {
        return 0;
    }
    let sign: u32 = if value.is_sign_negative() { 1 << 31 } else { 0 };
    let mut magnitude = (value as f64).abs();
    let mut exponent: i32 = 64;

    // Scaling by 16 is exact in f64, so normalization loses nothing.
    while magnitude >= 1.0 {
        magnitude /= 16.0;
        exponent += 1;
    }
    while magnitude < 1.0 / 16.0 {
        magnitude *= 16.0;
        exponent -= 1;
    }

    let mut fraction = (magnitude * FRACTION_SCALE).round() as u32;
    if fraction > FRACTION_MASK {
        fraction >>= 4;
        exponent += 1;
    }

    if exponent > 127 {
        return sign | 0x7fff_ffff;
    }
    if exponent < 0 {
        return sign;
    }
    sign | ((exponent as u32) << 24) | fraction
}
