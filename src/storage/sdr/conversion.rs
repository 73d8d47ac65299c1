//! The raw-reading-to-engineering-units conversion engine (IPMI v2.0 §36.4).

use super::record::{DataFormat, Linearization};

/// Reading factors extracted from a full sensor record's packed factors
/// bytes, or from a fresh `GetSensorFactors` response for a non-linear
/// sensor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Factors {
    /// Signed 10-bit multiplier.
    pub m: i16,
    /// Signed 10-bit additive offset.
    pub b: i16,
    /// Signed 4-bit exponent applied to `b`.
    pub b_exponent: i8,
    /// Signed 4-bit exponent applied to the final linear result.
    pub result_exponent: i8,
    /// 10-bit accuracy value.
    pub accuracy: u16,
    /// 2-bit accuracy exponent.
    pub accuracy_exponent: u8,
    /// Raw 7-bit linearization code.
    pub linearization: u8,
}

impl Factors {
    /// `true` for linearization codes `0x70..=0x7F` — the sensor is
    /// non-linear and must have fresh factors fetched per reading rather
    /// than ever being cached (§4.7, §9 "Non-linear sensors").
    pub fn is_non_linear(linearization: u8) -> bool {
        (0x70..=0x7F).contains(&linearization)
    }
}

/// Decode a signed 10-bit `M`/`B` pair from its packed wire bytes: `lsb` is
/// the full low byte, and `msb` is the 2-bit field occupying the top two
/// bits of the following byte (bit 1 = sign, bit 0 = bit 8 of the
/// magnitude). Reconstructed as `-512 + ((msb&1)<<8) + lsb` when the sign
/// bit is set, else `((msb&1)<<8) + lsb` (§4.1).
pub fn decode_signed_10(lsb: u8, msb: u8) -> i16 {
    let msb = msb & 0x3;
    let magnitude = ((msb as i16 & 0x1) << 8) | lsb as i16;

    if msb & 0x2 == 0x2 {
        -512 + magnitude
    } else {
        magnitude
    }
}

/// Decode a signed 4-bit exponent nibble: if the high bit (bit 3) is set,
/// `-8 + (nibble & 7)`, else the nibble itself (§4.1).
pub fn decode_signed_4(nibble: u8) -> i8 {
    let nibble = nibble & 0xF;

    if nibble & 0x8 == 0x8 {
        -8 + (nibble & 0x7) as i8
    } else {
        nibble as i8
    }
}

/// Reinterpret a raw reading byte per its analog format (§4.7 step 1).
///
/// The 1's-complement case follows the IPMI rule: if the MSB is set, add
/// one before casting to a signed 8-bit value.
pub fn reinterpret(value: u8, format: DataFormat) -> f64 {
    match format {
        DataFormat::Unsigned => value as f64,
        DataFormat::OnesComplement => {
            let value = if value & 0x80 == 0x80 {
                value.wrapping_add(1)
            } else {
                value
            };
            value as i8 as f64
        }
        DataFormat::TwosComplement => value as i8 as f64,
    }
}

/// Compute `y = L((M*x + B*10^Bexp) * 10^Rexp)` for raw reading `value`
/// under analog format `format` and reading factors `factors` (§4.7).
pub fn convert(value: u8, format: DataFormat, factors: &Factors) -> f64 {
    let x = reinterpret(value, format);

    let m = factors.m as f64;
    let b = factors.b as f64 * 10f64.powi(factors.b_exponent as i32);
    let linear = (m * x + b) * 10f64.powi(factors.result_exponent as i32);

    apply_linearization(linear, Linearization::from(factors.linearization))
}

fn apply_linearization(y: f64, linearization: Linearization) -> f64 {
    match linearization {
        Linearization::Linear => y,
        Linearization::Ln => y.ln(),
        Linearization::Log10 => y.log10(),
        Linearization::Log2 => y.ln() / std::f64::consts::LN_2,
        Linearization::E => y.exp(),
        Linearization::Exp10 => 10f64.powf(y),
        Linearization::Exp2 => 2f64.powf(y),
        Linearization::OneOverX => 1.0 / y,
        Linearization::Sqr => y * y,
        Linearization::Cube => y * y * y,
        Linearization::Sqrt => y.sqrt(),
        Linearization::CubeRoot => y.cbrt(),
        // Non-linear sensors never reach the conversion engine (§4.7);
        // anything else (OEM/unknown) passes through unmodified.
        Linearization::Oem(_) | Linearization::Unknown(_) => y,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity_factors() -> Factors {
        Factors {
            m: 1,
            b: 0,
            b_exponent: 0,
            result_exponent: 0,
            accuracy: 0,
            accuracy_exponent: 0,
            linearization: 0,
        }
    }

    #[test]
    fn identity_unsigned_passes_through() {
        let f = identity_factors();
        assert_eq!(convert(64, DataFormat::Unsigned, &f), 64.0);
    }

    #[test]
    fn identity_twos_complement_is_signed() {
        let f = identity_factors();
        assert_eq!(convert(0x80, DataFormat::TwosComplement, &f), -128.0);
    }

    #[test]
    fn log10_example_from_spec() {
        let f = Factors {
            m: 2,
            b: 5,
            b_exponent: 1,
            result_exponent: -1,
            accuracy: 0,
            accuracy_exponent: 0,
            linearization: 2,
        };
        let got = convert(10, DataFormat::Unsigned, &f);
        assert!((got - 7.0f64.log10()).abs() < 1e-9);
    }

    #[test]
    fn signed_10_bit_covers_full_range() {
        for msb in 0u8..4 {
            for lsb in 0u8..=255 {
                let got = decode_signed_10(lsb, msb);
                assert!((-512..=511).contains(&got));

                let expect = if msb & 0x2 == 0x2 {
                    -512 + (((msb & 1) as i16) << 8) + lsb as i16
                } else {
                    (((msb & 1) as i16) << 8) + lsb as i16
                };
                assert_eq!(got, expect);
            }
        }
    }

    #[test]
    fn signed_4_bit_exponent() {
        assert_eq!(decode_signed_4(0b0000), 0);
        assert_eq!(decode_signed_4(0b0111), 7);
        assert_eq!(decode_signed_4(0b1000), -8);
        assert_eq!(decode_signed_4(0b1111), -1);
    }

    #[test]
    fn non_linear_detection() {
        assert!(Factors::is_non_linear(0x70));
        assert!(Factors::is_non_linear(0x7F));
        assert!(!Factors::is_non_linear(0x6F));
        assert!(!Factors::is_non_linear(11));
    }
}
