//! Core trait describing the fixed-width PCM sample types.
//!
//! The arithmetic layer works on raw little-endian byte buffers, but every
//! operation is written once, generically, over [`PcmSample`]. The three
//! implementors map one-to-one onto the supported sample widths:
//!
//! | width | type  | range                      |
//! |-------|-------|----------------------------|
//! | 1     | `i8`  | `-128 ..= 127`             |
//! | 2     | `i16` | `-32768 ..= 32767`         |
//! | 4     | `i32` | `-2^31 ..= 2^31 - 1`       |
//!
//! 24-bit input never reaches this layer; [`AudioSegment`](crate::AudioSegment)
//! widens it to 32 bits at construction.

use num_traits::{PrimInt, Signed};
use std::fmt::{Debug, Display};

/// A signed, fixed-width PCM sample stored little-endian.
///
/// Besides byte (de)serialisation the trait provides the two numeric
/// policies used by the arithmetic layer: saturating conversion (mixing,
/// scaling) and wrapping conversion (bias).
pub trait PcmSample: PrimInt + Signed + Debug + Display + Send + Sync + 'static {
    /// Width of one sample in bytes.
    const WIDTH: usize;

    /// Reads one sample from the first `WIDTH` bytes of `bytes`.
    fn read_le(bytes: &[u8]) -> Self;

    /// Appends the little-endian encoding of this sample to `out`.
    fn write_le(self, out: &mut Vec<u8>);

    /// Lossless widening to `i64`.
    fn widen(self) -> i64;

    /// Truncating conversion from `i64`, i.e. arithmetic modulo `2^(8·WIDTH)`.
    fn wrapping_from_i64(value: i64) -> Self;

    /// Converts `value`, clamping it to the representable range.
    #[inline]
    fn saturating_from_i64(value: i64) -> Self {
        let min = Self::min_value().widen();
        let max = Self::max_value().widen();
        Self::wrapping_from_i64(value.clamp(min, max))
    }

    /// Rounds `value` to the nearest integer and clamps it to the
    /// representable range. NaN maps to zero.
    #[inline]
    fn saturating_from_f64(value: f64) -> Self {
        let rounded = value.round();
        let min = Self::min_value().widen();
        let max = Self::max_value().widen();
        if rounded >= max as f64 {
            Self::max_value()
        } else if rounded <= min as f64 {
            Self::min_value()
        } else {
            Self::wrapping_from_i64(rounded as i64)
        }
    }

    /// Absolute magnitude; `MIN` maps to `2^(8·WIDTH-1)` without overflow.
    #[inline]
    fn magnitude(self) -> u32 {
        self.widen().unsigned_abs() as u32
    }
}

macro_rules! impl_pcm_sample {
    ($ty:ty, $width:expr) => {
        impl PcmSample for $ty {
            const WIDTH: usize = $width;

            #[inline]
            fn read_le(bytes: &[u8]) -> Self {
                let mut raw = [0u8; $width];
                raw.copy_from_slice(&bytes[..$width]);
                <$ty>::from_le_bytes(raw)
            }

            #[inline]
            fn write_le(self, out: &mut Vec<u8>) {
                out.extend_from_slice(&self.to_le_bytes());
            }

            #[inline]
            fn widen(self) -> i64 {
                i64::from(self)
            }

            #[inline]
            fn wrapping_from_i64(value: i64) -> Self {
                value as $ty
            }
        }
    };
}

impl_pcm_sample!(i8, 1);
impl_pcm_sample!(i16, 2);
impl_pcm_sample!(i32, 4);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_saturating_conversions() {
        assert_eq!(i16::saturating_from_i64(40_000), i16::MAX);
        assert_eq!(i16::saturating_from_i64(-40_000), i16::MIN);
        assert_eq!(i8::saturating_from_f64(12.6), 13);
        assert_eq!(i8::saturating_from_f64(-12.5), -13);
        assert_eq!(i32::saturating_from_f64(1e12), i32::MAX);
        assert_eq!(i16::saturating_from_f64(f64::NAN), 0);
    }

    #[test]
    fn test_wrapping_conversion() {
        assert_eq!(i8::wrapping_from_i64(128), -128);
        assert_eq!(i8::wrapping_from_i64(-129), 127);
        assert_eq!(i16::wrapping_from_i64(65_535), -1);
    }

    #[test]
    fn test_byte_round_trip() {
        let mut out = Vec::new();
        (-2i16).write_le(&mut out);
        assert_eq!(out, vec![0xFE, 0xFF]);
        assert_eq!(i16::read_le(&out), -2);
        assert_eq!(i32::MIN.magnitude(), 1u32 << 31);
    }
}
