//! Sample arithmetic over raw PCM byte buffers.
//!
//! Every function in this module takes a little-endian PCM buffer together
//! with its declared sample width in bytes and returns a freshly allocated
//! buffer (or a scalar measurement). Nothing here knows about channels,
//! frame rates or durations except where an operation is inherently
//! frame-based ([`tomono`], [`tostereo`], [`ratecv`]).
//!
//! ## Numeric policy
//!
//! - Scaling and mixing ([`mul`], [`add`], [`tomono`], [`tostereo`]) saturate
//!   to the range of the sample width. Nothing wraps silently.
//! - [`bias`] is the single exception: it wraps modulo `2^(8·width)`, which
//!   is exactly what flipping between signed and unsigned 8-bit needs.
//!
//! ## Validation
//!
//! Widths other than 1, 2 and 4 fail with
//! [`AudioSegmentError::InvalidWidth`]; buffers whose length is not a whole
//! number of samples fail with [`AudioSegmentError::MalformedBuffer`].
//!
//! ```rust
//! use audio_segment::audioop;
//!
//! # fn example() -> Result<(), audio_segment::AudioSegmentError> {
//! // two 16-bit samples: 1000 and -1000
//! let buf = [0xE8, 0x03, 0x18, 0xFC];
//! let louder = audioop::mul(&buf, 2, 2.0)?;
//! assert_eq!(audioop::max(&louder, 2)?, 2000);
//! # Ok(())
//! # }
//! ```

use crate::traits::PcmSample;
use crate::{AudioSegmentError, AudioSegmentResult};

/// The closed set of sample widths the arithmetic layer understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleWidth {
    /// 8-bit samples.
    One,
    /// 16-bit samples.
    Two,
    /// 32-bit samples.
    Four,
}

impl SampleWidth {
    /// Validates a width given in bytes.
    pub const fn from_bytes(width: usize) -> AudioSegmentResult<Self> {
        match width {
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            4 => Ok(Self::Four),
            _ => Err(AudioSegmentError::InvalidWidth { width }),
        }
    }

    /// Width in bytes.
    pub const fn bytes(self) -> usize {
        match self {
            Self::One => 1,
            Self::Two => 2,
            Self::Four => 4,
        }
    }

    /// Left shift that moves a sample of this width into the 32-bit domain.
    const fn shift_to_32(self) -> u32 {
        32 - 8 * self.bytes() as u32
    }
}

impl TryFrom<usize> for SampleWidth {
    type Error = AudioSegmentError;

    fn try_from(width: usize) -> Result<Self, Self::Error> {
        Self::from_bytes(width)
    }
}

/// Binds `$S` to the concrete sample type for `$width` and evaluates `$body`.
macro_rules! with_sample_type {
    ($width:expr, $S:ident => $body:expr) => {
        match $width {
            SampleWidth::One => {
                type $S = i8;
                $body
            }
            SampleWidth::Two => {
                type $S = i16;
                $body
            }
            SampleWidth::Four => {
                type $S = i32;
                $body
            }
        }
    };
}

mod ratecv;

pub use ratecv::{RatecvState, ratecv};

/// Validates `width` and checks that `buf` holds whole samples.
fn check_fragment(buf: &[u8], width: usize) -> AudioSegmentResult<SampleWidth> {
    let width = SampleWidth::from_bytes(width)?;
    check_alignment(buf, width.bytes())?;
    Ok(width)
}

fn check_alignment(buf: &[u8], unit: usize) -> AudioSegmentResult<()> {
    if unit == 0 || buf.len() % unit != 0 {
        return Err(AudioSegmentError::MalformedBuffer {
            len: buf.len(),
            unit,
        });
    }
    Ok(())
}

#[inline]
fn samples<S: PcmSample>(buf: &[u8]) -> impl DoubleEndedIterator<Item = S> + '_ {
    buf.chunks_exact(S::WIDTH).map(S::read_le)
}

fn map_samples<S: PcmSample>(buf: &[u8], f: impl Fn(S) -> S) -> Vec<u8> {
    let mut out = Vec::with_capacity(buf.len());
    for sample in samples::<S>(buf) {
        f(sample).write_le(&mut out);
    }
    out
}

/// Multiplies every sample by `factor`, rounding to the nearest integer and
/// saturating to the width's range.
///
/// # Errors
/// `InvalidWidth` / `MalformedBuffer` on invalid input.
pub fn mul(buf: &[u8], width: usize, factor: f64) -> AudioSegmentResult<Vec<u8>> {
    let width = check_fragment(buf, width)?;
    Ok(with_sample_type!(width, S => map_samples::<S>(buf, |s| {
        S::saturating_from_f64(s.widen() as f64 * factor)
    })))
}

/// Adds two fragments sample by sample, saturating.
///
/// # Errors
/// Fails with `DimensionMismatch` if the fragments differ in length, and
/// with `InvalidWidth` / `MalformedBuffer` on invalid input.
pub fn add(a: &[u8], b: &[u8], width: usize) -> AudioSegmentResult<Vec<u8>> {
    let width = check_fragment(a, width)?;
    if a.len() != b.len() {
        return Err(AudioSegmentError::DimensionMismatch(format!(
            "Fragments must have the same length to be added ({} vs {} bytes)",
            a.len(),
            b.len()
        )));
    }

    Ok(with_sample_type!(width, S => {
        let mut out = Vec::with_capacity(a.len());
        for (x, y) in samples::<S>(a).zip(samples::<S>(b)) {
            S::saturating_from_i64(x.widen() + y.widen()).write_le(&mut out);
        }
        out
    }))
}

/// Adds `bias` to every sample, wrapping modulo `2^(8·width)`.
///
/// # Errors
/// `InvalidWidth` / `MalformedBuffer` on invalid input.
pub fn bias(buf: &[u8], width: usize, bias: i64) -> AudioSegmentResult<Vec<u8>> {
    let width = check_fragment(buf, width)?;
    Ok(with_sample_type!(width, S => map_samples::<S>(buf, |s| {
        S::wrapping_from_i64(s.widen().wrapping_add(bias))
    })))
}

/// Reverses the order of the samples; bytes inside a sample keep their order.
///
/// # Errors
/// `InvalidWidth` / `MalformedBuffer` on invalid input.
pub fn reverse(buf: &[u8], width: usize) -> AudioSegmentResult<Vec<u8>> {
    let width = check_fragment(buf, width)?;
    let mut out = Vec::with_capacity(buf.len());
    for sample in buf.chunks_exact(width.bytes()).rev() {
        out.extend_from_slice(sample);
    }
    Ok(out)
}

/// Maximum absolute sample value. An empty fragment yields 0.
///
/// # Errors
/// `InvalidWidth` / `MalformedBuffer` on invalid input.
pub fn max(buf: &[u8], width: usize) -> AudioSegmentResult<u32> {
    let width = check_fragment(buf, width)?;
    Ok(with_sample_type!(width, S => {
        samples::<S>(buf).map(PcmSample::magnitude).max().unwrap_or(0)
    }))
}

/// Root mean square of the samples: `sqrt(Σ s² / n)`.
///
/// The sum of squares is accumulated exactly in 128 bits, so arbitrarily long
/// 32-bit fragments cannot overflow. An empty fragment yields 0.
///
/// # Errors
/// `InvalidWidth` / `MalformedBuffer` on invalid input.
pub fn rms(buf: &[u8], width: usize) -> AudioSegmentResult<f64> {
    let width = check_fragment(buf, width)?;
    let count = buf.len() / width.bytes();
    if count == 0 {
        return Ok(0.0);
    }

    let sum_squares: u128 = with_sample_type!(width, S => {
        samples::<S>(buf)
            .map(|s| {
                let v = s.widen().unsigned_abs() as u128;
                v * v
            })
            .sum()
    });

    Ok((sum_squares as f64 / count as f64).sqrt())
}

/// Converts samples between widths.
///
/// Each sample is moved into the 32-bit domain (`s << (32 - 8·src)`) and
/// back out with an arithmetic shift (`>> (32 - 8·dst)`): widening appends
/// zero low-order bytes, narrowing drops them. Sign and the most significant
/// bits of amplitude are preserved.
///
/// # Errors
/// `InvalidWidth` for either width, `MalformedBuffer` if `buf` is not a whole
/// number of `src_width` samples.
pub fn lin2lin(buf: &[u8], src_width: usize, dst_width: usize) -> AudioSegmentResult<Vec<u8>> {
    let src = check_fragment(buf, src_width)?;
    let dst = SampleWidth::from_bytes(dst_width)?;
    if src == dst {
        return Ok(buf.to_vec());
    }

    let scaled: Vec<i32> = with_sample_type!(src, S => {
        samples::<S>(buf)
            .map(|s| (s.widen() as i32) << src.shift_to_32())
            .collect()
    });

    let mut out = Vec::with_capacity(scaled.len() * dst.bytes());
    with_sample_type!(dst, D => {
        for value in scaled {
            D::wrapping_from_i64(i64::from(value >> dst.shift_to_32())).write_le(&mut out);
        }
    });
    Ok(out)
}

/// Combines interleaved stereo into mono: `out = left·fac1 + right·fac2`,
/// rounded and saturated.
///
/// # Errors
/// `InvalidWidth` on an invalid width, `MalformedBuffer` if `buf` is not a
/// whole number of stereo frames.
pub fn tomono(buf: &[u8], width: usize, fac1: f64, fac2: f64) -> AudioSegmentResult<Vec<u8>> {
    let width = SampleWidth::from_bytes(width)?;
    check_alignment(buf, width.bytes() * 2)?;

    Ok(with_sample_type!(width, S => {
        let mut out = Vec::with_capacity(buf.len() / 2);
        for frame in buf.chunks_exact(S::WIDTH * 2) {
            let left = S::read_le(frame).widen() as f64;
            let right = S::read_le(&frame[S::WIDTH..]).widen() as f64;
            S::saturating_from_f64(left * fac1 + right * fac2).write_le(&mut out);
        }
        out
    }))
}

/// Expands mono into interleaved stereo: `left = s·fac1`, `right = s·fac2`,
/// rounded and saturated.
///
/// # Errors
/// `InvalidWidth` / `MalformedBuffer` on invalid input.
pub fn tostereo(buf: &[u8], width: usize, fac1: f64, fac2: f64) -> AudioSegmentResult<Vec<u8>> {
    let width = check_fragment(buf, width)?;

    Ok(with_sample_type!(width, S => {
        let mut out = Vec::with_capacity(buf.len() * 2);
        for s in samples::<S>(buf) {
            let value = s.widen() as f64;
            S::saturating_from_f64(value * fac1).write_le(&mut out);
            S::saturating_from_f64(value * fac2).write_le(&mut out);
        }
        out
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pcm16(values: &[i16]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    fn unpack16(buf: &[u8]) -> Vec<i16> {
        buf.chunks_exact(2)
            .map(|c| i16::from_le_bytes([c[0], c[1]]))
            .collect()
    }

    #[test]
    fn test_width_validation() {
        assert!(matches!(
            mul(&[0, 0, 0], 3, 1.0),
            Err(AudioSegmentError::InvalidWidth { width: 3 })
        ));
        assert!(matches!(
            rms(&[0, 0, 0], 2),
            Err(AudioSegmentError::MalformedBuffer { len: 3, unit: 2 })
        ));
        assert!(matches!(
            tomono(&pcm16(&[1, 2, 3]), 2, 0.5, 0.5),
            Err(AudioSegmentError::MalformedBuffer { unit: 4, .. })
        ));
    }

    #[test]
    fn test_mul_rounds_and_saturates() {
        let buf = pcm16(&[1000, -1000, 30000, 3]);
        let out = unpack16(&mul(&buf, 2, 1.5).unwrap());
        assert_eq!(out, vec![1500, -1500, i16::MAX, 5]);

        let silenced = mul(&buf, 2, 0.0).unwrap();
        assert!(silenced.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_mul_inverse_approximates_original() {
        let original = [1200i16, -3400, 5, 0, -32000];
        let buf = pcm16(&original);
        let halved = mul(&buf, 2, 0.5).unwrap();
        let restored = unpack16(&mul(&halved, 2, 2.0).unwrap());
        for (a, b) in original.iter().zip(restored.iter()) {
            assert!((i32::from(*a) - i32::from(*b)).abs() <= 1);
        }
    }

    #[test]
    fn test_add_saturates_and_checks_length() {
        let a = pcm16(&[30000, -30000, 10]);
        let b = pcm16(&[10000, -10000, -20]);
        assert_eq!(
            unpack16(&add(&a, &b, 2).unwrap()),
            vec![i16::MAX, i16::MIN, -10]
        );
        assert!(matches!(
            add(&a, &b[..4], 2),
            Err(AudioSegmentError::DimensionMismatch(_))
        ));
    }

    #[test]
    fn test_bias_wraps() {
        let buf = [0u8, 127, 0x80, 0xFF];
        assert_eq!(bias(&buf, 1, 128).unwrap(), vec![0x80, 0xFF, 0x00, 0x7F]);
        assert_eq!(bias(&buf, 1, -128).unwrap(), vec![0x80, 0xFF, 0x00, 0x7F]);

        let buf = pcm16(&[i16::MAX]);
        assert_eq!(unpack16(&bias(&buf, 2, 1).unwrap()), vec![i16::MIN]);
    }

    #[test]
    fn test_reverse_keeps_sample_bytes() {
        let buf = pcm16(&[1, 2, 3]);
        assert_eq!(unpack16(&reverse(&buf, 2).unwrap()), vec![3, 2, 1]);
    }

    #[test]
    fn test_max_and_rms() {
        assert_eq!(max(&[], 2).unwrap(), 0);
        assert_eq!(rms(&[], 4).unwrap(), 0.0);

        let buf = pcm16(&[3, -4, 0, i16::MIN]);
        assert_eq!(max(&buf, 2).unwrap(), 32768);

        let buf = pcm16(&[3, -3, 3, -3]);
        assert_eq!(rms(&buf, 2).unwrap(), 3.0);
    }

    #[test]
    fn test_rms_does_not_overflow_on_long_fragments() {
        let frames = 2_000_000;
        let buf: Vec<u8> = std::iter::repeat(i32::MIN.to_le_bytes())
            .take(frames)
            .flatten()
            .collect();
        let value = rms(&buf, 4).unwrap();
        assert_eq!(value, 2147483648.0);
    }

    #[test]
    fn test_lin2lin_widen_and_narrow() {
        let buf = [0x7Fu8, 0x80, 0xFF];
        let wide = lin2lin(&buf, 1, 2).unwrap();
        assert_eq!(unpack16(&wide), vec![0x7F00, i16::MIN, -256]);

        let narrow = lin2lin(&wide, 2, 1).unwrap();
        assert_eq!(narrow, buf.to_vec());

        let buf32 = lin2lin(&pcm16(&[-2]), 2, 4).unwrap();
        assert_eq!(i32::from_le_bytes([buf32[0], buf32[1], buf32[2], buf32[3]]), -2 << 16);
    }

    #[test]
    fn test_channel_conversions() {
        let stereo = tostereo(&pcm16(&[100, -20000]), 2, 1.0, 2.0).unwrap();
        assert_eq!(unpack16(&stereo), vec![100, 200, -20000, i16::MIN]);

        let mono = tomono(&pcm16(&[100, 300, -5, -6]), 2, 0.5, 0.5).unwrap();
        assert_eq!(unpack16(&mono), vec![200, -6]);
    }
}
