//! Linear-interpolation sample rate conversion with carried state.
//!
//! The converter walks a fixed-point step accumulator `d` over the input
//! frames. Input frames are consumed while `d < 0` (each one adds the
//! output rate), output frames are produced while `d >= 0` (each one
//! subtracts the input rate). Both rates are reduced by their greatest
//! common divisor first, so the accumulator stays small.
//!
//! Because every piece of progress is captured in [`RatecvState`], feeding a
//! buffer in fragments and threading the returned state through each call
//! produces exactly the same bytes as one call over the whole buffer.

use serde::{Deserialize, Serialize};

use super::{SampleWidth, check_alignment};
use crate::traits::PcmSample;
use crate::{AudioSegmentError, AudioSegmentResult};

/// Progress of an incremental [`ratecv`] conversion.
///
/// `samples` holds one `(previous, current)` pair per channel, both scaled to
/// the 32-bit domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatecvState {
    /// Fixed-point step accumulator.
    pub d: i64,
    /// Last two filtered input samples for each channel.
    pub samples: Vec<(i32, i32)>,
}

impl RatecvState {
    fn initial(out_rate: i64, channels: usize) -> Self {
        Self {
            d: -out_rate,
            samples: vec![(0, 0); channels],
        }
    }
}

const fn gcd(mut a: i64, mut b: i64) -> i64 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

/// Converts `buf` from `in_rate` to `out_rate`.
///
/// # Arguments
/// * `buf` - Interleaved PCM frames
/// * `width` - Sample width in bytes (1, 2 or 4)
/// * `channels` - Number of interleaved channels
/// * `in_rate` / `out_rate` - Source and target frame rates in Hz
/// * `state` - State returned by a previous call, or `None` to start fresh
/// * `weight_a` / `weight_b` - Coefficients of the one-pole input filter
///   `cur = (weight_a·cur + weight_b·prev) / (weight_a + weight_b)`.
///   `(1, 0)` disables filtering.
///
/// # Returns
/// The converted frames together with the state to pass to the next call.
///
/// # Errors
/// `InvalidWidth` / `MalformedBuffer` on an invalid buffer, `InvalidParameter`
/// on a zero channel count, a zero rate, `weight_a < 1`, or a state whose
/// channel count does not match.
#[allow(clippy::too_many_arguments)]
pub fn ratecv(
    buf: &[u8],
    width: usize,
    channels: usize,
    in_rate: u32,
    out_rate: u32,
    state: Option<&RatecvState>,
    weight_a: u32,
    weight_b: u32,
) -> AudioSegmentResult<(Vec<u8>, RatecvState)> {
    let width = SampleWidth::from_bytes(width)?;
    if channels < 1 {
        return Err(AudioSegmentError::invalid_parameter(
            "ratecv requires at least one channel",
        ));
    }
    check_alignment(buf, width.bytes() * channels)?;
    if in_rate == 0 || out_rate == 0 {
        return Err(AudioSegmentError::invalid_parameter(format!(
            "sampling rates must be positive (got {in_rate} -> {out_rate})"
        )));
    }
    if weight_a < 1 {
        return Err(AudioSegmentError::invalid_parameter(
            "weight_a should be >= 1 and weight_b >= 0",
        ));
    }

    let (in_rate, out_rate) = {
        let (a, b) = (i64::from(in_rate), i64::from(out_rate));
        let g = gcd(a, b);
        (a / g, b / g)
    };
    let (weight_a, weight_b) = {
        let (a, b) = (i64::from(weight_a), i64::from(weight_b));
        let g = gcd(a, b);
        (a / g, b / g)
    };

    let mut state = match state {
        Some(s) if s.samples.len() != channels => {
            return Err(AudioSegmentError::invalid_parameter(format!(
                "illegal state: {} channel entries for {channels} channels",
                s.samples.len()
            )));
        }
        Some(s) => s.clone(),
        None => RatecvState::initial(out_rate, channels),
    };

    let shift = width.shift_to_32();
    let frame_width = width.bytes() * channels;
    let expected_frames =
        (buf.len() / frame_width) as u64 * out_rate as u64 / in_rate as u64 + 1;
    let mut out = Vec::with_capacity(expected_frames as usize * frame_width);

    with_sample_type!(width, S => {
        let mut frames = buf.chunks_exact(frame_width);
        'convert: loop {
            while state.d < 0 {
                let Some(frame) = frames.next() else {
                    break 'convert;
                };
                for (chan, sample) in frame.chunks_exact(S::WIDTH).enumerate() {
                    let (prev, cur) = &mut state.samples[chan];
                    *prev = *cur;
                    let raw = i128::from((S::read_le(sample).widen() as i32) << shift);
                    let filtered = (i128::from(weight_a) * raw
                        + i128::from(weight_b) * i128::from(*prev))
                        / i128::from(weight_a + weight_b);
                    *cur = filtered as i32;
                }
                state.d += out_rate;
            }
            while state.d >= 0 {
                let d = i128::from(state.d);
                for &(prev, cur) in &state.samples {
                    let value = (i128::from(prev) * d
                        + i128::from(cur) * (i128::from(out_rate) - d))
                        / i128::from(out_rate);
                    S::wrapping_from_i64(i64::from((value as i32) >> shift)).write_le(&mut out);
                }
                state.d -= in_rate;
            }
        }
    });

    Ok((out, state))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pcm16(values: &[i16]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    #[test]
    fn test_short_stereo_buffer_keeps_state() {
        let input = [0u8; 4];
        let (out, state) = ratecv(&input, 2, 2, 16000, 24000, None, 1, 0).unwrap();
        assert_eq!(state.d, -2);
        assert!(!out.is_empty());
        assert_eq!(out.len() % 4, 0);
        assert_eq!(state.samples.len(), 2);
    }

    #[test]
    fn test_upsample_doubles_frame_count() {
        let frames = 8000;
        let input: Vec<i16> = (0..frames).map(|i| ((i % 200) * 100 - 10000) as i16).collect();
        let (out, _) = ratecv(&pcm16(&input), 2, 1, 8000, 16000, None, 1, 0).unwrap();
        let out_frames = out.len() / 2;
        assert!(out_frames.abs_diff(2 * frames as usize) <= 1);
    }

    #[test]
    fn test_identity_rate_reproduces_input() {
        let input = pcm16(&[5, -7, 300, -32768, 32767]);
        let (out, _) = ratecv(&input, 2, 1, 44100, 44100, None, 1, 0).unwrap();
        assert_eq!(out, input);
    }

    #[test]
    fn test_incremental_conversion_matches_single_call() {
        let samples: Vec<i16> = (0..600).map(|i| ((i * 37) % 4000 - 2000) as i16).collect();
        let whole = pcm16(&samples);
        let (expected, expected_state) = ratecv(&whole, 2, 2, 44100, 16000, None, 1, 0).unwrap();

        let split = 4 * 123;
        let (mut first, state) = ratecv(&whole[..split], 2, 2, 44100, 16000, None, 1, 0).unwrap();
        let (second, final_state) =
            ratecv(&whole[split..], 2, 2, 44100, 16000, Some(&state), 1, 0).unwrap();
        first.extend_from_slice(&second);

        assert_eq!(first, expected);
        assert_eq!(final_state, expected_state);
    }

    #[test]
    fn test_filter_weights_smooth_input() {
        let input = pcm16(&[0, 1000, 0, 1000]);
        let (plain, _) = ratecv(&input, 2, 1, 8000, 8000, None, 1, 0).unwrap();
        let (smoothed, _) = ratecv(&input, 2, 1, 8000, 8000, None, 1, 1).unwrap();
        assert_ne!(plain, smoothed);
        assert_eq!(&smoothed[2..4], &500i16.to_le_bytes());
    }

    #[test]
    fn test_parameter_validation() {
        let input = pcm16(&[0, 0]);
        assert!(matches!(
            ratecv(&input, 2, 0, 8000, 16000, None, 1, 0),
            Err(AudioSegmentError::InvalidParameter(_))
        ));
        assert!(matches!(
            ratecv(&input, 2, 1, 0, 16000, None, 1, 0),
            Err(AudioSegmentError::InvalidParameter(_))
        ));
        assert!(matches!(
            ratecv(&input, 2, 1, 8000, 16000, None, 0, 0),
            Err(AudioSegmentError::InvalidParameter(_))
        ));
        assert!(matches!(
            ratecv(&input[..3], 2, 1, 8000, 16000, None, 1, 0),
            Err(AudioSegmentError::MalformedBuffer { .. })
        ));

        let stale = RatecvState { d: -1, samples: vec![(0, 0); 2] };
        assert!(matches!(
            ratecv(&input, 2, 1, 8000, 16000, Some(&stale), 1, 0),
            Err(AudioSegmentError::InvalidParameter(_))
        ));
    }
}
