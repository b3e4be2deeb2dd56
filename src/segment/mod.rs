//! The immutable [`AudioSegment`] value type.
//!
//! A segment is a PCM byte buffer plus the format needed to interpret it:
//! sample width, frame rate and channel count. Every operation that looks
//! like a mutation (slicing, gain, overlay, format forks) returns a new
//! segment; the receiver is never modified.
//!
//! The byte buffer is reference counted, so clones and identity forks share
//! storage. The RMS level is computed lazily and cached in a write-once cell,
//! which is sound because the bytes it describes never change.
//!
//! ## Time and frames
//!
//! Positions are integer milliseconds. A millisecond position maps to a
//! frame index with `frames = ms · frame_rate / 1000`, truncated, after the
//! position has been clamped to the segment's [`duration`](AudioSegment::duration).
//!
//! ```rust
//! use audio_segment::{AudioSegment, Volume};
//!
//! # fn example() -> Result<(), audio_segment::AudioSegmentError> {
//! let tone = AudioSegment::new(vec![0x10u8, 0x27].repeat(8000), 2, 8000, 1)?;
//! assert_eq!(tone.duration(), 1000);
//!
//! let first_half = tone.slice(0, 500)?;
//! let quieter = first_half.apply_gain(Volume::from_db(-6.0))?;
//! assert_eq!(quieter.frame_count(), 4000);
//! # Ok(())
//! # }
//! ```

mod conversion;
mod overlay;

pub use conversion::{ChannelConversion, WidthConversion};
pub use overlay::OverlayConfig;

use std::borrow::Cow;
use std::fmt;
use std::sync::{Arc, OnceLock};

use tracing::warn;

use crate::audioop;
use crate::codec::{DecodedAudio, PcmFormat};
use crate::{AudioSegmentError, AudioSegmentResult, Volume};

/// An immutable span of PCM audio.
#[derive(Debug, Clone)]
pub struct AudioSegment {
    sample_width: usize,
    frame_rate: u32,
    channels: usize,
    frame_width: usize,
    data: Arc<[u8]>,
    rms: OnceLock<f64>,
}

impl AudioSegment {
    /// Creates a segment from little-endian interleaved PCM bytes.
    ///
    /// 24-bit input (`sample_width == 3`) is widened to 32 bits here: each
    /// sample `b0 b1 b2` is stored as `pad b0 b1 b2`, with `pad` taken from
    /// the sign of `b2`. Everything downstream only sees widths 1, 2 and 4.
    ///
    /// # Arguments
    /// * `data` - Interleaved PCM frames
    /// * `sample_width` - Bytes per sample (1, 2, 3 or 4)
    /// * `frame_rate` - Frames per second
    /// * `channels` - Number of interleaved channels, at least 1
    ///
    /// # Errors
    /// `InvalidWidth` for an unsupported width, `InvalidParameter` for zero
    /// channels, and `MalformedBuffer` when `data` is not a whole number of
    /// frames.
    pub fn new(
        data: impl Into<Vec<u8>>,
        sample_width: usize,
        frame_rate: u32,
        channels: usize,
    ) -> AudioSegmentResult<Self> {
        let data = data.into();
        if channels == 0 {
            return Err(AudioSegmentError::invalid_parameter(
                "an audio segment needs at least one channel",
            ));
        }

        let frame_width = sample_width * channels;
        let (data, sample_width) = match sample_width {
            1 | 2 | 4 => (data, sample_width),
            3 => (widen_24_bit(&data, frame_width)?, 4),
            _ => return Err(AudioSegmentError::InvalidWidth { width: sample_width }),
        };
        if data.len() % (sample_width * channels) != 0 {
            return Err(AudioSegmentError::MalformedBuffer {
                len: data.len(),
                unit: sample_width * channels,
            });
        }

        Ok(Self::from_parts(data.into(), sample_width, frame_rate, channels))
    }

    /// A segment with no audio: 8-bit mono at 1 Hz.
    pub fn empty() -> Self {
        Self::from_parts(Arc::from(Vec::new()), 1, 1, 1)
    }

    /// `duration_ms` of digital silence as 16-bit mono at `frame_rate`.
    pub fn silent(duration_ms: i64, frame_rate: u32) -> Self {
        let frames = (f64::from(frame_rate) * (duration_ms.max(0) as f64 / 1000.0)) as usize;
        Self::from_parts(vec![0u8; frames * 2].into(), 2, frame_rate, 1)
    }

    /// Builds a segment from the output of a [`Decoder`](crate::codec::Decoder).
    ///
    /// # Errors
    /// `UnsupportedFormat` for floating point audio, otherwise the errors of
    /// [`AudioSegment::new`].
    pub fn from_decoded(decoded: DecodedAudio) -> AudioSegmentResult<Self> {
        if decoded.format != PcmFormat::Integer {
            return Err(AudioSegmentError::UnsupportedFormat(format!(
                "cannot hold {:?} samples in an audio segment",
                decoded.format
            )));
        }
        Self::new(
            decoded.data,
            decoded.sample_width,
            decoded.frame_rate,
            decoded.channels,
        )
    }

    /// The exchange tuple an [`Encoder`](crate::codec::Encoder) accepts.
    pub fn to_decoded(&self) -> DecodedAudio {
        DecodedAudio {
            sample_width: self.sample_width,
            frame_rate: self.frame_rate,
            channels: self.channels,
            data: self.data.to_vec(),
            format: PcmFormat::Integer,
        }
    }

    fn from_parts(data: Arc<[u8]>, sample_width: usize, frame_rate: u32, channels: usize) -> Self {
        Self {
            sample_width,
            frame_rate,
            channels,
            frame_width: sample_width * channels,
            data,
            rms: OnceLock::new(),
        }
    }

    /// A new segment in the same format holding `data`.
    fn derive(&self, data: Vec<u8>) -> Self {
        Self::from_parts(data.into(), self.sample_width, self.frame_rate, self.channels)
    }

    /// Bytes per sample.
    pub const fn sample_width(&self) -> usize {
        self.sample_width
    }

    /// Frames per second.
    pub const fn frame_rate(&self) -> u32 {
        self.frame_rate
    }

    /// Number of interleaved channels.
    pub const fn channels(&self) -> usize {
        self.channels
    }

    /// Bytes per frame.
    pub const fn frame_width(&self) -> usize {
        self.frame_width
    }

    /// The PCM bytes.
    pub fn raw_data(&self) -> &[u8] {
        &self.data
    }

    /// Number of whole frames, or 0 when the frame width is 0.
    pub fn frame_count(&self) -> usize {
        if self.frame_width == 0 {
            0
        } else {
            self.data.len() / self.frame_width
        }
    }

    /// Length in milliseconds, rounded to the nearest millisecond.
    pub fn duration(&self) -> i64 {
        if self.frame_rate == 0 {
            return 0;
        }
        (1000.0 * self.frame_count() as f64 / f64::from(self.frame_rate)).round() as i64
    }

    /// Number of frames in `ms` milliseconds, with `ms` clamped to the
    /// segment's duration.
    pub fn frame_count_in(&self, ms: i64) -> f64 {
        let ms = ms.min(self.duration());
        ms as f64 * (f64::from(self.frame_rate) / 1000.0)
    }

    fn position_index(&self, ms: i64) -> usize {
        self.frame_count_in(ms) as usize * self.frame_width
    }

    /// Extracts `[start_ms, end_ms)` as a new segment.
    ///
    /// Both bounds are clamped to the duration. When truncation leaves the
    /// result short of the requested length by at most 2 ms, it is padded
    /// with silent frames.
    ///
    /// # Errors
    /// `InvalidRange` if `start_ms > end_ms`, if either bound is negative,
    /// or if more than 2 ms of padding would be needed.
    pub fn slice(&self, start_ms: i64, end_ms: i64) -> AudioSegmentResult<Self> {
        if start_ms > end_ms {
            return Err(AudioSegmentError::invalid_range(
                "start should be smaller than end",
            ));
        }
        if start_ms < 0 || end_ms < 0 {
            return Err(AudioSegmentError::invalid_range(
                "start or end should be positive",
            ));
        }

        let bytes = self.window_bytes(start_ms, end_ms)?;
        Ok(self.derive(bytes.into_owned()))
    }

    /// Raw bytes of `[start_ms, end_ms)` after clamping, borrowed when no
    /// silence fill is required.
    pub(crate) fn window_bytes(
        &self,
        start_ms: i64,
        end_ms: i64,
    ) -> AudioSegmentResult<Cow<'_, [u8]>> {
        let duration = self.duration();
        let start_idx = self.position_index(start_ms.clamp(0, duration));
        let end_idx = self.position_index(end_ms.clamp(0, duration));
        let expected_len = end_idx.saturating_sub(start_idx);

        let start_idx = start_idx.min(self.data.len());
        let end_idx = end_idx.clamp(start_idx, self.data.len());
        let available = &self.data[start_idx..end_idx];
        let missing_frames = (expected_len - available.len()) / self.frame_width.max(1);
        if missing_frames == 0 {
            return Ok(Cow::Borrowed(available));
        }

        if missing_frames as f64 > self.frame_count_in(2) {
            return Err(AudioSegmentError::invalid_range(format!(
                "refusing to fill more than 2ms with silence, missing {missing_frames} frames"
            )));
        }

        let silence = audioop::mul(&vec![0u8; self.frame_width], self.sample_width, 0.0)?;
        let mut filled = Vec::with_capacity(expected_len);
        filled.extend_from_slice(available);
        for _ in 0..missing_frames {
            filled.extend_from_slice(&silence);
        }
        Ok(Cow::Owned(filled))
    }

    /// RMS of the window `[start_ms, end_ms)`, computed straight from the
    /// shared buffer.
    pub(crate) fn window_rms(&self, start_ms: i64, end_ms: i64) -> AudioSegmentResult<f64> {
        let bytes = self.window_bytes(start_ms, end_ms)?;
        segment_rms(&bytes, self.sample_width)
    }

    /// Concatenates `self` and `others` after syncing them to a common format.
    ///
    /// The common format is the maximum channel count, frame rate and sample
    /// width across all operands, so nothing is ever downsampled.
    pub fn append(&self, others: &[&AudioSegment]) -> AudioSegmentResult<Self> {
        let mut operands = Vec::with_capacity(others.len() + 1);
        operands.push(self);
        operands.extend_from_slice(others);

        let synced = Self::sync(&operands)?;
        let total: usize = synced.iter().map(|s| s.data.len()).sum();
        let mut data = Vec::with_capacity(total);
        for segment in &synced {
            data.extend_from_slice(&segment.data);
        }

        match synced.first() {
            Some(first) => Ok(first.derive(data)),
            None => Ok(self.derive(data)),
        }
    }

    /// [`append`](Self::append) with exactly one operand.
    #[allow(clippy::should_implement_trait)]
    pub fn add(&self, other: &AudioSegment) -> AudioSegmentResult<Self> {
        self.append(&[other])
    }

    /// Scales every sample by `volume`'s amplitude ratio.
    pub fn apply_gain(&self, volume: Volume) -> AudioSegmentResult<Self> {
        let data = audioop::mul(&self.data, self.sample_width, volume.to_ratio())?;
        Ok(self.derive(data))
    }

    /// The buffer repeated `count` times.
    pub fn repeat(&self, count: usize) -> Self {
        self.derive(self.data.repeat(count))
    }

    /// Reverses frame order. Samples inside a frame keep their channel order.
    pub fn reverse(&self) -> AudioSegmentResult<Self> {
        let data = if self.channels == 1 {
            audioop::reverse(&self.data, self.sample_width)?
        } else {
            self.data
                .chunks_exact(self.frame_width)
                .rev()
                .flatten()
                .copied()
                .collect()
        };
        Ok(self.derive(data))
    }

    /// Root mean square of all samples, computed once and cached.
    ///
    /// 8-bit segments are measured after conversion to signed 16-bit. A
    /// measurement failure is logged and reported as 0.
    pub fn rms(&self) -> f64 {
        *self.rms.get_or_init(|| {
            segment_rms(&self.data, self.sample_width).unwrap_or_else(|err| {
                warn!(error = %err, segment = %self, "RMS computation failed, reporting silence");
                0.0
            })
        })
    }

    /// RMS level relative to full scale.
    pub fn dbfs(&self) -> Volume {
        Volume::from_ratio(self.rms() / self.max_possible_amplitude())
    }

    /// Largest absolute sample value, or 0 if it cannot be measured.
    ///
    /// The bytes are read as signed samples of `sample_width` with no
    /// re-centring, unlike [`rms`](Self::rms). Unsigned 8-bit silence
    /// (`0x80`) therefore reports a peak of 128 and a
    /// [`max_dbfs`](Self::max_dbfs) of 0 dB.
    pub fn max(&self) -> f64 {
        match audioop::max(&self.data, self.sample_width) {
            Ok(peak) => f64::from(peak),
            Err(err) => {
                warn!(error = %err, "peak computation failed, reporting silence");
                0.0
            }
        }
    }

    /// Peak level relative to full scale.
    pub fn max_dbfs(&self) -> Volume {
        Volume::from_ratio(self.max() / self.max_possible_amplitude())
    }

    /// `2^(8·sample_width) / 2`.
    pub fn max_possible_amplitude(&self) -> f64 {
        2f64.powi(8 * self.sample_width as i32) / 2.0
    }
}

/// RMS of raw segment bytes. 8-bit data is unsigned and is re-centred and
/// widened to 16 bits before measuring.
pub(crate) fn segment_rms(bytes: &[u8], sample_width: usize) -> AudioSegmentResult<f64> {
    if sample_width == 1 {
        let signed = audioop::bias(bytes, 1, -128)?;
        let wide = audioop::lin2lin(&signed, 1, 2)?;
        return audioop::rms(&wide, 2);
    }
    audioop::rms(bytes, sample_width)
}

fn widen_24_bit(data: &[u8], frame_width: usize) -> AudioSegmentResult<Vec<u8>> {
    if data.len() % frame_width != 0 {
        return Err(AudioSegmentError::MalformedBuffer {
            len: data.len(),
            unit: frame_width,
        });
    }

    let mut out = Vec::with_capacity(data.len() / 3 * 4);
    for sample in data.chunks_exact(3) {
        let pad = if sample[2] > 0x7F { 0xFF } else { 0x00 };
        out.extend_from_slice(&[pad, sample[0], sample[1], sample[2]]);
    }
    Ok(out)
}

impl PartialEq for AudioSegment {
    fn eq(&self, other: &Self) -> bool {
        self.sample_width == other.sample_width
            && self.frame_rate == other.frame_rate
            && self.channels == other.channels
            && self.data == other.data
    }
}

impl fmt::Display for AudioSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AudioSegment(sample_width={}, frame_rate={}, frame_width={}, channels={}, duration={}ms)",
            self.sample_width,
            self.frame_rate,
            self.frame_width,
            self.channels,
            self.duration()
        )
    }
}
