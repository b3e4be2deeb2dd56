//! Format forks: sample width, frame rate and channel count conversion.
//!
//! Each fork is the identity when the segment already has the requested
//! format; the returned value then shares the receiver's buffer. Otherwise
//! the conversion is picked from a closed set of variants keyed by the
//! `(source, target)` pair and routed through the arithmetic layer.

use super::AudioSegment;
use crate::audioop;
use crate::{AudioSegmentError, AudioSegmentResult};

/// How to move between two channel layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelConversion {
    /// Source and target agree.
    Identity,
    /// Duplicate the mono channel at unity gain.
    MonoToStereo,
    /// Average left and right.
    StereoToMono,
}

impl ChannelConversion {
    /// Selects the conversion for `source -> target`.
    ///
    /// # Errors
    /// `UnsupportedConversion` for anything other than 1 <-> 2 channels.
    pub fn select(source: usize, target: usize) -> AudioSegmentResult<Self> {
        match (source, target) {
            (s, t) if s == t => Ok(Self::Identity),
            (1, 2) => Ok(Self::MonoToStereo),
            (2, 1) => Ok(Self::StereoToMono),
            (s, t) => Err(AudioSegmentError::unsupported_conversion(format!(
                "cannot convert {s} channels to {t}, only mono <-> stereo is supported"
            ))),
        }
    }

    fn apply(self, data: &[u8], sample_width: usize) -> AudioSegmentResult<Vec<u8>> {
        match self {
            Self::Identity => Ok(data.to_vec()),
            Self::MonoToStereo => audioop::tostereo(data, sample_width, 1.0, 1.0),
            Self::StereoToMono => audioop::tomono(data, sample_width, 0.5, 0.5),
        }
    }
}

/// How to move between two sample widths.
///
/// 8-bit audio is stored unsigned, so conversions into and out of width 1
/// re-centre the samples around zero with [`audioop::bias`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidthConversion {
    /// Source and target agree.
    Identity,
    /// Signed `from` bytes to signed `to` bytes.
    Linear {
        /// Source width in bytes.
        from: usize,
        /// Target width in bytes.
        to: usize,
    },
    /// Unsigned 8-bit to signed `to` bytes.
    FromUnsigned8 {
        /// Target width in bytes.
        to: usize,
    },
    /// Signed `from` bytes to unsigned 8-bit.
    ToUnsigned8 {
        /// Source width in bytes.
        from: usize,
    },
}

impl WidthConversion {
    /// Selects the conversion for `source -> target` widths.
    pub const fn select(source: usize, target: usize) -> Self {
        match (source, target) {
            (s, t) if s == t => Self::Identity,
            (1, to) => Self::FromUnsigned8 { to },
            (from, 1) => Self::ToUnsigned8 { from },
            (from, to) => Self::Linear { from, to },
        }
    }

    fn apply(self, data: &[u8]) -> AudioSegmentResult<Vec<u8>> {
        match self {
            Self::Identity => Ok(data.to_vec()),
            Self::Linear { from, to } => audioop::lin2lin(data, from, to),
            Self::FromUnsigned8 { to } => {
                let signed = audioop::bias(data, 1, -128)?;
                audioop::lin2lin(&signed, 1, to)
            }
            Self::ToUnsigned8 { from } => {
                let narrowed = audioop::lin2lin(data, from, 1)?;
                audioop::bias(&narrowed, 1, 128)
            }
        }
    }
}

impl AudioSegment {
    /// Converts to `sample_width` bytes per sample.
    ///
    /// # Errors
    /// `InvalidWidth` if `sample_width` is not 1, 2 or 4.
    pub fn fork_with_sample_width(&self, sample_width: usize) -> AudioSegmentResult<Self> {
        let conversion = WidthConversion::select(self.sample_width, sample_width);
        if conversion == WidthConversion::Identity {
            return Ok(self.clone());
        }
        audioop::SampleWidth::from_bytes(sample_width)?;

        let data = conversion.apply(&self.data)?;
        Ok(Self::from_parts(
            data.into(),
            sample_width,
            self.frame_rate,
            self.channels,
        ))
    }

    /// Resamples to `frame_rate` with linear interpolation.
    ///
    /// # Errors
    /// `InvalidParameter` if either rate is zero and there is audio to convert.
    pub fn fork_with_frame_rate(&self, frame_rate: u32) -> AudioSegmentResult<Self> {
        if frame_rate == self.frame_rate {
            return Ok(self.clone());
        }

        let data = if self.data.is_empty() {
            Vec::new()
        } else {
            let (converted, _) = audioop::ratecv(
                &self.data,
                self.sample_width,
                self.channels,
                self.frame_rate,
                frame_rate,
                None,
                1,
                0,
            )?;
            converted
        };
        Ok(Self::from_parts(
            data.into(),
            self.sample_width,
            frame_rate,
            self.channels,
        ))
    }

    /// Converts between mono and stereo.
    ///
    /// # Errors
    /// `UnsupportedConversion` unless the conversion is 1 <-> 2 channels or
    /// the identity.
    pub fn fork_with_channels(&self, channels: usize) -> AudioSegmentResult<Self> {
        let conversion = ChannelConversion::select(self.channels, channels)?;
        if conversion == ChannelConversion::Identity {
            return Ok(self.clone());
        }

        let data = conversion.apply(&self.data, self.sample_width)?;
        Ok(Self::from_parts(
            data.into(),
            self.sample_width,
            self.frame_rate,
            channels,
        ))
    }

    /// Brings every segment to the largest channel count, frame rate and
    /// sample width found among them. Channels are converted first, then the
    /// rate, then the width.
    pub fn sync(segments: &[&AudioSegment]) -> AudioSegmentResult<Vec<AudioSegment>> {
        let channels = segments.iter().map(|s| s.channels).max().unwrap_or(1);
        let frame_rate = segments.iter().map(|s| s.frame_rate).max().unwrap_or(1);
        let sample_width = segments.iter().map(|s| s.sample_width).max().unwrap_or(1);

        segments
            .iter()
            .map(|segment| {
                segment
                    .fork_with_channels(channels)?
                    .fork_with_frame_rate(frame_rate)?
                    .fork_with_sample_width(sample_width)
            })
            .collect()
    }
}
