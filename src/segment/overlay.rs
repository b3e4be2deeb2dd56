use serde::{Deserialize, Serialize};

use super::AudioSegment;
use crate::audioop;
use crate::{AudioSegmentError, AudioSegmentResult, Volume};

/// Parameters for [`AudioSegment::overlay`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Offset into the base segment where mixing starts, in milliseconds.
    pub position: i64,
    /// Keep looping the overlay until the base segment is exhausted.
    pub loop_to_end: bool,
    /// Number of passes. 0 is treated as 1, a negative count loops until the
    /// base segment is exhausted.
    pub loop_count: i64,
    /// Gain applied to the base segment under the overlay. Unity leaves the
    /// base untouched.
    pub gain_during_overlay: Volume,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            position: 0,
            loop_to_end: false,
            loop_count: 1,
            gain_during_overlay: Volume::UNITY,
        }
    }
}

impl OverlayConfig {
    /// Sets the start position in milliseconds.
    pub const fn with_position(mut self, position: i64) -> Self {
        self.position = position;
        self
    }

    /// Loops the overlay until the base segment ends.
    pub const fn with_loop_to_end(mut self, loop_to_end: bool) -> Self {
        self.loop_to_end = loop_to_end;
        self
    }

    /// Sets the number of passes.
    pub const fn with_loop_count(mut self, loop_count: i64) -> Self {
        self.loop_count = loop_count;
        self
    }

    /// Sets the gain applied to the base segment under the overlay.
    pub const fn with_gain_during_overlay(mut self, gain: Volume) -> Self {
        self.gain_during_overlay = gain;
        self
    }

    /// Checks that the configuration is usable.
    ///
    /// A gain of `-inf dB` is accepted and mutes the base under the overlay.
    ///
    /// # Errors
    /// `InvalidRange` for a negative position, `InvalidParameter` for a NaN
    /// or `+inf dB` gain.
    pub fn validate(&self) -> AudioSegmentResult<()> {
        if self.position < 0 {
            return Err(AudioSegmentError::invalid_range(format!(
                "overlay position must be non-negative, got {}ms",
                self.position
            )));
        }
        let gain = self.gain_during_overlay.db();
        if gain.is_nan() || gain == f64::INFINITY {
            return Err(AudioSegmentError::invalid_parameter(format!(
                "gain during overlay must be a finite level or -inf dB, got {gain}"
            )));
        }
        Ok(())
    }

    /// Passes to run; -1 means until the base is exhausted.
    pub const fn effective_loop_count(&self) -> i64 {
        if self.loop_to_end {
            -1
        } else if self.loop_count == 0 {
            1
        } else {
            self.loop_count
        }
    }
}

impl AudioSegment {
    /// Mixes `other` onto this segment starting at `config.position`.
    ///
    /// Both segments are synced to a common format first. The part before
    /// `position` is kept verbatim; from there `other` is added pass by pass
    /// until the loop count runs out or the base is exhausted, the last pass
    /// being truncated to fit. The result is never longer than the synced base.
    ///
    /// # Errors
    /// The errors of [`OverlayConfig::validate`], plus any conversion or
    /// mixing error from the arithmetic layer.
    pub fn overlay(
        &self,
        other: &AudioSegment,
        config: &OverlayConfig,
    ) -> AudioSegmentResult<Self> {
        config.validate()?;
        let synced = Self::sync(&[self, other])?;
        let (base, other) = match synced.as_slice() {
            [base, other] => (base, other),
            _ => {
                return Err(AudioSegmentError::invalid_parameter(
                    "overlay requires exactly two synced segments",
                ));
            }
        };

        let duration = base.duration();
        let head = base.slice(0, config.position)?;
        let tail = base.slice(config.position.min(duration), duration)?;
        let (head, tail) = (head.raw_data(), tail.raw_data());
        let width = base.sample_width;

        let mut out = Vec::with_capacity(head.len() + tail.len());
        out.extend_from_slice(head);

        let mut overlay = other.raw_data();
        let mut pos = 0;
        let mut remaining_loops = config.effective_loop_count();
        while remaining_loops != 0 && !overlay.is_empty() {
            let remaining = tail.len() - pos;
            if overlay.len() >= remaining {
                overlay = &overlay[..remaining];
                remaining_loops = 1;
            }

            let region = &tail[pos..pos + overlay.len()];
            let mixed = if config.gain_during_overlay.is_unity() {
                audioop::add(region, overlay, width)?
            } else {
                let scaled = audioop::mul(region, width, config.gain_during_overlay.to_ratio())?;
                audioop::add(&scaled, overlay, width)?
            };
            out.extend_from_slice(&mixed);

            pos += overlay.len();
            remaining_loops -= 1;
        }
        out.extend_from_slice(&tail[pos..]);

        Ok(base.derive(out))
    }
}
