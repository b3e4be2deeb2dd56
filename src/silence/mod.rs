//! Silence detection and silence-driven segmentation.
//!
//! Detection slides a window of `min_silence_len` milliseconds across a
//! segment in steps of `seek_step` milliseconds and marks every window whose
//! RMS is at or below the threshold. The silent window starts are then
//! merged into half-open [`TimeRange`]s.
//!
//! ```text
//!  0ms      500ms           1000ms              2000ms
//!  |~~~~~~~~|_______________|~~~~~~~~~~~~~~~~~~~|
//!  nonsilent    silent            nonsilent
//! ```
//!
//! The functions here are sequential. With the `parallel-processing`
//! feature, [`concurrent`] provides drop-in variants that spread the window
//! scan over a worker pool and return identical results.
//!
//! Thresholds are expressed in dBFS and converted to a linear RMS level with
//! `threshold.to_ratio() * max_possible_amplitude`.

#[cfg(feature = "parallel-processing")]
pub mod concurrent;
mod split;

#[cfg(test)]
mod tests;

pub use split::{SplitAudioConfig, split_audio, split_audio_file};
#[cfg(feature = "parallel-processing")]
pub use split::{split_audio_concurrent, split_audio_file_concurrent};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::{AudioSegment, AudioSegmentError, AudioSegmentResult, Volume};

/// A half-open range of milliseconds, `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimeRange {
    /// Inclusive start in milliseconds.
    pub start: i64,
    /// Exclusive end in milliseconds.
    pub end: i64,
}

impl TimeRange {
    /// Creates a range.
    pub const fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    /// Length in milliseconds.
    pub const fn len(&self) -> i64 {
        self.end - self.start
    }

    /// True for a zero-length range.
    pub const fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

impl From<(i64, i64)> for TimeRange {
    fn from((start, end): (i64, i64)) -> Self {
        Self::new(start, end)
    }
}

/// Parameters shared by the silence detectors and [`split_on_silence`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SilenceConfig {
    /// Shortest stretch of silence to report, in milliseconds.
    pub min_silence_len: i64,
    /// Windows at or below this level count as silent.
    pub silence_thresh: Volume,
    /// Distance between consecutive window starts, in milliseconds.
    pub seek_step: i64,
    /// Silence kept around each chunk by [`split_on_silence`], in milliseconds.
    pub keep_silence: i64,
}

impl Default for SilenceConfig {
    fn default() -> Self {
        Self {
            min_silence_len: 1000,
            silence_thresh: Volume::from_db(-16.0),
            seek_step: 1,
            keep_silence: 100,
        }
    }
}

impl SilenceConfig {
    /// Sets the minimum silence length in milliseconds.
    pub const fn with_min_silence_len(mut self, ms: i64) -> Self {
        self.min_silence_len = ms;
        self
    }

    /// Sets the silence threshold.
    pub const fn with_silence_thresh(mut self, thresh: Volume) -> Self {
        self.silence_thresh = thresh;
        self
    }

    /// Sets the scan step in milliseconds.
    pub const fn with_seek_step(mut self, ms: i64) -> Self {
        self.seek_step = ms;
        self
    }

    /// Sets the silence kept around split chunks in milliseconds.
    pub const fn with_keep_silence(mut self, ms: i64) -> Self {
        self.keep_silence = ms;
        self
    }

    /// Checks that the configuration is usable.
    ///
    /// # Errors
    /// `InvalidParameter` if `min_silence_len` or `seek_step` is not positive,
    /// `keep_silence` is negative, or the threshold is NaN.
    pub fn validate(&self) -> AudioSegmentResult<()> {
        if self.min_silence_len <= 0 {
            return Err(AudioSegmentError::invalid_parameter(format!(
                "min_silence_len must be positive, got {}ms",
                self.min_silence_len
            )));
        }
        if self.seek_step <= 0 {
            return Err(AudioSegmentError::invalid_parameter(format!(
                "seek_step must be positive, got {}ms",
                self.seek_step
            )));
        }
        if self.keep_silence < 0 {
            return Err(AudioSegmentError::invalid_parameter(format!(
                "keep_silence must not be negative, got {}ms",
                self.keep_silence
            )));
        }
        if self.silence_thresh.db().is_nan() {
            return Err(AudioSegmentError::invalid_parameter(
                "silence threshold is NaN",
            ));
        }
        Ok(())
    }
}

/// Window starts and threshold for one detection pass.
pub(crate) struct ScanPlan {
    pub(crate) starts: Vec<i64>,
    window: i64,
    threshold: f64,
}

impl ScanPlan {
    /// `None` when the segment is shorter than one window.
    pub(crate) fn new(segment: &AudioSegment, config: &SilenceConfig) -> Option<Self> {
        let duration = segment.duration();
        if duration < config.min_silence_len {
            return None;
        }

        let last_start = duration - config.min_silence_len;
        let mut starts: Vec<i64> = (0..=last_start)
            .step_by(config.seek_step as usize)
            .collect();
        if last_start % config.seek_step != 0 {
            starts.push(last_start);
        }

        let threshold = config.silence_thresh.to_ratio() * segment.max_possible_amplitude();
        debug!(
            windows = starts.len(),
            window_ms = config.min_silence_len,
            threshold,
            "planned silence scan"
        );

        Some(Self {
            starts,
            window: config.min_silence_len,
            threshold,
        })
    }

    /// Whether the window starting at `start` is silent.
    pub(crate) fn is_silent(&self, segment: &AudioSegment, start: i64) -> AudioSegmentResult<bool> {
        Ok(segment.window_rms(start, start + self.window)? <= self.threshold)
    }
}

/// Merges silent window starts into ranges.
///
/// A new range opens only when a start is not exactly one step after the
/// previous start and lies more than `min_silence_len` past it. Any other
/// start extends the current range. Each range ends at its last start plus
/// `min_silence_len`.
pub(crate) fn merge_silent_starts(
    silent_starts: &[i64],
    min_silence_len: i64,
    seek_step: i64,
) -> Vec<TimeRange> {
    let Some((&first, rest)) = silent_starts.split_first() else {
        return Vec::new();
    };

    let mut ranges = Vec::new();
    let mut range_start = first;
    let mut prev = first;
    for &start in rest {
        let continuous = start == prev.saturating_add(seek_step);
        let has_gap = start > prev + min_silence_len;
        if !continuous && has_gap {
            trace!(
                range_start,
                range_end = prev + min_silence_len,
                next = start,
                "closing silent range"
            );
            ranges.push(TimeRange::new(range_start, prev + min_silence_len));
            range_start = start;
        }
        prev = start;
    }
    ranges.push(TimeRange::new(range_start, prev + min_silence_len));
    ranges
}

/// Complement of `silent` over `[0, duration)`.
pub(crate) fn invert_ranges(silent: &[TimeRange], duration: i64) -> Vec<TimeRange> {
    let Some(first) = silent.first() else {
        return vec![TimeRange::new(0, duration)];
    };
    if first.start == 0 && first.end == duration {
        return Vec::new();
    }

    let mut nonsilent = Vec::with_capacity(silent.len() + 1);
    let mut prev_end = 0;
    for range in silent {
        nonsilent.push(TimeRange::new(prev_end, range.start));
        prev_end = range.end;
    }
    if prev_end != duration {
        nonsilent.push(TimeRange::new(prev_end, duration));
    }

    if nonsilent.first() == Some(&TimeRange::new(0, 0)) {
        nonsilent.remove(0);
    }
    nonsilent
}

/// Which detector drives a composite operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Engine {
    Sequential,
    #[cfg(feature = "parallel-processing")]
    Concurrent,
}

impl Engine {
    pub(crate) fn detect_silence(
        self,
        segment: &AudioSegment,
        config: &SilenceConfig,
    ) -> AudioSegmentResult<Vec<TimeRange>> {
        match self {
            Self::Sequential => detect_silence(segment, config),
            #[cfg(feature = "parallel-processing")]
            Self::Concurrent => concurrent::detect_silence_concurrent(segment, config),
        }
    }

    pub(crate) fn detect_nonsilent(
        self,
        segment: &AudioSegment,
        config: &SilenceConfig,
    ) -> AudioSegmentResult<Vec<TimeRange>> {
        let silent = self.detect_silence(segment, config)?;
        Ok(invert_ranges(&silent, segment.duration()))
    }
}

/// Finds stretches of at least `min_silence_len` ms whose RMS stays at or
/// below `silence_thresh`.
///
/// # Returns
/// Sorted, non-overlapping silent ranges. Empty if the segment is shorter
/// than `min_silence_len` or nothing is silent.
///
/// # Errors
/// `InvalidParameter` for an invalid config, plus any measurement error.
pub fn detect_silence(
    segment: &AudioSegment,
    config: &SilenceConfig,
) -> AudioSegmentResult<Vec<TimeRange>> {
    config.validate()?;
    let Some(plan) = ScanPlan::new(segment, config) else {
        return Ok(Vec::new());
    };

    let mut silent_starts = Vec::new();
    for &start in &plan.starts {
        if plan.is_silent(segment, start)? {
            silent_starts.push(start);
        }
    }
    Ok(merge_silent_starts(
        &silent_starts,
        config.min_silence_len,
        config.seek_step,
    ))
}

/// The complement of [`detect_silence`] over `[0, duration)`.
///
/// Without silence the whole segment is one range; a segment that is silent
/// from end to end yields no ranges.
pub fn detect_nonsilent(
    segment: &AudioSegment,
    config: &SilenceConfig,
) -> AudioSegmentResult<Vec<TimeRange>> {
    Engine::Sequential.detect_nonsilent(segment, config)
}

/// Chunks produced by [`split_on_silence`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SplitChunks {
    /// The chunks, sliced from the input segment.
    pub chunks: Vec<AudioSegment>,
    /// `(start, end)` of each chunk in seconds.
    pub timings: Vec<(f64, f64)>,
}

impl SplitChunks {
    /// Number of chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// True when nothing non-silent was found.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Iterates chunks together with their timings.
    pub fn iter(&self) -> impl Iterator<Item = (&AudioSegment, (f64, f64))> {
        self.chunks.iter().zip(self.timings.iter().copied())
    }

    fn push(&mut self, chunk: AudioSegment, start_ms: i64, end_ms: i64) {
        self.chunks.push(chunk);
        self.timings
            .push((start_ms as f64 / 1000.0, end_ms as f64 / 1000.0));
    }
}

/// Splits `segment` into its non-silent parts.
///
/// Detection runs on a copy normalised to -20 dBFS, so the threshold is
/// relative to the segment's overall loudness. Each chunk keeps up to
/// `keep_silence` ms of the surrounding silence, without crossing the
/// previous chunk or the midpoint of the gap to the next one. Chunks are
/// sliced from the original, unnormalised segment.
///
/// # Errors
/// `EmptyAudio` if the segment's RMS is 0, `InvalidParameter` for an invalid
/// config.
pub fn split_on_silence(
    segment: &AudioSegment,
    config: &SilenceConfig,
) -> AudioSegmentResult<SplitChunks> {
    split_on_silence_with(segment, config, Engine::Sequential)
}

pub(crate) fn split_on_silence_with(
    segment: &AudioSegment,
    config: &SilenceConfig,
    engine: Engine,
) -> AudioSegmentResult<SplitChunks> {
    config.validate()?;
    if segment.rms() == 0.0 {
        return Err(AudioSegmentError::empty_audio(
            "segment has zero RMS, check the audio",
        ));
    }

    let gain = Volume::from_db(-20.0) - segment.dbfs();
    let normalized = segment.apply_gain(gain)?;
    let ranges = engine.detect_nonsilent(&normalized, config)?;

    let duration = segment.duration();
    let mut split = SplitChunks::default();
    if matches!(ranges.as_slice(), [only] if *only == TimeRange::new(0, duration)) {
        split.push(segment.clone(), 0, duration);
        return Ok(split);
    }
    let Some(last) = ranges.last() else {
        return Ok(split);
    };

    let keep = config.keep_silence;
    let mut start_min = 0;
    for pair in ranges.windows(2) {
        let (current, next) = (pair[0], pair[1]);
        let end_max = current.end + (next.start - current.end + 1) / 2;
        let start = start_min.max(current.start.saturating_sub(keep));
        let end = end_max.min(current.end.saturating_add(keep));
        split.push(segment.slice(start, end)?, start, end);
        start_min = current.end;
    }

    let start = start_min.max(last.start.saturating_sub(keep));
    let end = duration.min(last.end.saturating_add(keep));
    split.push(segment.slice(start, end)?, start, end);

    debug!(chunks = split.len(), "split on silence");
    Ok(split)
}

/// Milliseconds of leading audio quieter than `silence_thresh`, measured in
/// chunks of `chunk_size` ms. Never exceeds the segment's duration.
///
/// # Errors
/// `InvalidParameter` if `chunk_size` is not positive.
pub fn detect_leading_silence(
    segment: &AudioSegment,
    silence_thresh: Volume,
    chunk_size: i64,
) -> AudioSegmentResult<i64> {
    if chunk_size <= 0 {
        return Err(AudioSegmentError::invalid_parameter(format!(
            "chunk_size must be positive, got {chunk_size}ms"
        )));
    }

    let duration = segment.duration();
    let mut trim = 0;
    while trim < duration
        && segment.slice(trim, trim.saturating_add(chunk_size))?.dbfs() < silence_thresh
    {
        trim = trim.saturating_add(chunk_size);
    }
    Ok(trim.min(duration))
}
