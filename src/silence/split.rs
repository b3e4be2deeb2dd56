//! Long-form splitting of recordings into chunks of roughly equal length.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{Engine, SilenceConfig};
use crate::codec::Decoder;
use crate::{AudioSegment, AudioSegmentError, AudioSegmentResult, Volume};

/// Parameters for [`split_audio`]. All lengths are in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitAudioConfig {
    /// Nominal chunk length.
    pub target_len: f64,
    /// How far past each nominal cut to search for silence.
    pub window: f64,
    /// Padding kept on each side of a cut. Silences shorter than twice this
    /// are ignored.
    pub safe_margin: f64,
    /// Level at or below which audio counts as silent.
    pub silence_thresh: Volume,
}

impl Default for SplitAudioConfig {
    fn default() -> Self {
        Self {
            target_len: 30.0 * 60.0,
            window: 60.0,
            safe_margin: 0.5,
            silence_thresh: Volume::from_db(-30.0),
        }
    }
}

impl SplitAudioConfig {
    /// Sets the nominal chunk length in seconds.
    pub const fn with_target_len(mut self, seconds: f64) -> Self {
        self.target_len = seconds;
        self
    }

    /// Sets the search window in seconds.
    pub const fn with_window(mut self, seconds: f64) -> Self {
        self.window = seconds;
        self
    }

    /// Sets the silence threshold.
    pub const fn with_silence_thresh(mut self, thresh: Volume) -> Self {
        self.silence_thresh = thresh;
        self
    }

    /// Checks that the configuration is usable.
    ///
    /// # Errors
    /// `InvalidParameter` unless every length is finite and positive.
    pub fn validate(&self) -> AudioSegmentResult<()> {
        for (name, value) in [
            ("target_len", self.target_len),
            ("window", self.window),
            ("safe_margin", self.safe_margin),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(AudioSegmentError::invalid_parameter(format!(
                    "{name} must be a positive number of seconds, got {value}"
                )));
            }
        }
        Ok(())
    }

    fn detection(&self) -> SilenceConfig {
        SilenceConfig::default()
            .with_min_silence_len((self.safe_margin * 1000.0) as i64)
            .with_silence_thresh(self.silence_thresh)
            .with_seek_step(1)
    }
}

/// Splits a long recording into `(start, end)` spans in seconds.
///
/// Spans are roughly `target_len` long. For each nominal cut at `threshold`,
/// silence is searched in `[threshold - window, threshold + window]`; the
/// first silence of at least `2 · safe_margin` whose start plus `safe_margin`
/// falls inside `[threshold, threshold + window]` moves the cut there.
/// Without one, the cut stays at `threshold`.
///
/// A recording no longer than `target_len + window` is returned as a single
/// span.
///
/// # Errors
/// `InvalidParameter` for an invalid config, plus slicing and measurement
/// errors.
pub fn split_audio(
    segment: &AudioSegment,
    config: &SplitAudioConfig,
) -> AudioSegmentResult<Vec<(f64, f64)>> {
    split_audio_with(segment, config, Engine::Sequential)
}

/// Concurrent variant of [`split_audio`]; the window scans run on a worker pool.
#[cfg(feature = "parallel-processing")]
pub fn split_audio_concurrent(
    segment: &AudioSegment,
    config: &SplitAudioConfig,
) -> AudioSegmentResult<Vec<(f64, f64)>> {
    split_audio_with(segment, config, Engine::Concurrent)
}

/// Reads `path`, decodes it with `decoder` and runs [`split_audio`].
///
/// # Errors
/// `Io` if the file cannot be read, plus decoding and splitting errors.
pub fn split_audio_file(
    path: impl AsRef<Path>,
    decoder: &impl Decoder,
    config: &SplitAudioConfig,
) -> AudioSegmentResult<Vec<(f64, f64)>> {
    let segment = load(path.as_ref(), decoder)?;
    split_audio(&segment, config)
}

/// Reads `path`, decodes it with `decoder` and runs [`split_audio_concurrent`].
#[cfg(feature = "parallel-processing")]
pub fn split_audio_file_concurrent(
    path: impl AsRef<Path>,
    decoder: &impl Decoder,
    config: &SplitAudioConfig,
) -> AudioSegmentResult<Vec<(f64, f64)>> {
    let segment = load(path.as_ref(), decoder)?;
    split_audio_concurrent(&segment, config)
}

fn load(path: &Path, decoder: &impl Decoder) -> AudioSegmentResult<AudioSegment> {
    let bytes = std::fs::read(path)?;
    let segment = AudioSegment::from_decoded(decoder.decode(&bytes)?)?;
    debug!(path = %path.display(), %segment, "loaded audio for splitting");
    Ok(segment)
}

fn split_audio_with(
    segment: &AudioSegment,
    config: &SplitAudioConfig,
    engine: Engine,
) -> AudioSegmentResult<Vec<(f64, f64)>> {
    config.validate()?;
    let (target, window, margin) = (config.target_len, config.window, config.safe_margin);

    let duration = (segment.duration() / 1000) as f64;
    if duration <= target + window {
        return Ok(vec![(0.0, duration)]);
    }

    let detection = config.detection();
    let mut spans = Vec::new();
    let mut pos = 0.0;
    while pos < duration {
        if duration - pos <= target {
            spans.push((pos, duration));
            break;
        }

        let threshold = pos + target;
        let window_start = (((threshold - window) * 1000.0) as i64).max(0);
        let window_end = ((threshold + window) * 1000.0) as i64;
        let offset = window_start as f64 / 1000.0;

        let region = segment.slice(window_start, window_end)?;
        let silences = engine.detect_silence(&region, &detection)?;
        let cut = silences
            .iter()
            .map(|r| (r.start as f64 / 1000.0 + offset, r.end as f64 / 1000.0 + offset))
            .find(|&(start, end)| {
                end - start >= margin * 2.0
                    && threshold <= start + margin
                    && start + margin <= threshold + window
            })
            .map(|(start, _)| start + margin);

        let split_at = match cut {
            Some(at) => at,
            None => {
                warn!(threshold, "no usable silence near cut point, cutting at threshold");
                threshold
            }
        };
        spans.push((pos, split_at));
        pos = split_at;
    }

    info!(spans = spans.len(), duration, "long-form split completed");
    Ok(spans)
}
