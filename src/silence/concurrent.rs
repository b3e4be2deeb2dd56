//! Worker-pool variants of the silence detectors.
//!
//! The window starts of a scan are split into contiguous partitions, one per
//! worker, with at most one worker per available CPU. Workers measure their
//! windows straight from the segment's shared buffer and send
//! `(index, result)` pairs over a single channel. The collector drops each
//! report into its indexed slot; once every worker has finished, the slots
//! are read back in scan order and merged exactly as the sequential detector
//! does. Results are therefore identical to [`detect_silence`](super::detect_silence)
//! regardless of scheduling.
//!
//! Threads are scoped, so they borrow the segment instead of cloning it. If
//! a window fails to measure, the error of the lowest failing window is
//! returned.

use crossbeam::channel;
use tracing::debug;

use super::{
    Engine, ScanPlan, SilenceConfig, SplitChunks, TimeRange, merge_silent_starts,
    split_on_silence_with,
};
use crate::{AudioSegment, AudioSegmentError, AudioSegmentResult};

/// Concurrent [`detect_silence`](super::detect_silence).
pub fn detect_silence_concurrent(
    segment: &AudioSegment,
    config: &SilenceConfig,
) -> AudioSegmentResult<Vec<TimeRange>> {
    config.validate()?;
    let Some(plan) = ScanPlan::new(segment, config) else {
        return Ok(Vec::new());
    };

    let flags = classify_windows(segment, &plan)?;
    let silent_starts: Vec<i64> = plan
        .starts
        .iter()
        .zip(flags)
        .filter_map(|(&start, silent)| silent.then_some(start))
        .collect();

    Ok(merge_silent_starts(
        &silent_starts,
        config.min_silence_len,
        config.seek_step,
    ))
}

/// Concurrent [`detect_nonsilent`](super::detect_nonsilent).
pub fn detect_nonsilent_concurrent(
    segment: &AudioSegment,
    config: &SilenceConfig,
) -> AudioSegmentResult<Vec<TimeRange>> {
    Engine::Concurrent.detect_nonsilent(segment, config)
}

/// Concurrent [`split_on_silence`](super::split_on_silence).
pub fn split_on_silence_concurrent(
    segment: &AudioSegment,
    config: &SilenceConfig,
) -> AudioSegmentResult<SplitChunks> {
    split_on_silence_with(segment, config, Engine::Concurrent)
}

fn classify_windows(segment: &AudioSegment, plan: &ScanPlan) -> AudioSegmentResult<Vec<bool>> {
    let total = plan.starts.len();
    if total == 0 {
        return Ok(Vec::new());
    }
    let workers = num_cpus::get().clamp(1, total);
    let partition = total.div_ceil(workers);
    debug!(workers, windows = total, partition, "dispatching silence scan");

    let mut slots: Vec<Option<AudioSegmentResult<bool>>> = (0..total).map(|_| None).collect();
    let (tx, rx) = channel::unbounded::<(usize, AudioSegmentResult<bool>)>();

    crossbeam::thread::scope(|scope| {
        for (worker, starts) in plan.starts.chunks(partition).enumerate() {
            let tx = tx.clone();
            let first_index = worker * partition;
            scope.spawn(move |_| {
                for (offset, &start) in starts.iter().enumerate() {
                    let report = (first_index + offset, plan.is_silent(segment, start));
                    if tx.send(report).is_err() {
                        break;
                    }
                }
            });
        }
        drop(tx);

        for (index, result) in rx.iter() {
            slots[index] = Some(result);
        }
    })
    .map_err(|_| {
        AudioSegmentError::Concurrency("a silence detection worker panicked".to_string())
    })?;

    slots
        .into_iter()
        .enumerate()
        .map(|(index, slot)| {
            slot.unwrap_or_else(|| {
                Err(AudioSegmentError::Concurrency(format!(
                    "no result reported for window {index}"
                )))
            })
        })
        .collect()
}
