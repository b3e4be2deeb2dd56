//! Tests for silence and non-silence detection.

use super::{reference_segment, tone_with_gaps};
use crate::silence::{
    ScanPlan, SilenceConfig, TimeRange, detect_leading_silence, detect_nonsilent, detect_silence,
    merge_silent_starts,
};
use crate::{AudioSegment, AudioSegmentError, Volume};

fn config(min_silence_len: i64, thresh_db: f64, seek_step: i64) -> SilenceConfig {
    SilenceConfig::default()
        .with_min_silence_len(min_silence_len)
        .with_silence_thresh(Volume::from_db(thresh_db))
        .with_seek_step(seek_step)
}

fn ranges(pairs: &[(i64, i64)]) -> Vec<TimeRange> {
    pairs.iter().copied().map(TimeRange::from).collect()
}

#[test]
fn test_reference_scenario_strict_threshold() {
    let seg = reference_segment();
    let cfg = config(400, -60.0, 10);

    assert_eq!(detect_silence(&seg, &cfg).unwrap(), ranges(&[(500, 1000)]));
    assert_eq!(
        detect_nonsilent(&seg, &cfg).unwrap(),
        ranges(&[(0, 500), (1000, 2000)])
    );
}

#[test]
fn test_reference_scenario_window_alignment() {
    // At -20 dBFS a 400 ms window may hold up to 42 ms of tone and still
    // count as silent, so the range grows by 40 ms on each side.
    let seg = reference_segment();
    let cfg = config(400, -20.0, 10);

    assert_eq!(detect_silence(&seg, &cfg).unwrap(), ranges(&[(460, 1040)]));
    assert_eq!(
        detect_nonsilent(&seg, &cfg).unwrap(),
        ranges(&[(0, 460), (1040, 2000)])
    );
}

#[test]
fn test_short_segment_has_no_silence() {
    let seg = AudioSegment::silent(300, 8000);
    let cfg = config(400, -16.0, 1);

    assert!(detect_silence(&seg, &cfg).unwrap().is_empty());
    assert_eq!(detect_nonsilent(&seg, &cfg).unwrap(), ranges(&[(0, 300)]));
}

#[test]
fn test_fully_silent_segment() {
    let seg = AudioSegment::silent(1000, 8000);
    let cfg = config(400, -16.0, 10);

    assert_eq!(detect_silence(&seg, &cfg).unwrap(), ranges(&[(0, 1000)]));
    assert!(detect_nonsilent(&seg, &cfg).unwrap().is_empty());
}

#[test]
fn test_leading_silence_is_dropped_from_nonsilent() {
    let seg = tone_with_gaps(1500, 10_000, &[(0, 600)]);
    let cfg = config(300, -40.0, 10);

    assert_eq!(detect_silence(&seg, &cfg).unwrap(), ranges(&[(0, 600)]));
    assert_eq!(detect_nonsilent(&seg, &cfg).unwrap(), ranges(&[(600, 1500)]));
}

#[test]
fn test_ranges_partition_the_segment() {
    let seg = tone_with_gaps(3000, 12_000, &[(200, 700), (1100, 1250), (2500, 3000)]);
    for cfg in [
        config(100, -20.0, 1),
        config(300, -40.0, 7),
        config(150, -10.0, 25),
        config(1000, -30.0, 3),
    ] {
        let mut all = detect_silence(&seg, &cfg).unwrap();
        all.extend(detect_nonsilent(&seg, &cfg).unwrap());
        all.sort();

        assert_eq!(all.first().map(|r| r.start), Some(0));
        assert_eq!(all.last().map(|r| r.end), Some(seg.duration()));
        for pair in all.windows(2) {
            assert_eq!(pair[0].end, pair[1].start, "gap or overlap in {all:?}");
        }
        assert!(all.iter().all(|r| !r.is_empty()));
    }
}

#[test]
fn test_final_window_start_is_always_scanned() {
    let seg = tone_with_gaps(1005, 10_000, &[]);
    let plan = ScanPlan::new(&seg, &config(400, -16.0, 10)).unwrap();
    assert_eq!(plan.starts.first(), Some(&0));
    assert_eq!(plan.starts.last(), Some(&605));
    assert_eq!(plan.starts.len(), 62);

    let aligned = ScanPlan::new(&seg, &config(405, -16.0, 10)).unwrap();
    assert_eq!(aligned.starts.last(), Some(&600));
    assert_eq!(aligned.starts.len(), 61);
}

#[test]
fn test_merge_policy() {
    assert!(merge_silent_starts(&[], 400, 10).is_empty());
    assert_eq!(merge_silent_starts(&[0, 10, 20], 400, 10), ranges(&[(0, 420)]));

    // 50 is neither one step ahead nor past the window, so it extends the range.
    assert_eq!(
        merge_silent_starts(&[0, 50, 500], 400, 10),
        ranges(&[(0, 450), (500, 900)])
    );
    assert_eq!(
        merge_silent_starts(&[0, 1000, 1001], 400, 1),
        ranges(&[(0, 400), (1000, 1401)])
    );
    assert_eq!(
        merge_silent_starts(&[0, 1600], 400, i64::MAX),
        ranges(&[(0, 400), (1600, 2000)])
    );
}

#[test]
fn test_config_validation() {
    let seg = reference_segment();
    for bad in [
        config(400, -20.0, 0),
        config(0, -20.0, 1),
        config(400, f64::NAN, 1),
        SilenceConfig::default().with_keep_silence(-1),
    ] {
        assert!(matches!(
            detect_silence(&seg, &bad),
            Err(AudioSegmentError::InvalidParameter(_))
        ));
    }
    assert!(SilenceConfig::default().validate().is_ok());
}

#[test]
fn test_detect_leading_silence() {
    let seg = tone_with_gaps(1000, 10_000, &[(0, 300)]);
    let thresh = Volume::from_db(-50.0);
    assert_eq!(detect_leading_silence(&seg, thresh, 10).unwrap(), 300);
    assert_eq!(detect_leading_silence(&reference_segment(), thresh, 10).unwrap(), 0);

    let silent = AudioSegment::silent(505, 8000);
    assert_eq!(detect_leading_silence(&silent, thresh, 10).unwrap(), 505);

    assert_eq!(detect_leading_silence(&silent, thresh, i64::MAX).unwrap(), 505);
    assert!(detect_leading_silence(&seg, thresh, 0).is_err());
}
