//! Benchmark for sequential vs. concurrent silence detection
//!
//! Builds speech-like test audio (tone bursts separated by gaps) of
//! increasing length and times both detectors on it. The two engines must
//! agree; the run aborts if they do not.

use audio_segment::{AudioSegment, SilenceConfig, Volume, detect_silence};
use std::time::Instant;

/// Generate 16-bit mono audio alternating 700ms of tone with 300ms of silence
fn generate_test_audio(duration_seconds: i64, sample_rate: u32) -> AudioSegment {
    let frames = (duration_seconds * i64::from(sample_rate)) as usize;
    let frequency = 440.0;

    let mut data = Vec::with_capacity(frames * 2);
    for i in 0..frames {
        let ms = i as i64 * 1000 / i64::from(sample_rate);
        let sample = if ms % 1000 < 700 {
            let t = i as f64 / f64::from(sample_rate);
            ((2.0 * std::f64::consts::PI * frequency * t).sin() * 12000.0) as i16
        } else {
            0
        };
        data.extend_from_slice(&sample.to_le_bytes());
    }

    AudioSegment::new(data, 2, sample_rate, 1).expect("valid benchmark audio")
}

fn time_runs<T>(runs: usize, mut f: impl FnMut() -> T) -> (f64, T) {
    let mut times = Vec::with_capacity(runs);
    let mut last = None;
    for _ in 0..runs {
        let start = Instant::now();
        last = Some(f());
        times.push(start.elapsed().as_secs_f64() * 1000.0);
    }
    times.sort_by(|a, b| a.total_cmp(b));
    (times[times.len() / 2], last.expect("at least one run"))
}

fn benchmark_detection(duration: i64, label: &str) {
    let audio = generate_test_audio(duration, 16000);
    let config = SilenceConfig::default()
        .with_min_silence_len(200)
        .with_silence_thresh(Volume::from_db(-40.0))
        .with_seek_step(1);

    println!("Benchmarking {label}: {duration}s audio, {} frames", audio.frame_count());

    let (sequential_ms, sequential) =
        time_runs(5, || detect_silence(&audio, &config).expect("sequential detection"));
    println!("  sequential: {sequential_ms:.2}ms (median), {} ranges", sequential.len());

    #[cfg(feature = "parallel-processing")]
    {
        let (concurrent_ms, concurrent) = time_runs(5, || {
            audio_segment::detect_silence_concurrent(&audio, &config)
                .expect("concurrent detection")
        });
        assert_eq!(sequential, concurrent, "engines disagree");
        println!(
            "  concurrent: {concurrent_ms:.2}ms (median), speedup {:.2}x",
            sequential_ms / concurrent_ms
        );
    }

    println!();
}

fn main() {
    println!("AudioSegment Silence Detection Benchmark");
    println!("========================================");

    if cfg!(feature = "parallel-processing") {
        let cpus = std::thread::available_parallelism().map_or(1, |n| n.get());
        println!("Concurrent engine enabled ({cpus} CPUs)");
    } else {
        println!("Concurrent engine not compiled in");
    }
    println!();

    for (duration, label) in [(5, "Short"), (30, "Medium"), (120, "Long")] {
        benchmark_detection(duration, label);
    }

    println!("Benchmark Complete!");
}
