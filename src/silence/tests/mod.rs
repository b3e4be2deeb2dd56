//! Tests for the silence engine.
//!
//! Most cases run against the same synthetic recording: a constant 16-bit
//! tone with digital silence cut into it.

use crate::AudioSegment;

mod detection_tests;


/// 8 kHz mono 16-bit audio, `amplitude` everywhere except the silent
/// `[start, end)` millisecond spans.
pub(crate) fn tone_with_gaps(
    duration_ms: usize,
    amplitude: i16,
    gaps: &[(usize, usize)],
) -> AudioSegment {
    let frames_per_ms = 8;
    let mut data = Vec::with_capacity(duration_ms * frames_per_ms * 2);
    for frame in 0..duration_ms * frames_per_ms {
        let ms = frame / frames_per_ms;
        let silent = gaps.iter().any(|&(start, end)| ms >= start && ms < end);
        let value = if silent { 0 } else { amplitude };
        data.extend_from_slice(&value.to_le_bytes());
    }
    AudioSegment::new(data, 2, 8000, 1).expect("valid test audio")
}

/// The reference scenario: 2000 ms, amplitude 10000, silent from 500 to 1000 ms.
pub(crate) fn reference_segment() -> AudioSegment {
    tone_with_gaps(2000, 10_000, &[(500, 1000)])
}
