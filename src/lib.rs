// Correctness and logic
#![warn(clippy::unit_cmp)] // Detects comparing unit types
#![warn(clippy::match_same_arms)] // Duplicate match arms

// Performance-focused
#![warn(clippy::inefficient_to_string)] // `format!("{}", x)` vs `x.to_string()`
#![warn(clippy::map_clone)] // Cloning inside `map()` unnecessarily
#![warn(clippy::unnecessary_to_owned)] // Detects redundant `.to_owned()` or `.clone()`
#![warn(clippy::large_stack_arrays)] // Helps avoid stack overflows
#![warn(clippy::needless_collect)] // Avoids `.collect().iter()` chains

// Style and idiomatic Rust
#![warn(clippy::redundant_clone)] // Detects unnecessary `.clone()`
#![warn(clippy::identity_op)] // e.g., `x + 0`, `x * 1`
#![warn(clippy::needless_return)] // Avoids `return` at the end of functions
#![warn(clippy::let_unit_value)] // Avoids binding `()` to variables
#![warn(clippy::manual_map)] // Use `.map()` instead of manual `match`
#![warn(clippy::unwrap_used)] // Avoids using `unwrap()`

// Maintainability
#![warn(clippy::missing_panics_doc)] // Docs for functions that might panic
#![warn(clippy::missing_const_for_fn)] // Suggests making eligible functions `const`
#![deny(missing_docs)] // Documentation is a must for release

//! # AudioSegment
//!
//! Immutable PCM audio segments with `audioop`-style sample arithmetic and
//! silence-driven splitting.
//!
//! The crate is built in layers:
//!
//! - [`audioop`]: pure functions over little-endian PCM byte buffers
//!   (scaling, mixing, bias, reversal, peak and RMS measurement, width and
//!   channel conversion, and a stateful linear-interpolation resampler).
//! - [`AudioSegment`]: an immutable buffer plus format with slicing,
//!   synchronised concatenation, gain, overlay and format forks.
//! - [`silence`]: silence detection, splitting on silence and long-form
//!   splitting, with a worker-pool variant in [`silence::concurrent`].
//! - [`codec`]: the container boundary. Decoders and encoders exchange
//!   [`DecodedAudio`]; a WAV implementation is included.
//!
//! ## Features
//!
//! - `parallel-processing` (default): the concurrent silence engine
//!   (`crossbeam` + `num_cpus`).
//! - `wav` (default): [`codec::WavCodec`] (using the `hound` crate).
//!
//! ## Quick Start
//!
//! ```rust
//! use audio_segment::{AudioSegment, OverlayConfig, SilenceConfig, Volume, detect_silence};
//!
//! # fn main() -> Result<(), audio_segment::AudioSegmentError> {
//! // one second of a constant 16-bit tone at 8 kHz, then half a second of silence
//! let tone = AudioSegment::new(4000i16.to_le_bytes().repeat(8000), 2, 8000, 1)?;
//! let audio = tone.add(&AudioSegment::silent(500, 8000))?;
//! assert_eq!(audio.duration(), 1500);
//!
//! let config = SilenceConfig::default()
//!     .with_min_silence_len(300)
//!     .with_silence_thresh(Volume::from_db(-40.0))
//!     .with_seek_step(10);
//! let silent = detect_silence(&audio, &config)?;
//! assert_eq!(silent.len(), 1);
//! assert_eq!(silent[0].end, 1500);
//!
//! let ducked = audio.overlay(&tone, &OverlayConfig::default().with_position(1000))?;
//! assert_eq!(ducked.duration(), 1500);
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Every fallible operation returns [`AudioSegmentResult`]. Arithmetic errors
//! propagate unchanged; "no silence" and "all silence" are ordinary results.
//!
//! ```rust
//! use audio_segment::{AudioSegment, AudioSegmentError};
//!
//! let seg = AudioSegment::silent(100, 8000);
//! match seg.slice(50, 10) {
//!     Err(AudioSegmentError::InvalidRange(msg)) => eprintln!("bad range: {msg}"),
//!     Err(other) => eprintln!("other error: {other}"),
//!     Ok(_) => unreachable!(),
//! }
//! ```
//!
//! ## Logging
//!
//! Diagnostics go through `tracing`. The library never installs a
//! subscriber; scans are reported at `debug`, merge decisions at `trace`,
//! long-form split summaries at `info` and fallbacks at `warn`.

pub mod audioop;
pub mod codec;
mod error;
pub mod segment;
pub mod silence;
pub mod traits;
mod volume;

pub use crate::codec::{DecodedAudio, Decoder, Encoder, PcmFormat, is_command_available};
pub use crate::error::{AudioSegmentError, AudioSegmentResult};
pub use crate::segment::{AudioSegment, ChannelConversion, OverlayConfig, WidthConversion};
pub use crate::silence::{
    SilenceConfig, SplitAudioConfig, SplitChunks, TimeRange, detect_leading_silence,
    detect_nonsilent, detect_silence, split_audio, split_audio_file, split_on_silence,
};
pub use crate::traits::PcmSample;
pub use crate::volume::Volume;

#[cfg(feature = "parallel-processing")]
pub use crate::silence::concurrent::{
    detect_nonsilent_concurrent, detect_silence_concurrent, split_on_silence_concurrent,
};
#[cfg(feature = "parallel-processing")]
pub use crate::silence::{split_audio_concurrent, split_audio_file_concurrent};

#[cfg(feature = "wav")]
pub use crate::codec::WavCodec;
