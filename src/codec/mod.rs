//! Container boundary.
//!
//! The core never parses container headers. A [`Decoder`] turns container
//! bytes into a [`DecodedAudio`] tuple and an [`Encoder`] turns the tuple back
//! into container bytes. [`WavCodec`] implements both for integer PCM WAV
//! when the `wav` feature is enabled.
//!
//! Compressed formats are expected to go through an external transcoder;
//! [`is_command_available`] lets callers decide whether one is installed.

#[cfg(feature = "wav")]
mod wav;

#[cfg(feature = "wav")]
pub use wav::WavCodec;

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::AudioSegmentResult;

/// Sample encoding of a decoded buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PcmFormat {
    /// Signed little-endian integers (8-bit data is unsigned).
    Integer,
    /// IEEE floating point.
    Float,
}

/// The exchange tuple between the core and container codecs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedAudio {
    /// Bytes per sample.
    pub sample_width: usize,
    /// Frames per second.
    pub frame_rate: u32,
    /// Number of interleaved channels.
    pub channels: usize,
    /// Interleaved little-endian sample bytes.
    pub data: Vec<u8>,
    /// Sample encoding.
    pub format: PcmFormat,
}

/// Turns container bytes into raw PCM.
pub trait Decoder {
    /// Decodes a complete container.
    fn decode(&self, bytes: &[u8]) -> AudioSegmentResult<DecodedAudio>;
}

/// Turns raw PCM into container bytes.
pub trait Encoder {
    /// Encodes `audio` into a complete container.
    fn encode(&self, audio: &DecodedAudio) -> AudioSegmentResult<Vec<u8>>;
}

/// Returns true if an executable called `name` is reachable through `PATH`.
pub fn is_command_available(name: &str) -> bool {
    let Some(paths) = std::env::var_os("PATH") else {
        return false;
    };
    std::env::split_paths(&paths).any(|dir| is_executable(&dir.join(name)))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file() || path.with_extension("exe").is_file()
}
