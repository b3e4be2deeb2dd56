//! Error types and result utilities for audio segment operations.

use thiserror::Error;

/// Convenience type alias for results that may contain AudioSegmentError
pub type AudioSegmentResult<T> = Result<T, AudioSegmentError>;

/// Error types that can occur while manipulating PCM buffers and audio segments.
#[derive(Error, Debug)]
pub enum AudioSegmentError {
    /// A slice or overlay bound is invalid, or a slice would need more than
    /// 2 ms of silence fill to reach its requested length.
    #[error("Invalid range error: {0}")]
    InvalidRange(String),

    /// The arithmetic layer received a sample width outside {1, 2, 4}.
    #[error("Invalid sample width: {width} bytes (supported widths are 1, 2 and 4)")]
    InvalidWidth {
        /// The rejected width in bytes.
        width: usize,
    },

    /// A buffer length is not a whole number of samples or frames.
    #[error("Malformed buffer: length {len} is not a multiple of {unit} bytes")]
    MalformedBuffer {
        /// Length of the offending buffer in bytes.
        len: usize,
        /// Required alignment unit in bytes (sample or frame width).
        unit: usize,
    },

    /// Two buffers that must be combined sample-by-sample differ in length.
    ///
    /// This happens when mixing fragments of different sizes.
    #[error("Dimension mismatch error: {0}")]
    DimensionMismatch(String),

    /// A channel conversion other than mono <-> stereo was requested.
    #[error("Unsupported conversion: {0}")]
    UnsupportedConversion(String),

    /// Decoded audio arrived in a sample format the segment layer cannot hold.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Silence splitting was invoked on a segment whose RMS is zero.
    #[error("Empty audio: {0}")]
    EmptyAudio(String),

    /// Error that occurs when invalid parameters are provided to an operation.
    ///
    /// This includes non-positive rates, zero seek steps, negative lengths, etc.
    #[error("Invalid parameter error: {0}")]
    InvalidParameter(String),

    /// A worker of the concurrent silence engine failed to report.
    #[error("Worker pool error: {0}")]
    Concurrency(String),

    /// I/O error while reading audio from disk.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Error raised by the WAV container codec.
    #[cfg(feature = "wav")]
    #[error("Codec error: {0}")]
    Codec(#[from] hound::Error),
}

impl AudioSegmentError {
    /// Create a new invalid range error.
    pub fn invalid_range(message: impl Into<String>) -> Self {
        Self::InvalidRange(message.into())
    }

    /// Create a new invalid parameter error.
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::InvalidParameter(message.into())
    }

    /// Create a new unsupported conversion error.
    pub fn unsupported_conversion(message: impl Into<String>) -> Self {
        Self::UnsupportedConversion(message.into())
    }

    /// Create a new empty audio error.
    pub fn empty_audio(message: impl Into<String>) -> Self {
        Self::EmptyAudio(message.into())
    }

    /// Returns true if the error was caused by caller input rather than by the
    /// environment (I/O, codec or worker failures).
    pub const fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidRange(_)
                | Self::InvalidWidth { .. }
                | Self::MalformedBuffer { .. }
                | Self::DimensionMismatch(_)
                | Self::UnsupportedConversion(_)
                | Self::UnsupportedFormat(_)
                | Self::EmptyAudio(_)
                | Self::InvalidParameter(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = AudioSegmentError::InvalidWidth { width: 3 };
        assert!(err.to_string().contains("3 bytes"));

        let err = AudioSegmentError::MalformedBuffer { len: 5, unit: 2 };
        assert!(err.to_string().contains("length 5"));

        let err = AudioSegmentError::invalid_range("start should be smaller than end");
        assert!(err.to_string().starts_with("Invalid range error"));
    }

    #[test]
    fn test_input_error_classification() {
        assert!(AudioSegmentError::empty_audio("silent").is_input_error());
        assert!(AudioSegmentError::unsupported_conversion("6 channels").is_input_error());

        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: AudioSegmentError = io.into();
        assert!(!err.is_input_error());
        assert!(matches!(err, AudioSegmentError::Io(_)));
    }
}
