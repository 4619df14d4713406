//! Error types for file I/O and render configuration.

use std::path::PathBuf;
use thiserror::Error;

/// Errors reading or writing WAV files.
#[derive(Debug, Error)]
pub enum WavError {
    /// Decoder or encoder failure
    #[error("WAV error: {0}")]
    Hound(#[from] hound::Error),

    /// File has no channels
    #[error("'{path}' has no audio channels")]
    NoChannels {
        /// Offending file.
        path: PathBuf,
    },

    /// Bit depth the writer cannot produce
    #[error("unsupported bit depth {0} (expected 16, 24 or 32)")]
    UnsupportedBitDepth(u16),

    /// Channel buffers of different lengths
    #[error("channel {channel} has {len} frames, expected {expected}")]
    RaggedChannels {
        /// Index of the mismatched channel.
        channel: usize,
        /// Its length.
        len: usize,
        /// Length of the first channel.
        expected: usize,
    },
}

/// Errors loading or validating a render configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the file
    #[error("failed to read config '{path}': {source}")]
    ReadFile {
        /// Path of the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// A value no clamp can make sense of
    #[error("invalid '{field}': {reason}")]
    Invalid {
        /// Offending field.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },
}

impl ConfigError {
    /// Create a read file error.
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::ReadFile {
            path: path.into(),
            source,
        }
    }

    /// Create a validation error.
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Result alias for WAV operations.
pub type WavResult<T> = std::result::Result<T, WavError>;
