//! Error types for preset operations.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading, validating, or applying a preset.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    ReadFile {
        /// Path of the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a file
    #[error("failed to write file '{path}': {source}")]
    WriteFile {
        /// Path of the file that could not be written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to create directory
    #[error("failed to create directory '{path}': {source}")]
    CreateDir {
        /// Path of the directory that could not be created.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Failed to serialize TOML
    #[error("failed to serialize TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// Channel index past the engine's channel count
    #[error("channel {channel} out of range (engine has {max} channels)")]
    InvalidChannel {
        /// The rejected index.
        channel: usize,
        /// Number of channels.
        max: usize,
    },

    /// Two entries map the same channel
    #[error("channel {0} is configured more than once")]
    DuplicateChannel(usize),

    /// Invalid parameter
    #[error("invalid parameter '{param}' on channel {channel}: {reason}")]
    InvalidParameter {
        /// Channel carrying the parameter.
        channel: usize,
        /// Name of the invalid parameter.
        param: &'static str,
        /// Description of why the parameter is invalid.
        reason: String,
    },

    /// The channel's MML did not compile
    #[error("channel {channel} MML: {source}")]
    Mml {
        /// Channel carrying the MML.
        channel: usize,
        /// Compiler error.
        #[source]
        source: ongen_mml::MmlError,
    },

    /// The preset's MIDI input could not be read or imported
    #[error("MIDI input: {0}")]
    Midi(#[from] ongen_midi::MidiError),

    /// The engine rejected a setting
    #[error("engine error: {0}")]
    Engine(#[from] ongen_core::Error),
}

impl ConfigError {
    /// Create a read file error.
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::ReadFile {
            path: path.into(),
            source,
        }
    }

    /// Create a write file error.
    pub fn write_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::WriteFile {
            path: path.into(),
            source,
        }
    }

    /// Create a create directory error.
    pub fn create_dir(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::CreateDir {
            path: path.into(),
            source,
        }
    }

    /// Create an invalid parameter error.
    pub fn invalid_parameter(channel: usize, param: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidParameter {
            channel,
            param,
            reason: reason.into(),
        }
    }
}
