//! Audio output for the ongen synthesizer.
//!
//! - **Files**: [`write_wav`] for 16-bit PCM WAV, [`write_raw`] for headerless
//!   byte dumps as produced by [`Engine::render`]
//! - **Live playback**: [`AudioStream`] drives a cpal output stream from a
//!   render callback
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ongen_core::{Engine, OUTPUT_SAMPLE_RATE};
//! use ongen_io::write_wav;
//!
//! let mut engine = Engine::new();
//! let mut pcm = vec![0i16; OUTPUT_SAMPLE_RATE as usize];
//! engine.render_i16(&mut pcm, false);
//! write_wav("out.wav", &pcm, 1, OUTPUT_SAMPLE_RATE)?;
//! # Ok::<(), ongen_io::Error>(())
//! ```
//!
//! [`Engine::render`]: ongen_core::Engine::render

mod stream;
mod wav;

pub use stream::{
    AudioDevice, AudioStream, StopHandle, StreamConfig, default_output_device,
    list_output_devices, spread_mono,
};
pub use wav::{WavInfo, read_wav_i16, read_wav_info, write_raw, write_wav};

/// Error types for audio I/O operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// WAV file read/write error.
    #[error("WAV file error: {0}")]
    Wav(#[from] hound::Error),

    /// Audio stream setup or runtime error.
    #[error("Audio stream error: {0}")]
    Stream(String),

    /// No audio device available on the system.
    #[error("No audio device available")]
    NoDevice,

    /// The requested audio device was not found.
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type for audio I/O operations.
pub type Result<T> = std::result::Result<T, Error>;
