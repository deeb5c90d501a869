//! Ongen Core - real-time multi-channel wavetable synthesis
//!
//! A fixed set of output channels, each playing a pre-generated wavetable
//! through its own envelope, pitch, and volume state, driven by
//! sample-accurate commands and mixed into 16-bit PCM.
//!
//! # Components
//!
//! - [`WavetableBank`] - fixed-length waveform tables, written at setup
//! - [`notes`] - note number to frequency tables (12-tone and custom)
//! - [`Channel`] - per-voice ADSR/pitch/volume state machine
//! - [`CommandRing`] - near-term commands, one slot per fetch interval
//! - [`SequenceLog`] - far-term tick-ordered commands with loop regions
//! - [`Engine`] - owns all of the above and renders PCM
//!
//! # Data flow
//!
//! ```text
//! SequenceLog ──fill (once per render)──▶ CommandRing ──every 100 ticks──▶ Channel ──per sample──▶ PCM
//! ```
//!
//! # no_std Support
//!
//! This crate is `no_std` compatible. Disable the default `std` feature:
//!
//! ```toml
//! [dependencies]
//! ongen-core = { version = "0.2", default-features = false }
//! ```
//!
//! Enable the `tracing` feature to log control operations. Nothing is
//! logged from the render loop.
//!
//! # Example
//!
//! ```rust
//! use ongen_core::{Command, Endianness, Engine, GeneratorSource, SequenceLog, Waveform};
//!
//! let mut engine = Engine::new();
//! engine.generate(0, Waveform::Triangle).unwrap();
//! engine.bind_generator(0, GeneratorSource::Slot(0)).unwrap();
//!
//! let mut log = SequenceLog::with_capacity(16);
//! log.append(0, Command::key_on(60)).unwrap();
//! log.append(22050, Command::key_off()).unwrap();
//! engine.bind_sequence(0, log).unwrap();
//!
//! let mut pcm = vec![0u8; 44100 * 2];
//! engine.render(&mut pcm, 44100, 2, false, Endianness::Little).unwrap();
//! ```
//!
//! # Design Principles
//!
//! - **Real-time safe**: render never allocates, blocks, or fails mid-buffer
//! - **Bounded work**: fixed ring capacity and a per-call fill scan limit
//! - **Explicit context**: all state lives in an [`Engine`] value

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod channel;
pub mod command;
pub mod engine;
pub mod error;
pub mod noise;
pub mod notes;
pub mod ring;
pub mod sequence;
pub mod wavetable;

/// Output sample rate in Hz.
pub const OUTPUT_SAMPLE_RATE: u32 = 44100;

/// Number of output channels.
pub const NUM_CHANNELS: usize = 13;

// Re-export main types at crate root
pub use channel::{Adsr, Channel, EnvelopePhase, GAIN_MAX, VOLUME_MAX};
pub use command::{Command, PitchBend};
pub use engine::{CommandObserver, Endianness, Engine};
pub use error::{Error, Result};
pub use noise::NoiseRegister;
pub use notes::{CustomNoteTable, NoteMapping, standard_frequency};
pub use ring::{CommandRing, FETCH_INTERVAL, LOOKAHEAD_TICKS, RING_CAPACITY};
pub use sequence::{FILL_SCAN_LIMIT, LoopRegion, SequenceEntry, SequenceLog};
pub use wavetable::{GeneratorSource, NUM_GENERATORS, TABLE_LENGTH, Waveform, WavetableBank};
