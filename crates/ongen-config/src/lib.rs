//! TOML presets for the ongen synthesizer.
//!
//! A [`Preset`] names a tempo and, for each channel it uses, a generator,
//! envelope, volume, detune, and one voice of MML or one channel of a
//! Standard MIDI File. [`Preset::apply`] turns that into engine state:
//! tables generated and bound, sequences compiled and attached, loops set.
//!
//! # Example
//!
//! ```rust
//! use ongen_config::{ChannelConfig, GeneratorKind, Preset};
//! use ongen_core::Engine;
//!
//! let preset = Preset::new("duet")
//!     .with_channel(ChannelConfig::new(0, "o5 l8 cdeg").looped())
//!     .with_channel(ChannelConfig::new(1, "o3 c2").with_generator(GeneratorKind::Triangle));
//!
//! let mut engine = Engine::new();
//! let end_tick = preset.apply(&mut engine).unwrap();
//! assert!(end_tick > preset.origin_tick);
//! ```

mod channel;
mod error;
mod preset;

/// Factory presets bundled with the library.
pub mod factory;

pub use channel::{AdsrConfig, ChannelConfig, GeneratorKind};
pub use error::ConfigError;
pub use factory::{FACTORY_PRESET_NAMES, factory_presets, get_factory_preset, is_factory_preset};
pub use preset::{DEFAULT_ORIGIN_TICK, DEFAULT_WHOLE_NOTE_TICKS, Preset};
