//! Presets bundled with the library.

use crate::Preset;

/// Names of the factory presets, in listing order.
pub static FACTORY_PRESET_NAMES: &[&str] = &["scale", "chiptune", "organ"];

static FACTORY_PRESETS_TOML: &[(&str, &str)] = &[
    ("scale", SCALE_PRESET),
    ("chiptune", CHIPTUNE_PRESET),
    ("organ", ORGAN_PRESET),
];

const SCALE_PRESET: &str = r#"
name = "scale"
description = "One octave of C major on a square wave"

[[channels]]
channel = 0
generator = "square"
volume = 0.8
mml = "o4 l8 cdefgab<c"
"#;

const CHIPTUNE_PRESET: &str = r#"
name = "chiptune"
description = "Looping lead, bass and noise hat"
whole_note_ticks = 70560

[[channels]]
channel = 0
generator = "square13"
volume = 0.7
mml = "o5 l8 v12 e g a4 g e c4 d e d4. r8"
loop = true

[[channels]]
channel = 1
generator = "triangle"
mml = "o3 l4 c g a e"
loop = true

[[channels]]
channel = 2
generator = "white-noise"
volume = 0.4
mml = "l8 q4 cccccccc"
loop = true
[channels.adsr]
attack_rate = 131072
decay_rate = 64
sustain_level = 0
release_rate = 64
"#;

const ORGAN_PRESET: &str = r#"
name = "organ"
description = "Additive drawbar chord"

[[channels]]
channel = 0
generator = "harmonics"
coefficients = [1.0, 0.5, 0.33, 0.0, 0.2]
smooth = true
volume = 0.6
mml = "o4 c1"

[[channels]]
channel = 1
generator = "harmonics"
coefficients = [1.0, 0.5, 0.33, 0.0, 0.2]
smooth = true
volume = 0.6
detune = 0.5
mml = "o4 e1"

[[channels]]
channel = 2
generator = "harmonics"
coefficients = [1.0, 0.5, 0.33, 0.0, 0.2]
smooth = true
volume = 0.6
detune = -0.5
mml = "o4 g1"
"#;

/// All factory presets. Entries that fail to parse are skipped.
pub fn factory_presets() -> Vec<Preset> {
    FACTORY_PRESETS_TOML
        .iter()
        .filter_map(|(_, toml)| Preset::from_toml(toml).ok())
        .collect()
}

/// Factory preset by name.
pub fn get_factory_preset(name: &str) -> Option<Preset> {
    FACTORY_PRESETS_TOML
        .iter()
        .find(|(n, _)| *n == name)
        .and_then(|(_, toml)| Preset::from_toml(toml).ok())
}

/// Whether `name` names a factory preset.
pub fn is_factory_preset(name: &str) -> bool {
    FACTORY_PRESET_NAMES.contains(&name)
}
