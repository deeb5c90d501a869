//! Integration tests for ongen-config.

use ongen_config::{ChannelConfig, ConfigError, GeneratorKind, Preset, get_factory_preset};
use ongen_core::{Endianness, Engine};
use tempfile::TempDir;

#[test]
fn test_preset_file_roundtrip() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("dir").join("song.toml");

    let preset = Preset::new("Song")
        .with_description("file test")
        .with_whole_note_ticks(4000)
        .with_channel(ChannelConfig::new(0, "o4 l8 cdef").with_harmonics(vec![1.0, 0.25]))
        .with_channel(ChannelConfig::new(9, "r2 c2").looped());

    preset.save(&path).unwrap();
    assert!(path.exists());

    let loaded = Preset::load(&path).unwrap();
    assert_eq!(loaded, preset);
}

#[test]
fn test_load_missing_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("absent.toml");
    let err = Preset::load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::ReadFile { .. }));
    assert!(err.to_string().contains("absent.toml"));
}

#[test]
fn test_load_invalid_toml() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("broken.toml");
    std::fs::write(&path, "name = [unclosed").unwrap();
    assert!(matches!(
        Preset::load(&path),
        Err(ConfigError::TomlParse(_))
    ));
}

#[test]
fn test_applied_preset_renders_sound() {
    let preset = Preset::new("render")
        .with_whole_note_ticks(8000)
        .with_origin_tick(0)
        .with_channel(ChannelConfig::new(0, "o4 c1").with_generator(GeneratorKind::Square))
        .with_channel(ChannelConfig::new(1, "o5 e1").with_generator(GeneratorKind::Triangle));

    let mut engine = Engine::new();
    let end = preset.apply(&mut engine).unwrap();
    assert_eq!(end, 8000);

    let mut pcm = vec![0i16; 4000];
    engine.render_i16(&mut pcm, false);
    assert!(pcm.iter().any(|&s| s != 0));

    let mut bytes = vec![0u8; 400];
    engine
        .render(&mut bytes, 200, 2, false, Endianness::Big)
        .unwrap();
    assert_eq!(engine.global_tick(), 4200);
}

#[test]
fn test_looped_factory_preset_keeps_playing() {
    let preset = get_factory_preset("chiptune").unwrap();
    let mut engine = Engine::new();
    let end = preset.apply(&mut engine).unwrap();

    let mut pcm = vec![0i16; 4410];
    let passes = usize::try_from(end * 2 / 4410).unwrap() + 1;
    for _ in 0..passes {
        engine.render_i16(&mut pcm, false);
    }
    engine.render_i16(&mut pcm, false);
    assert!(engine.global_tick() > end * 2);
    assert!(pcm.iter().any(|&s| s != 0), "looped voices went silent");
}

#[test]
fn test_invalid_channel_rejected_before_engine_changes() {
    let preset = Preset::new("bad")
        .with_channel(ChannelConfig::new(0, "c"))
        .with_channel(ChannelConfig::new(20, "c"));
    let mut engine = Engine::new();
    assert!(matches!(
        preset.apply(&mut engine),
        Err(ConfigError::InvalidChannel { channel: 20, .. })
    ));
    assert!(engine.sequence(0).unwrap().is_none());
}

/// Two-channel SMF at 96 ticks per quarter with a loop around the second
/// note of channel 0. Channel 1 holds one note.
fn two_voice_midi() -> Vec<u8> {
    let body: &[u8] = &[
        0x00, 0x90, 60, 120, // ch0 on, velocity 120
        0x60, 0x80, 60, 0, // off at 96
        0x00, 0xff, 0x06, 0x01, 0x01, // loop marker
        0x00, 0x90, 62, 40, // ch0 on at 96, velocity 40
        0x00, 0x91, 48, 90, // ch1 on at 96
        0x60, 0x80, 62, 0, // ch0 off at 192
        0x00, 0xff, 0x06, 0x01, 0x01, // loop marker
        0x60, 0x81, 48, 0, // ch1 off at 288
        0x00, 0xff, 0x2f, 0x00,
    ];
    let mut out = b"MThd".to_vec();
    out.extend_from_slice(&[0, 0, 0, 6, 0, 0, 0, 1, 0, 96]);
    out.extend_from_slice(b"MTrk");
    out.extend_from_slice(&(body.len() as u32).to_be_bytes());
    out.extend_from_slice(body);
    out
}

#[test]
fn test_midi_voices_from_preset_file() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(temp_dir.path().join("song.mid"), two_voice_midi()).unwrap();
    let path = temp_dir.path().join("song.toml");
    std::fs::write(
        &path,
        r#"
name = "midi"
midi = "song.mid"
midi_tick_scale = 10
origin_tick = 0

[[channels]]
channel = 0
midi_channel = 0
loop = true

[[channels]]
channel = 5
generator = "triangle"
midi_channel = 1
"#,
    )
    .unwrap();

    let preset = Preset::load(&path).unwrap();
    assert_eq!(preset.midi.as_deref(), Some(temp_dir.path().join("song.mid").as_path()));

    let mut engine = Engine::new();
    let end = preset.apply(&mut engine).unwrap();
    assert_eq!(end, 2880);

    let lead = engine.sequence(0).unwrap().unwrap();
    let volumes: Vec<Option<u8>> = lead.entries().iter().map(|e| e.command.volume()).collect();
    assert_eq!(volumes, vec![Some(120), None, Some(40), None]);
    let region = lead.loop_region().unwrap();
    assert_eq!((region.first, region.last), (2, 3));
    assert_eq!((region.start_tick, region.end_tick), (960, 1920));

    let bass = engine.sequence(5).unwrap().unwrap();
    assert_eq!(bass.len(), 2);
    assert_eq!(bass.entries()[0].command.note(), 48);
    assert!(bass.loop_region().is_none());
}

#[test]
fn test_midi_voice_without_input_rejected() {
    let preset = Preset::new("no input").with_channel(ChannelConfig::new(0, "").with_midi_channel(0));
    let err = preset.apply(&mut Engine::new()).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::InvalidParameter {
            param: "midi_channel",
            ..
        }
    ));
}

#[test]
fn test_missing_midi_input_reported() {
    let temp_dir = TempDir::new().unwrap();
    let preset = Preset::new("missing")
        .with_midi(temp_dir.path().join("absent.mid"))
        .with_channel(ChannelConfig::new(0, "").with_midi_channel(0));
    let err = preset.apply(&mut Engine::new()).unwrap_err();
    assert!(matches!(err, ConfigError::Midi(_)));
    assert!(err.to_string().contains("absent.mid"));
}
