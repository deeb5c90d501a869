//! Integration tests for the `ongen` binary.

use std::process::Command;
use tempfile::TempDir;

/// Helper to get the path to the `ongen` binary built by cargo.
fn ongen_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_ongen"))
}

// ---------------------------------------------------------------------------
// `ongen notes`
// ---------------------------------------------------------------------------

#[test]
fn cli_notes_shows_requested_notes() {
    let output = ongen_bin()
        .args(["notes", "69", "48"])
        .output()
        .expect("failed to run ongen notes");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("o5 a"), "got: {stdout}");
    assert!(stdout.contains("440.000"), "got: {stdout}");
    assert!(stdout.contains("o4 c"), "got: {stdout}");
    assert_eq!(stdout.lines().count(), 3);
}

#[test]
fn cli_notes_defaults_to_all() {
    let output = ongen_bin().arg("notes").output().unwrap();
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).lines().count(), 129);
}

#[test]
fn cli_notes_rejects_out_of_range() {
    let output = ongen_bin().args(["notes", "128"]).output().unwrap();
    assert!(!output.status.success());
}

// ---------------------------------------------------------------------------
// `ongen presets`
// ---------------------------------------------------------------------------

#[test]
fn cli_presets_lists_factory_presets() {
    let output = ongen_bin().arg("presets").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for name in ["scale", "chiptune", "organ"] {
        assert!(stdout.contains(name), "listing should contain '{name}'");
    }
}

#[test]
fn cli_presets_export_then_render_file() {
    let dir = TempDir::new().unwrap();
    let preset_path = dir.path().join("presets").join("organ.toml");
    let wav_path = dir.path().join("organ.wav");

    let output = ongen_bin()
        .args(["presets", "export", "organ"])
        .arg(&preset_path)
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(preset_path.exists());

    let output = ongen_bin()
        .arg("render")
        .arg(&preset_path)
        .arg("-o")
        .arg(&wav_path)
        .args(["--seconds", "0.5"])
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "render failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let (samples, info) = ongen_io::read_wav_i16(&wav_path).unwrap();
    assert_eq!(info.channels, 2);
    assert_eq!(info.num_frames, 22050);
    assert!(samples.iter().any(|&s| s != 0));
}

#[test]
fn cli_presets_show_unknown_fails() {
    let output = ongen_bin()
        .args(["presets", "show", "nope"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Unknown factory preset"));
}

// ---------------------------------------------------------------------------
// `ongen render`
// ---------------------------------------------------------------------------

#[test]
fn cli_render_mml_mono_wav() {
    let dir = TempDir::new().unwrap();
    let wav_path = dir.path().join("mml.wav");

    let output = ongen_bin()
        .args(["render", "--mml", "o4 l8 cdef", "--mono", "-o"])
        .arg(&wav_path)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "render failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    // origin 8820 + four eighths of 88200 + half a second of release
    let info = ongen_io::read_wav_info(&wav_path).unwrap();
    assert_eq!(info.channels, 1);
    assert_eq!(info.sample_rate, 44100);
    assert_eq!(info.num_frames, 8820 + 44100 + 22050);
}

#[test]
fn cli_render_raw_big_endian_matches_wav() {
    let dir = TempDir::new().unwrap();
    let wav_path = dir.path().join("song.wav");
    let raw_path = dir.path().join("song.pcm");

    let output = ongen_bin()
        .args(["render", "scale", "--seconds", "0.25", "--big-endian", "-o"])
        .arg(&wav_path)
        .arg("--raw")
        .arg(&raw_path)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "render failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let raw = std::fs::read(&raw_path).unwrap();
    let (samples, _) = ongen_io::read_wav_i16(&wav_path).unwrap();
    assert_eq!(raw.len(), samples.len() * 2);
    let decoded: Vec<i16> = raw
        .chunks_exact(2)
        .map(|b| i16::from_be_bytes([b[0], b[1]]))
        .collect();
    assert_eq!(decoded, samples);
}

#[test]
fn cli_render_requires_song() {
    let dir = TempDir::new().unwrap();
    let output = ongen_bin()
        .args(["render", "-o"])
        .arg(dir.path().join("x.wav"))
        .output()
        .unwrap();
    assert!(!output.status.success());
}

#[test]
fn cli_render_reports_mml_error() {
    let dir = TempDir::new().unwrap();
    let output = ongen_bin()
        .args(["render", "--mml", "c x", "-o"])
        .arg(dir.path().join("x.wav"))
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unexpected character 'x'"), "got: {stderr}");
}

#[test]
fn cli_big_endian_requires_raw() {
    let dir = TempDir::new().unwrap();
    let output = ongen_bin()
        .args(["render", "scale", "--big-endian", "-o"])
        .arg(dir.path().join("x.wav"))
        .output()
        .unwrap();
    assert!(!output.status.success());
}

#[test]
fn cli_render_rejects_block_beyond_lookahead() {
    let dir = TempDir::new().unwrap();
    let output = ongen_bin()
        .args(["render", "scale", "--block-size", "44101", "-o"])
        .arg(dir.path().join("x.wav"))
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("at most 44100 frames"), "got: {stderr}");
}

#[test]
fn cli_render_midi_preset() {
    let dir = TempDir::new().unwrap();
    let body: &[u8] = &[
        0x00, 0x90, 69, 100, 0x60, 0x80, 69, 0, 0x00, 0xff, 0x2f, 0x00,
    ];
    let mut smf = b"MThd".to_vec();
    smf.extend_from_slice(&[0, 0, 0, 6, 0, 0, 0, 1, 0, 96]);
    smf.extend_from_slice(b"MTrk");
    smf.extend_from_slice(&(body.len() as u32).to_be_bytes());
    smf.extend_from_slice(body);
    std::fs::write(dir.path().join("tune.mid"), smf).unwrap();

    let preset_path = dir.path().join("tune.toml");
    std::fs::write(
        &preset_path,
        "name = \"tune\"\nmidi = \"tune.mid\"\nmidi_tick_scale = 10\norigin_tick = 0\n\n\
         [[channels]]\nchannel = 0\nmidi_channel = 0\n",
    )
    .unwrap();

    let wav_path = dir.path().join("tune.wav");
    let output = ongen_bin()
        .arg("render")
        .arg(&preset_path)
        .args(["--mono", "-o"])
        .arg(&wav_path)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "render failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    // note-off at MIDI tick 96, ten samples per tick, then the release tail
    let info = ongen_io::read_wav_info(&wav_path).unwrap();
    assert_eq!(info.num_frames, 960 + 22050);
    let (samples, _) = ongen_io::read_wav_i16(&wav_path).unwrap();
    assert!(samples.iter().any(|&s| s != 0));
}
