//! Offline rendering to WAV or raw PCM.

use super::common::{RELEASE_TAIL_TICKS, SongArgs, loops_forever, seconds_to_ticks};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use ongen_core::{Endianness, Engine, LOOKAHEAD_TICKS, OUTPUT_SAMPLE_RATE};
use ongen_io::{write_raw, write_wav};
use std::path::PathBuf;

/// Seconds rendered for a looping song when no duration is given.
const DEFAULT_LOOP_SECONDS: f32 = 10.0;

#[derive(Args)]
pub struct RenderArgs {
    #[command(flatten)]
    song: SongArgs,

    /// Output WAV file
    #[arg(short, long, required_unless_present = "raw")]
    output: Option<PathBuf>,

    /// Also (or only) write headerless PCM to this file
    #[arg(long, value_name = "FILE")]
    raw: Option<PathBuf>,

    /// Byte order of the raw file
    #[arg(long, requires = "raw")]
    big_endian: bool,

    /// Duration in seconds (default: song end plus release, or 10s when looping)
    #[arg(short, long)]
    seconds: Option<f32>,

    /// Write one channel instead of two
    #[arg(long)]
    mono: bool,

    /// Frames rendered per engine call
    #[arg(long, default_value = "4410")]
    block_size: usize,
}

pub fn run(args: RenderArgs) -> anyhow::Result<()> {
    if args.block_size == 0 {
        anyhow::bail!("Block size must be at least 1");
    }
    if args.block_size as u64 > LOOKAHEAD_TICKS {
        anyhow::bail!("Block size must be at most {LOOKAHEAD_TICKS} frames");
    }
    let preset = args.song.load()?;

    let mut engine = Engine::new();
    let end_tick = preset.apply(&mut engine)?;

    let total_ticks = match args.seconds {
        Some(seconds) => seconds_to_ticks(seconds)?,
        None if loops_forever(&preset) => seconds_to_ticks(DEFAULT_LOOP_SECONDS)?,
        None => end_tick + RELEASE_TAIL_TICKS,
    };
    let frames = usize::try_from(total_ticks)?;
    let stereo = !args.mono;
    let channels: u16 = if stereo { 2 } else { 1 };
    let frame_bytes = 2 * usize::from(channels);
    let endianness = if args.big_endian {
        Endianness::Big
    } else {
        Endianness::Little
    };

    println!(
        "Rendering '{}': {} channel(s), {:.2}s",
        preset.name,
        preset.len(),
        total_ticks as f64 / f64::from(OUTPUT_SAMPLE_RATE)
    );

    let pb = ProgressBar::new(frames as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("##-"),
    );

    let mut bytes = vec![0u8; frames * frame_bytes];
    for chunk in bytes.chunks_mut(args.block_size * frame_bytes) {
        let n = chunk.len() / frame_bytes;
        engine.render(chunk, n, frame_bytes, stereo, endianness)?;
        pb.inc(n as u64);
    }
    pb.finish_with_message("done");

    if let Some(path) = &args.raw {
        write_raw(path, &bytes)?;
        println!(
            "Wrote {} bytes of {}-endian PCM to {}",
            bytes.len(),
            if args.big_endian { "big" } else { "little" },
            path.display()
        );
    }

    if let Some(path) = &args.output {
        let samples = decode_samples(&bytes, endianness);
        write_wav(path, &samples, channels, OUTPUT_SAMPLE_RATE)?;
        let peak = samples.iter().map(|s| s.unsigned_abs()).max().unwrap_or(0);
        println!(
            "Wrote {} frames to {} (peak {})",
            frames,
            path.display(),
            peak
        );
    }

    Ok(())
}

/// Decode 16-bit PCM bytes written in `endianness`.
fn decode_samples(bytes: &[u8], endianness: Endianness) -> Vec<i16> {
    bytes
        .chunks_exact(2)
        .map(|pair| {
            let pair = [pair[0], pair[1]];
            match endianness {
                Endianness::Big => i16::from_be_bytes(pair),
                Endianness::Little => i16::from_le_bytes(pair),
            }
        })
        .collect()
}
