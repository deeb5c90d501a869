//! Live playback through an output device.

use super::common::{RELEASE_TAIL_TICKS, SongArgs, loops_forever, seconds_to_ticks};
use clap::Args;
use ongen_core::Engine;
use ongen_io::{AudioStream, StreamConfig, spread_mono};

/// Mono scratch frames rendered per pass when no buffer size is requested.
const DEFAULT_SCRATCH_FRAMES: usize = 4096;

#[derive(Args)]
pub struct PlayArgs {
    #[command(flatten)]
    song: SongArgs,

    /// Output device (index, exact name, or partial name)
    #[arg(short, long)]
    output: Option<String>,

    /// Stop after this many seconds (default: song end, or Ctrl+C when looping)
    #[arg(short, long)]
    seconds: Option<f32>,

    /// Device buffer size in frames
    #[arg(long)]
    buffer_size: Option<u32>,
}

pub fn run(args: PlayArgs) -> anyhow::Result<()> {
    let preset = args.song.load()?;

    let mut engine = Engine::new();
    let end_tick = preset.apply(&mut engine)?;
    let stop_at = match args.seconds {
        Some(seconds) => Some(seconds_to_ticks(seconds)?),
        None if loops_forever(&preset) => None,
        None => Some(end_tick + RELEASE_TAIL_TICKS),
    };

    let stream_config = StreamConfig {
        buffer_size: args.buffer_size,
        output_device: args.output,
        ..StreamConfig::default()
    };
    let mut stream = AudioStream::new(stream_config)?;
    let channels = usize::from(stream.output_channels());

    let stop = stream.stop_handle();
    ctrlc::set_handler(move || {
        println!("\nStopping...");
        stop.stop();
    })?;

    println!(
        "Playing '{}' at {} Hz{}... Press Ctrl+C to stop.",
        preset.name,
        stream.sample_rate(),
        if stop_at.is_none() { " (looping)" } else { "" }
    );

    let finished = stream.stop_handle();
    let scratch_frames = args
        .buffer_size
        .map_or(DEFAULT_SCRATCH_FRAMES, |n| n as usize)
        .max(1);
    let mut scratch = vec![0i16; scratch_frames];
    stream.run_output(move |data: &mut [f32]| {
        if stop_at.is_some_and(|tick| engine.global_tick() >= tick) {
            data.fill(0.0);
            finished.stop();
            return;
        }
        render_interleaved(&mut engine, &mut scratch, data, channels);
    })?;

    println!("Done!");
    Ok(())
}

/// Render mono audio through `scratch` into every channel of `data`.
///
/// `data` is processed in passes of at most `scratch.len()` frames, so the
/// callback never grows its buffer. A trailing partial frame is zeroed.
fn render_interleaved(engine: &mut Engine, scratch: &mut [i16], data: &mut [f32], channels: usize) {
    let channels = channels.max(1);
    let whole = data.len() - data.len() % channels;
    let (frames, tail) = data.split_at_mut(whole);
    tail.fill(0.0);
    if scratch.is_empty() {
        frames.fill(0.0);
        return;
    }
    for pass in frames.chunks_mut(scratch.len() * channels) {
        let n = pass.len() / channels;
        let mono = &mut scratch[..n];
        engine.render_i16(mono, false);
        spread_mono(mono, pass, channels);
    }
}
