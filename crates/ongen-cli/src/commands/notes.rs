//! Note table inspection.

use clap::Args;
use ongen_core::channel::phase_step;
use ongen_core::standard_frequency;

const NOTE_NAMES: [&str; 12] = [
    "c", "c+", "d", "d+", "e", "f", "f+", "g", "g+", "a", "a+", "b",
];

#[derive(Args)]
pub struct NotesArgs {
    /// Note numbers to show (default: all 128)
    #[arg(value_parser = clap::value_parser!(u8).range(0..128))]
    notes: Vec<u8>,
}

pub fn run(args: NotesArgs) -> anyhow::Result<()> {
    let notes: Vec<u8> = if args.notes.is_empty() {
        (0..128).collect()
    } else {
        args.notes
    };

    println!("{:>4}  {:<7}  {:>12}  {:>5}", "note", "mml", "Hz", "step");
    for note in notes {
        let hz = standard_frequency(note);
        println!(
            "{:>4}  {:<7}  {:>12.3}  {:>5}",
            note,
            mml_name(note),
            hz,
            phase_step(hz)
        );
    }
    Ok(())
}

/// Octave and pitch as MML would write the note, e.g. `o4 a`.
fn mml_name(note: u8) -> String {
    format!("o{} {}", note / 12, NOTE_NAMES[usize::from(note % 12)])
}
