//! Statement list to sequence log.

use ongen_core::{Command, PitchBend, SequenceLog, VOLUME_MAX};

use crate::error::MmlError;
use crate::parse::{Spanned, Statement, parse};

/// Largest `v` value.
pub const MML_VOLUME_MAX: i32 = 15;

/// Gate time denominator: `q16` holds the full note length.
pub const GATE_STEPS: i32 = 16;

/// Interpreter state carried across statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct VoiceState {
    default_length: i32,
    octave: i32,
    gate: i32,
    timbre: i32,
    volume: Option<u8>,
    detune: i32,
}

impl Default for VoiceState {
    fn default() -> Self {
        Self {
            default_length: 4,
            octave: 4,
            gate: GATE_STEPS,
            timbre: 0,
            volume: None,
            detune: 0,
        }
    }
}

/// Compiles MML voices into [`SequenceLog`]s.
///
/// # Example
///
/// ```rust
/// use ongen_core::SequenceLog;
/// use ongen_mml::Compiler;
///
/// let compiler = Compiler::new(44100 * 2);
/// let mut log = SequenceLog::with_capacity(64);
/// let end = compiler.compile_into("o4 l8 cdef", 0, &mut log).unwrap();
/// assert_eq!(end, 4 * 44100 / 4);
/// assert_eq!(log.len(), 8);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Compiler {
    whole_note_ticks: u64,
}

impl Compiler {
    /// A compiler where a whole note lasts `whole_note_ticks` samples.
    pub fn new(whole_note_ticks: u64) -> Self {
        Self { whole_note_ticks }
    }

    /// Ticks per whole note.
    pub fn whole_note_ticks(&self) -> u64 {
        self.whole_note_ticks
    }

    /// Compile `mml` into a fresh log sized to fit it.
    pub fn compile(&self, mml: &str, origin_tick: u64) -> Result<(SequenceLog, u64), MmlError> {
        let statements = parse(mml)?;
        let entries = statements
            .iter()
            .map(|s| match s.statement {
                Statement::Note { .. } => 2,
                Statement::Rest { .. } => 1,
                _ => 0,
            })
            .sum();
        let mut log = SequenceLog::with_capacity(entries);
        let end = self.emit(&statements, origin_tick, &mut log)?;
        Ok((log, end))
    }

    /// Append the commands of `mml` to `log`, starting at `origin_tick`.
    ///
    /// Returns the tick just past the last note or rest.
    pub fn compile_into(
        &self,
        mml: &str,
        origin_tick: u64,
        log: &mut SequenceLog,
    ) -> Result<u64, MmlError> {
        let statements = parse(mml)?;
        self.emit(&statements, origin_tick, log)
    }

    fn emit(
        &self,
        statements: &[Spanned],
        origin_tick: u64,
        log: &mut SequenceLog,
    ) -> Result<u64, MmlError> {
        let mut state = VoiceState::default();
        let mut tick = origin_tick;

        for &Spanned { pos, statement } in statements {
            match statement {
                Statement::Note {
                    semitone,
                    length,
                    dots,
                } => {
                    let note = semitone + 12 * state.octave;
                    let note = u8::try_from(note)
                        .ok()
                        .filter(|&n| n <= 127)
                        .ok_or(MmlError::NoteOutOfRange { pos, note })?;
                    let duration = self.duration(length, state.default_length, dots);

                    let mut on = Command::key_on(note);
                    if let Some(bend) = detune_bend(state.detune) {
                        on = on.with_pitch_bend(bend);
                    }
                    if let Some(volume) = state.volume {
                        on = on.with_volume(volume);
                    }
                    let release = tick + duration * state.gate as u64 / GATE_STEPS as u64;
                    append(log, pos, tick, on)?;
                    append(log, pos, release, Command::key_off())?;
                    tick += duration;
                }
                Statement::Rest { length, dots } => {
                    append(log, pos, tick, Command::key_off())?;
                    tick += self.duration(length, state.default_length, dots);
                }
                Statement::Length(value) => {
                    if value < 1 {
                        return Err(invalid(pos, 'l', value, "length must be at least 1"));
                    }
                    state.default_length = value;
                    tracing::debug!(length = value, "mml default length");
                }
                Statement::Octave(value) => {
                    state.octave = value;
                    tracing::debug!(octave = value, "mml octave");
                }
                Statement::Gate(value) => {
                    if !(0..=GATE_STEPS).contains(&value) {
                        return Err(invalid(pos, 'q', value, "gate must be within 0..=16"));
                    }
                    state.gate = value;
                    tracing::debug!(gate = value, "mml gate");
                }
                Statement::Timbre(value) => {
                    state.timbre = value;
                    tracing::debug!(timbre = value, "mml timbre");
                }
                Statement::Volume(value) => {
                    if !(0..=MML_VOLUME_MAX).contains(&value) {
                        return Err(invalid(pos, 'v', value, "volume must be within 0..=15"));
                    }
                    state.volume = Some((value * i32::from(VOLUME_MAX) / MML_VOLUME_MAX) as u8);
                    tracing::debug!(volume = value, "mml volume");
                }
                Statement::Detune(value) => {
                    state.detune = value;
                    tracing::debug!(detune = value, "mml detune");
                }
                Statement::OctaveUp => state.octave += 1,
                Statement::OctaveDown => state.octave -= 1,
                Statement::Ignored(..) => {}
            }
        }

        Ok(tick)
    }

    /// Ticks for a note of `1/length` with `dots` dots.
    ///
    /// A missing or non-positive length falls back to `default_length`.
    fn duration(&self, length: Option<i32>, default_length: i32, dots: u8) -> u64 {
        let divisor = length.filter(|&l| l >= 1).unwrap_or(default_length).max(1) as u64;
        let base = self.whole_note_ticks / divisor;
        let mut ticks = base;
        if dots > 0 {
            ticks += base / 2;
        }
        if dots > 1 {
            ticks += base / 4;
        }
        ticks
    }
}

/// Pitch bend for a `k` detune: ±1 counts as ±2, then halved and capped at 63.
fn detune_bend(detune: i32) -> Option<PitchBend> {
    let detune = match detune {
        1 => 2,
        -1 => -2,
        d => d,
    } / 2;
    let amount = detune.unsigned_abs().min(63) as u8;
    match detune {
        0 => None,
        d if d > 0 => Some(PitchBend::Up(amount)),
        _ => Some(PitchBend::Down(amount)),
    }
}

fn append(log: &mut SequenceLog, pos: usize, tick: u64, command: Command) -> Result<(), MmlError> {
    log.append(tick, command)
        .map_err(|source| MmlError::Sequence { pos, source })
}

fn invalid(pos: usize, command: char, value: i32, reason: &'static str) -> MmlError {
    MmlError::InvalidValue {
        pos,
        command,
        value,
        reason,
    }
}
