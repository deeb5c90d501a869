//! Wavetable bank: fixed-length single-cycle waveform buffers.
//!
//! Each slot holds [`TABLE_LENGTH`] signed samples that a channel reads with
//! a wrapping integer phase. Tables are written by [`WavetableBank::generate`]
//! during setup and are only read while rendering.

#[cfg(not(feature = "std"))]
use alloc::{boxed::Box, vec, vec::Vec};

use core::f64::consts::PI;
use libm::sin;

use crate::error::{Error, Result};
use crate::noise::NoiseRegister;
use crate::OUTPUT_SAMPLE_RATE;

/// Number of wavetable slots.
pub const NUM_GENERATORS: usize = 13;

/// Samples per wavetable (eight seconds at the output rate).
pub const TABLE_LENGTH: usize = 44100 * 8;

/// Peak amplitude of generated waveforms, leaving headroom for mixing.
pub const HEADROOM_AMPLITUDE: i32 = 2205 * 6;

/// Frequency that advances one table sample per output sample.
pub const BASE_GENERATOR_FREQUENCY: f32 = OUTPUT_SAMPLE_RATE as f32 / TABLE_LENGTH as f32;

/// Taps of the smoothing filter.
pub const SMOOTHING_TAPS: usize = 9;

/// Index distance between smoothing taps.
pub const SMOOTHING_STRIDE: usize = 1000;

/// Samples per block of the short-noise waveform.
const SHORT_NOISE_BLOCK: usize = 40;

/// What a channel (or a mix operand) reads samples from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GeneratorSource {
    /// A wavetable slot of the bank.
    Slot(usize),
    /// A live LFSR noise generator instead of a table.
    Noise,
}

impl Default for GeneratorSource {
    fn default() -> Self {
        Self::Slot(0)
    }
}

/// Waveform recipes accepted by [`WavetableBank::generate`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Waveform<'a> {
    /// Square wave, 50% duty.
    Square,
    /// Square wave, 25% duty (1:3).
    Square13,
    /// Eighths 0, 1 and 3 high, the rest low.
    Square2114,
    /// Triangle built from an integrated ramp mirrored across the quadrants.
    Triangle,
    /// Additive sine; `coefficients[k]` is the amplitude of harmonic `k + 1`.
    Harmonics(&'a [f32]),
    /// LFSR noise quantized into 40-sample blocks of five levels.
    ShortNoise,
    /// Sample-wise average of two sources.
    Mix(GeneratorSource, GeneratorSource),
}

/// Owns the wavetable buffers.
#[derive(Clone)]
pub struct WavetableBank {
    tables: Vec<Box<[i16]>>,
}

impl core::fmt::Debug for WavetableBank {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WavetableBank")
            .field("slots", &self.tables.len())
            .field("length", &TABLE_LENGTH)
            .finish()
    }
}

impl Default for WavetableBank {
    fn default() -> Self {
        Self::new()
    }
}

impl WavetableBank {
    /// Allocate every slot, filled with silence.
    pub fn new() -> Self {
        Self {
            tables: (0..NUM_GENERATORS)
                .map(|_| vec![0i16; TABLE_LENGTH].into_boxed_slice())
                .collect(),
        }
    }

    /// Overwrite every slot with silence.
    pub fn silence(&mut self) {
        for table in &mut self.tables {
            table.fill(0);
        }
    }

    /// Read-only view of slot `slot`.
    pub fn table(&self, slot: usize) -> Option<&[i16]> {
        self.tables.get(slot).map(|t| &t[..])
    }

    /// Sample `index` of `slot`, or 0 when either is out of range.
    #[inline]
    pub fn sample(&self, slot: usize, index: usize) -> i16 {
        self.tables
            .get(slot)
            .and_then(|t| t.get(index))
            .copied()
            .unwrap_or(0)
    }

    fn check_slot(slot: usize) -> Result<()> {
        if slot < NUM_GENERATORS {
            Ok(())
        } else {
            Err(Error::out_of_range("generator slot", slot))
        }
    }

    fn check_source(source: GeneratorSource) -> Result<()> {
        match source {
            GeneratorSource::Slot(slot) => Self::check_slot(slot),
            GeneratorSource::Noise => Ok(()),
        }
    }

    /// Fill `slot` with `waveform`.
    ///
    /// Every operand is validated before the first sample is written, so a
    /// rejected call leaves the slot untouched.
    pub fn generate(&mut self, slot: usize, waveform: Waveform<'_>) -> Result<()> {
        Self::check_slot(slot)?;
        match waveform {
            Waveform::Square => fill_square(&mut self.tables[slot]),
            Waveform::Square13 => fill_square13(&mut self.tables[slot]),
            Waveform::Square2114 => fill_square2114(&mut self.tables[slot]),
            Waveform::Triangle => fill_triangle(&mut self.tables[slot]),
            Waveform::Harmonics(coefficients) => fill_harmonics(&mut self.tables[slot], coefficients),
            Waveform::ShortNoise => fill_short_noise(&mut self.tables[slot]),
            Waveform::Mix(a, b) => {
                Self::check_source(a)?;
                Self::check_source(b)?;
                self.mix(slot, a, b);
            }
        }
        Ok(())
    }

    fn mix(&mut self, slot: usize, a: GeneratorSource, b: GeneratorSource) {
        let mut noise = NoiseRegister::new();
        for i in 0..TABLE_LENGTH {
            let x = self.source_sample(a, i, &mut noise);
            let y = self.source_sample(b, i, &mut noise);
            self.tables[slot][i] = ((x + y) >> 1) as i16;
        }
    }

    fn source_sample(
        &self,
        source: GeneratorSource,
        index: usize,
        noise: &mut NoiseRegister,
    ) -> i32 {
        match source {
            GeneratorSource::Slot(slot) => i32::from(self.tables[slot][index]),
            GeneratorSource::Noise => noise.next_sample(),
        }
    }

    /// Run the smoothing filter over `slot` in place.
    ///
    /// Each output sample is the mean of [`SMOOTHING_TAPS`] input samples
    /// spaced [`SMOOTHING_STRIDE`] apart, reaching backwards with wraparound.
    /// Meant for square-type tables, where it rounds the edges into ramps.
    pub fn smooth(&mut self, slot: usize) -> Result<()> {
        Self::check_slot(slot)?;
        let source = self.tables[slot].clone();
        let table = &mut self.tables[slot];
        for (i, out) in table.iter_mut().enumerate() {
            let sum: i32 = (0..SMOOTHING_TAPS)
                .map(|j| {
                    let back = (j * SMOOTHING_STRIDE) % TABLE_LENGTH;
                    i32::from(source[(i + TABLE_LENGTH - back) % TABLE_LENGTH])
                })
                .sum();
            *out = (sum / SMOOTHING_TAPS as i32) as i16;
        }
        Ok(())
    }
}

fn fill_square(table: &mut [i16]) {
    let half = table.len() / 2;
    let (high, low) = table.split_at_mut(half);
    high.fill(HEADROOM_AMPLITUDE as i16);
    low.fill(-HEADROOM_AMPLITUDE as i16);
}

fn fill_square13(table: &mut [i16]) {
    let quarter = table.len() / 4;
    let (high, low) = table.split_at_mut(quarter);
    high.fill(HEADROOM_AMPLITUDE as i16);
    low.fill(-HEADROOM_AMPLITUDE as i16);
}

fn fill_square2114(table: &mut [i16]) {
    let len = table.len();
    for (i, s) in table.iter_mut().enumerate() {
        let eighth = (i << 3) / len;
        *s = if matches!(eighth, 0 | 1 | 3) {
            HEADROOM_AMPLITUDE as i16
        } else {
            -HEADROOM_AMPLITUDE as i16
        };
    }
}

fn fill_triangle(table: &mut [i16]) {
    let quarter = table.len() / 4;
    // Ramp slope in 1/16 units per sample.
    let step = (HEADROOM_AMPLITUDE * 24) / quarter as i32;

    for i in 0..quarter {
        table[i] = ((i as i32 * step) >> 4) as i16;
    }
    let peak = table[quarter - 1];
    for i in 0..quarter {
        table[quarter + i] = peak - table[i];
    }
    for i in 0..quarter * 2 {
        table[quarter * 2 + i] = -table[i];
    }
}

fn fill_harmonics(table: &mut [i16], coefficients: &[f32]) {
    let len = table.len() as f64;
    for (i, s) in table.iter_mut().enumerate() {
        let t = i as f64 / len;
        let y: f64 = coefficients
            .iter()
            .enumerate()
            .map(|(k, &c)| sin(2.0 * PI * t * (k + 1) as f64) * f64::from(c))
            .sum();
        let scaled = (y * f64::from(HEADROOM_AMPLITUDE)).clamp(-32767.0, 32767.0);
        *s = scaled as i16;
    }
}

fn fill_short_noise(table: &mut [i16]) {
    let mut reg = NoiseRegister::new();
    for block in table.chunks_mut(SHORT_NOISE_BLOCK) {
        let level = i32::from(reg.step() % 5) - 2;
        block.fill((level * HEADROOM_AMPLITUDE / 2) as i16);
    }
}
