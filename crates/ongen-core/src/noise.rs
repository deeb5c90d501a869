//! 15-bit linear-feedback shift register used for noise.

/// Seed and feedback bit of the register.
pub const NOISE_SEED: u16 = 0x4000;
const TAP1: u16 = 0x01;
const TAP2: u16 = 0x02;

/// Binary noise generator: bit 0 XOR bit 1 feeds back into bit 14.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NoiseRegister(u16);

impl Default for NoiseRegister {
    fn default() -> Self {
        Self(NOISE_SEED)
    }
}

impl NoiseRegister {
    /// A register at the default seed.
    pub const fn new() -> Self {
        Self(NOISE_SEED)
    }

    /// Current register contents.
    pub const fn value(self) -> u16 {
        self.0
    }

    /// Shift once and return the new register contents.
    #[inline]
    pub fn step(&mut self) -> u16 {
        let feedback = ((self.0 & TAP1) != 0) != ((self.0 & TAP2) != 0);
        self.0 >>= 1;
        if feedback {
            self.0 |= NOISE_SEED;
        }
        self.0
    }

    /// Shift once and return a binary sample of ±16384.
    #[inline]
    pub fn next_sample(&mut self) -> i32 {
        (i32::from(self.step() & 1) << 15) - 16384
    }
}
