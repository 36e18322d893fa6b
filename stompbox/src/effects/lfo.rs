//! Table-driven low-frequency oscillator.

use crate::constants::{PHASE_FRAC_BITS, PHASE_PERIOD, SINE_TABLE_SIZE};
use crate::dsp::wavetables::sine_offset;

/// Per-tick phase increment for an LFO rate given in 0.1 Hz units.
///
/// `rate * table_size * 256 / (sample_rate * 10)`, computed in 64 bits.
/// Never returns 0 for a non-zero rate, so a slow LFO still moves.
pub const fn phase_increment(rate: u32, sample_rate_hz: u32) -> u32 {
    if sample_rate_hz == 0 {
        return 0;
    }
    let numerator = rate as u64 * SINE_TABLE_SIZE as u64 * (1u64 << PHASE_FRAC_BITS);
    let denominator = sample_rate_hz as u64 * 10;
    let inc = (numerator / denominator) as u32;
    if inc == 0 && rate > 0 {
        1
    } else {
        inc
    }
}

/// Phase accumulator with 8 fractional bits, wrapping at one table period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Lfo {
    phase: u32,
}

impl Lfo {
    /// Start at phase 0 (rising zero crossing).
    pub const fn new() -> Self {
        Lfo { phase: 0 }
    }

    /// Current phase, always below one table period.
    pub fn phase(&self) -> u32 {
        self.phase
    }

    /// Table index for the current phase.
    pub fn index(&self) -> usize {
        ((self.phase >> PHASE_FRAC_BITS) as usize) % SINE_TABLE_SIZE
    }

    /// Advance by `increment` and return the new signed table value (`-127..=127`).
    #[inline]
    pub fn advance(&mut self, increment: u32) -> i32 {
        self.phase = (self.phase % PHASE_PERIOD + increment % PHASE_PERIOD) % PHASE_PERIOD;
        sine_offset(self.index())
    }

    /// Jump to an explicit phase (wrapped).
    pub fn set_phase(&mut self, phase: u32) {
        self.phase = phase % PHASE_PERIOD;
    }
}
