//! Amplitude modulation driven by the sine LFO.

use super::{Effect, Lfo};
use crate::config::TremoloConfig;
use crate::constants::UNITY_Q8;
use crate::dsp::fixed::scale_q8;
use crate::history::HistoryBuffer;
use crate::params::TremoloSettings;

/// Q8 gain for one LFO value: `(256 - depth) + offset * depth / 127`,
/// clamped to `1..=256`.
///
/// `offset` is the signed table value (`-127..=127`). At full depth the
/// gain swings over the whole range; at depth 64 it stays in `128..=256`.
#[inline]
pub fn gain_for(offset: i32, depth: u32) -> i32 {
    let depth = depth.min(UNITY_Q8 as u32) as i32;
    let gain = (UNITY_Q8 - depth) + offset * depth / 127;
    gain.clamp(1, UNITY_Q8)
}

/// Tremolo effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Tremolo {
    lfo: Lfo,
    noise_floor: i32,
    last_gain: i32,
}

impl Tremolo {
    /// Create a tremolo with its LFO at phase 0.
    pub const fn new(config: &TremoloConfig) -> Self {
        Tremolo {
            lfo: Lfo::new(),
            noise_floor: config.noise_floor,
            last_gain: UNITY_Q8,
        }
    }

    /// LFO state.
    pub fn lfo(&self) -> &Lfo {
        &self.lfo
    }

    /// Gain applied to the most recent modulated sample.
    pub fn last_gain(&self) -> i32 {
        self.last_gain
    }
}

impl Effect for Tremolo {
    type Settings = TremoloSettings;

    /// The LFO keeps running while the effect is enabled, even across
    /// samples below the noise floor, so the modulation stays in time.
    #[inline]
    fn process<const N: usize>(
        &mut self,
        input: i32,
        settings: &TremoloSettings,
        _history: &HistoryBuffer<N>,
    ) -> i32 {
        if !settings.enabled {
            return input;
        }
        let offset = self.lfo.advance(settings.phase_increment);
        if input.unsigned_abs() < self.noise_floor.unsigned_abs() {
            return input;
        }
        self.last_gain = gain_for(offset, settings.depth);
        scale_q8(input, self.last_gain)
    }
}
