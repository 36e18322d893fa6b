//! Short delay whose lookback is swept by the sine LFO.

use super::{Effect, Lfo};
use crate::config::ChorusConfig;
use crate::dsp::fixed::mix_q8;
use crate::history::HistoryBuffer;
use crate::params::ChorusSettings;

/// Lookback for one LFO value: `base + (offset * depth) >> 7`, clamped to
/// `1..=capacity-1`.
#[inline]
pub fn modulated_lookback(
    base_delay: u32,
    modulation_depth: u32,
    offset: i32,
    capacity: usize,
) -> usize {
    let modulation = (offset as i64 * modulation_depth as i64) >> 7;
    let lookback = base_delay as i64 + modulation;
    let max = capacity.saturating_sub(1).max(1) as i64;
    lookback.clamp(1, max) as usize
}

/// Chorus effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Chorus {
    lfo: Lfo,
    dry_mix: i32,
    wet_mix: i32,
    last_lookback: Option<usize>,
}

impl Chorus {
    /// Create a chorus with its LFO at phase 0.
    pub const fn new(config: &ChorusConfig) -> Self {
        Chorus {
            lfo: Lfo::new(),
            dry_mix: config.dry_mix,
            wet_mix: config.wet_mix,
            last_lookback: None,
        }
    }

    /// LFO state.
    pub fn lfo(&self) -> &Lfo {
        &self.lfo
    }

    /// Lookback used on the most recent wet tick.
    pub fn last_lookback(&self) -> Option<usize> {
        self.last_lookback
    }
}

impl Effect for Chorus {
    type Settings = ChorusSettings;

    #[inline]
    fn process<const N: usize>(
        &mut self,
        input: i32,
        settings: &ChorusSettings,
        history: &HistoryBuffer<N>,
    ) -> i32 {
        if !settings.enabled {
            return input;
        }
        let reach = settings.base_delay.saturating_add(settings.modulation_depth);
        if history.samples_written() <= reach {
            return input;
        }
        let offset = self.lfo.advance(settings.phase_increment);
        let lookback =
            modulated_lookback(settings.base_delay, settings.modulation_depth, offset, N);
        self.last_lookback = Some(lookback);
        match history.read_at(lookback) {
            Some(wet) => mix_q8(input, wet, self.dry_mix, self.wet_mix),
            None => input,
        }
    }
}
