//! Fixed-lookback echo.

use super::Effect;
use crate::config::DelayConfig;
use crate::dsp::fixed::mix_q8;
use crate::history::HistoryBuffer;
use crate::params::DelaySettings;

/// Delay effect. Stateless apart from its mix weights; the echo itself
/// lives in the shared history ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Delay {
    dry_mix: i32,
    wet_mix: i32,
}

impl Delay {
    /// Create a delay with the configured dry/wet weights.
    pub const fn new(config: &DelayConfig) -> Self {
        Delay {
            dry_mix: config.dry_mix,
            wet_mix: config.wet_mix,
        }
    }
}

impl Effect for Delay {
    type Settings = DelaySettings;

    #[inline]
    fn process<const N: usize>(
        &mut self,
        input: i32,
        settings: &DelaySettings,
        history: &HistoryBuffer<N>,
    ) -> i32 {
        if !settings.enabled || history.samples_written() <= settings.length {
            return input;
        }
        match history.read_at(settings.length as usize) {
            Some(wet) => mix_q8(input, wet, self.dry_mix, self.wet_mix),
            None => input,
        }
    }
}
