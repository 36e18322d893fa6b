//! Input conditioning: bias removal, filtering, scaling, AGC and soft limiting.
//!
//! Runs first in every sampling tick. Each stage keeps its own accumulator;
//! nothing here is shared with other interrupt contexts.
//!
//! ```text
//!   raw ─► BiasTracker ─► HP ─► LP ─► LP ─► >> scale ─► Agc ─► soft knee ─► out
//! ```

use crate::config::ConditioningConfig;
use crate::constants::UNITY_Q8;
use crate::dsp::fixed::{one_pole, saturate32, scale_q8, soft_knee};

/// Outcome of one [`BiasTracker::update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BiasUpdate {
    /// Sample within the divergence limit; the average moved normally.
    Tracking,
    /// Sample diverged; the bias snapped back to the baseline.
    Reset,
    /// The input sat consistently away from the baseline long enough that
    /// the baseline itself was replaced.
    Reseeded,
}

/// Exponential moving average of the input's DC offset.
///
/// If the input jumps further than the divergence limit away from the
/// tracked bias, the tracker snaps back to its static baseline instead of
/// slowly chasing the spike. A run of divergent samples that agree with
/// each other for `reseed_ticks` ticks means the baseline is wrong (for
/// example it was primed from a startup transient), so the baseline is
/// re-seeded from the average of that run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BiasTracker {
    bias: i32,
    baseline: i32,
    primed: bool,
    candidate: i32,
    divergent_run: u32,
}

impl BiasTracker {
    /// Create a tracker. With `Some(baseline)` the tracker starts there;
    /// with `None` the first sample becomes the baseline.
    pub const fn new(baseline: Option<i32>) -> Self {
        let (bias, primed) = match baseline {
            Some(b) => (b, true),
            None => (0, false),
        };
        BiasTracker { bias, baseline: bias, primed, candidate: bias, divergent_run: 0 }
    }

    /// Current bias estimate.
    pub fn bias(&self) -> i32 {
        self.bias
    }

    /// Baseline restored on divergence.
    pub fn baseline(&self) -> i32 {
        self.baseline
    }

    /// Consecutive divergent samples in the current run.
    pub fn divergent_run(&self) -> u32 {
        self.divergent_run
    }

    /// Track `sample`.
    pub fn update(
        &mut self,
        sample: i32,
        shift: u32,
        divergence_limit: i32,
        reseed_ticks: u32,
    ) -> BiasUpdate {
        if !self.primed {
            self.bias = sample;
            self.baseline = sample;
            self.primed = true;
            return BiasUpdate::Tracking;
        }
        let delta = sample as i64 - self.bias as i64;
        self.bias = saturate32(self.bias as i64 + (delta >> shift));

        let limit = divergence_limit as i64;
        if (self.bias as i64 - sample as i64).abs() <= limit {
            self.divergent_run = 0;
            return BiasUpdate::Tracking;
        }

        // The run only counts while its samples stay within the limit of
        // each other.
        if self.divergent_run == 0 || (sample as i64 - self.candidate as i64).abs() > limit {
            self.candidate = sample;
            self.divergent_run = 1;
        } else {
            let delta = sample as i64 - self.candidate as i64;
            self.candidate = saturate32(self.candidate as i64 + (delta >> shift));
            self.divergent_run = self.divergent_run.saturating_add(1);
        }

        if self.divergent_run >= reseed_ticks {
            self.baseline = self.candidate;
            self.bias = self.candidate;
            self.divergent_run = 0;
            return BiasUpdate::Reseeded;
        }
        self.bias = self.baseline;
        BiasUpdate::Reset
    }
}

/// Automatic gain control state (Q8, 256 = unity).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Agc {
    gain: i32,
}

impl Agc {
    /// Start at unity gain.
    pub const fn new() -> Self {
        Agc { gain: UNITY_Q8 }
    }

    /// Current gain.
    pub fn gain(&self) -> i32 {
        self.gain
    }

    /// Update the gain from the level of one sample.
    ///
    /// Above `threshold` the gain drops by `(level - threshold) >> reduction_shift`,
    /// never below `min_gain`. Otherwise it recovers by one step per tick up to unity.
    pub fn update(&mut self, sample: i32, threshold: i32, min_gain: i32, reduction_shift: u32) {
        let level = sample.unsigned_abs() as i64;
        if level > threshold as i64 {
            let reduction = (level - threshold as i64) >> reduction_shift;
            let reduced = self.gain as i64 - reduction;
            self.gain = if reduced < min_gain as i64 { min_gain } else { reduced as i32 };
        } else if self.gain < UNITY_Q8 {
            self.gain += 1;
        }
    }
}

impl Default for Agc {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-stage persistent filter accumulators.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FilterState {
    /// Low-frequency tracker subtracted to form the high-pass output.
    pub highpass: i32,
    /// First low-pass stage.
    pub lowpass1: i32,
    /// Second low-pass stage.
    pub lowpass2: i32,
}

/// Complete conditioning chain for one input channel.
pub struct ConditioningStage {
    config: ConditioningConfig,
    bias: BiasTracker,
    filters: FilterState,
    agc: Agc,
    divergence_resets: u32,
    last_output: i32,
}

impl ConditioningStage {
    /// Create a stage with fresh state.
    pub const fn new(config: ConditioningConfig) -> Self {
        ConditioningStage {
            config,
            bias: BiasTracker::new(config.static_bias),
            filters: FilterState { highpass: 0, lowpass1: 0, lowpass2: 0 },
            agc: Agc::new(),
            divergence_resets: 0,
            last_output: 0,
        }
    }

    /// Condition one raw sample.
    pub fn process(&mut self, raw: i32) -> i32 {
        let c = &self.config;

        match self.bias.update(raw, c.bias_shift, c.bias_divergence_limit, c.bias_reseed_ticks) {
            BiasUpdate::Tracking => {}
            BiasUpdate::Reset => {
                self.divergence_resets = self.divergence_resets.saturating_add(1);
                // Once per run, not once per tick
                if self.bias.divergent_run() == 1 {
                    log::warn!(
                        "bias tracker diverged at sample {}, reset to baseline {}",
                        raw,
                        self.bias.baseline()
                    );
                }
            }
            BiasUpdate::Reseeded => {
                log::warn!("bias baseline re-seeded to {}", self.bias.baseline());
            }
        }
        let centered = saturate32(raw as i64 - self.bias.bias() as i64);

        self.filters.highpass = one_pole(self.filters.highpass, centered, c.highpass_coeff);
        let highpassed = saturate32(centered as i64 - self.filters.highpass as i64);

        self.filters.lowpass1 = one_pole(self.filters.lowpass1, highpassed, c.lowpass_coeff);
        self.filters.lowpass2 =
            one_pole(self.filters.lowpass2, self.filters.lowpass1, c.lowpass_coeff);

        let scaled = self.filters.lowpass2 >> c.scale_shift;

        self.agc.update(scaled, c.agc_threshold, c.agc_min_gain, c.agc_reduction_shift);
        let leveled = if c.apply_agc { scale_q8(scaled, self.agc.gain()) } else { scaled };

        let out = soft_knee(leveled, c.limiter_threshold, c.limiter_shift);
        self.last_output = out;
        out
    }

    /// Bias tracker state.
    pub fn bias(&self) -> &BiasTracker {
        &self.bias
    }

    /// Filter accumulators.
    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    /// AGC state.
    pub fn agc(&self) -> &Agc {
        &self.agc
    }

    /// Number of divergence resets since startup.
    pub fn divergence_resets(&self) -> u32 {
        self.divergence_resets
    }

    /// Most recent conditioned output.
    pub fn last_output(&self) -> i32 {
        self.last_output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PedalConfig;

    fn passthrough_config() -> ConditioningConfig {
        // Wide-open filters and no scaling so stage arithmetic is easy to follow
        let mut c = PedalConfig::DEFAULT.conditioning;
        c.static_bias = Some(0);
        c.bias_shift = 30;
        c.highpass_coeff = 1;
        c.lowpass_coeff = 256;
        c.scale_shift = 0;
        c.limiter_threshold = i32::MAX;
        c
    }

    #[test]
    fn bias_tracker_primes_from_first_sample() {
        let mut t = BiasTracker::new(None);
        assert_eq!(t.update(5000, 10, 1000, 64), BiasUpdate::Tracking);
        assert_eq!(t.bias(), 5000);
        assert_eq!(t.baseline(), 5000);
    }

    #[test]
    fn bias_tracker_follows_slow_drift() {
        let mut t = BiasTracker::new(Some(0));
        for _ in 0..20_000 {
            t.update(100_000, 10, 1 << 20, 64);
        }
        // Converges until the remaining offset drops below one shift step
        assert!((t.bias() - 100_000).abs() < 1024, "bias={}", t.bias());
    }

    #[test]
    fn bias_tracker_resets_on_divergence() {
        let mut t = BiasTracker::new(Some(100));
        for _ in 0..100 {
            t.update(120, 2, 1000, 64);
        }
        assert_ne!(t.bias(), 100);
        assert_eq!(t.update(1_000_000, 2, 1000, 64), BiasUpdate::Reset);
        assert_eq!(t.bias(), 100);
        // One spike does not move the baseline
        assert_eq!(t.update(120, 2, 1000, 64), BiasUpdate::Tracking);
        assert_eq!(t.baseline(), 100);
        assert_eq!(t.divergent_run(), 0);
    }

    #[test]
    fn bias_tracker_reseeds_after_consistent_divergence() {
        let mut t = BiasTracker::new(Some(0));
        for _ in 0..63 {
            assert_eq!(t.update(50_000, 4, 1000, 64), BiasUpdate::Reset);
        }
        assert_eq!(t.bias(), 0);
        assert_eq!(t.update(50_000, 4, 1000, 64), BiasUpdate::Reseeded);
        assert_eq!(t.baseline(), 50_000);
        assert_eq!(t.update(50_000, 4, 1000, 64), BiasUpdate::Tracking);
    }

    #[test]
    fn scattered_spikes_never_reseed() {
        let mut t = BiasTracker::new(Some(0));
        for i in 0..1000 {
            let spike = if i % 2 == 0 { 50_000 } else { -50_000 };
            assert_ne!(t.update(spike, 4, 1000, 64), BiasUpdate::Reseeded);
        }
        assert_eq!(t.baseline(), 0);
    }

    #[test]
    fn agc_reduces_and_recovers() {
        let mut agc = Agc::new();
        agc.update(350 + 40, 350, 64, 2);
        assert_eq!(agc.gain(), 256 - 10);
        // Huge level clamps to the floor
        agc.update(100_000, 350, 64, 2);
        assert_eq!(agc.gain(), 64);
        for _ in 0..1000 {
            agc.update(0, 350, 64, 2);
        }
        assert_eq!(agc.gain(), 256);
    }

    #[test]
    fn highpass_removes_dc() {
        let mut stage = ConditioningStage::new(passthrough_config());
        let mut out = 0;
        for _ in 0..10_000 {
            out = stage.process(4000);
        }
        assert!(out.abs() < 300, "residual DC {}", out);
    }

    #[test]
    fn limiter_soft_knee() {
        let mut c = passthrough_config();
        c.highpass_coeff = 1;
        c.limiter_threshold = 768;
        let mut stage = ConditioningStage::new(c);
        // First sample after a step passes the HP nearly untouched
        let out = stage.process(2000);
        assert!(out > 768 && out < 2000, "out={}", out);
        assert_eq!(out, 768 + ((1993 - 768) >> 2));
    }

    #[test]
    fn divergence_is_counted() {
        let mut c = passthrough_config();
        c.bias_shift = 4;
        c.bias_divergence_limit = 10_000;
        let mut stage = ConditioningStage::new(c);
        stage.process(0);
        stage.process(1_000_000);
        assert_eq!(stage.divergence_resets(), 1);
        assert_eq!(stage.bias().bias(), 0);
    }

    #[test]
    fn recovers_from_startup_spike() {
        // Default config primes the baseline from whatever arrives first
        let c = PedalConfig::DEFAULT.conditioning;
        let mut stage = ConditioningStage::new(c);
        stage.process(1 << 29);
        assert_eq!(stage.bias().baseline(), 1 << 29);
        for _ in 0..10_000 {
            stage.process(0);
        }
        assert_eq!(stage.bias().baseline(), 0);
        assert_eq!(stage.bias().bias(), 0);
        assert_eq!(stage.divergence_resets(), c.bias_reseed_ticks - 1);
        assert_eq!(stage.bias().divergent_run(), 0);
    }

    #[test]
    fn agc_gain_is_optional() {
        let mut c = passthrough_config();
        c.highpass_coeff = 1;
        c.agc_threshold = 100;
        let mut off = ConditioningStage::new(c);
        c.apply_agc = true;
        let mut on = ConditioningStage::new(c);

        for _ in 0..3 {
            off.process(1000);
            on.process(1000);
        }
        assert_eq!(off.agc().gain(), on.agc().gain());
        assert!(off.agc().gain() < 256);
        assert!(on.last_output().abs() < off.last_output().abs());
    }
}
