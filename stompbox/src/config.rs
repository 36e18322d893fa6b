//! Startup configuration for the whole pedal.
//!
//! Every coefficient, threshold, mix ratio and parameter range used by the
//! signal path and the control logic lives in [`PedalConfig`]. The struct is
//! `Copy` and const-constructible so firmware can keep it in a `static`, call
//! [`PedalConfig::validate`] once before unmasking interrupts, and hand copies
//! to the pipeline and the controllers.

use core::fmt;

use crate::constants::{HISTORY_CAPACITY, PWM_PERIOD, SAMPLE_RATE_HZ};

/// Bounds, default and encoder step for one adjustable parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ParamRange {
    /// Smallest allowed value.
    pub min: u32,
    /// Largest allowed value.
    pub max: u32,
    /// Value loaded at startup.
    pub default: u32,
    /// Amount moved by one encoder detent.
    pub step: u32,
}

impl ParamRange {
    /// Create a new range.
    pub const fn new(min: u32, max: u32, default: u32, step: u32) -> Self {
        ParamRange { min, max, default, step }
    }

    /// Clamp `value` into `[min, max]`.
    pub const fn clamp(&self, value: u32) -> u32 {
        if value < self.min {
            self.min
        } else if value > self.max {
            self.max
        } else {
            value
        }
    }

    /// One step up, saturating at `max`.
    pub const fn step_up(&self, value: u32) -> u32 {
        self.clamp(value.saturating_add(self.step))
    }

    /// One step down, saturating at `min`.
    pub const fn step_down(&self, value: u32) -> u32 {
        self.clamp(value.saturating_sub(self.step))
    }

    /// Whether `value` lies within `[min, max]`.
    pub const fn contains(&self, value: u32) -> bool {
        value >= self.min && value <= self.max
    }

    fn check(&self, name: &'static str) -> Result<(), ConfigError> {
        if self.min > self.max || !self.contains(self.default) || self.step == 0 {
            return Err(ConfigError::InvalidRange { name });
        }
        Ok(())
    }
}

/// Tunables of the conditioning stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConditioningConfig {
    /// Bias tracker smoothing: `bias += (sample - bias) >> bias_shift`.
    pub bias_shift: u32,
    /// Distance between bias and sample beyond which the tracker is reset.
    pub bias_divergence_limit: i32,
    /// Static baseline the tracker snaps back to. `None` captures the first
    /// sample seen after startup.
    pub static_bias: Option<i32>,
    /// Consecutive mutually consistent divergent samples after which the
    /// baseline is replaced by their average. Must be non-zero.
    pub bias_reseed_ticks: u32,
    /// High-pass tracker coefficient, `1..=256` (lower = lower cutoff).
    pub highpass_coeff: u16,
    /// Coefficient of both cascaded low-pass stages, `1..=256`.
    pub lowpass_coeff: u16,
    /// Right shift bringing the filtered signal into the working range.
    pub scale_shift: u32,
    /// AGC engages when `|scaled|` exceeds this level.
    pub agc_threshold: i32,
    /// Floor for the AGC gain (Q8).
    pub agc_min_gain: i32,
    /// Gain reduction is `(level - threshold) >> agc_reduction_shift`.
    pub agc_reduction_shift: u32,
    /// Whether the AGC gain is multiplied into the signal. The gain state is
    /// tracked either way.
    pub apply_agc: bool,
    /// Soft limiter knee.
    pub limiter_threshold: i32,
    /// Compression of the excess above the knee.
    pub limiter_shift: u32,
}

/// Button and encoder wiring plus debounce timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControlConfig {
    /// Button bit toggling the delay.
    pub delay_button: u8,
    /// Button bit toggling the tremolo.
    pub tremolo_button: u8,
    /// Button bit toggling the chorus.
    pub chorus_button: u8,
    /// Minimum ticks between two accepted presses of the same button.
    pub button_debounce_ticks: u32,
    /// Encoder word bit for channel A.
    pub encoder_a: u8,
    /// Encoder word bit for channel B.
    pub encoder_b: u8,
    /// Encoder word bit for the encoder's push switch.
    pub encoder_button: u8,
    /// Minimum ticks between two accepted encoder pushes.
    pub encoder_debounce_ticks: u32,
}

/// Delay effect settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DelayConfig {
    /// Delay length in samples.
    pub length: ParamRange,
    /// Dry weight (Q8).
    pub dry_mix: i32,
    /// Wet weight (Q8).
    pub wet_mix: i32,
}

/// Tremolo effect settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TremoloConfig {
    /// LFO rate in 0.1 Hz units.
    pub rate: ParamRange,
    /// Modulation depth (Q8, 256 = full).
    pub depth: ParamRange,
    /// Inputs quieter than this are never modulated.
    pub noise_floor: i32,
}

/// Chorus effect settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChorusConfig {
    /// LFO rate in 0.1 Hz units.
    pub rate: ParamRange,
    /// Center lookback in samples. Not bound to the encoder; `step` applies
    /// to firmware-side stepping through `ChorusParams::step_base_delay`.
    pub base_delay: ParamRange,
    /// Peak lookback deviation in samples.
    pub modulation_depth: ParamRange,
    /// Dry weight (Q8).
    pub dry_mix: i32,
    /// Wet weight (Q8).
    pub wet_mix: i32,
}

/// Complete pedal configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PedalConfig {
    /// Sampling interrupt rate; also drives LFO phase increments.
    pub sample_rate_hz: u32,
    /// PWM period in timer counts.
    pub pwm_period: u32,
    /// Output clip level applied before re-centering on `pwm_period / 2`.
    pub output_limit: i32,
    /// Conditioning stage.
    pub conditioning: ConditioningConfig,
    /// Controls.
    pub controls: ControlConfig,
    /// Delay.
    pub delay: DelayConfig,
    /// Tremolo.
    pub tremolo: TremoloConfig,
    /// Chorus.
    pub chorus: ChorusConfig,
}

impl PedalConfig {
    /// Defaults for the 48.8 kHz / 2048-count build.
    pub const DEFAULT: PedalConfig = PedalConfig {
        sample_rate_hz: SAMPLE_RATE_HZ,
        pwm_period: PWM_PERIOD,
        output_limit: (PWM_PERIOD / 2) as i32 - 1,
        conditioning: ConditioningConfig {
            bias_shift: 10,
            bias_divergence_limit: 1 << 27,
            static_bias: None,
            bias_reseed_ticks: 4096,
            highpass_coeff: 1,
            lowpass_coeff: 10,
            scale_shift: 17,
            agc_threshold: 350,
            agc_min_gain: 64,
            agc_reduction_shift: 2,
            apply_agc: false,
            limiter_threshold: 768,
            limiter_shift: 2,
        },
        controls: ControlConfig {
            delay_button: 0x01,
            tremolo_button: 0x02,
            chorus_button: 0x04,
            button_debounce_ticks: 8000,
            encoder_a: 0x01,
            encoder_b: 0x02,
            encoder_button: 0x04,
            encoder_debounce_ticks: 400,
        },
        delay: DelayConfig {
            length: ParamRange::new(1000, 38_000, 8000, 1000),
            dry_mix: 62,
            wet_mix: 192,
        },
        tremolo: TremoloConfig {
            rate: ParamRange::new(1, 67, 42, 1),
            depth: ParamRange::new(64, 256, 256, 16),
            noise_floor: 1,
        },
        chorus: ChorusConfig {
            rate: ParamRange::new(1, 50, 10, 1),
            base_delay: ParamRange::new(200, 1500, 800, 50),
            modulation_depth: ParamRange::new(20, 300, 120, 10),
            dry_mix: 128,
            wet_mix: 128,
        },
    };

    /// Validate against the default [`HISTORY_CAPACITY`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_for(HISTORY_CAPACITY)
    }

    /// Validate against a history ring of `capacity` slots.
    pub fn validate_for(&self, capacity: usize) -> Result<(), ConfigError> {
        if self.sample_rate_hz == 0 {
            return Err(ConfigError::ZeroSampleRate);
        }
        if self.pwm_period == 0 || self.pwm_period > i32::MAX as u32 {
            return Err(ConfigError::InvalidPeriod(self.pwm_period));
        }

        let c = &self.conditioning;
        check_coeff("highpass", c.highpass_coeff)?;
        check_coeff("lowpass", c.lowpass_coeff)?;
        check_shift("bias", c.bias_shift)?;
        check_shift("scale", c.scale_shift)?;
        check_shift("agc_reduction", c.agc_reduction_shift)?;
        check_shift("limiter", c.limiter_shift)?;
        if c.bias_reseed_ticks == 0 {
            return Err(ConfigError::InvalidRange { name: "bias_reseed_ticks" });
        }
        if c.agc_min_gain < 1 || c.agc_min_gain > 256 {
            return Err(ConfigError::InvalidRange { name: "agc_min_gain" });
        }

        let k = &self.controls;
        let buttons = [k.delay_button, k.tremolo_button, k.chorus_button];
        let encoder = [k.encoder_a, k.encoder_b, k.encoder_button];
        if !distinct_bits(buttons) {
            return Err(ConfigError::MaskConflict { name: "buttons" });
        }
        if !distinct_bits(encoder) {
            return Err(ConfigError::MaskConflict { name: "encoder" });
        }

        self.delay.length.check("delay.length")?;
        self.tremolo.rate.check("tremolo.rate")?;
        self.tremolo.depth.check("tremolo.depth")?;
        if self.tremolo.depth.max > 256 {
            return Err(ConfigError::InvalidRange { name: "tremolo.depth" });
        }
        self.chorus.rate.check("chorus.rate")?;
        self.chorus.base_delay.check("chorus.base_delay")?;
        self.chorus.modulation_depth.check("chorus.modulation_depth")?;

        if self.delay.length.max as usize >= capacity {
            return Err(ConfigError::LookbackExceedsHistory {
                name: "delay.length",
                lookback: self.delay.length.max,
                capacity,
            });
        }
        let worst = self.chorus.base_delay.max.saturating_add(self.chorus.modulation_depth.max);
        if worst as usize >= capacity {
            return Err(ConfigError::LookbackExceedsHistory {
                name: "chorus",
                lookback: worst,
                capacity,
            });
        }
        Ok(())
    }

    /// Replace the low-pass coefficient with one derived from a cutoff in Hz.
    pub fn with_lowpass_cutoff_hz(mut self, cutoff_hz: f32) -> Self {
        self.conditioning.lowpass_coeff = one_pole_coefficient(cutoff_hz, self.sample_rate_hz);
        self
    }

    /// Replace the high-pass tracker coefficient with one derived from a cutoff in Hz.
    pub fn with_highpass_cutoff_hz(mut self, cutoff_hz: f32) -> Self {
        self.conditioning.highpass_coeff = one_pole_coefficient(cutoff_hz, self.sample_rate_hz);
        self
    }
}

impl Default for PedalConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Q8 coefficient of a one-pole smoother with the given -3 dB cutoff.
///
/// `round(256 * (1 - exp(-2π·fc/fs)))`, clamped to `1..=256`.
pub fn one_pole_coefficient(cutoff_hz: f32, sample_rate_hz: u32) -> u16 {
    if sample_rate_hz == 0 {
        return 256;
    }
    let alpha = 1.0 - libm::expf(-2.0 * core::f32::consts::PI * cutoff_hz / sample_rate_hz as f32);
    let coeff = libm::roundf(alpha * 256.0);
    if coeff < 1.0 {
        1
    } else if coeff > 256.0 {
        256
    } else {
        coeff as u16
    }
}

fn check_coeff(stage: &'static str, value: u16) -> Result<(), ConfigError> {
    if value == 0 || value > 256 {
        return Err(ConfigError::CoefficientOutOfRange { stage, value });
    }
    Ok(())
}

fn check_shift(name: &'static str, shift: u32) -> Result<(), ConfigError> {
    if shift >= 31 {
        return Err(ConfigError::ShiftTooLarge { name, shift });
    }
    Ok(())
}

fn distinct_bits(masks: [u8; 3]) -> bool {
    masks.iter().all(|&m| m != 0)
        && masks[0] & masks[1] == 0
        && masks[0] & masks[2] == 0
        && masks[1] & masks[2] == 0
}

/// Reasons a [`PedalConfig`] is rejected at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Sample rate of zero.
    ZeroSampleRate,
    /// PWM period of zero or too large for signed arithmetic.
    InvalidPeriod(u32),
    /// Filter coefficient outside `1..=256`.
    CoefficientOutOfRange {
        /// Filter stage.
        stage: &'static str,
        /// Offending value.
        value: u16,
    },
    /// Shift amount that would discard the whole word.
    ShiftTooLarge {
        /// Setting name.
        name: &'static str,
        /// Offending value.
        shift: u32,
    },
    /// `min > max`, default outside the range, or zero step.
    InvalidRange {
        /// Setting name.
        name: &'static str,
    },
    /// Zero or overlapping input bit masks.
    MaskConflict {
        /// Mask group.
        name: &'static str,
    },
    /// A reachable lookback does not fit in the history ring.
    LookbackExceedsHistory {
        /// Effect name.
        name: &'static str,
        /// Largest reachable lookback.
        lookback: u32,
        /// History capacity.
        capacity: usize,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroSampleRate => write!(f, "sample rate must be non-zero"),
            ConfigError::InvalidPeriod(p) => write!(f, "invalid PWM period {}", p),
            ConfigError::CoefficientOutOfRange { stage, value } => {
                write!(f, "{} coefficient {} outside 1..=256", stage, value)
            }
            ConfigError::ShiftTooLarge { name, shift } => {
                write!(f, "{} shift {} is too large", name, shift)
            }
            ConfigError::InvalidRange { name } => write!(f, "invalid range for {}", name),
            ConfigError::MaskConflict { name } => write!(f, "{} masks are zero or overlap", name),
            ConfigError::LookbackExceedsHistory { name, lookback, capacity } => write!(
                f,
                "{} lookback {} does not fit history of {} samples",
                name, lookback, capacity
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(PedalConfig::default().validate(), Ok(()));
    }

    #[test]
    fn range_clamps_and_steps() {
        let r = ParamRange::new(10, 50, 20, 15);
        assert_eq!(r.clamp(0), 10);
        assert_eq!(r.clamp(99), 50);
        assert_eq!(r.step_up(40), 50);
        assert_eq!(r.step_down(20), 10);
        assert_eq!(r.step_down(0), 10);
        assert_eq!(r.step_up(u32::MAX), 50);
    }

    #[test]
    fn rejects_bad_coefficient() {
        let mut cfg = PedalConfig::DEFAULT;
        cfg.conditioning.lowpass_coeff = 0;
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::CoefficientOutOfRange { stage: "lowpass", value: 0 })
        );
        cfg.conditioning.lowpass_coeff = 257;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_default_outside_range() {
        let mut cfg = PedalConfig::DEFAULT;
        cfg.tremolo.rate.default = 100;
        assert_eq!(cfg.validate(), Err(ConfigError::InvalidRange { name: "tremolo.rate" }));
    }

    #[test]
    fn rejects_lookback_beyond_history() {
        let cfg = PedalConfig::DEFAULT;
        assert_eq!(
            cfg.validate_for(30_000),
            Err(ConfigError::LookbackExceedsHistory {
                name: "delay.length",
                lookback: 38_000,
                capacity: 30_000
            })
        );
    }

    #[test]
    fn extreme_chorus_lookback_is_rejected() {
        let mut cfg = PedalConfig::DEFAULT;
        cfg.chorus.base_delay = ParamRange::new(200, u32::MAX, 800, 50);
        cfg.chorus.modulation_depth = ParamRange::new(20, u32::MAX, 120, 10);
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::LookbackExceedsHistory {
                name: "chorus",
                lookback: u32::MAX,
                capacity: HISTORY_CAPACITY
            })
        );
    }

    #[test]
    fn rejects_zero_reseed_window() {
        let mut cfg = PedalConfig::DEFAULT;
        cfg.conditioning.bias_reseed_ticks = 0;
        assert_eq!(cfg.validate(), Err(ConfigError::InvalidRange { name: "bias_reseed_ticks" }));
    }

    #[test]
    fn rejects_overlapping_buttons() {
        let mut cfg = PedalConfig::DEFAULT;
        cfg.controls.chorus_button = cfg.controls.delay_button;
        assert_eq!(cfg.validate(), Err(ConfigError::MaskConflict { name: "buttons" }));
    }

    #[test]
    fn rejects_oversized_shift() {
        let mut cfg = PedalConfig::DEFAULT;
        cfg.conditioning.scale_shift = 40;
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::ShiftTooLarge { name: "scale", shift: 40 })
        );
    }

    #[test]
    fn coefficient_from_cutoff() {
        // Very low cutoff bottoms out at 1, very high saturates at 256
        assert_eq!(one_pole_coefficient(0.1, 48_828), 1);
        assert_eq!(one_pole_coefficient(1.0e6, 48_828), 256);
        // ~300 Hz at 48.8 kHz: 256 * (1 - e^-0.0386) ≈ 9.7
        assert_eq!(one_pole_coefficient(300.0, 48_828), 10);
        let cfg = PedalConfig::DEFAULT.with_lowpass_cutoff_hz(300.0);
        assert_eq!(cfg.conditioning.lowpass_coeff, 10);
    }
}
