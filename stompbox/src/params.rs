//! Effect parameters shared between the control interrupts and the pipeline.
//!
//! # Ownership
//!
//! Every field is a single atomic word with exactly one writer:
//!
//! | Field | Writer | Reader |
//! |-------|--------|--------|
//! | `enabled` flags | button ISR | pipeline, encoder ISR |
//! | delay length, tremolo rate/depth, chorus rate (+ increments) | encoder ISR | pipeline |
//!
//! Loads and stores use `Relaxed` ordering and no read-modify-write
//! instructions, so the store works on cores without compare-and-swap.
//! A change becomes visible to the pipeline on the tick after it lands.
//!
//! A rate and its derived phase increment are two separate words. The
//! pipeline may observe the new rate with the old increment (or the other
//! way round) for one tick. The increment is the only one of the pair the
//! audio path consumes, so the effect is at most one sample at the previous
//! LFO speed. This window is accepted; no lock is taken.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::config::{ChorusConfig, DelayConfig, ParamRange, PedalConfig, TremoloConfig};
use crate::effects::lfo::phase_increment;

/// Identifies one of the three effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EffectKind {
    /// Delay (echo).
    Delay,
    /// Tremolo (amplitude LFO).
    Tremolo,
    /// Chorus (modulated short delay).
    Chorus,
}

/// Direction of a one-step parameter change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Step {
    /// Increase by one step.
    Up,
    /// Decrease by one step.
    Down,
}

impl Step {
    fn apply(self, range: &ParamRange, value: u32) -> u32 {
        match self {
            Step::Up => range.step_up(value),
            Step::Down => range.step_down(value),
        }
    }
}

fn toggle_flag(flag: &AtomicBool) -> bool {
    let enabled = !flag.load(Ordering::Relaxed);
    flag.store(enabled, Ordering::Relaxed);
    enabled
}

/// Delay parameters.
pub struct DelayParams {
    range: ParamRange,
    enabled: AtomicBool,
    length: AtomicU32,
}

/// Values the pipeline reads once per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DelaySettings {
    /// Effect active.
    pub enabled: bool,
    /// Lookback in samples.
    pub length: u32,
}

impl DelayParams {
    /// Start disabled at the configured default length.
    pub const fn new(config: &DelayConfig) -> Self {
        DelayParams {
            range: config.length,
            enabled: AtomicBool::new(false),
            length: AtomicU32::new(config.length.clamp(config.length.default)),
        }
    }

    /// Whether the delay is active.
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Set the enable flag.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    /// Flip the enable flag and return the new state.
    pub fn toggle(&self) -> bool {
        toggle_flag(&self.enabled)
    }

    /// Delay length in samples.
    pub fn length(&self) -> u32 {
        self.length.load(Ordering::Relaxed)
    }

    /// Store a clamped length and return what was stored.
    pub fn set_length(&self, length: u32) -> u32 {
        let length = self.range.clamp(length);
        self.length.store(length, Ordering::Relaxed);
        length
    }

    /// Move the length one step.
    pub fn step_length(&self, step: Step) -> u32 {
        self.set_length(step.apply(&self.range, self.length()))
    }

    /// Range the length is clamped to.
    pub fn length_range(&self) -> ParamRange {
        self.range
    }

    /// Load every field once.
    pub fn settings(&self) -> DelaySettings {
        DelaySettings {
            enabled: self.is_enabled(),
            length: self.length(),
        }
    }
}

/// Tremolo parameters.
pub struct TremoloParams {
    rate_range: ParamRange,
    depth_range: ParamRange,
    sample_rate_hz: u32,
    enabled: AtomicBool,
    rate: AtomicU32,
    depth: AtomicU32,
    phase_increment: AtomicU32,
}

/// Values the pipeline reads once per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TremoloSettings {
    /// Effect active.
    pub enabled: bool,
    /// LFO rate in 0.1 Hz units.
    pub rate: u32,
    /// Depth (Q8).
    pub depth: u32,
    /// Per-tick phase increment derived from `rate`.
    pub phase_increment: u32,
}

impl TremoloParams {
    /// Start disabled at the configured defaults.
    pub const fn new(config: &TremoloConfig, sample_rate_hz: u32) -> Self {
        let rate = config.rate.clamp(config.rate.default);
        TremoloParams {
            rate_range: config.rate,
            depth_range: config.depth,
            sample_rate_hz,
            enabled: AtomicBool::new(false),
            rate: AtomicU32::new(rate),
            depth: AtomicU32::new(config.depth.clamp(config.depth.default)),
            phase_increment: AtomicU32::new(phase_increment(rate, sample_rate_hz)),
        }
    }

    /// Whether the tremolo is active.
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Set the enable flag.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    /// Flip the enable flag and return the new state.
    pub fn toggle(&self) -> bool {
        toggle_flag(&self.enabled)
    }

    /// LFO rate in 0.1 Hz units.
    pub fn rate(&self) -> u32 {
        self.rate.load(Ordering::Relaxed)
    }

    /// Modulation depth.
    pub fn depth(&self) -> u32 {
        self.depth.load(Ordering::Relaxed)
    }

    /// Current phase increment.
    pub fn phase_increment(&self) -> u32 {
        self.phase_increment.load(Ordering::Relaxed)
    }

    /// Store a clamped rate, then the matching phase increment.
    pub fn set_rate(&self, rate: u32) -> u32 {
        let rate = self.rate_range.clamp(rate);
        self.rate.store(rate, Ordering::Relaxed);
        self.phase_increment
            .store(phase_increment(rate, self.sample_rate_hz), Ordering::Relaxed);
        rate
    }

    /// Store a clamped depth.
    pub fn set_depth(&self, depth: u32) -> u32 {
        let depth = self.depth_range.clamp(depth);
        self.depth.store(depth, Ordering::Relaxed);
        depth
    }

    /// Move the rate one step.
    pub fn step_rate(&self, step: Step) -> u32 {
        self.set_rate(step.apply(&self.rate_range, self.rate()))
    }

    /// Move the depth one step.
    pub fn step_depth(&self, step: Step) -> u32 {
        self.set_depth(step.apply(&self.depth_range, self.depth()))
    }

    /// Range the rate is clamped to.
    pub fn rate_range(&self) -> ParamRange {
        self.rate_range
    }

    /// Range the depth is clamped to.
    pub fn depth_range(&self) -> ParamRange {
        self.depth_range
    }

    /// Load every field once.
    pub fn settings(&self) -> TremoloSettings {
        TremoloSettings {
            enabled: self.is_enabled(),
            rate: self.rate(),
            depth: self.depth(),
            phase_increment: self.phase_increment(),
        }
    }
}

/// Chorus parameters.
pub struct ChorusParams {
    rate_range: ParamRange,
    base_delay_range: ParamRange,
    modulation_depth_range: ParamRange,
    sample_rate_hz: u32,
    enabled: AtomicBool,
    rate: AtomicU32,
    base_delay: AtomicU32,
    modulation_depth: AtomicU32,
    phase_increment: AtomicU32,
}

/// Values the pipeline reads once per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChorusSettings {
    /// Effect active.
    pub enabled: bool,
    /// LFO rate in 0.1 Hz units.
    pub rate: u32,
    /// Center lookback in samples.
    pub base_delay: u32,
    /// Peak lookback deviation in samples.
    pub modulation_depth: u32,
    /// Per-tick phase increment derived from `rate`.
    pub phase_increment: u32,
}

impl ChorusParams {
    /// Start disabled at the configured defaults.
    pub const fn new(config: &ChorusConfig, sample_rate_hz: u32) -> Self {
        let rate = config.rate.clamp(config.rate.default);
        ChorusParams {
            rate_range: config.rate,
            base_delay_range: config.base_delay,
            modulation_depth_range: config.modulation_depth,
            sample_rate_hz,
            enabled: AtomicBool::new(false),
            rate: AtomicU32::new(rate),
            base_delay: AtomicU32::new(config.base_delay.clamp(config.base_delay.default)),
            modulation_depth: AtomicU32::new(
                config.modulation_depth.clamp(config.modulation_depth.default),
            ),
            phase_increment: AtomicU32::new(phase_increment(rate, sample_rate_hz)),
        }
    }

    /// Whether the chorus is active.
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Set the enable flag.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    /// Flip the enable flag and return the new state.
    pub fn toggle(&self) -> bool {
        toggle_flag(&self.enabled)
    }

    /// LFO rate in 0.1 Hz units.
    pub fn rate(&self) -> u32 {
        self.rate.load(Ordering::Relaxed)
    }

    /// Center lookback.
    pub fn base_delay(&self) -> u32 {
        self.base_delay.load(Ordering::Relaxed)
    }

    /// Lookback deviation.
    pub fn modulation_depth(&self) -> u32 {
        self.modulation_depth.load(Ordering::Relaxed)
    }

    /// Current phase increment.
    pub fn phase_increment(&self) -> u32 {
        self.phase_increment.load(Ordering::Relaxed)
    }

    /// Store a clamped rate, then the matching phase increment.
    pub fn set_rate(&self, rate: u32) -> u32 {
        let rate = self.rate_range.clamp(rate);
        self.rate.store(rate, Ordering::Relaxed);
        self.phase_increment
            .store(phase_increment(rate, self.sample_rate_hz), Ordering::Relaxed);
        rate
    }

    /// Store a clamped base delay.
    ///
    /// The encoder only drives the chorus rate; base delay and modulation
    /// depth are set from firmware (a preset or a second control surface).
    pub fn set_base_delay(&self, base_delay: u32) -> u32 {
        let base_delay = self.base_delay_range.clamp(base_delay);
        self.base_delay.store(base_delay, Ordering::Relaxed);
        base_delay
    }

    /// Store a clamped modulation depth.
    pub fn set_modulation_depth(&self, depth: u32) -> u32 {
        let depth = self.modulation_depth_range.clamp(depth);
        self.modulation_depth.store(depth, Ordering::Relaxed);
        depth
    }

    /// Move the rate one step.
    pub fn step_rate(&self, step: Step) -> u32 {
        self.set_rate(step.apply(&self.rate_range, self.rate()))
    }

    /// Move the base delay one step.
    pub fn step_base_delay(&self, step: Step) -> u32 {
        self.set_base_delay(step.apply(&self.base_delay_range, self.base_delay()))
    }

    /// Move the modulation depth one step.
    pub fn step_modulation_depth(&self, step: Step) -> u32 {
        let depth = step.apply(&self.modulation_depth_range, self.modulation_depth());
        self.set_modulation_depth(depth)
    }

    /// Range the rate is clamped to.
    pub fn rate_range(&self) -> ParamRange {
        self.rate_range
    }

    /// Range the base delay is clamped to.
    pub fn base_delay_range(&self) -> ParamRange {
        self.base_delay_range
    }

    /// Range the modulation depth is clamped to.
    pub fn modulation_depth_range(&self) -> ParamRange {
        self.modulation_depth_range
    }

    /// Load every field once.
    pub fn settings(&self) -> ChorusSettings {
        ChorusSettings {
            enabled: self.is_enabled(),
            rate: self.rate(),
            base_delay: self.base_delay(),
            modulation_depth: self.modulation_depth(),
            phase_increment: self.phase_increment(),
        }
    }
}

/// Parameters of all three effects.
pub struct EffectParams {
    /// Delay.
    pub delay: DelayParams,
    /// Tremolo.
    pub tremolo: TremoloParams,
    /// Chorus.
    pub chorus: ChorusParams,
}

impl EffectParams {
    /// Build the store at the configured defaults, every effect disabled.
    pub const fn new(config: &PedalConfig) -> Self {
        EffectParams {
            delay: DelayParams::new(&config.delay),
            tremolo: TremoloParams::new(&config.tremolo, config.sample_rate_hz),
            chorus: ChorusParams::new(&config.chorus, config.sample_rate_hz),
        }
    }

    /// Enable flag of one effect.
    pub fn is_enabled(&self, effect: EffectKind) -> bool {
        match effect {
            EffectKind::Delay => self.delay.is_enabled(),
            EffectKind::Tremolo => self.tremolo.is_enabled(),
            EffectKind::Chorus => self.chorus.is_enabled(),
        }
    }

    /// Flip one effect's enable flag and return the new state.
    pub fn toggle(&self, effect: EffectKind) -> bool {
        match effect {
            EffectKind::Delay => self.delay.toggle(),
            EffectKind::Tremolo => self.tremolo.toggle(),
            EffectKind::Chorus => self.chorus.toggle(),
        }
    }
}
