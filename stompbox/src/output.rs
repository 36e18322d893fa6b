//! Maps the signed effect-chain output onto a PWM duty cycle.

use crate::config::PedalConfig;

/// Clip to `±limit`, re-center on `period / 2`, clamp to `0..=period`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OutputMapper {
    period: u32,
    limit: i32,
}

impl OutputMapper {
    /// Create a mapper for `period` timer counts, clipping at `limit`.
    pub const fn new(period: u32, limit: i32) -> Self {
        OutputMapper { period, limit: if limit < 0 { 0 } else { limit } }
    }

    /// Mapper for a pedal configuration.
    pub const fn from_config(config: &PedalConfig) -> Self {
        Self::new(config.pwm_period, config.output_limit)
    }

    /// PWM period in timer counts.
    pub fn period(&self) -> u32 {
        self.period
    }

    /// Duty for the silent (zero) sample.
    pub fn midpoint(&self) -> u32 {
        self.period / 2
    }

    /// Duty for one sample. Always within `0..=period`.
    #[inline]
    pub fn map(&self, sample: i32) -> u32 {
        let clipped = sample.clamp(-self.limit, self.limit) as i64;
        let duty = clipped + (self.period / 2) as i64;
        duty.clamp(0, self.period as i64) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_maps_to_midpoint() {
        let m = OutputMapper::from_config(&PedalConfig::DEFAULT);
        assert_eq!(m.map(0), 1024);
        assert_eq!(m.midpoint(), 1024);
    }

    #[test]
    fn clips_at_limit() {
        let m = OutputMapper::from_config(&PedalConfig::DEFAULT);
        assert_eq!(m.map(5000), 1024 + 1023);
        assert_eq!(m.map(-5000), 1024 - 1023);
        assert_eq!(m.map(100), 1124);
    }

    #[test]
    fn always_within_period() {
        // A limit wider than half the period still cannot escape the clamp
        let m = OutputMapper::new(2048, 100_000);
        for x in [i32::MIN, -1_000_000, -1025, -1024, 0, 1023, 1024, 1_000_000, i32::MAX] {
            let d = m.map(x);
            assert!(d <= 2048, "x={} d={}", x, d);
        }
        assert_eq!(m.map(i32::MIN), 0);
        assert_eq!(m.map(i32::MAX), 2048);
    }
}
