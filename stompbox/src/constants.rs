/// Sample rate in Hz: a 100 MHz timer clock divided by [`PWM_PERIOD`] counts.
///
/// The sampling interrupt, the PWM carrier and both LFO phase-increment
/// formulas all run off this one rate.
pub const SAMPLE_RATE_HZ: u32 = 48_828;

/// PWM period in timer counts. Duty values live in `0..=PWM_PERIOD`.
pub const PWM_PERIOD: u32 = 2048;

/// Number of slots in the shared history ring.
pub const HISTORY_CAPACITY: usize = 40_000;

/// Entries in the LFO sine table (one full period).
pub const SINE_TABLE_SIZE: usize = 256;

/// Fractional bits carried by LFO phase accumulators.
pub const PHASE_FRAC_BITS: u32 = 8;

/// One full LFO period in accumulator units (`SINE_TABLE_SIZE << PHASE_FRAC_BITS`).
pub const PHASE_PERIOD: u32 = (SINE_TABLE_SIZE as u32) << PHASE_FRAC_BITS;

/// Unity gain in the Q8 scale used by mixes and gains.
pub const UNITY_Q8: i32 = 256;
