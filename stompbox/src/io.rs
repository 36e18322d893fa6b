//! Hardware boundary traits.
//!
//! The core never touches a peripheral directly. Firmware implements these
//! for its ADC, PWM and GPIO blocks (or uses the `embedded-hal` adapters in
//! [`hal`](crate::hal)); tests implement them with plain structs.

/// Delivers one raw sample per sampling tick.
pub trait SampleSource {
    /// Error type for the acquisition peripheral.
    type Error;

    /// Read the sample captured for this tick.
    fn acquire_sample(&mut self) -> Result<i32, Self::Error>;

    /// Re-arm the peripheral so the next tick yields fresh data.
    fn rearm(&mut self) -> Result<(), Self::Error>;
}

/// Accepts one PWM duty value per sampling tick.
pub trait DutyCycleSink {
    /// Error type for the PWM peripheral.
    type Error;

    /// Set the high time for the current period, `0..=period` counts.
    fn emit_duty_cycle(&mut self, duty: u32) -> Result<(), Self::Error>;
}

/// Effect footswitches, one bit per button.
pub trait ButtonInput {
    /// Error type for the GPIO block.
    type Error;

    /// Current button bitmask.
    fn read_buttons(&mut self) -> Result<u8, Self::Error>;
}

/// Rotary encoder channels and its push switch packed into one word.
pub trait EncoderInput {
    /// Error type for the GPIO block.
    type Error;

    /// Current encoder word (bit positions set by
    /// [`ControlConfig`](crate::config::ControlConfig)).
    fn read_encoder(&mut self) -> Result<u8, Self::Error>;
}
