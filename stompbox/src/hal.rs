//! [`embedded-hal`](embedded_hal) 1.0 adapters for the boundary traits.
//!
//! These cover the PWM output and the GPIO inputs. Sample acquisition is
//! too platform specific (ADC, sigma-delta FIFO, I²S word) to have a
//! generic `embedded-hal` shape, so firmware implements
//! [`SampleSource`](crate::io::SampleSource) itself.

use embedded_hal::digital::InputPin;
use embedded_hal::pwm::SetDutyCycle;

use crate::config::ControlConfig;
use crate::io::{ButtonInput, DutyCycleSink, EncoderInput};

/// Drives a [`SetDutyCycle`] channel from `0..=period` duty values.
///
/// Values are rescaled onto the channel's `max_duty_cycle()`, so the pedal
/// period does not have to match the timer's top value.
pub struct PwmDutySink<P: SetDutyCycle> {
    channel: P,
    period: u32,
}

impl<P: SetDutyCycle> PwmDutySink<P> {
    /// Wrap a configured and enabled PWM channel.
    pub fn new(channel: P, period: u32) -> Self {
        PwmDutySink { channel, period: period.max(1) }
    }

    /// Release the channel.
    pub fn free(self) -> P {
        self.channel
    }

    fn scale(&self, duty: u32) -> u16 {
        let max = self.channel.max_duty_cycle() as u64;
        let duty = duty.min(self.period) as u64;
        (duty * max / self.period as u64) as u16
    }
}

impl<P: SetDutyCycle> DutyCycleSink for PwmDutySink<P> {
    type Error = P::Error;

    fn emit_duty_cycle(&mut self, duty: u32) -> Result<(), Self::Error> {
        let scaled = self.scale(duty);
        self.channel.set_duty_cycle(scaled)
    }
}

/// Footswitches on individual GPIO pins; pin `i` maps to bit `i`.
pub struct PinButtons<P: InputPin, const N: usize> {
    pins: [P; N],
    active_low: bool,
}

impl<P: InputPin, const N: usize> PinButtons<P, N> {
    /// Wrap up to eight pins. With `active_low`, a low pin reads as pressed.
    pub fn new(pins: [P; N], active_low: bool) -> Self {
        assert!(N <= 8, "button mask holds at most 8 pins");
        PinButtons { pins, active_low }
    }
}

impl<P: InputPin, const N: usize> ButtonInput for PinButtons<P, N> {
    type Error = P::Error;

    fn read_buttons(&mut self) -> Result<u8, Self::Error> {
        let mut mask = 0u8;
        for (bit, pin) in self.pins.iter_mut().enumerate() {
            if pin.is_high()? != self.active_low {
                mask |= 1 << bit;
            }
        }
        Ok(mask)
    }
}

/// Encoder A/B channels plus push switch, packed into the word layout of a
/// [`ControlConfig`].
pub struct PinEncoder<A, B, S> {
    a: A,
    b: B,
    push: S,
    a_bit: u8,
    b_bit: u8,
    push_bit: u8,
    push_active_low: bool,
}

impl<A, B, S> PinEncoder<A, B, S>
where
    A: InputPin,
    B: InputPin<Error = A::Error>,
    S: InputPin<Error = A::Error>,
{
    /// Wrap the three pins. Channel levels are passed through as read; the
    /// push switch can be active low.
    pub fn new(a: A, b: B, push: S, config: &ControlConfig, push_active_low: bool) -> Self {
        PinEncoder {
            a,
            b,
            push,
            a_bit: config.encoder_a,
            b_bit: config.encoder_b,
            push_bit: config.encoder_button,
            push_active_low,
        }
    }
}

impl<A, B, S> EncoderInput for PinEncoder<A, B, S>
where
    A: InputPin,
    B: InputPin<Error = A::Error>,
    S: InputPin<Error = A::Error>,
{
    type Error = A::Error;

    fn read_encoder(&mut self) -> Result<u8, Self::Error> {
        let mut word = 0;
        if self.a.is_high()? {
            word |= self.a_bit;
        }
        if self.b.is_high()? {
            word |= self.b_bit;
        }
        if self.push.is_high()? != self.push_active_low {
            word |= self.push_bit;
        }
        Ok(word)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PedalConfig;
    use core::convert::Infallible;
    use embedded_hal::digital;
    use embedded_hal::pwm;

    struct MockPwm {
        max: u16,
        duty: u16,
    }

    impl pwm::ErrorType for MockPwm {
        type Error = Infallible;
    }

    impl SetDutyCycle for MockPwm {
        fn max_duty_cycle(&self) -> u16 {
            self.max
        }

        fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
            self.duty = duty;
            Ok(())
        }
    }

    struct MockPin(bool);

    impl digital::ErrorType for MockPin {
        type Error = Infallible;
    }

    impl InputPin for MockPin {
        fn is_high(&mut self) -> Result<bool, Self::Error> {
            Ok(self.0)
        }

        fn is_low(&mut self) -> Result<bool, Self::Error> {
            Ok(!self.0)
        }
    }

    #[test]
    fn duty_scaled_to_channel() {
        let mut sink = PwmDutySink::new(MockPwm { max: 1023, duty: 0 }, 2048);
        sink.emit_duty_cycle(1024).unwrap();
        assert_eq!(sink.channel.duty, 511);
        sink.emit_duty_cycle(2048).unwrap();
        assert_eq!(sink.channel.duty, 1023);
        // Out-of-range duty is clamped to full scale
        sink.emit_duty_cycle(9999).unwrap();
        assert_eq!(sink.free().duty, 1023);
    }

    #[test]
    fn duty_passthrough_when_periods_match() {
        let mut sink = PwmDutySink::new(MockPwm { max: 2048, duty: 0 }, 2048);
        sink.emit_duty_cycle(777).unwrap();
        assert_eq!(sink.free().duty, 777);
    }

    #[test]
    fn buttons_to_mask() {
        let mut b = PinButtons::new([MockPin(true), MockPin(false), MockPin(true)], false);
        assert_eq!(b.read_buttons().unwrap(), 0b101);
        let mut b = PinButtons::new([MockPin(true), MockPin(false), MockPin(true)], true);
        assert_eq!(b.read_buttons().unwrap(), 0b010);
    }

    #[test]
    fn encoder_word_layout() {
        let cfg = PedalConfig::DEFAULT.controls;
        let mut e = PinEncoder::new(MockPin(true), MockPin(false), MockPin(false), &cfg, true);
        // Push is active low, so a low pin reads as pressed
        assert_eq!(e.read_encoder().unwrap(), 0b101);
        let mut e = PinEncoder::new(MockPin(false), MockPin(true), MockPin(true), &cfg, true);
        assert_eq!(e.read_encoder().unwrap(), 0b010);
    }
}
