//! End-to-end tests: pipeline and both controllers sharing one context,
//! driven through mock hardware.
//!
//! ```text
//! MockAdc → SamplingPipeline.run_tick() → MockPwm
//!              ▲ params / ticks
//! Footswitches → ButtonController.service()  ─┐
//! EncoderPins  → EncoderController.service() ─┴→ PedalContext → drain_events()
//! ```

use crate::config::{ParamRange, PedalConfig};
use crate::constants::{HISTORY_CAPACITY, PWM_PERIOD};
use crate::context::PedalContext;
use crate::control::{AdjustTarget, ButtonController, ControlEvent, EncoderController, Parameter};
use crate::dsp::wavetables::sine_offset;
use crate::io::{ButtonInput, DutyCycleSink, EncoderInput, SampleSource};
use crate::params::EffectKind;
use crate::pipeline::{SamplingPipeline, TickError};

/// Deterministic xorshift32 for reproducible "random" inputs.
struct XorShift(u32);

impl XorShift {
    fn next(&mut self) -> u32 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.0 = x;
        x
    }
}

/// Sine from the LFO table, one table step per tick, scaled to `amplitude`.
struct MockAdc {
    amplitude: i32,
    index: usize,
    rearms: u32,
    fail: bool,
}

impl MockAdc {
    fn new(amplitude: i32) -> Self {
        MockAdc { amplitude, index: 0, rearms: 0, fail: false }
    }
}

impl SampleSource for MockAdc {
    type Error = &'static str;

    fn acquire_sample(&mut self) -> Result<i32, Self::Error> {
        if self.fail {
            return Err("adc overrun");
        }
        let s = (sine_offset(self.index) as i64 * self.amplitude as i64 / 127) as i32;
        self.index = self.index.wrapping_add(1);
        Ok(s)
    }

    fn rearm(&mut self) -> Result<(), Self::Error> {
        self.rearms += 1;
        Ok(())
    }
}

struct MockPwm {
    last: u32,
    min: u32,
    max: u32,
}

impl MockPwm {
    fn new() -> Self {
        MockPwm { last: 0, min: u32::MAX, max: 0 }
    }
}

impl DutyCycleSink for MockPwm {
    type Error = core::convert::Infallible;

    fn emit_duty_cycle(&mut self, duty: u32) -> Result<(), Self::Error> {
        self.last = duty;
        self.min = self.min.min(duty);
        self.max = self.max.max(duty);
        Ok(())
    }
}

struct Footswitches(u8);

impl ButtonInput for Footswitches {
    type Error = core::convert::Infallible;

    fn read_buttons(&mut self) -> Result<u8, Self::Error> {
        Ok(self.0)
    }
}

struct EncoderPins(u8);

impl EncoderInput for EncoderPins {
    type Error = core::convert::Infallible;

    fn read_encoder(&mut self) -> Result<u8, Self::Error> {
        Ok(self.0)
    }
}

/// Encoder words for one clockwise detent (A = bit 0, B = bit 1).
const CW_WORDS: [u8; 4] = [0b010, 0b000, 0b001, 0b011];
/// Encoder words for one counter-clockwise detent.
const CCW_WORDS: [u8; 4] = [0b001, 0b000, 0b010, 0b011];

fn turn(enc: &mut EncoderController, ctx: &PedalContext, words: [u8; 4]) {
    let mut pins = EncoderPins(0b011);
    for w in words {
        pins.0 = w;
        enc.service(ctx, &mut pins).unwrap();
    }
}

/// Default config shrunk to fit a 4096-sample ring.
fn small_config() -> PedalConfig {
    let mut cfg = PedalConfig::DEFAULT;
    cfg.delay.length = ParamRange::new(100, 3000, 1000, 100);
    cfg
}

const SMALL: usize = 4096;

fn collect_events(ctx: &PedalContext) -> ([Option<ControlEvent>; 16], usize) {
    let mut events = [None; 16];
    let mut n = 0;
    ctx.drain_events(|e| {
        if n < events.len() {
            events[n] = Some(e);
        }
        n += 1;
    });
    (events, n)
}

#[test]
fn small_config_is_valid() {
    assert_eq!(small_config().validate_for(SMALL), Ok(()));
}

#[test]
fn output_stays_in_period_under_random_input_and_controls() {
    let cfg = PedalConfig::DEFAULT;
    let ctx = PedalContext::new(&cfg);
    let mut pipeline: SamplingPipeline<HISTORY_CAPACITY> = SamplingPipeline::new(&cfg);
    let mut buttons = ButtonController::new(&cfg.controls);
    let mut encoder = EncoderController::new(&cfg.controls);
    let mut rng = XorShift(0x2545_f491);

    for tick in 0..60_000u32 {
        let raw = match tick % 1000 {
            0 => i32::MAX,
            1 => i32::MIN,
            _ => rng.next() as i32,
        };
        let duty = pipeline.process(&ctx, raw);
        assert!(duty <= PWM_PERIOD, "tick {} duty {}", tick, duty);

        if tick % 9000 == 0 {
            buttons.on_buttons(&ctx, (rng.next() & 0x07) as u8);
        }
        if tick % 250 == 0 {
            let words = if rng.next() & 1 == 0 { CW_WORDS } else { CCW_WORDS };
            turn(&mut encoder, &ctx, words);
        }
    }

    let params = &ctx.params;
    assert!(params.delay.length_range().contains(params.delay.length()));
    assert!(params.tremolo.rate_range().contains(params.tremolo.rate()));
    assert!(params.tremolo.depth_range().contains(params.tremolo.depth()));
    assert!(params.chorus.rate_range().contains(params.chorus.rate()));
}

#[test]
fn all_effects_enabled_stay_bounded() {
    let cfg = small_config();
    let ctx = PedalContext::new(&cfg);
    ctx.params.delay.set_enabled(true);
    ctx.params.tremolo.set_enabled(true);
    ctx.params.chorus.set_enabled(true);
    let mut pipeline: SamplingPipeline<SMALL> = SamplingPipeline::new(&cfg);
    let mut adc = MockAdc::new(i32::MAX / 2);
    let mut pwm = MockPwm::new();

    for _ in 0..20_000 {
        pipeline.run_tick(&ctx, &mut adc, &mut pwm).unwrap();
    }
    assert!(pwm.max <= PWM_PERIOD);
    assert!(pwm.max > pwm.min);
    assert!((pwm.min..=pwm.max).contains(&pwm.last));
    assert_eq!(adc.rearms, 20_000);
    assert_eq!(ctx.ticks.now(), 20_000);
    let lookback = pipeline.chorus().last_lookback().unwrap();
    assert!((1..SMALL).contains(&lookback));
}

#[test]
fn footswitch_and_encoder_drive_tremolo() {
    let cfg = small_config();
    let ctx = PedalContext::new(&cfg);
    let mut pipeline: SamplingPipeline<SMALL> = SamplingPipeline::new(&cfg);
    let mut buttons = ButtonController::new(&cfg.controls);
    let mut encoder = EncoderController::new(&cfg.controls);
    let mut adc = MockAdc::new(1 << 26);
    let mut pwm = MockPwm::new();

    assert_eq!(buttons.service(&ctx, &mut Footswitches(0x02)), Ok(1));
    assert!(ctx.params.tremolo.is_enabled());

    for _ in 0..3000 {
        pipeline.run_tick(&ctx, &mut adc, &mut pwm).unwrap();
    }
    assert!(pipeline.tremolo().lfo().phase() > 0);
    assert!(pipeline.tremolo().last_gain() < 256);

    turn(&mut encoder, &ctx, CW_WORDS);
    assert_eq!(ctx.params.tremolo.rate(), 43);

    // Encoder push: press then release
    let mut pins = EncoderPins(0b111);
    encoder.service(&ctx, &mut pins).unwrap();
    pins.0 = 0b011;
    encoder.service(&ctx, &mut pins).unwrap();
    assert_eq!(encoder.target(), AdjustTarget::Depth);

    turn(&mut encoder, &ctx, CCW_WORDS);
    assert_eq!(ctx.params.tremolo.depth(), 240);

    let (events, n) = collect_events(&ctx);
    assert_eq!(n, 4);
    assert_eq!(
        events[..4],
        [
            Some(ControlEvent::EffectToggled { effect: EffectKind::Tremolo, enabled: true }),
            Some(ControlEvent::ParameterChanged { parameter: Parameter::TremoloRate, value: 43 }),
            Some(ControlEvent::AdjustTargetChanged(AdjustTarget::Depth)),
            Some(ControlEvent::ParameterChanged { parameter: Parameter::TremoloDepth, value: 240 }),
        ]
    );
}

#[test]
fn button_debounce_uses_pipeline_ticks() {
    let cfg = small_config();
    let ctx = PedalContext::new(&cfg);
    let mut pipeline: SamplingPipeline<SMALL> = SamplingPipeline::new(&cfg);
    let mut buttons = ButtonController::new(&cfg.controls);
    let mut adc = MockAdc::new(0);
    let mut pwm = MockPwm::new();

    buttons.service(&ctx, &mut Footswitches(0x01)).unwrap();
    for _ in 0..7999 {
        pipeline.run_tick(&ctx, &mut adc, &mut pwm).unwrap();
    }
    assert_eq!(buttons.service(&ctx, &mut Footswitches(0x01)), Ok(0));
    assert!(ctx.params.delay.is_enabled());

    pipeline.run_tick(&ctx, &mut adc, &mut pwm).unwrap();
    assert_eq!(buttons.service(&ctx, &mut Footswitches(0x01)), Ok(1));
    assert!(!ctx.params.delay.is_enabled());

    let (events, n) = collect_events(&ctx);
    assert_eq!(n, 3);
    assert_eq!(events[1], Some(ControlEvent::PressRejected(EffectKind::Delay)));
}

#[test]
fn parameter_change_applies_on_next_tick() {
    let mut cfg = small_config();
    // Transparent conditioning so duties are easy to predict
    cfg.conditioning.static_bias = Some(0);
    cfg.conditioning.bias_shift = 30;
    cfg.conditioning.lowpass_coeff = 256;
    cfg.conditioning.scale_shift = 0;
    cfg.delay.length = ParamRange::new(100, 3000, 100, 100);
    let ctx = PedalContext::new(&cfg);
    let mut pipeline: SamplingPipeline<SMALL> = SamplingPipeline::new(&cfg);
    let mut buttons = ButtonController::new(&cfg.controls);

    // Impulse on tick 1, silence after
    pipeline.process(&ctx, 0);
    pipeline.process(&ctx, 500);
    for _ in 0..50 {
        assert_eq!(pipeline.process(&ctx, 0), 1024);
    }
    buttons.on_buttons(&ctx, 0x01);
    let mut echo = None;
    for tick in 52..200 {
        let duty = pipeline.process(&ctx, 0);
        if duty != 1024 {
            echo = Some((tick, duty));
            break;
        }
    }
    // Lookback 100 reads the impulse 99 ticks after it was written
    let (tick, duty) = echo.unwrap();
    assert_eq!(tick, 100);
    assert!(duty > 1024);
}

#[test]
fn source_error_skips_tick() {
    let cfg = small_config();
    let ctx = PedalContext::new(&cfg);
    let mut pipeline: SamplingPipeline<SMALL> = SamplingPipeline::new(&cfg);
    let mut adc = MockAdc::new(1000);
    let mut pwm = MockPwm::new();
    adc.fail = true;
    assert_eq!(
        pipeline.run_tick(&ctx, &mut adc, &mut pwm),
        Err(TickError::Source("adc overrun"))
    );
    assert_eq!(ctx.ticks.now(), 0);
    assert_eq!(pipeline.snapshot().samples_written, 0);
    assert_eq!(adc.rearms, 1);

    adc.fail = false;
    assert!(pipeline.run_tick(&ctx, &mut adc, &mut pwm).is_ok());
    assert_eq!(ctx.ticks.now(), 1);
    assert_eq!(adc.rearms, 2);
}
