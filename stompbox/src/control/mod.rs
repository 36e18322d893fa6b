//! Button and encoder dispatch.
//!
//! Two controllers, one per control interrupt. Each owns its private state
//! (debounce timestamps, decoder position, adjust target) and writes only
//! the shared parameters listed below. Each pushes its events into its own
//! queue in the [`PedalContext`].
//!
//! | Controller | Writes | Reads |
//! |------------|--------|-------|
//! | [`ButtonController`] | effect enable flags | tick counter |
//! | [`EncoderController`] | delay length, tremolo rate/depth, chorus rate | enable flags, ticks |

pub mod debounce;
pub mod quadrature;

pub use debounce::{Debouncer, EdgeDetector};
pub use quadrature::{QuadState, QuadratureDecoder, Rotation};

use crate::config::ControlConfig;
use crate::context::{publish, PedalContext};
use crate::io::{ButtonInput, EncoderInput};
use crate::params::{EffectKind, Step};

/// Adjustable parameter named in a [`ControlEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Parameter {
    /// Delay length in samples.
    DelayLength,
    /// Tremolo LFO rate.
    TremoloRate,
    /// Tremolo depth.
    TremoloDepth,
    /// Chorus LFO rate.
    ChorusRate,
}

/// Which tremolo parameter the encoder drives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdjustTarget {
    /// LFO rate.
    #[default]
    Rate,
    /// Modulation depth.
    Depth,
}

impl AdjustTarget {
    /// The other target.
    pub fn toggled(self) -> Self {
        match self {
            AdjustTarget::Rate => AdjustTarget::Depth,
            AdjustTarget::Depth => AdjustTarget::Rate,
        }
    }
}

/// Something a control interrupt did, reported to the idle loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControlEvent {
    /// An effect was switched on or off.
    EffectToggled {
        /// Effect.
        effect: EffectKind,
        /// New state.
        enabled: bool,
    },
    /// A footswitch press arrived inside the debounce interval.
    PressRejected(EffectKind),
    /// The encoder moved a parameter (the value is after clamping).
    ParameterChanged {
        /// Parameter.
        parameter: Parameter,
        /// New value.
        value: u32,
    },
    /// The encoder push switched the tremolo adjust target.
    AdjustTargetChanged(AdjustTarget),
    /// A detent arrived while no effect was enabled.
    RotationIgnored(Rotation),
}

/// Footswitch handling: debounce, then toggle the matching effect.
pub struct ButtonController {
    masks: [(EffectKind, u8); 3],
    debouncers: [Debouncer; 3],
}

impl ButtonController {
    /// Create a controller for the configured button bits.
    pub const fn new(config: &ControlConfig) -> Self {
        let debounce = Debouncer::new(config.button_debounce_ticks);
        ButtonController {
            masks: [
                (EffectKind::Delay, config.delay_button),
                (EffectKind::Tremolo, config.tremolo_button),
                (EffectKind::Chorus, config.chorus_button),
            ],
            debouncers: [debounce; 3],
        }
    }

    /// Handle one button-interrupt firing with the sampled bitmask.
    /// Returns how many effects were toggled.
    pub fn on_buttons(&mut self, ctx: &PedalContext, pressed: u8) -> usize {
        let now = ctx.ticks.now();
        let mut toggled = 0;
        for ((effect, mask), debouncer) in self.masks.iter().zip(self.debouncers.iter_mut()) {
            if pressed & *mask == 0 {
                continue;
            }
            if debouncer.accept(now) {
                let enabled = ctx.params.toggle(*effect);
                log::info!("{:?} {}", effect, if enabled { "on" } else { "off" });
                publish(
                    &ctx.button_events,
                    ControlEvent::EffectToggled { effect: *effect, enabled },
                );
                toggled += 1;
            } else {
                log::debug!("{:?} press rejected at tick {}", effect, now);
                publish(&ctx.button_events, ControlEvent::PressRejected(*effect));
            }
        }
        toggled
    }

    /// Read the buttons from `input` and dispatch.
    pub fn service<I: ButtonInput>(
        &mut self,
        ctx: &PedalContext,
        input: &mut I,
    ) -> Result<usize, I::Error> {
        let pressed = input.read_buttons()?;
        Ok(self.on_buttons(ctx, pressed))
    }
}

/// Encoder handling: quadrature decoding, push-switch edge + debounce, and
/// parameter stepping by enabled-effect priority (delay, tremolo, chorus).
pub struct EncoderController {
    config: ControlConfig,
    decoder: QuadratureDecoder,
    push_edge: EdgeDetector,
    push_debounce: Debouncer,
    target: AdjustTarget,
}

impl EncoderController {
    /// Create a controller for the configured encoder bits.
    pub const fn new(config: &ControlConfig) -> Self {
        EncoderController {
            config: *config,
            decoder: QuadratureDecoder::new(),
            push_edge: EdgeDetector::new(),
            push_debounce: Debouncer::new(config.encoder_debounce_ticks),
            target: AdjustTarget::Rate,
        }
    }

    /// Tremolo parameter the encoder currently drives.
    pub fn target(&self) -> AdjustTarget {
        self.target
    }

    /// Decoder state.
    pub fn decoder(&self) -> &QuadratureDecoder {
        &self.decoder
    }

    /// Handle one encoder-interrupt firing with the sampled encoder word.
    pub fn on_encoder_signal(&mut self, ctx: &PedalContext, word: u8) {
        let a = word & self.config.encoder_a != 0;
        let b = word & self.config.encoder_b != 0;
        self.decoder.update(((a as u8) << 1) | b as u8);

        // A push while tremolo is off must not open a debounce window
        let pushed = word & self.config.encoder_button != 0;
        if self.push_edge.rising(pushed)
            && ctx.params.tremolo.is_enabled()
            && self.push_debounce.accept(ctx.ticks.now())
        {
            self.on_push(ctx);
        }

        if let Some(rotation) = self.decoder.take_event() {
            self.on_rotation(ctx, rotation);
        }
    }

    /// Read the encoder from `input` and dispatch.
    pub fn service<I: EncoderInput>(
        &mut self,
        ctx: &PedalContext,
        input: &mut I,
    ) -> Result<(), I::Error> {
        let word = input.read_encoder()?;
        self.on_encoder_signal(ctx, word);
        Ok(())
    }

    fn on_push(&mut self, ctx: &PedalContext) {
        self.target = self.target.toggled();
        log::info!("tremolo adjusts {:?}", self.target);
        publish(&ctx.encoder_events, ControlEvent::AdjustTargetChanged(self.target));
    }

    fn on_rotation(&mut self, ctx: &PedalContext, rotation: Rotation) {
        let params = &ctx.params;
        let up = match rotation {
            Rotation::Clockwise => Step::Up,
            Rotation::CounterClockwise => Step::Down,
        };

        let event = if params.delay.is_enabled() {
            // Clockwise shortens the echo
            let down = match rotation {
                Rotation::Clockwise => Step::Down,
                Rotation::CounterClockwise => Step::Up,
            };
            let value = params.delay.step_length(down);
            ControlEvent::ParameterChanged { parameter: Parameter::DelayLength, value }
        } else if params.tremolo.is_enabled() {
            match self.target {
                AdjustTarget::Rate => ControlEvent::ParameterChanged {
                    parameter: Parameter::TremoloRate,
                    value: params.tremolo.step_rate(up),
                },
                AdjustTarget::Depth => ControlEvent::ParameterChanged {
                    parameter: Parameter::TremoloDepth,
                    value: params.tremolo.step_depth(up),
                },
            }
        } else if params.chorus.is_enabled() {
            ControlEvent::ParameterChanged {
                parameter: Parameter::ChorusRate,
                value: params.chorus.step_rate(up),
            }
        } else {
            ControlEvent::RotationIgnored(rotation)
        };

        match event {
            ControlEvent::ParameterChanged { parameter, value } => {
                log::debug!("{:?} -> {}", parameter, value);
            }
            _ => log::trace!("{:?} with no effect enabled", rotation),
        }
        publish(&ctx.encoder_events, event);
    }
}
