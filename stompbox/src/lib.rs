//! # stompbox
//!
//! A `no_std`, zero-allocation guitar effects core for interrupt-driven
//! soft-core firmware. One raw sample comes in per sampling tick, is
//! conditioned, stored in a history ring, run through delay, tremolo and
//! chorus, and leaves as a PWM duty cycle. Footswitches and a rotary
//! encoder change effect parameters from their own interrupts.
//!
//! ## Architecture
//!
//! | Layer | Module | Purpose |
//! |-------|--------|---------|
//! | Config | [`config`] / [`constants`] | `PedalConfig`, parameter ranges, startup validation |
//! | DSP | [`dsp`] | Q8 fixed-point helpers, LFO sine table |
//! | Signal | [`conditioning`] / [`history`] / [`effects`] / [`output`] | Per-sample stages |
//! | Shared | [`params`] / [`context`] / [`events`] | Atomic parameters, ticks, event queues |
//! | Control | [`control`] | Quadrature decoder, debounce, button and encoder dispatch |
//! | Orchestration | [`pipeline`] | `SamplingPipeline`: fixed stage order per tick |
//! | I/O | [`io`] / `hal` | Boundary traits, `embedded-hal` adapters (feature-gated) |
//!
//! ## Quick start
//!
//! ```ignore
//! use stompbox::{ButtonController, EncoderController};
//! use stompbox::{PedalConfig, PedalContext, SamplingPipeline};
//!
//! static CONFIG: PedalConfig = PedalConfig::DEFAULT;
//! static CTX: PedalContext = PedalContext::new(&PedalConfig::DEFAULT);
//!
//! // Before unmasking interrupts:
//! CONFIG.validate()?;
//!
//! // Sampling ISR (owns the pipeline):
//! pipeline.run_tick(&CTX, &mut adc, &mut pwm)?;
//!
//! // Button ISR / encoder ISR (each owns its controller):
//! buttons.service(&CTX, &mut button_pins)?;
//! encoder.service(&CTX, &mut encoder_pins)?;
//!
//! // Idle loop:
//! CTX.drain_events(|event| log::info!("{:?}", event));
//! ```
//!
//! ## Features
//!
//! | Feature | Default | Enables |
//! |---------|---------|---------|
//! | `hal` | yes | `embedded-hal` 1.0 PWM and GPIO adapters |
//! | `defmt` | no | `defmt::Format` on public plain types |
//!
//! ## Audio parameters
//!
//! - **Sample rate:** 48 828 Hz ([`constants::SAMPLE_RATE_HZ`])
//! - **PWM period:** 2048 counts ([`constants::PWM_PERIOD`])
//! - **Sample format:** `i32`, Q8 gains and mixes (256 = unity)
//! - **History:** 40 000 samples ([`constants::HISTORY_CAPACITY`])

#![no_std]

pub mod constants;
pub mod config;
pub mod dsp;
pub mod conditioning;
pub mod history;
pub mod params;
pub mod effects;
pub mod output;
pub mod control;
pub mod events;
pub mod context;
pub mod pipeline;
pub mod io;

#[cfg(feature = "hal")]
pub mod hal;

#[cfg(test)]
mod integration_tests;

pub use config::{ConfigError, PedalConfig};
pub use context::PedalContext;
pub use control::{ButtonController, ControlEvent, EncoderController};
pub use pipeline::{PipelineSnapshot, SamplingPipeline};
