//! Per-tick signal path.
//!
//! ```text
//!   acquire ─► conditioning ─► history.write ─► delay ─► tremolo ─► chorus ─► output ─► emit
//!                                                                                         │
//!                                                                              rearm ◄────┘
//! ```
//!
//! The stage order is fixed. The history is written before any effect
//! reads it, so lookback 1 is always the current conditioned sample.
//! Parameters are sampled once per tick from the shared
//! [`EffectParams`](crate::params::EffectParams); a control change that
//! lands mid-tick takes effect on the next tick.

use core::fmt;

use crate::conditioning::ConditioningStage;
use crate::config::PedalConfig;
use crate::constants::HISTORY_CAPACITY;
use crate::context::PedalContext;
use crate::effects::{Chorus, Delay, Effect, Tremolo};
use crate::history::HistoryBuffer;
use crate::io::{DutyCycleSink, SampleSource};
use crate::output::OutputMapper;

/// Diagnostic view of the pipeline, cheap to copy out of the interrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PipelineSnapshot {
    /// Most recent raw sample.
    pub last_raw: i32,
    /// Smallest and largest raw sample seen, once any has arrived.
    pub raw_range: Option<(i32, i32)>,
    /// Current DC bias estimate.
    pub bias: i32,
    /// Current AGC gain (Q8).
    pub agc_gain: i32,
    /// Most recent conditioned sample.
    pub last_conditioned: i32,
    /// Most recent duty value.
    pub last_duty: u32,
    /// Samples written to the history ring (saturating).
    pub samples_written: u32,
    /// Bias tracker divergence resets.
    pub divergence_resets: u32,
}

/// Failure of one of the two peripherals a tick talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickError<S, K> {
    /// Sample acquisition or re-arm failed.
    Source(S),
    /// Duty output failed.
    Sink(K),
}

impl<S: fmt::Debug, K: fmt::Debug> fmt::Display for TickError<S, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TickError::Source(e) => write!(f, "sample source error: {:?}", e),
            TickError::Sink(e) => write!(f, "duty sink error: {:?}", e),
        }
    }
}

/// Everything the sampling interrupt owns.
///
/// `N` is the history capacity. The default build uses
/// [`HISTORY_CAPACITY`]; tests use smaller rings.
pub struct SamplingPipeline<const N: usize = HISTORY_CAPACITY> {
    conditioning: ConditioningStage,
    history: HistoryBuffer<N>,
    delay: Delay,
    tremolo: Tremolo,
    chorus: Chorus,
    output: OutputMapper,
    last_raw: i32,
    raw_range: Option<(i32, i32)>,
    last_conditioned: i32,
    last_duty: u32,
}

impl<const N: usize> SamplingPipeline<N> {
    /// Create a pipeline with fresh state.
    pub const fn new(config: &PedalConfig) -> Self {
        let output = OutputMapper::from_config(config);
        SamplingPipeline {
            conditioning: ConditioningStage::new(config.conditioning),
            history: HistoryBuffer::new(),
            delay: Delay::new(&config.delay),
            tremolo: Tremolo::new(&config.tremolo),
            chorus: Chorus::new(&config.chorus),
            output,
            last_raw: 0,
            raw_range: None,
            last_conditioned: 0,
            last_duty: config.pwm_period / 2,
        }
    }

    /// Run one tick on a raw sample and return the duty to emit.
    ///
    /// Infallible and constant time. Advances the shared tick counter.
    pub fn process(&mut self, ctx: &PedalContext, raw: i32) -> u32 {
        self.last_raw = raw;
        self.raw_range = Some(match self.raw_range {
            Some((lo, hi)) => (lo.min(raw), hi.max(raw)),
            None => (raw, raw),
        });

        let conditioned = self.conditioning.process(raw);
        self.last_conditioned = conditioned;
        self.history.write(conditioned);

        let params = &ctx.params;
        let x = self.delay.process(conditioned, &params.delay.settings(), &self.history);
        let x = self.tremolo.process(x, &params.tremolo.settings(), &self.history);
        let x = self.chorus.process(x, &params.chorus.settings(), &self.history);

        let duty = self.output.map(x);
        self.last_duty = duty;
        ctx.ticks.advance();
        duty
    }

    /// Full sampling-interrupt body: acquire, process, emit, re-arm.
    ///
    /// The source is re-armed on every path, including a failed read or a
    /// failed emit, so the next tick still gets a fresh sample. A failed read
    /// skips processing; the read error wins over a re-arm error.
    pub fn run_tick<S, K>(
        &mut self,
        ctx: &PedalContext,
        source: &mut S,
        sink: &mut K,
    ) -> Result<u32, TickError<S::Error, K::Error>>
    where
        S: SampleSource,
        K: DutyCycleSink,
    {
        let raw = match source.acquire_sample() {
            Ok(raw) => raw,
            Err(e) => {
                // Best effort; the read error is the one reported
                let _ = source.rearm();
                return Err(TickError::Source(e));
            }
        };
        let duty = self.process(ctx, raw);
        let emitted = sink.emit_duty_cycle(duty).map_err(TickError::Sink);
        source.rearm().map_err(TickError::Source)?;
        emitted?;
        Ok(duty)
    }

    /// Copy out the diagnostic counters.
    pub fn snapshot(&self) -> PipelineSnapshot {
        PipelineSnapshot {
            last_raw: self.last_raw,
            raw_range: self.raw_range,
            bias: self.conditioning.bias().bias(),
            agc_gain: self.conditioning.agc().gain(),
            last_conditioned: self.last_conditioned,
            last_duty: self.last_duty,
            samples_written: self.history.samples_written(),
            divergence_resets: self.conditioning.divergence_resets(),
        }
    }

    /// History ring.
    pub fn history(&self) -> &HistoryBuffer<N> {
        &self.history
    }

    /// Tremolo state.
    pub fn tremolo(&self) -> &Tremolo {
        &self.tremolo
    }

    /// Chorus state.
    pub fn chorus(&self) -> &Chorus {
        &self.chorus
    }

    /// Output mapper.
    pub fn output(&self) -> &OutputMapper {
        &self.output
    }
}
