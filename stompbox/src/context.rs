//! State shared between the sampling, button and encoder interrupts.
//!
//! [`PedalContext`] is meant to live in a `static`. Everything in it is
//! reachable through `&self`: parameters and the tick counter are atomic
//! words, and each event queue has one producer and one consumer. Per-stage
//! state that only one interrupt touches (filters, LFO phase, decoder state,
//! debounce timestamps) is *not* here; it lives in the struct that interrupt
//! owns ([`SamplingPipeline`](crate::pipeline::SamplingPipeline),
//! [`ButtonController`](crate::control::ButtonController),
//! [`EncoderController`](crate::control::EncoderController)).

use core::sync::atomic::{AtomicU32, Ordering};

use crate::config::PedalConfig;
use crate::control::ControlEvent;
use crate::events::EventQueue;
use crate::params::EffectParams;

/// Slots per control event queue (one stays empty).
pub const EVENT_QUEUE_SLOTS: usize = 16;

/// Monotonic sampling-tick counter used for debounce timing.
///
/// Written only by the sampling interrupt; read by the control interrupts.
pub struct TickCounter(AtomicU32);

impl TickCounter {
    /// Start at zero.
    pub const fn new() -> Self {
        TickCounter(AtomicU32::new(0))
    }

    /// Current tick.
    #[inline]
    pub fn now(&self) -> u32 {
        self.0.load(Ordering::Relaxed)
    }

    /// Advance by one tick (sampling interrupt only).
    #[inline]
    pub fn advance(&self) -> u32 {
        let next = self.0.load(Ordering::Relaxed).wrapping_add(1);
        self.0.store(next, Ordering::Relaxed);
        next
    }
}

impl Default for TickCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared pedal state.
pub struct PedalContext {
    /// Effect enables and adjustable parameters.
    pub params: EffectParams,
    /// Sampling ticks since startup.
    pub ticks: TickCounter,
    /// Produced by the button interrupt.
    pub button_events: EventQueue<EVENT_QUEUE_SLOTS>,
    /// Produced by the encoder interrupt.
    pub encoder_events: EventQueue<EVENT_QUEUE_SLOTS>,
}

impl PedalContext {
    /// Build a context with every effect disabled and parameters at their defaults.
    pub const fn new(config: &PedalConfig) -> Self {
        PedalContext {
            params: EffectParams::new(config),
            ticks: TickCounter::new(),
            button_events: EventQueue::new(),
            encoder_events: EventQueue::new(),
        }
    }

    /// Drain both event queues (idle loop only). Button events come first.
    /// Returns the number of events handed to `f`.
    pub fn drain_events(&self, mut f: impl FnMut(ControlEvent)) -> usize {
        self.button_events.drain(&mut f) + self.encoder_events.drain(&mut f)
    }

    /// Total events lost to full queues.
    pub fn dropped_events(&self) -> u32 {
        self.button_events
            .dropped()
            .saturating_add(self.encoder_events.dropped())
    }
}

/// Push `event` to `queue`, logging if it had to be dropped.
pub(crate) fn publish<const N: usize>(queue: &EventQueue<N>, event: ControlEvent) {
    if queue.push(event).is_err() {
        log::warn!("control event queue full, dropped {:?}", event);
    }
}
