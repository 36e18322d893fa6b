//! The three effects of the chain and the LFO they share.
//!
//! Each effect owns its persistent state (LFO phase, mix weights) and reads
//! its adjustable parameters from a per-tick settings snapshot taken from
//! [`EffectParams`](crate::params::EffectParams). The pipeline runs them in a
//! fixed order: delay, tremolo, chorus.

pub mod chorus;
pub mod delay;
pub mod lfo;
pub mod tremolo;

pub use chorus::Chorus;
pub use delay::Delay;
pub use lfo::Lfo;
pub use tremolo::Tremolo;

use crate::history::HistoryBuffer;

/// One sample-in, sample-out stage of the effect chain.
///
/// `process` must be constant time and must never fail. An effect that
/// cannot run (disabled, or not enough history yet) returns its input.
pub trait Effect {
    /// Parameter snapshot read once per tick.
    type Settings: Copy;

    /// Process one sample. `history` already holds the current conditioned
    /// sample as its most recent entry.
    fn process<const N: usize>(
        &mut self,
        input: i32,
        settings: &Self::Settings,
        history: &HistoryBuffer<N>,
    ) -> i32;
}
