//! Fixed-point DSP building blocks.
//!
//! - [`fixed`]: Q8 multiply, mix, one-pole and soft-knee helpers
//! - [`wavetables`]: the LFO sine table

pub mod fixed;
pub mod wavetables;
