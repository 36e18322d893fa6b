//! Q8 fixed-point helpers used throughout the signal path.
//!
//! Gains and mix ratios are expressed on a 256 = unity scale. Products are
//! formed in `i64` and saturated back to `i32`, so a wide raw sample can
//! never wrap.

/// Saturate an `i64` to `i32` range.
#[inline(always)]
pub fn saturate32(val: i64) -> i32 {
    if val > i32::MAX as i64 {
        i32::MAX
    } else if val < i32::MIN as i64 {
        i32::MIN
    } else {
        val as i32
    }
}

/// Multiply by a Q8 gain: `(x * gain) >> 8`.
#[inline(always)]
pub fn scale_q8(x: i32, gain: i32) -> i32 {
    saturate32((x as i64 * gain as i64) >> 8)
}

/// Weighted dry/wet blend: `(dry * dry_mix + wet * wet_mix) >> 8`.
///
/// The two weights are not required to sum to 256.
#[inline(always)]
pub fn mix_q8(dry: i32, wet: i32, dry_mix: i32, wet_mix: i32) -> i32 {
    saturate32((dry as i64 * dry_mix as i64 + wet as i64 * wet_mix as i64) >> 8)
}

/// One step of a one-pole low-pass: `state + ((input - state) * coeff >> 8)`.
#[inline(always)]
pub fn one_pole(state: i32, input: i32, coeff: u16) -> i32 {
    let delta = input as i64 - state as i64;
    saturate32(state as i64 + ((delta * coeff as i64) >> 8))
}

/// Compress the part of `x` beyond `±threshold` by `>> shift`.
#[inline(always)]
pub fn soft_knee(x: i32, threshold: i32, shift: u32) -> i32 {
    let magnitude = x.unsigned_abs() as i64;
    let threshold = threshold as i64;
    if magnitude <= threshold {
        return x;
    }
    let compressed = threshold + ((magnitude - threshold) >> shift);
    if x < 0 {
        saturate32(-compressed)
    } else {
        saturate32(compressed)
    }
}
