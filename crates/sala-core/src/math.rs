//! Mathematical utility functions for DSP.
//!
//! All functions are allocation-free and suitable for `no_std`.
//!
//! # Level Conversions
//!
//! - [`db_to_linear`] / [`linear_to_db`] - Convert between dB and linear gain
//!
//! # Limiting
//!
//! - [`soft_limit`] - Piecewise limiter used inside and after the feedback loop
//! - [`flush_denormal`] - Hard flush of subnormal-range values
//!
//! # Utilities
//!
//! - [`ms_to_samples`] / [`samples_to_ms`] - Time conversions
//! - [`wet_dry_mix`] - Crossfade used by the host-side processor

use libm::{copysignf, expf, logf};

/// Below this magnitude [`soft_limit`] is the identity.
pub const SOFT_LIMIT_THRESHOLD: f32 = 0.4;

/// Level the cubic knee reaches at |x| = 1.0.
///
/// With the knee `u - u³/4` the limiter reaches `T + (1 - T) * 0.75` there.
const KNEE_END: f32 = SOFT_LIMIT_THRESHOLD + (1.0 - SOFT_LIMIT_THRESHOLD) * 0.75;

/// Slope of the asymptotic tail, chosen so the first derivative is continuous
/// at |x| = 1.0 (the knee leaves with slope 0.25).
const TAIL_RATE: f32 = 0.25 / (1.0 - KNEE_END);

/// Convert decibels to linear gain.
///
/// # Example
/// ```rust
/// use sala_core::db_to_linear;
///
/// assert!((db_to_linear(0.0) - 1.0).abs() < 0.001);
/// assert!((db_to_linear(-60.0) - 0.001).abs() < 1e-5);
/// ```
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    // 10^(dB/20) = e^(dB * ln(10)/20)
    const FACTOR: f32 = core::f32::consts::LN_10 / 20.0;
    expf(db * FACTOR)
}

/// Convert linear gain to decibels.
///
/// Inputs are floored at 1e-10 (-200 dB) so silence maps to a finite value.
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    const FACTOR: f32 = 20.0 / core::f32::consts::LN_10;
    logf(linear.max(1e-10)) * FACTOR
}

/// Smooth limiter that is transparent for small signals and never reaches ±1.0.
///
/// Three regions, mirrored for negative input:
///
/// ```text
/// |x| <= 0.4        y = x                                   (linear)
/// 0.4 < |x| <= 1.0  y = 0.4 + 0.6 * (u - u³/4),  u = (|x| - 0.4) / 0.6
/// |x| > 1.0         y = 0.85 + 0.15 * (1 - 1 / (k * (|x| - 1) + 1))
/// ```
///
/// Value and first derivative are continuous at both joins, so the curve has
/// no audible kink. The output approaches ±1.0 asymptotically and is bounded
/// by it even for infinite input.
///
/// # Example
/// ```rust
/// use sala_core::soft_limit;
///
/// assert_eq!(soft_limit(0.25), 0.25);
/// assert!(soft_limit(50.0) < 1.0);
/// assert!(soft_limit(-50.0) > -1.0);
/// ```
#[inline]
pub fn soft_limit(x: f32) -> f32 {
    let magnitude = x.abs();
    if magnitude <= SOFT_LIMIT_THRESHOLD {
        return x;
    }

    let shaped = if magnitude <= 1.0 {
        let u = (magnitude - SOFT_LIMIT_THRESHOLD) / (1.0 - SOFT_LIMIT_THRESHOLD);
        SOFT_LIMIT_THRESHOLD + (1.0 - SOFT_LIMIT_THRESHOLD) * (u - u * u * u * 0.25)
    } else {
        let overshoot = magnitude - 1.0;
        KNEE_END + (1.0 - KNEE_END) * (1.0 - 1.0 / (overshoot * TAIL_RATE + 1.0))
    };

    if x.is_nan() { 0.0 } else { copysignf(shaped, x) }
}

/// Convert milliseconds to samples.
#[inline]
pub fn ms_to_samples(ms: f32, sample_rate: f32) -> f32 {
    ms * sample_rate / 1000.0
}

/// Convert samples to milliseconds.
#[inline]
pub fn samples_to_ms(samples: f32, sample_rate: f32) -> f32 {
    samples * 1000.0 / sample_rate
}

/// Flush subnormal (denormalized) floats to zero.
///
/// Replaces values below 1e-20 with zero, leaving margin before the IEEE 754
/// subnormal range begins. Used inside diffuser buffers where a value written
/// now is recirculated indefinitely.
#[allow(clippy::inline_always)]
#[inline(always)]
pub fn flush_denormal(x: f32) -> f32 {
    if x.abs() < 1e-20 { 0.0 } else { x }
}

/// Crossfade between dry and wet signals.
///
/// Equivalent to `dry * (1 - mix) + wet * mix` with one fewer multiply.
///
/// * `mix` - Blend factor in \[0.0, 1.0\]: 0.0 = all dry, 1.0 = all wet
#[inline]
pub fn wet_dry_mix(dry: f32, wet: f32, mix: f32) -> f32 {
    dry + (wet - dry) * mix
}
