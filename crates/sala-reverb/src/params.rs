//! Control parameters read by the engine once per block.

use core::ops::RangeInclusive;

/// Host-facing predelay range in milliseconds.
pub const PREDELAY_RANGE_MS: RangeInclusive<f32> = 0.0..=100.0;
/// Decay (feedback gain) range.
pub const DECAY_RANGE: RangeInclusive<f32> = 0.0..=0.98;
/// Diffusion range.
pub const DIFFUSION_RANGE: RangeInclusive<f32> = 0.0..=0.9;
/// High-pass cutoff range in Hz.
pub const HIGHPASS_RANGE_HZ: RangeInclusive<f32> = 20.0..=150.0;
/// Low-pass cutoff range in Hz.
pub const LOWPASS_RANGE_HZ: RangeInclusive<f32> = 5000.0..=16000.0;

/// Snapshot of the reverb controls.
///
/// The engine takes these by reference on every `process` call, so a host can
/// keep one instance behind whatever synchronization it uses and hand the
/// engine a plain copy. Values outside the ranges above are tolerated: the
/// engine clamps decay, diffusion and predelay itself, and the filter setters
/// keep cutoffs below Nyquist. [`clamped`](Self::clamped) applies the host
/// ranges explicitly.
///
/// # Example
///
/// ```rust
/// use sala_reverb::ReverbParams;
///
/// let params = ReverbParams {
///     decay: 1.5,
///     ..ReverbParams::default()
/// };
/// assert_eq!(params.clamped().decay, 0.98);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ReverbParams {
    /// Gap before the late reverb starts, in milliseconds.
    pub predelay_ms: f32,
    /// Feedback gain per network round trip.
    pub decay: f32,
    /// Allpass diffusion amount.
    pub diffusion: f32,
    /// Per-line high-pass cutoff in Hz.
    pub highpass_hz: f32,
    /// Per-line low-pass cutoff in Hz.
    pub lowpass_hz: f32,
}

impl Default for ReverbParams {
    fn default() -> Self {
        Self {
            predelay_ms: 50.0,
            decay: 0.85,
            diffusion: 0.5,
            highpass_hz: 120.0,
            lowpass_hz: 5000.0,
        }
    }
}

impl ReverbParams {
    /// Copy with every field clamped into its host range. NaN fields fall back
    /// to the default value.
    #[must_use]
    pub fn clamped(&self) -> Self {
        let defaults = Self::default();
        Self {
            predelay_ms: clamp_or(self.predelay_ms, &PREDELAY_RANGE_MS, defaults.predelay_ms),
            decay: clamp_or(self.decay, &DECAY_RANGE, defaults.decay),
            diffusion: clamp_or(self.diffusion, &DIFFUSION_RANGE, defaults.diffusion),
            highpass_hz: clamp_or(self.highpass_hz, &HIGHPASS_RANGE_HZ, defaults.highpass_hz),
            lowpass_hz: clamp_or(self.lowpass_hz, &LOWPASS_RANGE_HZ, defaults.lowpass_hz),
        }
    }

    /// Whether every field already lies inside its host range.
    pub fn is_in_range(&self) -> bool {
        PREDELAY_RANGE_MS.contains(&self.predelay_ms)
            && DECAY_RANGE.contains(&self.decay)
            && DIFFUSION_RANGE.contains(&self.diffusion)
            && HIGHPASS_RANGE_HZ.contains(&self.highpass_hz)
            && LOWPASS_RANGE_HZ.contains(&self.lowpass_hz)
    }
}

/// Clamps into `range`, replacing NaN with `fallback`.
#[inline]
pub(crate) fn clamp_or(value: f32, range: &RangeInclusive<f32>, fallback: f32) -> f32 {
    if value.is_nan() {
        fallback
    } else {
        value.clamp(*range.start(), *range.end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_in_range() {
        assert!(ReverbParams::default().is_in_range());
    }

    #[test]
    fn test_clamped() {
        let wild = ReverbParams {
            predelay_ms: 500.0,
            decay: -1.0,
            diffusion: 2.0,
            highpass_hz: 5.0,
            lowpass_hz: 40000.0,
        };
        let c = wild.clamped();
        assert_eq!(c.predelay_ms, 100.0);
        assert_eq!(c.decay, 0.0);
        assert_eq!(c.diffusion, 0.9);
        assert_eq!(c.highpass_hz, 20.0);
        assert_eq!(c.lowpass_hz, 16000.0);
        assert!(!wild.is_in_range());
        assert!(c.is_in_range());
    }

    #[test]
    fn test_nan_falls_back_to_default() {
        let params = ReverbParams {
            decay: f32::NAN,
            ..ReverbParams::default()
        };
        assert_eq!(params.clamped().decay, 0.85);
    }
}
