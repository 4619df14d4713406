//! DC blocking filter for the reverb's input and feedback paths.
//!
//! A second-order notch at 0 Hz:
//!
//! ```text
//! y[n] = x[n] - x[n-2] + R² * y[n-2]
//! ```
//!
//! Zeros at z = ±1 remove both DC and Nyquist; poles at ±R just inside the
//! unit circle keep the notches narrow. With R = 0.995 the -3 dB point sits
//! near 38 Hz at 48 kHz (`f ≈ (1 - R²) * fs / 4π`).

/// Second-order DC notch.
///
/// Removes bias that the soft limiter and denormal guard can introduce into
/// a feedback loop, where even a tiny offset would otherwise accumulate.
///
/// # Example
///
/// ```rust
/// use sala_core::DcBlocker;
///
/// let mut blocker = DcBlocker::new();
/// let mut out = 1.0;
/// for _ in 0..10_000 {
///     out = blocker.process(0.25);
/// }
/// assert!(out.abs() < 1e-3);
/// ```
#[derive(Debug, Clone)]
pub struct DcBlocker {
    /// R² (pole radius squared)
    r2: f32,
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

impl Default for DcBlocker {
    fn default() -> Self {
        Self::new()
    }
}

impl DcBlocker {
    /// Pole radius used by [`new`](Self::new).
    pub const DEFAULT_RADIUS: f32 = 0.995;

    /// Creates a blocker with R = 0.995.
    pub fn new() -> Self {
        Self::with_radius(Self::DEFAULT_RADIUS)
    }

    /// Creates a blocker with a custom pole radius, clamped to `[0.9, 0.9999]`.
    pub fn with_radius(radius: f32) -> Self {
        let r = radius.clamp(0.9, 0.9999);
        Self {
            r2: r * r,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    /// Pole radius R.
    pub fn radius(&self) -> f32 {
        libm::sqrtf(self.r2)
    }

    /// Process a single sample.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let output = input - self.x2 + self.r2 * self.y2;

        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;

        output
    }

    /// Zeroes the input and output history.
    pub fn reset(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::f32::consts::PI;

    #[test]
    fn test_removes_dc_offset() {
        let mut blocker = DcBlocker::new();

        let mut output = 0.0;
        for _ in 0..20_000 {
            output = blocker.process(0.5);
        }
        assert!(output.abs() < 1e-4, "DC not removed: {output}");
    }

    #[test]
    fn test_passes_midband() {
        let mut blocker = DcBlocker::new();
        let freq = 1000.0;
        let sample_rate = 48000.0;

        let mut peak = 0.0f32;
        for n in 0..48000 {
            let x = libm::sinf(2.0 * PI * freq * n as f32 / sample_rate);
            let y = blocker.process(x);
            if n > 24000 {
                peak = peak.max(y.abs());
            }
        }
        assert!((peak - 1.0).abs() < 0.02, "1 kHz gain {peak}");
    }

    #[test]
    fn test_removes_dc_from_signal() {
        let mut blocker = DcBlocker::new();
        let sample_rate = 48000.0;

        let mut sum = 0.0;
        let mut count = 0;
        for n in 0..48000 {
            let x = 0.3 + 0.5 * libm::sinf(2.0 * PI * 440.0 * n as f32 / sample_rate);
            let y = blocker.process(x);
            if n >= 24000 {
                sum += y;
                count += 1;
            }
        }
        let mean = sum / count as f32;
        assert!(mean.abs() < 0.01, "residual DC {mean}");
    }

    #[test]
    fn test_reset() {
        let mut blocker = DcBlocker::new();
        for _ in 0..10 {
            blocker.process(1.0);
        }
        blocker.reset();
        assert_eq!(blocker.process(0.0), 0.0);
        assert_eq!(blocker.process(0.0), 0.0);
    }

    #[test]
    fn test_radius_clamped() {
        let blocker = DcBlocker::with_radius(2.0);
        assert!((blocker.radius() - 0.9999).abs() < 1e-4);
    }
}
