//! Biquad (bi-quadratic) filter structure.
//!
//! Second-order IIR sections used to shape the spectrum circulating in the
//! reverb's feedback loop: a low-pass controls brightness, a high-pass keeps
//! low-frequency energy from piling up into boom.
//!
//! Coefficient calculation uses the RBJ Audio EQ Cookbook formulas.

use core::f32::consts::PI;
use libm::{cosf, sinf};

/// Q of a second-order Butterworth section (maximally flat passband).
pub const BUTTERWORTH_Q: f32 = core::f32::consts::FRAC_1_SQRT_2;

/// Lowest cutoff accepted by the coefficient setters, in Hz.
const MIN_CUTOFF_HZ: f32 = 10.0;

/// Highest cutoff accepted, as a fraction of the sample rate (just below Nyquist).
const MAX_CUTOFF_RATIO: f32 = 0.45;

/// Keeps a cutoff frequency inside `[10 Hz, 0.45 * sample_rate]`.
///
/// The RBJ formulas break down at and above Nyquist (`sin(omega)` changes sign,
/// the poles leave the unit circle), so every setter routes through this.
#[inline]
pub fn clamp_cutoff(frequency: f32, sample_rate: f32) -> f32 {
    let max = (sample_rate * MAX_CUTOFF_RATIO).max(MIN_CUTOFF_HZ);
    if frequency.is_nan() {
        return max;
    }
    frequency.clamp(MIN_CUTOFF_HZ, max)
}

/// Generic biquad filter coefficients and state.
///
/// Implements the transposed Direct Form II structure, which needs only two
/// state variables:
///
/// ```text
/// y[n]  = b0*x[n] + z1
/// z1    = b1*x[n] - a1*y[n] + z2
/// z2    = b2*x[n] - a2*y[n]
/// ```
///
/// # Example
///
/// ```rust
/// use sala_core::{BUTTERWORTH_Q, Biquad};
///
/// let mut lowpass = Biquad::new();
/// lowpass.set_lowpass(1000.0, BUTTERWORTH_Q, 44100.0);
///
/// let out = lowpass.process(1.0);
/// assert!(out.is_finite());
/// ```
#[derive(Debug, Clone)]
pub struct Biquad {
    /// Feedforward coefficients
    b0: f32,
    b1: f32,
    b2: f32,

    /// Feedback coefficients, normalized by a0
    a1: f32,
    a2: f32,

    /// Filter memory
    z1: f32,
    z2: f32,
}

impl Biquad {
    /// Creates a new biquad with passthrough coefficients.
    ///
    /// Initial state: `y[n] = x[n]` (no filtering)
    pub fn new() -> Self {
        Self {
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
            z1: 0.0,
            z2: 0.0,
        }
    }

    /// Sets the biquad coefficients.
    ///
    /// Note: This function normalizes by a0 internally.
    pub fn set_coefficients(&mut self, b0: f32, b1: f32, b2: f32, a0: f32, a1: f32, a2: f32) {
        let a0_inv = 1.0 / a0;
        self.b0 = b0 * a0_inv;
        self.b1 = b1 * a0_inv;
        self.b2 = b2 * a0_inv;
        self.a1 = a1 * a0_inv;
        self.a2 = a2 * a0_inv;
    }

    /// Configures a low-pass response. State is kept, so this is safe to call
    /// between blocks while audio is running.
    pub fn set_lowpass(&mut self, frequency: f32, q: f32, sample_rate: f32) {
        let (b0, b1, b2, a0, a1, a2) = lowpass_coefficients(frequency, q, sample_rate);
        self.set_coefficients(b0, b1, b2, a0, a1, a2);
    }

    /// Configures a high-pass response. State is kept.
    pub fn set_highpass(&mut self, frequency: f32, q: f32, sample_rate: f32) {
        let (b0, b1, b2, a0, a1, a2) = highpass_coefficients(frequency, q, sample_rate);
        self.set_coefficients(b0, b1, b2, a0, a1, a2);
    }

    /// Processes a single sample through the biquad filter.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let output = self.b0 * input + self.z1;
        self.z1 = self.b1 * input - self.a1 * output + self.z2;
        self.z2 = self.b2 * input - self.a2 * output;
        output
    }

    /// Zeroes the filter memory without touching the coefficients.
    pub fn reset(&mut self) {
        self.z1 = 0.0;
        self.z2 = 0.0;
    }

    /// Returns the normalized coefficients `(b0, b1, b2, a1, a2)`.
    pub fn coefficients(&self) -> (f32, f32, f32, f32, f32) {
        (self.b0, self.b1, self.b2, self.a1, self.a2)
    }
}

impl Default for Biquad {
    fn default() -> Self {
        Self::new()
    }
}

/// Two identical biquad sections in series: a 4th-order, 24 dB/octave slope.
///
/// # Example
///
/// ```rust
/// use sala_core::{BUTTERWORTH_Q, CascadedBiquad};
///
/// let mut highpass = CascadedBiquad::new();
/// highpass.set_highpass(120.0, BUTTERWORTH_Q, 48000.0);
/// let out = highpass.process(0.25);
/// assert!(out.is_finite());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CascadedBiquad {
    stages: [Biquad; 2],
}

impl CascadedBiquad {
    /// Creates a passthrough cascade.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures both sections as low-pass.
    pub fn set_lowpass(&mut self, frequency: f32, q: f32, sample_rate: f32) {
        for stage in &mut self.stages {
            stage.set_lowpass(frequency, q, sample_rate);
        }
    }

    /// Configures both sections as high-pass.
    pub fn set_highpass(&mut self, frequency: f32, q: f32, sample_rate: f32) {
        for stage in &mut self.stages {
            stage.set_highpass(frequency, q, sample_rate);
        }
    }

    /// Runs a sample through both sections.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let mid = self.stages[0].process(input);
        self.stages[1].process(mid)
    }

    /// Zeroes the memory of both sections.
    pub fn reset(&mut self) {
        for stage in &mut self.stages {
            stage.reset();
        }
    }
}

/// Calculates low-pass filter coefficients using the RBJ cookbook formula.
///
/// # Arguments
///
/// * `frequency` - Cutoff frequency in Hz, clamped by [`clamp_cutoff`]
/// * `q` - Q factor (typically [`BUTTERWORTH_Q`])
/// * `sample_rate` - Sample rate in Hz
///
/// # Returns
///
/// (b0, b1, b2, a0, a1, a2) coefficients
pub fn lowpass_coefficients(
    frequency: f32,
    q: f32,
    sample_rate: f32,
) -> (f32, f32, f32, f32, f32, f32) {
    let omega = 2.0 * PI * clamp_cutoff(frequency, sample_rate) / sample_rate;
    let cos_omega = cosf(omega);
    let alpha = sinf(omega) / (2.0 * q);

    let b0 = (1.0 - cos_omega) / 2.0;
    let b1 = 1.0 - cos_omega;
    let b2 = (1.0 - cos_omega) / 2.0;
    let a0 = 1.0 + alpha;
    let a1 = -2.0 * cos_omega;
    let a2 = 1.0 - alpha;

    (b0, b1, b2, a0, a1, a2)
}

/// Calculates high-pass filter coefficients using the RBJ cookbook formula.
///
/// # Arguments
///
/// * `frequency` - Cutoff frequency in Hz, clamped by [`clamp_cutoff`]
/// * `q` - Q factor (typically [`BUTTERWORTH_Q`])
/// * `sample_rate` - Sample rate in Hz
///
/// # Returns
///
/// (b0, b1, b2, a0, a1, a2) coefficients
pub fn highpass_coefficients(
    frequency: f32,
    q: f32,
    sample_rate: f32,
) -> (f32, f32, f32, f32, f32, f32) {
    let omega = 2.0 * PI * clamp_cutoff(frequency, sample_rate) / sample_rate;
    let cos_omega = cosf(omega);
    let alpha = sinf(omega) / (2.0 * q);

    let b0 = (1.0 + cos_omega) / 2.0;
    let b1 = -(1.0 + cos_omega);
    let b2 = (1.0 + cos_omega) / 2.0;
    let a0 = 1.0 + alpha;
    let a1 = -2.0 * cos_omega;
    let a2 = 1.0 - alpha;

    (b0, b1, b2, a0, a1, a2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_biquad_passthrough() {
        let mut biquad = Biquad::new();

        for i in 0..10 {
            let input = i as f32 * 0.1;
            let output = biquad.process(input);
            assert!((output - input).abs() < 0.0001);
        }
    }

    #[test]
    fn test_biquad_reset() {
        let mut biquad = Biquad::new();
        biquad.set_lowpass(1000.0, BUTTERWORTH_Q, 44100.0);

        for _ in 0..10 {
            biquad.process(1.0);
        }

        biquad.reset();

        assert_eq!(biquad.z1, 0.0);
        assert_eq!(biquad.z2, 0.0);
    }

    #[test]
    fn test_lowpass_dc_pass() {
        let mut biquad = Biquad::new();
        biquad.set_lowpass(1000.0, BUTTERWORTH_Q, 44100.0);

        let mut output = 0.0;
        for _ in 0..1000 {
            output = biquad.process(1.0);
        }

        assert!((output - 1.0).abs() < 0.01, "DC gain {output}");
    }

    #[test]
    fn test_highpass_blocks_dc() {
        let mut biquad = Biquad::new();
        biquad.set_highpass(120.0, BUTTERWORTH_Q, 44100.0);

        let mut output = 1.0;
        for _ in 0..44100 {
            output = biquad.process(1.0);
        }

        assert!(output.abs() < 1e-3, "DC leaked through high-pass: {output}");
    }

    #[test]
    fn test_lowpass_impulse_response_decays() {
        let mut biquad = Biquad::new();
        biquad.set_lowpass(1000.0, BUTTERWORTH_Q, 44100.0);

        let response: Vec<f32> = (0..2000)
            .map(|n| biquad.process(if n == 0 { 1.0 } else { 0.0 }))
            .collect();

        assert!(response.iter().all(|s| s.is_finite()));
        let head_peak = response[..200].iter().fold(0.0f32, |m, s| m.max(s.abs()));
        let tail_peak = response[1000..].iter().fold(0.0f32, |m, s| m.max(s.abs()));
        assert!(tail_peak < head_peak * 1e-3, "impulse response did not decay");
    }

    #[test]
    fn test_cutoff_clamped_below_nyquist() {
        assert_eq!(clamp_cutoff(30000.0, 44100.0), 44100.0 * 0.45);
        assert_eq!(clamp_cutoff(1.0, 44100.0), 10.0);
        assert_eq!(clamp_cutoff(f32::NAN, 44100.0), 44100.0 * 0.45);

        // Above-Nyquist request still yields a stable filter
        let mut biquad = Biquad::new();
        biquad.set_lowpass(40000.0, BUTTERWORTH_Q, 44100.0);
        for n in 0..10000 {
            let out = biquad.process(if n % 2 == 0 { 1.0 } else { -1.0 });
            assert!(out.is_finite() && out.abs() < 4.0);
        }
    }

    #[test]
    fn test_cascade_is_steeper() {
        // Measure the steady-state amplitude of a 4 kHz tone through a 1 kHz low-pass
        fn tone_gain(process: &mut dyn FnMut(f32) -> f32) -> f32 {
            let mut peak = 0.0f32;
            for n in 0..8820 {
                let x = libm::sinf(2.0 * PI * 4000.0 * n as f32 / 44100.0);
                let y = process(x);
                if n > 4410 {
                    peak = peak.max(y.abs());
                }
            }
            peak
        }

        let mut single = Biquad::new();
        single.set_lowpass(1000.0, BUTTERWORTH_Q, 44100.0);
        let mut cascade = CascadedBiquad::new();
        cascade.set_lowpass(1000.0, BUTTERWORTH_Q, 44100.0);

        let single_gain = tone_gain(&mut |x| single.process(x));
        let cascade_gain = tone_gain(&mut |x| cascade.process(x));

        assert!(cascade_gain < single_gain * single_gain * 1.5);
        assert!(cascade_gain < single_gain);
    }
}
