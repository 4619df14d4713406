//! Low Frequency Oscillator for delay-length modulation.
//!
//! Drives [`ModulatedAllpass`](crate::ModulatedAllpass): a slow sine wobbles
//! the diffuser's effective delay so the reverb tail never settles into a
//! fixed periodic pattern.

use core::f32::consts::TAU;
use libm::sinf;

/// Sine LFO built on a phase accumulator.
///
/// # Example
///
/// ```rust
/// use sala_core::Lfo;
///
/// let mut lfo = Lfo::new(44100.0, 0.5);
/// let value = lfo.next();
/// assert!((-1.0..=1.0).contains(&value));
/// ```
#[derive(Debug, Clone)]
pub struct Lfo {
    /// Current phase position [0.0, 1.0)
    phase: f32,
    /// Phase increment per sample
    phase_inc: f32,
    sample_rate: f32,
    freq_hz: f32,
}

impl Default for Lfo {
    fn default() -> Self {
        Self::new(44100.0, 1.0)
    }
}

impl Lfo {
    /// Create new LFO with given sample rate and frequency
    pub fn new(sample_rate: f32, freq_hz: f32) -> Self {
        Self {
            phase: 0.0,
            phase_inc: freq_hz / sample_rate,
            sample_rate,
            freq_hz,
        }
    }

    /// Set frequency in Hz
    pub fn set_frequency(&mut self, freq_hz: f32) {
        self.freq_hz = freq_hz;
        self.phase_inc = freq_hz / self.sample_rate;
    }

    /// Get current frequency in Hz
    pub fn frequency(&self) -> f32 {
        self.freq_hz
    }

    /// Update the sample rate, keeping the frequency in Hz.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.phase_inc = self.freq_hz / sample_rate;
    }

    /// Set the phase directly, wrapped into [0.0, 1.0).
    ///
    /// Used to start several LFOs at different points of the cycle.
    pub fn set_phase(&mut self, phase: f32) {
        self.phase = phase - libm::floorf(phase);
    }

    /// Current phase in [0.0, 1.0).
    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Reset phase to 0
    pub fn reset(&mut self) {
        self.phase = 0.0;
    }

    /// Returns the sine value at the current phase and advances by one sample.
    #[inline]
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> f32 {
        let value = sinf(self.phase * TAU);
        self.phase += self.phase_inc;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }
        value
    }
}
