//! Allpass diffusers for reverb density.
//!
//! A first-order allpass with a long delay passes every frequency at unity gain
//! but smears transients in time, turning the discrete echoes of a bare delay
//! line into a dense wash. The reverb engine runs two static diffusers and one
//! modulated diffuser per network line.

use crate::{Lfo, RingBuffer, flush_denormal};
use libm::tanhf;

/// Largest coefficient magnitude accepted by the diffusers.
pub const MAX_COEFFICIENT: f32 = 0.9;

/// Output level above which the saturation guard engages.
const GUARD_KNEE: f32 = 0.9;

/// Bends peaks above [`GUARD_KNEE`] along a tanh curve; the result never
/// exceeds 1.0 in magnitude.
#[inline]
fn saturate(y: f32) -> f32 {
    let magnitude = y.abs();
    if magnitude <= GUARD_KNEE {
        return y;
    }
    let room = 1.0 - GUARD_KNEE;
    let bent = GUARD_KNEE + room * tanhf((magnitude - GUARD_KNEE) / room);
    if y < 0.0 { -bent } else { bent }
}

/// One allpass step around a ring buffer: `d` is the delayed sample,
/// the buffer receives `x + c*d`, the output is `d - c*(x + c*d)`.
#[inline]
fn allpass_step(buffer: &mut RingBuffer, delayed: f32, input: f32, coeff: f32) -> f32 {
    let coeff = coeff.clamp(-MAX_COEFFICIENT, MAX_COEFFICIENT);
    let temp = input + coeff * delayed;
    buffer.write(flush_denormal(temp));
    delayed - coeff * temp
}

/// First-order allpass diffuser with a fixed delay.
///
/// The coefficient is passed per call (the engine derives it from the
/// diffusion parameter) and clamped into `[-0.9, 0.9]`. Two optional stages
/// follow the allpass core: a one-pole output smoother
/// (`y = α·new + (1 - α)·last`) and a tanh guard that bends peaks above 0.9.
///
/// # Example
///
/// ```rust
/// use sala_core::AllpassFilter;
///
/// let mut allpass = AllpassFilter::new(113);
/// let first = allpass.process(1.0, 0.5);
///
/// // The direct path carries -coeff * input
/// assert!((first + 0.5).abs() < 1e-6);
/// ```
#[derive(Debug, Clone)]
pub struct AllpassFilter {
    buffer: RingBuffer,
    /// Output smoothing factor; 1.0 disables smoothing
    smoothing: f32,
    last_output: f32,
}

impl AllpassFilter {
    /// Creates a diffuser delaying by `delay_samples`.
    ///
    /// # Panics
    ///
    /// Panics if `delay_samples` is 0.
    pub fn new(delay_samples: usize) -> Self {
        Self {
            buffer: RingBuffer::new(delay_samples),
            smoothing: 1.0,
            last_output: 0.0,
        }
    }

    /// Sets the output smoothing factor α, clamped to `[0.5, 1.0]`.
    ///
    /// Values around 0.85-0.92 take the edge off the harmonic buildup of
    /// cascaded diffusers. 1.0 turns smoothing off.
    pub fn set_smoothing(&mut self, alpha: f32) {
        self.smoothing = alpha.clamp(0.5, 1.0);
    }

    /// Builder form of [`set_smoothing`](Self::set_smoothing).
    #[must_use]
    pub fn with_smoothing(mut self, alpha: f32) -> Self {
        self.set_smoothing(alpha);
        self
    }

    /// Current smoothing factor.
    pub fn smoothing(&self) -> f32 {
        self.smoothing
    }

    /// Delay length in samples.
    pub fn delay_samples(&self) -> usize {
        self.buffer.capacity()
    }

    /// Processes one sample with coefficient `coeff` (clamped to ±0.9).
    #[inline]
    pub fn process(&mut self, input: f32, coeff: f32) -> f32 {
        let delayed = self.buffer.oldest();
        let raw = allpass_step(&mut self.buffer, delayed, input, coeff);

        let smoothed = self.smoothing * raw + (1.0 - self.smoothing) * self.last_output;
        self.last_output = flush_denormal(smoothed);
        saturate(smoothed)
    }

    /// Silences the buffer and the smoother.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.last_output = 0.0;
    }

    /// Changes the delay length (allocates) and clears the state.
    pub fn resize(&mut self, delay_samples: usize) {
        self.buffer.resize(delay_samples);
        self.last_output = 0.0;
    }
}

/// Allpass diffuser whose delay length wobbles around a nominal size.
///
/// An internal [`Lfo`] sets the target length
/// `nominal * (1 + depth * sin)`, and the length actually read follows it
/// through a one-pole smoother (`current = 0.99·current + 0.01·target`) so the
/// read position never jumps. Fractional lengths are read with linear
/// interpolation.
///
/// # Example
///
/// ```rust
/// use sala_core::ModulatedAllpass;
///
/// let mut diffuser = ModulatedAllpass::new(89, 44100.0);
/// diffuser.set_modulation(0.1, 0.5);
///
/// for _ in 0..1000 {
///     let out = diffuser.process(0.1, 0.3);
///     assert!(out.is_finite());
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ModulatedAllpass {
    buffer: RingBuffer,
    lfo: Lfo,
    nominal_size: f32,
    current_size: f32,
    depth: f32,
}

impl ModulatedAllpass {
    /// Maximum modulation depth (fraction of the nominal size).
    pub const MAX_DEPTH: f32 = 0.3;
    /// Modulation rate range in Hz.
    pub const RATE_RANGE: (f32, f32) = (0.01, 8.0);

    const SIZE_SMOOTHING: f32 = 0.99;

    /// Creates a diffuser around `nominal_size` samples, with modulation off.
    ///
    /// # Panics
    ///
    /// Panics if `nominal_size` is 0.
    pub fn new(nominal_size: usize, sample_rate: f32) -> Self {
        assert!(nominal_size > 0, "Nominal size must be > 0");
        Self {
            buffer: RingBuffer::new(Self::capacity_for(nominal_size)),
            lfo: Lfo::new(sample_rate, 0.5),
            nominal_size: nominal_size as f32,
            current_size: nominal_size as f32,
            depth: 0.0,
        }
    }

    /// Room for the deepest excursion plus the interpolation neighbour.
    fn capacity_for(nominal_size: usize) -> usize {
        let headroom = nominal_size as f32 * (1.0 + Self::MAX_DEPTH);
        headroom as usize + 2
    }

    /// Sets depth (clamped to `[0, 0.3]`) and rate in Hz (clamped to `[0.01, 8]`).
    pub fn set_modulation(&mut self, depth: f32, rate_hz: f32) {
        self.depth = depth.clamp(0.0, Self::MAX_DEPTH);
        self.lfo
            .set_frequency(rate_hz.clamp(Self::RATE_RANGE.0, Self::RATE_RANGE.1));
    }

    /// Current modulation depth.
    pub fn depth(&self) -> f32 {
        self.depth
    }

    /// Current modulation rate in Hz.
    pub fn rate(&self) -> f32 {
        self.lfo.frequency()
    }

    /// Retunes the LFO for a new sample rate, keeping its rate in Hz.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.lfo.set_sample_rate(sample_rate);
    }

    /// Starts the LFO at `phase` (cycles, wrapped into [0, 1)).
    pub fn set_phase(&mut self, phase: f32) {
        self.lfo.set_phase(phase);
    }

    /// Nominal delay length in samples.
    pub fn nominal_size(&self) -> usize {
        self.nominal_size as usize
    }

    /// The smoothed delay length used by the last call, in samples.
    pub fn current_size(&self) -> f32 {
        self.current_size
    }

    /// Processes one sample with coefficient `coeff` (clamped to ±0.9).
    #[inline]
    pub fn process(&mut self, input: f32, coeff: f32) -> f32 {
        let target = self.nominal_size * (1.0 + self.depth * self.lfo.next());
        self.current_size = Self::SIZE_SMOOTHING * self.current_size
            + (1.0 - Self::SIZE_SMOOTHING) * target;

        // read(k) before the write is k + 1 samples old
        let delayed = self.buffer.read_linear(self.current_size - 1.0);
        allpass_step(&mut self.buffer, delayed, input, coeff)
    }

    /// Silences the buffer and restarts the LFO.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.lfo.reset();
        self.current_size = self.nominal_size;
    }

    /// Rebuilds for a new nominal size and sample rate (allocates).
    pub fn resize(&mut self, nominal_size: usize, sample_rate: f32) {
        assert!(nominal_size > 0, "Nominal size must be > 0");
        self.buffer.resize(Self::capacity_for(nominal_size));
        self.lfo.set_sample_rate(sample_rate);
        self.lfo.reset();
        self.nominal_size = nominal_size as f32;
        self.current_size = self.nominal_size;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allpass_impulse_structure() {
        let mut allpass = AllpassFilter::new(4);
        let coeff = 0.5;

        let response: Vec<f32> = (0..9)
            .map(|n| allpass.process(if n == 0 { 1.0 } else { 0.0 }, coeff))
            .collect();

        assert!((response[0] + coeff).abs() < 1e-6);
        assert!(response[1..4].iter().all(|&s| s == 0.0));
        // Second tap: (1 - c²)
        assert!((response[4] - (1.0 - coeff * coeff)).abs() < 1e-6);
        assert!((response[8] - (1.0 - coeff * coeff) * coeff).abs() < 1e-6);
    }

    #[test]
    fn test_allpass_preserves_energy() {
        let mut allpass = AllpassFilter::new(37);
        let mut energy = 0.0f32;
        for n in 0..20000 {
            let y = allpass.process(if n == 0 { 1.0 } else { 0.0 }, 0.7);
            energy += y * y;
        }
        assert!((energy - 1.0).abs() < 0.01, "impulse energy {energy}");
    }

    #[test]
    fn test_coefficient_is_clamped() {
        let mut clamped = AllpassFilter::new(8);
        let mut reference = AllpassFilter::new(8);
        for n in 0..64 {
            let x = if n == 0 { 0.5 } else { 0.0 };
            assert_eq!(clamped.process(x, 5.0), reference.process(x, 0.9));
        }
    }

    #[test]
    fn test_saturation_guard() {
        assert_eq!(saturate(0.5), 0.5);
        assert!(saturate(3.0) <= 1.0);
        assert!(saturate(3.0) > 0.9);
        assert!(saturate(-3.0) >= -1.0);
        assert_eq!(saturate(-3.0), -saturate(3.0));
    }

    #[test]
    fn test_smoothing_softens_transient() {
        let mut plain = AllpassFilter::new(8);
        let mut smooth = AllpassFilter::new(8).with_smoothing(0.85);

        let a = plain.process(0.8, 0.6);
        let b = smooth.process(0.8, 0.6);
        assert!(b.abs() < a.abs());
    }

    #[test]
    fn test_allpass_clear() {
        let mut allpass = AllpassFilter::new(16);
        for _ in 0..50 {
            allpass.process(0.7, 0.5);
        }
        allpass.clear();
        for _ in 0..16 {
            assert_eq!(allpass.process(0.0, 0.5), 0.0);
        }
    }

    #[test]
    fn test_modulation_clamps() {
        let mut diffuser = ModulatedAllpass::new(100, 44100.0);
        diffuser.set_modulation(2.0, 100.0);
        assert_eq!(diffuser.depth(), 0.3);
        assert_eq!(diffuser.rate(), 8.0);

        diffuser.set_modulation(-1.0, 0.0);
        assert_eq!(diffuser.depth(), 0.0);
        assert_eq!(diffuser.rate(), 0.01);
    }

    #[test]
    fn test_unmodulated_matches_fixed_delay() {
        let mut diffuser = ModulatedAllpass::new(10, 44100.0);
        let mut reference = AllpassFilter::new(10);

        for n in 0..100 {
            let x = if n % 7 == 0 { 0.3 } else { 0.0 };
            let a = diffuser.process(x, 0.5);
            let b = reference.process(x, 0.5);
            assert!((a - b).abs() < 1e-6, "sample {n}: {a} vs {b}");
        }
    }

    #[test]
    fn test_size_is_smoothed() {
        let mut diffuser = ModulatedAllpass::new(100, 1000.0);
        diffuser.set_modulation(0.3, 8.0);

        let mut prev = diffuser.current_size();
        for _ in 0..2000 {
            diffuser.process(0.0, 0.5);
            let size = diffuser.current_size();
            // Target moves at most 30 samples, smoothing passes 1% per step
            assert!((size - prev).abs() <= 0.61);
            assert!((70.0..=130.0).contains(&size));
            prev = size;
        }
    }

    #[test]
    fn test_modulated_stays_bounded() {
        let mut diffuser = ModulatedAllpass::new(67, 48000.0);
        diffuser.set_modulation(0.3, 3.0);
        for n in 0..48000 {
            let x = libm::sinf(n as f32 * 0.05) * 0.5;
            let y = diffuser.process(x, 0.9);
            assert!(y.is_finite() && y.abs() < 5.0);
        }
    }
}
