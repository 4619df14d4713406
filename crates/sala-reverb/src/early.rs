//! Early-reflection simulator.
//!
//! A handful of discrete echoes arrive before the dense late reverb. They are
//! read from a single tap buffer fed with the mono downmix of the input,
//! summed with falling gains, and lightly smeared by two short allpass
//! diffusers. The result is mixed straight into every output channel and never
//! enters the feedback network.

use sala_core::{AllpassFilter, RingBuffer};

use crate::tuning::{
    ACTIVE_EARLY_TAPS, EARLY_DIFFUSERS_44K, EARLY_TAPS_44K, REFERENCE_RATE, scale_to_prime,
    scale_to_rate,
};

/// Allpass coefficient of the early-reflection diffusers.
const DIFFUSER_COEFF: f32 = 0.2;

/// Tapped delay producing the first few reflections.
///
/// # Example
///
/// ```rust
/// use sala_reverb::EarlyReflections;
///
/// let mut early = EarlyReflections::new(44100.0);
/// let first_tap = early.taps()[0].0;
///
/// let onset = (0..5000).position(|n| {
///     let x = if n == 0 { 1.0 } else { 0.0 };
///     early.process(x).abs() > 1e-6
/// });
/// assert_eq!(onset, Some(first_tap));
/// ```
#[derive(Debug, Clone)]
pub struct EarlyReflections {
    buffer: RingBuffer,
    taps: [(usize, f32); ACTIVE_EARLY_TAPS],
    diffusers: [AllpassFilter; 2],
}

impl EarlyReflections {
    /// Creates the simulator with taps scaled to `sample_rate`.
    pub fn new(sample_rate: f32) -> Self {
        let ratio = sample_rate / REFERENCE_RATE;
        let taps = Self::scaled_taps(ratio);
        Self {
            buffer: RingBuffer::new(Self::capacity_for(&taps)),
            taps,
            diffusers: EARLY_DIFFUSERS_44K.map(|len| AllpassFilter::new(scale_to_prime(len, ratio))),
        }
    }

    fn scaled_taps(ratio: f32) -> [(usize, f32); ACTIVE_EARLY_TAPS] {
        core::array::from_fn(|i| {
            let (delay, gain) = EARLY_TAPS_44K[i];
            (scale_to_rate(delay, ratio), gain)
        })
    }

    /// Longest active tap plus the current sample.
    fn capacity_for(taps: &[(usize, f32)]) -> usize {
        taps.iter().map(|&(delay, _)| delay).max().unwrap_or(0) + 1
    }

    /// Rescales taps and diffusers from the reference tables (allocates) and
    /// silences all state.
    pub fn prepare(&mut self, sample_rate: f32) {
        let ratio = sample_rate / REFERENCE_RATE;
        self.taps = Self::scaled_taps(ratio);

        let capacity = Self::capacity_for(&self.taps);
        if capacity == self.buffer.capacity() {
            self.buffer.clear();
        } else {
            self.buffer.resize(capacity);
        }

        for (diffuser, &len) in self.diffusers.iter_mut().zip(EARLY_DIFFUSERS_44K.iter()) {
            let size = scale_to_prime(len, ratio);
            if size == diffuser.delay_samples() {
                diffuser.clear();
            } else {
                diffuser.resize(size);
            }
        }
    }

    /// Active taps as `(delay_samples, gain)` at the prepared rate.
    pub fn taps(&self) -> &[(usize, f32)] {
        &self.taps
    }

    /// Capacity of the tap buffer in samples.
    pub fn buffer_len(&self) -> usize {
        self.buffer.capacity()
    }

    /// Feeds one mono sample and returns the combined reflections.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        self.buffer.write(input);

        let reflections: f32 = self
            .taps
            .iter()
            .map(|&(delay, gain)| self.buffer.read(delay) * gain)
            .sum();

        self.diffusers
            .iter_mut()
            .fold(reflections, |acc, diffuser| diffuser.process(acc, DIFFUSER_COEFF))
    }

    /// Silences the tap buffer and diffusers.
    pub fn reset(&mut self) {
        self.buffer.clear();
        for diffuser in &mut self.diffusers {
            diffuser.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_taps_scale_with_rate() {
        let early = EarlyReflections::new(88200.0);
        let delays: Vec<usize> = early.taps().iter().map(|t| t.0).collect();
        assert_eq!(delays, vec![900, 1700, 2500, 3600]);
        assert_eq!(early.buffer_len(), 3601);
    }

    #[test]
    fn test_prepare_is_idempotent() {
        let mut early = EarlyReflections::new(44100.0);
        let original: Vec<(usize, f32)> = early.taps().to_vec();

        early.prepare(96000.0);
        early.prepare(44100.0);

        assert_eq!(early.taps(), &original[..]);
        assert_eq!(early.buffer_len(), 1801);
    }

    #[test]
    fn test_reflections_are_bounded() {
        let mut early = EarlyReflections::new(48000.0);
        for n in 0..48000 {
            let x = if n % 3 == 0 { 1.0 } else { -1.0 };
            let y = early.process(x);
            assert!(y.is_finite() && y.abs() <= 1.0);
        }
    }

    #[test]
    fn test_reset_silences() {
        let mut early = EarlyReflections::new(44100.0);
        for _ in 0..3000 {
            early.process(0.5);
        }
        early.reset();
        for _ in 0..3000 {
            assert_eq!(early.process(0.0), 0.0);
        }
    }
}
