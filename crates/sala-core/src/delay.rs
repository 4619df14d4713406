//! Delay lines for feedback-delay networks.
//!
//! # Types
//!
//! - [`DelayLine`] - Fixed-length FIFO; the length *is* the delay
//! - [`PredelayLine`] - Large buffer read at a delay chosen per call
//!
//! # Use Cases
//!
//! | Stage | Delay Range | Varies at runtime |
//! |-------|-------------|-------------------|
//! | Network line | 20-100ms (prime lengths) | No |
//! | Predelay | 0-2000ms | Yes |

use crate::RingBuffer;

/// Fixed-length delay line.
///
/// Every call to [`process`](Self::process) returns the sample pushed exactly
/// `len()` calls earlier; the first `len()` calls return the initial zero fill.
/// The length is fixed at construction and only changes through
/// [`resize`](Self::resize), which the reverb engine calls from `prepare`.
///
/// # Example
///
/// ```rust
/// use sala_core::DelayLine;
///
/// let mut delay = DelayLine::new(3);
/// assert_eq!(delay.process(1.0), 0.0);
/// assert_eq!(delay.process(0.0), 0.0);
/// assert_eq!(delay.process(0.0), 0.0);
/// assert_eq!(delay.process(0.0), 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct DelayLine {
    ring: RingBuffer,
}

impl DelayLine {
    /// Creates a delay of `length` samples.
    ///
    /// # Panics
    ///
    /// Panics if `length` is 0.
    pub fn new(length: usize) -> Self {
        Self {
            ring: RingBuffer::new(length),
        }
    }

    /// Pushes one sample and returns the one delayed by `len()` samples.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        self.ring.push(input)
    }

    /// Delay length in samples.
    pub fn len(&self) -> usize {
        self.ring.capacity()
    }

    /// Always `false`; a delay line holds at least one sample.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Silences the line.
    pub fn clear(&mut self) {
        self.ring.clear();
    }

    /// Rebuilds the line at a new length (allocates).
    pub fn resize(&mut self, length: usize) {
        self.ring.resize(length);
    }
}

/// Runtime-variable delay applied to the network input.
///
/// The write cursor advances by one sample per call; the read position is
/// recomputed on every call as `write - delay`, so the delay may change from
/// one sample to the next. A jump in delay makes the read position jump too,
/// which is audible as a pitch glitch when the delay is swept quickly.
///
/// # Example
///
/// ```rust
/// use sala_core::PredelayLine;
///
/// let mut predelay = PredelayLine::new(100);
/// assert_eq!(predelay.process(1.0, 2), 0.0);
/// assert_eq!(predelay.process(0.0, 2), 0.0);
/// assert_eq!(predelay.process(0.0, 2), 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct PredelayLine {
    ring: RingBuffer,
}

impl PredelayLine {
    /// Creates a predelay holding up to `capacity - 1` samples of delay.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0.
    pub fn new(capacity: usize) -> Self {
        Self {
            ring: RingBuffer::new(capacity),
        }
    }

    /// Creates a predelay able to delay by `max_seconds` at `sample_rate`.
    pub fn from_time(sample_rate: f32, max_seconds: f32) -> Self {
        Self::new((sample_rate * max_seconds) as usize + 1)
    }

    /// Writes `input` and returns the sample written `delay_samples` calls ago.
    ///
    /// `delay_samples` is clamped to `[0, capacity - 1]`; a delay of 0 passes
    /// the input straight through.
    #[inline]
    pub fn process(&mut self, input: f32, delay_samples: usize) -> f32 {
        let delay = delay_samples.min(self.max_delay());
        self.ring.write(input);
        self.ring.read(delay)
    }

    /// Largest delay this line can produce, in samples.
    #[inline]
    pub fn max_delay(&self) -> usize {
        self.ring.capacity() - 1
    }

    /// Buffer capacity in samples.
    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    /// Silences the line.
    pub fn clear(&mut self) {
        self.ring.clear();
    }

    /// Reallocates for a new capacity (allocates).
    pub fn resize(&mut self, capacity: usize) {
        self.ring.resize(capacity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_line_round_trip() {
        let mut delay = DelayLine::new(5);
        let input = [0.1, -0.2, 0.3, -0.4, 0.5];

        // First pass drains the zero fill
        for &x in &input {
            assert_eq!(delay.process(x), 0.0);
        }

        // Second pass returns the original sequence in order
        for &expected in &input {
            assert_eq!(delay.process(0.0), expected);
        }
    }

    #[test]
    fn test_delay_line_clear() {
        let mut delay = DelayLine::new(4);
        for _ in 0..4 {
            delay.process(1.0);
        }
        delay.clear();

        for _ in 0..4 {
            assert_eq!(delay.process(0.0), 0.0);
        }
    }

    #[test]
    fn test_delay_line_resize() {
        let mut delay = DelayLine::new(4);
        delay.process(1.0);
        delay.resize(7);

        assert_eq!(delay.len(), 7);
        for _ in 0..7 {
            assert_eq!(delay.process(0.0), 0.0);
        }
    }

    #[test]
    fn test_predelay_zero_is_passthrough() {
        let mut predelay = PredelayLine::new(16);
        for i in 0..20 {
            let x = i as f32;
            assert_eq!(predelay.process(x, 0), x);
        }
    }

    #[test]
    fn test_predelay_exact_delay() {
        let mut predelay = PredelayLine::new(64);
        let mut first_hit = None;

        for n in 0..64 {
            let x = if n == 0 { 1.0 } else { 0.0 };
            if predelay.process(x, 10) != 0.0 && first_hit.is_none() {
                first_hit = Some(n);
            }
        }

        assert_eq!(first_hit, Some(10));
    }

    #[test]
    fn test_predelay_clamps_delay() {
        let mut predelay = PredelayLine::new(8);
        assert_eq!(predelay.max_delay(), 7);

        // An impulse can still be read back after the clamped delay of 7
        let mut outputs = [0.0f32; 8];
        for (n, out) in outputs.iter_mut().enumerate() {
            let x = if n == 0 { 1.0 } else { 0.0 };
            *out = predelay.process(x, 1000);
        }
        assert_eq!(outputs[7], 1.0);
        assert!(outputs[..7].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_predelay_from_time() {
        let predelay = PredelayLine::from_time(48000.0, 2.0);
        assert_eq!(predelay.max_delay(), 96000);
    }
}
