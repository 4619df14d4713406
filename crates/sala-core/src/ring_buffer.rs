//! Fixed-capacity circular sample buffer.
//!
//! Every delay-based primitive in this crate ([`DelayLine`](crate::DelayLine),
//! [`PredelayLine`](crate::PredelayLine), the allpass diffusers, and the
//! early-reflection tap buffer in `sala-reverb`) stores its history in a
//! [`RingBuffer`] instead of carrying its own cursor arithmetic.
//!
//! # Indexing
//!
//! The write cursor always points at the slot the next [`write`](RingBuffer::write)
//! fills. Reads are expressed relative to the most recent write:
//!
//! | Call | Returns |
//! |------|---------|
//! | `read(0)` | the sample written last |
//! | `read(d)` | the sample written `d` writes before that |
//! | `oldest()` | the sample written `capacity` writes ago (next to be overwritten) |

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::vec;
use alloc::vec::Vec;

/// Circular buffer of `f32` samples with a single wrapping write cursor.
///
/// The buffer is heap-allocated on construction and only reallocated by an
/// explicit [`resize`](Self::resize). Reads and writes never allocate.
///
/// # Example
///
/// ```rust
/// use sala_core::RingBuffer;
///
/// let mut ring = RingBuffer::new(4);
/// ring.write(1.0);
/// ring.write(2.0);
///
/// assert_eq!(ring.read(0), 2.0);
/// assert_eq!(ring.read(1), 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct RingBuffer {
    buffer: Vec<f32>,
    write_pos: usize,
}

impl RingBuffer {
    /// Creates a zero-filled buffer holding `capacity` samples.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Ring buffer capacity must be > 0");

        Self {
            buffer: vec![0.0; capacity],
            write_pos: 0,
        }
    }

    /// Number of samples the buffer holds.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Current write cursor, always in `0..capacity`.
    #[inline]
    pub fn write_pos(&self) -> usize {
        self.write_pos
    }

    /// Stores a sample at the cursor and advances it.
    #[inline]
    pub fn write(&mut self, sample: f32) {
        self.buffer[self.write_pos] = sample;
        self.write_pos += 1;
        if self.write_pos == self.buffer.len() {
            self.write_pos = 0;
        }
    }

    /// Reads the sample written `delay` writes before the most recent one.
    ///
    /// `delay` is clamped to `capacity - 1`.
    #[inline]
    pub fn read(&self, delay: usize) -> f32 {
        let len = self.buffer.len();
        let delay = delay.min(len - 1);
        self.buffer[(self.write_pos + len - 1 - delay) % len]
    }

    /// Reads between two integer positions with linear interpolation.
    ///
    /// `delay` follows the same convention as [`read`](Self::read) and is
    /// clamped to `[0, capacity - 2]` so both neighbours exist.
    #[inline]
    pub fn read_linear(&self, delay: f32) -> f32 {
        let max = self.buffer.len().saturating_sub(2) as f32;
        let delay = delay.clamp(0.0, max);
        let whole = delay as usize;
        let frac = delay - whole as f32;

        let a = self.read(whole);
        let b = self.read(whole + 1);
        a + (b - a) * frac
    }

    /// The sample about to be overwritten: written exactly `capacity` writes ago.
    #[inline]
    pub fn oldest(&self) -> f32 {
        self.buffer[self.write_pos]
    }

    /// Returns the oldest sample and replaces it with `sample` (fixed-depth FIFO step).
    #[inline]
    pub fn push(&mut self, sample: f32) -> f32 {
        let out = self.oldest();
        self.write(sample);
        out
    }

    /// Zeroes every sample and rewinds the cursor.
    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }

    /// Reallocates to a new capacity, discarding the contents.
    ///
    /// Not realtime-safe; call only while audio is stopped.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0.
    pub fn resize(&mut self, capacity: usize) {
        assert!(capacity > 0, "Ring buffer capacity must be > 0");
        self.buffer.clear();
        self.buffer.resize(capacity, 0.0);
        self.write_pos = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_relative_to_last_write() {
        let mut ring = RingBuffer::new(8);
        for i in 1..=5 {
            ring.write(i as f32);
        }

        assert_eq!(ring.read(0), 5.0);
        assert_eq!(ring.read(2), 3.0);
        assert_eq!(ring.read(4), 1.0);
    }

    #[test]
    fn test_wraparound() {
        let mut ring = RingBuffer::new(4);
        for i in 1..=6 {
            ring.write(i as f32);
        }

        // Holds 3, 4, 5, 6
        assert_eq!(ring.read(0), 6.0);
        assert_eq!(ring.read(3), 3.0);
        assert_eq!(ring.oldest(), 3.0);
        assert_eq!(ring.write_pos(), 2);
    }

    #[test]
    fn test_read_clamps_to_capacity() {
        let mut ring = RingBuffer::new(4);
        for i in 1..=4 {
            ring.write(i as f32);
        }

        assert_eq!(ring.read(100), ring.read(3));
    }

    #[test]
    fn test_push_is_fixed_depth_fifo() {
        let mut ring = RingBuffer::new(3);

        assert_eq!(ring.push(1.0), 0.0);
        assert_eq!(ring.push(2.0), 0.0);
        assert_eq!(ring.push(3.0), 0.0);
        assert_eq!(ring.push(4.0), 1.0);
        assert_eq!(ring.push(5.0), 2.0);
    }

    #[test]
    fn test_read_linear_midpoint() {
        let mut ring = RingBuffer::new(8);
        ring.write(0.0);
        ring.write(1.0);
        ring.write(2.0);

        // Halfway between 2.0 (delay 0) and 1.0 (delay 1)
        assert!((ring.read_linear(0.5) - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_clear_and_resize() {
        let mut ring = RingBuffer::new(4);
        ring.write(1.0);
        ring.clear();
        assert_eq!(ring.read(0), 0.0);
        assert_eq!(ring.write_pos(), 0);

        ring.write(1.0);
        ring.resize(16);
        assert_eq!(ring.capacity(), 16);
        assert_eq!(ring.write_pos(), 0);
        assert_eq!(ring.read(0), 0.0);
    }

    #[test]
    #[should_panic]
    fn test_zero_capacity_panics() {
        let _ring = RingBuffer::new(0);
    }
}
