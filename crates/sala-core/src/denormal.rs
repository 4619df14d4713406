//! Denormal prevention for recirculating feedback paths.
//!
//! When a reverb decays into silence its feedback values shrink geometrically
//! until they enter the IEEE 754 subnormal range, where many CPUs slow down by
//! an order of magnitude or more. [`DenormalGuard`] replaces any value smaller
//! than [`DenormalGuard::THRESHOLD`] with pseudo-random noise of about that
//! magnitude, so the loop settles on an inaudible noise floor instead of
//! crawling through subnormals.
//!
//! The noise comes from a seedable LCG owned by the guard, so two engines
//! built with the same seed produce bit-identical output.

/// Replaces near-zero samples with tiny deterministic noise.
///
/// # Example
///
/// ```rust
/// use sala_core::DenormalGuard;
///
/// let mut guard = DenormalGuard::new(1);
/// assert_eq!(guard.apply(0.5), 0.5);
///
/// let floor = guard.apply(0.0);
/// assert!(floor.abs() <= DenormalGuard::NOISE_LEVEL);
/// ```
#[derive(Debug, Clone)]
pub struct DenormalGuard {
    rng_state: u32,
    seed: u32,
}

impl Default for DenormalGuard {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SEED)
    }
}

impl DenormalGuard {
    /// Magnitude below which a sample is replaced.
    pub const THRESHOLD: f32 = 1e-8;

    /// Peak magnitude of the replacement noise.
    pub const NOISE_LEVEL: f32 = 1e-9;

    /// Seed used by [`Default`].
    pub const DEFAULT_SEED: u32 = 0x1234_5678;

    /// Creates a guard whose noise sequence starts from `seed`.
    pub fn new(seed: u32) -> Self {
        Self {
            rng_state: seed,
            seed,
        }
    }

    /// Restarts the noise sequence from the original seed.
    pub fn reset(&mut self) {
        self.rng_state = self.seed;
    }

    /// Returns `x` unchanged unless `|x| < THRESHOLD`, in which case a noise
    /// value in `[-NOISE_LEVEL, NOISE_LEVEL)` is returned instead.
    #[inline]
    pub fn apply(&mut self, x: f32) -> f32 {
        if x.abs() < Self::THRESHOLD {
            self.next_bipolar() * Self::NOISE_LEVEL
        } else {
            x
        }
    }

    /// Advance the LCG and return a value in [-1.0, 1.0).
    ///
    /// Numerical Recipes constants (`a = 1664525`, `c = 1013904223`); only the
    /// upper 16 bits are used since the low bits of an LCG are weakly random.
    #[inline]
    fn next_bipolar(&mut self) -> f32 {
        self.rng_state = self
            .rng_state
            .wrapping_mul(1_664_525)
            .wrapping_add(1_013_904_223);
        let upper = (self.rng_state >> 16) as u16;
        f32::from(upper) / 32_768.0 - 1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passes_normal_signal() {
        let mut guard = DenormalGuard::default();
        for &x in &[1.0, -0.5, 1e-7, -2e-8] {
            assert_eq!(guard.apply(x), x);
        }
    }

    #[test]
    fn test_replaces_tiny_values() {
        let mut guard = DenormalGuard::default();
        for &x in &[0.0, 1e-12, -1e-30, 1e-40] {
            let y = guard.apply(x);
            assert!(y.abs() <= DenormalGuard::NOISE_LEVEL);
            assert!(y == 0.0 || y.abs() > f32::MIN_POSITIVE, "subnormal output {y:e}");
        }
    }

    #[test]
    fn test_noise_is_not_constant() {
        let mut guard = DenormalGuard::default();
        let a = guard.apply(0.0);
        let b = guard.apply(0.0);
        let c = guard.apply(0.0);
        assert!(a != b || b != c);
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = DenormalGuard::new(42);
        let mut b = DenormalGuard::new(42);
        for _ in 0..100 {
            assert_eq!(a.apply(0.0), b.apply(0.0));
        }

        a.reset();
        let mut fresh = DenormalGuard::new(42);
        assert_eq!(a.apply(0.0), fresh.apply(0.0));
    }
}
