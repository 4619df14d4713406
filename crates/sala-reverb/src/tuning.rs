//! Tuning tables for the reverb network.
//!
//! Every length is given at the 44.1 kHz reference rate and rescaled by
//! [`scale_to_rate`] when the engine is prepared at another rate. Network line
//! lengths are primes, so no two lines share a common period and their echoes
//! never pile up on the same sample.

/// Reference sample rate for all tuning constants.
pub const REFERENCE_RATE: f32 = 44100.0;

/// Largest supported network size.
pub const MAX_LINES: usize = 16;

/// Main delay-line lengths at 44.1 kHz (23 ms to 95 ms, all prime).
///
/// Networks with fewer lines take an evenly spaced subset, see [`line_delay`].
pub const LINE_DELAYS_44K: [usize; MAX_LINES] = [
    1031, 1327, 1523, 1723, 1933, 2129, 2357, 2551, 2767, 2963, 3169, 3371, 3571, 3767, 3967, 4177,
];

/// First static diffuser per line (prime lengths, 2.5 ms to 10 ms).
pub const DIFFUSER_A_44K: [usize; MAX_LINES] = [
    113, 127, 151, 173, 199, 223, 241, 263, 281, 307, 331, 353, 373, 397, 421, 443,
];

/// Second static diffuser per line, interleaved so neighbouring lines differ.
pub const DIFFUSER_B_44K: [usize; MAX_LINES] = [
    227, 167, 131, 211, 181, 139, 241, 157, 193, 149, 229, 173, 137, 199, 163, 223,
];

/// Nominal sizes of the modulated diffusers.
pub const MODULATED_44K: [usize; MAX_LINES] = [
    67, 71, 79, 83, 89, 97, 101, 103, 107, 109, 113, 127, 131, 137, 139, 149,
];

/// Per-line decay trim, repeated every eight lines.
pub const DECAY_VARIATION: [f32; 8] = [1.0, 0.998, 0.997, 0.999, 0.996, 0.998, 0.997, 0.999];

/// Extra damping on the two shortest lines, which recirculate most often.
pub const SHORT_LINE_DAMPING: f32 = 0.94;

/// Early-reflection taps at 44.1 kHz as `(delay_samples, gain)`.
pub const EARLY_TAPS_44K: [(usize, f32); 8] = [
    (450, 0.65),
    (850, 0.57),
    (1250, 0.49),
    (1800, 0.40),
    (2500, 0.32),
    (3200, 0.24),
    (4000, 0.18),
    (4800, 0.15),
];

/// Number of early-reflection taps summed per sample.
pub const ACTIVE_EARLY_TAPS: usize = 4;

/// Allpass diffusers applied to the summed early reflections.
pub const EARLY_DIFFUSERS_44K: [usize; 2] = [97, 59];

/// Trial-division primality test; the tables stay small enough for it.
pub fn is_prime(n: usize) -> bool {
    if n < 2 {
        return false;
    }
    if n < 4 {
        return true;
    }
    if n % 2 == 0 {
        return false;
    }
    let mut d = 3;
    while d * d <= n {
        if n % d == 0 {
            return false;
        }
        d += 2;
    }
    true
}

/// Smallest prime `>= n`.
pub fn next_prime(n: usize) -> usize {
    let mut candidate = n.max(2);
    while !is_prime(candidate) {
        candidate += 1;
    }
    candidate
}

/// Scale a length from the reference rate by `ratio` (target / reference).
pub fn scale_to_rate(samples: usize, ratio: f32) -> usize {
    ((samples as f32 * ratio).round() as usize).max(1)
}

/// Like [`scale_to_rate`], rounded up to the next prime.
pub fn scale_to_prime(samples: usize, ratio: f32) -> usize {
    next_prime(scale_to_rate(samples, ratio))
}

/// Index into the 16-entry tables used by line `line` of an `n`-line network.
///
/// Smaller networks take every `16 / n`-th entry, so they span the same range
/// of lengths as the full network.
#[inline]
pub fn table_index(line: usize, n: usize) -> usize {
    line * MAX_LINES / n
}

/// Reference-rate main delay of line `line` in an `n`-line network.
pub fn line_delay(line: usize, n: usize) -> usize {
    LINE_DELAYS_44K[table_index(line, n)]
}

/// Decay gain multiplier of line `line`.
pub fn decay_variation(line: usize) -> f32 {
    let trim = DECAY_VARIATION[line % DECAY_VARIATION.len()];
    if line < 2 {
        trim * SHORT_LINE_DAMPING
    } else {
        trim
    }
}

/// Per-line low-pass cutoff spread: line 0 sits 3% below the cutoff, the last
/// line up to 3% above.
pub fn lowpass_spread(line: usize, n: usize) -> f32 {
    0.97 + 0.06 * line as f32 / n as f32
}

/// Rate of the modulated diffuser on line `line`, spread over 0.3-1.1 Hz.
pub fn modulation_rate(line: usize, n: usize) -> f32 {
    0.3 + 0.8 * line as f32 / n as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_tables_are_prime() {
        for &len in LINE_DELAYS_44K
            .iter()
            .chain(DIFFUSER_A_44K.iter())
            .chain(DIFFUSER_B_44K.iter())
            .chain(MODULATED_44K.iter())
            .chain(EARLY_DIFFUSERS_44K.iter())
        {
            assert!(is_prime(len), "{len} is not prime");
        }
    }

    #[test]
    fn test_next_prime() {
        assert_eq!(next_prime(0), 2);
        assert_eq!(next_prime(1031), 1031);
        assert_eq!(next_prime(1032), 1033);
        assert_eq!(next_prime(2062), 2063);
    }

    #[test]
    fn test_scale_is_identity_at_reference() {
        for &len in &LINE_DELAYS_44K {
            assert_eq!(scale_to_prime(len, 1.0), len);
        }
    }

    #[test]
    fn test_subset_spans_range() {
        let four: Vec<usize> = (0..4).map(|i| line_delay(i, 4)).collect();
        assert_eq!(four, vec![1031, 1933, 2767, 3571]);
        assert_eq!(line_delay(15, 16), 4177);
    }

    #[test]
    fn test_decay_variation() {
        assert!((decay_variation(0) - 0.94).abs() < 1e-6);
        assert!((decay_variation(1) - 0.998 * 0.94).abs() < 1e-6);
        assert_eq!(decay_variation(2), 0.997);
        assert_eq!(decay_variation(8), 1.0);
        assert!((0..16).all(|i| decay_variation(i) <= 1.0));
    }

    #[test]
    fn test_early_taps_sorted() {
        assert!(EARLY_TAPS_44K.windows(2).all(|w| w[0].0 < w[1].0));
        assert!(EARLY_TAPS_44K.windows(2).all(|w| w[0].1 > w[1].1));
    }
}
