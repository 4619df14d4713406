//! Fixed-size mixing matrices for feedback delay networks.
//!
//! A feedback delay network spreads every line's output across all lines each
//! sample. When the spreading matrix is orthogonal it neither adds nor removes
//! energy, so the decay of the tail is governed entirely by the per-line gains.
//!
//! Two generators are provided, both sized by a const generic so the matrix
//! always matches the network:
//!
//! - [`hadamard`] - Sylvester-construction Hadamard matrix scaled by `1/√N`
//!   (every entry `±1/√N`), used to spread the inputs into the network
//! - [`householder`] - Reflection `I - (2/N)·11ᵀ` (diagonal `1 - 2/N`,
//!   off-diagonal `-2/N`), used in the feedback path

use libm::sqrtf;

/// An N×N matrix of `f32`, stored row-major.
///
/// # Example
///
/// ```rust
/// use sala_core::{Matrix, hadamard};
///
/// let h: Matrix<4> = hadamard();
/// let spread = h.mul_vec(&[1.0, 0.0, 0.0, 0.0]);
/// assert!(spread.iter().all(|&v| (v - 0.5).abs() < 1e-6));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix<const N: usize> {
    rows: [[f32; N]; N],
}

impl<const N: usize> Default for Matrix<N> {
    fn default() -> Self {
        Self::identity()
    }
}

impl<const N: usize> Matrix<N> {
    /// Wraps a row-major array.
    pub const fn from_rows(rows: [[f32; N]; N]) -> Self {
        Self { rows }
    }

    /// The identity matrix.
    pub fn identity() -> Self {
        let mut rows = [[0.0; N]; N];
        for (i, row) in rows.iter_mut().enumerate() {
            row[i] = 1.0;
        }
        Self { rows }
    }

    /// Householder reflection `I - 2·v·vᵀ / (vᵀv)` about the hyperplane
    /// orthogonal to `v`. A zero vector yields the identity.
    pub fn reflection(v: &[f32; N]) -> Self {
        let norm_sq: f32 = v.iter().map(|x| x * x).sum();
        if norm_sq == 0.0 {
            return Self::identity();
        }

        let mut rows = [[0.0; N]; N];
        for (i, row) in rows.iter_mut().enumerate() {
            for (j, entry) in row.iter_mut().enumerate() {
                let identity = if i == j { 1.0 } else { 0.0 };
                *entry = identity - 2.0 * v[i] * v[j] / norm_sq;
            }
        }
        Self { rows }
    }

    /// Entry at `(row, col)`.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.rows[row][col]
    }

    /// Borrow the row-major storage.
    pub fn rows(&self) -> &[[f32; N]; N] {
        &self.rows
    }

    /// Transposed copy.
    #[must_use]
    pub fn transpose(&self) -> Self {
        let mut rows = [[0.0; N]; N];
        for (i, row) in self.rows.iter().enumerate() {
            for (j, &value) in row.iter().enumerate() {
                rows[j][i] = value;
            }
        }
        Self { rows }
    }

    /// Matrix product `self · other`.
    #[must_use]
    pub fn product(&self, other: &Self) -> Self {
        let mut rows = [[0.0; N]; N];
        for (i, row) in rows.iter_mut().enumerate() {
            for (j, entry) in row.iter_mut().enumerate() {
                *entry = (0..N).map(|k| self.rows[i][k] * other.rows[k][j]).sum();
            }
        }
        Self { rows }
    }

    /// Matrix-vector product `self · v`.
    #[inline]
    pub fn mul_vec(&self, v: &[f32; N]) -> [f32; N] {
        let mut out = [0.0; N];
        for (o, row) in out.iter_mut().zip(self.rows.iter()) {
            *o = row.iter().zip(v.iter()).map(|(m, x)| m * x).sum();
        }
        out
    }

    /// Whether `self · selfᵀ` is within `tolerance` of the identity, entry by entry.
    pub fn is_orthogonal(&self, tolerance: f32) -> bool {
        let product = self.product(&self.transpose());
        let identity = Self::identity();
        product
            .rows
            .iter()
            .flatten()
            .zip(identity.rows.iter().flatten())
            .all(|(a, b)| (a - b).abs() <= tolerance)
    }

    /// Whether the matrix equals its transpose.
    pub fn is_symmetric(&self) -> bool {
        (0..N).all(|i| (0..N).all(|j| self.rows[i][j] == self.rows[j][i]))
    }
}

/// Normalized Hadamard matrix of order `N` (Sylvester construction).
///
/// Entry `(i, j)` is `(-1)^popcount(i & j) / √N`, which is the recursive
/// `[[H, H], [H, -H]]` construction written in closed form.
///
/// # Panics
///
/// Panics if `N` is not a power of two.
pub fn hadamard<const N: usize>() -> Matrix<N> {
    assert!(N.is_power_of_two(), "Hadamard order must be a power of two");

    let scale = 1.0 / sqrtf(N as f32);
    let mut rows = [[0.0; N]; N];
    for (i, row) in rows.iter_mut().enumerate() {
        for (j, entry) in row.iter_mut().enumerate() {
            *entry = if (i & j).count_ones() % 2 == 0 {
                scale
            } else {
                -scale
            };
        }
    }
    Matrix::from_rows(rows)
}

/// Householder feedback matrix of order `N`: reflection about the all-ones
/// vector, giving `1 - 2/N` on the diagonal and `-2/N` everywhere else.
pub fn householder<const N: usize>() -> Matrix<N> {
    Matrix::reflection(&[1.0; N])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check_hadamard<const N: usize>() {
        let h: Matrix<N> = hadamard();
        let expected = 1.0 / sqrtf(N as f32);
        for row in h.rows() {
            for &v in row {
                assert!((v.abs() - expected).abs() < 1e-6);
            }
        }
        assert!(h.is_orthogonal(1e-5), "H·Hᵀ != I for N = {N}");
    }

    fn check_householder<const N: usize>() {
        let m: Matrix<N> = householder();
        let diag = 1.0 - 2.0 / N as f32;
        let off = -2.0 / N as f32;
        for i in 0..N {
            for j in 0..N {
                let expected = if i == j { diag } else { off };
                assert!((m.get(i, j) - expected).abs() < 1e-6);
            }
        }
        assert!(m.is_symmetric());
        assert!(m.is_orthogonal(1e-5), "M·Mᵀ != I for N = {N}");
    }

    #[test]
    fn test_hadamard_orthogonal() {
        check_hadamard::<4>();
        check_hadamard::<8>();
        check_hadamard::<16>();
    }

    #[test]
    fn test_householder_orthogonal() {
        check_householder::<4>();
        check_householder::<8>();
        check_householder::<16>();
    }

    #[test]
    fn test_hadamard_sylvester_blocks() {
        // H8 = [[H4, H4], [H4, -H4]] up to the scale factor
        let h4: Matrix<4> = hadamard();
        let h8: Matrix<8> = hadamard();
        let ratio = sqrtf(4.0) / sqrtf(8.0);
        for i in 0..4 {
            for j in 0..4 {
                let base = h4.get(i, j) * ratio;
                assert!((h8.get(i, j) - base).abs() < 1e-6);
                assert!((h8.get(i, j + 4) - base).abs() < 1e-6);
                assert!((h8.get(i + 4, j) - base).abs() < 1e-6);
                assert!((h8.get(i + 4, j + 4) + base).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_mul_vec_preserves_energy() {
        let h: Matrix<8> = hadamard();
        let m: Matrix<8> = householder();
        let v = [0.3, -0.7, 0.1, 0.9, -0.2, 0.5, 0.0, -0.4];
        let energy = |x: &[f32; 8]| x.iter().map(|s| s * s).sum::<f32>();

        assert!((energy(&h.mul_vec(&v)) - energy(&v)).abs() < 1e-5);
        assert!((energy(&m.mul_vec(&v)) - energy(&v)).abs() < 1e-5);
    }

    #[test]
    fn test_zero_reflection_is_identity() {
        assert_eq!(Matrix::<4>::reflection(&[0.0; 4]), Matrix::identity());
    }

    #[test]
    #[should_panic(expected = "power of two")]
    fn test_hadamard_rejects_odd_order() {
        let _: Matrix<6> = hadamard();
    }
}
