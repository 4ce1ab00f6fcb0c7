//! Dense linear-algebra kernels used by the chord corrector.
//!
//! Everything here works on 1-based data: vectors carry an unused slot 0 and
//! matrices an unused row/column 0, so the arithmetic can be cross-checked
//! against the Fortran reference without index gymnastics. The kernels are
//! LINPACK-shaped (column-oriented factorization, level-1 primitives) but
//! ported, not wrapped.

pub mod lu;

use nalgebra::{DMatrix, DVector};

/// `y += alpha * x` over equal-length slices.
pub(crate) fn axpy(alpha: f64, x: &[f64], y: &mut [f64]) {
    if alpha == 0.0 {
        return;
    }
    for (yi, xi) in y.iter_mut().zip(x) {
        *yi += alpha * xi;
    }
}

/// `x *= alpha`.
pub(crate) fn scal(alpha: f64, x: &mut [f64]) {
    for xi in x.iter_mut() {
        *xi *= alpha;
    }
}

/// Offset of the element of largest magnitude.
///
/// The running maximum is carried in a float; an integer accumulator would
/// truncate fractional magnitudes and pick the wrong pivot.
pub(crate) fn iamax(x: &[f64]) -> usize {
    let mut imax = 0;
    let mut xmax = 0.0_f64;
    for (i, xi) in x.iter().enumerate() {
        if xi.abs() > xmax {
            xmax = xi.abs();
            imax = i;
        }
    }
    imax
}

/// Weighted max-norm of the first `n` components of `v` (1-based):
/// `max_i |v[i]| * w[i]`.
pub(crate) fn weighted_norm(n: usize, v: &DVector<f64>, w: &DVector<f64>) -> f64 {
    let mut vm = 0.0_f64;
    for i in 1..=n {
        vm = vm.max(v[i].abs() * w[i]);
    }
    vm
}

/// Weighted max-norm of an `n` x `n` matrix (1-based), consistent with
/// [`weighted_norm`]: `max_i w[i] * sum_j |a[i][j]| / w[j]`.
pub(crate) fn weighted_matrix_norm(n: usize, a: &DMatrix<f64>, w: &DVector<f64>) -> f64 {
    let mut an = 0.0_f64;
    for i in 1..=n {
        let mut sum = 0.0;
        for j in 1..=n {
            sum += a[(i, j)].abs() / w[j];
        }
        an = an.max(sum * w[i]);
    }
    an
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn axpy_accumulates() {
        let x = [1.0, 2.0, 3.0];
        let mut y = [1.0, 1.0, 1.0];
        axpy(2.0, &x, &mut y);
        assert_eq!(y, [3.0, 5.0, 7.0]);
    }

    #[test]
    fn scal_scales() {
        let mut x = [1.0, -2.0, 4.0];
        scal(0.5, &mut x);
        assert_eq!(x, [0.5, -1.0, 2.0]);
    }

    #[test]
    fn iamax_picks_largest_magnitude() {
        assert_eq!(iamax(&[1.0, -3.5, 2.0]), 1);
        assert_eq!(iamax(&[0.1, 0.2, -0.25]), 2);
        // fractional magnitudes must not be truncated
        assert_eq!(iamax(&[0.4, 0.9, 0.6]), 1);
        assert_eq!(iamax(&[]), 0);
    }

    #[test]
    fn weighted_norms() {
        let v = DVector::from_vec(vec![0.0, 3.0, -4.0]);
        let w = DVector::from_vec(vec![0.0, 1.0, 0.5]);
        assert_abs_diff_eq!(weighted_norm(2, &v, &w), 3.0);

        let mut a = DMatrix::zeros(3, 3);
        a[(1, 1)] = 2.0;
        a[(1, 2)] = -1.0;
        a[(2, 1)] = 0.5;
        a[(2, 2)] = 1.0;
        // row 1: 1.0 * (2/1 + 1/0.5) = 4, row 2: 0.5 * (0.5/1 + 1/0.5) = 1.25
        assert_abs_diff_eq!(weighted_matrix_norm(2, &a, &w), 4.0);
    }
}
