//! Dense LU factorization with partial pivoting and the matching
//! forward/back substitution, operating in place on the padded 1-based
//! iteration matrix.

use nalgebra::{DMatrix, DVector};

use super::{axpy, iamax, scal};

/// Factor the leading `n` x `n` block of `a` (1-based) in place as P*L*U.
///
/// `ipvt[k]` records the pivot row chosen at column k. Returns the index of
/// a column whose pivot is exactly zero, or `None` when the factorization
/// is usable. On a zero pivot the elimination of the remaining columns
/// still runs, so the matrix is left in a consistent state with the first
/// bad column reported.
pub(crate) fn lu_factorize(a: &mut DMatrix<f64>, n: usize, ipvt: &mut [usize]) -> Option<usize> {
    let nr = a.nrows();
    let data = a.as_mut_slice();
    let mut info = None;

    for k in 1..n {
        let ck = k * nr;
        let l = k + iamax(&data[ck + k..ck + n + 1]);
        ipvt[k] = l;
        if data[ck + l] == 0.0 {
            info = Some(k);
            continue;
        }
        if l != k {
            data.swap(ck + l, ck + k);
        }
        let t = -1.0 / data[ck + k];
        scal(t, &mut data[ck + k + 1..ck + n + 1]);
        for j in k + 1..=n {
            let cj = j * nr;
            let t = data[cj + l];
            if l != k {
                data[cj + l] = data[cj + k];
                data[cj + k] = t;
            }
            let (lo, hi) = data.split_at_mut(cj);
            axpy(t, &lo[ck + k + 1..ck + n + 1], &mut hi[k + 1..n + 1]);
        }
    }
    ipvt[n] = n;
    if data[n * nr + n] == 0.0 {
        info = Some(n);
    }
    info
}

/// Solve `a * x = b` using the factors from [`lu_factorize`], overwriting
/// the 1-based right-hand side `b` with the solution.
pub(crate) fn lu_solve(a: &DMatrix<f64>, n: usize, ipvt: &[usize], b: &mut DVector<f64>) {
    let nr = a.nrows();
    let data = a.as_slice();
    let bs = b.as_mut_slice();

    for k in 1..n {
        let l = ipvt[k];
        let t = bs[l];
        if l != k {
            bs[l] = bs[k];
            bs[k] = t;
        }
        let ck = k * nr;
        axpy(t, &data[ck + k + 1..ck + n + 1], &mut bs[k + 1..n + 1]);
    }
    for k in (1..=n).rev() {
        let ck = k * nr;
        bs[k] /= data[ck + k];
        let t = -bs[k];
        axpy(t, &data[ck + 1..ck + k], &mut bs[1..k]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn padded(n: usize, rows: &[&[f64]]) -> DMatrix<f64> {
        let mut a = DMatrix::zeros(n + 1, n + 1);
        for i in 1..=n {
            for j in 1..=n {
                a[(i, j)] = rows[i - 1][j - 1];
            }
        }
        a
    }

    #[test]
    fn solves_spd_system() {
        let mut a = padded(3, &[&[2.0, 1.0, 0.0], &[1.0, 3.0, 1.0], &[0.0, 1.0, 2.0]]);
        let mut ipvt = vec![0usize; 4];
        assert!(lu_factorize(&mut a, 3, &mut ipvt).is_none());

        // x = (1, 1, 1)
        let mut b = DVector::from_vec(vec![0.0, 3.0, 5.0, 3.0]);
        lu_solve(&a, 3, &ipvt, &mut b);
        for i in 1..=3 {
            assert_abs_diff_eq!(b[i], 1.0, epsilon = 1e-13);
        }
    }

    #[test]
    fn pivots_on_zero_diagonal() {
        let mut a = padded(2, &[&[0.0, 1.0], &[1.0, 0.0]]);
        let mut ipvt = vec![0usize; 3];
        assert!(lu_factorize(&mut a, 2, &mut ipvt).is_none());

        let mut b = DVector::from_vec(vec![0.0, 2.0, 3.0]);
        lu_solve(&a, 2, &ipvt, &mut b);
        assert_abs_diff_eq!(b[1], 3.0, epsilon = 1e-14);
        assert_abs_diff_eq!(b[2], 2.0, epsilon = 1e-14);
    }

    #[test]
    fn reports_singular_column() {
        let mut a = padded(2, &[&[1.0, 2.0], &[2.0, 4.0]]);
        let mut ipvt = vec![0usize; 3];
        assert_eq!(lu_factorize(&mut a, 2, &mut ipvt), Some(2));
    }
}
