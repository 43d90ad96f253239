//! Dense linear algebra for the cubic subproblem.
//!
//! Small problems only: the Cholesky factor and triangular solves are written
//! directly against `ndarray`, while the symmetric eigendecomposition is
//! delegated to `faer` through a copy into a `faer::Mat`.

use crate::CubicRegError;
use faer::diag::DiagRef;
use faer::{Mat, MatRef, Side};
use ndarray::{Array1, Array2};

const EPS: f64 = f64::EPSILON;

// Eigenvalues below `PINV_RCOND_SCALE * n * EPS * max|lambda|` are treated as zero
// when applying the pseudo-inverse.
const PINV_RCOND_SCALE: f64 = 1e3;

/// Dense lower Cholesky factor `A = L L^T`. Returns `None` when `A` is not
/// numerically positive definite.
pub(crate) fn chol_decompose(a: &Array2<f64>) -> Option<Array2<f64>> {
    let n = a.nrows();
    if a.ncols() != n {
        return None;
    }
    let mut l = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[[i, j]];
            for k in 0..j {
                sum -= l[[i, k]] * l[[j, k]];
            }
            if i == j {
                if sum <= 0.0 || !sum.is_finite() {
                    return None;
                }
                l[[i, j]] = sum.sqrt();
            } else {
                l[[i, j]] = sum / l[[j, j]];
            }
        }
    }
    Some(l)
}

/// Solves `L y = b` for lower-triangular `L`.
pub(crate) fn forward_solve(l: &Array2<f64>, b: &Array1<f64>) -> Array1<f64> {
    let n = l.nrows();
    let mut y = Array1::<f64>::zeros(n);
    for i in 0..n {
        let mut sum = b[i];
        for k in 0..i {
            sum -= l[[i, k]] * y[k];
        }
        y[i] = sum / l[[i, i]];
    }
    y
}

/// Solves `L L^T x = b` given the lower Cholesky factor.
pub(crate) fn chol_solve(l: &Array2<f64>, b: &Array1<f64>) -> Array1<f64> {
    let n = l.nrows();
    let y = forward_solve(l, b);
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let mut sum = y[i];
        for k in (i + 1)..n {
            sum -= l[[k, i]] * x[k];
        }
        x[i] = sum / l[[i, i]];
    }
    x
}

/// `lambda * I_n`
pub(crate) fn scaled_identity(n: usize, lambda: f64) -> Array2<f64> {
    Array2::<f64>::eye(n) * lambda
}

fn mat_to_array(mat: MatRef<'_, f64>) -> Array2<f64> {
    let mut out = Array2::<f64>::zeros((mat.nrows(), mat.ncols()));
    for j in 0..mat.ncols() {
        for i in 0..mat.nrows() {
            out[[i, j]] = mat[(i, j)];
        }
    }
    out
}

fn diag_to_array(diag: DiagRef<'_, f64>) -> Array1<f64> {
    let mat = diag.column_vector().as_mat();
    let mut out = Array1::<f64>::zeros(mat.nrows());
    for i in 0..mat.nrows() {
        out[i] = mat[(i, 0)];
    }
    out
}

/// Eigendecomposition `A = U diag(values) U^T` of a symmetric matrix.
pub(crate) struct SymmetricEigen {
    pub(crate) values: Array1<f64>,
    pub(crate) vectors: Array2<f64>,
}

impl SymmetricEigen {
    /// Decomposes `a`, reading only its lower triangle.
    pub(crate) fn new(a: &Array2<f64>) -> Result<Self, CubicRegError> {
        let mat = Mat::<f64>::from_fn(a.nrows(), a.ncols(), |i, j| a[[i, j]]);
        let eigen = mat
            .as_ref()
            .self_adjoint_eigen(Side::Lower)
            .map_err(CubicRegError::Eigendecomposition)?;
        Ok(Self {
            values: diag_to_array(eigen.S()),
            vectors: mat_to_array(eigen.U()),
        })
    }

    fn min_index(&self) -> usize {
        let mut best = 0;
        for (i, &v) in self.values.iter().enumerate() {
            if v < self.values[best] {
                best = i;
            }
        }
        best
    }

    pub(crate) fn min_value(&self) -> f64 {
        self.values[self.min_index()]
    }

    /// Unit eigenvector of the smallest eigenvalue.
    pub(crate) fn min_vector(&self) -> Array1<f64> {
        self.vectors.column(self.min_index()).to_owned()
    }

    /// Applies the Moore-Penrose pseudo-inverse of the decomposed matrix to `rhs`.
    pub(crate) fn pinv_apply(&self, rhs: &Array1<f64>) -> Array1<f64> {
        let n = self.values.len();
        let max_abs = self.values.iter().fold(0.0, |acc: f64, v| acc.max(v.abs()));
        let cutoff = PINV_RCOND_SCALE * (n as f64) * EPS * max_abs;
        let mut coeffs = self.vectors.t().dot(rhs);
        for (c, &v) in coeffs.iter_mut().zip(self.values.iter()) {
            if v.abs() > cutoff {
                *c /= v;
            } else {
                *c = 0.0;
            }
        }
        self.vectors.dot(&coeffs)
    }
}

/// Lower bound for the subproblem multiplier: `max(0, -lambda_min(H))`.
///
/// The Hessian is assumed symmetric; only its lower triangle is read.
///
/// ```
/// use cubic_reg::lambda_floor;
/// use ndarray::array;
///
/// let h = array![[-1.0, 0.0], [0.0, 2.0]];
/// assert!((lambda_floor(&h).unwrap() - 1.0).abs() < 1e-12);
/// ```
pub fn lambda_floor(hessian: &Array2<f64>) -> Result<f64, CubicRegError> {
    let eigen = SymmetricEigen::new(hessian)?;
    Ok((-eigen.min_value()).max(0.0))
}

/// Operator 2-norm of the symmetric part of `a`.
pub(crate) fn spectral_norm(a: &Array2<f64>) -> Result<f64, CubicRegError> {
    let sym = (a + &a.t()) * 0.5;
    let eigen = SymmetricEigen::new(&sym)?;
    Ok(eigen.values.iter().fold(0.0, |acc: f64, v| acc.max(v.abs())))
}

/// Largest real root of `a t^2 + b t + c = 0`.
///
/// A negative discriminant is clamped to zero, which yields the vertex of the
/// parabola. A vanishing leading coefficient falls back to the linear root.
pub(crate) fn largest_real_root(a: f64, b: f64, c: f64) -> f64 {
    if a == 0.0 {
        return if b == 0.0 { 0.0 } else { -c / b };
    }
    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        log::debug!("[ARC] Negative discriminant {disc:.3e} clamped to zero");
        return -b / (2.0 * a);
    }
    let q = -0.5 * (b + b.signum() * disc.sqrt());
    if q == 0.0 {
        return 0.0;
    }
    let r1 = q / a;
    let r2 = c / q;
    r1.max(r2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use spectral::prelude::*;

    #[test]
    fn test_cholesky_solve_matches_direct_solution() {
        let a = array![[4.0, 1.0], [1.0, 3.0]];
        let b = array![1.0, 2.0];
        let l = chol_decompose(&a).unwrap();
        let x = chol_solve(&l, &b);
        // Inverse of [[4,1],[1,3]] is 1/11 [[3,-1],[-1,4]]
        assert_that!(&x[0]).is_close_to(1.0 / 11.0, 1e-12);
        assert_that!(&x[1]).is_close_to(7.0 / 11.0, 1e-12);
        let recon = l.dot(&l.t());
        for (got, want) in recon.iter().zip(a.iter()) {
            assert_that!(*got).is_close_to(*want, 1e-12);
        }
    }

    #[test]
    fn test_cholesky_rejects_indefinite_matrix() {
        let a = array![[-1.0, 0.0], [0.0, 2.0]];
        assert!(chol_decompose(&a).is_none());
        let singular = array![[1.0, 1.0], [1.0, 1.0]];
        assert!(chol_decompose(&singular).is_none());
    }

    #[test]
    fn test_forward_solve_gives_weighted_norm() {
        // ||L^{-1} s||^2 == s^T (L L^T)^{-1} s
        let a = array![[5.0, 2.0], [2.0, 2.0]];
        let s = array![1.0, -1.0];
        let l = chol_decompose(&a).unwrap();
        let w = forward_solve(&l, &s);
        let direct = s.dot(&chol_solve(&l, &s));
        let weighted = w.dot(&w);
        assert_that!(&weighted).is_close_to(direct, 1e-12);
    }

    #[test]
    fn test_lambda_floor_values() {
        let indefinite = lambda_floor(&array![[-3.0, 0.0], [0.0, 1.0]]).unwrap();
        assert_that!(&indefinite).is_close_to(3.0, 1e-12);
        let convex = lambda_floor(&array![[1.0, 0.0], [0.0, 2.0]]).unwrap();
        assert_eq!(convex, 0.0);
        let saddle = lambda_floor(&array![[0.0, 2.0], [2.0, 0.0]]).unwrap();
        assert_that!(&saddle).is_close_to(2.0, 1e-12);
        assert!(lambda_floor(&array![[7.0]]).unwrap() >= 0.0);
    }

    #[test]
    fn test_min_eigenvector_is_unit_and_satisfies_equation() {
        let a = array![[2.0, 1.0, 0.0], [1.0, 2.0, 1.0], [0.0, 1.0, 2.0]];
        let eigen = SymmetricEigen::new(&a).unwrap();
        let value = eigen.min_value();
        let vector = eigen.min_vector();
        assert_that!(&value).is_close_to(2.0 - 2.0_f64.sqrt(), 1e-10);
        let unit = vector.dot(&vector);
        assert_that!(&unit).is_close_to(1.0, 1e-12);
        let residual = a.dot(&vector) - &vector * value;
        let residual_norm = residual.dot(&residual).sqrt();
        assert_that!(&residual_norm).is_less_than(1e-10);
    }

    #[test]
    fn test_spectral_norm_of_symmetric_matrix() {
        let a = array![[1.0, 0.0], [0.0, -4.0]];
        let norm = spectral_norm(&a).unwrap();
        assert_that!(&norm).is_close_to(4.0, 1e-12);
    }

    #[test]
    fn test_pinv_apply_ignores_null_direction() {
        let eigen = SymmetricEigen::new(&array![[0.0, 0.0], [0.0, 3.0]]).unwrap();
        let x = eigen.pinv_apply(&array![5.0, 6.0]);
        assert_that!(&x[0]).is_close_to(0.0, 1e-12);
        assert_that!(&x[1]).is_close_to(2.0, 1e-12);
    }

    #[test]
    fn test_largest_real_root() {
        // (t - 2)(t + 3) = t^2 + t - 6
        assert_that!(&largest_real_root(1.0, 1.0, -6.0)).is_close_to(2.0, 1e-12);
        // (t + 1)(t + 4) = t^2 + 5t + 4
        assert_that!(&largest_real_root(1.0, 5.0, 4.0)).is_close_to(-1.0, 1e-12);
        // No real roots: vertex at -b / 2a
        assert_that!(&largest_real_root(1.0, -2.0, 5.0)).is_close_to(1.0, 1e-12);
        assert_that!(&largest_real_root(0.0, 2.0, -4.0)).is_close_to(2.0, 1e-12);
    }
}
