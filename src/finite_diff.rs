//! Central-difference fallbacks used when the caller omits the gradient or
//! the Hessian.
//!
//! Both stencils perturb one standard basis direction at a time by `±step`.
//! The Hessian is built column by column from the gradient and symmetrized
//! as `(J + J^T) / 2`, since the subproblem only ever reads its lower triangle.

use ndarray::{Array1, Array2};

/// Central-difference gradient of `f` at `x`.
pub(crate) fn central_gradient<F>(f: F, x: &Array1<f64>, step: f64) -> Array1<f64>
where
    F: Fn(&Array1<f64>) -> f64,
{
    let n = x.len();
    let mut grad = Array1::<f64>::zeros(n);
    let mut probe = x.clone();
    for i in 0..n {
        probe[i] = x[i] + step;
        let f_plus = f(&probe);
        probe[i] = x[i] - step;
        let f_minus = f(&probe);
        probe[i] = x[i];
        grad[i] = (f_plus - f_minus) / (2.0 * step);
    }
    grad
}

/// Central-difference Hessian from a fallible gradient callable, symmetrized.
pub(crate) fn central_hessian<G, E>(
    gradient: G,
    x: &Array1<f64>,
    step: f64,
) -> Result<Array2<f64>, E>
where
    G: Fn(&Array1<f64>) -> Result<Array1<f64>, E>,
{
    let n = x.len();
    let mut jac = Array2::<f64>::zeros((n, n));
    let mut probe = x.clone();
    for j in 0..n {
        probe[j] = x[j] + step;
        let g_plus = gradient(&probe)?;
        probe[j] = x[j] - step;
        let g_minus = gradient(&probe)?;
        probe[j] = x[j];
        for i in 0..n {
            jac[[i, j]] = (g_plus[i] - g_minus[i]) / (2.0 * step);
        }
    }
    Ok(symmetrize(jac))
}

fn symmetrize(mut m: Array2<f64>) -> Array2<f64> {
    let n = m.nrows();
    for i in 0..n {
        for j in (i + 1)..n {
            let avg = 0.5 * (m[[i, j]] + m[[j, i]]);
            m[[i, j]] = avg;
            m[[j, i]] = avg;
        }
    }
    m
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use spectral::prelude::*;
    use std::convert::Infallible;

    fn mixed(x: &Array1<f64>) -> f64 {
        x[0].powi(2) + 3.0 * x[0] * x[1] + x[1].powi(3)
    }

    fn mixed_grad(x: &Array1<f64>) -> Array1<f64> {
        array![2.0 * x[0] + 3.0 * x[1], 3.0 * x[0] + 3.0 * x[1].powi(2)]
    }

    #[test]
    fn test_central_gradient_matches_analytic() {
        let x = array![1.0, 2.0];
        let g = central_gradient(mixed, &x, 1e-6);
        assert_that!(&g[0]).is_close_to(8.0, 1e-6);
        assert_that!(&g[1]).is_close_to(15.0, 1e-6);
    }

    #[test]
    fn test_central_hessian_matches_analytic() {
        let x = array![1.0, 2.0];
        let exact = |p: &Array1<f64>| Ok::<_, Infallible>(mixed_grad(p));
        let h = central_hessian(exact, &x, 1e-5).unwrap();
        assert_that!(&h[[0, 0]]).is_close_to(2.0, 1e-6);
        assert_that!(&h[[0, 1]]).is_close_to(3.0, 1e-6);
        assert_that!(&h[[1, 0]]).is_close_to(3.0, 1e-6);
        assert_that!(&h[[1, 1]]).is_close_to(12.0, 1e-6);
    }

    #[test]
    fn test_central_hessian_is_symmetric_for_nonsymmetric_jacobian() {
        // Not a gradient field: the raw Jacobian is [[0, 1], [0, 0]].
        let field = |x: &Array1<f64>| Ok::<_, Infallible>(array![x[1], 0.0]);
        let h = central_hessian(field, &array![0.3, -0.7], 1e-4).unwrap();
        assert_eq!(h[[0, 1]], h[[1, 0]]);
        assert_that!(&h[[0, 1]]).is_close_to(0.5, 1e-9);
    }

    #[test]
    fn test_nested_differences_recover_quadratic_hessian() {
        let quad = |x: &Array1<f64>| 1.5 * x[0] * x[0] + x[0] * x[1] + x[1] * x[1];
        let x = array![0.4, -1.1];
        let h = central_hessian(
            |p: &Array1<f64>| Ok::<_, Infallible>(central_gradient(quad, p, 1e-8)),
            &x,
            1e-4,
        )
        .unwrap();
        assert_that!(&h[[0, 0]]).is_close_to(3.0, 1e-3);
        assert_that!(&h[[0, 1]]).is_close_to(1.0, 1e-3);
        assert_that!(&h[[1, 1]]).is_close_to(2.0, 1e-3);
    }
}
