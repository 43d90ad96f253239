//! Exact minimization of the cubic model
//!
//! ```text
//! m(s) = g·s + ½ sᵀHs + (M/6)‖s‖³
//! ```
//!
//! A global minimizer satisfies `(H + λI)s = −g`, `‖s‖ = 2λ/M` with `H + λI`
//! positive semi-definite, so `λ ≥ λ₊ = max(0, −λ_min(H))`. The solver seeds
//! λ just above the floor, classifies the configuration from the first
//! factorized solve, and either returns immediately (interior solution),
//! builds the solution from the null eigenvector (hard case), or runs Newton's
//! method on the secular equation `φ(λ) = 1/‖s(λ)‖ − M/(2λ)`.
//!
//! The factorization offset δ follows the retry strategy of Gould, Lucidi,
//! Roma & Toint (1999, p. 516): every failed Cholesky doubles δ and restarts
//! from `λ₊ + δ`.

use crate::CubicRegError;
use crate::linalg::{
    SymmetricEigen, chol_decompose, chol_solve, forward_solve, largest_real_root,
    scaled_identity,
};
use ndarray::{Array1, Array2};

const EPS: f64 = f64::EPSILON;

/// Cholesky retries (each doubling δ) before a factorization failure is reported.
const MAX_SHIFT_DOUBLINGS: usize = 64;

/// Default tolerance on `|‖s‖ − 2λ/M|`.
pub const DEFAULT_KAPPA_EASY: f64 = 1e-4;

/// Default cap on Newton iterations for the secular equation.
pub const DEFAULT_MAX_SUBPROBLEM_ITERATIONS: usize = 500;

/// Which branch produced the step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubproblemCase {
    /// The first solve already satisfied the optimality conditions.
    Interior,
    /// The shifted Hessian is (numerically) singular at the floor and the step
    /// was completed along its null eigenvector.
    Hard,
    /// Newton's method on the secular equation converged.
    Newton,
}

/// Result of one subproblem solve.
#[derive(Debug, Clone)]
pub struct SubproblemStep {
    /// The minimizing step `s`; the trial point is `x + s`.
    pub step: Array1<f64>,
    /// The multiplier λ associated with the step.
    pub lambda: f64,
    /// The branch taken.
    pub case: SubproblemCase,
    /// Newton iterations spent on the secular equation.
    pub newton_iterations: usize,
}

// Factor of H + λI together with the step it produced. `lambda` is the shift
// actually used, which differs from the requested one after a retry.
struct ShiftedSolve {
    s: Array1<f64>,
    l: Array2<f64>,
    lambda: f64,
    delta: f64,
}

/// One cubic-model minimization for a fixed gradient, Hessian and weight.
///
/// # Example
///
/// ```
/// use cubic_reg::subproblem::{CubicSubproblem, SubproblemCase};
/// use ndarray::array;
///
/// let g = array![0.0, 0.6];
/// let h = array![[-1.0, 0.0], [0.0, 2.0]];
/// let out = CubicSubproblem::new(&g, &h, 1.0, 1.0).solve().unwrap();
/// assert_eq!(out.case, SubproblemCase::Hard);
/// let norm = out.step.dot(&out.step).sqrt();
/// assert!((norm - 2.0).abs() < 1e-4);
/// ```
pub struct CubicSubproblem<'p> {
    gradient: &'p Array1<f64>,
    hessian: &'p Array2<f64>,
    weight: f64,
    lambda_floor: f64,
    kappa_easy: f64,
    max_iterations: usize,
}

impl<'p> CubicSubproblem<'p> {
    /// Creates a solver for gradient `g`, Hessian `H`, weight `M > 0` and
    /// multiplier floor `λ₊ ≥ 0` (see [`crate::lambda_floor`]).
    pub fn new(
        gradient: &'p Array1<f64>,
        hessian: &'p Array2<f64>,
        weight: f64,
        lambda_floor: f64,
    ) -> Self {
        Self {
            gradient,
            hessian,
            weight,
            lambda_floor,
            kappa_easy: DEFAULT_KAPPA_EASY,
            max_iterations: DEFAULT_MAX_SUBPROBLEM_ITERATIONS,
        }
    }

    /// Sets the tolerance κ on `|‖s‖ − 2λ/M|` (default: 1e-4).
    pub fn with_kappa_easy(mut self, kappa_easy: f64) -> Self {
        self.kappa_easy = kappa_easy;
        self
    }

    /// Sets the Newton iteration cap for the secular equation (default: 500).
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    #[inline]
    fn radius(&self, lambda: f64) -> f64 {
        2.0 * lambda / self.weight
    }

    /// Factorizes `H + λI` and solves for `s`, retrying from `λ₊ + 2δ` while
    /// the shifted matrix is not numerically positive definite.
    fn compute_s(&self, lambda: f64, delta: f64) -> Result<ShiftedSolve, CubicRegError> {
        let n = self.gradient.len();
        let rhs = self.gradient.mapv(|v| -v);
        let mut lambda = lambda;
        let mut delta = delta;
        for retry in 0..=MAX_SHIFT_DOUBLINGS {
            let shifted = self.hessian + &scaled_identity(n, lambda);
            if let Some(l) = chol_decompose(&shifted) {
                let s = chol_solve(&l, &rhs);
                return Ok(ShiftedSolve {
                    s,
                    l,
                    lambda,
                    delta,
                });
            }
            log::debug!(
                "[ARC] Cholesky of H + {lambda:.3e} I failed (retry {retry}); doubling shift offset to {:.3e}",
                2.0 * delta
            );
            delta *= 2.0;
            lambda = self.lambda_floor + delta;
        }
        Err(CubicRegError::FactorizationFailed { lambda })
    }

    /// One Newton step on `φ(λ) = 1/‖s‖ − M/(2λ)`, kept strictly above the floor.
    fn update_lambda(&self, lambda: f64, s: &Array1<f64>, l: &Array2<f64>) -> f64 {
        let w = forward_solve(l, s);
        let norm_s = s.dot(s).sqrt();
        let phi = 1.0 / norm_s - self.weight / (2.0 * lambda);
        let phi_prime = w.dot(&w) / norm_s.powi(3) + self.weight / (2.0 * lambda * lambda);
        let next = lambda - phi / phi_prime;
        if next.is_finite() && next > self.lambda_floor {
            next
        } else {
            self.lambda_floor + 0.5 * (lambda - self.lambda_floor)
        }
    }

    /// Hard case: `s = s_cri + α u₀` where `s_cri = −(H + λ₊I)⁺ g` and α is the
    /// largest root of `‖s_cri + α u₀‖² = (2λ₊/M)²`.
    fn hard_case_step(&self) -> Result<Array1<f64>, CubicRegError> {
        let n = self.gradient.len();
        let shifted = self.hessian + &scaled_identity(n, self.lambda_floor);
        let eigen = SymmetricEigen::new(&shifted)?;
        let u0 = eigen.min_vector();
        let s_cri = -eigen.pinv_apply(self.gradient);
        let target = self.radius(self.lambda_floor);
        let alpha = largest_real_root(
            u0.dot(&u0),
            2.0 * u0.dot(&s_cri),
            s_cri.dot(&s_cri) - target * target,
        );
        Ok(s_cri + &(u0 * alpha))
    }

    /// Minimizes the cubic model.
    ///
    /// # Errors
    /// - [`CubicRegError::FactorizationFailed`] if `H + λI` stays indefinite
    ///   after every shift retry.
    /// - [`CubicRegError::Eigendecomposition`] if the hard case cannot
    ///   decompose the shifted Hessian.
    /// - [`CubicRegError::SubproblemNotConverged`] if the secular equation is
    ///   not solved to κ within the iteration cap.
    pub fn solve(&self) -> Result<SubproblemStep, CubicRegError> {
        let delta = (1.0 + self.lambda_floor) * EPS.sqrt();
        let lambda = if self.lambda_floor == 0.0 {
            0.0
        } else {
            self.lambda_floor + delta
        };
        let mut current = self.compute_s(lambda, delta)?;

        let norm_s = current.s.dot(&current.s).sqrt();
        let r = self.radius(current.lambda);
        if norm_s <= r {
            if current.lambda == 0.0 || norm_s == r {
                return Ok(SubproblemStep {
                    step: current.s,
                    lambda: current.lambda,
                    case: SubproblemCase::Interior,
                    newton_iterations: 0,
                });
            }
            log::debug!(
                "[ARC] Hard case: ||s||={norm_s:.3e} < r={r:.3e} at lambda={:.3e}",
                current.lambda
            );
            return Ok(SubproblemStep {
                step: self.hard_case_step()?,
                lambda: self.lambda_floor,
                case: SubproblemCase::Hard,
                newton_iterations: 0,
            });
        }

        if current.lambda == 0.0 {
            current = self.compute_s(current.delta, current.delta)?;
        }

        let mut iterations = 0;
        loop {
            let norm_s = current.s.dot(&current.s).sqrt();
            let residual = (norm_s - self.radius(current.lambda)).abs();
            if residual <= self.kappa_easy {
                log::debug!(
                    "[ARC] Secular equation solved: lambda={:.6e}, ||s||={norm_s:.3e}, iters={iterations}",
                    current.lambda
                );
                return Ok(SubproblemStep {
                    step: current.s,
                    lambda: current.lambda,
                    case: SubproblemCase::Newton,
                    newton_iterations: iterations,
                });
            }
            if iterations >= self.max_iterations {
                log::warn!(
                    "[ARC] Secular equation did not converge: lambda={:.6e}, residual={residual:.3e}",
                    current.lambda
                );
                return Err(CubicRegError::SubproblemNotConverged {
                    iterations,
                    lambda: current.lambda,
                    residual,
                });
            }
            let next = self.update_lambda(current.lambda, &current.s, &current.l);
            current = self.compute_s(next, current.delta)?;
            iterations += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use spectral::prelude::*;

    fn norm(v: &Array1<f64>) -> f64 {
        v.dot(v).sqrt()
    }

    // Stationarity of the cubic model: g + (H + (M/2)‖s‖ I) s = 0.
    fn model_gradient(
        g: &Array1<f64>,
        h: &Array2<f64>,
        weight: f64,
        s: &Array1<f64>,
    ) -> Array1<f64> {
        g + &h.dot(s) + &(s * (0.5 * weight * norm(s)))
    }

    fn model_value(g: &Array1<f64>, h: &Array2<f64>, weight: f64, s: &Array1<f64>) -> f64 {
        g.dot(s) + 0.5 * s.dot(&h.dot(s)) + weight / 6.0 * norm(s).powi(3)
    }

    #[test]
    fn test_zero_gradient_convex_returns_zero_step() {
        let g = array![0.0, 0.0];
        let h = array![[2.0, 0.0], [0.0, 3.0]];
        let out = CubicSubproblem::new(&g, &h, 1.0, 0.0).solve().unwrap();
        assert_eq!(out.case, SubproblemCase::Interior);
        assert_eq!(out.lambda, 0.0);
        assert_eq!(norm(&out.step), 0.0);
    }

    #[test]
    fn test_tiny_gradient_convex_step_matches_unregularized_newton() {
        let g = array![1e-6, -2e-6];
        let h = array![[4.0, 1.0], [1.0, 3.0]];
        let out = CubicSubproblem::new(&g, &h, 1.0, 0.0).solve().unwrap();
        // The λ = 0 solve overshoots the zero radius, so the shift moves to δ,
        // where the secular residual is already within κ.
        assert_eq!(out.case, SubproblemCase::Newton);
        assert_eq!(out.newton_iterations, 0);
        // -H^{-1} g with H^{-1} = 1/11 [[3,-1],[-1,4]]
        let newton = array![-(3.0 * 1e-6 + 2e-6) / 11.0, -(-1e-6 - 8e-6) / 11.0];
        assert_that!(&out.step[0]).is_close_to(newton[0], 1e-12);
        assert_that!(&out.step[1]).is_close_to(newton[1], 1e-12);
    }

    #[test]
    fn test_convex_regular_case_satisfies_optimality() {
        let g = array![2.0, 2.0];
        let h = array![[2.0, 0.0], [0.0, 2.0]];
        let weight = 1.0;
        let out = CubicSubproblem::new(&g, &h, weight, 0.0).solve().unwrap();
        assert_eq!(out.case, SubproblemCase::Newton);
        // lambda solves lambda^2 + 2 lambda - sqrt(2) = 0
        let expected = -1.0 + (1.0 + 2.0_f64.sqrt()).sqrt();
        assert_that!(&out.lambda).is_close_to(expected, 1e-4);
        let residual = (norm(&out.step) - 2.0 * out.lambda / weight).abs();
        assert_that!(&residual).is_less_than_or_equal_to(DEFAULT_KAPPA_EASY);
        let stationarity = model_gradient(&g, &h, weight, &out.step);
        assert_that!(&norm(&stationarity)).is_less_than(1e-3);
    }

    #[test]
    fn test_step_decreases_model_below_zero_step() {
        let g = array![1.0, -0.5, 0.25];
        let h = array![[1.0, 0.2, 0.0], [0.2, -0.5, 0.1], [0.0, 0.1, 2.0]];
        let floor = crate::lambda_floor(&h).unwrap();
        let weight = 3.0;
        let out = CubicSubproblem::new(&g, &h, weight, floor).solve().unwrap();
        assert!(out.lambda >= floor);
        let value = model_value(&g, &h, weight, &out.step);
        assert_that!(&value).is_less_than(0.0);
        let stationarity = model_gradient(&g, &h, weight, &out.step);
        assert_that!(&norm(&stationarity)).is_less_than(1e-2);
    }

    #[test]
    fn test_hard_case_hits_cubic_radius() {
        // g is orthogonal to the negative-curvature direction e1.
        let g = array![0.0, 0.6];
        let h = array![[-1.0, 0.0], [0.0, 2.0]];
        let weight = 1.0;
        let floor = crate::lambda_floor(&h).unwrap();
        assert_that!(&floor).is_close_to(1.0, 1e-12);
        let out = CubicSubproblem::new(&g, &h, weight, floor).solve().unwrap();
        assert_eq!(out.case, SubproblemCase::Hard);
        let radius = 2.0 * floor / weight;
        assert_that!(&norm(&out.step)).is_close_to(radius, DEFAULT_KAPPA_EASY);
        assert_that!(&out.step[1]).is_close_to(-0.2, 1e-10);
        assert_that!(&out.step[0].abs()).is_close_to(3.96_f64.sqrt(), 1e-8);
    }

    #[test]
    fn test_saddle_point_escapes_along_negative_curvature() {
        let g = array![0.0, 0.0];
        let h = array![[-2.0, 0.0], [0.0, 1.0]];
        let weight = 4.0;
        let out = CubicSubproblem::new(&g, &h, weight, 2.0).solve().unwrap();
        assert_eq!(out.case, SubproblemCase::Hard);
        assert_that!(&out.step[0].abs()).is_close_to(1.0, 1e-10);
        assert_that!(&out.step[1]).is_close_to(0.0, 1e-10);
    }

    #[test]
    fn test_understated_floor_recovers_through_shift_retries() {
        // True floor is 1.0; starting at 0.5 makes the first Cholesky fail.
        let g = array![1.0, 1.0];
        let h = array![[-1.0, 0.0], [0.0, 2.0]];
        let result = CubicSubproblem::new(&g, &h, 1.0, 0.5).solve();
        let out = result.unwrap();
        assert!(out.lambda > 1.0);
        let residual = (norm(&out.step) - 2.0 * out.lambda).abs();
        assert_that!(&residual).is_less_than_or_equal_to(DEFAULT_KAPPA_EASY);
    }

    #[test]
    fn test_exhausted_shift_retries_report_factorization_failure() {
        // An understated floor of 0 with λ_min = -1e30: every doubled shift
        // stays far below 1e30, so H + λI never factorizes.
        let g = array![1.0];
        let h = array![[-1e30]];
        let result = CubicSubproblem::new(&g, &h, 1.0, 0.0).solve();
        match result {
            Err(CubicRegError::FactorizationFailed { lambda }) => {
                assert_that!(&lambda).is_greater_than(0.0);
                assert_that!(&lambda).is_less_than(1e30);
            }
            other => panic!("Expected FactorizationFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_iteration_cap_reports_non_convergence() {
        let g = array![2.0, 2.0];
        let h = array![[2.0, 0.0], [0.0, 2.0]];
        let result = CubicSubproblem::new(&g, &h, 1.0, 0.0)
            .with_max_iterations(1)
            .solve();
        match result {
            Err(CubicRegError::SubproblemNotConverged { iterations, .. }) => {
                assert_eq!(iterations, 1);
            }
            other => panic!("Expected SubproblemNotConverged, got {:?}", other),
        }
    }

    #[test]
    fn test_tighter_kappa_tightens_residual() {
        let g = array![3.0, -1.0];
        let h = array![[1.0, 0.5], [0.5, 2.0]];
        let weight = 2.0;
        let out = CubicSubproblem::new(&g, &h, weight, 0.0)
            .with_kappa_easy(1e-10)
            .solve()
            .unwrap();
        let residual = (norm(&out.step) - 2.0 * out.lambda / weight).abs();
        assert_that!(&residual).is_less_than_or_equal_to(1e-10);
        let stationarity = model_gradient(&g, &h, weight, &out.step);
        assert_that!(&norm(&stationarity)).is_less_than(1e-8);
    }
}
