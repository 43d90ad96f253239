//! An implementation of Adaptive Regularization with Cubics (ARC).
//!
//! Each outer iteration minimizes the cubic-regularized second-order model
//!
//! ```text
//! m(s) = f(x) + g·s + ½ sᵀHs + (M/6)‖s‖³
//! ```
//!
//! exactly (to a tolerance) instead of taking a plain Newton step, following
//! Nesterov & Polyak's cubic regularization of Newton's method and the
//! secular-equation machinery of Gould, Lucidi, Roma & Toint.
//!
//! # Features
//! - Exact subproblem solver with regular, interior and hard-case handling,
//!   Cholesky with shift-doubling fallback, and a bounded Newton iteration on the
//!   secular equation (see [`subproblem`]).
//! - Fixed regularization weight `L`, or an adaptive weight that doubles until the
//!   objective does not increase and halves afterwards, never below `L0`.
//! - `L0` estimated from the Hessian variation along the all-ones direction when
//!   not supplied.
//! - Central finite-difference gradient and Hessian when only an objective is
//!   provided.
//! - Clear builder API, validated at [`CubicReg::build`], with informative errors.
//!
//! ## Defaults
//! - κ (secular-equation tolerance) `1e-4`; convergence tolerance on `‖∇f‖²`
//!   `1e-6`; `1000` outer iterations; finite-difference step `√ε`.
//! - `500` Newton iterations per subproblem; `64` weight doublings per
//!   adaptive search.
//!
//! # Example
//!
//! ```
//! use cubic_reg::{CubicReg, Termination};
//! use ndarray::{Array1, Array2, array};
//!
//! let solution = CubicReg::new(array![1.0, 1.0])
//!     .with_objective(|x: &Array1<f64>| x.dot(x))
//!     .with_gradient(|x: &Array1<f64>| x * 2.0)
//!     .with_hessian(|x: &Array1<f64>| Array2::<f64>::eye(x.len()) * 2.0)
//!     .with_lipschitz(1.0)
//!     .with_tolerance(1e-6)
//!     .run()
//!     .expect("ARC failed to solve");
//!
//! assert_eq!(solution.termination, Termination::Converged);
//! assert!(solution.final_point.iter().all(|v| v.abs() < 1e-3));
//! // The starting point is the first recorded iterate.
//! assert_eq!(solution.iterates[0], array![1.0, 1.0]);
//! ```

mod finite_diff;
mod linalg;
pub mod subproblem;

pub use linalg::lambda_floor;
pub use subproblem::{CubicSubproblem, SubproblemCase, SubproblemStep};

use finite_diff::{central_gradient, central_hessian};
use linalg::spectral_norm;
use ndarray::{Array1, Array2};
use std::cell::Cell;
use subproblem::{DEFAULT_KAPPA_EASY, DEFAULT_MAX_SUBPROBLEM_ITERATIONS};

/// Objective callable `ℝⁿ → ℝ`.
pub type ObjectiveFn<'a> = Box<dyn Fn(&Array1<f64>) -> f64 + 'a>;
/// Gradient callable `ℝⁿ → ℝⁿ`.
pub type GradientFn<'a> = Box<dyn Fn(&Array1<f64>) -> Array1<f64> + 'a>;
/// Hessian callable `ℝⁿ → ℝⁿˣⁿ`, assumed symmetric.
pub type HessianFn<'a> = Box<dyn Fn(&Array1<f64>) -> Array2<f64> + 'a>;

/// An error type for clear diagnostics.
#[derive(Debug, thiserror::Error)]
pub enum CubicRegError {
    #[error("The starting point must have at least one coordinate.")]
    EmptyStartingPoint,
    #[error("The starting point contains NaN or infinite coordinates.")]
    NonFiniteStartingPoint,
    #[error("You must specify an objective and/or each of the following: gradient, Hessian and a fixed weight L.")]
    MissingCallables,
    #[error("Configuration value `{name}` must be finite and strictly positive, got {value}.")]
    NonPositiveParameter { name: &'static str, value: f64 },
    #[error("Iteration cap `{name}` must be at least 1.")]
    ZeroIterationCap { name: &'static str },
    #[error("The gradient returned {found} entries, expected {expected}.")]
    GradientDimMismatch { expected: usize, found: usize },
    #[error("The Hessian returned a {rows}x{cols} matrix, expected {expected}x{expected}.")]
    HessianDimMismatch {
        expected: usize,
        rows: usize,
        cols: usize,
    },
    #[error("The {what} evaluated to NaN or infinity, indicating numerical instability.")]
    NonFiniteEvaluation { what: &'static str },
    #[error("H + lambda*I stayed indefinite after every shift retry (last lambda = {lambda:e}).")]
    FactorizationFailed { lambda: f64 },
    #[error("Symmetric eigendecomposition failed: {0:?}")]
    Eigendecomposition(faer::linalg::solvers::EvdError),
    #[error(
        "The secular equation did not converge after {iterations} Newton iterations (lambda = {lambda:e}, residual = {residual:e})."
    )]
    SubproblemNotConverged {
        iterations: usize,
        lambda: f64,
        residual: f64,
    },
    #[error(
        "No regularization weight up to {weight:e} ({doublings} doublings) produced a non-increasing objective value."
    )]
    WeightSearchFailed { doublings: usize, weight: f64 },
}

/// Why the outer loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// `‖∇f(x)‖² ≤ tolerance` at the final point.
    Converged,
    /// The iteration cap was reached; the last iterate is returned.
    Exhausted,
}

/// How the regularization weight `M` is chosen each iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WeightPolicy {
    /// The same weight `L` for every subproblem.
    Fixed(f64),
    /// Doubling/halving search bounded below by `floor` (`L0`).
    Adaptive { floor: f64 },
}

/// A summary of an optimization run.
///
/// Reaching the iteration cap is reported through [`Termination::Exhausted`],
/// not as an error.
#[derive(Debug, Clone)]
pub struct CubicRegSolution {
    /// The last iterate.
    pub final_point: Array1<f64>,
    /// Every iterate visited, starting with the initial point.
    pub iterates: Vec<Array1<f64>>,
    /// The objective at the final point, when an objective was supplied.
    pub final_value: Option<f64>,
    /// The norm of the gradient at the final point.
    pub final_gradient_norm: f64,
    /// The number of outer iterations performed.
    pub iterations: usize,
    /// The regularization weight that the next iteration would have started from.
    pub final_weight: f64,
    pub termination: Termination,
    /// Objective evaluations, including those made by finite differences.
    pub func_evals: usize,
    /// Gradient evaluations, including those made by finite differences.
    pub grad_evals: usize,
    pub hess_evals: usize,
    pub subproblem_solves: usize,
}

// Dispatches derivative requests to the caller's callables or to the
// finite-difference fallbacks, counting evaluations.
struct Oracle<'a> {
    objective: Option<ObjectiveFn<'a>>,
    gradient: Option<GradientFn<'a>>,
    hessian: Option<HessianFn<'a>>,
    fd_step: f64,
    func_evals: Cell<usize>,
    grad_evals: Cell<usize>,
    hess_evals: Cell<usize>,
}

impl<'a> Oracle<'a> {
    fn has_objective(&self) -> bool {
        self.objective.is_some()
    }

    fn reset_counters(&self) {
        self.func_evals.set(0);
        self.grad_evals.set(0);
        self.hess_evals.set(0);
    }

    fn value(&self, x: &Array1<f64>) -> Result<f64, CubicRegError> {
        let f = self
            .objective
            .as_ref()
            .ok_or(CubicRegError::MissingCallables)?;
        self.func_evals.set(self.func_evals.get() + 1);
        Ok(f(x))
    }

    fn gradient(&self, x: &Array1<f64>) -> Result<Array1<f64>, CubicRegError> {
        self.grad_evals.set(self.grad_evals.get() + 1);
        if let Some(g) = &self.gradient {
            return Ok(g(x));
        }
        let f = self
            .objective
            .as_ref()
            .ok_or(CubicRegError::MissingCallables)?;
        let counted = |p: &Array1<f64>| {
            self.func_evals.set(self.func_evals.get() + 1);
            f(p)
        };
        Ok(central_gradient(counted, x, self.fd_step))
    }

    fn hessian(&self, x: &Array1<f64>) -> Result<Array2<f64>, CubicRegError> {
        self.hess_evals.set(self.hess_evals.get() + 1);
        if let Some(h) = &self.hessian {
            return Ok(h(x));
        }
        // Differencing an already differenced gradient needs a wider stencil.
        let step = if self.gradient.is_some() {
            self.fd_step
        } else {
            self.fd_step.sqrt()
        };
        central_hessian(|p: &Array1<f64>| self.gradient(p), x, step)
    }
}

fn require_positive(name: &'static str, value: f64) -> Result<(), CubicRegError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(CubicRegError::NonPositiveParameter { name, value })
    }
}

fn require_cap(name: &'static str, value: usize) -> Result<(), CubicRegError> {
    if value == 0 {
        Err(CubicRegError::ZeroIterationCap { name })
    } else {
        Ok(())
    }
}

fn check_gradient(g: &Array1<f64>, n: usize) -> Result<(), CubicRegError> {
    if g.len() != n {
        return Err(CubicRegError::GradientDimMismatch {
            expected: n,
            found: g.len(),
        });
    }
    if !g.iter().all(|v| v.is_finite()) {
        return Err(CubicRegError::NonFiniteEvaluation { what: "gradient" });
    }
    Ok(())
}

fn check_hessian(h: &Array2<f64>, n: usize) -> Result<(), CubicRegError> {
    if h.nrows() != n || h.ncols() != n {
        return Err(CubicRegError::HessianDimMismatch {
            expected: n,
            rows: h.nrows(),
            cols: h.ncols(),
        });
    }
    if !h.iter().all(|v| v.is_finite()) {
        return Err(CubicRegError::NonFiniteEvaluation { what: "Hessian" });
    }
    Ok(())
}

/// A configurable ARC solver. Validated into a [`CubicRegularization`] by
/// [`CubicReg::build`].
pub struct CubicReg<'a> {
    x0: Array1<f64>,
    objective: Option<ObjectiveFn<'a>>,
    gradient: Option<GradientFn<'a>>,
    hessian: Option<HessianFn<'a>>,
    lipschitz: Option<f64>,
    initial_weight: Option<f64>,
    kappa_easy: f64,
    max_iterations: usize,
    tolerance: f64,
    fd_step: f64,
    max_subproblem_iterations: usize,
    max_weight_doublings: usize,
}

impl<'a> CubicReg<'a> {
    /// Creates a new solver starting from `x0`.
    pub fn new(x0: Array1<f64>) -> Self {
        Self {
            x0,
            objective: None,
            gradient: None,
            hessian: None,
            lipschitz: None,
            initial_weight: None,
            kappa_easy: DEFAULT_KAPPA_EASY,
            max_iterations: 1000,
            tolerance: 1e-6,
            fd_step: f64::EPSILON.sqrt(),
            max_subproblem_iterations: DEFAULT_MAX_SUBPROBLEM_ITERATIONS,
            max_weight_doublings: 64,
        }
    }

    /// Sets the objective. Required unless a gradient, a Hessian and a fixed
    /// weight are all supplied.
    pub fn with_objective<F>(mut self, objective: F) -> Self
    where
        F: Fn(&Array1<f64>) -> f64 + 'a,
    {
        self.objective = Some(Box::new(objective));
        self
    }

    /// Sets the gradient. Without it, central differences of the objective are used.
    pub fn with_gradient<G>(mut self, gradient: G) -> Self
    where
        G: Fn(&Array1<f64>) -> Array1<f64> + 'a,
    {
        self.gradient = Some(Box::new(gradient));
        self
    }

    /// Sets the Hessian. Without it, central differences of the gradient are used.
    pub fn with_hessian<H>(mut self, hessian: H) -> Self
    where
        H: Fn(&Array1<f64>) -> Array2<f64> + 'a,
    {
        self.hessian = Some(Box::new(hessian));
        self
    }

    /// Fixes the regularization weight `M = L` for every iteration, typically
    /// the Lipschitz constant of the Hessian. Disables the adaptive search.
    pub fn with_lipschitz(mut self, lipschitz: f64) -> Self {
        self.lipschitz = Some(lipschitz);
        self
    }

    /// Sets `L0`, the seed and lower bound of the adaptive weight. When
    /// omitted it is estimated from the Hessian at `x0` and `x0 + 1`.
    pub fn with_initial_weight(mut self, initial_weight: f64) -> Self {
        self.initial_weight = Some(initial_weight);
        self
    }

    /// Sets the subproblem tolerance κ on `|‖s‖ − 2λ/M|` (default: 1e-4).
    pub fn with_kappa_easy(mut self, kappa_easy: f64) -> Self {
        self.kappa_easy = kappa_easy;
        self
    }

    /// Sets the maximum number of outer iterations (default: 1000).
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Sets the convergence tolerance on `‖∇f‖²` (default: 1e-6).
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Sets the finite-difference step `h` (default: `√ε`).
    ///
    /// The gradient fallback and a Hessian differenced from an analytic gradient
    /// use `±h`. When both derivatives are differenced, the Hessian stencil
    /// widens to `±√h` so that it does not amplify the gradient's rounding error.
    pub fn with_fd_step(mut self, fd_step: f64) -> Self {
        self.fd_step = fd_step;
        self
    }

    /// Caps the Newton iterations spent on each secular equation (default: 500).
    pub fn with_max_subproblem_iterations(mut self, max_subproblem_iterations: usize) -> Self {
        self.max_subproblem_iterations = max_subproblem_iterations;
        self
    }

    /// Caps the weight doublings of one adaptive search (default: 64).
    pub fn with_max_weight_doublings(mut self, max_weight_doublings: usize) -> Self {
        self.max_weight_doublings = max_weight_doublings;
        self
    }

    /// Validates the configuration and probes the callables at `x0`.
    ///
    /// # Errors
    /// Any configuration error of [`CubicRegError`]: an empty or non-finite
    /// starting point, a missing objective when `L` or a derivative is absent,
    /// non-positive constants, zero iteration caps, or callables whose output
    /// at `x0` has the wrong shape or is not finite.
    pub fn build(self) -> Result<CubicRegularization<'a>, CubicRegError> {
        let n = self.x0.len();
        if n == 0 {
            return Err(CubicRegError::EmptyStartingPoint);
        }
        if !self.x0.iter().all(|v| v.is_finite()) {
            return Err(CubicRegError::NonFiniteStartingPoint);
        }
        let analytic_only =
            self.gradient.is_some() && self.hessian.is_some() && self.lipschitz.is_some();
        if self.objective.is_none() && !analytic_only {
            return Err(CubicRegError::MissingCallables);
        }
        if let Some(l) = self.lipschitz {
            require_positive("L", l)?;
        }
        if let Some(l0) = self.initial_weight {
            require_positive("L0", l0)?;
        }
        require_positive("kappa_easy", self.kappa_easy)?;
        require_positive("tolerance", self.tolerance)?;
        require_positive("fd_step", self.fd_step)?;
        require_cap("max_iterations", self.max_iterations)?;
        require_cap("max_subproblem_iterations", self.max_subproblem_iterations)?;
        require_cap("max_weight_doublings", self.max_weight_doublings)?;

        let oracle = Oracle {
            objective: self.objective,
            gradient: self.gradient,
            hessian: self.hessian,
            fd_step: self.fd_step,
            func_evals: Cell::new(0),
            grad_evals: Cell::new(0),
            hess_evals: Cell::new(0),
        };
        if oracle.has_objective() && !oracle.value(&self.x0)?.is_finite() {
            return Err(CubicRegError::NonFiniteEvaluation { what: "objective" });
        }
        check_gradient(&oracle.gradient(&self.x0)?, n)?;
        let h0 = oracle.hessian(&self.x0)?;
        check_hessian(&h0, n)?;

        let policy = match (self.lipschitz, self.initial_weight) {
            (Some(l), _) => WeightPolicy::Fixed(l),
            (None, Some(l0)) => WeightPolicy::Adaptive { floor: l0 },
            (None, None) => {
                let floor = estimate_initial_weight(&oracle, &self.x0, &h0)?;
                log::info!("[ARC] Estimated initial weight L0={floor:.6e}");
                WeightPolicy::Adaptive { floor }
            }
        };

        Ok(CubicRegularization {
            x0: self.x0,
            oracle,
            policy,
            kappa_easy: self.kappa_easy,
            max_iterations: self.max_iterations,
            tolerance: self.tolerance,
            max_subproblem_iterations: self.max_subproblem_iterations,
            max_weight_doublings: self.max_weight_doublings,
        })
    }

    /// Validates and runs in one call.
    pub fn run(self) -> Result<CubicRegSolution, CubicRegError> {
        self.build()?.minimize()
    }
}

// L0 = ‖H(x0) − H(x0 + 1)‖₂ / ‖1‖₂ + fd_step, a local Lipschitz estimate for the
// Hessian along the all-ones direction.
fn estimate_initial_weight(
    oracle: &Oracle<'_>,
    x0: &Array1<f64>,
    h0: &Array2<f64>,
) -> Result<f64, CubicRegError> {
    let n = x0.len();
    let shifted = x0 + &Array1::<f64>::ones(n);
    let h1 = oracle.hessian(&shifted)?;
    check_hessian(&h1, n)?;
    let variation = spectral_norm(&(h0 - &h1))?;
    let floor = variation / (n as f64).sqrt() + oracle.fd_step;
    require_positive("L0", floor)?;
    Ok(floor)
}

// Everything the next outer iteration needs, evaluated at `point`.
struct IterationState {
    point: Array1<f64>,
    value: Option<f64>,
    gradient: Array1<f64>,
    hessian: Array2<f64>,
    weight: f64,
    lambda_floor: f64,
}

/// A validated ARC run, produced by [`CubicReg::build`].
pub struct CubicRegularization<'a> {
    x0: Array1<f64>,
    oracle: Oracle<'a>,
    policy: WeightPolicy,
    kappa_easy: f64,
    max_iterations: usize,
    tolerance: f64,
    max_subproblem_iterations: usize,
    max_weight_doublings: usize,
}

impl<'a> CubicRegularization<'a> {
    /// The weight policy in effect, including an estimated `L0`.
    pub fn weight_policy(&self) -> WeightPolicy {
        self.policy
    }

    /// `‖∇f(point)‖² ≤ tolerance`.
    pub fn is_converged(&self, point: &Array1<f64>) -> Result<bool, CubicRegError> {
        let g = self.oracle.gradient(point)?;
        Ok(self.meets_tolerance(&g))
    }

    fn meets_tolerance(&self, gradient: &Array1<f64>) -> bool {
        gradient.dot(gradient) <= self.tolerance
    }

    fn evaluate(
        &self,
        point: Array1<f64>,
        value: Option<f64>,
        weight: f64,
    ) -> Result<IterationState, CubicRegError> {
        let n = point.len();
        let gradient = self.oracle.gradient(&point)?;
        check_gradient(&gradient, n)?;
        let hessian = self.oracle.hessian(&point)?;
        check_hessian(&hessian, n)?;
        let lambda_floor = lambda_floor(&hessian)?;
        Ok(IterationState {
            point,
            value,
            gradient,
            hessian,
            weight,
            lambda_floor,
        })
    }

    fn solve_subproblem(
        &self,
        state: &IterationState,
        weight: f64,
    ) -> Result<SubproblemStep, CubicRegError> {
        CubicSubproblem::new(&state.gradient, &state.hessian, weight, state.lambda_floor)
            .with_kappa_easy(self.kappa_easy)
            .with_max_iterations(self.max_subproblem_iterations)
            .solve()
    }

    // Doubles the weight until f(x + s) <= f(x), then hands max(M/2, L0) to the
    // next iteration.
    fn search_weight(
        &self,
        state: &IterationState,
        floor: f64,
        solves: &mut usize,
    ) -> Result<(Array1<f64>, f64, f64), CubicRegError> {
        let f_old = match state.value {
            Some(v) => v,
            None => self.oracle.value(&state.point)?,
        };
        let mut weight = state.weight;
        for doubling in 1..=self.max_weight_doublings {
            weight *= 2.0;
            let step = self.solve_subproblem(state, weight)?;
            *solves += 1;
            let trial = &state.point + &step.step;
            let f_trial = self.oracle.value(&trial)?;
            if f_trial <= f_old {
                log::debug!(
                    "[ARC] Weight M={weight:.3e} accepted after {doubling} doubling(s) via {:?}: f {f_old:.6e} -> {f_trial:.6e}",
                    step.case
                );
                return Ok((trial, f_trial, (0.5 * weight).max(floor)));
            }
        }
        log::warn!(
            "[ARC] Adaptive weight search exhausted {} doublings at M={weight:.3e}",
            self.max_weight_doublings
        );
        Err(CubicRegError::WeightSearchFailed {
            doublings: self.max_weight_doublings,
            weight,
        })
    }

    fn advance(
        &self,
        state: IterationState,
        solves: &mut usize,
    ) -> Result<IterationState, CubicRegError> {
        match self.policy {
            WeightPolicy::Fixed(weight) => {
                let step = self.solve_subproblem(&state, weight)?;
                *solves += 1;
                log::debug!(
                    "[ARC] Step via {:?}: lambda={:.3e}, newton iters={}",
                    step.case,
                    step.lambda,
                    step.newton_iterations
                );
                self.evaluate(&state.point + &step.step, None, weight)
            }
            WeightPolicy::Adaptive { floor } => {
                let (point, value, weight) = self.search_weight(&state, floor, solves)?;
                self.evaluate(point, Some(value), weight)
            }
        }
    }

    fn finish(
        &self,
        state: IterationState,
        iterates: Vec<Array1<f64>>,
        iterations: usize,
        termination: Termination,
        subproblem_solves: usize,
    ) -> Result<CubicRegSolution, CubicRegError> {
        let final_value = match (state.value, self.oracle.has_objective()) {
            (Some(v), _) => Some(v),
            (None, true) => Some(self.oracle.value(&state.point)?),
            (None, false) => None,
        };
        Ok(CubicRegSolution {
            final_gradient_norm: state.gradient.dot(&state.gradient).sqrt(),
            final_point: state.point,
            iterates,
            final_value,
            iterations,
            final_weight: state.weight,
            termination,
            func_evals: self.oracle.func_evals.get(),
            grad_evals: self.oracle.grad_evals.get(),
            hess_evals: self.oracle.hess_evals.get(),
            subproblem_solves,
        })
    }

    /// Runs the outer iteration until `‖∇f‖² ≤ tolerance` or the iteration cap.
    ///
    /// # Errors
    /// Numerical failures from the subproblem ([`CubicRegError::FactorizationFailed`],
    /// [`CubicRegError::Eigendecomposition`], [`CubicRegError::SubproblemNotConverged`]),
    /// an exhausted adaptive search ([`CubicRegError::WeightSearchFailed`]), or a
    /// non-finite gradient/Hessian at an iterate.
    pub fn minimize(&self) -> Result<CubicRegSolution, CubicRegError> {
        self.oracle.reset_counters();
        let seed = match self.policy {
            WeightPolicy::Fixed(l) => l,
            WeightPolicy::Adaptive { floor } => floor,
        };
        let mut state = self.evaluate(self.x0.clone(), None, seed)?;
        let mut iterates = vec![state.point.clone()];
        let mut subproblem_solves = 0;

        for k in 0..self.max_iterations {
            state = self.advance(state, &mut subproblem_solves)?;
            iterates.push(state.point.clone());
            let g_norm_sq = state.gradient.dot(&state.gradient);
            log::debug!(
                "[ARC] iter {}: ||g||^2={g_norm_sq:.3e}, M={:.3e}, lambda+={:.3e}",
                k + 1,
                state.weight,
                state.lambda_floor
            );
            if self.meets_tolerance(&state.gradient) {
                let sol = self.finish(
                    state,
                    iterates,
                    k + 1,
                    Termination::Converged,
                    subproblem_solves,
                )?;
                log::info!(
                    "[ARC] Converged: iters={}, ||g||={:.3e}, fe={}, ge={}, he={}",
                    sol.iterations,
                    sol.final_gradient_norm,
                    sol.func_evals,
                    sol.grad_evals,
                    sol.hess_evals
                );
                return Ok(sol);
            }
        }

        let sol = self.finish(
            state,
            iterates,
            self.max_iterations,
            Termination::Exhausted,
            subproblem_solves,
        )?;
        log::warn!(
            "[ARC] Max iterations reached: iters={}, ||g||={:.3e}, fe={}, ge={}, he={}",
            sol.iterations,
            sol.final_gradient_norm,
            sol.func_evals,
            sol.grad_evals,
            sol.hess_evals
        );
        Ok(sol)
    }
}
