//! # Portfolio Optimizers
//!
//! $$
//! \min_{\mathbf{w}\in\Delta}\ \mathbf{w}^\top\Sigma\mathbf{w}
//! \quad\text{s.t.}\quad \boldsymbol\mu^\top\mathbf{w}=r^\*
//! $$
//!
//! Long-only optimizers on the weight simplex: maximum Sharpe (Nelder-Mead over a
//! softmax parametrization), minimum variance (projected gradient) and minimum
//! variance at a target return (augmented Lagrangian around the projected gradient).

use argmin::core::CostFunction;
use argmin::core::Executor;
use argmin::core::TerminationReason;
use argmin::core::TerminationStatus;
use argmin::solver::neldermead::NelderMead;
use tracing::debug;

use super::solver::dot;
use super::solver::equal_weights;
use super::solver::largest_eigenvalue;
use super::solver::mat_vec_mul;
use super::solver::minimize_on_simplex;
use super::solver::quad_form;
use super::solver::tidy_weights;
use super::types::SolverStatus;
use crate::config::SolverConfig;

/// Accepted residual of the target-return constraint, as an annual fraction.
pub(crate) const TARGET_RETURN_TOLERANCE: f64 = 1e-7;
const PENALTY_INIT: f64 = 100.0;
const PENALTY_MAX: f64 = 1e8;
const MAX_OUTER_ITERS: usize = 60;

/// Weights produced by an optimizer and whether they are a fallback.
#[derive(Clone, Debug, PartialEq)]
pub struct OptimizedWeights {
  pub weights: Vec<f64>,
  pub status: SolverStatus,
}

impl OptimizedWeights {
  fn converged(weights: Vec<f64>) -> Self {
    Self {
      weights: tidy_weights(&weights),
      status: SolverStatus::Converged,
    }
  }

  fn fallback(n: usize) -> Self {
    Self {
      weights: equal_weights(n),
      status: SolverStatus::FallbackEqualWeights,
    }
  }
}

fn softmax(x: &[f64]) -> Vec<f64> {
  if x.is_empty() {
    return Vec::new();
  }

  let max_x = x.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
  let exps: Vec<f64> = x.iter().map(|&v| (v - max_x).exp()).collect();
  let sum: f64 = exps.iter().sum();

  if sum < 1e-15 || !sum.is_finite() {
    equal_weights(x.len())
  } else {
    exps.iter().map(|&e| e / sum).collect()
  }
}

/// `(μᵀw - r_f) / sqrt(wᵀΣw)`, zero for a riskless portfolio.
fn sharpe_ratio(weights: &[f64], mu: &[f64], cov: &[Vec<f64>], risk_free: f64) -> f64 {
  let volatility = quad_form(weights, cov).sqrt();
  if volatility > 1e-15 {
    (dot(weights, mu) - risk_free) / volatility
  } else {
    0.0
  }
}

struct NegativeSharpe {
  mu: Vec<f64>,
  cov: Vec<Vec<f64>>,
  risk_free: f64,
}

impl CostFunction for NegativeSharpe {
  type Param = Vec<f64>;
  type Output = f64;

  fn cost(&self, x: &Self::Param) -> Result<Self::Output, argmin::core::Error> {
    let w = softmax(x);
    Ok(-sharpe_ratio(&w, &self.mu, &self.cov, self.risk_free))
  }
}

/// Long-only maximum-Sharpe weights. Falls back to equal weights when Nelder-Mead
/// stops without meeting its tolerance.
pub fn max_sharpe(mu: &[f64], cov: &[Vec<f64>], risk_free: f64, config: &SolverConfig) -> OptimizedWeights {
  let n = mu.len();
  if n == 0 {
    return OptimizedWeights::fallback(0);
  }
  if n == 1 {
    return OptimizedWeights::converged(vec![1.0]);
  }

  let x0 = vec![0.0; n];
  let mut simplex = Vec::with_capacity(n + 1);
  simplex.push(x0.clone());
  for i in 0..n {
    let mut point = x0.clone();
    point[i] = 1.0;
    simplex.push(point);
  }

  let cost = NegativeSharpe {
    mu: mu.to_vec(),
    cov: cov.to_vec(),
    risk_free,
  };

  let solver = match NelderMead::new(simplex).with_sd_tolerance(config.tolerance) {
    Ok(solver) => solver,
    Err(_) => return OptimizedWeights::fallback(n),
  };

  match Executor::new(cost, solver)
    .configure(|state| state.max_iters(config.max_iters))
    .run()
  {
    Ok(res) => {
      let converged = matches!(
        res.state.termination_status,
        TerminationStatus::Terminated(TerminationReason::SolverConverged)
      );
      debug!(iterations = res.state.iter, converged, "max-sharpe search finished");

      match res.state.best_param {
        Some(best_x) if converged => OptimizedWeights::converged(softmax(&best_x)),
        _ => OptimizedWeights::fallback(n),
      }
    }
    Err(_) => OptimizedWeights::fallback(n),
  }
}

/// Long-only minimum-variance weights.
pub fn min_volatility(cov: &[Vec<f64>], config: &SolverConfig) -> OptimizedWeights {
  let n = cov.len();
  if n == 0 {
    return OptimizedWeights::fallback(0);
  }

  let gradient = |w: &[f64]| -> Vec<f64> { mat_vec_mul(cov, w).iter().map(|g| 2.0 * g).collect() };
  let lipschitz = 2.0 * largest_eigenvalue(cov);
  let solution = minimize_on_simplex(gradient, lipschitz, &equal_weights(n), config);
  debug!(
    iterations = solution.iterations,
    converged = solution.converged,
    "min-variance search finished"
  );

  if solution.converged {
    OptimizedWeights::converged(solution.weights)
  } else {
    OptimizedWeights::fallback(n)
  }
}

/// Minimum-variance weights whose expected return equals `target`, or `None` when
/// the constraint cannot be met within [`TARGET_RETURN_TOLERANCE`].
pub fn min_volatility_at_target(
  mu: &[f64],
  cov: &[Vec<f64>],
  target: f64,
  config: &SolverConfig,
) -> Option<Vec<f64>> {
  let n = mu.len();
  if n == 0 || !target.is_finite() {
    return None;
  }

  let lambda_max = largest_eigenvalue(cov);
  let mu_norm_sq = dot(mu, mu);

  let mut multiplier = 0.0;
  let mut penalty = PENALTY_INIT;
  let mut weights = equal_weights(n);
  let mut last_residual = f64::INFINITY;

  for _ in 0..MAX_OUTER_ITERS {
    let gradient = |w: &[f64]| -> Vec<f64> {
      let residual = dot(mu, w) - target;
      let scale = multiplier + penalty * residual;
      mat_vec_mul(cov, w)
        .iter()
        .zip(mu.iter())
        .map(|(sw, m)| 2.0 * sw + scale * m)
        .collect()
    };
    let lipschitz = 2.0 * lambda_max + penalty * mu_norm_sq;
    weights = minimize_on_simplex(gradient, lipschitz, &weights, config).weights;

    let residual = dot(mu, &weights) - target;
    if residual.abs() < TARGET_RETURN_TOLERANCE {
      return Some(tidy_weights(&weights));
    }

    multiplier += penalty * residual;
    if residual.abs() > 0.25 * last_residual.abs() {
      penalty = (penalty * 2.0).min(PENALTY_MAX);
    }
    last_residual = residual;
  }

  None
}

/// `count` target returns spaced evenly from the lowest to the highest entry of `mu`.
pub fn frontier_targets(mu: &[f64], count: usize) -> Vec<f64> {
  if mu.is_empty() || count == 0 {
    return Vec::new();
  }

  let lo = mu.iter().cloned().fold(f64::INFINITY, f64::min);
  let hi = mu.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
  if count == 1 {
    return vec![lo];
  }

  let step = (hi - lo) / (count - 1) as f64;
  (0..count)
    .map(|i| if i == count - 1 { hi } else { lo + step * i as f64 })
    .collect()
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;

  use super::*;

  fn diagonal(variances: &[f64]) -> Vec<Vec<f64>> {
    let n = variances.len();
    let mut cov = vec![vec![0.0; n]; n];
    for (i, v) in variances.iter().enumerate() {
      cov[i][i] = *v;
    }
    cov
  }

  #[test]
  fn min_volatility_inverse_variance_for_uncorrelated_assets() {
    let cov = diagonal(&[0.04, 0.0225]);
    let result = min_volatility(&cov, &SolverConfig::default());

    // w ∝ 1/σ²  ->  (0.36, 0.64)
    assert_eq!(result.status, SolverStatus::Converged);
    assert_abs_diff_eq!(result.weights[0], 0.36, epsilon = 1e-6);
    assert_abs_diff_eq!(result.weights[1], 0.64, epsilon = 1e-6);
  }

  #[test]
  fn riskless_universe_is_equal_weighted() {
    let result = min_volatility(&diagonal(&[0.0, 0.0, 0.0]), &SolverConfig::default());

    assert_eq!(result.status, SolverStatus::Converged);
    assert_eq!(result.weights, vec![1.0 / 3.0; 3]);
  }

  #[test]
  fn max_sharpe_matches_tangency_portfolio() {
    let mu = [0.20, 0.15];
    let cov = diagonal(&[0.04, 0.0225]);
    let result = max_sharpe(&mu, &cov, 0.05, &SolverConfig::default());

    // w ∝ Σ⁻¹(μ - r_f) = (3.75, 4.444)
    let expected = 3.75 / (3.75 + 0.10 / 0.0225);
    assert_eq!(result.status, SolverStatus::Converged);
    assert_abs_diff_eq!(result.weights[0], expected, epsilon = 1e-2);
    assert_abs_diff_eq!(result.weights.iter().sum::<f64>(), 1.0, epsilon = 1e-9);
  }

  #[test]
  fn max_sharpe_without_budget_falls_back() {
    let mu = [0.20, 0.15, 0.10];
    let cov = diagonal(&[0.04, 0.0225, 0.01]);
    let config = SolverConfig {
      max_iters: 1,
      tolerance: 1e-14,
    };
    let result = max_sharpe(&mu, &cov, 0.05, &config);

    assert_eq!(result.status, SolverStatus::FallbackEqualWeights);
    assert_eq!(result.weights, vec![1.0 / 3.0; 3]);
  }

  #[test]
  fn target_return_is_met() {
    let mu = [0.05, 0.10, 0.20];
    let cov = vec![
      vec![0.010, 0.002, 0.001],
      vec![0.002, 0.040, 0.006],
      vec![0.001, 0.006, 0.090],
    ];

    for target in frontier_targets(&mu, 7) {
      let w = min_volatility_at_target(&mu, &cov, target, &SolverConfig::default()).unwrap();
      assert_abs_diff_eq!(dot(&mu, &w), target, epsilon = 1e-6);
      assert_abs_diff_eq!(w.iter().sum::<f64>(), 1.0, epsilon = 1e-9);
      assert!(w.iter().all(|x| (0.0..=1.0).contains(x)));
    }
  }

  #[test]
  fn unreachable_target_fails() {
    let mu = [0.05, 0.10];
    let cov = diagonal(&[0.01, 0.04]);

    assert!(min_volatility_at_target(&mu, &cov, 0.50, &SolverConfig::default()).is_none());
  }

  #[test]
  fn targets_span_the_return_range() {
    let targets = frontier_targets(&[0.1, 0.3, 0.2], 5);

    assert_eq!(targets.len(), 5);
    assert_eq!(targets[0], 0.1);
    assert_eq!(targets[4], 0.3);
    assert_abs_diff_eq!(targets[2], 0.2, epsilon = 1e-12);
    assert_eq!(frontier_targets(&[0.1], 1), vec![0.1]);
    assert!(frontier_targets(&[], 5).is_empty());
  }
}
