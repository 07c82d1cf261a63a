//! # Portfolio Engine
//!
//! $$
//! \mathbf{w}^\* = \operatorname{Optimize}(\boldsymbol\mu, \Sigma, r_f)
//! $$
//!
//! High-level optimization API: estimation, the two named optimal portfolios, the
//! efficient frontier and rebalancing advice relative to current holdings.

use std::collections::BTreeMap;

use tracing::debug;
use tracing::warn;

use super::data::calculate_correlation_matrix;
use super::data::calculate_covariance_matrix;
use super::data::calculate_expected_returns;
use super::data::diversification_ratio;
use super::data::portfolio_performance;
use super::data::validate_assets;
use super::optimizers::OptimizedWeights;
use super::optimizers::frontier_targets;
use super::optimizers::max_sharpe;
use super::optimizers::min_volatility;
use super::optimizers::min_volatility_at_target;
use super::solver::mat_vec_mul;
use super::types::AssetReturn;
use super::types::DiversificationAssessment;
use super::types::DiversificationBenefit;
use super::types::EfficientFrontierPoint;
use super::types::OptimizationResult;
use super::types::PortfolioAllocation;
use super::types::PortfolioPerformance;
use super::types::RebalancingAction;
use super::types::Recommendation;
use super::types::RiskAnalysis;
use super::types::SolverStatus;
use super::types::TradeAction;
use crate::benchmarks::DEFAULT_RISK_FREE_RATE;
use crate::config::AnalyticsConfig;
use crate::config::SolverConfig;
use crate::error::AnalyticsError;
use crate::error::Result;

/// Expected returns and covariance of one asset universe.
struct Estimates {
  mu: Vec<f64>,
  cov: Vec<Vec<f64>>,
}

/// Mean-variance optimizer over long-only, fully-invested portfolios.
#[derive(Clone, Debug)]
pub struct PortfolioOptimizer {
  risk_free_rate: f64,
  frontier_points: usize,
  rebalance_threshold: f64,
  solver: SolverConfig,
}

impl Default for PortfolioOptimizer {
  fn default() -> Self {
    Self::new(DEFAULT_RISK_FREE_RATE)
  }
}

impl PortfolioOptimizer {
  /// Optimizer with the default frontier resolution, 5-point rebalancing band and
  /// solver limits.
  pub fn new(risk_free_rate: f64) -> Self {
    let defaults = AnalyticsConfig::default();
    Self {
      risk_free_rate,
      frontier_points: defaults.frontier_points,
      rebalance_threshold: defaults.rebalance_threshold,
      solver: defaults.solver,
    }
  }

  pub fn from_config(config: &AnalyticsConfig) -> Self {
    Self {
      risk_free_rate: config.risk_free_rate,
      frontier_points: config.frontier_points,
      rebalance_threshold: config.rebalance_threshold,
      solver: config.solver,
    }
  }

  pub fn with_solver(mut self, solver: SolverConfig) -> Self {
    self.solver = solver;
    self
  }

  pub fn risk_free_rate(&self) -> f64 {
    self.risk_free_rate
  }

  pub fn calculate_expected_returns(&self, assets: &[AssetReturn]) -> Result<Vec<f64>> {
    validate_assets(assets)?;
    Ok(calculate_expected_returns(assets))
  }

  pub fn calculate_covariance_matrix(&self, assets: &[AssetReturn]) -> Result<Vec<Vec<f64>>> {
    calculate_covariance_matrix(assets)
  }

  /// Best effort; `None` when the series are too short or malformed.
  pub fn calculate_correlation_matrix(&self, assets: &[AssetReturn]) -> Option<Vec<Vec<f64>>> {
    calculate_correlation_matrix(assets)
  }

  /// Annual `(return %, volatility %)`.
  pub fn portfolio_performance(
    &self,
    weights: &[f64],
    expected_returns: &[f64],
    cov: &[Vec<f64>],
  ) -> (f64, f64) {
    portfolio_performance(weights, expected_returns, cov)
  }

  fn estimate(&self, assets: &[AssetReturn]) -> Result<Estimates> {
    let cov = calculate_covariance_matrix(assets)?;
    let mu = calculate_expected_returns(assets);
    Ok(Estimates { mu, cov })
  }

  fn check_weights(&self, weights: &[f64], assets: &[AssetReturn]) -> Result<()> {
    if weights.len() != assets.len() {
      return Err(AnalyticsError::LengthMismatch {
        what: "weights",
        expected: assets.len(),
        found: weights.len(),
      });
    }
    if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
      return Err(AnalyticsError::InvalidWeights(
        "weights must be finite and non-negative".to_string(),
      ));
    }
    Ok(())
  }

  fn sharpe(&self, expected_return_pct: f64, volatility_pct: f64) -> f64 {
    if volatility_pct > 0.0 {
      (expected_return_pct / 100.0 - self.risk_free_rate) / (volatility_pct / 100.0)
    } else {
      0.0
    }
  }

  fn performance(&self, weights: &[f64], est: &Estimates) -> PortfolioPerformance {
    let (expected_return, volatility) = portfolio_performance(weights, &est.mu, &est.cov);
    PortfolioPerformance {
      expected_return,
      volatility,
      sharpe_ratio: self.sharpe(expected_return, volatility),
    }
  }

  fn build_point(
    &self,
    assets: &[AssetReturn],
    est: &Estimates,
    weights: &[f64],
    current: Option<&[f64]>,
    solver_status: SolverStatus,
  ) -> EfficientFrontierPoint {
    let performance = self.performance(weights, est);
    let marginal = mat_vec_mul(&est.cov, weights);

    let allocations = assets
      .iter()
      .enumerate()
      .map(|(i, asset)| {
        let current_weight = current.map_or(0.0, |c| c[i]);
        let optimal_weight = weights[i];
        PortfolioAllocation {
          investment_id: asset.investment_id.clone(),
          name: asset.name.clone(),
          category: asset.category.clone(),
          current_weight,
          optimal_weight,
          expected_return: est.mu[i] * 100.0,
          risk_contribution: optimal_weight * marginal[i],
          recommendation: Recommendation::from_weights(
            current_weight,
            optimal_weight,
            self.rebalance_threshold,
          ),
        }
      })
      .collect();

    EfficientFrontierPoint {
      expected_return: performance.expected_return,
      volatility: performance.volatility,
      sharpe_ratio: performance.sharpe_ratio,
      allocations,
      solver_status,
    }
  }

  fn solved_point(
    &self,
    assets: &[AssetReturn],
    est: &Estimates,
    solved: OptimizedWeights,
    current: Option<&[f64]>,
    label: &str,
  ) -> EfficientFrontierPoint {
    if solved.status == SolverStatus::FallbackEqualWeights {
      warn!(portfolio = label, "solver did not converge, using equal weights");
    }
    self.build_point(assets, est, &solved.weights, current, solved.status)
  }

  fn max_sharpe_point(
    &self,
    assets: &[AssetReturn],
    est: &Estimates,
    current: Option<&[f64]>,
  ) -> EfficientFrontierPoint {
    let solved = max_sharpe(&est.mu, &est.cov, self.risk_free_rate, &self.solver);
    self.solved_point(assets, est, solved, current, "max_sharpe")
  }

  fn min_volatility_point(
    &self,
    assets: &[AssetReturn],
    est: &Estimates,
    current: Option<&[f64]>,
  ) -> EfficientFrontierPoint {
    let solved = min_volatility(&est.cov, &self.solver);
    self.solved_point(assets, est, solved, current, "min_volatility")
  }

  /// Frontier points ascending by expected return, plus the number discarded.
  fn frontier(
    &self,
    assets: &[AssetReturn],
    est: &Estimates,
    num_portfolios: usize,
    current: Option<&[f64]>,
  ) -> (Vec<EfficientFrontierPoint>, usize) {
    let targets = frontier_targets(&est.mu, num_portfolios);
    let mut points: Vec<EfficientFrontierPoint> = targets
      .iter()
      .filter_map(|&target| {
        let weights = min_volatility_at_target(&est.mu, &est.cov, target, &self.solver);
        if weights.is_none() {
          warn!(target_return = target, "frontier point did not converge, discarded");
        }
        weights.map(|w| self.build_point(assets, est, &w, current, SolverStatus::Converged))
      })
      .collect();
    points.sort_by(|a, b| a.expected_return.total_cmp(&b.expected_return));

    let discarded = targets.len() - points.len();
    (points, discarded)
  }

  /// Long-only maximum-Sharpe portfolio, flagged when it fell back to equal weights.
  pub fn optimize_maximum_sharpe(
    &self,
    assets: &[AssetReturn],
    current_weights: Option<&[f64]>,
  ) -> Result<EfficientFrontierPoint> {
    let est = self.estimate(assets)?;
    if let Some(w) = current_weights {
      self.check_weights(w, assets)?;
    }
    Ok(self.max_sharpe_point(assets, &est, current_weights))
  }

  /// Long-only minimum-volatility portfolio, flagged when it fell back to equal weights.
  pub fn optimize_minimum_volatility(
    &self,
    assets: &[AssetReturn],
    current_weights: Option<&[f64]>,
  ) -> Result<EfficientFrontierPoint> {
    let est = self.estimate(assets)?;
    if let Some(w) = current_weights {
      self.check_weights(w, assets)?;
    }
    Ok(self.min_volatility_point(assets, &est, current_weights))
  }

  /// Minimum-volatility portfolios for `num_portfolios` target returns between the
  /// lowest and highest asset return. Targets the solver cannot meet are dropped.
  pub fn calculate_efficient_frontier(
    &self,
    assets: &[AssetReturn],
    num_portfolios: usize,
    current_weights: Option<&[f64]>,
  ) -> Result<Vec<EfficientFrontierPoint>> {
    let est = self.estimate(assets)?;
    if let Some(w) = current_weights {
      self.check_weights(w, assets)?;
    }
    Ok(self.frontier(assets, &est, num_portfolios, current_weights).0)
  }

  pub fn calculate_diversification_ratio(&self, weights: &[f64], assets: &[AssetReturn]) -> Result<f64> {
    self.check_weights(weights, assets)?;
    let cov = calculate_covariance_matrix(assets)?;
    Ok(diversification_ratio(weights, &cov))
  }

  /// Full optimization run.
  ///
  /// Current weights are each asset's share of the summed `current_values` (assets
  /// missing from the map hold nothing); without them the current performance is zero
  /// and no rebalancing is proposed. `total_portfolio_value` only sizes the trades.
  pub fn optimize_portfolio(
    &self,
    assets: &[AssetReturn],
    current_values: Option<&BTreeMap<String, f64>>,
    total_portfolio_value: Option<f64>,
  ) -> Result<OptimizationResult> {
    let est = self.estimate(assets)?;
    let current_weights = current_values
      .map(|values| weights_from_values(assets, values))
      .transpose()?
      .flatten();
    let current = current_weights.as_deref();

    let current_performance = current
      .map(|w| self.performance(w, &est))
      .unwrap_or_default();

    let max_sharpe = self.max_sharpe_point(assets, &est, current);
    let min_volatility = self.min_volatility_point(assets, &est, current);
    let (efficient_frontier, discarded) = self.frontier(assets, &est, self.frontier_points, current);

    let ratio = current.map_or(1.0, |w| diversification_ratio(w, &est.cov));
    let correlation_matrix = calculate_correlation_matrix(assets);

    let rebalancing_actions = match current {
      Some(_) => self.rebalancing(&max_sharpe, total_portfolio_value),
      None => Vec::new(),
    };

    let current_volatility = current_performance.volatility;
    let risk_analysis = RiskAnalysis {
      current_volatility,
      optimal_volatility: min_volatility.volatility,
      volatility_reduction: if current_volatility > 0.0 {
        current_volatility - min_volatility.volatility
      } else {
        0.0
      },
      diversification_benefit: DiversificationBenefit::from_ratio(ratio),
    };

    let mut warnings = Vec::new();
    if max_sharpe.is_fallback() {
      warnings.push("maximum Sharpe optimization did not converge; equal weights used".to_string());
    }
    if min_volatility.is_fallback() {
      warnings.push("minimum volatility optimization did not converge; equal weights used".to_string());
    }
    if discarded > 0 {
      warnings.push(format!(
        "{discarded} of {} efficient frontier points did not converge and were discarded",
        self.frontier_points
      ));
    }

    debug!(
      assets = assets.len(),
      frontier = efficient_frontier.len(),
      rebalancing = rebalancing_actions.len(),
      "optimized portfolio"
    );

    Ok(OptimizationResult {
      current: current_performance,
      max_sharpe,
      min_volatility,
      efficient_frontier,
      diversification_ratio: ratio,
      diversification_assessment: DiversificationAssessment::from_ratio(ratio),
      correlation_matrix,
      rebalancing_actions,
      risk_analysis,
      warnings,
    })
  }

  fn rebalancing(
    &self,
    target: &EfficientFrontierPoint,
    total_portfolio_value: Option<f64>,
  ) -> Vec<RebalancingAction> {
    let total = total_portfolio_value.filter(|t| t.is_finite() && *t > 0.0);

    target
      .allocations
      .iter()
      .filter_map(|a| {
        let diff = a.optimal_weight - a.current_weight;
        (diff.abs() > self.rebalance_threshold).then(|| RebalancingAction {
          investment_id: a.investment_id.clone(),
          name: a.name.clone(),
          action: if diff > 0.0 {
            TradeAction::Buy
          } else {
            TradeAction::Sell
          },
          current_weight: a.current_weight,
          target_weight: a.optimal_weight,
          difference: diff.abs(),
          estimated_amount: total.map(|t| diff.abs() * t),
        })
      })
      .collect()
  }
}

/// Each asset's share of the summed holdings; `None` when nothing is held.
fn weights_from_values(
  assets: &[AssetReturn],
  values: &BTreeMap<String, f64>,
) -> Result<Option<Vec<f64>>> {
  let held: Vec<f64> = assets
    .iter()
    .map(|a| values.get(&a.investment_id).copied().unwrap_or(0.0))
    .collect();
  if held.iter().any(|v| !v.is_finite() || *v < 0.0) {
    return Err(AnalyticsError::InvalidWeights(
      "current values must be finite and non-negative".to_string(),
    ));
  }

  let total: f64 = held.iter().sum();
  if total <= 0.0 {
    return Ok(None);
  }
  Ok(Some(held.iter().map(|v| v / total).collect()))
}
