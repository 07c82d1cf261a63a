//! # Portfolio Types
//!
//! $$
//! \mathbf{w}^\*=\arg\max_{\mathbf{w}\in\Delta} \frac{\boldsymbol\mu^\top\mathbf{w}-r_f}{\sqrt{\mathbf{w}^\top\Sigma\mathbf{w}}}
//! $$
//!
//! Inputs and result containers of the mean-variance optimizer.

use serde::Deserialize;
use serde::Serialize;

use crate::report::round2;
use crate::report::round2_opt;
use crate::report::round4;
use crate::report::round4_matrix_opt;

/// Periodic return history of one asset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AssetReturn {
  pub investment_id: String,
  pub name: String,
  pub category: String,
  /// Chronological fractional returns, assumed monthly.
  pub returns: Vec<f64>,
  /// Annual expected return overriding the historical estimate.
  #[serde(default)]
  pub expected_return: Option<f64>,
}

impl AssetReturn {
  pub fn new(
    investment_id: impl Into<String>,
    name: impl Into<String>,
    category: impl Into<String>,
    returns: Vec<f64>,
  ) -> Self {
    Self {
      investment_id: investment_id.into(),
      name: name.into(),
      category: category.into(),
      returns,
      expected_return: None,
    }
  }

  pub fn with_expected_return(mut self, expected_return: f64) -> Self {
    self.expected_return = Some(expected_return);
    self
  }
}

/// Suggested direction for an asset's weight.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recommendation {
  Increase,
  Decrease,
  Hold,
}

impl Recommendation {
  /// Hold unless the weights differ by more than `threshold`.
  pub fn from_weights(current: f64, optimal: f64, threshold: f64) -> Self {
    if optimal > current + threshold {
      Self::Increase
    } else if optimal < current - threshold {
      Self::Decrease
    } else {
      Self::Hold
    }
  }
}

/// How a portfolio's weights were obtained.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverStatus {
  Converged,
  /// The solver did not converge; the weights are the equal-weight portfolio.
  FallbackEqualWeights,
}

/// One asset's slot in a portfolio solution.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PortfolioAllocation {
  pub investment_id: String,
  pub name: String,
  pub category: String,
  #[serde(serialize_with = "round4")]
  pub current_weight: f64,
  #[serde(serialize_with = "round4")]
  pub optimal_weight: f64,
  /// Annual expected return of the asset, percent.
  #[serde(serialize_with = "round2")]
  pub expected_return: f64,
  /// `w_i (Σw)_i`; sums to the portfolio variance.
  pub risk_contribution: f64,
  pub recommendation: Recommendation,
}

/// Portfolio solution with its annual performance in percent.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EfficientFrontierPoint {
  #[serde(serialize_with = "round2")]
  pub expected_return: f64,
  #[serde(serialize_with = "round2")]
  pub volatility: f64,
  #[serde(serialize_with = "round2")]
  pub sharpe_ratio: f64,
  pub allocations: Vec<PortfolioAllocation>,
  pub solver_status: SolverStatus,
}

impl EfficientFrontierPoint {
  pub fn weights(&self) -> Vec<f64> {
    self.allocations.iter().map(|a| a.optimal_weight).collect()
  }

  pub fn is_fallback(&self) -> bool {
    self.solver_status == SolverStatus::FallbackEqualWeights
  }
}

/// Annual performance of a weight vector, percent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct PortfolioPerformance {
  #[serde(serialize_with = "round2")]
  pub expected_return: f64,
  #[serde(serialize_with = "round2")]
  pub volatility: f64,
  #[serde(serialize_with = "round2")]
  pub sharpe_ratio: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeAction {
  Buy,
  Sell,
}

/// Trade moving one asset from its current to its max-Sharpe weight.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RebalancingAction {
  pub investment_id: String,
  pub name: String,
  pub action: TradeAction,
  #[serde(serialize_with = "round4")]
  pub current_weight: f64,
  #[serde(serialize_with = "round4")]
  pub target_weight: f64,
  /// Absolute weight gap.
  #[serde(serialize_with = "round4")]
  pub difference: f64,
  /// Currency amount to trade, when the portfolio value is known.
  #[serde(serialize_with = "round2_opt")]
  pub estimated_amount: Option<f64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiversificationBenefit {
  Low,
  Medium,
  High,
}

impl DiversificationBenefit {
  /// `> 1.5` high, `> 1.2` medium, otherwise low.
  pub fn from_ratio(ratio: f64) -> Self {
    if ratio > 1.5 {
      Self::High
    } else if ratio > 1.2 {
      Self::Medium
    } else {
      Self::Low
    }
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiversificationAssessment {
  WellDiversified,
  Concentrated,
}

impl DiversificationAssessment {
  /// Well diversified above a ratio of 1.5.
  pub fn from_ratio(ratio: f64) -> Self {
    if ratio > 1.5 {
      Self::WellDiversified
    } else {
      Self::Concentrated
    }
  }
}

/// Current versus minimum-volatility risk.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct RiskAnalysis {
  #[serde(serialize_with = "round2")]
  pub current_volatility: f64,
  #[serde(serialize_with = "round2")]
  pub optimal_volatility: f64,
  /// Zero when the current volatility is unknown.
  #[serde(serialize_with = "round2")]
  pub volatility_reduction: f64,
  pub diversification_benefit: DiversificationBenefit,
}

/// Full output of [`super::PortfolioOptimizer::optimize_portfolio`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OptimizationResult {
  /// All zero without current holdings.
  pub current: PortfolioPerformance,
  pub max_sharpe: EfficientFrontierPoint,
  pub min_volatility: EfficientFrontierPoint,
  /// Ascending by expected return.
  pub efficient_frontier: Vec<EfficientFrontierPoint>,
  #[serde(serialize_with = "round2")]
  pub diversification_ratio: f64,
  pub diversification_assessment: DiversificationAssessment,
  #[serde(serialize_with = "round4_matrix_opt")]
  pub correlation_matrix: Option<Vec<Vec<f64>>>,
  pub rebalancing_actions: Vec<RebalancingAction>,
  pub risk_analysis: RiskAnalysis,
  /// Solver fallbacks and discarded frontier points.
  pub warnings: Vec<String>,
}
