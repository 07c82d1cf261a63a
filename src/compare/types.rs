//! # Comparison Types
//!
//! $$
//! \text{Calmar}=\frac{\text{CAGR}}{\text{MDD}}
//! $$
//!
//! Inputs and result containers of the investment comparator.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Deserialize;
use serde::Serialize;

use super::scenarios::ScenarioResult;
use crate::metrics::InvestmentMetrics;
use crate::report::round2;
use crate::report::round2_map;
use crate::report::round2_opt;
use crate::report::round2_table;

/// Identity and valuation of one investment under comparison.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InvestmentSummary {
  pub investment_id: String,
  pub name: String,
  #[serde(default = "unknown_category")]
  pub category: String,
  #[serde(default)]
  pub current_value: f64,
  #[serde(default)]
  pub purchase_price: f64,
}

fn unknown_category() -> String {
  "unknown".to_string()
}

impl InvestmentSummary {
  pub fn new(
    investment_id: impl Into<String>,
    name: impl Into<String>,
    category: impl Into<String>,
    current_value: f64,
    purchase_price: f64,
  ) -> Self {
    Self {
      investment_id: investment_id.into(),
      name: name.into(),
      category: category.into(),
      current_value,
      purchase_price,
    }
  }
}

impl From<&InvestmentMetrics> for InvestmentSummary {
  fn from(m: &InvestmentMetrics) -> Self {
    Self::new(
      m.investment_id.clone(),
      m.name.clone(),
      m.category.clone(),
      m.current_value,
      m.total_invested,
    )
  }
}

/// Volatility bucket.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
  Low,
  Medium,
  High,
}

impl RiskLevel {
  /// `< 15%` low, `< 30%` medium, otherwise high. Unknown volatility is medium.
  pub fn from_volatility(volatility: Option<f64>) -> Self {
    match volatility {
      None => Self::Medium,
      Some(v) if v.is_nan() => Self::Medium,
      Some(v) if v < 15.0 => Self::Low,
      Some(v) if v < 30.0 => Self::Medium,
      Some(_) => Self::High,
    }
  }
}

/// Number of investments per [`RiskLevel`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RiskDistribution {
  pub low: usize,
  pub medium: usize,
  pub high: usize,
}

impl RiskDistribution {
  pub(crate) fn add(&mut self, level: RiskLevel) {
    match level {
      RiskLevel::Low => self.low += 1,
      RiskLevel::Medium => self.medium += 1,
      RiskLevel::High => self.high += 1,
    }
  }

  pub fn total(&self) -> usize {
    self.low + self.medium + self.high
  }
}

/// Investment with its scores and ranks (1 = best).
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScoredInvestment {
  pub investment_id: String,
  pub name: String,
  pub category: String,
  pub metrics: InvestmentMetrics,
  /// Weighted score in `[0, 100]`.
  #[serde(serialize_with = "round2")]
  pub composite_score: f64,
  /// Calmar-like `cagr / max_drawdown`, when the drawdown is positive.
  #[serde(serialize_with = "round2_opt")]
  pub risk_adjusted_score: Option<f64>,
  pub risk_level: RiskLevel,
  pub roi_rank: usize,
  pub cagr_rank: usize,
  pub sharpe_rank: usize,
  pub composite_rank: usize,
}

/// Top composite scorer.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Winner {
  pub investment_id: String,
  pub name: String,
  #[serde(serialize_with = "round2")]
  pub score: f64,
}

/// Row of the Calmar ranking.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RiskAdjustedEntry {
  pub rank: usize,
  pub investment_id: String,
  pub name: String,
  #[serde(serialize_with = "round2")]
  pub calmar_ratio: f64,
  #[serde(serialize_with = "round2")]
  pub cagr: f64,
  #[serde(serialize_with = "round2")]
  pub max_drawdown: f64,
}

/// Full output of [`super::InvestmentComparator::compare_investments`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ComparisonResult {
  pub winner: Winner,
  /// Sorted by composite rank.
  pub rankings: Vec<ScoredInvestment>,

  #[serde(serialize_with = "round2")]
  pub total_portfolio_value: f64,
  #[serde(serialize_with = "round2")]
  pub total_invested: f64,
  #[serde(serialize_with = "round2")]
  pub total_return_pct: f64,
  #[serde(serialize_with = "round2")]
  pub avg_roi: f64,
  #[serde(serialize_with = "round2")]
  pub avg_cagr: f64,

  /// Category to percent of total current value.
  #[serde(serialize_with = "round2_map")]
  pub concentration: BTreeMap<String, f64>,
  pub risk_distribution: RiskDistribution,

  /// Metric name to investment id to value; absent metrics read as zero.
  #[serde(serialize_with = "round2_table")]
  pub metrics_comparison: BTreeMap<String, BTreeMap<String, f64>>,
  pub risk_adjusted_ranking: Vec<RiskAdjustedEntry>,
  pub scenario_results: Option<BTreeMap<String, ScenarioResult>>,

  pub recommendations: Vec<String>,
  pub warnings: Vec<String>,
  pub opportunities: Vec<String>,

  /// Latest calculation date among the supplied metrics.
  pub calculation_date: NaiveDate,
}
