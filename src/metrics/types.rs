//! # Metric Types
//!
//! $$
//! R_{\text{abs}} = V_{\text{current}} - V_{\text{invested}}
//! $$
//!
//! Inputs handed over by the persistence layer and the metric containers produced
//! from them.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use impl_new_derive::ImplNew;
use serde::Deserialize;
use serde::Serialize;

use crate::report::round1_opt;
use crate::report::round2;
use crate::report::round2_map;
use crate::report::round2_opt;

/// Signed cash movement; inflows are positive, outflows negative.
#[derive(ImplNew, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CashFlow {
  pub date: NaiveDate,
  pub amount: f64,
  #[serde(default)]
  pub description: String,
}

/// Point-in-time market value snapshot.
#[derive(ImplNew, Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Valuation {
  pub date: NaiveDate,
  pub value: f64,
}

/// Raw investment record as supplied by the caller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InvestmentInput {
  pub investment_id: String,
  pub name: String,
  pub category: String,
  pub purchase_price: f64,
  pub current_value: f64,
  pub purchase_date: NaiveDate,
  /// Ancillary cash flows between purchase and today, in any order.
  #[serde(default)]
  pub cash_flows: Vec<CashFlow>,
  /// Valuation snapshots, in any order.
  #[serde(default)]
  pub valuation_history: Vec<Valuation>,
  #[serde(default = "default_currency")]
  pub currency: String,
}

fn default_currency() -> String {
  "BRL".to_string()
}

impl InvestmentInput {
  /// Record without cash flows or valuation history, denominated in BRL.
  pub fn new(
    investment_id: impl Into<String>,
    name: impl Into<String>,
    category: impl Into<String>,
    purchase_price: f64,
    current_value: f64,
    purchase_date: NaiveDate,
  ) -> Self {
    Self {
      investment_id: investment_id.into(),
      name: name.into(),
      category: category.into(),
      purchase_price,
      current_value,
      purchase_date,
      cash_flows: Vec::new(),
      valuation_history: Vec::new(),
      currency: default_currency(),
    }
  }

  pub fn with_cash_flows(mut self, cash_flows: Vec<CashFlow>) -> Self {
    self.cash_flows = cash_flows;
    self
  }

  pub fn with_valuation_history(mut self, valuation_history: Vec<Valuation>) -> Self {
    self.valuation_history = valuation_history;
    self
  }

  pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
    self.currency = currency.into();
    self
  }
}

/// Metrics of a single investment. Percent-valued fields are in percent units.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct InvestmentMetrics {
  pub investment_id: String,
  pub name: String,
  pub category: String,
  pub currency: String,

  #[serde(serialize_with = "round2")]
  pub total_invested: f64,
  #[serde(serialize_with = "round2")]
  pub current_value: f64,
  #[serde(serialize_with = "round2")]
  pub absolute_return: f64,
  #[serde(serialize_with = "round2")]
  pub simple_roi: f64,

  #[serde(serialize_with = "round2_opt")]
  pub annualized_roi: Option<f64>,
  #[serde(serialize_with = "round2_opt")]
  pub cagr: Option<f64>,

  #[serde(serialize_with = "round2_opt")]
  pub irr: Option<f64>,
  #[serde(serialize_with = "round2_opt")]
  pub npv: Option<f64>,
  #[serde(serialize_with = "round1_opt")]
  pub payback_period_months: Option<f64>,

  #[serde(serialize_with = "round2_opt")]
  pub sharpe_ratio: Option<f64>,
  #[serde(serialize_with = "round2_opt")]
  pub volatility: Option<f64>,
  #[serde(serialize_with = "round2_opt")]
  pub max_drawdown: Option<f64>,
  #[serde(serialize_with = "round2_opt")]
  pub var_95: Option<f64>,

  #[serde(serialize_with = "round2_opt")]
  pub vs_inflation: Option<f64>,
  #[serde(serialize_with = "round2_opt")]
  pub vs_cdi: Option<f64>,
  #[serde(serialize_with = "round2_opt")]
  pub vs_sp500: Option<f64>,

  #[serde(serialize_with = "round2")]
  pub years_held: f64,
  pub holding_period_days: i64,
  pub calculation_date: NaiveDate,
}

/// Identity and ROI of the best or worst investment in a portfolio.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PerformerSummary {
  pub investment_id: String,
  pub name: String,
  #[serde(serialize_with = "round2")]
  pub roi: f64,
}

impl PerformerSummary {
  pub(crate) fn of(metrics: &InvestmentMetrics) -> Self {
    Self {
      investment_id: metrics.investment_id.clone(),
      name: metrics.name.clone(),
      roi: metrics.simple_roi,
    }
  }
}

/// Aggregate over a list of [`InvestmentMetrics`].
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PortfolioMetrics {
  #[serde(serialize_with = "round2")]
  pub total_value: f64,
  #[serde(serialize_with = "round2")]
  pub total_invested: f64,
  #[serde(serialize_with = "round2")]
  pub total_absolute_return: f64,
  #[serde(serialize_with = "round2")]
  pub total_roi: f64,
  /// Current-value weighted CAGR; an absent CAGR counts as zero.
  #[serde(serialize_with = "round2")]
  pub weighted_cagr: f64,
  /// Category to percent of total current value.
  #[serde(serialize_with = "round2_map")]
  pub category_allocation: BTreeMap<String, f64>,
  pub best_performer: Option<PerformerSummary>,
  pub worst_performer: Option<PerformerSummary>,
}
