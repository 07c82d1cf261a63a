//! # Metrics Engine
//!
//! $$
//! \text{CAGR}=\left(\frac{V_T}{V_0}\right)^{1/\max(T,\,0.01)}-1,\qquad
//! \bar g_{\text{port}}=\sum_i \frac{V_i}{\sum_j V_j}\,\text{CAGR}_i
//! $$
//!
//! Orchestrates the single-series metrics into a full [`InvestmentMetrics`] record and
//! rolls a list of records up into [`PortfolioMetrics`].

use std::collections::BTreeMap;

use chrono::Local;
use chrono::NaiveDate;
use tracing::debug;

use super::returns::calculate_cagr;
use super::returns::calculate_irr;
use super::returns::calculate_npv;
use super::returns::calculate_payback_period;
use super::returns::calculate_simple_roi;
use super::risk::calculate_max_drawdown;
use super::risk::calculate_sharpe_ratio;
use super::risk::calculate_var_95;
use super::risk::calculate_volatility;
use super::types::InvestmentInput;
use super::types::InvestmentMetrics;
use super::types::PerformerSummary;
use super::types::PortfolioMetrics;
use crate::benchmarks::BenchmarkRates;
use crate::config::AnalyticsConfig;
use crate::report::round_to;

/// Floor on the holding period used for CAGR, in years.
const MIN_CAGR_YEARS: f64 = 0.01;

/// Single-investment and portfolio metrics calculator.
#[derive(Clone, Debug)]
pub struct MetricsEngine {
  risk_free_rate: f64,
  benchmarks: BenchmarkRates,
}

impl Default for MetricsEngine {
  fn default() -> Self {
    Self::new(crate::DEFAULT_RISK_FREE_RATE, BenchmarkRates::default())
  }
}

impl MetricsEngine {
  /// `risk_free_rate` doubles as the NPV discount rate.
  pub fn new(risk_free_rate: f64, benchmarks: BenchmarkRates) -> Self {
    Self {
      risk_free_rate,
      benchmarks,
    }
  }

  pub fn from_config(config: &AnalyticsConfig) -> Self {
    Self::new(config.risk_free_rate, config.benchmarks)
  }

  pub fn risk_free_rate(&self) -> f64 {
    self.risk_free_rate
  }

  pub fn benchmarks(&self) -> &BenchmarkRates {
    &self.benchmarks
  }

  /// Full analysis of one investment as of `as_of`.
  ///
  /// The IRR/NPV/payback cash-flow vector is `[-|purchase_price|, flows sorted by
  /// date.., current_value]`, the last entry only when the current value is positive.
  /// Risk metrics need at least two valuation snapshots.
  pub fn analyze_investment(&self, input: &InvestmentInput, as_of: NaiveDate) -> InvestmentMetrics {
    let holding_period_days = as_of.signed_duration_since(input.purchase_date).num_days();
    let years_held = holding_period_days as f64 / 365.25;

    let purchase_price = input.purchase_price;
    let current_value = input.current_value;
    let simple_roi = calculate_simple_roi(purchase_price, current_value);

    let cagr = (purchase_price > 0.0)
      .then(|| calculate_cagr(purchase_price, current_value, years_held.max(MIN_CAGR_YEARS)));

    let mut sorted_flows: Vec<_> = input.cash_flows.iter().collect();
    sorted_flows.sort_by_key(|cf| cf.date);

    let mut cash_flows = Vec::with_capacity(sorted_flows.len() + 2);
    cash_flows.push(-purchase_price.abs());
    cash_flows.extend(sorted_flows.iter().map(|cf| cf.amount));
    if current_value > 0.0 {
      cash_flows.push(current_value);
    }

    let irr = calculate_irr(&cash_flows);
    let npv = Some(calculate_npv(&cash_flows, self.risk_free_rate)).filter(|v| v.is_finite());
    let payback_period_months = calculate_payback_period(&cash_flows);

    let (sharpe_ratio, volatility, max_drawdown, var_95) = self.risk_metrics(input);

    let vs_inflation = self.vs_inflation(purchase_price, current_value, years_held, simple_roi);
    let vs_cdi = cagr.map(|c| c - self.benchmarks.cdi * 100.0);
    let vs_sp500 = cagr.map(|c| c - self.benchmarks.sp500_historical * 100.0);

    debug!(
      investment_id = %input.investment_id,
      flows = cash_flows.len(),
      snapshots = input.valuation_history.len(),
      "analyzed investment"
    );

    InvestmentMetrics {
      investment_id: input.investment_id.clone(),
      name: input.name.clone(),
      category: input.category.clone(),
      currency: input.currency.clone(),
      total_invested: purchase_price,
      current_value,
      absolute_return: current_value - purchase_price,
      simple_roi,
      annualized_roi: cagr,
      cagr,
      irr,
      npv,
      payback_period_months,
      sharpe_ratio,
      volatility,
      max_drawdown,
      var_95,
      vs_inflation,
      vs_cdi,
      vs_sp500,
      years_held,
      holding_period_days,
      calculation_date: as_of,
    }
  }

  /// [`Self::analyze_investment`] as of the local calendar date.
  pub fn analyze_investment_today(&self, input: &InvestmentInput) -> InvestmentMetrics {
    self.analyze_investment(input, Local::now().date_naive())
  }

  fn risk_metrics(
    &self,
    input: &InvestmentInput,
  ) -> (Option<f64>, Option<f64>, Option<f64>, Option<f64>) {
    if input.valuation_history.len() < 2 {
      return (None, None, None, None);
    }

    let mut history = input.valuation_history.clone();
    history.sort_by_key(|v| v.date);
    let values: Vec<f64> = history.iter().map(|v| v.value).collect();

    let returns: Vec<f64> = values
      .windows(2)
      .filter(|w| w[0] > 0.0)
      .map(|w| (w[1] - w[0]) / w[0])
      .collect();

    let max_drawdown = calculate_max_drawdown(&values);
    if returns.is_empty() {
      return (None, None, max_drawdown, None);
    }

    (
      calculate_sharpe_ratio(&returns, self.risk_free_rate, true),
      calculate_volatility(&returns, true),
      max_drawdown,
      calculate_var_95(&returns),
    )
  }

  fn vs_inflation(
    &self,
    purchase_price: f64,
    current_value: f64,
    years_held: f64,
    simple_roi: f64,
  ) -> Option<f64> {
    let fallback = simple_roi - self.benchmarks.inflation * 100.0;
    if years_held <= 0.0 || purchase_price <= 0.0 {
      return Some(fallback);
    }

    let nominal_annual = (current_value / purchase_price).powf(1.0 / years_held) - 1.0;
    if nominal_annual.is_finite() {
      Some(self.benchmarks.real_return(nominal_annual))
    } else {
      Some(fallback)
    }
  }

  /// Portfolio roll-up. An empty list gives an all-zero result.
  pub fn calculate_portfolio_metrics(&self, metrics: &[InvestmentMetrics]) -> PortfolioMetrics {
    if metrics.is_empty() {
      return PortfolioMetrics::default();
    }

    let total_value: f64 = metrics.iter().map(|m| m.current_value).sum();
    let total_invested: f64 = metrics.iter().map(|m| m.total_invested).sum();
    let total_absolute_return = total_value - total_invested;
    let total_roi = if total_invested > 0.0 {
      total_absolute_return / total_invested * 100.0
    } else {
      0.0
    };

    let weighted_cagr = if total_value > 0.0 {
      metrics
        .iter()
        .map(|m| m.cagr.unwrap_or(0.0) * m.current_value / total_value)
        .sum()
    } else {
      0.0
    };

    let mut category_values: BTreeMap<String, f64> = BTreeMap::new();
    for m in metrics {
      *category_values.entry(m.category.clone()).or_insert(0.0) += m.current_value;
    }
    let category_allocation = category_values
      .into_iter()
      .map(|(category, value)| {
        let pct = if total_value > 0.0 {
          round_to(value / total_value * 100.0, 2)
        } else {
          0.0
        };
        (category, pct)
      })
      .collect();

    let mut by_roi: Vec<&InvestmentMetrics> = metrics.iter().collect();
    by_roi.sort_by(|a, b| b.simple_roi.total_cmp(&a.simple_roi));

    let best_performer = by_roi.first().map(|m| PerformerSummary::of(m));
    let worst_performer = (by_roi.len() > 1)
      .then(|| by_roi.last().map(|m| PerformerSummary::of(m)))
      .flatten();

    PortfolioMetrics {
      total_value,
      total_invested,
      total_absolute_return,
      total_roi,
      weighted_cagr,
      category_allocation,
      best_performer,
      worst_performer,
    }
  }
}
