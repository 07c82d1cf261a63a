//! # Scoring
//!
//! $$
//! s = \sum_k w_k\,\operatorname{clamp}\!\left(100\,\frac{x_k-a_k}{b_k-a_k},\,0,\,100\right)
//! $$
//!
//! Composite score over fixed reference ranges. Drawdown and payback are inverted so
//! that a higher sub-score is always better.

use super::types::InvestmentSummary;
use super::weights::ScoringWeights;
use crate::metrics::InvestmentMetrics;

const ROI_RANGE: (f64, f64) = (-50.0, 100.0);
const CAGR_RANGE: (f64, f64) = (-50.0, 100.0);
const SHARPE_RANGE: (f64, f64) = (-1.0, 3.0);
const DRAWDOWN_RANGE: (f64, f64) = (0.0, 50.0);
const PAYBACK_YEARS_RANGE: (f64, f64) = (0.0, 10.0);
/// Payback assumed when the outlay is never recovered.
const MISSING_PAYBACK_MONTHS: f64 = 999.0;

/// Map `value` linearly from `[min, max]` onto `[0, 100]`, clamped. A degenerate
/// range scores 50.
pub fn normalize_score(value: f64, min: f64, max: f64, invert: bool) -> f64 {
  if max == min {
    return 50.0;
  }

  let normalized = ((value - min) / (max - min) * 100.0).clamp(0.0, 100.0);
  if invert {
    100.0 - normalized
  } else {
    normalized
  }
}

fn present(value: Option<f64>) -> Option<f64> {
  value.filter(|v| !v.is_nan())
}

/// Weighted composite score in `[0, 100]`.
///
/// Missing ROI, CAGR, Sharpe and drawdown count as zero; a missing payback counts as
/// 999 months.
pub fn calculate_composite_score(metrics: &InvestmentMetrics, weights: &ScoringWeights) -> f64 {
  let roi = present(Some(metrics.simple_roi)).unwrap_or(0.0);
  let cagr = present(metrics.cagr).unwrap_or(0.0);
  let sharpe = present(metrics.sharpe_ratio).unwrap_or(0.0);
  let drawdown = present(metrics.max_drawdown).unwrap_or(0.0);
  let payback_years = present(metrics.payback_period_months).unwrap_or(MISSING_PAYBACK_MONTHS) / 12.0;

  let score = normalize_score(roi, ROI_RANGE.0, ROI_RANGE.1, false) * weights.roi
    + normalize_score(cagr, CAGR_RANGE.0, CAGR_RANGE.1, false) * weights.cagr
    + normalize_score(sharpe, SHARPE_RANGE.0, SHARPE_RANGE.1, false) * weights.sharpe
    + normalize_score(drawdown, DRAWDOWN_RANGE.0, DRAWDOWN_RANGE.1, true) * weights.max_drawdown
    + normalize_score(
      payback_years,
      PAYBACK_YEARS_RANGE.0,
      PAYBACK_YEARS_RANGE.1,
      true,
    ) * weights.payback_period;

  score.clamp(0.0, 100.0)
}

/// `cagr / max_drawdown`, defined only for a positive drawdown.
pub fn calmar_ratio(metrics: &InvestmentMetrics) -> Option<f64> {
  let cagr = present(metrics.cagr)?;
  let drawdown = present(metrics.max_drawdown)?;
  (drawdown > 0.0)
    .then(|| cagr / drawdown)
    .filter(|r| r.is_finite())
}

fn category_liquidity(category: &str) -> f64 {
  match category.to_lowercase().as_str() {
    "stocks" => 90.0,
    "crypto" => 80.0,
    "bonds" => 70.0,
    "gold" => 60.0,
    "real_estate" => 30.0,
    "land" => 20.0,
    _ => 40.0,
  }
}

/// How quickly a holding can be sold, `0..=100`.
pub fn calculate_liquidity_score(investment: &InvestmentSummary, metrics: &InvestmentMetrics) -> f64 {
  let mut score = category_liquidity(&investment.category);

  if metrics.years_held > 5.0 {
    score += 5.0;
  }
  if metrics.simple_roi > 20.0 {
    score += 5.0;
  } else if metrics.simple_roi < -10.0 {
    score -= 10.0;
  }

  score.clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;
  use chrono::NaiveDate;

  use super::*;
  use crate::metrics::InvestmentInput;
  use crate::metrics::MetricsEngine;

  fn metrics(purchase: f64, current: f64) -> InvestmentMetrics {
    let as_of = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
    let bought = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
    let input = InvestmentInput::new("x", "X", "stocks", purchase, current, bought);
    MetricsEngine::default().analyze_investment(&input, as_of)
  }

  #[test]
  fn normalize_clamps_and_inverts() {
    assert_eq!(normalize_score(25.0, -50.0, 100.0, false), 50.0);
    assert_eq!(normalize_score(500.0, -50.0, 100.0, false), 100.0);
    assert_eq!(normalize_score(-500.0, -50.0, 100.0, false), 0.0);
    assert_eq!(normalize_score(10.0, 0.0, 50.0, true), 80.0);
    assert_eq!(normalize_score(7.0, 3.0, 3.0, false), 50.0);
  }

  #[test]
  fn composite_stays_in_bounds_with_missing_metrics() {
    let mut m = metrics(100.0, 150.0);
    m.sharpe_ratio = None;
    m.max_drawdown = None;
    m.payback_period_months = None;

    for weights in [
      ScoringWeights::default(),
      ScoringWeights::risk_averse(),
      ScoringWeights::return_focused(),
    ] {
      let score = calculate_composite_score(&m, &weights);
      assert!((0.0..=100.0).contains(&score));
    }

    m.simple_roi = f64::NAN;
    m.cagr = Some(f64::INFINITY);
    let score = calculate_composite_score(&m, &ScoringWeights::default());
    assert!((0.0..=100.0).contains(&score));
  }

  #[test]
  fn composite_by_hand() {
    let mut m = metrics(100.0, 150.0);
    m.simple_roi = 25.0;
    m.cagr = Some(25.0);
    m.sharpe_ratio = Some(1.0);
    m.max_drawdown = Some(25.0);
    m.payback_period_months = Some(60.0);

    // every sub-score is 50
    let score = calculate_composite_score(&m, &ScoringWeights::default());
    assert_abs_diff_eq!(score, 50.0, epsilon = 1e-9);
  }

  #[test]
  fn calmar_needs_positive_drawdown() {
    let mut m = metrics(100.0, 150.0);
    m.cagr = Some(20.0);
    m.max_drawdown = Some(10.0);
    assert_eq!(calmar_ratio(&m), Some(2.0));

    m.max_drawdown = Some(0.0);
    assert!(calmar_ratio(&m).is_none());
    m.max_drawdown = None;
    assert!(calmar_ratio(&m).is_none());
  }

  #[test]
  fn liquidity_adjustments() {
    let summary = |category: &str| InvestmentSummary::new("x", "X", category, 0.0, 0.0);

    let mut m = metrics(100.0, 150.0);
    m.years_held = 6.0;
    assert_eq!(calculate_liquidity_score(&summary("stocks"), &m), 100.0);

    m.years_held = 1.0;
    m.simple_roi = -20.0;
    assert_eq!(calculate_liquidity_score(&summary("land"), &m), 10.0);
    assert_eq!(calculate_liquidity_score(&summary("Collectibles"), &m), 30.0);

    m.simple_roi = 5.0;
    assert_eq!(calculate_liquidity_score(&summary("Real_Estate"), &m), 30.0);
  }
}
