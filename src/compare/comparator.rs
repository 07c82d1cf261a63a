//! # Investment Comparator
//!
//! $$
//! \operatorname{rank}_k(i) = 1 + \#\{j : x_{k,j} > x_{k,i}\ \lor\ (x_{k,j}=x_{k,i} \land j<i)\}
//! $$
//!
//! Scores, ranks and stress-tests two or more investments and turns the outcome into
//! plain-text advice.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::debug;
use tracing::warn;

use super::scenarios::Scenario;
use super::scenarios::ScenarioResult;
use super::scenarios::apply_scenarios;
use super::scoring::calculate_composite_score;
use super::scoring::calculate_liquidity_score;
use super::scoring::calmar_ratio;
use super::types::ComparisonResult;
use super::types::InvestmentSummary;
use super::types::RiskAdjustedEntry;
use super::types::RiskDistribution;
use super::types::RiskLevel;
use super::types::ScoredInvestment;
use super::types::Winner;
use super::weights::RiskProfile;
use super::weights::ScoringWeights;
use crate::config::AnalyticsConfig;
use crate::error::AnalyticsError;
use crate::error::Result;
use crate::metrics::InvestmentMetrics;
use crate::report::round_to;

/// Columns of the side-by-side metric table.
const COMPARISON_METRICS: [&str; 6] = [
  "simple_roi",
  "cagr",
  "irr",
  "sharpe_ratio",
  "max_drawdown",
  "volatility",
];

const HIGH_VOLATILITY: f64 = 30.0;
const STRONG_COMPOSITE: f64 = 70.0;
const MIN_CATEGORIES: usize = 3;
const MAX_CATEGORY_SHARE: f64 = 50.0;

fn sort_key(value: Option<f64>) -> f64 {
  value.filter(|v| !v.is_nan()).unwrap_or(0.0)
}

fn metric_value(metrics: &InvestmentMetrics, name: &str) -> Option<f64> {
  match name {
    "simple_roi" => Some(metrics.simple_roi),
    "cagr" => metrics.cagr,
    "irr" => metrics.irr,
    "sharpe_ratio" => metrics.sharpe_ratio,
    "max_drawdown" => metrics.max_drawdown,
    "volatility" => metrics.volatility,
    _ => None,
  }
}

/// Indices of `keys` ordered by descending key, ties kept in input order.
fn descending_order(keys: &[f64]) -> Vec<usize> {
  let mut order: Vec<usize> = (0..keys.len()).collect();
  order.sort_by(|&a, &b| keys[b].total_cmp(&keys[a]));
  order
}

/// Rank (1 = best) of every position in `keys`.
fn ranks(keys: &[f64]) -> Vec<usize> {
  let mut ranks = vec![0; keys.len()];
  for (rank, idx) in descending_order(keys).into_iter().enumerate() {
    ranks[idx] = rank + 1;
  }
  ranks
}

/// Comparator holding the scoring weights and the scenarios run by default.
#[derive(Clone, Debug)]
pub struct InvestmentComparator {
  weights: ScoringWeights,
  scenarios: Vec<Scenario>,
}

impl Default for InvestmentComparator {
  fn default() -> Self {
    Self {
      weights: ScoringWeights::default(),
      scenarios: Scenario::defaults(),
    }
  }
}

impl InvestmentComparator {
  pub fn new(weights: ScoringWeights) -> Result<Self> {
    weights.validate()?;
    Ok(Self {
      weights,
      ..Self::default()
    })
  }

  pub fn for_profile(profile: RiskProfile) -> Self {
    Self {
      weights: profile.weights(),
      ..Self::default()
    }
  }

  pub fn from_config(config: &AnalyticsConfig) -> Result<Self> {
    config.scoring_weights.validate()?;
    Ok(Self {
      weights: config.scoring_weights,
      scenarios: config.scenarios.clone(),
    })
  }

  pub fn weights(&self) -> &ScoringWeights {
    &self.weights
  }

  pub fn scenarios(&self) -> &[Scenario] {
    &self.scenarios
  }

  pub fn calculate_composite_score(&self, metrics: &InvestmentMetrics) -> f64 {
    calculate_composite_score(metrics, &self.weights)
  }

  pub fn calculate_liquidity_score(
    &self,
    investment: &InvestmentSummary,
    metrics: &InvestmentMetrics,
  ) -> f64 {
    calculate_liquidity_score(investment, metrics)
  }

  fn validate_lengths(&self, investments: usize, metrics: usize) -> Result<()> {
    if investments != metrics {
      warn!(investments, metrics, "comparison inputs differ in length");
      return Err(AnalyticsError::LengthMismatch {
        what: "metrics",
        expected: investments,
        found: metrics,
      });
    }
    Ok(())
  }

  /// Score, rank and summarize `investments` paired index-wise with `metrics`.
  pub fn compare_investments(
    &self,
    investments: &[InvestmentSummary],
    metrics: &[InvestmentMetrics],
    run_scenarios: bool,
  ) -> Result<ComparisonResult> {
    self.validate_lengths(investments.len(), metrics.len())?;
    if investments.len() < 2 {
      warn!(found = investments.len(), "comparison needs two investments");
      return Err(AnalyticsError::InsufficientInvestments {
        found: investments.len(),
      });
    }

    let n = investments.len();
    let composite: Vec<f64> = metrics.iter().map(|m| self.calculate_composite_score(m)).collect();
    let roi_ranks = ranks(&metrics.iter().map(|m| sort_key(Some(m.simple_roi))).collect::<Vec<_>>());
    let cagr_ranks = ranks(&metrics.iter().map(|m| sort_key(m.cagr)).collect::<Vec<_>>());
    let sharpe_ranks = ranks(&metrics.iter().map(|m| sort_key(m.sharpe_ratio)).collect::<Vec<_>>());
    let composite_order = descending_order(&composite);
    let composite_ranks = ranks(&composite);

    let scored: Vec<ScoredInvestment> = (0..n)
      .map(|i| ScoredInvestment {
        investment_id: investments[i].investment_id.clone(),
        name: investments[i].name.clone(),
        category: investments[i].category.clone(),
        metrics: metrics[i].clone(),
        composite_score: composite[i],
        risk_adjusted_score: calmar_ratio(&metrics[i]),
        risk_level: RiskLevel::from_volatility(metrics[i].volatility),
        roi_rank: roi_ranks[i],
        cagr_rank: cagr_ranks[i],
        sharpe_rank: sharpe_ranks[i],
        composite_rank: composite_ranks[i],
      })
      .collect();

    let total_portfolio_value: f64 = investments.iter().map(|i| i.current_value).sum();
    let total_invested: f64 = investments.iter().map(|i| i.purchase_price).sum();
    let total_return_pct = if total_invested > 0.0 {
      (total_portfolio_value - total_invested) / total_invested * 100.0
    } else {
      0.0
    };
    let avg_roi = metrics.iter().map(|m| sort_key(Some(m.simple_roi))).sum::<f64>() / n as f64;
    let avg_cagr = metrics.iter().map(|m| sort_key(m.cagr)).sum::<f64>() / n as f64;

    let concentration = concentration(investments, total_portfolio_value);

    let mut risk_distribution = RiskDistribution::default();
    for s in &scored {
      risk_distribution.add(s.risk_level);
    }

    let metrics_comparison: BTreeMap<String, BTreeMap<String, f64>> = COMPARISON_METRICS
      .iter()
      .map(|&name| {
        let row = scored
          .iter()
          .map(|s| (s.investment_id.clone(), sort_key(metric_value(&s.metrics, name))))
          .collect();
        (name.to_string(), row)
      })
      .collect();

    let risk_adjusted_ranking = risk_adjusted_ranking(&scored);

    let scenario_results = run_scenarios.then(|| apply_scenarios(investments, &self.scenarios));

    let rankings: Vec<ScoredInvestment> = composite_order.iter().map(|&i| scored[i].clone()).collect();
    let (recommendations, warnings, opportunities) = advise(&rankings, &concentration);

    let best = &rankings[0];
    let winner = Winner {
      investment_id: best.investment_id.clone(),
      name: best.name.clone(),
      score: best.composite_score,
    };

    let calculation_date = metrics
      .iter()
      .map(|m| m.calculation_date)
      .max()
      .unwrap_or(NaiveDate::MIN);

    debug!(
      investments = n,
      winner = %winner.investment_id,
      scenarios = scenario_results.as_ref().map_or(0, |s| s.len()),
      "compared investments"
    );

    Ok(ComparisonResult {
      winner,
      rankings,
      total_portfolio_value,
      total_invested,
      total_return_pct,
      avg_roi,
      avg_cagr,
      concentration,
      risk_distribution,
      metrics_comparison,
      risk_adjusted_ranking,
      scenario_results,
      recommendations,
      warnings,
      opportunities,
      calculation_date,
    })
  }

  /// Stress-test the investments, with the comparator's scenarios when none are given.
  pub fn run_scenarios(
    &self,
    investments: &[InvestmentSummary],
    metrics: &[InvestmentMetrics],
    scenarios: Option<&[Scenario]>,
  ) -> Result<BTreeMap<String, ScenarioResult>> {
    self.validate_lengths(investments.len(), metrics.len())?;
    Ok(apply_scenarios(
      investments,
      scenarios.unwrap_or(self.scenarios.as_slice()),
    ))
  }
}

fn concentration(investments: &[InvestmentSummary], total_value: f64) -> BTreeMap<String, f64> {
  let mut by_category: BTreeMap<String, f64> = BTreeMap::new();
  for inv in investments {
    *by_category.entry(inv.category.clone()).or_insert(0.0) += inv.current_value;
  }

  by_category
    .into_iter()
    .map(|(category, value)| {
      let pct = if total_value > 0.0 {
        round_to(value / total_value * 100.0, 2)
      } else {
        0.0
      };
      (category, pct)
    })
    .collect()
}

fn risk_adjusted_ranking(scored: &[ScoredInvestment]) -> Vec<RiskAdjustedEntry> {
  let with_calmar: Vec<(&ScoredInvestment, f64)> = scored
    .iter()
    .filter_map(|s| s.risk_adjusted_score.map(|c| (s, c)))
    .collect();
  let keys: Vec<f64> = with_calmar.iter().map(|(_, c)| *c).collect();

  descending_order(&keys)
    .into_iter()
    .enumerate()
    .map(|(rank, idx)| {
      let (s, calmar) = with_calmar[idx];
      RiskAdjustedEntry {
        rank: rank + 1,
        investment_id: s.investment_id.clone(),
        name: s.name.clone(),
        calmar_ratio: calmar,
        cagr: sort_key(s.metrics.cagr),
        max_drawdown: sort_key(s.metrics.max_drawdown),
      }
    })
    .collect()
}

/// Rule-based advice over the composite-sorted `rankings`.
fn advise(
  rankings: &[ScoredInvestment],
  concentration: &BTreeMap<String, f64>,
) -> (Vec<String>, Vec<String>, Vec<String>) {
  let mut recommendations = Vec::new();
  let mut warnings = Vec::new();
  let mut opportunities = Vec::new();

  let (Some(top), Some(bottom)) = (rankings.first(), rankings.last()) else {
    return (recommendations, warnings, opportunities);
  };

  recommendations.push(format!(
    "{} is your best performer with a composite score of {:.1} ({:.1}% ROI)",
    top.name, top.composite_score, top.metrics.simple_roi
  ));

  if rankings.len() > 1 {
    let roi = sort_key(Some(bottom.metrics.simple_roi));
    if roi < 0.0 {
      warnings.push(format!(
        "{} is underperforming with {roi:.1}% ROI. Consider reviewing this investment.",
        bottom.name
      ));
    } else if roi < 5.0 {
      recommendations.push(format!(
        "{} has modest returns ({roi:.1}% ROI). Monitor for improvement or consider reallocation.",
        bottom.name
      ));
    }
  }

  if concentration.len() < MIN_CATEGORIES {
    warnings.push(format!(
      "Your portfolio is concentrated in {} categories. Consider diversifying across land, stocks, bonds, etc.",
      concentration.len()
    ));
  } else {
    for (category, pct) in concentration {
      if *pct > MAX_CATEGORY_SHARE {
        warnings.push(format!(
          "{pct:.1}% of your portfolio is in {category}. Consider reducing concentration risk."
        ));
      }
    }
  }

  let high_risk = rankings
    .iter()
    .filter(|s| s.metrics.volatility.is_some_and(|v| v > HIGH_VOLATILITY))
    .count();
  if high_risk > 0 {
    warnings.push(format!(
      "{high_risk} investment(s) show high volatility (>30%). Review risk management strategies."
    ));
  }

  // sharpe_rank breaks ties in input order
  let best_sharpe = rankings
    .iter()
    .filter_map(|s| s.metrics.sharpe_ratio.filter(|v| v.is_finite()).map(|v| (s, v)))
    .min_by_key(|(s, _)| s.sharpe_rank);
  if let Some((s, sharpe)) = best_sharpe {
    opportunities.push(format!(
      "{} has the best risk-adjusted return (Sharpe: {sharpe:.2})",
      s.name
    ));
  }

  for s in rankings.iter().take(2) {
    if s.composite_score > STRONG_COMPOSITE {
      opportunities.push(format!(
        "Consider increasing allocation to {}: strong performance with composite score {:.1}",
        s.name, s.composite_score
      ));
    }
  }

  (recommendations, warnings, opportunities)
}

#[cfg(test)]
mod tests {
  use chrono::Duration;
  use tracing_test::traced_test;

  use super::*;
  use crate::metrics::InvestmentInput;
  use crate::metrics::MetricsEngine;
  use crate::metrics::Valuation;

  fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 30).unwrap()
  }

  fn investment(id: &str, category: &str, purchase: f64, current: f64) -> InvestmentInput {
    InvestmentInput::new(
      id,
      format!("Asset {id}"),
      category,
      purchase,
      current,
      as_of() - Duration::days(3 * 365),
    )
  }

  fn with_history(input: InvestmentInput, values: &[f64]) -> InvestmentInput {
    let start = input.purchase_date;
    let history = values
      .iter()
      .enumerate()
      .map(|(i, v)| Valuation::new(start + Duration::days(30 * i as i64), *v))
      .collect();
    input.with_valuation_history(history)
  }

  fn book() -> (Vec<InvestmentSummary>, Vec<InvestmentMetrics>) {
    let engine = MetricsEngine::default();
    let inputs = vec![
      with_history(
        investment("a", "stocks", 100_000.0, 180_000.0),
        &[100.0, 110.0, 105.0, 120.0, 130.0, 125.0, 140.0],
      ),
      with_history(
        investment("b", "land", 200_000.0, 190_000.0),
        &[100.0, 60.0, 120.0, 50.0, 110.0, 70.0, 95.0],
      ),
      investment("c", "bonds", 50_000.0, 56_000.0),
      investment("d", "stocks", 80_000.0, 81_000.0),
    ];

    let metrics: Vec<InvestmentMetrics> = inputs
      .iter()
      .map(|i| engine.analyze_investment(i, as_of()))
      .collect();
    let summaries = metrics.iter().map(InvestmentSummary::from).collect();
    (summaries, metrics)
  }

  fn assert_permutation(mut ranks: Vec<usize>) {
    let n = ranks.len();
    ranks.sort_unstable();
    assert_eq!(ranks, (1..=n).collect::<Vec<_>>());
  }

  #[test]
  fn ranks_are_permutations() {
    let (investments, metrics) = book();
    let result = InvestmentComparator::default()
      .compare_investments(&investments, &metrics, false)
      .unwrap();

    assert_permutation(result.rankings.iter().map(|s| s.roi_rank).collect());
    assert_permutation(result.rankings.iter().map(|s| s.cagr_rank).collect());
    assert_permutation(result.rankings.iter().map(|s| s.sharpe_rank).collect());
    assert_permutation(result.rankings.iter().map(|s| s.composite_rank).collect());

    for (i, s) in result.rankings.iter().enumerate() {
      assert_eq!(s.composite_rank, i + 1);
      assert!((0.0..=100.0).contains(&s.composite_score));
    }
    assert_eq!(result.winner.investment_id, result.rankings[0].investment_id);
  }

  #[test]
  fn ties_keep_input_order() {
    let (investments, mut metrics) = book();
    for m in &mut metrics {
      m.sharpe_ratio = None;
    }
    let result = InvestmentComparator::default()
      .compare_investments(&investments, &metrics, false)
      .unwrap();

    let sharpe_rank = |id: &str| {
      result
        .rankings
        .iter()
        .find(|s| s.investment_id == id)
        .map(|s| s.sharpe_rank)
        .unwrap()
    };
    assert_eq!(sharpe_rank("a"), 1);
    assert_eq!(sharpe_rank("b"), 2);
    assert_eq!(sharpe_rank("c"), 3);
    assert_eq!(sharpe_rank("d"), 4);
  }

  #[test]
  fn rollups_and_buckets() {
    let (investments, metrics) = book();
    let result = InvestmentComparator::default()
      .compare_investments(&investments, &metrics, true)
      .unwrap();

    assert_eq!(result.total_portfolio_value, 507_000.0);
    assert_eq!(result.total_invested, 430_000.0);
    assert_eq!(result.risk_distribution.total(), 4);
    assert!(result.risk_distribution.high >= 1);
    assert_eq!(result.concentration.len(), 3);
    let share: f64 = result.concentration.values().sum();
    assert!((share - 100.0).abs() < 0.1);

    assert_eq!(result.metrics_comparison.len(), 6);
    assert_eq!(result.metrics_comparison["irr"].len(), 4);
    assert_eq!(result.metrics_comparison["volatility"]["c"], 0.0);

    let scenarios = result.scenario_results.as_ref().unwrap();
    assert_eq!(scenarios.len(), 4);
    assert!((scenarios["market_crash"].portfolio_impact + 20.0).abs() < 1e-9);
    assert_eq!(result.calculation_date, as_of());
  }

  #[test]
  fn calmar_ranking_only_lists_defined_scores() {
    let (investments, metrics) = book();
    let result = InvestmentComparator::default()
      .compare_investments(&investments, &metrics, false)
      .unwrap();

    // only a and b have valuation history
    assert_eq!(result.risk_adjusted_ranking.len(), 2);
    assert_eq!(result.risk_adjusted_ranking[0].rank, 1);
    assert!(result.risk_adjusted_ranking[0].calmar_ratio >= result.risk_adjusted_ranking[1].calmar_ratio);
  }

  #[test]
  fn advice_flags_losers_and_volatility() {
    let (investments, metrics) = book();
    let result = InvestmentComparator::default()
      .compare_investments(&investments, &metrics, false)
      .unwrap();

    assert!(result.recommendations[0].contains(&result.winner.name));
    assert!(result.warnings.iter().any(|w| w.contains("high volatility")));
    assert!(result.opportunities.iter().any(|o| o.contains("Sharpe")));
  }

  #[test]
  fn equal_sharpe_goes_to_the_first_listed() {
    let (mut investments, mut metrics) = book();
    investments.reverse();
    metrics.reverse();
    for m in &mut metrics {
      m.sharpe_ratio = Some(1.0);
    }
    let result = InvestmentComparator::default()
      .compare_investments(&investments, &metrics, false)
      .unwrap();

    assert_ne!(result.winner.investment_id, "d");
    assert!(result
      .opportunities
      .iter()
      .any(|o| o.starts_with("Asset d has the best risk-adjusted return")));
  }

  #[test]
  fn few_categories_trigger_diversification_warning() {
    let (investments, metrics) = book();
    let result = InvestmentComparator::default()
      .compare_investments(&investments[..2], &metrics[..2], false)
      .unwrap();

    assert!(result.warnings.iter().any(|w| w.contains("concentrated in 2 categories")));
  }

  #[test]
  #[traced_test]
  fn rejects_invalid_calls() {
    let (investments, metrics) = book();
    let comparator = InvestmentComparator::default();

    assert!(matches!(
      comparator.compare_investments(&investments[..1], &metrics[..1], false),
      Err(AnalyticsError::InsufficientInvestments { found: 1 })
    ));
    assert!(matches!(
      comparator.compare_investments(&investments, &metrics[..3], false),
      Err(AnalyticsError::LengthMismatch {
        expected: 4,
        found: 3,
        ..
      })
    ));
    assert!(comparator.compare_investments(&[], &[], false).is_err());
    assert!(logs_contain("comparison inputs differ in length"));
  }

  #[test]
  fn profiles_change_the_weights() {
    let (investments, metrics) = book();
    let conservative = InvestmentComparator::for_profile(RiskProfile::Conservative);
    let aggressive = InvestmentComparator::for_profile(RiskProfile::Aggressive);

    assert_eq!(conservative.weights(), &ScoringWeights::risk_averse());
    assert!(conservative.compare_investments(&investments, &metrics, false).is_ok());
    assert!(aggressive.compare_investments(&investments, &metrics, false).is_ok());
    assert!(InvestmentComparator::new(ScoringWeights {
      roi: 0.9,
      ..ScoringWeights::default()
    })
    .is_err());
  }

  #[test]
  fn custom_scenarios_override_defaults() {
    let (investments, metrics) = book();
    let custom = [Scenario::new("rally".into(), "Rally".into(), 10.0)];
    let results = InvestmentComparator::default()
      .run_scenarios(&investments, &metrics, Some(&custom))
      .unwrap();

    assert_eq!(results.len(), 1);
    assert!((results["rally"].portfolio_impact - 10.0).abs() < 1e-9);
  }
}
