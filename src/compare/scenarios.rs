//! # Scenarios
//!
//! $$
//! \hat V_i = V_i\,(1+s),\qquad
//! \Delta_{\text{port}} = \frac{\sum_i \hat V_i - \sum_i V_i}{\sum_i V_i}
//! $$
//!
//! Uniform what-if shocks applied to every investment's current value.

use std::collections::BTreeMap;

use impl_new_derive::ImplNew;
use serde::Deserialize;
use serde::Serialize;

use super::types::InvestmentSummary;
use crate::metrics::calculate_simple_roi;
use crate::report::round2;

/// Named percentage shock, e.g. `-20` for a 20% drop.
#[derive(ImplNew, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
  pub name: String,
  pub description: String,
  pub impact_pct: f64,
}

impl Scenario {
  /// Market crash, correction, boom and inflation spike.
  pub fn defaults() -> Vec<Scenario> {
    vec![
      Scenario::new("market_crash".into(), "Market Crash (-20%)".into(), -20.0),
      Scenario::new("market_correction".into(), "Market Correction (-10%)".into(), -10.0),
      Scenario::new("market_boom".into(), "Market Boom (+30%)".into(), 30.0),
      Scenario::new("inflation_spike".into(), "Inflation Spike (-5%)".into(), -5.0),
    ]
  }
}

/// Projection of one investment under a scenario.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScenarioImpact {
  pub investment_id: String,
  #[serde(serialize_with = "round2")]
  pub projected_value: f64,
  /// ROI against the original purchase price; zero when that price is not positive.
  #[serde(serialize_with = "round2")]
  pub projected_roi: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScenarioResult {
  pub name: String,
  pub description: String,
  pub impact_pct: f64,
  pub impacts: Vec<ScenarioImpact>,
  /// Percent change of the total value; zero for an empty or worthless portfolio.
  #[serde(serialize_with = "round2")]
  pub portfolio_impact: f64,
}

/// Apply every scenario to every investment. Results are keyed by scenario name.
pub fn apply_scenarios(
  investments: &[InvestmentSummary],
  scenarios: &[Scenario],
) -> BTreeMap<String, ScenarioResult> {
  let total_value: f64 = investments.iter().map(|i| i.current_value).sum();

  scenarios
    .iter()
    .map(|scenario| {
      let shock = 1.0 + scenario.impact_pct / 100.0;

      let impacts: Vec<ScenarioImpact> = investments
        .iter()
        .map(|inv| {
          let projected_value = inv.current_value * shock;
          ScenarioImpact {
            investment_id: inv.investment_id.clone(),
            projected_value,
            projected_roi: calculate_simple_roi(inv.purchase_price, projected_value),
          }
        })
        .collect();

      let total_projected: f64 = impacts.iter().map(|i| i.projected_value).sum();
      let portfolio_impact = if total_value > 0.0 {
        (total_projected - total_value) / total_value * 100.0
      } else {
        0.0
      };

      let result = ScenarioResult {
        name: scenario.name.clone(),
        description: scenario.description.clone(),
        impact_pct: scenario.impact_pct,
        impacts,
        portfolio_impact,
      };
      (scenario.name.clone(), result)
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;

  use super::*;

  fn book() -> Vec<InvestmentSummary> {
    vec![
      InvestmentSummary::new("a", "Stocks", "stocks", 150_000.0, 100_000.0),
      InvestmentSummary::new("b", "Land", "land", 50_000.0, 60_000.0),
    ]
  }

  #[test]
  fn crash_projects_every_holding() {
    let results = apply_scenarios(&book(), &Scenario::defaults());
    let crash = &results["market_crash"];

    assert_eq!(results.len(), 4);
    assert_abs_diff_eq!(crash.impacts[0].projected_value, 120_000.0, epsilon = 1e-9);
    assert_abs_diff_eq!(crash.impacts[0].projected_roi, 20.0, epsilon = 1e-9);
    assert_abs_diff_eq!(crash.impacts[1].projected_value, 40_000.0, epsilon = 1e-9);
    assert_abs_diff_eq!(crash.portfolio_impact, -20.0, epsilon = 1e-9);
    assert_abs_diff_eq!(results["market_boom"].portfolio_impact, 30.0, epsilon = 1e-9);
  }

  #[test]
  fn zero_value_portfolio_has_no_impact() {
    let book = vec![InvestmentSummary::new("a", "Gift", "other", 0.0, 0.0)];
    let custom = vec![Scenario::new("halving".into(), "Halving".into(), -50.0)];
    let results = apply_scenarios(&book, &custom);

    assert_eq!(results["halving"].portfolio_impact, 0.0);
    assert_eq!(results["halving"].impacts[0].projected_roi, 0.0);
  }
}
