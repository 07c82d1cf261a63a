//! # Configuration
//!
//! Read-only settings shared by the three engines. Every field has a default, so a
//! configuration file only needs the keys it overrides.

use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use serde::Serialize;

use crate::benchmarks::BenchmarkRates;
use crate::benchmarks::DEFAULT_RISK_FREE_RATE;
use crate::compare::Scenario;
use crate::compare::ScoringWeights;
use crate::error::AnalyticsError;
use crate::error::Result;

/// Iteration and convergence limits of the numerical optimizers.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
  /// Upper bound on solver iterations per optimization.
  pub max_iters: u64,
  /// Convergence tolerance on the weight vector.
  pub tolerance: f64,
}

impl Default for SolverConfig {
  fn default() -> Self {
    Self {
      max_iters: 5000,
      tolerance: 1e-9,
    }
  }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
  /// Annual risk-free rate, also the NPV discount rate.
  pub risk_free_rate: f64,
  pub benchmarks: BenchmarkRates,
  pub scoring_weights: ScoringWeights,
  /// Number of target returns swept by the efficient frontier.
  pub frontier_points: usize,
  /// Weight gap (fraction) beyond which an allocation change is recommended.
  pub rebalance_threshold: f64,
  /// Scenarios run by the comparator when none are passed explicitly.
  pub scenarios: Vec<Scenario>,
  pub solver: SolverConfig,
}

impl Default for AnalyticsConfig {
  fn default() -> Self {
    Self {
      risk_free_rate: DEFAULT_RISK_FREE_RATE,
      benchmarks: BenchmarkRates::default(),
      scoring_weights: ScoringWeights::default(),
      frontier_points: 30,
      rebalance_threshold: 0.05,
      scenarios: Scenario::defaults(),
      solver: SolverConfig::default(),
    }
  }
}

impl AnalyticsConfig {
  /// Parse and validate a JSON document.
  pub fn from_json_str(json: &str) -> Result<Self> {
    let config: Self = serde_json::from_str(json)?;
    config.validate()?;
    Ok(config)
  }

  /// Load and validate a JSON configuration file.
  pub fn from_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
      .with_context(|| format!("failed to read analytics config from {path:?}"))?;
    Self::from_json_str(&content)
      .with_context(|| format!("failed to load analytics config from {path:?}"))
  }

  pub fn validate(&self) -> Result<()> {
    self.scoring_weights.validate()?;

    if !self.risk_free_rate.is_finite() {
      return Err(AnalyticsError::InvalidConfig(format!(
        "risk_free_rate must be finite, got {}",
        self.risk_free_rate
      )));
    }
    if self
      .benchmarks
      .entries()
      .iter()
      .any(|(_, rate)| !rate.is_finite() || *rate <= -1.0)
    {
      return Err(AnalyticsError::InvalidConfig(
        "benchmark rates must be finite and greater than -100%".to_string(),
      ));
    }
    if self.frontier_points < 2 {
      return Err(AnalyticsError::InvalidConfig(format!(
        "frontier_points must be at least 2, got {}",
        self.frontier_points
      )));
    }
    if !(0.0..1.0).contains(&self.rebalance_threshold) {
      return Err(AnalyticsError::InvalidConfig(format!(
        "rebalance_threshold must lie in [0, 1), got {}",
        self.rebalance_threshold
      )));
    }
    if self.solver.max_iters == 0 || !(self.solver.tolerance > 0.0) {
      return Err(AnalyticsError::InvalidConfig(
        "solver needs a positive iteration budget and tolerance".to_string(),
      ));
    }
    if let Some(s) = self.scenarios.iter().find(|s| !s.impact_pct.is_finite()) {
      return Err(AnalyticsError::InvalidConfig(format!(
        "scenario '{}' has a non-finite impact",
        s.name
      )));
    }

    Ok(())
  }
}
