//! # Scoring Weights
//!
//! $$
//! \sum_k w_k = 1,\qquad w_k \ge 0
//! $$
//!
//! Weight presets for the composite score and the investor profiles that select them.

use std::convert::Infallible;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

use crate::error::AnalyticsError;
use crate::error::Result;

/// Tolerance on the unit-sum constraint.
const SUM_TOLERANCE: f64 = 1e-6;

/// Weights of the five composite sub-scores.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
  pub roi: f64,
  pub cagr: f64,
  pub sharpe: f64,
  /// Lower drawdown scores higher.
  pub max_drawdown: f64,
  /// Shorter payback scores higher.
  pub payback_period: f64,
}

impl Default for ScoringWeights {
  fn default() -> Self {
    Self {
      roi: 0.25,
      cagr: 0.25,
      sharpe: 0.20,
      max_drawdown: 0.15,
      payback_period: 0.15,
    }
  }
}

impl ScoringWeights {
  /// Validated constructor.
  pub fn new(roi: f64, cagr: f64, sharpe: f64, max_drawdown: f64, payback_period: f64) -> Result<Self> {
    let weights = Self {
      roi,
      cagr,
      sharpe,
      max_drawdown,
      payback_period,
    };
    weights.validate()?;
    Ok(weights)
  }

  /// Heavier on Sharpe and drawdown.
  pub fn risk_averse() -> Self {
    Self {
      roi: 0.20,
      cagr: 0.15,
      sharpe: 0.30,
      max_drawdown: 0.25,
      payback_period: 0.10,
    }
  }

  /// Heavier on ROI and CAGR.
  pub fn return_focused() -> Self {
    Self {
      roi: 0.35,
      cagr: 0.30,
      sharpe: 0.15,
      max_drawdown: 0.10,
      payback_period: 0.10,
    }
  }

  pub fn as_array(&self) -> [f64; 5] {
    [
      self.roi,
      self.cagr,
      self.sharpe,
      self.max_drawdown,
      self.payback_period,
    ]
  }

  /// Every weight finite and non-negative, total equal to one.
  pub fn validate(&self) -> Result<()> {
    let weights = self.as_array();
    if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
      return Err(AnalyticsError::InvalidWeights(format!(
        "weights must be finite and non-negative, got {weights:?}"
      )));
    }

    let total: f64 = weights.iter().sum();
    if (total - 1.0).abs() > SUM_TOLERANCE {
      return Err(AnalyticsError::InvalidWeights(format!(
        "weights must sum to 1.0, got {total}"
      )));
    }

    Ok(())
  }
}

/// Investor profile selecting a weight preset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskProfile {
  Conservative,
  #[default]
  Balanced,
  Aggressive,
}

impl FromStr for RiskProfile {
  type Err = Infallible;

  /// Anything unrecognized is [`RiskProfile::Balanced`].
  fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
    Ok(match s.to_lowercase().as_str() {
      "conservative" | "risk-averse" | "risk_averse" => Self::Conservative,
      "aggressive" | "return-focused" | "return_focused" => Self::Aggressive,
      _ => Self::Balanced,
    })
  }
}

impl RiskProfile {
  pub fn weights(&self) -> ScoringWeights {
    match self {
      Self::Conservative => ScoringWeights::risk_averse(),
      Self::Balanced => ScoringWeights::default(),
      Self::Aggressive => ScoringWeights::return_focused(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn presets_sum_to_one() {
    for weights in [
      ScoringWeights::default(),
      ScoringWeights::risk_averse(),
      ScoringWeights::return_focused(),
    ] {
      assert!(weights.validate().is_ok());
    }
  }

  #[test]
  fn rejects_bad_weights() {
    assert!(matches!(
      ScoringWeights::new(0.5, 0.5, 0.5, 0.0, 0.0),
      Err(AnalyticsError::InvalidWeights(_))
    ));
    assert!(ScoringWeights::new(1.2, -0.2, 0.0, 0.0, 0.0).is_err());
    assert!(ScoringWeights::new(f64::NAN, 0.25, 0.25, 0.25, 0.25).is_err());
    assert!(ScoringWeights::new(0.2, 0.2, 0.2, 0.2, 0.2).is_ok());
  }

  #[test]
  fn profiles_map_to_presets() {
    let parse = |s: &str| s.parse::<RiskProfile>().unwrap();
    assert_eq!(parse("Conservative").weights(), ScoringWeights::risk_averse());
    assert_eq!(parse("aggressive").weights(), ScoringWeights::return_focused());
    assert_eq!(parse("whatever"), RiskProfile::Balanced);
    assert_eq!("RISK_AVERSE".parse(), Ok(RiskProfile::Conservative));
    assert_eq!(RiskProfile::default().weights(), ScoringWeights::default());
  }
}
