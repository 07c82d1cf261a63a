//! # Portfolio Data
//!
//! $$
//! \mu_i=(1+\bar r_i)^{12}-1,\qquad
//! \Sigma_{ij}=12\cdot\frac{1}{T-1}\sum_{t}(r_{i,t}-\bar r_i)(r_{j,t}-\bar r_j)
//! $$
//!
//! Estimation of annual expected returns, covariance and correlation from aligned
//! monthly return series.

use statrs::statistics::Statistics;
use tracing::warn;

use super::solver::dot;
use super::solver::quad_form;
use super::types::AssetReturn;
use crate::error::AnalyticsError;
use crate::error::Result;
use crate::metrics::PERIODS_PER_YEAR;
use crate::metrics::Valuation;
use crate::metrics::returns_from_values;

/// Check that there is at least one asset and that every series is finite and of the
/// same length. Returns the common number of periods.
pub fn validate_assets(assets: &[AssetReturn]) -> Result<usize> {
  let Some(first) = assets.first() else {
    return Err(AnalyticsError::NoAssets);
  };
  let periods = first.returns.len();

  for asset in assets {
    if asset.returns.len() != periods {
      warn!(
        investment_id = %asset.investment_id,
        expected = periods,
        found = asset.returns.len(),
        "misaligned return series"
      );
      return Err(AnalyticsError::MisalignedReturns {
        investment_id: asset.investment_id.clone(),
        expected: periods,
        found: asset.returns.len(),
      });
    }
    let bad_override = asset.expected_return.is_some_and(|r| !r.is_finite());
    if bad_override || asset.returns.iter().any(|r| !r.is_finite()) {
      warn!(investment_id = %asset.investment_id, "non-finite return data");
      return Err(AnalyticsError::NonFiniteReturns {
        investment_id: asset.investment_id.clone(),
      });
    }
  }

  Ok(periods)
}

/// Annual expected return per asset: the explicit override, else the compounded
/// monthly mean, else zero for an empty history.
pub fn calculate_expected_returns(assets: &[AssetReturn]) -> Vec<f64> {
  assets
    .iter()
    .map(|asset| match asset.expected_return {
      Some(expected) => expected,
      None if asset.returns.is_empty() => 0.0,
      None => {
        let mean_monthly = asset.returns.iter().mean();
        (1.0 + mean_monthly).powf(PERIODS_PER_YEAR) - 1.0
      }
    })
    .collect()
}

/// Annualized sample covariance matrix. Fewer than two periods carry no dispersion
/// information and give a zero matrix.
pub fn calculate_covariance_matrix(assets: &[AssetReturn]) -> Result<Vec<Vec<f64>>> {
  let periods = validate_assets(assets)?;
  let n = assets.len();
  let mut cov = vec![vec![0.0; n]; n];
  if periods < 2 {
    return Ok(cov);
  }

  for i in 0..n {
    for j in i..n {
      let c = assets[i]
        .returns
        .iter()
        .covariance(assets[j].returns.iter())
        * PERIODS_PER_YEAR;
      cov[i][j] = c;
      cov[j][i] = c;
    }
  }

  Ok(cov)
}

/// Correlation matrix implied by a covariance matrix. Zero-variance assets get zero
/// off-diagonal correlation.
pub fn correlation_from_covariance(cov: &[Vec<f64>]) -> Vec<Vec<f64>> {
  let n = cov.len();
  let sigmas: Vec<f64> = (0..n)
    .map(|i| {
      cov
        .get(i)
        .and_then(|row| row.get(i))
        .copied()
        .unwrap_or(0.0)
        .max(0.0)
        .sqrt()
    })
    .collect();

  let mut corr = vec![vec![0.0; n]; n];
  for i in 0..n {
    for j in 0..n {
      let cij = cov.get(i).and_then(|row| row.get(j)).copied().unwrap_or(0.0);
      let denom = sigmas[i] * sigmas[j];
      corr[i][j] = if i == j {
        1.0
      } else if denom > 1e-15 {
        (cij / denom).clamp(-1.0, 1.0)
      } else {
        0.0
      };
    }
  }

  corr
}

/// Correlation matrix of the return series; `None` when it cannot be estimated.
pub fn calculate_correlation_matrix(assets: &[AssetReturn]) -> Option<Vec<Vec<f64>>> {
  let periods = validate_assets(assets).ok()?;
  if periods < 2 {
    return None;
  }
  let cov = calculate_covariance_matrix(assets).ok()?;
  let corr = correlation_from_covariance(&cov);
  corr
    .iter()
    .all(|row| row.iter().all(|c| c.is_finite()))
    .then_some(corr)
}

/// Annual `(return %, volatility %)` of `weights`.
pub fn portfolio_performance(weights: &[f64], expected_returns: &[f64], cov: &[Vec<f64>]) -> (f64, f64) {
  let expected = dot(weights, expected_returns);
  let volatility = quad_form(weights, cov).sqrt();
  (expected * 100.0, volatility * 100.0)
}

/// `(Σ w_i σ_i) / σ_p`, or `1.0` for a riskless portfolio or mismatched dimensions.
pub fn diversification_ratio(weights: &[f64], cov: &[Vec<f64>]) -> f64 {
  if weights.len() != cov.len() {
    return 1.0;
  }
  let portfolio_vol = quad_form(weights, cov).sqrt();
  if portfolio_vol <= 1e-15 {
    return 1.0;
  }

  let weighted_vol: f64 = weights
    .iter()
    .enumerate()
    .map(|(i, w)| {
      let variance = cov[i].get(i).copied().unwrap_or(0.0);
      w * variance.max(0.0).sqrt()
    })
    .sum();
  weighted_vol / portfolio_vol
}

/// Build an [`AssetReturn`] from unordered `(date, value)` snapshots.
pub fn asset_from_valuations(
  investment_id: impl Into<String>,
  name: impl Into<String>,
  category: impl Into<String>,
  valuations: &[Valuation],
) -> AssetReturn {
  let mut sorted = valuations.to_vec();
  sorted.sort_by_key(|v| v.date);
  let values: Vec<f64> = sorted.iter().map(|v| v.value).collect();

  AssetReturn::new(investment_id, name, category, returns_from_values(&values))
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;
  use chrono::NaiveDate;

  use super::*;

  fn asset(id: &str, returns: &[f64]) -> AssetReturn {
    AssetReturn::new(id, id, "stocks", returns.to_vec())
  }

  #[test]
  fn expected_returns_prefer_override() {
    let assets = vec![
      asset("a", &[0.01, 0.01, 0.01]),
      asset("b", &[0.02, 0.0]).with_expected_return(0.15),
      asset("c", &[]),
    ];
    let mu = calculate_expected_returns(&assets);

    assert_abs_diff_eq!(mu[0], 1.01f64.powi(12) - 1.0, epsilon = 1e-12);
    assert_eq!(mu[1], 0.15);
    assert_eq!(mu[2], 0.0);
  }

  #[test]
  fn covariance_is_annualized_sample_covariance() {
    let assets = vec![asset("a", &[0.01, 0.03, -0.02, 0.02]), asset("b", &[0.02, 0.06, -0.04, 0.04])];
    let cov = calculate_covariance_matrix(&assets).unwrap();

    // var(a) = 0.00046667 monthly, b = 2a
    assert_abs_diff_eq!(cov[0][0], 0.000_466_666_7 * 12.0, epsilon = 1e-9);
    assert_abs_diff_eq!(cov[1][1], 4.0 * cov[0][0], epsilon = 1e-12);
    assert_abs_diff_eq!(cov[0][1], 2.0 * cov[0][0], epsilon = 1e-12);
    assert_eq!(cov[0][1], cov[1][0]);

    let corr = calculate_correlation_matrix(&assets).unwrap();
    assert_abs_diff_eq!(corr[0][1], 1.0, epsilon = 1e-12);
  }

  #[test]
  fn rejects_bad_series() {
    assert!(matches!(calculate_covariance_matrix(&[]), Err(AnalyticsError::NoAssets)));
    assert!(matches!(
      calculate_covariance_matrix(&[asset("a", &[0.1, 0.2]), asset("b", &[0.1])]),
      Err(AnalyticsError::MisalignedReturns { expected: 2, found: 1, .. })
    ));
    assert!(matches!(
      calculate_covariance_matrix(&[asset("a", &[0.1, f64::NAN])]),
      Err(AnalyticsError::NonFiniteReturns { .. })
    ));
  }

  #[test]
  fn short_history_has_no_correlation() {
    let assets = vec![asset("a", &[0.01]), asset("b", &[0.02])];

    assert!(calculate_correlation_matrix(&assets).is_none());
    assert_eq!(calculate_covariance_matrix(&assets).unwrap(), vec![vec![0.0; 2]; 2]);
  }

  #[test]
  fn performance_and_diversification() {
    let cov = vec![vec![0.04, 0.0], vec![0.0, 0.04]];
    let (ret, vol) = portfolio_performance(&[0.5, 0.5], &[0.10, 0.20], &cov);

    assert_abs_diff_eq!(ret, 15.0, epsilon = 1e-12);
    assert_abs_diff_eq!(vol, 0.02f64.sqrt() * 100.0, epsilon = 1e-9);
    assert_abs_diff_eq!(diversification_ratio(&[0.5, 0.5], &cov), 2f64.sqrt(), epsilon = 1e-12);
    assert_eq!(diversification_ratio(&[0.5, 0.5], &vec![vec![0.0; 2]; 2]), 1.0);
    assert_eq!(diversification_ratio(&[0.5, 0.3, 0.2], &cov), 1.0);
    assert_eq!(diversification_ratio(&[1.0], &cov), 1.0);
  }

  #[test]
  fn asset_from_unordered_valuations() {
    let day = |d: u32| NaiveDate::from_ymd_opt(2024, 1, d).unwrap();
    let valuations = vec![
      Valuation::new(day(3), 121.0),
      Valuation::new(day(1), 100.0),
      Valuation::new(day(2), 110.0),
    ];
    let asset = asset_from_valuations("a", "A", "gold", &valuations);

    assert_eq!(asset.returns.len(), 2);
    assert_abs_diff_eq!(asset.returns[0], 0.1, epsilon = 1e-12);
    assert_abs_diff_eq!(asset.returns[1], 0.1, epsilon = 1e-12);
    assert!(asset.expected_return.is_none());
  }
}
