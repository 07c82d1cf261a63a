//! # Risk Metrics
//!
//! $$
//! \sigma_{\text{ann}}=\sigma_m\sqrt{12},\qquad
//! S=\frac{(1+\bar r_m)^{12}-1-r_f}{\sigma_m\sqrt{12}}
//! $$
//!
//! Dispersion and tail measures over periodic returns. Annualization assumes monthly
//! periods; the series must already be in chronological order. A series containing a
//! non-finite sample yields `None`.

use statrs::statistics::Statistics;

/// Periods per year implied by the monthly-return convention.
pub const PERIODS_PER_YEAR: f64 = 12.0;

const MIN_VAR_SAMPLES: usize = 5;

fn all_finite(xs: &[f64]) -> bool {
  xs.iter().all(|x| x.is_finite())
}

fn finite(x: f64) -> Option<f64> {
  x.is_finite().then_some(x)
}

/// Sample standard deviation (N-1) of the returns in percent, optionally annualized
/// by `sqrt(12)`. `None` with fewer than two samples.
pub fn calculate_volatility(returns: &[f64], annualize: bool) -> Option<f64> {
  if returns.len() < 2 || !all_finite(returns) {
    return None;
  }

  let mut std_dev = returns.iter().std_dev();
  if annualize {
    std_dev *= PERIODS_PER_YEAR.sqrt();
  }
  finite(std_dev * 100.0)
}

/// Sharpe ratio of periodic returns against an annual `risk_free_rate`.
///
/// When annualizing, the mean is compounded as `(1+mean)^12 - 1` and the deviation
/// scaled by `sqrt(12)`. `None` with fewer than two samples or zero dispersion.
pub fn calculate_sharpe_ratio(returns: &[f64], risk_free_rate: f64, annualize: bool) -> Option<f64> {
  if returns.len() < 2 || !all_finite(returns) {
    return None;
  }

  let mean = returns.iter().mean();
  let std_dev = returns.iter().std_dev();
  if std_dev < 1e-15 {
    return None;
  }

  let sharpe = if annualize {
    let mean_annual = (1.0 + mean).powf(PERIODS_PER_YEAR) - 1.0;
    let vol_annual = std_dev * PERIODS_PER_YEAR.sqrt();
    (mean_annual - risk_free_rate) / vol_annual
  } else {
    (mean - risk_free_rate) / std_dev
  };
  finite(sharpe)
}

/// Largest peak-to-trough decline of a value series, in percent.
pub fn calculate_max_drawdown(values: &[f64]) -> Option<f64> {
  if values.len() < 2 || !all_finite(values) {
    return None;
  }

  let mut peak = values[0];
  let mut max_drawdown: f64 = 0.0;
  for &value in values {
    if value > peak {
      peak = value;
    }
    let drawdown = if peak > 0.0 {
      (peak - value) / peak
    } else {
      0.0
    };
    max_drawdown = max_drawdown.max(drawdown);
  }

  Some(max_drawdown * 100.0)
}

/// Historical 95% value-at-risk: magnitude of the 5th percentile return, in percent.
/// Needs at least five samples.
pub fn calculate_var_95(returns: &[f64]) -> Option<f64> {
  if returns.len() < MIN_VAR_SAMPLES || !all_finite(returns) {
    return None;
  }

  let mut sorted = returns.to_vec();
  sorted.sort_by(f64::total_cmp);
  finite(percentile_linear(&sorted, 0.05).abs() * 100.0)
}

/// Percentile of an ascending sample with linear interpolation between order
/// statistics (rank `q * (n-1)`).
pub(crate) fn percentile_linear(sorted: &[f64], q: f64) -> f64 {
  match sorted.len() {
    0 => 0.0,
    1 => sorted[0],
    n => {
      let rank = q.clamp(0.0, 1.0) * (n - 1) as f64;
      let lo = rank.floor() as usize;
      let hi = rank.ceil() as usize;
      let frac = rank - lo as f64;
      sorted[lo] + (sorted[hi] - sorted[lo]) * frac
    }
  }
}
