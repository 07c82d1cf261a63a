//! # Return Metrics
//!
//! $$
//! \text{NPV}(r)=\sum_{t=0}^{n-1}\frac{CF_t}{(1+r)^t},\qquad \text{NPV}(\text{IRR})=0
//! $$
//!
//! Time-value-of-money metrics over a single investment. Cash flows are indexed by
//! period in the order given; callers sort them chronologically first.

use roots::find_root_brent;
use roots::SimpleConvergency;

/// Lower edge of the IRR search, expressed as a rate.
const IRR_MIN_RATE: f64 = -0.999_999_999;
/// Upper edge of the IRR search, expressed as a rate (100000%).
const IRR_MAX_RATE: f64 = 1000.0;
/// Bracketing grid resolution over the growth-factor range.
const IRR_GRID_POINTS: usize = 2000;

/// Simple ROI in percent: `(current - initial) / initial * 100`.
///
/// Returns `0.0` when `initial <= 0`.
pub fn calculate_simple_roi(initial: f64, current: f64) -> f64 {
  if initial <= 0.0 || initial.is_nan() {
    return 0.0;
  }
  (current - initial) / initial * 100.0
}

/// Compound annual growth rate in percent: `((current / initial)^(1/years) - 1) * 100`.
///
/// Returns `0.0` for a non-positive `initial` or `years`, and whenever the power is
/// undefined (negative base) or overflows.
pub fn calculate_cagr(initial: f64, current: f64, years: f64) -> f64 {
  if initial <= 0.0 || years <= 0.0 {
    return 0.0;
  }

  let cagr = ((current / initial).powf(1.0 / years) - 1.0) * 100.0;
  if cagr.is_finite() {
    cagr
  } else {
    0.0
  }
}

/// Net present value of periodic cash flows at `discount_rate`; the first flow is
/// undiscounted. Empty input yields `0.0`.
pub fn calculate_npv(cash_flows: &[f64], discount_rate: f64) -> f64 {
  let factor = 1.0 + discount_rate;
  cash_flows
    .iter()
    .enumerate()
    .map(|(t, cf)| cf / factor.powi(t as i32))
    .sum()
}

/// Internal rate of return in percent.
///
/// Defined only for at least two finite flows containing both a strictly positive and
/// a strictly negative amount. Sign changes of the NPV are bracketed on a log-spaced
/// grid of growth factors and refined with Brent's method; when several roots exist
/// the one closest to zero is reported.
pub fn calculate_irr(cash_flows: &[f64]) -> Option<f64> {
  if cash_flows.len() < 2 || cash_flows.iter().any(|cf| !cf.is_finite()) {
    return None;
  }

  let has_positive = cash_flows.iter().any(|&cf| cf > 0.0);
  let has_negative = cash_flows.iter().any(|&cf| cf < 0.0);
  if !(has_positive && has_negative) {
    return None;
  }

  let npv = |rate: f64| calculate_npv(cash_flows, rate);

  let lo = (1.0 + IRR_MIN_RATE).ln();
  let hi = (1.0 + IRR_MAX_RATE).ln();
  let grid: Vec<(f64, f64)> = (0..=IRR_GRID_POINTS)
    .map(|i| {
      let growth = (lo + (hi - lo) * i as f64 / IRR_GRID_POINTS as f64).exp();
      let rate = growth - 1.0;
      (rate, npv(rate))
    })
    .filter(|(_, value)| value.is_finite())
    .collect();

  let mut roots = Vec::new();
  for pair in grid.windows(2) {
    let (a, fa) = pair[0];
    let (b, fb) = pair[1];

    if fa == 0.0 {
      roots.push(a);
      continue;
    }
    if fa * fb > 0.0 {
      continue;
    }
    if fb == 0.0 {
      // picked up as `fa == 0.0` on the next window
      continue;
    }

    let mut convergency = SimpleConvergency {
      eps: 1e-12,
      max_iter: 200,
    };
    if let Ok(root) = find_root_brent(a, b, npv, &mut convergency) {
      roots.push(root);
    }
  }

  roots
    .into_iter()
    .filter(|r| r.is_finite())
    .min_by(|a, b| a.abs().total_cmp(&b.abs()))
    .map(|r| r * 100.0)
    .filter(|irr| irr.is_finite())
}

/// Number of periods needed to recover the initial outflow `|cash_flows[0]|`,
/// interpolating linearly inside the period in which the cumulative inflow crosses it.
///
/// A non-negative first flow means nothing has to be recovered (`Some(0.0)`).
/// Returns `None` for fewer than two flows or when the outflow is never recovered.
pub fn calculate_payback_period(cash_flows: &[f64]) -> Option<f64> {
  if cash_flows.len() < 2 {
    return None;
  }

  let initial = if cash_flows[0] < 0.0 {
    cash_flows[0].abs()
  } else {
    0.0
  };
  if initial == 0.0 {
    return Some(0.0);
  }

  let mut cumulative = 0.0;
  for (period, &cf) in cash_flows.iter().enumerate().skip(1) {
    let previous = cumulative;
    cumulative += cf;
    if cumulative >= initial {
      let fraction = if cf > 0.0 {
        (initial - previous) / cf
      } else {
        0.0
      };
      return Some((period - 1) as f64 + fraction);
    }
  }

  None
}

/// Period-over-period fractional returns of a value series, skipping periods whose
/// previous value is exactly zero.
pub fn returns_from_values(values: &[f64]) -> Vec<f64> {
  values
    .windows(2)
    .filter(|w| w[0] != 0.0)
    .map(|w| (w[1] - w[0]) / w[0])
    .collect()
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;

  use super::*;

  #[test]
  fn simple_roi_profit_loss_and_zero_base() {
    assert_eq!(calculate_simple_roi(100_000.0, 120_000.0), 20.0);
    assert_eq!(calculate_simple_roi(100_000.0, 80_000.0), -20.0);
    assert_eq!(calculate_simple_roi(100_000.0, 100_000.0), 0.0);
    assert_eq!(calculate_simple_roi(0.0, 100_000.0), 0.0);
    assert_eq!(calculate_simple_roi(-5.0, 100_000.0), 0.0);
  }

  #[test]
  fn cagr_doubling_in_five_years() {
    assert_abs_diff_eq!(calculate_cagr(100_000.0, 200_000.0, 5.0), 14.87, epsilon = 0.1);
    assert_abs_diff_eq!(calculate_cagr(100_000.0, 300_000.0, 10.0), 11.61, epsilon = 0.1);
    assert!(calculate_cagr(100_000.0, 50_000.0, 5.0) < 0.0);
  }

  #[test]
  fn cagr_degenerate_inputs_are_zero() {
    assert_eq!(calculate_cagr(100_000.0, 200_000.0, 0.0), 0.0);
    assert_eq!(calculate_cagr(5.0, 7.0, -1.0), 0.0);
    assert_eq!(calculate_cagr(0.0, 200_000.0, 5.0), 0.0);
    // negative base with a fractional exponent
    assert_eq!(calculate_cagr(100.0, -50.0, 2.5), 0.0);
  }

  #[test]
  fn npv_zero_rate_is_plain_sum() {
    assert_eq!(calculate_npv(&[-1000.0, 400.0, 400.0, 400.0], 0.0), 200.0);
    assert_eq!(calculate_npv(&[], 0.1), 0.0);
    assert!(calculate_npv(&[-1000.0, 400.0, 400.0, 400.0], 0.10) > 0.0);
    assert!(calculate_npv(&[-1000.0, 100.0, 100.0, 100.0], 0.10) < 0.0);
  }

  #[test]
  fn irr_zeroes_npv() {
    let flows = [-1000.0, 400.0, 500.0, 600.0];
    let irr = calculate_irr(&flows).unwrap();

    assert_abs_diff_eq!(irr, 21.65, epsilon = 0.1);
    assert_abs_diff_eq!(calculate_npv(&flows, irr / 100.0), 0.0, epsilon = 1e-6);
  }

  #[test]
  fn irr_of_buy_and_hold_property() {
    let irr = calculate_irr(&[-500_000.0, 0.0, 0.0, 0.0, 0.0, 700_000.0]).unwrap();
    assert_abs_diff_eq!(irr, 7.0, epsilon = 0.5);
  }

  #[test]
  fn irr_total_loss_is_negative() {
    let irr = calculate_irr(&[-1000.0, 500.0]).unwrap();
    assert_abs_diff_eq!(irr, -50.0, epsilon = 1e-6);
  }

  #[test]
  fn irr_of_near_total_loss() {
    let irr = calculate_irr(&[-1000.0, 5.0]).unwrap();
    assert_abs_diff_eq!(irr, -99.5, epsilon = 1e-6);
  }

  #[test]
  fn irr_requires_both_signs_and_two_flows() {
    assert!(calculate_irr(&[-1000.0]).is_none());
    assert!(calculate_irr(&[0.0, 0.0, 0.0]).is_none());
    assert!(calculate_irr(&[100.0, 200.0, 300.0]).is_none());
    assert!(calculate_irr(&[-100.0, f64::NAN]).is_none());
  }

  #[test]
  fn payback_whole_and_partial_periods() {
    assert_eq!(calculate_payback_period(&[-1000.0, 500.0, 500.0]), Some(2.0));
    assert_abs_diff_eq!(
      calculate_payback_period(&[-1000.0, 400.0, 400.0, 400.0]).unwrap(),
      2.5,
      epsilon = 1e-12
    );
    assert!(calculate_payback_period(&[-1000.0, 100.0, 100.0, 100.0]).is_none());
    assert!(calculate_payback_period(&[-1000.0]).is_none());
    assert_eq!(calculate_payback_period(&[0.0, 10.0]), Some(0.0));
  }

  #[test]
  fn returns_from_values_skips_zero_bases() {
    let returns = returns_from_values(&[100.0, 105.0, 0.0, 50.0, 55.0]);

    assert_eq!(returns.len(), 3);
    assert_abs_diff_eq!(returns[0], 0.05, epsilon = 1e-12);
    assert_abs_diff_eq!(returns[1], -1.0, epsilon = 1e-12);
    assert_abs_diff_eq!(returns[2], 0.1, epsilon = 1e-12);
  }
}
