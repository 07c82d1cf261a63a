//! # Benchmarks
//!
//! $$
//! r_{\text{real}} = \frac{1+r_{\text{nominal}}}{1+\pi}-1
//! $$
//!
//! Fixed annual benchmark rates used for comparative metrics and as the default
//! discount / risk-free rate.

use serde::Deserialize;
use serde::Serialize;

/// Brazil CDI, used as the default discount and risk-free rate.
pub const DEFAULT_RISK_FREE_RATE: f64 = 0.1075;

/// Annual benchmark rates as fractions.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchmarkRates {
  /// Brazil target inflation.
  pub inflation: f64,
  /// Brazil CDI rate.
  pub cdi: f64,
  /// Brazil Selic rate.
  pub selic: f64,
  /// Long-run S&P 500 average.
  pub sp500_historical: f64,
  /// US 10-year Treasury yield.
  pub treasury_10y_us: f64,
}

impl Default for BenchmarkRates {
  fn default() -> Self {
    Self {
      inflation: 0.045,
      cdi: DEFAULT_RISK_FREE_RATE,
      selic: 0.115,
      sp500_historical: 0.10,
      treasury_10y_us: 0.042,
    }
  }
}

impl BenchmarkRates {
  /// Iterate the table as `(name, rate)` pairs.
  pub fn entries(&self) -> [(&'static str, f64); 5] {
    [
      ("inflation_br", self.inflation),
      ("cdi_br", self.cdi),
      ("selic_br", self.selic),
      ("sp500_historical", self.sp500_historical),
      ("treasury_10y_us", self.treasury_10y_us),
    ]
  }

  /// Real return (%) of an annual nominal return fraction after inflation.
  pub fn real_return(&self, nominal_annual: f64) -> f64 {
    ((1.0 + nominal_annual) / (1.0 + self.inflation) - 1.0) * 100.0
  }
}
