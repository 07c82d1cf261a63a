//! # Errors
//!
//! Hard validation failures. Metrics that cannot be computed from the data at hand
//! are reported as `None`, never as an error.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AnalyticsError>;

#[derive(Error, Debug)]
pub enum AnalyticsError {
  #[error("at least 2 investments are required for comparison, got {found}")]
  InsufficientInvestments { found: usize },

  #[error("{what}: expected {expected} entries, got {found}")]
  LengthMismatch {
    what: &'static str,
    expected: usize,
    found: usize,
  },

  #[error("at least one asset is required for optimization")]
  NoAssets,

  #[error("return series of '{investment_id}' has {found} periods, expected {expected}")]
  MisalignedReturns {
    investment_id: String,
    expected: usize,
    found: usize,
  },

  #[error("return series of '{investment_id}' contains non-finite values")]
  NonFiniteReturns { investment_id: String },

  #[error("invalid weights: {0}")]
  InvalidWeights(String),

  #[error("invalid configuration: {0}")]
  InvalidConfig(String),

  #[error("serialization failed: {0}")]
  Serialization(#[from] serde_json::Error),
}
