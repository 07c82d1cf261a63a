//! # Portfolio
//!
//! $$
//! \sigma_p^2 = \mathbf{w}^\top \Sigma \mathbf{w}
//! $$
//!
//! Long-only Markowitz mean-variance optimization, the efficient frontier and
//! rebalancing advice.

pub mod data;
pub mod engine;
pub mod optimizers;
pub(crate) mod solver;
pub mod types;

pub use data::asset_from_valuations;
pub use data::calculate_correlation_matrix;
pub use data::calculate_covariance_matrix;
pub use data::calculate_expected_returns;
pub use data::correlation_from_covariance;
pub use data::diversification_ratio;
pub use data::portfolio_performance;
pub use data::validate_assets;
pub use engine::PortfolioOptimizer;
pub use optimizers::OptimizedWeights;
pub use optimizers::frontier_targets;
pub use optimizers::max_sharpe;
pub use optimizers::min_volatility;
pub use optimizers::min_volatility_at_target;
pub use types::AssetReturn;
pub use types::DiversificationAssessment;
pub use types::DiversificationBenefit;
pub use types::EfficientFrontierPoint;
pub use types::OptimizationResult;
pub use types::PortfolioAllocation;
pub use types::PortfolioPerformance;
pub use types::RebalancingAction;
pub use types::Recommendation;
pub use types::RiskAnalysis;
pub use types::SolverStatus;
pub use types::TradeAction;
