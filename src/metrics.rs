//! # Metrics
//!
//! $$
//! \text{ROI}=\frac{V_T-V_0}{V_0}\cdot 100
//! $$
//!
//! Single-investment return and risk metrics and their portfolio aggregation.

pub mod engine;
pub mod returns;
pub mod risk;
pub mod types;

pub use engine::MetricsEngine;
pub use returns::calculate_cagr;
pub use returns::calculate_irr;
pub use returns::calculate_npv;
pub use returns::calculate_payback_period;
pub use returns::calculate_simple_roi;
pub use returns::returns_from_values;
pub use risk::PERIODS_PER_YEAR;
pub use risk::calculate_max_drawdown;
pub use risk::calculate_sharpe_ratio;
pub use risk::calculate_var_95;
pub use risk::calculate_volatility;
pub use types::CashFlow;
pub use types::InvestmentInput;
pub use types::InvestmentMetrics;
pub use types::PerformerSummary;
pub use types::PortfolioMetrics;
pub use types::Valuation;
