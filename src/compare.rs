//! # Compare
//!
//! $$
//! s_i=\sum_k w_k\,n_k(x_{k,i})\in[0,100]
//! $$
//!
//! Composite scoring, rankings, what-if scenarios and rule-based advice across two or
//! more investments.

pub mod comparator;
pub mod scenarios;
pub mod scoring;
pub mod types;
pub mod weights;

pub use comparator::InvestmentComparator;
pub use scenarios::Scenario;
pub use scenarios::ScenarioImpact;
pub use scenarios::ScenarioResult;
pub use scenarios::apply_scenarios;
pub use scoring::calculate_composite_score;
pub use scoring::calculate_liquidity_score;
pub use scoring::calmar_ratio;
pub use scoring::normalize_score;
pub use types::ComparisonResult;
pub use types::InvestmentSummary;
pub use types::RiskAdjustedEntry;
pub use types::RiskDistribution;
pub use types::RiskLevel;
pub use types::ScoredInvestment;
pub use types::Winner;
pub use weights::RiskProfile;
pub use weights::ScoringWeights;
