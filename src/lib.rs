//! # Prism Analytics
//!
//! $$
//! \text{valuations}\to\text{metrics}\to(\text{comparison}\mid\text{allocation})
//! $$
//!
//! Financial analytics engine behind the Prism investment dashboard.
//!
//! * [`metrics`] - single-investment return and risk metrics plus portfolio roll-ups.
//! * [`compare`] - composite scoring, rankings, what-if scenarios and recommendations.
//! * [`portfolio`] - Markowitz mean-variance optimization and the efficient frontier.
//!
//! Every entry point is a pure computation over its inputs. Engines only hold the
//! read-only configuration they were built with, so they can be shared across threads.
//!
//! Periodic return series are assumed to be monthly throughout (annualization uses
//! `sqrt(12)`, `12` and `(1+r)^12`). The engine does not infer the period length.

pub mod benchmarks;
pub mod compare;
pub mod config;
pub mod error;
pub mod metrics;
pub mod portfolio;
pub mod report;

pub use benchmarks::BenchmarkRates;
pub use benchmarks::DEFAULT_RISK_FREE_RATE;
pub use config::AnalyticsConfig;
pub use config::SolverConfig;
pub use error::AnalyticsError;
pub use error::Result;
