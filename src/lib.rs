//! Portfolio risk analysis, rebalancing and market assessment.
//!
//! The three entry points are pure functions over typed snapshots:
//! [`analyze_risk`], [`optimize_portfolio`] and [`assess_market`]. Caching
//! ([`AnalysisCache`]) and the optional model advisor
//! ([`services::advisor_service`]) are layered on top by the caller.

pub mod config;
pub mod errors;
pub mod logging;
pub mod models;
pub mod services;

pub use config::{AdvisorConfig, EngineConfig};
pub use errors::{AdvisorError, AnalysisError};
pub use models::*;
pub use services::advisor_service::{
    advisor_from_config, assess_with_advisor, optimize_with_advisor, AnalysisAdvisor,
    OpenAiAdvisor,
};
pub use services::analysis_cache::AnalysisCache;
pub use services::market_service::assess_market;
pub use services::optimization_service::{optimize_portfolio, optimize_portfolio_with};
pub use services::reference_data::ReferenceData;
pub use services::risk_service::{analyze_risk, analyze_risk_with};
