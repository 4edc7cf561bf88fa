pub mod advisor_service;
pub mod analysis_cache;
pub mod market_service;
pub mod optimization_service;
pub mod reference_data;
pub mod risk_service;
pub mod sentiment_service;
