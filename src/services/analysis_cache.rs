use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::errors::AnalysisError;
use crate::models::{
    Constraints, MarketAssessment, MarketSnapshot, NewsSnapshot, OptimizationPlan,
    PortfolioSnapshot, RiskReport,
};
use crate::services::reference_data::ReferenceData;
use crate::services::{market_service, optimization_service, risk_service};

#[derive(Debug, Clone)]
struct CachedResult {
    payload: serde_json::Value,
    cached_at: DateTime<Utc>,
}

/// Thread-safe result cache wrapped around the analysis entry points.
///
/// Entries are keyed on `"{operation}:{canonical JSON of inputs}"`, so two
/// calls with equal inputs share a result until the TTL runs out. The
/// analysis functions themselves stay pure; this type is for callers that
/// want to skip repeated work.
#[derive(Clone)]
pub struct AnalysisCache {
    cache: Arc<DashMap<String, CachedResult>>,
    ttl_seconds: i64,
}

impl AnalysisCache {
    pub fn new(ttl_seconds: i64) -> Self {
        Self {
            cache: Arc::new(DashMap::new()),
            ttl_seconds,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.cache_ttl_seconds)
    }

    /// Deterministic key for an operation and its inputs.
    ///
    /// Inputs go through `serde_json::Value`, whose maps keep keys sorted.
    pub fn fingerprint<T: Serialize>(operation: &str, inputs: &T) -> Result<String, AnalysisError> {
        let canonical = serde_json::to_value(inputs)?;
        Ok(format!("{}:{}", operation, canonical))
    }

    /// Cached result for a key, if still within TTL.
    ///
    /// A payload that no longer decodes (non-finite floats are stored as
    /// `null`) is evicted and reported as a miss.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let entry = self.cache.get(key)?;
        let cached = entry.value().clone();
        drop(entry);

        if Utc::now() >= cached.cached_at + Duration::seconds(self.ttl_seconds) {
            self.cache.remove(key);
            return None;
        }

        match serde_json::from_value(cached.payload) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Evicting undecodable cache entry: {}", e);
                self.cache.remove(key);
                None
            }
        }
    }

    pub fn put<T: Serialize>(&self, key: String, value: &T) -> Result<(), AnalysisError> {
        let cached = CachedResult {
            payload: serde_json::to_value(value)?,
            cached_at: Utc::now(),
        };
        self.cache.insert(key, cached);
        Ok(())
    }

    /// Return the cached result for `(operation, inputs)` or compute and store it.
    ///
    /// Errors from `compute` are returned as-is and never cached.
    pub fn get_or_compute<I, T, F>(
        &self,
        operation: &str,
        inputs: &I,
        compute: F,
    ) -> Result<T, AnalysisError>
    where
        I: Serialize,
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Result<T, AnalysisError>,
    {
        let key = Self::fingerprint(operation, inputs)?;
        if let Some(hit) = self.get(&key) {
            debug!("Cache hit for {}", operation);
            return Ok(hit);
        }

        debug!("Cache miss for {}", operation);
        let result = compute()?;
        self.put(key, &result)?;
        Ok(result)
    }

    pub fn analyze_risk(
        &self,
        reference: &ReferenceData,
        portfolio: &PortfolioSnapshot,
        risk_threshold: f64,
    ) -> Result<RiskReport, AnalysisError> {
        let inputs = json!({
            "reference": reference,
            "portfolio": portfolio,
            "risk_threshold": risk_threshold,
        });
        self.get_or_compute("analyze_risk", &inputs, || {
            risk_service::analyze_risk_with(reference, portfolio, risk_threshold)
        })
    }

    pub fn optimize_portfolio(
        &self,
        reference: &ReferenceData,
        portfolio: &PortfolioSnapshot,
        current_risk: f64,
        target_risk: f64,
        constraints: &Constraints,
        market: Option<&MarketSnapshot>,
    ) -> Result<OptimizationPlan, AnalysisError> {
        let inputs = json!({
            "reference": reference,
            "portfolio": portfolio,
            "current_risk": current_risk,
            "target_risk": target_risk,
            "constraints": constraints,
            "market": market,
        });
        self.get_or_compute("optimize_portfolio", &inputs, || {
            optimization_service::optimize_portfolio_with(
                reference,
                portfolio,
                current_risk,
                target_risk,
                constraints,
                market,
            )
        })
    }

    /// Only fails if the assessment cannot be serialized for storage.
    pub fn assess_market(
        &self,
        market: &MarketSnapshot,
        news: &NewsSnapshot,
    ) -> Result<MarketAssessment, AnalysisError> {
        let inputs = json!({ "market": market, "news": news });
        self.get_or_compute("assess_market", &inputs, || {
            Ok(market_service::assess_market(market, news))
        })
    }

    /// Drop every entry past its TTL
    pub fn cleanup_expired(&self) {
        let now = Utc::now();
        let ttl = Duration::seconds(self.ttl_seconds);
        self.cache.retain(|_, cached| now < cached.cached_at + ttl);
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn clear(&self) {
        self.cache.clear();
    }
}

impl Default for AnalysisCache {
    fn default() -> Self {
        Self::new(300)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Asset, AssetType};
    use std::cell::Cell;

    fn portfolio() -> PortfolioSnapshot {
        PortfolioSnapshot::new(vec![
            Asset::new("AAPL", "Apple", AssetType::Equity, 10.0, 150.0),
            Asset::new("BND", "Bond ETF", AssetType::Bond, 20.0, 75.0),
        ])
    }

    #[test]
    fn test_fingerprint_is_key_order_independent() {
        let a = json!({"b": 1, "a": [1, 2]});
        let b = json!({"a": [1, 2], "b": 1});
        assert_eq!(
            AnalysisCache::fingerprint("op", &a).unwrap(),
            AnalysisCache::fingerprint("op", &b).unwrap()
        );
        assert_ne!(
            AnalysisCache::fingerprint("op", &a).unwrap(),
            AnalysisCache::fingerprint("other", &a).unwrap()
        );
    }

    #[test]
    fn test_get_or_compute_reuses_result() {
        let cache = AnalysisCache::new(60);
        let calls = Cell::new(0);
        let compute = || {
            calls.set(calls.get() + 1);
            Ok(42u32)
        };

        assert_eq!(cache.get_or_compute("answer", &"x", compute).unwrap(), 42);
        assert_eq!(cache.get_or_compute("answer", &"x", compute).unwrap(), 42);
        assert_eq!(calls.get(), 1);

        cache.get_or_compute("answer", &"y", compute).unwrap();
        assert_eq!(calls.get(), 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_errors_are_not_cached() {
        let cache = AnalysisCache::new(60);
        let result: Result<u32, _> = cache.get_or_compute("fail", &1, || {
            Err(AnalysisError::InvalidInput("nope".to_string()))
        });
        assert!(result.is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_zero_ttl_expires_immediately() {
        let cache = AnalysisCache::new(0);
        cache.put("k".to_string(), &1u32).unwrap();
        assert_eq!(cache.get::<u32>("k"), None);
        assert!(cache.is_empty());

        cache.put("k".to_string(), &1u32).unwrap();
        cache.cleanup_expired();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_cached_risk_matches_direct_call() {
        let cache = AnalysisCache::default();
        let reference = ReferenceData::default();

        let direct = risk_service::analyze_risk_with(&reference, &portfolio(), 0.5).unwrap();
        let first = cache.analyze_risk(&reference, &portfolio(), 0.5).unwrap();
        let second = cache.analyze_risk(&reference, &portfolio(), 0.5).unwrap();

        assert_eq!(direct, first);
        assert_eq!(first, second);
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_cached_assessment() {
        let cache = AnalysisCache::default();
        let market = MarketSnapshot::default();
        let news = NewsSnapshot::default();
        let assessment = cache.assess_market(&market, &news).unwrap();
        assert_eq!(assessment, market_service::assess_market(&market, &news));
    }

    #[test]
    fn test_undecodable_entry_is_a_miss() {
        let cache = AnalysisCache::new(60);
        cache.put("nan".to_string(), &f64::NAN).unwrap();
        assert_eq!(cache.len(), 1);

        assert_eq!(cache.get::<f64>("nan"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_non_finite_assessment_is_recomputed() {
        let cache = AnalysisCache::default();
        let market = MarketSnapshot {
            indices: vec![crate::models::IndexQuote {
                name: "S&P 500".to_string(),
                current_value: None,
                change_pct: f64::NAN,
            }],
            ..Default::default()
        };
        let news = NewsSnapshot::default();

        let first = cache.assess_market(&market, &news).unwrap();
        let second = cache.assess_market(&market, &news).unwrap();
        assert_eq!(first.market_summary, second.market_summary);
        assert_eq!(first.risk_factors, second.risk_factors);
    }

    #[test]
    fn test_from_config_uses_configured_ttl() {
        let config = EngineConfig {
            cache_ttl_seconds: 0,
            ..Default::default()
        };
        let cache = AnalysisCache::from_config(&config);
        cache.put("k".to_string(), &1u32).unwrap();
        assert_eq!(cache.get::<u32>("k"), None);

        let cache = AnalysisCache::from_config(&EngineConfig::default());
        cache.put("k".to_string(), &1u32).unwrap();
        assert_eq!(cache.get::<u32>("k"), Some(1));
    }
}
