use std::path::PathBuf;
use std::str::FromStr;

use crate::models::Constraints;

/// Configuration for the optional advisory model
#[derive(Debug, Clone)]
pub struct AdvisorConfig {
    pub enabled: bool,
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: usize,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: None,
            model: "gpt-4o".to_string(),
            max_tokens: 2048,
            temperature: 0.7,
            timeout_secs: 30,
        }
    }
}

impl AdvisorConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            enabled: env_or("LLM_ENABLED", defaults.enabled),
            api_key: std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty()),
            model: std::env::var("OPENAI_MODEL").unwrap_or(defaults.model),
            max_tokens: env_or("LLM_MAX_TOKENS", defaults.max_tokens),
            temperature: env_or("LLM_TEMPERATURE", defaults.temperature),
            timeout_secs: env_or("LLM_TIMEOUT_SECS", defaults.timeout_secs),
        }
    }
}

/// Engine-wide settings read once at startup by the calling layer
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub risk_threshold: f64,
    pub constraints: Constraints,
    pub cache_ttl_seconds: i64,
    pub reference_data_path: Option<PathBuf>,
    pub advisor: AdvisorConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            risk_threshold: 0.5,
            constraints: Constraints::default(),
            cache_ttl_seconds: 300,
            reference_data_path: None,
            advisor: AdvisorConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let base = defaults.constraints;

        Self {
            risk_threshold: env_or("RISK_THRESHOLD", defaults.risk_threshold),
            constraints: Constraints {
                max_allocation_per_asset: env_or("MAX_ALLOCATION_PER_ASSET", base.max_allocation_per_asset),
                min_bonds_allocation: env_or("MIN_BONDS_ALLOCATION", base.min_bonds_allocation),
                max_alternatives_allocation: env_or(
                    "MAX_ALTERNATIVES_ALLOCATION",
                    base.max_alternatives_allocation,
                ),
                liquidity_requirement: env_or("LIQUIDITY_REQUIREMENT", base.liquidity_requirement),
            },
            cache_ttl_seconds: env_or("CACHE_TTL_SECONDS", defaults.cache_ttl_seconds),
            reference_data_path: std::env::var("REFERENCE_DATA_PATH").ok().map(PathBuf::from),
            advisor: AdvisorConfig::from_env(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        let fractions = [
            ("RISK_THRESHOLD", self.risk_threshold),
            ("MAX_ALLOCATION_PER_ASSET", self.constraints.max_allocation_per_asset),
            ("MIN_BONDS_ALLOCATION", self.constraints.min_bonds_allocation),
            ("MAX_ALTERNATIVES_ALLOCATION", self.constraints.max_alternatives_allocation),
            ("LIQUIDITY_REQUIREMENT", self.constraints.liquidity_requirement),
        ];
        for (name, value) in fractions {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("{} must be within [0, 1], got {}", name, value));
            }
        }
        if self.cache_ttl_seconds < 0 {
            return Err("CACHE_TTL_SECONDS must not be negative".to_string());
        }
        Ok(())
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.risk_threshold, 0.5);
        assert_eq!(config.cache_ttl_seconds, 300);
        assert!(!config.advisor.enabled);
    }

    #[test]
    fn test_validate_rejects_out_of_range_constraint() {
        let mut config = EngineConfig::default();
        config.constraints.min_bonds_allocation = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_advisor_without_key_is_not_a_config_error() {
        let mut config = EngineConfig::default();
        config.advisor.enabled = true;
        assert!(config.validate().is_ok());
        assert!(crate::services::advisor_service::advisor_from_config(&config.advisor).is_none());
    }
}
