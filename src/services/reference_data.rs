use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::AnalysisError;

/// Beta assumed for symbols missing from the beta table
pub const DEFAULT_BETA: f64 = 1.0;

/// Lookup tables used by the risk model and the optimizer.
///
/// Both tables are small approximations. Callers with real market-derived
/// values can load their own tables with [`ReferenceData::from_json_file`] or
/// build one directly and pass it to the `*_with` entry points.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReferenceData {
    /// Sector name -> member symbols
    #[serde(default)]
    pub sectors: BTreeMap<String, Vec<String>>,
    /// Symbol -> beta
    #[serde(default)]
    pub betas: BTreeMap<String, f64>,
}

impl Default for ReferenceData {
    fn default() -> Self {
        let sectors = [
            ("Technology", &["AAPL", "MSFT", "GOOGL", "META", "NVDA"][..]),
            ("E-commerce", &["AMZN"]),
            ("Financial", &["BRK.B", "JPM", "V"]),
            ("Healthcare", &["JNJ", "UNH"]),
            ("Consumer", &["PG"]),
            ("Energy", &["XOM", "CVX"]),
            ("Industrials", &["HON", "CAT", "GE"]),
            ("Utilities", &["NEE", "DUK", "SO"]),
            ("Real Estate", &["AMT", "PLD", "SPG"]),
            ("Telecom", &["T", "VZ", "TMUS"]),
        ]
        .into_iter()
        .map(|(sector, symbols)| {
            (
                sector.to_string(),
                symbols.iter().map(|s| s.to_string()).collect(),
            )
        })
        .collect();

        let betas = [
            ("AAPL", 1.25),
            ("MSFT", 1.15),
            ("AMZN", 1.40),
            ("GOOGL", 1.20),
            ("META", 1.35),
            ("TSLA", 1.60),
            ("NVDA", 1.45),
            ("BRK.B", 0.85),
            ("JPM", 1.30),
            ("JNJ", 0.70),
            ("UNH", 0.80),
            ("V", 1.10),
            ("PG", 0.60),
            ("HD", 1.05),
            ("XOM", 0.95),
        ]
        .into_iter()
        .map(|(symbol, beta)| (symbol.to_string(), beta))
        .collect();

        Self { sectors, betas }
    }
}

impl ReferenceData {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, AnalysisError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AnalysisError::ReferenceData(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let data: ReferenceData = serde_json::from_str(&raw).map_err(|e| {
            AnalysisError::ReferenceData(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        data.validate()?;

        info!(
            "Loaded reference data from {} ({} sectors, {} betas)",
            path.display(),
            data.sectors.len(),
            data.betas.len()
        );
        Ok(data)
    }

    pub fn validate(&self) -> Result<(), AnalysisError> {
        if let Some((symbol, beta)) = self.betas.iter().find(|(_, b)| !b.is_finite() || **b < 0.0) {
            return Err(AnalysisError::ReferenceData(format!(
                "Beta for {} must be a non-negative number, got {}",
                symbol, beta
            )));
        }
        Ok(())
    }

    /// First sector (in name order) listing the symbol
    pub fn sector_of(&self, symbol: &str) -> Option<&str> {
        self.sectors
            .iter()
            .find(|(_, symbols)| symbols.iter().any(|s| s == symbol))
            .map(|(sector, _)| sector.as_str())
    }

    pub fn beta_of(&self, symbol: &str) -> f64 {
        match self.betas.get(symbol) {
            Some(beta) => *beta,
            None => {
                debug!("No beta on record for {}, using {}", symbol, DEFAULT_BETA);
                DEFAULT_BETA
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tables() {
        let data = ReferenceData::default();
        assert_eq!(data.sectors.len(), 10);
        assert_eq!(data.betas.len(), 15);
        assert_eq!(data.sector_of("NVDA"), Some("Technology"));
        assert_eq!(data.sector_of("TSLA"), None);
        assert_eq!(data.beta_of("TSLA"), 1.60);
        assert_eq!(data.beta_of("UNKNOWN"), DEFAULT_BETA);
    }

    #[test]
    fn test_partial_json_tables() {
        let data: ReferenceData =
            serde_json::from_str(r#"{"betas": {"ABC": 1.8}}"#).unwrap();
        assert!(data.sectors.is_empty());
        assert_eq!(data.beta_of("ABC"), 1.8);
        assert!(data.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_negative_beta() {
        let mut data = ReferenceData::default();
        data.betas.insert("BAD".to_string(), -0.5);
        assert!(matches!(data.validate(), Err(AnalysisError::ReferenceData(_))));
    }

    #[test]
    fn test_missing_file_is_reference_error() {
        let result = ReferenceData::from_json_file("/nonexistent/reference.json");
        assert!(matches!(result, Err(AnalysisError::ReferenceData(_))));
    }
}
