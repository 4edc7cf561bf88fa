use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::models::portfolio::AssetClassAllocation;

/// Portfolio-level volatility estimates.
///
/// All values are fractions (0.15 for 15%), except beta and Sharpe which are ratios.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct VolatilityMetrics {
    /// Equity-weighted beta scaled by the equity allocation
    pub portfolio_beta: f64,

    /// Allocation-weighted annualized volatility
    pub portfolio_volatility: f64,

    /// 95% one-year Value at Risk, as a positive loss fraction
    pub value_at_risk_95: f64,

    /// Estimated peak-to-trough decline, as a positive fraction
    pub max_drawdown: f64,

    pub sharpe_ratio: f64,
}

/// A holding whose risk score exceeded the requested threshold.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HighRiskAsset {
    pub symbol: String,
    pub name: String,
    /// Risk score clamped to [0, 1]
    pub risk_score: f64,
    pub allocation: f64,
    pub risk_factors: Vec<String>,
}

/// Pairwise asset-class correlations.
///
/// These are fixed long-run estimates, not computed from price history.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CorrelationMatrix {
    pub stocks_bonds: f64,
    pub stocks_alternatives: f64,
    pub stocks_cash: f64,
    pub bonds_alternatives: f64,
    pub bonds_cash: f64,
    pub alternatives_cash: f64,
}

impl Default for CorrelationMatrix {
    fn default() -> Self {
        Self {
            stocks_bonds: -0.2,
            stocks_alternatives: 0.3,
            stocks_cash: 0.0,
            bonds_alternatives: 0.1,
            bonds_cash: 0.0,
            alternatives_cash: 0.0,
        }
    }
}

/// Risk level classification based on a 0-1 score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
}

impl RiskLevel {
    pub fn from_score(score: f64) -> Self {
        if score < 0.4 {
            RiskLevel::Low
        } else if score < 0.7 {
            RiskLevel::Moderate
        } else {
            RiskLevel::High
        }
    }
}

/// Complete risk analysis of a portfolio snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RiskReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portfolio_id: Option<Uuid>,
    pub total_value: f64,
    pub asset_class_allocation: AssetClassAllocation,

    /// Sector name -> fraction of the *total* portfolio (equities only, zero sectors omitted)
    pub sector_allocation: BTreeMap<String, f64>,

    pub volatility_metrics: VolatilityMetrics,
    pub high_risk_assets: Vec<HighRiskAsset>,

    /// Overall risk score clamped to [0, 1]
    pub overall_risk_score: f64,
    pub risk_level: RiskLevel,
    pub correlation_matrix: CorrelationMatrix,
    pub risk_threshold_used: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_level_classification() {
        assert_eq!(RiskLevel::from_score(0.2), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(0.5), RiskLevel::Moderate);
        assert_eq!(RiskLevel::from_score(0.8), RiskLevel::High);
    }

    #[test]
    fn test_correlation_matrix_defaults() {
        let matrix = CorrelationMatrix::default();
        assert_eq!(matrix.stocks_bonds, -0.2);
        assert_eq!(matrix.stocks_alternatives, 0.3);
        assert_eq!(matrix.bonds_alternatives, 0.1);
        assert_eq!(matrix.alternatives_cash, 0.0);
    }
}
