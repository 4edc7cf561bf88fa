use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::portfolio::{AssetClassAllocation, AssetType};

/// Limits applied when deriving a target allocation.
///
/// Every field is a fraction in [0, 1]. Missing fields take their defaults
/// when deserialized, so callers may override only what they need.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Constraints {
    #[serde(default = "default_max_allocation_per_asset")]
    pub max_allocation_per_asset: f64,
    #[serde(default = "default_min_bonds_allocation")]
    pub min_bonds_allocation: f64,
    #[serde(default = "default_max_alternatives_allocation")]
    pub max_alternatives_allocation: f64,
    /// Minimum combined bond + cash share. Reported, not enforced.
    #[serde(default = "default_liquidity_requirement")]
    pub liquidity_requirement: f64,
}

fn default_max_allocation_per_asset() -> f64 {
    0.20
}

fn default_min_bonds_allocation() -> f64 {
    0.15
}

fn default_max_alternatives_allocation() -> f64 {
    0.10
}

fn default_liquidity_requirement() -> f64 {
    0.30
}

impl Default for Constraints {
    fn default() -> Self {
        Self {
            max_allocation_per_asset: default_max_allocation_per_asset(),
            min_bonds_allocation: default_min_bonds_allocation(),
            max_alternatives_allocation: default_max_alternatives_allocation(),
            liquidity_requirement: default_liquidity_requirement(),
        }
    }
}

/// Action to take for a recommended trade
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TradeAction {
    Increase,
    Reduce,
    Add,
    Sell,
    IncreaseCash,
    DecreaseCash,
}

impl TradeAction {
    pub fn is_buy(&self) -> bool {
        matches!(self, TradeAction::Increase | TradeAction::Add | TradeAction::IncreaseCash)
    }
}

/// A single rebalancing step
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendedTrade {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub asset_class: AssetType,
    pub action: TradeAction,
    /// Absent for instruments the portfolio does not hold yet
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_allocation: Option<f64>,
    pub target_allocation: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_price: Option<f64>,
    pub rationale: String,
}

impl RecommendedTrade {
    /// Absolute allocation change implied by this trade
    pub fn allocation_delta(&self) -> f64 {
        (self.target_allocation - self.current_allocation.unwrap_or(0.0)).abs()
    }
}

/// Return/risk estimate for one side of the comparison
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct OutcomeMetrics {
    pub expected_annual_return: f64,
    pub volatility: f64,
    pub sharpe_ratio: f64,
}

/// Projected effect of applying the recommended trades
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ExpectedImpact {
    pub current_portfolio: OutcomeMetrics,
    pub optimized_portfolio: OutcomeMetrics,
    pub rebalancing_cost_estimate: f64,
    /// Zero unless the target risk is below the current risk
    pub risk_reduction: f64,
    /// Zero unless the optimized return exceeds the current return
    pub return_enhancement: f64,
}

/// Liquidity requirement evaluated against the target allocation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct LiquidityCheck {
    pub required: f64,
    /// Target bond + cash allocation
    pub projected: f64,
    pub satisfied: bool,
}

/// Where an analysis result came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisSource {
    #[default]
    RuleBased,
    Advisor,
}

/// Complete optimization plan for a portfolio
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OptimizationPlan {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portfolio_id: Option<Uuid>,
    pub current_risk_score: f64,
    pub target_risk_score: f64,
    pub constraints_applied: Constraints,
    pub current_allocation: AssetClassAllocation,
    pub target_allocation: AssetClassAllocation,
    pub recommended_trades: Vec<RecommendedTrade>,
    pub expected_impact: ExpectedImpact,
    pub liquidity_check: LiquidityCheck,
    pub optimization_strategy: String,
    #[serde(default)]
    pub source: AnalysisSource,
}
