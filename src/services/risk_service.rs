use std::collections::BTreeMap;
use std::sync::OnceLock;

use tracing::{debug, info};

use crate::errors::{ensure_fraction, AnalysisError};
use crate::models::{
    Asset, AssetClassAllocation, AssetType, CorrelationMatrix, HighRiskAsset, PortfolioSnapshot,
    RiskLevel, RiskReport, VolatilityMetrics,
};
use crate::services::reference_data::ReferenceData;

/// Annual risk-free rate used by the Sharpe estimate
pub const RISK_FREE_RATE: f64 = 0.04;

/// Sector share of the portfolio above which concentration is penalized
const SECTOR_CONCENTRATION_LIMIT: f64 = 0.25;

/// Built-in lookup tables shared by the plain entry points.
pub(crate) fn builtin_reference() -> &'static ReferenceData {
    static BUILTIN: OnceLock<ReferenceData> = OnceLock::new();
    BUILTIN.get_or_init(ReferenceData::default)
}

/// Typical annualized volatility of an asset class
pub fn class_volatility(asset_type: AssetType) -> f64 {
    match asset_type {
        AssetType::Equity => 0.15,
        AssetType::Bond => 0.05,
        AssetType::Alternative => 0.12,
        AssetType::Cash => 0.01,
    }
}

/// Intrinsic risk of holding an asset class, used in the per-asset score
fn asset_type_risk(asset_type: AssetType) -> f64 {
    match asset_type {
        AssetType::Equity => 0.7,
        AssetType::Bond => 0.3,
        AssetType::Alternative => 0.6,
        AssetType::Cash => 0.1,
    }
}

/// Weight of an asset class in the allocation component of the overall score
fn class_risk_weight(asset_type: AssetType) -> f64 {
    match asset_type {
        AssetType::Equity => 0.7,
        AssetType::Alternative => 0.5,
        AssetType::Bond => 0.2,
        AssetType::Cash => 0.0,
    }
}

/// Risk score of a single holding together with the reasons behind it
#[derive(Debug, Clone, PartialEq)]
pub struct AssetRisk {
    /// Clamped to [0, 1]
    pub score: f64,
    pub factors: Vec<String>,
}

/// Reject snapshots the engine cannot analyze and return their total value.
pub(crate) fn validate_portfolio(portfolio: &PortfolioSnapshot) -> Result<f64, AnalysisError> {
    if portfolio.assets.is_empty() {
        return Err(AnalysisError::InvalidInput(
            "Portfolio contains no assets".to_string(),
        ));
    }

    let total_value = portfolio.total_value();
    if !total_value.is_finite() || total_value <= 0.0 {
        return Err(AnalysisError::InvalidInput(format!(
            "Portfolio total value must be positive, got {}",
            total_value
        )));
    }

    Ok(total_value)
}

/// Analyze a portfolio with the built-in sector and beta tables.
///
/// Assets whose risk score is strictly greater than `risk_threshold` are
/// reported in `high_risk_assets`.
pub fn analyze_risk(
    portfolio: &PortfolioSnapshot,
    risk_threshold: f64,
) -> Result<RiskReport, AnalysisError> {
    analyze_risk_with(builtin_reference(), portfolio, risk_threshold)
}

/// Analyze a portfolio against caller-supplied reference tables.
pub fn analyze_risk_with(
    reference: &ReferenceData,
    portfolio: &PortfolioSnapshot,
    risk_threshold: f64,
) -> Result<RiskReport, AnalysisError> {
    ensure_fraction("risk_threshold", risk_threshold)?;
    let total_value = validate_portfolio(portfolio)?;

    info!(
        "Analyzing risk for portfolio {:?} ({} assets, threshold {})",
        portfolio.portfolio_id,
        portfolio.assets.len(),
        risk_threshold
    );

    let allocation = portfolio.class_allocation(total_value);
    let sector_allocation = compute_sector_allocation(reference, portfolio, total_value);
    let volatility_metrics = compute_volatility_metrics(reference, portfolio, &allocation);

    let high_risk_assets: Vec<HighRiskAsset> = portfolio
        .assets
        .iter()
        .filter_map(|asset| {
            let asset_allocation = asset.value() / total_value;
            let risk = score_asset(reference, asset, asset_allocation, &sector_allocation);
            (risk.score > risk_threshold).then(|| HighRiskAsset {
                symbol: asset.symbol.clone(),
                name: asset.name.clone(),
                risk_score: risk.score,
                allocation: asset_allocation,
                risk_factors: risk.factors,
            })
        })
        .collect();

    let overall_risk_score = score_portfolio(&allocation, &sector_allocation, &volatility_metrics);

    debug!(
        "Risk analysis: volatility={:.4}, beta={:.2}, overall={:.4}, high-risk assets={}",
        volatility_metrics.portfolio_volatility,
        volatility_metrics.portfolio_beta,
        overall_risk_score,
        high_risk_assets.len()
    );

    Ok(RiskReport {
        portfolio_id: portfolio.portfolio_id,
        total_value,
        asset_class_allocation: allocation,
        sector_allocation,
        volatility_metrics,
        high_risk_assets,
        overall_risk_score,
        risk_level: RiskLevel::from_score(overall_risk_score),
        correlation_matrix: CorrelationMatrix::default(),
        risk_threshold_used: risk_threshold,
    })
}

/// Share of the total portfolio held in each known equity sector.
///
/// Only sectors with a positive allocation are returned.
pub fn compute_sector_allocation(
    reference: &ReferenceData,
    portfolio: &PortfolioSnapshot,
    total_value: f64,
) -> BTreeMap<String, f64> {
    if total_value <= 0.0 {
        return BTreeMap::new();
    }

    reference
        .sectors
        .iter()
        .filter_map(|(sector, symbols)| {
            let value: f64 = portfolio
                .assets_of(AssetType::Equity)
                .filter(|asset| symbols.iter().any(|s| *s == asset.symbol))
                .map(Asset::value)
                .sum();
            let share = value / total_value;
            (share > 0.0).then(|| (sector.clone(), share))
        })
        .collect()
}

fn compute_volatility_metrics(
    reference: &ReferenceData,
    portfolio: &PortfolioSnapshot,
    allocation: &AssetClassAllocation,
) -> VolatilityMetrics {
    let equity_value: f64 = portfolio.assets_of(AssetType::Equity).map(Asset::value).sum();

    let weighted_beta = if equity_value > 0.0 {
        portfolio
            .assets_of(AssetType::Equity)
            .map(|asset| reference.beta_of(&asset.symbol) * asset.value() / equity_value)
            .sum()
    } else {
        0.0
    };

    let portfolio_volatility: f64 = AssetType::ALL
        .iter()
        .map(|t| allocation.get(*t) * class_volatility(*t))
        .sum();

    VolatilityMetrics {
        portfolio_beta: weighted_beta * allocation.equity,
        portfolio_volatility,
        value_at_risk_95: 1.65 * portfolio_volatility,
        max_drawdown: 2.5 * portfolio_volatility,
        sharpe_ratio: sharpe_ratio(portfolio_volatility),
    }
}

/// Sharpe ratio under the simplified premium model (return = rf + 0.5 x volatility).
fn sharpe_ratio(volatility: f64) -> f64 {
    if volatility == 0.0 {
        return 0.0;
    }
    let expected_return = RISK_FREE_RATE + volatility * 0.5;
    (expected_return - RISK_FREE_RATE) / volatility
}

/// Score a single holding on a 0-1 scale.
///
/// # Components
/// - 30% of the asset class's intrinsic risk
/// - up to 0.3 for a position above 10% of the portfolio
/// - 0.2 for an equity whose sector exceeds 25% of the portfolio
/// - 0.2 x (beta - 1) for an equity with beta above 1.2
pub fn score_asset(
    reference: &ReferenceData,
    asset: &Asset,
    allocation: f64,
    sector_allocation: &BTreeMap<String, f64>,
) -> AssetRisk {
    let mut factors = Vec::new();
    let mut score = asset_type_risk(asset.asset_type) * 0.3;

    if allocation > 0.1 {
        factors.push(format!(
            "High concentration ({}% of portfolio)",
            (allocation * 100.0) as u32
        ));
        score += (allocation * 2.0).min(0.3);
    }

    if asset.asset_type == AssetType::Equity {
        if let Some(sector) = reference.sector_of(&asset.symbol) {
            let sector_share = sector_allocation.get(sector).copied().unwrap_or(0.0);
            if sector_share > SECTOR_CONCENTRATION_LIMIT {
                factors.push(format!("High sector concentration in {}", sector));
                score += 0.2;
            }
        }

        let beta = reference.beta_of(&asset.symbol);
        if beta > 1.2 {
            factors.push(format!("High volatility (beta = {})", beta));
            score += (beta - 1.0) * 0.2;
        }
    }

    AssetRisk {
        score: score.clamp(0.0, 1.0),
        factors,
    }
}

/// Combine allocation, concentration and volatility into the overall 0-1 score.
///
/// # Weighting
/// - 40% class mix (equity 0.7, alternative 0.5, bond 0.2)
/// - 0.8 x the largest sector share above 25%
/// - 40% volatility (normalized to 20% max)
pub fn score_portfolio(
    allocation: &AssetClassAllocation,
    sector_allocation: &BTreeMap<String, f64>,
    volatility: &VolatilityMetrics,
) -> f64 {
    let allocation_risk: f64 = AssetType::ALL
        .iter()
        .map(|t| allocation.get(*t) * class_risk_weight(*t))
        .sum::<f64>()
        * 0.4;

    let max_sector = sector_allocation
        .values()
        .copied()
        .max_by(f64::total_cmp)
        .unwrap_or(0.0);
    let concentration_penalty = (max_sector - SECTOR_CONCENTRATION_LIMIT).max(0.0) * 0.8;

    let volatility_risk = (volatility.portfolio_volatility / 0.2).min(1.0) * 0.4;

    (allocation_risk + concentration_penalty + volatility_risk).clamp(0.0, 1.0)
}
