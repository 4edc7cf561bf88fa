use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::errors::{ensure_fraction, AnalysisError};
use crate::models::*;
use crate::services::reference_data::ReferenceData;
use crate::services::risk_service::{self, RISK_FREE_RATE};

/// Allocation change per class below which no trades are generated
const MATERIALITY_THRESHOLD: f64 = 0.02;

/// Largest single increase recommended for one equity holding
const MAX_EQUITY_STEP: f64 = 0.05;

/// Market risk premium used by the outcome estimate
const MARKET_RISK_PREMIUM: f64 = 0.06;

/// Cost of trading, as a fraction of the allocation moved
const TRANSACTION_COST: f64 = 0.001;

/// Allocation profiles at fixed risk levels: (risk, equity, bond, alternative, cash)
const RISK_PROFILES: [(f64, AssetClassAllocation); 5] = [
    (0.1, AssetClassAllocation { equity: 0.20, bond: 0.65, alternative: 0.05, cash: 0.10 }),
    (0.3, AssetClassAllocation { equity: 0.40, bond: 0.45, alternative: 0.05, cash: 0.10 }),
    (0.5, AssetClassAllocation { equity: 0.60, bond: 0.30, alternative: 0.05, cash: 0.05 }),
    (0.7, AssetClassAllocation { equity: 0.75, bond: 0.15, alternative: 0.05, cash: 0.05 }),
    (0.9, AssetClassAllocation { equity: 0.85, bond: 0.05, alternative: 0.08, cash: 0.02 }),
];

/// Instrument suggested when a class has to grow but nothing in it is held
struct DefaultInstrument {
    symbol: &'static str,
    name: &'static str,
    share: f64,
    rationale: &'static str,
}

const DEFAULT_EQUITIES: [DefaultInstrument; 2] = [
    DefaultInstrument {
        symbol: "SPY",
        name: "SPDR S&P 500 ETF",
        share: 0.6,
        rationale: "Add core U.S. large-cap exposure via S&P 500 ETF",
    },
    DefaultInstrument {
        symbol: "QQQ",
        name: "Invesco QQQ Trust (NASDAQ 100 ETF)",
        share: 0.4,
        rationale: "Add growth exposure via NASDAQ 100 ETF",
    },
];

const DEFAULT_BONDS: [DefaultInstrument; 2] = [
    DefaultInstrument {
        symbol: "GOVT",
        name: "US Treasury ETF",
        share: 0.5,
        rationale: "Add US Treasury exposure for stability and safety",
    },
    DefaultInstrument {
        symbol: "LQD",
        name: "Corporate Bond ETF",
        share: 0.5,
        rationale: "Add investment-grade corporate bond exposure for enhanced yield",
    },
];

const DEFAULT_ALTERNATIVES: [DefaultInstrument; 2] = [
    DefaultInstrument {
        symbol: "VNQ",
        name: "Real Estate ETF",
        share: 0.6,
        rationale: "Add real estate exposure for income and diversification",
    },
    DefaultInstrument {
        symbol: "GLD",
        name: "Gold ETF",
        share: 0.4,
        rationale: "Add gold exposure as a hedge against inflation and market volatility",
    },
];

/// A held asset and its share of the portfolio while trades are being planned
struct Holding<'a> {
    asset: &'a Asset,
    allocation: f64,
}

/// Shared inputs of the per-class trade generators
struct TradeContext<'a> {
    reference: &'a ReferenceData,
    constraints: &'a Constraints,
    market: Option<&'a MarketSnapshot>,
}

impl TradeContext<'_> {
    /// Latest quote when the market snapshot has one, else the asset's own price
    fn price_of(&self, asset: &Asset) -> f64 {
        self.market
            .and_then(|m| m.quote_price(&asset.symbol))
            .unwrap_or(asset.current_price)
    }

    fn trade(&self, holding: &Holding, action: TradeAction, target: f64, rationale: String) -> RecommendedTrade {
        RecommendedTrade {
            symbol: Some(holding.asset.symbol.clone()),
            name: Some(holding.asset.display_name().to_string()),
            asset_class: holding.asset.asset_type,
            action,
            current_allocation: Some(holding.allocation),
            target_allocation: target,
            current_price: Some(self.price_of(holding.asset)),
            rationale,
        }
    }

    fn add(&self, asset_class: AssetType, instrument: &DefaultInstrument, target: f64) -> RecommendedTrade {
        RecommendedTrade {
            symbol: Some(instrument.symbol.to_string()),
            name: Some(instrument.name.to_string()),
            asset_class,
            action: TradeAction::Add,
            current_allocation: None,
            target_allocation: target,
            current_price: self.market.and_then(|m| m.quote_price(instrument.symbol)),
            rationale: instrument.rationale.to_string(),
        }
    }
}

/// Build an optimization plan with the built-in beta table.
pub fn optimize_portfolio(
    portfolio: &PortfolioSnapshot,
    current_risk: f64,
    target_risk: f64,
    constraints: &Constraints,
    market: Option<&MarketSnapshot>,
) -> Result<OptimizationPlan, AnalysisError> {
    optimize_portfolio_with(
        risk_service::builtin_reference(),
        portfolio,
        current_risk,
        target_risk,
        constraints,
        market,
    )
}

/// Build an optimization plan against caller-supplied reference tables.
pub fn optimize_portfolio_with(
    reference: &ReferenceData,
    portfolio: &PortfolioSnapshot,
    current_risk: f64,
    target_risk: f64,
    constraints: &Constraints,
    market: Option<&MarketSnapshot>,
) -> Result<OptimizationPlan, AnalysisError> {
    ensure_fraction("current_risk", current_risk)?;
    ensure_fraction("target_risk", target_risk)?;
    validate_constraints(constraints)?;
    let total_value = risk_service::validate_portfolio(portfolio)?;

    info!(
        "Optimizing portfolio {:?}: risk {:.2} -> {:.2} ({} assets)",
        portfolio.portfolio_id,
        current_risk,
        target_risk,
        portfolio.assets.len()
    );
    if market.is_some_and(|m| m.is_stale) {
        warn!("Optimizing with stale market data; price hints may be outdated");
    }

    // 1. Current and target allocation by class
    let current_allocation = portfolio.class_allocation(total_value);
    let target_allocation = target_allocation(target_risk, constraints);
    debug!(
        "Target allocation: equity={:.4}, bond={:.4}, alternative={:.4}, cash={:.4}",
        target_allocation.equity,
        target_allocation.bond,
        target_allocation.alternative,
        target_allocation.cash
    );

    // 2. Trades for every class whose change is material
    let context = TradeContext {
        reference,
        constraints,
        market,
    };
    let mut recommended_trades = Vec::new();
    for asset_type in AssetType::ALL {
        let change = target_allocation.get(asset_type) - current_allocation.get(asset_type);
        if change.abs() <= MATERIALITY_THRESHOLD {
            continue;
        }

        let holdings: Vec<Holding> = portfolio
            .assets_of(asset_type)
            .map(|asset| Holding {
                asset,
                allocation: asset.value() / total_value,
            })
            .collect();

        let trades = match asset_type {
            AssetType::Equity => equity_trades(&context, &holdings, change),
            AssetType::Bond => bond_trades(&context, &holdings, change),
            AssetType::Alternative => alternative_trades(&context, &holdings, change),
            AssetType::Cash => vec![cash_trade(
                current_allocation.cash,
                target_allocation.cash,
            )],
        };
        debug!("{} {} trade(s) for a {:+.4} change", trades.len(), asset_type, change);
        recommended_trades.extend(trades);
    }

    // 3. Outcome estimate, liquidity and narrative
    let expected_impact = estimate_outcomes(current_risk, target_risk, &recommended_trades);
    let liquidity_check = check_liquidity(&target_allocation, constraints);
    if !liquidity_check.satisfied {
        warn!(
            "Target allocation leaves {:.4} in bonds and cash, below the {:.4} liquidity requirement",
            liquidity_check.projected, liquidity_check.required
        );
    }
    let optimization_strategy = explain_strategy(current_risk, target_risk, &recommended_trades);
    let buys = recommended_trades.iter().filter(|t| t.action.is_buy()).count();
    debug!(
        "Plan has {} buy and {} sell/reduce trade(s)",
        buys,
        recommended_trades.len() - buys
    );

    Ok(OptimizationPlan {
        portfolio_id: portfolio.portfolio_id,
        current_risk_score: current_risk,
        target_risk_score: target_risk,
        constraints_applied: *constraints,
        current_allocation,
        target_allocation,
        recommended_trades,
        expected_impact,
        liquidity_check,
        optimization_strategy,
        source: AnalysisSource::RuleBased,
    })
}

pub(crate) fn validate_constraints(constraints: &Constraints) -> Result<(), AnalysisError> {
    ensure_fraction("max_allocation_per_asset", constraints.max_allocation_per_asset)?;
    ensure_fraction("min_bonds_allocation", constraints.min_bonds_allocation)?;
    ensure_fraction("max_alternatives_allocation", constraints.max_alternatives_allocation)?;
    ensure_fraction("liquidity_requirement", constraints.liquidity_requirement)
}

/// Target class allocation for a risk level after applying the constraints.
///
/// The result always sums to 1.0.
pub fn target_allocation(target_risk: f64, constraints: &Constraints) -> AssetClassAllocation {
    apply_constraints(interpolate_profile(target_risk), constraints)
}

/// Linear interpolation between the two nearest risk profiles.
///
/// Risk levels outside the profile range use the nearest profile.
pub fn interpolate_profile(target_risk: f64) -> AssetClassAllocation {
    let (first_risk, first) = RISK_PROFILES[0];
    let (last_risk, last) = RISK_PROFILES[RISK_PROFILES.len() - 1];
    if target_risk <= first_risk {
        return first;
    }
    if target_risk >= last_risk {
        return last;
    }

    let (lower_risk, lower, upper_risk, upper) = RISK_PROFILES
        .windows(2)
        .find(|pair| target_risk <= pair[1].0)
        .map(|pair| (pair[0].0, pair[0].1, pair[1].0, pair[1].1))
        .unwrap_or((last_risk, last, last_risk, last));

    if upper_risk == lower_risk {
        return lower;
    }

    let weight = (target_risk - lower_risk) / (upper_risk - lower_risk);
    let mut allocation = AssetClassAllocation::default();
    for asset_type in AssetType::ALL {
        let low = lower.get(asset_type);
        *allocation.get_mut(asset_type) = low + weight * (upper.get(asset_type) - low);
    }
    allocation
}

/// Raise bonds to their floor, cap alternatives, then renormalize.
///
/// Classes giving up or receiving allocation do so in proportion to their size.
pub fn apply_constraints(
    mut allocation: AssetClassAllocation,
    constraints: &Constraints,
) -> AssetClassAllocation {
    if allocation.bond < constraints.min_bonds_allocation {
        let shortfall = constraints.min_bonds_allocation - allocation.bond;
        allocation.bond = constraints.min_bonds_allocation;
        redistribute(&mut allocation, AssetType::Bond, -shortfall);
    }

    if allocation.alternative > constraints.max_alternatives_allocation {
        let excess = allocation.alternative - constraints.max_alternatives_allocation;
        allocation.alternative = constraints.max_alternatives_allocation;
        redistribute(&mut allocation, AssetType::Alternative, excess);
    }

    allocation.normalized()
}

/// Spread `amount` over every class except `fixed`, weighted by current size.
fn redistribute(allocation: &mut AssetClassAllocation, fixed: AssetType, amount: f64) {
    let others: Vec<AssetType> = AssetType::ALL.into_iter().filter(|t| *t != fixed).collect();
    let other_total: f64 = others.iter().map(|t| allocation.get(*t)).sum();
    if other_total <= 0.0 {
        return;
    }
    for asset_type in others {
        let weight = allocation.get(asset_type) / other_total;
        *allocation.get_mut(asset_type) = (allocation.get(asset_type) + amount * weight).max(0.0);
    }
}

fn equity_trades(context: &TradeContext, holdings: &[Holding], change: f64) -> Vec<RecommendedTrade> {
    let mut trades = Vec::new();

    if change > 0.0 {
        if holdings.is_empty() {
            return DEFAULT_EQUITIES
                .iter()
                .map(|instrument| context.add(AssetType::Equity, instrument, change * instrument.share))
                .collect();
        }

        let max_allocation = context.constraints.max_allocation_per_asset;
        let mut candidates: Vec<&Holding> = holdings
            .iter()
            .filter(|h| h.allocation < max_allocation)
            .collect();
        candidates.sort_by(|a, b| a.allocation.total_cmp(&b.allocation));

        let mut remaining = change;
        for holding in candidates {
            let increase = (max_allocation - holding.allocation)
                .min(remaining)
                .min(MAX_EQUITY_STEP);
            if increase > 0.01 {
                remaining -= increase;
                trades.push(context.trade(
                    holding,
                    TradeAction::Increase,
                    holding.allocation + increase,
                    format!(
                        "Increase position in {} to optimize risk/return profile",
                        holding.asset.display_name()
                    ),
                ));
            }
        }

        if remaining > 0.03 {
            let broad_market = DefaultInstrument {
                rationale: "Add broad market exposure via S&P 500 ETF",
                ..DEFAULT_EQUITIES[0]
            };
            trades.push(context.add(AssetType::Equity, &broad_market, remaining));
        }
        return trades;
    }

    // Highest beta first, then largest position
    let mut ordered: Vec<&Holding> = holdings.iter().collect();
    ordered.sort_by(|a, b| {
        let beta_a = context.reference.beta_of(&a.asset.symbol);
        let beta_b = context.reference.beta_of(&b.asset.symbol);
        beta_b
            .total_cmp(&beta_a)
            .then_with(|| b.allocation.total_cmp(&a.allocation))
    });

    let mut remaining = change;
    // Allocation left in each holding after the partial reductions, plus its trade index
    let mut working: Vec<(f64, Option<usize>)> = ordered.iter().map(|h| (h.allocation, None)).collect();

    for (i, holding) in ordered.iter().enumerate() {
        let reduction = (holding.allocation - 0.01).min(remaining.abs());
        if reduction > 0.01 {
            remaining += reduction;
            working[i] = (holding.allocation - reduction, Some(trades.len()));
            trades.push(context.trade(
                holding,
                TradeAction::Reduce,
                holding.allocation - reduction,
                format!(
                    "Reduce position in {} to decrease portfolio volatility",
                    holding.asset.display_name()
                ),
            ));
        }
    }

    if remaining < -0.01 {
        for (i, holding) in ordered.iter().enumerate() {
            if holding.allocation >= 0.05 {
                continue;
            }
            let (left, reduce_index) = working[i];
            let sell = context.trade(
                holding,
                TradeAction::Sell,
                0.0,
                format!(
                    "Sell entire position in {} to streamline portfolio and reduce risk",
                    holding.asset.display_name()
                ),
            );
            match reduce_index {
                Some(index) => trades[index] = sell,
                None => trades.push(sell),
            }
            remaining += left;
            if remaining >= -0.01 {
                break;
            }
        }
    }

    trades
}

fn bond_trades(context: &TradeContext, holdings: &[Holding], change: f64) -> Vec<RecommendedTrade> {
    if change > 0.0 {
        if holdings.is_empty() {
            return DEFAULT_BONDS
                .iter()
                .map(|instrument| context.add(AssetType::Bond, instrument, change * instrument.share))
                .collect();
        }
        return proportional_increases(holdings, change, 0.01, |holding, increase| {
            context.trade(
                holding,
                TradeAction::Increase,
                holding.allocation + increase,
                format!(
                    "Increase allocation to {} to enhance portfolio stability",
                    holding.asset.display_name()
                ),
            )
        });
    }

    // Lowest yield first
    let mut ordered: Vec<&Holding> = holdings.iter().collect();
    ordered.sort_by(|a, b| {
        let yield_a = a.asset.annual_yield.unwrap_or(0.0);
        let yield_b = b.asset.annual_yield.unwrap_or(0.0);
        yield_a.total_cmp(&yield_b)
    });

    sequential_reductions(&ordered, change, 0.01, |holding, target| {
        context.trade(
            holding,
            TradeAction::Reduce,
            target,
            format!(
                "Reduce allocation to {} to optimize yield while maintaining risk profile",
                holding.asset.display_name()
            ),
        )
    })
}

fn alternative_trades(context: &TradeContext, holdings: &[Holding], change: f64) -> Vec<RecommendedTrade> {
    if change > 0.0 {
        if holdings.is_empty() {
            return DEFAULT_ALTERNATIVES
                .iter()
                .map(|instrument| {
                    context.add(AssetType::Alternative, instrument, change * instrument.share)
                })
                .collect();
        }
        return proportional_increases(holdings, change, 0.005, |holding, increase| {
            context.trade(
                holding,
                TradeAction::Increase,
                holding.allocation + increase,
                format!(
                    "Increase allocation to {} for improved diversification",
                    holding.asset.display_name()
                ),
            )
        });
    }

    // Riskiest first; unscored holdings fall back to the risk model's own score
    let empty_sectors = BTreeMap::new();
    let mut ordered: Vec<(&Holding, f64)> = holdings
        .iter()
        .map(|h| {
            let score = h.asset.risk_score.unwrap_or_else(|| {
                risk_service::score_asset(context.reference, h.asset, h.allocation, &empty_sectors).score
            });
            (h, score)
        })
        .collect();
    ordered.sort_by(|a, b| b.1.total_cmp(&a.1));
    let ordered: Vec<&Holding> = ordered.into_iter().map(|(h, _)| h).collect();

    sequential_reductions(&ordered, change, 0.005, |holding, target| {
        context.trade(
            holding,
            TradeAction::Reduce,
            target,
            format!(
                "Reduce allocation to {} to decrease portfolio risk",
                holding.asset.display_name()
            ),
        )
    })
}

/// Grow every holding in proportion to its size (equal split when nothing is held by value).
fn proportional_increases<F>(holdings: &[Holding], change: f64, min_step: f64, build: F) -> Vec<RecommendedTrade>
where
    F: Fn(&Holding, f64) -> RecommendedTrade,
{
    let class_total: f64 = holdings.iter().map(|h| h.allocation).sum();
    holdings
        .iter()
        .filter_map(|holding| {
            let weight = if class_total > 0.0 {
                holding.allocation / class_total
            } else {
                1.0 / holdings.len() as f64
            };
            let increase = change * weight;
            (increase > min_step).then(|| build(holding, increase))
        })
        .collect()
}

/// Shrink holdings in order until the reduction is covered, keeping `min_step` in each.
fn sequential_reductions<F>(ordered: &[&Holding], change: f64, min_step: f64, build: F) -> Vec<RecommendedTrade>
where
    F: Fn(&Holding, f64) -> RecommendedTrade,
{
    let mut remaining = change;
    let mut trades = Vec::new();
    for &holding in ordered {
        let reduction = (holding.allocation - min_step).min(remaining.abs());
        if reduction > min_step {
            remaining += reduction;
            trades.push(build(holding, holding.allocation - reduction));
        }
    }
    trades
}

fn cash_trade(current: f64, target: f64) -> RecommendedTrade {
    let (action, rationale) = if target > current {
        (
            TradeAction::IncreaseCash,
            "Increase cash reserves to enhance liquidity and reduce portfolio risk",
        )
    } else {
        (
            TradeAction::DecreaseCash,
            "Reduce cash holdings to improve portfolio returns while maintaining adequate liquidity",
        )
    };

    RecommendedTrade {
        symbol: None,
        name: Some("Cash".to_string()),
        asset_class: AssetType::Cash,
        action,
        current_allocation: Some(current),
        target_allocation: target,
        current_price: None,
        rationale: rationale.to_string(),
    }
}

fn outcome_metrics(risk: f64) -> OutcomeMetrics {
    let expected_annual_return = RISK_FREE_RATE + risk * MARKET_RISK_PREMIUM;
    let volatility = risk * 0.2;
    let sharpe_ratio = if volatility > 0.0 {
        (expected_annual_return - RISK_FREE_RATE) / volatility
    } else {
        0.0
    };

    OutcomeMetrics {
        expected_annual_return,
        volatility,
        sharpe_ratio,
    }
}

/// Projected return/volatility at both risk levels and the cost of getting there.
pub fn estimate_outcomes(current_risk: f64, target_risk: f64, trades: &[RecommendedTrade]) -> ExpectedImpact {
    let current_portfolio = outcome_metrics(current_risk);
    let optimized_portfolio = outcome_metrics(target_risk);
    let moved: f64 = trades.iter().map(RecommendedTrade::allocation_delta).sum();

    ExpectedImpact {
        current_portfolio,
        optimized_portfolio,
        rebalancing_cost_estimate: moved * TRANSACTION_COST,
        risk_reduction: (current_risk - target_risk).max(0.0),
        return_enhancement: (optimized_portfolio.expected_annual_return
            - current_portfolio.expected_annual_return)
            .max(0.0),
    }
}

pub(crate) fn check_liquidity(target: &AssetClassAllocation, constraints: &Constraints) -> LiquidityCheck {
    let projected = target.bond + target.cash;
    LiquidityCheck {
        required: constraints.liquidity_requirement,
        projected,
        satisfied: projected + 1e-9 >= constraints.liquidity_requirement,
    }
}

fn magnitude(delta: f64) -> &'static str {
    if delta > 0.2 {
        "significantly"
    } else if delta > 0.1 {
        "moderately"
    } else {
        "slightly"
    }
}

/// Narrative summary of the plan: direction, magnitude and the classes touched.
pub fn explain_strategy(current_risk: f64, target_risk: f64, trades: &[RecommendedTrade]) -> String {
    let has = |asset_class: Option<AssetType>, actions: &[TradeAction]| {
        trades.iter().any(|t| {
            actions.contains(&t.action) && asset_class.map_or(true, |c| t.asset_class == c)
        })
    };

    let mut parts = Vec::new();
    let mut strategy = if current_risk > target_risk {
        if has(None, &[TradeAction::Reduce, TradeAction::Sell]) {
            parts.push("reducing exposure to higher-volatility assets");
        }
        if has(Some(AssetType::Bond), &[TradeAction::Increase]) {
            parts.push("increasing allocation to bonds for stability");
        }
        if has(Some(AssetType::Bond), &[TradeAction::Add]) {
            parts.push("adding bond positions");
        }
        if has(Some(AssetType::Cash), &[TradeAction::IncreaseCash]) {
            parts.push("increasing cash reserves");
        }
        format!(
            "The optimization strategy focuses on reducing portfolio risk {} while maintaining return potential.",
            magnitude(current_risk - target_risk)
        )
    } else if target_risk > current_risk {
        if has(Some(AssetType::Equity), &[TradeAction::Increase]) {
            parts.push("increasing equity exposure");
        }
        if has(Some(AssetType::Equity), &[TradeAction::Add]) {
            parts.push("adding equity positions");
        }
        if has(Some(AssetType::Bond), &[TradeAction::Reduce]) {
            parts.push("reducing lower-yielding bond allocations");
        }
        format!(
            "The optimization strategy aims to enhance portfolio returns {} while accepting additional risk.",
            magnitude(target_risk - current_risk)
        )
    } else {
        "The optimization strategy maintains the current risk level while realigning the portfolio with its target allocation.".to_string()
    };

    if !parts.is_empty() {
        strategy.push_str(&format!(" This is achieved by {}.", parts.join(", ")));
    }

    let adjusted: Vec<&str> = AssetType::ALL
        .iter()
        .filter(|c| trades.iter().any(|t| t.asset_class == **c))
        .map(AssetType::as_str)
        .collect();
    if adjusted.is_empty() {
        strategy.push_str(" No asset class is far enough from its target to require trades.");
    } else {
        strategy.push_str(&format!(" Adjusted asset classes: {}.", adjusted.join(", ")));
    }

    strategy
}
