use tracing::{debug, info, warn};

use crate::models::*;
use crate::services::sentiment_service;

/// VIX level assumed when no VIX quote is provided
pub const DEFAULT_VIX: f64 = 20.0;

/// Maximum number of drivers and risk factors reported
const MAX_RANKED: usize = 5;

const DEFENSIVE_SECTORS: [&str; 3] = ["Utilities", "Consumer Staples", "Healthcare"];
const CYCLICAL_SECTORS: [&str; 4] = [
    "Technology",
    "Consumer Discretionary",
    "Industrials",
    "Financials",
];

/// Topics that count as risks when they lead the news flow
const RISK_TOPICS: [&str; 4] = ["recession", "inflation", "interest rates", "federal reserve"];

/// Fallback readings for indicators missing from a partially filled section
const DEFAULT_INFLATION: f64 = 0.03;
const DEFAULT_UNEMPLOYMENT: f64 = 0.04;
const DEFAULT_FED_RATE: f64 = 0.05;
const DEFAULT_GDP_GROWTH: f64 = 0.02;
const DEFAULT_CONSUMER_SENTIMENT: f64 = 75.0;

/// Assess market conditions from market data and news.
///
/// Never fails: missing sections degrade to `unknown`/`neutral` placeholders.
pub fn assess_market(market: &MarketSnapshot, news: &NewsSnapshot) -> MarketAssessment {
    info!(
        "Assessing market conditions ({} indices, {} sectors, {} news items)",
        market.indices.len(),
        market.sectors.len(),
        news.items.len()
    );
    let stale_inputs = market.is_stale || news.is_stale;
    if stale_inputs {
        warn!("Market assessment built from stale inputs");
    }

    let indices_analysis = analyze_indices(&market.indices);
    let sector_analysis = analyze_sectors(&market.sectors);
    let economic_analysis = analyze_economy(market.economic_indicators.as_ref());
    let sentiment_analysis = analyze_sentiment(news);
    let market_outlook = determine_outlook(
        &indices_analysis,
        &sector_analysis,
        &economic_analysis,
        &sentiment_analysis,
    );

    debug!(
        "Outlook: short-term {} ({:.2}), medium-term {} ({:.2})",
        market_outlook.short_term.outlook.as_str(),
        market_outlook.short_term.score,
        market_outlook.medium_term.outlook.as_str(),
        market_outlook.medium_term.score
    );

    let key_drivers = identify_drivers(
        &indices_analysis,
        &sector_analysis,
        &economic_analysis,
        &sentiment_analysis,
    );
    let risk_factors = identify_risks(
        &indices_analysis,
        &sector_analysis,
        &economic_analysis,
        &sentiment_analysis,
    );
    let market_summary = summarize(
        &indices_analysis,
        &sector_analysis,
        &economic_analysis,
        &sentiment_analysis,
        &market_outlook,
    );

    MarketAssessment {
        market_summary,
        indices_analysis,
        sector_analysis,
        economic_analysis,
        sentiment_analysis,
        market_outlook,
        key_drivers,
        risk_factors,
        stale_inputs,
        source: AnalysisSource::RuleBased,
    }
}

pub fn analyze_indices(indices: &[IndexQuote]) -> IndicesAnalysis {
    let advancing = indices.iter().filter(|i| i.change_pct > 0.0).count();
    let declining = indices.iter().filter(|i| i.change_pct < 0.0).count();
    let average_change = if indices.is_empty() {
        0.0
    } else {
        indices.iter().map(|i| i.change_pct).sum::<f64>() / indices.len() as f64
    };

    let broad = indices.len() >= 3;
    let market_breadth = if advancing > 2 * declining && broad {
        MarketBreadth::StronglyPositive
    } else if advancing > declining {
        MarketBreadth::Positive
    } else if declining > 2 * advancing && broad {
        MarketBreadth::StronglyNegative
    } else if declining > advancing {
        MarketBreadth::Negative
    } else {
        MarketBreadth::Neutral
    };

    let significant_moves = indices
        .iter()
        .filter(|i| i.change_pct.abs() > 1.0)
        .map(|i| SignificantMove {
            index: i.name.clone(),
            change_pct: i.change_pct,
            direction: if i.change_pct > 0.0 {
                MoveDirection::Up
            } else {
                MoveDirection::Down
            },
        })
        .collect();

    let trend = if average_change > 0.5 {
        MarketTrend::StronglyBullish
    } else if average_change > 0.1 {
        MarketTrend::Bullish
    } else if average_change < -0.5 {
        MarketTrend::StronglyBearish
    } else if average_change < -0.1 {
        MarketTrend::Bearish
    } else {
        MarketTrend::Neutral
    };

    let vix_level = indices
        .iter()
        .find(|i| i.name == "VIX")
        .and_then(|i| i.current_value)
        .unwrap_or(DEFAULT_VIX);

    IndicesAnalysis {
        average_change,
        market_breadth,
        significant_moves,
        trend,
        vix_level,
    }
}

fn mean_mtd(sectors: &[&SectorPerformance], names: &[&str]) -> Option<f64> {
    let values: Vec<f64> = sectors
        .iter()
        .filter(|s| names.contains(&s.name.as_str()))
        .map(|s| s.performance_mtd)
        .collect();
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

pub fn analyze_sectors(sectors: &[SectorPerformance]) -> SectorAnalysis {
    let valid: Vec<&SectorPerformance> = sectors
        .iter()
        .filter(|s| s.performance_mtd.is_finite() && s.performance_ytd.is_finite())
        .collect();

    if valid.is_empty() {
        return SectorAnalysis {
            top_sectors: Vec::new(),
            bottom_sectors: Vec::new(),
            leadership_shifts: Vec::new(),
            sector_divergence: 0.0,
            sector_rotation: SectorRotation::Unknown,
            market_sentiment: SectorSentiment::Unknown,
        };
    }

    let mut by_mtd = valid.clone();
    by_mtd.sort_by(|a, b| b.performance_mtd.total_cmp(&a.performance_mtd));
    let mut by_ytd = valid.clone();
    by_ytd.sort_by(|a, b| b.performance_ytd.total_cmp(&a.performance_ytd));

    let rank_in = |ranking: &[&SectorPerformance], name: &str| {
        ranking.iter().position(|s| s.name == name).unwrap_or(0)
    };

    // New leaders this month, then former leaders that lost their place
    let mut leadership_shifts = Vec::new();
    for (mtd_rank, sector) in by_mtd.iter().take(3).enumerate() {
        let ytd_rank = rank_in(&by_ytd, &sector.name);
        if ytd_rank > 2 {
            leadership_shifts.push(LeadershipShift {
                sector: sector.name.clone(),
                prior_rank: ytd_rank + 1,
                current_rank: mtd_rank + 1,
                mtd_performance: sector.performance_mtd,
            });
        }
    }
    for (ytd_rank, sector) in by_ytd.iter().take(3).enumerate() {
        let mtd_rank = rank_in(&by_mtd, &sector.name);
        if mtd_rank > 2 {
            leadership_shifts.push(LeadershipShift {
                sector: sector.name.clone(),
                prior_rank: ytd_rank + 1,
                current_rank: mtd_rank + 1,
                mtd_performance: sector.performance_mtd,
            });
        }
    }

    let best = by_mtd.first().map_or(0.0, |s| s.performance_mtd);
    let worst = by_mtd.last().map_or(0.0, |s| s.performance_mtd);

    let sector_rotation = match leadership_shifts.len() {
        0 => SectorRotation::Minimal,
        1 => SectorRotation::Moderate,
        _ => SectorRotation::Significant,
    };

    let market_sentiment = match (
        mean_mtd(&valid, &CYCLICAL_SECTORS),
        mean_mtd(&valid, &DEFENSIVE_SECTORS),
    ) {
        (Some(cyclical), Some(defensive)) if cyclical > defensive + 0.01 => SectorSentiment::RiskOn,
        (Some(cyclical), Some(defensive)) if defensive > cyclical + 0.01 => SectorSentiment::RiskOff,
        _ => SectorSentiment::Balanced,
    };

    let rank = |s: &&SectorPerformance| SectorRank {
        name: s.name.clone(),
        performance: s.performance_mtd * 100.0,
    };
    let top_sectors = by_mtd.iter().take(3).map(rank).collect();
    let bottom_sectors = by_mtd[by_mtd.len().saturating_sub(3)..].iter().map(rank).collect();

    SectorAnalysis {
        top_sectors,
        bottom_sectors,
        leadership_shifts,
        sector_divergence: (best - worst) * 100.0,
        sector_rotation,
        market_sentiment,
    }
}

/// Bucket each indicator and derive the policy trajectory and recession risk.
///
/// A missing or empty section leaves every status `unknown`. Individual
/// indicators missing from a partial section fall back to typical readings.
pub fn analyze_economy(indicators: Option<&EconomicIndicators>) -> EconomicAnalysis {
    let indicators = match indicators {
        Some(i) if !i.is_empty() => i,
        _ => return EconomicAnalysis::default(),
    };

    let inflation = indicators.inflation_rate.unwrap_or(DEFAULT_INFLATION);
    let unemployment = indicators.unemployment_rate.unwrap_or(DEFAULT_UNEMPLOYMENT);
    let fed_rate = indicators.fed_rate.unwrap_or(DEFAULT_FED_RATE);
    let gdp_growth = indicators.gdp_growth.unwrap_or(DEFAULT_GDP_GROWTH);
    let consumer_sentiment = indicators
        .consumer_sentiment
        .unwrap_or(DEFAULT_CONSUMER_SENTIMENT);

    let inflation_status = if inflation < 0.02 {
        LevelStatus::Low
    } else if inflation < 0.035 {
        LevelStatus::Moderate
    } else {
        LevelStatus::High
    };
    let unemployment_status = if unemployment < 0.035 {
        LevelStatus::Low
    } else if unemployment < 0.05 {
        LevelStatus::Moderate
    } else {
        LevelStatus::High
    };
    let rate_status = if fed_rate < 0.03 {
        RateStatus::Accommodative
    } else if fed_rate < 0.045 {
        RateStatus::Neutral
    } else {
        RateStatus::Restrictive
    };
    let growth_status = if gdp_growth < 0.015 {
        GrowthStatus::Weak
    } else if gdp_growth < 0.025 {
        GrowthStatus::Moderate
    } else {
        GrowthStatus::Strong
    };
    let consumer_status = if consumer_sentiment < 65.0 {
        ConsumerStatus::Negative
    } else if consumer_sentiment < 80.0 {
        ConsumerStatus::Neutral
    } else {
        ConsumerStatus::Positive
    };

    use LevelStatus::{High, Low, Moderate};
    let policy_trajectory = match (inflation_status, unemployment_status) {
        (High | Moderate, Low) => PolicyTrajectory::Tightening,
        (Low, High | Moderate) => PolicyTrajectory::Easing,
        (High, High) => PolicyTrajectory::StagflationConcerns,
        _ => PolicyTrajectory::Neutral,
    };

    let recession_risk = if gdp_growth < 0.01 && unemployment_status == High {
        RecessionRisk::High
    } else if gdp_growth < 0.02 && unemployment_status == Moderate {
        RecessionRisk::Moderate
    } else {
        RecessionRisk::Low
    };

    EconomicAnalysis {
        inflation: IndicatorReading {
            value: Some(inflation),
            status: inflation_status,
        },
        unemployment: IndicatorReading {
            value: Some(unemployment),
            status: unemployment_status,
        },
        interest_rates: IndicatorReading {
            value: Some(fed_rate),
            status: rate_status,
        },
        gdp_growth: IndicatorReading {
            value: Some(gdp_growth),
            status: growth_status,
        },
        consumer_sentiment: IndicatorReading {
            value: Some(consumer_sentiment),
            status: consumer_status,
        },
        policy_trajectory,
        recession_risk,
    }
}

pub fn analyze_sentiment(news: &NewsSnapshot) -> SentimentAnalysis {
    if news.is_empty() {
        return SentimentAnalysis::default();
    }

    let analysis = sentiment_service::resolve_analysis(news);

    let high_impact = analysis.impact_distribution.high;
    let strong_sentiment = analysis
        .sentiment_distribution
        .positive
        .max(analysis.sentiment_distribution.negative);
    let potential_impact = if high_impact > 2 && strong_sentiment as f64 > high_impact as f64 / 2.0 {
        PotentialImpact::High
    } else if high_impact == 0 && strong_sentiment == 0 {
        PotentialImpact::Low
    } else {
        PotentialImpact::Moderate
    };

    let key_news = news
        .items
        .iter()
        .filter(|item| item.impact == Some(Impact::High))
        .take(3)
        .map(|item| KeyNews {
            title: item.title.clone(),
            sentiment: item.sentiment,
            source: item.source.clone(),
        })
        .collect();

    let mut primary_topics = analysis.primary_topics;
    primary_topics.truncate(5);

    SentimentAnalysis {
        overall_sentiment: analysis.overall_sentiment,
        sentiment_distribution: analysis.sentiment_distribution,
        impact_distribution: analysis.impact_distribution,
        primary_topics,
        potential_impact,
        key_news,
    }
}

fn trend_score(trend: MarketTrend) -> f64 {
    match trend {
        MarketTrend::StronglyBullish => 2.0,
        MarketTrend::Bullish => 1.0,
        MarketTrend::Neutral => 0.0,
        MarketTrend::Bearish => -1.0,
        MarketTrend::StronglyBearish => -2.0,
    }
}

/// Weighted short-term (momentum, sentiment, volatility) and medium-term
/// (economy, rotation, momentum) outlook.
pub fn determine_outlook(
    indices: &IndicesAnalysis,
    sectors: &SectorAnalysis,
    economy: &EconomicAnalysis,
    sentiment: &SentimentAnalysis,
) -> MarketOutlook {
    // Short term
    let mut short_factors = Vec::new();

    let trend = trend_score(indices.trend);
    match indices.trend {
        MarketTrend::StronglyBullish => short_factors.push("Strong positive market momentum"),
        MarketTrend::Bullish => short_factors.push("Positive market momentum"),
        MarketTrend::StronglyBearish => short_factors.push("Strong negative market momentum"),
        MarketTrend::Bearish => short_factors.push("Negative market momentum"),
        MarketTrend::Neutral => {}
    }

    let overall = sentiment.overall_sentiment;
    let sentiment_score = if overall == OverallSentiment::StronglyPositive {
        short_factors.push("Very positive market sentiment");
        1.5
    } else if overall.is_positive() {
        short_factors.push("Positive market sentiment");
        1.0
    } else if overall == OverallSentiment::StronglyNegative {
        short_factors.push("Very negative market sentiment");
        -1.5
    } else if overall.is_negative() {
        short_factors.push("Negative market sentiment");
        -1.0
    } else {
        0.0
    };

    let vix_score = if indices.vix_level > 30.0 {
        short_factors.push("Elevated market volatility (VIX)");
        -1.0
    } else if indices.vix_level < 15.0 {
        short_factors.push("Low market volatility (VIX)");
        0.5
    } else {
        0.0
    };

    let short_score = 0.5 * trend + 0.3 * sentiment_score + 0.2 * vix_score;

    // Medium term
    let mut medium_factors = Vec::new();
    let mut economic_score = 0.0;

    match economy.gdp_growth.status {
        GrowthStatus::Strong => {
            economic_score += 1.0;
            medium_factors.push("Strong economic growth");
        }
        GrowthStatus::Weak => {
            economic_score -= 1.0;
            medium_factors.push("Weak economic growth");
        }
        _ => {}
    }
    match economy.inflation.status {
        LevelStatus::High => {
            economic_score -= 0.5;
            medium_factors.push("High inflation");
        }
        LevelStatus::Low => {
            economic_score += 0.5;
            medium_factors.push("Low inflation");
        }
        _ => {}
    }
    match economy.interest_rates.status {
        RateStatus::Restrictive => {
            economic_score -= 0.5;
            medium_factors.push("Restrictive monetary policy");
        }
        RateStatus::Accommodative => {
            economic_score += 0.5;
            medium_factors.push("Accommodative monetary policy");
        }
        _ => {}
    }
    match economy.policy_trajectory {
        PolicyTrajectory::Easing => {
            economic_score += 1.0;
            medium_factors.push("Easing policy trajectory");
        }
        PolicyTrajectory::Tightening => {
            economic_score -= 1.0;
            medium_factors.push("Tightening policy trajectory");
        }
        PolicyTrajectory::StagflationConcerns => {
            economic_score -= 1.5;
            medium_factors.push("Stagflation concerns");
        }
        _ => {}
    }
    match economy.recession_risk {
        RecessionRisk::High => {
            economic_score -= 1.5;
            medium_factors.push("High recession risk");
        }
        RecessionRisk::Moderate => {
            economic_score -= 0.5;
            medium_factors.push("Moderate recession risk");
        }
        _ => {}
    }

    let rotation_score = match (sectors.sector_rotation, sectors.market_sentiment) {
        (SectorRotation::Significant, SectorSentiment::RiskOn) => {
            medium_factors.push("Rotation toward cyclical sectors");
            0.5
        }
        (SectorRotation::Significant, SectorSentiment::RiskOff) => {
            medium_factors.push("Rotation toward defensive sectors");
            -0.5
        }
        _ => 0.0,
    };

    let medium_score = 0.6 * economic_score + 0.2 * rotation_score + 0.2 * (trend / 2.0);

    MarketOutlook {
        short_term: OutlookHorizon {
            outlook: MarketTrend::from_score(short_score),
            score: short_score,
            key_factors: short_factors.into_iter().map(String::from).collect(),
        },
        medium_term: OutlookHorizon {
            outlook: MarketTrend::from_score(medium_score),
            score: medium_score,
            key_factors: medium_factors.into_iter().map(String::from).collect(),
        },
    }
}

fn driver(factor: String, impact: DriverImpact, category: FactorCategory) -> KeyDriver {
    KeyDriver {
        factor,
        impact,
        category,
    }
}

/// Market moves, economic flags, the leading sector, sentiment and the top
/// headline, in that order, capped at five.
pub fn identify_drivers(
    indices: &IndicesAnalysis,
    sectors: &SectorAnalysis,
    economy: &EconomicAnalysis,
    sentiment: &SentimentAnalysis,
) -> Vec<KeyDriver> {
    let mut drivers = Vec::new();

    for m in &indices.significant_moves {
        let (direction, impact) = match m.direction {
            MoveDirection::Up => ("up", DriverImpact::Positive),
            MoveDirection::Down => ("down", DriverImpact::Negative),
        };
        drivers.push(driver(
            format!("{} {} {}%", m.index, direction, m.change_pct.abs()),
            impact,
            FactorCategory::Market,
        ));
    }

    let percent = |value: Option<f64>| value.unwrap_or(0.0) * 100.0;
    match economy.inflation.status {
        LevelStatus::High => drivers.push(driver(
            format!("High inflation ({:.1}%)", percent(economy.inflation.value)),
            DriverImpact::Negative,
            FactorCategory::Economic,
        )),
        LevelStatus::Low => drivers.push(driver(
            format!("Low inflation ({:.1}%)", percent(economy.inflation.value)),
            DriverImpact::Positive,
            FactorCategory::Economic,
        )),
        _ => {}
    }
    match economy.interest_rates.status {
        RateStatus::Restrictive => drivers.push(driver(
            format!(
                "Restrictive monetary policy (Fed rate: {:.2}%)",
                percent(economy.interest_rates.value)
            ),
            DriverImpact::Negative,
            FactorCategory::Economic,
        )),
        RateStatus::Accommodative => drivers.push(driver(
            format!(
                "Accommodative monetary policy (Fed rate: {:.2}%)",
                percent(economy.interest_rates.value)
            ),
            DriverImpact::Positive,
            FactorCategory::Economic,
        )),
        _ => {}
    }
    match economy.gdp_growth.status {
        GrowthStatus::Strong => drivers.push(driver(
            format!("Strong economic growth (GDP: {:.1}%)", percent(economy.gdp_growth.value)),
            DriverImpact::Positive,
            FactorCategory::Economic,
        )),
        GrowthStatus::Weak => drivers.push(driver(
            format!("Weak economic growth (GDP: {:.1}%)", percent(economy.gdp_growth.value)),
            DriverImpact::Negative,
            FactorCategory::Economic,
        )),
        _ => {}
    }

    if let Some(top) = sectors.top_sectors.first() {
        drivers.push(driver(
            format!("Strong {} sector performance ({:.2}%)", top.name, top.performance),
            DriverImpact::Positive,
            FactorCategory::Sector,
        ));
    }

    let overall = sentiment.overall_sentiment;
    if overall.is_positive() {
        drivers.push(driver(
            format!("{} market sentiment", overall.title()),
            DriverImpact::Positive,
            FactorCategory::Sentiment,
        ));
    } else if overall.is_negative() {
        drivers.push(driver(
            format!("{} market sentiment", overall.title()),
            DriverImpact::Negative,
            FactorCategory::Sentiment,
        ));
    }

    if let Some(news) = sentiment.key_news.first() {
        drivers.push(driver(
            news.title.clone(),
            DriverImpact::from(news.sentiment),
            FactorCategory::News,
        ));
    }

    drivers.truncate(MAX_RANKED);
    drivers
}

fn risk(factor: String, severity: Severity, category: FactorCategory) -> RiskFactor {
    RiskFactor {
        factor,
        severity,
        category,
    }
}

/// Collect market, economic, sentiment and sector risks, high severity first, capped at five.
pub fn identify_risks(
    indices: &IndicesAnalysis,
    sectors: &SectorAnalysis,
    economy: &EconomicAnalysis,
    sentiment: &SentimentAnalysis,
) -> Vec<RiskFactor> {
    let mut risks = Vec::new();

    if indices.vix_level > 25.0 {
        risks.push(risk(
            format!("Elevated market volatility (VIX: {})", indices.vix_level),
            if indices.vix_level > 30.0 {
                Severity::High
            } else {
                Severity::Medium
            },
            FactorCategory::Market,
        ));
    }

    match economy.recession_risk {
        RecessionRisk::High => risks.push(risk(
            "High recession risk".to_string(),
            Severity::High,
            FactorCategory::Economic,
        )),
        RecessionRisk::Moderate => risks.push(risk(
            "Moderate recession risk".to_string(),
            Severity::Medium,
            FactorCategory::Economic,
        )),
        _ => {}
    }

    if economy.inflation.status == LevelStatus::High {
        let rate = economy.inflation.value.unwrap_or(0.0);
        risks.push(risk(
            format!("Persistent inflation ({:.1}%)", rate * 100.0),
            if rate > 0.04 {
                Severity::High
            } else {
                Severity::Medium
            },
            FactorCategory::Economic,
        ));
    }

    match economy.policy_trajectory {
        PolicyTrajectory::Tightening => risks.push(risk(
            "Monetary policy tightening".to_string(),
            Severity::Medium,
            FactorCategory::Policy,
        )),
        PolicyTrajectory::StagflationConcerns => risks.push(risk(
            "Stagflation concerns".to_string(),
            Severity::High,
            FactorCategory::Economic,
        )),
        _ => {}
    }

    let overall = sentiment.overall_sentiment;
    if overall.is_negative() {
        risks.push(risk(
            format!("{} market sentiment", overall.title()),
            if overall.is_strong() {
                Severity::High
            } else {
                Severity::Medium
            },
            FactorCategory::Sentiment,
        ));
    }

    for topic in sentiment.primary_topics.iter().take(2) {
        if RISK_TOPICS.contains(&topic.topic.as_str()) {
            risks.push(risk(
                format!("Heightened focus on {}", topic.topic),
                Severity::Medium,
                FactorCategory::Sentiment,
            ));
        }
    }

    if matches!(
        sectors.sector_rotation,
        SectorRotation::Moderate | SectorRotation::Significant
    ) {
        let label = sectors.sector_rotation.as_str();
        let mut title = label[..1].to_uppercase();
        title.push_str(&label[1..]);
        risks.push(risk(
            format!("{} sector rotation", title),
            Severity::Medium,
            FactorCategory::Market,
        ));
    }

    if sectors.market_sentiment == SectorSentiment::RiskOff {
        risks.push(risk(
            "Rotation toward defensive sectors".to_string(),
            Severity::Medium,
            FactorCategory::Market,
        ));
    }

    if sectors.sector_divergence > 10.0 {
        risks.push(risk(
            format!(
                "High sector performance divergence ({:.1}%)",
                sectors.sector_divergence
            ),
            Severity::Medium,
            FactorCategory::Market,
        ));
    }

    // Stable, so equal severities keep their discovery order
    risks.sort_by(|a, b| b.severity.cmp(&a.severity));
    risks.truncate(MAX_RANKED);
    risks
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Templated narrative over the non-neutral components of the assessment.
pub fn summarize(
    indices: &IndicesAnalysis,
    sectors: &SectorAnalysis,
    economy: &EconomicAnalysis,
    sentiment: &SentimentAnalysis,
    outlook: &MarketOutlook,
) -> String {
    let mut parts = Vec::new();

    parts.push(match indices.trend {
        MarketTrend::Neutral => "Markets are range-bound".to_string(),
        MarketTrend::StronglyBullish => "Markets are very bullish".to_string(),
        MarketTrend::StronglyBearish => "Markets are very bearish".to_string(),
        trend => format!("Markets are {}", trend.as_str()),
    });

    let mut economic = Vec::new();
    match economy.gdp_growth.status {
        GrowthStatus::Strong => economic.push("strong economic growth"),
        GrowthStatus::Weak => economic.push("weak economic growth"),
        _ => {}
    }
    match economy.inflation.status {
        LevelStatus::High => economic.push("high inflation"),
        LevelStatus::Low => economic.push("low inflation"),
        _ => {}
    }
    match economy.interest_rates.status {
        RateStatus::Restrictive => economic.push("restrictive monetary policy"),
        RateStatus::Accommodative => economic.push("accommodative monetary policy"),
        _ => {}
    }
    if !economic.is_empty() {
        parts.push(format!("with {}", economic.join(", ")));
    }

    if let Some(top) = sectors.top_sectors.first() {
        parts.push(format!("led by {}", top.name));
    }

    if sentiment.overall_sentiment != OverallSentiment::Neutral {
        parts.push(format!(
            "amid {} investor sentiment",
            sentiment.overall_sentiment.as_str()
        ));
    }

    let short = outlook.short_term.outlook;
    let medium = outlook.medium_term.outlook;
    let horizons: Vec<String> = [(short, "short-term"), (medium, "medium-term")]
        .into_iter()
        .filter(|(label, _)| *label != MarketTrend::Neutral)
        .map(|(label, horizon)| format!("{} {}", label.as_str(), horizon))
        .collect();
    if !horizons.is_empty() {
        parts.push(format!("with a {} outlook", horizons.join(" and ")));
    }

    let mut summary = parts
        .iter()
        .map(|p| capitalize(p))
        .collect::<Vec<_>>()
        .join(". ");
    summary.push('.');
    summary
}
