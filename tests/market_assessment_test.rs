//! Market assessment scenarios against the public API.

use rustfolio_engine::*;

fn index(name: &str, change_pct: f64) -> IndexQuote {
    IndexQuote {
        name: name.to_string(),
        current_value: None,
        change_pct,
    }
}

fn news(title: &str, sentiment: Sentiment, impact: Impact) -> NewsItem {
    NewsItem {
        title: title.to_string(),
        source: "Wire".to_string(),
        summary: String::new(),
        url: None,
        published_at: None,
        sentiment,
        impact: Some(impact),
    }
}

#[test]
fn test_five_positive_indices() {
    let market = MarketSnapshot {
        indices: vec![
            index("S&P 500", 1.2),
            index("Dow Jones", 1.1),
            index("NASDAQ", 1.8),
            index("Russell 2000", 1.4),
            index("FTSE 100", 0.9),
        ],
        ..Default::default()
    };
    let assessment = assess_market(&market, &NewsSnapshot::default());

    assert!(matches!(
        assessment.indices_analysis.trend,
        MarketTrend::Bullish | MarketTrend::StronglyBullish
    ));
    assert!(!assessment.indices_analysis.significant_moves.is_empty());
    assert_eq!(
        assessment.indices_analysis.market_breadth,
        MarketBreadth::StronglyPositive
    );
    assert!(assessment.market_summary.starts_with("Markets are very bullish"));
    assert_eq!(assessment.source, AnalysisSource::RuleBased);
}

#[test]
fn test_empty_inputs_degrade_to_unknown() {
    let assessment = assess_market(&MarketSnapshot::default(), &NewsSnapshot::default());

    let economy = assessment.economic_analysis;
    assert_eq!(economy.inflation.status, LevelStatus::Unknown);
    assert_eq!(economy.unemployment.status, LevelStatus::Unknown);
    assert_eq!(economy.interest_rates.status, RateStatus::Unknown);
    assert_eq!(economy.gdp_growth.status, GrowthStatus::Unknown);
    assert_eq!(economy.policy_trajectory, PolicyTrajectory::Unknown);
    assert_eq!(economy.recession_risk, RecessionRisk::Unknown);

    assert_eq!(assessment.sector_analysis.sector_rotation, SectorRotation::Unknown);
    assert_eq!(
        assessment.sentiment_analysis.potential_impact,
        PotentialImpact::Unknown
    );
    assert_eq!(assessment.market_outlook.short_term.outlook, MarketTrend::Neutral);
    assert!(assessment.key_drivers.is_empty());
    assert!(assessment.risk_factors.is_empty());
    assert_eq!(assessment.market_summary, "Markets are range-bound.");
}

#[test]
fn test_empty_economic_section_is_unknown() {
    let market = MarketSnapshot {
        economic_indicators: Some(EconomicIndicators::default()),
        ..Default::default()
    };
    let assessment = assess_market(&market, &NewsSnapshot::default());
    assert_eq!(
        assessment.economic_analysis.consumer_sentiment.status,
        ConsumerStatus::Unknown
    );
    assert_eq!(assessment.economic_analysis.inflation.value, None);
}

#[test]
fn test_derived_news_feeds_drivers_and_risks() {
    let items = vec![
        news("Recession fears grow as factory orders slump", Sentiment::Negative, Impact::High),
        news("Recession signals flash in bond market", Sentiment::Negative, Impact::High),
        news("Layoffs spread across retail", Sentiment::Negative, Impact::High),
        news("Tech earnings beat estimates", Sentiment::Positive, Impact::Medium),
    ];
    let snapshot = NewsSnapshot {
        items,
        analysis: None,
        is_stale: true,
    };
    let assessment = assess_market(&MarketSnapshot::default(), &snapshot);

    let sentiment = &assessment.sentiment_analysis;
    assert_eq!(sentiment.overall_sentiment, OverallSentiment::StronglyNegative);
    assert_eq!(sentiment.potential_impact, PotentialImpact::High);
    assert_eq!(sentiment.key_news.len(), 3);
    assert_eq!(sentiment.primary_topics[0].topic, "recession");

    assert!(assessment.stale_inputs);
    assert_eq!(
        assessment.risk_factors[0].factor,
        "Strongly Negative market sentiment"
    );
    assert_eq!(assessment.risk_factors[0].severity, Severity::High);
    assert!(assessment
        .risk_factors
        .iter()
        .any(|r| r.factor == "Heightened focus on recession"));

    let headline = assessment
        .key_drivers
        .iter()
        .find(|d| d.category == FactorCategory::News)
        .unwrap();
    assert_eq!(headline.factor, "Recession fears grow as factory orders slump");
    assert_eq!(headline.impact, DriverImpact::Negative);
}

#[test]
fn test_assessment_round_trips_through_json() {
    let market: MarketSnapshot = serde_json::from_str(
        r#"{
            "indices": [{"name": "S&P 500", "change_pct": -1.3}, {"name": "VIX", "current_value": 31.0, "change_pct": 12.0}],
            "sectors": [
                {"name": "Utilities", "performance_mtd": 0.03, "performance_ytd": 0.01},
                {"name": "Technology", "performance_mtd": -0.04, "performance_ytd": 0.12}
            ],
            "economic_indicators": {"inflation_rate": 0.045, "unemployment_rate": 0.055, "gdp_growth": 0.005}
        }"#,
    )
    .unwrap();
    let assessment = assess_market(&market, &NewsSnapshot::default());

    assert_eq!(assessment.indices_analysis.vix_level, 31.0);
    assert_eq!(assessment.sector_analysis.market_sentiment, SectorSentiment::RiskOff);
    assert_eq!(
        assessment.economic_analysis.policy_trajectory,
        PolicyTrajectory::StagflationConcerns
    );
    assert_eq!(assessment.economic_analysis.recession_risk, RecessionRisk::High);
    assert!(assessment.risk_factors.len() <= 5);
    assert!(assessment
        .risk_factors
        .windows(2)
        .all(|pair| pair[0].severity >= pair[1].severity));

    let json = serde_json::to_string(&assessment).unwrap();
    assert!(json.contains("\"stagflation concerns\""));
    let back: MarketAssessment = serde_json::from_str(&json).unwrap();
    assert_eq!(back.risk_factors, assessment.risk_factors);
    assert_eq!(back.market_summary, assessment.market_summary);
}
