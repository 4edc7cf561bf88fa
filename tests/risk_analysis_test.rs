//! Risk analysis properties over generated portfolios, plus the fixed scenarios.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use rustfolio_engine::{
    analyze_risk, analyze_risk_with, AnalysisError, Asset, AssetType, PortfolioSnapshot,
    ReferenceData,
};

const SYMBOLS: [&str; 12] = [
    "AAPL", "MSFT", "NVDA", "JPM", "XOM", "JNJ", "TSLA", "ZZZ", "BND", "GLD", "VNQ", "CASH",
];

fn random_portfolio(rng: &mut StdRng) -> PortfolioSnapshot {
    let count = rng.random_range(1..=12);
    let assets = (0..count)
        .map(|i| {
            let asset_type = AssetType::ALL[rng.random_range(0..4)];
            let symbol = SYMBOLS[(i + rng.random_range(0..SYMBOLS.len())) % SYMBOLS.len()];
            Asset::new(
                symbol,
                symbol,
                asset_type,
                rng.random_range(1.0..1000.0),
                rng.random_range(1.0..500.0),
            )
        })
        .collect();
    PortfolioSnapshot::new(assets)
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

#[test]
fn test_class_allocation_sums_to_one() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..200 {
        let portfolio = random_portfolio(&mut rng);
        let report = analyze_risk(&portfolio, 0.5).unwrap();
        assert!(
            (report.asset_class_allocation.total() - 1.0).abs() < 1e-6,
            "allocation sums to {}",
            report.asset_class_allocation.total()
        );
    }
}

#[test]
fn test_scores_stay_in_unit_range() {
    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..200 {
        let portfolio = random_portfolio(&mut rng);
        let threshold = rng.random_range(0.0..=1.0);
        let report = analyze_risk(&portfolio, threshold).unwrap();

        assert!((0.0..=1.0).contains(&report.overall_risk_score));
        for asset in &report.high_risk_assets {
            assert!((0.0..=1.0).contains(&asset.risk_score));
            assert!(asset.risk_score > threshold);
        }
    }
}

#[test]
fn test_analysis_is_idempotent() {
    let mut rng = StdRng::seed_from_u64(23);
    for _ in 0..50 {
        let portfolio = random_portfolio(&mut rng);
        let first = analyze_risk(&portfolio, 0.3).unwrap();
        let second = analyze_risk(&portfolio, 0.3).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }
}

#[test]
fn test_growing_an_equity_without_sector_exposure_never_lowers_the_score() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..50 {
        // One unlisted equity against a random defensive mix
        let mut assets = vec![Asset::new("ZZZ", "Unlisted", AssetType::Equity, 10.0, 100.0)];
        for symbol in ["BND", "GLD", "CASH"] {
            let asset_type = match symbol {
                "BND" => AssetType::Bond,
                "GLD" => AssetType::Alternative,
                _ => AssetType::Cash,
            };
            assets.push(Asset::new(
                symbol,
                symbol,
                asset_type,
                rng.random_range(1.0..100.0),
                100.0,
            ));
        }

        let mut portfolio = PortfolioSnapshot::new(assets);
        let mut previous = analyze_risk(&portfolio, 0.5).unwrap().overall_risk_score;
        for _ in 0..10 {
            portfolio.assets[0].quantity *= 1.5;
            let score = analyze_risk(&portfolio, 0.5).unwrap().overall_risk_score;
            assert!(score + 1e-12 >= previous, "{} dropped to {}", previous, score);
            previous = score;
        }
    }
}

#[test]
fn test_growing_the_largest_sector_never_lowers_the_score() {
    let mut rng = StdRng::seed_from_u64(57);
    for _ in 0..100 {
        let healthcare = rng.random_range(10.0..100.0);
        let assets = vec![
            Asset::new("JNJ", "Johnson & Johnson", AssetType::Equity, healthcare, 100.0),
            Asset::new("NVDA", "Nvidia", AssetType::Equity, rng.random_range(1.0..healthcare), 100.0),
            Asset::new("XOM", "Exxon", AssetType::Equity, rng.random_range(1.0..healthcare), 100.0),
            Asset::new("BND", "Bonds", AssetType::Bond, rng.random_range(1.0..100.0), 100.0),
            Asset::new("GLD", "Gold", AssetType::Alternative, rng.random_range(1.0..100.0), 100.0),
            Asset::new("CASH", "Cash", AssetType::Cash, rng.random_range(1.0..100.0), 100.0),
        ];

        let mut portfolio = PortfolioSnapshot::new(assets);
        let mut previous = analyze_risk(&portfolio, 0.5).unwrap().overall_risk_score;
        for _ in 0..10 {
            portfolio.assets[0].quantity *= 1.5;
            let score = analyze_risk(&portfolio, 0.5).unwrap().overall_risk_score;
            assert!(score + 1e-12 >= previous, "{} dropped to {}", previous, score);
            previous = score;
        }
    }
}

#[test]
fn test_growing_a_smaller_sector_can_lower_the_score() {
    // Healthcare is the concentrated sector; adding technology dilutes it
    let mut portfolio = PortfolioSnapshot::new(vec![
        Asset::new("NVDA", "Nvidia", AssetType::Equity, 10.0, 100.0),
        Asset::new("JNJ", "Johnson & Johnson", AssetType::Equity, 50.0, 100.0),
        Asset::new("BND", "Bonds", AssetType::Bond, 40.0, 100.0),
    ]);
    let before = analyze_risk(&portfolio, 0.5).unwrap().overall_risk_score;

    portfolio.assets[0].quantity = 20.0;
    let after = analyze_risk(&portfolio, 0.5).unwrap().overall_risk_score;

    assert!((before - 0.62).abs() < 1e-9);
    assert!((after - 0.5982).abs() < 1e-4);
    assert!(after < before);
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn test_single_equity_scenario() {
    let portfolio = PortfolioSnapshot::new(vec![Asset::new(
        "AAPL",
        "Apple Inc.",
        AssetType::Equity,
        100.0,
        150.0,
    )]);
    let report = analyze_risk(&portfolio, 0.5).unwrap();

    assert_eq!(report.total_value, 15_000.0);
    assert_eq!(report.asset_class_allocation.equity, 1.0);
    assert!(report.overall_risk_score > 0.28);
    assert!(report.overall_risk_score <= 1.0);
    assert_eq!(report.high_risk_assets.len(), 1);
    assert_eq!(report.high_risk_assets[0].symbol, "AAPL");
}

#[test]
fn test_threshold_boundaries() {
    let portfolio = PortfolioSnapshot::new(vec![
        Asset::new("AAPL", "Apple", AssetType::Equity, 10.0, 150.0),
        Asset::new("BND", "Bonds", AssetType::Bond, 40.0, 75.0),
        Asset::new("CASH", "Cash", AssetType::Cash, 1000.0, 1.0),
    ]);

    let everything = analyze_risk(&portfolio, 0.0).unwrap();
    assert_eq!(everything.high_risk_assets.len(), portfolio.assets.len());

    let nothing = analyze_risk(&portfolio, 1.0).unwrap();
    assert!(nothing.high_risk_assets.is_empty());
}

#[test]
fn test_rejects_unanalyzable_input() {
    assert!(matches!(
        analyze_risk(&PortfolioSnapshot::default(), 0.5),
        Err(AnalysisError::InvalidInput(_))
    ));

    let worthless = PortfolioSnapshot::new(vec![Asset::new("X", "X", AssetType::Equity, 0.0, 10.0)]);
    assert!(matches!(
        analyze_risk(&worthless, 0.5),
        Err(AnalysisError::InvalidInput(_))
    ));

    let portfolio = PortfolioSnapshot::new(vec![Asset::new("X", "X", AssetType::Equity, 1.0, 10.0)]);
    assert!(analyze_risk(&portfolio, 1.5).is_err());
    assert!(analyze_risk(&portfolio, f64::NAN).is_err());
}

#[test]
fn test_custom_reference_tables() {
    let reference: ReferenceData = serde_json::from_str(
        r#"{"sectors": {"Robotics": ["ZZZ"]}, "betas": {"ZZZ": 1.9}}"#,
    )
    .unwrap();
    let portfolio = PortfolioSnapshot::new(vec![
        Asset::new("ZZZ", "Robots", AssetType::Equity, 10.0, 100.0),
        Asset::new("BND", "Bonds", AssetType::Bond, 10.0, 100.0),
    ]);

    let report = analyze_risk_with(&reference, &portfolio, 0.0).unwrap();
    assert_eq!(report.sector_allocation.get("Robotics"), Some(&0.5));
    assert!((report.volatility_metrics.portfolio_beta - 0.95).abs() < 1e-9);

    let builtin = analyze_risk(&portfolio, 0.0).unwrap();
    assert!(builtin.sector_allocation.is_empty());
}
