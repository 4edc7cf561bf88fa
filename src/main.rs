use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;

use rustfolio_engine::logging::{init_logging, LoggingConfig};
use rustfolio_engine::{
    advisor_from_config, assess_with_advisor, optimize_with_advisor, AnalysisCache, Constraints,
    EngineConfig, MarketSnapshot, NewsSnapshot, PortfolioSnapshot, ReferenceData,
};

#[derive(Debug, Parser)]
#[command(name = "rustfolio-engine", about = "Portfolio risk, rebalancing and market analysis")]
struct Args {
    /// Sector/beta reference tables (JSON). Overrides REFERENCE_DATA_PATH.
    #[arg(long, global = true)]
    reference: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Risk report for a portfolio snapshot
    Risk {
        #[arg(long)]
        portfolio: PathBuf,
        /// Defaults to RISK_THRESHOLD
        #[arg(long)]
        threshold: Option<f64>,
    },
    /// Rebalancing plan toward a target risk level
    Optimize {
        #[arg(long)]
        portfolio: PathBuf,
        #[arg(long)]
        current_risk: f64,
        #[arg(long)]
        target_risk: f64,
        /// Partial constraint overrides (JSON); unset fields come from the environment
        #[arg(long)]
        constraints: Option<PathBuf>,
        #[arg(long)]
        market: Option<PathBuf>,
        /// Ask the configured advisor for a plan first
        #[arg(long)]
        advisor: bool,
    },
    /// Market assessment from market data and news
    Market {
        #[arg(long)]
        market: PathBuf,
        #[arg(long)]
        news: Option<PathBuf>,
        #[arg(long)]
        advisor: bool,
    },
}

fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

/// Constraint file fields override the configured defaults
fn merge_constraints(base: Constraints, path: &Path) -> anyhow::Result<Constraints> {
    let mut merged = serde_json::to_value(base)?;
    let overrides: serde_json::Value = read_json(path)?;
    if let (Some(target), Some(source)) = (merged.as_object_mut(), overrides.as_object()) {
        for (key, value) in source {
            target.insert(key.clone(), value.clone());
        }
    }
    Ok(serde_json::from_value(merged)?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    init_logging(LoggingConfig::from_env())
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {}", e))?;

    let config = EngineConfig::from_env();
    config.validate().map_err(anyhow::Error::msg)?;

    let reference = match args.reference.as_ref().or(config.reference_data_path.as_ref()) {
        Some(path) => ReferenceData::from_json_file(path)?,
        None => ReferenceData::default(),
    };
    let cache = AnalysisCache::from_config(&config);

    let output = match args.command {
        Command::Risk {
            portfolio,
            threshold,
        } => {
            let portfolio: PortfolioSnapshot = read_json(&portfolio)?;
            let report = cache.analyze_risk(
                &reference,
                &portfolio,
                threshold.unwrap_or(config.risk_threshold),
            )?;
            serde_json::to_string_pretty(&report)?
        }
        Command::Optimize {
            portfolio,
            current_risk,
            target_risk,
            constraints,
            market,
            advisor,
        } => {
            let portfolio: PortfolioSnapshot = read_json(&portfolio)?;
            let constraints = match constraints {
                Some(path) => merge_constraints(config.constraints, &path)?,
                None => config.constraints,
            };
            let market: Option<MarketSnapshot> = market.as_deref().map(read_json).transpose()?;

            let plan = match advisor.then(|| advisor_from_config(&config.advisor)).flatten() {
                Some(advisor) => {
                    optimize_with_advisor(
                        advisor.as_ref(),
                        &reference,
                        &portfolio,
                        current_risk,
                        target_risk,
                        &constraints,
                        market.as_ref(),
                    )
                    .await?
                }
                None => cache.optimize_portfolio(
                    &reference,
                    &portfolio,
                    current_risk,
                    target_risk,
                    &constraints,
                    market.as_ref(),
                )?,
            };
            serde_json::to_string_pretty(&plan)?
        }
        Command::Market {
            market,
            news,
            advisor,
        } => {
            let market: MarketSnapshot = read_json(&market)?;
            let news: NewsSnapshot = match news {
                Some(path) => read_json(&path)?,
                None => NewsSnapshot::default(),
            };

            let assessment = match advisor.then(|| advisor_from_config(&config.advisor)).flatten() {
                Some(advisor) => assess_with_advisor(advisor.as_ref(), &market, &news).await,
                None => cache.assess_market(&market, &news)?,
            };
            serde_json::to_string_pretty(&assessment)?
        }
    };

    println!("{}", output);
    Ok(())
}
