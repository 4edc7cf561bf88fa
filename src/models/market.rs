use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::news::{ImpactDistribution, OverallSentiment, Sentiment, SentimentDistribution, TopicCount};
use crate::models::optimization::AnalysisSource;

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Daily move of a market index (VIX included, keyed by name)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexQuote {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_value: Option<f64>,
    /// Daily change in percent (1.2 for +1.2%)
    #[serde(default)]
    pub change_pct: f64,
}

/// Sector returns as fractions (0.034 for +3.4%)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SectorPerformance {
    pub name: String,
    #[serde(default)]
    pub performance_mtd: f64,
    #[serde(default)]
    pub performance_ytd: f64,
}

/// Macro indicators; rates are fractions, consumer sentiment is an index level
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct EconomicIndicators {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inflation_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unemployment_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fed_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gdp_growth: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consumer_sentiment: Option<f64>,
}

impl EconomicIndicators {
    pub fn is_empty(&self) -> bool {
        self.inflation_rate.is_none()
            && self.unemployment_rate.is_none()
            && self.fed_rate.is_none()
            && self.gdp_growth.is_none()
            && self.consumer_sentiment.is_none()
    }
}

/// Latest quote for an individual security
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StockQuote {
    pub symbol: String,
    pub current_price: f64,
    #[serde(default)]
    pub change_pct: f64,
}

/// Market data resolved by the market data provider
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MarketSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub as_of: Option<DateTime<Utc>>,
    #[serde(default)]
    pub indices: Vec<IndexQuote>,
    #[serde(default)]
    pub sectors: Vec<SectorPerformance>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub economic_indicators: Option<EconomicIndicators>,
    #[serde(default)]
    pub quotes: Vec<StockQuote>,
    /// Set by the provider when it served cached data after a failed refresh
    #[serde(default)]
    pub is_stale: bool,
}

impl MarketSnapshot {
    pub fn quote_price(&self, symbol: &str) -> Option<f64> {
        self.quotes
            .iter()
            .find(|q| q.symbol == symbol)
            .map(|q| q.current_price)
    }
}

// ---------------------------------------------------------------------------
// Labels
// ---------------------------------------------------------------------------

/// Directional label shared by the index trend and both outlook horizons
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum MarketTrend {
    #[serde(rename = "strongly bullish")]
    StronglyBullish,
    #[serde(rename = "bullish")]
    Bullish,
    #[default]
    #[serde(rename = "neutral")]
    Neutral,
    #[serde(rename = "bearish")]
    Bearish,
    #[serde(rename = "strongly bearish")]
    StronglyBearish,
}

impl MarketTrend {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarketTrend::StronglyBullish => "strongly bullish",
            MarketTrend::Bullish => "bullish",
            MarketTrend::Neutral => "neutral",
            MarketTrend::Bearish => "bearish",
            MarketTrend::StronglyBearish => "strongly bearish",
        }
    }

    /// Map a weighted outlook score onto a label (±0.3, ±1 thresholds)
    pub fn from_score(score: f64) -> Self {
        if score > 1.0 {
            MarketTrend::StronglyBullish
        } else if score > 0.3 {
            MarketTrend::Bullish
        } else if score < -1.0 {
            MarketTrend::StronglyBearish
        } else if score < -0.3 {
            MarketTrend::Bearish
        } else {
            MarketTrend::Neutral
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum MarketBreadth {
    #[serde(rename = "strongly positive")]
    StronglyPositive,
    #[serde(rename = "positive")]
    Positive,
    #[default]
    #[serde(rename = "neutral")]
    Neutral,
    #[serde(rename = "negative")]
    Negative,
    #[serde(rename = "strongly negative")]
    StronglyNegative,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MoveDirection {
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SectorRotation {
    Minimal,
    Moderate,
    Significant,
    #[default]
    Unknown,
}

impl SectorRotation {
    pub fn as_str(&self) -> &'static str {
        match self {
            SectorRotation::Minimal => "minimal",
            SectorRotation::Moderate => "moderate",
            SectorRotation::Significant => "significant",
            SectorRotation::Unknown => "unknown",
        }
    }
}

/// Cyclical vs defensive leadership
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SectorSentiment {
    RiskOn,
    RiskOff,
    Balanced,
    #[default]
    Unknown,
}

/// Status for inflation and unemployment readings
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LevelStatus {
    Low,
    Moderate,
    High,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RateStatus {
    Accommodative,
    Neutral,
    Restrictive,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum GrowthStatus {
    Weak,
    Moderate,
    Strong,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConsumerStatus {
    Negative,
    Neutral,
    Positive,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum PolicyTrajectory {
    #[serde(rename = "tightening")]
    Tightening,
    #[serde(rename = "easing")]
    Easing,
    #[serde(rename = "stagflation concerns")]
    StagflationConcerns,
    #[serde(rename = "neutral")]
    Neutral,
    #[default]
    #[serde(rename = "unknown")]
    Unknown,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RecessionRisk {
    Low,
    Moderate,
    High,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PotentialImpact {
    High,
    Moderate,
    Low,
    #[default]
    Unknown,
}

/// Direction in which a driver pushes the market
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DriverImpact {
    Positive,
    Negative,
    Neutral,
}

impl From<Sentiment> for DriverImpact {
    fn from(sentiment: Sentiment) -> Self {
        match sentiment {
            Sentiment::Positive => DriverImpact::Positive,
            Sentiment::Negative => DriverImpact::Negative,
            Sentiment::Neutral => DriverImpact::Neutral,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FactorCategory {
    Market,
    Economic,
    Sector,
    Sentiment,
    News,
    Policy,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Medium,
    High,
}

// ---------------------------------------------------------------------------
// Assessment
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SignificantMove {
    pub index: String,
    pub change_pct: f64,
    pub direction: MoveDirection,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndicesAnalysis {
    /// Mean daily change in percent across all provided indices
    pub average_change: f64,
    pub market_breadth: MarketBreadth,
    pub significant_moves: Vec<SignificantMove>,
    pub trend: MarketTrend,
    /// VIX level, 20 when no VIX quote was provided
    pub vix_level: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SectorRank {
    pub name: String,
    /// Month-to-date performance in percent
    pub performance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LeadershipShift {
    pub sector: String,
    pub prior_rank: usize,
    pub current_rank: usize,
    pub mtd_performance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SectorAnalysis {
    pub top_sectors: Vec<SectorRank>,
    pub bottom_sectors: Vec<SectorRank>,
    pub leadership_shifts: Vec<LeadershipShift>,
    /// Best minus worst MTD performance, in percent points
    pub sector_divergence: f64,
    pub sector_rotation: SectorRotation,
    pub market_sentiment: SectorSentiment,
}

/// An indicator value with its bucketed status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct IndicatorReading<S> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    pub status: S,
}

impl<S: Default> Default for IndicatorReading<S> {
    fn default() -> Self {
        Self {
            value: None,
            status: S::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct EconomicAnalysis {
    pub inflation: IndicatorReading<LevelStatus>,
    pub unemployment: IndicatorReading<LevelStatus>,
    pub interest_rates: IndicatorReading<RateStatus>,
    pub gdp_growth: IndicatorReading<GrowthStatus>,
    pub consumer_sentiment: IndicatorReading<ConsumerStatus>,
    pub policy_trajectory: PolicyTrajectory,
    pub recession_risk: RecessionRisk,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KeyNews {
    pub title: String,
    pub sentiment: Sentiment,
    pub source: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SentimentAnalysis {
    pub overall_sentiment: OverallSentiment,
    pub sentiment_distribution: SentimentDistribution,
    pub impact_distribution: ImpactDistribution,
    pub primary_topics: Vec<TopicCount>,
    pub potential_impact: PotentialImpact,
    pub key_news: Vec<KeyNews>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutlookHorizon {
    pub outlook: MarketTrend,
    pub score: f64,
    pub key_factors: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MarketOutlook {
    pub short_term: OutlookHorizon,
    pub medium_term: OutlookHorizon,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KeyDriver {
    pub factor: String,
    pub impact: DriverImpact,
    pub category: FactorCategory,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RiskFactor {
    pub factor: String,
    pub severity: Severity,
    pub category: FactorCategory,
}

/// Full market condition assessment
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MarketAssessment {
    pub market_summary: String,
    pub indices_analysis: IndicesAnalysis,
    pub sector_analysis: SectorAnalysis,
    pub economic_analysis: EconomicAnalysis,
    pub sentiment_analysis: SentimentAnalysis,
    pub market_outlook: MarketOutlook,
    /// At most five, strongest category first
    pub key_drivers: Vec<KeyDriver>,
    /// At most five, high severity first
    pub risk_factors: Vec<RiskFactor>,
    /// True when either input snapshot was flagged stale by its provider
    #[serde(default)]
    pub stale_inputs: bool,
    #[serde(default)]
    pub source: AnalysisSource,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trend_from_score_thresholds() {
        assert_eq!(MarketTrend::from_score(1.2), MarketTrend::StronglyBullish);
        assert_eq!(MarketTrend::from_score(0.5), MarketTrend::Bullish);
        assert_eq!(MarketTrend::from_score(0.3), MarketTrend::Neutral);
        assert_eq!(MarketTrend::from_score(-0.31), MarketTrend::Bearish);
        assert_eq!(MarketTrend::from_score(-1.5), MarketTrend::StronglyBearish);
    }

    #[test]
    fn test_label_serialization() {
        assert_eq!(
            serde_json::to_string(&SectorSentiment::RiskOn).unwrap(),
            "\"risk-on\""
        );
        assert_eq!(
            serde_json::to_string(&PolicyTrajectory::StagflationConcerns).unwrap(),
            "\"stagflation concerns\""
        );
        assert_eq!(
            serde_json::to_string(&MarketBreadth::StronglyNegative).unwrap(),
            "\"strongly negative\""
        );
    }

    #[test]
    fn test_quote_price_lookup() {
        let snapshot = MarketSnapshot {
            quotes: vec![StockQuote {
                symbol: "MSFT".to_string(),
                current_price: 410.0,
                change_pct: 0.4,
            }],
            ..Default::default()
        };
        assert_eq!(snapshot.quote_price("MSFT"), Some(410.0));
        assert_eq!(snapshot.quote_price("AAPL"), None);
    }
}
