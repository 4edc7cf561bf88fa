pub mod market;
pub mod news;
pub mod optimization;
pub mod portfolio;
pub mod risk;

pub use market::{
    ConsumerStatus, DriverImpact, EconomicAnalysis, EconomicIndicators, FactorCategory,
    GrowthStatus, IndexQuote, IndicatorReading, IndicesAnalysis, KeyDriver, KeyNews,
    LeadershipShift, LevelStatus, MarketAssessment, MarketBreadth, MarketOutlook,
    MarketSnapshot, MarketTrend, MoveDirection, OutlookHorizon, PolicyTrajectory,
    PotentialImpact, RateStatus, RecessionRisk, RiskFactor, SectorAnalysis, SectorPerformance,
    SectorRank, SectorRotation, SectorSentiment, SentimentAnalysis, Severity, SignificantMove,
    StockQuote,
};
pub use news::{
    Impact, ImpactDistribution, NewsAnalysis, NewsItem, NewsSnapshot, OverallSentiment,
    Sentiment, SentimentDistribution, TopicCount,
};
pub use optimization::{
    AnalysisSource, Constraints, ExpectedImpact, LiquidityCheck, OptimizationPlan,
    OutcomeMetrics, RecommendedTrade, TradeAction,
};
pub use portfolio::{Asset, AssetClassAllocation, AssetType, PortfolioSnapshot};
pub use risk::{CorrelationMatrix, HighRiskAsset, RiskLevel, RiskReport, VolatilityMetrics};
