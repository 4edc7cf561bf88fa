use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sentiment classification for a single news item
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    #[default]
    Neutral,
    Negative,
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sentiment::Positive => write!(f, "positive"),
            Sentiment::Neutral => write!(f, "neutral"),
            Sentiment::Negative => write!(f, "negative"),
        }
    }
}

/// Expected market impact of a news item
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    High,
    Medium,
    Low,
}

/// Aggregate sentiment across a set of news items
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum OverallSentiment {
    #[serde(rename = "strongly positive")]
    StronglyPositive,
    #[serde(rename = "moderately positive")]
    ModeratelyPositive,
    #[serde(rename = "positive")]
    Positive,
    #[default]
    #[serde(rename = "neutral")]
    Neutral,
    #[serde(rename = "negative")]
    Negative,
    #[serde(rename = "moderately negative")]
    ModeratelyNegative,
    #[serde(rename = "strongly negative")]
    StronglyNegative,
}

impl OverallSentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverallSentiment::StronglyPositive => "strongly positive",
            OverallSentiment::ModeratelyPositive => "moderately positive",
            OverallSentiment::Positive => "positive",
            OverallSentiment::Neutral => "neutral",
            OverallSentiment::Negative => "negative",
            OverallSentiment::ModeratelyNegative => "moderately negative",
            OverallSentiment::StronglyNegative => "strongly negative",
        }
    }

    pub fn is_positive(&self) -> bool {
        matches!(
            self,
            OverallSentiment::StronglyPositive
                | OverallSentiment::ModeratelyPositive
                | OverallSentiment::Positive
        )
    }

    pub fn is_negative(&self) -> bool {
        matches!(
            self,
            OverallSentiment::StronglyNegative
                | OverallSentiment::ModeratelyNegative
                | OverallSentiment::Negative
        )
    }

    pub fn is_strong(&self) -> bool {
        matches!(
            self,
            OverallSentiment::StronglyPositive | OverallSentiment::StronglyNegative
        )
    }

    /// Label with every word capitalized, e.g. "Moderately Negative"
    pub fn title(&self) -> String {
        self.as_str()
            .split(' ')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl std::fmt::Display for OverallSentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single news article as delivered by the news provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewsItem {
    pub title: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sentiment: Sentiment,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact: Option<Impact>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SentimentDistribution {
    pub positive: u32,
    pub neutral: u32,
    pub negative: u32,
}

impl SentimentDistribution {
    pub fn total(&self) -> u32 {
        self.positive + self.neutral + self.negative
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImpactDistribution {
    pub high: u32,
    pub medium: u32,
    pub low: u32,
}

/// A financial topic and how many articles mentioned it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TopicCount {
    pub topic: String,
    pub count: u32,
}

/// Provider-side aggregation of a news batch
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NewsAnalysis {
    #[serde(default)]
    pub overall_sentiment: OverallSentiment,
    #[serde(default)]
    pub sentiment_distribution: SentimentDistribution,
    #[serde(default)]
    pub impact_distribution: ImpactDistribution,
    #[serde(default)]
    pub primary_topics: Vec<TopicCount>,
}

/// News and sentiment inputs for a market assessment
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NewsSnapshot {
    #[serde(default)]
    pub items: Vec<NewsItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<NewsAnalysis>,
    /// Set by the provider when it served cached data after a failed refresh
    #[serde(default)]
    pub is_stale: bool,
}

impl NewsSnapshot {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.analysis.is_none()
    }
}
