use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::models::{
    Impact, ImpactDistribution, NewsAnalysis, NewsItem, NewsSnapshot, OverallSentiment, Sentiment,
    SentimentDistribution, TopicCount,
};

/// Financial topics tracked across news headlines and summaries
pub const FINANCIAL_TOPICS: [&str; 18] = [
    "interest rates",
    "inflation",
    "earnings",
    "federal reserve",
    "monetary policy",
    "economic growth",
    "recession",
    "stock market",
    "technology",
    "regulation",
    "energy",
    "consumer spending",
    "housing market",
    "unemployment",
    "trade",
    "cryptocurrency",
    "ai",
    "supply chain",
];

/// Maximum number of topics reported per batch
const MAX_TOPICS: usize = 5;

/// One case-insensitive, word-bounded matcher per topic, in `FINANCIAL_TOPICS` order.
fn topic_patterns() -> &'static [(&'static str, Regex)] {
    static PATTERNS: OnceLock<Vec<(&'static str, Regex)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        FINANCIAL_TOPICS
            .iter()
            .filter_map(|topic| {
                Regex::new(&format!(r"(?i)\b{}\b", regex::escape(topic)))
                    .ok()
                    .map(|re| (*topic, re))
            })
            .collect()
    })
}

/// Provider analysis when present, otherwise one derived from the raw items.
pub fn resolve_analysis(news: &NewsSnapshot) -> NewsAnalysis {
    match &news.analysis {
        Some(analysis) => analysis.clone(),
        None => {
            debug!("Deriving news analysis from {} items", news.items.len());
            derive_analysis(&news.items)
        }
    }
}

/// Aggregate sentiment, impact and topics over a batch of news items.
pub fn derive_analysis(items: &[NewsItem]) -> NewsAnalysis {
    let mut sentiment_distribution = SentimentDistribution::default();
    let mut impact_distribution = ImpactDistribution::default();

    for item in items {
        match item.sentiment {
            Sentiment::Positive => sentiment_distribution.positive += 1,
            Sentiment::Neutral => sentiment_distribution.neutral += 1,
            Sentiment::Negative => sentiment_distribution.negative += 1,
        }
        match item.impact {
            Some(Impact::High) => impact_distribution.high += 1,
            Some(Impact::Medium) => impact_distribution.medium += 1,
            Some(Impact::Low) => impact_distribution.low += 1,
            None => {}
        }
    }

    NewsAnalysis {
        overall_sentiment: overall_sentiment(&sentiment_distribution),
        sentiment_distribution,
        impact_distribution,
        primary_topics: extract_topics(items),
    }
}

/// Classify a distribution by its positive and negative shares.
///
/// Positive shares are checked first: above 60% is strong, above 40% moderate.
pub fn overall_sentiment(distribution: &SentimentDistribution) -> OverallSentiment {
    let total = distribution.total();
    if total == 0 {
        return OverallSentiment::Neutral;
    }

    let positive = distribution.positive as f64 / total as f64;
    let negative = distribution.negative as f64 / total as f64;

    if positive > 0.6 {
        OverallSentiment::StronglyPositive
    } else if positive > 0.4 {
        OverallSentiment::ModeratelyPositive
    } else if negative > 0.6 {
        OverallSentiment::StronglyNegative
    } else if negative > 0.4 {
        OverallSentiment::ModeratelyNegative
    } else {
        OverallSentiment::Neutral
    }
}

/// Count the articles mentioning each tracked topic; most mentioned first.
pub fn extract_topics(items: &[NewsItem]) -> Vec<TopicCount> {
    let mut counts: Vec<TopicCount> = topic_patterns()
        .iter()
        .map(|(topic, pattern)| TopicCount {
            topic: topic.to_string(),
            count: items
                .iter()
                .filter(|item| {
                    pattern.is_match(&item.title) || pattern.is_match(&item.summary)
                })
                .count() as u32,
        })
        .filter(|t| t.count > 0)
        .collect();

    // Stable, so ties keep the tracked-topic order
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(MAX_TOPICS);
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(title: &str, sentiment: Sentiment, impact: Option<Impact>) -> NewsItem {
        NewsItem {
            title: title.to_string(),
            source: "Wire".to_string(),
            summary: String::new(),
            url: None,
            published_at: None,
            sentiment,
            impact,
        }
    }

    #[test]
    fn test_overall_sentiment_thresholds() {
        let dist = |positive, neutral, negative| SentimentDistribution {
            positive,
            neutral,
            negative,
        };
        assert_eq!(overall_sentiment(&dist(0, 0, 0)), OverallSentiment::Neutral);
        assert_eq!(overall_sentiment(&dist(7, 3, 0)), OverallSentiment::StronglyPositive);
        assert_eq!(overall_sentiment(&dist(5, 3, 2)), OverallSentiment::ModeratelyPositive);
        assert_eq!(overall_sentiment(&dist(1, 2, 7)), OverallSentiment::StronglyNegative);
        assert_eq!(overall_sentiment(&dist(2, 3, 5)), OverallSentiment::ModeratelyNegative);
        assert_eq!(overall_sentiment(&dist(4, 2, 4)), OverallSentiment::Neutral);
    }

    #[test]
    fn test_topics_are_word_bounded() {
        let items = vec![
            item("Inflation cools as Federal Reserve holds", Sentiment::Positive, None),
            item("Analyst said inflation remains sticky", Sentiment::Negative, None),
            item("AI chip demand lifts technology shares", Sentiment::Positive, None),
        ];
        let topics = extract_topics(&items);

        assert_eq!(topics[0].topic, "inflation");
        assert_eq!(topics[0].count, 2);
        let ai = topics.iter().find(|t| t.topic == "ai").unwrap();
        assert_eq!(ai.count, 1);
        assert!(topics.iter().any(|t| t.topic == "federal reserve"));
    }

    #[test]
    fn test_topics_limited_to_five() {
        let items = vec![item(
            "Inflation, earnings, recession, energy, trade and housing market worries",
            Sentiment::Neutral,
            None,
        )];
        assert_eq!(extract_topics(&items).len(), 5);
    }

    #[test]
    fn test_derive_analysis_counts() {
        let items = vec![
            item("Stocks rally", Sentiment::Positive, Some(Impact::High)),
            item("Bond yields climb", Sentiment::Negative, Some(Impact::Medium)),
            item("Quiet session", Sentiment::Neutral, None),
        ];
        let analysis = derive_analysis(&items);

        assert_eq!(analysis.sentiment_distribution.total(), 3);
        assert_eq!(analysis.impact_distribution.high, 1);
        assert_eq!(analysis.impact_distribution.low, 0);
        assert_eq!(analysis.overall_sentiment, OverallSentiment::Neutral);
    }

    #[test]
    fn test_provider_analysis_takes_precedence() {
        let snapshot = NewsSnapshot {
            items: vec![item("Stocks rally", Sentiment::Positive, None)],
            analysis: Some(NewsAnalysis {
                overall_sentiment: OverallSentiment::StronglyNegative,
                ..Default::default()
            }),
            is_stale: false,
        };
        assert_eq!(
            resolve_analysis(&snapshot).overall_sentiment,
            OverallSentiment::StronglyNegative
        );
    }
}
