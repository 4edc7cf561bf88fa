use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, error, info, warn};

use crate::config::AdvisorConfig;
use crate::errors::{AdvisorError, AnalysisError};
use crate::models::*;
use crate::services::reference_data::ReferenceData;
use crate::services::{market_service, optimization_service};

const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";

const SYSTEM_PROMPT: &str = "You are a portfolio analysis assistant. Answer with a single JSON object that follows the requested schema exactly. Do not add commentary outside the JSON object.";

/// Tolerance for allocation sums and constraint bounds in advisor suggestions
const TOLERANCE: f64 = 1e-6;

/// A generative model that can propose alternative analysis results
#[async_trait]
pub trait AnalysisAdvisor: Send + Sync {
    /// Raw model reply for a prompt
    async fn complete(&self, prompt: String) -> Result<String, AdvisorError>;
}

/// Waits before each retry of a transient failure
static RETRY_DELAYS: [Duration; 3] = [
    Duration::from_secs(1),
    Duration::from_secs(2),
    Duration::from_secs(4),
];

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: usize,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    usage: Option<TokenUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenUsage {
    total_tokens: u32,
}

impl ChatCompletion {
    fn into_text(self) -> Result<String, AdvisorError> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| AdvisorError::InvalidResponse("Advisor reply has no content".to_string()))
    }
}

/// OpenAI chat-completions advisor
pub struct OpenAiAdvisor {
    api_key: String,
    model: String,
    max_tokens: usize,
    temperature: f32,
    client: Client,
}

impl OpenAiAdvisor {
    pub fn new(config: &AdvisorConfig) -> Result<Self, AdvisorError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.is_empty())
            .ok_or(AdvisorError::Disabled)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AdvisorError::NetworkError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_key,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            client,
        })
    }

    /// Send a request, retrying transient failures on the `RETRY_DELAYS` schedule.
    async fn send_with_retry(&self, request: &ChatRequest<'_>) -> Result<ChatCompletion, AdvisorError> {
        let mut delays = RETRY_DELAYS.iter();
        let mut attempt = 1;

        loop {
            let failure = match self.send(request).await {
                Ok(completion) => return Ok(completion),
                Err(e) => e,
            };

            match delays.next() {
                Some(delay) if failure.is_transient() => {
                    warn!(
                        "Advisor request failed on attempt {}: {}. Retrying in {:?}",
                        attempt, failure, delay
                    );
                    tokio::time::sleep(*delay).await;
                    attempt += 1;
                }
                _ => {
                    error!("Advisor request failed after {} attempt(s): {}", attempt, failure);
                    return Err(failure);
                }
            }
        }
    }

    async fn send(&self, request: &ChatRequest<'_>) -> Result<ChatCompletion, AdvisorError> {
        let response = self
            .client
            .post(OPENAI_CHAT_URL)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AdvisorError::Timeout
                } else {
                    AdvisorError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(AdvisorError::RateLimited);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AdvisorError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<ChatCompletion>()
            .await
            .map_err(|e| AdvisorError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl AnalysisAdvisor for OpenAiAdvisor {
    async fn complete(&self, prompt: String) -> Result<String, AdvisorError> {
        debug!("Requesting advisor completion from {}", self.model);

        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let completion = self.send_with_retry(&request).await?;
        if let Some(usage) = &completion.usage {
            info!("Advisor reply received ({} tokens)", usage.total_tokens);
        }
        completion.into_text()
    }
}

/// Build the configured advisor, or `None` when it is disabled or unusable.
pub fn advisor_from_config(config: &AdvisorConfig) -> Option<Arc<dyn AnalysisAdvisor>> {
    if !config.enabled {
        info!("Advisor is disabled in configuration");
        return None;
    }

    match OpenAiAdvisor::new(config) {
        Ok(advisor) => {
            info!("Initializing advisor with model: {}", config.model);
            Some(Arc::new(advisor) as Arc<dyn AnalysisAdvisor>)
        }
        Err(e) => {
            warn!("Advisor unavailable: {}. Using rule-based analysis only.", e);
            None
        }
    }
}

/// Slice out the outermost JSON object of a model reply (fences and prose are dropped).
pub fn extract_json_object(reply: &str) -> Result<&str, AdvisorError> {
    match (reply.find('{'), reply.rfind('}')) {
        (Some(start), Some(end)) if start < end => Ok(&reply[start..=end]),
        _ => Err(AdvisorError::InvalidResponse(
            "No JSON object in advisor reply".to_string(),
        )),
    }
}

/// The parts of an optimization plan the advisor may replace
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanSuggestion {
    pub target_allocation: AssetClassAllocation,
    pub recommended_trades: Vec<RecommendedTrade>,
    pub optimization_strategy: String,
}

/// The parts of a market assessment the advisor may replace
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentSuggestion {
    pub market_summary: String,
    pub market_outlook: MarketOutlook,
    pub key_drivers: Vec<KeyDriver>,
    pub risk_factors: Vec<RiskFactor>,
}

fn check_fraction(name: &str, value: f64) -> Result<(), AdvisorError> {
    if value.is_finite() && (-TOLERANCE..=1.0 + TOLERANCE).contains(&value) {
        Ok(())
    } else {
        Err(AdvisorError::ValidationFailed(format!(
            "{} must be within [0, 1], got {}",
            name, value
        )))
    }
}

pub fn validate_plan_suggestion(
    suggestion: &PlanSuggestion,
    constraints: &Constraints,
) -> Result<(), AdvisorError> {
    let target = &suggestion.target_allocation;
    for asset_type in AssetType::ALL {
        check_fraction(asset_type.as_str(), target.get(asset_type))?;
    }

    let total = target.total();
    if (total - 1.0).abs() > TOLERANCE {
        return Err(AdvisorError::ValidationFailed(format!(
            "Target allocation sums to {}",
            total
        )));
    }
    if target.bond < constraints.min_bonds_allocation - TOLERANCE {
        return Err(AdvisorError::ValidationFailed(format!(
            "Bond allocation {} is below the {} floor",
            target.bond, constraints.min_bonds_allocation
        )));
    }
    if target.alternative > constraints.max_alternatives_allocation + TOLERANCE {
        return Err(AdvisorError::ValidationFailed(format!(
            "Alternative allocation {} exceeds the {} cap",
            target.alternative, constraints.max_alternatives_allocation
        )));
    }

    for trade in &suggestion.recommended_trades {
        if trade.symbol.is_none() && trade.name.is_none() {
            return Err(AdvisorError::ValidationFailed(
                "Trade without symbol or name".to_string(),
            ));
        }
        check_fraction("trade target_allocation", trade.target_allocation)?;
        if let Some(current) = trade.current_allocation {
            check_fraction("trade current_allocation", current)?;
        }
    }

    if suggestion.optimization_strategy.trim().is_empty() {
        return Err(AdvisorError::ValidationFailed(
            "Empty optimization strategy".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_assessment_suggestion(suggestion: &AssessmentSuggestion) -> Result<(), AdvisorError> {
    if suggestion.market_summary.trim().is_empty() {
        return Err(AdvisorError::ValidationFailed("Empty market summary".to_string()));
    }
    if suggestion.key_drivers.len() > 5 || suggestion.risk_factors.len() > 5 {
        return Err(AdvisorError::ValidationFailed(format!(
            "At most five drivers and risks allowed, got {} and {}",
            suggestion.key_drivers.len(),
            suggestion.risk_factors.len()
        )));
    }
    let outlook = &suggestion.market_outlook;
    if !outlook.short_term.score.is_finite() || !outlook.medium_term.score.is_finite() {
        return Err(AdvisorError::ValidationFailed(
            "Outlook scores must be finite".to_string(),
        ));
    }
    Ok(())
}

async fn suggest_plan(
    advisor: &dyn AnalysisAdvisor,
    portfolio: &PortfolioSnapshot,
    baseline: &OptimizationPlan,
    constraints: &Constraints,
) -> Result<PlanSuggestion, AdvisorError> {
    let context = json!({
        "portfolio": portfolio,
        "current_risk_score": baseline.current_risk_score,
        "target_risk_score": baseline.target_risk_score,
        "constraints": constraints,
        "current_allocation": baseline.current_allocation,
        "rule_based_plan": {
            "target_allocation": baseline.target_allocation,
            "recommended_trades": baseline.recommended_trades,
            "optimization_strategy": baseline.optimization_strategy,
        },
    });
    let prompt = format!(
        "Review this portfolio rebalancing request and propose a plan.\n\n{}\n\n\
         Reply with a JSON object with the keys target_allocation (equity, bond, alternative, cash \
         as fractions summing to 1), recommended_trades (same shape as the rule-based trades) and \
         optimization_strategy (a short explanation). Bonds must stay at or above min_bonds_allocation \
         and alternatives at or below max_alternatives_allocation.",
        context
    );

    let reply = advisor.complete(prompt).await?;
    let suggestion: PlanSuggestion = serde_json::from_str(extract_json_object(&reply)?)
        .map_err(|e| AdvisorError::InvalidResponse(e.to_string()))?;
    validate_plan_suggestion(&suggestion, constraints)?;
    Ok(suggestion)
}

async fn suggest_assessment(
    advisor: &dyn AnalysisAdvisor,
    baseline: &MarketAssessment,
) -> Result<AssessmentSuggestion, AdvisorError> {
    let context = serde_json::to_string(baseline)
        .map_err(|e| AdvisorError::InvalidResponse(e.to_string()))?;
    let prompt = format!(
        "Review this market assessment and refine its conclusions.\n\n{}\n\n\
         Reply with a JSON object with the keys market_summary, market_outlook (short_term and \
         medium_term, each with outlook, score and key_factors), key_drivers (at most 5) and \
         risk_factors (at most 5), using the same labels as the input.",
        context
    );

    let reply = advisor.complete(prompt).await?;
    let suggestion: AssessmentSuggestion = serde_json::from_str(extract_json_object(&reply)?)
        .map_err(|e| AdvisorError::InvalidResponse(e.to_string()))?;
    validate_assessment_suggestion(&suggestion)?;
    Ok(suggestion)
}

/// Optimize with an advisor's plan when it validates, otherwise the rule-based plan.
///
/// Input errors are returned before the advisor is consulted.
pub async fn optimize_with_advisor(
    advisor: &dyn AnalysisAdvisor,
    reference: &ReferenceData,
    portfolio: &PortfolioSnapshot,
    current_risk: f64,
    target_risk: f64,
    constraints: &Constraints,
    market: Option<&MarketSnapshot>,
) -> Result<OptimizationPlan, AnalysisError> {
    let baseline = optimization_service::optimize_portfolio_with(
        reference,
        portfolio,
        current_risk,
        target_risk,
        constraints,
        market,
    )?;

    let suggestion = suggest_plan(advisor, portfolio, &baseline, constraints).await;
    match suggestion {
        Ok(suggestion) => {
            info!(
                "Using advisor plan with {} trade(s)",
                suggestion.recommended_trades.len()
            );
            let expected_impact = optimization_service::estimate_outcomes(
                current_risk,
                target_risk,
                &suggestion.recommended_trades,
            );
            let liquidity_check =
                optimization_service::check_liquidity(&suggestion.target_allocation, constraints);
            Ok(OptimizationPlan {
                target_allocation: suggestion.target_allocation.normalized(),
                recommended_trades: suggestion.recommended_trades,
                optimization_strategy: suggestion.optimization_strategy,
                expected_impact,
                liquidity_check,
                source: AnalysisSource::Advisor,
                ..baseline
            })
        }
        Err(e) => {
            warn!("Advisor plan rejected, using rule-based plan: {}", e);
            Ok(baseline)
        }
    }
}

/// Assess the market with the advisor's conclusions when they validate.
pub async fn assess_with_advisor(
    advisor: &dyn AnalysisAdvisor,
    market: &MarketSnapshot,
    news: &NewsSnapshot,
) -> MarketAssessment {
    let baseline = market_service::assess_market(market, news);

    let suggestion = suggest_assessment(advisor, &baseline).await;
    match suggestion {
        Ok(suggestion) => {
            info!("Using advisor market assessment");
            MarketAssessment {
                market_summary: suggestion.market_summary,
                market_outlook: suggestion.market_outlook,
                key_drivers: suggestion.key_drivers,
                risk_factors: suggestion.risk_factors,
                source: AnalysisSource::Advisor,
                ..baseline
            }
        }
        Err(e) => {
            warn!("Advisor assessment rejected, using rule-based assessment: {}", e);
            baseline
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockAdvisor {
        reply: Option<String>,
        calls: AtomicUsize,
    }

    impl MockAdvisor {
        fn replying(reply: &str) -> Self {
            Self {
                reply: Some(reply.to_string()),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                reply: None,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl AnalysisAdvisor for MockAdvisor {
        async fn complete(&self, _prompt: String) -> Result<String, AdvisorError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply.clone().ok_or(AdvisorError::Timeout)
        }
    }

    fn portfolio() -> PortfolioSnapshot {
        PortfolioSnapshot::new(vec![
            Asset::new("AAPL", "Apple", AssetType::Equity, 100.0, 150.0),
            Asset::new("MSFT", "Microsoft", AssetType::Equity, 20.0, 400.0),
        ])
    }

    fn plan_reply(bond: f64, equity: f64) -> String {
        format!(
            "Here is the plan:\n```json\n{}\n```",
            json!({
                "target_allocation": {"equity": equity, "bond": bond, "alternative": 0.05, "cash": 0.05},
                "recommended_trades": [{
                    "symbol": "BND",
                    "asset_class": "bond",
                    "action": "add",
                    "target_allocation": bond,
                    "rationale": "Add core bond exposure"
                }],
                "optimization_strategy": "Shift into bonds to lower risk."
            })
        )
    }

    fn baseline() -> OptimizationPlan {
        optimization_service::optimize_portfolio(&portfolio(), 0.8, 0.4, &Constraints::default(), None)
            .unwrap()
    }

    #[test]
    fn test_extract_json_object() {
        assert_eq!(extract_json_object("```json\n{\"a\": {\"b\": 1}}\n```").unwrap(), "{\"a\": {\"b\": 1}}");
        assert!(matches!(
            extract_json_object("no json here"),
            Err(AdvisorError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_chat_completion_text() {
        let completion: ChatCompletion = serde_json::from_str(
            r#"{"choices": [{"message": {"role": "assistant", "content": "{}"}}], "usage": {"prompt_tokens": 5, "completion_tokens": 1, "total_tokens": 6}}"#,
        )
        .unwrap();
        assert_eq!(completion.into_text().unwrap(), "{}");

        let empty: ChatCompletion =
            serde_json::from_str(r#"{"choices": [{"message": {"content": null}}]}"#).unwrap();
        assert!(matches!(empty.into_text(), Err(AdvisorError::InvalidResponse(_))));

        let no_choices: ChatCompletion = serde_json::from_str("{}").unwrap();
        assert!(no_choices.into_text().is_err());
    }

    #[test]
    fn test_advisor_disabled_by_default() {
        assert!(advisor_from_config(&AdvisorConfig::default()).is_none());

        let enabled_without_key = AdvisorConfig {
            enabled: true,
            ..Default::default()
        };
        assert!(advisor_from_config(&enabled_without_key).is_none());
        assert!(matches!(
            OpenAiAdvisor::new(&enabled_without_key),
            Err(AdvisorError::Disabled)
        ));
    }

    #[tokio::test]
    async fn test_valid_advisor_plan_is_used() {
        let advisor = MockAdvisor::replying(&plan_reply(0.4, 0.5));
        let plan = optimize_with_advisor(
            &advisor,
            &ReferenceData::default(),
            &portfolio(),
            0.8,
            0.4,
            &Constraints::default(),
            None,
        )
        .await
        .unwrap();

        assert_eq!(plan.source, AnalysisSource::Advisor);
        assert_eq!(plan.recommended_trades.len(), 1);
        assert!((plan.target_allocation.bond - 0.4).abs() < 1e-9);
        assert!(plan.liquidity_check.satisfied);
        assert_eq!(plan.current_allocation, baseline().current_allocation);
    }

    #[tokio::test]
    async fn test_plan_below_bond_floor_falls_back() {
        let advisor = MockAdvisor::replying(&plan_reply(0.05, 0.85));
        let plan = optimize_with_advisor(
            &advisor,
            &ReferenceData::default(),
            &portfolio(),
            0.8,
            0.4,
            &Constraints::default(),
            None,
        )
        .await
        .unwrap();

        assert_eq!(plan, baseline());
        assert_eq!(advisor.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_advisor_failure_falls_back() {
        let advisor = MockAdvisor::failing();
        let plan = optimize_with_advisor(
            &advisor,
            &ReferenceData::default(),
            &portfolio(),
            0.8,
            0.4,
            &Constraints::default(),
            None,
        )
        .await
        .unwrap();
        assert_eq!(plan.source, AnalysisSource::RuleBased);

        let garbage = MockAdvisor::replying("{not json}");
        let assessment =
            assess_with_advisor(&garbage, &MarketSnapshot::default(), &NewsSnapshot::default()).await;
        assert_eq!(assessment.source, AnalysisSource::RuleBased);
    }

    #[tokio::test]
    async fn test_invalid_input_skips_advisor() {
        let advisor = MockAdvisor::replying(&plan_reply(0.4, 0.5));
        let result = optimize_with_advisor(
            &advisor,
            &ReferenceData::default(),
            &PortfolioSnapshot::default(),
            0.8,
            0.4,
            &Constraints::default(),
            None,
        )
        .await;

        assert!(matches!(result, Err(AnalysisError::InvalidInput(_))));
        assert_eq!(advisor.calls.load(Ordering::SeqCst), 0);
    }

    fn assessment_reply(drivers: usize) -> String {
        let drivers: Vec<_> = (0..drivers)
            .map(|i| json!({"factor": format!("Driver {}", i), "impact": "positive", "category": "market"}))
            .collect();
        json!({
            "market_summary": "Markets are calm.",
            "market_outlook": {
                "short_term": {"outlook": "bullish", "score": 0.5, "key_factors": []},
                "medium_term": {"outlook": "neutral", "score": 0.0, "key_factors": []}
            },
            "key_drivers": drivers,
            "risk_factors": []
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_advisor_assessment_substitution() {
        let market = MarketSnapshot::default();
        let news = NewsSnapshot::default();

        let advisor = MockAdvisor::replying(&assessment_reply(2));
        let assessment = assess_with_advisor(&advisor, &market, &news).await;
        assert_eq!(assessment.source, AnalysisSource::Advisor);
        assert_eq!(assessment.market_summary, "Markets are calm.");
        assert_eq!(assessment.market_outlook.short_term.outlook, MarketTrend::Bullish);
        assert_eq!(assessment.key_drivers.len(), 2);

        let too_many = MockAdvisor::replying(&assessment_reply(6));
        let assessment = assess_with_advisor(&too_many, &market, &news).await;
        assert_eq!(assessment, market_service::assess_market(&market, &news));
    }
}
