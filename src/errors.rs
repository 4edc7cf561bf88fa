use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Serialization error: {0}")]
    Serialization(serde_json::Error),
    #[error("Reference data error: {0}")]
    ReferenceData(String),
}

impl From<serde_json::Error> for AnalysisError {
    fn from(value: serde_json::Error) -> Self {
        AnalysisError::Serialization(value)
    }
}

/// Failures of the optional advisory model. Never surfaced past the fallback layer.
#[derive(Debug, Error)]
pub enum AdvisorError {
    #[error("Advisor is disabled")]
    Disabled,
    #[error("Advisor request timed out")]
    Timeout,
    #[error("Rate limited by advisor provider")]
    RateLimited,
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Advisor API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },
    #[error("Invalid advisor response: {0}")]
    InvalidResponse(String),
    #[error("Advisor suggestion rejected: {0}")]
    ValidationFailed(String),
}

impl AdvisorError {
    /// Failures that may succeed on another attempt
    pub fn is_transient(&self) -> bool {
        match self {
            AdvisorError::Timeout | AdvisorError::RateLimited | AdvisorError::NetworkError(_) => true,
            AdvisorError::ApiError { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Reject NaN/infinite values and anything outside [0, 1].
pub(crate) fn ensure_fraction(name: &str, value: f64) -> Result<(), AnalysisError> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(AnalysisError::InvalidInput(format!(
            "{} must be within [0, 1], got {}",
            name, value
        )));
    }
    Ok(())
}
