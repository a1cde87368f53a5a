use serde::Serialize;
use thiserror::Error;

/// Validation errors raised while building logical queries.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("parameter key cannot be empty")]
    EmptyParameterKey,
    #[error("query category '{category}' requires parameter '{parameter}'")]
    MissingParameter {
        category: &'static str,
        parameter: &'static str,
    },
    #[error("parameter '{parameter}' must be a positive integer: '{value}'")]
    InvalidCount { parameter: &'static str, value: String },
    #[error("coin id cannot be empty")]
    EmptyCoinId,
    #[error("invalid time period '{value}', expected one of 3h, 24h, 7d, 30d, 3m, 1y, 3y, 5y")]
    InvalidTimePeriod { value: String },
    #[error("invalid category '{value}', expected one of listing, detail, history, exchanges, news")]
    InvalidCategory { value: String },
    #[error("timestamp must be RFC3339 UTC (suffix Z): '{value}'")]
    TimestampNotUtc { value: String },
}

/// Failure of an upstream fetch, as surfaced to callers of the query facade.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FetchError {
    #[error("network error: {message}")]
    Network { message: String, retryable: bool },
    #[error("upstream returned status {status}")]
    Upstream { status: u16 },
    #[error("upstream rate limit exceeded (status 429)")]
    RateLimitExceeded,
    #[error("malformed upstream response: {message}")]
    MalformedResponse { message: String },
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl FetchError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            retryable: true,
        }
    }

    pub fn from_status(status: u16) -> Self {
        if status == 429 {
            Self::RateLimitExceeded
        } else {
            Self::Upstream { status }
        }
    }

    pub const fn code(&self) -> &'static str {
        match self {
            Self::Network { .. } => "fetch.network",
            Self::Upstream { .. } => "fetch.upstream",
            Self::RateLimitExceeded => "fetch.rate_limited",
            Self::MalformedResponse { .. } => "fetch.malformed_response",
            Self::Internal { .. } => "fetch.internal",
        }
    }

    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Upstream { status } => Some(*status),
            Self::RateLimitExceeded => Some(429),
            _ => None,
        }
    }
}

/// Top-level error type for core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
