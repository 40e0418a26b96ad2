// src/error.rs
use serde::Serialize;
use thiserror::Error;

/// Everything that can go wrong between us and a data provider.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    /// Network failure, timeout, non-2xx status or an unreadable body.
    #[error("{provider} unavailable: {message}")]
    ProviderUnavailable {
        provider: &'static str,
        message: String,
    },

    #[error("unknown symbol: {0}")]
    UnknownSymbol(String),

    #[error("{ticker} has no `{field}` field")]
    MissingField { ticker: String, field: String },

    #[error("series {0} returned no observations")]
    EmptySeries(String),
}

impl FetchError {
    pub fn unavailable(provider: &'static str, message: impl Into<String>) -> Self {
        FetchError::ProviderUnavailable {
            provider,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> FetchErrorKind {
        match self {
            FetchError::ProviderUnavailable { .. } => FetchErrorKind::ProviderUnavailable,
            FetchError::UnknownSymbol(_) => FetchErrorKind::UnknownSymbol,
            FetchError::MissingField { .. } => FetchErrorKind::MissingField,
            FetchError::EmptySeries(_) => FetchErrorKind::EmptySeries,
        }
    }
}

/// Tag sent to the front end alongside a warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchErrorKind {
    ProviderUnavailable,
    UnknownSymbol,
    MissingField,
    EmptySeries,
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        // The URL carries the FRED key, never let it reach a log line.
        FetchError::unavailable("http", err.without_url().to_string())
    }
}
