//! LLM error types

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during LLM operations
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Structured mode was requested but the model did not return a JSON object
    #[error("Malformed JSON response: {message}")]
    MalformedJson { message: String, raw: String },

    /// The model hit its token limit, so any JSON is incomplete
    #[error("Response truncated at the token limit")]
    Truncated { raw: String },

    #[error("Response blocked by the content filter")]
    ContentFiltered { raw: String },

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl LlmError {
    /// Get the retry duration if this is a rate limit error
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            LlmError::RateLimited { retry_after } => Some(*retry_after),
            _ => None,
        }
    }

    /// Raw model output attached to the error, if any
    pub fn raw_payload(&self) -> Option<&str> {
        match self {
            LlmError::MalformedJson { raw, .. } | LlmError::Truncated { raw } | LlmError::ContentFiltered { raw } => {
                Some(raw)
            }
            _ => None,
        }
    }
}
