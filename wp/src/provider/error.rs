//! Fitness provider error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    /// Login rejected or unreachable; never retried
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Failed to fetch {resource}: {message}")]
    Fetch { resource: String, message: String },

    #[error("No credentials supplied and {0} is not set")]
    MissingCredentials(String),

    #[error("Provider configuration error: {0}")]
    Config(String),
}

impl ProviderError {
    pub fn fetch(resource: impl Into<String>, message: impl ToString) -> Self {
        Self::Fetch {
            resource: resource.into(),
            message: message.to_string(),
        }
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_) | Self::MissingCredentials(_))
    }
}
