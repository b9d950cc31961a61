//! Fitness data provider
//!
//! The planner only needs three queries (classes by category, workout
//! history, profile) plus authentication. `FitnessProvider` captures exactly
//! that so a mock or a different platform can stand in for Peloton.

use async_trait::async_trait;
use tracing::debug;

mod error;
mod peloton;
mod types;

pub use error::ProviderError;
pub use peloton::PelotonClient;
pub use types::{AuthSession, BrowseCategory, ClassPage, Credentials, RawClass, RawInstructor};

use crate::config::ProviderConfig;
use crate::domain::{ActivityType, HistoryEntry, Profile};

#[async_trait]
pub trait FitnessProvider: Send + Sync {
    /// Log in; failures are final
    async fn authenticate(&self, credentials: &Credentials) -> Result<AuthSession, ProviderError>;

    /// Most recent classes in a category, with the instructors they reference
    async fn list_classes(
        &self,
        session: &AuthSession,
        category: ActivityType,
        limit: u32,
    ) -> Result<ClassPage, ProviderError>;

    /// The user's most recent workouts, newest first
    async fn get_history(&self, session: &AuthSession, limit: u32) -> Result<Vec<HistoryEntry>, ProviderError>;

    async fn get_profile(&self, session: &AuthSession) -> Result<Profile, ProviderError>;

    /// On-demand browse categories
    async fn list_categories(&self, session: &AuthSession) -> Result<Vec<BrowseCategory>, ProviderError>;
}

/// Read fallback credentials from the configured environment variables
pub fn credentials_from_env(config: &ProviderConfig) -> Result<Credentials, ProviderError> {
    debug!(username_env = %config.username_env, "credentials_from_env: called");
    let username = std::env::var(&config.username_env)
        .map_err(|_| ProviderError::MissingCredentials(config.username_env.clone()))?;
    let password = std::env::var(&config.password_env)
        .map_err(|_| ProviderError::MissingCredentials(config.password_env.clone()))?;
    Ok(Credentials::new(username, password))
}

/// Use the supplied credentials, falling back to the environment
pub fn resolve_credentials(
    supplied: Option<Credentials>,
    config: &ProviderConfig,
) -> Result<Credentials, ProviderError> {
    match supplied {
        Some(creds) => {
            debug!("resolve_credentials: using supplied credentials");
            Ok(creds)
        }
        None => {
            debug!("resolve_credentials: falling back to environment");
            credentials_from_env(config)
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn config() -> ProviderConfig {
        ProviderConfig {
            username_env: "WP_TEST_PROVIDER_USER".to_string(),
            password_env: "WP_TEST_PROVIDER_PASS".to_string(),
            ..Default::default()
        }
    }

    #[test]
    #[serial]
    fn test_supplied_credentials_win() {
        let creds = resolve_credentials(Some(Credentials::new("a", "b")), &config()).unwrap();
        assert_eq!(creds.username, "a");
    }

    #[test]
    #[serial]
    fn test_env_fallback() {
        // SAFETY: serialized with the other env-mutating tests
        unsafe {
            std::env::set_var("WP_TEST_PROVIDER_USER", "env-user");
            std::env::set_var("WP_TEST_PROVIDER_PASS", "env-pass");
        }
        let creds = resolve_credentials(None, &config()).unwrap();
        assert_eq!(creds, Credentials::new("env-user", "env-pass"));
        unsafe {
            std::env::remove_var("WP_TEST_PROVIDER_USER");
            std::env::remove_var("WP_TEST_PROVIDER_PASS");
        }
    }

    #[test]
    #[serial]
    fn test_missing_env_credentials() {
        unsafe {
            std::env::remove_var("WP_TEST_PROVIDER_USER");
        }
        let err = resolve_credentials(None, &config()).unwrap_err();
        assert!(matches!(err, ProviderError::MissingCredentials(var) if var == "WP_TEST_PROVIDER_USER"));
    }
}
