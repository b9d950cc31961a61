//! Peloton HTTP client
//!
//! Talks to the same web API the members site uses. Authentication yields a
//! session id that is sent back as the `peloton_session_id` cookie.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info};

use super::types::{CategoriesResponse, DataEnvelope, LoginResponse, RawProfile, RawWorkout};
use super::{AuthSession, BrowseCategory, ClassPage, Credentials, FitnessProvider, ProviderError};
use crate::config::ProviderConfig;
use crate::domain::{ActivityType, HistoryEntry, Profile};

const PLATFORM_HEADER: &str = "peloton-platform";
const PLATFORM: &str = "web";
const SESSION_COOKIE: &str = "peloton_session_id";

pub struct PelotonClient {
    base_url: String,
    http: Client,
}

impl PelotonClient {
    pub fn from_config(config: &ProviderConfig) -> Result<Self, ProviderError> {
        debug!(base_url = %config.base_url, "PelotonClient::from_config: called");
        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| ProviderError::Config(e.to_string()))?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    fn get(&self, path: &str, session: &AuthSession) -> RequestBuilder {
        self.http
            .get(format!("{}{}", self.base_url, path))
            .header(PLATFORM_HEADER, PLATFORM)
            .header("Cookie", format!("{}={}", SESSION_COOKIE, session.session_id))
    }

    async fn fetch<T: DeserializeOwned>(&self, resource: &str, request: RequestBuilder) -> Result<T, ProviderError> {
        debug!(%resource, "PelotonClient::fetch: called");
        let response = request.send().await.map_err(|e| ProviderError::fetch(resource, e))?;
        let response = check_status(resource, response).await?;
        response.json::<T>().await.map_err(|e| ProviderError::fetch(resource, e))
    }
}

async fn check_status(resource: &str, response: Response) -> Result<Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    debug!(%resource, %status, "check_status: request failed");
    Err(ProviderError::fetch(resource, format!("HTTP {}: {}", status.as_u16(), body)))
}

#[async_trait]
impl FitnessProvider for PelotonClient {
    async fn authenticate(&self, credentials: &Credentials) -> Result<AuthSession, ProviderError> {
        debug!(username = %credentials.username, "PelotonClient::authenticate: called");
        let response = self
            .http
            .post(format!("{}/auth/login", self.base_url))
            .header(PLATFORM_HEADER, PLATFORM)
            .json(&serde_json::json!({
                "username_or_email": credentials.username,
                "password": credentials.password,
            }))
            .send()
            .await
            .map_err(|e| ProviderError::Auth(e.to_string()))?;

        let status = response.status();
        if status.as_u16() != 200 {
            debug!(%status, "PelotonClient::authenticate: login rejected");
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Auth(format!("HTTP {}: {}", status.as_u16(), body)));
        }

        let login: LoginResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Auth(format!("unexpected login response: {}", e)))?;
        info!(user_id = %login.user_id, "Authenticated with Peloton");
        Ok(AuthSession {
            user_id: login.user_id,
            session_id: login.session_id,
        })
    }

    async fn list_classes(
        &self,
        session: &AuthSession,
        category: ActivityType,
        limit: u32,
    ) -> Result<ClassPage, ProviderError> {
        let browse_category = category.provider_category();
        debug!(%browse_category, limit, "PelotonClient::list_classes: called");
        let request = self.get("/api/v2/ride/archived", session).query(&[
            ("limit", limit.to_string()),
            ("browse_category", browse_category.to_string()),
            ("content_format", "audio,video".to_string()),
            ("sort_by", "original_air_time".to_string()),
            ("page", "0".to_string()),
        ]);
        let page: ClassPage = self.fetch(&format!("classes ({})", category), request).await?;
        debug!(
            classes = page.classes.len(),
            instructors = page.instructors.len(),
            "PelotonClient::list_classes: fetched"
        );
        Ok(page)
    }

    async fn get_history(&self, session: &AuthSession, limit: u32) -> Result<Vec<HistoryEntry>, ProviderError> {
        debug!(limit, "PelotonClient::get_history: called");
        let request = self
            .get(&format!("/api/user/{}/workouts", session.user_id), session)
            .query(&[("limit", limit)]);
        let envelope: DataEnvelope<RawWorkout> = self.fetch("workout history", request).await?;
        Ok(envelope.data.into_iter().map(HistoryEntry::from).collect())
    }

    async fn get_profile(&self, session: &AuthSession) -> Result<Profile, ProviderError> {
        debug!("PelotonClient::get_profile: called");
        let raw: RawProfile = self.fetch("profile", self.get("/api/me", session)).await?;
        Ok(raw.into())
    }

    async fn list_categories(&self, session: &AuthSession) -> Result<Vec<BrowseCategory>, ProviderError> {
        debug!("PelotonClient::list_categories: called");
        let request = self
            .get("/api/browse_categories", session)
            .query(&[("library_type", "on_demand")]);
        let response: CategoriesResponse = self.fetch("browse categories", request).await?;
        Ok(response.browse_categories)
    }
}
