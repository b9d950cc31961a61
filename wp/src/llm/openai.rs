//! OpenAI API client implementation
//!
//! Implements the LlmClient trait for the Chat Completions API, either on
//! api.openai.com or on an Azure OpenAI deployment.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use super::{CompletionRequest, CompletionResponse, LlmClient, LlmError, ResponseFormat, StopReason, TokenUsage};
use crate::config::LlmConfig;

/// Initial backoff delay for retries
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Longest we are willing to honor a `retry-after` header
const MAX_RETRY_AFTER_SECS: u64 = 60;

/// Check if an HTTP status code is retryable
fn is_retryable_status(status: u16) -> bool {
    matches!(status, 408 | 429 | 500 | 502 | 503 | 504)
}

/// Where requests go and how they authenticate
#[derive(Debug, Clone, PartialEq, Eq)]
enum Endpoint {
    OpenAi,
    Azure { deployment: String, api_version: String },
}

/// OpenAI API client
pub struct OpenAIClient {
    model: String,
    api_key: String,
    base_url: String,
    endpoint: Endpoint,
    http: Client,
    max_tokens: u32,
    max_retries: u32,
    temperature: f32,
    timeout: Duration,
}

impl OpenAIClient {
    /// Create a new client from configuration
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        debug!(provider = %config.provider, model = %config.model, "OpenAIClient::from_config: called");
        let api_key = config.get_api_key().map_err(|e| LlmError::Config(e.to_string()))?;

        let endpoint = match config.provider.as_str() {
            "openai" => Endpoint::OpenAi,
            "azure" => {
                let deployment = config
                    .deployment
                    .clone()
                    .ok_or_else(|| LlmError::Config("azure provider requires a deployment name".to_string()))?;
                Endpoint::Azure {
                    deployment,
                    api_version: config.api_version.clone(),
                }
            }
            other => {
                return Err(LlmError::Config(format!(
                    "Unknown LLM provider: '{}'. Supported: openai, azure",
                    other
                )));
            }
        };

        let timeout = Duration::from_millis(config.timeout_ms);
        let http = Client::builder().timeout(timeout).build().map_err(LlmError::Network)?;

        Ok(Self {
            model: config.model.clone(),
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            endpoint,
            http,
            max_tokens: config.max_tokens,
            max_retries: config.max_retries,
            temperature: config.temperature,
            timeout,
        })
    }

    fn url(&self) -> String {
        match &self.endpoint {
            Endpoint::OpenAi => format!("{}/v1/chat/completions", self.base_url),
            Endpoint::Azure {
                deployment,
                api_version,
            } => format!(
                "{}/openai/deployments/{}/chat/completions?api-version={}",
                self.base_url, deployment, api_version
            ),
        }
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.endpoint {
            Endpoint::OpenAi => builder.header("Authorization", format!("Bearer {}", self.api_key)),
            Endpoint::Azure { .. } => builder.header("api-key", &self.api_key),
        }
    }

    /// Build the request body for the Chat Completions API
    fn build_request_body(&self, request: &CompletionRequest) -> serde_json::Value {
        debug!(%self.model, %request.max_tokens, format = ?request.format, "build_request_body: called");

        let mut messages = vec![serde_json::json!({
            "role": "system",
            "content": request.system_prompt,
        })];

        messages.extend(request.messages.iter().map(|m| {
            serde_json::json!({
                "role": m.role.as_str(),
                "content": m.content,
            })
        }));

        let max_tokens = request.max_tokens.min(self.max_tokens);

        let mut body = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "max_tokens": max_tokens,
            "temperature": request.temperature.unwrap_or(self.temperature),
        });

        if request.format == ResponseFormat::JsonObject {
            debug!("build_request_body: json_object response format");
            body["response_format"] = serde_json::json!({ "type": "json_object" });
        }

        body
    }

    /// Parse the API response
    fn parse_response(&self, api_response: OpenAIResponse) -> CompletionResponse {
        debug!(choices = api_response.choices.len(), "parse_response: called");
        let choice = api_response.choices.into_iter().next();

        let (content, stop_reason) = match choice {
            Some(c) => (c.message.content, StopReason::from_openai(c.finish_reason.as_deref())),
            None => (None, StopReason::EndTurn),
        };

        let usage = api_response
            .usage
            .map(|u| TokenUsage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            })
            .unwrap_or_default();

        CompletionResponse {
            content,
            stop_reason,
            usage,
        }
    }
}

#[async_trait]
impl LlmClient for OpenAIClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        debug!(%self.model, %request.max_tokens, "complete: called");
        let url = self.url();
        let body = self.build_request_body(&request);

        let mut last_error = None;
        let mut delay_override: Option<Duration> = None;
        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let backoff = delay_override
                    .take()
                    .unwrap_or_else(|| Duration::from_millis(INITIAL_BACKOFF_MS * 2u64.pow(attempt - 1)));
                warn!(
                    attempt,
                    backoff_ms = backoff.as_millis() as u64,
                    "complete: retrying after transient error"
                );
                tokio::time::sleep(backoff).await;
            }

            let response = match self
                .authorize(self.http.post(url.clone()))
                .header("content-type", "application/json")
                .json(&body)
                .send()
                .await
            {
                Ok(r) => r,
                Err(e) => {
                    debug!(attempt, error = %e, "complete: network error");
                    last_error = Some(if e.is_timeout() {
                        LlmError::Timeout(self.timeout)
                    } else {
                        LlmError::Network(e)
                    });
                    continue;
                }
            };

            let status = response.status().as_u16();

            if status == 429 {
                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(MAX_RETRY_AFTER_SECS)
                    .min(MAX_RETRY_AFTER_SECS);
                debug!(attempt, retry_after, "complete: rate limited (429)");
                let err = LlmError::RateLimited {
                    retry_after: Duration::from_secs(retry_after),
                };
                if attempt < self.max_retries {
                    delay_override = err.retry_after();
                    last_error = Some(err);
                    continue;
                }
                return Err(err);
            }

            if is_retryable_status(status) && attempt < self.max_retries {
                let text = response.text().await.unwrap_or_default();
                debug!(attempt, status, "complete: retryable error");
                last_error = Some(LlmError::ApiError { status, message: text });
                continue;
            }

            if !response.status().is_success() {
                debug!(%status, "complete: API error");
                let text = response.text().await.unwrap_or_default();
                return Err(LlmError::ApiError { status, message: text });
            }

            debug!("complete: success");
            let api_response: OpenAIResponse = response.json().await?;
            return Ok(self.parse_response(api_response));
        }

        Err(last_error.unwrap_or_else(|| LlmError::InvalidResponse("Max retries exceeded".to_string())))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

// OpenAI API response types

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Message;

    fn client(endpoint: Endpoint, max_tokens: u32) -> OpenAIClient {
        OpenAIClient {
            model: "gpt-4o".to_string(),
            api_key: "test-key".to_string(),
            base_url: "https://api.openai.com".to_string(),
            endpoint,
            http: Client::new(),
            max_tokens,
            max_retries: 0,
            temperature: 0.5,
            timeout: Duration::from_secs(300),
        }
    }

    #[test]
    fn test_build_request_body_basic() {
        let client = client(Endpoint::OpenAi, 8192);
        let request = CompletionRequest::text("You are helpful", vec![Message::user("Hello")], 1000);

        let body = client.build_request_body(&request);

        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["max_tokens"], 1000);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], "You are helpful");
        assert_eq!(body["messages"][1]["role"], "user");
        assert!(body.get("response_format").is_none());
        assert!((body["temperature"].as_f64().unwrap() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_build_request_body_json_mode() {
        let client = client(Endpoint::OpenAi, 8192);
        let request = CompletionRequest::json("Reply in JSON", vec![Message::user("Hi")], 500).with_temperature(0.8);

        let body = client.build_request_body(&request);
        assert_eq!(body["response_format"]["type"], "json_object");
        assert!((body["temperature"].as_f64().unwrap() - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_max_tokens_capped() {
        let client = client(Endpoint::OpenAi, 1000);
        let request = CompletionRequest::text("Test", vec![], 5000);

        let body = client.build_request_body(&request);
        assert_eq!(body["max_tokens"], 1000);
    }

    #[test]
    fn test_azure_url() {
        let client = client(
            Endpoint::Azure {
                deployment: "gpt-4o".to_string(),
                api_version: "2024-08-01-preview".to_string(),
            },
            1000,
        );
        assert_eq!(
            client.url(),
            "https://api.openai.com/openai/deployments/gpt-4o/chat/completions?api-version=2024-08-01-preview"
        );
        assert_eq!(
            self::client(Endpoint::OpenAi, 1000).url(),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn test_parse_response_without_usage() {
        let client = client(Endpoint::OpenAi, 1000);
        let api: OpenAIResponse = serde_json::from_value(serde_json::json!({
            "choices": [{"message": {"content": "{\"content\": \"hi\"}"}, "finish_reason": "stop"}]
        }))
        .unwrap();

        let resp = client.parse_response(api);
        assert_eq!(resp.content.as_deref(), Some("{\"content\": \"hi\"}"));
        assert_eq!(resp.stop_reason, StopReason::EndTurn);
        assert_eq!(resp.usage.input_tokens, 0);
    }
}
