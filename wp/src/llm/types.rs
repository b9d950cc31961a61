//! LLM request/response types
//!
//! These model the OpenAI Chat Completions API closely enough for both the
//! public endpoint and Azure deployments.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// How the model should shape its answer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResponseFormat {
    /// Free-form text completion
    #[default]
    Text,
    /// Schema-constrained completion that must parse as a single JSON object
    JsonObject,
}

/// A completion request - everything needed for one LLM call
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// System prompt (rendered from a Handlebars template)
    pub system_prompt: String,

    /// Conversation so far, oldest first
    pub messages: Vec<Message>,

    /// Max tokens for response (capped by config)
    pub max_tokens: u32,

    /// Sampling temperature; `None` uses the client default
    pub temperature: Option<f32>,

    /// Text or JSON-object mode
    pub format: ResponseFormat,
}

impl CompletionRequest {
    /// Create a free-text request
    pub fn text(system_prompt: impl Into<String>, messages: Vec<Message>, max_tokens: u32) -> Self {
        debug!(message_count = %messages.len(), "CompletionRequest::text: called");
        Self {
            system_prompt: system_prompt.into(),
            messages,
            max_tokens,
            temperature: None,
            format: ResponseFormat::Text,
        }
    }

    /// Create a JSON-object request
    pub fn json(system_prompt: impl Into<String>, messages: Vec<Message>, max_tokens: u32) -> Self {
        debug!(message_count = %messages.len(), "CompletionRequest::json: called");
        Self {
            system_prompt: system_prompt.into(),
            messages,
            max_tokens,
            temperature: None,
            format: ResponseFormat::JsonObject,
        }
    }

    /// Override the sampling temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// A message in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    /// Create a user message
    pub fn user(text: impl Into<String>) -> Self {
        debug!("Message::user: called");
        Self {
            role: Role::User,
            content: text.into(),
        }
    }

    /// Create an assistant message
    pub fn assistant(text: impl Into<String>) -> Self {
        debug!("Message::assistant: called");
        Self {
            role: Role::Assistant,
            content: text.into(),
        }
    }
}

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// Response from a completion request
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// Text content (if any)
    pub content: Option<String>,

    /// Why the model stopped
    pub stop_reason: StopReason,

    /// Token usage for cost tracking
    pub usage: TokenUsage,
}

impl CompletionResponse {
    /// Build a plain end-of-turn response (mostly useful for mocks)
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            content: Some(text.into()),
            stop_reason: StopReason::EndTurn,
            usage: TokenUsage::default(),
        }
    }
}

/// Why the model stopped generating
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    EndTurn,
    MaxTokens,
    ContentFilter,
}

impl StopReason {
    /// Parse from an OpenAI `finish_reason` string
    pub fn from_openai(s: Option<&str>) -> Self {
        debug!(?s, "StopReason::from_openai: called");
        match s {
            Some("length") => {
                debug!("StopReason::from_openai: MaxTokens");
                StopReason::MaxTokens
            }
            Some("content_filter") => {
                debug!("StopReason::from_openai: ContentFilter");
                StopReason::ContentFilter
            }
            _ => {
                debug!("StopReason::from_openai: EndTurn");
                StopReason::EndTurn
            }
        }
    }
}

/// Token usage for cost tracking
#[derive(Debug, Clone, Default)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl TokenUsage {
    /// Calculate cost in USD based on model pricing
    pub fn cost_usd(&self, model: &str) -> f64 {
        debug!(%model, %self.input_tokens, %self.output_tokens, "TokenUsage::cost_usd: called");
        let (input_price, output_price) = match model {
            m if m.contains("gpt-4o-mini") => {
                debug!("TokenUsage::cost_usd: gpt-4o-mini pricing");
                (0.15, 0.60)
            }
            m if m.contains("gpt-4o") => {
                debug!("TokenUsage::cost_usd: gpt-4o pricing");
                (2.50, 10.0)
            }
            _ => {
                debug!("TokenUsage::cost_usd: unknown model, defaulting to gpt-4o pricing");
                (2.50, 10.0)
            }
        };

        let input_cost = (self.input_tokens as f64 / 1_000_000.0) * input_price;
        let output_cost = (self.output_tokens as f64 / 1_000_000.0) * output_price;

        input_cost + output_cost
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_user() {
        let msg = Message::user("Hello");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "Hello");
    }

    #[test]
    fn test_message_assistant() {
        let msg = Message::assistant("Hi there");
        assert_eq!(msg.role, Role::Assistant);
        assert_eq!(msg.content, "Hi there");
    }

    #[test]
    fn test_request_constructors() {
        let req = CompletionRequest::json("sys", vec![Message::user("hi")], 512).with_temperature(0.8);
        assert_eq!(req.format, ResponseFormat::JsonObject);
        assert_eq!(req.temperature, Some(0.8));

        let req = CompletionRequest::text("sys", vec![], 512);
        assert_eq!(req.format, ResponseFormat::Text);
        assert!(req.temperature.is_none());
    }

    #[test]
    fn test_token_usage_cost_gpt4o() {
        let usage = TokenUsage {
            input_tokens: 1_000_000,
            output_tokens: 100_000,
        };

        // $2.50 (input) + $1.00 (output)
        let cost = usage.cost_usd("gpt-4o");
        assert!((cost - 3.5).abs() < 0.01);
    }

    #[test]
    fn test_token_usage_cost_mini() {
        let usage = TokenUsage {
            input_tokens: 1_000_000,
            output_tokens: 1_000_000,
        };

        let cost = usage.cost_usd("gpt-4o-mini");
        assert!((cost - 0.75).abs() < 0.01);
    }

    #[test]
    fn test_stop_reason_from_openai() {
        assert_eq!(StopReason::from_openai(Some("stop")), StopReason::EndTurn);
        assert_eq!(StopReason::from_openai(Some("length")), StopReason::MaxTokens);
        assert_eq!(StopReason::from_openai(Some("content_filter")), StopReason::ContentFilter);
        assert_eq!(StopReason::from_openai(None), StopReason::EndTurn);
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&Role::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");
    }
}
