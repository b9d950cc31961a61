//! LlmClient trait definition

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::{CompletionRequest, CompletionResponse, LlmError, ResponseFormat, StopReason};

/// Stateless LLM client - each call is independent
///
/// Conversation state lives in the caller's session and is replayed in full
/// on every request. Retries for transient failures are configured when the
/// client is constructed; callers never loop on their own.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send a single completion request (blocking until complete)
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;

    /// Model identifier, used for logging and cost estimates
    fn model_name(&self) -> &str;

    /// Send a JSON-object request and parse the answer
    ///
    /// Fails with `LlmError::MalformedJson` (carrying the raw text) when the
    /// answer is empty or is not a single JSON object. An answer cut off at
    /// the token limit is `Truncated` rather than a parse failure.
    async fn complete_json(&self, mut request: CompletionRequest) -> Result<Map<String, Value>, LlmError> {
        debug!(model = %self.model_name(), "LlmClient::complete_json: called");
        request.format = ResponseFormat::JsonObject;
        let response = self.complete(request).await?;
        debug!(
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            cost_usd = response.usage.cost_usd(self.model_name()),
            "LlmClient::complete_json: response received"
        );
        let raw = response.content.unwrap_or_default();
        match response.stop_reason {
            StopReason::EndTurn => parse_json_object(raw),
            StopReason::MaxTokens => {
                warn!(model = %self.model_name(), raw_len = raw.len(), "JSON completion hit the token limit");
                Err(LlmError::Truncated { raw })
            }
            StopReason::ContentFilter => {
                warn!(model = %self.model_name(), "JSON completion blocked by the content filter");
                Err(LlmError::ContentFiltered { raw })
            }
        }
    }
}

/// Parse model output as a JSON object, keeping the raw text on failure
pub fn parse_json_object(raw: String) -> Result<Map<String, Value>, LlmError> {
    debug!(raw_len = raw.len(), "parse_json_object: called");
    if raw.trim().is_empty() {
        debug!("parse_json_object: empty content");
        return Err(LlmError::MalformedJson {
            message: "model returned no content".to_string(),
            raw,
        });
    }

    match serde_json::from_str::<Value>(&raw) {
        Ok(Value::Object(map)) => {
            debug!(keys = map.len(), "parse_json_object: parsed object");
            Ok(map)
        }
        Ok(other) => {
            debug!("parse_json_object: valid JSON but not an object");
            Err(LlmError::MalformedJson {
                message: format!("expected a JSON object, got {}", json_kind(&other)),
                raw,
            })
        }
        Err(e) => {
            debug!(error = %e, "parse_json_object: invalid JSON");
            Err(LlmError::MalformedJson {
                message: e.to_string(),
                raw,
            })
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json_object_ok() {
        let map = parse_json_object(r#"{"done": true}"#.to_string()).unwrap();
        assert_eq!(map["done"], true);
    }

    #[test]
    fn test_parse_json_object_rejects_prose() {
        let err = parse_json_object("What are your goals?".to_string()).unwrap_err();
        assert_eq!(err.raw_payload(), Some("What are your goals?"));
    }

    #[test]
    fn test_parse_json_object_rejects_array() {
        let err = parse_json_object("[1, 2]".to_string()).unwrap_err();
        assert!(err.to_string().contains("an array"));
    }

    #[test]
    fn test_parse_json_object_rejects_empty() {
        assert!(matches!(
            parse_json_object("   ".to_string()),
            Err(LlmError::MalformedJson { .. })
        ));
    }
}
