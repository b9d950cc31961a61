//! Conversation extractor
//!
//! Drives the intake dialogue one turn at a time. Each turn replays the full
//! session history to the model in JSON mode and reads back the next question
//! plus, once the model believes it has everything, the collected fields.
//!
//! Completion is signalled by the model's `done` flag and then verified here.
//! When the flag is absent the presence of `user_goals` is taken as the
//! signal instead.

use std::sync::Arc;

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::{PreferenceError, PreferenceRecord, SELECTABLE_ACTIVITIES, Session};
use crate::llm::{CompletionRequest, LlmClient, LlmError, Message};
use crate::prompts::{IntakeContext, PromptLoader};

/// Token budget for a single intake reply
const INTAKE_MAX_TOKENS: u32 = 1024;

/// Acknowledgement used when a finished reply carries no `content`
const DEFAULT_ACK: &str = "Thanks! I have everything I need to build your plan.";

/// What one intake turn produced
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractorResult {
    /// Keep talking; the text is the assistant's next question
    NeedsMoreInfo(String),
    /// Intake is finished
    Collected(PreferenceRecord),
}

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Model call failed: {0}")]
    Model(#[from] LlmError),

    #[error("Model reply has no 'content' field")]
    MissingContent { raw: String },

    #[error("Model collected invalid preferences: {source}")]
    InvalidRecord {
        #[source]
        source: PreferenceError,
        raw: String,
    },

    #[error("Failed to render intake prompt: {0}")]
    Prompt(String),
}

impl ExtractionError {
    /// The model output that caused the failure, if any
    pub fn raw_payload(&self) -> Option<&str> {
        match self {
            Self::Model(e) => e.raw_payload(),
            Self::MissingContent { raw } | Self::InvalidRecord { raw, .. } => Some(raw),
            Self::Prompt(_) => None,
        }
    }
}

pub struct ConversationExtractor {
    llm: Arc<dyn LlmClient>,
    prompts: Arc<PromptLoader>,
    default_weeks: u32,
    temperature: f32,
}

impl ConversationExtractor {
    pub fn new(llm: Arc<dyn LlmClient>, prompts: Arc<PromptLoader>, default_weeks: u32, temperature: f32) -> Self {
        debug!(default_weeks, temperature, "ConversationExtractor::new: called");
        Self {
            llm,
            prompts,
            default_weeks,
            temperature,
        }
    }

    /// Process one user message
    ///
    /// On success the user message and the assistant reply are appended to
    /// the session. On failure the session is left untouched.
    pub async fn advance(&self, session: &mut Session, user_message: &str) -> Result<ExtractorResult, ExtractionError> {
        debug!(session_id = %session.id, turns = session.turns.len(), "ConversationExtractor::advance: called");

        let system_prompt = self
            .prompts
            .render_intake(&IntakeContext {
                activities: vocabulary(),
                default_weeks: self.default_weeks,
            })
            .map_err(|e| ExtractionError::Prompt(e.to_string()))?;

        let mut messages = session.turns.clone();
        messages.push(Message::user(user_message));

        let request =
            CompletionRequest::json(system_prompt, messages, INTAKE_MAX_TOKENS).with_temperature(self.temperature);
        let reply = self.llm.complete_json(request).await?;

        let (assistant_text, result) = interpret(reply)?;

        session.push_exchange(user_message, assistant_text);
        if let ExtractorResult::Collected(record) = &result {
            info!(session_id = %session.id, activities = record.preferred_activity_types.len(), "Preferences collected");
            session.collected = record.clone();
            session.complete = true;
        }
        Ok(result)
    }
}

fn vocabulary() -> String {
    SELECTABLE_ACTIVITIES
        .iter()
        .map(|a| a.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Decide what a parsed intake reply means
///
/// Returns the text to record as the assistant turn alongside the result.
fn interpret(reply: Map<String, Value>) -> Result<(String, ExtractorResult), ExtractionError> {
    let raw = Value::Object(reply.clone()).to_string();
    let content = reply
        .get("content")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    let finished = match reply.get("done").and_then(Value::as_bool) {
        Some(done) => {
            debug!(done, "interpret: explicit done flag");
            done
        }
        None => {
            let structural = reply.contains_key("user_goals");
            debug!(structural, "interpret: no done flag, using structural fallback");
            structural
        }
    };

    if !finished {
        let question = content.ok_or(ExtractionError::MissingContent { raw })?;
        return Ok((question.clone(), ExtractorResult::NeedsMoreInfo(question)));
    }

    let record = record_from_reply(&reply).map_err(|source| ExtractionError::InvalidRecord {
        source,
        raw: raw.clone(),
    })?;

    match record.validate() {
        Ok(()) => {
            let ack = content.unwrap_or_else(|| DEFAULT_ACK.to_string());
            Ok((ack, ExtractorResult::Collected(record)))
        }
        Err(PreferenceError::UnknownActivity(e)) => Err(ExtractionError::InvalidRecord {
            source: e.into(),
            raw,
        }),
        Err(missing) => {
            warn!(reason = %missing, "Model signalled completion but preferences are incomplete");
            let question = follow_up_question(&missing).to_string();
            Ok((question.clone(), ExtractorResult::NeedsMoreInfo(question)))
        }
    }
}

fn record_from_reply(reply: &Map<String, Value>) -> Result<PreferenceRecord, PreferenceError> {
    let text = |key: &str| {
        reply
            .get(key)
            .and_then(Value::as_str)
            .map(|s| s.trim().to_string())
            .unwrap_or_default()
    };

    let activities = string_list(reply.get("suggested_activities"));
    let preferred_activity_types = PreferenceRecord::parse_activities(activities)?;

    let plan_duration_weeks = reply
        .get("plan_duration_weeks")
        .and_then(Value::as_u64)
        .and_then(|w| u32::try_from(w).ok());

    Ok(PreferenceRecord {
        fitness_goals: text("user_goals"),
        equipment: string_list(reply.get("equipment")).into_iter().collect(),
        preferred_activity_types,
        weekly_time_commitment: text("weekly_time_commitment"),
        plan_duration_weeks,
    })
}

/// Accept a JSON array of strings or a single comma separated string
fn string_list(value: Option<&Value>) -> Vec<String> {
    let items: Vec<String> = match value {
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).map(str::to_string).collect(),
        Some(Value::String(s)) => s.split(',').map(str::to_string).collect(),
        _ => Vec::new(),
    };
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn follow_up_question(missing: &PreferenceError) -> &'static str {
    match missing {
        PreferenceError::MissingGoals => "Before I build your plan, what are your main fitness goals?",
        PreferenceError::MissingTimeCommitment => "How much time can you set aside for workouts each week?",
        PreferenceError::NoActivities => {
            "Which kinds of workouts do you enjoy: cycling, strength, running, yoga or rowing?"
        }
        PreferenceError::ZeroDuration => "How many weeks would you like the plan to cover?",
        PreferenceError::UnknownActivity(_) => {
            "Which of these workouts would you like: cycling, strength, running, yoga or rowing?"
        }
    }
}
