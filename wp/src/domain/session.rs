//! Conversation session state

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::plan::WorkoutPlan;
use super::preferences::PreferenceRecord;
use crate::llm::Message;

/// Generate a new session id (UUIDv7, time ordered)
pub fn generate_session_id() -> String {
    uuid::Uuid::now_v7().to_string()
}

/// One conversation thread
///
/// Owns its turn history and the preferences collected so far. A session is
/// created on first use and only ever cleared by a reset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,

    /// Alternating user/assistant turns, oldest first
    #[serde(default)]
    pub turns: Vec<Message>,

    #[serde(default)]
    pub collected: PreferenceRecord,

    #[serde(default)]
    pub complete: bool,

    /// Last plan synthesized in this session
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<WorkoutPlan>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        debug!(%id, "Session::new: called");
        let now = Utc::now();
        Self {
            id,
            turns: Vec::new(),
            collected: PreferenceRecord::default(),
            complete: false,
            plan: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Record a user message and the assistant's answer to it
    pub fn push_exchange(&mut self, user: impl Into<String>, assistant: impl Into<String>) {
        self.turns.push(Message::user(user));
        self.turns.push(Message::assistant(assistant));
        self.touch();
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Role;

    #[test]
    fn test_new_session_is_empty() {
        let session = Session::new("s1");
        assert!(session.is_empty());
        assert!(!session.complete);
        assert!(session.plan.is_none());
        assert_eq!(session.created_at, session.updated_at);
    }

    #[test]
    fn test_push_exchange_appends_in_order() {
        let mut session = Session::new("s1");
        session.push_exchange("hi", "what are your goals?");

        assert_eq!(session.turns.len(), 2);
        assert_eq!(session.turns[0].role, Role::User);
        assert_eq!(session.turns[1].role, Role::Assistant);
        assert!(session.updated_at >= session.created_at);
    }

    #[test]
    fn test_generated_ids_are_unique() {
        assert_ne!(generate_session_id(), generate_session_id());
    }

    #[test]
    fn test_session_survives_json() {
        let mut session = Session::new("s1");
        session.push_exchange("hi", "hello");
        let json = serde_json::to_string(&session).unwrap();
        let back: Session = serde_json::from_str(&json).unwrap();
        assert_eq!(back, session);
    }
}
