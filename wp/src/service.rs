//! Caller-facing planner service
//!
//! `WorkoutPlanner` is what a front end drives, one user message at a time.
//! A turn either produces the next intake question or, once preferences are
//! complete, a rendered plan. A failed turn leaves the stored session exactly
//! as it was.

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::domain::Session;
use crate::extractor::{ConversationExtractor, ExtractionError, ExtractorResult};
use crate::llm::{LlmClient, LlmError, Message, Role};
use crate::presenter;
use crate::prompts::PromptLoader;
use crate::provider::{Credentials, FitnessProvider, ProviderError};
use crate::store::{SessionStore, StoreError};
use crate::synthesizer::{PlanSynthesizer, SynthesisError};

/// Opening message shown before the first turn; not part of model history
pub const GREETING: &str = "Hi! I'm your Peloton workout planner. To build your plan I'll ask about:\n\
1. your fitness goals\n\
2. the equipment you have\n\
3. the workouts you enjoy (cycling, strength, running, yoga, rowing)\n\
4. how much time you can train each week\n\n\
Let's start: what are your main fitness goals?";

/// What a successful turn produced
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    Question(String),
    Plan { rendered: String, raw: Value },
}

#[derive(Debug, Error)]
pub enum TurnError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Synthesis(#[from] SynthesisError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl TurnError {
    /// One line suitable for showing to the user
    pub fn user_message(&self) -> String {
        match self {
            Self::Synthesis(SynthesisError::Provider(ProviderError::MissingCredentials(var))) => format!(
                "I need your Peloton login to build a plan. Pass --username/--password or set {}.",
                var
            ),
            Self::Synthesis(SynthesisError::Provider(e @ ProviderError::Auth(_))) => {
                format!("{}. Please check your Peloton username and password.", e)
            }
            Self::Synthesis(SynthesisError::Provider(e)) => {
                format!("I couldn't load your Peloton data ({}). Please try again.", e)
            }
            Self::Synthesis(SynthesisError::Preferences(e)) => {
                format!("I can't build a plan yet: {}.", e)
            }
            Self::Synthesis(SynthesisError::Model(LlmError::Truncated { .. })) => {
                "That plan was too long to write in one go. Try asking for fewer weeks.".to_string()
            }
            Self::Synthesis(_) => "I couldn't put your plan together this time. Please try again.".to_string(),
            Self::Extraction(_) => "Sorry, something went wrong on my side. Could you say that again?".to_string(),
            Self::Store(e) => format!("I couldn't save our conversation: {}", e),
        }
    }
}

pub struct WorkoutPlanner {
    store: Arc<dyn SessionStore>,
    extractor: ConversationExtractor,
    synthesizer: PlanSynthesizer,
}

impl WorkoutPlanner {
    pub fn new(store: Arc<dyn SessionStore>, extractor: ConversationExtractor, synthesizer: PlanSynthesizer) -> Self {
        Self {
            store,
            extractor,
            synthesizer,
        }
    }

    /// Wire the extractor and synthesizer from configuration
    pub fn from_config(
        config: &Config,
        llm: Arc<dyn LlmClient>,
        provider: Arc<dyn FitnessProvider>,
        store: Arc<dyn SessionStore>,
        prompts: Arc<PromptLoader>,
    ) -> Self {
        debug!("WorkoutPlanner::from_config: called");
        let extractor = ConversationExtractor::new(
            llm.clone(),
            prompts.clone(),
            config.planner.default_weeks,
            config.llm.intake_temperature,
        );
        let synthesizer = PlanSynthesizer::new(
            provider,
            llm,
            prompts,
            config.provider.clone(),
            config.planner.clone(),
            config.llm.temperature,
        );
        Self::new(store, extractor, synthesizer)
    }

    /// Process one user message for a session
    ///
    /// Credentials are used for this call only and never stored.
    pub async fn advance_conversation(
        &self,
        session_id: &str,
        user_text: &str,
        credentials: Option<Credentials>,
    ) -> Result<TurnOutcome, TurnError> {
        debug!(%session_id, "WorkoutPlanner::advance_conversation: called");
        let mut session = self.store.load_or_create(session_id).await?;

        match self.extractor.advance(&mut session, user_text).await? {
            ExtractorResult::NeedsMoreInfo(question) => {
                self.store.save(&session).await?;
                Ok(TurnOutcome::Question(question))
            }
            ExtractorResult::Collected(record) => {
                info!(%session_id, "Preferences complete, synthesizing plan");
                let plan = match self.synthesizer.synthesize(credentials, &record).await {
                    Ok(plan) => plan,
                    Err(e) => {
                        warn!(%session_id, error = %e, "Plan synthesis failed");
                        return Err(e.into());
                    }
                };

                let rendered = presenter::render(&plan);
                let raw = plan.to_value();
                replace_last_assistant_turn(&mut session, &rendered);
                session.plan = Some(plan);
                session.touch();
                self.store.save(&session).await?;

                Ok(TurnOutcome::Plan { rendered, raw })
            }
        }
    }

    /// Discard a session's turns and collected preferences
    pub async fn reset_session(&self, session_id: &str) -> Result<(), TurnError> {
        debug!(%session_id, "WorkoutPlanner::reset_session: called");
        self.store.reset(session_id).await?;
        Ok(())
    }

    pub async fn session(&self, session_id: &str) -> Result<Option<Session>, TurnError> {
        Ok(self.store.load(session_id).await?)
    }

    /// Whether a session can be resumed by a later process
    pub fn keeps_sessions(&self) -> bool {
        self.store.is_persistent()
    }

    pub fn synthesizer(&self) -> &PlanSynthesizer {
        &self.synthesizer
    }
}

/// The rendered plan stands in for the extractor's acknowledgement
fn replace_last_assistant_turn(session: &mut Session, text: &str) {
    match session.turns.last_mut() {
        Some(last) if last.role == Role::Assistant => last.content = text.to_string(),
        _ => session.turns.push(Message::assistant(text)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ActivityType;
    use crate::llm::client::mock::MockLlmClient;
    use crate::provider::mock::MockProvider;
    use crate::store::MemorySessionStore;

    const COLLECTED: &str = r#"{
        "content": "Great, building your plan!",
        "done": true,
        "user_goals": "build strength",
        "equipment": ["bike"],
        "suggested_activities": ["strength"],
        "weekly_time_commitment": "3 hours a week"
    }"#;

    const PLAN: &str = r#"{"week1": [
        {"day": "2025-01-06", "activities": [{"title": "Strength", "duration": 20, "instructor": "Jess"}]},
        {"day": "2025-01-07", "activities": []}
    ]}"#;

    fn planner(
        llm: Arc<MockLlmClient>,
        provider: Arc<MockProvider>,
        store: Arc<MemorySessionStore>,
    ) -> WorkoutPlanner {
        WorkoutPlanner::from_config(
            &Config::default(),
            llm,
            provider,
            store,
            Arc::new(PromptLoader::embedded_only()),
        )
    }

    fn creds() -> Option<Credentials> {
        Some(Credentials::new("rider", "secret"))
    }

    #[tokio::test]
    async fn test_question_turn_is_persisted() {
        let llm = Arc::new(MockLlmClient::with_texts(&[r#"{"content": "Which workouts?", "done": false}"#]));
        let store = Arc::new(MemorySessionStore::new());
        let planner = planner(llm, Arc::new(MockProvider::new()), store.clone());

        let outcome = planner.advance_conversation("s1", "get strong", creds()).await.unwrap();

        assert_eq!(outcome, TurnOutcome::Question("Which workouts?".into()));
        assert_eq!(store.load("s1").await.unwrap().unwrap().turns.len(), 2);
    }

    #[tokio::test]
    async fn test_plan_turn() {
        let llm = Arc::new(MockLlmClient::with_texts(&[COLLECTED, PLAN]));
        let provider = Arc::new(MockProvider::new());
        let store = Arc::new(MemorySessionStore::new());
        let planner = planner(llm, provider.clone(), store.clone());

        let outcome = planner.advance_conversation("s1", "go", creds()).await.unwrap();

        let TurnOutcome::Plan { rendered, raw } = outcome else {
            panic!("expected a plan");
        };
        assert!(rendered.contains("🛌 **Rest Day**"));
        assert!(raw.get("week1").is_some());
        assert_eq!(provider.fetched(), vec![ActivityType::Strength, ActivityType::Stretching]);

        let session = store.load("s1").await.unwrap().unwrap();
        assert!(session.complete);
        assert!(session.plan.is_some());
        assert_eq!(session.turns.len(), 2);
        assert_eq!(session.turns[1].content, rendered);
    }

    #[tokio::test]
    async fn test_auth_failure_commits_nothing() {
        let llm = Arc::new(MockLlmClient::with_texts(&[COLLECTED]));
        let store = Arc::new(MemorySessionStore::new());
        let mut existing = Session::new("s1");
        existing.push_exchange("hello", "what are your goals?");
        store.save(&existing).await.unwrap();
        let planner = planner(llm.clone(), Arc::new(MockProvider::new().rejecting_login()), store.clone());

        let err = planner.advance_conversation("s1", "go", creds()).await.unwrap_err();

        assert!(matches!(&err, TurnError::Synthesis(e) if e.is_auth()));
        assert!(err.user_message().contains("username and password"));
        assert_eq!(store.load("s1").await.unwrap().unwrap(), existing);
        assert_eq!(llm.call_count(), 1);
    }

    #[tokio::test]
    async fn test_extraction_failure_commits_nothing() {
        let llm = Arc::new(MockLlmClient::with_texts(&["not json"]));
        let store = Arc::new(MemorySessionStore::new());
        let planner = planner(llm, Arc::new(MockProvider::new()), store.clone());

        let err = planner.advance_conversation("s1", "hi", creds()).await.unwrap_err();
        assert!(matches!(err, TurnError::Extraction(_)));
        assert!(store.load("s1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_invalid_session_id_fails_before_model_call() {
        let llm = Arc::new(MockLlmClient::with_texts(&[COLLECTED, PLAN]));
        let provider = Arc::new(MockProvider::new());
        let planner = planner(llm.clone(), provider.clone(), Arc::new(MemorySessionStore::new()));

        let err = planner.advance_conversation("a b", "go", creds()).await.unwrap_err();

        assert!(matches!(err, TurnError::Store(StoreError::InvalidId(_))));
        assert_eq!(llm.call_count(), 0);
        assert!(provider.fetched().is_empty());
    }

    #[test]
    fn test_memory_backed_planner_does_not_keep_sessions() {
        let planner = planner(
            Arc::new(MockLlmClient::with_texts(&[])),
            Arc::new(MockProvider::new()),
            Arc::new(MemorySessionStore::new()),
        );
        assert!(!planner.keeps_sessions());
    }

    #[tokio::test]
    async fn test_reset_session() {
        let llm = Arc::new(MockLlmClient::with_texts(&[r#"{"content": "Goals?", "done": false}"#]));
        let store = Arc::new(MemorySessionStore::new());
        let planner = planner(llm, Arc::new(MockProvider::new()), store);

        planner.advance_conversation("s1", "hi", None).await.unwrap();
        planner.reset_session("s1").await.unwrap();
        assert!(planner.session("s1").await.unwrap().is_none());
    }

    #[test]
    fn test_user_message_for_missing_credentials() {
        let err = TurnError::Synthesis(SynthesisError::Provider(ProviderError::MissingCredentials(
            "PELOTON_USERNAME".into(),
        )));
        assert!(err.user_message().contains("PELOTON_USERNAME"));
    }

    #[test]
    fn test_user_message_for_truncated_plan() {
        let err = TurnError::Synthesis(SynthesisError::Model(LlmError::Truncated { raw: "{\"week1\"".into() }));
        assert!(err.user_message().contains("fewer weeks"));
    }

    #[test]
    fn test_greeting_lists_four_data_points() {
        for needle in ["goals", "equipment", "workouts you enjoy", "each week"] {
            assert!(GREETING.contains(needle), "missing {}", needle);
        }
    }
}
