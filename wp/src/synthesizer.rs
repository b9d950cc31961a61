//! Plan synthesizer
//!
//! Gathers everything the planner prompt needs from the fitness provider,
//! asks the model for a plan in JSON mode and validates the result.
//!
//! Provider failures are final: there is no retry here and a single failed
//! category fetch aborts the whole synthesis.

use std::sync::Arc;

use chrono::NaiveDate;
use futures::future::try_join_all;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{PlannerConfig, ProviderConfig};
use crate::domain::{
    ActivityType, InstructorDirectory, PlanError, PreferenceError, PreferenceRecord, WorkoutCandidate, WorkoutPlan,
};
use crate::llm::{CompletionRequest, LlmClient, LlmError, Message};
use crate::prompts::{PlannerContext, PromptLoader};
use crate::provider::{ClassPage, Credentials, FitnessProvider, ProviderError, resolve_credentials};

/// Token budget for the plan reply
const PLAN_MAX_TOKENS: u32 = 16384;

/// User turn sent alongside the planner system prompt
const PLAN_REQUEST: &str = "Create my personalized workout plan.";

#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Model call failed: {0}")]
    Model(#[from] LlmError),

    #[error("Model returned an unusable plan: {source}")]
    InvalidPlan {
        #[source]
        source: PlanError,
        raw: String,
    },

    #[error("Preferences are incomplete: {0}")]
    Preferences(#[from] PreferenceError),

    #[error("Failed to build planner prompt: {0}")]
    Prompt(String),
}

impl SynthesisError {
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Provider(e) if e.is_auth())
    }

    /// The model output that caused the failure, if any
    pub fn raw_payload(&self) -> Option<&str> {
        match self {
            Self::Model(e) => e.raw_payload(),
            Self::InvalidPlan { raw, .. } => Some(raw),
            _ => None,
        }
    }
}

pub struct PlanSynthesizer {
    provider: Arc<dyn FitnessProvider>,
    llm: Arc<dyn LlmClient>,
    prompts: Arc<PromptLoader>,
    provider_config: ProviderConfig,
    planner_config: PlannerConfig,
    temperature: f32,
}

impl PlanSynthesizer {
    pub fn new(
        provider: Arc<dyn FitnessProvider>,
        llm: Arc<dyn LlmClient>,
        prompts: Arc<PromptLoader>,
        provider_config: ProviderConfig,
        planner_config: PlannerConfig,
        temperature: f32,
    ) -> Self {
        debug!(model = %llm.model_name(), "PlanSynthesizer::new: called");
        Self {
            provider,
            llm,
            prompts,
            provider_config,
            planner_config,
            temperature,
        }
    }

    /// Build a plan that starts today
    pub async fn synthesize(
        &self,
        credentials: Option<Credentials>,
        preferences: &PreferenceRecord,
    ) -> Result<WorkoutPlan, SynthesisError> {
        let today = chrono::Local::now().date_naive();
        self.synthesize_on(credentials, preferences, today).await
    }

    /// Build a plan that starts on `today`
    pub async fn synthesize_on(
        &self,
        credentials: Option<Credentials>,
        preferences: &PreferenceRecord,
        today: NaiveDate,
    ) -> Result<WorkoutPlan, SynthesisError> {
        debug!(%today, "PlanSynthesizer::synthesize_on: called");
        preferences.validate()?;

        let credentials = resolve_credentials(credentials, &self.provider_config)?;
        let session = self.provider.authenticate(&credentials).await?;

        let categories = categories_for(preferences);
        info!(categories = ?categories, "Fetching classes");
        let pages = try_join_all(categories.iter().map(|&category| {
            self.provider
                .list_classes(&session, category, self.provider_config.class_limit)
        }))
        .await?;
        let candidates = normalize_candidates(pages, &self.provider_config.class_url_prefix);
        info!(candidates = candidates.len(), "Fetched class candidates");

        let history = self
            .provider
            .get_history(&session, self.provider_config.history_limit)
            .await?;
        let profile = self.provider.get_profile(&session).await?;
        debug!(history = history.len(), "PlanSynthesizer::synthesize_on: provider data gathered");

        let weeks = preferences
            .plan_duration_weeks
            .unwrap_or(self.planner_config.default_weeks);
        let context = PlannerContext {
            today: today.format("%Y-%m-%d").to_string(),
            preferences: to_json(preferences)?,
            candidates: to_json(&candidates)?,
            history: to_json(&history)?,
            profile: to_json(&profile)?,
            weeks,
            max_per_day: self.planner_config.max_activities_per_day,
        };
        let system_prompt = self
            .prompts
            .render_planner(&context)
            .map_err(|e| SynthesisError::Prompt(e.to_string()))?;

        let request = CompletionRequest::json(system_prompt, vec![Message::user(PLAN_REQUEST)], PLAN_MAX_TOKENS)
            .with_temperature(self.temperature);
        let reply = self.llm.complete_json(request).await?;

        let raw = serde_json::Value::Object(reply.clone()).to_string();
        let plan = WorkoutPlan::from_json(reply).map_err(|source| SynthesisError::InvalidPlan { source, raw })?;

        for warning in plan.lint(self.planner_config.max_activities_per_day) {
            warn!(%warning, "Plan lint");
        }
        info!(
            weeks = plan.week_count(),
            activities = plan.activity_count(),
            "Plan synthesized"
        );
        Ok(plan)
    }
}

/// Preferred categories in fixed order, always followed by stretching
fn categories_for(preferences: &PreferenceRecord) -> Vec<ActivityType> {
    let mut categories: Vec<ActivityType> = preferences.preferred_activity_types.iter().copied().collect();
    categories.retain(|c| *c != ActivityType::Stretching);
    categories.push(ActivityType::Stretching);
    categories
}

/// Merge instructor lookups in page order, then resolve every class
fn normalize_candidates(pages: Vec<ClassPage>, url_prefix: &str) -> Vec<WorkoutCandidate> {
    let mut instructors = InstructorDirectory::new();
    for page in &pages {
        instructors.merge(page.instructor_pairs());
    }
    pages
        .into_iter()
        .flat_map(|page| page.classes)
        .map(|class| class.into_candidate(&instructors, url_prefix))
        .collect()
}

fn to_json<T: Serialize>(value: &T) -> Result<String, SynthesisError> {
    serde_json::to_string_pretty(value).map_err(|e| SynthesisError::Prompt(e.to_string()))
}
