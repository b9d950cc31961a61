//! Workout Planner - conversational Peloton plan builder
//!
//! A short chat collects the user's goals, equipment, favourite workouts and
//! weekly time budget. Once those are known the planner pulls the class
//! catalog, workout history and profile from Peloton and asks a language
//! model for a multi-week schedule, which is validated and rendered as
//! Markdown.
//!
//! # Modules
//!
//! - [`extractor`] - Intake conversation and completion detection
//! - [`synthesizer`] - Provider data aggregation and plan generation
//! - [`presenter`] - Markdown rendering
//! - [`service`] - Turn-by-turn API for front ends
//! - [`provider`] - Fitness platform trait and Peloton client
//! - [`llm`] - LLM client trait and OpenAI/Azure implementation
//! - [`store`] - Session storage
//! - [`config`] - Configuration types and loading
//! - [`cli`] / [`repl`] - Command-line front end

pub mod cli;
pub mod config;
pub mod domain;
pub mod extractor;
pub mod llm;
pub mod presenter;
pub mod prompts;
pub mod provider;
pub mod repl;
pub mod service;
pub mod store;
pub mod synthesizer;

// Re-export commonly used types
pub use config::{Config, LlmConfig};
pub use domain::{ActivityType, PreferenceRecord, Session, WorkoutPlan};
pub use extractor::{ConversationExtractor, ExtractionError, ExtractorResult};
pub use llm::{CompletionRequest, CompletionResponse, LlmClient, LlmError, OpenAIClient, create_client};
pub use provider::{Credentials, FitnessProvider, PelotonClient, ProviderError};
pub use service::{GREETING, TurnError, TurnOutcome, WorkoutPlanner};
pub use store::{FileSessionStore, MemorySessionStore, SessionStore, StoreError};
pub use synthesizer::{PlanSynthesizer, SynthesisError};
