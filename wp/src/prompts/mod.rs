//! Prompt Template System
//!
//! Loads and renders `.pmt` (prompt template) files. There are exactly two
//! templates, one per conversation phase: `intake` gathers preferences and
//! `planner` synthesizes the plan.
//!
//! Template loading chain:
//! 1. `.workoutplanner/prompts/{name}.pmt` (user override)
//! 2. `prompts/{name}.pmt` (repo default)
//! 3. Embedded fallback in code
//!
//! Templates use Handlebars syntax with HTML escaping disabled, so JSON
//! context is passed through verbatim.

pub mod embedded;
mod loader;

pub use loader::{IntakeContext, Phase, PlannerContext, PromptLoader};
