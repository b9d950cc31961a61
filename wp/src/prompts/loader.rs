//! Prompt Loader
//!
//! Loads prompt templates from files or falls back to embedded defaults.

use std::path::{Path, PathBuf};

use eyre::{Result, eyre};
use handlebars::Handlebars;
use serde::Serialize;
use tracing::{debug, info};

use super::embedded;

/// Which stage of the conversation a prompt serves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Eliciting preferences one question at a time
    Intake,
    /// Turning finished preferences into a plan
    Planner,
}

impl Phase {
    pub fn template_name(&self) -> &'static str {
        match self {
            Self::Intake => "intake",
            Self::Planner => "planner",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.template_name())
    }
}

/// Context for the intake template
#[derive(Debug, Clone, Serialize)]
pub struct IntakeContext {
    /// Comma separated activity vocabulary
    pub activities: String,
    pub default_weeks: u32,
}

/// Context for the planner template
///
/// Data sections are pre-serialized JSON.
#[derive(Debug, Clone, Serialize)]
pub struct PlannerContext {
    pub today: String,
    pub preferences: String,
    pub candidates: String,
    pub history: String,
    pub profile: String,
    pub weeks: u32,
    pub max_per_day: usize,
}

/// Loads and renders prompt templates
pub struct PromptLoader {
    hbs: Handlebars<'static>,
    /// User override directory (e.g., `.workoutplanner/prompts/`)
    user_dir: Option<PathBuf>,
    /// Repo default directory (e.g., `prompts/`)
    repo_dir: Option<PathBuf>,
}

fn engine() -> Handlebars<'static> {
    let mut hbs = Handlebars::new();
    hbs.register_escape_fn(handlebars::no_escape);
    hbs.set_strict_mode(true);
    hbs
}

impl PromptLoader {
    /// Create a loader that looks for overrides under `root`
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        debug!(?root, "PromptLoader::new: called");
        let user_dir = root.join(".workoutplanner/prompts");
        let repo_dir = root.join("prompts");
        debug!(
            ?user_dir,
            user_dir_exists = user_dir.exists(),
            ?repo_dir,
            repo_dir_exists = repo_dir.exists(),
            "PromptLoader::new: checking directories"
        );

        Self {
            hbs: engine(),
            user_dir: user_dir.exists().then_some(user_dir),
            repo_dir: repo_dir.exists().then_some(repo_dir),
        }
    }

    /// Create a loader that only uses embedded prompts (for testing)
    pub fn embedded_only() -> Self {
        debug!("PromptLoader::embedded_only: called");
        Self {
            hbs: engine(),
            user_dir: None,
            repo_dir: None,
        }
    }

    /// Load a template by name
    ///
    /// Checks in order:
    /// 1. User override: `.workoutplanner/prompts/{name}.pmt`
    /// 2. Repo default: `prompts/{name}.pmt`
    /// 3. Embedded fallback
    pub fn load_template(&self, name: &str) -> Result<String> {
        debug!(%name, "PromptLoader::load_template: called");
        for dir in self.user_dir.iter().chain(self.repo_dir.iter()) {
            let path = dir.join(format!("{}.pmt", name));
            if path.exists() {
                debug!(?path, "PromptLoader::load_template: found on disk");
                return std::fs::read_to_string(&path)
                    .map_err(|e| eyre!("Failed to read prompt {}: {}", path.display(), e));
            }
        }

        debug!(%name, "PromptLoader::load_template: trying embedded fallback");
        embedded::get_embedded(name)
            .map(str::to_string)
            .ok_or_else(|| eyre!("Prompt template not found: {}", name))
    }

    pub fn render_intake(&self, context: &IntakeContext) -> Result<String> {
        self.render(Phase::Intake, context)
    }

    pub fn render_planner(&self, context: &PlannerContext) -> Result<String> {
        self.render(Phase::Planner, context)
    }

    fn render<C: Serialize>(&self, phase: Phase, context: &C) -> Result<String> {
        debug!(%phase, "PromptLoader::render: called");
        let template = self.load_template(phase.template_name())?;
        info!("Rendering {} prompt", phase);
        self.hbs
            .render_template(&template, context)
            .map_err(|e| eyre!("Failed to render template {}: {}", phase, e))
    }
}
