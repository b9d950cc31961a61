//! Workout planner configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// LLM provider configuration
    pub llm: LlmConfig,

    /// Fitness data provider configuration
    pub provider: ProviderConfig,

    /// Plan synthesis knobs
    pub planner: PlannerConfig,

    /// Session storage
    pub storage: StorageConfig,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,
}

impl Config {
    /// Validate configuration before use
    ///
    /// Call this early in startup to fail fast with clear error messages.
    pub fn validate(&self) -> Result<()> {
        if std::env::var(&self.llm.api_key_env).is_err() {
            return Err(eyre::eyre!(
                "LLM API key not found. Set the {} environment variable.",
                self.llm.api_key_env
            ));
        }
        if self.llm.provider == "azure" && self.llm.deployment.is_none() {
            return Err(eyre::eyre!("llm.deployment is required when llm.provider is 'azure'"));
        }
        if self.planner.default_weeks == 0 {
            return Err(eyre::eyre!("planner.default-weeks must be at least 1"));
        }
        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .workoutplanner.yml
        let local_config = PathBuf::from(".workoutplanner.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/workoutplanner/workoutplanner.yml
        if let Some(user_config) = Self::user_config_path()
            && user_config.exists()
        {
            match Self::load_from_file(&user_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is initialized
    ///
    /// Errors are swallowed; the full load reports them later.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let candidates = match config_path {
            Some(path) => vec![path.clone()],
            None => {
                let mut paths = vec![PathBuf::from(".workoutplanner.yml")];
                paths.extend(Self::user_config_path());
                paths
            }
        };

        candidates
            .iter()
            .filter(|p| p.exists())
            .find_map(|p| Self::load_from_file(p).ok())
            .and_then(|c| c.log_level)
    }

    fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("workoutplanner").join("workoutplanner.yml"))
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name ("openai" or "azure")
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// API base URL (the resource endpoint for Azure)
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Azure deployment name
    pub deployment: Option<String>,

    /// Azure API version
    #[serde(rename = "api-version")]
    pub api_version: String,

    /// Maximum tokens per response
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// Automatic retries for transient failures
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Temperature for plan synthesis
    pub temperature: f32,

    /// Temperature for the intake conversation
    #[serde(rename = "intake-temperature")]
    pub intake_temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-4o".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            base_url: "https://api.openai.com".to_string(),
            deployment: None,
            api_version: "2024-08-01-preview".to_string(),
            max_tokens: 16384,
            timeout_ms: 300_000,
            max_retries: 5,
            temperature: 0.5,
            intake_temperature: 0.8,
        }
    }
}

impl LlmConfig {
    /// Read the API key from the configured environment variable
    pub fn get_api_key(&self) -> Result<String> {
        std::env::var(&self.api_key_env).map_err(|_| eyre::eyre!("Environment variable {} is not set", self.api_key_env))
    }
}

/// Fitness data provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Prefix that a class id is appended to for its detail page
    #[serde(rename = "class-url-prefix")]
    pub class_url_prefix: String,

    /// Environment variable holding the fallback username
    #[serde(rename = "username-env")]
    pub username_env: String,

    /// Environment variable holding the fallback password
    #[serde(rename = "password-env")]
    pub password_env: String,

    /// Classes fetched per category
    #[serde(rename = "class-limit")]
    pub class_limit: u32,

    /// Past workouts fetched for context
    #[serde(rename = "history-limit")]
    pub history_limit: u32,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.onepeloton.com".to_string(),
            class_url_prefix: "https://members.onepeloton.com/classes/all?modal=classDetailsModal&classId=".to_string(),
            username_env: "PELOTON_USERNAME".to_string(),
            password_env: "PELOTON_PASSWORD".to_string(),
            class_limit: 50,
            history_limit: 18,
            timeout_ms: 30_000,
        }
    }
}

/// Plan synthesis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Plan horizon when the user did not ask for a specific duration
    #[serde(rename = "default-weeks")]
    pub default_weeks: u32,

    /// Upper bound on activities scheduled on a single day
    #[serde(rename = "max-activities-per-day")]
    pub max_activities_per_day: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            default_weeks: 4,
            max_activities_per_day: 5,
        }
    }
}

/// Which session store backs the conversation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    File,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,

    /// Directory for the file-backed session store
    #[serde(rename = "sessions-dir")]
    pub sessions_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        // Use XDG data directory (~/.local/share/workoutplanner on Linux)
        let sessions_dir = dirs::data_dir()
            .map(|d| d.join("workoutplanner").join("sessions"))
            .unwrap_or_else(|| PathBuf::from(".workoutplanner/sessions"));

        Self {
            backend: StorageBackend::Memory,
            sessions_dir,
        }
    }
}
