//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

use crate::config::Config;

/// Workout Planner - personalized Peloton plans from a short conversation
#[derive(Parser)]
#[command(
    name = "wp",
    about = "Chat about your fitness goals and get a personalized Peloton workout plan",
    version
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Peloton username or email (falls back to the configured environment variable)
    #[arg(short, long, global = true)]
    pub username: Option<String>,

    /// Peloton password (falls back to the configured environment variable)
    #[arg(short, long, global = true)]
    pub password: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Chat interactively until a plan is ready (default)
    Chat {
        /// Resume or name a session; a new id is generated when omitted
        #[arg(short, long)]
        session: Option<String>,
    },

    /// Build a plan directly from a preferences file (YAML or JSON)
    Plan {
        /// Preference record file
        #[arg(value_name = "PREFERENCES_FILE")]
        file: PathBuf,

        /// Print the raw plan JSON instead of the rendered text
        #[arg(long)]
        json: bool,
    },

    /// Render a saved plan JSON file
    Render {
        #[arg(value_name = "PLAN_FILE")]
        file: PathBuf,
    },

    /// Manage stored chat sessions
    Sessions {
        #[command(subcommand)]
        command: SessionsCommand,
    },

    /// List Peloton on-demand browse categories
    Categories,
}

/// Session management subcommands
#[derive(Debug, Subcommand)]
pub enum SessionsCommand {
    /// List stored sessions
    List,

    /// Forget a session's conversation and preferences
    Reset {
        /// Session id
        id: String,
    },
}

/// Get the log file path
pub fn get_log_path() -> PathBuf {
    debug!("get_log_path: called");
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("workoutplanner")
        .join("logs")
        .join("wp.log")
}

/// Generate the after_help text with credential status and the log location
pub fn generate_after_help(config_path: Option<&PathBuf>) -> String {
    debug!("generate_after_help: called");
    let config = Config::load(config_path).unwrap_or_default();

    let mut help = String::new();
    help.push_str("Environment:\n");
    for var in [
        &config.llm.api_key_env,
        &config.provider.username_env,
        &config.provider.password_env,
    ] {
        let icon = if std::env::var(var).is_ok() {
            "\u{2705}"
        } else {
            "\u{274C}"
        };
        help.push_str(&format!("  {} {}\n", icon, var));
    }

    help.push('\n');
    help.push_str(&format!("Logs are written to: {}\n", get_log_path().display()));
    help
}
