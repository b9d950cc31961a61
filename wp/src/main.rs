//! Workout Planner
//!
//! CLI entry point: interactive chat, one-shot planning and plan rendering.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use clap::{CommandFactory, FromArgMatches, Parser};
use colored::Colorize;
use eyre::{Context, Result};
use tracing::{debug, info};

use workoutplanner::cli::{Cli, Command, SessionsCommand, generate_after_help, get_log_path};
use workoutplanner::config::{Config, StorageBackend};
use workoutplanner::domain::{PreferenceRecord, generate_session_id};
use workoutplanner::llm::create_client;
use workoutplanner::presenter;
use workoutplanner::prompts::PromptLoader;
use workoutplanner::provider::{Credentials, FitnessProvider, PelotonClient, resolve_credentials};
use workoutplanner::repl::ChatSession;
use workoutplanner::service::WorkoutPlanner;
use workoutplanner::store::{FileSessionStore, MemorySessionStore, SessionStore};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Note: Can't log params here since logging isn't initialized yet
    let log_path = get_log_path();
    if let Some(log_dir) = log_path.parent() {
        fs::create_dir_all(log_dir).context("Failed to create log directory")?;
    }

    // Priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Pre-parse so the after_help can reflect a --config override
    let pre = Cli::try_parse().ok();
    let cmd = Cli::command().after_help(generate_after_help(pre.as_ref().and_then(|c| c.config.as_ref())));
    let cli = Cli::from_arg_matches(&cmd.get_matches())?;

    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    info!(model = %config.llm.model, storage = ?config.storage.backend, "Workout planner loaded config");

    let credentials = credentials_from_cli(&cli);

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Some(Command::Chat { session }) => cmd_chat(&config, session, credentials).await,
        None => cmd_chat(&config, None, credentials).await,
        Some(Command::Plan { file, json }) => cmd_plan(&config, &file, json, credentials).await,
        Some(Command::Render { file }) => cmd_render(&file),
        Some(Command::Sessions { command }) => cmd_sessions(&config, command).await,
        Some(Command::Categories) => cmd_categories(&config, credentials).await,
    }
}

/// Both flags must be given to override the environment
fn credentials_from_cli(cli: &Cli) -> Option<Credentials> {
    match (&cli.username, &cli.password) {
        (Some(u), Some(p)) => Some(Credentials::new(u.clone(), p.clone())),
        (Some(_), None) | (None, Some(_)) => {
            eprintln!(
                "{} --username and --password must be given together; using environment credentials",
                "warning:".yellow()
            );
            None
        }
        (None, None) => None,
    }
}

fn build_store(config: &Config) -> Arc<dyn SessionStore> {
    match config.storage.backend {
        StorageBackend::Memory => Arc::new(MemorySessionStore::new()),
        StorageBackend::File => Arc::new(FileSessionStore::new(config.storage.sessions_dir.clone())),
    }
}

fn build_planner(config: &Config, store: Arc<dyn SessionStore>) -> Result<WorkoutPlanner> {
    config.validate()?;
    let llm = create_client(&config.llm).context("Failed to create LLM client")?;
    let provider: Arc<dyn FitnessProvider> =
        Arc::new(PelotonClient::from_config(&config.provider).context("Failed to create Peloton client")?);
    let prompts = Arc::new(PromptLoader::new(std::env::current_dir()?));
    Ok(WorkoutPlanner::from_config(config, llm, provider, store, prompts))
}

/// Interactive chat
async fn cmd_chat(config: &Config, session: Option<String>, credentials: Option<Credentials>) -> Result<()> {
    debug!(?session, "cmd_chat: called");
    let planner = Arc::new(build_planner(config, build_store(config))?);
    let session_id = session.unwrap_or_else(generate_session_id);
    info!(%session_id, "Starting chat session");
    ChatSession::new(planner, session_id, credentials).run().await
}

/// One-shot synthesis from a preferences file
async fn cmd_plan(config: &Config, file: &Path, json: bool, credentials: Option<Credentials>) -> Result<()> {
    debug!(?file, json, "cmd_plan: called");
    let content = fs::read_to_string(file).context(format!("Failed to read {}", file.display()))?;
    // YAML is a superset of JSON
    let preferences: PreferenceRecord =
        serde_yaml::from_str(&content).context(format!("Invalid preferences in {}", file.display()))?;

    let planner = build_planner(config, Arc::new(MemorySessionStore::new()))?;
    println!("{}", "Building your plan...".dimmed());
    let plan = planner
        .synthesizer()
        .synthesize(credentials, &preferences)
        .await
        .context("Plan synthesis failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        println!("{}", presenter::render(&plan));
    }
    Ok(())
}

/// Render a saved plan
fn cmd_render(file: &Path) -> Result<()> {
    debug!(?file, "cmd_render: called");
    let content = fs::read_to_string(file).context(format!("Failed to read {}", file.display()))?;
    let value: serde_json::Value =
        serde_json::from_str(&content).context(format!("{} is not valid JSON", file.display()))?;
    println!("{}", presenter::render_value(&value));
    Ok(())
}

async fn cmd_sessions(config: &Config, command: SessionsCommand) -> Result<()> {
    debug!(?command, "cmd_sessions: called");
    let store = FileSessionStore::new(config.storage.sessions_dir.clone());
    match command {
        SessionsCommand::List => {
            let ids = store.list().await?;
            if ids.is_empty() {
                println!("No saved sessions in {}", store.dir().display());
            }
            for id in ids {
                match store.load(&id).await {
                    Ok(Some(session)) => {
                        let status = if session.plan.is_some() {
                            "plan ready".green()
                        } else if session.complete {
                            "complete".yellow()
                        } else {
                            "in progress".dimmed()
                        };
                        println!(
                            "{}  {:>3} turns  {}  {}",
                            id,
                            session.turns.len(),
                            session.updated_at.format("%Y-%m-%d %H:%M"),
                            status
                        );
                    }
                    Ok(None) => {}
                    Err(e) => println!("{}  {} {}", id, "unreadable:".red(), e),
                }
            }
        }
        SessionsCommand::Reset { id } => {
            if store.reset(&id).await? {
                println!("Session {} reset", id);
            } else {
                println!("No session named {}", id);
            }
        }
    }
    Ok(())
}

async fn cmd_categories(config: &Config, credentials: Option<Credentials>) -> Result<()> {
    debug!("cmd_categories: called");
    let client = PelotonClient::from_config(&config.provider)?;
    let credentials = resolve_credentials(credentials, &config.provider)?;
    let session = client.authenticate(&credentials).await?;
    for category in client.list_categories(&session).await? {
        println!("{:<20} {}", category.slug.bright_cyan(), category.name);
    }
    Ok(())
}
