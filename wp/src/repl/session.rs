//! REPL session management

use std::sync::Arc;

use colored::Colorize;
use eyre::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::{debug, warn};

use crate::llm::Role;
use crate::provider::Credentials;
use crate::service::{GREETING, TurnOutcome, WorkoutPlanner};

/// Interactive chat bound to one session id
pub struct ChatSession {
    planner: Arc<WorkoutPlanner>,
    session_id: String,
    credentials: Option<Credentials>,
}

enum SlashResult {
    Continue,
    Quit,
}

impl ChatSession {
    pub fn new(planner: Arc<WorkoutPlanner>, session_id: String, credentials: Option<Credentials>) -> Self {
        debug!(%session_id, "ChatSession::new: called");
        Self {
            planner,
            session_id,
            credentials,
        }
    }

    /// Run the REPL main loop
    pub async fn run(&mut self) -> Result<()> {
        self.print_welcome().await?;

        let mut rl = DefaultEditor::new().map_err(|e| eyre::eyre!("Failed to initialize readline: {}", e))?;

        loop {
            let readline = rl.readline(&format!("{} ", ">".bright_green()));

            match readline {
                Ok(line) => {
                    let input = line.trim();
                    if input.is_empty() {
                        continue;
                    }
                    let _ = rl.add_history_entry(input);

                    if input.starts_with('/') {
                        match self.handle_slash_command(input).await {
                            SlashResult::Continue => continue,
                            SlashResult::Quit => break,
                        }
                    } else {
                        self.process_user_input(input).await;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!();
                    break;
                }
                Err(err) => {
                    return Err(eyre::eyre!("Readline error: {}", err));
                }
            }
        }

        println!("{}", farewell(&self.session_id, self.planner.keeps_sessions()));
        Ok(())
    }

    async fn print_welcome(&self) -> Result<()> {
        println!();
        println!("{}", "Peloton Workout Planner".bright_cyan().bold());
        println!("Session: {}", self.session_id.dimmed());
        println!("Type {} for help, {} to quit", "/help".yellow(), "/quit".yellow());
        println!();

        match self.planner.session(&self.session_id).await? {
            Some(session) if !session.is_empty() => {
                println!("{}", "Resuming your conversation.".dimmed());
                if let Some(last) = session.turns.iter().rev().find(|t| t.role == Role::Assistant) {
                    println!("{}", last.content);
                }
            }
            _ => println!("{}", GREETING),
        }
        println!();
        Ok(())
    }

    async fn handle_slash_command(&mut self, input: &str) -> SlashResult {
        let cmd = input.split_whitespace().next().unwrap_or("");

        match cmd {
            "/help" | "/h" => {
                self.print_help();
                SlashResult::Continue
            }
            "/quit" | "/q" | "/exit" => SlashResult::Quit,
            "/reset" => {
                match self.planner.reset_session(&self.session_id).await {
                    Ok(()) => {
                        println!("{}", "Conversation reset.".dimmed());
                        println!("{}", GREETING);
                    }
                    Err(e) => println!("{} {}", "!".red(), e.user_message()),
                }
                SlashResult::Continue
            }
            "/history" => {
                self.print_history().await;
                SlashResult::Continue
            }
            _ => {
                println!("{} Unknown command: {}", "?".yellow(), cmd);
                println!("Type {} for available commands", "/help".yellow());
                SlashResult::Continue
            }
        }
    }

    fn print_help(&self) {
        println!();
        println!("{}", "Available Commands:".bright_cyan());
        println!("  {:14} Show this help", "/help".yellow());
        println!("  {:14} Exit (the session is kept)", "/quit".yellow());
        println!("  {:14} Start the conversation over", "/reset".yellow());
        println!("  {:14} Show the conversation so far", "/history".yellow());
        println!();
    }

    async fn print_history(&self) {
        let turns = match self.planner.session(&self.session_id).await {
            Ok(Some(session)) => session.turns,
            Ok(None) => Vec::new(),
            Err(e) => {
                println!("{} {}", "!".red(), e.user_message());
                return;
            }
        };
        if turns.is_empty() {
            println!("{}", "No conversation history.".dimmed());
            return;
        }

        println!();
        println!("{}", "Conversation History:".bright_cyan());
        for (i, msg) in turns.iter().enumerate() {
            let role = match msg.role {
                Role::User => "You".bright_green(),
                Role::Assistant => "Coach".bright_blue(),
            };
            let preview: String = msg.content.chars().take(60).collect();
            let preview = if msg.content.chars().count() > 60 {
                format!("{}...", preview)
            } else {
                preview
            };
            println!("  {}. {}: {}", i + 1, role, preview.replace('\n', " "));
        }
        println!();
    }

    /// Send one message; failures are reported and the loop carries on
    async fn process_user_input(&mut self, input: &str) {
        println!("{}", "Thinking...".dimmed());
        match self
            .planner
            .advance_conversation(&self.session_id, input, self.credentials.clone())
            .await
        {
            Ok(TurnOutcome::Question(question)) => {
                println!("{}", question);
            }
            Ok(TurnOutcome::Plan { rendered, .. }) => {
                println!();
                println!("{}", rendered);
                println!("{}", "Use /reset to start over, or keep chatting to adjust the plan.".dimmed());
            }
            Err(e) => {
                warn!(error = %e, "Turn failed");
                println!("{} {}", "!".red(), e.user_message());
            }
        }
        println!();
    }
}

fn farewell(session_id: &str, persistent: bool) -> String {
    if persistent {
        format!(
            "Goodbye! Session {} is saved; resume it with `wp chat --session {}`.",
            session_id.dimmed(),
            session_id
        )
    } else {
        "Goodbye!".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_farewell_mentions_session_only_when_kept() {
        colored::control::set_override(false);
        assert_eq!(farewell("abc", false), "Goodbye!");
        let kept = farewell("abc", true);
        assert!(kept.contains("Session abc is saved"));
        assert!(kept.contains("wp chat --session abc"));
    }
}
