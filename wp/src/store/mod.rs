//! Session storage
//!
//! Sessions are created on first use and only removed by an explicit reset.
//! The store is injected into the planner so the terminal front end can keep
//! conversations on disk while tests keep them in memory.

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

mod file;
mod memory;

pub use file::FileSessionStore;
pub use memory::MemorySessionStore;

use crate::domain::Session;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Session storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt session data: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Invalid session id '{0}'")]
    InvalidId(String),

    #[error("Session storage task failed: {0}")]
    Task(String),
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, id: &str) -> Result<Option<Session>, StoreError>;

    /// Insert or replace a session
    async fn save(&self, session: &Session) -> Result<(), StoreError>;

    /// Forget a session; returns whether one existed
    async fn reset(&self, id: &str) -> Result<bool, StoreError>;

    /// Known session ids, sorted
    async fn list(&self) -> Result<Vec<String>, StoreError>;

    /// Whether sessions outlive the process
    fn is_persistent(&self) -> bool {
        false
    }

    /// Load a session, or start an empty one (not yet saved)
    async fn load_or_create(&self, id: &str) -> Result<Session, StoreError> {
        debug!(%id, "SessionStore::load_or_create: called");
        Ok(match self.load(id).await? {
            Some(session) => session,
            None => {
                debug!(%id, "SessionStore::load_or_create: creating new session");
                Session::new(id)
            }
        })
    }
}

/// Ids become file names, so keep them to a safe alphabet
pub fn validate_id(id: &str) -> Result<(), StoreError> {
    let valid = !id.is_empty()
        && id.len() <= 128
        && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidId(id.to_string()))
    }
}
