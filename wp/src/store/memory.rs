//! In-memory session store

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

use super::{SessionStore, StoreError, validate_id};
use crate::domain::Session;

/// Sessions held for the life of the process
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, id: &str) -> Result<Option<Session>, StoreError> {
        debug!(%id, "MemorySessionStore::load: called");
        validate_id(id)?;
        Ok(self.sessions.read().await.get(id).cloned())
    }

    async fn save(&self, session: &Session) -> Result<(), StoreError> {
        debug!(id = %session.id, turns = session.turns.len(), "MemorySessionStore::save: called");
        validate_id(&session.id)?;
        self.sessions.write().await.insert(session.id.clone(), session.clone());
        Ok(())
    }

    async fn reset(&self, id: &str) -> Result<bool, StoreError> {
        debug!(%id, "MemorySessionStore::reset: called");
        validate_id(id)?;
        Ok(self.sessions.write().await.remove(id).is_some())
    }

    async fn list(&self) -> Result<Vec<String>, StoreError> {
        let mut ids: Vec<String> = self.sessions.read().await.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}
