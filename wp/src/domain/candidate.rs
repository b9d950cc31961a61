//! Classes that may be placed into a plan

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Display name used whenever an instructor cannot be resolved
pub const UNKNOWN: &str = "Unknown";

/// A fetchable class before it is scheduled
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutCandidate {
    pub id: String,
    pub title: String,
    pub description: String,
    pub instructor: String,
    pub category: String,
    /// Length in seconds
    pub duration: u64,
    pub difficulty: Option<f64>,
    pub url: String,
}

/// Instructor id to display name lookup, merged across category fetches
#[derive(Debug, Clone, Default)]
pub struct InstructorDirectory {
    names: HashMap<String, String>,
}

impl InstructorDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add entries without overwriting ids that are already known
    pub fn merge<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (id, name) in entries {
            self.names.entry(id).or_insert(name);
        }
        debug!(known = self.names.len(), "InstructorDirectory::merge: done");
    }

    /// Name for an instructor id, or `"Unknown"`
    pub fn resolve(&self, id: Option<&str>) -> String {
        id.and_then(|id| self.names.get(id))
            .cloned()
            .unwrap_or_else(|| UNKNOWN.to_string())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
