//! Past workouts and the user's biometric profile
//!
//! Telemetry is frequently absent. Missing values serialize as the literal
//! `"Unknown"` so the planner prompt never sees nulls.

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use tracing::debug;

use super::candidate::UNKNOWN;

/// Format used for `taken_at`
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One completed workout
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub name: String,
    pub taken_at: String,
    pub discipline: String,
    /// Seconds between start and end, 0 when either is missing
    pub duration_in_seconds: u64,
    #[serde(serialize_with = "or_unknown")]
    pub difficulty: Option<f64>,
    #[serde(serialize_with = "or_unknown")]
    pub heart_rate_zones: Option<BTreeMap<String, Option<f64>>>,
}

impl HistoryEntry {
    /// Build an entry from raw epoch-second bounds
    ///
    /// A bound of `0` counts as missing.
    pub fn new(
        name: Option<String>,
        discipline: Option<String>,
        start: Option<i64>,
        end: Option<i64>,
        difficulty: Option<f64>,
        heart_rate_zones: Option<BTreeMap<String, Option<f64>>>,
    ) -> Self {
        debug!(?start, ?end, "HistoryEntry::new: called");
        let start = start.filter(|s| *s != 0);
        let end = end.filter(|e| *e != 0);

        let taken_at = start
            .and_then(|s| DateTime::<Utc>::from_timestamp(s, 0))
            .map(|dt| dt.format(TIMESTAMP_FORMAT).to_string())
            .unwrap_or_else(|| UNKNOWN.to_string());

        let duration_in_seconds = match (start, end) {
            (Some(s), Some(e)) => e.checked_sub(s).and_then(|d| u64::try_from(d).ok()).unwrap_or(0),
            _ => 0,
        };

        Self {
            name: name.unwrap_or_else(|| UNKNOWN.to_string()),
            taken_at,
            discipline: discipline.unwrap_or_else(|| UNKNOWN.to_string()),
            duration_in_seconds,
            difficulty,
            heart_rate_zones,
        }
    }
}

/// Basic biometrics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Profile {
    #[serde(serialize_with = "or_unknown")]
    pub weight: Option<f64>,
    #[serde(serialize_with = "or_unknown")]
    pub height: Option<f64>,
    #[serde(serialize_with = "or_unknown")]
    pub age: Option<u32>,
    pub gender: String,
}

impl Profile {
    pub fn new(weight: Option<f64>, height: Option<f64>, age: Option<u32>, gender: Option<String>) -> Self {
        Self {
            weight,
            height,
            age,
            gender: gender
                .filter(|g| !g.trim().is_empty())
                .unwrap_or_else(|| "unspecified".to_string()),
        }
    }
}

fn or_unknown<T, S>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
where
    T: Serialize,
    S: Serializer,
{
    match value {
        Some(v) => v.serialize(serializer),
        None => serializer.serialize_str(UNKNOWN),
    }
}
