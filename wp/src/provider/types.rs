//! Wire types for the fitness platform
//!
//! Deserialization is lenient: every field the planner can live without has a
//! default, so sparse records from the platform do not fail a whole fetch.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::domain::{HistoryEntry, InstructorDirectory, Profile, WorkoutCandidate};

/// Platform login credentials, supplied per call and never stored
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// An authenticated platform session
#[derive(Clone)]
pub struct AuthSession {
    pub user_id: String,
    pub session_id: String,
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSession")
            .field("user_id", &self.user_id)
            .field("session_id", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct LoginResponse {
    pub session_id: String,
    pub user_id: String,
}

/// A class as listed in the on-demand archive
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawClass {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub instructor_id: Option<String>,
    pub fitness_discipline: String,
    pub duration: u64,
    pub difficulty_estimate: Option<f64>,
}

impl RawClass {
    /// Normalize against the merged instructor lookup
    pub fn into_candidate(self, instructors: &InstructorDirectory, url_prefix: &str) -> WorkoutCandidate {
        WorkoutCandidate {
            url: format!("{}{}", url_prefix, self.id),
            instructor: instructors.resolve(self.instructor_id.as_deref()),
            id: self.id,
            title: self.title,
            description: self.description.unwrap_or_default(),
            category: self.fitness_discipline,
            duration: self.duration,
            difficulty: self.difficulty_estimate,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawInstructor {
    pub id: String,
    pub name: String,
}

/// One page of the class archive together with the instructors it references
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassPage {
    #[serde(rename = "data")]
    pub classes: Vec<RawClass>,
    pub instructors: Vec<RawInstructor>,
}

impl ClassPage {
    pub fn instructor_pairs(&self) -> impl Iterator<Item = (String, String)> + '_ {
        self.instructors.iter().map(|i| (i.id.clone(), i.name.clone()))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawEffortZones {
    pub total_effort_points: Option<f64>,
    pub heart_rate_zone_durations: Option<BTreeMap<String, Option<f64>>>,
}

/// A completed workout as the platform reports it
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawWorkout {
    pub name: Option<String>,
    pub fitness_discipline: Option<String>,
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
    pub effort_zones: Option<RawEffortZones>,
}

impl From<RawWorkout> for HistoryEntry {
    fn from(raw: RawWorkout) -> Self {
        let (difficulty, zones) = match raw.effort_zones {
            Some(z) => (z.total_effort_points, z.heart_rate_zone_durations),
            None => (None, None),
        };
        HistoryEntry::new(raw.name, raw.fitness_discipline, raw.start_time, raw.end_time, difficulty, zones)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct DataEnvelope<T> {
    pub data: Vec<T>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawProfile {
    pub weight: Option<f64>,
    pub height: Option<f64>,
    pub age: Option<u32>,
    pub gender: Option<String>,
}

impl From<RawProfile> for Profile {
    fn from(raw: RawProfile) -> Self {
        Profile::new(raw.weight, raw.height, raw.age, raw.gender)
    }
}

/// An on-demand browse category
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowseCategory {
    pub id: String,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct CategoriesResponse {
    pub browse_categories: Vec<BrowseCategory>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_credentials_debug_redacts_password() {
        let creds = Credentials::new("rider@example.com", "hunter2");
        let dbg = format!("{:?}", creds);
        assert!(dbg.contains("rider@example.com"));
        assert!(!dbg.contains("hunter2"));
    }

    #[test]
    fn test_class_page_from_archive_json() {
        let page: ClassPage = serde_json::from_value(json!({
            "data": [{
                "id": "c1",
                "title": "30 min Power Zone Ride",
                "description": null,
                "instructor_id": "i1",
                "fitness_discipline": "cycling",
                "duration": 1800,
                "difficulty_estimate": 7.9,
                "is_explicit": false
            }],
            "instructors": [{"id": "i1", "name": "Matt Wilpers"}],
            "page": 0
        }))
        .unwrap();

        let mut dir = InstructorDirectory::new();
        dir.merge(page.instructor_pairs());
        let candidate = page.classes[0].clone().into_candidate(&dir, "https://example.com/classes?id=");

        assert_eq!(candidate.instructor, "Matt Wilpers");
        assert_eq!(candidate.url, "https://example.com/classes?id=c1");
        assert_eq!(candidate.description, "");
        assert_eq!(candidate.duration, 1800);
    }

    #[test]
    fn test_candidate_with_unknown_instructor() {
        let raw = RawClass {
            id: "c2".into(),
            instructor_id: Some("ghost".into()),
            ..Default::default()
        };
        let candidate = raw.into_candidate(&InstructorDirectory::new(), "p/");
        assert_eq!(candidate.instructor, "Unknown");
    }

    #[test]
    fn test_workout_without_effort_zones() {
        let raw: RawWorkout = serde_json::from_value(json!({
            "fitness_discipline": "strength",
            "start_time": 1000,
            "end_time": 1500
        }))
        .unwrap();
        let entry = HistoryEntry::from(raw);
        assert_eq!(entry.duration_in_seconds, 500);
        assert_eq!(entry.name, "Unknown");
        assert!(entry.difficulty.is_none());
    }

    #[test]
    fn test_history_with_null_zone_value() {
        let envelope: DataEnvelope<RawWorkout> = serde_json::from_value(json!({
            "data": [{
                "name": "Ride",
                "start_time": 1000,
                "end_time": 1600,
                "effort_zones": {
                    "total_effort_points": 12.5,
                    "heart_rate_zone_durations": {
                        "heart_rate_z1_duration": null,
                        "heart_rate_z2_duration": 300.0
                    }
                }
            }]
        }))
        .unwrap();
        let entry = HistoryEntry::from(envelope.data.into_iter().next().unwrap());
        let zones = entry.heart_rate_zones.unwrap();
        assert_eq!(zones["heart_rate_z1_duration"], None);
        assert_eq!(zones["heart_rate_z2_duration"], Some(300.0));
        assert_eq!(entry.difficulty, Some(12.5));
    }

    #[test]
    fn test_profile_with_null_gender() {
        let raw: RawProfile = serde_json::from_value(json!({"weight": 170.0, "gender": null})).unwrap();
        let profile = Profile::from(raw);
        assert_eq!(profile.gender, "unspecified");
        assert_eq!(profile.weight, Some(170.0));
    }
}
