//! The synthesized workout plan
//!
//! A plan is a mapping from week label (`week1`, `week2`, ...) to the days of
//! that week. Only top-level keys starting with `week` carry plan data; any
//! other key the model adds is dropped during parsing.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// Prefix that marks a top-level key as a week
pub const WEEK_PREFIX: &str = "week";

/// Why a model response could not be read as a plan
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("plan contains no week entries")]
    NoWeeks,

    #[error("{week} is malformed: {message}")]
    InvalidWeek { week: String, message: String },

    #[error("plan must be a JSON object")]
    NotAnObject,
}

/// A single scheduled class
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub category: String,
    /// Length in minutes
    pub duration: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub instructor: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub intensity: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
    /// Why this class serves the user's goals
    #[serde(default, deserialize_with = "null_as_default")]
    pub extra_info: String,
}

/// One calendar day; no activities means a rest day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanDay {
    pub day: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub activities: Vec<Activity>,
}

/// Models write `null` for fields they have nothing to say about
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl PlanDay {
    pub fn is_rest_day(&self) -> bool {
        self.activities.is_empty()
    }
}

/// Something odd about a plan that is still worth showing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanWarning {
    TooManyActivities { week: String, day: String, count: usize },
    NoRestDay { week: String },
}

impl fmt::Display for PlanWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooManyActivities { week, day, count } => {
                write!(f, "{} {} schedules {} activities", week, day, count)
            }
            Self::NoRestDay { week } => write!(f, "{} has no rest day", week),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct WorkoutPlan {
    weeks: BTreeMap<String, Vec<PlanDay>>,
}

impl WorkoutPlan {
    pub fn new(weeks: BTreeMap<String, Vec<PlanDay>>) -> Self {
        Self { weeks }
    }

    /// Read a plan out of a model JSON object
    pub fn from_json(map: Map<String, Value>) -> Result<Self, PlanError> {
        debug!(keys = map.len(), "WorkoutPlan::from_json: called");
        let mut weeks = BTreeMap::new();
        for (key, value) in map {
            if !key.starts_with(WEEK_PREFIX) {
                debug!(%key, "WorkoutPlan::from_json: ignoring non-week key");
                continue;
            }
            let days: Vec<PlanDay> = serde_json::from_value(value).map_err(|e| PlanError::InvalidWeek {
                week: key.clone(),
                message: e.to_string(),
            })?;
            weeks.insert(key, days);
        }

        if weeks.is_empty() {
            debug!("WorkoutPlan::from_json: no weeks found");
            return Err(PlanError::NoWeeks);
        }
        Ok(Self { weeks })
    }

    pub fn from_value(value: Value) -> Result<Self, PlanError> {
        match value {
            Value::Object(map) => Self::from_json(map),
            _ => Err(PlanError::NotAnObject),
        }
    }

    /// Weeks in lexical key order
    pub fn weeks(&self) -> impl Iterator<Item = (&str, &[PlanDay])> {
        self.weeks.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn week_count(&self) -> usize {
        self.weeks.len()
    }

    pub fn activity_count(&self) -> usize {
        self.weeks.values().flatten().map(|d| d.activities.len()).sum()
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Non-fatal findings: days over the cap, weeks without rest
    pub fn lint(&self, max_per_day: usize) -> Vec<PlanWarning> {
        debug!(max_per_day, "WorkoutPlan::lint: called");
        let mut warnings = Vec::new();
        for (week, days) in self.weeks() {
            for day in days {
                if day.activities.len() > max_per_day {
                    warnings.push(PlanWarning::TooManyActivities {
                        week: week.to_string(),
                        day: day.day.clone(),
                        count: day.activities.len(),
                    });
                }
            }
            if !days.iter().any(PlanDay::is_rest_day) {
                warnings.push(PlanWarning::NoRestDay { week: week.to_string() });
            }
        }
        warnings
    }
}

impl TryFrom<Map<String, Value>> for WorkoutPlan {
    type Error = PlanError;

    fn try_from(map: Map<String, Value>) -> Result<Self, Self::Error> {
        Self::from_json(map)
    }
}

impl Serialize for WorkoutPlan {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.weeks.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn activity(title: &str) -> Value {
        json!({
            "title": title,
            "description": "desc",
            "category": "cycling",
            "duration": 30,
            "instructor": "Alex",
            "intensity": "moderate",
            "url": "https://example.com/c1",
            "extra_info": "builds endurance"
        })
    }

    fn as_map(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_from_json_ignores_non_week_keys() {
        let map = as_map(json!({
            "week1": [{"day": "2025-01-06", "activities": [activity("Ride")]}],
            "notes": "have fun",
        }));

        let plan = WorkoutPlan::from_json(map).unwrap();
        assert_eq!(plan.week_count(), 1);
        assert_eq!(plan.activity_count(), 1);
        assert!(plan.to_value().get("notes").is_none());
    }

    #[test]
    fn test_from_json_requires_weeks() {
        let map = as_map(json!({"summary": "nothing here"}));
        assert_eq!(WorkoutPlan::from_json(map), Err(PlanError::NoWeeks));
    }

    #[test]
    fn test_from_json_rejects_bad_shape() {
        let map = as_map(json!({"week1": "Monday: ride"}));
        assert!(matches!(
            WorkoutPlan::from_json(map),
            Err(PlanError::InvalidWeek { week, .. }) if week == "week1"
        ));

        let map = as_map(json!({"week1": [{"day": "Mon", "activities": [{"title": "x", "duration": "thirty"}]}]}));
        assert!(WorkoutPlan::from_json(map).is_err());
    }

    #[test]
    fn test_missing_activities_is_rest_day() {
        let map = as_map(json!({"week1": [{"day": "2025-01-07"}]}));
        let plan = WorkoutPlan::from_json(map).unwrap();
        let (_, days) = plan.weeks().next().unwrap();
        assert!(days[0].is_rest_day());
    }

    #[test]
    fn test_null_activities_is_rest_day() {
        let map = as_map(json!({"week1": [{"day": "2025-01-07", "activities": null}]}));
        let plan = WorkoutPlan::from_json(map).unwrap();
        let (_, days) = plan.weeks().next().unwrap();
        assert!(days[0].is_rest_day());
    }

    #[test]
    fn test_null_activity_fields_become_empty() {
        let mut ride = activity("Ride");
        ride["instructor"] = Value::Null;
        ride["url"] = Value::Null;
        ride["extra_info"] = Value::Null;
        let map = as_map(json!({"week1": [{"day": "2025-01-06", "activities": [ride]}]}));

        let plan = WorkoutPlan::from_json(map).unwrap();
        let (_, days) = plan.weeks().next().unwrap();
        let parsed = &days[0].activities[0];
        assert_eq!(parsed.title, "Ride");
        assert!(parsed.instructor.is_empty());
        assert!(parsed.url.is_empty());
        assert!(parsed.extra_info.is_empty());
    }

    #[test]
    fn test_weeks_iterate_lexically() {
        let map = as_map(json!({
            "week2": [{"day": "b", "activities": []}],
            "week10": [{"day": "c", "activities": []}],
            "week1": [{"day": "a", "activities": []}],
        }));
        let plan = WorkoutPlan::from_json(map).unwrap();
        let keys: Vec<_> = plan.weeks().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["week1", "week10", "week2"]);
    }

    #[test]
    fn test_deserialize_goes_through_validation() {
        let plan: WorkoutPlan =
            serde_json::from_value(json!({"week1": [{"day": "a", "activities": [activity("Ride")]}]})).unwrap();
        assert_eq!(serde_json::from_value::<WorkoutPlan>(plan.to_value()).unwrap(), plan);
        assert!(serde_json::from_value::<WorkoutPlan>(json!({"other": 1})).is_err());
    }

    #[test]
    fn test_lint_flags_busy_days_and_missing_rest() {
        let map = as_map(json!({
            "week1": [
                {"day": "a", "activities": [activity("1"), activity("2"), activity("3")]},
                {"day": "b", "activities": []},
            ],
            "week2": [{"day": "c", "activities": [activity("1")]}],
        }));
        let plan = WorkoutPlan::from_json(map).unwrap();
        let warnings = plan.lint(2);

        assert_eq!(warnings.len(), 2);
        assert!(warnings.contains(&PlanWarning::TooManyActivities {
            week: "week1".into(),
            day: "a".into(),
            count: 3
        }));
        assert!(warnings.contains(&PlanWarning::NoRestDay { week: "week2".into() }));
    }
}
