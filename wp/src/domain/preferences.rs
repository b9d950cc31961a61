//! The preference record gathered during intake

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::debug;

use super::activity::{ActivityType, UnknownActivity};

/// Why a preference record is not usable yet
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreferenceError {
    #[error("fitness goals are missing")]
    MissingGoals,

    #[error("weekly time commitment is missing")]
    MissingTimeCommitment,

    #[error("no preferred activity types were chosen")]
    NoActivities,

    #[error(transparent)]
    UnknownActivity(#[from] UnknownActivity),

    #[error("plan duration must be at least one week")]
    ZeroDuration,
}

/// What the user told us about themselves
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreferenceRecord {
    pub fitness_goals: String,

    /// Equipment tags, e.g. "bike", "dumbbells"
    pub equipment: BTreeSet<String>,

    #[serde(deserialize_with = "deserialize_selectable")]
    pub preferred_activity_types: BTreeSet<ActivityType>,

    pub weekly_time_commitment: String,

    /// Explicit plan horizon, when the user asked for one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan_duration_weeks: Option<u32>,
}

impl PreferenceRecord {
    /// Check the record carries everything the planner needs
    pub fn validate(&self) -> Result<(), PreferenceError> {
        debug!("PreferenceRecord::validate: called");
        if self.fitness_goals.trim().is_empty() {
            return Err(PreferenceError::MissingGoals);
        }
        if self.weekly_time_commitment.trim().is_empty() {
            return Err(PreferenceError::MissingTimeCommitment);
        }
        if self.preferred_activity_types.is_empty() {
            return Err(PreferenceError::NoActivities);
        }
        if let Some(&bad) = self.preferred_activity_types.iter().find(|a| !a.is_selectable()) {
            return Err(UnknownActivity(bad.to_string()).into());
        }
        if self.plan_duration_weeks == Some(0) {
            return Err(PreferenceError::ZeroDuration);
        }
        Ok(())
    }

    pub fn is_complete(&self) -> bool {
        self.validate().is_ok()
    }

    /// Parse a list of activity names, failing on the first one outside the vocabulary
    pub fn parse_activities<I, S>(names: I) -> Result<BTreeSet<ActivityType>, UnknownActivity>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .map(|name| ActivityType::parse_selectable(name.as_ref()))
            .collect()
    }
}

fn deserialize_selectable<'de, D>(deserializer: D) -> Result<BTreeSet<ActivityType>, D::Error>
where
    D: Deserializer<'de>,
{
    let names = Vec::<String>::deserialize(deserializer)?;
    PreferenceRecord::parse_activities(names).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_record() -> PreferenceRecord {
        PreferenceRecord {
            fitness_goals: "build strength".to_string(),
            equipment: BTreeSet::from(["bike".to_string()]),
            preferred_activity_types: BTreeSet::from([ActivityType::Strength, ActivityType::Cycling]),
            weekly_time_commitment: "3 hours a week".to_string(),
            plan_duration_weeks: None,
        }
    }

    #[test]
    fn test_complete_record_validates() {
        assert!(complete_record().is_complete());
    }

    #[test]
    fn test_missing_fields_are_reported() {
        let mut record = complete_record();
        record.fitness_goals = "  ".to_string();
        assert_eq!(record.validate(), Err(PreferenceError::MissingGoals));

        let mut record = complete_record();
        record.weekly_time_commitment.clear();
        assert_eq!(record.validate(), Err(PreferenceError::MissingTimeCommitment));

        let mut record = complete_record();
        record.preferred_activity_types.clear();
        assert_eq!(record.validate(), Err(PreferenceError::NoActivities));
    }

    #[test]
    fn test_stretching_in_record_is_rejected() {
        let mut record = complete_record();
        record.preferred_activity_types.insert(ActivityType::Stretching);
        assert!(matches!(record.validate(), Err(PreferenceError::UnknownActivity(_))));
    }

    #[test]
    fn test_zero_weeks_is_rejected() {
        let mut record = complete_record();
        record.plan_duration_weeks = Some(0);
        assert_eq!(record.validate(), Err(PreferenceError::ZeroDuration));
    }

    #[test]
    fn test_deserialize_rejects_unknown_activity() {
        let json = r#"{"fitness_goals": "x", "preferred_activity_types": ["cycling", "pilates"]}"#;
        let err = serde_json::from_str::<PreferenceRecord>(json).unwrap_err();
        assert!(err.to_string().contains("pilates"));
    }

    #[test]
    fn test_deserialize_from_yaml() {
        let yaml = r#"
fitness_goals: lose weight
equipment: [bike, mat]
preferred_activity_types: [Cycling, yoga]
weekly_time_commitment: 4 hours
plan_duration_weeks: 6
"#;
        let record: PreferenceRecord = serde_yaml::from_str(yaml).unwrap();
        assert!(record.is_complete());
        assert_eq!(record.plan_duration_weeks, Some(6));
        assert!(record.preferred_activity_types.contains(&ActivityType::Cycling));
        assert_eq!(record.equipment.len(), 2);
    }
}
