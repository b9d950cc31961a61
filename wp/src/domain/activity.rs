//! Activity vocabulary
//!
//! The fixed set of class disciplines the planner understands, and how each
//! maps onto a provider browse category.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

/// A class discipline
///
/// Declaration order is the order categories are fetched in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
    Cycling,
    Strength,
    Running,
    Yoga,
    Rowing,
    Stretching,
}

/// Activity types a user can ask for; stretching is always added by the planner
pub const SELECTABLE_ACTIVITIES: [ActivityType; 5] = [
    ActivityType::Cycling,
    ActivityType::Strength,
    ActivityType::Running,
    ActivityType::Yoga,
    ActivityType::Rowing,
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown activity type '{0}' (expected one of: cycling, strength, running, yoga, rowing)")]
pub struct UnknownActivity(pub String);

impl ActivityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cycling => "cycling",
            Self::Strength => "strength",
            Self::Running => "running",
            Self::Yoga => "yoga",
            Self::Rowing => "rowing",
            Self::Stretching => "stretching",
        }
    }

    /// Browse category slug the provider files this discipline under
    pub fn provider_category(&self) -> &'static str {
        debug!(?self, "ActivityType::provider_category: called");
        match self {
            Self::Rowing => {
                debug!("ActivityType::provider_category: rowing maps to caesar");
                "caesar"
            }
            other => other.as_str(),
        }
    }

    /// Whether a user preference may name this type
    pub fn is_selectable(&self) -> bool {
        !matches!(self, Self::Stretching)
    }

    /// Parse a user-selectable activity, rejecting anything outside the vocabulary
    pub fn parse_selectable(s: &str) -> Result<Self, UnknownActivity> {
        debug!(%s, "ActivityType::parse_selectable: called");
        match s.parse::<Self>() {
            Ok(activity) if activity.is_selectable() => Ok(activity),
            _ => {
                debug!(%s, "ActivityType::parse_selectable: rejected");
                Err(UnknownActivity(s.to_string()))
            }
        }
    }
}

impl FromStr for ActivityType {
    type Err = UnknownActivity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cycling" => Ok(Self::Cycling),
            "strength" => Ok(Self::Strength),
            "running" => Ok(Self::Running),
            "yoga" => Ok(Self::Yoga),
            "rowing" => Ok(Self::Rowing),
            "stretching" => Ok(Self::Stretching),
            _ => Err(UnknownActivity(s.to_string())),
        }
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_provider_category_mapping() {
        assert_eq!(ActivityType::Rowing.provider_category(), "caesar");
        assert_eq!(ActivityType::Cycling.provider_category(), "cycling");
        assert_eq!(ActivityType::Stretching.provider_category(), "stretching");
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("  Cycling ".parse::<ActivityType>().unwrap(), ActivityType::Cycling);
        assert_eq!("YOGA".parse::<ActivityType>().unwrap(), ActivityType::Yoga);
    }

    #[test]
    fn test_stretching_is_not_selectable() {
        assert!("stretching".parse::<ActivityType>().is_ok());
        assert!(ActivityType::parse_selectable("stretching").is_err());
    }

    #[test]
    fn test_selectable_order_matches_declaration() {
        let mut sorted = SELECTABLE_ACTIVITIES;
        sorted.sort();
        assert_eq!(sorted, SELECTABLE_ACTIVITIES);
    }

    proptest! {
        #[test]
        fn parse_selectable_only_accepts_vocabulary(s in "[a-zA-Z ]{0,12}") {
            match ActivityType::parse_selectable(&s) {
                Ok(activity) => {
                    prop_assert!(SELECTABLE_ACTIVITIES.contains(&activity));
                    prop_assert_eq!(s.trim().to_lowercase(), activity.as_str());
                }
                Err(UnknownActivity(raw)) => prop_assert_eq!(raw, s),
            }
        }
    }
}
