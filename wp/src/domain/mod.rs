//! Domain types for the workout planner
//!
//! The activity vocabulary, the preference record built during intake, the
//! normalized provider data fed to the planner, the plan itself, and the
//! session that ties a conversation together.

mod activity;
mod candidate;
mod history;
mod plan;
mod preferences;
mod session;

pub use activity::{ActivityType, SELECTABLE_ACTIVITIES, UnknownActivity};
pub use candidate::{InstructorDirectory, UNKNOWN, WorkoutCandidate};
pub use history::{HistoryEntry, Profile, TIMESTAMP_FORMAT};
pub use plan::{Activity, PlanDay, PlanError, PlanWarning, WEEK_PREFIX, WorkoutPlan};
pub use preferences::{PreferenceError, PreferenceRecord};
pub use session::{Session, generate_session_id};
