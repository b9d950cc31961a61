//! Plan presenter
//!
//! Turns a plan into Markdown for the chat transcript. Rendering is pure and
//! never fails; input that is not a plan yields a single apology line.

use serde_json::Value;
use std::fmt::Write;
use tracing::debug;

use crate::domain::{Activity, PlanDay, UNKNOWN, WorkoutPlan};

pub const PLAN_HEADER: &str = "🎉 **Here's your personalized Peloton plan:**";
pub const REST_DAY: &str = "🛌 **Rest Day**";
pub const APOLOGY: &str = "Sorry, I couldn't turn that into a workout plan. Please try again.";

/// Render a validated plan
pub fn render(plan: &WorkoutPlan) -> String {
    debug!(weeks = plan.week_count(), "render: called");
    let mut out = format!("{}\n\n", PLAN_HEADER);
    for (week, days) in plan.weeks() {
        let _ = write!(out, "## 📅 {}\n\n", week_heading(week));
        for day in days {
            render_day(&mut out, day);
        }
    }
    out
}

/// Render an arbitrary JSON value, e.g. a plan saved to disk
pub fn render_value(value: &Value) -> String {
    debug!("render_value: called");
    match WorkoutPlan::from_value(value.clone()) {
        Ok(plan) => render(&plan),
        Err(e) => {
            debug!(error = %e, "render_value: not a plan");
            APOLOGY.to_string()
        }
    }
}

fn render_day(out: &mut String, day: &PlanDay) {
    let _ = writeln!(out, "### 🗓 {}", day.day);
    if day.is_rest_day() {
        let _ = write!(out, "{}\n\n", REST_DAY);
        return;
    }
    for activity in &day.activities {
        render_activity(out, activity);
    }
}

fn render_activity(out: &mut String, activity: &Activity) {
    let _ = writeln!(out, "#### 🏋️ {}", or_unknown(&activity.title));
    let _ = writeln!(out, "- **Duration**: {} min", activity.duration);
    let _ = writeln!(out, "- **Category**: {}", or_unknown(&activity.category));
    let _ = writeln!(out, "- **Instructor**: {}", or_unknown(&activity.instructor));
    let _ = writeln!(out, "- **Intensity**: {}", or_unknown(&activity.intensity));
    let _ = writeln!(out, "- **Description**: {}", or_unknown(&activity.description));
    if activity.url.trim().is_empty() {
        let _ = writeln!(out, "- **Link**: {}", UNKNOWN);
    } else {
        let _ = writeln!(out, "- [Take Class Now]({})", activity.url);
    }
    let _ = write!(out, "- **Why This Workout**: {}\n\n", or_unknown(&activity.extra_info));
}

/// `week1` -> `Week1`
fn week_heading(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn or_unknown(s: &str) -> &str {
    if s.trim().is_empty() { UNKNOWN } else { s }
}
