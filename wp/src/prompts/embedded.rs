//! Embedded prompts
//!
//! These are compiled into the binary from .pmt files at build time.

use tracing::debug;

/// Preference intake conversation
pub const INTAKE: &str = include_str!("../../prompts/intake.pmt");

/// Plan synthesis
pub const PLANNER: &str = include_str!("../../prompts/planner.pmt");

/// Get the embedded prompt by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    match name {
        "intake" => Some(INTAKE),
        "planner" => Some(PLANNER),
        _ => {
            debug!("get_embedded: no match found");
            None
        }
    }
}
