//! Interactive chat front end
//!
//! A thin rustyline loop over `WorkoutPlanner::advance_conversation`.

mod session;

pub use session::ChatSession;
