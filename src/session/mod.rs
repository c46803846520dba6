mod report;
mod stats;

pub use report::{RecordOutcome, SessionLog};
pub use stats::{format_duration, Session, SessionSummary, MIN_LOGGED_DURATION};
