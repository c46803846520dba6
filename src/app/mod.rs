mod control;
mod orchestrator;
mod runtime;
mod shutdown;
mod types;


pub use control::{spawn_quit_watcher, watch_for_quit, MAX_CONTROL_LINE, QUIT_COMMAND};
pub use orchestrator::SessionOrchestrator;
pub use runtime::spawn_signal_handlers;
pub use shutdown::{ClosedSession, SessionScope};
pub use types::{RunOutcome, ShutdownReason, WatchOutcome};
