use crate::session::SessionSummary;

/// Why a streaming session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShutdownReason {
    /// QUIT on stdin or a termination signal
    Cancelled,
    /// The camera stopped delivering frames
    StreamEnded,
    /// Detection, encoding or frame output failed
    ProcessingFailure(String),
}

/// How the quit watcher finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchOutcome {
    /// A line containing QUIT was read and the latch was tripped
    QuitReceived,
    /// Control input closed without QUIT
    InputClosed,
    /// The latch was tripped by something else first
    Stopped,
}

/// Result of a session that got past startup
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub reason: ShutdownReason,
    pub frames_emitted: u64,
    pub summary: SessionSummary,
    pub logged: bool,
}

impl RunOutcome {
    /// Every post-startup exit path is a clean shutdown
    pub fn exit_code(&self) -> i32 {
        0
    }
}
