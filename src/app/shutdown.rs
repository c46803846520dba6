use crate::camera::CaptureDevice;
use crate::session::{Session, SessionLog, SessionSummary};
use tracing::{info, warn};

/// Summary produced when a scope is finalized
#[derive(Debug, Clone)]
pub struct ClosedSession {
    pub summary: SessionSummary,
    pub logged: bool,
}

/// Owns the open device and the session for the length of a run.
///
/// Finalization (device release, then best-effort session logging) runs
/// exactly once: through `close`, or from `Drop` on any other exit path.
pub struct SessionScope<D: CaptureDevice> {
    device: D,
    session: Session,
    log: SessionLog,
    finalized: bool,
}

impl<D: CaptureDevice> SessionScope<D> {
    pub fn open(device: D, session: Session, log: SessionLog) -> Self {
        Self {
            device,
            session,
            log,
            finalized: false,
        }
    }

    /// Borrow the device and session together for the frame loop
    pub fn parts(&mut self) -> (&mut D, &mut Session) {
        (&mut self.device, &mut self.session)
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn close(mut self) -> ClosedSession {
        self.finalize()
    }

    fn finalize(&mut self) -> ClosedSession {
        self.finalized = true;
        self.device.release();

        let summary = self.session.summary();
        let logged = self.log.log(&summary);
        info!(
            "Session finished after {} (peak {} humans, {} frames)",
            summary.duration_text(),
            summary.peak_humans,
            self.session.frames_observed()
        );

        ClosedSession { summary, logged }
    }
}

impl<D: CaptureDevice> Drop for SessionScope<D> {
    fn drop(&mut self) {
        if !self.finalized {
            warn!("Session scope left without close; finalizing");
            self.finalize();
        }
    }
}
