use chrono::{DateTime, Local};
use std::time::{Duration, Instant};

/// Sessions shorter than this with no detections are not logged
pub const MIN_LOGGED_DURATION: Duration = Duration::from_secs(2);

/// Running statistics for one streaming session.
///
/// Owned by the pipeline; read once when the session is finalized.
#[derive(Debug, Clone)]
pub struct Session {
    started_at: DateTime<Local>,
    started: Instant,
    peak_humans: usize,
    frames_observed: u64,
}

impl Session {
    pub fn start() -> Self {
        Self {
            started_at: Local::now(),
            started: Instant::now(),
            peak_humans: 0,
            frames_observed: 0,
        }
    }

    /// Record the person count of one frame. The peak never decreases.
    pub fn observe(&mut self, humans_in_frame: usize) {
        self.frames_observed += 1;
        self.peak_humans = self.peak_humans.max(humans_in_frame);
    }

    pub fn peak_humans(&self) -> usize {
        self.peak_humans
    }

    pub fn frames_observed(&self) -> u64 {
        self.frames_observed
    }

    pub fn started_at(&self) -> DateTime<Local> {
        self.started_at
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Summary as of now
    pub fn summary(&self) -> SessionSummary {
        self.summary_after(self.elapsed())
    }

    /// Summary with an explicit elapsed duration
    pub fn summary_after(&self, duration: Duration) -> SessionSummary {
        SessionSummary {
            started_at: self.started_at,
            peak_humans: self.peak_humans,
            duration,
        }
    }
}

/// The values persisted for a finished session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub started_at: DateTime<Local>,
    pub peak_humans: usize,
    pub duration: Duration,
}

impl SessionSummary {
    /// Accidental instant exits (under 2s, nobody seen) are skipped
    pub fn should_record(&self) -> bool {
        !(self.duration < MIN_LOGGED_DURATION && self.peak_humans == 0)
    }

    pub fn date(&self) -> String {
        self.started_at.format("%Y-%m-%d").to_string()
    }

    pub fn time(&self) -> String {
        self.started_at.format("%H:%M:%S").to_string()
    }

    pub fn duration_text(&self) -> String {
        format_duration(self.duration)
    }
}

/// `H:MM:SS`, truncated to whole seconds. Hours are not wrapped at 24.
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    format!("{}:{:02}:{:02}", total / 3600, (total / 60) % 60, total % 60)
}
