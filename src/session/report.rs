use super::stats::SessionSummary;
use crate::error::{HumancamError, Result};
use serde::Serialize;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// One row of the session report
#[derive(Debug, Serialize)]
struct ReportRow {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Time")]
    time: String,
    #[serde(rename = "Humans Detected")]
    humans_detected: usize,
    #[serde(rename = "Duration")]
    duration: String,
}

impl From<&SessionSummary> for ReportRow {
    fn from(summary: &SessionSummary) -> Self {
        Self {
            date: summary.date(),
            time: summary.time(),
            humans_detected: summary.peak_humans,
            duration: summary.duration_text(),
        }
    }
}

/// What happened to a summary handed to the log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Row appended; `header` is true when this write created the file
    Written { header: bool },
    /// Short empty session, nothing written
    Suppressed,
}

/// Append-only CSV report of finished sessions
#[derive(Debug, Clone)]
pub struct SessionLog {
    path: PathBuf,
}

impl SessionLog {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a summary row.
    ///
    /// The file is opened, appended and closed within this call. The header
    /// is written only when the file did not exist beforehand.
    pub fn record(&self, summary: &SessionSummary) -> Result<RecordOutcome> {
        if !summary.should_record() {
            debug!(
                "Skipping session log: {:?} with no detections",
                summary.duration
            );
            return Ok(RecordOutcome::Suppressed);
        }

        let existed = self.path.is_file();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.write_error(e))?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(!existed)
            .terminator(csv::Terminator::CRLF)
            .from_writer(file);
        writer
            .serialize(ReportRow::from(summary))
            .map_err(|e| self.write_error(e))?;
        writer.flush().map_err(|e| self.write_error(e))?;

        Ok(RecordOutcome::Written { header: !existed })
    }

    /// Best-effort `record`: failures are reported and swallowed so they
    /// never block shutdown. Returns true when a row was written.
    pub fn log(&self, summary: &SessionSummary) -> bool {
        match self.record(summary) {
            Ok(RecordOutcome::Written { .. }) => {
                info!(
                    "Session logged to {}: {} humans, duration {}",
                    self.path.display(),
                    summary.peak_humans,
                    summary.duration_text()
                );
                true
            }
            Ok(RecordOutcome::Suppressed) => false,
            Err(e) => {
                error!("Error writing to log file: {}", e);
                false
            }
        }
    }

    fn write_error<E: std::fmt::Display>(&self, e: E) -> HumancamError {
        HumancamError::SessionLog {
            path: self.path.clone(),
            details: e.to_string(),
        }
    }
}
