#[cfg(test)]
mod tests;

use crate::camera::CaptureDevice;
use crate::detect::Detector;
use crate::error::Result;
use crate::frame::DetectionFilter;
use crate::output::FrameEmitter;
use crate::render::FrameRenderer;
use crate::session::Session;
use std::io::Write;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Fixed pause after every emitted frame, capping output at 25 fps.
/// Not adaptive: slow detection makes the stream slower, never lossy.
pub const FRAME_INTERVAL: Duration = Duration::from_millis(40);

/// Why the frame loop stopped without an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The cancellation latch was observed at an iteration boundary
    Cancelled,
    /// The device stopped delivering frames
    StreamEnded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineReport {
    pub reason: StopReason,
    pub frames_emitted: u64,
}

/// Capture → detect → annotate → encode → emit loop
pub struct FramePipeline<W: Write> {
    detector: Box<dyn Detector>,
    renderer: FrameRenderer,
    emitter: FrameEmitter<W>,
    filter: DetectionFilter,
    frame_interval: Duration,
}

impl<W: Write> FramePipeline<W> {
    pub fn new(detector: Box<dyn Detector>, renderer: FrameRenderer, emitter: FrameEmitter<W>) -> Self {
        Self {
            detector,
            renderer,
            emitter,
            filter: DetectionFilter::humans(),
            frame_interval: FRAME_INTERVAL,
        }
    }

    /// Override the pacing interval
    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = interval;
        self
    }

    pub fn emitter(&self) -> &FrameEmitter<W> {
        &self.emitter
    }

    /// Run until cancellation or end of stream.
    ///
    /// Cancellation is checked once per iteration, before the next read, so
    /// a frame already being processed is always emitted in full. Errors from
    /// detection, encoding or emission end the loop immediately.
    pub async fn run<D: CaptureDevice + ?Sized>(
        &mut self,
        device: &mut D,
        session: &mut Session,
        cancel: &CancellationToken,
    ) -> Result<PipelineReport> {
        let emitted_before = self.emitter.records();
        let report = |reason, emitter: &FrameEmitter<W>| PipelineReport {
            reason,
            frames_emitted: emitter.records() - emitted_before,
        };

        info!("Starting detection stream");

        loop {
            if cancel.is_cancelled() {
                info!("Shutdown requested, stopping frame loop");
                return Ok(report(StopReason::Cancelled, &self.emitter));
            }

            let mut frame = match device.read_frame().await {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    info!("Camera {} stopped delivering frames", device.index());
                    return Ok(report(StopReason::StreamEnded, &self.emitter));
                }
                Err(e) => {
                    warn!("Camera {} read failed: {}", device.index(), e);
                    return Ok(report(StopReason::StreamEnded, &self.emitter));
                }
            };

            let boxes: Vec<_> = self
                .detector
                .detect(&frame.image, &self.filter)?
                .into_iter()
                .filter(|bbox| self.filter.accepts(bbox))
                .collect();
            session.observe(boxes.len());

            let payload = self.renderer.render(&mut frame, &boxes)?;
            self.emitter.emit(&payload)?;
            debug!("Frame {} emitted with {} humans", frame.id, boxes.len());

            // Interval sleep; a pending cancellation only shortens the wait
            tokio::select! {
                _ = tokio::time::sleep(self.frame_interval) => {}
                _ = cancel.cancelled() => {}
            }
        }
    }
}
