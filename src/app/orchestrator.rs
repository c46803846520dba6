use super::control::spawn_quit_watcher;
use super::runtime::spawn_signal_handlers;
use super::shutdown::SessionScope;
use super::types::{RunOutcome, ShutdownReason};
use crate::camera::{probe_camera_index, CameraBackend};
use crate::config::{DetectorConfig, HumancamConfig};
use crate::detect::Detector;
use crate::error::Result;
use crate::output::FrameEmitter;
use crate::pipeline::{FramePipeline, StopReason};
use crate::render::FrameRenderer;
use crate::session::{Session, SessionLog};
use std::io::Write;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Drives one camera session from startup to the session log.
///
/// The session clock starts when the orchestrator is created.
pub struct SessionOrchestrator {
    config: HumancamConfig,
    session: Session,
    cancellation_token: CancellationToken,
}

impl SessionOrchestrator {
    pub fn new(config: HumancamConfig) -> Self {
        Self {
            config,
            session: Session::start(),
            cancellation_token: CancellationToken::new(),
        }
    }

    /// The shutdown latch shared by every trigger
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }

    /// Run against the system camera with stdin control and stdout frames
    pub async fn run(self) -> Result<RunOutcome> {
        spawn_signal_handlers(&self.cancellation_token);
        let _watcher = spawn_quit_watcher(self.cancellation_token.clone());

        #[cfg(feature = "camera")]
        {
            let backend = crate::camera::GstCameraBackend::new(self.config.camera.clone())?;
            self.run_with(&backend, crate::detect::build_detector, std::io::stdout())
                .await
        }

        #[cfg(not(feature = "camera"))]
        {
            Err(crate::error::CameraError::Configuration {
                details: "built without the camera feature".to_string(),
            }
            .into())
        }
    }

    /// Run with an explicit camera backend, detector factory and output sink.
    ///
    /// Startup failures (no camera, detector load, device reopen) return
    /// `Err` before any session state is persisted. Once the device is open
    /// every exit path goes through the session scope.
    pub async fn run_with<B, F, W>(
        self,
        backend: &B,
        build_detector: F,
        output: W,
    ) -> Result<RunOutcome>
    where
        B: CameraBackend,
        F: FnOnce(&DetectorConfig) -> Result<Box<dyn Detector>>,
        W: Write,
    {
        let Self {
            config,
            session,
            cancellation_token,
        } = self;

        info!("Finding camera using {} backend...", backend.name());
        let index = probe_camera_index(backend)?;

        info!("Initializing detector...");
        let detector = build_detector(&config.detector)?;

        let device = backend.open(index)?;
        info!("Camera opened. Starting detection stream.");

        let renderer = FrameRenderer::new(&config.output);
        let mut pipeline = FramePipeline::new(detector, renderer, FrameEmitter::new(output));
        let mut scope = SessionScope::open(
            device,
            session,
            SessionLog::new(&config.session.log_path),
        );

        let result = {
            let (device, session) = scope.parts();
            pipeline.run(device, session, &cancellation_token).await
        };

        let reason = match result {
            Ok(report) => match report.reason {
                StopReason::Cancelled => ShutdownReason::Cancelled,
                StopReason::StreamEnded => ShutdownReason::StreamEnded,
            },
            Err(e) => {
                error!("An error occurred: {}", e);
                ShutdownReason::ProcessingFailure(e.to_string())
            }
        };
        let frames_emitted = pipeline.emitter().records();
        let bytes_emitted = pipeline.emitter().bytes();

        let closed = scope.close();
        info!(
            "Stream stopped ({:?}), {} frames ({} bytes) emitted",
            reason, frames_emitted, bytes_emitted
        );

        Ok(RunOutcome {
            reason,
            frames_emitted,
            summary: closed.summary,
            logged: closed.logged,
        })
    }
}
