pub mod app;
pub mod camera;
pub mod config;
pub mod detect;
pub mod error;
pub mod frame;
pub mod output;
pub mod pipeline;
pub mod render;
pub mod session;

pub use app::{RunOutcome, SessionOrchestrator, ShutdownReason};
pub use camera::{CameraBackend, CaptureDevice};
pub use config::{DetectorKind, HumancamConfig};
pub use detect::Detector;
pub use error::{CameraError, HumancamError, Result};
pub use frame::{BoundingBox, DetectionFilter, Frame, ObjectClass};
pub use session::{Session, SessionLog, SessionSummary};
