mod backend;
mod stub;
#[cfg(feature = "detector-tract")]
mod tract;
mod yolo;

pub use backend::Detector;
pub use stub::StubDetector;
#[cfg(feature = "detector-tract")]
pub use tract::TractDetector;
pub use yolo::{decode_predictions, non_max_suppression, YoloOutput};

use crate::config::{DetectorConfig, DetectorKind};
use crate::error::Result;
use tracing::info;

/// Construct the configured detector backend
pub fn build_detector(config: &DetectorConfig) -> Result<Box<dyn Detector>> {
    let mut detector: Box<dyn Detector> = match config.backend {
        DetectorKind::Stub => Box::new(StubDetector::new()),
        #[cfg(feature = "detector-tract")]
        DetectorKind::Tract => Box::new(TractDetector::new(
            &config.model_path,
            config.input_size,
            config.iou_threshold,
        )?),
        #[cfg(not(feature = "detector-tract"))]
        DetectorKind::Tract => {
            return Err(crate::error::HumancamError::system(
                "tract detector requested but the detector-tract feature is disabled",
            ))
        }
    };

    detector.warm_up()?;
    info!("Detector '{}' ready", detector.name());
    Ok(detector)
}
