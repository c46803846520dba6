use crate::error::Result;
use crate::frame::{BoundingBox, DetectionFilter};
use image::RgbImage;

/// Object detector collaborator.
///
/// Implementations return boxes in source-image pixel coordinates. The
/// pipeline re-applies `filter` to whatever comes back, so a backend that
/// over-reports is still safe to plug in.
pub trait Detector: Send {
    /// Backend identifier
    fn name(&self) -> &'static str;

    /// Run detection on one image
    fn detect(&mut self, image: &RgbImage, filter: &DetectionFilter) -> Result<Vec<BoundingBox>>;

    /// Optional warm-up hook
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}
