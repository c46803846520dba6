use super::backend::Detector;
use crate::error::Result;
use crate::frame::{BoundingBox, DetectionFilter};
use image::RgbImage;

/// Detector that never finds anything. Frames stream through unannotated.
#[derive(Debug, Default)]
pub struct StubDetector;

impl StubDetector {
    pub fn new() -> Self {
        Self
    }
}

impl Detector for StubDetector {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn detect(&mut self, _image: &RgbImage, _filter: &DetectionFilter) -> Result<Vec<BoundingBox>> {
        Ok(Vec::new())
    }
}
