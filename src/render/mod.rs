mod encode;
mod overlay;

pub use encode::{encode_jpeg, encode_payload};
pub use overlay::FrameAnnotator;

use crate::config::OutputConfig;
use crate::error::Result;
use crate::frame::{BoundingBox, Frame};

/// Turns a frame and its detections into one transport-ready payload
pub struct FrameRenderer {
    annotator: FrameAnnotator,
    jpeg_quality: u8,
}

impl FrameRenderer {
    pub fn new(config: &OutputConfig) -> Self {
        Self {
            annotator: FrameAnnotator::new(config),
            jpeg_quality: config.jpeg_quality,
        }
    }

    pub fn with_annotator(annotator: FrameAnnotator, jpeg_quality: u8) -> Self {
        Self {
            annotator,
            jpeg_quality,
        }
    }

    /// Annotate in place, compress, and base64-encode
    pub fn render(&self, frame: &mut Frame, boxes: &[BoundingBox]) -> Result<String> {
        self.annotator.annotate(&mut frame.image, boxes);
        let jpeg = encode_jpeg(&frame.image, self.jpeg_quality)?;
        Ok(encode_payload(&jpeg))
    }
}
