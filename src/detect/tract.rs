use super::backend::Detector;
use super::yolo::{decode_predictions, non_max_suppression, YoloOutput};
use crate::error::{HumancamError, Result};
use crate::frame::{BoundingBox, DetectionFilter};
use image::imageops::{self, FilterType};
use image::RgbImage;
use std::path::Path;
use tract_onnx::prelude::*;
use tracing::{debug, info};

/// YOLOv8 ONNX detector executed with tract.
///
/// Frames are stretched to the square model input; boxes are scaled back
/// to the source image afterwards.
pub struct TractDetector {
    model: TypedRunnableModel<TypedModel>,
    input_size: u32,
    iou_threshold: f32,
}

impl TractDetector {
    /// Load an ONNX model from disk and prepare it for inference
    pub fn new<P: AsRef<Path>>(model_path: P, input_size: u32, iou_threshold: f32) -> Result<Self> {
        let model_path = model_path.as_ref();
        info!("Loading detection model from {}", model_path.display());

        let size = input_size as usize;
        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .map_err(|e| {
                HumancamError::detection(format!(
                    "failed to load ONNX model from {}: {}",
                    model_path.display(),
                    e
                ))
            })?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(f32::datum_type(), tvec!(1, 3, size, size)),
            )
            .and_then(|m| m.into_optimized())
            .and_then(|m| m.into_runnable())
            .map_err(|e| HumancamError::detection(format!("failed to prepare ONNX model: {}", e)))?;

        Ok(Self {
            model,
            input_size,
            iou_threshold,
        })
    }

    fn build_input(&self, image: &RgbImage) -> Tensor {
        let size = self.input_size;
        let resized = imageops::resize(image, size, size, FilterType::Triangle);

        tract_ndarray::Array4::from_shape_fn(
            (1, 3, size as usize, size as usize),
            |(_, channel, y, x)| resized.get_pixel(x as u32, y as u32)[channel] as f32 / 255.0,
        )
        .into_tensor()
    }
}

impl Detector for TractDetector {
    fn name(&self) -> &'static str {
        "tract"
    }

    fn detect(&mut self, image: &RgbImage, filter: &DetectionFilter) -> Result<Vec<BoundingBox>> {
        let input = self.build_input(image);
        let outputs = self
            .model
            .run(tvec!(input.into()))
            .map_err(|e| HumancamError::detection(format!("ONNX inference failed: {}", e)))?;

        let output = outputs
            .first()
            .ok_or_else(|| HumancamError::detection("model produced no outputs"))?;
        let view = output
            .to_array_view::<f32>()
            .map_err(|e| HumancamError::detection(format!("model output was not f32: {}", e)))?;

        let shape = view.shape().to_vec();
        if shape.len() != 3 || shape[0] != 1 {
            return Err(HumancamError::detection(format!(
                "unexpected model output shape {:?}",
                shape
            )));
        }

        let data: Vec<f32> = view.iter().copied().collect();
        let grid = YoloOutput::new(&data, shape[1], shape[2]).ok_or_else(|| {
            HumancamError::detection(format!("model output {:?} is not a YOLO grid", shape))
        })?;

        let scale = (
            image.width() as f32 / self.input_size as f32,
            image.height() as f32 / self.input_size as f32,
        );
        let boxes = non_max_suppression(
            decode_predictions(&grid, filter, scale),
            self.iou_threshold,
        );

        debug!("tract detector found {} boxes", boxes.len());
        Ok(boxes)
    }

    fn warm_up(&mut self) -> Result<()> {
        let blank = RgbImage::new(self.input_size, self.input_size);
        self.detect(&blank, &DetectionFilter::humans()).map(|_| ())
    }
}
