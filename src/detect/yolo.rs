use crate::frame::{BoundingBox, DetectionFilter, ObjectClass};
use std::cmp::Ordering;

/// Prediction grid exported by YOLOv8 heads: `[1, 4 + classes, anchors]`
#[derive(Debug, Clone, Copy)]
pub struct YoloOutput<'a> {
    pub data: &'a [f32],
    pub channels: usize,
    pub anchors: usize,
}

impl<'a> YoloOutput<'a> {
    pub fn new(data: &'a [f32], channels: usize, anchors: usize) -> Option<Self> {
        if channels <= 4 || data.len() != channels * anchors {
            return None;
        }
        Some(Self {
            data,
            channels,
            anchors,
        })
    }

    fn value(&self, channel: usize, anchor: usize) -> f32 {
        self.data[channel * self.anchors + anchor]
    }

    /// Best-scoring class for an anchor
    fn best_class(&self, anchor: usize) -> (u16, f32) {
        (4..self.channels)
            .map(|c| ((c - 4) as u16, self.value(c, anchor)))
            .fold((0, f32::NEG_INFINITY), |best, candidate| {
                if candidate.1 > best.1 {
                    candidate
                } else {
                    best
                }
            })
    }
}

/// Decode raw predictions into filtered boxes scaled to the source image.
///
/// `scale` maps model-input pixels to source pixels per axis.
pub fn decode_predictions(
    output: &YoloOutput<'_>,
    filter: &DetectionFilter,
    scale: (f32, f32),
) -> Vec<BoundingBox> {
    let (sx, sy) = scale;

    (0..output.anchors)
        .filter_map(|anchor| {
            let (class_id, confidence) = output.best_class(anchor);
            let cx = output.value(0, anchor);
            let cy = output.value(1, anchor);
            let w = output.value(2, anchor);
            let h = output.value(3, anchor);

            let bbox = BoundingBox {
                x: (cx - w / 2.0) * sx,
                y: (cy - h / 2.0) * sy,
                width: w * sx,
                height: h * sy,
                confidence,
                class: ObjectClass::from_coco(class_id),
            };
            filter.accepts(&bbox).then_some(bbox)
        })
        .collect()
}

/// Greedy non-maximum suppression, highest confidence first
pub fn non_max_suppression(mut boxes: Vec<BoundingBox>, iou_threshold: f32) -> Vec<BoundingBox> {
    boxes.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(Ordering::Equal)
    });

    let mut kept: Vec<BoundingBox> = Vec::with_capacity(boxes.len());
    for candidate in boxes {
        let overlaps = kept
            .iter()
            .any(|k| k.class == candidate.class && k.iou(&candidate) > iou_threshold);
        if !overlaps {
            kept.push(candidate);
        }
    }
    kept
}
