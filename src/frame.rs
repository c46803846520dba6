use image::RgbImage;

/// Minimum confidence for a detection to count as a person
pub const PERSON_CONFIDENCE_THRESHOLD: f32 = 0.5;

/// COCO class id of "person"
const COCO_PERSON: u16 = 0;

/// A single captured image. Lives for one pipeline iteration only.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Monotonic capture sequence number
    pub id: u64,
    /// Decoded RGB pixels
    pub image: RgbImage,
}

impl Frame {
    pub fn new(id: u64, image: RgbImage) -> Self {
        Self { id, image }
    }
}

/// Object classes the detector can report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectClass {
    Person,
    Other(u16),
}

impl ObjectClass {
    pub fn from_coco(id: u16) -> Self {
        if id == COCO_PERSON {
            ObjectClass::Person
        } else {
            ObjectClass::Other(id)
        }
    }

    pub fn label(&self) -> String {
        match self {
            ObjectClass::Person => "person".to_string(),
            ObjectClass::Other(id) => format!("class {}", id),
        }
    }
}

/// Axis-aligned box in source-image pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub confidence: f32,
    pub class: ObjectClass,
}

impl BoundingBox {
    pub fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Intersection over union with another box
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = (self.x + self.width).min(other.x + other.width);
        let bottom = (self.y + self.height).min(other.y + other.height);

        let intersection = (right - left).max(0.0) * (bottom - top).max(0.0);
        let union = self.area() + other.area() - intersection;
        if union <= 0.0 {
            0.0
        } else {
            intersection / union
        }
    }
}

/// Class and confidence restriction handed to the detector
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionFilter {
    pub class: ObjectClass,
    pub min_confidence: f32,
}

impl DetectionFilter {
    /// People only, confidence >= 0.5
    pub const fn humans() -> Self {
        Self {
            class: ObjectClass::Person,
            min_confidence: PERSON_CONFIDENCE_THRESHOLD,
        }
    }

    pub fn accepts(&self, bbox: &BoundingBox) -> bool {
        bbox.class == self.class && bbox.confidence >= self.min_confidence
    }
}
