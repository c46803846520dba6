use crate::config::OutputConfig;
use crate::frame::BoundingBox;
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use rusttype::{Font, Scale};
use std::fs;
use tracing::{debug, warn};

const BOX_COLOR: Rgb<u8> = Rgb([0, 200, 60]);
const LABEL_TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

/// Burns detection boxes, and labels when a font is available, into frames
pub struct FrameAnnotator {
    thickness: u32,
    font: Option<Font<'static>>,
    scale: Scale,
}

impl FrameAnnotator {
    pub fn new(config: &OutputConfig) -> Self {
        let font = load_font(&config.label_font_path);
        Self {
            thickness: config.box_thickness.max(1),
            font,
            scale: Scale::uniform(config.label_font_size),
        }
    }

    /// Annotator that draws outlines only
    pub fn without_labels(thickness: u32) -> Self {
        Self {
            thickness: thickness.max(1),
            font: None,
            scale: Scale::uniform(16.0),
        }
    }

    pub fn has_labels(&self) -> bool {
        self.font.is_some()
    }

    pub fn annotate(&self, image: &mut RgbImage, boxes: &[BoundingBox]) {
        for bbox in boxes {
            let Some(rect) = clamp_to_image(bbox, image.width(), image.height()) else {
                continue;
            };

            for inset in 0..self.thickness {
                let (w, h) = (rect.width(), rect.height());
                if w <= inset * 2 || h <= inset * 2 {
                    break;
                }
                let ring = Rect::at(rect.left() + inset as i32, rect.top() + inset as i32)
                    .of_size(w - inset * 2, h - inset * 2);
                draw_hollow_rect_mut(image, ring, BOX_COLOR);
            }

            if let Some(font) = &self.font {
                self.draw_label(image, font, &rect, bbox);
            }
        }
    }

    fn draw_label(&self, image: &mut RgbImage, font: &Font<'static>, rect: &Rect, bbox: &BoundingBox) {
        let text = format!("{} {:.2}", bbox.class.label(), bbox.confidence);
        let (text_width, text_height) = text_size(self.scale, font, &text);
        let label_width = (text_width.max(1) + 6) as u32;
        let label_height = (text_height.max(1) + 4) as u32;

        // Above the box when there is room, otherwise just inside its top edge
        let top = if rect.top() >= label_height as i32 {
            rect.top() - label_height as i32
        } else {
            rect.top()
        };

        draw_filled_rect_mut(
            image,
            Rect::at(rect.left(), top).of_size(label_width, label_height),
            BOX_COLOR,
        );
        draw_text_mut(
            image,
            LABEL_TEXT_COLOR,
            rect.left() + 3,
            top + 2,
            self.scale,
            font,
            &text,
        );
    }
}

fn load_font(path: &str) -> Option<Font<'static>> {
    let data = match fs::read(path) {
        Ok(data) => data,
        Err(e) => {
            warn!("Label font '{}' unavailable ({}); drawing boxes without labels", path, e);
            return None;
        }
    };

    match Font::try_from_vec(data) {
        Some(font) => {
            debug!("Loaded label font {}", path);
            Some(font)
        }
        None => {
            warn!("Failed to parse label font '{}'; drawing boxes without labels", path);
            None
        }
    }
}

/// Integer rectangle for a box, clipped to the image. None when nothing is visible.
fn clamp_to_image(bbox: &BoundingBox, width: u32, height: u32) -> Option<Rect> {
    let left = bbox.x.max(0.0).round() as i64;
    let top = bbox.y.max(0.0).round() as i64;
    let right = (bbox.x + bbox.width).min(width as f32).round() as i64;
    let bottom = (bbox.y + bbox.height).min(height as f32).round() as i64;

    if right <= left || bottom <= top {
        return None;
    }

    Some(
        Rect::at(left as i32, top as i32).of_size((right - left) as u32, (bottom - top) as u32),
    )
}
