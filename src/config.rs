use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HumancamConfig {
    pub camera: CameraConfig,
    pub detector: DetectorConfig,
    pub output: OutputConfig,
    pub session: SessionConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CameraConfig {
    /// Requested capture resolution (width, height)
    #[serde(default = "default_camera_resolution")]
    pub resolution: (u32, u32),

    /// Requested capture frame rate
    #[serde(default = "default_camera_fps")]
    pub fps: u32,

    /// How long a single frame read may block before the stream is considered ended
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DetectorKind {
    /// YOLOv8 ONNX model executed with tract
    Tract,
    /// Reports no detections; frames are streamed unannotated
    Stub,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DetectorConfig {
    #[serde(default = "default_detector_backend")]
    pub backend: DetectorKind,

    /// Path to the ONNX model file
    #[serde(default = "default_model_path")]
    pub model_path: String,

    /// Square model input size in pixels
    #[serde(default = "default_input_size")]
    pub input_size: u32,

    /// Overlap above which lower-scored boxes are suppressed
    #[serde(default = "default_iou_threshold")]
    pub iou_threshold: f32,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct OutputConfig {
    /// JPEG quality (1-100)
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,

    /// Bounding box outline thickness in pixels
    #[serde(default = "default_box_thickness")]
    pub box_thickness: u32,

    /// TrueType font used for box labels; labels are skipped when it cannot be loaded
    #[serde(default = "default_label_font_path")]
    pub label_font_path: String,

    #[serde(default = "default_label_font_size")]
    pub label_font_size: f32,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SessionConfig {
    /// CSV file receiving one summary row per session
    #[serde(default = "default_log_path")]
    pub log_path: String,
}

impl HumancamConfig {
    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let settings = Config::builder()
            .set_default(
                "camera.resolution",
                vec![default_camera_resolution().0, default_camera_resolution().1],
            )?
            .set_default("camera.fps", default_camera_fps())?
            .set_default("camera.read_timeout_ms", default_read_timeout_ms())?
            .set_default("detector.backend", "tract")?
            .set_default("detector.model_path", default_model_path())?
            .set_default("detector.input_size", default_input_size())?
            .set_default("detector.iou_threshold", default_iou_threshold() as f64)?
            .set_default("output.jpeg_quality", default_jpeg_quality() as u64)?
            .set_default("output.box_thickness", default_box_thickness())?
            .set_default("output.label_font_path", default_label_font_path())?
            .set_default("output.label_font_size", default_label_font_size() as f64)?
            .set_default("session.log_path", default_log_path())?
            // Add configuration file (optional)
            .add_source(File::with_name(&path_str).required(false))
            // HUMANCAM_SESSION__LOG_PATH=... style overrides
            .add_source(
                Environment::with_prefix("HUMANCAM")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: HumancamConfig = settings.try_deserialize()?;

        info!("Configuration loaded successfully");
        debug!("Final configuration: {:#?}", config);

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.camera.resolution.0 == 0 || self.camera.resolution.1 == 0 {
            return Err(ConfigError::Message(
                "Camera resolution must be greater than 0".to_string(),
            ));
        }

        if self.camera.fps == 0 {
            return Err(ConfigError::Message(
                "Camera fps must be greater than 0".to_string(),
            ));
        }

        if self.camera.read_timeout_ms == 0 {
            return Err(ConfigError::Message(
                "Camera read_timeout_ms must be greater than 0".to_string(),
            ));
        }

        if self.detector.input_size == 0 {
            return Err(ConfigError::Message(
                "Detector input_size must be greater than 0".to_string(),
            ));
        }

        if !(self.detector.iou_threshold > 0.0 && self.detector.iou_threshold <= 1.0) {
            return Err(ConfigError::Message(
                "Detector iou_threshold must be in (0, 1]".to_string(),
            ));
        }

        if !(1..=100).contains(&self.output.jpeg_quality) {
            return Err(ConfigError::Message(
                "Output jpeg_quality must be between 1 and 100".to_string(),
            ));
        }

        if self.session.log_path.trim().is_empty() {
            return Err(ConfigError::Message(
                "Session log_path must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for HumancamConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig {
                resolution: default_camera_resolution(),
                fps: default_camera_fps(),
                read_timeout_ms: default_read_timeout_ms(),
            },
            detector: DetectorConfig {
                backend: default_detector_backend(),
                model_path: default_model_path(),
                input_size: default_input_size(),
                iou_threshold: default_iou_threshold(),
            },
            output: OutputConfig {
                jpeg_quality: default_jpeg_quality(),
                box_thickness: default_box_thickness(),
                label_font_path: default_label_font_path(),
                label_font_size: default_label_font_size(),
            },
            session: SessionConfig {
                log_path: default_log_path(),
            },
        }
    }
}

// Default value functions
fn default_camera_resolution() -> (u32, u32) {
    (640, 480)
}
fn default_camera_fps() -> u32 {
    30
}
fn default_read_timeout_ms() -> u64 {
    5000
}

fn default_detector_backend() -> DetectorKind {
    DetectorKind::Tract
}
fn default_model_path() -> String {
    "yolov8n.onnx".to_string()
}
fn default_input_size() -> u32 {
    640
}
fn default_iou_threshold() -> f32 {
    0.7
}

fn default_jpeg_quality() -> u8 {
    95
}
fn default_box_thickness() -> u32 {
    2
}
fn default_label_font_path() -> String {
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf".to_string()
}
fn default_label_font_size() -> f32 {
    16.0
}

fn default_log_path() -> String {
    "log_report.csv".to_string()
}
