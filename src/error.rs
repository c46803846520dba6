use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HumancamError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Camera error: {0}")]
    Camera(#[from] CameraError),

    #[error("Detection error: {details}")]
    Detection { details: String },

    #[error("Encoding error: {details}")]
    Encode { details: String },

    #[error("Frame output error: {0}")]
    Output(std::io::Error),

    #[error("Failed to write session log '{}': {details}", path.display())]
    SessionLog { path: PathBuf, details: String },

    #[error("System error: {message}")]
    System { message: String },
}

#[derive(Error, Debug)]
pub enum CameraError {
    #[error("No working camera found (probed indices 0..{probed})")]
    NoCameraFound { probed: u32 },

    #[error("Could not open camera at index {index}: {details}")]
    DeviceOpen { index: u32, details: String },

    #[error("Camera configuration error: {details}")]
    Configuration { details: String },

    #[error("Capture stream error: {details}")]
    CaptureStream { details: String },
}

impl HumancamError {
    pub fn system<S: Into<String>>(message: S) -> Self {
        Self::System {
            message: message.into(),
        }
    }

    pub fn detection<S: Into<String>>(details: S) -> Self {
        Self::Detection {
            details: details.into(),
        }
    }

    pub fn encode<S: Into<String>>(details: S) -> Self {
        Self::Encode {
            details: details.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, HumancamError>;
