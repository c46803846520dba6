use super::interface::{CameraBackend, CaptureDevice};
use crate::config::CameraConfig;
use crate::error::{CameraError, Result};
use crate::frame::Frame;
use async_trait::async_trait;
use gstreamer::prelude::*;
use gstreamer::Pipeline;
use gstreamer_app::AppSink;
use gstreamer_video::VideoInfo;
use image::RgbImage;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

/// GStreamer capture backend using the platform's native camera source
pub struct GstCameraBackend {
    config: CameraConfig,
}

impl GstCameraBackend {
    pub fn new(config: CameraConfig) -> std::result::Result<Self, CameraError> {
        gstreamer::init().map_err(|e| CameraError::Configuration {
            details: format!("Failed to initialize GStreamer: {}", e),
        })?;

        Ok(Self { config })
    }

    fn build_pipeline(&self, index: u32) -> std::result::Result<(Pipeline, AppSink), CameraError> {
        let desc = pipeline_description(index, &self.config)?;
        debug!("Creating GStreamer pipeline: {}", desc);

        let pipeline = gstreamer::parse::launch(&desc)
            .map_err(|e| CameraError::Configuration {
                details: format!("Failed to create pipeline: {}", e),
            })?
            .downcast::<Pipeline>()
            .map_err(|_| CameraError::Configuration {
                details: "Failed to downcast to Pipeline".to_string(),
            })?;

        let appsink = pipeline
            .by_name("sink")
            .ok_or_else(|| CameraError::Configuration {
                details: "Pipeline has no appsink".to_string(),
            })?
            .downcast::<AppSink>()
            .map_err(|_| CameraError::Configuration {
                details: "Failed to downcast to AppSink".to_string(),
            })?;

        Ok((pipeline, appsink))
    }
}

/// Pipeline description for a device index: native source, rate and
/// format conversion to the configured RGB caps, then a latest-frame appsink
fn pipeline_description(index: u32, config: &CameraConfig) -> std::result::Result<String, CameraError> {
    let (width, height) = config.resolution;
    let source = source_element(index)?;

    Ok(format!(
        "{} ! videorate ! videoconvert ! videoscale ! \
         video/x-raw,format=RGB,width={},height={},framerate={}/1 ! \
         appsink name=sink sync=false max-buffers=1 drop=true enable-last-sample=false emit-signals=false",
        source, width, height, config.fps
    ))
}

#[cfg(target_os = "linux")]
fn source_element(index: u32) -> std::result::Result<String, CameraError> {
    Ok(format!("v4l2src device=/dev/video{}", index))
}

#[cfg(target_os = "macos")]
fn source_element(index: u32) -> std::result::Result<String, CameraError> {
    Ok(format!("avfvideosrc device-index={}", index))
}

#[cfg(target_os = "windows")]
fn source_element(index: u32) -> std::result::Result<String, CameraError> {
    Ok(format!("ksvideosrc device-index={}", index))
}

#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
fn source_element(_index: u32) -> std::result::Result<String, CameraError> {
    Err(CameraError::Configuration {
        details: "No camera source element for this platform".to_string(),
    })
}

impl CameraBackend for GstCameraBackend {
    type Device = GstCamera;

    fn name(&self) -> &'static str {
        "gstreamer"
    }

    fn probe(&self, index: u32) -> bool {
        let (pipeline, _appsink) = match self.build_pipeline(index) {
            Ok(parts) => parts,
            Err(e) => {
                debug!("Camera {} probe failed: {}", index, e);
                return false;
            }
        };

        // READY makes the source open its device
        let opened = pipeline.set_state(gstreamer::State::Ready).is_ok();
        let _ = pipeline.set_state(gstreamer::State::Null);
        opened
    }

    fn open(&self, index: u32) -> std::result::Result<GstCamera, CameraError> {
        let (pipeline, appsink) =
            self.build_pipeline(index)
                .map_err(|e| CameraError::DeviceOpen {
                    index,
                    details: e.to_string(),
                })?;

        if let Err(e) = pipeline.set_state(gstreamer::State::Playing) {
            let _ = pipeline.set_state(gstreamer::State::Null);
            return Err(CameraError::DeviceOpen {
                index,
                details: format!("Failed to start pipeline: {}", e),
            });
        }

        info!(
            "Camera {} opened ({}x{} @ {}fps requested)",
            index, self.config.resolution.0, self.config.resolution.1, self.config.fps
        );

        Ok(GstCamera {
            index,
            pipeline,
            appsink,
            read_timeout: Duration::from_millis(self.config.read_timeout_ms),
            frame_counter: 0,
            released: false,
        })
    }
}

/// Streaming GStreamer camera
pub struct GstCamera {
    index: u32,
    pipeline: Pipeline,
    appsink: AppSink,
    read_timeout: Duration,
    frame_counter: u64,
    released: bool,
}

impl GstCamera {
    /// Convert a pulled RGB sample into a frame, honouring row stride
    fn sample_to_frame(&mut self, sample: gstreamer::Sample) -> Result<Frame> {
        let buffer = sample.buffer().ok_or_else(|| CameraError::CaptureStream {
            details: "No buffer in sample".to_string(),
        })?;

        let caps = sample.caps().ok_or_else(|| CameraError::CaptureStream {
            details: "No caps in sample".to_string(),
        })?;

        let video_info = VideoInfo::from_caps(caps).map_err(|e| CameraError::CaptureStream {
            details: format!("Failed to get video info: {}", e),
        })?;

        let width = video_info.width();
        let height = video_info.height();
        let stride = video_info.stride()[0] as usize;
        let row_len = width as usize * 3;

        let map = buffer
            .map_readable()
            .map_err(|e| CameraError::CaptureStream {
                details: format!("Failed to map buffer: {}", e),
            })?;
        let data = map.as_slice();

        if height == 0
            || stride < row_len
            || data.len() < stride * (height as usize - 1) + row_len
        {
            return Err(CameraError::CaptureStream {
                details: format!(
                    "Buffer of {} bytes too small for {}x{} RGB (stride {})",
                    data.len(),
                    width,
                    height,
                    stride
                ),
            }
            .into());
        }

        let mut pixels = Vec::with_capacity(row_len * height as usize);
        for row in data.chunks(stride).take(height as usize) {
            pixels.extend_from_slice(&row[..row_len]);
        }

        let image = RgbImage::from_raw(width, height, pixels).ok_or_else(|| {
            CameraError::CaptureStream {
                details: "Pixel buffer does not match frame dimensions".to_string(),
            }
        })?;

        let id = self.frame_counter;
        self.frame_counter += 1;
        trace!("Captured frame {} ({}x{})", id, width, height);

        Ok(Frame::new(id, image))
    }
}

#[async_trait]
impl CaptureDevice for GstCamera {
    fn index(&self) -> u32 {
        self.index
    }

    async fn read_frame(&mut self) -> Result<Option<Frame>> {
        if self.released {
            return Ok(None);
        }

        let appsink = self.appsink.clone();
        let timeout = gstreamer::ClockTime::from_mseconds(self.read_timeout.as_millis() as u64);

        let sample = tokio::task::spawn_blocking(move || {
            let sample = appsink.try_pull_sample(timeout);
            (sample, appsink.is_eos())
        })
        .await
        .map_err(|e| CameraError::CaptureStream {
            details: format!("Frame read task failed: {}", e),
        })?;

        match sample {
            (Some(sample), _) => match self.sample_to_frame(sample) {
                Ok(frame) => Ok(Some(frame)),
                Err(e) => {
                    warn!("Camera {} produced an unreadable frame: {}", self.index, e);
                    Ok(None)
                }
            },
            (None, true) => {
                info!("Camera {} reached end of stream", self.index);
                Ok(None)
            }
            (None, false) => {
                warn!(
                    "No frame from camera {} within {:?}; treating as disconnected",
                    self.index, self.read_timeout
                );
                Ok(None)
            }
        }
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Err(e) = self.pipeline.set_state(gstreamer::State::Null) {
            warn!("Failed to stop camera {} pipeline: {}", self.index, e);
        }
        info!("Camera {} released", self.index);
    }

    fn is_released(&self) -> bool {
        self.released
    }
}

impl Drop for GstCamera {
    fn drop(&mut self) {
        self.release();
    }
}
