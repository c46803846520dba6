use super::interface::{CameraBackend, CaptureDevice};
use crate::error::{CameraError, Result};
use crate::frame::Frame;
use async_trait::async_trait;
use image::{Rgb, RgbImage};
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Scripted camera backend for tests that run without real hardware.
///
/// Devices at `working` indices probe and open successfully; every opened
/// device yields `frames_per_device` solid-colour frames and then ends.
pub struct ScriptedBackend {
    working: HashSet<u32>,
    reopen_fails: bool,
    frames_per_device: usize,
    resolution: (u32, u32),
    probed: Mutex<Vec<u32>>,
    probes_released: AtomicUsize,
    releases: Arc<AtomicUsize>,
}

impl ScriptedBackend {
    pub fn new<I: IntoIterator<Item = u32>>(working: I, frames_per_device: usize) -> Self {
        Self {
            working: working.into_iter().collect(),
            reopen_fails: false,
            frames_per_device,
            resolution: (64, 48),
            probed: Mutex::new(Vec::new()),
            probes_released: AtomicUsize::new(0),
            releases: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Backend with no working devices
    pub fn empty() -> Self {
        Self::new(std::iter::empty(), 0)
    }

    /// Make `open` fail even for indices that probe successfully
    pub fn with_failing_reopen(mut self) -> Self {
        self.reopen_fails = true;
        self
    }

    /// Indices probed so far, in order
    pub fn probed(&self) -> Vec<u32> {
        self.probed.lock().map(|p| p.clone()).unwrap_or_default()
    }

    /// Number of probe handles opened and released again
    pub fn probes_released(&self) -> usize {
        self.probes_released.load(Ordering::SeqCst)
    }

    /// Number of opened devices that have been released
    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }
}

impl CameraBackend for ScriptedBackend {
    type Device = ScriptedCamera;

    fn name(&self) -> &'static str {
        "scripted"
    }

    fn probe(&self, index: u32) -> bool {
        if let Ok(mut probed) = self.probed.lock() {
            probed.push(index);
        }
        let opened = self.working.contains(&index);
        if opened {
            self.probes_released.fetch_add(1, Ordering::SeqCst);
        }
        opened
    }

    fn open(&self, index: u32) -> std::result::Result<ScriptedCamera, CameraError> {
        if self.reopen_fails || !self.working.contains(&index) {
            return Err(CameraError::DeviceOpen {
                index,
                details: "scripted device refused to open".to_string(),
            });
        }

        let (width, height) = self.resolution;
        let frames = (0..self.frames_per_device)
            .map(|i| {
                let shade = (i % 256) as u8;
                Frame::new(
                    i as u64,
                    RgbImage::from_pixel(width, height, Rgb([shade, shade, shade])),
                )
            })
            .collect();

        Ok(ScriptedCamera::with_release_counter(
            index,
            frames,
            Arc::clone(&self.releases),
        ))
    }
}

/// In-memory capture device that replays a fixed list of frames
pub struct ScriptedCamera {
    index: u32,
    frames: VecDeque<Frame>,
    reads: usize,
    released: bool,
    release_counter: Arc<AtomicUsize>,
}

impl ScriptedCamera {
    pub fn new(index: u32, frames: Vec<Frame>) -> Self {
        Self::with_release_counter(index, frames, Arc::new(AtomicUsize::new(0)))
    }

    pub fn with_release_counter(
        index: u32,
        frames: Vec<Frame>,
        release_counter: Arc<AtomicUsize>,
    ) -> Self {
        Self {
            index,
            frames: frames.into(),
            reads: 0,
            released: false,
            release_counter,
        }
    }

    /// `count` blank frames of the given size
    pub fn blank(index: u32, count: usize, width: u32, height: u32) -> Self {
        let frames = (0..count)
            .map(|i| Frame::new(i as u64, RgbImage::new(width, height)))
            .collect();
        Self::new(index, frames)
    }

    /// Shared counter incremented once per release
    pub fn release_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.release_counter)
    }

    /// Number of successful frame reads
    pub fn reads(&self) -> usize {
        self.reads
    }
}

#[async_trait]
impl CaptureDevice for ScriptedCamera {
    fn index(&self) -> u32 {
        self.index
    }

    async fn read_frame(&mut self) -> Result<Option<Frame>> {
        if self.released {
            return Ok(None);
        }
        let frame = self.frames.pop_front();
        if frame.is_some() {
            self.reads += 1;
        } else {
            debug!("Scripted camera {} exhausted", self.index);
        }
        Ok(frame)
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.release_counter.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn is_released(&self) -> bool {
        self.released
    }
}
