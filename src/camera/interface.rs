use crate::error::{CameraError, Result};
use crate::frame::Frame;
use async_trait::async_trait;

/// An open capture device owned by the frame pipeline
#[async_trait]
pub trait CaptureDevice: Send {
    /// Index the device was opened at
    fn index(&self) -> u32;

    /// Read the next frame.
    ///
    /// `Ok(None)` means the stream is over (disconnect, end of stream, read
    /// failure) and is a normal termination, not an error.
    async fn read_frame(&mut self) -> Result<Option<Frame>>;

    /// Release the underlying device. Calling it more than once is a no-op.
    fn release(&mut self);

    /// Whether `release` has already run
    fn is_released(&self) -> bool;
}

/// Platform capture backend able to probe and open devices by index
pub trait CameraBackend {
    type Device: CaptureDevice;

    /// Backend identifier for diagnostics
    fn name(&self) -> &'static str;

    /// Synchronously try to open `index` and release it again.
    /// Returns true when the device reported itself opened.
    fn probe(&self, index: u32) -> bool;

    /// Open `index` for streaming
    fn open(&self, index: u32) -> std::result::Result<Self::Device, CameraError>;
}
