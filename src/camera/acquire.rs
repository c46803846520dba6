use super::interface::CameraBackend;
use crate::error::CameraError;
use tracing::{debug, info};

/// Number of device indices probed, starting at 0
pub const CAMERA_PROBE_COUNT: u32 = 5;

/// Find the first device index in 0..5 that opens.
///
/// Probe handles are released by the backend before this returns; no
/// scoring happens among multiple working devices.
pub fn probe_camera_index<B: CameraBackend + ?Sized>(backend: &B) -> Result<u32, CameraError> {
    for index in 0..CAMERA_PROBE_COUNT {
        debug!("Probing camera index {} ({})", index, backend.name());
        if backend.probe(index) {
            info!("Found working camera at index: {}", index);
            return Ok(index);
        }
    }

    Err(CameraError::NoCameraFound {
        probed: CAMERA_PROBE_COUNT,
    })
}

/// Probe for a working device and re-open it for streaming
pub fn acquire<B: CameraBackend + ?Sized>(backend: &B) -> Result<B::Device, CameraError> {
    let index = probe_camera_index(backend)?;
    backend.open(index)
}
