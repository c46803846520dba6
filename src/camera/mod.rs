mod acquire;
#[cfg(feature = "camera")]
mod gst;
mod interface;
#[cfg(test)]
mod mock;

pub use acquire::{acquire, probe_camera_index, CAMERA_PROBE_COUNT};
#[cfg(feature = "camera")]
pub use gst::{GstCamera, GstCameraBackend};
pub use interface::{CameraBackend, CaptureDevice};
#[cfg(test)]
pub use mock::{ScriptedBackend, ScriptedCamera};
