use crate::capture::domain::frame_source::Resolution;

/// Cadence of the live recognition loop.
pub const POLL_INTERVAL_MS: u64 = 1500;

/// Reduced capture size for poll ticks, to bound transcode and upload cost.
pub const POLL_CAPTURE_RESOLUTION: Resolution = Resolution::new(640, 360);

/// Full preview size, used for enrollment snapshots.
pub const ENROLL_CAPTURE_RESOLUTION: Resolution = Resolution::new(1280, 720);

/// Identify calls allowed in flight before ticks are skipped.
pub const MAX_IN_FLIGHT: usize = 4;

pub const DEFAULT_SERVER_URL: &str = "http://localhost:8000";
pub const ENROLL_PATH: &str = "/registrar";
pub const IDENTIFY_PATH: &str = "/reconocer";
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

pub const UPLOAD_FILE_NAME: &str = "capture.jpg";
pub const UPLOAD_FILE_FIELD: &str = "file";
pub const IDENTITY_FIELD: &str = "id_empleado";

pub const CAPTURE_MIME: &str = "image/jpeg";

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];
