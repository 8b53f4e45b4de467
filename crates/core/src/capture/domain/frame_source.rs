use crate::imaging::domain::encoded_image::EncodedImage;

/// Capture size requested from the device. Advisory only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Domain interface for the camera.
///
/// A missing frame is a normal outcome (device not attached or not ready)
/// and is reported as `None`, never as an error. Implementations may ignore
/// the resolution hint.
pub trait FrameSource: Send {
    fn capture(&mut self, hint: Option<Resolution>) -> Option<EncodedImage>;
}
