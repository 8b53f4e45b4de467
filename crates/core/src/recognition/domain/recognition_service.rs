use thiserror::Error;

use crate::imaging::domain::encoded_image::BinaryImage;
use crate::recognition::domain::identity::Identity;
use crate::recognition::domain::outcome::{EnrollmentOutcome, RecognitionOutcome};

#[derive(Error, Debug)]
pub enum RecognitionError {
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("service rejected request ({code}): {}", .detail.as_deref().unwrap_or("no detail"))]
    Service { code: u16, detail: Option<String> },
}

impl RecognitionError {
    /// Human-facing reason supplied by the backend, if any.
    pub fn detail(&self) -> Option<&str> {
        match self {
            RecognitionError::Service { detail, .. } => detail.as_deref(),
            RecognitionError::Transport { .. } => None,
        }
    }
}

/// Domain interface for the remote recognition backend.
///
/// One request per call, no retries, no state carried between calls.
pub trait RecognitionService: Send + Sync {
    fn identify(&self, image: &BinaryImage) -> Result<RecognitionOutcome, RecognitionError>;

    fn enroll(
        &self,
        identity: &Identity,
        image: &BinaryImage,
    ) -> Result<EnrollmentOutcome, RecognitionError>;
}
