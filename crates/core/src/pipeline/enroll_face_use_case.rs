use std::sync::Arc;

use thiserror::Error;

use crate::imaging::domain::encoded_image::EncodedImage;
use crate::imaging::domain::image_transcoder::{transcode, TranscodeError};
use crate::recognition::domain::identity::{Identity, ValidationError};
use crate::recognition::domain::outcome::EnrollmentOutcome;
use crate::recognition::domain::recognition_service::RecognitionService;

pub const ENROLL_FAILED_MESSAGE: &str = "An error occurred while enrolling.";

#[derive(Error, Debug)]
pub enum EnrollError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("could not capture an image from the camera")]
    Capture,
    #[error("captured image is unusable: {0}")]
    Transcode(#[from] TranscodeError),
}

/// The snapshot that was sent, kept for display, and what the backend said.
#[derive(Debug, Clone)]
pub struct EnrollmentRecord {
    pub snapshot: EncodedImage,
    pub outcome: EnrollmentOutcome,
}

/// One-shot enrollment: validate → transcode → enroll.
///
/// Local precondition failures are errors and never reach the backend.
/// Backend and transport failures become `EnrollmentOutcome::Failure`,
/// carrying the service's detail verbatim when it sent one. Nothing is
/// retried; callers must not run two enrollments at once.
pub struct EnrollFaceUseCase {
    service: Arc<dyn RecognitionService>,
}

impl EnrollFaceUseCase {
    pub fn new(service: Arc<dyn RecognitionService>) -> Self {
        Self { service }
    }

    pub fn register(
        &self,
        raw_identity: &str,
        frame: Option<EncodedImage>,
    ) -> Result<EnrollmentRecord, EnrollError> {
        let identity = Identity::parse(raw_identity)?;
        let snapshot = frame.ok_or(EnrollError::Capture)?;
        let image = transcode(&snapshot)?;

        let outcome = match self.service.enroll(&identity, &image) {
            Ok(outcome) => {
                log::info!("Enrolled identity {identity}");
                outcome
            }
            Err(e) => {
                log::warn!("Enrollment of identity {identity} failed: {e}");
                EnrollmentOutcome::Failure {
                    reason: e.detail().unwrap_or(ENROLL_FAILED_MESSAGE).to_string(),
                }
            }
        };

        Ok(EnrollmentRecord { snapshot, outcome })
    }
}
