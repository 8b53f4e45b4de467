use crate::recognition::domain::identity::Identity;

/// Result of one identify call; the unit of state the poll loop publishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionOutcome {
    Recognized { identity: Identity },
    Unrecognized,
}

impl RecognitionOutcome {
    pub fn recognized(identity: impl Into<Identity>) -> Self {
        RecognitionOutcome::Recognized {
            identity: identity.into(),
        }
    }

    pub fn is_recognized(&self) -> bool {
        matches!(self, RecognitionOutcome::Recognized { .. })
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            RecognitionOutcome::Recognized { identity } => Some(identity),
            RecognitionOutcome::Unrecognized => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrollmentOutcome {
    Success { message: String },
    Failure { reason: String },
}

impl EnrollmentOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, EnrollmentOutcome::Success { .. })
    }

    /// The text shown to the operator, whichever way it went.
    pub fn text(&self) -> &str {
        match self {
            EnrollmentOutcome::Success { message } => message,
            EnrollmentOutcome::Failure { reason } => reason,
        }
    }
}
