use crate::imaging::domain::encoded_image::EncodedImage;
use crate::recognition::domain::outcome::RecognitionOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Enroll,
    Recognize,
}

impl Tab {
    pub fn label(self) -> &'static str {
        match self {
            Tab::Enroll => "Enroll",
            Tab::Recognize => "Recognize",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayTone {
    Positive,
    Negative,
}

/// Banner drawn over the live preview while recognizing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overlay {
    pub message: String,
    pub tone: OverlayTone,
}

/// Everything the view binds to. Owned by a single controller; the core
/// components never touch it.
#[derive(Debug, Clone)]
pub struct KioskState {
    pub active_tab: Tab,
    pub identity_input: String,
    pub snapshot: Option<EncodedImage>,
    pub enrollment_message: Option<String>,
    pub enrollment_error: Option<String>,
    pub enrolling: bool,
    pub recognizing: bool,
    pub recognition: Option<RecognitionOutcome>,
}

impl Default for KioskState {
    fn default() -> Self {
        Self {
            active_tab: Tab::Recognize,
            identity_input: String::new(),
            snapshot: None,
            enrollment_message: None,
            enrollment_error: None,
            enrolling: false,
            recognizing: false,
            recognition: None,
        }
    }
}

impl KioskState {
    /// Clears every result shown on either tab.
    pub fn clear_results(&mut self) {
        self.snapshot = None;
        self.enrollment_message = None;
        self.enrollment_error = None;
        self.recognition = None;
    }

    pub fn overlay(&self) -> Option<Overlay> {
        if !self.recognizing {
            return None;
        }
        Some(match self.recognition.as_ref()? {
            RecognitionOutcome::Recognized { identity } => Overlay {
                message: format!("ID: {identity}"),
                tone: OverlayTone::Positive,
            },
            RecognitionOutcome::Unrecognized => Overlay {
                message: "Unknown".to_string(),
                tone: OverlayTone::Negative,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_recognize_tab() {
        let state = KioskState::default();
        assert_eq!(state.active_tab, Tab::Recognize);
        assert!(!state.recognizing);
        assert!(!state.enrolling);
    }

    #[test]
    fn test_no_overlay_when_idle_or_before_first_result() {
        let mut state = KioskState {
            recognition: Some(RecognitionOutcome::recognized(3)),
            ..KioskState::default()
        };
        assert_eq!(state.overlay(), None);

        state.recognizing = true;
        state.recognition = None;
        assert_eq!(state.overlay(), None);
    }

    #[test]
    fn test_overlay_for_recognized() {
        let state = KioskState {
            recognizing: true,
            recognition: Some(RecognitionOutcome::recognized(42)),
            ..KioskState::default()
        };
        assert_eq!(
            state.overlay(),
            Some(Overlay {
                message: "ID: 42".into(),
                tone: OverlayTone::Positive
            })
        );
    }

    #[test]
    fn test_overlay_for_unrecognized() {
        let state = KioskState {
            recognizing: true,
            recognition: Some(RecognitionOutcome::Unrecognized),
            ..KioskState::default()
        };
        let overlay = state.overlay().unwrap();
        assert_eq!(overlay.message, "Unknown");
        assert_eq!(overlay.tone, OverlayTone::Negative);
    }

    #[test]
    fn test_clear_results_keeps_input() {
        let mut state = KioskState {
            identity_input: "7".into(),
            snapshot: Some(EncodedImage::encode("image/jpeg", b"x")),
            enrollment_message: Some("ok".into()),
            enrollment_error: Some("bad".into()),
            recognition: Some(RecognitionOutcome::Unrecognized),
            ..KioskState::default()
        };
        state.clear_results();

        assert_eq!(state.identity_input, "7");
        assert!(state.snapshot.is_none());
        assert!(state.enrollment_message.is_none());
        assert!(state.enrollment_error.is_none());
        assert!(state.recognition.is_none());
    }

    #[test]
    fn test_tab_labels() {
        assert_eq!(Tab::Enroll.label(), "Enroll");
        assert_eq!(Tab::Recognize.label(), "Recognize");
    }
}
