use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::Receiver;

use crate::capture::domain::frame_source::{FrameSource, Resolution};
use crate::capture::infrastructure::shared_frame_source::SharedFrameSource;
use crate::pipeline::enroll_face_use_case::{
    EnrollError, EnrollFaceUseCase, EnrollmentRecord, ENROLL_FAILED_MESSAGE,
};
use crate::pipeline::poll_logger::PollLogger;
use crate::pipeline::recognition_poller::{LoopHandle, PollerConfig, RecognitionPoller};
use crate::presentation::kiosk_state::{KioskState, Overlay, Tab};
use crate::recognition::domain::identity::Identity;
use crate::recognition::domain::recognition_service::RecognitionService;
use crate::shared::constants::{ENROLL_CAPTURE_RESOLUTION, POLL_INTERVAL_MS};

const MISSING_IDENTITY_MESSAGE: &str = "Please enter an identity.";
const CAPTURE_FAILED_MESSAGE: &str = "Could not capture an image from the camera.";

#[derive(Debug, Clone)]
pub struct KioskConfig {
    pub poll_interval: Duration,
    pub poller: PollerConfig,
    pub enroll_hint: Option<Resolution>,
}

impl Default for KioskConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(POLL_INTERVAL_MS),
            poller: PollerConfig::default(),
            enroll_hint: Some(ENROLL_CAPTURE_RESOLUTION),
        }
    }
}

type EnrollResult = Result<EnrollmentRecord, EnrollError>;

/// Mediates between user actions and the capture/recognition components,
/// and is the only writer of [`KioskState`].
pub struct Kiosk {
    state: KioskState,
    source: SharedFrameSource,
    poller: RecognitionPoller,
    enroller: Arc<EnrollFaceUseCase>,
    loop_handle: Option<LoopHandle>,
    pending: Option<Receiver<EnrollResult>>,
    /// Set when the tab changed under a pending enrollment.
    ignore_pending: bool,
    config: KioskConfig,
}

impl Kiosk {
    pub fn new(
        source: SharedFrameSource,
        service: Arc<dyn RecognitionService>,
        logger: Arc<dyn PollLogger>,
        config: KioskConfig,
    ) -> Self {
        let poller = RecognitionPoller::new(
            source.clone(),
            service.clone(),
            logger,
            config.poller.clone(),
        );
        Self {
            state: KioskState::default(),
            source,
            poller,
            enroller: Arc::new(EnrollFaceUseCase::new(service)),
            loop_handle: None,
            pending: None,
            ignore_pending: false,
            config,
        }
    }

    pub fn state(&self) -> &KioskState {
        &self.state
    }

    pub fn overlay(&self) -> Option<Overlay> {
        self.state.overlay()
    }

    pub fn poller(&self) -> &RecognitionPoller {
        &self.poller
    }

    pub fn set_identity_input(&mut self, input: impl Into<String>) {
        self.state.identity_input = input.into();
    }

    /// Switching tabs wipes every shown result and stops live recognition.
    /// An enrollment still in flight keeps `enrolling` set until it returns,
    /// but its result is not shown.
    pub fn select_tab(&mut self, tab: Tab) {
        self.state.clear_results();
        self.ignore_pending = self.pending.is_some();
        if self.state.recognizing {
            self.stop_recognition();
        }
        self.state.active_tab = tab;
    }

    pub fn toggle_recognition(&mut self) {
        if self.state.recognizing {
            self.stop_recognition();
        } else {
            self.loop_handle = Some(self.poller.start(self.config.poll_interval));
            self.state.recognizing = true;
            self.state.recognition = None;
        }
    }

    /// Validates the identity, captures a snapshot and sends it in the
    /// background. Returns `false` if nothing was sent: an enrollment is
    /// already pending, or a local check failed (see `enrollment_error`).
    pub fn begin_enrollment(&mut self) -> bool {
        if self.state.enrolling {
            return false;
        }

        let raw = self.state.identity_input.clone();
        if Identity::parse(&raw).is_err() {
            self.state.enrollment_error = Some(MISSING_IDENTITY_MESSAGE.to_string());
            return false;
        }

        let Some(frame) = self.source.capture(self.config.enroll_hint) else {
            self.state.enrollment_error = Some(CAPTURE_FAILED_MESSAGE.to_string());
            return false;
        };

        self.state.snapshot = Some(frame.clone());
        self.state.enrolling = true;
        self.state.enrollment_error = None;
        self.state.enrollment_message = None;

        let (tx, rx) = crossbeam_channel::bounded(1);
        let enroller = self.enroller.clone();
        thread::spawn(move || {
            let _ = tx.send(enroller.register(&raw, Some(frame)));
        });
        self.pending = Some(rx);
        self.ignore_pending = false;
        true
    }

    /// Pulls the latest published outcome and any finished enrollment into
    /// the state. Call once per frame of the view.
    pub fn refresh(&mut self) {
        if self.state.recognizing {
            self.state.recognition = self.poller.current();
        }
        let polled = self
            .pending
            .as_ref()
            .map(|rx| rx.try_recv().map_err(|e| e.is_disconnected()));
        self.settle(polled);
    }

    /// Blocks until the pending enrollment finishes or `timeout` elapses.
    /// Returns `true` if nothing is pending anymore.
    pub fn wait_for_enrollment(&mut self, timeout: Duration) -> bool {
        let polled = self
            .pending
            .as_ref()
            .map(|rx| rx.recv_timeout(timeout).map_err(|e| e.is_disconnected()));
        self.settle(polled);
        self.pending.is_none()
    }

    fn stop_recognition(&mut self) {
        if let Some(handle) = self.loop_handle.take() {
            self.poller.stop(handle);
        }
        self.state.recognizing = false;
        self.state.recognition = None;
    }

    /// `Err(true)` means the worker went away without answering.
    fn settle(&mut self, polled: Option<Result<EnrollResult, bool>>) {
        match polled {
            None | Some(Err(false)) => {}
            Some(_) if self.ignore_pending => {
                self.pending = None;
                self.ignore_pending = false;
                self.state.enrolling = false;
            }
            Some(Err(true)) => {
                self.pending = None;
                self.state.enrolling = false;
                self.state.enrollment_error = Some(ENROLL_FAILED_MESSAGE.to_string());
            }
            Some(Ok(result)) => {
                self.pending = None;
                self.apply_enrollment(result);
            }
        }
    }

    fn apply_enrollment(&mut self, result: EnrollResult) {
        self.state.enrolling = false;
        match result {
            Ok(record) => {
                self.state.snapshot = Some(record.snapshot);
                if record.outcome.is_success() {
                    self.state.enrollment_message = Some(record.outcome.text().to_string());
                } else {
                    self.state.enrollment_error = Some(record.outcome.text().to_string());
                }
            }
            Err(e) => {
                self.state.enrollment_error = Some(match e {
                    EnrollError::Validation(_) => MISSING_IDENTITY_MESSAGE.to_string(),
                    EnrollError::Capture => CAPTURE_FAILED_MESSAGE.to_string(),
                    EnrollError::Transcode(_) => e.to_string(),
                });
            }
        }
    }
}
