use std::sync::{Arc, Mutex};

use crate::capture::domain::frame_source::{FrameSource, Resolution};
use crate::imaging::domain::encoded_image::EncodedImage;

/// Cloneable handle to a single camera that serializes captures.
///
/// The poll loop and enrollment both capture through clones of the same
/// handle, so at most one capture is ever in flight against the device.
#[derive(Clone)]
pub struct SharedFrameSource {
    inner: Arc<Mutex<Box<dyn FrameSource>>>,
}

impl SharedFrameSource {
    pub fn new(source: Box<dyn FrameSource>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(source)),
        }
    }
}

impl FrameSource for SharedFrameSource {
    fn capture(&mut self, hint: Option<Resolution>) -> Option<EncodedImage> {
        let mut source = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        source.capture(hint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    struct OverlapDetectingSource {
        busy: Arc<AtomicBool>,
        overlaps: Arc<AtomicUsize>,
        captures: Arc<AtomicUsize>,
    }

    impl FrameSource for OverlapDetectingSource {
        fn capture(&mut self, _hint: Option<Resolution>) -> Option<EncodedImage> {
            if self.busy.swap(true, Ordering::SeqCst) {
                self.overlaps.fetch_add(1, Ordering::SeqCst);
            }
            thread::sleep(Duration::from_millis(2));
            self.captures.fetch_add(1, Ordering::SeqCst);
            self.busy.store(false, Ordering::SeqCst);
            Some(EncodedImage::encode("image/jpeg", b"frame"))
        }
    }

    struct HintRecorder {
        hints: Arc<Mutex<Vec<Option<Resolution>>>>,
    }

    impl FrameSource for HintRecorder {
        fn capture(&mut self, hint: Option<Resolution>) -> Option<EncodedImage> {
            self.hints.lock().unwrap().push(hint);
            None
        }
    }

    #[test]
    fn test_concurrent_captures_are_serialized() {
        let overlaps = Arc::new(AtomicUsize::new(0));
        let captures = Arc::new(AtomicUsize::new(0));
        let shared = SharedFrameSource::new(Box::new(OverlapDetectingSource {
            busy: Arc::new(AtomicBool::new(false)),
            overlaps: overlaps.clone(),
            captures: captures.clone(),
        }));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let mut source = shared.clone();
                thread::spawn(move || {
                    for _ in 0..5 {
                        assert!(source.capture(None).is_some());
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(captures.load(Ordering::SeqCst), 20);
        assert_eq!(overlaps.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_forwards_hint_and_none() {
        let hints = Arc::new(Mutex::new(Vec::new()));
        let mut shared = SharedFrameSource::new(Box::new(HintRecorder {
            hints: hints.clone(),
        }));

        assert!(shared.capture(Some(Resolution::new(640, 360))).is_none());
        assert!(shared.capture(None).is_none());

        assert_eq!(
            *hints.lock().unwrap(),
            vec![Some(Resolution::new(640, 360)), None]
        );
    }
}
