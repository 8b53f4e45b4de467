use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{select, Sender};

use crate::capture::domain::frame_source::{FrameSource, Resolution};
use crate::capture::infrastructure::shared_frame_source::SharedFrameSource;
use crate::imaging::domain::image_transcoder::transcode;
use crate::pipeline::outcome_board::{Acceptance, OutcomeBoard, Ticket};
use crate::pipeline::poll_logger::{PollEvent, PollLogger};
use crate::recognition::domain::outcome::RecognitionOutcome;
use crate::recognition::domain::recognition_service::RecognitionService;
use crate::shared::constants::{MAX_IN_FLIGHT, POLL_CAPTURE_RESOLUTION};

/// Tuning for the live recognition loop.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    pub capture_hint: Option<Resolution>,
    /// Ticks are skipped while this many identify calls are outstanding.
    pub max_in_flight: usize,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            capture_hint: Some(POLL_CAPTURE_RESOLUTION),
            max_in_flight: MAX_IN_FLIGHT,
        }
    }
}

/// Token for one active run of the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopHandle {
    run: u64,
}

struct PollShared {
    source: SharedFrameSource,
    service: Arc<dyn RecognitionService>,
    logger: Arc<dyn PollLogger>,
    board: OutcomeBoard,
    in_flight: AtomicUsize,
    config: PollerConfig,
}

struct Timer {
    run: u64,
    stop_tx: Sender<()>,
    handle: thread::JoinHandle<()>,
}

/// Live recognition loop: `Idle → Running → Idle`.
///
/// Layout: `timer → [tick worker: capture → transcode → identify] → board`
///
/// The timer fires on a fixed cadence regardless of how long earlier ticks
/// take; each tick runs on its own thread so a slow backend never delays
/// the next capture. Overlapping calls are resolved by the [`OutcomeBoard`]
/// (last-dispatched wins), and the number of outstanding calls is capped.
/// Failed ticks degrade to `Unrecognized` and never stop the loop.
pub struct RecognitionPoller {
    shared: Arc<PollShared>,
    timer: Mutex<Option<Timer>>,
}

impl RecognitionPoller {
    pub fn new(
        source: SharedFrameSource,
        service: Arc<dyn RecognitionService>,
        logger: Arc<dyn PollLogger>,
        config: PollerConfig,
    ) -> Self {
        Self {
            shared: Arc::new(PollShared {
                source,
                service,
                logger,
                board: OutcomeBoard::new(),
                in_flight: AtomicUsize::new(0),
                config,
            }),
            timer: Mutex::new(None),
        }
    }

    /// Starts ticking every `interval`. If already running, returns the
    /// active handle and changes nothing.
    pub fn start(&self, interval: Duration) -> LoopHandle {
        let mut timer = self.lock_timer();
        if let Some(active) = timer.as_ref() {
            return LoopHandle { run: active.run };
        }

        let run = self.shared.board.open();
        let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(0);
        let ticker = crossbeam_channel::tick(interval);
        let shared = self.shared.clone();

        let handle = thread::spawn(move || loop {
            let stopped = select! {
                recv(stop_rx) -> _ => true,
                recv(ticker) -> _ => {
                    dispatch_tick(&shared);
                    false
                }
            };
            if stopped {
                break;
            }
        });

        log::info!("Recognition loop started (every {} ms)", interval.as_millis());
        *timer = Some(Timer {
            run,
            stop_tx,
            handle,
        });
        LoopHandle { run }
    }

    /// Cancels the timer and clears the published outcome. Calls already in
    /// flight finish on their own and their results are dropped. Stopping a
    /// loop that is not running is a no-op.
    pub fn stop(&self, handle: LoopHandle) {
        let mut timer = self.lock_timer();
        if !timer.as_ref().is_some_and(|t| t.run == handle.run) {
            return;
        }
        let Some(active) = timer.take() else {
            return;
        };

        // Closing the board first stops the timer from tagging new calls.
        self.shared.board.close(active.run);
        // Disconnecting the stop channel wakes the timer thread immediately.
        drop(active.stop_tx);
        if active.handle.join().is_err() {
            log::error!("Recognition timer thread panicked");
        }
        drop(timer);

        self.shared.logger.summary();
        log::info!("Recognition loop stopped");
    }

    /// Stops whichever run is active, if any.
    pub fn stop_active(&self) {
        let run = self.lock_timer().as_ref().map(|t| t.run);
        if let Some(run) = run {
            self.stop(LoopHandle { run });
        }
    }

    /// Dispatches one tick immediately, outside the timer cadence.
    ///
    /// Returns the tick's worker thread, or `None` if the loop is idle or
    /// the tick was skipped because too many calls are outstanding.
    pub fn trigger(&self) -> Option<thread::JoinHandle<()>> {
        dispatch_tick(&self.shared)
    }

    /// The most recently published outcome, `None` while idle or before the
    /// first result of a run.
    pub fn current(&self) -> Option<RecognitionOutcome> {
        self.shared.board.current()
    }

    pub fn is_running(&self) -> bool {
        self.lock_timer().is_some()
    }

    pub fn in_flight(&self) -> usize {
        self.shared.in_flight.load(Ordering::SeqCst)
    }

    fn lock_timer(&self) -> std::sync::MutexGuard<'_, Option<Timer>> {
        self.timer.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Drop for RecognitionPoller {
    fn drop(&mut self) {
        self.stop_active();
    }
}

/// Decrements the in-flight count when the tick worker exits, panics included.
struct InFlightGuard(Arc<PollShared>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

fn dispatch_tick(shared: &Arc<PollShared>) -> Option<thread::JoinHandle<()>> {
    let ticket = shared.board.dispatch()?;

    let max = shared.config.max_in_flight.max(1);
    let reserved = shared
        .in_flight
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| (n < max).then_some(n + 1));
    if reserved.is_err() {
        log::debug!("Skipping tick #{}: {max} identify calls outstanding", ticket.seq());
        shared.logger.event(PollEvent::Busy);
        return None;
    }
    let guard = InFlightGuard(shared.clone());

    let shared = shared.clone();
    Some(thread::spawn(move || {
        let _guard = guard;
        run_tick(&shared, ticket);
    }))
}

/// capture → transcode → identify → submit, strictly in that order.
fn run_tick(shared: &PollShared, ticket: Ticket) {
    let logger = &shared.logger;

    let started = Instant::now();
    let mut source = shared.source.clone();
    let frame = source.capture(shared.config.capture_hint);
    logger.timing("capture", elapsed_ms(started));

    let Some(frame) = frame else {
        logger.event(PollEvent::NoFrame);
        return;
    };

    let started = Instant::now();
    let image = transcode(&frame);
    logger.timing("transcode", elapsed_ms(started));

    let outcome = match image {
        Ok(image) => {
            let started = Instant::now();
            let result = shared.service.identify(&image);
            logger.timing("identify", elapsed_ms(started));
            match result {
                Ok(outcome) => Some(outcome),
                Err(e) => {
                    log::warn!("Recognition tick #{} failed: {e}", ticket.seq());
                    None
                }
            }
        }
        Err(e) => {
            log::warn!("Captured frame could not be transcoded: {e}");
            None
        }
    };

    let degraded = outcome.is_none();
    let outcome = outcome.unwrap_or(RecognitionOutcome::Unrecognized);

    match shared.board.submit(ticket, outcome) {
        Acceptance::Published if degraded => logger.event(PollEvent::Degraded),
        Acceptance::Published => logger.event(PollEvent::Published),
        Acceptance::Stale => {
            log::debug!("Dropping stale result of tick #{}", ticket.seq());
            logger.event(PollEvent::Stale);
        }
        Acceptance::Discarded => logger.event(PollEvent::Discarded),
    }
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}
