use std::sync::Mutex;

use crate::recognition::domain::outcome::RecognitionOutcome;

/// Tag attached to one dispatched identify call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    run: u64,
    seq: u64,
}

impl Ticket {
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

/// What the board did with a submitted result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acceptance {
    Published,
    /// A later-dispatched call has already published.
    Stale,
    /// The run the ticket belongs to is no longer active.
    Discarded,
}

#[derive(Default)]
struct BoardState {
    run: u64,
    running: bool,
    next_seq: u64,
    last_published: Option<u64>,
    outcome: Option<RecognitionOutcome>,
}

/// Holds the single published recognition outcome.
///
/// Calls are tagged with a monotonically increasing sequence number when
/// they are dispatched. A result is published only if its run is still
/// active and no call dispatched after it has published yet, so a slow
/// response never overwrites a fresher one.
#[derive(Default)]
pub struct OutcomeBoard {
    state: Mutex<BoardState>,
}

impl OutcomeBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begins a new run, clearing the published outcome. Returns the run id.
    pub fn open(&self) -> u64 {
        let mut state = self.lock();
        state.run += 1;
        state.running = true;
        state.last_published = None;
        state.outcome = None;
        state.run
    }

    /// Ends `run` and clears the published outcome. No-op for any other run.
    pub fn close(&self, run: u64) -> bool {
        let mut state = self.lock();
        if !state.running || state.run != run {
            return false;
        }
        state.running = false;
        state.last_published = None;
        state.outcome = None;
        true
    }

    /// Tags a new call for the current run, or `None` if no run is active.
    pub fn dispatch(&self) -> Option<Ticket> {
        let mut state = self.lock();
        if !state.running {
            return None;
        }
        state.next_seq += 1;
        Some(Ticket {
            run: state.run,
            seq: state.next_seq,
        })
    }

    pub fn submit(&self, ticket: Ticket, outcome: RecognitionOutcome) -> Acceptance {
        let mut state = self.lock();
        if !state.running || state.run != ticket.run {
            return Acceptance::Discarded;
        }
        if state.last_published.is_some_and(|last| ticket.seq <= last) {
            return Acceptance::Stale;
        }
        state.last_published = Some(ticket.seq);
        state.outcome = Some(outcome);
        Acceptance::Published
    }

    pub fn current(&self) -> Option<RecognitionOutcome> {
        self.lock().outcome.clone()
    }

    pub fn is_running(&self) -> bool {
        self.lock().running
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BoardState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recognized(id: u64) -> RecognitionOutcome {
        RecognitionOutcome::recognized(id)
    }

    #[test]
    fn test_starts_closed_and_empty() {
        let board = OutcomeBoard::new();
        assert!(!board.is_running());
        assert_eq!(board.current(), None);
        assert_eq!(board.dispatch(), None);
    }

    #[test]
    fn test_in_order_results_publish() {
        let board = OutcomeBoard::new();
        board.open();
        let a = board.dispatch().unwrap();
        let b = board.dispatch().unwrap();

        assert_eq!(board.submit(a, recognized(1)), Acceptance::Published);
        assert_eq!(board.submit(b, RecognitionOutcome::Unrecognized), Acceptance::Published);
        assert_eq!(board.current(), Some(RecognitionOutcome::Unrecognized));
    }

    #[test]
    fn test_late_earlier_result_is_stale() {
        let board = OutcomeBoard::new();
        board.open();
        let a = board.dispatch().unwrap();
        let b = board.dispatch().unwrap();
        assert!(a.seq() < b.seq());

        assert_eq!(board.submit(b, recognized(42)), Acceptance::Published);
        assert_eq!(board.current(), Some(recognized(42)));

        assert_eq!(
            board.submit(a, RecognitionOutcome::Unrecognized),
            Acceptance::Stale
        );
        assert_eq!(board.current(), Some(recognized(42)));
    }

    #[test]
    fn test_slow_result_publishes_if_nothing_newer_has() {
        let board = OutcomeBoard::new();
        board.open();
        let a = board.dispatch().unwrap();
        let _b = board.dispatch().unwrap();

        assert_eq!(board.submit(a, recognized(3)), Acceptance::Published);
    }

    #[test]
    fn test_result_after_close_is_discarded() {
        let board = OutcomeBoard::new();
        let run = board.open();
        let ticket = board.dispatch().unwrap();
        assert!(board.close(run));

        assert_eq!(board.submit(ticket, recognized(1)), Acceptance::Discarded);
        assert_eq!(board.current(), None);
    }

    #[test]
    fn test_result_from_previous_run_is_discarded() {
        let board = OutcomeBoard::new();
        let first = board.open();
        let old = board.dispatch().unwrap();
        board.close(first);
        board.open();

        assert_eq!(board.submit(old, recognized(1)), Acceptance::Discarded);
        assert_eq!(board.current(), None);
    }

    #[test]
    fn test_open_and_close_clear_outcome() {
        let board = OutcomeBoard::new();
        let run = board.open();
        let ticket = board.dispatch().unwrap();
        board.submit(ticket, recognized(5));
        assert!(board.current().is_some());

        assert!(board.close(run));
        assert_eq!(board.current(), None);

        board.open();
        assert_eq!(board.current(), None);
    }

    #[test]
    fn test_close_is_idempotent() {
        let board = OutcomeBoard::new();
        assert!(!board.close(1));
        let run = board.open();
        assert!(board.close(run));
        assert!(!board.close(run));
    }

    #[test]
    fn test_close_ignores_other_runs() {
        let board = OutcomeBoard::new();
        let first = board.open();
        board.close(first);
        let second = board.open();

        assert!(!board.close(first));
        assert!(board.is_running());
        assert!(board.close(second));
    }

    #[test]
    fn test_sequence_numbers_keep_increasing_across_runs() {
        let board = OutcomeBoard::new();
        let run = board.open();
        let a = board.dispatch().unwrap();
        board.close(run);
        board.open();
        let b = board.dispatch().unwrap();
        assert!(b.seq() > a.seq());
    }
}
