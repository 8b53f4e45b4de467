use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Instant;

/// What happened to one poll tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PollEvent {
    /// The tick's outcome became the published state.
    Published,
    /// A newer tick had already published; the result was dropped.
    Stale,
    /// The loop stopped (or restarted) before the result arrived.
    Discarded,
    /// The identify call failed and `Unrecognized` was submitted instead.
    Degraded,
    /// The camera had no frame; nothing was sent.
    NoFrame,
    /// Too many identify calls were outstanding; the tick was skipped.
    Busy,
}

impl PollEvent {
    fn label(self) -> &'static str {
        match self {
            PollEvent::Published => "published",
            PollEvent::Stale => "stale",
            PollEvent::Discarded => "discarded",
            PollEvent::Degraded => "degraded",
            PollEvent::NoFrame => "no frame",
            PollEvent::Busy => "busy",
        }
    }
}

/// Cross-cutting observer for the recognition loop.
///
/// Ticks run on their own threads, so implementations take `&self` and
/// synchronise internally.
pub trait PollLogger: Send + Sync {
    /// Record how long a named stage (`capture`, `transcode`, `identify`) took.
    fn timing(&self, stage: &str, duration_ms: f64);

    /// Record the fate of one tick.
    fn event(&self, event: PollEvent);

    /// Emit a summary when the loop stops. Default: no-op.
    fn summary(&self) {}
}

/// Silent logger for tests and embedders that do their own reporting.
pub struct NullPollLogger;

impl PollLogger for NullPollLogger {
    fn timing(&self, _stage: &str, _duration_ms: f64) {}
    fn event(&self, _event: PollEvent) {}
}

/// Running aggregate of one stage's durations.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StageTiming {
    pub count: usize,
    pub total_ms: f64,
    pub max_ms: f64,
}

impl StageTiming {
    fn record(&mut self, duration_ms: f64) {
        self.count += 1;
        self.total_ms += duration_ms;
        self.max_ms = self.max_ms.max(duration_ms);
    }

    pub fn avg_ms(&self) -> f64 {
        self.total_ms / self.count.max(1) as f64
    }
}

struct PollStats {
    timings: HashMap<String, StageTiming>,
    events: HashMap<PollEvent, usize>,
    started: Instant,
}

impl PollStats {
    fn new() -> Self {
        Self {
            timings: HashMap::new(),
            events: HashMap::new(),
            started: Instant::now(),
        }
    }
}

/// Aggregates stage timings and tick events, and logs a summary on stop.
///
/// Memory stays constant however long the loop runs. Each summary starts a
/// fresh window, so a restarted loop reports only its own run.
pub struct StatsPollLogger {
    stats: Mutex<PollStats>,
}

impl StatsPollLogger {
    pub fn new() -> Self {
        Self {
            stats: Mutex::new(PollStats::new()),
        }
    }

    pub fn event_count(&self, event: PollEvent) -> usize {
        self.lock().events.get(&event).copied().unwrap_or(0)
    }

    pub fn timings_for(&self, stage: &str) -> StageTiming {
        self.lock().timings.get(stage).copied().unwrap_or_default()
    }

    /// Number of distinct stages with recorded timings.
    pub fn stage_count(&self) -> usize {
        self.lock().timings.len()
    }

    /// Returns the formatted summary, or `None` if nothing was recorded.
    pub fn summary_string(&self) -> Option<String> {
        format_summary(&self.lock())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, PollStats> {
        self.stats.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn format_summary(stats: &PollStats) -> Option<String> {
    if stats.timings.is_empty() && stats.events.is_empty() {
        return None;
    }

    let elapsed_s = stats.started.elapsed().as_secs_f64();
    let ticks: usize = stats.events.values().sum();
    let mut lines = vec![format!(
        "Recognition loop summary ({ticks} ticks, {elapsed_s:.1}s):"
    )];

    let mut stages: Vec<_> = stats.timings.iter().collect();
    stages.sort_by(|a, b| a.0.cmp(b.0));
    for (stage, timing) in stages {
        lines.push(format!(
            "  {stage:10}: avg {:6.1}ms  max {:6.1}ms",
            timing.avg_ms(),
            timing.max_ms
        ));
    }

    let mut events: Vec<_> = stats.events.iter().collect();
    events.sort();
    for (event, count) in events {
        lines.push(format!("  {}: {count}", event.label()));
    }

    Some(lines.join("\n"))
}

impl Default for StatsPollLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl PollLogger for StatsPollLogger {
    fn timing(&self, stage: &str, duration_ms: f64) {
        let mut stats = self.lock();
        match stats.timings.get_mut(stage) {
            Some(timing) => timing.record(duration_ms),
            None => {
                let mut timing = StageTiming::default();
                timing.record(duration_ms);
                stats.timings.insert(stage.to_string(), timing);
            }
        }
    }

    fn event(&self, event: PollEvent) {
        *self.lock().events.entry(event).or_default() += 1;
    }

    fn summary(&self) {
        let text = {
            let mut stats = self.lock();
            let text = format_summary(&stats);
            *stats = PollStats::new();
            text
        };
        if let Some(text) = text {
            log::info!("\n\n{text}");
        }
    }
}
