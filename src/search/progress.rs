//! Progress reporting for boundary search and scanning

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::types::{SearchEvent, SearchPhase};

/// Interval between progress updates while scanning
const PROGRESS_UPDATE_INTERVAL: Duration = Duration::from_millis(250);

/// Receives progress of one search phase
pub trait ProgressSink: Send + Sync {
    /// Report absolute progress
    fn set_progress(&self, current: u64, total: u64);

    /// Advance progress by `delta` units
    fn advance(&self, delta: u64);

    /// The phase reached its terminal state. Called exactly once per phase,
    /// on success and on failure.
    fn finish(&self);
}

/// [`ProgressSink`] that broadcasts [`SearchEvent::Progress`] events
pub struct EventProgress {
    group: String,
    phase: SearchPhase,
    event_tx: broadcast::Sender<SearchEvent>,
    current: AtomicU64,
    total: AtomicU64,
    finished: AtomicBool,
}

impl EventProgress {
    /// Create a sink for one phase of one group
    pub fn new(
        group: impl Into<String>,
        phase: SearchPhase,
        event_tx: broadcast::Sender<SearchEvent>,
    ) -> Self {
        Self {
            group: group.into(),
            phase,
            event_tx,
            current: AtomicU64::new(0),
            total: AtomicU64::new(0),
            finished: AtomicBool::new(false),
        }
    }

    fn emit(&self) {
        let total = self.total.load(Ordering::Relaxed);
        let current = self.current.load(Ordering::Relaxed).min(total);
        // No subscribers is fine
        self.event_tx
            .send(SearchEvent::Progress {
                group: self.group.clone(),
                phase: self.phase,
                current,
                total,
            })
            .ok();
    }
}

impl ProgressSink for EventProgress {
    fn set_progress(&self, current: u64, total: u64) {
        self.total.store(total, Ordering::Relaxed);
        self.current.store(current, Ordering::Relaxed);
        self.emit();
    }

    fn advance(&self, delta: u64) {
        self.current.fetch_add(delta, Ordering::Relaxed);
        self.emit();
    }

    fn finish(&self) {
        if self.finished.swap(true, Ordering::Relaxed) {
            return;
        }
        self.event_tx
            .send(SearchEvent::PhaseFinished {
                group: self.group.clone(),
                phase: self.phase,
            })
            .ok();
    }
}

/// Spawn a task that periodically forwards `counter` to `sink` until `cancel_token` fires.
pub(crate) fn spawn_progress_reporter(
    counter: Arc<AtomicU64>,
    total: u64,
    sink: Arc<dyn ProgressSink>,
    cancel_token: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(PROGRESS_UPDATE_INTERVAL);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    sink.set_progress(counter.load(Ordering::Relaxed), total);
                }
                _ = cancel_token.cancelled() => {
                    break;
                }
            }
        }
    })
}
