use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use crate::context::CancelReason;

/// How a parallel run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every element was transformed.
    Completed,
    /// A worker reported an error.
    Failed,
    /// The caller's context was cancelled or its deadline passed.
    Cancelled,
}

/// Execution events emitted by the engine.
///
/// Item and worker events are emitted from worker threads; run events from the caller.
#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    RunStarted { items: usize, workers: usize },
    ItemStarted { worker: usize, index: usize },
    ItemFinished { worker: usize, index: usize },
    ItemFailed { worker: usize, index: usize, error: String },
    WorkerStopped { worker: usize, processed: usize },
    RunCancelled { reason: CancelReason },
    RunFinished {
        elapsed: Duration,
        outcome: RunOutcome,
        metrics: ExecutionMetricsSnapshot,
    },
}

/// Observer hook for execution events.
pub trait ExecutionObserver: Send + Sync {
    fn on_event(&self, event: &ExecutionEvent);
}

/// Forwards execution events to `tracing`.
///
/// Per-item events are logged at trace level, everything else at debug level.
#[derive(Debug, Default)]
pub struct TracingExecutionObserver;

impl ExecutionObserver for TracingExecutionObserver {
    fn on_event(&self, event: &ExecutionEvent) {
        match event {
            ExecutionEvent::ItemStarted { worker, index } => {
                tracing::trace!(worker, index, "item started");
            }
            ExecutionEvent::ItemFinished { worker, index } => {
                tracing::trace!(worker, index, "item finished");
            }
            ExecutionEvent::ItemFailed {
                worker,
                index,
                error,
            } => {
                tracing::debug!(worker, index, %error, "item failed");
            }
            ExecutionEvent::RunFinished {
                elapsed,
                outcome,
                metrics,
            } => {
                tracing::debug!(?elapsed, ?outcome, %metrics, "run finished");
            }
            other => tracing::debug!(event = ?other, "execution event"),
        }
    }
}

/// Real-time metrics for an execution run.
///
/// The engine updates these counters during execution; callers can snapshot them at any time.
/// Counters reset when a run begins on an idle engine. Runs that overlap on one engine add
/// into the same counters.
pub struct ExecutionMetrics {
    run_id: AtomicU64,
    elapsed_ns: AtomicU64,
    active_runs: AtomicUsize,

    items_dispatched: AtomicU64,
    items_completed: AtomicU64,
    items_failed: AtomicU64,
    workers_started: AtomicU64,
    workers_stopped: AtomicU64,

    active_calls: AtomicUsize,
    max_active_calls: AtomicUsize,
}

impl ExecutionMetrics {
    pub fn new() -> Self {
        Self {
            run_id: AtomicU64::new(0),
            elapsed_ns: AtomicU64::new(0),
            active_runs: AtomicUsize::new(0),
            items_dispatched: AtomicU64::new(0),
            items_completed: AtomicU64::new(0),
            items_failed: AtomicU64::new(0),
            workers_started: AtomicU64::new(0),
            workers_stopped: AtomicU64::new(0),
            active_calls: AtomicUsize::new(0),
            max_active_calls: AtomicUsize::new(0),
        }
    }

    pub fn begin_run(&self) {
        let _ = self.run_id.fetch_add(1, Ordering::SeqCst);
        if self.active_runs.fetch_add(1, Ordering::SeqCst) > 0 {
            return;
        }

        // `active_calls` is balanced by `on_call_end` and never reset.
        self.elapsed_ns.store(0, Ordering::SeqCst);
        self.items_dispatched.store(0, Ordering::SeqCst);
        self.items_completed.store(0, Ordering::SeqCst);
        self.items_failed.store(0, Ordering::SeqCst);
        self.workers_started.store(0, Ordering::SeqCst);
        self.workers_stopped.store(0, Ordering::SeqCst);
        self.max_active_calls
            .store(self.active_calls.load(Ordering::SeqCst), Ordering::SeqCst);
    }

    pub fn end_run(&self, elapsed: Duration) {
        self.elapsed_ns
            .store(elapsed.as_nanos().min(u64::MAX as u128) as u64, Ordering::SeqCst);
        let _ = self.active_runs.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn on_dispatch(&self) {
        let _ = self.items_dispatched.fetch_add(1, Ordering::SeqCst);
    }

    pub fn on_worker_start(&self) {
        let _ = self.workers_started.fetch_add(1, Ordering::SeqCst);
    }

    pub fn on_worker_stop(&self) {
        let _ = self.workers_stopped.fetch_add(1, Ordering::SeqCst);
    }

    pub fn on_call_start(&self) {
        let now = self.active_calls.fetch_add(1, Ordering::SeqCst) + 1;
        let _ = self.max_active_calls.fetch_max(now, Ordering::SeqCst);
    }

    pub fn on_call_end(&self, ok: bool) {
        let counter = if ok {
            &self.items_completed
        } else {
            &self.items_failed
        };
        let _ = counter.fetch_add(1, Ordering::SeqCst);
        let _ = self.active_calls.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> ExecutionMetricsSnapshot {
        let elapsed_ns = self.elapsed_ns.load(Ordering::SeqCst);
        let elapsed = if elapsed_ns > 0 {
            Some(Duration::from_nanos(elapsed_ns))
        } else {
            None
        };

        ExecutionMetricsSnapshot {
            run_id: self.run_id.load(Ordering::SeqCst),
            elapsed,
            active_runs: self.active_runs.load(Ordering::SeqCst),
            items_dispatched: self.items_dispatched.load(Ordering::SeqCst),
            items_completed: self.items_completed.load(Ordering::SeqCst),
            items_failed: self.items_failed.load(Ordering::SeqCst),
            workers_started: self.workers_started.load(Ordering::SeqCst),
            workers_stopped: self.workers_stopped.load(Ordering::SeqCst),
            active_calls: self.active_calls.load(Ordering::SeqCst),
            max_active_calls: self.max_active_calls.load(Ordering::SeqCst),
        }
    }
}

impl Default for ExecutionMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Immutable snapshot of [`ExecutionMetrics`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionMetricsSnapshot {
    pub run_id: u64,
    pub elapsed: Option<Duration>,
    pub active_runs: usize,
    pub items_dispatched: u64,
    pub items_completed: u64,
    pub items_failed: u64,
    pub workers_started: u64,
    pub workers_stopped: u64,
    pub active_calls: usize,
    pub max_active_calls: usize,
}

impl fmt::Display for ExecutionMetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "run_id={}, items={}/{} (failed={}), workers={}/{}, max_active_calls={}, elapsed={:?}",
            self.run_id,
            self.items_completed,
            self.items_dispatched,
            self.items_failed,
            self.workers_stopped,
            self.workers_started,
            self.max_active_calls,
            self.elapsed
        )
    }
}
