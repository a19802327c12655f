//! Bounded-parallelism transform engine.
//!
//! This module sits "above" [`crate::processing`] and provides:
//!
//! - An order-preserving parallel transform over a fixed-size worker pool
//! - First-error propagation with cooperative cancellation of in-flight work
//! - Real-time metrics + observer hooks for monitoring
//!
//! ```rust
//! use rust_funcutil::context::Context;
//! use rust_funcutil::execution::parallel_transform;
//! use rust_funcutil::processing::function;
//!
//! let ctx = Context::new();
//! let items: Vec<u64> = (0..100).collect();
//! let out = parallel_transform(&ctx, 4, &function(|_: &Context, x: &u64| Ok(x * 2)), &items)?;
//! assert_eq!(out, items.iter().map(|x| x * 2).collect::<Vec<_>>());
//! # Ok::<(), rust_funcutil::ProcessingError>(())
//! ```

mod observer;
mod pool;

use std::sync::Arc;
use std::time::Instant;

use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::Deserialize;

use crate::context::{CancelReason, Context};
use crate::error::{ProcessingError, ProcessingResult};
use crate::processing::function::Transform;

pub use observer::{
    ExecutionEvent, ExecutionMetrics, ExecutionMetricsSnapshot, ExecutionObserver, RunOutcome,
    TracingExecutionObserver,
};

use pool::Hooks;

/// Configuration for the [`ExecutionEngine`].
///
/// Deserializable so it can live in a config file; missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExecutionOptions {
    /// Number of worker threads in the engine's pool. Must be > 0.
    ///
    /// Runs over fewer elements than this use one worker per element. Concurrent runs on
    /// one engine share the pool.
    pub parallelism: usize,
    /// Capacity of the result channel between workers and the collector.
    ///
    /// If `None`, one slot per worker.
    pub result_buffer: Option<usize>,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        let n = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
        Self {
            parallelism: n,
            result_buffer: None,
        }
    }
}

impl ExecutionOptions {
    /// Default options with a fixed worker count.
    pub fn with_parallelism(parallelism: usize) -> Self {
        Self {
            parallelism,
            ..Self::default()
        }
    }

    /// Parse options from JSON, e.g. `{"parallelism": 8}`.
    pub fn from_json_str(json: &str) -> ProcessingResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// A configured parallel transform engine.
///
/// The engine owns a rayon pool of `parallelism` threads, built once in
/// [`ExecutionEngine::new`] and reused by every [`ExecutionEngine::transform`] call. Runs
/// may overlap; they share the pool.
pub struct ExecutionEngine {
    pool: ThreadPool,
    opts: ExecutionOptions,
    observer: Option<Arc<dyn ExecutionObserver>>,
    metrics: Arc<ExecutionMetrics>,
}

impl ExecutionEngine {
    /// Create a new engine with the given options.
    ///
    /// Fails with [`ProcessingError::InvalidParallelism`] if `parallelism == 0`.
    pub fn new(opts: ExecutionOptions) -> ProcessingResult<Self> {
        if opts.parallelism == 0 {
            return Err(ProcessingError::InvalidParallelism);
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(opts.parallelism)
            .thread_name(|i| format!("funcutil-worker-{i}"))
            .build()?;
        Ok(Self {
            pool,
            opts,
            observer: None,
            metrics: Arc::new(ExecutionMetrics::new()),
        })
    }

    /// Attach an observer for execution events (metrics/logging).
    pub fn with_observer(mut self, observer: Arc<dyn ExecutionObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn options(&self) -> &ExecutionOptions {
        &self.opts
    }

    /// Get a handle to real-time execution metrics.
    pub fn metrics(&self) -> Arc<ExecutionMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Transform every element of `items` with `f` on the worker pool.
    ///
    /// Output order matches input order. The first error from any worker is returned and
    /// stops dispatch of further elements; calls already running finish first. Cancelling
    /// `ctx` (or reaching its deadline) stops the run with the matching error.
    ///
    /// With `parallelism == 1` the result, including which error is returned, is the same
    /// as [`crate::processing::transform`]. Empty input returns an empty vector, whatever
    /// the state of `ctx`.
    ///
    /// Must not be called from inside a function running on this same engine.
    pub fn transform<T, U, F>(&self, ctx: &Context, f: &F, items: &[T]) -> ProcessingResult<Vec<U>>
    where
        T: Sync,
        U: Send,
        F: Transform<T, U> + Sync + ?Sized,
    {
        if items.is_empty() {
            return Ok(Vec::new());
        }
        ctx.check()?;

        let start = Instant::now();
        let workers = self.opts.parallelism.min(items.len());
        self.metrics.begin_run();
        self.emit(ExecutionEvent::RunStarted {
            items: items.len(),
            workers,
        });

        let hooks = Hooks {
            observer: self.observer.as_deref(),
            metrics: &self.metrics,
        };
        let result_buffer = self.opts.result_buffer.unwrap_or(workers);
        let out = pool::run(&self.pool, ctx, workers, result_buffer, f, items, &hooks);

        let outcome = match &out {
            Ok(_) => RunOutcome::Completed,
            Err(ProcessingError::Cancelled) => {
                self.emit(ExecutionEvent::RunCancelled {
                    reason: CancelReason::Cancelled,
                });
                RunOutcome::Cancelled
            }
            Err(ProcessingError::DeadlineExceeded) => {
                self.emit(ExecutionEvent::RunCancelled {
                    reason: CancelReason::DeadlineExceeded,
                });
                RunOutcome::Cancelled
            }
            Err(_) => RunOutcome::Failed,
        };

        self.metrics.end_run(start.elapsed());
        self.emit(ExecutionEvent::RunFinished {
            elapsed: start.elapsed(),
            outcome,
            metrics: self.metrics.snapshot(),
        });

        out
    }

    fn emit(&self, event: ExecutionEvent) {
        if let Some(obs) = &self.observer {
            obs.on_event(&event);
        }
    }
}

/// Transform `items` with `f` using `parallelism` workers, preserving input order.
///
/// One-shot form of [`ExecutionEngine::transform`]: builds a pool for this call only.
/// Empty input returns an empty vector without starting any thread.
pub fn parallel_transform<T, U, F>(
    ctx: &Context,
    parallelism: usize,
    f: &F,
    items: &[T],
) -> ProcessingResult<Vec<U>>
where
    T: Sync,
    U: Send,
    F: Transform<T, U> + Sync + ?Sized,
{
    if parallelism == 0 {
        return Err(ProcessingError::InvalidParallelism);
    }
    if items.is_empty() {
        return Ok(Vec::new());
    }
    // No more threads than elements.
    let opts = ExecutionOptions::with_parallelism(parallelism.min(items.len()));
    ExecutionEngine::new(opts)?.transform(ctx, f, items)
}
