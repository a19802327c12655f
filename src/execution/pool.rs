//! Workers and the dispatch/collect loop behind a parallel transform.
//!
//! ```text
//!            caller thread                    engine rayon pool
//!   dispatch --index-->  ...............  worker 0..n
//!   collect  <--(index, value)-----------'
//! ```
//!
//! Workers are jobs spawned into the engine's pool through `in_place_scope`, so they may
//! borrow the input; the caller thread drives dispatch and collection and returns only once
//! every worker has exited. A worker blocks only on its own run's channels, whose other end
//! is held by a thread outside the pool, so concurrent runs sharing one pool cannot
//! deadlock each other.
//!
//! Failures cancel the run context, which stops dispatch and wakes idle workers; a call
//! already in progress runs to completion.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Mutex, PoisonError};

use crossbeam_channel::{Receiver, Sender, select};
use rayon::ThreadPool;

use super::observer::{ExecutionEvent, ExecutionMetrics, ExecutionObserver};
use crate::context::{CancelReason, Context};
use crate::error::{ProcessingError, ProcessingResult};
use crate::processing::function::Transform;

/// Observer + metrics sink shared by every thread of a run.
pub(crate) struct Hooks<'a> {
    pub(crate) observer: Option<&'a dyn ExecutionObserver>,
    pub(crate) metrics: &'a ExecutionMetrics,
}

impl Hooks<'_> {
    fn emit(&self, event: ExecutionEvent) {
        if let Some(obs) = self.observer {
            obs.on_event(&event);
        }
    }
}

/// Shared state of one run.
struct Run<'a, T, F: ?Sized> {
    ctx: Context,
    items: &'a [T],
    f: &'a F,
    hooks: &'a Hooks<'a>,
    failure: Mutex<Option<ProcessingError>>,
}

impl<T, F: ?Sized> Run<'_, T, F> {
    /// Keep the first failure, cancel everything else.
    fn fail(&self, err: ProcessingError) {
        {
            let mut slot = self.failure.lock().unwrap_or_else(PoisonError::into_inner);
            if slot.is_none() {
                *slot = Some(err);
            }
        }
        self.ctx.cancel();
    }
}

/// Transform `items` with `workers` jobs on `pool`, placing each result at its input index.
///
/// `workers` must be in `1..=items.len()`.
pub(crate) fn run<T, U, F>(
    pool: &ThreadPool,
    ctx: &Context,
    workers: usize,
    result_buffer: usize,
    f: &F,
    items: &[T],
    hooks: &Hooks<'_>,
) -> ProcessingResult<Vec<U>>
where
    T: Sync,
    U: Send,
    F: Transform<T, U> + Sync + ?Sized,
{
    debug_assert!(workers >= 1 && workers <= items.len());

    let run = Run {
        ctx: ctx.child(),
        items,
        f,
        hooks,
        failure: Mutex::new(None),
    };
    let span = tracing::debug_span!("parallel_transform", items = items.len(), workers);
    let _entered = span.enter();

    let (index_tx, index_rx) = crossbeam_channel::bounded::<usize>(0);
    let (result_tx, result_rx) = crossbeam_channel::bounded::<(usize, U)>(result_buffer);
    let mut slots: Vec<Option<U>> = std::iter::repeat_with(|| None).take(items.len()).collect();

    let run_ref = &run;
    let span_ref = &span;
    let slots_ref = &mut slots;
    pool.in_place_scope(move |s| {
        for worker in 0..workers {
            let index_rx = index_rx.clone();
            let result_tx = result_tx.clone();
            let span = span_ref.clone();
            s.spawn(move |_| {
                let _entered = span.enter();
                work(run_ref, worker, index_rx, result_tx);
            });
        }
        drop(index_rx);
        drop(result_tx);
        drive(run_ref, index_tx, result_rx, slots_ref);
    });

    if let Some(err) = run.failure.into_inner().unwrap_or_else(PoisonError::into_inner) {
        return Err(err);
    }
    match slots.into_iter().collect::<Option<Vec<U>>>() {
        Some(out) => Ok(out),
        None => {
            let reason = run.ctx.err().unwrap_or(CancelReason::Cancelled);
            tracing::debug!(?reason, "parallel transform stopped before completion");
            Err(reason.into())
        }
    }
}

enum Step<U> {
    Sent,
    Received(usize, U),
    Stop,
}

/// Hand out indices while collecting results, then drain until every worker has exited.
fn drive<T, U, F: ?Sized>(
    run: &Run<'_, T, F>,
    index_tx: Sender<usize>,
    result_rx: Receiver<(usize, U)>,
    slots: &mut [Option<U>],
) {
    let deadline = run.ctx.deadline_timer();
    let mut next = 0;
    while next < run.items.len() && !run.ctx.is_cancelled() {
        let step = select! {
            // Fails only once every worker has exited.
            send(index_tx, next) -> sent => match sent {
                Ok(()) => Step::Sent,
                Err(_) => Step::Stop,
            },
            recv(result_rx) -> msg => match msg {
                Ok((index, value)) => Step::Received(index, value),
                Err(_) => Step::Stop,
            },
            recv(run.ctx.done()) -> _ => Step::Stop,
            recv(deadline) -> _ => {
                // Records DeadlineExceeded on the run context, waking the workers.
                let _ = run.ctx.err();
                Step::Stop
            }
        };
        match step {
            Step::Sent => {
                run.hooks.metrics.on_dispatch();
                next += 1;
            }
            Step::Received(index, value) => slots[index] = Some(value),
            Step::Stop => break,
        }
    }

    drop(index_tx);
    // Disconnects once the last worker drops its sender.
    for (index, value) in result_rx.iter() {
        slots[index] = Some(value);
    }
}

fn work<T, U, F>(
    run: &Run<'_, T, F>,
    worker: usize,
    index_rx: Receiver<usize>,
    result_tx: Sender<(usize, U)>,
) where
    F: Transform<T, U> + ?Sized,
{
    let hooks = run.hooks;
    hooks.metrics.on_worker_start();
    let mut processed = 0usize;

    loop {
        let next = select! {
            recv(index_rx) -> msg => msg.ok(),
            recv(run.ctx.done()) -> _ => None,
        };
        let Some(index) = next else {
            break;
        };
        if run.ctx.is_cancelled() {
            break;
        }

        hooks.metrics.on_call_start();
        hooks.emit(ExecutionEvent::ItemStarted { worker, index });
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            run.f.call(&run.ctx, &run.items[index])
        }))
        .unwrap_or_else(|payload| {
            Err(ProcessingError::WorkerPanicked {
                index,
                message: panic_message(payload.as_ref()),
            })
        });
        hooks.metrics.on_call_end(outcome.is_ok());

        match outcome {
            Ok(value) => {
                hooks.emit(ExecutionEvent::ItemFinished { worker, index });
                processed += 1;
                if result_tx.send((index, value)).is_err() {
                    break;
                }
            }
            Err(err) => {
                tracing::debug!(worker, index, error = %err, "worker failed; cancelling run");
                hooks.emit(ExecutionEvent::ItemFailed {
                    worker,
                    index,
                    error: err.to_string(),
                });
                run.fail(err);
                break;
            }
        }
    }

    hooks.metrics.on_worker_stop();
    hooks.emit(ExecutionEvent::WorkerStopped { worker, processed });
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::panic_message;
    use std::panic::{catch_unwind, panic_any};

    #[test]
    fn panic_message_reads_common_payloads() {
        let payload = catch_unwind(|| -> i32 { panic!("boom") }).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "boom");

        let n = 3;
        let payload = catch_unwind(|| -> i32 { panic!("boom {n}") }).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "boom 3");

        let payload = catch_unwind(|| -> i32 { panic_any(7_u8) }).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "non-string panic payload");
    }
}
