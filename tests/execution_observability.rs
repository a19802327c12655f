use std::sync::{Arc, Mutex};
use std::time::Duration;

use rust_funcutil::context::{CancelReason, Context};
use rust_funcutil::execution::{
    ExecutionEngine, ExecutionEvent, ExecutionObserver, ExecutionOptions, RunOutcome,
};
use rust_funcutil::processing::function;
use rust_funcutil::{ProcessingError, ProcessingResult};

#[derive(Default)]
struct RecordingObserver {
    events: Mutex<Vec<ExecutionEvent>>,
}

impl ExecutionObserver for RecordingObserver {
    fn on_event(&self, event: &ExecutionEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

impl RecordingObserver {
    fn events(&self) -> Vec<ExecutionEvent> {
        self.events.lock().unwrap().clone()
    }

    fn outcome(&self) -> Option<RunOutcome> {
        self.events().iter().rev().find_map(|e| match e {
            ExecutionEvent::RunFinished { outcome, .. } => Some(*outcome),
            _ => None,
        })
    }

    fn cancel_reasons(&self) -> Vec<CancelReason> {
        self.events()
            .iter()
            .filter_map(|e| match e {
                ExecutionEvent::RunCancelled { reason } => Some(*reason),
                _ => None,
            })
            .collect()
    }
}

fn engine_with(obs: &Arc<RecordingObserver>, parallelism: usize) -> ExecutionEngine {
    let observer: Arc<dyn ExecutionObserver> = obs.clone();
    ExecutionEngine::new(ExecutionOptions::with_parallelism(parallelism))
        .unwrap()
        .with_observer(observer)
}

#[test]
fn completed_run_is_bracketed_by_start_and_finish() {
    let obs = Arc::new(RecordingObserver::default());
    let engine = engine_with(&obs, 3);
    let items: Vec<u32> = (0..30).collect();

    let out = engine
        .transform(&Context::new(), &function(|_: &Context, x: &u32| Ok(x + 1)), &items)
        .unwrap();
    assert_eq!(out.len(), 30);

    let events = obs.events();
    assert!(matches!(
        events.first(),
        Some(ExecutionEvent::RunStarted { items: 30, workers: 3 })
    ));
    assert!(matches!(events.last(), Some(ExecutionEvent::RunFinished { .. })));
    assert_eq!(obs.outcome(), Some(RunOutcome::Completed));
    assert!(obs.cancel_reasons().is_empty());
    let finished = events
        .iter()
        .filter(|e| matches!(e, ExecutionEvent::ItemFinished { .. }))
        .count();
    assert_eq!(finished, 30);
}

#[test]
fn failing_item_is_reported_before_failed_outcome() {
    let obs = Arc::new(RecordingObserver::default());
    let engine = engine_with(&obs, 2);
    let items: Vec<u32> = (0..50).collect();
    let f = function(|_: &Context, x: &u32| -> ProcessingResult<u32> {
        if *x == 5 {
            Err(ProcessingError::msg("bad 5"))
        } else {
            Ok(*x)
        }
    });

    let err = engine.transform(&Context::new(), &f, &items).unwrap_err();
    assert_eq!(err.to_string(), "bad 5");

    let events = obs.events();
    let failed: Vec<(usize, usize)> = events
        .iter()
        .enumerate()
        .filter_map(|(pos, e)| match e {
            ExecutionEvent::ItemFailed { index, error, .. } => {
                assert_eq!(error, "bad 5");
                Some((pos, *index))
            }
            _ => None,
        })
        .collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].1, 5);

    let finished_at = events
        .iter()
        .position(|e| matches!(e, ExecutionEvent::RunFinished { .. }))
        .unwrap();
    assert!(failed[0].0 < finished_at);
    assert_eq!(obs.outcome(), Some(RunOutcome::Failed));
    // A worker failure is not a caller cancellation.
    assert!(obs.cancel_reasons().is_empty());
}

#[test]
fn caller_cancellation_emits_run_cancelled() {
    let obs = Arc::new(RecordingObserver::default());
    let engine = engine_with(&obs, 2);
    let items: Vec<u32> = (0..100).collect();
    let ctx = Context::new();
    let caller = ctx.clone();
    let f = function(move |_: &Context, x: &u32| {
        if *x == 3 {
            caller.cancel();
        }
        Ok(*x)
    });

    let err = engine.transform(&ctx, &f, &items).unwrap_err();
    assert!(matches!(err, ProcessingError::Cancelled));
    assert_eq!(obs.cancel_reasons(), vec![CancelReason::Cancelled]);
    assert_eq!(obs.outcome(), Some(RunOutcome::Cancelled));
}

#[test]
fn deadline_emits_run_cancelled_with_reason() {
    let obs = Arc::new(RecordingObserver::default());
    let engine = engine_with(&obs, 2);
    let items: Vec<u32> = (0..200).collect();
    let ctx = Context::new().with_timeout(Duration::from_millis(20));
    let f = function(|_: &Context, x: &u32| {
        std::thread::sleep(Duration::from_millis(5));
        Ok(*x)
    });

    let err = engine.transform(&ctx, &f, &items).unwrap_err();
    assert!(matches!(err, ProcessingError::DeadlineExceeded));
    assert_eq!(obs.cancel_reasons(), vec![CancelReason::DeadlineExceeded]);
    assert_eq!(obs.outcome(), Some(RunOutcome::Cancelled));
}
