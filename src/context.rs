//! Per-call cancellation and deadline carrier.
//!
//! Every engine takes a [`Context`]. Cancelling a context cancels all contexts derived from
//! it with [`Context::child`], [`Context::with_timeout`] or [`Context::with_deadline`].
//! Blocking code can wait on [`Context::done`], a channel that disconnects on cancellation.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender};

use crate::error::{ProcessingError, ProcessingResult};

/// Why a [`Context`] stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// [`Context::cancel`] was called on this context or an ancestor.
    Cancelled,
    /// The deadline of this context (or an ancestor) passed.
    DeadlineExceeded,
}

impl From<CancelReason> for ProcessingError {
    fn from(reason: CancelReason) -> Self {
        match reason {
            CancelReason::Cancelled => ProcessingError::Cancelled,
            CancelReason::DeadlineExceeded => ProcessingError::DeadlineExceeded,
        }
    }
}

struct State {
    reason: Option<CancelReason>,
    done_tx: Option<Sender<()>>,
    children: Vec<Weak<Inner>>,
}

struct Inner {
    state: Mutex<State>,
    done_rx: Receiver<()>,
    deadline: Option<Instant>,
}

impl Inner {
    fn new(deadline: Option<Instant>) -> Arc<Self> {
        // Nothing is ever sent; receivers observe the disconnect when `done_tx` is dropped.
        let (done_tx, done_rx) = crossbeam_channel::bounded(0);
        Arc::new(Self {
            state: Mutex::new(State {
                reason: None,
                done_tx: Some(done_tx),
                children: Vec::new(),
            }),
            done_rx,
            deadline,
        })
    }

    fn cancel(&self, reason: CancelReason) {
        let children = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if state.reason.is_some() {
                return;
            }
            state.reason = Some(reason);
            state.done_tx = None;
            std::mem::take(&mut state.children)
        };
        for child in children.iter().filter_map(Weak::upgrade) {
            child.cancel(reason);
        }
    }

    fn reason(&self) -> Option<CancelReason> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .reason
    }
}

/// Cancellation token with an optional deadline, cheap to clone and share across threads.
#[derive(Clone)]
pub struct Context {
    inner: Arc<Inner>,
}

impl Context {
    /// Create a new root context with no deadline.
    pub fn new() -> Self {
        Self {
            inner: Inner::new(None),
        }
    }

    /// Alias of [`Context::new`], for call sites that never cancel.
    pub fn background() -> Self {
        Self::new()
    }

    /// Derive a context that is cancelled when `self` is, and can be cancelled on its own.
    pub fn child(&self) -> Self {
        self.derive(self.inner.deadline)
    }

    /// Derive a child context that expires `timeout` from now.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Derive a child context that expires at `deadline`.
    ///
    /// The child keeps the parent's deadline if that one is earlier.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.inner.deadline {
            Some(parent) if parent < deadline => parent,
            _ => deadline,
        };
        self.derive(Some(deadline))
    }

    fn derive(&self, deadline: Option<Instant>) -> Self {
        let child = Inner::new(deadline);
        let inherited = {
            let mut state = self.inner.state.lock().unwrap_or_else(PoisonError::into_inner);
            if state.reason.is_none() {
                state.children.retain(|c| c.strong_count() > 0);
                state.children.push(Arc::downgrade(&child));
            }
            state.reason
        };
        if let Some(reason) = inherited {
            child.cancel(reason);
        }
        Self { inner: child }
    }

    /// Cancel this context and every context derived from it.
    ///
    /// Cancelling twice is a no-op; the first reason sticks.
    pub fn cancel(&self) {
        self.inner.cancel(CancelReason::Cancelled);
    }

    /// The deadline of this context, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.inner.deadline
    }

    /// Returns why this context stopped, or `None` while it is still live.
    ///
    /// An expired deadline is detected here and turns into a cancellation of this context.
    pub fn err(&self) -> Option<CancelReason> {
        if let Some(reason) = self.inner.reason() {
            return Some(reason);
        }
        match self.inner.deadline {
            Some(deadline) if Instant::now() >= deadline => {
                self.inner.cancel(CancelReason::DeadlineExceeded);
                self.inner.reason()
            }
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.err().is_some()
    }

    /// `Ok(())` while live, otherwise the matching [`ProcessingError`].
    pub fn check(&self) -> ProcessingResult<()> {
        match self.err() {
            Some(reason) => Err(reason.into()),
            None => Ok(()),
        }
    }

    /// Channel that disconnects once this context is cancelled.
    ///
    /// Deadlines are not signalled here; pair it with [`Context::deadline_timer`].
    pub fn done(&self) -> &Receiver<()> {
        &self.inner.done_rx
    }

    /// Channel that fires once at the deadline, or never if there is none.
    pub fn deadline_timer(&self) -> Receiver<Instant> {
        match self.inner.deadline {
            Some(deadline) => crossbeam_channel::at(deadline),
            None => crossbeam_channel::never(),
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("deadline", &self.inner.deadline)
            .field("reason", &self.inner.reason())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{CancelReason, Context};
    use crate::error::ProcessingError;
    use std::time::{Duration, Instant};

    #[test]
    fn new_context_is_live() {
        let ctx = Context::new();
        assert_eq!(ctx.err(), None);
        assert!(ctx.check().is_ok());
        assert!(ctx.deadline().is_none());
    }

    #[test]
    fn cancel_propagates_to_descendants_not_ancestors() {
        let root = Context::new();
        let child = root.child();
        let grandchild = child.child();

        child.cancel();

        assert_eq!(root.err(), None);
        assert_eq!(child.err(), Some(CancelReason::Cancelled));
        assert_eq!(grandchild.err(), Some(CancelReason::Cancelled));
        assert!(matches!(grandchild.check(), Err(ProcessingError::Cancelled)));
    }

    #[test]
    fn child_of_cancelled_parent_starts_cancelled() {
        let root = Context::new();
        root.cancel();
        let child = root.child();
        assert!(child.is_cancelled());
        assert!(child.done().recv().is_err());
    }

    #[test]
    fn done_channel_disconnects_on_cancel() {
        let ctx = Context::new();
        assert!(ctx.done().try_recv().is_err());
        let waiter = {
            let ctx = ctx.clone();
            std::thread::spawn(move || ctx.done().recv().is_err())
        };
        std::thread::sleep(Duration::from_millis(10));
        ctx.cancel();
        assert!(waiter.join().unwrap());
    }

    #[test]
    fn deadline_is_observed_lazily() {
        let ctx = Context::new().with_timeout(Duration::from_millis(5));
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(ctx.err(), Some(CancelReason::DeadlineExceeded));
        assert!(matches!(ctx.check(), Err(ProcessingError::DeadlineExceeded)));
        // Expiry also closes the done channel.
        assert!(ctx.done().recv().is_err());
    }

    #[test]
    fn child_keeps_earlier_parent_deadline() {
        let parent = Context::new().with_timeout(Duration::from_millis(50));
        let later = Instant::now() + Duration::from_secs(60);
        let child = parent.with_deadline(later);
        assert_eq!(child.deadline(), parent.deadline());
    }

    #[test]
    fn first_reason_sticks() {
        let ctx = Context::new().with_timeout(Duration::from_secs(60));
        ctx.cancel();
        assert_eq!(ctx.err(), Some(CancelReason::Cancelled));
    }

    #[test]
    fn deadline_timer_fires() {
        let ctx = Context::new().with_timeout(Duration::from_millis(5));
        assert!(ctx.deadline_timer().recv().is_ok());
        let no_deadline = Context::new();
        assert!(
            no_deadline
                .deadline_timer()
                .recv_timeout(Duration::from_millis(5))
                .is_err()
        );
    }
}
