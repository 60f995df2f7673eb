//! Delayed exit of launched software.
//!
//! An [`ExitTimer`] runs an action once after a delay unless cancelled
//! first. Cancel and fire race through a single compare-and-swap on the
//! timer state: whichever transition out of `Pending` wins decides the
//! outcome, so a cancelled timer never fires and a fired timer is never
//! interrupted mid-action.
//!
//! [`ExitTimerSlot`] holds at most one timer and replaces it on restart.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

const PENDING: u8 = 0;
const FIRED: u8 = 1;
const CANCELLED: u8 = 2;

/// Lifecycle of an exit timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    /// Waiting for the delay to elapse.
    Pending,

    /// The delay elapsed and the action ran or is running.
    Fired,

    /// Cancelled before firing.
    Cancelled,
}

/// Handle to one scheduled exit.
#[derive(Debug)]
pub struct ExitTimer {
    state: Arc<AtomicU8>,
    task: JoinHandle<()>,
}

impl ExitTimer {
    /// Schedule `action` to run after `delay`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start<F>(delay: Duration, action: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let state = Arc::new(AtomicU8::new(PENDING));
        let task_state = Arc::clone(&state);

        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            if task_state
                .compare_exchange(PENDING, FIRED, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                debug!("Exit timer fired");
                action.await;
            }
        });

        Self { state, task }
    }

    /// Cancel the timer.
    ///
    /// Returns `true` if the timer was still pending and will now never
    /// fire, `false` if it had already fired or been cancelled.
    pub fn cancel(&self) -> bool {
        let cancelled = self
            .state
            .compare_exchange(PENDING, CANCELLED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();

        if cancelled {
            self.task.abort();
        }

        cancelled
    }

    pub fn state(&self) -> TimerState {
        match self.state.load(Ordering::Acquire) {
            PENDING => TimerState::Pending,
            FIRED => TimerState::Fired,
            _ => TimerState::Cancelled,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.state() == TimerState::Pending
    }
}

/// Single-timer slot owned by the scan pre-processor.
#[derive(Debug, Default)]
pub struct ExitTimerSlot {
    current: Option<ExitTimer>,
}

impl ExitTimerSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a timer, cancelling any timer already in the slot.
    pub fn start<F>(&mut self, delay: Duration, action: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if let Some(previous) = self.current.take()
            && previous.cancel()
        {
            debug!("Cancelling previous exit timer");
        }

        debug!("Exit timer scheduled in {:?}", delay);
        self.current = Some(ExitTimer::start(delay, action));
    }

    /// Cancel the timer in the slot, if any.
    ///
    /// Returns `true` only if a pending timer was stopped before firing.
    /// The slot is empty afterwards either way.
    pub fn cancel(&mut self) -> bool {
        self.current.take().is_some_and(|timer| timer.cancel())
    }

    /// Whether the slot holds a timer at all, pending or not.
    pub fn is_occupied(&self) -> bool {
        self.current.is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.current.as_ref().is_some_and(ExitTimer::is_pending)
    }
}
