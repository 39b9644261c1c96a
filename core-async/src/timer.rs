//! Replaceable delayed tasks.
//!
//! A [`TimerSlot`] owns at most one pending timer. Scheduling a new timer
//! aborts the previous one first, so the slot behaves like a debounce: only
//! the most recently scheduled task can ever fire. Clearing is explicit and
//! deterministic; dropping the slot clears it as well.
//!
//! ```rust
//! use core_async::{TimerSlot, Duration};
//!
//! # async fn example() {
//! let mut slot = TimerSlot::new("debounce");
//! slot.schedule(Duration::from_millis(300), async { /* first */ });
//! slot.schedule(Duration::from_millis(300), async { /* only this one runs */ });
//! # }
//! ```

use crate::task::{spawn, JoinHandle};
use crate::time::{sleep, Duration};
use std::fmt;
use std::future::Future;
use tracing::trace;

/// Single owned pending timer.
pub struct TimerSlot {
    name: &'static str,
    handle: Option<JoinHandle<()>>,
}

impl TimerSlot {
    /// Create an empty slot. `name` only shows up in trace logs.
    pub fn new(name: &'static str) -> Self {
        Self { name, handle: None }
    }

    /// Schedule `task` to run after `delay`, replacing any pending timer.
    ///
    /// A zero delay still defers the task to the runtime instead of running
    /// it inline.
    pub fn schedule<F>(&mut self, delay: Duration, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.clear() {
            trace!(timer = self.name, "replaced pending timer");
        }

        self.handle = Some(spawn(async move {
            if !delay.is_zero() {
                sleep(delay).await;
            }
            task.await;
        }));
    }

    /// Abort the pending timer, if any.
    ///
    /// Returns `true` when a timer that had not yet finished was aborted.
    /// Calling this from inside the scheduled task itself only takes effect
    /// at that task's next suspension point.
    pub fn clear(&mut self) -> bool {
        match self.handle.take() {
            Some(handle) => {
                let pending = !handle.is_finished();
                handle.abort();
                pending
            }
            None => false,
        }
    }

    /// Whether a scheduled task has not finished yet.
    pub fn is_pending(&self) -> bool {
        self.handle
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }
}

impl Drop for TimerSlot {
    fn drop(&mut self) {
        self.clear();
    }
}

impl fmt::Debug for TimerSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerSlot")
            .field("name", &self.name)
            .field("pending", &self.is_pending())
            .finish()
    }
}
