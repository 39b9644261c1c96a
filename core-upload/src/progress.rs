//! Progress reporting for a single transfer.
//!
//! The multipart transport does not expose byte-level progress, so by default
//! a [`ProgressSimulator`] ticks towards a cap while the request is
//! outstanding. Transports that can observe real progress get a
//! [`ProgressSink`] instead and no simulation runs.

use core_async::sync::CancellationToken;
use core_async::task::JoinHandle;
use core_async::time::{sleep, Duration};
use core_documents::ProgressSink;
use std::sync::Arc;
use tracing::trace;

use crate::entry::MAX_IN_FLIGHT_PROGRESS;

/// How progress of one transfer is produced.
pub enum ProgressTracker {
    Simulated(ProgressSimulator),
    Reported(ProgressSink),
}

impl ProgressTracker {
    /// Sink handed to the transport, if it reports real progress.
    pub fn sink(&self) -> Option<ProgressSink> {
        match self {
            ProgressTracker::Simulated(_) => None,
            ProgressTracker::Reported(sink) => Some(sink.clone()),
        }
    }

    pub fn finish(self) {
        if let ProgressTracker::Simulated(mut simulator) = self {
            simulator.stop();
        }
    }
}

/// Wrap `on_progress` so reported values stay below 100.
pub fn reported<F>(on_progress: F) -> ProgressSink
where
    F: Fn(u8) + Send + Sync + 'static,
{
    Arc::new(move |percent: u8| on_progress(percent.min(MAX_IN_FLIGHT_PROGRESS)))
}

/// Ticking task that raises progress by `step` every `tick` until `cap`.
///
/// Stopping (or dropping) cancels the task; no tick is delivered afterwards.
pub struct ProgressSimulator {
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl ProgressSimulator {
    pub fn start<F>(tick: Duration, step: u8, cap: u8, on_progress: F) -> Self
    where
        F: Fn(u8) + Send + Sync + 'static,
    {
        let token = CancellationToken::new();
        let child = token.clone();
        let cap = cap.min(MAX_IN_FLIGHT_PROGRESS);
        let step = step.max(1);

        let handle = core_async::spawn(async move {
            let mut percent = 0u8;
            while percent < cap {
                core_async::select! {
                    biased;
                    _ = child.cancelled() => return,
                    _ = sleep(tick) => {}
                }

                if child.is_cancelled() {
                    return;
                }

                percent = percent.saturating_add(step).min(cap);
                trace!(percent, "Simulated upload progress");
                on_progress(percent);
            }
        });

        Self {
            token,
            handle: Some(handle),
        }
    }

    pub fn stop(&mut self) {
        self.token.cancel();
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for ProgressSimulator {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    fn recorder() -> (Arc<Mutex<Vec<u8>>>, impl Fn(u8) + Send + Sync + 'static) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        (seen, move |p| sink.lock().push(p))
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulation_climbs_to_cap() {
        let (seen, on_progress) = recorder();
        let sim = ProgressSimulator::start(Duration::from_millis(200), 30, 90, on_progress);

        sleep(Duration::from_millis(2_000)).await;

        assert_eq!(*seen.lock(), vec![30, 60, 90]);
        assert!(!sim.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_step_does_not_overshoot_cap() {
        let (seen, on_progress) = recorder();
        let _sim = ProgressSimulator::start(Duration::from_millis(100), 40, 90, on_progress);

        sleep(Duration::from_millis(1_000)).await;

        assert_eq!(*seen.lock(), vec![40, 80, 90]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_halts_ticks() {
        let (seen, on_progress) = recorder();
        let mut sim = ProgressSimulator::start(Duration::from_millis(200), 10, 90, on_progress);

        sleep(Duration::from_millis(450)).await;
        sim.stop();
        sleep(Duration::from_millis(2_000)).await;

        assert_eq!(*seen.lock(), vec![10, 20]);
        assert!(!sim.is_running());
    }

    #[test]
    fn test_reported_progress_clamped() {
        let (seen, on_progress) = recorder();
        let sink = reported(on_progress);
        sink(45);
        sink(100);

        assert_eq!(*seen.lock(), vec![45, MAX_IN_FLIGHT_PROGRESS]);
    }
}
