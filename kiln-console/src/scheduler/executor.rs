//! Repeating executor
//!
//! Runs an async action over and over with a fixed pause between the end of
//! one run and the start of the next. At most one tick chain is active per
//! executor; a failed run ends the chain without retrying.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tokio::time::{self, Duration};
use tracing::{debug, warn};

/// Cancellable, self-rescheduling task runner
///
/// States are Idle and Running. `start` moves Idle to Running, a successful
/// tick re-arms the timer, and `stop` or a failed tick moves back to Idle.
pub struct RepeatingExecutor {
    name: String,
    shared: Arc<Shared>,
}

struct Shared {
    state: Mutex<State>,
    /// Mirrors `state.chain.is_some()` for observers
    running: watch::Sender<bool>,
}

#[derive(Default)]
struct State {
    generation: u64,
    chain: Option<Chain>,
}

/// Handle to the active tick chain
struct Chain {
    generation: u64,
    /// Flipped to `true` to cancel the pending sleep
    cancel: watch::Sender<bool>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Return to Idle after a failed tick, unless a newer chain took over
    fn finish(&self, generation: u64) {
        let mut state = self.lock();
        if state
            .chain
            .as_ref()
            .is_some_and(|chain| chain.generation == generation)
        {
            state.chain = None;
            self.running.send_replace(false);
        }
    }
}

impl RepeatingExecutor {
    /// Creates an idle executor; `name` only appears in logs
    pub fn new(name: impl Into<String>) -> Self {
        let (running, _) = watch::channel(false);
        Self {
            name: name.into(),
            shared: Arc::new(Shared {
                state: Mutex::new(State::default()),
                running,
            }),
        }
    }

    /// Starts a tick chain running `action` every `interval`
    ///
    /// The first run happens immediately. Each following run waits `interval`
    /// after the previous one finished, so runs never overlap and slow runs
    /// stretch the period.
    ///
    /// # Returns
    /// `false` without doing anything if a chain is already active
    pub fn start<F, Fut>(&self, mut action: F, interval: Duration) -> bool
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let mut state = self.shared.lock();
        if state.chain.is_some() {
            debug!("{} poller already running", self.name);
            return false;
        }

        state.generation += 1;
        let generation = state.generation;
        let (cancel, mut cancelled) = watch::channel(false);
        state.chain = Some(Chain { generation, cancel });
        self.shared.running.send_replace(true);
        drop(state);

        debug!("Starting {} poller (interval: {:?})", self.name, interval);

        let shared = Arc::clone(&self.shared);
        let name = self.name.clone();
        tokio::spawn(async move {
            loop {
                let outcome = action().await;

                // Stopped while the run was in flight: schedule nothing more
                // and leave the state to whoever owns it now.
                if *cancelled.borrow() {
                    debug!("{} poller stopped during a tick", name);
                    return;
                }

                if let Err(e) = outcome {
                    warn!("{} poller tick failed, stopping: {:#}", name, e);
                    shared.finish(generation);
                    return;
                }

                tokio::select! {
                    _ = time::sleep(interval) => {}
                    _ = cancelled.wait_for(|stopped| *stopped) => {
                        debug!("{} poller cancelled before next tick", name);
                        return;
                    }
                }
            }
        });

        true
    }

    /// Cancels the pending tick and returns to Idle
    ///
    /// Idempotent. A run already in flight is allowed to finish, but nothing
    /// is scheduled after it.
    ///
    /// # Returns
    /// `true` if a chain was active
    pub fn stop(&self) -> bool {
        let mut state = self.shared.lock();
        match state.chain.take() {
            Some(chain) => {
                chain.cancel.send_replace(true);
                self.shared.running.send_replace(false);
                debug!("Stopped {} poller", self.name);
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self) -> bool {
        *self.shared.running.borrow()
    }

    /// Resolves once the executor is Idle
    pub async fn wait_idle(&self) {
        let mut running = self.shared.running.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = running.wait_for(|running| !*running).await;
    }
}

impl Drop for RepeatingExecutor {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_action(
        calls: &Arc<AtomicUsize>,
    ) -> impl FnMut() -> std::future::Ready<anyhow::Result<()>> + Send + 'static {
        let calls = Arc::clone(calls);
        move || {
            calls.fetch_add(1, Ordering::SeqCst);
            std::future::ready(Ok(()))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_repeat_at_interval() {
        let executor = RepeatingExecutor::new("test");
        let calls = Arc::new(AtomicUsize::new(0));

        assert!(executor.start(counting_action(&calls), Duration::from_millis(500)));
        time::sleep(Duration::from_millis(1200)).await;

        // Runs at 0, 500 and 1000 ms.
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(executor.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_start_is_noop() {
        let executor = RepeatingExecutor::new("test");
        let calls = Arc::new(AtomicUsize::new(0));

        assert!(executor.start(counting_action(&calls), Duration::from_millis(500)));
        assert!(!executor.start(counting_action(&calls), Duration::from_millis(500)));
        time::sleep(Duration::from_millis(1200)).await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_tick_stops_without_retry() {
        let executor = RepeatingExecutor::new("test");
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        executor.start(
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
                std::future::ready(Err(anyhow::anyhow!("backend down")))
            },
            Duration::from_millis(500),
        );
        executor.wait_idle().await;
        time::sleep(Duration::from_secs(3)).await;

        assert!(!executor.is_running());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_ticks_never_overlap() {
        let executor = RepeatingExecutor::new("test");
        let in_flight = Arc::new(AtomicUsize::new(0));
        let max_in_flight = Arc::new(AtomicUsize::new(0));
        let calls = Arc::new(AtomicUsize::new(0));

        let (active, peak, count) = (
            Arc::clone(&in_flight),
            Arc::clone(&max_in_flight),
            Arc::clone(&calls),
        );
        executor.start(
            move || {
                let (active, peak, count) = (
                    Arc::clone(&active),
                    Arc::clone(&peak),
                    Arc::clone(&count),
                );
                async move {
                    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    count.fetch_add(1, Ordering::SeqCst);
                    time::sleep(Duration::from_secs(2)).await;
                    active.fetch_sub(1, Ordering::SeqCst);
                    Ok(())
                }
            },
            Duration::from_millis(500),
        );
        time::sleep(Duration::from_millis(4900)).await;

        // Runs start at 0 and 2500 ms; the third would start at 5000 ms.
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(max_in_flight.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_pending_tick() {
        let executor = RepeatingExecutor::new("test");
        let calls = Arc::new(AtomicUsize::new(0));

        executor.start(counting_action(&calls), Duration::from_millis(500));
        time::sleep(Duration::from_millis(100)).await;
        assert!(executor.stop());
        time::sleep(Duration::from_secs(2)).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!executor.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_is_idempotent() {
        let executor = RepeatingExecutor::new("test");
        assert!(!executor.stop());

        let calls = Arc::new(AtomicUsize::new(0));
        executor.start(counting_action(&calls), Duration::from_millis(500));
        assert!(executor.stop());
        assert!(!executor.stop());
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_after_stop_survives_old_tick() {
        let executor = RepeatingExecutor::new("test");
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        // First chain fails after a slow run.
        executor.start(
            move || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    time::sleep(Duration::from_secs(1)).await;
                    Err(anyhow::anyhow!("late failure"))
                }
            },
            Duration::from_millis(500),
        );
        time::sleep(Duration::from_millis(100)).await;
        executor.stop();

        let second = Arc::new(AtomicUsize::new(0));
        assert!(executor.start(counting_action(&second), Duration::from_millis(500)));
        time::sleep(Duration::from_millis(1500)).await;

        // The old run's failure must not idle the new chain.
        assert!(executor.is_running());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(second.load(Ordering::SeqCst) >= 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_chain() {
        let calls = Arc::new(AtomicUsize::new(0));
        {
            let executor = RepeatingExecutor::new("test");
            executor.start(counting_action(&calls), Duration::from_millis(500));
            time::sleep(Duration::from_millis(100)).await;
        }
        time::sleep(Duration::from_secs(2)).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
