//! Poll orchestrator
//!
//! Wires one collection to its list store and repeating executor:
//! load the list, start polling if anything is in flight, merge status on
//! every tick, and once nothing is in flight stop and reload the full list.

use std::sync::{Arc, Weak};

use anyhow::{Result, anyhow};
use kiln_core::tracking::{has_in_flight_items, reconcile};
use tokio::sync::watch;
use tokio::time::Duration;
use tracing::debug;

use crate::notify::Notifier;
use crate::scheduler::collection::Collection;
use crate::scheduler::executor::RepeatingExecutor;
use crate::store::ListStore;

/// Polling reconciliation loop for one collection
pub struct PollOrchestrator<C: Collection> {
    inner: Arc<Inner<C>>,
}

impl<C: Collection> Clone for PollOrchestrator<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct Inner<C: Collection> {
    collection: C,
    store: ListStore<C::Item>,
    executor: RepeatingExecutor,
    notifier: Arc<dyn Notifier>,
    interval: Duration,
    /// Number of reloads and ticks currently running
    busy: watch::Sender<usize>,
}

/// Marks the orchestrator busy until dropped
struct BusyGuard<'a>(&'a watch::Sender<usize>);

impl<'a> BusyGuard<'a> {
    fn enter(busy: &'a watch::Sender<usize>) -> Self {
        busy.send_modify(|count| *count += 1);
        Self(busy)
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.send_modify(|count| *count -= 1);
    }
}

impl<C: Collection> PollOrchestrator<C> {
    /// Creates an orchestrator writing into `store`
    pub fn new(
        collection: C,
        store: ListStore<C::Item>,
        notifier: Arc<dyn Notifier>,
        interval: Duration,
    ) -> Self {
        let executor = RepeatingExecutor::new(collection.name());
        let (busy, _) = watch::channel(0);
        Self {
            inner: Arc::new(Inner {
                collection,
                store,
                executor,
                notifier,
                interval,
                busy,
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        self.inner.collection.name()
    }

    /// Sink for notices about this collection
    pub fn notifier(&self) -> &dyn Notifier {
        self.inner.notifier.as_ref()
    }

    pub fn store(&self) -> &ListStore<C::Item> {
        &self.inner.store
    }

    pub fn is_polling(&self) -> bool {
        self.inner.executor.is_running()
    }

    /// Replace the list with a fresh full fetch
    ///
    /// Starts polling when the fresh list has items in flight. A failed fetch
    /// is reported to the user and stops polling.
    pub async fn reload_list(&self) -> Result<()> {
        let _busy = BusyGuard::enter(&self.inner.busy);
        let name = self.inner.collection.name();

        match self.inner.collection.list().await {
            Ok(items) => {
                let in_flight = has_in_flight_items(&items);
                debug!("Loaded {} {} (in flight: {})", items.len(), name, in_flight);
                self.inner.store.replace(items);
                if in_flight {
                    self.start_polling();
                }
                Ok(())
            }
            Err(e) => {
                self.inner.executor.stop();
                self.inner
                    .notifier
                    .error(format!("Failed to load {}: {:#}", name, e));
                Err(e)
            }
        }
    }

    /// Start polling status at the configured interval
    ///
    /// Commands call this after a request that creates backend work, since
    /// nothing else tells the orchestrator that new work exists.
    ///
    /// # Returns
    /// `false` if polling was already running
    pub fn start_polling(&self) -> bool {
        let weak: Weak<Inner<C>> = Arc::downgrade(&self.inner);
        self.inner.executor.start(
            move || {
                let weak = weak.clone();
                async move {
                    let inner = weak
                        .upgrade()
                        .ok_or_else(|| anyhow!("orchestrator dropped"))?;
                    let orchestrator = PollOrchestrator { inner };
                    orchestrator.poll_tick().await
                }
            },
            self.inner.interval,
        )
    }

    /// One polling step
    ///
    /// Fetches status, merges it into the held list and, once nothing is in
    /// flight, stops polling and reloads the full list. A failed fetch is
    /// reported and returned, which ends polling without retry.
    pub async fn poll_tick(&self) -> Result<()> {
        let _busy = BusyGuard::enter(&self.inner.busy);
        let name = self.inner.collection.name();

        let updates = match self.inner.collection.status().await {
            Ok(updates) => updates,
            Err(e) => {
                self.inner
                    .notifier
                    .error(format!("Failed to refresh {} status: {:#}", name, e));
                return Err(e);
            }
        };

        let reconciled = self
            .inner
            .store
            .update(|current| reconcile(current, &updates));

        if !has_in_flight_items(reconciled.as_slice()) {
            self.inner
                .notifier
                .info(format!("All {} settled, reloading", name));
            self.inner.executor.stop();
            self.reload_list().await?;
        }

        Ok(())
    }

    /// Resolves once polling stopped and no tick or reload is running
    pub async fn wait_settled(&self) {
        let mut busy = self.inner.busy.subscribe();
        loop {
            // The sender lives in `inner`, which `self` keeps alive.
            let _ = busy.wait_for(|count| *count == 0).await;
            if !self.inner.executor.is_running() {
                return;
            }
            self.inner.executor.wait_idle().await;
        }
    }

    /// Stop polling; safe to call any number of times
    pub fn shutdown(&self) {
        self.inner.executor.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{Level, RecordingNotifier};
    use crate::scheduler::testing::{FakeCollection, Script, dataset, dataset_status};
    use kiln_core::domain::dataset::{Dataset, DatasetStatus};
    use kiln_core::domain::model::{Model, ModelStatus};
    use kiln_core::domain::status::JobStatus;

    fn model(id: i64, status: &str, map50: Option<f64>) -> Model {
        Model {
            id,
            model_name: format!("model-{}", id),
            version: Some(1),
            map50,
            map50_95: None,
            precision: None,
            recall: None,
            classes: None,
            status: JobStatus::from(status),
            is_deploy: false,
            base_model: None,
        }
    }

    fn model_status(id: i64, status: &str) -> ModelStatus {
        ModelStatus {
            id,
            model_name: format!("model-{}", id),
            status: JobStatus::from(status),
        }
    }

    fn orchestrator<C: Collection>(
        collection: C,
        notifier: &Arc<RecordingNotifier>,
    ) -> PollOrchestrator<C> {
        let notifier: Arc<dyn Notifier> = notifier.clone();
        PollOrchestrator::new(
            collection,
            ListStore::new(),
            notifier,
            Duration::from_millis(500),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_dataset_polls_until_complete_then_reloads() {
        let fake = Arc::new(FakeCollection {
            lists: Script::new(vec![
                Ok(vec![dataset(1, "pending")]),
                Ok(vec![dataset(1, "complete")]),
            ]),
            statuses: Script::new(vec![Ok(vec![dataset_status(1, "complete")])]),
        });
        let notifier = Arc::new(RecordingNotifier::default());
        let orch = orchestrator(Arc::clone(&fake), &notifier);

        orch.reload_list().await.unwrap();
        assert!(orch.is_polling());

        orch.wait_settled().await;

        assert!(!orch.is_polling());
        assert_eq!(fake.statuses.calls(), 1);
        assert_eq!(fake.lists.calls(), 2);
        assert_eq!(orch.store().snapshot()[0].status, JobStatus::Complete);
        let notices = notifier.take();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, Level::Info);
        assert_eq!(notices[0].message, "All datasets settled, reloading");
    }

    #[tokio::test(start_paused = true)]
    async fn test_settled_list_does_not_poll() {
        let fake = Arc::new(FakeCollection {
            lists: Script::new(vec![Ok(vec![dataset(1, "complete"), dataset(2, "failed")])]),
            statuses: Script::new(vec![Ok(vec![])]),
        });
        let notifier = Arc::new(RecordingNotifier::default());
        let orch = orchestrator(Arc::clone(&fake), &notifier);

        orch.reload_list().await.unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert!(!orch.is_polling());
        assert_eq!(fake.statuses.calls(), 0);
        assert_eq!(orch.store().snapshot().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_keeps_fields_status_endpoint_lacks() {
        let fake = Arc::new(FakeCollection {
            lists: Script::new(vec![Ok(vec![dataset(1, "pending"), dataset(2, "pending")])]),
            statuses: Script::new(vec![Ok(vec![dataset_status(2, "running")])]),
        });
        let notifier = Arc::new(RecordingNotifier::default());
        let orch = orchestrator(Arc::clone(&fake), &notifier);

        orch.reload_list().await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        let list = orch.store().snapshot();
        assert_eq!(list[0], dataset(1, "pending"));
        assert_eq!(list[1], dataset(2, "running"));
        assert!(orch.is_polling());
        orch.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_tick_notifies_and_halts() {
        let fake = Arc::new(FakeCollection {
            lists: Script::new(vec![Ok(vec![dataset(1, "running")])]),
            statuses: Script::new(vec![Err("connection refused".to_string())]),
        });
        let notifier = Arc::new(RecordingNotifier::default());
        let orch = orchestrator(Arc::clone(&fake), &notifier);

        orch.reload_list().await.unwrap();
        orch.wait_settled().await;
        tokio::time::sleep(Duration::from_secs(3)).await;

        assert!(!orch.is_polling());
        assert_eq!(fake.statuses.calls(), 1);
        let errors = notifier.errors();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("connection refused"));
        assert_eq!(orch.store().snapshot()[0].status, JobStatus::Running);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_reload_notifies_and_stops() {
        let fake = Arc::new(FakeCollection::<Dataset, DatasetStatus> {
            lists: Script::new(vec![Err("502 bad gateway".to_string())]),
            statuses: Script::new(vec![Ok(vec![])]),
        });
        let notifier = Arc::new(RecordingNotifier::default());
        let orch = orchestrator(Arc::clone(&fake), &notifier);

        assert!(orch.reload_list().await.is_err());
        assert!(!orch.is_polling());
        assert_eq!(notifier.errors().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_model_progress_keeps_polling() {
        let fake = Arc::new(FakeCollection {
            lists: Script::new(vec![
                Ok(vec![model(3, "pending", None)]),
                Ok(vec![model(3, "complete", Some(0.91))]),
            ]),
            statuses: Script::new(vec![
                Ok(vec![model_status(3, "20")]),
                Ok(vec![model_status(3, "80")]),
                Ok(vec![model_status(3, "complete")]),
            ]),
        });
        let notifier = Arc::new(RecordingNotifier::default());
        let orch = orchestrator(Arc::clone(&fake), &notifier);

        orch.reload_list().await.unwrap();
        orch.wait_settled().await;

        assert_eq!(fake.statuses.calls(), 3);
        assert_eq!(fake.lists.calls(), 2);
        assert_eq!(orch.store().snapshot()[0].map50, Some(0.91));
    }

    #[tokio::test(start_paused = true)]
    async fn test_explicit_rearm_after_settled_load() {
        let fake = Arc::new(FakeCollection {
            lists: Script::new(vec![
                Ok(vec![dataset(1, "complete")]),
                Ok(vec![dataset(1, "complete"), dataset(2, "complete")]),
            ]),
            statuses: Script::new(vec![Ok(vec![dataset_status(1, "complete")])]),
        });
        let notifier = Arc::new(RecordingNotifier::default());
        let orch = orchestrator(Arc::clone(&fake), &notifier);

        orch.reload_list().await.unwrap();
        assert!(!orch.is_polling());

        assert!(orch.start_polling());
        assert!(!orch.start_polling());
        orch.wait_settled().await;

        // One tick found nothing in flight and reloaded the full list.
        assert_eq!(fake.statuses.calls(), 1);
        assert_eq!(orch.store().snapshot().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_orchestrator_ends_polling() {
        let fake = Arc::new(FakeCollection {
            lists: Script::new(vec![Ok(vec![dataset(1, "pending")])]),
            statuses: Script::new(vec![Ok(vec![dataset_status(1, "pending")])]),
        });
        let notifier = Arc::new(RecordingNotifier::default());
        let orch = orchestrator(Arc::clone(&fake), &notifier);

        orch.reload_list().await.unwrap();
        tokio::time::sleep(Duration::from_millis(1200)).await;
        drop(orch);
        let calls = fake.statuses.calls();
        tokio::time::sleep(Duration::from_secs(3)).await;

        assert_eq!(fake.statuses.calls(), calls);
    }
}
