/// Dispatch engine - asynchronous delivery and persistence
///
/// `dispatch` and `dispatch_backlog` return immediately: they push a job onto
/// an unbounded queue drained by a fixed pool of worker tasks. The pool bounds
/// concurrent store and registry work; queued jobs are never refused while the
/// engine runs.
///
/// Per notification a worker:
/// 1. looks up the recipient's live session and queues the JSON object on it
/// 2. saves the notification to the store, whether or not step 1 succeeded
///
/// Jobs run concurrently across workers, so no ordering holds between two
/// dispatches for the same recipient.
use parking_lot::Mutex as SyncMutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use super::metrics::HubMetrics;
use super::protocol::ServerMessage;
use super::registry::ConnectionRegistry;
use super::store::NotificationStore;
use super::types::{Notification, RecipientId};
use crate::config::HubConfig;
use crate::logger::{self, LogTag};

#[derive(Debug)]
enum DispatchJob {
    Deliver(Notification),
    Backlog(RecipientId),
}

impl DispatchJob {
    fn describe(&self) -> String {
        match self {
            DispatchJob::Deliver(n) => {
                format!("notification {} for {}", n.id(), n.recipient_id())
            }
            DispatchJob::Backlog(recipient) => format!("unread backlog for {}", recipient),
        }
    }
}

/// Everything a worker needs to process a job
struct DispatchContext {
    registry: Arc<ConnectionRegistry>,
    store: Arc<dyn NotificationStore>,
    metrics: Arc<HubMetrics>,
}

pub struct DispatchEngine {
    jobs: mpsc::UnboundedSender<DispatchJob>,
    workers: SyncMutex<Vec<JoinHandle<()>>>,
    stopped: AtomicBool,
    metrics: Arc<HubMetrics>,
}

impl DispatchEngine {
    /// Spawn the worker pool. Must be called from within a tokio runtime.
    pub fn start(
        registry: Arc<ConnectionRegistry>,
        store: Arc<dyn NotificationStore>,
        metrics: Arc<HubMetrics>,
        config: &HubConfig,
    ) -> Self {
        let worker_count = config.dispatch_workers.max(1);
        let (tx, rx) = mpsc::unbounded_channel();
        let rx = Arc::new(Mutex::new(rx));

        let ctx = Arc::new(DispatchContext {
            registry,
            store,
            metrics: metrics.clone(),
        });

        let workers = (0..worker_count)
            .map(|worker_id| tokio::spawn(run_worker(worker_id, ctx.clone(), rx.clone())))
            .collect();

        logger::info(
            LogTag::Dispatch,
            &format!("Dispatch engine started (workers={})", worker_count),
        );

        Self {
            jobs: tx,
            workers: SyncMutex::new(workers),
            stopped: AtomicBool::new(false),
            metrics,
        }
    }

    /// Deliver to the live session (if any) and persist, asynchronously
    pub fn dispatch(&self, notification: Notification) {
        self.enqueue(DispatchJob::Deliver(notification));
    }

    /// Send the full unread backlog to the live session (if any), asynchronously
    pub fn dispatch_backlog(&self, recipient_id: &str) {
        self.enqueue(DispatchJob::Backlog(recipient_id.to_string()));
    }

    fn enqueue(&self, job: DispatchJob) {
        if self.stopped.load(Ordering::Acquire) {
            self.metrics.dispatch_rejected();
            logger::warning(
                LogTag::Dispatch,
                &format!("Hub is shut down, dropping {}", job.describe()),
            );
            return;
        }

        if let Err(mpsc::error::SendError(job)) = self.jobs.send(job) {
            self.metrics.dispatch_rejected();
            logger::warning(
                LogTag::Dispatch,
                &format!("Dispatch workers gone, dropping {}", job.describe()),
            );
        }
    }

    /// Stop accepting jobs and abort the workers. In-flight jobs are abandoned.
    pub fn stop(&self) {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return;
        }

        let workers: Vec<JoinHandle<()>> = self.workers.lock().drain(..).collect();
        for worker in &workers {
            worker.abort();
        }

        logger::info(
            LogTag::Dispatch,
            &format!("Dispatch engine stopped ({} workers aborted)", workers.len()),
        );
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }
}

impl Drop for DispatchEngine {
    fn drop(&mut self) {
        for worker in self.workers.lock().drain(..) {
            worker.abort();
        }
    }
}

async fn run_worker(
    worker_id: usize,
    ctx: Arc<DispatchContext>,
    jobs: Arc<Mutex<mpsc::UnboundedReceiver<DispatchJob>>>,
) {
    loop {
        // Lock only for the receive; processing runs unlocked
        let job = jobs.lock().await.recv().await;
        let Some(job) = job else {
            logger::debug(
                LogTag::Dispatch,
                &format!("Dispatch worker {} exiting (queue closed)", worker_id),
            );
            break;
        };

        match job {
            DispatchJob::Deliver(notification) => ctx.deliver(notification).await,
            DispatchJob::Backlog(recipient_id) => ctx.send_backlog(&recipient_id).await,
        }
    }
}

impl DispatchContext {
    async fn deliver(&self, notification: Notification) {
        let recipient_id = notification.recipient_id();

        if let Some(session) = self.registry.lookup(recipient_id).await {
            match session.deliver(ServerMessage::Notification(notification.clone())) {
                Ok(()) => {
                    self.metrics.notification_delivered();
                    logger::debug(
                        LogTag::Dispatch,
                        &format!(
                            "Queued notification {} on connection {} for {}",
                            notification.id(),
                            session.connection_id(),
                            recipient_id
                        ),
                    );
                }
                Err(e) => {
                    self.metrics.delivery_dropped();
                    logger::warning(
                        LogTag::Dispatch,
                        &format!(
                            "Live delivery of notification {} to {} failed: {}",
                            notification.id(),
                            recipient_id,
                            e
                        ),
                    );
                }
            }
        }

        match self.store.save_notification(&notification).await {
            Ok(()) => self.metrics.notification_persisted(),
            Err(e) => {
                self.metrics.persist_failed();
                logger::error(
                    LogTag::Store,
                    &format!(
                        "Failed to persist notification {} for {}: {}",
                        notification.id(),
                        recipient_id,
                        e
                    ),
                );
            }
        }
    }

    async fn send_backlog(&self, recipient_id: &str) {
        let unread = match self.store.fetch_unread_notifications(recipient_id).await {
            Ok(unread) => unread,
            Err(e) => {
                logger::error(
                    LogTag::Store,
                    &format!("Failed to fetch unread notifications for {}: {}", recipient_id, e),
                );
                return;
            }
        };

        let Some(session) = self.registry.lookup(recipient_id).await else {
            logger::debug(
                LogTag::Dispatch,
                &format!("No live session for {}, backlog not sent", recipient_id),
            );
            return;
        };

        let count = unread.len();
        match session.deliver(ServerMessage::Backlog(unread)) {
            Ok(()) => {
                self.metrics.backlog_sent();
                logger::debug(
                    LogTag::Dispatch,
                    &format!("Queued backlog of {} for {}", count, recipient_id),
                );
            }
            Err(e) => {
                self.metrics.delivery_dropped();
                logger::warning(
                    LogTag::Dispatch,
                    &format!("Backlog delivery to {} failed: {}", recipient_id, e),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{HubError, HubResult};
    use crate::notifications::registry::SessionHandle;
    use crate::notifications::store::MemoryNotificationStore;
    use crate::notifications::types::NotificationId;
    use async_trait::async_trait;
    use std::time::Duration;
    use tokio::time::timeout;

    fn engine_with(store: Arc<dyn NotificationStore>) -> (DispatchEngine, Arc<ConnectionRegistry>, Arc<HubMetrics>) {
        let registry = Arc::new(ConnectionRegistry::new());
        let metrics = HubMetrics::new();
        let engine = DispatchEngine::start(registry.clone(), store, metrics.clone(), &HubConfig::default());
        (engine, registry, metrics)
    }

    async fn wait_until<F: Fn() -> bool>(condition: F) {
        timeout(Duration::from_secs(5), async {
            while !condition() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("condition not reached in time");
    }

    /// Store whose writes always fail
    struct FailingStore;

    #[async_trait]
    impl NotificationStore for FailingStore {
        async fn save_notification(&self, _notification: &Notification) -> HubResult<()> {
            Err(HubError::storage("disk full"))
        }

        async fn fetch_unread_notifications(&self, _recipient_id: &str) -> HubResult<Vec<Notification>> {
            Err(HubError::storage("disk full"))
        }

        async fn mark_read(&self, _recipient_id: &str, _id: &NotificationId) -> HubResult<()> {
            Err(HubError::storage("disk full"))
        }
    }

    #[tokio::test]
    async fn test_dispatch_delivers_and_persists() {
        let store = Arc::new(MemoryNotificationStore::new());
        let (engine, registry, _metrics) = engine_with(store.clone());

        let (tx, mut rx) = mpsc::channel(8);
        registry.register("U1", SessionHandle::new(registry.next_connection_id(), tx)).await;

        let n = Notification::drug_validation("U1", "Drug not found");
        engine.dispatch(n.clone());

        let received = timeout(Duration::from_secs(5), rx.recv()).await.unwrap().unwrap();
        assert_eq!(received, ServerMessage::Notification(n.clone()));

        wait_until(|| store.total() == 1).await;
        assert_eq!(store.all_for("U1"), vec![n]);
    }

    #[tokio::test]
    async fn test_dispatch_without_session_still_persists() {
        let store = Arc::new(MemoryNotificationStore::new());
        let (engine, _registry, metrics) = engine_with(store.clone());

        engine.dispatch(Notification::welcome("U2"));

        wait_until(|| store.total() == 1).await;
        assert_eq!(metrics.snapshot().notifications_delivered, 0);
    }

    #[tokio::test]
    async fn test_delivery_survives_store_failure() {
        let (engine, registry, metrics) = engine_with(Arc::new(FailingStore));

        let (tx, mut rx) = mpsc::channel(8);
        registry.register("U1", SessionHandle::new(registry.next_connection_id(), tx)).await;

        engine.dispatch(Notification::welcome("U1"));
        assert!(timeout(Duration::from_secs(5), rx.recv()).await.unwrap().is_some());

        wait_until(|| metrics.snapshot().persist_failures == 1).await;
    }

    #[tokio::test]
    async fn test_full_session_queue_still_persists() {
        let store = Arc::new(MemoryNotificationStore::new());
        let (engine, registry, metrics) = engine_with(store.clone());

        // Capacity 1 and never drained
        let (tx, _rx) = mpsc::channel(1);
        registry.register("U1", SessionHandle::new(registry.next_connection_id(), tx)).await;

        engine.dispatch(Notification::new("U1", "one", ""));
        engine.dispatch(Notification::new("U1", "two", ""));

        wait_until(|| store.total() == 2).await;
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.notifications_delivered, 1);
        assert_eq!(snapshot.deliveries_dropped, 1);
    }

    #[tokio::test]
    async fn test_backlog_sends_all_unread_as_one_message() {
        let store = Arc::new(MemoryNotificationStore::new());
        let first = Notification::new("U1", "one", "");
        let second = Notification::new("U1", "two", "");
        store.save_notification(&first).await.unwrap();
        store.save_notification(&second).await.unwrap();

        let (engine, registry, _metrics) = engine_with(store.clone());
        let (tx, mut rx) = mpsc::channel(8);
        registry.register("U1", SessionHandle::new(registry.next_connection_id(), tx)).await;

        engine.dispatch_backlog("U1");
        let received = timeout(Duration::from_secs(5), rx.recv()).await.unwrap().unwrap();
        assert_eq!(received, ServerMessage::Backlog(vec![first, second]));
    }

    #[tokio::test]
    async fn test_backlog_fetch_failure_sends_nothing() {
        let (engine, registry, _metrics) = engine_with(Arc::new(FailingStore));
        let (tx, mut rx) = mpsc::channel(8);
        registry.register("U1", SessionHandle::new(registry.next_connection_id(), tx)).await;

        engine.dispatch_backlog("U1");
        assert!(timeout(Duration::from_millis(200), rx.recv()).await.is_err());
    }

    #[tokio::test]
    async fn test_burst_of_dispatches_is_fully_persisted() {
        let store = Arc::new(MemoryNotificationStore::new());
        let (engine, registry, metrics) = engine_with(store.clone());

        // Live session that is never drained: deliveries overflow, saves must not
        let (tx, _rx) = mpsc::channel(1);
        registry.register("U1", SessionHandle::new(registry.next_connection_id(), tx)).await;

        for i in 0..2000 {
            let recipient = if i % 2 == 0 { "U1" } else { "U2" };
            engine.dispatch(Notification::new(recipient, format!("burst {}", i), ""));
        }

        wait_until(|| store.total() == 2000).await;
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.notifications_persisted, 2000);
        assert_eq!(snapshot.dispatches_rejected, 0);
        assert_eq!(store.all_for("U1").len(), 1000);
    }

    #[tokio::test]
    async fn test_stopped_engine_rejects_jobs() {
        let store = Arc::new(MemoryNotificationStore::new());
        let (engine, _registry, metrics) = engine_with(store.clone());

        engine.stop();
        engine.stop();
        assert!(engine.is_stopped());

        engine.dispatch(Notification::welcome("U1"));
        assert_eq!(metrics.snapshot().dispatches_rejected, 1);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(store.total(), 0);
    }
}
