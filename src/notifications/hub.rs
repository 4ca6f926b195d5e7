/// Notification hub - composition root for the notification core
///
/// Owns the connection registry, the dispatch engine and the collaborator
/// handles. Producers call `dispatch`; the webserver hands accepted sockets
/// to `session::run_session` with a clone of the hub.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::dispatch::DispatchEngine;
use super::metrics::{HubMetrics, HubMetricsSnapshot};
use super::registry::ConnectionRegistry;
use super::store::{NotificationStore, UserValidator};
use super::types::Notification;
use crate::config::HubConfig;
use crate::logger::{self, LogTag};

pub struct NotificationHub {
    registry: Arc<ConnectionRegistry>,
    dispatcher: DispatchEngine,
    store: Arc<dyn NotificationStore>,
    validator: Arc<dyn UserValidator>,
    metrics: Arc<HubMetrics>,
    session_buffer_size: usize,
    shutting_down: AtomicBool,
}

impl NotificationHub {
    /// Build the hub and start its dispatch workers (requires a tokio runtime)
    pub fn new(
        store: Arc<dyn NotificationStore>,
        validator: Arc<dyn UserValidator>,
        config: HubConfig,
    ) -> Arc<Self> {
        let registry = Arc::new(ConnectionRegistry::new());
        let metrics = HubMetrics::new();
        let dispatcher = DispatchEngine::start(registry.clone(), store.clone(), metrics.clone(), &config);

        Arc::new(Self {
            registry,
            dispatcher,
            store,
            validator,
            metrics,
            session_buffer_size: config.session_buffer_size.max(1),
            shutting_down: AtomicBool::new(false),
        })
    }

    /// Deliver a notification to its recipient's live session and persist it
    ///
    /// Returns immediately; failures are logged, never reported to the caller.
    pub fn dispatch(&self, notification: Notification) {
        self.dispatcher.dispatch(notification);
    }

    /// Send every unread notification for `recipient_id` as one batch
    pub fn dispatch_unread_backlog(&self, recipient_id: &str) {
        self.dispatcher.dispatch_backlog(recipient_id);
    }

    pub async fn is_known_recipient(&self, recipient_id: &str) -> bool {
        self.validator.is_known_recipient(recipient_id).await
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    pub fn store(&self) -> &Arc<dyn NotificationStore> {
        &self.store
    }

    pub fn metrics(&self) -> &Arc<HubMetrics> {
        &self.metrics
    }

    pub fn metrics_snapshot(&self) -> HubMetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn session_buffer_size(&self) -> usize {
        self.session_buffer_size
    }

    pub async fn active_sessions(&self) -> usize {
        self.registry.len().await
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::Acquire)
    }

    /// Stop dispatching and close every live session
    ///
    /// Pending jobs are abandoned. Dropping the registry handles ends each
    /// session loop, which then sends a close frame to its client.
    pub async fn shutdown(&self) {
        if self.shutting_down.swap(true, Ordering::AcqRel) {
            return;
        }

        self.dispatcher.stop();
        let closed = self.registry.clear().await;

        logger::info(
            LogTag::Hub,
            &format!("Notification hub shut down ({} sessions closed)", closed),
        );
    }
}
