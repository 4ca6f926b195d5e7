/// Hub metrics
///
/// Lock-free counters updated by the dispatch engine and session handlers,
/// exposed as a serializable snapshot on the stats endpoint.
use serde::Serialize;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct HubMetrics {
    /// Sessions opened (lifetime)
    sessions_opened: AtomicU64,

    /// Currently open session handlers
    active_sessions: AtomicUsize,

    /// Sessions replaced by a newer connection for the same recipient
    sessions_superseded: AtomicU64,

    /// Notifications queued onto a live session
    notifications_delivered: AtomicU64,

    /// Live deliveries dropped (session queue full or closed)
    deliveries_dropped: AtomicU64,

    /// Notifications written to the store
    notifications_persisted: AtomicU64,

    /// Store writes that failed
    persist_failures: AtomicU64,

    /// Backlog batches queued onto a live session
    backlogs_sent: AtomicU64,

    /// Dispatch jobs refused after shutdown
    dispatches_rejected: AtomicU64,
}

impl HubMetrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn session_opened(&self) {
        self.sessions_opened.fetch_add(1, Ordering::Relaxed);
        self.active_sessions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn session_closed(&self) {
        // Saturating: never wrap below zero
        let _ = self
            .active_sessions
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));
    }

    pub fn session_superseded(&self) {
        self.sessions_superseded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn notification_delivered(&self) {
        self.notifications_delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn delivery_dropped(&self) {
        self.deliveries_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn notification_persisted(&self) {
        self.notifications_persisted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn persist_failed(&self) {
        self.persist_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn backlog_sent(&self) {
        self.backlogs_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dispatch_rejected(&self) {
        self.dispatches_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> HubMetricsSnapshot {
        HubMetricsSnapshot {
            sessions_opened: self.sessions_opened.load(Ordering::Relaxed),
            active_sessions: self.active_sessions.load(Ordering::Relaxed),
            sessions_superseded: self.sessions_superseded.load(Ordering::Relaxed),
            notifications_delivered: self.notifications_delivered.load(Ordering::Relaxed),
            deliveries_dropped: self.deliveries_dropped.load(Ordering::Relaxed),
            notifications_persisted: self.notifications_persisted.load(Ordering::Relaxed),
            persist_failures: self.persist_failures.load(Ordering::Relaxed),
            backlogs_sent: self.backlogs_sent.load(Ordering::Relaxed),
            dispatches_rejected: self.dispatches_rejected.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HubMetricsSnapshot {
    pub sessions_opened: u64,
    pub active_sessions: usize,
    pub sessions_superseded: u64,
    pub notifications_delivered: u64,
    pub deliveries_dropped: u64,
    pub notifications_persisted: u64,
    pub persist_failures: u64,
    pub backlogs_sent: u64,
    pub dispatches_rejected: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hub_metrics() {
        let metrics = HubMetrics::new();

        metrics.session_opened();
        metrics.session_opened();
        metrics.session_closed();
        metrics.session_superseded();
        metrics.notification_delivered();
        metrics.delivery_dropped();
        metrics.notification_persisted();
        metrics.notification_persisted();
        metrics.persist_failed();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.sessions_opened, 2);
        assert_eq!(snapshot.active_sessions, 1);
        assert_eq!(snapshot.sessions_superseded, 1);
        assert_eq!(snapshot.notifications_delivered, 1);
        assert_eq!(snapshot.deliveries_dropped, 1);
        assert_eq!(snapshot.notifications_persisted, 2);
        assert_eq!(snapshot.persist_failures, 1);
        assert_eq!(snapshot.backlogs_sent, 0);
    }

    #[test]
    fn test_active_sessions_never_underflow() {
        let metrics = HubMetrics::new();
        metrics.session_closed();
        assert_eq!(metrics.snapshot().active_sessions, 0);
    }
}
