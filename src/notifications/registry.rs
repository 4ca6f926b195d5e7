/// Connection registry - recipient → live session directory
///
/// At most one session handle per recipient. `register` replaces any
/// previous handle and hands it back to the caller; dropping that handle
/// closes the superseded session's outbound queue, which ends its loop.
///
/// A single RwLock guards the map and is held only for the map operation.
/// Sending never happens under the lock: `lookup` returns a cloned handle
/// and `SessionHandle::deliver` is a non-blocking queue push.
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tokio::sync::{mpsc, RwLock};

use super::protocol::ServerMessage;
use super::types::RecipientId;

/// Connection ID (unique per accepted WebSocket connection)
pub type ConnectionId = u64;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("session queue is full")] QueueFull,

    #[error("session is closed")] SessionClosed,
}

/// Handle to one live session: its connection id and outbound queue
#[derive(Debug, Clone)]
pub struct SessionHandle {
    connection_id: ConnectionId,
    sender: mpsc::Sender<ServerMessage>,
}

impl SessionHandle {
    pub fn new(connection_id: ConnectionId, sender: mpsc::Sender<ServerMessage>) -> Self {
        Self {
            connection_id,
            sender,
        }
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    /// Queue a message for the session's writer without waiting
    pub fn deliver(&self, message: ServerMessage) -> Result<(), DeliveryError> {
        self.sender.try_send(message).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => DeliveryError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => DeliveryError::SessionClosed,
        })
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

#[derive(Debug)]
pub struct ConnectionRegistry {
    sessions: RwLock<HashMap<RecipientId, SessionHandle>>,
    next_connection_id: AtomicU64,
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            next_connection_id: AtomicU64::new(1),
        }
    }
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_connection_id(&self) -> ConnectionId {
        self.next_connection_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Install `session` for `recipient_id`, returning the handle it replaced
    pub async fn register(&self, recipient_id: &str, session: SessionHandle) -> Option<SessionHandle> {
        self.sessions
            .write()
            .await
            .insert(recipient_id.to_string(), session)
    }

    /// Current session for a recipient (cloned, lock released on return)
    pub async fn lookup(&self, recipient_id: &str) -> Option<SessionHandle> {
        self.sessions.read().await.get(recipient_id).cloned()
    }

    /// Remove the mapping for a recipient. No-op when absent.
    pub async fn remove(&self, recipient_id: &str) -> Option<SessionHandle> {
        self.sessions.write().await.remove(recipient_id)
    }

    /// Remove the mapping only if it still belongs to `connection_id`
    ///
    /// A superseded session tearing down must not evict its successor.
    pub async fn remove_session(&self, recipient_id: &str, connection_id: ConnectionId) -> bool {
        let mut sessions = self.sessions.write().await;
        match sessions.get(recipient_id) {
            Some(current) if current.connection_id() == connection_id => {
                sessions.remove(recipient_id);
                true
            }
            _ => false,
        }
    }

    /// Drop every handle (shutdown). Returns how many were registered.
    pub async fn clear(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let count = sessions.len();
        sessions.clear();
        count
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::types::Notification;

    fn session(registry: &ConnectionRegistry) -> (SessionHandle, mpsc::Receiver<ServerMessage>) {
        let (tx, rx) = mpsc::channel(4);
        (SessionHandle::new(registry.next_connection_id(), tx), rx)
    }

    #[tokio::test]
    async fn test_register_lookup_remove() {
        let registry = ConnectionRegistry::new();
        let (handle, _rx) = session(&registry);
        let id = handle.connection_id();

        assert!(registry.register("U1", handle).await.is_none());
        assert_eq!(registry.lookup("U1").await.map(|h| h.connection_id()), Some(id));
        assert!(registry.lookup("U2").await.is_none());

        assert!(registry.remove("U1").await.is_some());
        assert!(registry.remove("U1").await.is_none());
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_register_supersedes_previous() {
        let registry = ConnectionRegistry::new();
        let (first, mut first_rx) = session(&registry);
        let (second, _second_rx) = session(&registry);
        let first_id = first.connection_id();
        let second_id = second.connection_id();

        registry.register("U1", first).await;
        let replaced = registry.register("U1", second).await.unwrap();
        assert_eq!(replaced.connection_id(), first_id);
        assert_eq!(registry.len().await, 1);

        // Dropping the replaced handle closes the old queue
        drop(replaced);
        assert!(first_rx.recv().await.is_none());

        // Old connection cannot evict its successor
        assert!(!registry.remove_session("U1", first_id).await);
        assert_eq!(registry.lookup("U1").await.map(|h| h.connection_id()), Some(second_id));
        assert!(registry.remove_session("U1", second_id).await);
        assert!(registry.lookup("U1").await.is_none());
    }

    #[tokio::test]
    async fn test_deliver_reports_full_and_closed() {
        let (tx, rx) = mpsc::channel(1);
        let handle = SessionHandle::new(1, tx);
        let message = ServerMessage::Notification(Notification::new("U1", "t", "b"));

        assert_eq!(handle.deliver(message.clone()), Ok(()));
        assert_eq!(handle.deliver(message.clone()), Err(DeliveryError::QueueFull));

        drop(rx);
        assert!(handle.is_closed());
        assert_eq!(handle.deliver(message), Err(DeliveryError::SessionClosed));
    }

    #[tokio::test]
    async fn test_clear_drops_all_sessions() {
        let registry = ConnectionRegistry::new();
        let (a, mut a_rx) = session(&registry);
        let (b, mut b_rx) = session(&registry);
        registry.register("U1", a).await;
        registry.register("U2", b).await;

        assert_eq!(registry.clear().await, 2);
        assert!(a_rx.recv().await.is_none());
        assert!(b_rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_concurrent_registration_across_recipients() {
        let registry = std::sync::Arc::new(ConnectionRegistry::new());
        let mut tasks = Vec::new();
        for i in 0..32 {
            let registry = registry.clone();
            tasks.push(tokio::spawn(async move {
                let (tx, rx) = mpsc::channel(1);
                let handle = SessionHandle::new(registry.next_connection_id(), tx);
                registry.register(&format!("U{}", i), handle).await;
                assert!(registry.lookup(&format!("U{}", i)).await.is_some());
                rx
            }));
        }

        let mut receivers = Vec::new();
        for task in tasks {
            receivers.push(task.await.unwrap());
        }
        assert_eq!(registry.len().await, 32);
    }
}
