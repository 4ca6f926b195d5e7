/// Collaborator interfaces consumed by the hub
///
/// - `NotificationStore`: durable persistence of notifications
/// - `UserValidator`: known-recipient check used at handshake time
///
/// `MemoryNotificationStore` and `StaticUserDirectory` are the in-process
/// implementations used by tests and single-node demos.
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};

use super::types::{Notification, NotificationId, RecipientId};
use crate::errors::HubResult;

#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Persist a new notification
    async fn save_notification(&self, notification: &Notification) -> HubResult<()>;

    /// All unread notifications for a recipient, oldest first
    async fn fetch_unread_notifications(&self, recipient_id: &str) -> HubResult<Vec<Notification>>;

    /// Mark one notification read. Unknown ids are not an error.
    async fn mark_read(&self, recipient_id: &str, notification_id: &NotificationId) -> HubResult<()>;
}

#[async_trait]
pub trait UserValidator: Send + Sync {
    async fn is_known_recipient(&self, recipient_id: &str) -> bool;
}

// ============================================================================
// IN-MEMORY STORE
// ============================================================================

/// Notifications grouped per recipient in insertion order
///
/// Read notifications stay in the list (flagged) and are filtered out of the
/// unread view.
#[derive(Default)]
pub struct MemoryNotificationStore {
    notifications: RwLock<HashMap<RecipientId, Vec<Notification>>>,
}

impl MemoryNotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored notification for a recipient, read or not
    pub fn all_for(&self, recipient_id: &str) -> Vec<Notification> {
        self.notifications
            .read()
            .get(recipient_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn total(&self) -> usize {
        self.notifications.read().values().map(Vec::len).sum()
    }
}

#[async_trait]
impl NotificationStore for MemoryNotificationStore {
    async fn save_notification(&self, notification: &Notification) -> HubResult<()> {
        self.notifications
            .write()
            .entry(notification.recipient_id().to_string())
            .or_default()
            .push(notification.clone());
        Ok(())
    }

    async fn fetch_unread_notifications(&self, recipient_id: &str) -> HubResult<Vec<Notification>> {
        Ok(self
            .notifications
            .read()
            .get(recipient_id)
            .map(|list| list.iter().filter(|n| !n.is_read()).cloned().collect())
            .unwrap_or_default())
    }

    async fn mark_read(&self, recipient_id: &str, notification_id: &NotificationId) -> HubResult<()> {
        if let Some(list) = self.notifications.write().get_mut(recipient_id) {
            if let Some(notification) = list.iter_mut().find(|n| n.id() == notification_id) {
                notification.mark_read();
            }
        }
        Ok(())
    }
}

// ============================================================================
// STATIC USER DIRECTORY
// ============================================================================

/// Fixed set of known recipients
#[derive(Default)]
pub struct StaticUserDirectory {
    users: HashSet<RecipientId>,
}

impl StaticUserDirectory {
    pub fn new<I, S>(users: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<RecipientId>,
    {
        Self {
            users: users.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl UserValidator for StaticUserDirectory {
    async fn is_known_recipient(&self, recipient_id: &str) -> bool {
        self.users.contains(recipient_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unread_view_excludes_read() {
        let store = MemoryNotificationStore::new();
        let first = Notification::new("U1", "one", "");
        let second = Notification::new("U1", "two", "");
        store.save_notification(&first).await.unwrap();
        store.save_notification(&second).await.unwrap();
        store
            .save_notification(&Notification::new("U2", "other", ""))
            .await
            .unwrap();

        store.mark_read("U1", first.id()).await.unwrap();

        let unread = store.fetch_unread_notifications("U1").await.unwrap();
        assert_eq!(unread.len(), 1);
        assert_eq!(unread[0].id(), second.id());

        // Read notifications remain archived
        assert_eq!(store.all_for("U1").len(), 2);
        assert_eq!(store.total(), 3);
    }

    #[tokio::test]
    async fn test_mark_read_is_idempotent_and_scoped() {
        let store = MemoryNotificationStore::new();
        let n = Notification::new("U1", "one", "");
        store.save_notification(&n).await.unwrap();

        // Wrong recipient leaves it untouched
        store.mark_read("U2", n.id()).await.unwrap();
        assert_eq!(store.fetch_unread_notifications("U1").await.unwrap().len(), 1);

        store.mark_read("U1", n.id()).await.unwrap();
        store.mark_read("U1", n.id()).await.unwrap();
        store.mark_read("U1", &NotificationId::from("unknown")).await.unwrap();
        assert!(store.fetch_unread_notifications("U1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_static_directory() {
        let users = StaticUserDirectory::new(["U1"]);
        assert!(users.is_known_recipient("U1").await);
        assert!(!users.is_known_recipient("U9").await);
        assert!(!users.is_known_recipient("").await);
    }
}
