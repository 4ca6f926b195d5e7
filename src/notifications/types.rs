/// Notification entity and identifiers
///
/// A notification is immutable after creation except for its read flag,
/// which only ever moves from unread to read.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Target user of a notification; also the key of a live session
pub type RecipientId = String;

/// Opaque notification identifier (UUID v4, generated at creation)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(String);

impl NotificationId {
    pub fn generate() -> Self {
        NotificationId(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for NotificationId {
    fn from(value: String) -> Self {
        NotificationId(value)
    }
}

impl From<&str> for NotificationId {
    fn from(value: &str) -> Self {
        NotificationId(value.to_string())
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A unit of communication addressed to one recipient
///
/// Serialized as `{id, recipient_id, title, body, is_read, sent_at}` with
/// `sent_at` in RFC 3339.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    id: NotificationId,
    recipient_id: RecipientId,
    title: String,
    body: String,
    is_read: bool,
    sent_at: DateTime<Utc>,
}

impl Notification {
    /// Create a new unread notification stamped with the current time
    pub fn new(
        recipient_id: impl Into<RecipientId>,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            id: NotificationId::generate(),
            recipient_id: recipient_id.into(),
            title: title.into(),
            body: body.into(),
            is_read: false,
            sent_at: Utc::now(),
        }
    }

    /// Rebuild a notification loaded from storage
    pub fn restore(
        id: NotificationId,
        recipient_id: RecipientId,
        title: String,
        body: String,
        is_read: bool,
        sent_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            recipient_id,
            title,
            body,
            is_read,
            sent_at,
        }
    }

    pub fn id(&self) -> &NotificationId {
        &self.id
    }

    pub fn recipient_id(&self) -> &str {
        &self.recipient_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn is_read(&self) -> bool {
        self.is_read
    }

    pub fn sent_at(&self) -> DateTime<Utc> {
        self.sent_at
    }

    /// Flag as read. Returns false if it was already read.
    pub fn mark_read(&mut self) -> bool {
        if self.is_read {
            return false;
        }
        self.is_read = true;
        true
    }

    // ------------------------------------------------------------------------
    // Domain event notifications
    // ------------------------------------------------------------------------

    /// Sent once after a new account is created
    pub fn welcome(recipient_id: impl Into<RecipientId>) -> Self {
        Self::new(
            recipient_id,
            "Welcome to HeartNet",
            "Your account is ready. Scan a drug's QR code, RFID tag or short code to check that it is authentic.",
        )
    }

    /// Sent when a returning user signs in again
    pub fn welcome_back(recipient_id: impl Into<RecipientId>) -> Self {
        Self::new(
            recipient_id,
            "Welcome back",
            "Good to see you again. Your unread notifications are waiting for you.",
        )
    }

    /// Outcome of a drug authenticity check, e.g. "Drug is authentic"
    pub fn drug_validation(recipient_id: impl Into<RecipientId>, outcome: &str) -> Self {
        Self::new(recipient_id, "Drug validation", outcome)
    }

    /// Acknowledges an airdrop task report submission
    pub fn task_report_received(recipient_id: impl Into<RecipientId>) -> Self {
        Self::new(
            recipient_id,
            "Task report received",
            "Your airdrop task report has been submitted and is awaiting review.",
        )
    }

    /// Acknowledges a counterfeit or adverse-incidence report
    pub fn incidence_report_received(recipient_id: impl Into<RecipientId>) -> Self {
        Self::new(
            recipient_id,
            "Incidence report received",
            "Thank you for your report. Our team will look into it.",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_notification_is_unread_with_unique_id() {
        let a = Notification::new("U1", "Welcome", "hello");
        let b = Notification::new("U1", "Welcome", "hello");

        assert!(!a.is_read());
        assert_eq!(a.recipient_id(), "U1");
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_mark_read_is_one_way() {
        let mut n = Notification::welcome("U1");
        assert!(n.mark_read());
        assert!(n.is_read());
        assert!(!n.mark_read());
        assert!(n.is_read());
    }

    #[test]
    fn test_wire_format() {
        let n = Notification::drug_validation("U7", "Drug is authentic");
        let value = serde_json::to_value(&n).unwrap();

        assert_eq!(value["id"], n.id().as_str());
        assert_eq!(value["recipient_id"], "U7");
        assert_eq!(value["title"], "Drug validation");
        assert_eq!(value["body"], "Drug is authentic");
        assert_eq!(value["is_read"], false);

        let sent_at = value["sent_at"].as_str().unwrap();
        let parsed = DateTime::parse_from_rfc3339(sent_at).unwrap();
        assert_eq!(parsed.with_timezone(&Utc), n.sent_at());
    }

    #[test]
    fn test_domain_constructors_target_recipient() {
        for n in [
            Notification::welcome("U2"),
            Notification::welcome_back("U2"),
            Notification::task_report_received("U2"),
            Notification::incidence_report_received("U2"),
        ] {
            assert_eq!(n.recipient_id(), "U2");
            assert!(!n.title().is_empty());
            assert!(!n.body().is_empty());
        }
    }
}
