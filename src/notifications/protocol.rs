/// Wire protocol between the hub and notification clients
///
/// Client → server: plain text commands, one per message.
/// - `getAllUnread`: resend the full unread backlog
/// - `read:<notificationId>`: mark one notification read
/// - anything else: ignored
///
/// Server → client: a JSON notification object (live dispatch) or a JSON
/// array of notifications (backlog).
use serde::Serialize;

use super::types::{Notification, NotificationId};

pub const GET_ALL_UNREAD: &str = "getAllUnread";
pub const READ_PREFIX: &str = "read:";

// ============================================================================
// CLIENT COMMANDS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
    GetAllUnread,
    Read(NotificationId),
    Unknown,
}

impl ClientCommand {
    /// Parse one text frame. Surrounding whitespace is ignored.
    pub fn parse(text: &str) -> Self {
        let text = text.trim();

        if text == GET_ALL_UNREAD {
            return ClientCommand::GetAllUnread;
        }

        match text.strip_prefix(READ_PREFIX).map(str::trim) {
            Some(id) if !id.is_empty() => ClientCommand::Read(NotificationId::from(id)),
            _ => ClientCommand::Unknown,
        }
    }
}

// ============================================================================
// SERVER MESSAGES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ServerMessage {
    /// Single live notification
    Notification(Notification),

    /// Unread backlog, oldest first
    Backlog(Vec<Notification>),
}

impl ServerMessage {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn describe(&self) -> String {
        match self {
            ServerMessage::Notification(n) => format!("notification {}", n.id()),
            ServerMessage::Backlog(list) => format!("backlog of {}", list.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(ClientCommand::parse("getAllUnread"), ClientCommand::GetAllUnread);
        assert_eq!(ClientCommand::parse("getAllUnread\n"), ClientCommand::GetAllUnread);
        assert_eq!(
            ClientCommand::parse("read:qw124fdifhe848skdi3s"),
            ClientCommand::Read(NotificationId::from("qw124fdifhe848skdi3s"))
        );
    }

    #[test]
    fn test_read_keeps_everything_after_prefix() {
        assert_eq!(
            ClientCommand::parse("read:a:b"),
            ClientCommand::Read(NotificationId::from("a:b"))
        );
    }

    #[test]
    fn test_unrecognized_input_is_unknown() {
        for text in ["", "getallunread", "read:", "read:   ", "mark:abc", "hello", "{\"type\":\"ping\"}"] {
            assert_eq!(ClientCommand::parse(text), ClientCommand::Unknown, "{:?}", text);
        }
    }

    #[test]
    fn test_server_message_shapes() {
        let n = Notification::new("U1", "Welcome", "hi");

        let single: serde_json::Value =
            serde_json::from_str(&ServerMessage::Notification(n.clone()).to_json().unwrap()).unwrap();
        assert!(single.is_object());
        assert_eq!(single["title"], "Welcome");

        let backlog: serde_json::Value =
            serde_json::from_str(&ServerMessage::Backlog(vec![n]).to_json().unwrap()).unwrap();
        assert_eq!(backlog.as_array().map(Vec::len), Some(1));

        let empty = ServerMessage::Backlog(Vec::new()).to_json().unwrap();
        assert_eq!(empty, "[]");
    }
}
