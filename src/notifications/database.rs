/// SQLite-backed notification store and user directory
///
/// One connection guarded by a mutex; every call runs on the blocking pool
/// so store latency never stalls the async workers.
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, types::Type, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};

use super::store::{NotificationStore, UserValidator};
use super::types::{Notification, NotificationId};
use crate::errors::{HubError, HubResult};
use crate::logger::{self, LogTag};

/// Busy timeout for concurrent writers on the same file
const BUSY_TIMEOUT_MS: u64 = 5_000;

#[derive(Clone)]
pub struct SqliteNotificationStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteNotificationStore {
    /// Open (or create) the database file and initialize the schema
    pub fn open<P: AsRef<Path>>(path: P) -> HubResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        let store = Self::from_connection(conn)?;
        logger::info(
            LogTag::Store,
            &format!("Notification database initialized at {}", path.display()),
        );
        Ok(store)
    }

    /// In-memory database (tests)
    pub fn open_in_memory() -> HubResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> HubResult<Self> {
        conn.busy_timeout(std::time::Duration::from_millis(BUSY_TIMEOUT_MS))?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS notifications (
                id TEXT PRIMARY KEY,
                recipient_id TEXT NOT NULL,
                title TEXT NOT NULL,
                body TEXT NOT NULL,
                is_read INTEGER NOT NULL DEFAULT 0,
                sent_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_notifications_unread
                ON notifications(recipient_id, is_read, sent_at);
            "#,
        )?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a closure against the connection on the blocking pool
    async fn with_connection<F, R>(&self, f: F) -> HubResult<R>
    where
        F: FnOnce(&Connection) -> HubResult<R> + Send + 'static,
        R: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|e| HubError::LockPoisoned(format!("notification database: {}", e)))?;
            f(&guard)
        })
        .await?
    }

    /// Register a recipient in the user table (idempotent)
    pub async fn register_user(&self, recipient_id: &str) -> HubResult<()> {
        let recipient_id = recipient_id.to_string();
        self.with_connection(move |conn| {
            conn.execute(
                "INSERT OR IGNORE INTO users (id, created_at) VALUES (?1, ?2)",
                params![recipient_id, format_timestamp(Utc::now())],
            )?;
            Ok(())
        })
        .await
    }
}

fn notification_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Notification> {
    let sent_at_raw: String = row.get(5)?;
    let sent_at = DateTime::parse_from_rfc3339(&sent_at_raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?;

    Ok(Notification::restore(
        NotificationId::from(row.get::<_, String>(0)?),
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get::<_, i64>(4)? != 0,
        sent_at,
    ))
}

/// Fixed-width timestamps so lexical order matches chronological order
fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

#[async_trait]
impl NotificationStore for SqliteNotificationStore {
    async fn save_notification(&self, notification: &Notification) -> HubResult<()> {
        let notification = notification.clone();
        self.with_connection(move |conn| {
            conn.execute(
                r#"
                INSERT INTO notifications (id, recipient_id, title, body, is_read, sent_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
                params![
                    notification.id().as_str(),
                    notification.recipient_id(),
                    notification.title(),
                    notification.body(),
                    notification.is_read() as i64,
                    format_timestamp(notification.sent_at()),
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn fetch_unread_notifications(&self, recipient_id: &str) -> HubResult<Vec<Notification>> {
        let recipient_id = recipient_id.to_string();
        self.with_connection(move |conn| {
            let mut stmt = conn.prepare(
                r#"
                SELECT id, recipient_id, title, body, is_read, sent_at
                FROM notifications
                WHERE recipient_id = ?1 AND is_read = 0
                ORDER BY sent_at ASC, rowid ASC
                "#,
            )?;
            let notifications = stmt
                .query_map(params![recipient_id], notification_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(notifications)
        })
        .await
    }

    async fn mark_read(&self, recipient_id: &str, notification_id: &NotificationId) -> HubResult<()> {
        let recipient_id = recipient_id.to_string();
        let notification_id = notification_id.as_str().to_string();
        let updated = self
            .with_connection(move |conn| {
                Ok(conn.execute(
                    "UPDATE notifications SET is_read = 1 WHERE id = ?1 AND recipient_id = ?2",
                    params![notification_id, recipient_id],
                )?)
            })
            .await?;

        if updated == 0 {
            logger::debug(LogTag::Store, "mark_read matched no notification");
        }
        Ok(())
    }
}

#[async_trait]
impl UserValidator for SqliteNotificationStore {
    async fn is_known_recipient(&self, recipient_id: &str) -> bool {
        let recipient_id = recipient_id.to_string();
        let lookup = self
            .with_connection(move |conn| {
                Ok(conn
                    .query_row(
                        "SELECT 1 FROM users WHERE id = ?1",
                        params![recipient_id],
                        |_| Ok(()),
                    )
                    .optional()?
                    .is_some())
            })
            .await;

        match lookup {
            Ok(known) => known,
            Err(e) => {
                logger::error(LogTag::Store, &format!("User lookup failed: {}", e));
                false
            }
        }
    }
}
