/// Notification core
///
/// - `types`: the `Notification` entity and its identifiers
/// - `store`: collaborator traits plus in-memory implementations
/// - `database`: SQLite-backed store and user directory
/// - `registry`: recipient → live session directory
/// - `dispatch`: worker pool that delivers and persists
/// - `session`: per-socket protocol handler
/// - `hub`: composition root wiring the above together
pub mod database;
pub mod dispatch;
pub mod hub;
pub mod metrics;
pub mod protocol;
pub mod registry;
pub mod session;
pub mod store;
pub mod types;

pub use database::SqliteNotificationStore;
pub use hub::NotificationHub;
pub use metrics::{HubMetrics, HubMetricsSnapshot};
pub use protocol::{ClientCommand, ServerMessage};
pub use registry::{ConnectionId, ConnectionRegistry, DeliveryError, SessionHandle};
pub use store::{MemoryNotificationStore, NotificationStore, StaticUserDirectory, UserValidator};
pub use types::{Notification, NotificationId, RecipientId};
