/// Shared application state for the webserver
///
/// Holds the notification hub and listener configuration that route
/// handlers need.
use crate::config::WebserverConfig;
use crate::notifications::NotificationHub;
use std::sync::Arc;

/// Shared application state passed to all route handlers
#[derive(Clone)]
pub struct AppState {
    /// Webserver configuration
    pub config: Arc<WebserverConfig>,

    /// Notification hub serving every session
    pub hub: Arc<NotificationHub>,

    /// Server startup time
    pub startup_time: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    pub fn new(config: WebserverConfig, hub: Arc<NotificationHub>) -> Self {
        Self {
            config: Arc::new(config),
            hub,
            startup_time: chrono::Utc::now(),
        }
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        (chrono::Utc::now() - self.startup_time)
            .num_seconds()
            .max(0) as u64
    }
}
