/// HTTP/WebSocket surface of the notification hub
///
/// - `GET /api/notifications/:user_id`: WebSocket upgrade for one recipient
/// - `GET /api/hub/stats`: hub counters as JSON
mod server;

pub mod routes;
pub mod state;

// Public API for starting/stopping the webserver
pub use server::{build_app, serve, shutdown, start_server};
pub use state::AppState;
