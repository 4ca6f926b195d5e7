/// Axum webserver implementation
///
/// Server lifecycle management including startup, shutdown, and graceful termination
use axum::Router;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;

use crate::{
    logger::{self, LogTag},
    webserver::{routes, state::AppState},
};

/// Global shutdown notifier
static SHUTDOWN_NOTIFY: once_cell::sync::Lazy<Arc<Notify>> =
    once_cell::sync::Lazy::new(|| Arc::new(Notify::new()));

/// Start the webserver
///
/// This function blocks until the server is shut down
pub async fn start_server(state: Arc<AppState>) -> Result<(), String> {
    let bind = state.config.bind_address();
    logger::info(LogTag::Webserver, &format!("Starting webserver on {}", bind));

    let addr: SocketAddr = bind
        .parse()
        .map_err(|e| format!("Invalid bind address {}: {}", bind, e))?;

    let listener = TcpListener::bind(&addr).await.map_err(|e| {
        // Provide helpful error message for common cases
        match e.kind() {
            std::io::ErrorKind::AddrInUse => {
                format!(
                    "Failed to bind to {}: Address already in use\n\
                     \n\
                     Another notification-hub instance (or another service) owns this port.\n\
                     Stop it or set [webserver] port in the configuration file.",
                    addr
                )
            }
            std::io::ErrorKind::PermissionDenied => {
                format!(
                    "Failed to bind to {}: Permission denied\n\
                     \n\
                     Port {} requires elevated privileges on this system.\n\
                     Consider using a port above 1024 or running with appropriate permissions.",
                    addr,
                    addr.port()
                )
            }
            _ => format!("Failed to bind to {}: {}", addr, e),
        }
    })?;

    logger::info(
        LogTag::Webserver,
        &format!(
            "Notification sockets available at ws://{}/api/notifications/<user_id>",
            addr
        ),
    );

    let shutdown_signal = async {
        SHUTDOWN_NOTIFY.notified().await;
        logger::debug(
            LogTag::Webserver,
            "Received shutdown signal, stopping webserver...",
        );
    };

    serve(listener, state, shutdown_signal).await
}

/// Serve on an already-bound listener until `shutdown_signal` resolves
pub async fn serve<F>(listener: TcpListener, state: Arc<AppState>, shutdown_signal: F) -> Result<(), String>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = build_app(state);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await
        .map_err(|e| format!("Server error: {}", e))?;

    logger::info(LogTag::Webserver, "Webserver stopped gracefully");
    Ok(())
}

/// Trigger webserver shutdown
pub fn shutdown() {
    logger::debug(LogTag::Webserver, "Triggering webserver shutdown...");
    SHUTDOWN_NOTIFY.notify_one();
}

/// Build the Axum application with all routes and middleware
///
/// The timeout bounds the upgrade request (recipient validation included);
/// it does not apply to the socket once upgraded.
pub fn build_app(state: Arc<AppState>) -> Router {
    let handshake_timeout = Duration::from_secs(state.config.handshake_timeout_secs.max(1));
    let cors = if state.config.cors_allow_any_origin {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
    };

    routes::create_router(state).layer(
        ServiceBuilder::new()
            .layer(TimeoutLayer::new(handshake_timeout))
            .layer(cors),
    )
}
