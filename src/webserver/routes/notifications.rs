/// Notification endpoints
///
/// The WebSocket endpoint validates the recipient before upgrading. Unknown
/// recipients get `405 Method Not Allowed`, which existing mobile clients
/// treat as "not registered".
use std::sync::Arc;

use axum::{
    extract::{
        ws::{rejection::WebSocketUpgradeRejection, WebSocketUpgrade},
        Path, State,
    },
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::Serialize;

use crate::{
    logger::{self, LogTag},
    notifications::{session, HubMetricsSnapshot},
    webserver::state::AppState,
};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/hub/stats", get(hub_stats))
        .route("/notifications/:user_id", get(notifications_socket))
}

/// Upgrade to a notification session for `user_id`
pub async fn notifications_socket(
    Path(user_id): Path<String>,
    State(state): State<Arc<AppState>>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    if !state.hub.is_known_recipient(&user_id).await {
        logger::warning(
            LogTag::Webserver,
            &format!("Rejected notification socket for unknown user {}", user_id),
        );
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }

    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => {
            logger::warning(
                LogTag::Webserver,
                &format!("Invalid WebSocket upgrade for {}: {}", user_id, rejection),
            );
            return rejection.into_response();
        }
    };

    logger::debug(
        LogTag::Webserver,
        &format!("Upgrading notification socket for {}", user_id),
    );

    let hub = state.hub.clone();
    let failed_user = user_id.clone();
    ws.on_failed_upgrade(move |e| {
        logger::error(
            LogTag::Webserver,
            &format!("WebSocket upgrade failed for {}: {}", failed_user, e),
        );
    })
    .on_upgrade(move |socket| session::handle_socket(socket, hub, user_id))
}

#[derive(Debug, Serialize)]
pub struct HubStatsResponse {
    pub active_sessions: usize,
    pub uptime_seconds: u64,
    pub metrics: HubMetricsSnapshot,
}

/// Hub counters
pub async fn hub_stats(State(state): State<Arc<AppState>>) -> Json<HubStatsResponse> {
    Json(HubStatsResponse {
        active_sessions: state.hub.active_sessions().await,
        uptime_seconds: state.uptime_seconds(),
        metrics: state.hub.metrics_snapshot(),
    })
}
