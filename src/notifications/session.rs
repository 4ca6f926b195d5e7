/// Session protocol handler
///
/// Drives one accepted WebSocket for one recipient:
/// - registers the session (superseding any previous one) and queues the
///   unread backlog
/// - forwards queued server messages to the socket
/// - interprets client commands (`getAllUnread`, `read:<id>`)
/// - removes the registry entry when the client goes away
///
/// The loop owns no sender for its own outbound queue; the registry holds
/// the only one. When the registry drops it (superseded or hub shutdown) the
/// queue closes and the loop sends a close frame and exits.
use axum::extract::ws::{close_code, CloseFrame, Message, WebSocket};
use futures::{Sink, SinkExt, Stream, StreamExt};
use std::fmt::Display;
use std::sync::Arc;
use tokio::sync::mpsc;

use super::hub::NotificationHub;
use super::protocol::{ClientCommand, ServerMessage};
use super::registry::SessionHandle;
use super::types::RecipientId;
use crate::logger::{self, LogTag};

#[derive(Debug)]
enum SessionEnd {
    Superseded,
    HubShutdown,
    ClientClosed,
    Disconnected,
    ReadError(String),
}

/// Entry point for an upgraded axum socket
pub async fn handle_socket(socket: WebSocket, hub: Arc<NotificationHub>, recipient_id: RecipientId) {
    let (ws_tx, ws_rx) = socket.split();
    run_session(hub, recipient_id, ws_tx, ws_rx).await;
}

/// Run a session over any message sink/stream pair until it closes
pub async fn run_session<W, R, E>(
    hub: Arc<NotificationHub>,
    recipient_id: RecipientId,
    mut ws_tx: W,
    mut ws_rx: R,
) where
    W: Sink<Message> + Unpin,
    W::Error: Display,
    R: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    let registry = hub.registry().clone();
    let conn_id = registry.next_connection_id();

    if hub.is_shutting_down() {
        logger::info(
            LogTag::Session,
            &format!(
                "Refusing session for {} (connection {}): hub is shutting down",
                recipient_id, conn_id
            ),
        );
        close_transport(&mut ws_tx, &SessionEnd::HubShutdown).await;
        return;
    }

    let (out_tx, mut out_rx) = mpsc::channel::<ServerMessage>(hub.session_buffer_size());

    if let Some(previous) = registry
        .register(&recipient_id, SessionHandle::new(conn_id, out_tx))
        .await
    {
        hub.metrics().session_superseded();
        logger::info(
            LogTag::Session,
            &format!(
                "Connection {} supersedes connection {} for {}",
                conn_id,
                previous.connection_id(),
                recipient_id
            ),
        );
        // Last sender of the old queue: its session loop ends
        drop(previous);
    }

    hub.metrics().session_opened();
    logger::info(
        LogTag::Session,
        &format!("Session opened for {} (connection {})", recipient_id, conn_id),
    );

    // Shutdown may have cleared the registry just before this registration
    let end = if hub.is_shutting_down() {
        SessionEnd::HubShutdown
    } else {
        hub.dispatch_unread_backlog(&recipient_id);
        run_loop(&hub, &recipient_id, conn_id, &mut out_rx, &mut ws_tx, &mut ws_rx).await
    };

    let removed = registry.remove_session(&recipient_id, conn_id).await;
    hub.metrics().session_closed();
    close_transport(&mut ws_tx, &end).await;

    match &end {
        SessionEnd::ReadError(e) => logger::warning(
            LogTag::Session,
            &format!("Connection {} for {} failed: {}", conn_id, recipient_id, e),
        ),
        other => logger::info(
            LogTag::Session,
            &format!(
                "Session closed for {} (connection {}, {:?}, registry entry removed: {})",
                recipient_id, conn_id, other, removed
            ),
        ),
    }
}

async fn run_loop<W, R, E>(
    hub: &NotificationHub,
    recipient_id: &str,
    conn_id: u64,
    out_rx: &mut mpsc::Receiver<ServerMessage>,
    ws_tx: &mut W,
    ws_rx: &mut R,
) -> SessionEnd
where
    W: Sink<Message> + Unpin,
    W::Error: Display,
    R: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    loop {
        tokio::select! {
            outbound = out_rx.recv() => match outbound {
                Some(message) => {
                    if let Err(e) = forward_to_client(ws_tx, &message).await {
                        logger::warning(
                            LogTag::Session,
                            &format!(
                                "Connection {}: failed to send {} to {}: {}",
                                conn_id,
                                message.describe(),
                                recipient_id,
                                e
                            ),
                        );
                    }
                }
                None if hub.is_shutting_down() => break SessionEnd::HubShutdown,
                None => break SessionEnd::Superseded,
            },

            inbound = ws_rx.next() => match inbound {
                Some(Ok(Message::Text(text))) => {
                    handle_client_command(hub, recipient_id, conn_id, &text).await;
                }
                Some(Ok(Message::Close(_))) => break SessionEnd::ClientClosed,
                Some(Ok(_)) => {}
                Some(Err(e)) => break SessionEnd::ReadError(e.to_string()),
                None => break SessionEnd::Disconnected,
            },
        }
    }
}

/// Best-effort close: a close frame when the server ends the session, then
/// closing the sink
async fn close_transport<W>(ws_tx: &mut W, end: &SessionEnd)
where
    W: Sink<Message> + Unpin,
{
    let farewell = match end {
        SessionEnd::Superseded => Some(CloseFrame {
            code: close_code::NORMAL,
            reason: "superseded by a newer connection".into(),
        }),
        SessionEnd::HubShutdown => Some(CloseFrame {
            code: close_code::AWAY,
            reason: "server shutting down".into(),
        }),
        _ => None,
    };
    if let Some(frame) = farewell {
        let _ = ws_tx.send(Message::Close(Some(frame))).await;
    }
    let _ = ws_tx.close().await;
}

async fn forward_to_client<W>(ws_tx: &mut W, message: &ServerMessage) -> Result<(), String>
where
    W: Sink<Message> + Unpin,
    W::Error: Display,
{
    let json = message.to_json().map_err(|e| format!("serialization failed: {}", e))?;
    ws_tx
        .send(Message::Text(json))
        .await
        .map_err(|e| e.to_string())
}

async fn handle_client_command(hub: &NotificationHub, recipient_id: &str, conn_id: u64, text: &str) {
    match ClientCommand::parse(text) {
        ClientCommand::GetAllUnread => {
            logger::debug(
                LogTag::Session,
                &format!("Connection {}: backlog requested by {}", conn_id, recipient_id),
            );
            hub.dispatch_unread_backlog(recipient_id);
        }
        ClientCommand::Read(notification_id) => {
            if let Err(e) = hub.store().mark_read(recipient_id, &notification_id).await {
                logger::error(
                    LogTag::Store,
                    &format!(
                        "Failed to mark notification {} read for {}: {}",
                        notification_id, recipient_id, e
                    ),
                );
            } else {
                logger::debug(
                    LogTag::Session,
                    &format!("{} marked notification {} read", recipient_id, notification_id),
                );
            }
        }
        ClientCommand::Unknown => {
            logger::debug(
                LogTag::Session,
                &format!("Connection {}: ignoring unrecognized message", conn_id),
            );
        }
    }
}
