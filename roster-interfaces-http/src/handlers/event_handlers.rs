use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::Response;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, warn};

use roster_application::{AppError, AppState};
use roster_domain::{GuildId, RosterEvent};

use crate::error::HttpError;
use crate::middleware::authorize;

/// Streams a guild's roster events (registrations, promotions, refresh
/// diffs) as JSON text frames for the chat-layer bot.
pub async fn stream_events(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(guild): Path<String>,
    headers: HeaderMap,
) -> Result<Response, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let roster = state.guild(&guild).map_err(AppError::from)?;
    let events = state.events.subscribe(&roster.id).await;
    let guild = roster.id.clone();
    Ok(ws.on_upgrade(move |socket| forward_events(socket, guild, events)))
}

async fn forward_events(
    socket: WebSocket,
    guild: GuildId,
    mut events: broadcast::Receiver<RosterEvent>,
) {
    let (mut sender, mut receiver) = socket.split();
    debug!(guild = %guild, "roster event subscriber connected");
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    let payload = match serde_json::to_string(&event) {
                        Ok(payload) => payload,
                        Err(err) => {
                            warn!(guild = %guild, "failed to encode roster event: {}", err);
                            continue;
                        }
                    };
                    if sender.send(Message::Text(payload)).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(guild = %guild, skipped, "roster event subscriber lagged");
                }
                Err(RecvError::Closed) => break,
            },
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }
    debug!(guild = %guild, "roster event subscriber disconnected");
}
