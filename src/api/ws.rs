//! WebSocket session adapter. One frame is answered before the next one is
//! read, so replies on a connection come back in request order.

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tracing::{debug, error, info};

use super::{process, AppState};
use crate::core::mcp::{encode_response, RpcResp};

/// `GET /ws`.
pub async fn upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| run_session(socket, state))
}

pub async fn run_session(socket: WebSocket, state: AppState) {
    // Dropping the guard unregisters the session on every exit path.
    let session = state.sessions.open();
    let session_id = session.id();
    info!(session = %session_id, live = state.sessions.len(), "ws session opened");

    let (mut ws_sink, mut ws_stream) = socket.split();

    while let Some(frame) = ws_stream.next().await {
        let payload = match frame {
            Ok(Message::Text(text)) => text.into_bytes(),
            Ok(Message::Binary(bytes)) => bytes,
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => continue,
            Ok(Message::Close(_)) => {
                debug!(session = %session_id, "received close frame");
                break;
            }
            Err(e) => {
                debug!(session = %session_id, error = %e, "websocket error");
                break;
            }
        };

        let (id, outcome) = process(&state.dispatcher, &payload).await;
        let reply = match encode_response(&RpcResp::from_outcome(id, outcome)) {
            Ok(json) => json,
            Err(e) => {
                error!(session = %session_id, error = %e, "failed to serialize response");
                continue;
            }
        };
        if ws_sink.send(Message::Text(reply)).await.is_err() {
            debug!(session = %session_id, "peer gone before reply was sent");
            break;
        }
    }

    drop(session);
    info!(session = %session_id, live = state.sessions.len(), "ws session closed");
}
