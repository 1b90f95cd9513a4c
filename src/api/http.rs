use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use super::{process, AppState};
use crate::core::mcp::RpcResp;
use crate::infra::http::json as http_json;

/// `POST /rpc`: one body, one envelope back. Nothing survives the request.
pub async fn rpc(State(state): State<AppState>, body: Bytes) -> (StatusCode, Json<RpcResp>) {
    let (id, outcome) = process(&state.dispatcher, &body).await;
    if let Err(e) = &outcome {
        tracing::debug!(id = ?id, code = e.code(), error = %e, "rpc error");
    }
    let (status, resp) = http_json::respond(id, outcome);
    tracing::trace!(status = %status, response = ?resp.0, "rpc completed");
    (status, resp)
}
