use axum::http::StatusCode;
use axum::Json;
use serde_json::Value as J;

use crate::core::error::RpcError;
use crate::core::mcp::RpcResp;

/// 500 for domain-range codes and unhandled failures, 400 for every other
/// dispatcher-raised error.
pub fn status_for(err: &RpcError) -> StatusCode {
    if err.is_server_fault() {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::BAD_REQUEST
    }
}

pub fn respond(id: Option<J>, outcome: Result<J, RpcError>) -> (StatusCode, Json<RpcResp>) {
    let status = match &outcome {
        Ok(_) => StatusCode::OK,
        Err(e) => status_for(e),
    };
    (status, Json(RpcResp::from_outcome(id, outcome)))
}
