use axum::{
    routing::{get, post},
    Router,
};

use crate::api::{http, ws, AppState};

/// `/healthz` liveness, JSON-RPC over `POST /rpc`, sessions over `GET /ws`.
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .route("/rpc", post(http::rpc))
        .route("/ws", get(ws::upgrade))
        .with_state(state)
}
