//! Transport adapters over one shared dispatcher.

pub mod dispatch;
pub mod http;
pub mod ws;

use std::sync::Arc;

use serde_json::Value as J;

use crate::core::error::RpcError;
use crate::core::mcp::{self, RpcReq};
use crate::infra::runtime::session::SessionRegistry;

pub use dispatch::{Dispatcher, Method};

/// Process-wide state handed to every adapter.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub sessions: SessionRegistry,
}

impl AppState {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher: Arc::new(dispatcher), sessions: SessionRegistry::default() }
    }
}

/// Decode, parse and dispatch one payload. Returns the id to echo and the
/// outcome; never fails on its own.
pub async fn process(dispatcher: &Arc<Dispatcher>, payload: &[u8]) -> (Option<J>, Result<J, RpcError>) {
    let raw = match mcp::decode_bytes(payload) {
        Ok(raw) => raw,
        Err(e) => return (Some(J::Null), Err(e)),
    };
    let req = match mcp::parse(&raw) {
        Ok(req) => req,
        Err(e) => return (mcp::recover_id(&raw), Err(e)),
    };
    let id = req.id.clone();
    (id, dispatch_isolated(dispatcher, req).await)
}

/// Run one dispatch as its own task, so a panicking tool surfaces as
/// `InternalError` instead of taking the connection down.
async fn dispatch_isolated(dispatcher: &Arc<Dispatcher>, req: RpcReq) -> Result<J, RpcError> {
    let dispatcher = Arc::clone(dispatcher);
    let RpcReq { method, params, .. } = req;
    match tokio::spawn(async move { dispatcher.dispatch(&method, params).await }).await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!(error = %e, "dispatch task failed");
            Err(RpcError::Unhandled("request handling failed".into()))
        }
    }
}
