//! JSON-RPC 2.0 envelope codec shared by the HTTP and WebSocket adapters.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as J};

use super::error::RpcError;

pub const JSONRPC_VERSION: &str = "2.0";

pub type JsonObject = Map<String, J>;

/// A structurally valid request.
#[derive(Debug, Clone, PartialEq)]
pub struct RpcReq {
    pub method: String,
    pub params: JsonObject,
    /// `None` when the envelope had no `id` member at all.
    pub id: Option<J>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RpcResp {
    pub jsonrpc: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<J>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<J>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcErr>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RpcErr {
    pub code: i64,
    pub message: String,
    pub data: J,
}

impl From<&RpcError> for RpcErr {
    fn from(e: &RpcError) -> Self {
        RpcErr {
            code: e.code(),
            message: e.to_string(),
            data: e.data(),
        }
    }
}

pub fn ok(id: Option<J>, result: J) -> RpcResp {
    RpcResp { jsonrpc: JSONRPC_VERSION, id, result: Some(result), error: None }
}

pub fn err(id: Option<J>, error: &RpcError) -> RpcResp {
    RpcResp { jsonrpc: JSONRPC_VERSION, id, result: None, error: Some(error.into()) }
}

impl RpcResp {
    pub fn from_outcome(id: Option<J>, outcome: Result<J, RpcError>) -> Self {
        match outcome {
            Ok(result) => ok(id, result),
            Err(e) => err(id, &e),
        }
    }
}

/// Bytes to a JSON value. Structure is not checked here.
pub fn decode_bytes(bytes: &[u8]) -> Result<J, RpcError> {
    serde_json::from_slice(bytes).map_err(|e| RpcError::Parse(e.to_string()))
}

pub fn parse(raw: &J) -> Result<RpcReq, RpcError> {
    let obj = raw
        .as_object()
        .ok_or_else(|| RpcError::InvalidRequest("expected object".into()))?;

    if obj.get("jsonrpc").and_then(J::as_str) != Some(JSONRPC_VERSION) {
        return Err(RpcError::InvalidRequest("jsonrpc must be '2.0'".into()));
    }

    let method = match obj.get("method") {
        Some(J::String(m)) if !m.is_empty() => m.clone(),
        Some(J::String(_)) | None | Some(J::Null) => {
            return Err(RpcError::InvalidRequest("missing method".into()))
        }
        Some(_) => return Err(RpcError::InvalidRequest("method must be a string".into())),
    };

    let params = match obj.get("params") {
        None | Some(J::Null) => JsonObject::new(),
        Some(J::Object(p)) => p.clone(),
        Some(_) => return Err(RpcError::InvalidRequest("params must be an object".into())),
    };

    Ok(RpcReq { method, params, id: obj.get("id").cloned() })
}

/// Best-effort id for error replies: the raw `id` member when the payload is
/// an object, otherwise `null`.
pub fn recover_id(raw: &J) -> Option<J> {
    match raw {
        J::Object(obj) => obj.get("id").cloned(),
        _ => Some(J::Null),
    }
}

pub fn encode_response(resp: &RpcResp) -> serde_json::Result<String> {
    serde_json::to_string(resp)
}

// --- initialize result ---

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    pub server_info: ServerInfo,
    pub capabilities: Capabilities,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    pub tools: bool,
    pub resources: bool,
    pub experimental_stream: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self { tools: true, resources: true, experimental_stream: true }
    }
}
