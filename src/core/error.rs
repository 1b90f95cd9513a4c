use serde_json::{json, Map, Value as J};
use thiserror::Error;

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;
pub const TOOL_EXECUTION_ERROR: i64 = 500;

/// Gateway-wide error model. Every layer returns one of these; the transport
/// adapters are the only place it becomes a wire envelope.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RpcError {
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Invalid Request: {0}")]
    InvalidRequest(String),
    #[error("Method not found: {0}")]
    MethodNotFound(String),
    #[error("Tool not found: {0}")]
    ToolNotFound(String),
    #[error("Invalid params: {message}")]
    InvalidParams {
        message: String,
        data: Map<String, J>,
    },
    #[error("Unknown resource: {0}")]
    UnknownResource(String),
    #[error("Internal error: {0}")]
    Internal(String),
    /// A failure nothing upstream handled, such as a panicking tool.
    #[error("Internal error: {0}")]
    Unhandled(String),
    #[error("{message}")]
    ToolExecution { message: String, detail: String },
}

impl RpcError {
    pub fn invalid_params(message: impl Into<String>) -> Self {
        RpcError::InvalidParams {
            message: message.into(),
            data: Map::new(),
        }
    }

    /// Every absent key is reported, not just the first one.
    pub fn missing_params(tool: &str, missing: Vec<String>) -> Self {
        let mut data = Map::new();
        data.insert("tool".into(), J::String(tool.to_owned()));
        data.insert("missing".into(), json!(missing));
        RpcError::InvalidParams {
            message: format!("missing required parameter(s): {}", missing.join(", ")),
            data,
        }
    }

    pub fn code(&self) -> i64 {
        match self {
            RpcError::Parse(_) => PARSE_ERROR,
            RpcError::InvalidRequest(_) => INVALID_REQUEST,
            RpcError::MethodNotFound(_) | RpcError::ToolNotFound(_) => METHOD_NOT_FOUND,
            RpcError::InvalidParams { .. } | RpcError::UnknownResource(_) => INVALID_PARAMS,
            RpcError::Internal(_) | RpcError::Unhandled(_) => INTERNAL_ERROR,
            RpcError::ToolExecution { .. } => TOOL_EXECUTION_ERROR,
        }
    }

    /// The `data` member of the wire error; always an object.
    pub fn data(&self) -> J {
        match self {
            RpcError::InvalidParams { data, .. } => J::Object(data.clone()),
            RpcError::ToolNotFound(name) => json!({ "name": name }),
            RpcError::UnknownResource(uri) => json!({ "uri": uri }),
            RpcError::ToolExecution { detail, .. } => json!({ "detail": detail }),
            _ => json!({}),
        }
    }

    /// Domain-range codes and unhandled failures. A dispatcher-raised
    /// `Internal` stays a caller-facing 400.
    pub fn is_server_fault(&self) -> bool {
        self.code() >= 500 || matches!(self, RpcError::Unhandled(_))
    }
}

impl From<serde_json::Error> for RpcError {
    fn from(e: serde_json::Error) -> Self {
        RpcError::Internal(e.to_string())
    }
}
