use std::{future::Future, pin::Pin, sync::Arc};

use serde::Serialize;
use serde_json::Value as J;

use crate::core::mcp::JsonObject;
use crate::domain::ToolError;

/// Metadata every tool exposes through `tools/list`.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub input_schema: J,
}

impl ToolSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>, input_schema: J) -> Self {
        Self { name: name.into(), description: description.into(), input_schema }
    }

    /// Property names listed under the schema's `required` array.
    pub fn required(&self) -> impl Iterator<Item = &str> {
        self.input_schema
            .get("required")
            .and_then(J::as_array)
            .into_iter()
            .flatten()
            .filter_map(J::as_str)
    }
}

pub type ToolFuture = Pin<Box<dyn Future<Output = Result<J, ToolError>> + Send>>;

/// Every handler returns a future, so the registry never branches on shape.
pub type ToolHandler = Arc<dyn Fn(JsonObject) -> ToolFuture + Send + Sync>;

pub fn handler<F, Fut>(f: F) -> ToolHandler
where
    F: Fn(JsonObject) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<J, ToolError>> + Send + 'static,
{
    Arc::new(move |args| Box::pin(f(args)))
}
