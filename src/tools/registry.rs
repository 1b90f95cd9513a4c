use indexmap::IndexMap;
use serde_json::Value as J;
use thiserror::Error;

use crate::core::error::RpcError;
use crate::core::mcp::JsonObject;
use crate::core::tool::{ToolHandler, ToolSpec};
use crate::domain::ToolError;
use crate::infra::logging::count_tool_call;

#[derive(Debug, Error, PartialEq)]
pub enum RegistryError {
    #[error("tool already registered: {0}")]
    Duplicate(String),
}

struct RegisteredTool {
    spec: ToolSpec,
    handler: ToolHandler,
}

/// Tools keyed by name, listed in registration order. Filled once at startup,
/// read-only afterwards.
#[derive(Default)]
pub struct ToolRegistry {
    by_name: IndexMap<String, RegisteredTool>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last registration of a name wins; it keeps the original list position.
    pub fn register(&mut self, spec: ToolSpec, handler: ToolHandler) {
        let name = spec.name.clone();
        if self.by_name.contains_key(&name) {
            tracing::warn!(tool = %name, "replacing registered tool");
        }
        self.by_name.insert(name.clone(), RegisteredTool { spec, handler });
        tracing::info!(tool = %name, "registered tool");
    }

    /// Like `register`, but refuses a name that is already taken.
    pub fn try_register(&mut self, spec: ToolSpec, handler: ToolHandler) -> Result<(), RegistryError> {
        if self.by_name.contains_key(&spec.name) {
            return Err(RegistryError::Duplicate(spec.name));
        }
        self.register(spec, handler);
        Ok(())
    }

    pub fn list_specs(&self) -> Vec<ToolSpec> {
        self.by_name.values().map(|t| t.spec.clone()).collect()
    }

    pub fn names(&self) -> Vec<String> {
        self.by_name.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    pub async fn call(&self, name: &str, args: JsonObject) -> Result<J, RpcError> {
        let tool = self
            .by_name
            .get(name)
            .ok_or_else(|| RpcError::ToolNotFound(name.to_owned()))?;

        let missing: Vec<String> = tool
            .spec
            .required()
            .filter(|key| !args.contains_key(*key))
            .map(str::to_owned)
            .collect();
        if !missing.is_empty() {
            count_tool_call(name, "invalid_params");
            return Err(RpcError::missing_params(name, missing));
        }

        let out = match (tool.handler)(args).await {
            Ok(out) => out,
            Err(ToolError::InvalidArguments(msg)) => {
                count_tool_call(name, "invalid_params");
                return Err(RpcError::invalid_params(msg));
            }
            Err(ToolError::Failed { message, detail }) => {
                tracing::warn!(tool = %name, %message, %detail, "tool call failed");
                count_tool_call(name, "tool_error");
                return Err(RpcError::ToolExecution { message, detail });
            }
        };

        if !out.is_object() {
            tracing::error!(tool = %name, "tool handler returned a non-object result");
            count_tool_call(name, "internal_error");
            return Err(RpcError::Internal("tool handler must return an object".into()));
        }
        count_tool_call(name, "ok");
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tool::handler;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn spec(name: &str, required: &[&str]) -> ToolSpec {
        ToolSpec::new(name, "test tool", json!({"type": "object", "required": required}))
    }

    fn echo() -> ToolHandler {
        handler(|args: JsonObject| async move { Ok(J::Object(args)) })
    }

    fn obj(v: J) -> JsonObject {
        v.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn registry_registers_lists_and_calls() {
        let mut reg = ToolRegistry::new();
        reg.register(spec("b.echo", &[]), echo());
        reg.register(spec("a.echo", &["x"]), echo());
        let names: Vec<_> = reg.list_specs().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["b.echo", "a.echo"]);
        let out = reg.call("a.echo", obj(json!({"x": 2}))).await.unwrap();
        assert_eq!(out["x"], 2);
    }

    #[tokio::test]
    async fn unknown_tool_is_tool_not_found() {
        let reg = ToolRegistry::new();
        let err = reg.call("nope", JsonObject::new()).await.unwrap_err();
        assert_eq!(err, RpcError::ToolNotFound("nope".into()));
        assert_eq!(err.code(), -32601);
    }

    #[tokio::test]
    async fn missing_required_keys_are_all_listed_and_handler_not_run() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        let mut reg = ToolRegistry::new();
        reg.register(
            spec("t", &["location", "start_time", "hours"]),
            handler(move |_args: JsonObject| {
                seen.fetch_add(1, Ordering::SeqCst);
                async { Ok(json!({})) }
            }),
        );
        let err = reg.call("t", obj(json!({"location": "x"}))).await.unwrap_err();
        assert_eq!(err.code(), -32602);
        assert_eq!(err.data()["missing"], json!(["start_time", "hours"]));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn non_object_result_is_internal_error() {
        let mut reg = ToolRegistry::new();
        reg.register(spec("scalar", &[]), handler(|_| async { Ok(json!(42)) }));
        reg.register(spec("array", &[]), handler(|_| async { Ok(json!([1])) }));
        for name in ["scalar", "array"] {
            let err = reg.call(name, JsonObject::new()).await.unwrap_err();
            assert_eq!(err.code(), -32603);
        }
    }

    #[tokio::test]
    async fn handler_failure_becomes_tool_execution_error() {
        let mut reg = ToolRegistry::new();
        reg.register(
            spec("boom", &[]),
            handler(|_| async { Err(ToolError::failed("Forecast failed", "connection refused")) }),
        );
        let err = reg.call("boom", JsonObject::new()).await.unwrap_err();
        assert_eq!(err.code(), 500);
        assert_eq!(err.to_string(), "Forecast failed");
        assert_eq!(err.data()["detail"], "connection refused");
    }

    #[tokio::test]
    async fn last_registration_wins_in_place() {
        let mut reg = ToolRegistry::new();
        reg.register(spec("dup", &[]), handler(|_| async { Ok(json!({"v": 1})) }));
        reg.register(spec("other", &[]), echo());
        reg.register(spec("dup", &[]), handler(|_| async { Ok(json!({"v": 2})) }));
        assert_eq!(reg.len(), 2);
        assert_eq!(reg.names(), vec!["dup", "other"]);
        let out = reg.call("dup", JsonObject::new()).await.unwrap();
        assert_eq!(out["v"], 2);
    }

    #[test]
    fn try_register_refuses_duplicates() {
        let mut reg = ToolRegistry::new();
        assert!(reg.try_register(spec("dup", &[]), echo()).is_ok());
        let err = reg.try_register(spec("dup", &[]), echo()).unwrap_err();
        assert_eq!(err, RegistryError::Duplicate("dup".into()));
    }
}
