//! Method routing. Stateless: everything it touches is owned registries and
//! the downstream backend, all fixed at construction.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{json, Value as J};

use crate::clients::ForecastBackend;
use crate::core::error::RpcError;
use crate::core::mcp::{Capabilities, InitializeResult, JsonObject, ServerInfo};
use crate::resources::ResourceRegistry;
use crate::tools::ToolRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Initialize,
    Ping,
    ToolsList,
    ToolsCall,
    ResourcesList,
    ResourcesRead,
    HealthPassthrough,
}

impl Method {
    /// Wire names, aliases included.
    pub const ALIASES: &'static [(&'static str, Method)] = &[
        ("initialize", Method::Initialize),
        ("mcp/initialize", Method::Initialize),
        ("ping", Method::Ping),
        ("mcp/ping", Method::Ping),
        ("tools/list", Method::ToolsList),
        ("mcp/tools/list", Method::ToolsList),
        ("tools/call", Method::ToolsCall),
        ("mcp/tools/call", Method::ToolsCall),
        ("resources/list", Method::ResourcesList),
        ("mcp/resources/list", Method::ResourcesList),
        ("resources/read", Method::ResourcesRead),
        ("mcp/resources/read", Method::ResourcesRead),
        ("resource://earth2/health", Method::HealthPassthrough),
    ];
}

pub struct Dispatcher {
    routes: HashMap<&'static str, Method>,
    server: ServerInfo,
    tools: ToolRegistry,
    resources: ResourceRegistry,
    backend: Arc<dyn ForecastBackend>,
}

impl Dispatcher {
    pub fn new(
        server: ServerInfo,
        tools: ToolRegistry,
        resources: ResourceRegistry,
        backend: Arc<dyn ForecastBackend>,
    ) -> Self {
        Self {
            routes: Method::ALIASES.iter().copied().collect(),
            server,
            tools,
            resources,
            backend,
        }
    }

    pub fn resolve(&self, method: &str) -> Option<Method> {
        self.routes.get(method).copied()
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn resources(&self) -> &ResourceRegistry {
        &self.resources
    }

    pub async fn dispatch(&self, method: &str, params: JsonObject) -> Result<J, RpcError> {
        let route = self
            .resolve(method)
            .ok_or_else(|| RpcError::MethodNotFound(method.to_owned()))?;
        tracing::debug!(method, ?route, "dispatch");

        match route {
            Method::Initialize => Ok(serde_json::to_value(InitializeResult {
                server_info: self.server.clone(),
                capabilities: Capabilities::default(),
            })?),
            Method::Ping => Ok(json!({ "ok": true, "timestamp": chrono::Utc::now().to_rfc3339() })),
            Method::ToolsList => Ok(json!({ "tools": self.tools.list_specs() })),
            Method::ToolsCall => {
                let (name, args) = tool_call_params(&params)?;
                let result = self.tools.call(&name, args).await?;
                Ok(json!({ "content": result }))
            }
            Method::ResourcesList => Ok(json!({ "resources": self.resources.list() })),
            Method::ResourcesRead => {
                let uri = non_empty_str(&params, "uri")
                    .ok_or_else(|| RpcError::invalid_params("missing resource 'uri'"))?;
                Ok(serde_json::to_value(self.resources.read(uri).await?)?)
            }
            Method::HealthPassthrough => self.backend.health().await.map_err(|e| {
                tracing::warn!(error = %e, "health passthrough failed");
                RpcError::ToolExecution {
                    message: "Health check failed".into(),
                    detail: e.to_string(),
                }
            }),
        }
    }
}

fn non_empty_str<'a>(params: &'a JsonObject, key: &str) -> Option<&'a str> {
    params.get(key).and_then(J::as_str).filter(|s| !s.is_empty())
}

/// Tool name from `name` (else `tool`); arguments from `arguments` (else
/// `params`), defaulting to an empty object.
fn tool_call_params(params: &JsonObject) -> Result<(String, JsonObject), RpcError> {
    let name = non_empty_str(params, "name")
        .or_else(|| non_empty_str(params, "tool"))
        .ok_or_else(|| RpcError::invalid_params("missing tool name: 'name'"))?;

    let raw_args = ["arguments", "params"]
        .iter()
        .find_map(|k| params.get(*k).filter(|v| !v.is_null()));
    let args = match raw_args {
        None => JsonObject::new(),
        Some(J::Object(a)) => a.clone(),
        Some(_) => return Err(RpcError::invalid_params("invalid tool arguments: expected object")),
    };
    Ok((name.to_owned(), args))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::DownstreamError;
    use crate::domain::{ForecastParams, PatternParams, StreamParams};
    use crate::resources::catalog::build_resources;
    use crate::tools::forecast::build_registry;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingBackend {
        calls: AtomicUsize,
        healthy: bool,
    }

    impl CountingBackend {
        fn hit(&self, body: J) -> Result<J, DownstreamError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.healthy {
                Ok(body)
            } else {
                Err(DownstreamError::Transport {
                    method: "GET",
                    url: "http://earth2".into(),
                    reason: "timeout".into(),
                })
            }
        }
    }

    #[async_trait]
    impl ForecastBackend for CountingBackend {
        async fn health(&self) -> Result<J, DownstreamError> {
            self.hit(json!({"status": "ok"}))
        }
        async fn generate_forecast(&self, p: &ForecastParams) -> Result<J, DownstreamError> {
            self.hit(json!({"location": p.location}))
        }
        async fn get_visualization(&self, id: &str) -> Result<J, DownstreamError> {
            self.hit(json!({"id": id}))
        }
        async fn analyze_patterns(&self, _: &PatternParams) -> Result<J, DownstreamError> {
            self.hit(json!({}))
        }
        async fn stream(&self, _: &StreamParams) -> Result<J, DownstreamError> {
            self.hit(json!({}))
        }
    }

    fn dispatcher(healthy: bool) -> (Dispatcher, Arc<CountingBackend>) {
        let backend = Arc::new(CountingBackend { healthy, ..Default::default() });
        let server = ServerInfo { name: "earth2-mcp".into(), version: "1.0.0".into() };
        let tools = build_registry(backend.clone());
        let resources = build_resources(backend.clone(), server.clone(), tools.names());
        (Dispatcher::new(server, tools, resources, backend.clone()), backend)
    }

    fn obj(v: J) -> JsonObject {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn aliases_resolve_to_the_same_route() {
        let (d, _) = dispatcher(true);
        assert_eq!(d.resolve("tools/list"), Some(Method::ToolsList));
        assert_eq!(d.resolve("mcp/tools/list"), Some(Method::ToolsList));
        assert_eq!(d.resolve("mcp/ping"), Some(Method::Ping));
        assert_eq!(d.resolve("tools.list"), None);
    }

    #[tokio::test]
    async fn initialize_reports_identity_and_capabilities() {
        let (d, _) = dispatcher(true);
        let out = d.dispatch("mcp/initialize", JsonObject::new()).await.unwrap();
        assert_eq!(out["serverInfo"]["name"], "earth2-mcp");
        assert_eq!(
            out["capabilities"],
            json!({"tools": true, "resources": true, "experimentalStream": true})
        );
    }

    #[tokio::test]
    async fn ping_is_ok_with_timestamp() {
        let (d, _) = dispatcher(true);
        let out = d.dispatch("ping", JsonObject::new()).await.unwrap();
        assert_eq!(out["ok"], true);
        assert!(out["timestamp"].is_string());
    }

    #[tokio::test]
    async fn tools_list_has_the_catalog() {
        let (d, _) = dispatcher(true);
        let out = d.dispatch("tools/list", JsonObject::new()).await.unwrap();
        assert_eq!(out["tools"].as_array().unwrap().len(), 4);
        assert_eq!(out["tools"][0]["name"], "generate_weather_forecast");
        assert!(out["tools"][0]["inputSchema"]["required"].is_array());
    }

    #[tokio::test]
    async fn tools_call_wraps_result_in_content() {
        let (d, _) = dispatcher(true);
        let out = d
            .dispatch(
                "tools/call",
                obj(json!({"name": "generate_weather_forecast",
                           "arguments": {"location": "oslo", "start_time": "t", "hours": 3}})),
            )
            .await
            .unwrap();
        assert_eq!(out["content"]["location"], "oslo");
    }

    #[tokio::test]
    async fn tools_call_accepts_tool_and_params_fallbacks() {
        let (d, _) = dispatcher(true);
        let out = d
            .dispatch(
                "mcp/tools/call",
                obj(json!({"tool": "get_forecast_visualization", "params": {"request_id": "r"}})),
            )
            .await
            .unwrap();
        assert_eq!(out["content"]["id"], "r");
    }

    #[tokio::test]
    async fn tools_call_without_name_is_invalid_params() {
        let (d, _) = dispatcher(true);
        let err = d.dispatch("tools/call", obj(json!({"arguments": {}}))).await.unwrap_err();
        assert_eq!(err.code(), -32602);
    }

    #[tokio::test]
    async fn tools_call_with_non_object_arguments_is_invalid_params() {
        let (d, backend) = dispatcher(true);
        let err = d
            .dispatch("tools/call", obj(json!({"name": "stream_forecast_data", "arguments": [1]})))
            .await
            .unwrap_err();
        assert_eq!(err.code(), -32602);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_hours_lists_key_without_downstream_call() {
        let (d, backend) = dispatcher(true);
        let err = d
            .dispatch(
                "tools/call",
                obj(json!({"name": "generate_weather_forecast",
                           "arguments": {"location": "x", "start_time": "t"}})),
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), -32602);
        let missing = err.data()["missing"].as_array().cloned().unwrap();
        assert!(missing.contains(&json!("hours")));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unregistered_tool_is_method_not_found() {
        let (d, _) = dispatcher(true);
        let err = d.dispatch("tools/call", obj(json!({"name": "nope"}))).await.unwrap_err();
        assert_eq!(err.code(), -32601);
    }

    #[tokio::test]
    async fn resources_list_and_read() {
        let (d, _) = dispatcher(true);
        let out = d.dispatch("resources/list", JsonObject::new()).await.unwrap();
        assert_eq!(out["resources"].as_array().unwrap().len(), 2);

        let out = d
            .dispatch("resources/read", obj(json!({"uri": "resource://earth2/health"})))
            .await
            .unwrap();
        assert_eq!(out["uri"], "resource://earth2/health");
        assert_eq!(out["mimeType"], "application/json");
        assert!(out.get("content").is_some());
    }

    #[tokio::test]
    async fn resources_read_errors() {
        let (d, _) = dispatcher(true);
        let err = d.dispatch("resources/read", JsonObject::new()).await.unwrap_err();
        assert_eq!(err.code(), -32602);
        let err = d
            .dispatch("mcp/resources/read", obj(json!({"uri": "resource://earth2/nope"})))
            .await
            .unwrap_err();
        assert_eq!(err, RpcError::UnknownResource("resource://earth2/nope".into()));
    }

    #[tokio::test]
    async fn health_passthrough_maps_failure_to_500() {
        let (d, _) = dispatcher(true);
        let out = d.dispatch("resource://earth2/health", JsonObject::new()).await.unwrap();
        assert_eq!(out["status"], "ok");

        let (d, _) = dispatcher(false);
        let err = d.dispatch("resource://earth2/health", JsonObject::new()).await.unwrap_err();
        assert_eq!(err.code(), 500);
        assert!(err.data()["detail"].as_str().unwrap().contains("timeout"));
    }

    #[tokio::test]
    async fn unknown_method_is_method_not_found() {
        let (d, _) = dispatcher(true);
        let err = d.dispatch("shutdown", JsonObject::new()).await.unwrap_err();
        assert_eq!(err, RpcError::MethodNotFound("shutdown".into()));
    }
}
