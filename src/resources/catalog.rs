use std::sync::Arc;

use serde_json::json;

use crate::clients::ForecastBackend;
use crate::core::mcp::{Capabilities, ServerInfo};

use super::registry::{provider, Resource, ResourceRegistry};

pub const HEALTH_URI: &str = "resource://earth2/health";
pub const CAPABILITIES_URI: &str = "resource://earth2/capabilities";

pub fn build_resources(
    backend: Arc<dyn ForecastBackend>,
    server: ServerInfo,
    tool_names: Vec<String>,
) -> ResourceRegistry {
    let mut reg = ResourceRegistry::new();

    // A failing downstream is reported inside the content; the read succeeds.
    reg.add(
        Resource::new(HEALTH_URI, "application/json", Some("Earth-2 service health")),
        provider(move || {
            let backend = backend.clone();
            async move {
                match backend.health().await {
                    Ok(status) => status,
                    Err(e) => json!({ "status": "unavailable", "detail": e.to_string() }),
                }
            }
        }),
    );

    let advertised = json!({
        "server": server,
        "tools": tool_names,
        "capabilities": Capabilities::default(),
    });
    reg.add(
        Resource::new(CAPABILITIES_URI, "application/json", Some("Advertised model capabilities")),
        provider(move || {
            let body = advertised.clone();
            async move { body }
        }),
    );

    reg
}
