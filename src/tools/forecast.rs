//! The forecast tools exposed through `tools/call`. Each one validates its
//! arguments into a typed request and proxies to the downstream backend.

use std::sync::Arc;

use serde_json::json;

use crate::clients::ForecastBackend;
use crate::core::mcp::JsonObject;
use crate::core::tool::{handler, ToolSpec};
use crate::domain::{
    decode_args, ForecastParams, PatternParams, StreamParams, ToolError, VisualizationParams,
    MAX_FORECAST_HOURS,
};

use super::registry::ToolRegistry;

pub const GENERATE_FORECAST: &str = "generate_weather_forecast";
pub const GET_VISUALIZATION: &str = "get_forecast_visualization";
pub const ANALYZE_PATTERNS: &str = "analyze_weather_patterns";
pub const STREAM_FORECAST: &str = "stream_forecast_data";

pub fn build_registry(backend: Arc<dyn ForecastBackend>) -> ToolRegistry {
    let mut reg = ToolRegistry::new();
    register_forecast_tools(&mut reg, backend);
    reg
}

pub fn register_forecast_tools(reg: &mut ToolRegistry, backend: Arc<dyn ForecastBackend>) {
    register_forecast(reg, backend.clone());
    register_visualization(reg, backend.clone());
    register_patterns(reg, backend.clone());
    register_stream(reg, backend);
}

fn register_forecast(reg: &mut ToolRegistry, backend: Arc<dyn ForecastBackend>) {
    let spec = ToolSpec::new(
        GENERATE_FORECAST,
        "Generate a short-range forecast via Earth-2 FourCastNet",
        json!({
            "type": "object",
            "properties": {
                "location": { "type": "string", "description": "lat,lon or place name" },
                "start_time": { "type": "string", "description": "ISO8601" },
                "hours": { "type": "integer", "minimum": 1, "maximum": MAX_FORECAST_HOURS }
            },
            "required": ["location", "start_time", "hours"]
        }),
    );
    reg.register(
        spec,
        handler(move |args: JsonObject| {
            let backend = backend.clone();
            async move {
                let params: ForecastParams = decode_args(args)?;
                params.validate()?;
                backend
                    .generate_forecast(&params)
                    .await
                    .map_err(|e| ToolError::failed("Forecast failed", e))
            }
        }),
    );
}

fn register_visualization(reg: &mut ToolRegistry, backend: Arc<dyn ForecastBackend>) {
    let spec = ToolSpec::new(
        GET_VISUALIZATION,
        "Render forecast visualization (PNG) for a request id",
        json!({
            "type": "object",
            "properties": { "request_id": { "type": "string" } },
            "required": ["request_id"]
        }),
    );
    reg.register(
        spec,
        handler(move |args: JsonObject| {
            let backend = backend.clone();
            async move {
                let params: VisualizationParams = decode_args(args)?;
                params.validate()?;
                backend
                    .get_visualization(&params.request_id)
                    .await
                    .map_err(|e| ToolError::failed("Visualization failed", e))
            }
        }),
    );
}

fn register_patterns(reg: &mut ToolRegistry, backend: Arc<dyn ForecastBackend>) {
    let spec = ToolSpec::new(
        ANALYZE_PATTERNS,
        "Analyze ERA5/Earth-2 outputs for trends/anomalies",
        json!({
            "type": "object",
            "properties": { "bbox": { "type": "array" } },
            "required": ["bbox"]
        }),
    );
    reg.register(
        spec,
        handler(move |args: JsonObject| {
            let backend = backend.clone();
            async move {
                let params: PatternParams = decode_args(args)?;
                backend
                    .analyze_patterns(&params)
                    .await
                    .map_err(|e| ToolError::failed("Pattern analysis failed", e))
            }
        }),
    );
}

fn register_stream(reg: &mut ToolRegistry, backend: Arc<dyn ForecastBackend>) {
    let spec = ToolSpec::new(
        STREAM_FORECAST,
        "Open a server-sent stream for timeseries forecast data",
        json!({
            "type": "object",
            "properties": { "location": { "type": "string" } },
            "required": ["location"]
        }),
    );
    reg.register(
        spec,
        handler(move |args: JsonObject| {
            let backend = backend.clone();
            async move {
                let params: StreamParams = decode_args(args)?;
                backend
                    .stream(&params)
                    .await
                    .map_err(|e| ToolError::failed("Stream failed", e))
            }
        }),
    );
}
