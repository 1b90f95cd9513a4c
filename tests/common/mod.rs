#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use earth2_mcp_gateway::api::AppState;
use earth2_mcp_gateway::clients::{DownstreamError, ForecastBackend};
use earth2_mcp_gateway::domain::{ForecastParams, PatternParams, StreamParams};
use earth2_mcp_gateway::infra::{boot::build_state, config::Config, http_app::build_app};
use serde_json::{json, Value as J};

/// In-memory forecast service. Locations starting with `slow` answer late,
/// `fail` answers with a downstream 503, `array` answers with a JSON array and
/// `panic` panics inside the handler.
#[derive(Default)]
pub struct StubBackend;

fn status_503(url: &str) -> DownstreamError {
    DownstreamError::Status {
        method: "POST",
        url: url.into(),
        status: 503,
        body: "overloaded".into(),
    }
}

#[async_trait]
impl ForecastBackend for StubBackend {
    async fn health(&self) -> Result<J, DownstreamError> {
        Ok(json!({ "status": "ok" }))
    }

    async fn generate_forecast(&self, p: &ForecastParams) -> Result<J, DownstreamError> {
        if p.location.starts_with("slow") {
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        if p.location.starts_with("fail") {
            return Err(status_503("http://stub/api/forecast"));
        }
        if p.location.starts_with("array") {
            return Ok(json!([1, 2]));
        }
        if p.location.starts_with("panic") {
            panic!("stub backend bug");
        }
        Ok(json!({ "location": p.location, "hours": p.hours }))
    }

    async fn get_visualization(&self, request_id: &str) -> Result<J, DownstreamError> {
        Ok(json!({ "request_id": request_id, "url": format!("/visual/{request_id}.png") }))
    }

    async fn analyze_patterns(&self, p: &PatternParams) -> Result<J, DownstreamError> {
        Ok(json!({ "cells": p.bbox.len() }))
    }

    async fn stream(&self, p: &StreamParams) -> Result<J, DownstreamError> {
        Ok(json!({ "cursor": format!("stream-{}", p.location) }))
    }
}

pub fn stub_state() -> AppState {
    build_state(&Config::default(), Arc::new(StubBackend))
}

pub fn stub_app() -> (Router, AppState) {
    let state = stub_state();
    (build_app(state.clone()), state)
}
