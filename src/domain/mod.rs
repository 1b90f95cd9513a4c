use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value as J;
use thiserror::Error;

use crate::core::mcp::JsonObject;

pub const MAX_FORECAST_HOURS: u32 = 240;

#[derive(Debug, Error)]
pub enum ToolError {
    /// The downstream call behind the tool failed.
    #[error("{message}: {detail}")]
    Failed { message: String, detail: String },
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
}

impl ToolError {
    pub fn failed(message: impl Into<String>, detail: impl ToString) -> Self {
        ToolError::Failed { message: message.into(), detail: detail.to_string() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForecastParams {
    /// `lat,lon` or a place name.
    pub location: String,
    /// ISO8601.
    pub start_time: String,
    pub hours: u32,
}

impl ForecastParams {
    pub fn validate(&self) -> Result<(), ToolError> {
        if !(1..=MAX_FORECAST_HOURS).contains(&self.hours) {
            return Err(ToolError::InvalidArguments(format!(
                "hours must be between 1 and {MAX_FORECAST_HOURS}, got {}",
                self.hours
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VisualizationParams {
    pub request_id: String,
}

impl VisualizationParams {
    /// The id becomes one URL path segment; empty and dot segments have no
    /// meaning there.
    pub fn validate(&self) -> Result<(), ToolError> {
        match self.request_id.trim() {
            "" | "." | ".." => Err(ToolError::InvalidArguments(format!(
                "invalid request_id '{}'",
                self.request_id
            ))),
            _ => Ok(()),
        }
    }
}

/// Extra members are forwarded to the downstream service untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatternParams {
    pub bbox: Vec<J>,
    #[serde(flatten)]
    pub extra: JsonObject,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StreamParams {
    pub location: String,
    #[serde(flatten)]
    pub extra: JsonObject,
}

pub fn decode_args<T: DeserializeOwned>(args: JsonObject) -> Result<T, ToolError> {
    serde_json::from_value(J::Object(args)).map_err(|e| ToolError::InvalidArguments(e.to_string()))
}
