use std::time::Instant;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::Serialize;
use serde_json::Value as J;
use thiserror::Error;

use crate::domain::{ForecastParams, PatternParams, StreamParams};
use crate::infra::config::Earth2Config;
use crate::infra::http::headers::{add_standard_headers, with_bearer};
use crate::infra::runtime::limits::{make_http_client_with, retry_async, GET_TIMEOUT, POST_TIMEOUT};

const VISUAL_PATH: &str = "/api/visual";

#[derive(Debug, Error)]
pub enum DownstreamError {
    /// The service answered, with an error status.
    #[error("{method} {url} -> {status}: {body}")]
    Status {
        method: &'static str,
        url: String,
        status: u16,
        body: String,
    },
    /// Network failure or timeout; no usable answer.
    #[error("{method} {url} failed: {reason}")]
    Transport {
        method: &'static str,
        url: String,
        reason: String,
    },
    #[error("{method} {url} returned an undecodable body: {reason}")]
    Decode {
        method: &'static str,
        url: String,
        reason: String,
    },
}

impl DownstreamError {
    fn transport(method: &'static str, url: &str, e: reqwest::Error) -> Self {
        let reason = if e.is_timeout() { format!("timeout: {e}") } else { e.to_string() };
        DownstreamError::Transport { method, url: url.to_owned(), reason }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            DownstreamError::Transport { .. } => true,
            DownstreamError::Status { status, .. } => *status >= 500,
            DownstreamError::Decode { .. } => false,
        }
    }
}

/// The forecast service as the tools see it.
#[async_trait]
pub trait ForecastBackend: Send + Sync {
    async fn health(&self) -> Result<J, DownstreamError>;
    async fn generate_forecast(&self, params: &ForecastParams) -> Result<J, DownstreamError>;
    async fn get_visualization(&self, request_id: &str) -> Result<J, DownstreamError>;
    async fn analyze_patterns(&self, params: &PatternParams) -> Result<J, DownstreamError>;
    /// Returns a stream cursor/handle, not the stream itself.
    async fn stream(&self, params: &StreamParams) -> Result<J, DownstreamError>;
}

#[derive(Clone)]
pub struct Earth2Client {
    cfg: Earth2Config,
    get_http: Client,
    post_http: Client,
}

#[derive(Serialize)]
struct ForecastWire<'a> {
    location: &'a str,
    start_time: &'a str,
    hours: u32,
    ngc_api_key: &'a str,
}

impl Earth2Client {
    pub fn from_config(cfg: &Earth2Config) -> Result<Self, reqwest::Error> {
        Ok(Self {
            cfg: cfg.clone(),
            get_http: make_http_client_with(GET_TIMEOUT)?,
            post_http: make_http_client_with(POST_TIMEOUT)?,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.cfg.base_url.trim_end_matches('/'), path)
    }

    fn prepare(&self, builder: RequestBuilder) -> RequestBuilder {
        let (builder, _rid) = add_standard_headers(builder, None);
        with_bearer(builder, &self.cfg.api_token)
    }

    /// `{base}{prefix}/{segment}` with `segment` percent-encoded as a single
    /// path segment, so it cannot climb out of `prefix` or add a query.
    fn segment_url(&self, prefix: &str, segment: &str) -> Result<String, DownstreamError> {
        let base = self.url(prefix);
        let invalid = |reason: String| DownstreamError::Transport {
            method: "GET",
            url: base.clone(),
            reason,
        };
        let mut url = Url::parse(&base).map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| invalid("base url cannot carry a path".into()))?
            .pop_if_empty()
            .push(segment);
        Ok(url.into())
    }

    async fn get_json(&self, path: &str) -> Result<J, DownstreamError> {
        self.get_url(path, self.url(path)).await
    }

    /// `endpoint` labels logs and metrics; `url` is what gets requested.
    async fn get_url(&self, endpoint: &str, url: String) -> Result<J, DownstreamError> {
        tracing::debug!(endpoint = %url, "earth2 GET");
        let start = Instant::now();
        let res = retry_async(self.cfg.retries, DownstreamError::is_retryable, |_| {
            let builder = self.prepare(self.get_http.get(&url));
            let url = url.clone();
            async move {
                let resp = builder
                    .send()
                    .await
                    .map_err(|e| DownstreamError::transport("GET", &url, e))?;
                read_json("GET", &url, resp).await
            }
        })
        .await;
        finish(endpoint, start, &res);
        res
    }

    async fn post_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<J, DownstreamError> {
        let url = self.url(path);
        tracing::debug!(endpoint = %url, "earth2 POST");
        let start = Instant::now();
        let res = async {
            let resp = self
                .prepare(self.post_http.post(&url))
                .json(body)
                .send()
                .await
                .map_err(|e| DownstreamError::transport("POST", &url, e))?;
            read_json("POST", &url, resp).await
        }
        .await;
        finish(path, start, &res);
        res
    }
}

async fn read_json(method: &'static str, url: &str, resp: Response) -> Result<J, DownstreamError> {
    let status = resp.status();
    if status.as_u16() >= 400 {
        let body = resp.text().await.unwrap_or_default();
        return Err(DownstreamError::Status {
            method,
            url: url.to_owned(),
            status: status.as_u16(),
            body,
        });
    }
    resp.json::<J>().await.map_err(|e| DownstreamError::Decode {
        method,
        url: url.to_owned(),
        reason: e.to_string(),
    })
}

fn finish(path: &str, start: Instant, res: &Result<J, DownstreamError>) {
    let elapsed_ms = start.elapsed().as_millis() as f64;
    crate::infra::logging::observe_downstream_latency(path, elapsed_ms);
    if let Err(e) = res {
        tracing::warn!(endpoint = path, error = %e, "earth2 call failed");
    }
}

#[async_trait]
impl ForecastBackend for Earth2Client {
    async fn health(&self) -> Result<J, DownstreamError> {
        self.get_json(&self.cfg.health_path).await
    }

    async fn generate_forecast(&self, params: &ForecastParams) -> Result<J, DownstreamError> {
        let payload = ForecastWire {
            location: &params.location,
            start_time: &params.start_time,
            hours: params.hours,
            ngc_api_key: &self.cfg.ngc_api_key,
        };
        self.post_json(&self.cfg.forecast_path, &payload).await
    }

    async fn get_visualization(&self, request_id: &str) -> Result<J, DownstreamError> {
        let url = self.segment_url(VISUAL_PATH, request_id)?;
        self.get_url(VISUAL_PATH, url).await
    }

    async fn analyze_patterns(&self, params: &PatternParams) -> Result<J, DownstreamError> {
        self.post_json("/api/analyze", params).await
    }

    async fn stream(&self, params: &StreamParams) -> Result<J, DownstreamError> {
        self.post_json(&self.cfg.stream_path, params).await
    }
}
