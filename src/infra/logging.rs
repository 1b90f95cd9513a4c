use tracing_subscriber::EnvFilter;

pub fn init(default_level: &str) {
    // RUST_LOG wins over the configured level; repeated calls are harmless.
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// Log a metrics-like line; the `metrics` facade carries the real value.
pub fn log_metric(subject: &str, metric: &str, value: f64) {
    tracing::info!(subject = subject, metric = metric, value = value, "metric");
}

pub fn count_tool_call(tool: &str, outcome: &'static str) {
    metrics::counter!("gateway_tool_calls_total", "tool" => tool.to_owned(), "outcome" => outcome)
        .increment(1);
    if outcome != "ok" {
        metrics::counter!("gateway_tool_errors_total", "tool" => tool.to_owned()).increment(1);
    }
    log_metric(tool, "tool_calls_total", 1.0);
}

pub fn observe_downstream_latency(endpoint: &str, elapsed_ms: f64) {
    metrics::histogram!("gateway_downstream_latency_ms", "endpoint" => endpoint.to_owned())
        .record(elapsed_ms);
    log_metric(endpoint, "downstream_latency_ms", elapsed_ms);
}

pub fn set_ws_sessions(live: usize) {
    metrics::gauge!("gateway_ws_sessions").set(live as f64);
}
