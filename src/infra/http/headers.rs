use reqwest::RequestBuilder;

/// Request id for logging/correlation with the downstream service.
pub fn generate_request_id() -> String {
    format!("gw-{}", uuid::Uuid::new_v4().simple())
}

/// Add standard headers to an outgoing request. Returns the updated builder and the request id used.
pub fn add_standard_headers(
    builder: RequestBuilder,
    request_id: Option<String>,
) -> (RequestBuilder, String) {
    let rid = request_id.unwrap_or_else(generate_request_id);
    let b = builder.header("x-request-id", rid.as_str()).header(
        reqwest::header::USER_AGENT,
        format!("earth2-mcp-gateway/{}", env!("CARGO_PKG_VERSION")),
    );
    (b, rid)
}

/// Bearer pass-through; an empty token sends no Authorization header.
pub fn with_bearer(builder: RequestBuilder, token: &str) -> RequestBuilder {
    if token.is_empty() {
        builder
    } else {
        builder.bearer_auth(token)
    }
}
