use std::time::Duration;

pub const GET_TIMEOUT: Duration = Duration::from_secs(20);
pub const POST_TIMEOUT: Duration = Duration::from_secs(60);

/// Build a reqwest client with a connect timeout and the given total timeout.
pub fn make_http_client_with(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(2))
        .timeout(timeout)
        .build()
}

/// Exponential backoff for async ops. Errors rejected by `retryable` are
/// returned immediately.
pub async fn retry_async<T, E, Fut, F, P>(mut attempts: u32, retryable: P, mut op: F) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
{
    let mut try_num: u32 = 0;
    let mut delay_ms: u64 = 50;
    loop {
        match op(try_num).await {
            Ok(v) => return Ok(v),
            Err(e) => {
                if attempts == 0 || !retryable(&e) {
                    return Err(e);
                }
                attempts -= 1;
                tracing::debug!(attempt = try_num, delay_ms, "retrying");
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                delay_ms = (delay_ms * 2).min(1_000);
                try_num += 1;
            }
        }
    }
}
