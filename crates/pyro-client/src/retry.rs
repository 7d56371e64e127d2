//! Backoff for portal reads.
//!
//! Only GETs come through here. Creating, updating, managing and uploading
//! are sent exactly once, because replaying one after a lost response could
//! file a second application or apply a transition twice.
//!
//! A GET is repeated only when no response arrived at all (connection
//! refused, reset, timed out). A response of any status, 5xx included, goes
//! back to the transport, which owns the refresh-once rule for 401/403.

use std::future::Future;
use std::time::Duration;

/// Attempts after the first one.
const READ_RETRIES: u32 = 3;

const FIRST_BACKOFF: Duration = Duration::from_millis(200);

/// Delay before retry number `retry` (0-based): 200ms, 400ms, 800ms.
fn backoff(retry: u32) -> Duration {
    FIRST_BACKOFF * 2u32.pow(retry)
}

/// Send the GET built by `send`, repeating it on transport failure.
pub(crate) async fn retry_get<F, Fut>(
    endpoint: &str,
    send: F,
) -> Result<reqwest::Response, reqwest::Error>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<reqwest::Response, reqwest::Error>>,
{
    let mut retry = 0;
    loop {
        match send().await {
            Ok(resp) => return Ok(resp),
            Err(e) if retry < READ_RETRIES => {
                let delay = backoff(retry);
                retry += 1;
                tracing::warn!(
                    endpoint,
                    retry,
                    of = READ_RETRIES,
                    ?delay,
                    error = %e,
                    "portal read got no response; retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                tracing::warn!(endpoint, error = %e, "portal read gave up");
                return Err(e);
            }
        }
    }
}
