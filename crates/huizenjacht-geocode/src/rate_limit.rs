//! Retry policy for geocoder calls.
//!
//! Only an HTTP 429 is retried, exactly once, after a fixed delay. Every other
//! failure goes straight back to the cascade, which moves on to the next
//! strategy.

use std::future::Future;
use std::time::Duration;

use crate::error::GeocodeError;

/// Runs `operation`, retrying once after `delay` if it was rate limited.
///
/// `None` disables the retry.
pub(crate) async fn retry_after_rate_limit<T, F, Fut>(
    delay: Option<Duration>,
    mut operation: F,
) -> Result<T, GeocodeError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, GeocodeError>>,
{
    match operation().await {
        Err(err @ GeocodeError::RateLimited { .. }) => {
            let Some(delay) = delay else {
                return Err(err);
            };
            tracing::warn!(
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                error = %err,
                "geocoder rate limited; retrying once"
            );
            tokio::time::sleep(delay).await;
            operation().await
        }
        other => other,
    }
}
