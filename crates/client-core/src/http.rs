//! HTTP fetch seam used by endpoint discovery
//!
//! Transport is an external concern; the core only needs a single-attempt
//! GET. [`get_with_retry`] layers the bounded retry policy on top of any
//! [`HttpFetcher`] implementation.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::ClientResult;
use crate::retry::{retry_with_backoff, RetryConfig};

/// Default per-request timeout for discovery fetches.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(15);
/// Default attempt ceiling for discovery fetches.
pub const DEFAULT_FETCH_ATTEMPTS: u32 = 4;

/// A single-attempt HTTP GET.
///
/// Implementations perform one request and report failures as
/// [`ClientError::NetworkError`](crate::error::ClientError::NetworkError) so
/// the retry layer can distinguish transient transport failures from final
/// outcomes. The timeout applies to the whole request.
#[async_trait]
pub trait HttpFetcher: Send + Sync {
    /// Fetch `uri` with the given query parameters, returning the response
    /// body.
    async fn get(
        &self,
        uri: &str,
        query: &[(String, String)],
        timeout: Duration,
    ) -> ClientResult<String>;
}

/// Options controlling a retried fetch.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Per-request timeout handed to the fetcher
    pub timeout: Duration,
    /// Total attempts before the fetch fails
    pub max_attempts: u32,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_FETCH_TIMEOUT,
            max_attempts: DEFAULT_FETCH_ATTEMPTS,
        }
    }
}

impl FetchOptions {
    /// Override the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the attempt ceiling
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }
}

/// GET `uri`, retrying recoverable failures up to `options.max_attempts`.
pub async fn get_with_retry(
    fetcher: &dyn HttpFetcher,
    uri: &str,
    query: &[(String, String)],
    options: &FetchOptions,
) -> ClientResult<String> {
    let config = RetryConfig::quick().with_max_attempts(options.max_attempts);
    retry_with_backoff("http_get", config, || {
        fetcher.get(uri, query, options.timeout)
    })
    .await
}
