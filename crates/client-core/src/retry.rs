//! Retry mechanisms for transient failures
//!
//! This module provides the bounded-retry plumbing used by endpoint
//! discovery and other network-facing operations. Only errors reporting
//! [`ClientError::is_recoverable`] are retried; everything else returns
//! immediately.

use crate::error::{ClientError, ClientResult};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, warn};

/// Configuration for retry behavior
///
/// Defines maximum attempts, delay strategy and backoff behavior for
/// operations retried on recoverable errors.
///
/// # Examples
///
/// ```rust
/// # use rtcast_client_core::retry::RetryConfig;
/// # use std::time::Duration;
/// let config = RetryConfig::default();
/// assert_eq!(config.max_attempts, 3);
/// assert_eq!(config.initial_delay, Duration::from_millis(100));
///
/// let quick = RetryConfig::quick();
/// assert_eq!(quick.max_attempts, 5);
/// assert!(quick.use_jitter);
/// ```
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    pub max_attempts: u32,
    /// Initial delay between retries
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
    /// Whether to add jitter to delays
    pub use_jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            use_jitter: true,
        }
    }
}

impl RetryConfig {
    /// Create a configuration for quick retries (e.g., discovery fetches)
    pub fn quick() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_millis(50),
            max_delay: Duration::from_secs(5),
            backoff_multiplier: 1.5,
            use_jitter: true,
        }
    }

    /// Override the attempt ceiling, keeping the delay strategy
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }
}

/// Retry an operation with exponential backoff
///
/// Executes an async operation, retrying on recoverable errors with the
/// configured delay strategy. Non-recoverable errors return immediately.
///
/// # Examples
///
/// ```rust
/// # use rtcast_client_core::retry::{retry_with_backoff, RetryConfig};
/// # use rtcast_client_core::error::ClientError;
/// # use std::sync::atomic::{AtomicU32, Ordering};
/// # tokio_test::block_on(async {
/// let attempts = AtomicU32::new(0);
///
/// let result = retry_with_backoff(
///     "flaky_request",
///     RetryConfig::quick(),
///     || async {
///         let current = attempts.fetch_add(1, Ordering::SeqCst) + 1;
///         if current < 3 {
///             Err(ClientError::NetworkError { reason: "connection timeout".to_string() })
///         } else {
///             Ok("success")
///         }
///     }
/// ).await.unwrap();
///
/// assert_eq!(result, "success");
/// assert_eq!(attempts.load(Ordering::SeqCst), 3);
/// # })
/// ```
pub async fn retry_with_backoff<T, F, Fut>(
    operation_name: &str,
    config: RetryConfig,
    mut operation: F,
) -> ClientResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ClientResult<T>>,
{
    let mut attempt = 0;
    let mut delay = config.initial_delay;

    loop {
        attempt += 1;
        debug!(
            operation = operation_name,
            attempt = attempt,
            max_attempts = config.max_attempts,
            "Attempting operation"
        );

        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    debug!(
                        operation = operation_name,
                        attempt = attempt,
                        "Operation succeeded after retries"
                    );
                }
                return Ok(result);
            }
            Err(e) if e.is_recoverable() && attempt < config.max_attempts => {
                warn!(
                    operation = operation_name,
                    attempt = attempt,
                    error = %e,
                    category = e.category(),
                    next_delay_ms = delay.as_millis() as u64,
                    "Recoverable error, will retry"
                );

                // Apply jitter if configured
                let actual_delay = if config.use_jitter {
                    let jitter = (rand::random::<f64>() - 0.5) * 0.2; // ±10% jitter
                    let millis = delay.as_millis() as f64;
                    Duration::from_millis((millis * (1.0 + jitter)) as u64)
                } else {
                    delay
                };

                sleep(actual_delay).await;

                // Calculate next delay with exponential backoff
                let next_delay_ms = (delay.as_millis() as f64 * config.backoff_multiplier) as u64;
                delay = Duration::from_millis(next_delay_ms).min(config.max_delay);
            }
            Err(e) => {
                if attempt >= config.max_attempts {
                    error!(
                        operation = operation_name,
                        attempts = attempt,
                        error = %e,
                        "Operation failed after all retry attempts"
                    );
                } else {
                    error!(
                        operation = operation_name,
                        error = %e,
                        category = e.category(),
                        "Non-recoverable error, not retrying"
                    );
                }
                return Err(e);
            }
        }
    }
}
