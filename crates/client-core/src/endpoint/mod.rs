//! Endpoint resolution
//!
//! A client is configured with a single base uri. Socket uris (`ws`/`wss`)
//! name the endpoint directly; `http`/`https` uris name a discovery service
//! that returns a list of candidate endpoints, which are then raced with
//! latency probes. The first candidate to answer wins, the rest are
//! cancelled, and the winner's round-trip time is reported to telemetry.
//!
//! The entry point is [`EndpointResolver::resolve`].

mod candidate;
mod discovery;
mod race;
mod resolver;

pub use candidate::{EndpointCandidate, ResolutionResult, Scheme};
pub use resolver::EndpointResolver;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Failure of a single latency probe.
///
/// Probe failures never fail a resolution round by themselves; they remove
/// one candidate from the race. A `503` status marks a candidate that is
/// deliberately draining and is logged at debug rather than warn level.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ProbeError {
    /// HTTP status of the probe response, when one was received
    pub status: Option<u16>,
    /// Human-readable failure description
    pub message: String,
}

impl ProbeError {
    /// A probe failure without a status (timeout, connection refused).
    pub fn new(message: impl Into<String>) -> Self {
        Self { status: None, message: message.into() }
    }

    /// A probe failure carrying the response status.
    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self { status: Some(status), message: message.into() }
    }

    /// Whether the endpoint reported itself as temporarily disabled.
    pub fn is_temporarily_disabled(&self) -> bool {
        self.status == Some(503)
    }
}

/// Measures the reachability and latency of one endpoint.
///
/// Implementations own their probe transport and timeout. A successful
/// probe returns the measured round-trip time.
#[async_trait]
pub trait LatencyProber: Send + Sync {
    /// Probe `uri` once.
    async fn probe(&self, uri: &str) -> Result<Duration, ProbeError>;
}
