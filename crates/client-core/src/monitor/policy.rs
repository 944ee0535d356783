//! Termination reasons and the retry decision policy.
//!
//! The mapping from reason to decision is a pure function of the policy
//! configuration. The orchestrator owns all side effects; this module owns
//! none, which is what keeps the mapping testable as a table.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Why a stream session terminated.
///
/// Wire names follow the signaling protocol (`"app-background"` etc.).
/// Reasons outside the known set deserialize as [`Custom`](Self::Custom).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TerminationReason {
    /// The stream completed normally
    Ended,
    /// The stream failed; the session is expected to heal on retry
    Error,
    /// The application moved to the background
    AppBackground,
    /// The serving node is at capacity and asked clients to back off
    Capacity,
    /// An application-defined reason; the client will not retry
    #[serde(other)]
    Custom,
}

/// A termination event reported by the signaling layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TerminationEvent {
    pub stream_id: String,
    pub session_id: String,
    pub reason: TerminationReason,
}

/// What the orchestrator does about a termination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Re-establish right away without involving the caller
    RetryImmediately,
    /// Re-establish after the given backoff without involving the caller
    RetryAfterDelay(Duration),
    /// Tell the caller, offering a retry handle
    SurfaceToCaller,
    /// Tell the caller; no retry is offered
    Terminal,
}

/// Reason-keyed retry policy.
///
/// `decide` is total: every reason maps to exactly one decision.
///
/// # Examples
///
/// ```rust
/// # use rtcast_client_core::monitor::{RetryDecision, RetryPolicy, TerminationReason};
/// # use std::time::Duration;
/// let policy = RetryPolicy::default().with_capacity_backoff(Duration::from_secs(2));
/// assert_eq!(
///     policy.decide(TerminationReason::Capacity),
///     RetryDecision::RetryAfterDelay(Duration::from_secs(2))
/// );
/// assert_eq!(policy.decide(TerminationReason::Error), RetryDecision::RetryImmediately);
/// ```
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Backoff applied before retrying a capacity termination
    pub capacity_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { capacity_backoff: Duration::from_secs(1) }
    }
}

impl RetryPolicy {
    /// Override the capacity backoff
    pub fn with_capacity_backoff(mut self, backoff: Duration) -> Self {
        self.capacity_backoff = backoff;
        self
    }

    /// Map a termination reason to a retry decision.
    pub fn decide(&self, reason: TerminationReason) -> RetryDecision {
        match reason {
            TerminationReason::Error => RetryDecision::RetryImmediately,
            TerminationReason::Capacity => RetryDecision::RetryAfterDelay(self.capacity_backoff),
            TerminationReason::Ended | TerminationReason::AppBackground => {
                RetryDecision::SurfaceToCaller
            }
            TerminationReason::Custom => RetryDecision::Terminal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_reason_has_a_decision() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.decide(TerminationReason::Error), RetryDecision::RetryImmediately);
        assert_eq!(
            policy.decide(TerminationReason::Capacity),
            RetryDecision::RetryAfterDelay(Duration::from_secs(1))
        );
        assert_eq!(policy.decide(TerminationReason::Ended), RetryDecision::SurfaceToCaller);
        assert_eq!(policy.decide(TerminationReason::AppBackground), RetryDecision::SurfaceToCaller);
        assert_eq!(policy.decide(TerminationReason::Custom), RetryDecision::Terminal);
    }

    #[test]
    fn capacity_backoff_is_configurable() {
        let policy = RetryPolicy::default().with_capacity_backoff(Duration::from_millis(80));
        assert_eq!(
            policy.decide(TerminationReason::Capacity),
            RetryDecision::RetryAfterDelay(Duration::from_millis(80))
        );
    }

    #[test]
    fn reasons_use_protocol_wire_names() {
        let event: TerminationEvent = serde_json::from_str(
            r#"{"streamId":"stream-1","sessionId":"session-1","reason":"app-background"}"#,
        )
        .unwrap();
        assert_eq!(event.reason, TerminationReason::AppBackground);
        assert_eq!(event.stream_id, "stream-1");

        let json = serde_json::to_string(&TerminationReason::Capacity).unwrap();
        assert_eq!(json, r#""capacity""#);
    }

    #[test]
    fn unknown_reasons_map_to_custom() {
        let event: TerminationEvent = serde_json::from_str(
            r#"{"streamId":"stream-1","sessionId":"session-1","reason":"censored"}"#,
        )
        .unwrap();
        assert_eq!(event.reason, TerminationReason::Custom);
    }
}
