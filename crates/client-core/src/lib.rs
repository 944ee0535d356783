//! Client-core: resilience layer for rtcast streaming clients
//!
//! This crate keeps a client connected to the closest healthy endpoint and
//! keeps its streams alive across the failures a long-lived media session
//! runs into: endpoints going away, sessions being terminated server-side
//! and remote streams ending mid-join.
//!
//! ## Layering
//! ```text
//! application -> client-core -> {transport, subscriber}  (supplied by the caller)
//!                            -> rtcast-infra-common      (disposal, logging)
//! ```
//!
//! Client-core focuses on:
//! - Endpoint discovery and latency racing ([`endpoint::EndpointResolver`])
//! - Session supervision with reason-keyed retry ([`monitor::SessionMonitor`])
//! - Strategy-ordered stream failover ([`selection::JoinAttempt`])
//!
//! Network transports, media handling and the wire protocol itself live
//! behind the [`http::HttpFetcher`], [`endpoint::LatencyProber`],
//! [`monitor::SessionTransport`] and [`selection::StreamSubscriber`] traits,
//! so the resilience logic stays testable without sockets.

pub mod endpoint;
pub mod environment;
pub mod error;
pub mod http;
pub mod monitor;
pub mod retry;
pub mod room;
pub mod selection;
pub mod telemetry;

// Public API exports (only high-level client-core types)
pub use endpoint::{EndpointCandidate, EndpointResolver, LatencyProber, ProbeError, ResolutionResult, Scheme};
pub use environment::Environment;
pub use error::{ClientError, ClientResult};
pub use http::{FetchOptions, HttpFetcher};
pub use monitor::{
    MonitorConfig, MonitorHandler, MonitorRegistry, MonitorState, RetryDecision, RetryHandle,
    RetryPolicy, SessionHandle, SessionMonitor, SessionParams, SessionTransport,
    TerminationEvent, TerminationFeed, TerminationNotice, TerminationReason,
};
pub use retry::{retry_with_backoff, RetryConfig};
pub use room::{Member, MemberRole, MemberState, Stream, StreamType, TrackState};
pub use selection::{
    join_with_strategy, JoinAttempt, Selection, SelectionStrategy, StreamCandidate, StreamEnded,
    StreamEndedFeed, StreamSubscriber, SubscriptionHandle,
};
pub use telemetry::{MetricTags, MetricValue, MetricsSink, NoopMetrics};

/// Client-core version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
