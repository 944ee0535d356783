//! Telemetry seam for resolution metrics
//!
//! Metrics are fire-and-forget: recording must never block or fail the
//! operation that produced the measurement. The endpoint resolver records
//! one [`ROUND_TRIP_TIME`] sample per successful resolution, tagged with the
//! winning endpoint and whether it was reached over a secure scheme.

/// Metric name for the winning endpoint's measured latency.
pub const ROUND_TRIP_TIME: &str = "RoundTripTime";

/// A typed metric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricValue {
    /// Unsigned integer sample (e.g. a latency in milliseconds)
    Uint64(u64),
}

/// Tags attached to a recorded metric.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricTags {
    /// The resource the sample was measured against (endpoint uri)
    pub resource: String,
    /// Transport kind, `"https"` or `"http"`
    pub kind: String,
}

/// A sink for client metrics.
///
/// Implementations forward samples to whatever telemetry backend the
/// deployment uses. Recording is synchronous and must be cheap; sinks that
/// need I/O should enqueue internally.
pub trait MetricsSink: Send + Sync {
    /// Record one sample.
    fn record_metric(&self, name: &str, value: MetricValue, tags: &MetricTags);
}

/// A sink that discards every sample.
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn record_metric(&self, _name: &str, _value: MetricValue, _tags: &MetricTags) {}
}
