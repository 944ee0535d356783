//! Endpoint Failover Demo
//!
//! This example demonstrates endpoint resolution against a scripted
//! discovery service: the resolver fetches a candidate list, races one
//! latency probe per candidate and reports whichever endpoint answers
//! first. One candidate reports 503 to show how a draining endpoint drops
//! out of the race without failing it.
//!
//! Run with: cargo run --example endpoint_failover_demo

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rtcast_client_core::endpoint::{EndpointResolver, LatencyProber, ProbeError};
use rtcast_client_core::http::HttpFetcher;
use rtcast_client_core::telemetry::{MetricTags, MetricValue, MetricsSink};
use rtcast_client_core::ClientResult;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing for better output
    tracing_subscriber::fmt::init();

    println!("🌐 Endpoint Failover Demo");
    println!("=========================\n");

    let mut latencies = HashMap::new();
    latencies.insert(
        "https://edge-a.rtcast.io".to_string(),
        Duration::from_millis(40),
    );
    latencies.insert(
        "https://edge-b.rtcast.io".to_string(),
        Duration::from_millis(12),
    );
    // edge-c stays out of the table; its probe reports 503 below.

    let resolver = EndpointResolver::new(
        "https://streaming.rtcast.io",
        Arc::new(DemoFetcher),
        Arc::new(DemoProber { latencies }),
    )
    .with_metrics(Arc::new(StdoutMetrics));

    println!("📡 Racing latency probes over the discovered candidates...\n");
    let resolved = resolver.resolve().await?;

    println!("\n✅ Fastest endpoint: {}", resolved.uri);
    println!(
        "   Round trip time: {}ms",
        resolved.round_trip_time.as_millis()
    );

    Ok(())
}

/// Serves a fixed comma-separated candidate list, the discovery wire format.
struct DemoFetcher;

#[async_trait]
impl HttpFetcher for DemoFetcher {
    async fn get(
        &self,
        _uri: &str,
        _query: &[(String, String)],
        _timeout: Duration,
    ) -> ClientResult<String> {
        Ok("https://edge-a.rtcast.io,https://edge-b.rtcast.io,https://edge-c.rtcast.io".to_string())
    }
}

/// Answers probes after a scripted delay; endpoints missing from the table
/// report themselves as temporarily disabled.
struct DemoProber {
    latencies: HashMap<String, Duration>,
}

#[async_trait]
impl LatencyProber for DemoProber {
    async fn probe(&self, uri: &str) -> Result<Duration, ProbeError> {
        match self.latencies.get(uri) {
            Some(latency) => {
                tokio::time::sleep(*latency).await;
                Ok(*latency)
            }
            None => Err(ProbeError::with_status(503, "maintenance window")),
        }
    }
}

/// Prints every sample instead of shipping it to a telemetry backend.
struct StdoutMetrics;

impl MetricsSink for StdoutMetrics {
    fn record_metric(&self, name: &str, value: MetricValue, tags: &MetricTags) {
        println!("  📈 {} = {:?} ({} over {})", name, value, tags.resource, tags.kind);
    }
}
