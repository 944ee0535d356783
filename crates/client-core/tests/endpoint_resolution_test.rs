//! Tests for endpoint resolution: discovery, the latency race and dispose
//! semantics, driven through scripted fetchers and probers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tracing_test::traced_test;

use rtcast_client_core::endpoint::{EndpointResolver, LatencyProber, ProbeError};
use rtcast_client_core::http::{FetchOptions, HttpFetcher};
use rtcast_client_core::telemetry::{MetricTags, MetricValue, MetricsSink, ROUND_TRIP_TIME};
use rtcast_client_core::{ClientError, ClientResult};

struct ScriptedFetcher {
    body: ClientResult<String>,
    calls: AtomicU32,
    queries: Mutex<Vec<Vec<(String, String)>>>,
}

impl ScriptedFetcher {
    fn returning(body: &str) -> Self {
        Self {
            body: Ok(body.to_string()),
            calls: AtomicU32::new(0),
            queries: Mutex::new(Vec::new()),
        }
    }

    fn failing(reason: &str) -> Self {
        Self {
            body: Err(ClientError::NetworkError { reason: reason.to_string() }),
            calls: AtomicU32::new(0),
            queries: Mutex::new(Vec::new()),
        }
    }

    fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HttpFetcher for ScriptedFetcher {
    async fn get(
        &self,
        _uri: &str,
        query: &[(String, String)],
        _timeout: Duration,
    ) -> ClientResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.to_vec());
        self.body.clone()
    }
}

#[derive(Clone)]
enum ProbeBehavior {
    /// Answer after the given delay, reporting it as the round-trip time
    Reply(Duration),
    Fail(ProbeError),
    Hang,
}

struct ScriptedProber {
    behaviors: HashMap<String, ProbeBehavior>,
    probed: Mutex<Vec<String>>,
}

impl ScriptedProber {
    fn new(entries: &[(&str, ProbeBehavior)]) -> Self {
        Self {
            behaviors: entries
                .iter()
                .map(|(uri, behavior)| (uri.to_string(), behavior.clone()))
                .collect(),
            probed: Mutex::new(Vec::new()),
        }
    }

    fn probed_uris(&self) -> Vec<String> {
        self.probed.lock().unwrap().clone()
    }
}

#[async_trait]
impl LatencyProber for ScriptedProber {
    async fn probe(&self, uri: &str) -> Result<Duration, ProbeError> {
        self.probed.lock().unwrap().push(uri.to_string());
        match self.behaviors.get(uri).cloned().unwrap_or(ProbeBehavior::Hang) {
            ProbeBehavior::Reply(rtt) => {
                tokio::time::sleep(rtt).await;
                Ok(rtt)
            }
            ProbeBehavior::Fail(error) => Err(error),
            ProbeBehavior::Hang => {
                std::future::pending::<()>().await;
                unreachable!()
            }
        }
    }
}

#[derive(Default)]
struct RecordingMetrics {
    samples: Mutex<Vec<(String, MetricValue, MetricTags)>>,
}

impl MetricsSink for RecordingMetrics {
    fn record_metric(&self, name: &str, value: MetricValue, tags: &MetricTags) {
        self.samples.lock().unwrap().push((name.to_string(), value, tags.clone()));
    }
}

#[tokio::test]
async fn socket_base_uri_short_circuits_discovery() {
    let fetcher = Arc::new(ScriptedFetcher::returning("unused"));
    let prober = Arc::new(ScriptedProber::new(&[]));
    let resolver =
        EndpointResolver::new("wss://streaming.rtcast.io", fetcher.clone(), prober.clone());

    let resolved = resolver.resolve().await.unwrap();

    assert_eq!(resolved.uri, "wss://streaming.rtcast.io/ws");
    assert_eq!(resolved.round_trip_time, Duration::ZERO);
    assert_eq!(fetcher.call_count(), 0, "socket uris must not hit discovery");
    assert!(prober.probed_uris().is_empty(), "socket uris must not be probed");
    assert_eq!(resolver.base_uri(), "wss://streaming.rtcast.io");
}

#[tokio::test]
async fn fastest_probe_wins_the_race() {
    let fetcher = Arc::new(ScriptedFetcher::returning(
        "https://edge-a.rtcast.io,https://edge-b.rtcast.io,https://edge-c.rtcast.io",
    ));
    let prober = Arc::new(ScriptedProber::new(&[
        ("https://edge-a.rtcast.io", ProbeBehavior::Reply(Duration::from_millis(80))),
        ("https://edge-b.rtcast.io", ProbeBehavior::Reply(Duration::from_millis(10))),
        ("https://edge-c.rtcast.io", ProbeBehavior::Reply(Duration::from_millis(40))),
    ]));
    let metrics = Arc::new(RecordingMetrics::default());
    let resolver = EndpointResolver::new("https://discovery.rtcast.io", fetcher, prober)
        .with_metrics(metrics.clone());

    let resolved = resolver.resolve().await.unwrap();

    assert_eq!(resolved.uri, "https://edge-b.rtcast.io");
    assert_eq!(resolved.round_trip_time, Duration::from_millis(10));

    let samples = metrics.samples.lock().unwrap();
    assert_eq!(samples.len(), 1, "only the winner reports a sample");
    let (name, value, tags) = &samples[0];
    assert_eq!(name, ROUND_TRIP_TIME);
    assert_eq!(*value, MetricValue::Uint64(10));
    assert_eq!(tags.resource, "https://edge-b.rtcast.io");
    assert_eq!(tags.kind, "https");
}

#[tokio::test]
async fn slower_candidate_wins_when_the_faster_one_fails() {
    let fetcher = Arc::new(ScriptedFetcher::returning(
        "https://edge-a.rtcast.io,https://edge-b.rtcast.io",
    ));
    let prober = Arc::new(ScriptedProber::new(&[
        (
            "https://edge-a.rtcast.io",
            ProbeBehavior::Fail(ProbeError::new("connection refused")),
        ),
        ("https://edge-b.rtcast.io", ProbeBehavior::Reply(Duration::from_millis(30))),
    ]));
    let resolver =
        EndpointResolver::new("https://discovery.rtcast.io", fetcher, prober.clone());

    let resolved = resolver.resolve().await.unwrap();

    assert_eq!(resolved.uri, "https://edge-b.rtcast.io");
    assert_eq!(prober.probed_uris().len(), 2, "every candidate gets a probe");
}

#[tokio::test]
#[traced_test]
async fn temporarily_disabled_endpoint_is_skipped_quietly() {
    let fetcher = Arc::new(ScriptedFetcher::returning(
        "https://edge-a.rtcast.io,https://edge-b.rtcast.io",
    ));
    let prober = Arc::new(ScriptedProber::new(&[
        (
            "https://edge-a.rtcast.io",
            ProbeBehavior::Fail(ProbeError::with_status(503, "service unavailable")),
        ),
        ("https://edge-b.rtcast.io", ProbeBehavior::Reply(Duration::from_millis(20))),
    ]));
    let resolver = EndpointResolver::new("https://discovery.rtcast.io", fetcher, prober);

    let resolved = resolver.resolve().await.unwrap();

    assert_eq!(resolved.uri, "https://edge-b.rtcast.io");
    assert!(logs_contain("temporarily disabled"), "a 503 is noted at debug, not warned about");
}

#[tokio::test]
async fn reports_attempt_count_when_no_candidate_answers() {
    let fetcher = Arc::new(ScriptedFetcher::returning(
        "https://edge-a.rtcast.io,https://edge-b.rtcast.io",
    ));
    let prober = Arc::new(ScriptedProber::new(&[
        (
            "https://edge-a.rtcast.io",
            ProbeBehavior::Fail(ProbeError::new("connection refused")),
        ),
        (
            "https://edge-b.rtcast.io",
            ProbeBehavior::Fail(ProbeError::with_status(503, "service unavailable")),
        ),
    ]));
    let resolver = EndpointResolver::new("https://discovery.rtcast.io", fetcher, prober);

    let err = resolver.resolve().await.unwrap_err();

    match err {
        ClientError::NoReachableEndpoint { attempted } => assert_eq!(attempted, 2),
        other => panic!("expected NoReachableEndpoint, got {:?}", other),
    }
}

#[tokio::test]
async fn discovery_retries_up_to_the_attempt_ceiling() {
    let fetcher = Arc::new(ScriptedFetcher::failing("connection refused"));
    let prober = Arc::new(ScriptedProber::new(&[]));
    let resolver = EndpointResolver::new("https://discovery.rtcast.io", fetcher.clone(), prober)
        .with_fetch_options(FetchOptions::default().with_max_attempts(3));

    let err = resolver.resolve().await.unwrap_err();

    assert!(matches!(err, ClientError::DiscoveryFailed { .. }));
    assert_eq!(fetcher.call_count(), 3, "fetches must stop at the configured ceiling");
}

#[tokio::test]
async fn discovery_with_no_usable_endpoints_fails() {
    let fetcher = Arc::new(ScriptedFetcher::returning("  ,  ,"));
    let prober = Arc::new(ScriptedProber::new(&[]));
    let resolver = EndpointResolver::new("https://discovery.rtcast.io", fetcher, prober.clone());

    let err = resolver.resolve().await.unwrap_err();

    assert!(matches!(err, ClientError::DiscoveryFailed { .. }));
    assert!(prober.probed_uris().is_empty(), "nothing to probe without endpoints");
}

#[tokio::test]
async fn discovery_requests_carry_cache_busting_params() {
    let fetcher = Arc::new(ScriptedFetcher::returning("https://edge-a.rtcast.io"));
    let prober = Arc::new(ScriptedProber::new(&[(
        "https://edge-a.rtcast.io",
        ProbeBehavior::Reply(Duration::from_millis(5)),
    )]));
    let resolver = EndpointResolver::new("https://discovery.rtcast.io", fetcher.clone(), prober);

    resolver.resolve().await.unwrap();

    let queries = fetcher.queries.lock().unwrap();
    assert_eq!(queries.len(), 1);
    let query = &queries[0];
    assert_eq!(query[0].0, "version");
    assert_eq!(query[0].1, rtcast_client_core::VERSION);
    assert_eq!(query[1].0, "_");
    let millis: i64 = query[1].1.parse().expect("cache buster should be a timestamp");
    assert!(millis > 1_600_000_000_000, "cache buster should be epoch millis, got {}", millis);
}

#[tokio::test]
async fn rejects_base_uris_with_unsupported_schemes() {
    let resolver = EndpointResolver::new(
        "ftp://files.rtcast.io",
        Arc::new(ScriptedFetcher::returning("unused")),
        Arc::new(ScriptedProber::new(&[])),
    );

    let err = resolver.resolve().await.unwrap_err();

    match err {
        ClientError::UnsupportedScheme { uri } => assert_eq!(uri, "ftp://files.rtcast.io"),
        other => panic!("expected UnsupportedScheme, got {:?}", other),
    }
}

#[tokio::test]
async fn dispose_cancels_an_inflight_resolution() {
    let fetcher = Arc::new(ScriptedFetcher::returning(
        "https://edge-a.rtcast.io,https://edge-b.rtcast.io",
    ));
    let prober = Arc::new(ScriptedProber::new(&[
        ("https://edge-a.rtcast.io", ProbeBehavior::Hang),
        ("https://edge-b.rtcast.io", ProbeBehavior::Hang),
    ]));
    let resolver =
        Arc::new(EndpointResolver::new("https://discovery.rtcast.io", fetcher, prober));

    let racing = resolver.clone();
    let resolution = tokio::spawn(async move { racing.resolve().await });
    tokio::time::sleep(Duration::from_millis(50)).await;

    resolver.dispose();
    resolver.dispose();

    let result = resolution.await.expect("resolve task must not panic");
    assert!(matches!(result, Err(ClientError::Disposed)));
    assert!(
        matches!(resolver.resolve().await, Err(ClientError::Disposed)),
        "a disposed resolver must refuse new rounds"
    );
}
