//! The endpoint resolver component.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use rtcast_infra_common::disposable::{AbortOnDispose, DisposableList};

use crate::error::{ClientError, ClientResult};
use crate::http::{FetchOptions, HttpFetcher};
use crate::telemetry::{MetricTags, MetricValue, MetricsSink, NoopMetrics, ROUND_TRIP_TIME};

use super::candidate::{ResolutionResult, Scheme};
use super::discovery;
use super::race::ProbeRace;
use super::LatencyProber;

/// Resolves the configured base uri to a concrete endpoint.
///
/// Socket base uris short-circuit to `{base}/ws` at zero round-trip time.
/// `http`/`https` base uris go through discovery and a latency race; the
/// fastest reachable candidate wins and its round-trip time is reported to
/// the metrics sink. Each [`resolve`](Self::resolve) call is one
/// self-contained round; the resolver keeps no candidate state between
/// rounds.
///
/// # Examples
///
/// ```rust,no_run
/// # use std::sync::Arc;
/// # use rtcast_client_core::endpoint::{EndpointResolver, LatencyProber};
/// # use rtcast_client_core::http::HttpFetcher;
/// # async fn example(fetcher: Arc<dyn HttpFetcher>, prober: Arc<dyn LatencyProber>) {
/// let resolver = EndpointResolver::new(EndpointResolver::DEFAULT_BASE_URI, fetcher, prober);
/// match resolver.resolve().await {
///     Ok(resolved) => println!("connect to {}", resolved.uri),
///     Err(e) => eprintln!("resolution failed: {}", e),
/// }
/// # }
/// ```
pub struct EndpointResolver {
    base_uri: String,
    fetcher: Arc<dyn HttpFetcher>,
    prober: Arc<dyn LatencyProber>,
    metrics: Arc<dyn MetricsSink>,
    fetch_options: FetchOptions,
    disposables: Arc<DisposableList>,
}

impl EndpointResolver {
    /// Base uri used when a client does not configure one.
    pub const DEFAULT_BASE_URI: &'static str = "https://streaming.rtcast.io";

    pub fn new(
        base_uri: impl Into<String>,
        fetcher: Arc<dyn HttpFetcher>,
        prober: Arc<dyn LatencyProber>,
    ) -> Self {
        Self {
            base_uri: base_uri.into(),
            fetcher,
            prober,
            metrics: Arc::new(NoopMetrics),
            fetch_options: FetchOptions::default(),
            disposables: Arc::new(DisposableList::new()),
        }
    }

    /// Attach a metrics sink for round-trip-time samples
    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Override discovery fetch options
    pub fn with_fetch_options(mut self, options: FetchOptions) -> Self {
        self.fetch_options = options;
        self
    }

    /// The configured base uri
    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    /// Resolve the base uri to a reachable endpoint.
    pub async fn resolve(&self) -> ClientResult<ResolutionResult> {
        if self.disposables.is_disposed() {
            return Err(ClientError::Disposed);
        }

        match Scheme::classify(&self.base_uri) {
            Some(Scheme::Ws) | Some(Scheme::Wss) => {
                let uri = format!("{}/ws", self.base_uri);
                debug!(endpoint = %uri, "socket base uri, skipping discovery");
                Ok(ResolutionResult { uri, round_trip_time: Duration::ZERO })
            }
            Some(Scheme::Http) | Some(Scheme::Https) => self.resolve_via_discovery().await,
            None => Err(ClientError::UnsupportedScheme { uri: self.base_uri.clone() }),
        }
    }

    async fn resolve_via_discovery(&self) -> ClientResult<ResolutionResult> {
        let base_uri = self.base_uri.clone();
        let fetcher = self.fetcher.clone();
        let prober = self.prober.clone();
        let metrics = self.metrics.clone();
        let fetch_options = self.fetch_options.clone();
        let disposables = self.disposables.clone();

        // The round runs on its own task, registered for abort, so a
        // dispose() cancels discovery and every probe in one stroke.
        let task = tokio::spawn(async move {
            let candidates =
                discovery::fetch_candidates(fetcher.as_ref(), &base_uri, &fetch_options).await?;
            let (winner, rtt) = ProbeRace::new(candidates).run(prober, &disposables).await?;

            let tags = MetricTags {
                resource: winner.uri.clone(),
                kind: winner.scheme.telemetry_kind().to_string(),
            };
            metrics.record_metric(
                ROUND_TRIP_TIME,
                MetricValue::Uint64(rtt.as_millis() as u64),
                &tags,
            );
            info!(
                endpoint = %winner.uri,
                rtt_ms = rtt.as_millis() as u64,
                "selected closest endpoint"
            );

            Ok(ResolutionResult { uri: winner.uri, round_trip_time: rtt })
        });
        self.disposables.add(AbortOnDispose::new(task.abort_handle()));

        match task.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(ClientError::Disposed),
            Err(e) => Err(ClientError::internal_error(format!("resolution task failed: {}", e))),
        }
    }

    /// Cancel any in-flight resolution and release resources. Idempotent.
    pub fn dispose(&self) {
        if self.disposables.is_disposed() {
            return;
        }
        debug!(base_uri = %self.base_uri, "disposing endpoint resolver");
        self.disposables.dispose();
    }
}
