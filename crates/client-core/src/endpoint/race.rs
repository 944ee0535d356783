//! First-success-wins probe race.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use rtcast_infra_common::disposable::{AbortOnDispose, DisposableList};

use crate::error::{ClientError, ClientResult};

use super::candidate::EndpointCandidate;
use super::{LatencyProber, ProbeError};

struct ProbeOutcome {
    candidate: EndpointCandidate,
    result: Result<Duration, ProbeError>,
}

/// Races one latency probe per candidate.
///
/// Outcomes are consumed in completion order by a single loop, so the
/// winner is committed exactly once: the first successful probe returns and
/// every probe still in flight is aborted before another outcome can be
/// observed. Failed candidates leave the race; when none remain the round
/// fails as a whole.
pub(crate) struct ProbeRace {
    candidates: Vec<EndpointCandidate>,
}

impl ProbeRace {
    pub(crate) fn new(candidates: Vec<EndpointCandidate>) -> Self {
        Self { candidates }
    }

    pub(crate) async fn run(
        self,
        prober: Arc<dyn LatencyProber>,
        disposables: &DisposableList,
    ) -> ClientResult<(EndpointCandidate, Duration)> {
        let attempted = self.candidates.len();
        let mut probes: FuturesUnordered<JoinHandle<ProbeOutcome>> = FuturesUnordered::new();
        let mut abort_handles = Vec::with_capacity(attempted);

        for candidate in self.candidates {
            let prober = prober.clone();
            let task = tokio::spawn(async move {
                let result = prober.probe(&candidate.uri).await;
                ProbeOutcome { candidate, result }
            });
            let handle = task.abort_handle();
            disposables.add(AbortOnDispose::new(handle.clone()));
            abort_handles.push(handle);
            probes.push(task);
        }

        while let Some(joined) = probes.next().await {
            match joined {
                Ok(ProbeOutcome { candidate, result: Ok(rtt) }) => {
                    for handle in &abort_handles {
                        handle.abort();
                    }
                    debug!(
                        endpoint = %candidate.uri,
                        rtt_ms = rtt.as_millis() as u64,
                        "probe won the race"
                    );
                    return Ok((candidate, rtt));
                }
                Ok(ProbeOutcome { candidate, result: Err(e) }) if e.is_temporarily_disabled() => {
                    debug!(endpoint = %candidate.uri, "endpoint is temporarily disabled");
                }
                Ok(ProbeOutcome { candidate, result: Err(e) }) => {
                    warn!(
                        endpoint = %candidate.uri,
                        status = ?e.status,
                        error = %e,
                        "endpoint probe failed"
                    );
                }
                // Probes are only aborted externally when the owner is
                // disposed mid-race.
                Err(e) if e.is_cancelled() => return Err(ClientError::Disposed),
                Err(e) => warn!(error = %e, "probe task failed"),
            }
        }

        Err(ClientError::NoReachableEndpoint { attempted })
    }
}
