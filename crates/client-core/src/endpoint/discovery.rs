//! Candidate list discovery.
//!
//! The discovery service returns the endpoint list as a comma-separated
//! body. Every request carries a cache-busting query so intermediaries
//! cannot serve a stale list: the SDK version and the current time in epoch
//! milliseconds.

use chrono::Utc;
use tracing::{debug, warn};

use crate::error::{ClientError, ClientResult};
use crate::http::{get_with_retry, FetchOptions, HttpFetcher};

use super::candidate::EndpointCandidate;

pub(crate) async fn fetch_candidates(
    fetcher: &dyn HttpFetcher,
    base_uri: &str,
    options: &FetchOptions,
) -> ClientResult<Vec<EndpointCandidate>> {
    let query = cache_bust_query();
    let body = get_with_retry(fetcher, base_uri, &query, options)
        .await
        .map_err(|e| ClientError::DiscoveryFailed { reason: e.to_string() })?;

    let candidates = parse_candidate_list(&body);
    if candidates.is_empty() {
        return Err(ClientError::DiscoveryFailed {
            reason: format!("no usable endpoints in response from {}", base_uri),
        });
    }

    debug!(base_uri = %base_uri, count = candidates.len(), "discovered endpoint candidates");
    Ok(candidates)
}

fn cache_bust_query() -> Vec<(String, String)> {
    vec![
        ("version".to_string(), crate::VERSION.to_string()),
        ("_".to_string(), Utc::now().timestamp_millis().to_string()),
    ]
}

fn parse_candidate_list(body: &str) -> Vec<EndpointCandidate> {
    body.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| match EndpointCandidate::classify(entry) {
            Some(candidate) => Some(candidate),
            None => {
                warn!(endpoint = %entry, "discarding endpoint with unrecognized scheme");
                None
            }
        })
        .collect()
}
