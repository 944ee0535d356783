//! Deployment environment detection
//!
//! The base uri a client is configured with identifies the deployment it
//! talks to. This module classifies that uri and derives the matching
//! telemetry ingest host, so a client pointed at a staging cluster reports
//! to the staging telemetry service without extra configuration.

use std::fmt;

use url::Url;

/// Deployment environment, derived from the configured base uri.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Local,
    Staging,
    Production,
}

impl Environment {
    /// Classify a base uri.
    ///
    /// Any uri mentioning `local` is a local deployment and any uri
    /// mentioning `stg` is staging; everything else is production.
    pub fn from_base_uri(uri: &str) -> Self {
        let uri = uri.to_lowercase();

        if uri.contains("local") {
            Environment::Local
        } else if uri.contains("stg") {
            Environment::Staging
        } else {
            Environment::Production
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Environment::Local => "local",
            Environment::Staging => "staging",
            Environment::Production => "production",
        };
        write!(f, "{}", name)
    }
}

/// Derive the telemetry ingest uri for a deployment.
///
/// The telemetry service lives on a `telemetry` host next to the streaming
/// host: bare domains gain a `telemetry.` label, deeper hostnames have their
/// leftmost label rewritten to `telemetry` (or `telemetry-stg` for staging
/// hosts). Local uris and uris that fail to parse are returned unchanged;
/// an empty input yields an empty uri.
pub fn telemetry_server_uri(base_uri: &str) -> String {
    if base_uri.is_empty() {
        return String::new();
    }

    let mut url = match Url::parse(base_uri) {
        Ok(url) => url,
        Err(_) => return base_uri.to_string(),
    };
    let host = match url.host_str() {
        Some(host) => host,
        None => return base_uri.to_string(),
    };

    let mut segments: Vec<String> = host.split('.').map(str::to_string).collect();
    if segments[0].contains("local") {
        return base_uri.to_string();
    }

    let n = segments.len();
    // A bare domain ("example.com") or a bare domain under a two-part TLD
    // ("example.co.uk") keeps its name and gains a telemetry label.
    if n == 2 || (n == 3 && segments[n - 2].len() <= 2 && segments[n - 1].len() <= 3) {
        segments.insert(0, "telemetry".to_string());
    } else if segments[0].contains("-stg") || segments[0] == "stg" {
        segments[0] = "telemetry-stg".to_string();
    } else {
        segments[0] = "telemetry".to_string();
    }

    let new_host = segments.join(".");
    if url.set_host(Some(&new_host)).is_err() {
        return base_uri.to_string();
    }

    let origin = url.origin();
    if !origin.is_tuple() {
        return base_uri.to_string();
    }
    origin.ascii_serialization()
}
