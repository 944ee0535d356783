//! Endpoint candidate model.

use std::time::Duration;

/// Wire scheme of an endpoint uri.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    Ws,
    Wss,
    Http,
    Https,
}

impl Scheme {
    /// Classify a uri by its scheme prefix. Unknown schemes yield `None`.
    pub fn classify(uri: &str) -> Option<Scheme> {
        let lower = uri.to_ascii_lowercase();
        if lower.starts_with("wss://") {
            Some(Scheme::Wss)
        } else if lower.starts_with("ws://") {
            Some(Scheme::Ws)
        } else if lower.starts_with("https://") {
            Some(Scheme::Https)
        } else if lower.starts_with("http://") {
            Some(Scheme::Http)
        } else {
            None
        }
    }

    /// Telemetry `kind` tag for endpoints reached over this scheme.
    pub(crate) fn telemetry_kind(&self) -> &'static str {
        match self {
            Scheme::Https => "https",
            _ => "http",
        }
    }
}

/// One endpoint offered by discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointCandidate {
    pub uri: String,
    pub scheme: Scheme,
}

impl EndpointCandidate {
    /// Build a candidate from a uri, classifying its scheme.
    pub fn classify(uri: impl Into<String>) -> Option<Self> {
        let uri = uri.into();
        Scheme::classify(&uri).map(|scheme| Self { uri, scheme })
    }
}

/// Outcome of a successful resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionResult {
    /// The endpoint the client should connect to
    pub uri: String,
    /// Measured latency of the winning probe; zero for socket base uris
    pub round_trip_time: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_schemes_by_prefix() {
        assert_eq!(Scheme::classify("wss://edge.rtcast.io"), Some(Scheme::Wss));
        assert_eq!(Scheme::classify("ws://edge.rtcast.io"), Some(Scheme::Ws));
        assert_eq!(Scheme::classify("https://edge.rtcast.io"), Some(Scheme::Https));
        assert_eq!(Scheme::classify("http://edge.rtcast.io"), Some(Scheme::Http));
        assert_eq!(Scheme::classify("ftp://edge.rtcast.io"), None);
        assert_eq!(Scheme::classify("edge.rtcast.io"), None);
    }

    #[test]
    fn classification_ignores_case() {
        assert_eq!(Scheme::classify("WSS://edge.rtcast.io"), Some(Scheme::Wss));
        assert_eq!(Scheme::classify("HTTPS://edge.rtcast.io"), Some(Scheme::Https));
    }

    #[test]
    fn candidate_keeps_uri_and_scheme() {
        let candidate = EndpointCandidate::classify("https://edge-a.rtcast.io").unwrap();
        assert_eq!(candidate.uri, "https://edge-a.rtcast.io");
        assert_eq!(candidate.scheme, Scheme::Https);
        assert!(EndpointCandidate::classify("edge-a.rtcast.io").is_none());
    }
}
