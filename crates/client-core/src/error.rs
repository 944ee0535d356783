//! Error types and handling for the client resilience layer
//!
//! Errors are grouped by the operation that raises them:
//!
//! - **Discovery errors** - the endpoint candidate list could not be fetched
//!   or every candidate was unreachable
//! - **Session errors** - a stream session could not be (re)established
//! - **Selection errors** - every stream candidate in a join attempt failed
//! - **Configuration errors** - invalid settings, not recoverable without a fix
//! - **Network errors** - transient transport failures, retried with backoff
//! - **Lifecycle errors** - the owning component was disposed mid-operation
//!
//! Per-candidate failures inside a round are absorbed and logged; only the
//! round-level outcome is returned as an error. Each top-level operation
//! yields exactly one terminal `Ok` or `Err`.
//!
//! ```rust,no_run
//! # use rtcast_client_core::error::ClientError;
//! # fn handle(result: Result<String, ClientError>) {
//! match result {
//!     Ok(uri) => println!("resolved {}", uri),
//!     Err(ClientError::NoReachableEndpoint { attempted }) => {
//!         eprintln!("all {} candidates failed", attempted);
//!     }
//!     Err(e) if e.is_recoverable() => {
//!         // transient, safe to retry later
//!     }
//!     Err(e) => eprintln!("giving up: {}", e),
//! }
//! # }
//! ```

use thiserror::Error;

/// Result type alias for client-core operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Error types for endpoint resolution, session monitoring and stream selection
#[derive(Error, Debug, Clone)]
pub enum ClientError {
    /// Endpoint discovery errors
    #[error("Endpoint discovery failed: {reason}")]
    DiscoveryFailed { reason: String },

    #[error("No reachable endpoint among {attempted} candidates")]
    NoReachableEndpoint { attempted: usize },

    #[error("Unsupported endpoint scheme: {uri}")]
    UnsupportedScheme { uri: String },

    /// Session errors
    #[error("Session establishment failed: {reason}")]
    SessionEstablishmentFailed { reason: String },

    /// Stream selection errors
    #[error("All {attempted} stream candidates exhausted")]
    CandidatesExhausted { attempted: usize },

    /// Configuration errors
    #[error("Invalid configuration: {field} - {reason}")]
    InvalidConfiguration { field: String, reason: String },

    /// Network and transport errors
    #[error("Network error: {reason}")]
    NetworkError { reason: String },

    /// Lifecycle errors
    #[error("Component has been disposed")]
    Disposed,

    /// Generic errors
    #[error("Internal error: {message}")]
    InternalError { message: String },
}

impl ClientError {
    /// Create a discovery failed error
    pub fn discovery_failed(reason: impl Into<String>) -> Self {
        Self::DiscoveryFailed { reason: reason.into() }
    }

    /// Create a session establishment failed error
    pub fn session_establishment_failed(reason: impl Into<String>) -> Self {
        Self::SessionEstablishmentFailed { reason: reason.into() }
    }

    /// Create a network error
    pub fn network_error(reason: impl Into<String>) -> Self {
        Self::NetworkError { reason: reason.into() }
    }

    /// Create an invalid configuration error
    pub fn invalid_configuration(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration { field: field.into(), reason: reason.into() }
    }

    /// Create an internal error
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::InternalError { message: message.into() }
    }

    /// Check if this error is recoverable
    ///
    /// Recoverable errors are transient transport failures; retry loops key
    /// on this to decide whether another attempt is worthwhile. Round-level
    /// outcomes (discovery failed, candidates exhausted) are final for the
    /// operation that produced them.
    pub fn is_recoverable(&self) -> bool {
        match self {
            ClientError::NetworkError { .. } => true,

            ClientError::DiscoveryFailed { .. } |
            ClientError::NoReachableEndpoint { .. } |
            ClientError::UnsupportedScheme { .. } |
            ClientError::SessionEstablishmentFailed { .. } |
            ClientError::CandidatesExhausted { .. } |
            ClientError::InvalidConfiguration { .. } |
            ClientError::Disposed |
            ClientError::InternalError { .. } => false,
        }
    }

    /// Get error category for metrics/logging
    pub fn category(&self) -> &'static str {
        match self {
            ClientError::DiscoveryFailed { .. } |
            ClientError::NoReachableEndpoint { .. } |
            ClientError::UnsupportedScheme { .. } => "discovery",

            ClientError::SessionEstablishmentFailed { .. } => "session",

            ClientError::CandidatesExhausted { .. } => "selection",

            ClientError::InvalidConfiguration { .. } => "configuration",

            ClientError::NetworkError { .. } => "network",

            ClientError::Disposed => "lifecycle",

            ClientError::InternalError { .. } => "system",
        }
    }
}
