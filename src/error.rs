//! Error types for the veritas-gateway crate.
//!
//! All errors use stable string messages suitable for display to users
//! and programmatic handling. Credential secrets never appear in error
//! messages.

/// Errors that can occur during gateway operations.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The provider rejected the credential for quota or rate-limit reasons.
    ///
    /// This is the only error class that deactivates a credential; the
    /// gateway retries the operation with the next selectable credential.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// Every configured credential is exhausted or deactivated.
    ///
    /// Terminal for the current operation: the caller gets this instead of
    /// an unbounded retry loop.
    #[error("no available credentials: provider key pool exhausted")]
    NoAvailableCredentials,

    /// A network, timeout, or response-decoding failure.
    ///
    /// Not credential-related: propagated immediately, no retry, no
    /// deactivation.
    #[error("transport error: {0}")]
    Transport(String),

    /// Invalid gateway or aggregator configuration.
    #[error("config error: {0}")]
    Config(String),
}

/// Convenience type alias for gateway results.
pub type Result<T> = std::result::Result<T, GatewayError>;
