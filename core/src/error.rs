//! Error types for the Lnswap Client SDK.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the Lnswap Client SDK.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed or out-of-range amount, caught before any network call.
    #[error("Invalid input: {0}")]
    InputValidation(String),

    /// The swap service rejected a request and told us why.
    #[error("Swap service error: {0}")]
    Service(String),

    /// HTTP or event channel failure (open, send, receive, unexpected close).
    #[error("Transport error: {0}")]
    Transport(String),

    /// Preimage mismatch, malformed or tampered script tree, malformed nonce.
    ///
    /// Always fatal for the claim attempt; no signature material is produced.
    #[error("Crypto validation failed: {0}")]
    CryptoValidation(String),

    /// Event with an unrecognized or out-of-sequence status.
    ///
    /// Logged and ignored; never changes session state.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Parse error.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{0}")]
    Other(String),
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Other(format!("{:#}", err))
    }
}
