//! Error types for the Authy client.
//!
//! # Design
//! Only local failures are errors. A failure reported by the remote service
//! (an `<errors>` body) is ordinary result data in `Hash::error`, so callers
//! can inspect it without matching on `ApiError` at all. What remains here is
//! the transport failing, the server answering with something neither schema
//! matches, a payload that would not serialize, and a bad configuration.

use thiserror::Error;

/// Errors returned by the client's build, transport and parse steps.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The HTTP round-trip itself failed (connect, TLS, timeout, IO).
    #[error("service communication failed: {0}")]
    Communication(String),

    /// The response body matched neither the error nor the success schema.
    #[error("invalid response from server: {0}")]
    InvalidResponse(String),

    /// A request payload could not be serialized to XML.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The client configuration is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<url::ParseError> for ApiError {
    fn from(err: url::ParseError) -> Self {
        ApiError::InvalidConfig(format!("malformed URL: {err}"))
    }
}
