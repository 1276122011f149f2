//! Error types for the splitting-service API client.
//!
//! Defines [`ApiError`] with variants for service-side rejections, malformed
//! responses, network failures and local I/O. Uses `thiserror` to derive
//! `Display` and `Error` from the `#[error(...)]` attributes.

use thiserror::Error;

/// Errors that can occur while talking to the splitting service.
///
/// The variants map onto the four failure classes the client distinguishes:
/// - [`Service`](ApiError::Service) — the service rejected a request
/// - [`Protocol`](ApiError::Protocol) — the response had an unexpected shape
///   (missing field, unknown task state); never coerced into a job result
/// - [`Network`](ApiError::Network) — transport-level failure (DNS, refused
///   connection, timeout), wrapped from `reqwest` via `#[from]`
/// - [`Io`](ApiError::Io) — local filesystem failure (unreadable input,
///   write error on download)
#[derive(Debug, Error)]
pub enum ApiError {
    /// The service rejected a request, either with a non-success HTTP status
    /// or with an error payload in a 200 response body.
    #[error("service error (status {status}): {message}")]
    Service { status: u16, message: String },

    /// The response did not match the documented shape. Unknown task state
    /// strings land here so they are surfaced distinctly from a job that the
    /// service reports as failed.
    #[error("unexpected response from the service: {0}")]
    Protocol(String),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
