use thiserror::Error;

/// Errors from [`crate::source::BookSource::fetch_page`].
///
/// Every variant is recoverable at the run level: the ingestion loop stops
/// and reports the partial progress made so far.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The HTTP client could not be prepared for the request.
    #[error("failed to prepare request for {url}: {message}")]
    Transport {
        /// Target URL.
        url: String,
        /// Error detail.
        message: String,
    },
    /// The request did not complete within the configured timeout.
    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout {
        /// Target URL.
        url: String,
        /// Configured timeout in seconds.
        timeout_secs: u64,
    },
    /// The service answered with a non-success status.
    #[error("request to {url} failed with HTTP {status}: {message}")]
    Http {
        /// Target URL.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Error detail.
        message: String,
    },
    /// The connection failed before a response arrived.
    #[error("network error contacting {url}: {message}")]
    Network {
        /// Target URL.
        url: String,
        /// Error detail.
        message: String,
    },
    /// The response body was not the expected JSON document.
    #[error("failed to parse response from {url}: {message}")]
    Parse {
        /// Target URL.
        url: String,
        /// Error detail.
        message: String,
    },
}
