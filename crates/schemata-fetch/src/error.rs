//! Retrieval error types.

/// Errors from fetching a document.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// HTTP transport error.
    #[error("HTTP error fetching {uri}: {source}")]
    Http {
        uri: String,
        source: reqwest::Error,
    },
    /// The server answered with a non-2xx status, after any retries.
    #[error("{uri} returned {status}")]
    Status { uri: String, status: u16 },
    /// Reading a local file failed.
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}
