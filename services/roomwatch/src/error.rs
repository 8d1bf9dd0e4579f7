//! Error types for the roomwatch service

/// Errors that can occur in the roomwatch service
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Notifier error: {0}")]
    Notifier(String),
}

/// Result type alias for roomwatch operations
pub type Result<T> = std::result::Result<T, WatchError>;

/// Outcome of a single status fetch that did not produce a usable record.
///
/// The caller decides what to do with each variant; the fetcher itself
/// never retries.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Network, timeout, non-2xx or undecodable response
    #[error("transport error: {0}")]
    Transport(String),

    /// The status body carried the domain "not found/closed" error code
    #[error("room not found or closed")]
    NotFound,
}
