//! Error types for the viewsync engine.
//!
//! Malformed URL values never become errors; the codec falls back to
//! defaults. Stale responses are not errors either; they are reported as an
//! outcome and dropped.

use thiserror::Error;

/// A single page request failed.
///
/// Surfaced to the calling view as a retryable error state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Transport-level failure (connection refused, timeout, ...).
    #[error("Network error: {0}")]
    Network(String),

    /// The server answered with a non-success status.
    #[error("Server returned {status}: {message}")]
    Status { status: u16, message: String },

    /// Session expired. The transport has already handled logout.
    #[error("Unauthorized")]
    Unauthorized,

    /// Response body did not match the expected page shape.
    #[error("Decode error: {0}")]
    Decode(String),

    /// The server reported a page size of zero.
    #[error("Server reported page_size = 0")]
    InvalidPageSize,
}

/// Draining a paginated collection failed.
///
/// Terminal: no partial accumulation survives a drain error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DrainError {
    /// Fetching a page failed.
    #[error("Failed to fetch page {page}: {source}")]
    Page {
        page: u32,
        #[source]
        source: FetchError,
    },

    /// A page reported `page_size = 0`, which makes the page count undefined.
    #[error("Page {page} reported page_size = 0")]
    InvalidPageSize { page: u32 },
}

impl DrainError {
    /// The page number the drain stopped on.
    pub fn page(&self) -> u32 {
        match self {
            DrainError::Page { page, .. } | DrainError::InvalidPageSize { page } => *page,
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No config directory found.
    #[error("Config directory not found")]
    NoConfigDir,

    /// IO error.
    #[error("IO error: {0}")]
    Io(String),

    /// Parse error.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Bundle export errors.
#[derive(Debug, Error)]
pub enum BundleError {
    /// The bundle could not be serialized.
    #[error("Serialize error: {0}")]
    Serialize(String),

    /// Writing the bundle file failed.
    #[error("IO error: {0}")]
    Io(String),
}
