//! The page-fetching seam.
//!
//! Everything that talks to the backend sits behind [`PageFetcher`]. The
//! engine never sees HTTP, auth tokens, or either of the server's response
//! conventions; it only sees [`PageResult`].

use std::sync::Arc;

use async_trait::async_trait;
use viewsync_core::{FetchError, PageRequest, PageResult};

/// Fetch one page of a collection.
///
/// Implementations own transport concerns, including session-expiry
/// handling, and report failures as [`FetchError`].
#[async_trait]
pub trait PageFetcher<T: Send>: Send + Sync {
    async fn fetch_page(&self, request: &PageRequest) -> Result<PageResult<T>, FetchError>;
}

#[async_trait]
impl<T, P> PageFetcher<T> for Arc<P>
where
    T: Send,
    P: PageFetcher<T> + ?Sized,
{
    async fn fetch_page(&self, request: &PageRequest) -> Result<PageResult<T>, FetchError> {
        (**self).fetch_page(request).await
    }
}

// =============================================================================
// Fake Fetcher for Testing
// =============================================================================
