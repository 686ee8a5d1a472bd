//! Pagination drain.
//!
//! Walks a paginated collection from page 1 until the server reports no more
//! pages, concatenating items in page order. Pages are requested strictly one
//! after another: the next request is only sent once the previous page has
//! arrived. Any failed page fails the whole drain and the partial
//! accumulation is dropped.
//!
//! There is no snapshot isolation. If the collection changes mid-drain the
//! number of items collected can differ from the `total_count` on page 1.

use std::future::Future;

use viewsync_core::{DrainError, FetchError, PageRequest, PageResult};

use crate::fetcher::PageFetcher;

// =============================================================================
// Drain State
// =============================================================================

/// Status of a drain in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainStatus {
    Draining,
    Complete,
    Failed,
}

/// Accumulator owned by one drain invocation.
#[derive(Debug)]
pub struct DrainState<T> {
    accumulated: Vec<T>,
    next_page: u32,
    status: DrainStatus,
}

impl<T> DrainState<T> {
    /// Fresh state, positioned on page 1.
    pub fn new() -> Self {
        Self {
            accumulated: Vec::new(),
            next_page: 1,
            status: DrainStatus::Draining,
        }
    }

    /// Append a page and advance. Returns `true` if another page follows.
    ///
    /// The caller must have rejected `page_size == 0` already.
    fn absorb(&mut self, page: PageResult<T>) -> bool {
        let has_more = page.has_more();
        self.accumulated.extend(page.items);
        if has_more {
            self.next_page += 1;
        } else {
            self.status = DrainStatus::Complete;
        }
        has_more
    }

    /// Mark the drain failed and drop everything collected so far.
    fn fail(&mut self) {
        self.status = DrainStatus::Failed;
        self.accumulated.clear();
    }

    pub fn status(&self) -> DrainStatus {
        self.status
    }

    pub fn next_page(&self) -> u32 {
        self.next_page
    }

    /// Items collected so far.
    pub fn len(&self) -> usize {
        self.accumulated.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accumulated.is_empty()
    }

    fn into_items(self) -> Vec<T> {
        self.accumulated
    }
}

impl<T> Default for DrainState<T> {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Drain
// =============================================================================

/// Drain a collection through `fetch_page(page_number)`, starting at page 1.
///
/// Continues while `total_count / page_size > page_number` (float division,
/// strict comparison) on the page just received.
pub async fn drain<T, F, Fut>(mut fetch_page: F) -> Result<Vec<T>, DrainError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<PageResult<T>, FetchError>>,
{
    let mut state = DrainState::new();

    loop {
        let page = state.next_page;
        let result = match fetch_page(page).await {
            Ok(result) => result,
            Err(source) => {
                tracing::warn!(
                    "Drain failed on page {} after {} items: {}",
                    page,
                    state.len(),
                    source
                );
                state.fail();
                return Err(DrainError::Page { page, source });
            }
        };

        if result.page_size == 0 {
            tracing::warn!("Drain aborted: page {} reported page_size = 0", page);
            state.fail();
            return Err(DrainError::InvalidPageSize { page });
        }

        tracing::debug!(
            "Drained page {} ({} items, server page {}/{} total {})",
            page,
            result.len(),
            result.page_number,
            result.total_pages(),
            result.total_count
        );

        if !state.absorb(result) {
            break;
        }
    }

    tracing::debug!(
        "Drain complete: {} items over {} pages",
        state.len(),
        state.next_page
    );
    Ok(state.into_items())
}

/// Drains one collection through a [`PageFetcher`].
///
/// The base request carries page size, filters and scoping params; only its
/// `page` is overwritten on each step.
#[derive(Debug, Clone)]
pub struct PageDrainer {
    base: PageRequest,
}

impl PageDrainer {
    /// Drain the collection described by `base`.
    pub fn new(base: PageRequest) -> Self {
        Self { base }
    }

    /// Run the drain. Every call starts again from page 1.
    pub async fn drain<T, P>(&self, fetcher: &P) -> Result<Vec<T>, DrainError>
    where
        T: Send,
        P: PageFetcher<T> + ?Sized,
    {
        drain(|page| {
            let request = self.base.with_page(page);
            async move { fetcher.fetch_page(&request).await }
        })
        .await
    }
}
