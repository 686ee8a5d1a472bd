//! List controller.
//!
//! Ties a [`ViewStateStore`], a [`UrlStateBinder`] and a [`PageFetcher`]
//! together for one list view:
//!
//! ```text
//! update(patch) ──▶ store.update ──▶ [ReplaceUrl, Fetch(gen)]
//!                                        │            │
//!                                  binder writes   fetcher.fetch_page
//!                                     the URL          │
//!                                                      ▼
//!                                           gen still latest?
//!                                            yes: publish snapshot
//!                                            no:  drop (Stale)
//! ```
//!
//! State transitions run synchronously inside the call; only the returned
//! future suspends. Calling `update` twice in a row therefore stamps the two
//! fetches in call order, no matter when their futures are polled.
//!
//! ## Reactive State
//!
//! The rendered page is published as a [`ListSnapshot`] through
//! `tokio::sync::watch`. A failed fetch keeps the previous items and records
//! the error.

use std::sync::Arc;

use futures::future::BoxFuture;
use parking_lot::Mutex;
use tokio::sync::watch;
use uuid::Uuid;
use viewsync_core::{
    FetchError, PageIndexConvention, PageRequest, PageResult, ViewDefaults, ViewPatch, ViewState,
};

use crate::binder::{UrlHost, UrlStateBinder};
use crate::context::{Alert, AppContext};
use crate::effect::{Effect, FetchTicket};
use crate::fetcher::PageFetcher;
use crate::store::ViewStateStore;

// =============================================================================
// Snapshot and Outcome
// =============================================================================

/// What the view currently renders.
#[derive(Debug, Clone, PartialEq)]
pub struct ListSnapshot<T> {
    pub items: Vec<T>,
    pub total_count: u64,
    pub page_size: u32,
    pub total_pages: u64,

    /// A fetch for the latest generation is in flight.
    pub loading: bool,

    /// Error from the latest generation's fetch, if it failed.
    pub error: Option<String>,

    /// Generation the items belong to (0 before the first load).
    pub generation: u64,
}

impl<T> Default for ListSnapshot<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total_count: 0,
            page_size: 0,
            total_pages: 0,
            loading: false,
            error: None,
            generation: 0,
        }
    }
}

/// How a fetch issued by the controller ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The response was current and is now rendered.
    Applied { generation: u64 },
    /// A newer transition (or unmount) superseded it; it was dropped.
    Stale { generation: u64 },
    /// No fetch was issued: not hydrated yet, already mounted, or unmounted.
    Skipped,
}

type FetchFuture = BoxFuture<'static, Result<FetchOutcome, FetchError>>;

// =============================================================================
// List Controller
// =============================================================================

/// One list view's state, URL binding, and fetch pipeline.
pub struct ListController<T, F, H> {
    inner: Arc<Inner<T, F, H>>,
}

struct Inner<T, F, H> {
    id: Uuid,
    store: Mutex<ViewStateStore>,
    binder: UrlStateBinder<H>,
    fetcher: F,
    context: Arc<AppContext>,
    page_size: u32,
    convention: PageIndexConvention,
    snapshot_tx: watch::Sender<ListSnapshot<T>>,
}

impl<T, F, H> Clone for ListController<T, F, H> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T, F, H> ListController<T, F, H>
where
    T: Send + Sync + 'static,
    F: PageFetcher<T> + 'static,
    H: UrlHost + 'static,
{
    /// Create a controller. Page size and page numbering come from the
    /// context's configuration.
    pub fn new(context: Arc<AppContext>, defaults: ViewDefaults, host: H, fetcher: F) -> Self {
        let (snapshot_tx, _) = watch::channel(ListSnapshot::default());
        let page_size = context.config().page_size;
        let convention = context.config().page_index;
        Self {
            inner: Arc::new(Inner {
                id: Uuid::new_v4(),
                store: Mutex::new(ViewStateStore::new(defaults)),
                binder: UrlStateBinder::new(host),
                fetcher,
                context,
                page_size,
                convention,
                snapshot_tx,
            }),
        }
    }

    /// Override the configured page size.
    ///
    /// Only valid before the controller is shared.
    pub fn with_page_size(self, page_size: u32) -> Self {
        match Arc::try_unwrap(self.inner) {
            Ok(mut inner) => {
                inner.page_size = page_size;
                Self {
                    inner: Arc::new(inner),
                }
            }
            Err(inner) => {
                tracing::warn!("Cannot change page size of a shared controller");
                Self { inner }
            }
        }
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Hydrate from the URL, then load the first page.
    ///
    /// Hydration writes nothing back to the URL. The initial load is a
    /// separate post-hydration transition.
    pub fn mount(&self) -> FetchFuture {
        let effects = {
            let mut store = self.inner.store.lock();
            if !self.inner.binder.mount(&mut store) {
                Vec::new()
            } else {
                tracing::info!(view = %self.inner.id, "Mounted list view");
                store.refresh()
            }
        };
        self.run(effects)
    }

    /// Apply a partial update. Writes the URL and fetches exactly once.
    pub fn update(&self, patch: ViewPatch) -> FetchFuture {
        let effects = self.inner.store.lock().update(patch);
        self.run(effects)
    }

    /// Re-fetch the current state.
    pub fn refresh(&self) -> FetchFuture {
        let effects = self.inner.store.lock().refresh();
        self.run(effects)
    }

    /// Adopt the host URL after back/forward navigation.
    pub fn navigate(&self) -> FetchFuture {
        let query = self.inner.binder.host().current_query();
        let effects = self.inner.store.lock().navigate(&query);
        self.run(effects)
    }

    /// Tear the view down. Responses still in flight will be dropped.
    pub fn unmount(&self) {
        self.inner.store.lock().unmount();
        tracing::info!(view = %self.inner.id, "Unmounted list view");
    }

    // =========================================================================
    // Read Methods
    // =========================================================================

    /// Subscribe to rendered-page changes.
    pub fn subscribe(&self) -> watch::Receiver<ListSnapshot<T>> {
        self.inner.snapshot_tx.subscribe()
    }

    /// Subscribe to the hydration signal.
    pub fn ready(&self) -> watch::Receiver<bool> {
        self.inner.store.lock().ready()
    }

    /// Current view state, once hydrated.
    pub fn state(&self) -> Option<ViewState> {
        self.inner.store.lock().state().cloned()
    }

    pub fn host(&self) -> &H {
        self.inner.binder.host()
    }

    pub fn fetcher(&self) -> &F {
        &self.inner.fetcher
    }

    // =========================================================================
    // Effect Execution
    // =========================================================================

    fn run(&self, effects: Vec<Effect>) -> FetchFuture {
        let tickets = self.inner.binder.apply(effects);
        let Some(ticket) = tickets.into_iter().next() else {
            return Box::pin(async { Ok(FetchOutcome::Skipped) });
        };

        self.inner.snapshot_tx.send_modify(|snapshot| snapshot.loading = true);

        let inner = self.inner.clone();
        Box::pin(async move { inner.fetch(ticket).await })
    }
}

impl<T, F, H> ListController<T, F, H>
where
    T: Clone + Send + Sync + 'static,
    F: PageFetcher<T> + 'static,
    H: UrlHost + 'static,
{
    /// Copy of what the view currently renders.
    pub fn snapshot(&self) -> ListSnapshot<T> {
        self.inner.snapshot_tx.borrow().clone()
    }
}

impl<T, F, H> Inner<T, F, H>
where
    T: Send + Sync + 'static,
    F: PageFetcher<T>,
    H: UrlHost,
{
    async fn fetch(&self, ticket: FetchTicket) -> Result<FetchOutcome, FetchError> {
        let generation = ticket.generation;
        let request = PageRequest::from_view(&ticket.state, self.page_size, self.convention);
        tracing::debug!(
            view = %self.id,
            generation,
            page = request.page,
            "Fetching page"
        );

        let result = self.fetcher.fetch_page(&request).await;

        // Hold the store lock while publishing so no newer transition can
        // slip in between the check and the write.
        let store = self.store.lock();
        if !store.is_current(generation) {
            tracing::debug!(
                view = %self.id,
                generation,
                latest = store.generation(),
                "Discarding stale response"
            );
            return Ok(FetchOutcome::Stale { generation });
        }

        match result {
            Ok(page) => {
                self.publish(generation, page);
                Ok(FetchOutcome::Applied { generation })
            }
            Err(error) => {
                tracing::warn!(view = %self.id, generation, "Fetch failed: {}", error);
                self.snapshot_tx.send_modify(|snapshot| {
                    snapshot.loading = false;
                    snapshot.error = Some(error.to_string());
                });
                self.context.alerts().push(Alert::error(error.to_string()));
                Err(error)
            }
        }
    }

    fn publish(&self, generation: u64, page: PageResult<T>) {
        let total_pages = page.total_pages();
        tracing::debug!(
            view = %self.id,
            generation,
            items = page.len(),
            total = page.total_count,
            "Applying page"
        );
        self.snapshot_tx.send_modify(|snapshot| {
            snapshot.total_count = page.total_count;
            snapshot.page_size = page.page_size;
            snapshot.total_pages = total_pages;
            snapshot.items = page.items;
            snapshot.loading = false;
            snapshot.error = None;
            snapshot.generation = generation;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binder::MemoryUrl;
    use crate::fetcher::fake::FakeFetcher;
    use std::time::Duration;
    use viewsync_core::{EngineConfig, SortOrder};

    type Controller = ListController<String, FakeFetcher<String>, MemoryUrl>;

    /// Each item is "<filter>:<page>", so tests can see which request a
    /// rendered page came from.
    fn echo_fetcher() -> FakeFetcher<String> {
        FakeFetcher::new(|request| {
            Ok(PageResult::new(
                vec![format!("{}:{}", request.filter, request.page)],
                request.page,
                request.page_size,
                42,
            ))
        })
    }

    fn controller(query: &str, fetcher: FakeFetcher<String>) -> Controller {
        let ctx = AppContext::init(EngineConfig::default());
        ListController::new(ctx, ViewDefaults::default(), MemoryUrl::new(query), fetcher)
    }

    #[tokio::test]
    async fn test_mount_hydrates_then_loads_once() {
        let ctrl = controller("?filter=bookmarked&page=2", echo_fetcher());
        assert_eq!(ctrl.fetcher().calls(), 0);

        let outcome = ctrl.mount().await.unwrap();
        assert_eq!(outcome, FetchOutcome::Applied { generation: 1 });

        // Bookmarked URL survives: hydration never writes it.
        assert!(ctrl.host().replacements().is_empty());
        assert_eq!(ctrl.host().current_query(), "?filter=bookmarked&page=2");

        let requests = ctrl.fetcher().requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].filter, "bookmarked");
        assert_eq!(requests[0].page, 3);

        let snapshot = ctrl.snapshot();
        assert_eq!(snapshot.items, vec!["bookmarked:3".to_string()]);
        assert_eq!(snapshot.total_count, 42);
        assert_eq!(snapshot.total_pages, 5);
        assert!(!snapshot.loading);
    }

    #[tokio::test]
    async fn test_no_fetch_before_hydration() {
        let ctrl = controller("", echo_fetcher());

        let outcome = ctrl.update(ViewPatch::new().filter("early")).await.unwrap();
        assert_eq!(outcome, FetchOutcome::Skipped);
        assert_eq!(ctrl.refresh().await.unwrap(), FetchOutcome::Skipped);

        assert_eq!(ctrl.fetcher().calls(), 0);
        assert!(ctrl.host().replacements().is_empty());
        assert!(!*ctrl.ready().borrow());
    }

    #[tokio::test]
    async fn test_mount_twice_loads_once() {
        let ctrl = controller("", echo_fetcher());
        ctrl.mount().await.unwrap();
        assert_eq!(ctrl.mount().await.unwrap(), FetchOutcome::Skipped);
        assert_eq!(ctrl.fetcher().calls(), 1);
    }

    #[tokio::test]
    async fn test_one_fetch_and_url_write_per_update() {
        let ctrl = controller("", echo_fetcher());
        ctrl.mount().await.unwrap();

        let patches = vec![
            ViewPatch::new().filter("a"),
            ViewPatch::new().filter("ab"),
            ViewPatch::new().page(1),
            ViewPatch::new().sort("title", SortOrder::Asc),
        ];
        let n = patches.len();
        for patch in patches {
            ctrl.update(patch).await.unwrap();
        }

        // One from mount plus one per update.
        assert_eq!(ctrl.fetcher().calls(), n + 1);
        assert_eq!(ctrl.host().replacements().len(), n);
        assert_eq!(
            ctrl.host().current_query(),
            "filter=ab&sortField=title&sortOrder=asc&page=0"
        );
    }

    #[tokio::test]
    async fn test_page_reset_reaches_request() {
        let ctrl = controller("page=4", echo_fetcher());
        ctrl.mount().await.unwrap();

        ctrl.update(ViewPatch::new().filter("x")).await.unwrap();

        let last = ctrl.fetcher().requests().pop().unwrap();
        assert_eq!(last.page, 1);
        assert_eq!(ctrl.state().unwrap().page, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_response_is_discarded() {
        let fetcher = echo_fetcher().with_delay(|request| {
            if request.filter == "slow" {
                Duration::from_millis(500)
            } else {
                Duration::from_millis(10)
            }
        });
        let ctrl = controller("", fetcher);
        ctrl.mount().await.unwrap();

        let a = ctrl.update(ViewPatch::new().filter("slow"));
        let b = ctrl.update(ViewPatch::new().filter("fast"));
        let (a, b) = tokio::join!(a, b);

        assert_eq!(a.unwrap(), FetchOutcome::Stale { generation: 2 });
        assert_eq!(b.unwrap(), FetchOutcome::Applied { generation: 3 });

        let snapshot = ctrl.snapshot();
        assert_eq!(snapshot.items, vec!["fast:1".to_string()]);
        assert_eq!(snapshot.generation, 3);
        assert_eq!(ctrl.fetcher().calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_failure_is_silent() {
        let fetcher = FakeFetcher::new(|request: &PageRequest| {
            if request.filter == "bad" {
                Err(FetchError::Network("timed out".to_string()))
            } else {
                Ok(PageResult::new(vec![request.filter.clone()], request.page, 10, 1))
            }
        })
        .with_delay(|request| {
            if request.filter == "bad" {
                Duration::from_millis(500)
            } else {
                Duration::from_millis(10)
            }
        });
        let ctx = AppContext::init(EngineConfig::default());
        let ctrl = ListController::new(ctx.clone(), ViewDefaults::default(), MemoryUrl::default(), fetcher);
        ctrl.mount().await.unwrap();

        let a = ctrl.update(ViewPatch::new().filter("bad"));
        let b = ctrl.update(ViewPatch::new().filter("good"));
        let (a, b) = tokio::join!(a, b);

        assert_eq!(a.unwrap(), FetchOutcome::Stale { generation: 2 });
        assert_eq!(b.unwrap(), FetchOutcome::Applied { generation: 3 });

        let snapshot = ctrl.snapshot();
        assert_eq!(snapshot.items, vec!["good".to_string()]);
        assert_eq!(snapshot.error, None);
        assert!(!snapshot.loading);
        assert!(ctx.alerts().is_empty());
    }

    #[tokio::test]
    async fn test_failure_keeps_previous_items() {
        let fetcher = FakeFetcher::new(|request: &PageRequest| {
            if request.filter == "broken" {
                Err(FetchError::Status {
                    status: 500,
                    message: "boom".to_string(),
                })
            } else {
                Ok(PageResult::new(vec!["ok".to_string()], request.page, 10, 1))
            }
        });
        let ctx = AppContext::init(EngineConfig::default());
        let ctrl = ListController::new(ctx.clone(), ViewDefaults::default(), MemoryUrl::default(), fetcher);
        ctrl.mount().await.unwrap();

        let err = ctrl.update(ViewPatch::new().filter("broken")).await.unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 500, .. }));

        let snapshot = ctrl.snapshot();
        assert_eq!(snapshot.items, vec!["ok".to_string()]);
        assert_eq!(snapshot.generation, 1);
        assert!(!snapshot.loading);
        assert_eq!(snapshot.error.as_deref(), Some("Server returned 500: boom"));

        // View state still moved on; a retry is one more transition.
        assert_eq!(ctrl.state().unwrap().filter, "broken");
        assert_eq!(ctx.alerts().drain().len(), 1);
    }

    #[tokio::test]
    async fn test_retry_after_failure_clears_error() {
        let attempts = Arc::new(Mutex::new(0u32));
        let counter = attempts.clone();
        let fetcher = FakeFetcher::new(move |request: &PageRequest| {
            let mut n = counter.lock();
            *n += 1;
            if *n == 2 {
                return Err(FetchError::Network("offline".to_string()));
            }
            Ok(PageResult::new(vec![format!("try{}", *n)], request.page, 10, 1))
        });
        let ctrl = controller("", fetcher);
        ctrl.mount().await.unwrap();

        assert!(ctrl.refresh().await.is_err());
        assert!(ctrl.snapshot().error.is_some());

        ctrl.refresh().await.unwrap();
        let snapshot = ctrl.snapshot();
        assert_eq!(snapshot.error, None);
        assert_eq!(snapshot.items, vec!["try3".to_string()]);
        assert_eq!(*attempts.lock(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unmount_discards_in_flight() {
        let fetcher = echo_fetcher().with_delay(|_| Duration::from_millis(100));
        let ctrl = controller("", fetcher);
        let load = ctrl.mount();
        ctrl.unmount();

        assert_eq!(load.await.unwrap(), FetchOutcome::Stale { generation: 1 });
        assert!(ctrl.snapshot().items.is_empty());
        assert_eq!(ctrl.update(ViewPatch::new().page(1)).await.unwrap(), FetchOutcome::Skipped);
    }

    #[tokio::test]
    async fn test_navigate_adopts_url_without_writing() {
        let ctrl = controller("filter=one", echo_fetcher());
        ctrl.mount().await.unwrap();

        ctrl.host().set_query("filter=two&page=1");
        ctrl.navigate().await.unwrap();

        assert_eq!(ctrl.state().unwrap().filter, "two");
        assert_eq!(ctrl.snapshot().items, vec!["two:2".to_string()]);
        assert!(ctrl.host().replacements().is_empty());
    }

    #[tokio::test]
    async fn test_subscribe_sees_loading_then_result() {
        let ctrl = controller("", echo_fetcher());
        let rx = ctrl.subscribe();

        let load = ctrl.mount();
        assert!(rx.borrow().loading);

        load.await.unwrap();
        assert!(!rx.borrow().loading);
        assert_eq!(rx.borrow().items.len(), 1);
    }

    #[tokio::test]
    async fn test_with_page_size() {
        let ctrl = controller("", echo_fetcher()).with_page_size(50);
        ctrl.mount().await.unwrap();
        assert_eq!(ctrl.fetcher().requests()[0].page_size, 50);
    }
}
