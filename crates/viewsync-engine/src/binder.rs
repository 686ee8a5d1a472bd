//! URL ⇄ view-state binding.
//!
//! On mount the binder reads the host URL once and hydrates the store. After
//! that the URL only ever follows state: `ReplaceUrl` effects are written with
//! replace semantics, so browsing history does not grow with every keystroke.

use parking_lot::Mutex;

use crate::effect::{Effect, FetchTicket};
use crate::store::ViewStateStore;

// =============================================================================
// URL Host
// =============================================================================

/// The host environment's URL, reduced to its query string.
#[cfg_attr(test, mockall::automock)]
pub trait UrlHost: Send + Sync {
    /// Current query string, with or without a leading `?`.
    fn current_query(&self) -> String;

    /// Replace the query string without adding a history entry.
    fn replace_query(&self, query: &str);
}

/// In-memory URL for headless hosts and tests.
#[derive(Debug, Default)]
pub struct MemoryUrl {
    query: Mutex<String>,
    replacements: Mutex<Vec<String>>,
}

impl MemoryUrl {
    /// Start at `query`.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: Mutex::new(query.into()),
            replacements: Mutex::new(Vec::new()),
        }
    }

    /// Every query written through [`UrlHost::replace_query`], oldest first.
    pub fn replacements(&self) -> Vec<String> {
        self.replacements.lock().clone()
    }

    /// Simulate the user landing on a different URL (back/forward).
    pub fn set_query(&self, query: impl Into<String>) {
        *self.query.lock() = query.into();
    }
}

impl UrlHost for MemoryUrl {
    fn current_query(&self) -> String {
        self.query.lock().clone()
    }

    fn replace_query(&self, query: &str) {
        *self.query.lock() = query.to_string();
        self.replacements.lock().push(query.to_string());
    }
}

// =============================================================================
// Binder
// =============================================================================

/// Hydrates a [`ViewStateStore`] from the URL and writes URL effects back.
pub struct UrlStateBinder<H> {
    host: H,
}

impl<H: UrlHost> UrlStateBinder<H> {
    /// Create a binder over `host`.
    pub fn new(host: H) -> Self {
        Self { host }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Read the URL and hydrate `store`.
    ///
    /// Returns `false` if the store was already hydrated (or unmounted); the
    /// URL is not read in that case.
    pub fn mount(&self, store: &mut ViewStateStore) -> bool {
        if !store.begin_hydration() {
            return false;
        }
        let query = self.host.current_query();
        tracing::debug!("Hydrating from query '{}'", query);
        store.complete_hydration(&query)
    }

    /// Execute URL effects and hand back the fetch tickets, in order.
    pub fn apply(&self, effects: Vec<Effect>) -> Vec<FetchTicket> {
        let mut tickets = Vec::new();
        for effect in effects {
            match effect {
                Effect::ReplaceUrl(query) => {
                    tracing::debug!("Replacing URL query with '{}'", query);
                    self.host.replace_query(&query);
                }
                Effect::Fetch(ticket) => tickets.push(ticket),
            }
        }
        tickets
    }
}
