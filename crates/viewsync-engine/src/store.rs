//! View-state store.
//!
//! The store is an explicit state machine. Invalid orderings are impossible:
//! there is no view state to update until hydration has produced one.
//!
//! ```text
//! Uninitialized ──begin_hydration──▶ Hydrating ──complete_hydration──▶ Ready
//!       │                                │                              │
//!       └────────────────────────────────┴───────────unmount───────────┴──▶ Unmounted
//! ```
//!
//! Only `Ready` accepts `update`/`refresh`/`navigate`, and only those produce
//! effects. Hydration itself never writes the URL and never fetches.
//!
//! Every accepted transition bumps a per-store generation counter and stamps
//! its fetch with it. A response is current only while its generation is the
//! latest issued and the store is still `Ready`.

use tokio::sync::watch;
use viewsync_core::{ViewDefaults, ViewPatch, ViewState};

use crate::codec;
use crate::effect::{Effect, FetchTicket};

// =============================================================================
// Phase
// =============================================================================

/// Lifecycle phase of a view's state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ViewPhase {
    /// View constructed, URL not read yet.
    #[default]
    Uninitialized,
    /// URL read in progress.
    Hydrating,
    /// Hydrated; updates are accepted.
    Ready(ViewState),
    /// View torn down. Nothing is accepted any more.
    Unmounted,
}

impl ViewPhase {
    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            ViewPhase::Uninitialized => "uninitialized",
            ViewPhase::Hydrating => "hydrating",
            ViewPhase::Ready(_) => "ready",
            ViewPhase::Unmounted => "unmounted",
        }
    }
}

// =============================================================================
// Store
// =============================================================================

/// Holds one view's filter/sort/page state and turns changes into effects.
pub struct ViewStateStore {
    defaults: ViewDefaults,
    phase: ViewPhase,
    generation: u64,
    ready_tx: watch::Sender<bool>,
}

impl ViewStateStore {
    /// Create a store for a view with the given defaults.
    pub fn new(defaults: ViewDefaults) -> Self {
        let (ready_tx, _) = watch::channel(false);
        Self {
            defaults,
            phase: ViewPhase::Uninitialized,
            generation: 0,
            ready_tx,
        }
    }

    // =========================================================================
    // Hydration
    // =========================================================================

    /// `Uninitialized → Hydrating`.
    ///
    /// Returns `false` (and changes nothing) in any other phase, so a view
    /// hydrates at most once.
    pub fn begin_hydration(&mut self) -> bool {
        if self.phase != ViewPhase::Uninitialized {
            tracing::warn!("Ignoring hydration request in phase {}", self.phase.name());
            return false;
        }
        self.phase = ViewPhase::Hydrating;
        true
    }

    /// `Hydrating → Ready`, with state decoded from `query`.
    ///
    /// Produces no effects. Returns `false` if not hydrating.
    pub fn complete_hydration(&mut self, query: &str) -> bool {
        if self.phase != ViewPhase::Hydrating {
            tracing::warn!(
                "Ignoring hydration result in phase {}",
                self.phase.name()
            );
            return false;
        }
        let state = codec::decode(query, &self.defaults);
        tracing::debug!("Hydrated view state: {:?}", state);
        self.phase = ViewPhase::Ready(state);
        self.ready_tx.send_replace(true);
        true
    }

    /// Hydrate in one step from an already-read query string.
    pub fn hydrate(&mut self, query: &str) -> bool {
        self.begin_hydration() && self.complete_hydration(query)
    }

    // =========================================================================
    // Transitions (Ready only)
    // =========================================================================

    /// Merge `patch` into the state.
    ///
    /// Yields `[ReplaceUrl, Fetch]` when ready, nothing otherwise. Every call
    /// in `Ready` yields exactly one fetch, even if the patch changed nothing.
    pub fn update(&mut self, patch: ViewPatch) -> Vec<Effect> {
        if !self.is_ready() {
            tracing::debug!("Dropping update in phase {}", self.phase.name());
            return Vec::new();
        }
        let ViewPhase::Ready(state) = &mut self.phase else {
            return Vec::new();
        };

        let reset = state.apply(patch);
        if reset {
            tracing::debug!("Filter or sort changed, page reset to 0");
        }
        let query = codec::encode(state);
        let state = state.clone();
        let ticket = self.next_ticket(state);

        vec![Effect::ReplaceUrl(query), Effect::Fetch(ticket)]
    }

    /// Re-fetch the current state. Yields `[Fetch]` when ready.
    ///
    /// The URL already reflects the state, so it is not rewritten.
    pub fn refresh(&mut self) -> Vec<Effect> {
        let Some(state) = self.state().cloned() else {
            tracing::debug!("Dropping refresh in phase {}", self.phase.name());
            return Vec::new();
        };
        vec![Effect::Fetch(self.next_ticket(state))]
    }

    /// Adopt a URL the user navigated to (back/forward). Yields `[Fetch]`.
    ///
    /// The whole state is replaced by the decoded URL, so the URL is not
    /// written back.
    pub fn navigate(&mut self, query: &str) -> Vec<Effect> {
        if !self.is_ready() {
            tracing::debug!("Dropping navigation in phase {}", self.phase.name());
            return Vec::new();
        }
        let state = codec::decode(query, &self.defaults);
        self.phase = ViewPhase::Ready(state.clone());
        vec![Effect::Fetch(self.next_ticket(state))]
    }

    /// Tear the view down. In-flight responses become stale.
    pub fn unmount(&mut self) {
        tracing::debug!("Unmounting view from phase {}", self.phase.name());
        self.phase = ViewPhase::Unmounted;
    }

    // =========================================================================
    // Read Methods
    // =========================================================================

    /// Whether a response stamped with `generation` may still be applied.
    pub fn is_current(&self, generation: u64) -> bool {
        self.is_ready() && generation == self.generation
    }

    /// Current state, if hydrated and mounted.
    pub fn state(&self) -> Option<&ViewState> {
        match &self.phase {
            ViewPhase::Ready(state) => Some(state),
            _ => None,
        }
    }

    pub fn phase(&self) -> &ViewPhase {
        &self.phase
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.phase, ViewPhase::Ready(_))
    }

    /// Latest generation issued (0 before the first transition).
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn defaults(&self) -> &ViewDefaults {
        &self.defaults
    }

    /// Subscribe to the ready signal. Flips to `true` once, after hydration.
    pub fn ready(&self) -> watch::Receiver<bool> {
        self.ready_tx.subscribe()
    }

    fn next_ticket(&mut self, state: ViewState) -> FetchTicket {
        self.generation += 1;
        tracing::debug!("Issuing fetch generation {}", self.generation);
        FetchTicket {
            generation: self.generation,
            state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use viewsync_core::SortOrder;

    fn ready_store(query: &str) -> ViewStateStore {
        let mut store = ViewStateStore::new(ViewDefaults::default());
        assert!(store.hydrate(query));
        store
    }

    fn fetches(effects: &[Effect]) -> usize {
        effects.iter().filter(|e| e.is_fetch()).count()
    }

    #[test]
    fn test_no_effects_before_hydration() {
        let mut store = ViewStateStore::new(ViewDefaults::default());
        assert!(store.update(ViewPatch::new().filter("x")).is_empty());
        assert!(store.refresh().is_empty());
        assert!(store.navigate("page=2").is_empty());

        assert!(store.begin_hydration());
        assert_eq!(store.phase(), &ViewPhase::Hydrating);
        assert!(store.update(ViewPatch::new().filter("x")).is_empty());
        assert!(store.refresh().is_empty());
        assert_eq!(store.generation(), 0);
    }

    #[test]
    fn test_hydration_sets_state_without_effects() {
        let store = ready_store("filter=apt&page=4");
        let state = store.state().unwrap();
        assert_eq!(state.filter, "apt");
        assert_eq!(state.page, 4);
        assert_eq!(store.generation(), 0);
    }

    #[test]
    fn test_hydrates_once() {
        let mut store = ready_store("filter=first");
        assert!(!store.hydrate("filter=second"));
        assert!(!store.begin_hydration());
        assert_eq!(store.state().unwrap().filter, "first");
    }

    #[test]
    fn test_ready_signal() {
        let mut store = ViewStateStore::new(ViewDefaults::default());
        let rx = store.ready();
        assert!(!*rx.borrow());

        store.begin_hydration();
        assert!(!*rx.borrow());

        store.complete_hydration("");
        assert!(*rx.borrow());
    }

    #[test]
    fn test_update_effects() {
        let mut store = ready_store("");
        let effects = store.update(ViewPatch::new().filter("lazarus"));

        assert_eq!(effects.len(), 2);
        match &effects[0] {
            Effect::ReplaceUrl(query) => assert!(query.starts_with("filter=lazarus&")),
            other => panic!("Expected ReplaceUrl, got {:?}", other),
        }
        match &effects[1] {
            Effect::Fetch(ticket) => {
                assert_eq!(ticket.generation, 1);
                assert_eq!(ticket.state.filter, "lazarus");
            }
            other => panic!("Expected Fetch, got {:?}", other),
        }
    }

    #[test]
    fn test_one_fetch_per_update() {
        let mut store = ready_store("");
        let patches = vec![
            ViewPatch::new().filter("a"),
            ViewPatch::new().page(2),
            ViewPatch::new().page(2),
            ViewPatch::new(),
            ViewPatch::new().sort("title", SortOrder::Asc),
        ];
        let n = patches.len();

        let total: usize = patches
            .into_iter()
            .map(|patch| fetches(&store.update(patch)))
            .sum();

        assert_eq!(total, n);
        assert_eq!(store.generation(), n as u64);
    }

    #[test]
    fn test_update_resets_page_on_filter_change() {
        let mut store = ready_store("page=5");
        store.update(ViewPatch::new().filter("new"));
        assert_eq!(store.state().unwrap().page, 0);

        store.update(ViewPatch::new().page(3));
        store.update(ViewPatch::new().sort_order(SortOrder::Asc));
        assert_eq!(store.state().unwrap().page, 0);
    }

    #[test]
    fn test_generation_is_current() {
        let mut store = ready_store("");
        store.update(ViewPatch::new().filter("a"));
        store.update(ViewPatch::new().filter("b"));

        assert!(!store.is_current(1));
        assert!(store.is_current(2));
    }

    #[test]
    fn test_refresh_fetches_without_url_write() {
        let mut store = ready_store("filter=x");
        let effects = store.refresh();
        assert_eq!(effects.len(), 1);
        assert!(effects[0].is_fetch());
        assert_eq!(store.generation(), 1);
    }

    #[test]
    fn test_navigate_replaces_state() {
        let mut store = ready_store("filter=x&page=3&type=url");
        let effects = store.navigate("filter=y&page=1");

        assert_eq!(effects.len(), 1);
        let state = store.state().unwrap();
        assert_eq!(state.filter, "y");
        assert_eq!(state.page, 1);
        assert!(state.extra.is_empty());
    }

    #[test]
    fn test_unmount_discards() {
        let mut store = ready_store("");
        store.update(ViewPatch::new().filter("a"));
        store.unmount();

        assert!(!store.is_current(1));
        assert!(store.update(ViewPatch::new().filter("b")).is_empty());
        assert!(store.state().is_none());
    }
}
