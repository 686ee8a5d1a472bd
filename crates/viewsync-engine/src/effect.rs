//! Effect types for the view-state machine.
//!
//! Transitions in [`ViewStateStore`](crate::store::ViewStateStore) are pure:
//! they return the effects they want, and the caller executes each one exactly
//! once. The store describes *intent*; the binder and controller perform it.

use viewsync_core::ViewState;

/// An effect produced by an accepted transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Replace (never push) the URL query string.
    ReplaceUrl(String),

    /// Fetch the page described by the ticket's state.
    Fetch(FetchTicket),
}

impl Effect {
    /// Check if this is a fetch effect.
    pub fn is_fetch(&self) -> bool {
        matches!(self, Effect::Fetch(_))
    }
}

/// A fetch request stamped with the generation that issued it.
///
/// The response may only be applied while `generation` is still the
/// store's latest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub generation: u64,
    pub state: ViewState,
}
