//! View-state synchronization and pagination-drain engine.
//!
//! This crate provides:
//! - A query-param codec between [`ViewState`] and URL query strings
//! - [`ViewStateStore`], the `Uninitialized → Hydrating → Ready` state machine
//!   that turns updates into effects
//! - [`UrlStateBinder`], which hydrates from and mirrors into the URL
//! - [`ListController`], which runs fetch effects and drops stale responses
//! - [`PageDrainer`], which walks a paginated collection to the end
//! - [`BundleAssembler`] / [`BundleLoader`], which turn a drained collection
//!   into a bundle
//! - Server response adapters behind the [`PageFetcher`] seam

pub mod adapter;
pub mod binder;
pub mod bundle;
pub mod codec;
pub mod context;
pub mod controller;
pub mod drain;
pub mod effect;
pub mod fetcher;
pub mod store;

// Re-export commonly used types
pub use adapter::{ApiPageFetcher, JsonTransport, ResponseShape};
pub use binder::{MemoryUrl, UrlHost, UrlStateBinder};
pub use bundle::{find_root_id, BundleAssembler, BundleLoader, Liveness};
pub use context::{Alert, AlertQueue, AppContext, Severity};
pub use controller::{FetchOutcome, ListController, ListSnapshot};
pub use drain::{drain, DrainState, DrainStatus, PageDrainer};
pub use effect::{Effect, FetchTicket};
pub use fetcher::PageFetcher;
pub use store::{ViewPhase, ViewStateStore};

// Re-export viewsync_core types for convenience
pub use viewsync_core::{
    Bundle, BundleObject, DrainError, EngineConfig, FetchError, PageRequest, PageResult,
    SortOrder, StixObject, ViewDefaults, ViewPatch, ViewState,
};
