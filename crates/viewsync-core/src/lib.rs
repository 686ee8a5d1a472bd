//! Core types for the viewsync engine.
//!
//! This crate contains the data structures shared by every viewsync crate:
//! - View state (filter, sort, page, extras) and partial updates
//! - Page requests and normalized page results
//! - Bundle objects and the bundle artifact
//! - Configuration types
//! - Error types

mod bundle;
mod config;
mod error;
mod page;
mod view_state;

pub use bundle::{Bundle, BundleObject, StixObject, BUNDLE_ID_PREFIX};
pub use config::{
    config_dir, config_path, BundleConfig, EngineConfig, PageIndexConvention, SortParamStyle,
};
pub use error::{BundleError, ConfigError, DrainError, FetchError};
pub use page::{PageRequest, PageResult};
pub use view_state::{SortOrder, ViewDefaults, ViewPatch, ViewState, DEFAULT_SORT_FIELD};
