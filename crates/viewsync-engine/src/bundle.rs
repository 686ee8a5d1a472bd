//! Bundle assembly and the bundle loader.
//!
//! A bundle is named after the first item of the configured root type
//! (`"report"` by default). [`BundleLoader`] drains a collection and
//! assembles it, discarding the result if its owner was torn down while the
//! drain was in flight.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use viewsync_core::{Bundle, BundleConfig, BundleObject, DrainError};

use crate::drain::PageDrainer;
use crate::fetcher::PageFetcher;

/// Id of the first item whose type tag is `root_type`, or `""` if none.
pub fn find_root_id<'a, T: BundleObject>(items: &'a [T], root_type: &str) -> &'a str {
    items
        .iter()
        .find(|item| item.type_tag() == root_type)
        .map(|item| item.object_id())
        .unwrap_or_default()
}

// =============================================================================
// Assembler
// =============================================================================

/// Builds bundles from drained collections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleAssembler {
    root_type: String,
    spec_version: String,
}

impl BundleAssembler {
    pub fn new(root_type: impl Into<String>, spec_version: impl Into<String>) -> Self {
        Self {
            root_type: root_type.into(),
            spec_version: spec_version.into(),
        }
    }

    pub fn from_config(config: &BundleConfig) -> Self {
        Self::new(config.root_type.clone(), config.spec_version.clone())
    }

    pub fn root_type(&self) -> &str {
        &self.root_type
    }

    /// Wrap `items` in a bundle. Order is preserved.
    pub fn assemble<T: BundleObject>(&self, items: Vec<T>) -> Bundle<T> {
        let root_id = find_root_id(&items, &self.root_type).to_string();
        if root_id.is_empty() {
            tracing::warn!(
                "No {} among {} items, bundle id has no root",
                self.root_type,
                items.len()
            );
        }
        let bundle = Bundle::new(&root_id, self.spec_version.clone(), items);
        tracing::debug!("Assembled {} with {} objects", bundle.id(), bundle.objects().len());
        bundle
    }
}

impl Default for BundleAssembler {
    fn default() -> Self {
        Self::from_config(&BundleConfig::default())
    }
}

// =============================================================================
// Loader
// =============================================================================

/// Shared flag that goes false when the owner of a load is torn down.
#[derive(Debug, Clone)]
pub struct Liveness(Arc<AtomicBool>);

impl Liveness {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn is_alive(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn teardown(&self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Default for Liveness {
    fn default() -> Self {
        Self::new()
    }
}

/// Drains a collection and assembles it into a bundle.
pub struct BundleLoader<F> {
    drainer: PageDrainer,
    fetcher: F,
    assembler: BundleAssembler,
    liveness: Liveness,
}

impl<F> BundleLoader<F> {
    pub fn new(drainer: PageDrainer, fetcher: F, assembler: BundleAssembler) -> Self {
        Self {
            drainer,
            fetcher,
            assembler,
            liveness: Liveness::new(),
        }
    }

    /// Handle that tears this loader down from elsewhere.
    pub fn liveness(&self) -> Liveness {
        self.liveness.clone()
    }

    pub fn teardown(&self) {
        self.liveness.teardown();
    }

    /// Drain and assemble.
    ///
    /// Returns `Ok(None)` without fetching if the loader is already torn
    /// down, and `Ok(None)` if it was torn down before the drain finished.
    /// A drain error produces no bundle.
    pub async fn load<T>(&self) -> Result<Option<Bundle<T>>, DrainError>
    where
        T: BundleObject + Send,
        F: PageFetcher<T>,
    {
        if !self.liveness.is_alive() {
            tracing::debug!("Bundle load requested after teardown, not draining");
            return Ok(None);
        }
        let items = self.drainer.drain(&self.fetcher).await;
        if !self.liveness.is_alive() {
            tracing::debug!("Bundle load finished after teardown, discarding");
            return Ok(None);
        }
        Ok(Some(self.assembler.assemble(items?)))
    }
}
