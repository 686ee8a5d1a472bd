//! View state for paginated list views.
//!
//! A [`ViewState`] is the filter/sort/page tuple that decides what a list view
//! shows. It is only ever changed through [`ViewState::apply`], which enforces
//! the page-reset rule: a page index is meaningless once the filter or sort
//! changes, so any such change puts the view back on page 0.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Sort field used by list views that do not name their own.
pub const DEFAULT_SORT_FIELD: &str = "latest_item_pubdate";

// =============================================================================
// Sort Order
// =============================================================================

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// Wire representation (`"asc"` / `"desc"`).
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }

    /// Parse a sort order, treating anything other than `"asc"` as descending.
    pub fn parse_lenient(value: &str) -> Self {
        if value == "asc" {
            SortOrder::Asc
        } else {
            SortOrder::Desc
        }
    }

    /// The opposite direction.
    pub fn reversed(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }
}

// =============================================================================
// Defaults
// =============================================================================

/// Per-view defaults used when the URL does not carry a value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewDefaults {
    /// Sort field when the URL has none, e.g. `"latest_item_pubdate"`.
    pub sort_field: String,

    /// Sort order when the URL has none.
    #[serde(default)]
    pub sort_order: SortOrder,
}

impl ViewDefaults {
    /// Defaults for a view sorted by `sort_field`, newest first.
    pub fn new(sort_field: impl Into<String>) -> Self {
        Self {
            sort_field: sort_field.into(),
            sort_order: SortOrder::Desc,
        }
    }
}

impl Default for ViewDefaults {
    fn default() -> Self {
        Self::new(DEFAULT_SORT_FIELD)
    }
}

// =============================================================================
// View State
// =============================================================================

/// Filter, sort and pagination parameters of one list view.
///
/// `page` is the 0-based page index as shown in the UI. Conversion to the
/// server's numbering happens in [`PageRequest::from_view`](crate::PageRequest::from_view).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewState {
    pub filter: String,
    pub sort_field: String,
    pub sort_order: SortOrder,
    pub page: u32,

    /// View-specific parameters (e.g. `type`, `value`, `showMyFeeds`).
    #[serde(default)]
    pub extra: BTreeMap<String, String>,
}

impl ViewState {
    /// Initial state for a view with the given defaults.
    pub fn from_defaults(defaults: &ViewDefaults) -> Self {
        Self {
            filter: String::new(),
            sort_field: defaults.sort_field.clone(),
            sort_order: defaults.sort_order,
            page: 0,
            extra: BTreeMap::new(),
        }
    }

    /// Merge a partial update into this state.
    ///
    /// Returns `true` if the filter or sort changed, in which case `page` is
    /// reset to 0 regardless of any page carried by the patch.
    pub fn apply(&mut self, patch: ViewPatch) -> bool {
        let mut reset_page = false;

        if let Some(filter) = patch.filter {
            if filter != self.filter {
                self.filter = filter;
                reset_page = true;
            }
        }
        if let Some(sort_field) = patch.sort_field {
            if sort_field != self.sort_field {
                self.sort_field = sort_field;
                reset_page = true;
            }
        }
        if let Some(sort_order) = patch.sort_order {
            if sort_order != self.sort_order {
                self.sort_order = sort_order;
                reset_page = true;
            }
        }
        if let Some(page) = patch.page {
            self.page = page;
        }
        for (key, value) in patch.extra {
            match value {
                Some(value) => {
                    self.extra.insert(key, value);
                }
                None => {
                    self.extra.remove(&key);
                }
            }
        }

        if reset_page {
            self.page = 0;
        }
        reset_page
    }

    /// Patch produced by clicking a column header.
    ///
    /// Clicking the current ascending column flips it to descending; any other
    /// click sorts ascending by `field`.
    pub fn sort_toggle(&self, field: &str) -> ViewPatch {
        let order = if self.sort_field == field && self.sort_order == SortOrder::Asc {
            SortOrder::Desc
        } else {
            SortOrder::Asc
        };
        ViewPatch::new().sort(field, order)
    }

    /// Look up a view-specific parameter.
    pub fn extra(&self, key: &str) -> Option<&str> {
        self.extra.get(key).map(String::as_str)
    }
}

// =============================================================================
// Partial Updates
// =============================================================================

/// A partial [`ViewState`] update. Unset fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewPatch {
    pub filter: Option<String>,
    pub sort_field: Option<String>,
    pub sort_order: Option<SortOrder>,
    pub page: Option<u32>,

    /// `Some` sets an extra, `None` removes it.
    pub extra: BTreeMap<String, Option<String>>,
}

impl ViewPatch {
    /// Create an empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the filter text.
    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Set sort field and order together.
    pub fn sort(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.sort_field = Some(field.into());
        self.sort_order = Some(order);
        self
    }

    /// Set only the sort order.
    pub fn sort_order(mut self, order: SortOrder) -> Self {
        self.sort_order = Some(order);
        self
    }

    /// Move to a page.
    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    /// Set a view-specific parameter.
    pub fn extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), Some(value.into()));
        self
    }

    /// Remove a view-specific parameter.
    pub fn remove_extra(mut self, key: impl Into<String>) -> Self {
        self.extra.insert(key.into(), None);
        self
    }

    /// Check if the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.filter.is_none()
            && self.sort_field.is_none()
            && self.sort_order.is_none()
            && self.page.is_none()
            && self.extra.is_empty()
    }
}
