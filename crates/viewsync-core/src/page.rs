//! Page requests and normalized page results.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::PageIndexConvention;
use crate::view_state::{SortOrder, ViewState};

// =============================================================================
// Page Request
// =============================================================================

/// Parameters for fetching one page of a collection.
///
/// `page` is already in the server's numbering; see [`PageRequest::from_view`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
    pub filter: String,
    pub sort_field: String,
    pub sort_order: SortOrder,

    /// View extras and scoping parameters (e.g. `profile_id`).
    #[serde(default)]
    pub extra: BTreeMap<String, String>,
}

impl PageRequest {
    /// Request for the page a list view is currently on.
    pub fn from_view(state: &ViewState, page_size: u32, convention: PageIndexConvention) -> Self {
        Self {
            page: convention.to_server(state.page),
            page_size,
            filter: state.filter.clone(),
            sort_field: state.sort_field.clone(),
            sort_order: state.sort_order,
            extra: state.extra.clone(),
        }
    }

    /// Bare request for server page `page`, used when draining a collection.
    pub fn for_page(page: u32, page_size: u32) -> Self {
        Self {
            page,
            page_size,
            filter: String::new(),
            sort_field: String::new(),
            sort_order: SortOrder::Desc,
            extra: BTreeMap::new(),
        }
    }

    /// Same request, different page.
    pub fn with_page(&self, page: u32) -> Self {
        Self {
            page,
            ..self.clone()
        }
    }

    /// Add a scoping parameter.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

// =============================================================================
// Page Result
// =============================================================================

/// One page of items in the engine's uniform shape.
///
/// Server responses come in more than one convention; adapters normalize
/// them into this type before anything else sees them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageResult<T> {
    pub items: Vec<T>,

    /// 1-based page number as reported by the server.
    pub page_number: u32,

    /// Must be non-zero. Zero is a server contract violation.
    pub page_size: u32,

    /// Size of the whole collection at the time this page was served.
    pub total_count: u64,
}

impl<T> PageResult<T> {
    /// Create a page result.
    pub fn new(items: Vec<T>, page_number: u32, page_size: u32, total_count: u64) -> Self {
        Self {
            items,
            page_number,
            page_size,
            total_count,
        }
    }

    /// Whether the server reports pages beyond this one.
    ///
    /// Float division with a strict comparison: `total / size > number`.
    /// Callers must reject `page_size == 0` before asking.
    pub fn has_more(&self) -> bool {
        (self.total_count as f64 / self.page_size as f64) > self.page_number as f64
    }

    /// Total number of pages, rounded up. Zero when `page_size` is zero.
    pub fn total_pages(&self) -> u64 {
        if self.page_size == 0 {
            return 0;
        }
        self.total_count.div_ceil(u64::from(self.page_size))
    }

    /// Number of items on this page.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if this page has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view_state::ViewDefaults;

    #[test]
    fn test_from_view_one_based() {
        let mut state = ViewState::from_defaults(&ViewDefaults::default());
        state.page = 2;
        state.filter = "lazarus".to_string();

        let request = PageRequest::from_view(&state, 10, PageIndexConvention::OneBased);
        assert_eq!(request.page, 3);
        assert_eq!(request.page_size, 10);
        assert_eq!(request.filter, "lazarus");
        assert_eq!(request.sort_field, "latest_item_pubdate");
    }

    #[test]
    fn test_from_view_zero_based() {
        let mut state = ViewState::from_defaults(&ViewDefaults::default());
        state.page = 2;

        let request = PageRequest::from_view(&state, 10, PageIndexConvention::ZeroBased);
        assert_eq!(request.page, 2);
    }

    #[test]
    fn test_has_more() {
        assert!(PageResult::<u8>::new(vec![], 1, 10, 25).has_more());
        assert!(PageResult::<u8>::new(vec![], 2, 10, 25).has_more());
        assert!(!PageResult::<u8>::new(vec![], 3, 10, 25).has_more());
        // Exactly full: 20 / 10 = 2.0 is not > 2
        assert!(!PageResult::<u8>::new(vec![], 2, 10, 20).has_more());
        assert!(!PageResult::<u8>::new(vec![], 1, 10, 0).has_more());
    }

    #[test]
    fn test_total_pages() {
        assert_eq!(PageResult::<u8>::new(vec![], 1, 10, 25).total_pages(), 3);
        assert_eq!(PageResult::<u8>::new(vec![], 1, 10, 20).total_pages(), 2);
        assert_eq!(PageResult::<u8>::new(vec![], 1, 10, 0).total_pages(), 0);
        assert_eq!(PageResult::<u8>::new(vec![], 1, 0, 5).total_pages(), 0);
    }

    #[test]
    fn test_with_page_keeps_params() {
        let request = PageRequest::for_page(1, 50).with_param("profile_id", "p1");
        let next = request.with_page(2);
        assert_eq!(next.page, 2);
        assert_eq!(next.extra.get("profile_id").map(String::as_str), Some("p1"));
    }
}
