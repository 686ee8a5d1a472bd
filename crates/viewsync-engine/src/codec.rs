//! Query-param codec.
//!
//! Pure conversions between [`ViewState`] and a URL query string:
//!
//! ```text
//! filter=apt+29&sortField=title&sortOrder=asc&page=2&showMyFeeds=true
//! ```
//!
//! Decoding never fails. Missing keys take the view's defaults, unparseable
//! numbers fall back to their default, and any `sortOrder` other than `asc`
//! reads as `desc`. Values are percent-encoded, so spaces, `&` and `=` survive
//! a round trip.

use std::borrow::Cow;

use viewsync_core::{SortOrder, ViewDefaults, ViewPatch, ViewState};

pub const FILTER_KEY: &str = "filter";
pub const SORT_FIELD_KEY: &str = "sortField";
pub const SORT_ORDER_KEY: &str = "sortOrder";
pub const PAGE_KEY: &str = "page";

/// Keys owned by the core view state. Extras may not use them.
pub const RESERVED_KEYS: [&str; 4] = [FILTER_KEY, SORT_FIELD_KEY, SORT_ORDER_KEY, PAGE_KEY];

/// Check if `key` is one of the core view-state keys.
pub fn is_reserved(key: &str) -> bool {
    RESERVED_KEYS.contains(&key)
}

// =============================================================================
// Encode
// =============================================================================

/// Encode a view state as a query string (no leading `?`).
///
/// Core keys are always written, extras follow in key order. Extras named
/// like a core key are skipped.
pub fn encode(state: &ViewState) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    query
        .append_pair(FILTER_KEY, &state.filter)
        .append_pair(SORT_FIELD_KEY, &state.sort_field)
        .append_pair(SORT_ORDER_KEY, state.sort_order.as_str())
        .append_pair(PAGE_KEY, &state.page.to_string());

    for (key, value) in &state.extra {
        if is_reserved(key) {
            tracing::debug!("Skipping extra '{}': collides with a core key", key);
            continue;
        }
        query.append_pair(key, value);
    }

    query.finish()
}

// =============================================================================
// Decode
// =============================================================================

/// Decode the keys present in `query` as a partial update.
///
/// A leading `?` is ignored. A garbled `page` is left unset. When a key repeats,
/// the last occurrence wins.
pub fn decode_patch(query: &str) -> ViewPatch {
    let query = query.strip_prefix('?').unwrap_or(query);
    let mut patch = ViewPatch::new();

    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        match key.as_ref() {
            FILTER_KEY => patch.filter = Some(value.into_owned()),
            SORT_FIELD_KEY => patch.sort_field = Some(value.into_owned()),
            SORT_ORDER_KEY => patch.sort_order = Some(SortOrder::parse_lenient(&value)),
            PAGE_KEY => patch.page = parse_page(&value),
            _ => {
                patch
                    .extra
                    .insert(key.into_owned(), Some(value.into_owned()));
            }
        }
    }

    patch
}

/// Decode a full view state, filling absent keys from `defaults`.
pub fn decode(query: &str, defaults: &ViewDefaults) -> ViewState {
    let patch = decode_patch(query);
    let mut state = ViewState::from_defaults(defaults);

    // Set fields directly: hydration is not a filter change, so no page reset.
    if let Some(filter) = patch.filter {
        state.filter = filter;
    }
    if let Some(sort_field) = patch.sort_field {
        state.sort_field = sort_field;
    }
    if let Some(sort_order) = patch.sort_order {
        state.sort_order = sort_order;
    }
    if let Some(page) = patch.page {
        state.page = page;
    }
    state.extra = patch
        .extra
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key, v)))
        .collect();

    state
}

fn parse_page(value: &Cow<'_, str>) -> Option<u32> {
    match value.trim().parse::<u32>() {
        Ok(page) => Some(page),
        Err(_) => {
            tracing::debug!("Ignoring unparseable page '{}', using default", value);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    fn defaults() -> ViewDefaults {
        ViewDefaults::new("latest_item_pubdate")
    }

    #[test]
    fn test_decode_empty_uses_defaults() {
        let state = decode("", &defaults());
        assert_eq!(state, ViewState::from_defaults(&defaults()));
    }

    #[test]
    fn test_decode_full() {
        let state = decode(
            "?filter=apt&sortField=title&sortOrder=asc&page=3&showMyFeeds=true",
            &defaults(),
        );
        assert_eq!(state.filter, "apt");
        assert_eq!(state.sort_field, "title");
        assert_eq!(state.sort_order, SortOrder::Asc);
        assert_eq!(state.page, 3);
        assert_eq!(state.extra("showMyFeeds"), Some("true"));
    }

    #[test]
    fn test_decode_garbled_values_fall_back() {
        let state = decode("page=abc&sortOrder=sideways", &defaults());
        assert_eq!(state.page, 0);
        assert_eq!(state.sort_order, SortOrder::Desc);

        let state = decode("page=-4", &defaults());
        assert_eq!(state.page, 0);

        let state = decode("page=99999999999999", &defaults());
        assert_eq!(state.page, 0);
    }

    #[test]
    fn test_decode_view_specific_default() {
        let state = decode("filter=x", &ViewDefaults::new("created"));
        assert_eq!(state.sort_field, "created");
    }

    #[test]
    fn test_decode_keeps_empty_sort_field() {
        let state = decode("?sortField=&page=1", &defaults());
        assert_eq!(state.sort_field, "");
        assert_eq!(decode(&encode(&state), &defaults()), state);
    }

    #[test]
    fn test_decode_does_not_reset_page() {
        let state = decode("filter=changed&page=5", &defaults());
        assert_eq!(state.page, 5);
    }

    #[test]
    fn test_decode_patch_only_present_keys() {
        let patch = decode_patch("type=ipv4-addr&value=10.0.0.1");
        assert!(patch.filter.is_none());
        assert!(patch.page.is_none());
        assert_eq!(patch.extra.get("type"), Some(&Some("ipv4-addr".to_string())));
        assert_eq!(patch.extra.get("value"), Some(&Some("10.0.0.1".to_string())));
    }

    #[test]
    fn test_encode_reserved_characters() {
        let mut state = ViewState::from_defaults(&defaults());
        state.filter = "a b&c=d+e".to_string();

        let query = encode(&state);
        assert!(query.starts_with("filter=a+b%26c%3Dd%2Be&"));
        assert_eq!(decode(&query, &defaults()), state);
    }

    #[test]
    fn test_encode_key_order() {
        let mut state = ViewState::from_defaults(&defaults());
        state.extra.insert("value".to_string(), "1".to_string());
        state.extra.insert("type".to_string(), "url".to_string());

        assert_eq!(
            encode(&state),
            "filter=&sortField=latest_item_pubdate&sortOrder=desc&page=0&type=url&value=1"
        );
    }

    #[test]
    fn test_encode_skips_reserved_extras() {
        let mut state = ViewState::from_defaults(&defaults());
        state.extra.insert("page".to_string(), "9".to_string());

        let decoded = decode(&encode(&state), &defaults());
        assert_eq!(decoded.page, 0);
        assert!(decoded.extra.is_empty());
    }

    #[test]
    fn test_last_duplicate_wins() {
        let state = decode("filter=a&filter=b", &defaults());
        assert_eq!(state.filter, "b");
    }

    fn text() -> impl Strategy<Value = String> {
        "[^\\p{Cc}]{0,16}"
    }

    fn extras() -> impl Strategy<Value = BTreeMap<String, String>> {
        prop::collection::btree_map(
            "[a-zA-Z][a-zA-Z0-9_]{0,8}".prop_filter("reserved key", |k| !is_reserved(k)),
            text(),
            0..4,
        )
    }

    fn view_state() -> impl Strategy<Value = ViewState> {
        (text(), text(), any::<bool>(), any::<u32>(), extras()).prop_map(
            |(filter, sort_field, asc, page, extra)| ViewState {
                filter,
                sort_field,
                sort_order: if asc { SortOrder::Asc } else { SortOrder::Desc },
                page,
                extra,
            },
        )
    }

    proptest! {
        #[test]
        fn prop_round_trip(state in view_state()) {
            prop_assert_eq!(decode(&encode(&state), &defaults()), state);
        }
    }
}
