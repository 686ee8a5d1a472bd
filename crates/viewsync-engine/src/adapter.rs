//! Server response adapters.
//!
//! The backend paginates with two conventions:
//!
//! | Shape | Body |
//! |-------|------|
//! | [`ResponseShape::Counted`] | `{ "results": [...], "count": 25 }` |
//! | [`ResponseShape::Numbered`] | `{ "<items_key>": [...], "page_size": 10, "page_number": 1, "total_results_count": 25 }` |
//!
//! [`ApiPageFetcher`] builds the request parameters, calls a
//! [`JsonTransport`], and normalizes either shape into a [`PageResult`].

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use viewsync_core::{FetchError, PageRequest, PageResult, SortOrder, SortParamStyle};

use crate::context::AppContext;
use crate::fetcher::PageFetcher;

// =============================================================================
// Transport
// =============================================================================

/// HTTP GET returning a JSON body.
///
/// Implementations attach credentials and handle session expiry (a 401 is
/// reported as [`FetchError::Unauthorized`] after the transport has logged
/// the user out).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait JsonTransport: Send + Sync {
    async fn get_json(
        &self,
        path: &str,
        params: Vec<(String, String)>,
    ) -> Result<serde_json::Value, FetchError>;
}

// =============================================================================
// Response Shapes
// =============================================================================

/// Which pagination convention an endpoint answers with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseShape {
    /// `{ results, count }`. Page number and size are not echoed, so they
    /// are taken from the request.
    Counted,
    /// `{ <items_key>, page_size, page_number, total_results_count }`.
    Numbered { items_key: String },
}

#[derive(Deserialize)]
struct CountedBody<T> {
    results: Vec<T>,
    count: u64,
}

#[derive(Deserialize)]
struct NumberedCounters {
    page_size: u32,
    page_number: u32,
    total_results_count: u64,
}

impl ResponseShape {
    /// Numbered shape with items under `items_key`.
    pub fn numbered(items_key: impl Into<String>) -> Self {
        ResponseShape::Numbered {
            items_key: items_key.into(),
        }
    }

    /// Normalize a response body into a [`PageResult`].
    pub fn normalize<T: DeserializeOwned>(
        &self,
        mut body: serde_json::Value,
        request: &PageRequest,
    ) -> Result<PageResult<T>, FetchError> {
        let page = match self {
            ResponseShape::Counted => {
                let body: CountedBody<T> = serde_json::from_value(body)
                    .map_err(|e| FetchError::Decode(e.to_string()))?;
                PageResult::new(body.results, request.page, request.page_size, body.count)
            }
            ResponseShape::Numbered { items_key } => {
                let items = body
                    .get_mut(items_key.as_str())
                    .map(serde_json::Value::take)
                    .ok_or_else(|| FetchError::Decode(format!("missing field `{}`", items_key)))?;
                let items: Vec<T> = serde_json::from_value(items)
                    .map_err(|e| FetchError::Decode(e.to_string()))?;
                let counters: NumberedCounters = serde_json::from_value(body)
                    .map_err(|e| FetchError::Decode(e.to_string()))?;
                PageResult::new(
                    items,
                    counters.page_number,
                    counters.page_size,
                    counters.total_results_count,
                )
            }
        };

        if page.page_size == 0 {
            return Err(FetchError::InvalidPageSize);
        }
        Ok(page)
    }
}

// =============================================================================
// API Page Fetcher
// =============================================================================

/// [`PageFetcher`] for one backend collection endpoint.
pub struct ApiPageFetcher<Tr> {
    transport: Tr,
    path: String,
    shape: ResponseShape,
    filter_param: String,
    sort_style: SortParamStyle,
    renames: BTreeMap<String, String>,
    scope: BTreeMap<String, String>,
}

impl<Tr: JsonTransport> ApiPageFetcher<Tr> {
    /// Fetcher for `path`, sending the filter as `title` and sorting as
    /// `sort_field`/`sort_order`.
    pub fn new(transport: Tr, path: impl Into<String>, shape: ResponseShape) -> Self {
        Self {
            transport,
            path: path.into(),
            shape,
            filter_param: "title".to_string(),
            sort_style: SortParamStyle::FieldAndOrder,
            renames: BTreeMap::new(),
            scope: BTreeMap::new(),
        }
    }

    /// Extracted objects of one post, scoped to the active team if there is one.
    pub fn post_objects(transport: Tr, ctx: &AppContext, feed_id: &str, post_id: &str) -> Self {
        let path = match ctx.active_team() {
            Some(team_id) => {
                format!("/proxy/teams/{team_id}/feeds/{feed_id}/posts/{post_id}/objects/")
            }
            None => format!("/proxy/feeds/{feed_id}/posts/{post_id}/objects/"),
        };
        Self::new(transport, path, ResponseShape::numbered("objects"))
            .with_sort_style(ctx.config().sort_param)
    }

    /// Name of the free-text filter parameter.
    pub fn with_filter_param(mut self, name: impl Into<String>) -> Self {
        self.filter_param = name.into();
        self
    }

    pub fn with_sort_style(mut self, style: SortParamStyle) -> Self {
        self.sort_style = style;
        self
    }

    /// Send the view extra `from` under the name `to`.
    pub fn rename_param(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.renames.insert(from.into(), to.into());
        self
    }

    /// Add a fixed scoping parameter, e.g. `profile_id`.
    pub fn with_scope(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.scope.insert(key.into(), value.into());
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Query parameters for `request`. Empty values are dropped.
    pub fn params(&self, request: &PageRequest) -> Vec<(String, String)> {
        let mut params = vec![
            ("page".to_string(), request.page.to_string()),
            ("page_size".to_string(), request.page_size.to_string()),
            (self.filter_param.clone(), request.filter.clone()),
        ];

        if !request.sort_field.is_empty() {
            match self.sort_style {
                SortParamStyle::FieldAndOrder => {
                    params.push(("sort_field".to_string(), request.sort_field.clone()));
                    params.push((
                        "sort_order".to_string(),
                        request.sort_order.as_str().to_string(),
                    ));
                }
                SortParamStyle::OrderBy => {
                    let prefix = match request.sort_order {
                        SortOrder::Asc => "",
                        SortOrder::Desc => "-",
                    };
                    params.push(("order_by".to_string(), format!("{prefix}{}", request.sort_field)));
                }
            }
        }

        for (key, value) in &self.scope {
            params.push((key.clone(), value.clone()));
        }
        for (key, value) in &request.extra {
            let name = self.renames.get(key).unwrap_or(key);
            params.push((name.clone(), value.clone()));
        }

        params.retain(|(_, value)| !value.is_empty());
        params
    }
}

#[async_trait]
impl<T, Tr> PageFetcher<T> for ApiPageFetcher<Tr>
where
    T: DeserializeOwned + Send + 'static,
    Tr: JsonTransport,
{
    async fn fetch_page(&self, request: &PageRequest) -> Result<PageResult<T>, FetchError> {
        let params = self.params(request);
        tracing::debug!("GET {} {:?}", self.path, params);
        let body = self.transport.get_json(&self.path, params).await?;
        self.shape.normalize(body, request)
    }
}
