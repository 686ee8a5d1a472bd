//! Subcommand implementations.
//!
//! Each command returns the text to print, or a message for the error path.

use std::path::PathBuf;

use viewsync_core::{EngineConfig, PageRequest, StixObject, ViewDefaults, ViewPatch};
use viewsync_engine::codec;
use viewsync_engine::{
    ApiPageFetcher, BundleAssembler, BundleLoader, MemoryUrl, PageDrainer, ResponseShape,
    UrlHost, UrlStateBinder, ViewStateStore,
};

use crate::cli::{ExportArgs, QueryArgs, UpdateArgs};
use crate::transport::DirTransport;

fn defaults_for(sort_field: Option<&str>) -> ViewDefaults {
    sort_field.map(ViewDefaults::new).unwrap_or_default()
}

// =============================================================================
// query
// =============================================================================

pub fn query(args: &QueryArgs) -> Result<String, String> {
    let defaults = defaults_for(args.sort_field.as_deref());
    let state = codec::decode(&args.query, &defaults);
    let json = serde_json::to_string_pretty(&state)
        .map_err(|e| format!("Failed to serialize view state: {}", e))?;

    Ok(format!("?{}\n{}", codec::encode(&state), json))
}

// =============================================================================
// update
// =============================================================================

fn parse_set(entry: &str) -> Result<(String, String), String> {
    let (key, value) = entry
        .split_once('=')
        .ok_or_else(|| format!("Expected KEY=VALUE, got '{}'", entry))?;
    if key.is_empty() {
        return Err(format!("Empty key in '{}'", entry));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Apply each requested change as its own update, like a user would.
pub fn update(args: &UpdateArgs) -> Result<String, String> {
    let binder = UrlStateBinder::new(MemoryUrl::new(args.query.as_str()));
    let mut store = ViewStateStore::new(defaults_for(args.sort_field.as_deref()));
    binder.mount(&mut store);

    let mut patches = Vec::new();
    if let Some(filter) = &args.filter {
        patches.push(ViewPatch::new().filter(filter.as_str()));
    }
    for entry in &args.set {
        let (key, value) = parse_set(entry)?;
        patches.push(if value.is_empty() {
            ViewPatch::new().remove_extra(key)
        } else {
            ViewPatch::new().extra(key, value)
        });
    }

    let mut fetches = 0;
    for patch in patches {
        fetches += binder.apply(store.update(patch)).len();
    }
    // Sort toggles depend on the state the earlier patches produced.
    if let Some(field) = &args.sort {
        let patch = store
            .state()
            .map(|state| state.sort_toggle(field))
            .ok_or_else(|| format!("View is {}", store.phase().name()))?;
        fetches += binder.apply(store.update(patch)).len();
    }
    if let Some(page) = args.page {
        fetches += binder.apply(store.update(ViewPatch::new().page(page))).len();
    }

    tracing::debug!("{} fetches issued", fetches);
    let query = binder.host().current_query();
    Ok(format!("?{}", query.trim_start_matches('?')))
}

// =============================================================================
// export
// =============================================================================

/// Drain every page in `args.pages` and write the bundle into `args.out`.
pub async fn export(args: &ExportArgs, config: &EngineConfig) -> Result<PathBuf, String> {
    let shape = if args.counted {
        ResponseShape::Counted
    } else {
        ResponseShape::numbered(args.items_key.as_str())
    };
    let page_size = args.page_size.unwrap_or(config.page_size);

    let fetcher = ApiPageFetcher::new(DirTransport::new(&args.pages), "/objects/", shape)
        .with_sort_style(config.sort_param);
    let loader = BundleLoader::new(
        PageDrainer::new(PageRequest::for_page(1, page_size)),
        fetcher,
        BundleAssembler::from_config(&config.bundle),
    );

    let bundle = loader
        .load::<StixObject>()
        .await
        .map_err(|e| format!("Export failed: {}", e))?
        .ok_or_else(|| "Export cancelled".to_string())?;

    bundle
        .write_to_dir(&args.out)
        .map_err(|e| format!("Failed to write bundle: {}", e))
}
