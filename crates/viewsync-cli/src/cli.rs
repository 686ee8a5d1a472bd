//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "viewsync",
    version,
    about = "Drive list view state and export drained collections as bundles"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Log at debug level (ignored when RUST_LOG is set).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file (default: <config dir>/viewsync/config.toml).
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Decode a query string and print its canonical form and view state.
    Query(QueryArgs),

    /// Hydrate a view from a query string, apply changes, print the new URL.
    Update(UpdateArgs),

    /// Drain a directory of page responses into a bundle file.
    Export(ExportArgs),
}

#[derive(Parser)]
pub struct QueryArgs {
    /// Query string, with or without the leading `?`.
    #[arg(value_name = "QUERY", default_value = "")]
    pub query: String,

    /// Default sort field of the view.
    #[arg(long = "sort-field", value_name = "FIELD")]
    pub sort_field: Option<String>,
}

#[derive(Parser)]
pub struct UpdateArgs {
    /// Query string the view is opened with.
    #[arg(value_name = "QUERY", default_value = "")]
    pub query: String,

    /// Default sort field of the view.
    #[arg(long = "sort-field", value_name = "FIELD")]
    pub sort_field: Option<String>,

    /// New filter text.
    #[arg(long)]
    pub filter: Option<String>,

    /// Toggle sorting on this field.
    #[arg(long = "sort", value_name = "FIELD")]
    pub sort: Option<String>,

    /// Go to this (0-based) page.
    #[arg(long)]
    pub page: Option<u32>,

    /// Set an extra parameter, `key=value`. Empty value removes it.
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub set: Vec<String>,
}

#[derive(Parser)]
pub struct ExportArgs {
    /// Directory holding `page-1.json`, `page-2.json`, ...
    #[arg(long, value_name = "DIR")]
    pub pages: PathBuf,

    /// Directory the bundle is written into.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub out: PathBuf,

    /// Key holding the items in each page.
    #[arg(long = "items-key", default_value = "objects")]
    pub items_key: String,

    /// Pages use the `{ results, count }` shape instead.
    #[arg(long)]
    pub counted: bool,

    /// Requested page size (overrides config).
    #[arg(long = "page-size")]
    pub page_size: Option<u32>,
}
