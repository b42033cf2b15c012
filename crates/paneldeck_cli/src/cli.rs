//! CLI argument definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "paneldeck",
    version,
    about = "Render and inspect master-detail dashboards from a manifest"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long = "log-level", global = true)]
    pub log_level: Option<String>,

    /// Write rolling log files to this absolute directory instead of stderr.
    #[arg(long = "log-dir", value_name = "DIR", global = true)]
    pub log_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Render the page skeleton of a manifest as HTML.
    Render(RenderArgs),

    /// Serve the content of one tab as a tab-fetch JSON envelope.
    TabContent(TabContentArgs),

    /// Parse a location fragment for a context namespace.
    Parse(ParseArgs),

    /// Probe core linkage.
    Ping,

    /// Print the core version.
    Version,
}

#[derive(Parser)]
pub struct RenderArgs {
    /// Dashboard manifest (JSON).
    #[arg(long = "manifest", value_name = "FILE")]
    pub manifest: PathBuf,

    /// Location fragment to render, e.g. `#customer-42&tab=membership`.
    #[arg(long = "fragment")]
    pub fragment: Option<String>,
}

#[derive(Parser)]
pub struct TabContentArgs {
    /// Dashboard manifest (JSON).
    #[arg(long = "manifest", value_name = "FILE")]
    pub manifest: PathBuf,

    /// Tab id to serve.
    #[arg(long = "tab")]
    pub tab: String,

    /// Detail record the tab belongs to.
    #[arg(long = "detail")]
    pub detail: Option<u64>,
}

#[derive(Parser)]
pub struct ParseArgs {
    /// Deep-link namespace of the context.
    #[arg(long = "context")]
    pub context: String,

    /// Fragment to parse, with or without the leading `#`.
    #[arg(value_name = "FRAGMENT", allow_hyphen_values = true)]
    pub fragment: String,
}
