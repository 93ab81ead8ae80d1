//! CLI command implementations.

pub mod cache;
pub mod config;
pub mod fetch;
pub mod probe;
pub mod watch;

use clap::{Args, Subcommand};

/// Arguments for the fetch command.
#[derive(Args)]
pub struct FetchArgs {
    /// URL to resolve (relative URLs belong to the configured origin).
    pub url: String,

    /// HTTP method.
    #[arg(short = 'X', long, default_value = "GET")]
    pub method: String,

    /// Force cache-first resolution regardless of connection quality.
    #[arg(long)]
    pub cache_first: bool,

    /// Probe the connection before resolving.
    #[arg(long)]
    pub probe_first: bool,

    /// Print the response body.
    #[arg(long)]
    pub show_body: bool,
}

/// Arguments for the watch command.
#[derive(Args)]
pub struct WatchArgs {
    /// Stop after this many seconds (default: run until interrupted).
    #[arg(short, long)]
    pub duration: Option<u64>,
}

/// Arguments for the probe command.
#[derive(Args)]
pub struct ProbeArgs {
    /// Number of probes to run.
    #[arg(short = 'n', long, default_value_t = 1)]
    pub count: u32,
}

/// Arguments for the cache command.
#[derive(Args)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub command: CacheCommand,
}

#[derive(Subcommand)]
pub enum CacheCommand {
    /// List cached entries.
    List,
    /// Show a cached response.
    Show {
        /// URL of the entry (relative URLs belong to the configured origin).
        url: String,
        /// HTTP method of the entry.
        #[arg(short = 'X', long, default_value = "GET")]
        method: String,
    },
    /// Remove every entry in the namespace.
    Clear {
        /// Skip confirmation.
        #[arg(short, long)]
        yes: bool,
    },
}

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration.
    Show,
    /// Create a brownout.toml in the current directory.
    Init {
        /// Origin of the application.
        #[arg(long, default_value = "http://localhost:8080")]
        origin: String,
        /// Overwrite an existing file without asking.
        #[arg(short, long)]
        force: bool,
    },
}
