//! Brownout CLI - Command line tool for the adaptive fetch resolution engine.
//!
//! Commands:
//! - `brownout fetch` - Resolve a URL through the engine
//! - `brownout watch` - Follow connectivity status changes
//! - `brownout probe` - Run a single quality probe
//! - `brownout cache` - Inspect or clear the persistent cache
//! - `brownout config` - Manage configuration

mod commands;
mod config;
mod context;
mod output;

use anyhow::Result;
use brownout_sdk::brownout_observability::{init_logging, LogLevel};
use clap::{Parser, Subcommand};

use commands::{CacheArgs, ConfigArgs, FetchArgs, ProbeArgs, WatchArgs};

/// Brownout CLI - Resolve requests under degraded connectivity
#[derive(Parser)]
#[command(name = "brownout")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use JSON output format
    #[arg(long, global = true)]
    json: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a URL through cache and network
    Fetch(FetchArgs),

    /// Print connectivity status changes as they happen
    Watch(WatchArgs),

    /// Probe the origin once and classify the connection
    Probe(ProbeArgs),

    /// Inspect the persistent response cache
    Cache(CacheArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let output = output::Output::new(cli.verbose, cli.json);

    let config_path = cli.config.as_deref();
    let ctx = match context::Context::load(config_path, output.clone()) {
        Ok(ctx) => ctx,
        Err(e) => {
            output.error(&format!("{:#}", e));
            std::process::exit(1);
        }
    };

    let level = if cli.verbose {
        LogLevel::from_verbosity(true)
    } else {
        ctx.config.logging.level
    };
    if let Err(e) = init_logging(ctx.config.logging.format, level) {
        ctx.output.warn(&format!("logging disabled: {}", e));
    }

    let result = match cli.command {
        Commands::Fetch(args) => commands::fetch::run(args, &ctx).await,
        Commands::Watch(args) => commands::watch::run(args, &ctx).await,
        Commands::Probe(args) => commands::probe::run(args, &ctx).await,
        Commands::Cache(args) => commands::cache::run(args, &ctx).await,
        Commands::Config(args) => commands::config::run(args, &ctx).await,
    };

    if let Err(e) = result {
        ctx.output.error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
