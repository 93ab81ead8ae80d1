//! Configuration management commands.

use std::fs;

use anyhow::{Context as _, Result};
use brownout_sdk::brownout_core::Origin;
use dialoguer::Confirm;

use super::{ConfigArgs, ConfigCommand};
use crate::config::generate_default_config;
use crate::context::{Context, CONFIG_NAMES};

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => show_config(ctx),
        ConfigCommand::Init { origin, force } => init_config(&origin, force, ctx),
    }
}

fn show_config(ctx: &Context) -> Result<()> {
    if ctx.output.is_json() {
        ctx.output.json(&ctx.config);
        return Ok(());
    }

    ctx.output.header("Current Configuration");
    match &ctx.config_path {
        Some(path) => ctx.output.info(&format!("Loaded from {}", path.display())),
        None => ctx.output.info("No config file found, using defaults"),
    }

    let engine = &ctx.config.engine;
    ctx.output.raw("");
    ctx.output.raw("[engine]");
    ctx.output.kv("origin", &engine.origin.to_string());
    ctx.output.kv("third_party_hosts", &format!("{:?}", engine.third_party_hosts));
    ctx.output.kv("cache_namespace", &engine.cache_namespace);
    ctx.output.kv(
        "cache_dir",
        &engine
            .cache_dir
            .as_ref()
            .map(|d| d.display().to_string())
            .unwrap_or_else(|| "(memory)".to_string()),
    );
    ctx.output.kv("probe_url", &engine.probe_url());
    ctx.output.kv("probe_interval_ms", &engine.probe_interval_ms.to_string());
    ctx.output.kv("probe_timeout_ms", &engine.probe_timeout_ms.to_string());
    ctx.output.kv(
        "probe_latency_ceiling_ms",
        &engine.probe_latency_ceiling_ms.to_string(),
    );
    ctx.output.kv("network_timeout_ms", &engine.network_timeout_ms.to_string());
    ctx.output.kv("good_grace_ms", &engine.good_grace_ms.to_string());
    ctx.output.kv(
        "slow_effective_types",
        &engine.slow_effective_types.join(", "),
    );

    ctx.output.raw("");
    ctx.output.raw("[logging]");
    ctx.output.kv("format", &format!("{:?}", ctx.config.logging.format).to_lowercase());
    ctx.output.kv("level", ctx.config.logging.level.as_str());

    Ok(())
}

fn init_config(origin: &str, force: bool, ctx: &Context) -> Result<()> {
    let origin = Origin::parse(origin).with_context(|| format!("Invalid origin: {}", origin))?;
    let config_path = ctx.cwd.join(CONFIG_NAMES[0]);

    if config_path.exists() && !force {
        let confirmed = Confirm::new()
            .with_prompt(format!("{} already exists. Overwrite?", config_path.display()))
            .default(false)
            .interact()?;

        if !confirmed {
            ctx.output.info("Cancelled");
            return Ok(());
        }
    }

    fs::write(&config_path, generate_default_config(&origin.to_string()))
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    ctx.output.success(&format!("Created: {}", config_path.display()));

    Ok(())
}
