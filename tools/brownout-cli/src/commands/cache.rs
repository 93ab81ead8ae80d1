//! Inspect the persistent response cache.

use anyhow::{anyhow, bail, Context as _, Result};
use brownout_sdk::brownout_cache::{CacheStore, RequestKey};
use brownout_sdk::brownout_core::{FetchRequest, Method};
use dialoguer::Confirm;
use serde_json::json;

use super::{CacheArgs, CacheCommand};
use crate::context::Context;
use crate::output::{format_bytes, format_duration};

/// Run the cache command.
pub async fn run(args: CacheArgs, ctx: &Context) -> Result<()> {
    let store = ctx.open_store().await?;
    match args.command {
        CacheCommand::List => list_entries(store.as_ref(), ctx).await,
        CacheCommand::Show { url, method } => show_entry(store.as_ref(), &url, &method, ctx).await,
        CacheCommand::Clear { yes } => clear_entries(store.as_ref(), yes, ctx).await,
    }
}

async fn list_entries(store: &dyn CacheStore, ctx: &Context) -> Result<()> {
    let keys = store.keys().await.context("Failed to read cache")?;

    let mut rows = Vec::with_capacity(keys.len());
    for key in keys {
        // Entries can disappear between listing and reading.
        if let Some(entry) = store.get(&key).await.context("Failed to read cache entry")? {
            rows.push((key, entry));
        }
    }

    if ctx.output.is_json() {
        let entries: Vec<_> = rows
            .iter()
            .map(|(key, entry)| {
                json!({
                    "key": key,
                    "status": entry.status,
                    "bytes": entry.body.len(),
                    "stored_at": entry.stored_at,
                })
            })
            .collect();
        ctx.output.json(&json!({
            "namespace": store.namespace(),
            "entries": entries,
        }));
        return Ok(());
    }

    ctx.output.header(&format!("Cache {}", store.namespace()));
    if rows.is_empty() {
        ctx.output.info("No cached responses");
        return Ok(());
    }

    ctx.output.table_row(&["STATUS", "SIZE", "AGE", "KEY"], &[6, 10, 8, 0]);
    for (key, entry) in &rows {
        let status = entry.status.to_string();
        let size = format_bytes(entry.body.len() as u64);
        let age = format_duration(entry.age().num_seconds().max(0) as u64);
        ctx.output.table_row(
            &[status.as_str(), size.as_str(), age.as_str(), key.as_str()],
            &[6, 10, 8, 0],
        );
    }
    ctx.output.info(&format!("{} entries", rows.len()));

    Ok(())
}

async fn show_entry(store: &dyn CacheStore, url: &str, method: &str, ctx: &Context) -> Result<()> {
    let method = Method::parse(method).ok_or_else(|| anyhow!("Unsupported HTTP method: {}", method))?;
    let key = RequestKey::from_request(&FetchRequest::new(method, url), &ctx.config.engine.origin)
        .with_context(|| format!("Invalid URL: {}", url))?;

    let Some(entry) = store.get(&key).await.context("Failed to read cache entry")? else {
        bail!("No cached response for {}", key);
    };

    if ctx.output.is_json() {
        ctx.output.json(&json!({
            "key": key,
            "entry": entry,
        }));
        return Ok(());
    }

    ctx.output.header(key.as_str());
    ctx.output.kv("status", &entry.status.to_string());
    ctx.output.kv("stored at", &entry.stored_at.to_rfc3339());
    ctx.output.kv("size", &format_bytes(entry.body.len() as u64));
    for (name, value) in &entry.headers {
        ctx.output.kv(name, value);
    }

    ctx.output.raw("");
    ctx.output.raw(&String::from_utf8_lossy(&entry.body));

    Ok(())
}

async fn clear_entries(store: &dyn CacheStore, yes: bool, ctx: &Context) -> Result<()> {
    let count = store.keys().await.context("Failed to read cache")?.len();
    if count == 0 {
        ctx.output.info("Cache is already empty");
        return Ok(());
    }

    if !yes {
        if ctx.output.is_json() {
            bail!("Refusing to clear the cache without --yes in JSON mode");
        }
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Remove {} cached responses from {}?",
                count,
                store.namespace()
            ))
            .default(false)
            .interact()?;

        if !confirmed {
            ctx.output.info("Cancelled");
            return Ok(());
        }
    }

    store.clear().await.context("Failed to clear cache")?;

    if ctx.output.is_json() {
        ctx.output.json(&json!({ "cleared": count }));
    } else {
        ctx.output.success(&format!("Removed {} cached responses", count));
    }

    Ok(())
}
