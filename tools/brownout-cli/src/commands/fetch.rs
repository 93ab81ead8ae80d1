//! Resolve a single request through the engine.

use std::time::Instant;

use anyhow::{anyhow, Context as _, Result};
use brownout_sdk::brownout_cache::ExplainHeaders;
use brownout_sdk::brownout_core::{FetchRequest, Method};
use serde_json::json;

use super::FetchArgs;
use crate::context::Context;
use crate::output::{format_bytes, status_badge};

/// Run the fetch command.
pub async fn run(args: FetchArgs, ctx: &Context) -> Result<()> {
    let method = Method::parse(&args.method)
        .ok_or_else(|| anyhow!("Unsupported HTTP method: {}", args.method))?;

    let engine = ctx.start_engine().await?;
    if args.cache_first {
        engine.enable_cache_first();
        ctx.output.debug("cache-first override enabled");
    }
    if args.probe_first {
        let status = engine.refresh().await.context("Failed to probe connection")?;
        if let Some(status) = status {
            ctx.output.debug(&format!("connection is {}", status.mode));
        }
    }

    let spinner = ctx.output.spinner(&format!("Resolving {}", args.url));
    let started = Instant::now();
    let result = engine
        .resolve_request(FetchRequest::new(method, args.url.clone()))
        .await;
    let elapsed = started.elapsed();
    spinner.finish_and_clear();

    let network = engine.network_status();
    let metrics = engine.metrics();
    engine.shutdown().await;

    let resolution = result.with_context(|| format!("Failed to resolve {}", args.url))?;
    let stored_at = ExplainHeaders::from_response(&resolution.response)
        .and_then(|explain| explain.stored_at);
    let response = &resolution.response;

    if ctx.output.is_json() {
        let mut value = json!({
            "url": args.url,
            "status": response.status,
            "source": resolution.source,
            "mode": resolution.mode.as_str(),
            "key": resolution.key.as_ref().map(|k| k.as_str()),
            "bytes": response.body.len(),
            "elapsed_ms": elapsed.as_millis() as u64,
            "stored_at": stored_at,
            "network": network,
            "metrics": metrics,
        });
        if args.show_body {
            value["body"] = json!(response.text());
        }
        ctx.output.json(&value);
        return Ok(());
    }

    ctx.output.header(&format!("{} {}", method, args.url));
    ctx.output.kv("status", &response.status.to_string());
    ctx.output.kv("source", &status_badge(resolution.source.as_str()));
    ctx.output.kv("mode", resolution.mode.as_str());
    ctx.output.kv("connection", &status_badge(network.classification.as_str()));
    ctx.output.kv("size", &format_bytes(response.body.len() as u64));
    ctx.output.kv("elapsed", &format!("{}ms", elapsed.as_millis()));
    if let Some(at) = stored_at {
        ctx.output.kv("stored at", &at.to_rfc3339());
    }
    if let Some(key) = &resolution.key {
        ctx.output.debug(&format!("cache key: {}", key));
    }

    if args.show_body {
        ctx.output.raw("");
        ctx.output.raw(&response.text());
    }

    if ctx.output.is_verbose() {
        ctx.output.raw("");
        ctx.output.raw(&metrics.to_summary());
    }

    Ok(())
}
