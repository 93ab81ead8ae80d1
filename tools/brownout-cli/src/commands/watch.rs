//! Follow connectivity status changes.

use std::time::Duration;

use anyhow::{Context as _, Result};
use brownout_sdk::brownout_status::StatusValue;
use serde_json::json;

use super::WatchArgs;
use crate::context::Context;
use crate::output::{format_duration, status_badge, Output};

/// Run the watch command.
pub async fn run(args: WatchArgs, ctx: &Context) -> Result<()> {
    let engine = ctx.start_engine().await?;

    let output = ctx.output.clone();
    engine.on_status_change(move |status| print_status(&output, status));

    ctx.output.info(&format!(
        "Watching {} (probe every {})",
        ctx.config.engine.probe_url(),
        format_duration(ctx.config.engine.probe_interval().as_secs())
    ));

    let wait = async {
        match args.duration {
            Some(secs) => {
                tokio::time::sleep(Duration::from_secs(secs)).await;
                Ok(())
            }
            None => std::future::pending::<std::io::Result<()>>().await,
        }
    };

    tokio::select! {
        result = wait => result.context("Watch interrupted")?,
        result = tokio::signal::ctrl_c() => result.context("Failed to listen for Ctrl-C")?,
    }

    let metrics = engine.metrics();
    engine.shutdown().await;

    if ctx.output.is_json() {
        ctx.output.json_line(&json!({ "metrics": metrics }));
    } else {
        ctx.output.raw("");
        ctx.output.raw(&metrics.to_summary());
    }

    Ok(())
}

fn print_status(output: &Output, status: &StatusValue) {
    if output.is_json() {
        output.json_line(status);
        return;
    }

    let mut line = format!(
        "#{} {} {}",
        status.sequence,
        status.published_at.format("%H:%M:%S"),
        status_badge(status.mode.as_str())
    );
    if let Some(grace) = status.retract_after() {
        line.push_str(&format!(" (clears after {}s)", grace.as_secs()));
    }
    output.raw(&line);
}
