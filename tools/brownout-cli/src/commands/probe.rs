//! Run quality probes against the configured origin.

use anyhow::{bail, Context as _, Result};
use brownout_sdk::brownout_data::HttpTransport;
use brownout_sdk::brownout_monitor::{Probe, ProbeOutcome, TransportProbe};
use serde_json::json;

use super::ProbeArgs;
use crate::context::Context;
use crate::output::status_badge;

/// Run the probe command.
pub async fn run(args: ProbeArgs, ctx: &Context) -> Result<()> {
    if args.count == 0 {
        bail!("--count must be at least 1");
    }

    let config = &ctx.config.engine;
    let transport =
        HttpTransport::new(config.probe_timeout()).context("Failed to create HTTP transport")?;
    let probe = TransportProbe::from_config(transport, config);

    ctx.output.header(&format!("Probing {}", probe.url()));
    ctx.output.debug(&format!(
        "timeout {}ms, latency ceiling {}ms",
        config.probe_timeout_ms, config.probe_latency_ceiling_ms
    ));

    for n in 1..=args.count {
        let spinner = ctx.output.spinner("Waiting for probe");
        let report = probe.probe().await;
        spinner.finish_and_clear();

        let classification = report.classification();
        if ctx.output.is_json() {
            ctx.output.json_line(&json!({
                "probe": n,
                "url": probe.url(),
                "report": report,
                "classification": classification,
            }));
            continue;
        }

        let outcome = match &report.outcome {
            ProbeOutcome::Responsive => "responsive".to_string(),
            ProbeOutcome::Sluggish => "sluggish".to_string(),
            ProbeOutcome::TimedOut => "timed out".to_string(),
            ProbeOutcome::Failed(reason) => format!("failed: {}", reason),
        };
        ctx.output.kv(
            &format!("#{}", n),
            &format!(
                "{} in {}ms → {}",
                outcome,
                report.latency.as_millis(),
                status_badge(classification.as_str())
            ),
        );
    }

    Ok(())
}
