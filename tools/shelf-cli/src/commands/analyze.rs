//! Run the analysis cycle once.

use std::sync::Arc;

use anyhow::{Context as _, Result};
use async_trait::async_trait;
use shelf_core::{RunId, SystemClock};
use shelf_engine::{AnalysisCycle, CycleReport, FileNotifier, LogNotifier, Notifier, NotifyError};
use shelf_observability::LogLevel;

use super::AnalyzeArgs;
use crate::context::Context;
use crate::output::format_pct;

/// Swallows reports when delivery is turned off.
struct Muted;

#[async_trait]
impl Notifier for Muted {
    async fn notify(&self, _report: &CycleReport) -> Result<(), NotifyError> {
        Ok(())
    }

    async fn notify_failure(&self, _run_id: &RunId, _error: &str) -> Result<(), NotifyError> {
        Ok(())
    }
}

/// Run the analyze command.
pub async fn run(args: AnalyzeArgs, ctx: &Context) -> Result<()> {
    let mut settings = ctx
        .config
        .analysis
        .clone()
        .with_env_overrides()
        .context("Invalid analysis settings")?;
    if args.always_notify {
        settings.notify_only_on_change = false;
    }

    let delivering = !args.no_notify && ctx.config.notify.enabled;
    let notifier: Arc<dyn Notifier> = if !delivering {
        Arc::new(Muted)
    } else if let Some(dir) = ctx.report_dir() {
        ctx.output.debug(&format!("Writing reports to {}", dir.display()));
        Arc::new(FileNotifier::new(dir))
    } else {
        Arc::new(LogNotifier::new(ctx.logger("notify").with_min_level(LogLevel::Info)))
    };

    let shelf = ctx.open_store()?;
    let cycle = AnalysisCycle::new(shelf.store.clone(), Arc::new(SystemClock), settings)
        .with_notifier(notifier)
        .with_logger(ctx.logger("cycle"))
        .with_timeouts(ctx.config.timeouts());

    let spinner = ctx.output.spinner("Analyzing variants...");
    let result = cycle.run().await;
    spinner.finish_and_clear();

    // Drops and promotions applied before a failure are already in the store.
    shelf.persist()?;
    let outcome = result.context("Variant analysis failed")?;
    let report = &outcome.report;

    if ctx.output.is_json() {
        ctx.output.json(report);
        return Ok(());
    }

    ctx.output.header(&report.subject());
    ctx.output.kv("Run", report.run_id.as_str());
    ctx.output.kv("Date", &report.date.to_string());
    ctx.output.kv("Impressions", &report.total_impressions.to_string());
    ctx.output.kv("Clicks", &report.total_clicks.to_string());
    ctx.output.kv("CTR", &format_pct(report.ctr()));
    ctx.output.debug(&outcome.metrics.to_summary());

    if !report.dropped.is_empty() {
        ctx.output.info("");
        ctx.output.info("Dropped:");
        for entry in &report.dropped {
            ctx.output.list_item(&format!("{} / {}: {}", entry.slot_name, entry.title, entry.reason));
        }
    }

    if !report.promoted.is_empty() {
        ctx.output.info("");
        ctx.output.info("Promoted:");
        for entry in &report.promoted {
            ctx.output.list_item(&format!("{} / {}", entry.slot_name, entry.title));
        }
    }

    ctx.output.info("");
    ctx.output.info("Pool:");
    for (slot, count) in &report.pool_counts_by_slot {
        ctx.output.kv(slot.as_str(), &count.to_string());
    }

    if !delivering {
        ctx.output.debug("Report delivery is off");
    } else if outcome.notified {
        ctx.output.success("Report delivered");
    } else if report.has_changes() {
        ctx.output.warn("Report was not delivered");
    }

    Ok(())
}
