//! Stats and pool reports.

use anyhow::{Context as _, Result};
use chrono::Utc;
use shelf_api::reports::{pool_report, stats_report};

use super::{PoolArgs, StatsArgs};
use crate::context::Context;
use crate::output::status_badge;

/// Run the stats command.
pub async fn stats(args: StatsArgs, ctx: &Context) -> Result<()> {
    let shelf = ctx.open_store()?;
    let mut report = stats_report(&*shelf.store, Utc::now())
        .await
        .context("Failed to build stats report")?;

    if let Some(slot) = &args.slot {
        report.stats.retain(|s| s.slot_id.as_str() == slot);
        report.total_variants = report.stats.len();
        report.total_products = usize::from(!report.stats.is_empty());
    }

    if ctx.output.is_json() {
        ctx.output.json(&report);
        return Ok(());
    }

    ctx.output.header(&format!(
        "{} variant(s) across {} slot(s)",
        report.total_variants, report.total_products
    ));

    let widths = [12, 28, 8, 7, 12, 8, 8];
    let mut current_slot = None;
    for s in &report.stats {
        if current_slot != Some(&s.slot_id) {
            ctx.output.info("");
            ctx.output.info(&format!("{} ({})", s.slot_name, s.slot_id));
            ctx.output.table_row(
                &["VARIANT", "TITLE", "STATUS", "WEIGHT", "IMPRESSIONS", "CLICKS", "CTR"],
                &widths,
            );
            current_slot = Some(&s.slot_id);
        }

        let impressions = s.total_impressions.to_string();
        let clicks = s.total_clicks.to_string();
        let weight = s.weight.to_string();
        let status = status_badge(s.is_active);
        let ctr = format!("{}%", s.overall_ctr);
        ctx.output.table_row(
            &[
                s.variant_id.as_str(),
                s.title.as_str(),
                status.as_str(),
                weight.as_str(),
                impressions.as_str(),
                clicks.as_str(),
                ctr.as_str(),
            ],
            &widths,
        );

        if let Some(reason) = &s.drop_reason {
            ctx.output.kv("dropped", reason);
        }
        if args.daily {
            for day in &s.daily_stats {
                ctx.output.kv(
                    &day.date.to_string(),
                    &format!("{} / {} ({:.2}%)", day.clicks, day.impressions, day.ctr),
                );
            }
        }
    }

    Ok(())
}

/// Run the pool command.
pub async fn pool(args: PoolArgs, ctx: &Context) -> Result<()> {
    let shelf = ctx.open_store()?;
    let mut report = pool_report(&*shelf.store)
        .await
        .context("Failed to build pool report")?;

    if let Some(slot) = &args.slot {
        report.items_by_slot.retain(|id, _| id.as_str() == slot);
        report.counts_by_slot.retain(|id, _| id.as_str() == slot);
        report.total_items = report.items_by_slot.values().map(Vec::len).sum();
    }

    if ctx.output.is_json() {
        ctx.output.json(&report);
        return Ok(());
    }

    ctx.output.header(&format!("{} item(s) in the pool", report.total_items));
    for (slot, count) in &report.counts_by_slot {
        ctx.output.info("");
        ctx.output.info(&format!("{} ({} waiting)", slot, count));
        for item in report.items_by_slot.get(slot).into_iter().flatten() {
            ctx.output.list_item(&format!("{} [{}]", item.payload.title, item.pool_id));
        }
    }

    Ok(())
}
