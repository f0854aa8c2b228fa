//! Simulated page views.

use std::collections::BTreeMap;

use anyhow::{bail, Context as _, Result};
use serde::Serialize;
use shelf_api::ShelfApi;
use shelf_core::{SlotId, VariantId};
use shelf_store::Store;

use super::SelectArgs;
use crate::context::Context;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Share {
    slot_id: SlotId,
    variant_id: VariantId,
    title: String,
    weight: u32,
    picks: usize,
    share: f64,
}

/// Run the select command.
pub async fn run(args: SelectArgs, ctx: &Context) -> Result<()> {
    if args.draws == 0 {
        bail!("--draws must be at least 1");
    }

    let shelf = ctx.open_store()?;
    let mut api = ShelfApi::new(shelf.store.clone()).with_logger(ctx.logger("api"));
    if let Some(seed) = args.seed {
        api = api.with_seed(seed);
    }
    let logger = ctx.logger("select");

    let mut picks: BTreeMap<VariantId, usize> = BTreeMap::new();
    let progress = ctx.output.progress(args.draws as u64, "page views");
    let mut last = Vec::new();
    for _ in 0..args.draws {
        last = api.select_all(&logger).await.context("Selection failed")?;
        for product in &last {
            *picks.entry(product.variant_id.clone()).or_default() += 1;
        }
        progress.inc(1);
    }
    progress.finish_and_clear();

    if args.draws == 1 {
        if ctx.output.is_json() {
            ctx.output.json(&last);
        } else {
            ctx.output.header("Selected products");
            for product in &last {
                ctx.output.kv(product.slot_id.as_str(), &format!("{} ({})", product.title, product.variant_id));
            }
        }
        return Ok(());
    }

    let mut shares = Vec::new();
    for slot in shelf.store.list_active_slots().await? {
        for variant in shelf.store.list_active_variants(&slot.id).await? {
            let count = picks.get(&variant.id).copied().unwrap_or(0);
            shares.push(Share {
                slot_id: slot.id.clone(),
                weight: variant.effective_weight(),
                title: variant.payload.title,
                variant_id: variant.id,
                picks: count,
                share: count as f64 / args.draws as f64 * 100.0,
            });
        }
    }

    if ctx.output.is_json() {
        ctx.output.json(&shares);
        return Ok(());
    }

    ctx.output.header(&format!("Pick distribution over {} page views", args.draws));
    let widths = [12, 14, 28, 7, 8, 8];
    ctx.output.table_row(&["SLOT", "VARIANT", "TITLE", "WEIGHT", "PICKS", "SHARE"], &widths);
    for s in &shares {
        let weight = s.weight.to_string();
        let count = s.picks.to_string();
        let share = format!("{:.1}%", s.share);
        ctx.output.table_row(
            &[
                s.slot_id.as_str(),
                s.variant_id.as_str(),
                s.title.as_str(),
                weight.as_str(),
                count.as_str(),
                share.as_str(),
            ],
            &widths,
        );
    }

    Ok(())
}
