//! Wipe slots, variants and stats.

use anyhow::{Context as _, Result};
use dialoguer::Confirm;
use shelf_store::AdminStore;

use super::ResetArgs;
use crate::context::Context;

/// Run the reset command.
pub async fn run(args: ResetArgs, ctx: &Context) -> Result<()> {
    if !args.yes {
        let confirmed = Confirm::new()
            .with_prompt("Delete every slot, variant and daily stat? The pool is kept.")
            .default(false)
            .interact()?;

        if !confirmed {
            ctx.output.warn("Reset cancelled");
            return Ok(());
        }
    }

    let shelf = ctx.open_store()?;
    let counts = shelf.store.reset_all().await.context("Reset failed")?;
    shelf.persist()?;

    if ctx.output.is_json() {
        ctx.output.json(&counts);
        return Ok(());
    }

    ctx.output.success("Data reset");
    ctx.output.kv("Slots deleted", &counts.slots_deleted.to_string());
    ctx.output.kv("Variants deleted", &counts.variants_deleted.to_string());
    ctx.output.kv("Stats deleted", &counts.stats_deleted.to_string());
    Ok(())
}
