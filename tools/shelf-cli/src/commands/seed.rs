//! Load slots, variants and pool candidates.

use anyhow::{Context as _, Result};
use chrono::Utc;
use serde_json::json;
use shelf_core::seed::{PoolSeed, ProductSeed};
use shelf_core::Slot;
use shelf_store::AdminStore;

use super::{SeedArgs, SeedCommand};
use crate::context::Context;

/// Run the seed command.
pub async fn run(args: SeedArgs, ctx: &Context) -> Result<()> {
    match args.command {
        SeedCommand::Products { file } => seed_products(&file, ctx).await,
        SeedCommand::Pool { file, clear } => seed_pool(&file, clear, ctx).await,
    }
}

fn read_file(path: &str, ctx: &Context) -> Result<Vec<u8>> {
    let path = ctx.resolve_path(path);
    std::fs::read(&path).with_context(|| format!("Failed to read seed file: {}", path.display()))
}

async fn seed_products(file: &str, ctx: &Context) -> Result<()> {
    let seed = ProductSeed::parse(&read_file(file, ctx)?).context("Invalid product seed")?;
    let shelf = ctx.open_store()?;
    let store = &*shelf.store;

    let mut slots_created = 0;
    let mut variants_created = 0;
    for entry in seed.products {
        let slot = Slot::new(entry.slot_id.clone(), entry.slot_name.clone(), Utc::now());
        if store.create_slot(slot).await? {
            slots_created += 1;
        } else {
            ctx.output
                .warn(&format!("Slot {} already exists, adding variants to it", entry.slot_id));
        }

        for payload in entry.variants {
            let variant = store.create_variant(&entry.slot_id, payload).await?;
            ctx.output.debug(&format!("{} -> {}", variant.id, variant.payload.title));
            variants_created += 1;
        }
    }
    shelf.persist()?;

    if ctx.output.is_json() {
        ctx.output.json(&json!({
            "slotsCreated": slots_created,
            "variantsCreated": variants_created,
        }));
    } else {
        ctx.output.success(&format!(
            "Seeded {} slot(s) with {} variant(s)",
            slots_created, variants_created
        ));
    }
    Ok(())
}

async fn seed_pool(file: &str, clear: bool, ctx: &Context) -> Result<()> {
    let seed = PoolSeed::parse(&read_file(file, ctx)?).context("Invalid pool seed")?;
    let shelf = ctx.open_store()?;
    let store = &*shelf.store;

    let mut cleared = 0;
    if clear || seed.clear_existing {
        cleared = store.clear_pool().await?;
        ctx.output.info(&format!("Cleared {} pool item(s)", cleared));
    }

    let (accepted, skipped) = seed.partition();
    for entry in &skipped {
        ctx.output
            .warn(&format!("Skipping products[{}]: {}", entry.index, entry.reason));
    }

    let mut added = 0;
    for entry in accepted {
        store.add_pool_item(&entry.slot_id, entry.payload).await?;
        added += 1;
    }
    shelf.persist()?;

    if ctx.output.is_json() {
        ctx.output.json(&json!({
            "cleared": cleared,
            "added": added,
            "skipped": skipped,
        }));
    } else {
        ctx.output.success(&format!("Added {} item(s) to the pool", added));
    }
    Ok(())
}
