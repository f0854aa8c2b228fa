//! Topping slots up from the pool.

use shelf_core::{AnalysisSettings, PoolId, SlotId, VariantId};
use shelf_store::{Store, StoreError};

/// A pool item that became an active variant.
#[derive(Debug, Clone, PartialEq)]
pub struct Promotion {
    pub slot_id: SlotId,
    pub pool_id: PoolId,
    pub variant_id: VariantId,
    pub title: String,
}

/// How many pool items a slot with `active_count` variants should receive.
pub fn needed(active_count: usize, settings: &AnalysisSettings) -> usize {
    settings.target_variants_per_slot.saturating_sub(active_count)
}

/// Promote random pool items until the slot reaches its target count.
///
/// An exhausted pool promotes what it has and is not an error.
pub async fn top_up<S: Store + ?Sized>(
    store: &S,
    slot_id: &SlotId,
    active_count: usize,
    settings: &AnalysisSettings,
) -> Result<Vec<Promotion>, StoreError> {
    let needed = needed(active_count, settings);
    if needed == 0 {
        return Ok(Vec::new());
    }

    let items = store.draw_random_pool_items(slot_id, needed).await?;
    let mut promotions = Vec::with_capacity(items.len());
    for item in items {
        let variant_id = store.promote_pool_item(slot_id, &item).await?;
        promotions.push(Promotion {
            slot_id: slot_id.clone(),
            pool_id: item.pool_id,
            variant_id,
            title: item.payload.title,
        });
    }
    Ok(promotions)
}
