//! Storage contracts consumed by the engine and the request path.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;
use shelf_core::{
    Counter, DailyStat, PoolItem, ProductPayload, Slot, SlotId, Variant, VariantId,
};

use crate::StoreError;

/// Operations the analysis cycle and the request path need.
#[async_trait]
pub trait Store: Send + Sync {
    /// Slots currently flagged active, in key order.
    async fn list_active_slots(&self) -> Result<Vec<Slot>, StoreError>;

    /// A slot's active variants, in listing order.
    async fn list_active_variants(&self, slot_id: &SlotId) -> Result<Vec<Variant>, StoreError>;

    /// Daily records for a variant on or after `since`.
    async fn daily_stats(
        &self,
        variant_id: &VariantId,
        since: NaiveDate,
    ) -> Result<Vec<DailyStat>, StoreError>;

    /// Lifetime impressions for a variant.
    async fn total_impressions(&self, variant_id: &VariantId) -> Result<u64, StoreError>;

    /// Overwrite a variant's weight. Fails with `NotFound` for unknown variants.
    async fn set_variant_weight(
        &self,
        slot_id: &SlotId,
        variant_id: &VariantId,
        weight: i32,
    ) -> Result<(), StoreError>;

    /// Soft-delete a variant with a recorded reason.
    async fn deactivate_variant(
        &self,
        slot_id: &SlotId,
        variant_id: &VariantId,
        reason: &str,
    ) -> Result<(), StoreError>;

    /// Up to `n` pool items for a slot, drawn uniformly without replacement.
    async fn draw_random_pool_items(
        &self,
        slot_id: &SlotId,
        n: usize,
    ) -> Result<Vec<PoolItem>, StoreError>;

    /// Remove a pool item and create an active variant from its payload.
    async fn promote_pool_item(
        &self,
        slot_id: &SlotId,
        item: &PoolItem,
    ) -> Result<VariantId, StoreError>;

    /// Count one event against today's record, creating it if needed.
    async fn increment_daily_counter(
        &self,
        variant_id: &VariantId,
        counter: Counter,
    ) -> Result<DailyStat, StoreError>;

    /// Pool size per slot. Every known slot is listed, empty or not.
    async fn pool_counts(&self) -> Result<BTreeMap<SlotId, usize>, StoreError>;
}

/// Rows removed by a bulk reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetCounts {
    pub slots_deleted: usize,
    pub variants_deleted: usize,
    pub stats_deleted: usize,
}

/// Seeding, reporting and maintenance operations.
#[async_trait]
pub trait AdminStore: Store {
    /// Create a slot. Returns `false` if the id was already taken.
    async fn create_slot(&self, slot: Slot) -> Result<bool, StoreError>;

    /// Create an active variant from a payload with a generated id.
    async fn create_variant(
        &self,
        slot_id: &SlotId,
        payload: ProductPayload,
    ) -> Result<Variant, StoreError>;

    /// Store a fully-formed variant. Fails if the id is taken.
    async fn insert_variant(&self, variant: Variant) -> Result<(), StoreError>;

    /// Queue a payload in a slot's pool.
    async fn add_pool_item(
        &self,
        slot_id: &SlotId,
        payload: ProductPayload,
    ) -> Result<PoolItem, StoreError>;

    /// Store a fully-formed pool item. Fails if the id is taken.
    async fn insert_pool_item(&self, item: PoolItem) -> Result<(), StoreError>;

    /// Overwrite one daily record (backfill and imports).
    async fn put_daily_stat(&self, stat: DailyStat) -> Result<(), StoreError>;

    /// Every slot, active or not.
    async fn list_slots(&self) -> Result<Vec<Slot>, StoreError>;

    /// Every variant of a slot, including dropped ones.
    async fn list_all_variants(&self, slot_id: &SlotId) -> Result<Vec<Variant>, StoreError>;

    /// Pool items for one slot, or for all slots.
    async fn list_pool_items(&self, slot_id: Option<&SlotId>) -> Result<Vec<PoolItem>, StoreError>;

    /// Empty every pool. Returns how many items were removed.
    async fn clear_pool(&self) -> Result<usize, StoreError>;

    /// Every daily record of a variant, oldest first.
    async fn all_daily_stats(&self, variant_id: &VariantId) -> Result<Vec<DailyStat>, StoreError>;

    /// Delete all slots, variants and daily stats. The pool is left alone.
    async fn reset_all(&self) -> Result<ResetCounts, StoreError>;
}
