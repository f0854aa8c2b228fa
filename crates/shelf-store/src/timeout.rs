//! Time budgets for store and notification calls.

use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use shelf_core::{Counter, DailyStat, PoolItem, ProductPayload, Slot, SlotId, Variant, VariantId};

use crate::store::{AdminStore, ResetCounts, Store};
use crate::StoreError;

/// Per-call time budgets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Budget for a single store call.
    #[serde(with = "millis")]
    pub store: Duration,
    /// Budget for delivering one notification.
    #[serde(with = "millis")]
    pub notify: Duration,
}

impl TimeoutConfig {
    pub fn new(store: Duration, notify: Duration) -> Self {
        Self { store, notify }
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            store: Duration::from_secs(2),
            notify: Duration::from_secs(10),
        }
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}

/// Run `fut`, failing with [`StoreError::Timeout`] once `limit` elapses.
pub async fn with_timeout<T, F>(limit: Duration, op: &'static str, fut: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout { op, limit }),
    }
}

/// Wraps a store so every call is bounded by [`TimeoutConfig::store`].
pub struct TimedStore<S> {
    inner: S,
    limit: Duration,
}

impl<S> TimedStore<S> {
    pub fn new(inner: S, timeouts: TimeoutConfig) -> Self {
        Self {
            inner,
            limit: timeouts.store,
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn limit(&self) -> Duration {
        self.limit
    }
}

#[async_trait]
impl<S: Store> Store for TimedStore<S> {
    async fn list_active_slots(&self) -> Result<Vec<Slot>, StoreError> {
        with_timeout(self.limit, "list_active_slots", self.inner.list_active_slots()).await
    }

    async fn list_active_variants(&self, slot_id: &SlotId) -> Result<Vec<Variant>, StoreError> {
        with_timeout(self.limit, "list_active_variants", self.inner.list_active_variants(slot_id)).await
    }

    async fn daily_stats(
        &self,
        variant_id: &VariantId,
        since: NaiveDate,
    ) -> Result<Vec<DailyStat>, StoreError> {
        with_timeout(self.limit, "daily_stats", self.inner.daily_stats(variant_id, since)).await
    }

    async fn total_impressions(&self, variant_id: &VariantId) -> Result<u64, StoreError> {
        with_timeout(self.limit, "total_impressions", self.inner.total_impressions(variant_id)).await
    }

    async fn set_variant_weight(
        &self,
        slot_id: &SlotId,
        variant_id: &VariantId,
        weight: i32,
    ) -> Result<(), StoreError> {
        with_timeout(
            self.limit,
            "set_variant_weight",
            self.inner.set_variant_weight(slot_id, variant_id, weight),
        )
        .await
    }

    async fn deactivate_variant(
        &self,
        slot_id: &SlotId,
        variant_id: &VariantId,
        reason: &str,
    ) -> Result<(), StoreError> {
        with_timeout(
            self.limit,
            "deactivate_variant",
            self.inner.deactivate_variant(slot_id, variant_id, reason),
        )
        .await
    }

    async fn draw_random_pool_items(
        &self,
        slot_id: &SlotId,
        n: usize,
    ) -> Result<Vec<PoolItem>, StoreError> {
        with_timeout(self.limit, "draw_random_pool_items", self.inner.draw_random_pool_items(slot_id, n)).await
    }

    async fn promote_pool_item(
        &self,
        slot_id: &SlotId,
        item: &PoolItem,
    ) -> Result<VariantId, StoreError> {
        with_timeout(self.limit, "promote_pool_item", self.inner.promote_pool_item(slot_id, item)).await
    }

    async fn increment_daily_counter(
        &self,
        variant_id: &VariantId,
        counter: Counter,
    ) -> Result<DailyStat, StoreError> {
        with_timeout(
            self.limit,
            "increment_daily_counter",
            self.inner.increment_daily_counter(variant_id, counter),
        )
        .await
    }

    async fn pool_counts(&self) -> Result<BTreeMap<SlotId, usize>, StoreError> {
        with_timeout(self.limit, "pool_counts", self.inner.pool_counts()).await
    }
}

#[async_trait]
impl<S: AdminStore> AdminStore for TimedStore<S> {
    async fn create_slot(&self, slot: Slot) -> Result<bool, StoreError> {
        with_timeout(self.limit, "create_slot", self.inner.create_slot(slot)).await
    }

    async fn create_variant(
        &self,
        slot_id: &SlotId,
        payload: ProductPayload,
    ) -> Result<Variant, StoreError> {
        with_timeout(self.limit, "create_variant", self.inner.create_variant(slot_id, payload)).await
    }

    async fn insert_variant(&self, variant: Variant) -> Result<(), StoreError> {
        with_timeout(self.limit, "insert_variant", self.inner.insert_variant(variant)).await
    }

    async fn add_pool_item(
        &self,
        slot_id: &SlotId,
        payload: ProductPayload,
    ) -> Result<PoolItem, StoreError> {
        with_timeout(self.limit, "add_pool_item", self.inner.add_pool_item(slot_id, payload)).await
    }

    async fn insert_pool_item(&self, item: PoolItem) -> Result<(), StoreError> {
        with_timeout(self.limit, "insert_pool_item", self.inner.insert_pool_item(item)).await
    }

    async fn put_daily_stat(&self, stat: DailyStat) -> Result<(), StoreError> {
        with_timeout(self.limit, "put_daily_stat", self.inner.put_daily_stat(stat)).await
    }

    async fn list_slots(&self) -> Result<Vec<Slot>, StoreError> {
        with_timeout(self.limit, "list_slots", self.inner.list_slots()).await
    }

    async fn list_all_variants(&self, slot_id: &SlotId) -> Result<Vec<Variant>, StoreError> {
        with_timeout(self.limit, "list_all_variants", self.inner.list_all_variants(slot_id)).await
    }

    async fn list_pool_items(&self, slot_id: Option<&SlotId>) -> Result<Vec<PoolItem>, StoreError> {
        with_timeout(self.limit, "list_pool_items", self.inner.list_pool_items(slot_id)).await
    }

    async fn clear_pool(&self) -> Result<usize, StoreError> {
        with_timeout(self.limit, "clear_pool", self.inner.clear_pool()).await
    }

    async fn all_daily_stats(&self, variant_id: &VariantId) -> Result<Vec<DailyStat>, StoreError> {
        with_timeout(self.limit, "all_daily_stats", self.inner.all_daily_stats(variant_id)).await
    }

    async fn reset_all(&self) -> Result<ResetCounts, StoreError> {
        with_timeout(self.limit, "reset_all", self.inner.reset_all()).await
    }
}
