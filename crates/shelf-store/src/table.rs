//! Table-style store over a key-value backend.
//!
//! Rows are laid out like partitioned tables:
//!
//! | Key | Row |
//! |---|---|
//! | `slot:{slot}` | [`Slot`] |
//! | `variant:{slot}:{variant}` | [`Variant`] |
//! | `pool:{slot}:{pool}` | [`PoolItem`] |
//! | `stat:{variant}:{yyyy-mm-dd}` | [`DailyStat`] |
//!
//! Stats are keyed by variant alone so they outlive the variant's slot
//! membership. Dates are zero-padded ISO days, so key order is day order.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{de::DeserializeOwned, Serialize};
use shelf_core::{
    Clock, Counter, DailyStat, PoolItem, ProductPayload, Slot, SlotId, SystemClock, Variant,
    VariantId,
};

use crate::kv::{Expect, KvBackend, KvJson, MemoryKv};
use crate::store::{AdminStore, ResetCounts, Store};
use crate::{store_key, StoreError};

/// Maximum retry attempts for optimistic concurrency control.
const MAX_UPDATE_RETRIES: u32 = 8;

const SLOT: &str = "slot";
const VARIANT: &str = "variant";
const POOL: &str = "pool";
const STAT: &str = "stat";

/// [`Store`] implementation over any [`KvBackend`].
pub struct TableStore<K: KvBackend = MemoryKv> {
    kv: Arc<K>,
    clock: Arc<dyn Clock>,
    rng: Mutex<StdRng>,
}

impl TableStore<MemoryKv> {
    /// Unpersisted in-memory store on the system clock.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryKv::new()), Arc::new(SystemClock))
    }
}

impl<K: KvBackend> TableStore<K> {
    /// Create a store with an entropy-seeded pool draw.
    pub fn new(kv: Arc<K>, clock: Arc<dyn Clock>) -> Self {
        Self {
            kv,
            clock,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Create a store whose pool draws are reproducible.
    pub fn with_seed(kv: Arc<K>, clock: Arc<dyn Clock>, seed: u64) -> Self {
        Self {
            kv,
            clock,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// The underlying backend.
    pub fn backend(&self) -> &Arc<K> {
        &self.kv
    }

    /// The clock used for timestamps and "today".
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Read-modify-write a row, retrying when another writer got in first.
    ///
    /// `f` sees `None` when the row does not exist yet.
    fn modify<T, F>(&self, key: &str, mut f: F) -> Result<T, StoreError>
    where
        T: Serialize + DeserializeOwned,
        F: FnMut(Option<T>) -> Result<T, StoreError>,
    {
        for _attempt in 0..MAX_UPDATE_RETRIES {
            let (current, expect) = match self.kv.get_json::<T>(key)? {
                Some((value, version)) => (Some(value), Expect::Version(version)),
                None => (None, Expect::Absent),
            };

            let next = f(current)?;

            match self.kv.put_json(key, &next, expect) {
                Ok(_) => return Ok(next),
                Err(StoreError::ConcurrentModification(_)) => continue,
                Err(e) => return Err(e),
            }
        }

        Err(StoreError::ConcurrentModification(format!(
            "{}: max retries exceeded",
            key
        )))
    }

    fn update_variant<F>(&self, slot_id: &SlotId, variant_id: &VariantId, mut f: F) -> Result<Variant, StoreError>
    where
        F: FnMut(&mut Variant),
    {
        let key = store_key!(VARIANT, slot_id, variant_id);
        self.modify(&key, |current: Option<Variant>| {
            let mut variant = current.ok_or_else(|| StoreError::NotFound(key.clone()))?;
            f(&mut variant);
            Ok(variant)
        })
    }

    fn variants_in(&self, slot_id: &SlotId) -> Result<Vec<Variant>, StoreError> {
        let prefix = store_key!(VARIANT, slot_id, "");
        let rows: Vec<Variant> = self.kv.scan_json(&prefix)?;
        Ok(rows.into_iter().filter(|v| &v.slot_id == slot_id).collect())
    }

    fn stats_for(&self, variant_id: &VariantId) -> Result<Vec<DailyStat>, StoreError> {
        let prefix = store_key!(STAT, variant_id, "");
        let rows: Vec<DailyStat> = self.kv.scan_json(&prefix)?;
        Ok(rows
            .into_iter()
            .filter(|s| &s.variant_id == variant_id)
            .collect())
    }

    fn pool_in(&self, slot_id: Option<&SlotId>) -> Result<Vec<PoolItem>, StoreError> {
        match slot_id {
            Some(slot_id) => {
                let prefix = store_key!(POOL, slot_id, "");
                let rows: Vec<PoolItem> = self.kv.scan_json(&prefix)?;
                Ok(rows.into_iter().filter(|p| &p.slot_id == slot_id).collect())
            }
            None => self.kv.scan_json(&format!("{}:", POOL)),
        }
    }

    fn stat_key(variant_id: &VariantId, date: NaiveDate) -> String {
        store_key!(STAT, variant_id, date.format("%Y-%m-%d"))
    }
}

#[async_trait]
impl<K: KvBackend> Store for TableStore<K> {
    async fn list_active_slots(&self) -> Result<Vec<Slot>, StoreError> {
        let slots: Vec<Slot> = self.kv.scan_json(&format!("{}:", SLOT))?;
        Ok(slots.into_iter().filter(|s| s.active).collect())
    }

    async fn list_active_variants(&self, slot_id: &SlotId) -> Result<Vec<Variant>, StoreError> {
        Ok(self
            .variants_in(slot_id)?
            .into_iter()
            .filter(|v| v.active)
            .collect())
    }

    async fn daily_stats(
        &self,
        variant_id: &VariantId,
        since: NaiveDate,
    ) -> Result<Vec<DailyStat>, StoreError> {
        Ok(self
            .stats_for(variant_id)?
            .into_iter()
            .filter(|s| s.date >= since)
            .collect())
    }

    async fn total_impressions(&self, variant_id: &VariantId) -> Result<u64, StoreError> {
        Ok(self.stats_for(variant_id)?.iter().map(|s| s.impressions).sum())
    }

    async fn set_variant_weight(
        &self,
        slot_id: &SlotId,
        variant_id: &VariantId,
        weight: i32,
    ) -> Result<(), StoreError> {
        self.update_variant(slot_id, variant_id, |v| v.weight = weight)?;
        Ok(())
    }

    async fn deactivate_variant(
        &self,
        slot_id: &SlotId,
        variant_id: &VariantId,
        reason: &str,
    ) -> Result<(), StoreError> {
        let now = self.clock.now();
        self.update_variant(slot_id, variant_id, |v| v.deactivate(reason, now))?;
        Ok(())
    }

    async fn draw_random_pool_items(
        &self,
        slot_id: &SlotId,
        n: usize,
    ) -> Result<Vec<PoolItem>, StoreError> {
        let items = self.pool_in(Some(slot_id))?;
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| StoreError::Backend("pool rng lock poisoned".to_string()))?;
        Ok(items.choose_multiple(&mut *rng, n).cloned().collect())
    }

    async fn promote_pool_item(
        &self,
        slot_id: &SlotId,
        item: &PoolItem,
    ) -> Result<VariantId, StoreError> {
        let pool_key = store_key!(POOL, slot_id, item.pool_id);

        let (stored, version) = self
            .kv
            .get_json::<PoolItem>(&pool_key)?
            .ok_or_else(|| StoreError::NotFound(pool_key.clone()))?;

        // Consume the item first so two promoters cannot both succeed.
        match self.kv.delete(&pool_key, Expect::Version(version)) {
            Ok(true) => {}
            Ok(false) | Err(StoreError::ConcurrentModification(_)) => {
                return Err(StoreError::NotFound(pool_key));
            }
            Err(e) => return Err(e),
        }

        let variant_id = VariantId::generate();
        let variant = stored.clone().into_variant(variant_id.clone(), self.clock.now());
        let key = store_key!(VARIANT, slot_id, variant_id);
        if let Err(e) = self.kv.put_json(&key, &variant, Expect::Absent) {
            // Put the item back so a later run can promote it.
            self.kv.put_json(&pool_key, &stored, Expect::Absent)?;
            return Err(e);
        }

        Ok(variant_id)
    }

    async fn increment_daily_counter(
        &self,
        variant_id: &VariantId,
        counter: Counter,
    ) -> Result<DailyStat, StoreError> {
        let today = self.clock.today();
        let key = Self::stat_key(variant_id, today);
        self.modify(&key, |current: Option<DailyStat>| {
            let mut stat = current.unwrap_or_else(|| DailyStat::new(variant_id.clone(), today));
            stat.record(counter);
            Ok(stat)
        })
    }

    async fn pool_counts(&self) -> Result<BTreeMap<SlotId, usize>, StoreError> {
        let slots: Vec<Slot> = self.kv.scan_json(&format!("{}:", SLOT))?;
        let mut counts: BTreeMap<SlotId, usize> = slots
            .into_iter()
            .map(|s| (s.id, 0))
            .collect();

        for item in self.pool_in(None)? {
            *counts.entry(item.slot_id).or_insert(0) += 1;
        }
        Ok(counts)
    }
}

#[async_trait]
impl<K: KvBackend> AdminStore for TableStore<K> {
    async fn create_slot(&self, slot: Slot) -> Result<bool, StoreError> {
        let key = store_key!(SLOT, slot.id);
        match self.kv.put_json(&key, &slot, Expect::Absent) {
            Ok(_) => Ok(true),
            Err(StoreError::ConcurrentModification(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn create_variant(
        &self,
        slot_id: &SlotId,
        payload: ProductPayload,
    ) -> Result<Variant, StoreError> {
        let variant = Variant::new(VariantId::generate(), slot_id.clone(), payload, self.clock.now());
        self.insert_variant(variant.clone()).await?;
        Ok(variant)
    }

    async fn insert_variant(&self, variant: Variant) -> Result<(), StoreError> {
        let key = store_key!(VARIANT, variant.slot_id, variant.id);
        match self.kv.put_json(&key, &variant, Expect::Absent) {
            Ok(_) => Ok(()),
            Err(StoreError::ConcurrentModification(_)) => Err(StoreError::AlreadyExists(key)),
            Err(e) => Err(e),
        }
    }

    async fn add_pool_item(
        &self,
        slot_id: &SlotId,
        payload: ProductPayload,
    ) -> Result<PoolItem, StoreError> {
        let item = PoolItem::new(slot_id.clone(), payload, self.clock.now());
        self.insert_pool_item(item.clone()).await?;
        Ok(item)
    }

    async fn insert_pool_item(&self, item: PoolItem) -> Result<(), StoreError> {
        let key = store_key!(POOL, item.slot_id, item.pool_id);
        match self.kv.put_json(&key, &item, Expect::Absent) {
            Ok(_) => Ok(()),
            Err(StoreError::ConcurrentModification(_)) => Err(StoreError::AlreadyExists(key)),
            Err(e) => Err(e),
        }
    }

    async fn put_daily_stat(&self, stat: DailyStat) -> Result<(), StoreError> {
        let key = Self::stat_key(&stat.variant_id, stat.date);
        let stat = DailyStat::with_counts(stat.variant_id, stat.date, stat.impressions, stat.clicks);
        self.kv.put_json(&key, &stat, Expect::Any)?;
        Ok(())
    }

    async fn list_slots(&self) -> Result<Vec<Slot>, StoreError> {
        self.kv.scan_json(&format!("{}:", SLOT))
    }

    async fn list_all_variants(&self, slot_id: &SlotId) -> Result<Vec<Variant>, StoreError> {
        self.variants_in(slot_id)
    }

    async fn list_pool_items(&self, slot_id: Option<&SlotId>) -> Result<Vec<PoolItem>, StoreError> {
        self.pool_in(slot_id)
    }

    async fn clear_pool(&self) -> Result<usize, StoreError> {
        self.kv.delete_prefix(&format!("{}:", POOL))
    }

    async fn all_daily_stats(&self, variant_id: &VariantId) -> Result<Vec<DailyStat>, StoreError> {
        self.stats_for(variant_id)
    }

    async fn reset_all(&self) -> Result<ResetCounts, StoreError> {
        Ok(ResetCounts {
            slots_deleted: self.kv.delete_prefix(&format!("{}:", SLOT))?,
            variants_deleted: self.kv.delete_prefix(&format!("{}:", VARIANT))?,
            stats_deleted: self.kv.delete_prefix(&format!("{}:", STAT))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use shelf_core::FixedClock;

    fn fixture() -> (TableStore, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap()));
        let store = TableStore::with_seed(Arc::new(MemoryKv::new()), clock.clone(), 11);
        (store, clock)
    }

    fn payload(title: &str) -> ProductPayload {
        ProductPayload::new(title, format!("https://example.com/{}", title))
            .with_author("Author")
            .with_image("https://example.com/img.png")
            .with_tag("books")
    }

    async fn seed_slot(store: &TableStore, id: &str) -> SlotId {
        let slot_id = SlotId::new(id);
        store
            .create_slot(Slot::new(slot_id.clone(), id, store.clock().now()))
            .await
            .unwrap();
        slot_id
    }

    #[tokio::test]
    async fn test_create_slot_is_idempotent() {
        let (store, _) = fixture();
        let slot = Slot::new(SlotId::new("slot-1"), "Clean Code", store.clock().now());
        assert!(store.create_slot(slot.clone()).await.unwrap());
        assert!(!store.create_slot(slot).await.unwrap());
        assert_eq!(store.list_slots().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_inactive_slots_are_not_listed() {
        let (store, clock) = fixture();
        let mut hidden = Slot::new(SlotId::new("slot-2"), "Hidden", clock.now());
        hidden.active = false;
        store.create_slot(hidden).await.unwrap();
        seed_slot(&store, "slot-1").await;

        let active = store.list_active_slots().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id.as_str(), "slot-1");
    }

    #[tokio::test]
    async fn test_active_variants_exclude_dropped_and_other_slots() {
        let (store, _) = fixture();
        let s1 = seed_slot(&store, "slot-1").await;
        let s10 = seed_slot(&store, "slot-10").await;

        let a = store.create_variant(&s1, payload("a")).await.unwrap();
        let b = store.create_variant(&s1, payload("b")).await.unwrap();
        store.create_variant(&s10, payload("c")).await.unwrap();

        store.deactivate_variant(&s1, &b.id, "CTR 0.10% below threshold 1.00%").await.unwrap();

        let active = store.list_active_variants(&s1).await.unwrap();
        assert_eq!(active.iter().map(|v| &v.id).collect::<Vec<_>>(), vec![&a.id]);

        let all = store.list_all_variants(&s1).await.unwrap();
        let dropped = all.iter().find(|v| v.id == b.id).unwrap();
        assert!(!dropped.active);
        assert!(dropped.dropped_at.is_some());
        assert_eq!(dropped.drop_reason.as_deref(), Some("CTR 0.10% below threshold 1.00%"));
    }

    #[tokio::test]
    async fn test_updates_on_missing_variant_are_not_found() {
        let (store, _) = fixture();
        let slot = seed_slot(&store, "slot-1").await;
        let missing = VariantId::new("var-missing");

        let err = store.set_variant_weight(&slot, &missing, 120).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));

        let err = store.deactivate_variant(&slot, &missing, "x").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));

        // Nothing was created as a side effect.
        assert!(store.list_all_variants(&slot).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_set_weight_persists() {
        let (store, _) = fixture();
        let slot = seed_slot(&store, "slot-1").await;
        let v = store.create_variant(&slot, payload("a")).await.unwrap();

        store.set_variant_weight(&slot, &v.id, 150).await.unwrap();
        let stored = store.list_active_variants(&slot).await.unwrap();
        assert_eq!(stored[0].weight, 150);
    }

    #[tokio::test]
    async fn test_counters_create_then_increment() {
        let (store, clock) = fixture();
        let v = VariantId::new("var-a");

        store.increment_daily_counter(&v, Counter::Impression).await.unwrap();
        store.increment_daily_counter(&v, Counter::Impression).await.unwrap();
        let stat = store.increment_daily_counter(&v, Counter::Click).await.unwrap();
        assert_eq!((stat.impressions, stat.clicks), (2, 1));
        assert_eq!(stat.ctr, 50.0);

        clock.advance(Duration::days(1));
        store.increment_daily_counter(&v, Counter::Impression).await.unwrap();

        let stats = store.all_daily_stats(&v).await.unwrap();
        assert_eq!(stats.len(), 2);
        assert!(stats[0].date < stats[1].date);
        assert_eq!(store.total_impressions(&v).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_concurrent_increments_are_not_lost() {
        let (store, _) = fixture();
        let store = Arc::new(store);
        let v = VariantId::new("var-hot");

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            let v = v.clone();
            handles.push(tokio::spawn(async move {
                for _ in 0..50 {
                    store.increment_daily_counter(&v, Counter::Impression).await.unwrap();
                }
            }));
        }
        for h in futures::future::join_all(handles).await {
            h.unwrap();
        }

        assert_eq!(store.total_impressions(&v).await.unwrap(), 400);
    }

    #[tokio::test]
    async fn test_daily_stats_window() {
        let (store, _) = fixture();
        let v = VariantId::new("var-a");
        for day in 1..=10 {
            let date = NaiveDate::from_ymd_opt(2025, 3, day).unwrap();
            store
                .put_daily_stat(DailyStat::with_counts(v.clone(), date, 10, 1))
                .await
                .unwrap();
        }

        let since = NaiveDate::from_ymd_opt(2025, 3, 4).unwrap();
        let window = store.daily_stats(&v, since).await.unwrap();
        assert_eq!(window.len(), 7);
        assert!(window.iter().all(|s| s.date >= since));
    }

    #[tokio::test]
    async fn test_stats_do_not_leak_across_prefixed_ids() {
        let (store, _) = fixture();
        let date = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        store
            .put_daily_stat(DailyStat::with_counts(VariantId::new("var-a:x"), date, 99, 9))
            .await
            .unwrap();
        assert_eq!(store.total_impressions(&VariantId::new("var-a")).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_promote_roundtrip() {
        let (store, clock) = fixture();
        let slot = seed_slot(&store, "slot-1").await;
        let item = store.add_pool_item(&slot, payload("Accelerate")).await.unwrap();

        clock.advance(Duration::days(3));
        let drawn = store.draw_random_pool_items(&slot, 1).await.unwrap();
        assert_eq!(drawn, vec![item.clone()]);

        let variant_id = store.promote_pool_item(&slot, &drawn[0]).await.unwrap();

        let variants = store.list_active_variants(&slot).await.unwrap();
        let promoted = variants.iter().find(|v| v.id == variant_id).unwrap();
        assert_eq!(promoted.payload, item.payload);
        assert_eq!(promoted.weight, 100);
        assert_eq!(promoted.created_at, clock.now());

        assert!(store.list_pool_items(Some(&slot)).await.unwrap().is_empty());
        assert!(store.draw_random_pool_items(&slot, 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_promote_consumes_exactly_once() {
        let (store, _) = fixture();
        let slot = seed_slot(&store, "slot-1").await;
        let item = store.add_pool_item(&slot, payload("Accelerate")).await.unwrap();

        store.promote_pool_item(&slot, &item).await.unwrap();
        let err = store.promote_pool_item(&slot, &item).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
        assert_eq!(store.list_active_variants(&slot).await.unwrap().len(), 1);
    }

    /// Rejects every variant write.
    struct NoVariantWrites(MemoryKv);

    impl KvBackend for NoVariantWrites {
        fn get(&self, key: &str) -> Result<Option<crate::kv::Versioned>, StoreError> {
            self.0.get(key)
        }
        fn put(&self, key: &str, bytes: Vec<u8>, expect: Expect) -> Result<u64, StoreError> {
            if key.starts_with("variant:") {
                return Err(StoreError::Backend("transient".to_string()));
            }
            self.0.put(key, bytes, expect)
        }
        fn delete(&self, key: &str, expect: Expect) -> Result<bool, StoreError> {
            self.0.delete(key, expect)
        }
        fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
            self.0.keys_with_prefix(prefix)
        }
    }

    #[tokio::test]
    async fn test_failed_promotion_keeps_pool_item() {
        let clock = Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap()));
        let store = TableStore::with_seed(Arc::new(NoVariantWrites(MemoryKv::new())), clock, 11);
        let slot = SlotId::new("slot-1");
        store.create_slot(Slot::new(slot.clone(), "slot-1", store.clock().now())).await.unwrap();
        store.add_pool_item(&slot, payload("Accelerate")).await.unwrap();

        let drawn = store.draw_random_pool_items(&slot, 1).await.unwrap();
        let err = store.promote_pool_item(&slot, &drawn[0]).await.unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)));

        let left = store.list_pool_items(Some(&slot)).await.unwrap();
        assert_eq!(left, drawn);
        assert!(store.list_all_variants(&slot).await.unwrap().is_empty());

        // The restored item is still promotable.
        let again = store.draw_random_pool_items(&slot, 1).await.unwrap();
        assert_eq!(again.len(), 1);
    }

    #[tokio::test]
    async fn test_draw_without_replacement() {
        let (store, _) = fixture();
        let slot = seed_slot(&store, "slot-1").await;
        for i in 0..5 {
            store.add_pool_item(&slot, payload(&format!("p{}", i))).await.unwrap();
        }

        let drawn = store.draw_random_pool_items(&slot, 3).await.unwrap();
        assert_eq!(drawn.len(), 3);
        let mut ids: Vec<_> = drawn.iter().map(|p| p.pool_id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 3);

        // Asking for more than exists returns what exists.
        assert_eq!(store.draw_random_pool_items(&slot, 10).await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_pool_counts_include_empty_slots() {
        let (store, _) = fixture();
        let s1 = seed_slot(&store, "slot-1").await;
        let s2 = seed_slot(&store, "slot-2").await;
        store.add_pool_item(&s1, payload("a")).await.unwrap();
        store.add_pool_item(&s1, payload("b")).await.unwrap();

        let counts = store.pool_counts().await.unwrap();
        assert_eq!(counts.get(&s1), Some(&2));
        assert_eq!(counts.get(&s2), Some(&0));

        assert_eq!(store.clear_pool().await.unwrap(), 2);
        assert_eq!(store.pool_counts().await.unwrap().get(&s1), Some(&0));
    }

    #[tokio::test]
    async fn test_reset_all_keeps_pool() {
        let (store, _) = fixture();
        let slot = seed_slot(&store, "slot-1").await;
        let v = store.create_variant(&slot, payload("a")).await.unwrap();
        store.increment_daily_counter(&v.id, Counter::Impression).await.unwrap();
        store.add_pool_item(&slot, payload("b")).await.unwrap();

        let counts = store.reset_all().await.unwrap();
        assert_eq!(
            counts,
            ResetCounts {
                slots_deleted: 1,
                variants_deleted: 1,
                stats_deleted: 1
            }
        );
        assert_eq!(store.list_pool_items(None).await.unwrap().len(), 1);
    }
}
