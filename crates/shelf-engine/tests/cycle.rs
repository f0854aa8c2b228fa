use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use shelf_core::prelude::*;
use shelf_engine::{AnalysisCycle, CycleReport, Notifier, NotifyError};
use shelf_observability::{LogSink, StructuredLogger};
use shelf_store::{AdminStore, MemoryKv, Store, StoreError, TableStore};

#[derive(Default)]
struct RecordingNotifier {
    reports: Mutex<Vec<CycleReport>>,
    failures: Mutex<Vec<String>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, report: &CycleReport) -> Result<(), NotifyError> {
        self.reports.lock().unwrap().push(report.clone());
        Ok(())
    }

    async fn notify_failure(&self, _run_id: &RunId, error: &str) -> Result<(), NotifyError> {
        self.failures.lock().unwrap().push(error.to_string());
        Ok(())
    }
}

struct BrokenNotifier;

#[async_trait]
impl Notifier for BrokenNotifier {
    async fn notify(&self, _report: &CycleReport) -> Result<(), NotifyError> {
        Err(NotifyError::Delivery("mailbox full".to_string()))
    }

    async fn notify_failure(&self, _run_id: &RunId, _error: &str) -> Result<(), NotifyError> {
        Err(NotifyError::Delivery("mailbox full".to_string()))
    }
}

struct Harness {
    store: Arc<TableStore>,
    clock: Arc<FixedClock>,
    notifier: Arc<RecordingNotifier>,
    logs: Arc<Mutex<Vec<String>>>,
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 10, 6, 0, 0).unwrap()
}

fn yesterday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 9).unwrap()
}

impl Harness {
    fn new() -> Self {
        let clock = Arc::new(FixedClock::new(now()));
        let store = Arc::new(TableStore::with_seed(Arc::new(MemoryKv::new()), clock.clone(), 7));
        let (_, logs) = LogSink::memory();
        Self {
            store,
            clock,
            notifier: Arc::new(RecordingNotifier::default()),
            logs,
        }
    }

    fn cycle(&mut self, settings: AnalysisSettings) -> AnalysisCycle<TableStore> {
        let (sink, logs) = LogSink::memory();
        self.logs = logs;
        AnalysisCycle::new(self.store.clone(), self.clock.clone(), settings)
            .with_notifier(self.notifier.clone())
            .with_logger(StructuredLogger::new("test").with_component("cycle").with_sink(sink))
    }

    async fn slot(&self, id: &str, name: &str) -> SlotId {
        let slot_id = SlotId::new(id);
        self.store
            .create_slot(Slot::new(slot_id.clone(), name, now() - Duration::days(60)))
            .await
            .unwrap();
        slot_id
    }

    /// A 30-day-old variant with 1000 impressions yesterday at the given CTR.
    async fn mature_variant(&self, slot: &SlotId, id: &str, ctr: f64) -> VariantId {
        let variant_id = VariantId::new(id);
        let payload = ProductPayload::new(format!("Title {}", id), format!("https://example.com/{}", id));
        self.store
            .insert_variant(Variant::new(variant_id.clone(), slot.clone(), payload, now() - Duration::days(30)))
            .await
            .unwrap();
        let clicks = (ctr * 10.0).round() as u64;
        self.store
            .put_daily_stat(DailyStat::with_counts(variant_id.clone(), yesterday(), 1000, clicks))
            .await
            .unwrap();
        variant_id
    }

    async fn weights(&self, slot: &SlotId) -> BTreeMap<String, i32> {
        self.store
            .list_active_variants(slot)
            .await
            .unwrap()
            .into_iter()
            .map(|v| (v.id.into_inner(), v.weight))
            .collect()
    }
}

#[tokio::test]
async fn drops_only_the_clear_underperformer() {
    let mut h = Harness::new();
    let slot = h.slot("slot-1", "DevOps Culture").await;
    h.mature_variant(&slot, "var-a", 4.0).await;
    h.mature_variant(&slot, "var-b", 4.0).await;
    let c = h.mature_variant(&slot, "var-c", 0.5).await;

    let outcome = h.cycle(AnalysisSettings::default()).run().await.unwrap();

    assert_eq!(outcome.report.dropped.len(), 1);
    let dropped = &outcome.report.dropped[0];
    assert_eq!(dropped.variant_id, c);
    assert_eq!(dropped.slot_name, "DevOps Culture");
    assert_eq!(dropped.reason, "CTR 0.50% below threshold 1.42%");

    let all = h.store.list_all_variants(&slot).await.unwrap();
    let stored = all.iter().find(|v| v.id == c).unwrap();
    assert!(!stored.active);
    assert_eq!(stored.weight, 0);
    assert_eq!(stored.dropped_at, Some(now()));

    let weights = h.weights(&slot).await;
    assert_eq!(weights.get("var-a"), Some(&150));
    assert_eq!(weights.get("var-b"), Some(&150));

    assert!(outcome.notified);
    assert_eq!(h.notifier.reports.lock().unwrap().len(), 1);
    assert!(h.logs.lock().unwrap().iter().any(|l| l.contains("Dropping variant")));
}

#[tokio::test]
async fn never_drops_the_last_variant_and_refills_from_pool() {
    let mut h = Harness::new();
    let slot = h.slot("slot-1", "Clean Code").await;
    h.mature_variant(&slot, "var-a", 1.0).await;
    h.mature_variant(&slot, "var-b", 1.0).await;
    h.store
        .add_pool_item(&slot, ProductPayload::new("The Pragmatic Programmer", "https://example.com/pp"))
        .await
        .unwrap();

    let settings = AnalysisSettings {
        drop_threshold_ratio: 2.0,
        ..AnalysisSettings::default()
    };
    let outcome = h.cycle(settings).run().await.unwrap();

    assert_eq!(outcome.report.dropped.len(), 1);
    assert_eq!(outcome.report.dropped[0].variant_id.as_str(), "var-a");
    assert_eq!(outcome.report.promoted.len(), 1);
    assert_eq!(outcome.report.promoted[0].title, "The Pragmatic Programmer");

    let active = h.store.list_active_variants(&slot).await.unwrap();
    assert_eq!(active.len(), 2);
    assert!(active.iter().any(|v| v.id.as_str() == "var-b"));
    assert!(h.store.list_pool_items(Some(&slot)).await.unwrap().is_empty());
    assert_eq!(outcome.report.pool_counts_by_slot.get(&slot), Some(&0));
}

#[tokio::test]
async fn rebalances_by_relative_ctr() {
    let mut h = Harness::new();
    let slot = h.slot("slot-1", "Architecture").await;
    h.mature_variant(&slot, "var-a", 4.0).await;
    h.mature_variant(&slot, "var-b", 2.0).await;
    h.mature_variant(&slot, "var-c", 0.0).await;

    let settings = AnalysisSettings {
        drop_threshold_ratio: 0.0,
        ..AnalysisSettings::default()
    };
    let outcome = h.cycle(settings).run().await.unwrap();

    assert!(outcome.report.dropped.is_empty());
    let weights = h.weights(&slot).await;
    assert_eq!(weights.get("var-a"), Some(&150));
    assert_eq!(weights.get("var-b"), Some(&100));
    assert_eq!(weights.get("var-c"), Some(&50));

    // Window totals cover every analyzed variant.
    assert_eq!(outcome.report.total_impressions, 3000);
    assert_eq!(outcome.report.total_clicks, 60);

    // Nothing dropped or promoted, so nobody is told.
    assert!(!outcome.notified);
    assert!(h.notifier.reports.lock().unwrap().is_empty());
}

#[tokio::test]
async fn single_variant_slot_is_only_topped_up() {
    let mut h = Harness::new();
    let slot = h.slot("slot-1", "Leadership").await;
    let only = h.mature_variant(&slot, "var-only", 0.1).await;
    h.store.set_variant_weight(&slot, &only, 120).await.unwrap();
    let item = h
        .store
        .add_pool_item(&slot, ProductPayload::new("Team Topologies", "https://example.com/tt").with_tag("teams"))
        .await
        .unwrap();

    let outcome = h.cycle(AnalysisSettings::default()).run().await.unwrap();

    assert!(outcome.report.dropped.is_empty());
    assert_eq!(outcome.report.promoted.len(), 1);

    let active = h.store.list_active_variants(&slot).await.unwrap();
    assert_eq!(active.len(), 2);
    let original = active.iter().find(|v| v.id == only).unwrap();
    assert_eq!(original.weight, 120);
    let promoted = active.iter().find(|v| v.id != only).unwrap();
    assert_eq!(promoted.payload, item.payload);
    assert_eq!(promoted.weight, DEFAULT_WEIGHT);
    assert_eq!(promoted.created_at, now());
}

#[tokio::test]
async fn young_variants_are_not_judged() {
    let mut h = Harness::new();
    let slot = h.slot("slot-1", "Testing").await;
    for (id, ctr) in [("var-a", 5.0), ("var-b", 0.0)] {
        let variant_id = VariantId::new(id);
        let payload = ProductPayload::new(id, format!("https://example.com/{}", id));
        // Five days old and already well past the impression bar.
        h.store
            .insert_variant(Variant::new(variant_id.clone(), slot.clone(), payload, now() - Duration::days(5)))
            .await
            .unwrap();
        h.store
            .put_daily_stat(DailyStat::with_counts(variant_id, yesterday(), 500, (ctr * 5.0) as u64))
            .await
            .unwrap();
    }

    let outcome = h.cycle(AnalysisSettings::default()).run().await.unwrap();

    assert!(outcome.report.dropped.is_empty());
    let weights = h.weights(&slot).await;
    assert_eq!(weights.values().copied().collect::<Vec<_>>(), vec![100, 100]);
    assert!(h.logs.lock().unwrap().iter().any(|l| l.contains("not enough eligible")));
}

#[tokio::test]
async fn stats_outside_the_window_do_not_count_toward_ctr() {
    let mut h = Harness::new();
    let slot = h.slot("slot-1", "Cloud").await;
    let a = h.mature_variant(&slot, "var-a", 3.0).await;
    let b = h.mature_variant(&slot, "var-b", 3.0).await;
    // A great month long ago does not rescue var-b.
    h.store
        .put_daily_stat(DailyStat::with_counts(b.clone(), yesterday() - Duration::days(20), 1000, 900))
        .await
        .unwrap();
    h.store
        .put_daily_stat(DailyStat::with_counts(a.clone(), yesterday(), 1000, 30))
        .await
        .unwrap();

    let outcome = h.cycle(AnalysisSettings::default()).run().await.unwrap();
    assert!(outcome.report.dropped.is_empty());
    assert_eq!(outcome.report.total_impressions, 2000);
}

#[tokio::test]
async fn notifier_failure_does_not_fail_the_run() {
    let mut h = Harness::new();
    let slot = h.slot("slot-1", "DevOps").await;
    h.store
        .add_pool_item(&slot, ProductPayload::new("Accelerate", "https://example.com/a"))
        .await
        .unwrap();

    let cycle = h.cycle(AnalysisSettings::default()).with_notifier(Arc::new(BrokenNotifier));
    let outcome = cycle.run().await.unwrap();

    assert_eq!(outcome.report.promoted.len(), 1);
    assert!(!outcome.notified);
    assert!(h.logs.lock().unwrap().iter().any(|l| l.contains("Failed to send notification")));
}

/// Every call fails, except that `listed` slots are returned when present.
#[derive(Default)]
struct OfflineStore {
    listed: Vec<Slot>,
}

fn offline<T>() -> Result<T, StoreError> {
    Err(StoreError::Backend("table service offline".to_string()))
}

#[async_trait]
impl Store for OfflineStore {
    async fn list_active_slots(&self) -> Result<Vec<Slot>, StoreError> {
        if self.listed.is_empty() {
            return offline();
        }
        Ok(self.listed.clone())
    }
    async fn list_active_variants(&self, _: &SlotId) -> Result<Vec<Variant>, StoreError> {
        offline()
    }
    async fn daily_stats(&self, _: &VariantId, _: NaiveDate) -> Result<Vec<DailyStat>, StoreError> {
        offline()
    }
    async fn total_impressions(&self, _: &VariantId) -> Result<u64, StoreError> {
        offline()
    }
    async fn set_variant_weight(&self, _: &SlotId, _: &VariantId, _: i32) -> Result<(), StoreError> {
        offline()
    }
    async fn deactivate_variant(&self, _: &SlotId, _: &VariantId, _: &str) -> Result<(), StoreError> {
        offline()
    }
    async fn draw_random_pool_items(&self, _: &SlotId, _: usize) -> Result<Vec<PoolItem>, StoreError> {
        offline()
    }
    async fn promote_pool_item(&self, _: &SlotId, _: &PoolItem) -> Result<VariantId, StoreError> {
        offline()
    }
    async fn increment_daily_counter(&self, _: &VariantId, _: Counter) -> Result<DailyStat, StoreError> {
        offline()
    }
    async fn pool_counts(&self) -> Result<BTreeMap<SlotId, usize>, StoreError> {
        offline()
    }
}

#[tokio::test]
async fn store_failure_aborts_and_reports() {
    let notifier = Arc::new(RecordingNotifier::default());
    let (sink, _) = LogSink::memory();
    let cycle = AnalysisCycle::new(Arc::new(OfflineStore::default()), Arc::new(SystemClock), AnalysisSettings::default())
        .with_notifier(notifier.clone())
        .with_logger(StructuredLogger::new("test").with_sink(sink));

    let err = cycle.run().await.unwrap_err();
    assert!(matches!(err, ShelfError::Store(_)));

    let failures = notifier.failures.lock().unwrap();
    assert_eq!(failures.len(), 1);
    assert!(failures[0].contains("table service offline"));
    assert!(notifier.reports.lock().unwrap().is_empty());
}

#[tokio::test]
async fn slot_failure_is_recorded_against_the_slot() {
    let store = OfflineStore {
        listed: vec![Slot::new(SlotId::new("slot-7"), "Broken", now())],
    };
    let (sink, logs) = LogSink::memory();
    let cycle = AnalysisCycle::new(Arc::new(store), Arc::new(SystemClock), AnalysisSettings::default())
        .with_notifier(Arc::new(RecordingNotifier::default()))
        .with_logger(StructuredLogger::new("test").with_sink(sink));

    cycle.run().await.unwrap_err();

    let logs = logs.lock().unwrap();
    assert!(logs
        .iter()
        .any(|l| l.contains("Slot analysis failed") && l.contains("slot-7")));
    let summary = logs
        .iter()
        .find(|l| l.contains("Error in variant analysis"))
        .unwrap();
    assert!(summary.contains(r#""failed_slots":"slot-7""#));
}

#[tokio::test]
async fn rerunning_is_stable() {
    let mut h = Harness::new();
    let slot = h.slot("slot-1", "DevOps").await;
    h.mature_variant(&slot, "var-a", 4.0).await;
    h.mature_variant(&slot, "var-b", 4.0).await;
    h.mature_variant(&slot, "var-c", 0.5).await;

    h.cycle(AnalysisSettings::default()).run().await.unwrap();
    let first = h.weights(&slot).await;

    let second = h.cycle(AnalysisSettings::default()).run().await.unwrap();
    assert!(second.report.dropped.is_empty());
    assert_eq!(h.weights(&slot).await, first);
}
