//! The scheduled analysis run.
//!
//! Slots are processed one after another. Within a slot the variants are
//! analyzed concurrently, underperformers are dropped, survivors are
//! reweighted by CTR and the slot is topped up from the pool. Any store
//! error aborts the whole run; notification problems never do.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use shelf_core::{AnalysisSettings, Clock, RunId, ShelfError, Slot};
use shelf_observability::{MetricsCollector, RunMetrics, SlotCounts, SlotOutcome, StructuredLogger};
use shelf_store::{Store, TimeoutConfig};

use crate::analysis::analyze_slot;
use crate::drops::{apply_drops, plan_drops};
use crate::notify::{LogNotifier, Notifier, NotifyError};
use crate::promote::{needed, top_up};
use crate::rebalance::{apply_weights, plan_weights};
use crate::report::{CycleReport, DroppedEntry, PromotedEntry};

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct CycleOutcome {
    pub report: CycleReport,
    pub metrics: RunMetrics,
    /// Whether the notifier accepted the report.
    pub notified: bool,
}

/// Runs drop, rebalance and promotion over every active slot.
pub struct AnalysisCycle<S: Store + ?Sized> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    settings: AnalysisSettings,
    notifier: Arc<dyn Notifier>,
    notify_timeout: Duration,
    logger: StructuredLogger,
}

impl<S: Store + ?Sized> AnalysisCycle<S> {
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>, settings: AnalysisSettings) -> Self {
        let logger = StructuredLogger::new("-").with_component("cycle");
        Self {
            store,
            clock,
            settings,
            notifier: Arc::new(LogNotifier::new(logger.clone())),
            notify_timeout: TimeoutConfig::default().notify,
            logger,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Use this logger's format, level and sink for every run.
    pub fn with_logger(mut self, logger: StructuredLogger) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_timeouts(mut self, timeouts: TimeoutConfig) -> Self {
        self.notify_timeout = timeouts.notify;
        self
    }

    pub fn settings(&self) -> &AnalysisSettings {
        &self.settings
    }

    /// Run one analysis pass.
    pub async fn run(&self) -> Result<CycleOutcome, ShelfError> {
        let run_id = RunId::generate();
        let logger = self.logger.for_correlation(&run_id);
        let now = self.clock.now();
        let mut metrics = MetricsCollector::new(&run_id);
        let mut report = CycleReport::new(run_id.clone(), now.date_naive());

        logger.info("Starting A/B variant analysis");

        if let Err(e) = self.run_slots(&logger, &mut report, &mut metrics, now).await {
            let elapsed = metrics.elapsed();
            let failed = metrics.finalize(false);
            logger
                .error_builder("Error in variant analysis")
                .field("error", &e)
                .field("failed_slots", failed.failed_slots().join(","))
                .duration_ms("elapsed_ms", elapsed)
                .emit();
            logger.debug(&failed.to_json());
            self.deliver_failure(&logger, &run_id, &e.to_string()).await;
            return Err(e);
        }

        let metrics = metrics.finalize(true);
        logger
            .info_builder("A/B variant analysis completed")
            .field_i64("dropped", report.dropped.len() as i64)
            .field_i64("promoted", report.promoted.len() as i64)
            .field_bool("changed", report.has_changes())
            .field_i64("duration_us", metrics.total_duration_us as i64)
            .emit();
        logger.debug(&metrics.to_json());

        let notified = if report.has_changes() || !self.settings.notify_only_on_change {
            self.deliver(&logger, &report).await
        } else {
            logger.info("No drops or promotions, skipping notification");
            false
        };

        Ok(CycleOutcome {
            report,
            metrics,
            notified,
        })
    }

    async fn run_slots(
        &self,
        logger: &StructuredLogger,
        report: &mut CycleReport,
        metrics: &mut MetricsCollector,
        now: DateTime<Utc>,
    ) -> Result<(), ShelfError> {
        let slots = self.store.list_active_slots().await?;
        logger
            .info_builder("Found active product slots")
            .field_i64("slots", slots.len() as i64)
            .emit();

        for slot in &slots {
            metrics.record_slot_start(slot.id.as_str());
            let slot_logger = logger.for_slot(&slot.id);
            match self.run_slot(&slot_logger, slot, report, now).await {
                Ok((outcome, counts)) => metrics.record_slot_end(slot.id.as_str(), outcome, counts),
                Err(e) => {
                    metrics.record_slot_end(slot.id.as_str(), SlotOutcome::Failed, SlotCounts::default());
                    slot_logger.error_builder("Slot analysis failed").field("error", &e).emit();
                    return Err(e);
                }
            }
        }

        let pool_counts = self.store.pool_counts().await?;
        logger
            .info_builder("Pool status")
            .field("pool", serde_json::to_string(&pool_counts)?)
            .emit();
        report.pool_counts_by_slot = pool_counts;
        Ok(())
    }

    async fn run_slot(
        &self,
        logger: &StructuredLogger,
        slot: &Slot,
        report: &mut CycleReport,
        now: DateTime<Utc>,
    ) -> Result<(SlotOutcome, SlotCounts), ShelfError> {
        let store = &*self.store;
        let variants = store.list_active_variants(&slot.id).await?;
        logger
            .info_builder("Active variants")
            .field_i64("count", variants.len() as i64)
            .emit();

        let mut outcome = SlotOutcome::Skipped;
        let mut counts = SlotCounts::default();
        let mut active_count = variants.len();

        if variants.len() >= 2 {
            let analyses = analyze_slot(store, &variants, now, &self.settings).await?;
            counts.variants_analyzed = analyses.len();
            report.total_impressions += analyses.iter().map(|a| a.window_impressions).sum::<u64>();
            report.total_clicks += analyses.iter().map(|a| a.window_clicks).sum::<u64>();

            match plan_drops(&analyses, variants.len(), &self.settings) {
                Err(reason) => {
                    logger.info_builder("Skipping drop and rebalance").field("reason", reason).emit();
                }
                Ok(plan) => {
                    logger
                        .info_builder("Slot CTR")
                        .field_f64("average_ctr", plan.average_ctr)
                        .field_f64("drop_threshold", plan.threshold)
                        .field_i64("eligible", plan.eligible as i64)
                        .emit();

                    for decision in &plan.drops {
                        logger
                            .info_builder("Dropping variant")
                            .field("variant", &decision.variant_id)
                            .field("reason", &decision.reason)
                            .emit();
                    }
                    apply_drops(store, &slot.id, &plan).await?;

                    for decision in &plan.drops {
                        let title = analyses
                            .iter()
                            .find(|a| a.variant.id == decision.variant_id)
                            .map(|a| a.variant.payload.title.clone())
                            .unwrap_or_default();
                        report.dropped.push(DroppedEntry {
                            slot_id: slot.id.clone(),
                            slot_name: slot.name.clone(),
                            variant_id: decision.variant_id.clone(),
                            title,
                            ctr: decision.ctr,
                            reason: decision.reason.clone(),
                        });
                    }

                    let remaining = store.list_active_variants(&slot.id).await?;
                    active_count = remaining.len();

                    let updates = plan_weights(&remaining, &analyses);
                    apply_weights(store, &slot.id, &updates).await?;
                    for update in &updates {
                        logger
                            .info_builder("Updated weight")
                            .field("variant", &update.variant_id)
                            .field_i64("weight", update.weight as i64)
                            .emit();
                    }

                    counts.dropped = plan.drops.len();
                    counts.reweighted = updates.len();
                    outcome = SlotOutcome::Analyzed;
                }
            }
        } else {
            logger
                .info_builder("Skipping drop and rebalance")
                .field("reason", "need at least 2 variants to compare")
                .emit();
        }

        let wanted = needed(active_count, &self.settings);
        if wanted > 0 {
            logger
                .info_builder("Below target, checking pool")
                .field_i64("needed", wanted as i64)
                .emit();
        }

        let promotions = top_up(store, &slot.id, active_count, &self.settings).await?;
        if wanted > 0 && promotions.is_empty() {
            logger.warn("No items in pool to promote");
        }
        for promotion in promotions {
            logger
                .info_builder("Promoted from pool")
                .field("title", &promotion.title)
                .field("variant", &promotion.variant_id)
                .emit();
            report.promoted.push(PromotedEntry {
                slot_id: slot.id.clone(),
                slot_name: slot.name.clone(),
                variant_id: promotion.variant_id,
                title: promotion.title,
            });
            counts.promoted += 1;
        }

        Ok((outcome, counts))
    }

    async fn deliver(&self, logger: &StructuredLogger, report: &CycleReport) -> bool {
        let result = match tokio::time::timeout(self.notify_timeout, self.notifier.notify(report)).await {
            Ok(result) => result,
            Err(_) => Err(NotifyError::Timeout(self.notify_timeout)),
        };
        match result {
            Ok(()) => {
                logger.info_builder("Notification sent").field("subject", report.subject()).emit();
                true
            }
            Err(e) => {
                logger.warn_builder("Failed to send notification").field("error", e).emit();
                false
            }
        }
    }

    async fn deliver_failure(&self, logger: &StructuredLogger, run_id: &RunId, error: &str) {
        let sent = tokio::time::timeout(self.notify_timeout, self.notifier.notify_failure(run_id, error)).await;
        let result = match sent {
            Ok(result) => result,
            Err(_) => Err(NotifyError::Timeout(self.notify_timeout)),
        };
        if let Err(e) = result {
            logger
                .warn_builder("Failed to send failure notification")
                .field("error", e)
                .emit();
        }
    }
}
