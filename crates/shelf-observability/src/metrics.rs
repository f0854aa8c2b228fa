//! Timings and outcome counts for an analysis run.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// What happened to one slot during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotOutcome {
    /// Drop and rebalance ran.
    Analyzed,
    /// Too few active or eligible variants; only promotion ran.
    Skipped,
    /// Processing returned an error and the run stopped.
    Failed,
}

/// Metrics for a single slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotMetrics {
    pub slot_id: String,
    pub outcome: SlotOutcome,
    pub duration_us: u64,
    pub variants_analyzed: usize,
    pub dropped: usize,
    pub reweighted: usize,
    pub promoted: usize,
}

/// Metrics for a whole run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMetrics {
    pub run_id: String,
    pub slots: Vec<SlotMetrics>,
    pub total_duration_us: u64,
    pub success: bool,
}

/// Collector for run metrics.
#[derive(Debug)]
pub struct MetricsCollector {
    run_id: String,
    start: Instant,
    open: BTreeMap<String, Instant>,
    slots: Vec<SlotMetrics>,
}

/// Counts recorded when a slot finishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SlotCounts {
    pub variants_analyzed: usize,
    pub dropped: usize,
    pub reweighted: usize,
    pub promoted: usize,
}

impl MetricsCollector {
    pub fn new(run_id: impl std::fmt::Display) -> Self {
        Self {
            run_id: run_id.to_string(),
            start: Instant::now(),
            open: BTreeMap::new(),
            slots: Vec::new(),
        }
    }

    /// Record slot start.
    pub fn record_slot_start(&mut self, slot_id: &str) {
        self.open.insert(slot_id.to_string(), Instant::now());
    }

    /// Record slot end.
    ///
    /// A slot that was never started is recorded with zero duration.
    pub fn record_slot_end(&mut self, slot_id: &str, outcome: SlotOutcome, counts: SlotCounts) {
        let now = Instant::now();
        let started = self.open.remove(slot_id).unwrap_or(now);

        self.slots.push(SlotMetrics {
            slot_id: slot_id.to_string(),
            outcome,
            duration_us: now.duration_since(started).as_micros() as u64,
            variants_analyzed: counts.variants_analyzed,
            dropped: counts.dropped,
            reweighted: counts.reweighted,
            promoted: counts.promoted,
        });
    }

    /// Get total elapsed time.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Finalize and return the metrics.
    ///
    /// Slots still open are reported as failed.
    pub fn finalize(mut self, success: bool) -> RunMetrics {
        let open: Vec<String> = self.open.keys().cloned().collect();
        for slot_id in open {
            self.record_slot_end(&slot_id, SlotOutcome::Failed, SlotCounts::default());
        }

        RunMetrics {
            run_id: self.run_id,
            slots: self.slots,
            total_duration_us: self.start.elapsed().as_micros() as u64,
            success,
        }
    }
}

impl RunMetrics {
    /// Format as JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn total_dropped(&self) -> usize {
        self.slots.iter().map(|s| s.dropped).sum()
    }

    pub fn total_promoted(&self) -> usize {
        self.slots.iter().map(|s| s.promoted).sum()
    }

    /// Slots whose processing did not finish.
    pub fn failed_slots(&self) -> Vec<&str> {
        self.slots
            .iter()
            .filter(|s| s.outcome == SlotOutcome::Failed)
            .map(|s| s.slot_id.as_str())
            .collect()
    }

    /// Format as human-readable summary.
    pub fn to_summary(&self) -> String {
        let mut lines = Vec::new();

        let status = if self.success { "ok" } else { "FAILED" };
        lines.push(format!(
            "Run {} [{}]: {:.2}ms",
            self.run_id,
            status,
            self.total_duration_us as f64 / 1000.0
        ));

        for slot in &self.slots {
            let outcome = match slot.outcome {
                SlotOutcome::Analyzed => "analyzed",
                SlotOutcome::Skipped => "skipped",
                SlotOutcome::Failed => "failed",
            };
            lines.push(format!(
                "  {} ({}): {} dropped, {} reweighted, {} promoted - {:.2}ms",
                slot.slot_id,
                outcome,
                slot.dropped,
                slot.reweighted,
                slot.promoted,
                slot.duration_us as f64 / 1000.0
            ));
        }

        lines.join("\n")
    }
}
