//! Dropping variants whose CTR falls well below their slot's average.

use shelf_core::{AnalysisSettings, SlotId, VariantId};
use shelf_store::{Store, StoreError};

use crate::analysis::VariantAnalysis;

/// One variant to deactivate.
#[derive(Debug, Clone, PartialEq)]
pub struct DropDecision {
    pub variant_id: VariantId,
    pub ctr: f64,
    pub reason: String,
}

/// Drop decisions for one slot.
#[derive(Debug, Clone, PartialEq)]
pub struct DropPlan {
    /// Mean CTR over eligible variants.
    pub average_ctr: f64,
    /// CTR below which an eligible variant is dropped.
    pub threshold: f64,
    pub eligible: usize,
    pub drops: Vec<DropDecision>,
}

/// Why a slot got no drop plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Fewer than two active variants to compare.
    TooFewActive(usize),
    /// Fewer than two variants with enough traffic and age.
    TooFewEligible(usize),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooFewActive(n) => write!(f, "need at least 2 variants to compare, have {}", n),
            Self::TooFewEligible(n) => {
                write!(f, "not enough eligible variants for comparison, have {}", n)
            }
        }
    }
}

pub fn drop_reason(ctr: f64, threshold: f64) -> String {
    format!("CTR {:.2}% below threshold {:.2}%", ctr, threshold)
}

/// Decide which variants to drop.
///
/// `active_count` is the slot's active variant count before any drop.
/// Eligible variants are visited in listing order and dropped while their
/// CTR is strictly below the threshold, stopping as soon as the running
/// count reaches the floor.
pub fn plan_drops(
    analyses: &[VariantAnalysis],
    active_count: usize,
    settings: &AnalysisSettings,
) -> Result<DropPlan, SkipReason> {
    if active_count < 2 {
        return Err(SkipReason::TooFewActive(active_count));
    }

    let eligible: Vec<&VariantAnalysis> = analyses.iter().filter(|a| a.eligible).collect();
    if eligible.len() < 2 {
        return Err(SkipReason::TooFewEligible(eligible.len()));
    }

    let average_ctr = eligible.iter().map(|a| a.ctr).sum::<f64>() / eligible.len() as f64;
    let threshold = average_ctr * settings.drop_threshold_ratio;
    let floor = settings.active_floor();

    let mut remaining = active_count;
    let mut drops = Vec::new();
    for analysis in &eligible {
        if remaining <= floor {
            break;
        }
        if analysis.ctr < threshold {
            drops.push(DropDecision {
                variant_id: analysis.variant.id.clone(),
                ctr: analysis.ctr,
                reason: drop_reason(analysis.ctr, threshold),
            });
            remaining -= 1;
        }
    }

    Ok(DropPlan {
        average_ctr,
        threshold,
        eligible: eligible.len(),
        drops,
    })
}

/// Deactivate every planned variant. Stops at the first failure.
pub async fn apply_drops<S: Store + ?Sized>(
    store: &S,
    slot_id: &SlotId,
    plan: &DropPlan,
) -> Result<(), StoreError> {
    for decision in &plan.drops {
        store
            .deactivate_variant(slot_id, &decision.variant_id, &decision.reason)
            .await?;
    }
    Ok(())
}
