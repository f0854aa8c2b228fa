//! CTR-proportional weights for the variants that survived a drop pass.

use shelf_core::{SlotId, Variant, VariantId};
use shelf_store::{Store, StoreError};

use crate::analysis::VariantAnalysis;

/// Weight of a variant with zero CTR.
pub const MIN_WEIGHT: i32 = 50;
/// Weight of the slot's best variant.
pub const MAX_WEIGHT: i32 = 150;
/// Lower bound on the best CTR, so an all-zero slot divides cleanly.
const CTR_FLOOR: f64 = 0.01;

#[derive(Debug, Clone, PartialEq)]
pub struct WeightUpdate {
    pub variant_id: VariantId,
    pub ctr: f64,
    pub weight: i32,
}

/// Map a CTR onto `[MIN_WEIGHT, MAX_WEIGHT]` relative to the best CTR.
pub fn weight_for(ctr: f64, max_ctr: f64) -> i32 {
    let score = ctr / max_ctr.max(CTR_FLOOR);
    let span = (MAX_WEIGHT - MIN_WEIGHT) as f64;
    (MIN_WEIGHT as f64 + score * span).round() as i32
}

/// Plan new weights for analyzed variants that are still active.
///
/// `remaining` is the slot re-listed after drops. Variants promoted or
/// created since the analysis are left alone. Output follows analysis order.
pub fn plan_weights(remaining: &[Variant], analyses: &[VariantAnalysis]) -> Vec<WeightUpdate> {
    let survivors: Vec<&VariantAnalysis> = analyses
        .iter()
        .filter(|a| remaining.iter().any(|v| v.id == a.variant.id))
        .collect();

    let max_ctr = survivors
        .iter()
        .map(|a| a.ctr)
        .fold(CTR_FLOOR, f64::max);

    survivors
        .into_iter()
        .map(|a| WeightUpdate {
            variant_id: a.variant.id.clone(),
            ctr: a.ctr,
            weight: weight_for(a.ctr, max_ctr),
        })
        .collect()
}

/// Write every planned weight. Stops at the first failure.
pub async fn apply_weights<S: Store + ?Sized>(
    store: &S,
    slot_id: &SlotId,
    updates: &[WeightUpdate],
) -> Result<(), StoreError> {
    for update in updates {
        store
            .set_variant_weight(slot_id, &update.variant_id, update.weight)
            .await?;
    }
    Ok(())
}
