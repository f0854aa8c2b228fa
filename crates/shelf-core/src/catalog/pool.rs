//! Holding pool of not-yet-active candidates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::{ProductPayload, Variant};
use crate::ids::{PoolId, SlotId, VariantId};

/// A candidate waiting to be promoted into a slot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PoolItem {
    /// Slot the candidate is queued for.
    pub slot_id: SlotId,
    /// Unique pool identifier.
    pub pool_id: PoolId,
    /// Display payload carried over on promotion.
    #[serde(flatten)]
    pub payload: ProductPayload,
    /// When the candidate was queued.
    pub added_at: DateTime<Utc>,
}

impl PoolItem {
    /// Queue a payload for a slot.
    pub fn new(slot_id: SlotId, payload: ProductPayload, added_at: DateTime<Utc>) -> Self {
        Self {
            slot_id,
            pool_id: PoolId::generate(),
            payload,
            added_at,
        }
    }

    /// The variant this candidate becomes once promoted.
    pub fn into_variant(self, id: VariantId, promoted_at: DateTime<Utc>) -> Variant {
        Variant::new(id, self.slot_id, self.payload, promoted_at)
    }
}
