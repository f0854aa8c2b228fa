//! Page placements.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::SlotId;

/// A named placement on a page that serves one variant at a time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    /// Unique slot identifier.
    pub id: SlotId,
    /// Human-facing name (e.g. "DevOps Culture").
    pub name: String,
    /// Inactive slots are neither served nor analyzed.
    pub active: bool,
    /// When the slot was seeded.
    pub created_at: DateTime<Utc>,
}

impl Slot {
    /// Create an active slot.
    pub fn new(id: SlotId, name: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: name.into(),
            active: true,
            created_at,
        }
    }
}
