//! Admin seeding payloads, parsed and validated at the boundary.

use serde::{Deserialize, Serialize};

use crate::catalog::ProductPayload;
use crate::error::ShelfError;
use crate::ids::SlotId;

/// A slot plus the variants it starts with.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SlotSeed {
    pub slot_id: SlotId,
    pub slot_name: String,
    #[serde(default)]
    pub variants: Vec<ProductPayload>,
}

/// Request body for seeding slots and their initial variants.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductSeed {
    pub products: Vec<SlotSeed>,
}

impl ProductSeed {
    /// Parse and validate. Any invalid entry rejects the whole request.
    pub fn parse(bytes: &[u8]) -> Result<Self, ShelfError> {
        let seed: ProductSeed = serde_json::from_slice(bytes)?;
        seed.validate()?;
        Ok(seed)
    }

    pub fn validate(&self) -> Result<(), ShelfError> {
        if self.products.is_empty() {
            return Err(ShelfError::Validation("products array is required".to_string()));
        }
        for (i, slot) in self.products.iter().enumerate() {
            if slot.slot_id.is_blank() {
                return Err(ShelfError::Validation(format!("products[{}]: slotId is required", i)));
            }
            if slot.slot_id.as_str().contains(':') {
                return Err(ShelfError::Validation(format!(
                    "products[{}]: slotId must not contain ':'",
                    i
                )));
            }
            for (j, variant) in slot.variants.iter().enumerate() {
                variant.validate().map_err(|e| {
                    ShelfError::Validation(format!("products[{}].variants[{}]: {}", i, j, e))
                })?;
            }
        }
        Ok(())
    }
}

/// One pool candidate in a seed request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PoolSeedEntry {
    pub slot_id: SlotId,
    #[serde(flatten)]
    pub payload: ProductPayload,
}

/// An entry that was left out of a pool seed, and why.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SkippedEntry {
    pub index: usize,
    pub reason: String,
}

/// Request body for adding candidates to the pool.
///
/// Entries are kept raw so one bad candidate does not sink the batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolSeed {
    pub products: Vec<serde_json::Value>,
    #[serde(default)]
    pub clear_existing: bool,
}

impl PoolSeed {
    pub fn parse(bytes: &[u8]) -> Result<Self, ShelfError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Split into valid entries and skipped ones.
    pub fn partition(&self) -> (Vec<PoolSeedEntry>, Vec<SkippedEntry>) {
        let mut accepted = Vec::new();
        let mut skipped = Vec::new();

        for (index, raw) in self.products.iter().enumerate() {
            let parsed = serde_json::from_value::<PoolSeedEntry>(raw.clone())
                .map_err(ShelfError::from)
                .and_then(|entry| {
                    if entry.slot_id.is_blank() {
                        return Err(ShelfError::Validation("slotId is required".to_string()));
                    }
                    if entry.slot_id.as_str().contains(':') {
                        return Err(ShelfError::Validation("slotId must not contain ':'".to_string()));
                    }
                    entry.payload.validate()?;
                    Ok(entry)
                });

            match parsed {
                Ok(entry) => accepted.push(entry),
                Err(e) => skipped.push(SkippedEntry {
                    index,
                    reason: e.to_string(),
                }),
            }
        }

        (accepted, skipped)
    }
}
