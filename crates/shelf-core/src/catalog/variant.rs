//! Variant records and their display payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ShelfError;
use crate::ids::{SlotId, VariantId};

/// Selection weight given to new variants, and to any variant whose stored
/// weight is not positive.
pub const DEFAULT_WEIGHT: i32 = 100;

fn default_weight() -> i32 {
    DEFAULT_WEIGHT
}

/// What the widget renders for a product. Opaque to the engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProductPayload {
    /// Product title.
    pub title: String,
    /// Author or brand line.
    #[serde(default)]
    pub author: String,
    /// Short blurb.
    #[serde(default)]
    pub description: String,
    /// Affiliate link.
    #[serde(alias = "amazonUrl")]
    pub url: String,
    /// Cover or product image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Free-form tags shown as chips.
    #[serde(default)]
    pub tags: Vec<String>,
}

impl ProductPayload {
    /// Create a payload with the two required fields.
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            ..Self::default()
        }
    }

    /// Set the author line.
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    /// Set the image URL.
    pub fn with_image(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }

    /// Add a tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Reject payloads the widget could not render.
    pub fn validate(&self) -> Result<(), ShelfError> {
        if self.title.trim().is_empty() {
            return Err(ShelfError::Validation("title is required".to_string()));
        }
        if self.url.trim().is_empty() {
            return Err(ShelfError::Validation("url is required".to_string()));
        }
        if self.tags.iter().any(|t| t.trim().is_empty()) {
            return Err(ShelfError::Validation("tags must not be blank".to_string()));
        }
        Ok(())
    }
}

/// A product candidate bound to one slot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    /// Unique variant identifier.
    pub id: VariantId,
    /// Owning slot.
    pub slot_id: SlotId,
    /// Display payload.
    #[serde(flatten)]
    pub payload: ProductPayload,
    /// Whether the variant is in rotation.
    pub active: bool,
    /// Relative selection weight.
    #[serde(default = "default_weight")]
    pub weight: i32,
    /// When the variant entered rotation.
    pub created_at: DateTime<Utc>,
    /// When the variant was taken out of rotation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dropped_at: Option<DateTime<Utc>>,
    /// Why it was taken out of rotation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drop_reason: Option<String>,
}

impl Variant {
    /// Create an active variant at the default weight.
    pub fn new(
        id: VariantId,
        slot_id: SlotId,
        payload: ProductPayload,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            slot_id,
            payload,
            active: true,
            weight: DEFAULT_WEIGHT,
            created_at,
            dropped_at: None,
            drop_reason: None,
        }
    }

    /// Weight used for selection. Non-positive stored weights fall back to
    /// [`DEFAULT_WEIGHT`].
    pub fn effective_weight(&self) -> u32 {
        if self.weight > 0 {
            self.weight as u32
        } else {
            DEFAULT_WEIGHT as u32
        }
    }

    /// Take the variant out of rotation, keeping it for audit.
    pub fn deactivate(&mut self, reason: impl Into<String>, at: DateTime<Utc>) {
        self.active = false;
        self.weight = 0;
        self.dropped_at = Some(at);
        self.drop_reason = Some(reason.into());
    }
}
