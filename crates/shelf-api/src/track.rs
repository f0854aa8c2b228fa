//! Impression and click events from the browser.

use serde::Deserialize;
use shelf_core::{Counter, ShelfError, VariantId};

/// Event body. Only `variantId` is used; the rest is accepted for
/// forward compatibility with richer clients.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TrackEvent {
    #[serde(default)]
    pub variant_id: Option<String>,
    #[serde(default)]
    pub slot_id: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub page: Option<String>,
}

impl TrackEvent {
    /// Parse a request body and pull out the variant it counts against.
    pub fn parse(body: &[u8]) -> Result<(Self, VariantId), ShelfError> {
        let event: TrackEvent = serde_json::from_slice(body)?;
        let variant_id = event
            .variant_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(VariantId::from)
            .ok_or_else(|| ShelfError::Validation("variantId is required".to_string()))?;
        Ok((event, variant_id))
    }
}

/// The counter a tracking path increments.
pub fn counter_for_path(path: &str) -> Option<Counter> {
    path.strip_prefix("/track/").and_then(Counter::from_str)
}
