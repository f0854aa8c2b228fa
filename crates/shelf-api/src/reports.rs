//! Read-only views served to the page and the admin dashboard.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use shelf_core::{PoolId, ProductPayload, SlotId, Variant, VariantId};
use shelf_store::{AdminStore, StoreError};

/// Daily records shown per variant, newest first.
pub const DAILY_HISTORY: usize = 14;

/// One slot's pick for this page view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedProduct {
    pub slot_id: SlotId,
    pub variant_id: VariantId,
    pub title: String,
    pub author: String,
    pub description: String,
    pub url: String,
    pub image_url: Option<String>,
    pub tags: Vec<String>,
}

impl From<&Variant> for SelectedProduct {
    fn from(v: &Variant) -> Self {
        Self {
            slot_id: v.slot_id.clone(),
            variant_id: v.id.clone(),
            title: v.payload.title.clone(),
            author: v.payload.author.clone(),
            description: v.payload.description.clone(),
            url: v.payload.url.clone(),
            image_url: v.payload.image_url.clone(),
            tags: v.payload.tags.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyEntry {
    pub date: NaiveDate,
    pub impressions: u64,
    pub clicks: u64,
    pub ctr: f64,
}

/// Lifetime performance of one variant, active or dropped.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantStats {
    pub slot_id: SlotId,
    pub slot_name: String,
    pub variant_id: VariantId,
    pub title: String,
    pub author: String,
    pub url: String,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub weight: i32,
    pub created_at: DateTime<Utc>,
    pub dropped_at: Option<DateTime<Utc>>,
    pub drop_reason: Option<String>,
    pub total_impressions: u64,
    pub total_clicks: u64,
    /// Percent with two decimals, e.g. `"3.45"`.
    #[serde(rename = "overallCTR")]
    pub overall_ctr: String,
    pub daily_stats: Vec<DailyEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsReport {
    pub generated_at: DateTime<Utc>,
    pub total_products: usize,
    pub total_variants: usize,
    pub stats: Vec<VariantStats>,
}

/// Per-variant totals for every slot, sorted by slot then by impressions
/// (most first).
pub async fn stats_report<S: AdminStore + ?Sized>(
    store: &S,
    generated_at: DateTime<Utc>,
) -> Result<StatsReport, StoreError> {
    let mut stats = Vec::new();
    let slots = store.list_slots().await?;

    for slot in &slots {
        for variant in store.list_all_variants(&slot.id).await? {
            let mut daily = store.all_daily_stats(&variant.id).await?;
            let total_impressions: u64 = daily.iter().map(|d| d.impressions).sum();
            let total_clicks: u64 = daily.iter().map(|d| d.clicks).sum();

            daily.sort_by(|a, b| b.date.cmp(&a.date));
            let daily_stats = daily
                .into_iter()
                .take(DAILY_HISTORY)
                .map(|d| DailyEntry {
                    date: d.date,
                    impressions: d.impressions,
                    clicks: d.clicks,
                    ctr: d.ctr,
                })
                .collect();

            let weight = variant.effective_weight() as i32;
            stats.push(VariantStats {
                slot_id: slot.id.clone(),
                slot_name: slot.name.clone(),
                variant_id: variant.id,
                title: variant.payload.title,
                author: variant.payload.author,
                url: variant.payload.url,
                image_url: variant.payload.image_url,
                is_active: variant.active,
                weight,
                created_at: variant.created_at,
                dropped_at: variant.dropped_at,
                drop_reason: variant.drop_reason,
                total_impressions,
                total_clicks,
                overall_ctr: format_ctr(total_impressions, total_clicks),
                daily_stats,
            });
        }
    }

    stats.sort_by(|a, b| {
        a.slot_id
            .cmp(&b.slot_id)
            .then(b.total_impressions.cmp(&a.total_impressions))
    });

    let mut products: Vec<&SlotId> = stats.iter().map(|s| &s.slot_id).collect();
    products.dedup();

    Ok(StatsReport {
        generated_at,
        total_products: products.len(),
        total_variants: stats.len(),
        stats,
    })
}

fn format_ctr(impressions: u64, clicks: u64) -> String {
    if impressions == 0 {
        return "0.00".to_string();
    }
    format!("{:.2}", clicks as f64 / impressions as f64 * 100.0)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolEntry {
    pub pool_id: PoolId,
    #[serde(flatten)]
    pub payload: ProductPayload,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolReport {
    pub total_items: usize,
    pub counts_by_slot: BTreeMap<SlotId, usize>,
    pub items_by_slot: BTreeMap<SlotId, Vec<PoolEntry>>,
}

/// Everything waiting in the pool, grouped by slot.
pub async fn pool_report<S: AdminStore + ?Sized>(store: &S) -> Result<PoolReport, StoreError> {
    let items = store.list_pool_items(None).await?;
    let counts_by_slot = store.pool_counts().await?;

    let total_items = items.len();
    let mut items_by_slot: BTreeMap<SlotId, Vec<PoolEntry>> = BTreeMap::new();
    for item in items {
        items_by_slot.entry(item.slot_id).or_default().push(PoolEntry {
            pool_id: item.pool_id,
            payload: item.payload,
            added_at: item.added_at,
        });
    }

    Ok(PoolReport {
        total_items,
        counts_by_slot,
        items_by_slot,
    })
}
