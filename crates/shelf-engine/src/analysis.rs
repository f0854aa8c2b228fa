//! Per-variant performance snapshot and review eligibility.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use futures::future::try_join_all;
use shelf_core::{rolling_ctr, AnalysisSettings, Variant};
use shelf_store::{Store, StoreError};

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// What the cycle knows about one variant when it makes decisions.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantAnalysis {
    pub variant: Variant,
    /// Rolling CTR in percent over the stats window.
    pub ctr: f64,
    /// Lifetime impressions.
    pub impressions: u64,
    pub window_impressions: u64,
    pub window_clicks: u64,
    pub days_active: i64,
    pub eligible: bool,
}

/// Whole days between two instants, rounded up.
///
/// Partial days count as full ones, so a variant created 6.1 days ago
/// is 7 days old.
pub fn days_since(created_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let ms = (now - created_at).num_milliseconds().abs();
    (ms + DAY_MS - 1) / DAY_MS
}

/// Whether a variant has enough traffic and age to be judged.
pub fn is_eligible(impressions: u64, days_active: i64, settings: &AnalysisSettings) -> bool {
    impressions >= settings.min_impressions && days_active >= settings.min_days
}

/// First day of the rolling window ending `today`.
pub fn window_start(today: NaiveDate, settings: &AnalysisSettings) -> NaiveDate {
    today - Duration::days(settings.ctr_window_days)
}

/// Fetch stats for one variant and judge it.
pub async fn analyze_variant<S: Store + ?Sized>(
    store: &S,
    variant: &Variant,
    now: DateTime<Utc>,
    settings: &AnalysisSettings,
) -> Result<VariantAnalysis, StoreError> {
    let since = window_start(now.date_naive(), settings);
    let (stats, impressions) = futures::try_join!(
        store.daily_stats(&variant.id, since),
        store.total_impressions(&variant.id),
    )?;

    let days_active = days_since(variant.created_at, now);
    Ok(VariantAnalysis {
        variant: variant.clone(),
        ctr: rolling_ctr(&stats),
        impressions,
        window_impressions: stats.iter().map(|s| s.impressions).sum(),
        window_clicks: stats.iter().map(|s| s.clicks).sum(),
        days_active,
        eligible: is_eligible(impressions, days_active, settings),
    })
}

/// Analyze every variant of a slot concurrently. Output keeps input order.
pub async fn analyze_slot<S: Store + ?Sized>(
    store: &S,
    variants: &[Variant],
    now: DateTime<Utc>,
    settings: &AnalysisSettings,
) -> Result<Vec<VariantAnalysis>, StoreError> {
    try_join_all(
        variants
            .iter()
            .map(|variant| analyze_variant(store, variant, now, settings)),
    )
    .await
}
