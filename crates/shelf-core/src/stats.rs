//! Daily impression/click counters and rolling CTR.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::ids::VariantId;

/// Which counter an event increments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Counter {
    /// The variant was rendered.
    Impression,
    /// The variant's link was followed.
    Click,
}

impl Counter {
    pub fn as_str(&self) -> &'static str {
        match self {
            Counter::Impression => "impression",
            Counter::Click => "click",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "impression" | "impressions" => Some(Counter::Impression),
            "click" | "clicks" => Some(Counter::Click),
            _ => None,
        }
    }
}

/// Per-(variant, UTC day) aggregate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailyStat {
    pub variant_id: VariantId,
    pub date: NaiveDate,
    pub impressions: u64,
    pub clicks: u64,
    /// Derived from the counters; recomputed on every write.
    #[serde(default)]
    pub ctr: f64,
}

impl DailyStat {
    /// An empty record for a day.
    pub fn new(variant_id: VariantId, date: NaiveDate) -> Self {
        Self {
            variant_id,
            date,
            impressions: 0,
            clicks: 0,
            ctr: 0.0,
        }
    }

    /// A record with explicit counts.
    pub fn with_counts(variant_id: VariantId, date: NaiveDate, impressions: u64, clicks: u64) -> Self {
        let mut stat = Self::new(variant_id, date);
        stat.impressions = impressions;
        stat.clicks = clicks;
        stat.refresh_ctr();
        stat
    }

    /// Apply one event.
    ///
    /// A click on a day with no recorded impression also counts the
    /// impression it must have followed; impression beacons are lossy.
    pub fn record(&mut self, counter: Counter) {
        match counter {
            Counter::Impression => self.impressions += 1,
            Counter::Click => {
                self.clicks += 1;
                if self.impressions == 0 {
                    self.impressions = 1;
                }
            }
        }
        self.refresh_ctr();
    }

    fn refresh_ctr(&mut self) {
        self.ctr = if self.impressions == 0 {
            0.0
        } else {
            self.clicks as f64 / self.impressions as f64 * 100.0
        };
    }
}

/// Click-through rate in percent across a set of daily records.
///
/// Returns `0.0` when there are no impressions, so new variants rank at the
/// bottom instead of producing NaN.
pub fn rolling_ctr<'a, I>(stats: I) -> f64
where
    I: IntoIterator<Item = &'a DailyStat>,
{
    let (impressions, clicks) = stats
        .into_iter()
        .fold((0u64, 0u64), |(i, c), s| (i + s.impressions, c + s.clicks));

    if impressions == 0 {
        return 0.0;
    }
    clicks as f64 / impressions as f64 * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    fn stat(d: u32, impressions: u64, clicks: u64) -> DailyStat {
        DailyStat::with_counts(VariantId::new("var-a"), day(d), impressions, clicks)
    }

    #[test]
    fn test_ctr_empty_is_zero() {
        let none: Vec<DailyStat> = Vec::new();
        assert_eq!(rolling_ctr(&none), 0.0);
    }

    #[test]
    fn test_ctr_no_impressions_is_zero() {
        assert_eq!(rolling_ctr(&[stat(1, 0, 0)]), 0.0);
    }

    #[test]
    fn test_ctr_single_record() {
        assert_eq!(rolling_ctr(&[stat(1, 100, 5)]), 5.0);
    }

    #[test]
    fn test_ctr_sums_before_dividing() {
        // 6 / 200, not the mean of 10% and 2%
        let stats = [stat(1, 20, 2), stat(2, 180, 4)];
        assert!((rolling_ctr(&stats) - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_record_impression_then_click() {
        let mut s = DailyStat::new(VariantId::new("var-a"), day(1));
        for _ in 0..4 {
            s.record(Counter::Impression);
        }
        s.record(Counter::Click);
        assert_eq!((s.impressions, s.clicks), (4, 1));
        assert_eq!(s.ctr, 25.0);
    }

    #[test]
    fn test_click_first_counts_an_impression() {
        let mut s = DailyStat::new(VariantId::new("var-a"), day(1));
        s.record(Counter::Click);
        assert_eq!((s.impressions, s.clicks), (1, 1));
        assert_eq!(s.ctr, 100.0);
    }

    #[test]
    fn test_counter_parse() {
        assert_eq!(Counter::from_str("Click"), Some(Counter::Click));
        assert_eq!(Counter::from_str("impressions"), Some(Counter::Impression));
        assert_eq!(Counter::from_str("hover"), None);
    }

    proptest! {
        #[test]
        fn prop_ctr_ignores_order(
            counts in prop::collection::vec((0u64..10_000, 0u64..500), 0..20),
            rotate in 0usize..20,
        ) {
            let stats: Vec<DailyStat> = counts
                .iter()
                .enumerate()
                .map(|(i, (imp, clk))| stat((i % 28) as u32 + 1, *imp, *clk))
                .collect();

            let mut shuffled = stats.clone();
            shuffled.reverse();
            if !shuffled.is_empty() {
                let k = rotate % shuffled.len();
                shuffled.rotate_left(k);
            }

            prop_assert_eq!(rolling_ctr(&stats), rolling_ctr(&shuffled));
        }
    }
}
