//! Tuning knobs for the analysis cycle.

use serde::{Deserialize, Serialize};

use crate::error::ShelfError;

/// Thresholds and targets used by the scheduled analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// Lifetime impressions a variant needs before it can be judged.
    pub min_impressions: u64,
    /// Age in days a variant needs before it can be judged.
    pub min_days: i64,
    /// Fraction of the slot's average CTR below which a variant is dropped.
    pub drop_threshold_ratio: f64,
    /// Active variants a slot never drops below.
    pub min_active_variants: usize,
    /// Active variants the pool tops a slot up to.
    pub target_variants_per_slot: usize,
    /// Days of stats feeding the rolling CTR.
    pub ctr_window_days: i64,
    /// Only notify when the cycle dropped or promoted something.
    pub notify_only_on_change: bool,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            min_impressions: 50,
            min_days: 7,
            drop_threshold_ratio: 0.5,
            min_active_variants: 1,
            target_variants_per_slot: 2,
            ctr_window_days: 7,
            notify_only_on_change: true,
        }
    }
}

impl AnalysisSettings {
    /// Apply `AB_*` overrides from the process environment.
    pub fn with_env_overrides(self) -> Result<Self, ShelfError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply `AB_*` overrides from an arbitrary lookup.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ShelfError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("AB_MIN_IMPRESSIONS") {
            self.min_impressions = parse_env("AB_MIN_IMPRESSIONS", &v)?;
        }
        if let Some(v) = lookup("AB_MIN_DAYS") {
            self.min_days = parse_env("AB_MIN_DAYS", &v)?;
        }
        if let Some(v) = lookup("AB_DROP_THRESHOLD") {
            self.drop_threshold_ratio = parse_env("AB_DROP_THRESHOLD", &v)?;
        }
        if let Some(v) = lookup("AB_MIN_VARIANTS") {
            self.min_active_variants = parse_env("AB_MIN_VARIANTS", &v)?;
        }
        if let Some(v) = lookup("AB_TARGET_VARIANTS") {
            self.target_variants_per_slot = parse_env("AB_TARGET_VARIANTS", &v)?;
        }
        self.validate()?;
        Ok(self)
    }

    /// Reject settings the engine cannot honor.
    pub fn validate(&self) -> Result<(), ShelfError> {
        if !self.drop_threshold_ratio.is_finite() || self.drop_threshold_ratio < 0.0 {
            return Err(ShelfError::Validation(format!(
                "drop_threshold_ratio must be a non-negative number, got {}",
                self.drop_threshold_ratio
            )));
        }
        if self.min_days < 0 {
            return Err(ShelfError::Validation("min_days must not be negative".to_string()));
        }
        if self.ctr_window_days < 1 {
            return Err(ShelfError::Validation("ctr_window_days must be at least 1".to_string()));
        }
        Ok(())
    }

    /// The floor on active variants; a slot always keeps at least one.
    pub fn active_floor(&self) -> usize {
        self.min_active_variants.max(1)
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ShelfError> {
    value
        .trim()
        .parse()
        .map_err(|_| ShelfError::Validation(format!("{} has invalid value {:?}", key, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let s = AnalysisSettings::default();
        assert_eq!(s.min_impressions, 50);
        assert_eq!(s.min_days, 7);
        assert_eq!(s.drop_threshold_ratio, 0.5);
        assert_eq!(s.target_variants_per_slot, 2);
        assert_eq!(s.active_floor(), 1);
    }

    #[test]
    fn test_overrides_apply() {
        let env: HashMap<&str, &str> = [("AB_MIN_IMPRESSIONS", "200"), ("AB_DROP_THRESHOLD", "0.25")]
            .into_iter()
            .collect();
        let s = AnalysisSettings::default()
            .with_overrides(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(s.min_impressions, 200);
        assert_eq!(s.drop_threshold_ratio, 0.25);
        assert_eq!(s.min_days, 7);
    }

    #[test]
    fn test_bad_override_rejected() {
        let err = AnalysisSettings::default()
            .with_overrides(|k| (k == "AB_MIN_DAYS").then(|| "seven".to_string()))
            .unwrap_err();
        assert!(err.is_client_error());
    }

    #[test]
    fn test_floor_never_zero() {
        let s = AnalysisSettings {
            min_active_variants: 0,
            ..AnalysisSettings::default()
        };
        assert_eq!(s.active_floor(), 1);
    }

    #[test]
    fn test_partial_toml_like_input_uses_defaults() {
        let s: AnalysisSettings = serde_json::from_str(r#"{"min_days": 3}"#).unwrap();
        assert_eq!(s.min_days, 3);
        assert_eq!(s.min_impressions, 50);
    }
}
