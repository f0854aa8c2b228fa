//! CLI configuration.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use shelf_core::AnalysisSettings;
use shelf_store::TimeoutConfig;

/// CLI configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShelfConfig {
    /// Where the data lives.
    #[serde(default)]
    pub store: StoreConfig,

    /// Drop, rebalance and promotion thresholds.
    #[serde(default)]
    pub analysis: AnalysisSettings,

    /// Report delivery.
    #[serde(default)]
    pub notify: NotifyConfig,

    /// Environment-specific overrides.
    #[serde(default)]
    pub environments: HashMap<String, EnvironmentConfig>,
}

impl ShelfConfig {
    /// Load config from a file.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        if path.ends_with(".json") {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path))
        } else {
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML config: {}", path))
        }
    }

    /// Get environment-specific config.
    pub fn for_environment(&self, env: &str) -> ShelfConfig {
        let mut config = self.clone();

        if let Some(env_config) = self.environments.get(env) {
            if let Some(ref store) = env_config.store {
                config.store = store.clone();
            }
            if let Some(ref analysis) = env_config.analysis {
                config.analysis = analysis.clone();
            }
            if let Some(ref notify) = env_config.notify {
                config.notify = notify.clone();
            }
        }

        config
    }

    pub fn timeouts(&self) -> TimeoutConfig {
        TimeoutConfig::new(
            Duration::from_millis(self.store.timeout_ms),
            Duration::from_millis(self.notify.timeout_ms),
        )
    }
}

/// Storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// JSON snapshot file holding every table.
    #[serde(default = "default_data_path")]
    pub data_path: String,

    /// Budget for a single store call, in milliseconds.
    #[serde(default = "default_store_timeout")]
    pub timeout_ms: u64,
}

fn default_data_path() -> String {
    ".shelf/data.json".to_string()
}

fn default_store_timeout() -> u64 {
    2_000
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_path: default_data_path(),
            timeout_ms: default_store_timeout(),
        }
    }
}

/// Notification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Whether analysis runs deliver reports at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Write text and HTML reports here. Reports go to the log when unset.
    #[serde(default)]
    pub report_dir: Option<String>,

    /// Budget for delivering one report, in milliseconds.
    #[serde(default = "default_notify_timeout")]
    pub timeout_ms: u64,
}

fn default_true() -> bool {
    true
}

fn default_notify_timeout() -> u64 {
    10_000
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            report_dir: None,
            timeout_ms: default_notify_timeout(),
        }
    }
}

/// Environment-specific configuration overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    #[serde(default)]
    pub store: Option<StoreConfig>,
    #[serde(default)]
    pub analysis: Option<AnalysisSettings>,
    #[serde(default)]
    pub notify: Option<NotifyConfig>,
}

/// Generate a default shelf.toml config file.
pub fn generate_default_config() -> String {
    r#"# Product shelf configuration

[store]
data_path = ".shelf/data.json"
timeout_ms = 2000

[analysis]
min_impressions = 50
min_days = 7
drop_threshold_ratio = 0.5
min_active_variants = 1
target_variants_per_slot = 2
ctr_window_days = 7
notify_only_on_change = true

[notify]
enabled = true
# report_dir = ".shelf/reports"
timeout_ms = 10000

[environments.staging]
[environments.staging.store]
data_path = ".shelf/staging.json"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_parses() {
        let config: ShelfConfig = toml::from_str(&generate_default_config()).unwrap();
        assert_eq!(config.store.data_path, ".shelf/data.json");
        assert_eq!(config.analysis, AnalysisSettings::default());
        assert!(config.notify.enabled);
        assert!(config.notify.report_dir.is_none());
    }

    #[test]
    fn test_partial_sections_use_defaults() {
        let config: ShelfConfig = toml::from_str("[analysis]\nmin_days = 3\n").unwrap();
        assert_eq!(config.analysis.min_days, 3);
        assert_eq!(config.analysis.min_impressions, 50);
        assert_eq!(config.store.timeout_ms, 2_000);
        assert_eq!(config.timeouts().notify, Duration::from_secs(10));
    }

    #[test]
    fn test_environment_override() {
        let config: ShelfConfig = toml::from_str(&generate_default_config()).unwrap();
        assert_eq!(config.for_environment("staging").store.data_path, ".shelf/staging.json");
        assert_eq!(config.for_environment("production").store.data_path, ".shelf/data.json");
    }
}
