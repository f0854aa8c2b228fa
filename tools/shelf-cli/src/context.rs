//! CLI execution context.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result};
use shelf_core::SystemClock;
use shelf_observability::{LogFormat, LogLevel, StructuredLogger};
use shelf_store::{MemoryKv, TableStore, TimedStore};

use crate::config::ShelfConfig;
use crate::output::Output;

const CONFIG_NAMES: [&str; 3] = ["shelf.toml", ".shelf.toml", "shelf.json"];

/// Execution context for CLI commands.
pub struct Context {
    /// CLI configuration, with environment overrides applied.
    pub config: ShelfConfig,
    /// Output handler.
    pub output: Output,
    /// Working directory.
    pub cwd: PathBuf,
}

/// An opened data file.
pub struct Shelf {
    pub store: Arc<TimedStore<TableStore>>,
    kv: Arc<MemoryKv>,
}

impl Shelf {
    /// Write every change back to the data file.
    pub fn persist(&self) -> Result<()> {
        self.kv.save().context("Failed to save data file")
    }
}

impl Context {
    /// Load context from config file.
    pub fn load(config_path: Option<&str>, env: Option<&str>, output: Output) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;

        let config = if let Some(path) = config_path {
            ShelfConfig::load(path)?
        } else {
            Self::find_config(&cwd).unwrap_or_default()
        };
        let config = match env {
            Some(env) => config.for_environment(env),
            None => config,
        };

        Ok(Self { config, output, cwd })
    }

    /// Find config file in directory tree.
    fn find_config(start: &Path) -> Option<ShelfConfig> {
        let mut current = start.to_path_buf();
        loop {
            for name in &CONFIG_NAMES {
                let config_path = current.join(name);
                if config_path.exists() {
                    if let Ok(config) = ShelfConfig::load(config_path.to_str()?) {
                        return Some(config);
                    }
                }
            }

            if !current.pop() {
                break;
            }
        }

        None
    }

    /// Path of the config file in the working directory, if any.
    pub fn local_config_file(&self) -> Option<PathBuf> {
        CONFIG_NAMES
            .iter()
            .map(|name| self.cwd.join(name))
            .find(|path| path.exists())
    }

    /// Open the data file named by `store.data_path`.
    pub fn open_store(&self) -> Result<Shelf> {
        let path = self.resolve_path(&self.config.store.data_path);
        self.output.debug(&format!("Opening data file {}", path.display()));

        let kv = Arc::new(
            MemoryKv::open(&path).with_context(|| format!("Failed to open data file: {}", path.display()))?,
        );
        let table = TableStore::new(kv.clone(), Arc::new(SystemClock));
        let store = Arc::new(TimedStore::new(table, self.config.timeouts()));
        Ok(Shelf { store, kv })
    }

    /// Logger for library components. Human-readable unless `--json`.
    pub fn logger(&self, component: &str) -> StructuredLogger {
        let format = if self.output.is_json() {
            LogFormat::Json
        } else {
            LogFormat::Human
        };
        let level = if self.output.is_verbose() {
            LogLevel::Debug
        } else {
            LogLevel::Warn
        };
        StructuredLogger::new("-")
            .with_component(component)
            .with_format(format)
            .with_min_level(level)
    }

    /// Directory for report files, if reports go to disk.
    pub fn report_dir(&self) -> Option<PathBuf> {
        self.config.notify.report_dir.as_deref().map(|dir| self.resolve_path(dir))
    }

    /// Resolve a path relative to the working directory.
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        if PathBuf::from(path).is_absolute() {
            PathBuf::from(path)
        } else {
            self.cwd.join(path)
        }
    }
}
