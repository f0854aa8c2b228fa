//! Delivering cycle reports to operators.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use shelf_core::RunId;
use shelf_observability::StructuredLogger;
use thiserror::Error;

use crate::report::{render_html, render_text, CycleReport};

/// Errors raised while delivering a notification.
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Notification I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Notification timed out after {0:?}")]
    Timeout(Duration),

    #[error("Notification rejected: {0}")]
    Delivery(String),
}

/// Receives the outcome of every analysis run.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// A run finished and changed something (or the caller asked to always send).
    async fn notify(&self, report: &CycleReport) -> Result<(), NotifyError>;

    /// A run aborted.
    async fn notify_failure(&self, run_id: &RunId, error: &str) -> Result<(), NotifyError>;
}

/// Writes reports to the structured log.
pub struct LogNotifier {
    logger: StructuredLogger,
}

impl LogNotifier {
    pub fn new(logger: StructuredLogger) -> Self {
        Self { logger }
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, report: &CycleReport) -> Result<(), NotifyError> {
        let pool = serde_json::to_string(&report.pool_counts_by_slot)
            .map_err(|e| NotifyError::Delivery(e.to_string()))?;
        self.logger
            .info_builder(report.subject())
            .field("run_id", &report.run_id)
            .field_i64("impressions", report.total_impressions as i64)
            .field_i64("clicks", report.total_clicks as i64)
            .field("pool", pool)
            .emit();
        Ok(())
    }

    async fn notify_failure(&self, run_id: &RunId, error: &str) -> Result<(), NotifyError> {
        self.logger
            .error_builder("A/B analysis failed")
            .field("run_id", run_id)
            .field("error", error)
            .emit();
        Ok(())
    }
}

/// Writes `.txt` and `.html` report files into a directory.
pub struct FileNotifier {
    dir: PathBuf,
}

impl FileNotifier {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }
}

#[async_trait]
impl Notifier for FileNotifier {
    async fn notify(&self, report: &CycleReport) -> Result<(), NotifyError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let stem = format!("{}-{}", report.date, report.run_id);

        let text = format!("Subject: {}\n\n{}", report.subject(), render_text(report));
        tokio::fs::write(self.dir.join(format!("{}.txt", stem)), text).await?;
        tokio::fs::write(self.dir.join(format!("{}.html", stem)), render_html(report)).await?;
        Ok(())
    }

    async fn notify_failure(&self, run_id: &RunId, error: &str) -> Result<(), NotifyError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let body = format!("Subject: A/B Testing Failure - {}\n\n{}\n", run_id, error);
        tokio::fs::write(self.dir.join(format!("{}-failed.txt", run_id)), body).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use shelf_core::SlotId;
    use shelf_observability::LogSink;

    fn report() -> CycleReport {
        let mut report = CycleReport::new(RunId::new("run-abc"), NaiveDate::from_ymd_opt(2025, 3, 10).unwrap());
        report.pool_counts_by_slot.insert(SlotId::new("slot-1"), 3);
        report
    }

    #[tokio::test]
    async fn test_log_notifier_emits_subject() {
        let (sink, lines) = LogSink::memory();
        let notifier = LogNotifier::new(StructuredLogger::new("run-abc").with_sink(sink));

        notifier.notify(&report()).await.unwrap();
        notifier.notify_failure(&RunId::new("run-abc"), "boom").await.unwrap();

        let lines = lines.lock().unwrap();
        assert!(lines[0].contains("A/B Testing Update - 0 dropped, 0 promoted"));
        assert!(lines[0].contains(r#"\"slot-1\":3"#));
        assert!(lines[1].contains("boom"));
    }

    #[tokio::test]
    async fn test_file_notifier_writes_both_bodies() {
        let dir = std::env::temp_dir().join(format!("shelf-notify-{}", std::process::id()));
        let notifier = FileNotifier::new(&dir);

        notifier.notify(&report()).await.unwrap();
        let text = std::fs::read_to_string(dir.join("2025-03-10-run-abc.txt")).unwrap();
        assert!(text.starts_with("Subject: A/B Testing Update"));
        assert!(dir.join("2025-03-10-run-abc.html").exists());

        notifier.notify_failure(&RunId::new("run-abc"), "store down").await.unwrap();
        let failed = std::fs::read_to_string(dir.join("run-abc-failed.txt")).unwrap();
        assert!(failed.contains("store down"));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
