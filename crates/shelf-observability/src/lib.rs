//! Observability for the product shelf.
//!
//! This crate provides:
//! - `StructuredLogger` - Structured logging with a correlation id
//! - `RunMetrics` - Per-slot timings and outcome counts for an analysis run

mod logging;
mod metrics;

pub use logging::*;
pub use metrics::*;

// Correlation ids live in shelf-core; re-exported for convenience
pub use shelf_core::{RequestId, RunId};
