//! Variant lifecycle engine for the product shelf.
//!
//! Each run walks every active slot and:
//!
//! 1. analyzes its active variants (rolling CTR, lifetime impressions, age)
//! 2. drops eligible variants whose CTR is well below the slot average
//! 3. reweights the survivors in proportion to CTR
//! 4. promotes pool items until the slot reaches its target size
//!
//! The decision steps are pure functions ([`plan_drops`], [`plan_weights`])
//! so they can be tested without a store; [`AnalysisCycle`] wires them to a
//! [`shelf_store::Store`] and reports the outcome to a [`Notifier`].
//!
//! # Example
//!
//! ```rust,ignore
//! use shelf_engine::{AnalysisCycle, FileNotifier};
//!
//! let cycle = AnalysisCycle::new(store, Arc::new(SystemClock), settings)
//!     .with_notifier(Arc::new(FileNotifier::new("reports")));
//! let outcome = cycle.run().await?;
//! println!("{}", outcome.report.subject());
//! ```

pub mod analysis;
pub mod cycle;
pub mod drops;
pub mod notify;
pub mod promote;
pub mod rebalance;
pub mod report;

pub use analysis::{analyze_slot, days_since, is_eligible, VariantAnalysis};
pub use cycle::{AnalysisCycle, CycleOutcome};
pub use drops::{plan_drops, DropDecision, DropPlan, SkipReason};
pub use notify::{FileNotifier, LogNotifier, Notifier, NotifyError};
pub use promote::{top_up, Promotion};
pub use rebalance::{plan_weights, WeightUpdate};
pub use report::{render_html, render_text, CycleReport, DroppedEntry, PromotedEntry};
