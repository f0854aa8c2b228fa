//! Domain types and pure decision math for the affiliate product shelf.
//!
//! The shelf serves one product variant per page slot, picked at random in
//! proportion to each variant's weight, and counts impressions and clicks per
//! variant per day. This crate holds everything that needs no I/O:
//!
//! - **Catalog**: slots, variants, pool items and their display payload
//! - **Stats**: daily counters and rolling click-through rate
//! - **Selection**: weighted random pick over a slot's active variants
//! - **Settings**: analysis thresholds with `AB_*` environment overrides
//! - **Seed**: admin seeding payloads, validated at the boundary
//!
//! # Example
//!
//! ```rust,ignore
//! use shelf_core::prelude::*;
//!
//! let variants = store.list_active_variants(&slot_id).await?;
//! match select_weighted(&variants, &mut rand::thread_rng()) {
//!     Ok(variant) => render(variant),
//!     Err(ShelfError::NoActiveVariants(_)) => render_fallback(),
//!     Err(e) => return Err(e),
//! }
//! ```

pub mod catalog;
pub mod clock;
pub mod error;
pub mod ids;
pub mod seed;
pub mod select;
pub mod settings;
pub mod stats;

pub use catalog::{PoolItem, ProductPayload, Slot, Variant, DEFAULT_WEIGHT};
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::ShelfError;
pub use ids::*;
pub use select::select_weighted;
pub use settings::AnalysisSettings;
pub use stats::{rolling_ctr, Counter, DailyStat};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::catalog::{PoolItem, ProductPayload, Slot, Variant, DEFAULT_WEIGHT};
    pub use crate::clock::{Clock, FixedClock, SystemClock};
    pub use crate::error::ShelfError;
    pub use crate::ids::*;
    pub use crate::seed::{PoolSeed, PoolSeedEntry, ProductSeed, SlotSeed};
    pub use crate::select::select_weighted;
    pub use crate::settings::AnalysisSettings;
    pub use crate::stats::{rolling_ctr, Counter, DailyStat};
}
