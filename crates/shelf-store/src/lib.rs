//! Storage layer for the product shelf.
//!
//! A [`KvBackend`] holds versioned rows. [`TableStore`] lays slots, variants,
//! pool items and daily stats out over it as partitioned tables and exposes
//! them through the [`Store`] and [`AdminStore`] traits. [`TimedStore`] bounds
//! every call with a time budget.
//!
//! # Example
//!
//! ```rust,ignore
//! use shelf_store::prelude::*;
//!
//! let kv = Arc::new(MemoryKv::open(".shelf/store.json")?);
//! let store = TableStore::new(kv.clone(), Arc::new(SystemClock));
//!
//! store.increment_daily_counter(&variant_id, Counter::Impression).await?;
//! kv.save()?;
//! ```

mod error;
mod kv;
mod store;
mod table;
mod timeout;

pub use error::StoreError;
pub use kv::{Expect, KvBackend, KvJson, MemoryKv, Versioned};
pub use store::{AdminStore, ResetCounts, Store};
pub use table::TableStore;
pub use timeout::{with_timeout, TimedStore, TimeoutConfig};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        AdminStore, KvBackend, MemoryKv, Store, StoreError, TableStore, TimedStore, TimeoutConfig,
    };
}
