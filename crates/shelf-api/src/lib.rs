//! HTTP surface for the product shelf.
//!
//! [`ShelfApi`] turns `http::Request`s into `http::Response`s without tying
//! itself to a server:
//!
//! | Route | Purpose |
//! |---|---|
//! | `GET /products` | One weighted pick per active slot, never cached |
//! | `POST /track/impression` | Count a render |
//! | `POST /track/click` | Count a click |
//! | `GET /stats` | Lifetime per-variant totals with recent daily history |
//! | `GET /pool` | Pool contents grouped by slot |
//!
//! # Example
//!
//! ```rust,ignore
//! let api = ShelfApi::new(store);
//! let resp = api.handle(request).await;
//! ```

mod api;
pub mod reports;
pub mod response;
pub mod track;

pub use api::{ShelfApi, REQUEST_ID_HEADER};
pub use reports::{PoolReport, SelectedProduct, StatsReport, VariantStats};
pub use track::TrackEvent;
