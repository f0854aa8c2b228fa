//! Catalog types: slots, the variants competing for them, and the pool of
//! candidates waiting for a turn.

mod pool;
mod slot;
mod variant;

pub use pool::*;
pub use slot::*;
pub use variant::*;
