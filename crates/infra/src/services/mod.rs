//! Application services: compose the stores with the pure domain crates.
//!
//! Services load state from the stores, let the domain decide, and commit the
//! result under optimistic concurrency. They contain no IO of their own.

pub mod bom;
pub mod stock;

pub use bom::{BomService, BomView};
pub use stock::StockService;
