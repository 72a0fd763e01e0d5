//! Catalog read model.
//!
//! Item attributes are owned and edited by the catalog; the BOM and ledger
//! crates only read identity, type, unit and the stock-management flags.

pub mod item;

pub use item::{AssemblyDetail, ComponentDetail, Item, ItemDetail, ItemType, ManagedUnit};
