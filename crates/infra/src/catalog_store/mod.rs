//! Read-only catalog boundary.
//!
//! The catalog (item CRUD, CSV import) lives outside this system; the core only
//! needs item identity, type, unit and the stock-management flags.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryCatalog;
pub use postgres::PostgresCatalog;
pub use r#trait::CatalogStore;
