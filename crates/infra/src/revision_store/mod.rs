//! BOM revision persistence: revision headers, their lines and the per-assembly
//! head record, committed atomically per decision.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryRevisionStore;
pub use postgres::PostgresRevisionStore;
pub use r#trait::{RevisionStore, advance_head};
