//! `bomledger-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! identifiers, fixed-precision quantities, the domain error taxonomy and the
//! aggregate/optimistic-concurrency traits shared by the BOM and ledger crates.

pub mod aggregate;
pub mod entity;
pub mod error;
pub mod id;
pub mod quantity;
pub mod value_object;

pub use aggregate::{Aggregate, AggregateRoot, ExpectedVersion};
pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{BatchId, ItemId, RevisionId, TransactionId};
pub use quantity::{QUANTITY_INTEGER_DIGITS, QUANTITY_SCALE, Quantity};
pub use value_object::ValueObject;
