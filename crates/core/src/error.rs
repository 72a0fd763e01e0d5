//! Domain error model.

use thiserror::Error;

use crate::id::ItemId;
use crate::quantity::Quantity;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// invariants, conflicts, stock rules). Storage concerns belong to infra.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Malformed input (empty BOM, wrong item type, ...).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A quantity was zero, negative or otherwise unusable.
    #[error("invalid quantity: {0}")]
    InvalidQuantity(String),

    /// A domain invariant was violated (e.g. a BOM cycle).
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// Unknown item, assembly or revision.
    #[error("not found: {0}")]
    NotFound(String),

    /// Revision deletion ambiguity, duplicate BOM line, stale version.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The assembly has no current revision to resolve.
    #[error("assembly {0} has no current BOM revision")]
    BomMissing(ItemId),

    /// Posting would drive stock below zero.
    #[error("insufficient stock for item {item_id}: available {available}, requested {requested}")]
    InsufficientStock {
        item_id: ItemId,
        available: Quantity,
        requested: Quantity,
    },

    /// The item is excluded from the ledger.
    #[error("item {0} is not stock-managed")]
    NotManaged(ItemId),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_quantity(msg: impl Into<String>) -> Self {
        Self::InvalidQuantity(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }
}
