//! Infrastructure + service error types.

use thiserror::Error;

use bomledger_core::DomainError;
use bomledger_production::RowFailure;

/// Store operation error.
///
/// These are **infrastructure errors** (storage, concurrency, corrupt rows) as
/// opposed to domain errors (validation, invariants, stock rules).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Another writer changed the record/ledger since it was read.
    #[error("optimistic concurrency check failed: {0}")]
    Concurrency(String),

    /// A row-level constraint rejected the write.
    #[error("constraint violation: {0}")]
    Constraint(String),

    /// Stored data could not be mapped back to the domain model.
    #[error("corrupt stored data: {0}")]
    Corrupt(String),

    /// The backend is unreachable or failed (connection, commit, lock poisoning).
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Error returned by the BOM / stock services and the batch executor.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ServiceError {
    /// Reason code used when this error fails a batch row.
    pub fn row_failure(&self) -> RowFailure {
        match self {
            ServiceError::Domain(e) => RowFailure::from(e),
            ServiceError::Store(_) => RowFailure::StorageError,
        }
    }

    pub fn domain(&self) -> Option<&DomainError> {
        match self {
            ServiceError::Domain(e) => Some(e),
            ServiceError::Store(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bomledger_core::ItemId;

    #[test]
    fn storage_failures_are_generic_row_failures() {
        let err = ServiceError::from(StoreError::Concurrency("stale".into()));
        assert_eq!(err.row_failure(), RowFailure::StorageError);

        let err = ServiceError::from(DomainError::BomMissing(ItemId::new()));
        assert_eq!(err.row_failure(), RowFailure::BomMissing);
    }
}
