//! Per-row execution state machine.

use serde::{Deserialize, Serialize};

use bomledger_core::DomainError;

/// Lifecycle of one batch row: `Pending -> Resolving -> Posting -> Succeeded | Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowState {
    Pending,
    Resolving,
    Posting,
    Succeeded,
    Failed,
}

impl RowState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RowState::Succeeded | RowState::Failed)
    }

    pub fn can_transition_to(&self, next: RowState) -> bool {
        use RowState::*;
        matches!(
            (self, next),
            (Pending, Resolving)
                | (Pending, Failed)
                | (Resolving, Posting)
                | (Resolving, Failed)
                | (Posting, Succeeded)
                | (Posting, Failed)
        )
    }
}

/// Tracks one row through its states, refusing illegal transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowProgress {
    row: usize,
    state: RowState,
    trail: Vec<RowState>,
}

impl RowProgress {
    pub fn new(row: usize) -> Self {
        Self {
            row,
            state: RowState::Pending,
            trail: vec![RowState::Pending],
        }
    }

    pub fn row(&self) -> usize {
        self.row
    }

    pub fn state(&self) -> RowState {
        self.state
    }

    /// Every state visited, in order.
    pub fn trail(&self) -> &[RowState] {
        &self.trail
    }

    pub fn advance(&mut self, next: RowState) -> Result<(), DomainError> {
        if !self.state.can_transition_to(next) {
            return Err(DomainError::invariant(format!(
                "row {}: illegal transition {:?} -> {:?}",
                self.row, self.state, next
            )));
        }
        self.state = next;
        self.trail.push(next);
        Ok(())
    }

    /// Move to `Failed` from any non-terminal state.
    pub fn fail(&mut self) {
        if !self.state.is_terminal() {
            self.state = RowState::Failed;
            self.trail.push(RowState::Failed);
        }
    }
}

/// Reason code recorded for a failed row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowFailure {
    InvalidQuantity,
    Validation,
    NotFound,
    NotManaged,
    BomMissing,
    InsufficientStock,
    Conflict,
    StorageError,
}

impl RowFailure {
    pub fn as_str(&self) -> &'static str {
        match self {
            RowFailure::InvalidQuantity => "invalid_quantity",
            RowFailure::Validation => "validation",
            RowFailure::NotFound => "not_found",
            RowFailure::NotManaged => "not_managed",
            RowFailure::BomMissing => "bom_missing",
            RowFailure::InsufficientStock => "insufficient_stock",
            RowFailure::Conflict => "conflict",
            RowFailure::StorageError => "storage_error",
        }
    }
}

impl From<&DomainError> for RowFailure {
    fn from(err: &DomainError) -> Self {
        match err {
            DomainError::Validation(_) | DomainError::InvalidId(_) => RowFailure::Validation,
            DomainError::InvalidQuantity(_) => RowFailure::InvalidQuantity,
            DomainError::NotFound(_) => RowFailure::NotFound,
            DomainError::Conflict(_) => RowFailure::Conflict,
            DomainError::BomMissing(_) => RowFailure::BomMissing,
            DomainError::InsufficientStock { .. } => RowFailure::InsufficientStock,
            DomainError::NotManaged(_) => RowFailure::NotManaged,
            // Broken stored data is reported like any other storage-side failure.
            DomainError::InvariantViolation(_) => RowFailure::StorageError,
        }
    }
}
