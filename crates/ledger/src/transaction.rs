use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bomledger_core::{BatchId, DomainError, Entity, ItemId, Quantity, TransactionId};

/// Classification of a ledger row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    In,
    Out,
    Adjust,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::In => "IN",
            TransactionType::Out => "OUT",
            TransactionType::Adjust => "ADJUST",
        }
    }
}

impl core::str::FromStr for TransactionType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "IN" => Ok(TransactionType::In),
            "OUT" => Ok(TransactionType::Out),
            "ADJUST" => Ok(TransactionType::Adjust),
            other => Err(DomainError::validation(format!("unknown transaction type '{other}'"))),
        }
    }
}

/// Which way a row moves stock. Quantities are always positive; the sign lives here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Increase,
    Decrease,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Increase => "increase",
            Direction::Decrease => "decrease",
        }
    }
}

impl core::str::FromStr for Direction {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "increase" => Ok(Direction::Increase),
            "decrease" => Ok(Direction::Decrease),
            other => Err(DomainError::validation(format!("unknown direction '{other}'"))),
        }
    }
}

/// A requested stock movement, before it is assigned identity or position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub item_id: ItemId,
    pub qty: Quantity,
    pub transaction_type: TransactionType,
    pub direction: Direction,
    pub note: Option<String>,
}

impl Posting {
    pub fn stock_in(item_id: ItemId, qty: Quantity) -> Self {
        Self {
            item_id,
            qty,
            transaction_type: TransactionType::In,
            direction: Direction::Increase,
            note: None,
        }
    }

    pub fn stock_out(item_id: ItemId, qty: Quantity) -> Self {
        Self {
            item_id,
            qty,
            transaction_type: TransactionType::Out,
            direction: Direction::Decrease,
            note: None,
        }
    }

    /// ADJUST row for a signed delta; the magnitude becomes `qty`.
    pub fn adjust(item_id: ItemId, delta: Quantity) -> Self {
        let direction = if delta.is_negative() {
            Direction::Decrease
        } else {
            Direction::Increase
        };
        Self {
            item_id,
            qty: delta.abs(),
            transaction_type: TransactionType::Adjust,
            direction,
            note: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn signed_qty(&self) -> Quantity {
        match self.direction {
            Direction::Increase => self.qty,
            Direction::Decrease => -self.qty,
        }
    }

    /// IN must increase and OUT must decrease; ADJUST may go either way.
    pub fn is_consistent(&self) -> bool {
        !matches!(
            (self.transaction_type, self.direction),
            (TransactionType::In, Direction::Decrease) | (TransactionType::Out, Direction::Increase)
        )
    }
}

/// A posting ready to be appended (not yet assigned a sequence number).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTransaction {
    pub transaction_id: TransactionId,
    pub item_id: ItemId,
    pub qty: Quantity,
    pub transaction_type: TransactionType,
    pub direction: Direction,
    pub note: Option<String>,
    pub batch_id: Option<BatchId>,
    pub created_at: DateTime<Utc>,
}

impl NewTransaction {
    pub fn from_posting(posting: Posting, batch_id: Option<BatchId>, created_at: DateTime<Utc>) -> Self {
        Self {
            transaction_id: TransactionId::new(),
            item_id: posting.item_id,
            qty: posting.qty,
            transaction_type: posting.transaction_type,
            direction: posting.direction,
            note: posting.note,
            batch_id,
            created_at,
        }
    }
}

/// A committed ledger row (append-only; never updated or deleted).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockTransaction {
    pub transaction_id: TransactionId,
    pub item_id: ItemId,
    /// 1-based, gap-free position in the item's ledger.
    pub sequence_number: u64,
    pub qty: Quantity,
    pub transaction_type: TransactionType,
    pub direction: Direction,
    pub note: Option<String>,
    pub batch_id: Option<BatchId>,
    pub created_at: DateTime<Utc>,
}

impl Entity for StockTransaction {
    type Id = TransactionId;

    fn id(&self) -> &Self::Id {
        &self.transaction_id
    }
}

impl StockTransaction {
    pub fn committed(tx: NewTransaction, sequence_number: u64) -> Self {
        Self {
            transaction_id: tx.transaction_id,
            item_id: tx.item_id,
            sequence_number,
            qty: tx.qty,
            transaction_type: tx.transaction_type,
            direction: tx.direction,
            note: tx.note,
            batch_id: tx.batch_id,
            created_at: tx.created_at,
        }
    }

    pub fn signed_qty(&self) -> Quantity {
        match self.direction {
            Direction::Increase => self.qty,
            Direction::Decrease => -self.qty,
        }
    }
}
