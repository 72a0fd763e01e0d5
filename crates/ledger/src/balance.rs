//! Quantity-on-hand derived from the ledger.

use serde::{Deserialize, Serialize};

use bomledger_core::{ItemId, Quantity};

use crate::transaction::{Direction, StockTransaction, TransactionType};

/// Derived stock for one item plus the ledger position it was read at.
///
/// `version` is the last sequence number folded; appends are guarded against it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLevel {
    pub item_id: ItemId,
    pub on_hand: Quantity,
    pub version: u64,
}

impl StockLevel {
    pub fn empty(item_id: ItemId) -> Self {
        Self {
            item_id,
            on_hand: Quantity::ZERO,
            version: 0,
        }
    }

    pub fn fold<'a>(item_id: ItemId, transactions: impl IntoIterator<Item = &'a StockTransaction>) -> Self {
        transactions
            .into_iter()
            .filter(|t| t.item_id == item_id)
            .fold(Self::empty(item_id), |level, t| Self {
                item_id,
                on_hand: level.on_hand + t.signed_qty(),
                version: level.version.max(t.sequence_number),
            })
    }
}

/// Per-type totals: `on_hand == total_in - total_out + adjust_increase - adjust_decrease`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerTotals {
    pub total_in: Quantity,
    pub total_out: Quantity,
    pub adjust_increase: Quantity,
    pub adjust_decrease: Quantity,
}

impl LedgerTotals {
    pub fn from_transactions<'a>(transactions: impl IntoIterator<Item = &'a StockTransaction>) -> Self {
        let mut totals = Self::default();
        for t in transactions {
            match (t.transaction_type, t.direction) {
                (TransactionType::In, _) => totals.total_in += t.qty,
                (TransactionType::Out, _) => totals.total_out += t.qty,
                (TransactionType::Adjust, Direction::Increase) => totals.adjust_increase += t.qty,
                (TransactionType::Adjust, Direction::Decrease) => totals.adjust_decrease += t.qty,
            }
        }
        totals
    }

    pub fn on_hand(&self) -> Quantity {
        self.total_in - self.total_out + self.adjust_increase - self.adjust_decrease
    }
}
