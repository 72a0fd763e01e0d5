use std::sync::Arc;

use bomledger_core::{ExpectedVersion, ItemId};
use bomledger_ledger::{NewTransaction, StockLevel, StockTransaction};

use crate::error::StoreError;

/// Ledger store abstraction.
///
/// Implementations must:
/// - never update or delete a committed row
/// - assign per-item sequence numbers (1-based, gap-free)
/// - append a whole posting set atomically, checking every expected version
///   against the item's last sequence number before any row is written
pub trait LedgerStore: Send + Sync {
    /// Derived balance and ledger position of one item (empty when no rows).
    fn stock_level(&self, item_id: ItemId) -> Result<StockLevel, StoreError>;

    fn stock_levels(&self, item_ids: &[ItemId]) -> Result<Vec<StockLevel>, StoreError> {
        item_ids.iter().map(|id| self.stock_level(*id)).collect()
    }

    /// All rows for one item, ordered by sequence number ascending.
    fn load_transactions(&self, item_id: ItemId) -> Result<Vec<StockTransaction>, StoreError>;

    /// The newest `limit` rows for one item, newest first.
    fn load_recent(&self, item_id: ItemId, limit: usize) -> Result<Vec<StockTransaction>, StoreError> {
        let mut rows = self.load_transactions(item_id)?;
        rows.reverse();
        rows.truncate(limit);
        Ok(rows)
    }

    /// Append one atomic posting set.
    fn append(
        &self,
        transactions: Vec<NewTransaction>,
        expected: &[(ItemId, ExpectedVersion)],
    ) -> Result<Vec<StockTransaction>, StoreError>;
}

impl<S> LedgerStore for Arc<S>
where
    S: LedgerStore + ?Sized,
{
    fn stock_level(&self, item_id: ItemId) -> Result<StockLevel, StoreError> {
        (**self).stock_level(item_id)
    }

    fn stock_levels(&self, item_ids: &[ItemId]) -> Result<Vec<StockLevel>, StoreError> {
        (**self).stock_levels(item_ids)
    }

    fn load_transactions(&self, item_id: ItemId) -> Result<Vec<StockTransaction>, StoreError> {
        (**self).load_transactions(item_id)
    }

    fn load_recent(&self, item_id: ItemId, limit: usize) -> Result<Vec<StockTransaction>, StoreError> {
        (**self).load_recent(item_id, limit)
    }

    fn append(
        &self,
        transactions: Vec<NewTransaction>,
        expected: &[(ItemId, ExpectedVersion)],
    ) -> Result<Vec<StockTransaction>, StoreError> {
        (**self).append(transactions, expected)
    }
}

/// Row-level checks every backend applies before writing.
pub(crate) fn check_rows(transactions: &[NewTransaction]) -> Result<(), StoreError> {
    for tx in transactions {
        if !tx.qty.is_positive() {
            return Err(StoreError::Constraint(format!(
                "transaction {} has non-positive qty {}",
                tx.transaction_id, tx.qty
            )));
        }
    }
    Ok(())
}
