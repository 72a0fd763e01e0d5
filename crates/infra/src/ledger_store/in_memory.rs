use std::collections::HashMap;
use std::sync::RwLock;

use bomledger_core::{ExpectedVersion, ItemId};
use bomledger_ledger::{NewTransaction, StockLevel, StockTransaction};

use super::r#trait::{LedgerStore, check_rows};
use crate::error::StoreError;

/// In-memory ledger.
///
/// Intended for tests/dev. Rows are kept per item in sequence order; the
/// version check and the append share one write lock.
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    rows: RwLock<HashMap<ItemId, Vec<StockTransaction>>>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LedgerStore for InMemoryLedgerStore {
    fn stock_level(&self, item_id: ItemId) -> Result<StockLevel, StoreError> {
        let rows = self
            .rows
            .read()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))?;
        Ok(rows
            .get(&item_id)
            .map(|r| StockLevel::fold(item_id, r))
            .unwrap_or_else(|| StockLevel::empty(item_id)))
    }

    fn load_transactions(&self, item_id: ItemId) -> Result<Vec<StockTransaction>, StoreError> {
        let rows = self
            .rows
            .read()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))?;
        Ok(rows.get(&item_id).cloned().unwrap_or_default())
    }

    fn append(
        &self,
        transactions: Vec<NewTransaction>,
        expected: &[(ItemId, ExpectedVersion)],
    ) -> Result<Vec<StockTransaction>, StoreError> {
        if transactions.is_empty() {
            return Ok(vec![]);
        }
        check_rows(&transactions)?;

        let mut rows = self
            .rows
            .write()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))?;

        let version_of = |rows: &HashMap<ItemId, Vec<StockTransaction>>, item_id: &ItemId| {
            rows.get(item_id).map(|r| r.len() as u64).unwrap_or(0)
        };

        for (item_id, exp) in expected {
            let actual = version_of(&*rows, item_id);
            if !exp.matches(actual) {
                return Err(StoreError::Concurrency(format!(
                    "item {item_id}: expected {exp:?}, ledger is at {actual}"
                )));
            }
        }

        let mut next: HashMap<ItemId, u64> = HashMap::new();
        let mut committed = Vec::with_capacity(transactions.len());
        for tx in transactions {
            let seq = next
                .entry(tx.item_id)
                .or_insert_with(|| version_of(&*rows, &tx.item_id));
            *seq += 1;
            committed.push(StockTransaction::committed(tx, *seq));
        }

        for row in &committed {
            rows.entry(row.item_id).or_default().push(row.clone());
        }
        Ok(committed)
    }
}
