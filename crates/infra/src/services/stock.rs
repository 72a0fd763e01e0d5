//! Stock ledger service: validated, atomic posting sets over a `LedgerStore`.

use std::collections::BTreeSet;

use chrono::Utc;
use tracing::{info, instrument};

use bomledger_catalog::Item;
use bomledger_core::{BatchId, DomainError, ExpectedVersion, ItemId, Quantity};
use bomledger_ledger::{
    NewTransaction, Posting, StockLevel, StockSummaryLine, StockTransaction, TransactionType, adjust_posting,
    build_summary, plan_postings,
};

use crate::catalog_store::CatalogStore;
use crate::error::ServiceError;
use crate::ledger_store::LedgerStore;

/// Upper bound for one history page.
pub const MAX_HISTORY_LIMIT: usize = 500;

#[derive(Debug, Clone)]
pub struct StockService<C, L> {
    catalog: C,
    ledger: L,
}

impl<C, L> StockService<C, L> {
    pub fn new(catalog: C, ledger: L) -> Self {
        Self { catalog, ledger }
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }
}

impl<C, L> StockService<C, L>
where
    C: CatalogStore,
    L: LedgerStore,
{
    /// Σ increases − Σ decreases over the item's ledger.
    #[instrument(skip(self), fields(item_id = %item_id), err)]
    pub fn current_stock(&self, item_id: ItemId) -> Result<Quantity, ServiceError> {
        Ok(self.stock_level(item_id)?.on_hand)
    }

    /// Balance plus ledger position. Items unknown to the catalog that never
    /// had a posting are `NotFound`; deleted items keep their ledger.
    pub fn stock_level(&self, item_id: ItemId) -> Result<StockLevel, ServiceError> {
        let level = self.ledger.stock_level(item_id)?;
        if level.version == 0 && self.catalog.get_item(item_id)?.is_none() {
            return Err(DomainError::not_found(format!("item {item_id}")).into());
        }
        Ok(level)
    }

    /// Append a single `IN` or `OUT` row. `ADJUST` names an absolute target and
    /// only goes through [`StockService::adjust_to`].
    #[instrument(skip(self, note), fields(item_id = %item_id, qty = %qty, kind = transaction_type.as_str()), err)]
    pub fn post(
        &self,
        item_id: ItemId,
        qty: Quantity,
        transaction_type: TransactionType,
        note: Option<String>,
    ) -> Result<StockTransaction, ServiceError> {
        let qty = qty.ensure_positive("qty")?;
        let posting = match transaction_type {
            TransactionType::In => Posting::stock_in(item_id, qty),
            TransactionType::Out => Posting::stock_out(item_id, qty),
            TransactionType::Adjust => {
                return Err(DomainError::validation(
                    "ADJUST takes an absolute target; use adjust_to instead of post",
                )
                .into());
            }
        };
        let posting = match note {
            Some(note) => posting.with_note(note),
            None => posting,
        };

        self.post_batch(vec![posting], None)?
            .pop()
            .ok_or_else(|| DomainError::invariant("ledger append returned no rows").into())
    }

    /// Append a posting set all-or-nothing.
    ///
    /// Every item must exist and be stock-managed, and every item's balance after
    /// the whole set must stay non-negative. The append is guarded by the ledger
    /// versions the balances were read at.
    #[instrument(skip(self, postings), fields(posting_count = postings.len(), batch_id = ?batch_id), err)]
    pub fn post_batch(
        &self,
        postings: Vec<Posting>,
        batch_id: Option<BatchId>,
    ) -> Result<Vec<StockTransaction>, ServiceError> {
        let items: BTreeSet<ItemId> = postings.iter().map(|p| p.item_id).collect();
        for item_id in &items {
            self.require_managed(*item_id)?;
        }

        let item_ids: Vec<ItemId> = items.into_iter().collect();
        let levels = self.ledger.stock_levels(&item_ids)?;
        let deltas = plan_postings(&levels, &postings)?;

        let expected: Vec<(ItemId, ExpectedVersion)> = deltas
            .iter()
            .map(|d| (d.item_id, ExpectedVersion::Exact(d.expected_version)))
            .collect();

        let created_at = Utc::now();
        let rows = postings
            .into_iter()
            .map(|p| NewTransaction::from_posting(p, batch_id, created_at))
            .collect();

        let committed = self.ledger.append(rows, &expected)?;
        info!(rows = committed.len(), items = expected.len(), "postings committed");
        Ok(committed)
    }

    /// Count correction: post the signed difference between `target` and the
    /// current balance. Returns `None` when stock already equals the target.
    #[instrument(skip(self, note), fields(item_id = %item_id, target = %target), err)]
    pub fn adjust_to(
        &self,
        item_id: ItemId,
        target: Quantity,
        note: Option<String>,
    ) -> Result<Option<StockTransaction>, ServiceError> {
        self.require_managed(item_id)?;
        let level = self.ledger.stock_level(item_id)?;

        let Some(posting) = adjust_posting(&level, target)? else {
            return Ok(None);
        };
        let posting = match note {
            Some(note) => posting.with_note(note),
            None => posting,
        };
        plan_postings(&[level], std::slice::from_ref(&posting))?;

        let row = NewTransaction::from_posting(posting, None, Utc::now());
        let mut committed = self
            .ledger
            .append(vec![row], &[(item_id, ExpectedVersion::Exact(level.version))])?;

        info!(from = %level.on_hand, to = %target, "stock adjusted");
        Ok(committed.pop())
    }

    /// Newest-first transaction history.
    #[instrument(skip(self), fields(item_id = %item_id), err)]
    pub fn history(&self, item_id: ItemId, limit: usize) -> Result<Vec<StockTransaction>, ServiceError> {
        if limit == 0 || limit > MAX_HISTORY_LIMIT {
            return Err(DomainError::validation(format!(
                "limit must be between 1 and {MAX_HISTORY_LIMIT}"
            ))
            .into());
        }
        let rows = self.ledger.load_recent(item_id, limit)?;
        if rows.is_empty() && self.catalog.get_item(item_id)?.is_none() {
            return Err(DomainError::not_found(format!("item {item_id}")).into());
        }
        Ok(rows)
    }

    /// Reorder view over all stock-managed catalog items.
    #[instrument(skip(self), err)]
    pub fn summary(&self) -> Result<Vec<StockSummaryLine>, ServiceError> {
        let items: Vec<Item> = self
            .catalog
            .list_items()?
            .into_iter()
            .filter(|i| i.stock_managed)
            .collect();

        let mut rows = Vec::with_capacity(items.len());
        for item in items {
            let on_hand = self.ledger.stock_level(item.id)?.on_hand;
            rows.push((item, on_hand));
        }
        Ok(build_summary(rows))
    }

    fn require_managed(&self, item_id: ItemId) -> Result<Item, ServiceError> {
        let item = self
            .catalog
            .get_item(item_id)?
            .ok_or_else(|| DomainError::not_found(format!("item {item_id}")))?;
        item.ensure_stock_managed()?;
        Ok(item)
    }
}
