use std::sync::Arc;

use bomledger_catalog::Item;
use bomledger_core::ItemId;

use crate::error::StoreError;

/// Catalog reads needed by the BOM engine and the ledger.
pub trait CatalogStore: Send + Sync {
    /// Fetch one item; `Ok(None)` when it does not exist (e.g. deleted).
    fn get_item(&self, item_id: ItemId) -> Result<Option<Item>, StoreError>;

    /// All items, in no particular order.
    fn list_items(&self) -> Result<Vec<Item>, StoreError>;
}

impl<S> CatalogStore for Arc<S>
where
    S: CatalogStore + ?Sized,
{
    fn get_item(&self, item_id: ItemId) -> Result<Option<Item>, StoreError> {
        (**self).get_item(item_id)
    }

    fn list_items(&self) -> Result<Vec<Item>, StoreError> {
        (**self).list_items()
    }
}
