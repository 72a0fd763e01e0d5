use std::collections::HashMap;
use std::sync::RwLock;

use bomledger_catalog::Item;
use bomledger_core::ItemId;

use super::r#trait::CatalogStore;
use crate::error::StoreError;

/// In-memory catalog.
///
/// Stands in for the external catalog in tests/dev; `upsert`/`remove` simulate
/// catalog edits the core must tolerate (e.g. a component deleted after it was
/// referenced by a BOM).
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    items: RwLock<HashMap<ItemId, Item>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(items: impl IntoIterator<Item = Item>) -> Result<Self, StoreError> {
        let catalog = Self::new();
        for item in items {
            catalog.upsert(item)?;
        }
        Ok(catalog)
    }

    /// Build from a JSON array of items (dev seed file).
    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        let items: Vec<Item> = serde_json::from_str(json)
            .map_err(|e| StoreError::Corrupt(format!("catalog seed: {e}")))?;
        Self::with_items(items)
    }

    pub fn upsert(&self, item: Item) -> Result<(), StoreError> {
        item.validate()
            .map_err(|e| StoreError::Constraint(format!("item {}: {e}", item.code)))?;

        let mut items = self
            .items
            .write()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))?;

        if let Some(clash) = items.values().find(|i| i.code == item.code && i.id != item.id) {
            return Err(StoreError::Constraint(format!(
                "item code '{}' already used by {}",
                item.code, clash.id
            )));
        }
        items.insert(item.id, item);
        Ok(())
    }

    pub fn remove(&self, item_id: ItemId) -> Result<Option<Item>, StoreError> {
        let mut items = self
            .items
            .write()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))?;
        Ok(items.remove(&item_id))
    }
}

impl CatalogStore for InMemoryCatalog {
    fn get_item(&self, item_id: ItemId) -> Result<Option<Item>, StoreError> {
        let items = self
            .items
            .read()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))?;
        Ok(items.get(&item_id).cloned())
    }

    fn list_items(&self) -> Result<Vec<Item>, StoreError> {
        let items = self
            .items
            .read()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))?;
        Ok(items.values().cloned().collect())
    }
}
