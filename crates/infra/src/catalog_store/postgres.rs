//! Postgres-backed catalog reads over the `items` table.

use std::sync::Arc;

use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;

use bomledger_catalog::{Item, ItemDetail, ItemType, ManagedUnit};
use bomledger_core::{ItemId, Quantity};

use super::r#trait::CatalogStore;
use crate::error::StoreError;
use crate::postgres::{map_sqlx_error, run_blocking};

#[derive(Debug, Clone)]
pub struct PostgresCatalog {
    pool: Arc<PgPool>,
}

impl PostgresCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool: Arc::new(pool) }
    }

    #[instrument(skip(self), fields(item_id = %item_id), err)]
    pub async fn fetch_item(&self, item_id: ItemId) -> Result<Option<Item>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, code, name, item_type, managed_unit, pack_qty, reorder_point, stock_managed, detail
            FROM items
            WHERE id = $1
            "#,
        )
        .bind(item_id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("fetch_item", e))?;

        row.as_ref().map(item_from_row).transpose()
    }

    #[instrument(skip(self), err)]
    pub async fn fetch_items(&self) -> Result<Vec<Item>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, code, name, item_type, managed_unit, pack_qty, reorder_point, stock_managed, detail
            FROM items
            ORDER BY code ASC
            "#,
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("fetch_items", e))?;

        rows.iter().map(item_from_row).collect()
    }
}

fn item_from_row(row: &PgRow) -> Result<Item, StoreError> {
    let decode = |e: sqlx::Error| map_sqlx_error("decode_item", e);

    let id: uuid::Uuid = row.try_get("id").map_err(decode)?;
    let item_type: String = row.try_get("item_type").map_err(decode)?;
    let managed_unit: String = row.try_get("managed_unit").map_err(decode)?;
    let pack_qty: Option<Decimal> = row.try_get("pack_qty").map_err(decode)?;
    let reorder_point: Decimal = row.try_get("reorder_point").map_err(decode)?;
    let detail: serde_json::Value = row.try_get("detail").map_err(decode)?;

    let item_type: ItemType = item_type
        .parse()
        .map_err(|e| StoreError::Corrupt(format!("item {id}: {e}")))?;
    let managed_unit: ManagedUnit = managed_unit
        .parse()
        .map_err(|e| StoreError::Corrupt(format!("item {id}: {e}")))?;

    // `detail` carries only the type-specific fields; the tag lives in its own column.
    let mut detail = match detail {
        serde_json::Value::Object(map) => map,
        serde_json::Value::Null => serde_json::Map::new(),
        other => return Err(StoreError::Corrupt(format!("item {id}: detail is not an object: {other}"))),
    };
    detail.insert("item_type".to_string(), serde_json::Value::String(item_type.as_str().to_string()));
    let detail: ItemDetail = serde_json::from_value(serde_json::Value::Object(detail))
        .map_err(|e| StoreError::Corrupt(format!("item {id}: detail: {e}")))?;

    Ok(Item {
        id: ItemId::from_uuid(id),
        code: row.try_get("code").map_err(decode)?,
        name: row.try_get("name").map_err(decode)?,
        managed_unit,
        pack_qty: pack_qty.map(Quantity::new),
        reorder_point: Quantity::new(reorder_point),
        stock_managed: row.try_get("stock_managed").map_err(decode)?,
        detail,
    })
}

impl CatalogStore for PostgresCatalog {
    fn get_item(&self, item_id: ItemId) -> Result<Option<Item>, StoreError> {
        run_blocking(self.fetch_item(item_id))
    }

    fn list_items(&self) -> Result<Vec<Item>, StoreError> {
        run_blocking(self.fetch_items())
    }
}
