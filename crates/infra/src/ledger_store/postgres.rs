//! Postgres-backed stock ledger.
//!
//! Balances are never stored: `stock_level` is a `SUM` over `stock_transactions`.
//! `append()` reads each item's last sequence number inside the write
//! transaction, compares it with the caller's expectation and inserts from
//! there. A concurrent writer that slips in between hits the
//! `(item_id, sequence_number)` unique constraint and gets `Concurrency`.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::{Span, info, instrument};

use bomledger_core::{BatchId, ExpectedVersion, ItemId, Quantity, TransactionId};
use bomledger_ledger::{NewTransaction, StockLevel, StockTransaction};

use super::r#trait::{LedgerStore, check_rows};
use crate::error::StoreError;
use crate::postgres::{map_sqlx_error, run_blocking, seq_from_db};

#[derive(Debug, Clone)]
pub struct PostgresLedgerStore {
    pool: Arc<PgPool>,
}

impl PostgresLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool: Arc::new(pool) }
    }

    #[instrument(skip(self), fields(item_id = %item_id), err)]
    pub async fn fetch_stock_level(&self, item_id: ItemId) -> Result<StockLevel, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT
                COALESCE(SUM(CASE WHEN direction = 'increase' THEN qty ELSE -qty END), 0) AS on_hand,
                COALESCE(MAX(sequence_number), 0) AS version
            FROM stock_transactions
            WHERE item_id = $1
            "#,
        )
        .bind(item_id.as_uuid())
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("fetch_stock_level", e))?;

        let decode = |e: sqlx::Error| map_sqlx_error("decode_stock_level", e);
        let on_hand: Decimal = row.try_get("on_hand").map_err(decode)?;
        let version: i64 = row.try_get("version").map_err(decode)?;

        Ok(StockLevel {
            item_id,
            on_hand: Quantity::new(on_hand),
            version: seq_from_db(version, "version")?,
        })
    }

    #[instrument(skip(self), fields(item_id = %item_id, row_count), err)]
    pub async fn fetch_transactions(
        &self,
        item_id: ItemId,
        newest_first: bool,
        limit: Option<usize>,
    ) -> Result<Vec<StockTransaction>, StoreError> {
        let order = if newest_first { "DESC" } else { "ASC" };
        let sql = format!(
            r#"
            SELECT transaction_id, item_id, sequence_number, qty, transaction_type,
                   direction, note, batch_id, created_at
            FROM stock_transactions
            WHERE item_id = $1
            ORDER BY sequence_number {order}
            LIMIT $2
            "#
        );

        let rows = sqlx::query(&sql)
            .bind(item_id.as_uuid())
            .bind(limit.map(|l| l as i64))
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("fetch_transactions", e))?;

        Span::current().record("row_count", rows.len());
        rows.iter().map(transaction_from_row).collect()
    }

    #[instrument(
        skip(self, transactions, expected),
        fields(row_count = transactions.len(), item_count = expected.len()),
        err
    )]
    pub async fn append_transactions(
        &self,
        transactions: Vec<NewTransaction>,
        expected: &[(ItemId, ExpectedVersion)],
    ) -> Result<Vec<StockTransaction>, StoreError> {
        if transactions.is_empty() {
            return Ok(vec![]);
        }
        check_rows(&transactions)?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let items: BTreeSet<ItemId> = transactions
            .iter()
            .map(|t| t.item_id)
            .chain(expected.iter().map(|(id, _)| *id))
            .collect();

        let mut next: HashMap<ItemId, u64> = HashMap::with_capacity(items.len());
        for item_id in items {
            next.insert(item_id, ledger_version(&mut tx, item_id).await?);
        }

        for (item_id, exp) in expected {
            let actual = next.get(item_id).copied().unwrap_or(0);
            if !exp.matches(actual) {
                tx.rollback().await.map_err(|e| map_sqlx_error("rollback", e))?;
                return Err(StoreError::Concurrency(format!(
                    "item {item_id}: expected {exp:?}, ledger is at {actual}"
                )));
            }
        }

        let mut committed = Vec::with_capacity(transactions.len());
        for new_tx in transactions {
            let seq = next.entry(new_tx.item_id).or_insert(0);
            *seq += 1;
            let row = StockTransaction::committed(new_tx, *seq);

            sqlx::query(
                r#"
                INSERT INTO stock_transactions (
                    transaction_id, item_id, sequence_number, qty, transaction_type,
                    direction, note, batch_id, created_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                "#,
            )
            .bind(row.transaction_id.as_uuid())
            .bind(row.item_id.as_uuid())
            .bind(row.sequence_number as i64)
            .bind(row.qty.value())
            .bind(row.transaction_type.as_str())
            .bind(row.direction.as_str())
            .bind(row.note.as_deref())
            .bind(row.batch_id.map(|b| *b.as_uuid()))
            .bind(row.created_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("insert_transaction", e))?;

            committed.push(row);
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        info!(rows = committed.len(), "ledger rows appended");
        Ok(committed)
    }
}

async fn ledger_version(tx: &mut Transaction<'_, Postgres>, item_id: ItemId) -> Result<u64, StoreError> {
    let row = sqlx::query(
        r#"
        SELECT COALESCE(MAX(sequence_number), 0) AS version
        FROM stock_transactions
        WHERE item_id = $1
        "#,
    )
    .bind(item_id.as_uuid())
    .fetch_one(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("ledger_version", e))?;

    let version: i64 = row
        .try_get("version")
        .map_err(|e| map_sqlx_error("decode_version", e))?;
    seq_from_db(version, "version")
}

fn transaction_from_row(row: &PgRow) -> Result<StockTransaction, StoreError> {
    let decode = |e: sqlx::Error| map_sqlx_error("decode_transaction", e);

    let transaction_id: uuid::Uuid = row.try_get("transaction_id").map_err(decode)?;
    let item_id: uuid::Uuid = row.try_get("item_id").map_err(decode)?;
    let sequence_number: i64 = row.try_get("sequence_number").map_err(decode)?;
    let qty: Decimal = row.try_get("qty").map_err(decode)?;
    let transaction_type: String = row.try_get("transaction_type").map_err(decode)?;
    let direction: String = row.try_get("direction").map_err(decode)?;
    let batch_id: Option<uuid::Uuid> = row.try_get("batch_id").map_err(decode)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(decode)?;

    let corrupt = |e: bomledger_core::DomainError| {
        StoreError::Corrupt(format!("transaction {transaction_id}: {e}"))
    };

    Ok(StockTransaction {
        transaction_id: TransactionId::from_uuid(transaction_id),
        item_id: ItemId::from_uuid(item_id),
        sequence_number: seq_from_db(sequence_number, "sequence_number")?,
        qty: Quantity::new(qty),
        transaction_type: transaction_type.parse().map_err(corrupt)?,
        direction: direction.parse().map_err(corrupt)?,
        note: row.try_get("note").map_err(decode)?,
        batch_id: batch_id.map(BatchId::from_uuid),
        created_at,
    })
}

impl LedgerStore for PostgresLedgerStore {
    fn stock_level(&self, item_id: ItemId) -> Result<StockLevel, StoreError> {
        run_blocking(self.fetch_stock_level(item_id))
    }

    fn load_transactions(&self, item_id: ItemId) -> Result<Vec<StockTransaction>, StoreError> {
        run_blocking(self.fetch_transactions(item_id, false, None))
    }

    fn load_recent(&self, item_id: ItemId, limit: usize) -> Result<Vec<StockTransaction>, StoreError> {
        run_blocking(self.fetch_transactions(item_id, true, Some(limit)))
    }

    fn append(
        &self,
        transactions: Vec<NewTransaction>,
        expected: &[(ItemId, ExpectedVersion)],
    ) -> Result<Vec<StockTransaction>, StoreError> {
        run_blocking(self.append_transactions(transactions, expected))
    }
}
