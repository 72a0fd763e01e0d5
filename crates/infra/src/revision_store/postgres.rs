//! Postgres-backed revision store.
//!
//! Tables: `bom_heads` (pointer + version), `assembly_records` (one row per
//! revision) and `assembly_components` (lines, ordered by `line_no`).
//!
//! `commit()` runs in one transaction: the head row is locked with
//! `SELECT ... FOR UPDATE`, its version compared against the expectation, the
//! events written, and the head updated. Two writers racing to create the first
//! revision both try to insert the head row; the loser hits the primary key and
//! gets `Concurrency`.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::{Span, info, instrument};

use bomledger_bom::{BomEvent, BomHead, BomLine, BomRevision};
use bomledger_core::{ExpectedVersion, ItemId, Quantity, RevisionId};

use super::r#trait::{RevisionStore, advance_head};
use crate::error::StoreError;
use crate::postgres::{map_sqlx_error, rev_no_from_db, run_blocking, seq_from_db};

#[derive(Debug, Clone)]
pub struct PostgresRevisionStore {
    pool: Arc<PgPool>,
}

impl PostgresRevisionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool: Arc::new(pool) }
    }

    #[instrument(skip(self), fields(assembly_id = %assembly_id), err)]
    pub async fn fetch_head(&self, assembly_id: ItemId) -> Result<Option<BomHead>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT current_rev_no, last_rev_no, version
            FROM bom_heads
            WHERE assembly_id = $1
            "#,
        )
        .bind(assembly_id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("fetch_head", e))?;

        row.map(|row| head_from_row(assembly_id, &row)).transpose()
    }

    /// Load revisions (all, or just `rev_no`) with their lines in one round trip.
    #[instrument(skip(self), fields(assembly_id = %assembly_id, revision_count), err)]
    pub async fn fetch_revisions(
        &self,
        assembly_id: ItemId,
        rev_no: Option<u32>,
    ) -> Result<Vec<BomRevision>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT r.record_id, r.rev_no, r.created_at,
                   c.component_id, c.qty_per_unit, c.note
            FROM assembly_records r
            JOIN assembly_components c ON c.record_id = r.record_id
            WHERE r.assembly_id = $1
              AND ($2::integer IS NULL OR r.rev_no = $2)
            ORDER BY r.rev_no ASC, c.line_no ASC
            "#,
        )
        .bind(assembly_id.as_uuid())
        .bind(rev_no.map(|r| r as i32))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("fetch_revisions", e))?;

        let decode = |e: sqlx::Error| map_sqlx_error("decode_revision", e);
        let mut revisions: Vec<BomRevision> = Vec::new();
        let mut index: HashMap<uuid::Uuid, usize> = HashMap::new();

        for row in rows {
            let record_id: uuid::Uuid = row.try_get("record_id").map_err(decode)?;
            let component_id: uuid::Uuid = row.try_get("component_id").map_err(decode)?;
            let qty_per_unit: Decimal = row.try_get("qty_per_unit").map_err(decode)?;
            let note: Option<String> = row.try_get("note").map_err(decode)?;
            let line = BomLine {
                component_id: ItemId::from_uuid(component_id),
                qty_per_unit: Quantity::new(qty_per_unit),
                note,
            };

            match index.get(&record_id) {
                Some(&i) => revisions[i].lines.push(line),
                None => {
                    let stored_rev_no: i32 = row.try_get("rev_no").map_err(decode)?;
                    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(decode)?;
                    index.insert(record_id, revisions.len());
                    revisions.push(BomRevision {
                        record_id: RevisionId::from_uuid(record_id),
                        assembly_id,
                        rev_no: rev_no_from_db(stored_rev_no, "rev_no")?,
                        created_at,
                        lines: vec![line],
                    });
                }
            }
        }

        Span::current().record("revision_count", revisions.len());
        Ok(revisions)
    }

    #[instrument(
        skip(self, events),
        fields(assembly_id = %assembly_id, event_count = events.len(), expected = ?expected),
        err
    )]
    pub async fn commit_events(
        &self,
        assembly_id: ItemId,
        expected: ExpectedVersion,
        events: &[BomEvent],
    ) -> Result<BomHead, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let stored = lock_head(&mut tx, assembly_id).await?;
        let current_version = stored.map(|h| h.version).unwrap_or(0);
        if !expected.matches(current_version) {
            tx.rollback().await.map_err(|e| map_sqlx_error("rollback", e))?;
            return Err(StoreError::Concurrency(format!(
                "expected {expected:?}, found version {current_version} for assembly {assembly_id}"
            )));
        }

        let head = advance_head(assembly_id, stored, events)?;

        // Header rows reference the head, so it must exist before the first insert.
        if stored.is_none() {
            sqlx::query(
                r#"
                INSERT INTO bom_heads (assembly_id, current_rev_no, last_rev_no, version)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(assembly_id.as_uuid())
            .bind(head.current_rev_no as i32)
            .bind(head.last_rev_no as i32)
            .bind(head.version as i64)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("insert_head", e))?;
        }

        for event in events {
            match event {
                BomEvent::RevisionCreated(e) => insert_revision(&mut tx, &e.revision).await?,
                BomEvent::RevisionDeleted(e) => {
                    let deleted = sqlx::query(
                        r#"
                        DELETE FROM assembly_records
                        WHERE assembly_id = $1 AND rev_no = $2
                        "#,
                    )
                    .bind(assembly_id.as_uuid())
                    .bind(e.rev_no as i32)
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| map_sqlx_error("delete_revision", e))?;

                    if deleted.rows_affected() != 1 {
                        tx.rollback().await.map_err(|e| map_sqlx_error("rollback", e))?;
                        return Err(StoreError::Concurrency(format!(
                            "revision {} of assembly {assembly_id} vanished",
                            e.rev_no
                        )));
                    }
                }
            }
        }

        sqlx::query(
            r#"
            UPDATE bom_heads
            SET current_rev_no = $2, last_rev_no = $3, version = $4
            WHERE assembly_id = $1
            "#,
        )
        .bind(assembly_id.as_uuid())
        .bind(head.current_rev_no as i32)
        .bind(head.last_rev_no as i32)
        .bind(head.version as i64)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("update_head", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        info!(current_rev_no = head.current_rev_no, version = head.version, "bom head committed");
        Ok(head)
    }
}

async fn lock_head(
    tx: &mut Transaction<'_, Postgres>,
    assembly_id: ItemId,
) -> Result<Option<BomHead>, StoreError> {
    let row = sqlx::query(
        r#"
        SELECT current_rev_no, last_rev_no, version
        FROM bom_heads
        WHERE assembly_id = $1
        FOR UPDATE
        "#,
    )
    .bind(assembly_id.as_uuid())
    .fetch_optional(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("lock_head", e))?;

    row.map(|row| head_from_row(assembly_id, &row)).transpose()
}

async fn insert_revision(
    tx: &mut Transaction<'_, Postgres>,
    revision: &BomRevision,
) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        INSERT INTO assembly_records (record_id, assembly_id, rev_no, created_at)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(revision.record_id.as_uuid())
    .bind(revision.assembly_id.as_uuid())
    .bind(revision.rev_no as i32)
    .bind(revision.created_at)
    .execute(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("insert_revision", e))?;

    for (line_no, line) in revision.lines.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO assembly_components (record_id, line_no, component_id, qty_per_unit, note)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(revision.record_id.as_uuid())
        .bind(line_no as i32)
        .bind(line.component_id.as_uuid())
        .bind(line.qty_per_unit.value())
        .bind(line.note.as_deref())
        .execute(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("insert_component", e))?;
    }
    Ok(())
}

fn head_from_row(assembly_id: ItemId, row: &sqlx::postgres::PgRow) -> Result<BomHead, StoreError> {
    let decode = |e: sqlx::Error| map_sqlx_error("decode_head", e);
    let current_rev_no: i32 = row.try_get("current_rev_no").map_err(decode)?;
    let last_rev_no: i32 = row.try_get("last_rev_no").map_err(decode)?;
    let version: i64 = row.try_get("version").map_err(decode)?;

    Ok(BomHead {
        assembly_id,
        current_rev_no: rev_no_from_db(current_rev_no, "current_rev_no")?,
        last_rev_no: rev_no_from_db(last_rev_no, "last_rev_no")?,
        version: seq_from_db(version, "version")?,
    })
}

impl RevisionStore for PostgresRevisionStore {
    fn load_head(&self, assembly_id: ItemId) -> Result<Option<BomHead>, StoreError> {
        run_blocking(self.fetch_head(assembly_id))
    }

    fn load_revisions(&self, assembly_id: ItemId) -> Result<Vec<BomRevision>, StoreError> {
        run_blocking(self.fetch_revisions(assembly_id, None))
    }

    fn load_revision(&self, assembly_id: ItemId, rev_no: u32) -> Result<Option<BomRevision>, StoreError> {
        let mut revisions = run_blocking(self.fetch_revisions(assembly_id, Some(rev_no)))?;
        Ok(revisions.pop())
    }

    fn commit(
        &self,
        assembly_id: ItemId,
        expected: ExpectedVersion,
        events: &[BomEvent],
    ) -> Result<BomHead, StoreError> {
        run_blocking(self.commit_events(assembly_id, expected, events))
    }
}
