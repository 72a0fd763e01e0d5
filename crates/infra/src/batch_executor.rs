//! Batch production / shipment / stock-in coordinator.
//!
//! ## Row Execution Flow
//!
//! ```text
//! Pending
//!   ↓  quantity > 0, item exists, stock-managed, assembly for production/shipment
//! Resolving
//!   ↓  expand the current BOM (production, and shipment when the policy drains components)
//! Posting
//!   ↓  one atomic ledger append for the row's whole posting set
//! Succeeded | Failed
//! ```
//!
//! Rows run sequentially in request order. A row that fails (validation, missing
//! BOM, insufficient stock, storage error) leaves no ledger rows behind and never
//! affects its siblings; the report lists every row's outcome.

use tracing::{info, info_span, warn};

use bomledger_bom::{Consumption, resolve};
use bomledger_core::{BatchId, DomainError};
use bomledger_production::{
    BatchMode, BatchReport, BatchRequest, BatchRow, ConsumptionLine, RowOutcome, RowProgress, RowState,
    ShipmentPolicy, build_postings,
};

use crate::catalog_store::CatalogStore;
use crate::error::ServiceError;
use crate::ledger_store::LedgerStore;
use crate::revision_store::RevisionStore;
use crate::services::{BomService, StockService};

#[derive(Debug, Clone)]
pub struct BatchExecutor<C, R, L> {
    bom: BomService<C, R>,
    stock: StockService<C, L>,
    policy: ShipmentPolicy,
}

impl<C, R, L> BatchExecutor<C, R, L> {
    pub fn new(bom: BomService<C, R>, stock: StockService<C, L>, policy: ShipmentPolicy) -> Self {
        Self { bom, stock, policy }
    }

    pub fn policy(&self) -> ShipmentPolicy {
        self.policy
    }

    pub fn bom(&self) -> &BomService<C, R> {
        &self.bom
    }

    pub fn stock(&self) -> &StockService<C, L> {
        &self.stock
    }
}

impl<C, R, L> BatchExecutor<C, R, L>
where
    C: CatalogStore,
    R: RevisionStore,
    L: LedgerStore,
{
    /// Execute every row and report per-row outcomes. Never fails as a whole.
    pub fn execute(&self, request: &BatchRequest) -> BatchReport {
        let batch_id = BatchId::new();
        let span = info_span!(
            "batch",
            batch_id = %batch_id,
            mode = request.mode.as_str(),
            policy = self.policy.as_str(),
            rows = request.rows.len()
        );
        let _guard = span.enter();

        let outcomes = request
            .rows
            .iter()
            .enumerate()
            .map(|(index, row)| self.execute_row(request.mode, index, row))
            .collect();

        let report = BatchReport::from_outcomes(batch_id, request.mode, outcomes);
        info!(succeeded = report.succeeded, failed = report.failed_count(), "batch finished");
        report
    }

    fn execute_row(&self, mode: BatchMode, index: usize, row: &BatchRow) -> RowOutcome {
        let mut progress = RowProgress::new(index);
        let unit_id = BatchId::new();

        match self.process_row(mode, row, unit_id, &mut progress) {
            Ok(consumption) => RowOutcome::succeeded(index, row.item_id, row.qty, unit_id, consumption),
            Err(err) => {
                let reason = err.row_failure();
                warn!(
                    row = index,
                    item_id = %row.item_id,
                    qty = %row.qty,
                    state = ?progress.state(),
                    reason = reason.as_str(),
                    error = %err,
                    "batch row failed"
                );
                progress.fail();
                RowOutcome::failed(index, row.item_id, row.qty, reason, err.to_string())
            }
        }
    }

    fn process_row(
        &self,
        mode: BatchMode,
        row: &BatchRow,
        unit_id: BatchId,
        progress: &mut RowProgress,
    ) -> Result<Vec<ConsumptionLine>, ServiceError> {
        row.qty.ensure_positive("qty")?;
        let item = self
            .bom
            .catalog()
            .get_item(row.item_id)?
            .ok_or_else(|| DomainError::not_found(format!("item {}", row.item_id)))?;
        item.ensure_stock_managed()?;
        if mode != BatchMode::StockIn && !item.is_assembly() {
            return Err(DomainError::validation(format!(
                "{} needs an assembly; {} is a {}",
                mode.as_str(),
                item.code,
                item.item_type().as_str()
            ))
            .into());
        }

        progress.advance(RowState::Resolving)?;
        let consumption = if mode.resolves_bom(self.policy) {
            let current = self.bom.current_revision(row.item_id)?;
            resolve(row.item_id, current.as_ref(), row.qty)?
        } else {
            Vec::new()
        };
        let lines = self.consumption_lines(&consumption)?;

        progress.advance(RowState::Posting)?;
        let postings = build_postings(mode, self.policy, row.item_id, row.qty, &consumption);
        self.stock.post_batch(postings, Some(unit_id))?;

        progress.advance(RowState::Succeeded)?;
        Ok(lines)
    }

    /// Attach catalog codes so the merged report can be ordered by code.
    fn consumption_lines(&self, consumption: &[Consumption]) -> Result<Vec<ConsumptionLine>, ServiceError> {
        consumption
            .iter()
            .map(|c| -> Result<ConsumptionLine, ServiceError> {
                let item = self
                    .bom
                    .catalog()
                    .get_item(c.component_id)?
                    .ok_or_else(|| DomainError::not_found(format!("component {}", c.component_id)))?;
                Ok(ConsumptionLine {
                    item_id: c.component_id,
                    code: item.code,
                    qty: c.required,
                })
            })
            .collect()
    }
}
