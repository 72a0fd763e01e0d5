//! Batch outcome aggregation.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use bomledger_core::{BatchId, ItemId, Quantity};

use crate::batch::BatchMode;
use crate::row::{RowFailure, RowState};

/// One component quantity consumed by a succeeded row (or summed over rows).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumptionLine {
    pub item_id: ItemId,
    pub code: String,
    pub qty: Quantity,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedRow {
    pub row: usize,
    pub item_id: ItemId,
    pub reason: RowFailure,
    pub message: String,
}

/// Final result of one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowOutcome {
    pub row: usize,
    pub item_id: ItemId,
    pub qty: Quantity,
    pub state: RowState,
    /// Atomic unit the row's postings were appended under (succeeded rows only).
    pub unit_id: Option<BatchId>,
    pub consumption: Vec<ConsumptionLine>,
    pub failure: Option<FailedRow>,
}

impl RowOutcome {
    pub fn succeeded(
        row: usize,
        item_id: ItemId,
        qty: Quantity,
        unit_id: BatchId,
        consumption: Vec<ConsumptionLine>,
    ) -> Self {
        Self {
            row,
            item_id,
            qty,
            state: RowState::Succeeded,
            unit_id: Some(unit_id),
            consumption,
            failure: None,
        }
    }

    pub fn failed(row: usize, item_id: ItemId, qty: Quantity, reason: RowFailure, message: impl Into<String>) -> Self {
        Self {
            row,
            item_id,
            qty,
            state: RowState::Failed,
            unit_id: None,
            consumption: Vec::new(),
            failure: Some(FailedRow {
                row,
                item_id,
                reason,
                message: message.into(),
            }),
        }
    }

    pub fn is_success(&self) -> bool {
        self.state == RowState::Succeeded
    }
}

/// Sum consumption across succeeded rows, sorted by (code, item_id).
pub fn merge_consumption<'a>(outcomes: impl IntoIterator<Item = &'a RowOutcome>) -> Vec<ConsumptionLine> {
    let mut merged: HashMap<ItemId, ConsumptionLine> = HashMap::new();
    for outcome in outcomes.into_iter().filter(|o| o.is_success()) {
        for line in &outcome.consumption {
            merged
                .entry(line.item_id)
                .and_modify(|m| m.qty += line.qty)
                .or_insert_with(|| line.clone());
        }
    }

    let mut lines: Vec<ConsumptionLine> = merged.into_values().collect();
    lines.sort_by(|a, b| a.code.cmp(&b.code).then_with(|| a.item_id.cmp(&b.item_id)));
    lines
}

/// What the coordinator returns: always a complete per-row report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    /// Identifies this batch invocation in logs; each succeeded row posts under its own `unit_id`.
    pub batch_id: BatchId,
    pub mode: BatchMode,
    pub succeeded: usize,
    pub failed: Vec<FailedRow>,
    pub consumption: Vec<ConsumptionLine>,
    pub outcomes: Vec<RowOutcome>,
}

impl BatchReport {
    pub fn from_outcomes(batch_id: BatchId, mode: BatchMode, outcomes: Vec<RowOutcome>) -> Self {
        let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
        let failed = outcomes.iter().filter_map(|o| o.failure.clone()).collect();
        let consumption = merge_consumption(&outcomes);
        Self {
            batch_id,
            mode,
            succeeded,
            failed,
            consumption,
            outcomes,
        }
    }

    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }
}
