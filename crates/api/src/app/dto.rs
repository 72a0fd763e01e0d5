use serde::{Deserialize, Serialize};

use bomledger_bom::{BomLine, RevisionSummary};
use bomledger_core::{ItemId, Quantity};
use bomledger_ledger::StockTransaction;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateRevisionRequest {
    pub lines: Vec<BomLine>,
}

#[derive(Debug, Deserialize)]
pub struct BomQuery {
    pub rev_no: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct AdjustRequest {
    pub target: Quantity,
    pub note: Option<String>,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct RevisionCreatedResponse {
    pub assembly_id: ItemId,
    pub rev_no: u32,
}

#[derive(Debug, Serialize)]
pub struct RevisionListResponse {
    pub assembly_id: ItemId,
    pub revisions: Vec<RevisionSummary>,
}

#[derive(Debug, Serialize)]
pub struct StockResponse {
    pub item_id: ItemId,
    pub current_stock: Quantity,
    /// Sequence number of the newest ledger row (0 when none).
    pub ledger_version: u64,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub item_id: ItemId,
    pub transactions: Vec<StockTransaction>,
}

#[derive(Debug, Serialize)]
pub struct AdjustResponse {
    pub item_id: ItemId,
    pub current_stock: Quantity,
    /// `None` when stock already matched the target.
    pub transaction: Option<StockTransaction>,
}
