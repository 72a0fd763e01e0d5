//! Batch production / shipment / stock-in model.
//!
//! Pure types and decisions for the batch coordinator: modes and the shipment
//! policy, the per-row state machine, posting-set construction and the merged
//! consumption report. Execution against stores lives in `bomledger-infra`.

pub mod batch;
pub mod postings;
pub mod report;
pub mod row;

pub use batch::{BatchMode, BatchRequest, BatchRow, ShipmentPolicy};
pub use postings::build_postings;
pub use report::{BatchReport, ConsumptionLine, FailedRow, RowOutcome, merge_consumption};
pub use row::{RowFailure, RowProgress, RowState};
