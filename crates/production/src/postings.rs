//! Posting-set construction for one batch row.

use bomledger_bom::Consumption;
use bomledger_core::{ItemId, Quantity};
use bomledger_ledger::Posting;

use crate::batch::{BatchMode, ShipmentPolicy};

/// Turn one resolved row into the postings of its atomic unit.
///
/// `consumption` is empty for stock-in rows and for shipments whose policy does
/// not drain components.
pub fn build_postings(
    mode: BatchMode,
    policy: ShipmentPolicy,
    item_id: ItemId,
    qty: Quantity,
    consumption: &[Consumption],
) -> Vec<Posting> {
    let note = mode.as_str();
    let parent = match mode {
        BatchMode::StockIn | BatchMode::Production => Some(Posting::stock_in(item_id, qty)),
        BatchMode::Shipment if policy.drains_assembly() => Some(Posting::stock_out(item_id, qty)),
        BatchMode::Shipment => None,
    };

    let components = consumption
        .iter()
        .map(|c| Posting::stock_out(c.component_id, c.required).with_note(format!("{note} of {item_id}")));

    parent
        .map(|p| p.with_note(note))
        .into_iter()
        .chain(components)
        .collect()
}
