//! Stock summary: on-hand joined with reorder points.

use serde::{Deserialize, Serialize};

use bomledger_catalog::{Item, ItemType, ManagedUnit};
use bomledger_core::{ItemId, Quantity};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockSummaryLine {
    pub item_id: ItemId,
    pub code: String,
    pub name: String,
    pub item_type: ItemType,
    pub managed_unit: ManagedUnit,
    pub current_stock: Quantity,
    pub reorder_point: Quantity,
    pub below_reorder: bool,
    /// `reorder_point - current_stock` when below, else zero.
    pub shortfall: Quantity,
    /// Shortfall rounded up to whole packs (equal to shortfall without a pack size).
    pub suggested_order: Quantity,
}

/// Build the summary for stock-managed items, below-reorder items first, then by code.
pub fn build_summary(rows: impl IntoIterator<Item = (Item, Quantity)>) -> Vec<StockSummaryLine> {
    let mut lines: Vec<StockSummaryLine> = rows
        .into_iter()
        .filter(|(item, _)| item.stock_managed)
        .map(|(item, current_stock)| {
            let below_reorder = current_stock < item.reorder_point;
            let shortfall = if below_reorder {
                item.reorder_point - current_stock
            } else {
                Quantity::ZERO
            };
            let suggested_order = match item.pack_qty {
                Some(pack) => shortfall.round_up_to_pack(pack),
                None => shortfall,
            };
            StockSummaryLine {
                item_id: item.id,
                item_type: item.item_type(),
                code: item.code,
                name: item.name,
                managed_unit: item.managed_unit,
                current_stock,
                reorder_point: item.reorder_point,
                below_reorder,
                shortfall,
                suggested_order,
            }
        })
        .collect();

    lines.sort_by(|a, b| {
        b.below_reorder
            .cmp(&a.below_reorder)
            .then_with(|| a.code.cmp(&b.code))
            .then_with(|| a.item_id.cmp(&b.item_id))
    });
    lines
}
