//! Posting-set planning: validate an atomic unit against current stock.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use bomledger_core::{DomainError, DomainResult, ItemId, Quantity};

use crate::balance::StockLevel;
use crate::transaction::Posting;

/// Net effect of one posting set on one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDelta {
    pub item_id: ItemId,
    pub before: Quantity,
    pub delta: Quantity,
    pub after: Quantity,
    /// Ledger version the balance was read at; the append must match it.
    pub expected_version: u64,
}

/// Validate `postings` as one all-or-nothing unit.
///
/// Every posting needs a storable `qty > 0` and a direction matching its type,
/// and every item's balance after the whole set must stay non-negative and
/// storable. Nothing is
/// written here: a failure means no row of the set may be appended.
pub fn plan_postings(levels: &[StockLevel], postings: &[Posting]) -> DomainResult<Vec<ItemDelta>> {
    if postings.is_empty() {
        return Err(DomainError::validation("posting set cannot be empty"));
    }

    let by_item: HashMap<ItemId, &StockLevel> = levels.iter().map(|l| (l.item_id, l)).collect();

    // Preserve first-appearance order for deterministic reporting.
    let mut order: Vec<ItemId> = Vec::new();
    let mut deltas: HashMap<ItemId, Quantity> = HashMap::new();

    for posting in postings {
        posting.qty.ensure_positive("posting qty")?;
        if !posting.is_consistent() {
            return Err(DomainError::validation(format!(
                "{} posting cannot {} stock",
                posting.transaction_type.as_str(),
                posting.direction.as_str()
            )));
        }
        if !by_item.contains_key(&posting.item_id) {
            return Err(DomainError::invariant(format!(
                "no stock level loaded for item {}",
                posting.item_id
            )));
        }
        let entry = deltas.entry(posting.item_id).or_insert_with(|| {
            order.push(posting.item_id);
            Quantity::ZERO
        });
        *entry = entry.checked_add(posting.signed_qty())?;
    }

    order
        .into_iter()
        .map(|item_id| {
            let level = by_item[&item_id];
            let delta = deltas[&item_id];
            let after = level.on_hand.checked_add(delta)?.ensure_storable("stock after posting")?;
            if after.is_negative() {
                return Err(DomainError::InsufficientStock {
                    item_id,
                    available: level.on_hand,
                    requested: -delta,
                });
            }
            Ok(ItemDelta {
                item_id,
                before: level.on_hand,
                delta,
                after,
                expected_version: level.version,
            })
        })
        .collect()
}

/// ADJUST encoding: the operator names an absolute target; the ledger records
/// the signed delta needed to reach it. Returns `None` when already at target.
pub fn adjust_posting(level: &StockLevel, target: Quantity) -> DomainResult<Option<Posting>> {
    if target.is_negative() {
        return Err(DomainError::invalid_quantity(format!(
            "adjust target cannot be negative (got {target})"
        )));
    }
    let target = target.ensure_storable("adjust target")?;
    let delta = target - level.on_hand;
    if delta.is_zero() {
        return Ok(None);
    }
    Ok(Some(Posting::adjust(level.item_id, delta)))
}
