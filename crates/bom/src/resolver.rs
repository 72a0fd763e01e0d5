//! Consumption resolution: current revision x quantity -> component requirements.

use serde::{Deserialize, Serialize};

use bomledger_core::{DomainError, DomainResult, ItemId, Quantity};

use crate::revision::BomRevision;

/// Amount of one component a production/shipment row needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Consumption {
    pub component_id: ItemId,
    pub required: Quantity,
}

/// Expand `current` (the assembly's current revision) for `quantity` units.
///
/// `required = round6(qty_per_unit * quantity)`, in BOM line order. Stock
/// sufficiency is not checked here; the ledger does that when posting.
pub fn resolve(
    assembly_id: ItemId,
    current: Option<&BomRevision>,
    quantity: Quantity,
) -> DomainResult<Vec<Consumption>> {
    let quantity = quantity.ensure_positive("quantity")?;
    let revision = current.ok_or(DomainError::BomMissing(assembly_id))?;

    if revision.assembly_id != assembly_id {
        return Err(DomainError::invariant(format!(
            "revision {} belongs to assembly {}, not {assembly_id}",
            revision.rev_no, revision.assembly_id
        )));
    }

    revision
        .lines
        .iter()
        .map(|line| {
            Ok(Consumption {
                component_id: line.component_id,
                required: line.qty_per_unit.checked_mul(quantity)?,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::revision::BomLine;
    use bomledger_core::RevisionId;
    use chrono::Utc;
    use proptest::prelude::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn revision(assembly_id: ItemId, lines: Vec<BomLine>) -> BomRevision {
        BomRevision {
            record_id: RevisionId::new(),
            assembly_id,
            rev_no: 1,
            created_at: Utc::now(),
            lines,
        }
    }

    #[test]
    fn multiplies_each_line() {
        let asm = ItemId::new();
        let (a, b) = (ItemId::new(), ItemId::new());
        let rev = revision(
            asm,
            vec![
                BomLine::new(a, Quantity::from_int(2)),
                BomLine::new(b, Quantity::new(dec!(0.5))),
            ],
        );

        let out = resolve(asm, Some(&rev), Quantity::from_int(2)).unwrap();
        assert_eq!(
            out,
            vec![
                Consumption { component_id: a, required: Quantity::from_int(4) },
                Consumption { component_id: b, required: Quantity::from_int(1) },
            ]
        );
    }

    #[test]
    fn rounds_to_six_places() {
        let asm = ItemId::new();
        let part = ItemId::new();
        let rev = revision(asm, vec![BomLine::new(part, Quantity::new(dec!(0.333333)))]);
        let out = resolve(asm, Some(&rev), Quantity::new(dec!(0.5))).unwrap();
        // 0.1666665 rounds half away from zero.
        assert_eq!(out[0].required, Quantity::new(dec!(0.166667)));
    }

    #[test]
    fn missing_revision_is_bom_missing() {
        let asm = ItemId::new();
        assert_eq!(
            resolve(asm, None, Quantity::from_int(1)),
            Err(DomainError::BomMissing(asm))
        );
    }

    #[test]
    fn non_positive_quantity_is_invalid() {
        let asm = ItemId::new();
        let rev = revision(asm, vec![BomLine::new(ItemId::new(), Quantity::from_int(1))]);
        assert!(matches!(
            resolve(asm, Some(&rev), Quantity::ZERO),
            Err(DomainError::InvalidQuantity(_))
        ));
    }

    #[test]
    fn foreign_revision_is_rejected() {
        let rev = revision(ItemId::new(), vec![BomLine::new(ItemId::new(), Quantity::from_int(1))]);
        assert!(matches!(
            resolve(ItemId::new(), Some(&rev), Quantity::from_int(1)),
            Err(DomainError::InvariantViolation(_))
        ));
    }

    proptest! {
        /// Property: resolution is linear in the requested quantity.
        #[test]
        fn resolution_is_linear(
            per_unit_millis in prop::collection::vec(1i64..100_000i64, 1..8),
            q1 in 1i64..1_000i64,
            q2 in 1i64..1_000i64,
        ) {
            let asm = ItemId::new();
            let lines: Vec<BomLine> = per_unit_millis
                .iter()
                .map(|m| BomLine::new(ItemId::new(), Quantity::new(Decimal::new(*m, 3))))
                .collect();
            let rev = revision(asm, lines);

            let r1 = resolve(asm, Some(&rev), Quantity::from_int(q1)).unwrap();
            let r2 = resolve(asm, Some(&rev), Quantity::from_int(q2)).unwrap();

            prop_assert_eq!(r1.len(), r2.len());
            for (a, b) in r1.iter().zip(r2.iter()) {
                prop_assert_eq!(a.component_id, b.component_id);
                // a / q1 == b / q2  <=>  a * q2 == b * q1
                prop_assert_eq!(
                    a.required.value() * Decimal::from(q2),
                    b.required.value() * Decimal::from(q1)
                );
            }
        }
    }
}
