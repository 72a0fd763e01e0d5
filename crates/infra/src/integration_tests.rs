//! Integration tests for the full BOM + ledger pipeline.
//!
//! Tests: Catalog → BomService → RevisionStore, and
//! BatchRequest → BatchExecutor → StockService → LedgerStore
//!
//! Verifies:
//! - Production/shipment postings follow the current BOM
//! - A failing row posts nothing and never affects its siblings
//! - Revision history is immutable; deletion policy is explicit
//! - Storage failures surface as `storage_error` rows

use std::sync::Arc;

use rust_decimal_macros::dec;

use bomledger_bom::BomLine;
use bomledger_catalog::{Item, ManagedUnit};
use bomledger_core::{Aggregate, AggregateRoot, DomainError, ExpectedVersion, ItemId, Quantity};
use bomledger_ledger::{Direction, LedgerTotals, NewTransaction, StockLevel, StockTransaction, TransactionType};
use bomledger_production::{BatchMode, BatchRequest, BatchRow, RowFailure, RowState, ShipmentPolicy};

use crate::batch_executor::BatchExecutor;
use crate::catalog_store::InMemoryCatalog;
use crate::error::{ServiceError, StoreError};
use crate::ledger_store::{InMemoryLedgerStore, LedgerStore};
use crate::revision_store::{InMemoryRevisionStore, RevisionStore};
use crate::services::{BomService, StockService};

type Executor<L> = BatchExecutor<Arc<InMemoryCatalog>, Arc<InMemoryRevisionStore>, L>;

struct Fixture {
    catalog: Arc<InMemoryCatalog>,
    revisions: Arc<InMemoryRevisionStore>,
    ledger: Arc<InMemoryLedgerStore>,
    asm: ItemId,
    part_a: ItemId,
    part_b: ItemId,
}

fn qty(v: rust_decimal::Decimal) -> Quantity {
    Quantity::new(v)
}

/// ASM-1 = {PART-A: 2, PART-B: 0.5}; PART-A = 10, PART-B = 1.
fn setup() -> Fixture {
    let (asm, part_a, part_b) = (ItemId::new(), ItemId::new(), ItemId::new());
    let catalog = Arc::new(
        InMemoryCatalog::with_items([
            Item::assembly(asm, "ASM-1"),
            Item::component(part_a, "PART-A"),
            Item::component(part_b, "PART-B").with_unit(ManagedUnit::Grams),
        ])
        .unwrap(),
    );
    let fixture = Fixture {
        catalog,
        revisions: Arc::new(InMemoryRevisionStore::new()),
        ledger: Arc::new(InMemoryLedgerStore::new()),
        asm,
        part_a,
        part_b,
    };

    fixture
        .bom()
        .create_revision(
            asm,
            vec![
                BomLine::new(part_a, Quantity::from_int(2)),
                BomLine::new(part_b, qty(dec!(0.5))),
            ],
        )
        .unwrap();

    let stock = fixture.stock();
    stock.post(part_a, Quantity::from_int(10), TransactionType::In, None).unwrap();
    stock.post(part_b, Quantity::from_int(1), TransactionType::In, None).unwrap();
    fixture
}

impl Fixture {
    fn bom(&self) -> BomService<Arc<InMemoryCatalog>, Arc<InMemoryRevisionStore>> {
        BomService::new(self.catalog.clone(), self.revisions.clone())
    }

    fn stock(&self) -> StockService<Arc<InMemoryCatalog>, Arc<InMemoryLedgerStore>> {
        StockService::new(self.catalog.clone(), self.ledger.clone())
    }

    fn executor(&self, policy: ShipmentPolicy) -> Executor<Arc<InMemoryLedgerStore>> {
        self.executor_with(self.ledger.clone(), policy)
    }

    fn executor_with<L: LedgerStore>(&self, ledger: L, policy: ShipmentPolicy) -> Executor<L> {
        BatchExecutor::new(self.bom(), StockService::new(self.catalog.clone(), ledger), policy)
    }

    fn on_hand(&self, item_id: ItemId) -> Quantity {
        self.ledger.stock_level(item_id).unwrap().on_hand
    }

    fn row_count(&self, item_id: ItemId) -> usize {
        self.ledger.load_transactions(item_id).unwrap().len()
    }
}

fn request(mode: BatchMode, rows: &[(ItemId, Quantity)]) -> BatchRequest {
    BatchRequest {
        mode,
        rows: rows.iter().map(|(item_id, qty)| BatchRow { item_id: *item_id, qty: *qty }).collect(),
    }
}

#[test]
fn production_of_two_consumes_per_current_bom() {
    let f = setup();
    let report = f
        .executor(ShipmentPolicy::default())
        .execute(&request(BatchMode::Production, &[(f.asm, Quantity::from_int(2))]));

    assert_eq!(report.succeeded, 1);
    assert!(report.failed.is_empty());
    assert_eq!(f.on_hand(f.part_a), Quantity::from_int(6));
    assert_eq!(f.on_hand(f.part_b), Quantity::ZERO);
    assert_eq!(f.on_hand(f.asm), Quantity::from_int(2));

    let consumed: Vec<(&str, Quantity)> = report.consumption.iter().map(|c| (c.code.as_str(), c.qty)).collect();
    assert_eq!(consumed, vec![("PART-A", Quantity::from_int(4)), ("PART-B", Quantity::from_int(1))]);

    // All postings of the row share one unit id.
    let unit_id = report.outcomes[0].unit_id.unwrap();
    for item in [f.asm, f.part_a, f.part_b] {
        let last = f.ledger.load_recent(item, 1).unwrap();
        assert_eq!(last[0].batch_id, Some(unit_id));
    }
}

#[test]
fn production_of_three_fails_and_posts_nothing() {
    let f = setup();
    let report = f
        .executor(ShipmentPolicy::default())
        .execute(&request(BatchMode::Production, &[(f.asm, Quantity::from_int(3))]));

    assert_eq!(report.succeeded, 0);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].reason, RowFailure::InsufficientStock);
    assert_eq!(report.outcomes[0].state, RowState::Failed);
    assert!(report.consumption.is_empty());

    assert_eq!(f.row_count(f.asm), 0);
    assert_eq!(f.row_count(f.part_a), 1);
    assert_eq!(f.row_count(f.part_b), 1);
    assert_eq!(f.on_hand(f.part_b), Quantity::from_int(1));
}

#[test]
fn failing_row_leaves_sibling_postings_visible() {
    let f = setup();
    // Row 0 drains PART-B to zero; row 1 then needs 0.5 more.
    let report = f.executor(ShipmentPolicy::default()).execute(&request(
        BatchMode::Production,
        &[(f.asm, Quantity::from_int(2)), (f.asm, Quantity::from_int(1))],
    ));

    assert_eq!(report.succeeded, 1);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].row, 1);
    assert_eq!(report.failed[0].reason, RowFailure::InsufficientStock);

    // Row 0's three postings exist; row 1 added none.
    assert_eq!(f.row_count(f.asm), 1);
    assert_eq!(f.row_count(f.part_a), 2);
    assert_eq!(f.row_count(f.part_b), 2);
    assert_eq!(f.on_hand(f.asm), Quantity::from_int(2));
    assert_eq!(f.on_hand(f.part_a), Quantity::from_int(6));
}

#[test]
fn row_level_failures_carry_reason_codes() {
    let f = setup();
    let (bare_asm, unmanaged) = (ItemId::new(), ItemId::new());
    f.catalog.upsert(Item::assembly(bare_asm, "ASM-2")).unwrap();
    f.catalog.upsert(Item::component(unmanaged, "GLUE").unmanaged()).unwrap();

    let report = f.executor(ShipmentPolicy::default()).execute(&request(
        BatchMode::Production,
        &[
            (f.asm, Quantity::ZERO),
            (ItemId::new(), Quantity::from_int(1)),
            (f.part_a, Quantity::from_int(1)),
            (bare_asm, Quantity::from_int(1)),
            (unmanaged, Quantity::from_int(1)),
            (f.asm, Quantity::from_int(1)),
        ],
    ));

    let reasons: Vec<RowFailure> = report.failed.iter().map(|r| r.reason).collect();
    assert_eq!(
        reasons,
        vec![
            RowFailure::InvalidQuantity,
            RowFailure::NotFound,
            RowFailure::Validation,
            RowFailure::BomMissing,
            RowFailure::NotManaged,
        ]
    );
    assert_eq!(report.succeeded, 1);
    assert!(report.outcomes[5].is_success());
}

#[test]
fn stock_in_rows_post_single_in_rows() {
    let f = setup();
    let report = f.executor(ShipmentPolicy::default()).execute(&request(
        BatchMode::StockIn,
        &[(f.part_a, Quantity::from_int(5)), (f.part_b, qty(dec!(2.25)))],
    ));

    assert_eq!(report.succeeded, 2);
    assert!(report.consumption.is_empty());
    assert_eq!(f.on_hand(f.part_a), Quantity::from_int(15));
    assert_eq!(f.on_hand(f.part_b), qty(dec!(3.25)));

    let last = f.ledger.load_recent(f.part_b, 1).unwrap();
    assert_eq!(last[0].transaction_type, TransactionType::In);
    assert_eq!(last[0].note.as_deref(), Some("stock_in"));
}

#[test]
fn shipment_policies_drain_the_configured_ledgers() {
    let cases = [
        // (policy, asm after, PART-A after, PART-B after)
        (ShipmentPolicy::AssemblyAndComponents, 1, dec!(8), dec!(0.5)),
        (ShipmentPolicy::AssemblyOnly, 1, dec!(10), dec!(1)),
        (ShipmentPolicy::ComponentsOnly, 2, dec!(8), dec!(0.5)),
    ];

    for (policy, asm_after, a_after, b_after) in cases {
        let f = setup();
        f.stock().post(f.asm, Quantity::from_int(2), TransactionType::In, None).unwrap();

        let report = f
            .executor(policy)
            .execute(&request(BatchMode::Shipment, &[(f.asm, Quantity::from_int(1))]));

        assert_eq!(report.succeeded, 1, "{policy:?}");
        assert_eq!(f.on_hand(f.asm), Quantity::from_int(asm_after), "{policy:?}");
        assert_eq!(f.on_hand(f.part_a), qty(a_after), "{policy:?}");
        assert_eq!(f.on_hand(f.part_b), qty(b_after), "{policy:?}");
    }
}

#[test]
fn shipment_without_assembly_stock_fails_whole_row() {
    let f = setup();
    let report = f
        .executor(ShipmentPolicy::AssemblyAndComponents)
        .execute(&request(BatchMode::Shipment, &[(f.asm, Quantity::from_int(1))]));

    assert_eq!(report.failed[0].reason, RowFailure::InsufficientStock);
    assert_eq!(f.on_hand(f.part_a), Quantity::from_int(10));
    assert_eq!(f.row_count(f.part_b), 1);
}

#[test]
fn resolution_reads_the_revision_current_at_execution() {
    let f = setup();
    f.bom()
        .create_revision(f.asm, vec![BomLine::new(f.part_a, Quantity::from_int(1))])
        .unwrap();

    let report = f
        .executor(ShipmentPolicy::default())
        .execute(&request(BatchMode::Production, &[(f.asm, Quantity::from_int(3))]));

    assert_eq!(report.succeeded, 1);
    assert_eq!(f.on_hand(f.part_a), Quantity::from_int(7));
    assert_eq!(f.on_hand(f.part_b), Quantity::from_int(1));
}

#[test]
fn component_removed_from_catalog_fails_the_row() {
    let f = setup();
    f.catalog.remove(f.part_b).unwrap();

    let report = f
        .executor(ShipmentPolicy::default())
        .execute(&request(BatchMode::Production, &[(f.asm, Quantity::from_int(1))]));

    assert_eq!(report.failed[0].reason, RowFailure::NotFound);
    assert_eq!(f.row_count(f.asm), 0);
    assert_eq!(f.row_count(f.part_a), 1);
}

/// Ledger that refuses appends touching one item, as if the backend dropped.
struct FailingLedger {
    inner: Arc<InMemoryLedgerStore>,
    poisoned: ItemId,
}

impl LedgerStore for FailingLedger {
    fn stock_level(&self, item_id: ItemId) -> Result<StockLevel, StoreError> {
        self.inner.stock_level(item_id)
    }

    fn load_transactions(&self, item_id: ItemId) -> Result<Vec<StockTransaction>, StoreError> {
        self.inner.load_transactions(item_id)
    }

    fn append(
        &self,
        transactions: Vec<NewTransaction>,
        expected: &[(ItemId, ExpectedVersion)],
    ) -> Result<Vec<StockTransaction>, StoreError> {
        if transactions.iter().any(|t| t.item_id == self.poisoned) {
            return Err(StoreError::Backend("connection reset".to_string()));
        }
        self.inner.append(transactions, expected)
    }
}

#[test]
fn storage_failure_fails_only_the_inflight_row() {
    let f = setup();
    let ledger = Arc::new(FailingLedger {
        inner: f.ledger.clone(),
        poisoned: f.asm,
    });

    let report = f.executor_with(ledger, ShipmentPolicy::default()).execute(&request(
        BatchMode::StockIn,
        &[(f.part_a, Quantity::from_int(1)), (f.asm, Quantity::from_int(1)), (f.part_b, Quantity::from_int(1))],
    ));

    assert_eq!(report.succeeded, 2);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].row, 1);
    assert_eq!(report.failed[0].reason, RowFailure::StorageError);
    assert_eq!(f.on_hand(f.part_a), Quantity::from_int(11));
    assert_eq!(f.on_hand(f.part_b), Quantity::from_int(2));
    assert_eq!(f.row_count(f.asm), 0);
}

#[test]
fn new_revision_never_mutates_older_ones() {
    let f = setup();
    let bom = f.bom();
    let before = serde_json::to_vec(&bom.get_revision(f.asm, 1).unwrap()).unwrap();

    let rev_no = bom
        .create_revision(f.asm, vec![BomLine::new(f.part_a, Quantity::from_int(3)).with_note("rework")])
        .unwrap();
    assert_eq!(rev_no, 2);

    let after = serde_json::to_vec(&bom.get_revision(f.asm, 1).unwrap()).unwrap();
    assert_eq!(before, after);
    assert_eq!(bom.get_current_bom(f.asm).unwrap().rev_no, 2);
}

#[test]
fn current_bom_reads_are_idempotent() {
    let f = setup();
    let bom = f.bom();
    let first = bom.get_current_bom(f.asm).unwrap();
    let second = bom.get_current_bom(f.asm).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.rev_no, 1);
    assert_eq!(first.lines.len(), 2);
}

#[test]
fn deletion_policy_is_explicit() {
    let f = setup();
    let bom = f.bom();

    // Sole revision: refused.
    assert!(matches!(
        bom.delete_revision(f.asm, 1),
        Err(ServiceError::Domain(DomainError::Conflict(_)))
    ));

    // Historical revision: removed, pointer unchanged.
    bom.create_revision(f.asm, vec![BomLine::new(f.part_a, Quantity::from_int(1))]).unwrap();
    assert_eq!(bom.delete_revision(f.asm, 1).unwrap(), 2);
    assert_eq!(bom.get_current_bom(f.asm).unwrap().rev_no, 2);
    assert!(matches!(
        bom.get_revision(f.asm, 1),
        Err(ServiceError::Domain(DomainError::NotFound(_)))
    ));

    // Current revision: predecessor promoted; rev_no 3 is never handed out again.
    bom.create_revision(f.asm, vec![BomLine::new(f.part_b, Quantity::from_int(1))]).unwrap();
    assert_eq!(bom.delete_revision(f.asm, 3).unwrap(), 2);
    assert_eq!(bom.get_current_bom(f.asm).unwrap().rev_no, 2);
    let next = bom
        .create_revision(f.asm, vec![BomLine::new(f.part_b, Quantity::from_int(2))])
        .unwrap();
    assert_eq!(next, 4);

    assert!(matches!(
        bom.delete_revision(f.asm, 99),
        Err(ServiceError::Domain(DomainError::NotFound(_)))
    ));
}

#[test]
fn revisions_list_newest_first_with_current_flag() {
    let f = setup();
    let bom = f.bom();
    bom.create_revision(f.asm, vec![BomLine::new(f.part_a, Quantity::from_int(1))]).unwrap();

    let list = bom.list_revisions(f.asm).unwrap();
    assert_eq!(list.iter().map(|s| s.rev_no).collect::<Vec<_>>(), vec![2, 1]);
    assert!(list[0].is_current && !list[1].is_current);
    assert_eq!(list[1].line_count, 2);

    // Known assembly without history lists empty; unknown ids are NotFound.
    let fresh = ItemId::new();
    f.catalog.upsert(Item::assembly(fresh, "ASM-3")).unwrap();
    assert!(bom.list_revisions(fresh).unwrap().is_empty());
    assert!(matches!(
        bom.list_revisions(ItemId::new()),
        Err(ServiceError::Domain(DomainError::NotFound(_)))
    ));
}

#[test]
fn restore_copies_history_into_a_new_revision() {
    let f = setup();
    let bom = f.bom();
    bom.create_revision(f.asm, vec![BomLine::new(f.part_a, Quantity::from_int(1))]).unwrap();

    let restored = bom.restore_revision(f.asm, 1).unwrap();
    assert_eq!(restored, 3);
    let current = bom.get_current_bom(f.asm).unwrap();
    assert_eq!(current.lines, bom.get_revision(f.asm, 1).unwrap().lines);

    assert!(matches!(
        bom.restore_revision(f.asm, 3),
        Err(ServiceError::Domain(DomainError::Conflict(_)))
    ));

    let view = bom.view(f.asm, Some(2)).unwrap();
    assert!(!view.is_current);
    assert!(bom.view(f.asm, None).unwrap().is_current);
}

#[test]
fn create_revision_checks_the_catalog() {
    let f = setup();
    let bom = f.bom();
    let glue = ItemId::new();
    f.catalog.upsert(Item::component(glue, "GLUE").unmanaged()).unwrap();

    let one = |id| vec![BomLine::new(id, Quantity::from_int(1))];

    assert!(matches!(
        bom.create_revision(ItemId::new(), one(f.part_a)),
        Err(ServiceError::Domain(DomainError::NotFound(_)))
    ));
    assert!(matches!(
        bom.create_revision(f.part_a, one(f.part_b)),
        Err(ServiceError::Domain(DomainError::Validation(_)))
    ));
    assert!(matches!(
        bom.create_revision(f.asm, one(ItemId::new())),
        Err(ServiceError::Domain(DomainError::NotFound(_)))
    ));
    assert!(matches!(
        bom.create_revision(f.asm, one(glue)),
        Err(ServiceError::Domain(DomainError::NotManaged(_)))
    ));
    assert!(matches!(
        bom.create_revision(f.asm, one(f.asm)),
        Err(ServiceError::Domain(DomainError::Validation(_)))
    ));
    assert!(matches!(
        bom.create_revision(f.asm, vec![]),
        Err(ServiceError::Domain(DomainError::Validation(_)))
    ));

    // None of the rejected attempts allocated a revision.
    assert_eq!(bom.list_revisions(f.asm).unwrap().len(), 1);
}

#[test]
fn cycles_through_current_boms_are_rejected() {
    let f = setup();
    let bom = f.bom();
    let sub = ItemId::new();
    f.catalog.upsert(Item::assembly(sub, "SUB-1")).unwrap();

    bom.create_revision(sub, vec![BomLine::new(f.part_a, Quantity::from_int(1))]).unwrap();
    bom.create_revision(f.asm, vec![BomLine::new(sub, Quantity::from_int(2))]).unwrap();

    let err = bom
        .create_revision(sub, vec![BomLine::new(f.asm, Quantity::from_int(1))])
        .unwrap_err();
    assert!(matches!(err, ServiceError::Domain(DomainError::InvariantViolation(_))));
    assert_eq!(bom.get_current_bom(sub).unwrap().rev_no, 1);
}

#[test]
fn stale_head_version_is_a_concurrency_error() {
    let f = setup();
    let head = f.revisions.load_head(f.asm).unwrap().unwrap();
    let bom = bomledger_bom::AssemblyBom::rehydrate(f.asm, Some(head), f.revisions.load_revisions(f.asm).unwrap())
        .unwrap();

    // Another writer commits first.
    f.bom()
        .create_revision(f.asm, vec![BomLine::new(f.part_a, Quantity::from_int(5))])
        .unwrap();

    let events = bom
        .handle(&bomledger_bom::BomCommand::CreateRevision(bomledger_bom::CreateRevision {
            assembly_id: f.asm,
            record_id: bomledger_core::RevisionId::new(),
            lines: vec![BomLine::new(f.part_b, Quantity::from_int(1))],
            created_at: chrono::Utc::now(),
        }))
        .unwrap();
    let err = f
        .revisions
        .commit(f.asm, ExpectedVersion::Exact(bom.version()), &events)
        .unwrap_err();
    assert!(matches!(err, StoreError::Concurrency(_)));
}

#[test]
fn adjust_posts_signed_delta_toward_target() {
    let f = setup();
    let stock = f.stock();

    let down = stock.adjust_to(f.part_a, Quantity::from_int(7), Some("cycle count".into())).unwrap().unwrap();
    assert_eq!(down.transaction_type, TransactionType::Adjust);
    assert_eq!(down.direction, Direction::Decrease);
    assert_eq!(down.qty, Quantity::from_int(3));

    let up = stock.adjust_to(f.part_a, qty(dec!(7.5)), None).unwrap().unwrap();
    assert_eq!(up.direction, Direction::Increase);
    assert_eq!(up.qty, qty(dec!(0.5)));

    assert!(stock.adjust_to(f.part_a, qty(dec!(7.5)), None).unwrap().is_none());
    assert!(matches!(
        stock.adjust_to(f.part_a, Quantity::from_int(-1), None),
        Err(ServiceError::Domain(DomainError::InvalidQuantity(_)))
    ));

    let rows = f.ledger.load_transactions(f.part_a).unwrap();
    assert_eq!(LedgerTotals::from_transactions(&rows).on_hand(), qty(dec!(7.5)));
    assert_eq!(stock.current_stock(f.part_a).unwrap(), qty(dec!(7.5)));
}

#[test]
fn post_refuses_adjust_so_counts_only_use_targets() {
    let f = setup();
    let stock = f.stock();

    let err = stock
        .post(f.part_a, Quantity::from_int(4), TransactionType::Adjust, None)
        .unwrap_err();
    assert!(matches!(err, ServiceError::Domain(DomainError::Validation(_))));
    assert_eq!(f.row_count(f.part_a), 1);
    assert_eq!(f.on_hand(f.part_a), Quantity::from_int(10));

    let row = stock.adjust_to(f.part_a, Quantity::from_int(4), None).unwrap().unwrap();
    assert_eq!((row.direction, row.qty), (Direction::Decrease, Quantity::from_int(6)));
    assert_eq!(f.on_hand(f.part_a), Quantity::from_int(4));
}

#[test]
fn oversized_stock_in_row_fails_alone_and_the_batch_still_reports() {
    let f = setup();
    let report = f.executor(ShipmentPolicy::default()).execute(&request(
        BatchMode::StockIn,
        &[
            (f.part_a, Quantity::from_int(1)),
            (f.part_a, Quantity::new(rust_decimal::Decimal::MAX)),
            (f.part_b, Quantity::from_int(2)),
        ],
    ));

    assert_eq!(report.succeeded, 2);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].row, 1);
    assert_eq!(report.failed[0].reason, RowFailure::InvalidQuantity);
    assert_eq!(f.on_hand(f.part_a), Quantity::from_int(11));
    assert_eq!(f.row_count(f.part_a), 2);
    assert_eq!(f.on_hand(f.part_b), Quantity::from_int(3));
}

#[test]
fn posting_set_is_all_or_nothing() {
    let f = setup();
    let stock = f.stock();
    let err = stock
        .post_batch(
            vec![
                bomledger_ledger::Posting::stock_in(f.asm, Quantity::from_int(1)),
                bomledger_ledger::Posting::stock_out(f.part_b, Quantity::from_int(2)),
            ],
            None,
        )
        .unwrap_err();

    match err {
        ServiceError::Domain(DomainError::InsufficientStock { item_id, available, requested }) => {
            assert_eq!(item_id, f.part_b);
            assert_eq!(available, Quantity::from_int(1));
            assert_eq!(requested, Quantity::from_int(2));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(f.row_count(f.asm), 0);

    assert!(matches!(
        stock.post(f.part_a, Quantity::ZERO, TransactionType::In, None),
        Err(ServiceError::Domain(DomainError::InvalidQuantity(_)))
    ));
}

#[test]
fn history_is_newest_first_and_bounded() {
    let f = setup();
    let stock = f.stock();
    stock.post(f.part_a, Quantity::from_int(1), TransactionType::In, Some("late delivery".into())).unwrap();
    stock.post(f.part_a, Quantity::from_int(4), TransactionType::Out, None).unwrap();

    let rows = stock.history(f.part_a, 2).unwrap();
    assert_eq!(rows.iter().map(|r| r.sequence_number).collect::<Vec<_>>(), vec![3, 2]);
    assert_eq!(rows[1].note.as_deref(), Some("late delivery"));

    assert!(matches!(
        stock.history(f.part_a, 0),
        Err(ServiceError::Domain(DomainError::Validation(_)))
    ));
    assert!(matches!(
        stock.history(ItemId::new(), 10),
        Err(ServiceError::Domain(DomainError::NotFound(_)))
    ));
}

#[test]
fn summary_flags_reorder_and_rounds_to_packs() {
    let f = setup();
    f.catalog
        .upsert(
            Item::component(f.part_a, "PART-A")
                .with_reorder_point(Quantity::from_int(25))
                .with_pack_qty(Quantity::from_int(10)),
        )
        .unwrap();

    let summary = f.stock().summary().unwrap();
    assert_eq!(summary[0].code, "PART-A");
    assert!(summary[0].below_reorder);
    assert_eq!(summary[0].shortfall, Quantity::from_int(15));
    assert_eq!(summary[0].suggested_order, Quantity::from_int(20));
    assert_eq!(
        summary.iter().skip(1).map(|l| l.code.as_str()).collect::<Vec<_>>(),
        vec!["ASM-1", "PART-B"]
    );
}

#[test]
fn ledger_fold_matches_store_level() {
    let f = setup();
    f.executor(ShipmentPolicy::default())
        .execute(&request(BatchMode::Production, &[(f.asm, Quantity::from_int(2))]));
    f.stock().adjust_to(f.part_a, Quantity::from_int(9), None).unwrap();

    for item in [f.asm, f.part_a, f.part_b] {
        let rows = f.ledger.load_transactions(item).unwrap();
        assert_eq!(StockLevel::fold(item, &rows), f.ledger.stock_level(item).unwrap());
    }
}
