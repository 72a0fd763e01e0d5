use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use bomledger_bom::{BomEvent, BomHead, BomRevision};
use bomledger_core::{ExpectedVersion, ItemId};

use super::r#trait::{RevisionStore, advance_head};
use crate::error::StoreError;

#[derive(Debug, Clone, Default)]
struct AssemblyRecords {
    head: Option<BomHead>,
    revisions: BTreeMap<u32, BomRevision>,
}

/// In-memory revision store.
///
/// Intended for tests/dev. Version check and write happen under one write lock,
/// so a commit either lands completely or not at all.
#[derive(Debug, Default)]
pub struct InMemoryRevisionStore {
    assemblies: RwLock<HashMap<ItemId, AssemblyRecords>>,
}

impl InMemoryRevisionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RevisionStore for InMemoryRevisionStore {
    fn load_head(&self, assembly_id: ItemId) -> Result<Option<BomHead>, StoreError> {
        let assemblies = self
            .assemblies
            .read()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))?;
        Ok(assemblies.get(&assembly_id).and_then(|a| a.head))
    }

    fn load_revisions(&self, assembly_id: ItemId) -> Result<Vec<BomRevision>, StoreError> {
        let assemblies = self
            .assemblies
            .read()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))?;
        Ok(assemblies
            .get(&assembly_id)
            .map(|a| a.revisions.values().cloned().collect())
            .unwrap_or_default())
    }

    fn load_revision(&self, assembly_id: ItemId, rev_no: u32) -> Result<Option<BomRevision>, StoreError> {
        let assemblies = self
            .assemblies
            .read()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))?;
        Ok(assemblies
            .get(&assembly_id)
            .and_then(|a| a.revisions.get(&rev_no))
            .cloned())
    }

    fn commit(
        &self,
        assembly_id: ItemId,
        expected: ExpectedVersion,
        events: &[BomEvent],
    ) -> Result<BomHead, StoreError> {
        let mut assemblies = self
            .assemblies
            .write()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))?;

        let existing = assemblies.get(&assembly_id).cloned().unwrap_or_default();
        let current_version = existing.head.map(|h| h.version).unwrap_or(0);
        if !expected.matches(current_version) {
            return Err(StoreError::Concurrency(format!(
                "expected {expected:?}, found version {current_version} for assembly {assembly_id}"
            )));
        }

        // Stage on a copy; nothing becomes visible unless every event applies.
        let head = advance_head(assembly_id, existing.head, events)?;
        let mut staged = existing;
        for event in events {
            match event {
                BomEvent::RevisionCreated(e) => {
                    staged.revisions.insert(e.revision.rev_no, e.revision.clone());
                }
                BomEvent::RevisionDeleted(e) => {
                    if staged.revisions.remove(&e.rev_no).is_none() {
                        return Err(StoreError::Constraint(format!(
                            "assembly {assembly_id} has no revision {}",
                            e.rev_no
                        )));
                    }
                }
            }
        }
        if !staged.revisions.contains_key(&head.current_rev_no) {
            return Err(StoreError::Constraint(format!(
                "head would point at missing revision {}",
                head.current_rev_no
            )));
        }
        staged.head = Some(head);

        assemblies.insert(assembly_id, staged);
        Ok(head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bomledger_bom::{BomLine, RevisionCreated, RevisionDeleted};
    use bomledger_core::{Quantity, RevisionId};
    use chrono::Utc;

    fn created(assembly_id: ItemId, rev_no: u32) -> BomEvent {
        BomEvent::RevisionCreated(RevisionCreated {
            revision: BomRevision {
                record_id: RevisionId::new(),
                assembly_id,
                rev_no,
                created_at: Utc::now(),
                lines: vec![BomLine::new(ItemId::new(), Quantity::from_int(1))],
            },
        })
    }

    #[test]
    fn stale_version_is_rejected() {
        let store = InMemoryRevisionStore::new();
        let asm = ItemId::new();
        store.commit(asm, ExpectedVersion::Exact(0), &[created(asm, 1)]).unwrap();

        let err = store
            .commit(asm, ExpectedVersion::Exact(0), &[created(asm, 2)])
            .unwrap_err();
        assert!(matches!(err, StoreError::Concurrency(_)));
        assert_eq!(store.load_revisions(asm).unwrap().len(), 1);
    }

    #[test]
    fn failed_commit_leaves_state_untouched() {
        let store = InMemoryRevisionStore::new();
        let asm = ItemId::new();
        store.commit(asm, ExpectedVersion::Exact(0), &[created(asm, 1)]).unwrap();

        let bogus = BomEvent::RevisionDeleted(RevisionDeleted {
            assembly_id: asm,
            rev_no: 7,
            promoted: None,
        });
        let err = store
            .commit(asm, ExpectedVersion::Exact(1), &[created(asm, 2), bogus])
            .unwrap_err();
        assert!(matches!(err, StoreError::Constraint(_)));

        let head = store.load_head(asm).unwrap().unwrap();
        assert_eq!((head.current_rev_no, head.last_rev_no, head.version), (1, 1, 1));
        assert!(store.load_revision(asm, 2).unwrap().is_none());
    }

    #[test]
    fn deleting_current_moves_pointer_to_promoted() {
        let store = InMemoryRevisionStore::new();
        let asm = ItemId::new();
        store.commit(asm, ExpectedVersion::Exact(0), &[created(asm, 1)]).unwrap();
        store.commit(asm, ExpectedVersion::Exact(1), &[created(asm, 2)]).unwrap();

        let head = store
            .commit(
                asm,
                ExpectedVersion::Exact(2),
                &[BomEvent::RevisionDeleted(RevisionDeleted {
                    assembly_id: asm,
                    rev_no: 2,
                    promoted: Some(1),
                })],
            )
            .unwrap();
        assert_eq!((head.current_rev_no, head.last_rev_no), (1, 2));
        assert_eq!(store.load_current(asm).unwrap().unwrap().rev_no, 1);
    }
}
