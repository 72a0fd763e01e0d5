use std::sync::Arc;

use bomledger_bom::{BomEvent, BomHead, BomRevision};
use bomledger_core::{ExpectedVersion, ItemId};

use crate::error::StoreError;

/// Revision store abstraction.
///
/// Implementations must:
/// - keep revisions immutable once written (only whole-revision deletes)
/// - enforce the head `version` (optimistic concurrency) on `commit`
/// - apply all events of one `commit` atomically (header + lines + pointer)
pub trait RevisionStore: Send + Sync {
    /// Head record, or `None` when the assembly never had a revision.
    fn load_head(&self, assembly_id: ItemId) -> Result<Option<BomHead>, StoreError>;

    /// All surviving revisions, ordered by `rev_no` ascending.
    fn load_revisions(&self, assembly_id: ItemId) -> Result<Vec<BomRevision>, StoreError>;

    fn load_revision(&self, assembly_id: ItemId, rev_no: u32) -> Result<Option<BomRevision>, StoreError>;

    /// The revision the head points at.
    fn load_current(&self, assembly_id: ItemId) -> Result<Option<BomRevision>, StoreError> {
        match self.load_head(assembly_id)? {
            Some(head) => self.load_revision(assembly_id, head.current_rev_no),
            None => Ok(None),
        }
    }

    /// Persist the events of one decision and return the new head.
    ///
    /// `expected` is checked against the stored head version (0 when no head).
    fn commit(
        &self,
        assembly_id: ItemId,
        expected: ExpectedVersion,
        events: &[BomEvent],
    ) -> Result<BomHead, StoreError>;
}

impl<S> RevisionStore for Arc<S>
where
    S: RevisionStore + ?Sized,
{
    fn load_head(&self, assembly_id: ItemId) -> Result<Option<BomHead>, StoreError> {
        (**self).load_head(assembly_id)
    }

    fn load_revisions(&self, assembly_id: ItemId) -> Result<Vec<BomRevision>, StoreError> {
        (**self).load_revisions(assembly_id)
    }

    fn load_revision(&self, assembly_id: ItemId, rev_no: u32) -> Result<Option<BomRevision>, StoreError> {
        (**self).load_revision(assembly_id, rev_no)
    }

    fn load_current(&self, assembly_id: ItemId) -> Result<Option<BomRevision>, StoreError> {
        (**self).load_current(assembly_id)
    }

    fn commit(
        &self,
        assembly_id: ItemId,
        expected: ExpectedVersion,
        events: &[BomEvent],
    ) -> Result<BomHead, StoreError> {
        (**self).commit(assembly_id, expected, events)
    }
}

/// Fold committed events into the head record.
///
/// A created revision becomes current and raises the high-water mark; a
/// deletion moves the pointer only when it names a promoted revision.
pub fn advance_head(
    assembly_id: ItemId,
    head: Option<BomHead>,
    events: &[BomEvent],
) -> Result<BomHead, StoreError> {
    let mut next = head;
    for event in events {
        next = match (next, event) {
            (current, BomEvent::RevisionCreated(e)) => {
                if e.revision.assembly_id != assembly_id {
                    return Err(StoreError::Constraint("revision belongs to another assembly".to_string()));
                }
                let last = current.map(|h| h.last_rev_no).unwrap_or(0);
                if e.revision.rev_no <= last {
                    return Err(StoreError::Concurrency(format!(
                        "rev_no {} already allocated for assembly {assembly_id}",
                        e.revision.rev_no
                    )));
                }
                Some(BomHead {
                    assembly_id,
                    current_rev_no: e.revision.rev_no,
                    last_rev_no: e.revision.rev_no,
                    version: current.map(|h| h.version).unwrap_or(0) + 1,
                })
            }
            (Some(h), BomEvent::RevisionDeleted(e)) => {
                let current_rev_no = match e.promoted {
                    Some(promoted) => promoted,
                    None if h.current_rev_no == e.rev_no => {
                        return Err(StoreError::Constraint(format!(
                            "deleting current revision {} requires a promotion",
                            e.rev_no
                        )));
                    }
                    None => h.current_rev_no,
                };
                Some(BomHead {
                    current_rev_no,
                    version: h.version + 1,
                    ..h
                })
            }
            (None, BomEvent::RevisionDeleted(e)) => {
                return Err(StoreError::Constraint(format!(
                    "assembly {assembly_id} has no revision {}",
                    e.rev_no
                )));
            }
        };
    }

    next.ok_or_else(|| StoreError::Constraint(format!("no events to commit for assembly {assembly_id}")))
}
