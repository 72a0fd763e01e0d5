use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bomledger_core::{Aggregate, AggregateRoot, DomainError, ItemId, RevisionId};

use crate::revision::{BomLine, BomRevision, CurrentBom, RevisionSummary};

/// Persisted pointer record for one assembly.
///
/// `current_rev_no` is the revision consumption resolves against;
/// `last_rev_no` is the allocation high-water mark (never reused, even after the
/// newest revision is deleted); `version` guards concurrent writers.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BomHead {
    pub assembly_id: ItemId,
    pub current_rev_no: u32,
    pub last_rev_no: u32,
    pub version: u64,
}

/// Aggregate root: the revision history of one assembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblyBom {
    assembly_id: ItemId,
    revisions: BTreeMap<u32, BomRevision>,
    current_rev_no: Option<u32>,
    last_rev_no: u32,
    version: u64,
}

impl AssemblyBom {
    /// An assembly that has never had a revision (valid: new assemblies start BOM-less).
    pub fn empty(assembly_id: ItemId) -> Self {
        Self {
            assembly_id,
            revisions: BTreeMap::new(),
            current_rev_no: None,
            last_rev_no: 0,
            version: 0,
        }
    }

    /// Rebuild the aggregate from stored rows, checking they are consistent.
    pub fn rehydrate(
        assembly_id: ItemId,
        head: Option<BomHead>,
        revisions: Vec<BomRevision>,
    ) -> Result<Self, DomainError> {
        let mut bom = Self::empty(assembly_id);
        for rev in revisions {
            if rev.assembly_id != assembly_id {
                return Err(DomainError::invariant("revision belongs to another assembly"));
            }
            bom.revisions.insert(rev.rev_no, rev);
        }

        match head {
            None if bom.revisions.is_empty() => Ok(bom),
            None => Err(DomainError::invariant(format!(
                "assembly {assembly_id} has revisions but no head record"
            ))),
            Some(head) => {
                if head.assembly_id != assembly_id {
                    return Err(DomainError::invariant("head belongs to another assembly"));
                }
                if !bom.revisions.contains_key(&head.current_rev_no) {
                    return Err(DomainError::invariant(format!(
                        "current revision {} of assembly {assembly_id} is missing",
                        head.current_rev_no
                    )));
                }
                bom.current_rev_no = Some(head.current_rev_no);
                bom.last_rev_no = head.last_rev_no;
                bom.version = head.version;
                Ok(bom)
            }
        }
    }

    pub fn assembly_id(&self) -> ItemId {
        self.assembly_id
    }

    pub fn current(&self) -> Option<&BomRevision> {
        self.current_rev_no.and_then(|r| self.revisions.get(&r))
    }

    pub fn current_bom(&self) -> Option<CurrentBom> {
        self.current().map(CurrentBom::from)
    }

    pub fn current_rev_no(&self) -> Option<u32> {
        self.current_rev_no
    }

    pub fn last_rev_no(&self) -> u32 {
        self.last_rev_no
    }

    pub fn revision(&self, rev_no: u32) -> Option<&BomRevision> {
        self.revisions.get(&rev_no)
    }

    pub fn revision_count(&self) -> usize {
        self.revisions.len()
    }

    /// History listing, newest first.
    pub fn summaries(&self) -> Vec<RevisionSummary> {
        self.revisions
            .values()
            .rev()
            .map(|rev| RevisionSummary {
                rev_no: rev.rev_no,
                created_at: rev.created_at,
                line_count: rev.lines.len(),
                is_current: Some(rev.rev_no) == self.current_rev_no,
            })
            .collect()
    }

    pub fn head(&self) -> Option<BomHead> {
        self.current_rev_no.map(|current| BomHead {
            assembly_id: self.assembly_id,
            current_rev_no: current,
            last_rev_no: self.last_rev_no,
            version: self.version,
        })
    }
}

impl AggregateRoot for AssemblyBom {
    type Id = ItemId;

    fn id(&self) -> &Self::Id {
        &self.assembly_id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreateRevision.
///
/// Catalog checks (component existence, stock management, cycles) happen before
/// the command is built; the aggregate enforces the structural rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateRevision {
    pub assembly_id: ItemId,
    pub record_id: RevisionId,
    pub lines: Vec<BomLine>,
    pub created_at: DateTime<Utc>,
}

/// Command: DeleteRevision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteRevision {
    pub assembly_id: ItemId,
    pub rev_no: u32,
}

/// Command: RestoreRevision (copy a historical line set into a new revision).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestoreRevision {
    pub assembly_id: ItemId,
    pub rev_no: u32,
    pub record_id: RevisionId,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BomCommand {
    CreateRevision(CreateRevision),
    DeleteRevision(DeleteRevision),
    RestoreRevision(RestoreRevision),
}

/// Event: RevisionCreated (the new revision becomes current).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionCreated {
    pub revision: BomRevision,
}

/// Event: RevisionDeleted.
///
/// `promoted` is set when the deleted revision was current and the
/// next-most-recent revision took its place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionDeleted {
    pub assembly_id: ItemId,
    pub rev_no: u32,
    pub promoted: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BomEvent {
    RevisionCreated(RevisionCreated),
    RevisionDeleted(RevisionDeleted),
}

impl Aggregate for AssemblyBom {
    type Command = BomCommand;
    type Event = BomEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            BomEvent::RevisionCreated(e) => {
                let rev_no = e.revision.rev_no;
                self.revisions.insert(rev_no, e.revision.clone());
                self.current_rev_no = Some(rev_no);
                self.last_rev_no = self.last_rev_no.max(rev_no);
            }
            BomEvent::RevisionDeleted(e) => {
                self.revisions.remove(&e.rev_no);
                if let Some(promoted) = e.promoted {
                    self.current_rev_no = Some(promoted);
                }
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            BomCommand::CreateRevision(cmd) => self.handle_create(cmd),
            BomCommand::DeleteRevision(cmd) => self.handle_delete(cmd),
            BomCommand::RestoreRevision(cmd) => self.handle_restore(cmd),
        }
    }
}

impl AssemblyBom {
    fn ensure_assembly_id(&self, assembly_id: ItemId) -> Result<(), DomainError> {
        if self.assembly_id != assembly_id {
            return Err(DomainError::invariant("assembly_id mismatch"));
        }
        Ok(())
    }

    fn validate_lines(&self, lines: &[BomLine]) -> Result<(), DomainError> {
        if lines.is_empty() {
            return Err(DomainError::validation("a BOM revision needs at least one line"));
        }

        let mut seen = HashSet::with_capacity(lines.len());
        for line in lines {
            if line.component_id == self.assembly_id {
                return Err(DomainError::validation(format!(
                    "assembly {} cannot consume itself",
                    self.assembly_id
                )));
            }
            line.qty_per_unit.ensure_positive("qty_per_unit")?;
            if !seen.insert(line.component_id) {
                return Err(DomainError::conflict(format!(
                    "component {} appears more than once",
                    line.component_id
                )));
            }
        }
        Ok(())
    }

    fn new_revision(
        &self,
        record_id: RevisionId,
        lines: Vec<BomLine>,
        created_at: DateTime<Utc>,
    ) -> BomEvent {
        BomEvent::RevisionCreated(RevisionCreated {
            revision: BomRevision {
                record_id,
                assembly_id: self.assembly_id,
                rev_no: self.last_rev_no + 1,
                created_at,
                lines,
            },
        })
    }

    fn handle_create(&self, cmd: &CreateRevision) -> Result<Vec<BomEvent>, DomainError> {
        self.ensure_assembly_id(cmd.assembly_id)?;
        self.validate_lines(&cmd.lines)?;

        Ok(vec![self.new_revision(cmd.record_id, cmd.lines.clone(), cmd.created_at)])
    }

    fn handle_delete(&self, cmd: &DeleteRevision) -> Result<Vec<BomEvent>, DomainError> {
        self.ensure_assembly_id(cmd.assembly_id)?;

        if !self.revisions.contains_key(&cmd.rev_no) {
            return Err(DomainError::not_found(format!(
                "revision {} of assembly {}",
                cmd.rev_no, self.assembly_id
            )));
        }
        if self.revisions.len() == 1 {
            return Err(DomainError::conflict(format!(
                "revision {} is the only revision of assembly {}",
                cmd.rev_no, self.assembly_id
            )));
        }

        let promoted = if self.current_rev_no == Some(cmd.rev_no) {
            // Highest remaining revision is the deterministic predecessor.
            let predecessor = self
                .revisions
                .keys()
                .rev()
                .copied()
                .find(|r| *r != cmd.rev_no)
                .ok_or_else(|| {
                    DomainError::conflict("no predecessor revision to promote")
                })?;
            Some(predecessor)
        } else {
            None
        };

        Ok(vec![BomEvent::RevisionDeleted(RevisionDeleted {
            assembly_id: self.assembly_id,
            rev_no: cmd.rev_no,
            promoted,
        })])
    }

    fn handle_restore(&self, cmd: &RestoreRevision) -> Result<Vec<BomEvent>, DomainError> {
        self.ensure_assembly_id(cmd.assembly_id)?;

        let source = self.revisions.get(&cmd.rev_no).ok_or_else(|| {
            DomainError::not_found(format!(
                "revision {} of assembly {}",
                cmd.rev_no, self.assembly_id
            ))
        })?;
        if self.current_rev_no == Some(cmd.rev_no) {
            return Err(DomainError::conflict(format!(
                "revision {} is already current",
                cmd.rev_no
            )));
        }

        Ok(vec![self.new_revision(cmd.record_id, source.lines.clone(), cmd.created_at)])
    }
}
