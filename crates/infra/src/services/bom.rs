//! BOM revision service.
//!
//! ## Execution Flow
//!
//! ```text
//! create / delete / restore
//!   ↓
//! 1. Load head + revisions, rehydrate `AssemblyBom`
//!   ↓
//! 2. Catalog checks (parent is an assembly; components exist and are stock-managed)
//!   ↓
//! 3. Aggregate decides (pure; produces events)
//!   ↓
//! 4. Cycle check through the current BOMs of component assemblies
//!   ↓
//! 5. Commit events with the head version as expectation
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use bomledger_bom::{
    AssemblyBom, BomCommand, BomEvent, BomLine, BomRevision, CreateRevision, CurrentBom, DeleteRevision,
    RestoreRevision, RevisionSummary, find_cycle,
};
use bomledger_catalog::Item;
use bomledger_core::{Aggregate, AggregateRoot, DomainError, ExpectedVersion, ItemId, RevisionId};

use crate::catalog_store::CatalogStore;
use crate::error::ServiceError;
use crate::revision_store::RevisionStore;

/// One revision's line set plus where it sits in the history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BomView {
    pub assembly_id: ItemId,
    pub rev_no: u32,
    pub created_at: chrono::DateTime<Utc>,
    pub is_current: bool,
    pub lines: Vec<BomLine>,
}

#[derive(Debug, Clone)]
pub struct BomService<C, R> {
    catalog: C,
    revisions: R,
}

impl<C, R> BomService<C, R> {
    pub fn new(catalog: C, revisions: R) -> Self {
        Self { catalog, revisions }
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub fn revisions(&self) -> &R {
        &self.revisions
    }
}

impl<C, R> BomService<C, R>
where
    C: CatalogStore,
    R: RevisionStore,
{
    /// Current line set; `NotFound` when the assembly has no revision.
    #[instrument(skip(self), fields(assembly_id = %assembly_id), err)]
    pub fn get_current_bom(&self, assembly_id: ItemId) -> Result<CurrentBom, ServiceError> {
        let current = self
            .revisions
            .load_current(assembly_id)?
            .ok_or_else(|| DomainError::not_found(format!("current BOM of assembly {assembly_id}")))?;
        Ok(CurrentBom::from(&current))
    }

    #[instrument(skip(self), fields(assembly_id = %assembly_id), err)]
    pub fn get_revision(&self, assembly_id: ItemId, rev_no: u32) -> Result<BomRevision, ServiceError> {
        self.revisions
            .load_revision(assembly_id, rev_no)?
            .ok_or_else(|| DomainError::not_found(format!("revision {rev_no} of assembly {assembly_id}")).into())
    }

    /// Current or historical line set, flagged with whether it is current.
    #[instrument(skip(self), fields(assembly_id = %assembly_id), err)]
    pub fn view(&self, assembly_id: ItemId, rev_no: Option<u32>) -> Result<BomView, ServiceError> {
        let head = self
            .revisions
            .load_head(assembly_id)?
            .ok_or_else(|| DomainError::not_found(format!("BOM of assembly {assembly_id}")))?;
        let revision = self.get_revision(assembly_id, rev_no.unwrap_or(head.current_rev_no))?;

        Ok(BomView {
            assembly_id,
            rev_no: revision.rev_no,
            created_at: revision.created_at,
            is_current: revision.rev_no == head.current_rev_no,
            lines: revision.lines,
        })
    }

    /// History, newest first. An assembly without revisions lists as empty;
    /// an item the catalog does not know (and that has no history) is `NotFound`.
    #[instrument(skip(self), fields(assembly_id = %assembly_id), err)]
    pub fn list_revisions(&self, assembly_id: ItemId) -> Result<Vec<RevisionSummary>, ServiceError> {
        let bom = self.load(assembly_id)?;
        if bom.revision_count() == 0 && self.catalog.get_item(assembly_id)?.is_none() {
            return Err(DomainError::not_found(format!("assembly {assembly_id}")).into());
        }
        Ok(bom.summaries())
    }

    /// The revision consumption resolves against right now.
    pub fn current_revision(&self, assembly_id: ItemId) -> Result<Option<BomRevision>, ServiceError> {
        Ok(self.revisions.load_current(assembly_id)?)
    }

    /// Create a new revision and make it current. Returns its `rev_no`.
    #[instrument(skip(self, lines), fields(assembly_id = %assembly_id, line_count = lines.len()), err)]
    pub fn create_revision(&self, assembly_id: ItemId, lines: Vec<BomLine>) -> Result<u32, ServiceError> {
        self.require_assembly(assembly_id)?;
        let bom = self.load(assembly_id)?;

        let command = BomCommand::CreateRevision(CreateRevision {
            assembly_id,
            record_id: RevisionId::new(),
            lines,
            created_at: Utc::now(),
        });
        self.commit_revision(&bom, &command)
    }

    /// Copy a historical revision into a brand new current revision.
    #[instrument(skip(self), fields(assembly_id = %assembly_id), err)]
    pub fn restore_revision(&self, assembly_id: ItemId, rev_no: u32) -> Result<u32, ServiceError> {
        self.require_assembly(assembly_id)?;
        let bom = self.load(assembly_id)?;

        let command = BomCommand::RestoreRevision(RestoreRevision {
            assembly_id,
            rev_no,
            record_id: RevisionId::new(),
            created_at: Utc::now(),
        });
        self.commit_revision(&bom, &command)
    }

    /// Delete one revision. Returns the rev_no that is current afterwards.
    #[instrument(skip(self), fields(assembly_id = %assembly_id), err)]
    pub fn delete_revision(&self, assembly_id: ItemId, rev_no: u32) -> Result<u32, ServiceError> {
        let bom = self.load(assembly_id)?;
        let events = bom.handle(&BomCommand::DeleteRevision(DeleteRevision { assembly_id, rev_no }))?;

        let head = self
            .revisions
            .commit(assembly_id, ExpectedVersion::Exact(bom.version()), &events)?;

        info!(rev_no, current_rev_no = head.current_rev_no, "bom revision deleted");
        Ok(head.current_rev_no)
    }

    fn load(&self, assembly_id: ItemId) -> Result<AssemblyBom, ServiceError> {
        let head = self.revisions.load_head(assembly_id)?;
        let revisions = self.revisions.load_revisions(assembly_id)?;
        Ok(AssemblyBom::rehydrate(assembly_id, head, revisions)?)
    }

    fn require_assembly(&self, assembly_id: ItemId) -> Result<Item, ServiceError> {
        let item = self
            .catalog
            .get_item(assembly_id)?
            .ok_or_else(|| DomainError::not_found(format!("assembly {assembly_id}")))?;
        if !item.is_assembly() {
            return Err(DomainError::validation(format!(
                "item {} ({}) is a {}, not an assembly",
                item.code,
                assembly_id,
                item.item_type().as_str()
            ))
            .into());
        }
        Ok(item)
    }

    /// Shared tail of create/restore: decide, check the new line set, commit.
    fn commit_revision(&self, bom: &AssemblyBom, command: &BomCommand) -> Result<u32, ServiceError> {
        let events = bom.handle(command)?;

        let created = events
            .iter()
            .find_map(|e| match e {
                BomEvent::RevisionCreated(c) => Some(&c.revision),
                BomEvent::RevisionDeleted(_) => None,
            })
            .ok_or_else(|| DomainError::invariant("revision command produced no revision"))?;

        self.check_components(created)?;

        let head = self
            .revisions
            .commit(bom.assembly_id(), ExpectedVersion::Exact(bom.version()), &events)?;

        info!(rev_no = head.current_rev_no, version = head.version, "bom revision created");
        Ok(head.current_rev_no)
    }

    /// Components must exist, be stock-managed, and not lead back to the parent.
    fn check_components(&self, revision: &BomRevision) -> Result<(), ServiceError> {
        for component_id in revision.component_ids() {
            let item = self
                .catalog
                .get_item(component_id)?
                .ok_or_else(|| DomainError::not_found(format!("component {component_id}")))?;
            item.ensure_stock_managed()?;
        }

        let cycle = find_cycle(revision.assembly_id, revision.component_ids(), |id| {
            self.revisions
                .load_current(id)
                .map(|current| current.map(|rev| rev.component_ids().collect()))
        })?;

        if let Some(path) = cycle {
            let path: Vec<String> = path.iter().map(ToString::to_string).collect();
            return Err(DomainError::invariant(format!("BOM cycle: {}", path.join(" -> "))).into());
        }
        Ok(())
    }
}
