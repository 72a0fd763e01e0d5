use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bomledger_core::{Entity, ItemId, Quantity, RevisionId, ValueObject};

/// One component requirement inside a revision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BomLine {
    pub component_id: ItemId,
    /// Amount of component consumed per one unit of the parent produced.
    pub qty_per_unit: Quantity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl ValueObject for BomLine {}

impl BomLine {
    pub fn new(component_id: ItemId, qty_per_unit: Quantity) -> Self {
        Self {
            component_id,
            qty_per_unit,
            note: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Immutable snapshot of an assembly's composition.
///
/// Never mutated after creation; edits always produce a new `rev_no`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BomRevision {
    pub record_id: RevisionId,
    pub assembly_id: ItemId,
    pub rev_no: u32,
    pub created_at: DateTime<Utc>,
    pub lines: Vec<BomLine>,
}

impl Entity for BomRevision {
    type Id = RevisionId;

    fn id(&self) -> &Self::Id {
        &self.record_id
    }
}

impl BomRevision {
    pub fn line_for(&self, component_id: ItemId) -> Option<&BomLine> {
        self.lines.iter().find(|l| l.component_id == component_id)
    }

    pub fn component_ids(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.lines.iter().map(|l| l.component_id)
    }
}

/// Revision metadata for history listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionSummary {
    pub rev_no: u32,
    pub created_at: DateTime<Utc>,
    pub line_count: usize,
    pub is_current: bool,
}

/// The line set an assembly is currently built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentBom {
    pub assembly_id: ItemId,
    pub rev_no: u32,
    pub created_at: DateTime<Utc>,
    pub lines: Vec<BomLine>,
}

impl From<&BomRevision> for CurrentBom {
    fn from(rev: &BomRevision) -> Self {
        Self {
            assembly_id: rev.assembly_id,
            rev_no: rev.rev_no,
            created_at: rev.created_at,
            lines: rev.lines.clone(),
        }
    }
}
