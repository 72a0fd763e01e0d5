//! Versioned bill-of-materials domain.
//!
//! - `revision`: immutable revision snapshots and their lines
//! - `assembly`: the per-assembly aggregate deciding create/delete/restore
//! - `resolver`: expands the current revision into component requirements
//! - `cycle`: detects assemblies that would (transitively) contain themselves
//!
//! Pure domain logic only; persistence lives in `bomledger-infra`.

pub mod assembly;
pub mod cycle;
pub mod resolver;
pub mod revision;

pub use assembly::{
    AssemblyBom, BomCommand, BomEvent, BomHead, CreateRevision, DeleteRevision, RestoreRevision,
    RevisionCreated, RevisionDeleted,
};
pub use cycle::find_cycle;
pub use resolver::{Consumption, resolve};
pub use revision::{BomLine, BomRevision, CurrentBom, RevisionSummary};
