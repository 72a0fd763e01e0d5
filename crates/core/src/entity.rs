//! Entity trait: things with identity (items, revisions, ledger rows).

/// Anything addressed by a typed id rather than by its contents.
pub trait Entity {
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug + core::fmt::Display;

    fn id(&self) -> &Self::Id;
}
