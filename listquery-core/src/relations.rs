//! Relation and aggregate-count selection.
//!
//! Requested relation names are only normalized here. Whether a relation
//! exists on the entity is decided by the persistence layer that loads it.

use indexmap::IndexSet;
use smol_str::SmolStr;
use tracing::trace;

/// Name of a relation on the listed entity (e.g. `user` or `user.profile`).
pub type RelationName = SmolStr;

/// Canonical set of relation names, in first-requested order.
pub type RelationSet = IndexSet<RelationName>;

/// Normalizes requested relation and count names into canonical sets.
#[derive(Debug, Clone, Copy, Default)]
pub struct RelationSelector;

impl RelationSelector {
    /// Create a new selector.
    pub fn new() -> Self {
        Self
    }

    /// Relations to load alongside each record.
    pub fn relations<S: AsRef<str>>(&self, names: &[S]) -> RelationSet {
        let set = canonicalize(names);
        trace!(count = set.len(), "Selected relations");
        set
    }

    /// Relations whose related-record counts are requested.
    pub fn counts<S: AsRef<str>>(&self, names: &[S]) -> RelationSet {
        let set = canonicalize(names);
        trace!(count = set.len(), "Selected relation counts");
        set
    }
}

fn canonicalize<S: AsRef<str>>(names: &[S]) -> RelationSet {
    names
        .iter()
        .map(|name| name.as_ref().trim())
        .filter(|name| !name.is_empty())
        .map(RelationName::from)
        .collect()
}
