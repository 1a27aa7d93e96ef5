//! Taxon-link mediator.
//!
//! Trees and matrices describe the same operational taxonomic units as some
//! taxa block, but must not own it (and the block must not own them), or the
//! object graph would cycle. The [Mediator] records these relations purely
//! by [ObjectId]: a one-to-many table from taxa-block id to dependent ids
//! (tagged with the dependent's [EntityKind]) and a reverse index from
//! dependent id to its single block.

use crate::model::registry::{EntityKind, ObjectId};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

// =#========================================================================#=
// MEDIATOR
// =#========================================================================#=
/// Relation table between taxa blocks and the entities referencing them.
///
/// Invariant: a dependent links to at most one taxa block at a time; setting
/// a new link silently supersedes the previous one for that dependent.
///
/// # Example
/// ```
/// use phylodata::model::mediator::Mediator;
/// use phylodata::model::registry::{EntityKind, IdRegistry};
///
/// let mut registry = IdRegistry::new();
/// let block = registry.issue(EntityKind::TaxaBlock);
/// let tree = registry.issue(EntityKind::Tree);
///
/// let mut mediator = Mediator::new();
/// mediator.set_link(block, tree, EntityKind::Tree);
///
/// assert_eq!(mediator.block_of(tree), Some(block));
/// assert_eq!(mediator.links_of(block, EntityKind::Tree), vec![tree]);
/// ```
#[derive(Debug, Default)]
pub struct Mediator {
    /// Taxa-block id -> dependent id -> dependent kind.
    /// BTreeMap keeps one-to-many queries deterministic.
    forward: HashMap<ObjectId, BTreeMap<ObjectId, EntityKind>>,
    /// Dependent id -> taxa-block id
    reverse: HashMap<ObjectId, ObjectId>,
}

impl Mediator {
    /// Creates an empty relation table.
    pub fn new() -> Self {
        Mediator::default()
    }

    /// Records that `dependent` (of `kind`) references the taxa block
    /// `block`, superseding any previous block link of `dependent`.
    pub fn set_link(&mut self, block: ObjectId, dependent: ObjectId, kind: EntityKind) {
        if let Some(previous) = self.reverse.insert(dependent, block) {
            if previous != block {
                debug!(%dependent, %previous, %block, "superseding taxa block link");
            }
            if let Some(relations) = self.forward.get_mut(&previous) {
                relations.remove(&dependent);
            }
        }
        self.forward.entry(block).or_default().insert(dependent, kind);
    }

    /// One-to-many query: ids of all dependents of `kind` linked to `block`,
    /// in ascending id order.
    pub fn links_of(&self, block: ObjectId, kind: EntityKind) -> Vec<ObjectId> {
        match self.forward.get(&block) {
            Some(relations) => relations
                .iter()
                .filter(|(_, k)| **k == kind)
                .map(|(id, _)| *id)
                .collect(),
            None => Vec::new(),
        }
    }

    /// Ids of all dependents linked to `block` regardless of kind,
    /// in ascending id order.
    pub fn all_links_of(&self, block: ObjectId) -> Vec<ObjectId> {
        match self.forward.get(&block) {
            Some(relations) => relations.keys().copied().collect(),
            None => Vec::new(),
        }
    }

    /// Reverse query: the taxa block `dependent` is linked to, if any.
    pub fn block_of(&self, dependent: ObjectId) -> Option<ObjectId> {
        self.reverse.get(&dependent).copied()
    }

    /// Removes the specific link `block` -> `dependent`.
    ///
    /// Returns `true` if the link existed.
    pub fn remove_link(&mut self, block: ObjectId, dependent: ObjectId) -> bool {
        let existed = self
            .forward
            .get_mut(&block)
            .is_some_and(|relations| relations.remove(&dependent).is_some());
        if existed {
            self.reverse.remove(&dependent);
        }
        existed
    }

    /// Removes `dependent`'s block link, whichever block it points at.
    ///
    /// Returns the block id the dependent was linked to, if any.
    pub fn remove_dependent(&mut self, dependent: ObjectId) -> Option<ObjectId> {
        let block = self.reverse.remove(&dependent)?;
        if let Some(relations) = self.forward.get_mut(&block) {
            relations.remove(&dependent);
        }
        Some(block)
    }

    /// Purges every entry involving `id`: its own relation set if it is a
    /// taxa block, and its reverse entry if it is a dependent.
    ///
    /// Called whenever an entity is removed from its owning container, so
    /// the tables never hold stale ids.
    pub fn unregister(&mut self, id: ObjectId) {
        if let Some(relations) = self.forward.remove(&id) {
            for dependent in relations.keys() {
                self.reverse.remove(dependent);
            }
        }
        self.remove_dependent(id);
    }

    /// Returns `true` if no relation is recorded.
    pub fn is_empty(&self) -> bool {
        self.reverse.is_empty() && self.forward.values().all(|r| r.is_empty())
    }
}
