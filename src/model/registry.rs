//! Identity registry for model entities.
//!
//! Every entity (taxon, taxa block, tree, node, matrix, datum, forest) is
//! issued an [ObjectId] at construction. The [IdRegistry] keeps a non-owning
//! table from id to [EntityKind]; ownership always lives with the container
//! holding the entity (arena or list), and "backward" relations are plain
//! id lookups instead of reference-counted edges.

use std::collections::HashMap;
use std::fmt;

// =#========================================================================#=
// OBJECT ID
// =#========================================================================#=
/// Unique identifier of a model entity, issued once and never reused for
/// the lifetime of the registry that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u64);

impl ObjectId {
    /// Returns the raw numeric value of this id.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// =#========================================================================#=
// ENTITY KIND
// =#========================================================================#=
/// The concrete kind of a registered entity.
///
/// Used as the value tag in the registry and in taxon-link relation sets,
/// so a serializer can ask "which *trees* reference this taxa block"
/// without resolving the objects themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Taxon,
    TaxaBlock,
    Tree,
    Node,
    Matrix,
    Datum,
    Forest,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            EntityKind::Taxon => "taxon",
            EntityKind::TaxaBlock => "taxa block",
            EntityKind::Tree => "tree",
            EntityKind::Node => "node",
            EntityKind::Matrix => "matrix",
            EntityKind::Datum => "datum",
            EntityKind::Forest => "forest",
        };
        write!(f, "{name}")
    }
}

// =#========================================================================#=
// ID REGISTRY
// =#========================================================================#=
/// Assigns unique ids and tracks which ids currently refer to live entities.
///
/// The registry does not own entities. An id, once issued, is never issued
/// again; looking up an unregistered id returns `None`, it is not an error.
///
/// # Example
/// ```
/// use phylodata::model::registry::{EntityKind, IdRegistry};
///
/// let mut registry = IdRegistry::new();
/// let id = registry.issue(EntityKind::Taxon);
/// assert_eq!(registry.lookup(id), Some(EntityKind::Taxon));
///
/// registry.unregister(id);
/// assert_eq!(registry.lookup(id), None);
/// ```
#[derive(Debug, Default)]
pub struct IdRegistry {
    /// Next id to issue; monotonically increasing
    next: u64,
    /// Live entities by id (non-owning)
    live: HashMap<ObjectId, EntityKind>,
}

impl IdRegistry {
    /// Creates an empty registry whose counter starts at zero.
    pub fn new() -> Self {
        IdRegistry {
            next: 0,
            live: HashMap::new(),
        }
    }

    /// Issues the next id and registers it as a live entity of `kind`.
    pub fn issue(&mut self, kind: EntityKind) -> ObjectId {
        let id = ObjectId(self.next);
        self.next += 1;
        self.live.insert(id, kind);
        id
    }

    /// Returns the kind of the live entity behind `id`, or `None` if the id
    /// was never issued or its entity has been unregistered.
    pub fn lookup(&self, id: ObjectId) -> Option<EntityKind> {
        self.live.get(&id).copied()
    }

    /// Returns `true` if `id` refers to a live entity.
    pub fn is_live(&self, id: ObjectId) -> bool {
        self.live.contains_key(&id)
    }

    /// Removes `id` from the live table. The id is never reissued.
    ///
    /// Unregistering an id that is not live is a no-op.
    pub fn unregister(&mut self, id: ObjectId) {
        self.live.remove(&id);
    }

    /// Number of live entities.
    pub fn len(&self) -> usize {
        self.live.len()
    }

    /// Returns `true` if no entity is currently registered.
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }
}
