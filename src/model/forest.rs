//! Forests: ordered containers of trees on the same taxa.

use crate::error::Error;
use crate::model::context::Context;
use crate::model::entity::{Meta, Reflect};
use crate::model::listable::EntityList;
use crate::model::registry::{EntityKind, ObjectId};
use crate::model::taxa::TaxaBlock;
use crate::model::tree::Tree;

// =#========================================================================#=
// FOREST
// =#========================================================================#=
/// An insertion-ordered collection of [Tree]s, typically all describing
/// the taxa of one [TaxaBlock] (e.g. a posterior sample).
#[derive(Debug, Clone)]
pub struct Forest {
    meta: Meta,
    trees: EntityList<Tree>,
}

impl Forest {
    /// Creates an empty forest, issuing its id from `ctx`.
    pub fn new(ctx: &mut Context) -> Self {
        Forest {
            meta: Meta::new(ctx, EntityKind::Forest),
            trees: EntityList::new(),
        }
    }

    /// Attaches a name to this forest.
    ///
    /// # Errors
    /// [Error::InvalidName] if `name` contains structural punctuation.
    pub fn with_name(mut self, name: &str) -> Result<Self, Error> {
        self.meta.set_name(name)?;
        Ok(self)
    }

    /// Returns the id of this forest.
    pub fn id(&self) -> ObjectId {
        self.meta.id()
    }

    /// Returns the name, if set.
    pub fn name(&self) -> Option<&str> {
        self.meta.name()
    }

    /// Appends a tree in insertion order.
    pub fn insert(&mut self, tree: Tree) {
        self.trees.insert(tree);
    }

    /// Number of trees.
    pub fn len(&self) -> usize {
        self.trees.len()
    }

    /// Returns `true` if the forest has no trees.
    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    /// The underlying ordered list of trees.
    pub fn trees(&self) -> &EntityList<Tree> {
        &self.trees
    }

    /// The underlying list of trees, mutably.
    pub fn trees_mut(&mut self) -> &mut EntityList<Tree> {
        &mut self.trees
    }

    /// Cross-references every tree in the forest against `block`.
    /// Returns the total number of nodes linked.
    pub fn cross_reference(&mut self, ctx: &mut Context, block: &TaxaBlock) -> usize {
        self.trees
            .iter_mut()
            .map(|tree| tree.cross_reference(ctx, block))
            .sum()
    }

    /// Removes the tree with the given id, unregistering it and all its
    /// nodes. Returns `true` if a tree was removed.
    pub fn remove(&mut self, ctx: &mut Context, id: ObjectId) -> bool {
        match self.trees.take_by_id(id) {
            Some(tree) => {
                tree.dispose(ctx);
                true
            }
            None => false,
        }
    }

    /// Disposes every tree in the forest (unregistering all node and tree
    /// ids), then unregisters the forest itself.
    pub fn dispose(mut self, ctx: &mut Context) {
        let ids: Vec<ObjectId> = self.trees.iter().map(Tree::id).collect();
        for id in ids {
            if let Some(tree) = self.trees.take_by_id(id) {
                tree.dispose(ctx);
            }
        }
        ctx.unregister(self.meta.id());
    }

    /// Deep-copies the forest and its trees with fresh ids.
    pub fn duplicate(&self, ctx: &mut Context) -> Forest {
        let mut copy = Forest {
            meta: self.meta.duplicate(ctx),
            trees: EntityList::new(),
        };
        for tree in self.trees.iter() {
            copy.trees.insert(tree.duplicate(ctx));
        }
        copy
    }
}

impl Reflect for Forest {
    fn meta(&self) -> &Meta {
        &self.meta
    }
}
