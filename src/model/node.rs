//! Node type for rooted, ordered, potentially multifurcating trees.

use crate::error::Error;
use crate::model::context::Context;
use crate::model::entity::{AnnotationValue, Meta, Reflect};
use crate::model::registry::{EntityKind, ObjectId};

/// Index of a node in a tree arena.
pub type NodeIndex = usize;

// =#========================================================================#=
// NODE
// =#========================================================================#=
/// A node of a rooted tree in first-child/next-sibling encoding.
///
/// The three links `parent`, `first_child` and `next_sibling` form the
/// canonical rooted ordered-tree encoding: a node's children are the chain
/// starting at `first_child` and following `next_sibling`. All links are
/// arena indices into the owning [Tree](crate::model::tree::Tree); the
/// parent link is a plain back-index, never an ownership edge.
///
/// A node may carry a branch length (distance to its parent, non-negative
/// when present) and a sideways link to the taxon it represents.
#[derive(Debug, Clone)]
pub struct Node {
    meta: Meta,
    parent: Option<NodeIndex>,
    first_child: Option<NodeIndex>,
    next_sibling: Option<NodeIndex>,
    branch_length: Option<f64>,
    taxon: Option<ObjectId>,
}

impl Node {
    /// Creates a detached node, issuing its id from `ctx`.
    pub(crate) fn new(ctx: &mut Context) -> Self {
        Node {
            meta: Meta::new(ctx, EntityKind::Node),
            parent: None,
            first_child: None,
            next_sibling: None,
            branch_length: None,
            taxon: None,
        }
    }

    /// Returns the id of this node.
    pub fn id(&self) -> ObjectId {
        self.meta.id()
    }

    /// Returns the name of this node, if set.
    pub fn name(&self) -> Option<&str> {
        self.meta.name()
    }

    /// Sets the name of this node.
    ///
    /// # Errors
    /// [Error::InvalidName] if `name` contains structural punctuation.
    pub fn set_name(&mut self, name: &str) -> Result<(), Error> {
        self.meta.set_name(name)
    }

    /// Stores a generic annotation on this node
    /// (e.g. layout coordinates `x`/`y` for a drawer).
    pub fn set_annotation(&mut self, key: &str, value: impl Into<AnnotationValue>) {
        self.meta.set_annotation(key, value);
    }

    /// Returns a generic annotation by key.
    pub fn annotation(&self, key: &str) -> Option<&AnnotationValue> {
        self.meta.annotation(key)
    }

    /// Sets or clears the numeric score of this node.
    pub fn set_score(&mut self, score: Option<f64>) -> Result<(), Error> {
        self.meta.set_score(score)
    }

    /// Index of the parent node, if attached.
    pub fn parent(&self) -> Option<NodeIndex> {
        self.parent
    }

    /// Index of the first child, if this node has children.
    pub fn first_child(&self) -> Option<NodeIndex> {
        self.first_child
    }

    /// Index of the next sibling in the parent's child chain.
    pub fn next_sibling(&self) -> Option<NodeIndex> {
        self.next_sibling
    }

    /// Returns `true` if this node has no children.
    pub fn is_terminal(&self) -> bool {
        self.first_child.is_none()
    }

    /// Returns `true` if this node has at least one child.
    pub fn is_internal(&self) -> bool {
        self.first_child.is_some()
    }

    /// Returns the branch length (distance to parent), if set.
    pub fn branch_length(&self) -> Option<f64> {
        self.branch_length
    }

    /// Sets or clears the branch length.
    ///
    /// # Errors
    /// [Error::InvalidNumber] if the length is negative or not finite.
    pub fn set_branch_length(&mut self, length: Option<f64>) -> Result<(), Error> {
        if let Some(value) = length {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidNumber(format!(
                    "branch length must be non-negative and finite, got {value}"
                )));
            }
        }
        self.branch_length = length;
        Ok(())
    }

    /// Id of the taxon this node represents, if cross-referenced.
    pub fn taxon(&self) -> Option<ObjectId> {
        self.taxon
    }

    /// Links or unlinks the taxon this node represents.
    pub fn set_taxon(&mut self, taxon: Option<ObjectId>) {
        self.taxon = taxon;
    }

    // Link surgery is owned by the tree, which keeps the invariants.
    pub(crate) fn set_parent(&mut self, parent: Option<NodeIndex>) {
        self.parent = parent;
    }

    pub(crate) fn set_first_child(&mut self, first_child: Option<NodeIndex>) {
        self.first_child = first_child;
    }

    pub(crate) fn set_next_sibling(&mut self, next_sibling: Option<NodeIndex>) {
        self.next_sibling = next_sibling;
    }

    /// Copies this node with a fresh id; links and the taxon id are copied
    /// verbatim (the taxon is a sideways reference, not owned structure).
    pub(crate) fn duplicate(&self, ctx: &mut Context) -> Node {
        Node {
            meta: self.meta.duplicate(ctx),
            parent: self.parent,
            first_child: self.first_child,
            next_sibling: self.next_sibling,
            branch_length: self.branch_length,
            taxon: self.taxon,
        }
    }
}

impl Reflect for Node {
    fn meta(&self) -> &Meta {
        &self.meta
    }
}
