//! Rooted tree structure and its traversal and metric algorithms.
//!
//! A [Tree] owns its [Node]s in an arena (contiguous vector, tombstoned on
//! removal so indices are never reused) and is addressed by [NodeIndex].
//! Mutation operations are the guarded choke points for the structural
//! invariants: exactly one root, no cycles, consistent child chains.
//! Traversal over a malformed tree is unspecified; only mutation guards.

use crate::error::Error;
use crate::model::context::Context;
use crate::model::entity::{Accessor, Meta, Reflect};
use crate::model::listable::Comparator;
use crate::model::node::{Node, NodeIndex};
use crate::model::registry::{EntityKind, ObjectId};
use crate::model::taxa::TaxaBlock;
use rand::Rng;
use regex::Regex;
use tracing::debug;

// =#========================================================================#=
// TREE
// =#========================================================================#=
/// A rooted, potentially multifurcating phylogenetic tree.
///
/// # Structure
/// - Nodes live in an arena; removal tombstones a slot, indices are stable
/// - At most one node is designated root; in a well-formed tree its
///   reachable set covers every live node exactly once
/// - Children are ordered via first-child/next-sibling chains
///
/// # Construction
/// Create detached nodes with [Tree::add_node], designate one as root with
/// [Tree::set_root] and wire the rest with [Tree::attach_child]. Check
/// well-formedness with [Tree::is_valid].
///
/// # Example
/// ```
/// use phylodata::model::context::Context;
/// use phylodata::model::tree::Tree;
///
/// // (A:1,(B:1,C:1):1):0;
/// let mut ctx = Context::new();
/// let mut tree = Tree::new(&mut ctx);
///
/// let root = tree.add_node(&mut ctx);
/// let a = tree.add_node(&mut ctx);
/// let inner = tree.add_node(&mut ctx);
/// let b = tree.add_node(&mut ctx);
/// let c = tree.add_node(&mut ctx);
///
/// tree.set_root(root).unwrap();
/// tree.attach_child(root, a).unwrap();
/// tree.attach_child(root, inner).unwrap();
/// tree.attach_child(inner, b).unwrap();
/// tree.attach_child(inner, c).unwrap();
///
/// tree[a].set_name("A").unwrap();
/// tree[b].set_name("B").unwrap();
/// tree[c].set_name("C").unwrap();
/// for index in [a, inner, b, c] {
///     tree[index].set_branch_length(Some(1.0)).unwrap();
/// }
///
/// assert!(tree.is_valid());
/// assert_eq!(tree.num_terminals(), 3);
/// assert_eq!(tree.max_path_to_tips(root), 2.0);
/// ```
#[derive(Debug, Clone)]
pub struct Tree {
    meta: Meta,
    /// Node arena; `None` marks a removed slot
    nodes: Vec<Option<Node>>,
    root: Option<NodeIndex>,
}

// ============================================================================
// Construction and node access
// ============================================================================
impl Tree {
    /// Creates an empty tree, issuing its id from `ctx`.
    pub fn new(ctx: &mut Context) -> Self {
        Tree {
            meta: Meta::new(ctx, EntityKind::Tree),
            nodes: Vec::new(),
            root: None,
        }
    }

    /// Attaches a name to this tree.
    ///
    /// # Errors
    /// [Error::InvalidName] if `name` contains structural punctuation.
    pub fn with_name(mut self, name: &str) -> Result<Self, Error> {
        self.meta.set_name(name)?;
        Ok(self)
    }

    /// Returns the id of this tree.
    pub fn id(&self) -> ObjectId {
        self.meta.id()
    }

    /// Returns the name of this tree, if set.
    pub fn name(&self) -> Option<&str> {
        self.meta.name()
    }

    /// Sets the name of this tree.
    ///
    /// # Errors
    /// [Error::InvalidName] if `name` contains structural punctuation.
    pub fn set_name(&mut self, name: &str) -> Result<(), Error> {
        self.meta.set_name(name)
    }

    /// Adds a new detached node to the arena and returns its index.
    pub fn add_node(&mut self, ctx: &mut Context) -> NodeIndex {
        let index = self.nodes.len();
        self.nodes.push(Some(Node::new(ctx)));
        index
    }

    /// Returns a reference to the node at `index`, or `None` if the index
    /// is out of bounds or the node has been removed.
    pub fn node(&self, index: NodeIndex) -> Option<&Node> {
        self.nodes.get(index).and_then(|slot| slot.as_ref())
    }

    /// Returns a mutable reference to the node at `index`.
    pub fn node_mut(&mut self, index: NodeIndex) -> Option<&mut Node> {
        self.nodes.get_mut(index).and_then(|slot| slot.as_mut())
    }

    /// Returns the index of the root node, if one has been designated.
    pub fn root(&self) -> Option<NodeIndex> {
        self.root
    }

    /// Number of live nodes in the arena.
    pub fn num_nodes(&self) -> usize {
        self.nodes.iter().filter(|slot| slot.is_some()).count()
    }

    /// Iterator over the indices of all live nodes, in arena order.
    pub fn node_indices(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|_| index))
    }

    fn expect(&self, index: NodeIndex, what: &str) -> Result<&Node, Error> {
        self.node(index)
            .ok_or_else(|| Error::Structure(format!("{what}: no live node at index {index}")))
    }
}

impl std::ops::Index<NodeIndex> for Tree {
    type Output = Node;

    fn index(&self, index: NodeIndex) -> &Node {
        self.nodes[index].as_ref().expect("no live node at index")
    }
}

impl std::ops::IndexMut<NodeIndex> for Tree {
    fn index_mut(&mut self, index: NodeIndex) -> &mut Node {
        self.nodes[index].as_mut().expect("no live node at index")
    }
}

impl Reflect for Tree {
    fn meta(&self) -> &Meta {
        &self.meta
    }
}

// ============================================================================
// Mutation (guarded)
// ============================================================================
impl Tree {
    /// Designates `index` as the root of this tree.
    ///
    /// # Errors
    /// [Error::Structure] if another root is already designated or the node
    /// is attached to a parent.
    pub fn set_root(&mut self, index: NodeIndex) -> Result<(), Error> {
        let node = self.expect(index, "set_root")?;
        if node.parent().is_some() {
            return Err(Error::Structure(format!(
                "node {index} is attached to a parent and cannot become root"
            )));
        }
        match self.root {
            Some(root) if root != index => Err(Error::Structure(format!(
                "tree already has a root at index {root}"
            ))),
            _ => {
                self.root = Some(index);
                Ok(())
            }
        }
    }

    /// Appends `child` to the end of `parent`'s child chain.
    ///
    /// # Errors
    /// [Error::Structure] if either node is dead, `child` is already
    /// attached, `child` is the designated root, or the attachment would
    /// create a cycle (`parent` sits inside `child`'s subtree).
    pub fn attach_child(&mut self, parent: NodeIndex, child: NodeIndex) -> Result<(), Error> {
        self.expect(parent, "attach_child")?;
        let child_node = self.expect(child, "attach_child")?;
        if parent == child {
            return Err(Error::Structure(format!("cannot attach node {child} to itself")));
        }
        if child_node.parent().is_some() {
            return Err(Error::Structure(format!(
                "node {child} is already attached, detach it first"
            )));
        }
        if self.root == Some(child) {
            return Err(Error::Structure(format!(
                "node {child} is the root and cannot become a child"
            )));
        }
        // child is parentless, so a cycle can only close if parent already
        // sits inside child's subtree
        if self.in_subtree(child, parent) {
            return Err(Error::Structure(format!(
                "attaching node {child} under node {parent} would create a cycle"
            )));
        }

        match self[parent].first_child() {
            None => self[parent].set_first_child(Some(child)),
            Some(first) => {
                let mut last = first;
                while let Some(next) = self[last].next_sibling() {
                    last = next;
                }
                self[last].set_next_sibling(Some(child));
            }
        }
        self[child].set_parent(Some(parent));
        Ok(())
    }

    /// Unlinks `index` from its parent's child chain, keeping its subtree.
    ///
    /// # Errors
    /// [Error::Structure] if the node is dead or not attached.
    pub fn detach(&mut self, index: NodeIndex) -> Result<(), Error> {
        let node = self.expect(index, "detach")?;
        let parent = node
            .parent()
            .ok_or_else(|| Error::Structure(format!("node {index} is not attached to a parent")))?;

        let following = self[index].next_sibling();
        if self[parent].first_child() == Some(index) {
            self[parent].set_first_child(following);
        } else {
            let mut cursor = self[parent]
                .first_child()
                .expect("parent of attached node has children");
            while self[cursor].next_sibling() != Some(index) {
                cursor = self[cursor]
                    .next_sibling()
                    .expect("attached node missing from child chain");
            }
            self[cursor].set_next_sibling(following);
        }
        self[index].set_parent(None);
        self[index].set_next_sibling(None);
        Ok(())
    }

    /// Removes the node at `index`, splicing its children into its place in
    /// the parent's child chain (order preserved), and unregisters its id
    /// from the registry and the mediator.
    ///
    /// # Errors
    /// [Error::Structure] if the node is dead, or if it has children but no
    /// parent to reparent them to (e.g. removing a root with children).
    pub fn remove_node(&mut self, ctx: &mut Context, index: NodeIndex) -> Result<(), Error> {
        let node = self.expect(index, "remove_node")?;
        let parent = node.parent();
        let children: Vec<NodeIndex> = self.children(index).collect();

        if !children.is_empty() && parent.is_none() {
            return Err(Error::Structure(format!(
                "cannot remove node {index} with children but no parent to reparent them to"
            )));
        }

        if let Some(parent) = parent {
            let following = self[index].next_sibling();
            // the chain that takes the removed node's position
            let replacement = children.first().copied().or(following);

            if self[parent].first_child() == Some(index) {
                self[parent].set_first_child(replacement);
            } else {
                let mut cursor = self[parent]
                    .first_child()
                    .expect("parent of attached node has children");
                while self[cursor].next_sibling() != Some(index) {
                    cursor = self[cursor]
                        .next_sibling()
                        .expect("attached node missing from child chain");
                }
                self[cursor].set_next_sibling(replacement);
            }

            for &child in &children {
                self[child].set_parent(Some(parent));
            }
            if let Some(&last) = children.last() {
                self[last].set_next_sibling(following);
            }
        }

        if self.root == Some(index) {
            self.root = None;
        }

        let removed = self.nodes[index].take().expect("liveness checked above");
        ctx.unregister(removed.id());
        Ok(())
    }
}

// ============================================================================
// Queries and traversal
// ============================================================================
impl Tree {
    /// Iterator over the child indices of `index`, in chain order.
    pub fn children(&self, index: NodeIndex) -> Children<'_> {
        Children {
            tree: self,
            next: self.node(index).and_then(|n| n.first_child()),
        }
    }

    /// Ordered ancestor indices of `index`, from its parent up to the root.
    pub fn ancestors(&self, index: NodeIndex) -> Vec<NodeIndex> {
        let mut ancestors = Vec::new();
        let mut cursor = self.node(index).and_then(|n| n.parent());
        while let Some(up) = cursor {
            ancestors.push(up);
            cursor = self[up].parent();
        }
        ancestors
    }

    /// Returns `true` if `index` lies in the subtree rooted at `top`.
    fn in_subtree(&self, top: NodeIndex, index: NodeIndex) -> bool {
        top == index || self.ancestors(index).contains(&top)
    }

    /// Indices of all terminal (childless) nodes reachable from the root,
    /// in pre-order.
    pub fn terminals(&self) -> Vec<NodeIndex> {
        self.pre_order().filter(|&idx| self[idx].is_terminal()).collect()
    }

    /// Indices of all internal nodes reachable from the root, in pre-order.
    pub fn internals(&self) -> Vec<NodeIndex> {
        self.pre_order().filter(|&idx| self[idx].is_internal()).collect()
    }

    /// Number of terminal nodes reachable from the root.
    pub fn num_terminals(&self) -> usize {
        self.terminals().len()
    }

    /// Pre-order traversal (parents before children) from the root.
    pub fn pre_order(&self) -> PreOrderIter<'_> {
        PreOrderIter {
            tree: self,
            stack: self.root.into_iter().collect(),
        }
    }

    /// Post-order traversal (children before parents) from the root.
    pub fn post_order(&self) -> PostOrderIter<'_> {
        PostOrderIter {
            tree: self,
            stack: self.root.map(|root| (root, false)).into_iter().collect(),
        }
    }
}

/// Iterator over a node's children via the sibling chain.
pub struct Children<'a> {
    tree: &'a Tree,
    next: Option<NodeIndex>,
}

impl Iterator for Children<'_> {
    type Item = NodeIndex;

    fn next(&mut self) -> Option<NodeIndex> {
        let index = self.next?;
        self.next = self.tree[index].next_sibling();
        Some(index)
    }
}

/// Stack-based pre-order iterator over node indices.
pub struct PreOrderIter<'a> {
    tree: &'a Tree,
    stack: Vec<NodeIndex>,
}

impl Iterator for PreOrderIter<'_> {
    type Item = NodeIndex;

    fn next(&mut self) -> Option<NodeIndex> {
        let index = self.stack.pop()?;
        // push children in reverse so the first child is visited first
        let children: Vec<NodeIndex> = self.tree.children(index).collect();
        self.stack.extend(children.into_iter().rev());
        Some(index)
    }
}

/// Stack-based post-order iterator over node indices.
pub struct PostOrderIter<'a> {
    tree: &'a Tree,
    stack: Vec<(NodeIndex, bool)>, // (index, children_visited)
}

impl Iterator for PostOrderIter<'_> {
    type Item = NodeIndex;

    fn next(&mut self) -> Option<NodeIndex> {
        while let Some((index, children_visited)) = self.stack.pop() {
            if children_visited || self.tree[index].is_terminal() {
                return Some(index);
            }
            self.stack.push((index, true));
            let children: Vec<NodeIndex> = self.tree.children(index).collect();
            self.stack
                .extend(children.into_iter().rev().map(|c| (c, false)));
        }
        None
    }
}

// ============================================================================
// Metrics
// ============================================================================
impl Tree {
    /// Sum of branch lengths from `index` up to the root; an absent branch
    /// length counts as 0. The root's own branch length is not included.
    pub fn path_to_root(&self, index: NodeIndex) -> f64 {
        let mut length = 0.0;
        let mut cursor = index;
        while let Some(up) = self[cursor].parent() {
            length += self[cursor].branch_length().unwrap_or(0.0);
            cursor = up;
        }
        length
    }

    /// Longest branch-length path from `index` down to any of its terminal
    /// descendants. 0 for a terminal.
    pub fn max_path_to_tips(&self, index: NodeIndex) -> f64 {
        self.path_to_tips(index, f64::max)
    }

    /// Shortest branch-length path from `index` down to any of its terminal
    /// descendants. 0 for a terminal.
    pub fn min_path_to_tips(&self, index: NodeIndex) -> f64 {
        self.path_to_tips(index, f64::min)
    }

    fn path_to_tips(&self, index: NodeIndex, pick: fn(f64, f64) -> f64) -> f64 {
        let mut best: Option<f64> = None;
        for child in self.children(index) {
            let below =
                self[child].branch_length().unwrap_or(0.0) + self.path_to_tips(child, pick);
            best = Some(match best {
                Some(current) => pick(current, below),
                None => below,
            });
        }
        best.unwrap_or(0.0)
    }

    /// Largest number of edges from `index` down to any terminal descendant.
    pub fn max_nodes_to_tips(&self, index: NodeIndex) -> usize {
        self.nodes_to_tips(index, usize::max)
    }

    /// Smallest number of edges from `index` down to any terminal descendant.
    pub fn min_nodes_to_tips(&self, index: NodeIndex) -> usize {
        self.nodes_to_tips(index, usize::min)
    }

    fn nodes_to_tips(&self, index: NodeIndex, pick: fn(usize, usize) -> usize) -> usize {
        let mut best: Option<usize> = None;
        for child in self.children(index) {
            let below = 1 + self.nodes_to_tips(child, pick);
            best = Some(match best {
                Some(current) => pick(current, below),
                None => below,
            });
        }
        best.unwrap_or(0)
    }
}

// ============================================================================
// Resolution, validity, deep copy
// ============================================================================
impl Tree {
    /// Converts every polytomy (node with more than two children) into a
    /// random sequence of strictly bifurcating internal nodes. New internal
    /// branches get length 0, so path-length semantics are preserved.
    ///
    /// Deterministic for a given seeded `rng`.
    pub fn resolve<R: Rng>(&mut self, ctx: &mut Context, rng: &mut R) -> Result<(), Error> {
        let polytomies: Vec<NodeIndex> = self
            .node_indices()
            .filter(|&idx| self.children(idx).count() > 2)
            .collect();

        for index in polytomies {
            let mut group: Vec<NodeIndex> = self.children(index).collect();
            debug!(node = index, degree = group.len(), "resolving polytomy");
            while group.len() > 2 {
                let first = group.remove(rng.gen_range(0..group.len()));
                let second = group.remove(rng.gen_range(0..group.len()));
                self.detach(first)?;
                self.detach(second)?;

                let fresh = self.add_node(ctx);
                self[fresh].set_branch_length(Some(0.0))?;
                self.attach_child(fresh, first)?;
                self.attach_child(fresh, second)?;
                self.attach_child(index, fresh)?;
                group.push(fresh);
            }
        }
        Ok(())
    }

    /// Validates the tree structure.
    ///
    /// Checks:
    /// - A root is designated, has no parent, and its reachable set covers
    ///   every live node exactly once
    /// - Every child's parent link points back to the node whose chain it
    ///   sits in
    /// - Every non-root live node has a parent
    ///
    /// # Returns
    /// `true` if the tree is well-formed, `false` otherwise.
    pub fn is_valid(&self) -> bool {
        let Some(root) = self.root else {
            return false;
        };
        if self.node(root).is_none() || self[root].parent().is_some() {
            return false;
        }

        let mut seen = vec![false; self.nodes.len()];
        let mut stack = vec![root];
        while let Some(index) = stack.pop() {
            if self.node(index).is_none() {
                return false;
            }
            if seen[index] {
                // reached twice: cycle or shared child
                return false;
            }
            seen[index] = true;

            for child in self.children(index) {
                if self.node(child).is_none_or(|n| n.parent() != Some(index)) {
                    return false;
                }
                stack.push(child);
            }
        }

        // every live node must be reachable, and only the root parentless
        for index in self.node_indices() {
            if !seen[index] {
                return false;
            }
            if index != root && self[index].parent().is_none() {
                return false;
            }
        }
        true
    }

    /// Unregisters every live node and then the tree itself, purging all
    /// registry entries and mediator links. Call when tearing down a tree
    /// that is not owned by a forest, so neither table holds stale ids.
    pub fn dispose(self, ctx: &mut Context) {
        for node in self.nodes.into_iter().flatten() {
            ctx.unregister(node.id());
        }
        ctx.unregister(self.meta.id());
    }

    /// Deep-copies this tree: every live node is copied with a fresh id,
    /// tombstones and indices are preserved, taxon links are copied as ids
    /// without being followed.
    pub fn duplicate(&self, ctx: &mut Context) -> Tree {
        Tree {
            meta: self.meta.duplicate(ctx),
            nodes: self
                .nodes
                .iter()
                .map(|slot| slot.as_ref().map(|node| node.duplicate(ctx)))
                .collect(),
            root: self.root,
        }
    }
}

// ============================================================================
// Filtered queries and cross-referencing
// ============================================================================
impl Tree {
    /// Keeps the reachable nodes whose `accessor` value satisfies
    /// `comparator` against `threshold`, in pre-order.
    ///
    /// # Errors
    /// [Error::UnknownOperation] if `accessor` is not a supported read
    /// operation; [Error::BadArguments] for an unknown comparator.
    pub fn get_by_value(
        &self,
        accessor: &str,
        comparator: &str,
        threshold: f64,
    ) -> Result<Vec<NodeIndex>, Error> {
        let accessor = Accessor::parse(accessor)?;
        let comparator = Comparator::parse(comparator)?;
        Ok(self
            .pre_order()
            .filter(|&idx| {
                self[idx]
                    .fetch(&accessor)
                    .and_then(|v| v.as_number())
                    .is_some_and(|v| comparator.compare(v, threshold))
            })
            .collect())
    }

    /// Keeps the reachable nodes whose `accessor` value matches `pattern`,
    /// in pre-order.
    ///
    /// # Errors
    /// [Error::UnknownOperation] for an unsupported accessor;
    /// [Error::BadArguments] for an invalid pattern.
    pub fn get_by_regex(&self, accessor: &str, pattern: &str) -> Result<Vec<NodeIndex>, Error> {
        let accessor = Accessor::parse(accessor)?;
        let regex = Regex::new(pattern)
            .map_err(|e| Error::BadArguments(format!("invalid pattern {pattern:?}: {e}")))?;
        Ok(self
            .pre_order()
            .filter(|&idx| {
                self[idx]
                    .fetch(&accessor)
                    .is_some_and(|v| regex.is_match(&v.as_text()))
            })
            .collect())
    }

    /// Attaches taxa from `block` to the terminal nodes whose names match a
    /// taxon name, and records this tree's link to the block in the
    /// mediator. Returns the number of nodes linked.
    pub fn cross_reference(&mut self, ctx: &mut Context, block: &TaxaBlock) -> usize {
        let mut linked = 0;
        for index in self.terminals() {
            let Some(name) = self[index].name().map(str::to_string) else {
                continue;
            };
            if let Some(taxon) = block.taxon_by_name(&name) {
                let taxon_id = taxon.id();
                self[index].set_taxon(Some(taxon_id));
                linked += 1;
            }
        }
        if linked > 0 {
            ctx.mediator.set_link(block.id(), self.id(), EntityKind::Tree);
        }
        linked
    }
}

// ============================================================================
// Printing
// ============================================================================
impl Tree {
    /// Renders a visual representation of the tree.
    ///
    /// # Example Output
    /// ```text
    /// Tree with 3 terminals (5 nodes total):
    ///   [0] internal (no branch)
    ///     ├─ [1] "A" (branch: 1.000)
    ///     └─ [2] internal (branch: 1.000)
    ///         ├─ [3] "B" (branch: 1.000)
    ///         └─ [4] "C" (branch: 1.000)
    /// ```
    pub fn to_ascii(&self) -> String {
        let mut out = format!(
            "Tree with {} terminals ({} nodes total):\n",
            self.num_terminals(),
            self.num_nodes()
        );
        match self.root {
            Some(root) => self.render_node(&mut out, root, "  ", true),
            None => out.push_str("(no root set)\n"),
        }
        out
    }

    fn render_node(&self, out: &mut String, index: NodeIndex, prefix: &str, is_last: bool) {
        let node = &self[index];
        let connector = if prefix.len() <= 2 {
            ""
        } else if is_last {
            "└─ "
        } else {
            "├─ "
        };
        let label = match node.name() {
            Some(name) => format!("\"{name}\""),
            None => "internal".to_string(),
        };
        let branch = match node.branch_length() {
            Some(length) => format!("(branch: {length:.3})"),
            None => "(no branch)".to_string(),
        };
        out.push_str(&format!("{prefix}{connector}[{index}] {label} {branch}\n"));

        let children: Vec<NodeIndex> = self.children(index).collect();
        let child_prefix = if prefix.len() <= 2 {
            format!("{prefix}  ")
        } else {
            format!("{prefix}{}  ", if is_last { " " } else { "│" })
        };
        for (position, &child) in children.iter().enumerate() {
            self.render_node(out, child, &child_prefix, position + 1 == children.len());
        }
    }
}
