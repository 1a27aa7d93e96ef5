//! Phylodata is a library for modeling phylogenetic data: trees, taxa,
//! character matrices and the relationships between them, with a Newick
//! text boundary.
//!
//! Core functionality provided:
//! - Entity model: every object (taxon, taxa block, tree, node, matrix,
//!   datum, forest) carries a unique id, optional name/description/score
//!   and generic key/value annotations. See [crate::model::entity].
//! - Identity and relations: ids are issued by an [IdRegistry] and
//!   taxa-block links are recorded by a [Mediator], both owned by an
//!   explicit [Context] passed to constructors — no global state.
//!   Sideways relations (node to taxon, tree to taxa block) are plain id
//!   lookups, never ownership edges.
//! - Trees: arena-backed rooted trees in first-child/next-sibling
//!   encoding, with guarded mutation, pre/post-order traversal, path and
//!   node-count metrics, and random polytomy resolution. Multifurcating
//!   trees are supported throughout. See [crate::model::tree].
//! - Datatypes: DNA, RNA, nucleotide, protein, standard, restriction,
//!   continuous, custom and mixed (column-partitioned) validators for
//!   matrix rows. See [crate::model::datatype].
//! - Containers: insertion-ordered lists with filtered queries by value
//!   comparison or regex over named accessors. See
//!   [crate::model::listable].
//!
//! Limitations:
//! - Only rooted trees; no network/graph topologies
//! - Concrete interchange formats beyond Newick (Nexus, NeXML, tabular)
//!   are left to consumers of the read APIs
//!
//! # Usage
//!
//! Parse a Newick string and query the tree:
//! ```
//! use phylodata::model::context::Context;
//!
//! let mut ctx = Context::new();
//! let tree = phylodata::parse_newick_str(&mut ctx, "(A:1,(B:1,C:1):1):0;").unwrap();
//! assert_eq!(tree.num_terminals(), 3);
//! ```
//!
//! Build a taxa block and cross-reference it:
//! ```
//! use phylodata::model::context::Context;
//! use phylodata::model::registry::EntityKind;
//! use phylodata::model::taxa::{TaxaBlock, Taxon};
//!
//! let mut ctx = Context::new();
//! let mut block = TaxaBlock::new(&mut ctx);
//! for name in ["A", "B", "C"] {
//!     block.insert(Taxon::with_name(&mut ctx, name).unwrap());
//! }
//!
//! let mut tree = phylodata::parse_newick_str(&mut ctx, "(A:1,(B:1,C:1):1);").unwrap();
//! let linked = tree.cross_reference(&mut ctx, &block);
//! assert_eq!(linked, 3);
//! assert_eq!(ctx.mediator.block_of(tree.id()), Some(block.id()));
//! assert_eq!(ctx.mediator.links_of(block.id(), EntityKind::Tree), vec![tree.id()]);
//! ```

pub mod error;
pub mod model;
pub mod newick;

pub use crate::error::Error;

use crate::model::context::Context;
use crate::model::tree::Tree;
use crate::newick::ParseError;

// ============================================================================
// Quick Newick API
// ============================================================================
/// Parses a single Newick string into a [Tree].
///
/// See [`newick::parse_str`] for full documentation of this convenience
/// function.
pub fn parse_newick_str<S: AsRef<str>>(ctx: &mut Context, text: S) -> Result<Tree, ParseError> {
    newick::parse_str(ctx, text.as_ref())
}

/// Returns the Newick representation of `tree`, terminated with `;`.
///
/// See [`newick::write`] for full documentation of this convenience
/// function.
pub fn write_newick(tree: &Tree) -> String {
    newick::write(tree)
}
