//! Phylogenetic data model: entities, identity, relations, validation.

/// Shared construction context (registry + mediator)
pub mod context;
/// Character datatype validators
pub mod datatype;
/// Common entity attributes and accessors
pub mod entity;
/// Ordered containers of trees
pub mod forest;
/// Ordered container behavior and filtered queries
pub mod listable;
/// Character matrices and their rows
pub mod matrix;
/// Taxon-link relation tables
pub mod mediator;
/// Tree nodes (first-child/next-sibling encoding)
pub mod node;
/// Identity registry and entity kinds
pub mod registry;
/// Taxa and taxa blocks
pub mod taxa;
/// Rooted tree structure, traversal and metrics
pub mod tree;
