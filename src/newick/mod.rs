//! Newick text boundary.
//!
//! The core guarantees format serializers a sufficient read API; this
//! module exercises that contract end to end for the Newick format:
//! [write] walks first-child/next-sibling chains emitting labels and
//! branch lengths, [parse_str] builds a [Tree](crate::model::tree::Tree)
//! from a Newick string. Multifurcations are supported in both directions.

pub mod parser;
pub mod writer;

pub use parser::{ParseError, ParseErrorKind, parse_str};
pub use writer::{escape_label, write};
