//! Error types for the phylogenetic data model.
//!
//! This module provides the single [Error] taxonomy raised by validation
//! and mutation boundaries of the model. Parsing the Newick text boundary
//! has its own error type, see [crate::newick::ParseError].

use thiserror::Error;

/// Characters rejected in entity names because they carry structure in the
/// interchange formats built on top of the model.
pub const NAME_PUNCTUATION: [char; 5] = [';', ',', ':', '(', ')'];

// =#========================================================================#=
// ERROR
// =#========================================================================#=
/// Errors raised by the data model.
///
/// Validation errors at mutation boundaries (name, score, datatype setters)
/// are raised immediately and never recovered locally. Construction-time
/// errors abort construction entirely; no partially-constructed entity is
/// registered.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Name contains structural punctuation (`; , : ( )`).
    #[error("invalid name {0:?}: may not contain any of ';,:()'")]
    InvalidName(String),

    /// A numeric field was given a non-numeric or non-finite value.
    #[error("invalid number: {0}")]
    InvalidNumber(String),

    /// Malformed argument set (empty mixed range list, colliding symbols, ...).
    #[error("bad arguments: {0}")]
    BadArguments(String),

    /// Wrong entity kind at a dynamic boundary (cross-referencing, datum rows).
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    /// A named accessor does not exist on the element kind it was applied to.
    #[error("unknown operation {0:?}")]
    UnknownOperation(String),

    /// A tree mutation would violate a structural invariant
    /// (second root, cycle, orphaned children).
    #[error("tree structure violation: {0}")]
    Structure(String),

    /// Operation requires a more specific construction path.
    #[error("not implemented: {0}")]
    Unimplemented(String),
}
