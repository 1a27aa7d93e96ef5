//! Character matrices.
//!
//! A [Matrix] is an ordered container of [Datum] rows, all validated
//! against one shared [DataType]. Each datum may be cross-referenced to a
//! taxon of a [TaxaBlock]; the matrix-to-block relation is recorded in the
//! [Mediator](crate::model::mediator::Mediator).

use crate::error::Error;
use crate::model::context::Context;
use crate::model::datatype::DataType;
use crate::model::entity::{AnnotationValue, Meta, Reflect};
use crate::model::listable::EntityList;
use crate::model::registry::{EntityKind, ObjectId};
use crate::model::taxa::TaxaBlock;

// =#========================================================================#=
// DATUM
// =#========================================================================#=
/// One row of a character matrix: a taxon's observed character-state
/// sequence. Symbols are stored pre-split in the owning datatype's
/// per-symbol view; `start_column` places the row for mixed validation.
#[derive(Debug, Clone)]
pub struct Datum {
    meta: Meta,
    taxon: Option<ObjectId>,
    symbols: Vec<String>,
    start_column: usize,
}

impl Datum {
    /// Creates an empty datum, issuing its id from `ctx`.
    pub fn new(ctx: &mut Context) -> Self {
        Datum {
            meta: Meta::new(ctx, EntityKind::Datum),
            taxon: None,
            symbols: Vec::new(),
            start_column: 0,
        }
    }

    /// Creates a named datum from a raw character row, split and validated
    /// with `datatype`.
    ///
    /// # Errors
    /// [Error::InvalidName] for a bad name, [Error::BadArguments] if the
    /// row does not validate.
    pub fn from_row(
        ctx: &mut Context,
        datatype: &DataType,
        name: &str,
        raw: &str,
    ) -> Result<Self, Error> {
        let mut datum = Datum::new(ctx);
        datum.set_name(name)?;
        datum.set_sequence(datatype, raw)?;
        Ok(datum)
    }

    /// Returns the id of this datum.
    pub fn id(&self) -> ObjectId {
        self.meta.id()
    }

    /// Returns the name, if set.
    pub fn name(&self) -> Option<&str> {
        self.meta.name()
    }

    /// Sets the name.
    ///
    /// # Errors
    /// [Error::InvalidName] if `name` contains structural punctuation.
    pub fn set_name(&mut self, name: &str) -> Result<(), Error> {
        self.meta.set_name(name)
    }

    /// Stores a generic annotation.
    pub fn set_annotation(&mut self, key: &str, value: impl Into<AnnotationValue>) {
        self.meta.set_annotation(key, value);
    }

    /// Replaces the character sequence from a raw row, splitting and
    /// validating with `datatype` at this datum's start column.
    ///
    /// # Errors
    /// [Error::BadArguments] naming the row if validation fails.
    pub fn set_sequence(&mut self, datatype: &DataType, raw: &str) -> Result<(), Error> {
        let symbols = datatype.split(raw);
        if !datatype.is_valid_symbols_at(&symbols, self.start_column) {
            return Err(Error::BadArguments(format!(
                "row {:?} contains states invalid for datatype {}",
                self.name().unwrap_or("<unnamed>"),
                datatype.kind_descriptor()
            )));
        }
        self.symbols = symbols;
        Ok(())
    }

    /// The per-symbol view of this row.
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// The symbol at matrix column `column`, if the row covers it.
    pub fn symbol_at(&self, column: usize) -> Option<&str> {
        column
            .checked_sub(self.start_column)
            .and_then(|offset| self.symbols.get(offset))
            .map(String::as_str)
    }

    /// Number of columns this row spans.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Returns `true` if the row has no symbols.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// First matrix column of this row (0-based).
    pub fn start_column(&self) -> usize {
        self.start_column
    }

    /// Places the row at a matrix column offset (mixed-datatype metadata).
    pub fn set_start_column(&mut self, start_column: usize) {
        self.start_column = start_column;
    }

    /// Id of the taxon this row describes, if cross-referenced.
    pub fn taxon(&self) -> Option<ObjectId> {
        self.taxon
    }

    /// Links or unlinks the taxon this row describes.
    pub fn set_taxon(&mut self, taxon: Option<ObjectId>) {
        self.taxon = taxon;
    }

    /// Copies this datum with a fresh id; the taxon link is copied as an
    /// id without being followed.
    pub fn duplicate(&self, ctx: &mut Context) -> Datum {
        Datum {
            meta: self.meta.duplicate(ctx),
            taxon: self.taxon,
            symbols: self.symbols.clone(),
            start_column: self.start_column,
        }
    }
}

impl Reflect for Datum {
    fn meta(&self) -> &Meta {
        &self.meta
    }
}

// =#========================================================================#=
// MATRIX
// =#========================================================================#=
/// An ordered container of [Datum] rows sharing one [DataType].
///
/// # Example
/// ```
/// use phylodata::model::context::Context;
/// use phylodata::model::datatype::DataType;
/// use phylodata::model::matrix::{Datum, Matrix};
///
/// let mut ctx = Context::new();
/// let mut matrix = Matrix::new(&mut ctx, DataType::dna());
///
/// let row = Datum::from_row(&mut ctx, matrix.datatype(), "Kiwi", "ACGT").unwrap();
/// matrix.insert(row).unwrap();
/// assert_eq!(matrix.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct Matrix {
    meta: Meta,
    datatype: DataType,
    rows: EntityList<Datum>,
}

impl Matrix {
    /// Creates an empty matrix validating against `datatype`.
    pub fn new(ctx: &mut Context, datatype: DataType) -> Self {
        Matrix {
            meta: Meta::new(ctx, EntityKind::Matrix),
            datatype,
            rows: EntityList::new(),
        }
    }

    /// Attaches a name to this matrix.
    ///
    /// # Errors
    /// [Error::InvalidName] if `name` contains structural punctuation.
    pub fn with_name(mut self, name: &str) -> Result<Self, Error> {
        self.meta.set_name(name)?;
        Ok(self)
    }

    /// Returns the id of this matrix.
    pub fn id(&self) -> ObjectId {
        self.meta.id()
    }

    /// Returns the name, if set.
    pub fn name(&self) -> Option<&str> {
        self.meta.name()
    }

    /// The shared datatype of all rows.
    pub fn datatype(&self) -> &DataType {
        &self.datatype
    }

    /// Appends a row after validating it against the matrix datatype.
    ///
    /// # Errors
    /// [Error::BadArguments] if the row's symbols are invalid at its start
    /// column.
    pub fn insert(&mut self, datum: Datum) -> Result<(), Error> {
        if !self
            .datatype
            .is_valid_symbols_at(datum.symbols(), datum.start_column())
        {
            return Err(Error::BadArguments(format!(
                "row {:?} contains states invalid for datatype {}",
                datum.name().unwrap_or("<unnamed>"),
                self.datatype.kind_descriptor()
            )));
        }
        self.rows.insert(datum);
        Ok(())
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if the matrix has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The underlying ordered list of rows.
    pub fn rows(&self) -> &EntityList<Datum> {
        &self.rows
    }

    /// The underlying list of rows, mutably.
    pub fn rows_mut(&mut self) -> &mut EntityList<Datum> {
        &mut self.rows
    }

    /// Number of columns spanned by the widest row.
    pub fn num_columns(&self) -> usize {
        self.rows
            .iter()
            .map(|row| row.start_column() + row.len())
            .max()
            .unwrap_or(0)
    }

    /// Removes the row with the given id and unregisters it.
    ///
    /// Returns `true` if a row was removed.
    pub fn remove(&mut self, ctx: &mut Context, id: ObjectId) -> bool {
        match self.rows.take_by_id(id) {
            Some(datum) => {
                ctx.unregister(datum.id());
                true
            }
            None => false,
        }
    }

    /// Removes all rows, unregistering each, then unregisters the matrix
    /// itself. Call when tearing the matrix down so neither the registry
    /// nor the mediator holds stale ids for it.
    pub fn dispose(mut self, ctx: &mut Context) {
        self.rows.clear(ctx);
        ctx.unregister(self.meta.id());
    }

    /// Attaches taxa from `block` to the rows whose names match a taxon
    /// name, and records this matrix's link to the block in the mediator.
    /// Returns the number of rows linked.
    pub fn cross_reference(&mut self, ctx: &mut Context, block: &TaxaBlock) -> usize {
        let mut linked = 0;
        for datum in self.rows.iter_mut() {
            let Some(name) = datum.name() else {
                continue;
            };
            if let Some(taxon) = block.taxon_by_name(name) {
                let taxon_id = taxon.id();
                datum.set_taxon(Some(taxon_id));
                linked += 1;
            }
        }
        if linked > 0 {
            ctx.mediator
                .set_link(block.id(), self.id(), EntityKind::Matrix);
        }
        linked
    }

    /// Deep-copies the matrix and its rows with fresh ids; the datatype is
    /// a plain value and is cloned as-is.
    pub fn duplicate(&self, ctx: &mut Context) -> Matrix {
        let mut copy = Matrix {
            meta: self.meta.duplicate(ctx),
            datatype: self.datatype.clone(),
            rows: EntityList::new(),
        };
        for row in self.rows.iter() {
            copy.rows.insert(row.duplicate(ctx));
        }
        copy
    }
}

impl Reflect for Matrix {
    fn meta(&self) -> &Meta {
        &self.meta
    }
}
