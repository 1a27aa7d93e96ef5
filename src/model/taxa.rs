//! Taxa and taxa blocks.
//!
//! A [TaxaBlock] is a named set of [Taxon] entities, the shared reference
//! point linking trees and matrices that describe the same operational
//! taxonomic units. Trees and matrices reference a block through the
//! [Mediator](crate::model::mediator::Mediator), never by owning it.

use crate::error::Error;
use crate::model::context::Context;
use crate::model::entity::{AnnotationValue, Meta, Reflect};
use crate::model::listable::EntityList;
use crate::model::registry::{EntityKind, ObjectId};

// =#========================================================================#=
// TAXON
// =#========================================================================#=
/// One operational taxonomic unit.
#[derive(Debug, Clone)]
pub struct Taxon {
    meta: Meta,
}

impl Taxon {
    /// Creates an unnamed taxon, issuing its id from `ctx`.
    pub fn new(ctx: &mut Context) -> Self {
        Taxon {
            meta: Meta::new(ctx, EntityKind::Taxon),
        }
    }

    /// Creates a named taxon.
    ///
    /// # Errors
    /// [Error::InvalidName] if `name` contains structural punctuation.
    pub fn with_name(ctx: &mut Context, name: &str) -> Result<Self, Error> {
        let mut taxon = Taxon::new(ctx);
        taxon.set_name(name)?;
        Ok(taxon)
    }

    /// Returns the id of this taxon.
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

    /// Returns the description, if set.
    pub fn desc(&self) -> Option<&str> {
        self.meta.desc()
    }

    /// Sets the free-form description.
    pub fn set_desc(&mut self, desc: &str) {
        self.meta.set_desc(desc);
    }

    /// Returns the score, if set.
    pub fn score(&self) -> Option<f64> {
        self.meta.score()
    }

    /// Sets or clears the numeric score.
    pub fn set_score(&mut self, score: Option<f64>) -> Result<(), Error> {
        self.meta.set_score(score)
    }

    /// Stores a generic annotation.
    pub fn set_annotation(&mut self, key: &str, value: impl Into<AnnotationValue>) {
        self.meta.set_annotation(key, value);
    }

    /// Returns a generic annotation by key.
    pub fn annotation(&self, key: &str) -> Option<&AnnotationValue> {
        self.meta.annotation(key)
    }

    /// Copies this taxon with a fresh id.
    pub fn duplicate(&self, ctx: &mut Context) -> Taxon {
        Taxon {
            meta: self.meta.duplicate(ctx),
        }
    }
}

impl Reflect for Taxon {
    fn meta(&self) -> &Meta {
        &self.meta
    }
}

// =#========================================================================#=
// TAXA BLOCK
// =#========================================================================#=
/// An ordered, named set of taxa.
///
/// # Example
/// ```
/// use phylodata::model::context::Context;
/// use phylodata::model::taxa::{TaxaBlock, Taxon};
///
/// let mut ctx = Context::new();
/// let mut block = TaxaBlock::new(&mut ctx);
/// block.insert(Taxon::with_name(&mut ctx, "Nestor notabilis").unwrap());
/// block.insert(Taxon::with_name(&mut ctx, "Nestor meridionalis").unwrap());
///
/// assert_eq!(block.len(), 2);
/// assert!(block.taxon_by_name("Nestor notabilis").is_some());
/// ```
#[derive(Debug, Clone)]
pub struct TaxaBlock {
    meta: Meta,
    taxa: EntityList<Taxon>,
}

impl TaxaBlock {
    /// Creates an empty taxa block, issuing its id from `ctx`.
    pub fn new(ctx: &mut Context) -> Self {
        TaxaBlock {
            meta: Meta::new(ctx, EntityKind::TaxaBlock),
            taxa: EntityList::new(),
        }
    }

    /// Attaches a name to this block.
    ///
    /// # Errors
    /// [Error::InvalidName] if `name` contains structural punctuation.
    pub fn with_name(mut self, name: &str) -> Result<Self, Error> {
        self.meta.set_name(name)?;
        Ok(self)
    }

    /// Returns the id of this block.
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

    /// Appends a taxon in insertion order.
    pub fn insert(&mut self, taxon: Taxon) {
        self.taxa.insert(taxon);
    }

    /// Number of taxa.
    pub fn len(&self) -> usize {
        self.taxa.len()
    }

    /// Returns `true` if the block has no taxa.
    pub fn is_empty(&self) -> bool {
        self.taxa.is_empty()
    }

    /// The underlying ordered list of taxa.
    pub fn taxa(&self) -> &EntityList<Taxon> {
        &self.taxa
    }

    /// Iterator over the taxa in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Taxon> {
        self.taxa.iter()
    }

    /// Finds a taxon by exact name.
    pub fn taxon_by_name(&self, name: &str) -> Option<&Taxon> {
        self.taxa.iter().find(|taxon| taxon.name() == Some(name))
    }

    /// Finds a taxon by id.
    pub fn taxon_by_id(&self, id: ObjectId) -> Option<&Taxon> {
        self.taxa.by_id(id)
    }

    /// Removes the taxon with the given id and unregisters it.
    ///
    /// Returns `true` if a taxon was removed.
    pub fn remove(&mut self, ctx: &mut Context, id: ObjectId) -> bool {
        match self.taxa.take_by_id(id) {
            Some(taxon) => {
                ctx.unregister(taxon.id());
                true
            }
            None => false,
        }
    }

    /// Removes all taxa, unregistering each, then unregisters the block
    /// itself. Call when tearing the block down so the mediator holds no
    /// stale relation set for it.
    pub fn dispose(mut self, ctx: &mut Context) {
        self.taxa.clear(ctx);
        ctx.unregister(self.meta.id());
    }

    /// Deep-copies the block and its taxa with fresh ids.
    pub fn duplicate(&self, ctx: &mut Context) -> TaxaBlock {
        let mut copy = TaxaBlock {
            meta: self.meta.duplicate(ctx),
            taxa: EntityList::new(),
        };
        for taxon in self.taxa.iter() {
            copy.taxa.insert(taxon.duplicate(ctx));
        }
        copy
    }
}

impl Reflect for TaxaBlock {
    fn meta(&self) -> &Meta {
        &self.meta
    }
}
