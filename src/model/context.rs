//! Shared construction context.
//!
//! The [Context] bundles the [IdRegistry] and the [Mediator] and is passed
//! explicitly to every entity constructor and every removal. One context
//! per document keeps tests isolated without any process-wide state.

use crate::error::Error;
use crate::model::mediator::Mediator;
use crate::model::registry::{EntityKind, IdRegistry, ObjectId};

/// Identity and relation services shared by all entities of one document.
///
/// Construction goes through [Context::issue]; removal APIs call
/// [Context::unregister], which eagerly purges the id from both the
/// registry and the mediator so neither table holds stale entries.
#[derive(Debug, Default)]
pub struct Context {
    pub registry: IdRegistry,
    pub mediator: Mediator,
}

impl Context {
    /// Creates a fresh context with an empty registry and mediator.
    pub fn new() -> Self {
        Context::default()
    }

    /// Issues and registers a new id for an entity of `kind`.
    pub fn issue(&mut self, kind: EntityKind) -> ObjectId {
        self.registry.issue(kind)
    }

    /// Unregisters `id` from the registry and purges its mediator links.
    pub fn unregister(&mut self, id: ObjectId) {
        self.registry.unregister(id);
        self.mediator.unregister(id);
    }

    /// Records `dependent`'s link to the taxa block `block`, checking both
    /// ids against the registry first. The cross-referencing paths link
    /// through typed references and skip these checks; use this when
    /// holding raw ids from an earlier query.
    ///
    /// # Errors
    /// [Error::TypeMismatch] if `block` is not a live taxa block or
    /// `dependent` is not live.
    pub fn link_to_block(&mut self, block: ObjectId, dependent: ObjectId) -> Result<(), Error> {
        match self.registry.lookup(block) {
            Some(EntityKind::TaxaBlock) => {}
            Some(kind) => {
                return Err(Error::TypeMismatch(format!(
                    "cannot link to {block}: expected a taxa block, found a {kind}"
                )));
            }
            None => {
                return Err(Error::TypeMismatch(format!(
                    "cannot link to {block}: id is not live"
                )));
            }
        }
        let Some(kind) = self.registry.lookup(dependent) else {
            return Err(Error::TypeMismatch(format!(
                "cannot link {dependent}: id is not live"
            )));
        };
        self.mediator.set_link(block, dependent, kind);
        Ok(())
    }
}
