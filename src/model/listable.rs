//! Ordered container behavior shared by taxa blocks, matrices and forests.
//!
//! [EntityList] preserves insertion order and supports the filtered queries
//! `get_by_value` (numeric comparison through a named accessor) and
//! `get_by_regex` (pattern match on the textual field value). The element
//! kind is the generic parameter, so inserting the wrong kind is a compile
//! error rather than the runtime type check of dynamic implementations.

use crate::error::Error;
use crate::model::context::Context;
use crate::model::entity::{Accessor, Reflect};
use crate::model::registry::ObjectId;
use regex::Regex;

// =#========================================================================#=
// COMPARATOR
// =#========================================================================#=
/// Comparison operator for value-filtered queries, passed by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
}

impl Comparator {
    /// Parses a comparator from its name: `lt`, `le`, `gt`, `ge` or `eq`.
    ///
    /// # Errors
    /// [Error::BadArguments] for any other name.
    pub fn parse(name: &str) -> Result<Self, Error> {
        match name {
            "lt" => Ok(Comparator::Lt),
            "le" => Ok(Comparator::Le),
            "gt" => Ok(Comparator::Gt),
            "ge" => Ok(Comparator::Ge),
            "eq" => Ok(Comparator::Eq),
            other => Err(Error::BadArguments(format!("unknown comparator {other:?}"))),
        }
    }

    /// Applies the comparison `value <op> threshold`.
    pub fn compare(&self, value: f64, threshold: f64) -> bool {
        match self {
            Comparator::Lt => value < threshold,
            Comparator::Le => value <= threshold,
            Comparator::Gt => value > threshold,
            Comparator::Ge => value >= threshold,
            Comparator::Eq => value == threshold,
        }
    }
}

// =#========================================================================#=
// ENTITY LIST
// =#========================================================================#=
/// Insertion-order-preserving collection of entities of one kind.
///
/// # Example
/// ```
/// use phylodata::model::context::Context;
/// use phylodata::model::listable::EntityList;
/// use phylodata::model::taxa::Taxon;
///
/// let mut ctx = Context::new();
/// let mut list = EntityList::new();
/// for (name, score) in [("Kea", 3.0), ("Kaka", 6.0), ("Kakapo", 9.0)] {
///     let mut taxon = Taxon::new(&mut ctx);
///     taxon.set_name(name).unwrap();
///     taxon.set_score(Some(score)).unwrap();
///     list.insert(taxon);
/// }
///
/// let heavy = list.get_by_value("get_score", "gt", 5.0).unwrap();
/// assert_eq!(heavy.len(), 2);
/// assert_eq!(heavy[0].name(), Some("Kaka"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct EntityList<T> {
    items: Vec<T>,
}

impl<T: Reflect> EntityList<T> {
    /// Creates an empty list.
    pub fn new() -> Self {
        EntityList { items: Vec::new() }
    }

    /// Appends an entity, preserving insertion order.
    pub fn insert(&mut self, item: T) {
        self.items.push(item);
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the list has no elements.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the element at `index`, if present.
    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    /// Returns the element at `index` mutably, if present.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.items.get_mut(index)
    }

    /// First element, if any.
    pub fn first(&self) -> Option<&T> {
        self.items.first()
    }

    /// Last element, if any.
    pub fn last(&self) -> Option<&T> {
        self.items.last()
    }

    /// Iterator over the elements in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Iterator over the elements in insertion order, mutably.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.items.iter_mut()
    }

    /// Returns `true` if an element with the given id is present.
    pub fn contains_id(&self, id: ObjectId) -> bool {
        self.items.iter().any(|item| item.meta().id() == id)
    }

    /// Returns the element with the given id, if present.
    pub fn by_id(&self, id: ObjectId) -> Option<&T> {
        self.items.iter().find(|item| item.meta().id() == id)
    }

    /// Removes and returns the element with the given id, if present.
    /// The caller is responsible for unregistering the removed entity.
    pub fn take_by_id(&mut self, id: ObjectId) -> Option<T> {
        let position = self.items.iter().position(|item| item.meta().id() == id)?;
        Some(self.items.remove(position))
    }

    /// Removes every element, unregistering each id.
    pub fn clear(&mut self, ctx: &mut Context) {
        for item in self.items.drain(..) {
            ctx.unregister(item.meta().id());
        }
    }

    /// Keeps the elements whose `accessor` value satisfies `comparator`
    /// against `threshold`, in insertion order. Elements with no value for
    /// the field are excluded.
    ///
    /// # Errors
    /// [Error::UnknownOperation] if `accessor` is not a supported read
    /// operation; [Error::BadArguments] for an unknown comparator name.
    pub fn get_by_value(
        &self,
        accessor: &str,
        comparator: &str,
        threshold: f64,
    ) -> Result<Vec<&T>, Error> {
        let accessor = Accessor::parse(accessor)?;
        let comparator = Comparator::parse(comparator)?;
        Ok(self
            .items
            .iter()
            .filter(|item| {
                item.fetch(&accessor)
                    .and_then(|v| v.as_number())
                    .is_some_and(|v| comparator.compare(v, threshold))
            })
            .collect())
    }

    /// Keeps the elements whose `accessor` value matches `pattern`, in
    /// insertion order.
    ///
    /// # Errors
    /// [Error::UnknownOperation] for an unsupported accessor;
    /// [Error::BadArguments] if `pattern` is not a valid regex.
    pub fn get_by_regex(&self, accessor: &str, pattern: &str) -> Result<Vec<&T>, Error> {
        let accessor = Accessor::parse(accessor)?;
        let regex = Regex::new(pattern)
            .map_err(|e| Error::BadArguments(format!("invalid pattern {pattern:?}: {e}")))?;
        Ok(self
            .items
            .iter()
            .filter(|item| {
                item.fetch(&accessor)
                    .is_some_and(|v| regex.is_match(&v.as_text()))
            })
            .collect())
    }
}

impl<'a, T> IntoIterator for &'a EntityList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
