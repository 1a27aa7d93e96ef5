//! Common entity attributes.
//!
//! Every concrete kind (taxon, taxa block, tree, node, matrix, datum,
//! forest) embeds a [Meta]: id, optional name, description, numeric score
//! and a generic key/value annotation map. Filtered queries address these
//! fields through the [Accessor] enum instead of runtime reflection; see
//! [Reflect].

use crate::error::{Error, NAME_PUNCTUATION};
use crate::model::context::Context;
use crate::model::registry::{EntityKind, ObjectId};
use std::collections::HashMap;

// =#========================================================================#=
// ANNOTATION VALUE
// =#========================================================================#=
/// A generic annotation value attached to an entity
/// (e.g. drawing coordinates `x`/`y`, posterior support, colors).
#[derive(Debug, Clone, PartialEq)]
pub enum AnnotationValue {
    /// For floating point values
    Float(f64),
    /// For integer values
    Int(i64),
    /// For boolean flags
    Bool(bool),
    /// For strings
    String(String),
}

impl AnnotationValue {
    /// Returns the value as `f64` if it is numeric.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            AnnotationValue::Float(v) => Some(*v),
            AnnotationValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }
}

impl From<f64> for AnnotationValue {
    fn from(v: f64) -> Self {
        AnnotationValue::Float(v)
    }
}

impl From<i64> for AnnotationValue {
    fn from(v: i64) -> Self {
        AnnotationValue::Int(v)
    }
}

impl From<i32> for AnnotationValue {
    fn from(v: i32) -> Self {
        AnnotationValue::Int(v as i64)
    }
}

impl From<bool> for AnnotationValue {
    fn from(v: bool) -> Self {
        AnnotationValue::Bool(v)
    }
}

impl From<String> for AnnotationValue {
    fn from(v: String) -> Self {
        AnnotationValue::String(v)
    }
}

impl From<&str> for AnnotationValue {
    fn from(v: &str) -> Self {
        AnnotationValue::String(v.to_string())
    }
}

// =#========================================================================#=
// ACCESSOR / FIELD VALUE
// =#========================================================================#=
/// A named read operation on an entity, passed as data to filtered queries.
///
/// Replaces the string-based method dispatch of dynamic languages with a
/// closed set of operations resolved up front: parsing an unsupported name
/// fails with [Error::UnknownOperation] before any element is visited.
#[derive(Debug, Clone, PartialEq)]
pub enum Accessor {
    Id,
    Name,
    Desc,
    Score,
    /// A generic annotation, by key (parsed from `get_generic:<key>`)
    Annotation(String),
}

impl Accessor {
    /// Parses an accessor from its wire-format name: `get_id`, `get_name`,
    /// `get_desc`, `get_score` or `get_generic:<key>`.
    ///
    /// # Errors
    /// [Error::UnknownOperation] for any other name.
    pub fn parse(name: &str) -> Result<Self, Error> {
        match name {
            "get_id" => Ok(Accessor::Id),
            "get_name" => Ok(Accessor::Name),
            "get_desc" => Ok(Accessor::Desc),
            "get_score" => Ok(Accessor::Score),
            _ => match name.strip_prefix("get_generic:") {
                Some(key) if !key.is_empty() => Ok(Accessor::Annotation(key.to_string())),
                _ => Err(Error::UnknownOperation(name.to_string())),
            },
        }
    }
}

/// Value produced by an [Accessor], comparable numerically or textually.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// Returns the numeric view of this value, if it has one.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(v) => Some(*v),
            FieldValue::Text(_) => None,
        }
    }

    /// Returns the textual view of this value.
    pub fn as_text(&self) -> String {
        match self {
            FieldValue::Number(v) => v.to_string(),
            FieldValue::Text(s) => s.clone(),
        }
    }
}

// =#========================================================================#=
// META
// =#========================================================================#=
/// Attribute set shared by every entity.
///
/// The id is assigned once at construction via the [Context] and is
/// immutable. Name, description and score are validated on mutation and
/// raised immediately; annotations are free-form.
///
/// # Example
/// ```
/// use phylodata::model::context::Context;
/// use phylodata::model::entity::Meta;
/// use phylodata::model::registry::EntityKind;
///
/// let mut ctx = Context::new();
/// let mut meta = Meta::new(&mut ctx, EntityKind::Taxon);
///
/// meta.set_name("Strigops habroptilus").unwrap();
/// assert!(meta.set_name("bad;name").is_err());
/// assert_eq!(meta.name(), Some("Strigops habroptilus"));
/// ```
#[derive(Debug, Clone)]
pub struct Meta {
    id: ObjectId,
    kind: EntityKind,
    name: Option<String>,
    desc: Option<String>,
    score: Option<f64>,
    annotations: HashMap<String, AnnotationValue>,
}

impl Meta {
    /// Creates the attribute set for a new entity of `kind`, issuing and
    /// registering its id.
    pub fn new(ctx: &mut Context, kind: EntityKind) -> Self {
        Meta {
            id: ctx.issue(kind),
            kind,
            name: None,
            desc: None,
            score: None,
            annotations: HashMap::new(),
        }
    }

    /// Returns the id of this entity.
    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Returns the kind this entity was registered as.
    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Returns the name, if set.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Sets the name.
    ///
    /// # Errors
    /// [Error::InvalidName] if `name` contains any of `; , : ( )`.
    pub fn set_name(&mut self, name: &str) -> Result<(), Error> {
        if name.contains(NAME_PUNCTUATION) {
            return Err(Error::InvalidName(name.to_string()));
        }
        self.name = Some(name.to_string());
        Ok(())
    }

    /// Returns the description, if set.
    pub fn desc(&self) -> Option<&str> {
        self.desc.as_deref()
    }

    /// Sets the free-form description.
    pub fn set_desc(&mut self, desc: &str) {
        self.desc = Some(desc.to_string());
    }

    /// Returns the score, if set.
    pub fn score(&self) -> Option<f64> {
        self.score
    }

    /// Sets or clears the numeric score.
    ///
    /// # Errors
    /// [Error::InvalidNumber] if `score` is NaN or infinite.
    pub fn set_score(&mut self, score: Option<f64>) -> Result<(), Error> {
        if let Some(value) = score {
            if !value.is_finite() {
                return Err(Error::InvalidNumber(format!("score must be finite, got {value}")));
            }
        }
        self.score = score;
        Ok(())
    }

    /// Returns a single annotation value by key.
    pub fn annotation(&self, key: &str) -> Option<&AnnotationValue> {
        self.annotations.get(key)
    }

    /// Stores an annotation value under `key`, replacing any previous value.
    pub fn set_annotation(&mut self, key: &str, value: impl Into<AnnotationValue>) {
        self.annotations.insert(key.to_string(), value.into());
    }

    /// Returns the whole annotation map.
    pub fn annotations(&self) -> &HashMap<String, AnnotationValue> {
        &self.annotations
    }

    /// Replaces the whole annotation map.
    pub fn set_annotations(&mut self, annotations: HashMap<String, AnnotationValue>) {
        self.annotations = annotations;
    }

    /// Copies all attributes into a fresh entity of the same kind with a
    /// newly issued id. Used by the deep-copy paths of the concrete kinds.
    pub(crate) fn duplicate(&self, ctx: &mut Context) -> Meta {
        Meta {
            id: ctx.issue(self.kind),
            kind: self.kind,
            name: self.name.clone(),
            desc: self.desc.clone(),
            score: self.score,
            annotations: self.annotations.clone(),
        }
    }

    /// Resolves an [Accessor] against these attributes.
    pub fn fetch(&self, accessor: &Accessor) -> Option<FieldValue> {
        match accessor {
            Accessor::Id => Some(FieldValue::Number(self.id.raw() as f64)),
            Accessor::Name => self.name.as_ref().map(|n| FieldValue::Text(n.clone())),
            Accessor::Desc => self.desc.as_ref().map(|d| FieldValue::Text(d.clone())),
            Accessor::Score => self.score.map(FieldValue::Number),
            Accessor::Annotation(key) => self.annotations.get(key).map(|v| match v.as_number() {
                Some(n) => FieldValue::Number(n),
                None => FieldValue::Text(match v {
                    AnnotationValue::String(s) => s.clone(),
                    AnnotationValue::Bool(b) => b.to_string(),
                    _ => unreachable!("numeric values handled above"),
                }),
            }),
        }
    }
}

// =#========================================================================#=
// REFLECT
// =#========================================================================#=
/// Read access to the common attributes, used by filtered queries.
///
/// Every concrete kind implements this by returning its embedded [Meta];
/// kinds with extra queryable fields override [Reflect::fetch].
pub trait Reflect {
    /// The entity's common attribute set.
    fn meta(&self) -> &Meta;

    /// Resolves an accessor against this entity.
    ///
    /// Returns `None` when the entity simply has no value for the field,
    /// which excludes it from filter results without raising.
    fn fetch(&self, accessor: &Accessor) -> Option<FieldValue> {
        self.meta().fetch(accessor)
    }
}
