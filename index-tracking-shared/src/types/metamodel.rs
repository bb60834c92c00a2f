//! Metamodel types.
//!
//! The tracker never works with entity instances, only with the shape of the
//! entity model: classes, their properties and the range of each property.
//! Classes are stored in an arena and addressed by a dense [`ClassId`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable, dense identifier of a [`MetaClass`].
///
/// Ids are assigned in declaration order when the metamodel is built, so they
/// can be used directly as indices into per-class tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassId(pub u32);

impl ClassId {
    /// Position of the class in the metamodel arena.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Cardinality of a reference property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    #[default]
    One,
    Many,
}

/// Range (value type) of a property.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Range {
    /// Scalar value; the string names the datatype (`string`, `int`, ...).
    Datatype(String),
    /// Enumeration value; the string names the enumeration.
    Enum(String),
    /// Reference to another class, or an embedded value object of that class.
    Class {
        target: ClassId,
        cardinality: Cardinality,
    },
}

impl Range {
    /// Whether the property points at another class.
    pub fn is_class(&self) -> bool {
        matches!(self, Range::Class { .. })
    }

    /// Target class of a reference range.
    pub fn as_class(&self) -> Option<ClassId> {
        match self {
            Range::Class { target, .. } => Some(*target),
            _ => None,
        }
    }
}

/// A property declared on a [`MetaClass`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaProperty {
    pub name: String,
    /// Class declaring the property.
    pub domain: ClassId,
    pub range: Range,
    /// Set when the property holds an embedded value object rather than a
    /// reference to an entity with its own identity.
    pub embedded: bool,
}

/// An entity type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaClass {
    pub id: ClassId,
    pub name: String,
    pub properties: Vec<MetaProperty>,
    /// Properties the display name of an instance is computed from, in order.
    pub instance_name: Vec<String>,
}

impl MetaClass {
    /// Look up a property by name.
    pub fn property(&self, name: &str) -> Option<&MetaProperty> {
        self.properties.iter().find(|p| p.name == name)
    }
}
