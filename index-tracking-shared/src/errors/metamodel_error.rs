//! Metamodel error types.
//!
//! Raised while building the metamodel or while resolving a declared property
//! path against it. Every variant names the offending class, property or path
//! so that a bad index definition can be located without a debugger.

use thiserror::Error;

/// Errors from metamodel construction and property path resolution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetamodelError {
    /// A class with the same name was declared twice.
    #[error("Duplicate class: {0}")]
    DuplicateClass(String),

    /// A property with the same name was declared twice on one class.
    #[error("Duplicate property {property} on class {class}")]
    DuplicateProperty { class: String, property: String },

    /// A class name or id that the metamodel does not know.
    #[error("Unknown class: {0}")]
    UnknownClass(String),

    /// A property that does not exist on the class it was looked up on.
    #[error("Unknown property {property} on class {class} (path {path})")]
    UnknownProperty {
        class: String,
        property: String,
        path: String,
    },

    /// A hop was traversed as a reference although its range is scalar or enum.
    #[error("Property {property} on class {class} is not a reference and cannot be traversed (path {path})")]
    NotAReference {
        class: String,
        property: String,
        path: String,
    },

    /// A property path with no hops.
    #[error("Empty property path rooted at {0}")]
    EmptyPath(String),

    /// A dotted path with an empty segment, such as `a..b` or `.a`.
    #[error("Empty segment in property path {path} rooted at {class}")]
    EmptySegment { class: String, path: String },

    /// A path was extended with a suffix not rooted at the class its last hop references.
    #[error("Cannot extend path {path} with {suffix}: suffix is not rooted at the referenced class")]
    DisjointPaths { path: String, suffix: String },

    /// An instance-name declaration names a property the class does not have.
    #[error("Instance name of class {class} refers to unknown property {property}")]
    UnknownInstanceNameProperty { class: String, property: String },
}

impl MetamodelError {
    /// Create an unknown class error.
    pub fn unknown_class(name: impl Into<String>) -> Self {
        Self::UnknownClass(name.into())
    }

    /// Create an unknown property error.
    pub fn unknown_property(
        class: impl Into<String>,
        property: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self::UnknownProperty {
            class: class.into(),
            property: property.into(),
            path: path.into(),
        }
    }

    /// Create a not-a-reference error.
    pub fn not_a_reference(
        class: impl Into<String>,
        property: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self::NotAReference {
            class: class.into(),
            property: property.into(),
            path: path.into(),
        }
    }
}
