//! Error types for index definition registration.

use thiserror::Error;

use index_tracking_shared::MetamodelError;

/// Errors that abort a registration pass.
///
/// A failed pass never replaces a published registry snapshot.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistrationError {
    /// A declared property path does not resolve against the metamodel.
    #[error("Metamodel error in index {index}, field {field}: {source}")]
    Metamodel {
        index: String,
        field: String,
        #[source]
        source: MetamodelError,
    },

    /// The declared metamodel itself is invalid.
    #[error("Invalid metamodel: {0}")]
    InvalidMetamodel(#[from] MetamodelError),

    /// An index definition names a root class the metamodel does not know.
    #[error("Index {index} is defined for unknown class {class}")]
    UnknownRoot { index: String, class: String },

    /// Two different declarations map the same index field with the same order.
    #[error("Conflicting declarations for field {field} of index {index}: both have order {order}")]
    ConflictingField {
        index: String,
        field: String,
        order: i32,
    },

    /// A non-standalone field without a property path.
    #[error("Field {field} of index {index} is not standalone but has no property path")]
    MissingPath { index: String, field: String },

    /// A field path rooted at a class other than the index root.
    #[error("Field {field} of index {index} is rooted at {found}, expected {expected}")]
    ForeignRoot {
        index: String,
        field: String,
        expected: String,
        found: String,
    },

    /// The definition document could not be read or parsed.
    #[error("Definition source error: {0}")]
    SourceError(String),
}

impl RegistrationError {
    /// Create a metamodel error for a given index field.
    pub fn metamodel(
        index: impl Into<String>,
        field: impl Into<String>,
        source: MetamodelError,
    ) -> Self {
        Self::Metamodel {
            index: index.into(),
            field: field.into(),
            source,
        }
    }

    /// Create a conflicting field error.
    pub fn conflicting_field(index: impl Into<String>, field: impl Into<String>, order: i32) -> Self {
        Self::ConflictingField {
            index: index.into(),
            field: field.into(),
            order,
        }
    }

    /// Create a definition source error.
    pub fn definition_source(msg: impl Into<String>) -> Self {
        Self::SourceError(msg.into())
    }
}
