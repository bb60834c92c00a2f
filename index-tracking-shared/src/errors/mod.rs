//! Error types for the shared metamodel crate.

mod metamodel_error;

pub use metamodel_error::MetamodelError;
