//! This module defines the core data structures used across the index tracker.
//! It re-exports the metamodel, property path and mapping types.

pub mod mapping;
pub mod metamodel;
pub mod property_path;

pub use mapping::{IndexDefinition, MappingFieldDescriptor, ValueExtractor};
pub use metamodel::{Cardinality, ClassId, MetaClass, MetaProperty, Range};
pub use property_path::{PathHop, PropertyPath};
