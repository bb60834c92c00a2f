//! # Index Tracking Shared
//!
//! This crate defines the data structures shared across the index dependency
//! tracker: the entity metamodel, property paths, and the index mapping
//! descriptors produced by the index-definition loader.
//!
//! It also declares the collaborator interfaces the tracker consumes
//! (metamodel lookup, embedding classification, instance naming) and ships an
//! in-memory metamodel implementing all three.

pub mod errors;
pub mod interfaces;
pub mod metamodel;
pub mod types;

pub use errors::MetamodelError;
pub use interfaces::{EmbeddingClassifier, InstanceNameProvider, MetamodelProvider, TrackingMetamodel};
pub use metamodel::{InMemoryMetamodel, MetamodelBuilder};
pub use types::mapping::{IndexDefinition, MappingFieldDescriptor, ValueExtractor};
pub use types::metamodel::{Cardinality, ClassId, MetaClass, MetaProperty, Range};
pub use types::property_path::{PathHop, PropertyPath};
