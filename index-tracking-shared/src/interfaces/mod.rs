//! Interface definitions for the collaborators of the dependency tracker.
//!
//! The tracker does not own the entity model. It only asks three questions of
//! it, each behind its own trait so that a host application can answer them
//! from whatever metadata it already keeps resident.

mod metamodel_provider;

pub use metamodel_provider::{EmbeddingClassifier, InstanceNameProvider, MetamodelProvider, TrackingMetamodel};
