//! In-memory metamodel.
//!
//! Classes are declared by name through [`MetamodelBuilder`] (or deserialized
//! as [`ClassDeclaration`]s), then frozen into an [`InMemoryMetamodel`] arena
//! in which every class is addressed by its [`ClassId`](crate::ClassId).

mod builder;
mod in_memory;

pub use builder::{ClassBuilder, ClassDeclaration, MetamodelBuilder, PropertyDeclaration, RangeDeclaration};
pub use in_memory::InMemoryMetamodel;
