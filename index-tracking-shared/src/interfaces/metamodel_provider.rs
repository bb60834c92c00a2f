//! Metamodel collaborator traits.

use crate::types::{ClassId, MetaClass, MetaProperty, PropertyPath, Range};

/// Read access to the entity metamodel.
///
/// Implementations must be cheap and synchronous: every call is made while
/// index definitions are registered, and the registration pass never blocks
/// on I/O.
pub trait MetamodelProvider: Send + Sync {
    /// Look up a class by id.
    fn class(&self, id: ClassId) -> Option<&MetaClass>;

    /// Look up a class by its declared name.
    fn class_by_name(&self, name: &str) -> Option<&MetaClass>;

    /// Number of classes; valid ids are `0..class_count()`.
    fn class_count(&self) -> usize;

    /// Look up a property declared on `class`.
    fn property(&self, class: ClassId, name: &str) -> Option<&MetaProperty> {
        self.class(class).and_then(|c| c.property(name))
    }

    /// Range of `class.name`, if the property exists.
    fn resolve_range(&self, class: ClassId, name: &str) -> Option<&Range> {
        self.property(class, name).map(|p| &p.range)
    }

    /// Human-readable class name, falling back to the id for unknown classes.
    fn class_name(&self, id: ClassId) -> String {
        self.class(id)
            .map(|c| c.name.clone())
            .unwrap_or_else(|| id.to_string())
    }
}

/// Decides whether a property holds an embedded value object.
///
/// Changes inside an embedded value object are reported by the entity-change
/// event source on the embedding entity, under a compound name such as
/// `address.zip`.
pub trait EmbeddingClassifier: Send + Sync {
    fn is_embedded(&self, class: ClassId, property: &str) -> bool;
}

/// Enumerates the properties a class's display name is computed from.
pub trait InstanceNameProvider: Send + Sync {
    /// Paths rooted at `class` whose values feed the instance name.
    ///
    /// The result is already flattened: when the name depends on another
    /// reference's display name, both the reference hop and the hops into the
    /// referenced class are returned. Classes without an instance name return
    /// an empty list.
    fn instance_name_related_properties(&self, class: ClassId) -> Vec<PropertyPath>;
}

/// Everything the dependency tracker asks of the entity model.
///
/// Implemented automatically for any type providing all three interfaces.
pub trait TrackingMetamodel: MetamodelProvider + EmbeddingClassifier + InstanceNameProvider {}

impl<T> TrackingMetamodel for T where
    T: MetamodelProvider + EmbeddingClassifier + InstanceNameProvider + ?Sized
{
}
