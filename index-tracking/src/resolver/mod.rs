//! Back-reference resolution.
//!
//! Turns one forward property path into the record the registry needs to
//! answer the inverse question: which class must change, under which property
//! name, and how to walk from the changed instance back toward the root.

use index_tracking_shared::{ClassId, EmbeddingClassifier, PropertyPath};

/// Delete tracking for a path whose last hop is a reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteTracking {
    /// The referenced class; deleting one of its instances affects the root.
    pub tracked_class: ClassId,
    /// The full forward path identifying the deleted reference.
    pub back_ref: PropertyPath,
}

/// Tracking record derived from a single property path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyTrackingInfo {
    /// Class whose instance-change events are relevant.
    pub tracked_class_for_update: ClassId,
    /// Name to match against the changed-property set of a change event.
    /// Compound (`embedded.value`) for value-object fields.
    pub local_property_name: String,
    /// Path from the root to the changed class, or `None` when the changed
    /// class is the root itself.
    pub back_ref_for_update: Option<PropertyPath>,
    pub delete: Option<DeleteTracking>,
}

/// Computes [`PropertyTrackingInfo`] from forward paths.
///
/// Pure: the same path always yields the same record.
pub struct BackReferenceResolver<'a, C: ?Sized> {
    classifier: &'a C,
}

impl<'a, C> BackReferenceResolver<'a, C>
where
    C: EmbeddingClassifier + ?Sized,
{
    pub fn new(classifier: &'a C) -> Self {
        Self { classifier }
    }

    /// Resolve the tracking record for `path`.
    ///
    /// When the second-to-last hop is an embedded value object, the change is
    /// reported by the event source on the embedding entity, so the path is
    /// shortened by one hop and the property name is compounded.
    pub fn resolve(&self, path: &PropertyPath) -> PropertyTrackingInfo {
        let hops = path.hops();
        let last = path.last();

        let embedding = hops
            .len()
            .checked_sub(2)
            .map(|i| &hops[i])
            .filter(|hop| self.classifier.is_embedded(hop.domain, &hop.property));

        let (effective, local_property_name) = match (embedding, path.parent()) {
            (Some(embedding), Some(parent)) => (
                parent,
                format!("{}.{}", embedding.property, last.property),
            ),
            _ => (path.clone(), last.property.clone()),
        };

        let delete = match last.range.as_class() {
            Some(target) if !self.classifier.is_embedded(last.domain, &last.property) => {
                Some(DeleteTracking {
                    tracked_class: target,
                    back_ref: path.clone(),
                })
            }
            _ => None,
        };

        PropertyTrackingInfo {
            tracked_class_for_update: effective.last().domain,
            local_property_name,
            back_ref_for_update: effective.parent(),
            delete,
        }
    }
}
