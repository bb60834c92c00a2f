//! Message types for the change processor.
//!
//! Defines the entity-change events the processor filters and the reindex
//! plans it hands to the indexing pipeline.

use uuid::Uuid;

use index_tracking_shared::ClassId;

use crate::registry::PathsByRoot;

/// What happened to an entity instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityChangeKind {
    /// Properties of the instance changed. Value-object fields are reported
    /// under compound names (`address.zip`).
    Update { changed_properties: Vec<String> },
    /// The instance was deleted.
    Delete,
}

/// An entity-change event reported by the persistence layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityChangeEvent {
    pub class: ClassId,
    pub entity_id: Uuid,
    pub kind: EntityChangeKind,
}

impl EntityChangeEvent {
    /// Create a new update event.
    pub fn update<I, S>(class: ClassId, entity_id: Uuid, changed_properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            class,
            entity_id,
            kind: EntityChangeKind::Update {
                changed_properties: changed_properties.into_iter().map(Into::into).collect(),
            },
        }
    }

    /// Create a new delete event.
    pub fn delete(class: ClassId, entity_id: Uuid) -> Self {
        Self {
            class,
            entity_id,
            kind: EntityChangeKind::Delete,
        }
    }
}

/// How the pipeline must treat the documents a plan points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReindexAction {
    /// Recompute the documents reachable from the changed instance.
    Refresh,
    /// Recompute the documents that referenced the deleted instance.
    RemoveReference,
}

/// Documents affected by one entity-change event.
///
/// Each path in `targets` leads from an index root to the class of the
/// source instance; the pipeline loads the roots whose value at that path is
/// the source instance. A root class mapped to an empty path set means the
/// source instance is itself the document to refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReindexPlan {
    pub source_class: ClassId,
    pub source_entity: Uuid,
    pub action: ReindexAction,
    pub targets: PathsByRoot,
}
