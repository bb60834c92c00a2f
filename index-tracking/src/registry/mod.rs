//! Dependency registry.
//!
//! The inverse index built from declared mappings: per tracked class and
//! changed property, the back-reference paths leading to the index roots that
//! must be refreshed; per tracked class, the paths affected by deletion.
//!
//! Slots are addressed by [`ClassId`], so a lookup is an array index followed
//! by at most one ordered-map probe per changed property.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use index_tracking_shared::{ClassId, PropertyPath};

/// Result of a lookup: affected paths grouped by the root class they start at.
pub type PathsByRoot = BTreeMap<ClassId, BTreeSet<PropertyPath>>;

/// Dependents of one watched property.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyDependents {
    /// The tracked class is itself an index root reading this property, so a
    /// change is attributed to the changed instance with no walk at all.
    pub direct: bool,
    /// Paths from index roots to the tracked class.
    pub back_refs: BTreeSet<PropertyPath>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct ClassDependencies {
    update: BTreeMap<String, PropertyDependents>,
    delete: BTreeSet<PropertyPath>,
}

impl ClassDependencies {
    fn is_empty(&self) -> bool {
        self.update.is_empty() && self.delete.is_empty()
    }
}

/// Counters describing a registry, logged after every build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RegistryStats {
    pub tracked_update_classes: usize,
    pub watched_properties: usize,
    pub direct_properties: usize,
    pub update_paths: usize,
    pub tracked_delete_classes: usize,
    pub delete_paths: usize,
}

/// Inverse dependency index from changed classes to index roots.
///
/// Recording is idempotent. Once built, a registry is only read; a rebuild
/// produces a new registry instead of mutating a published one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyRegistry {
    classes: Vec<ClassDependencies>,
}

impl DependencyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-size the arena for a metamodel with `class_count` classes.
    pub fn with_class_count(class_count: usize) -> Self {
        Self {
            classes: vec![ClassDependencies::default(); class_count],
        }
    }

    fn slot(&self, class: ClassId) -> Option<&ClassDependencies> {
        self.classes.get(class.index())
    }

    fn slot_mut(&mut self, class: ClassId) -> &mut ClassDependencies {
        if class.index() >= self.classes.len() {
            self.classes
                .resize_with(class.index() + 1, ClassDependencies::default);
        }
        &mut self.classes[class.index()]
    }

    /// Record that a change of `property` on `class` must propagate along
    /// `back_ref`, or to the changed instance itself when `back_ref` is `None`.
    ///
    /// Returns `true` when the registry changed.
    pub fn record_update(
        &mut self,
        class: ClassId,
        property: &str,
        back_ref: Option<PropertyPath>,
    ) -> bool {
        let dependents = self
            .slot_mut(class)
            .update
            .entry(property.to_string())
            .or_default();
        match back_ref {
            Some(path) => dependents.back_refs.insert(path),
            None => !std::mem::replace(&mut dependents.direct, true),
        }
    }

    /// Record that deleting an instance of `class` affects roots along `back_ref`.
    ///
    /// Returns `true` when the registry changed.
    pub fn record_delete(&mut self, class: ClassId, back_ref: PropertyPath) -> bool {
        self.slot_mut(class).delete.insert(back_ref)
    }

    /// Paths to refresh after `changed` properties of a `class` instance changed.
    ///
    /// Unknown classes and properties contribute nothing; an irrelevant change
    /// yields an empty map.
    pub fn update_paths_for<I, S>(&self, class: ClassId, changed: I) -> PathsByRoot
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut result = PathsByRoot::new();
        let Some(slot) = self.slot(class) else {
            return result;
        };

        for property in changed {
            let Some(dependents) = slot.update.get(property.as_ref()) else {
                continue;
            };
            if dependents.direct {
                result.entry(class).or_default();
            }
            for path in &dependents.back_refs {
                result
                    .entry(path.root_class())
                    .or_default()
                    .insert(path.clone());
            }
        }
        result
    }

    /// Paths affected by the deletion of a `class` instance.
    pub fn delete_paths_for(&self, class: ClassId) -> PathsByRoot {
        let mut result = PathsByRoot::new();
        if let Some(slot) = self.slot(class) {
            for path in &slot.delete {
                result
                    .entry(path.root_class())
                    .or_default()
                    .insert(path.clone());
            }
        }
        result
    }

    /// Whether any property change on `class` is relevant.
    pub fn is_tracked_for_update(&self, class: ClassId) -> bool {
        self.slot(class).is_some_and(|s| !s.update.is_empty())
    }

    /// Whether a change of `property` on `class` is relevant.
    pub fn is_property_tracked(&self, class: ClassId, property: &str) -> bool {
        self.slot(class)
            .is_some_and(|s| s.update.contains_key(property))
    }

    /// Whether deleting an instance of `class` is relevant.
    pub fn is_tracked_for_delete(&self, class: ClassId) -> bool {
        self.slot(class).is_some_and(|s| !s.delete.is_empty())
    }

    /// Watched properties of `class` and their dependents, in name order.
    pub fn watched_properties(
        &self,
        class: ClassId,
    ) -> impl Iterator<Item = (&str, &PropertyDependents)> + '_ {
        self.slot(class)
            .into_iter()
            .flat_map(|s| s.update.iter().map(|(name, deps)| (name.as_str(), deps)))
    }

    /// Classes with at least one update or delete entry, in id order.
    pub fn tracked_classes(&self) -> impl Iterator<Item = ClassId> + '_ {
        self.classes
            .iter()
            .enumerate()
            .filter(|(_, slot)| !slot.is_empty())
            .map(|(index, _)| ClassId(index as u32))
    }

    pub fn stats(&self) -> RegistryStats {
        let mut stats = RegistryStats::default();
        for slot in &self.classes {
            if !slot.update.is_empty() {
                stats.tracked_update_classes += 1;
            }
            if !slot.delete.is_empty() {
                stats.tracked_delete_classes += 1;
            }
            stats.watched_properties += slot.update.len();
            stats.delete_paths += slot.delete.len();
            for dependents in slot.update.values() {
                stats.update_paths += dependents.back_refs.len();
                if dependents.direct {
                    stats.direct_properties += 1;
                }
            }
        }
        stats
    }
}
