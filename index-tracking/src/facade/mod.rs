//! Query facade and snapshot publication.
//!
//! The registry is rebuilt off to the side and published by swapping an
//! `Arc`, so the event filter and reindexing pipeline read without locks and
//! never observe a partially built registry. Rebuilds are serialized by a
//! writer mutex; a failed rebuild leaves the previous snapshot published.

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::{error, info, instrument};

use index_tracking_shared::{ClassId, IndexDefinition, TrackingMetamodel};

use crate::errors::RegistrationError;
use crate::registrar::IndexDefinitionRegistrar;
use crate::registry::{DependencyRegistry, PathsByRoot, RegistryStats};

/// The metamodel and index definitions a registry is built from.
#[derive(Clone)]
pub struct DefinitionSet {
    pub metamodel: Arc<dyn TrackingMetamodel>,
    pub indexes: Vec<IndexDefinition>,
}

impl fmt::Debug for DefinitionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefinitionSet")
            .field("class_count", &self.metamodel.class_count())
            .field("index_count", &self.indexes.len())
            .finish()
    }
}

/// Provides the current definition set on every rebuild.
pub trait DefinitionSource: Send + Sync {
    fn load(&self) -> Result<DefinitionSet, RegistrationError>;
}

/// A definition source that always returns the same set.
pub struct StaticDefinitions {
    set: DefinitionSet,
}

impl StaticDefinitions {
    pub fn new(set: DefinitionSet) -> Self {
        Self { set }
    }
}

impl DefinitionSource for StaticDefinitions {
    fn load(&self) -> Result<DefinitionSet, RegistrationError> {
        Ok(self.set.clone())
    }
}

/// An immutable, published registry.
pub struct RegistrySnapshot {
    /// Starts at 1 and increases by one per successful rebuild.
    pub generation: u64,
    pub built_at: DateTime<Utc>,
    /// Metamodel the registry was built against.
    pub metamodel: Arc<dyn TrackingMetamodel>,
    pub registry: DependencyRegistry,
}

impl RegistrySnapshot {
    fn build(generation: u64, set: DefinitionSet) -> Result<Self, RegistrationError> {
        let registry =
            IndexDefinitionRegistrar::new(set.metamodel.as_ref()).register_all(&set.indexes)?;
        Ok(Self {
            generation,
            built_at: Utc::now(),
            metamodel: set.metamodel,
            registry,
        })
    }

    pub fn stats(&self) -> RegistryStats {
        self.registry.stats()
    }
}

impl fmt::Debug for RegistrySnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrySnapshot")
            .field("generation", &self.generation)
            .field("built_at", &self.built_at)
            .field("stats", &self.stats())
            .finish()
    }
}

/// Entry point for the indexing pipeline.
///
/// Lookups run against whichever snapshot is published when they start;
/// `rebuild` swaps in a new one atomically.
pub struct IndexDependencyService {
    source: Arc<dyn DefinitionSource>,
    current: ArcSwap<RegistrySnapshot>,
    rebuild_lock: Mutex<()>,
}

impl IndexDependencyService {
    /// Build and publish the first snapshot.
    ///
    /// # Errors
    ///
    /// Any [`RegistrationError`] from loading or registering the definitions.
    pub fn new(source: Arc<dyn DefinitionSource>) -> Result<Self, RegistrationError> {
        let snapshot = RegistrySnapshot::build(1, source.load()?)?;
        info!(
            generation = snapshot.generation,
            stats = ?snapshot.stats(),
            "Published initial dependency registry"
        );
        Ok(Self {
            source,
            current: ArcSwap::from_pointee(snapshot),
            rebuild_lock: Mutex::new(()),
        })
    }

    /// Re-run registration from the current definition set and publish it.
    ///
    /// Concurrent rebuilds are serialized. On error the previously published
    /// snapshot stays in effect and the error is returned.
    #[instrument(skip(self))]
    pub fn rebuild(&self) -> Result<Arc<RegistrySnapshot>, RegistrationError> {
        let _writer = self
            .rebuild_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let generation = self.current.load().generation + 1;
        let snapshot = match self
            .source
            .load()
            .and_then(|set| RegistrySnapshot::build(generation, set))
        {
            Ok(snapshot) => Arc::new(snapshot),
            Err(e) => {
                error!(
                    error = %e,
                    published_generation = generation - 1,
                    "Rebuild failed, keeping published dependency registry"
                );
                return Err(e);
            }
        };

        self.current.store(Arc::clone(&snapshot));
        info!(
            generation = snapshot.generation,
            stats = ?snapshot.stats(),
            "Published rebuilt dependency registry"
        );
        Ok(snapshot)
    }

    /// The currently published snapshot.
    pub fn snapshot(&self) -> Arc<RegistrySnapshot> {
        self.current.load_full()
    }

    /// Paths to refresh after `changed` properties of a `class` instance changed.
    pub fn update_paths_for<I, S>(&self, class: ClassId, changed: I) -> PathsByRoot
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.current.load().registry.update_paths_for(class, changed)
    }

    /// Paths affected by the deletion of a `class` instance.
    pub fn delete_paths_for(&self, class: ClassId) -> PathsByRoot {
        self.current.load().registry.delete_paths_for(class)
    }

    pub fn is_tracked_for_update(&self, class: ClassId) -> bool {
        self.current.load().registry.is_tracked_for_update(class)
    }

    pub fn is_property_tracked(&self, class: ClassId, property: &str) -> bool {
        self.current.load().registry.is_property_tracked(class, property)
    }

    pub fn is_tracked_for_delete(&self, class: ClassId) -> bool {
        self.current.load().registry.is_tracked_for_delete(class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{path, shop};
    use index_tracking_shared::MappingFieldDescriptor;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Serves a valid set until `broken` is raised, then a conflicting one.
    struct SwitchableSource {
        broken: AtomicBool,
    }

    impl DefinitionSource for SwitchableSource {
        fn load(&self) -> Result<DefinitionSet, RegistrationError> {
            let mm = shop();
            let order = mm.class_id("Order").unwrap();
            let mut index = IndexDefinition::new("orders", order)
                .with_field(MappingFieldDescriptor::new("number", path(&mm, "Order", "number")));
            if self.broken.load(Ordering::SeqCst) {
                index = index.with_field(MappingFieldDescriptor::new(
                    "number",
                    path(&mm, "Order", "status"),
                ));
            }
            Ok(DefinitionSet {
                metamodel: Arc::new(mm),
                indexes: vec![index],
            })
        }
    }

    #[test]
    fn test_definition_set_debug_summarizes() {
        let source = SwitchableSource {
            broken: AtomicBool::new(false),
        };
        let set = source.load().unwrap();

        assert_eq!(
            format!("{:?}", set),
            "DefinitionSet { class_count: 7, index_count: 1 }"
        );
    }

    #[test]
    fn test_rebuild_increments_generation() {
        let source = Arc::new(SwitchableSource {
            broken: AtomicBool::new(false),
        });
        let service = IndexDependencyService::new(source).unwrap();
        assert_eq!(service.snapshot().generation, 1);

        let rebuilt = service.rebuild().unwrap();
        assert_eq!(rebuilt.generation, 2);
        assert_eq!(service.snapshot().generation, 2);
    }

    #[test]
    fn test_failed_rebuild_keeps_snapshot() {
        let source = Arc::new(SwitchableSource {
            broken: AtomicBool::new(false),
        });
        let service = IndexDependencyService::new(source.clone()).unwrap();
        let before = service.snapshot();

        source.broken.store(true, Ordering::SeqCst);
        let err = service.rebuild().unwrap_err();

        assert!(matches!(err, RegistrationError::ConflictingField { .. }));
        assert!(Arc::ptr_eq(&before, &service.snapshot()));
        assert!(service.is_property_tracked(ClassId(0), "number"));
    }

    #[test]
    fn test_in_flight_reader_keeps_old_snapshot() {
        let source = Arc::new(SwitchableSource {
            broken: AtomicBool::new(false),
        });
        let service = IndexDependencyService::new(source).unwrap();

        let pinned = service.snapshot();
        service.rebuild().unwrap();

        assert_eq!(pinned.generation, 1);
        assert_eq!(pinned.registry, service.snapshot().registry);
    }
}
