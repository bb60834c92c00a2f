//! Serializable views of registry snapshots and reindex plans.
//!
//! Class ids are replaced by class names and paths are rendered as
//! `Root.a.b`, so the output can be read without the metamodel at hand.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use index_tracking_shared::TrackingMetamodel;

use crate::facade::RegistrySnapshot;
use crate::processor::{ReindexAction, ReindexPlan};
use crate::registry::{PathsByRoot, RegistryStats};

#[derive(Debug, Clone, Serialize)]
pub struct PropertyReport {
    /// Set when the class is itself an index root reading the property.
    pub direct: bool,
    pub back_refs: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassReport {
    pub class: String,
    pub update: BTreeMap<String, PropertyReport>,
    pub delete: Vec<String>,
}

/// Every tracked class of a snapshot with its update and delete dependencies.
#[derive(Debug, Clone, Serialize)]
pub struct DependencyReport {
    pub generation: u64,
    pub built_at: DateTime<Utc>,
    pub stats: RegistryStats,
    pub classes: Vec<ClassReport>,
}

impl DependencyReport {
    pub fn from_snapshot(snapshot: &RegistrySnapshot) -> Self {
        let metamodel = snapshot.metamodel.as_ref();
        let registry = &snapshot.registry;

        let classes = registry
            .tracked_classes()
            .map(|class| ClassReport {
                class: metamodel.class_name(class),
                update: registry
                    .watched_properties(class)
                    .map(|(name, dependents)| {
                        let report = PropertyReport {
                            direct: dependents.direct,
                            back_refs: dependents
                                .back_refs
                                .iter()
                                .map(|p| p.describe(metamodel))
                                .collect(),
                        };
                        (name.to_string(), report)
                    })
                    .collect(),
                delete: flatten(metamodel, &registry.delete_paths_for(class))
                    .into_values()
                    .flatten()
                    .collect(),
            })
            .collect();

        Self {
            generation: snapshot.generation,
            built_at: snapshot.built_at,
            stats: snapshot.stats(),
            classes,
        }
    }
}

/// A reindex plan with names instead of ids.
#[derive(Debug, Clone, Serialize)]
pub struct PlanReport {
    pub source_class: String,
    pub source_entity: String,
    pub action: &'static str,
    /// Root class name to the paths leading from it to the source class.
    pub targets: BTreeMap<String, Vec<String>>,
}

impl PlanReport {
    pub fn new(metamodel: &dyn TrackingMetamodel, plan: &ReindexPlan) -> Self {
        Self {
            source_class: metamodel.class_name(plan.source_class),
            source_entity: plan.source_entity.to_string(),
            action: match plan.action {
                ReindexAction::Refresh => "refresh",
                ReindexAction::RemoveReference => "remove_reference",
            },
            targets: flatten(metamodel, &plan.targets),
        }
    }
}

fn flatten(metamodel: &dyn TrackingMetamodel, paths: &PathsByRoot) -> BTreeMap<String, Vec<String>> {
    paths
        .iter()
        .map(|(root, paths)| {
            (
                metamodel.class_name(*root),
                paths.iter().map(|p| p.describe(metamodel)).collect(),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facade::{DefinitionSet, DefinitionSource, IndexDependencyService, StaticDefinitions};
    use crate::test_fixtures::{path, shop};
    use index_tracking_shared::{IndexDefinition, MappingFieldDescriptor};
    use std::sync::Arc;

    #[test]
    fn test_report_names_classes_and_paths() {
        let mm = shop();
        let index = IndexDefinition::new("orders", mm.class_id("Order").unwrap()).with_field(
            MappingFieldDescriptor::new("sku", path(&mm, "Order", "lines.product.sku")),
        );
        let source: Arc<dyn DefinitionSource> = Arc::new(StaticDefinitions::new(DefinitionSet {
            metamodel: Arc::new(mm),
            indexes: vec![index],
        }));
        let service = IndexDependencyService::new(source).unwrap();

        let report = DependencyReport::from_snapshot(&service.snapshot());
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["generation"], 1);
        let product = report
            .classes
            .iter()
            .find(|c| c.class == "Product")
            .unwrap();
        assert_eq!(
            product.update["sku"].back_refs,
            vec!["Order.lines.product".to_string()]
        );
        assert_eq!(product.delete, vec!["Order.lines.product".to_string()]);
    }
}
