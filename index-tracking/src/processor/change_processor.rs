//! Change processor implementation.
//!
//! Filters entity-change events down to the ones that affect search index
//! documents and turns them into reindex plans.

use std::sync::Arc;
use tracing::{debug, instrument, trace};

use super::messages::{EntityChangeEvent, EntityChangeKind, ReindexAction, ReindexPlan};
use crate::facade::{IndexDependencyService, RegistrySnapshot};

/// Processor that maps entity-change events onto affected index documents.
///
/// The processor is responsible for:
/// - Discarding events no index depends on, before any path computation
/// - Resolving the root-grouped back-reference paths for relevant events
///
/// It performs no document fetch or push; plans are handed to the pipeline.
pub struct ChangeProcessor {
    service: Arc<IndexDependencyService>,
}

impl ChangeProcessor {
    pub fn new(service: Arc<IndexDependencyService>) -> Self {
        Self { service }
    }

    /// Process a batch of change events.
    ///
    /// The whole batch is evaluated against a single registry snapshot, even
    /// if a rebuild is published meanwhile.
    #[instrument(skip(self, events), fields(event_count = events.len()))]
    pub fn process_batch(&self, events: &[EntityChangeEvent]) -> Vec<ReindexPlan> {
        let snapshot = self.service.snapshot();
        let plans: Vec<ReindexPlan> = events
            .iter()
            .filter_map(|event| Self::process_event(&snapshot, event))
            .collect();

        debug!(
            generation = snapshot.generation,
            plan_count = plans.len(),
            "Processed change batch"
        );
        plans
    }

    /// Process a single change event against the published snapshot.
    pub fn process(&self, event: &EntityChangeEvent) -> Option<ReindexPlan> {
        Self::process_event(&self.service.snapshot(), event)
    }

    fn process_event(snapshot: &RegistrySnapshot, event: &EntityChangeEvent) -> Option<ReindexPlan> {
        let registry = &snapshot.registry;
        let (action, targets) = match &event.kind {
            EntityChangeKind::Update { changed_properties } => {
                if !registry.is_tracked_for_update(event.class) {
                    return None;
                }
                (
                    ReindexAction::Refresh,
                    registry.update_paths_for(event.class, changed_properties),
                )
            }
            EntityChangeKind::Delete => {
                if !registry.is_tracked_for_delete(event.class) {
                    return None;
                }
                (
                    ReindexAction::RemoveReference,
                    registry.delete_paths_for(event.class),
                )
            }
        };

        if targets.is_empty() {
            trace!(entity_id = %event.entity_id, "Change does not affect any index");
            return None;
        }

        Some(ReindexPlan {
            source_class: event.class,
            source_entity: event.entity_id,
            action,
            targets,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facade::{DefinitionSet, StaticDefinitions};
    use crate::test_fixtures::{path, shop};
    use index_tracking_shared::{IndexDefinition, MappingFieldDescriptor};
    use uuid::Uuid;

    fn processor() -> (ChangeProcessor, index_tracking_shared::InMemoryMetamodel) {
        let mm = shop();
        let order = mm.class_id("Order").unwrap();
        let index = IndexDefinition::new("orders", order)
            .with_field(MappingFieldDescriptor::new("number", path(&mm, "Order", "number")))
            .with_field(MappingFieldDescriptor::new(
                "customer",
                path(&mm, "Order", "customer"),
            ));
        let source = StaticDefinitions::new(DefinitionSet {
            metamodel: Arc::new(mm.clone()),
            indexes: vec![index],
        });
        let service = IndexDependencyService::new(Arc::new(source)).unwrap();
        (ChangeProcessor::new(Arc::new(service)), mm)
    }

    #[test]
    fn test_process_root_update() {
        let (processor, mm) = processor();
        let order = mm.class_id("Order").unwrap();
        let entity_id = Uuid::new_v4();

        let plan = processor
            .process(&EntityChangeEvent::update(order, entity_id, ["number"]))
            .unwrap();

        assert_eq!(plan.action, ReindexAction::Refresh);
        assert_eq!(plan.source_entity, entity_id);
        assert!(plan.targets[&order].is_empty());
    }

    #[test]
    fn test_process_instance_name_update() {
        let (processor, mm) = processor();
        let order = mm.class_id("Order").unwrap();
        let customer = mm.class_id("Customer").unwrap();

        let plan = processor
            .process(&EntityChangeEvent::update(customer, Uuid::new_v4(), ["lastName"]))
            .unwrap();

        assert_eq!(plan.targets[&order], [path(&mm, "Order", "customer")].into());
    }

    #[test]
    fn test_process_delete() {
        let (processor, mm) = processor();
        let customer = mm.class_id("Customer").unwrap();

        let plan = processor
            .process(&EntityChangeEvent::delete(customer, Uuid::new_v4()))
            .unwrap();

        assert_eq!(plan.action, ReindexAction::RemoveReference);
    }

    #[test]
    fn test_process_batch_drops_irrelevant_events() {
        let (processor, mm) = processor();
        let order = mm.class_id("Order").unwrap();
        let customer = mm.class_id("Customer").unwrap();
        let audit = mm.class_id("Audit").unwrap();

        let events = vec![
            EntityChangeEvent::update(audit, Uuid::new_v4(), ["message"]),
            EntityChangeEvent::update(order, Uuid::new_v4(), ["status"]),
            EntityChangeEvent::delete(order, Uuid::new_v4()),
            EntityChangeEvent::update(customer, Uuid::new_v4(), ["firstName"]),
        ];

        let plans = processor.process_batch(&events);
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].source_class, customer);
    }
}
