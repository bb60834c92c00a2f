//! Index definition registration.
//!
//! Walks every declared mapping field of every index definition and feeds
//! the [`DependencyRegistry`] with one watch entry per hop of each field's
//! property path. Entity-change events are reported one hop at a time, so a
//! field reading `A.b.c.d` is watched on `D` (walk back to `C`), on `C` (walk
//! back to `B`) and on `B` (walk back to the root `A`).

use std::collections::HashMap;
use tracing::{debug, info, instrument, trace};

use index_tracking_shared::{
    IndexDefinition, MappingFieldDescriptor, MetamodelError, PropertyPath, TrackingMetamodel,
};

use crate::errors::RegistrationError;
use crate::expansion::InstanceNameExpansion;
use crate::registry::DependencyRegistry;
use crate::resolver::{BackReferenceResolver, PropertyTrackingInfo};

/// Builds a [`DependencyRegistry`] from index definitions.
///
/// Registration is single-threaded and deterministic: the same definitions
/// against the same metamodel always produce equal registries.
pub struct IndexDefinitionRegistrar<'a, M: ?Sized> {
    metamodel: &'a M,
}

impl<'a, M> IndexDefinitionRegistrar<'a, M>
where
    M: TrackingMetamodel + ?Sized,
{
    pub fn new(metamodel: &'a M) -> Self {
        Self { metamodel }
    }

    /// Register every field of every definition into a fresh registry.
    ///
    /// # Errors
    ///
    /// * [`RegistrationError::ConflictingField`] - two different declarations
    ///   of one field share the same order
    /// * [`RegistrationError::MissingPath`] / [`RegistrationError::ForeignRoot`] -
    ///   malformed field declarations
    /// * [`RegistrationError::Metamodel`] - an instance-name list that does not
    ///   fit the reference it expands
    #[instrument(skip(self, definitions), fields(index_count = definitions.len()))]
    pub fn register_all(
        &self,
        definitions: &[IndexDefinition],
    ) -> Result<DependencyRegistry, RegistrationError> {
        let mut registry = DependencyRegistry::with_class_count(self.metamodel.class_count());

        for definition in definitions {
            let fields = effective_fields(definition)?;
            debug!(
                index = %definition.name,
                root = %self.metamodel.class_name(definition.root),
                declared = definition.fields.len(),
                effective = fields.len(),
                "Registering index definition"
            );
            for field in fields {
                self.register_field(&mut registry, definition, field)?;
            }
        }

        let stats = registry.stats();
        info!(
            tracked_update_classes = stats.tracked_update_classes,
            watched_properties = stats.watched_properties,
            update_paths = stats.update_paths,
            tracked_delete_classes = stats.tracked_delete_classes,
            delete_paths = stats.delete_paths,
            "Index definitions registered"
        );
        Ok(registry)
    }

    fn register_field(
        &self,
        registry: &mut DependencyRegistry,
        definition: &IndexDefinition,
        field: &MappingFieldDescriptor,
    ) -> Result<(), RegistrationError> {
        if field.standalone {
            trace!(index = %definition.name, field = %field.field_name, "Skipping standalone field");
            return Ok(());
        }
        let path = field
            .tracked_path()
            .ok_or_else(|| RegistrationError::MissingPath {
                index: definition.name.clone(),
                field: field.field_name.clone(),
            })?;
        if path.root_class() != definition.root {
            return Err(RegistrationError::ForeignRoot {
                index: definition.name.clone(),
                field: field.field_name.clone(),
                expected: self.metamodel.class_name(definition.root),
                found: self.metamodel.class_name(path.root_class()),
            });
        }

        for path in self.effective_paths(field, path).map_err(|e| {
            RegistrationError::metamodel(&definition.name, &field.field_name, e)
        })? {
            for info in self.tracking_chain(&path) {
                trace!(
                    field = %field.field_name,
                    class = %self.metamodel.class_name(info.tracked_class_for_update),
                    property = %info.local_property_name,
                    "Watching property"
                );
                registry.record_update(
                    info.tracked_class_for_update,
                    &info.local_property_name,
                    info.back_ref_for_update,
                );
                if let Some(delete) = info.delete {
                    registry.record_delete(delete.tracked_class, delete.back_ref);
                }
            }
        }
        Ok(())
    }

    /// The declared path, widened by instance-name expansion when it ends in a
    /// reference.
    fn effective_paths(
        &self,
        field: &MappingFieldDescriptor,
        path: &PropertyPath,
    ) -> Result<Vec<PropertyPath>, MetamodelError> {
        let mut paths = vec![path.clone()];

        let last = path.last();
        if last.range.is_class() && !self.metamodel.is_embedded(last.domain, &last.property) {
            let expansion = InstanceNameExpansion::new(self.metamodel);
            let expanded = match &field.instance_name_properties {
                Some(related) => expansion.expand_with(path, related)?,
                None => expansion.expand(path)?,
            };
            paths.extend(expanded);
        }
        Ok(paths)
    }

    /// Tracking records for `path` and every back-reference path it implies,
    /// outermost first.
    ///
    /// Each record's `back_ref_for_update` is strictly shorter than the path it
    /// was resolved from, so the walk ends after at most `path.len()` steps.
    pub fn tracking_chain(&self, path: &PropertyPath) -> Vec<PropertyTrackingInfo> {
        let resolver = BackReferenceResolver::new(self.metamodel);
        let mut chain = Vec::with_capacity(path.len());

        let mut pending = Some(path.clone());
        while let Some(current) = pending.take() {
            let info = resolver.resolve(&current);
            debug_assert!(info
                .back_ref_for_update
                .as_ref()
                .map_or(true, |next| next.len() < current.len()));
            pending = info.back_ref_for_update.clone();
            chain.push(info);
        }
        chain
    }
}

/// Fields of `definition` after order-based conflict resolution, in order of
/// first declaration of each field name.
///
/// Per field name, the declarations with the highest order win. They must all
/// be identical; lower-order declarations are discarded whatever they hold.
/// The outcome does not depend on the order the declarations are listed in.
fn effective_fields(
    definition: &IndexDefinition,
) -> Result<Vec<&MappingFieldDescriptor>, RegistrationError> {
    let mut winners: Vec<&MappingFieldDescriptor> = Vec::with_capacity(definition.fields.len());
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for field in &definition.fields {
        match positions.get(field.field_name.as_str()) {
            None => {
                positions.insert(field.field_name.as_str(), winners.len());
                winners.push(field);
            }
            Some(&position) if field.order > winners[position].order => {
                winners[position] = field;
            }
            Some(_) => {}
        }
    }

    for winner in &winners {
        let rival = definition.fields.iter().find(|field| {
            field.field_name == winner.field_name && field.order == winner.order && field != winner
        });
        if rival.is_some() {
            return Err(RegistrationError::conflicting_field(
                &definition.name,
                &winner.field_name,
                winner.order,
            ));
        }

        let overridden = definition
            .fields
            .iter()
            .filter(|field| field.field_name == winner.field_name && field.order < winner.order)
            .count();
        if overridden > 0 {
            debug!(
                index = %definition.name,
                field = %winner.field_name,
                order = winner.order,
                overridden,
                "Field declarations overridden by higher order"
            );
        }
    }
    Ok(winners)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{path, shop};
    use index_tracking_shared::MetamodelProvider;

    fn order_index(fields: Vec<MappingFieldDescriptor>) -> (IndexDefinition, DependencyRegistry) {
        let mm = shop();
        let mut definition = IndexDefinition::new("orders", mm.class_id("Order").unwrap());
        definition.fields = fields;
        let registry = IndexDefinitionRegistrar::new(&mm)
            .register_all(std::slice::from_ref(&definition))
            .unwrap();
        (definition, registry)
    }

    #[test]
    fn test_tracking_chain_walks_to_root() {
        let mm = shop();
        let registrar = IndexDefinitionRegistrar::new(&mm);

        let chain = registrar.tracking_chain(&path(&mm, "Order", "lines.product.sku"));

        let watched: Vec<_> = chain
            .iter()
            .map(|info| {
                (
                    mm.class_name(info.tracked_class_for_update),
                    info.local_property_name.clone(),
                    info.back_ref_for_update.as_ref().map(|p| p.dotted()),
                )
            })
            .collect();
        assert_eq!(
            watched,
            vec![
                ("Product".to_string(), "sku".to_string(), Some("lines.product".to_string())),
                ("OrderLine".to_string(), "product".to_string(), Some("lines".to_string())),
                ("Order".to_string(), "lines".to_string(), None),
            ]
        );
    }

    #[test]
    fn test_tracking_chain_lengths_strictly_decrease() {
        let mm = shop();
        let registrar = IndexDefinitionRegistrar::new(&mm);

        let chain = registrar.tracking_chain(&path(&mm, "Order", "customer.address.zip"));

        let lengths: Vec<_> = chain
            .iter()
            .filter_map(|info| info.back_ref_for_update.as_ref().map(|p| p.len()))
            .collect();
        assert!(lengths.windows(2).all(|w| w[0] > w[1]));
        assert_eq!(chain.len(), 2);
    }

    #[test]
    fn test_register_intermediate_reference_tracks_delete() {
        let mm = shop();
        let (_, registry) = order_index(vec![MappingFieldDescriptor::new(
            "product_sku",
            path(&mm, "Order", "lines.product.sku"),
        )]);

        let order = mm.class_id("Order").unwrap();
        let line = mm.class_id("OrderLine").unwrap();
        let product = mm.class_id("Product").unwrap();

        assert_eq!(
            registry.delete_paths_for(product)[&order],
            [path(&mm, "Order", "lines.product")].into()
        );
        assert_eq!(
            registry.delete_paths_for(line)[&order],
            [path(&mm, "Order", "lines")].into()
        );
    }

    #[test]
    fn test_standalone_fields_are_not_tracked() {
        let (_, registry) = order_index(vec![MappingFieldDescriptor::standalone("score")]);

        assert_eq!(registry.stats(), crate::registry::RegistryStats::default());
    }

    #[test]
    fn test_higher_order_wins() {
        let mm = shop();
        let (_, registry) = order_index(vec![
            MappingFieldDescriptor::new("label", path(&mm, "Order", "number")).with_order(1),
            MappingFieldDescriptor::new("label", path(&mm, "Order", "status")).with_order(5),
        ]);

        let order = mm.class_id("Order").unwrap();
        assert!(registry.is_property_tracked(order, "status"));
        assert!(!registry.is_property_tracked(order, "number"));
    }

    #[test]
    fn test_equal_order_conflict_is_rejected() {
        let mm = shop();
        let mut definition = IndexDefinition::new("orders", mm.class_id("Order").unwrap());
        definition.fields = vec![
            MappingFieldDescriptor::new("label", path(&mm, "Order", "number")),
            MappingFieldDescriptor::new("label", path(&mm, "Order", "status")),
        ];

        let err = IndexDefinitionRegistrar::new(&mm)
            .register_all(&[definition])
            .unwrap_err();

        assert_eq!(err, RegistrationError::conflicting_field("orders", "label", 0));
    }

    #[test]
    fn test_conflict_outcome_ignores_declaration_order() {
        let mm = shop();
        let a = MappingFieldDescriptor::new("label", path(&mm, "Order", "number")).with_order(1);
        let b = MappingFieldDescriptor::new("label", path(&mm, "Order", "status")).with_order(1);
        let c = MappingFieldDescriptor::new("label", path(&mm, "Order", "customer")).with_order(5);
        let order = mm.class_id("Order").unwrap();

        for fields in [
            vec![a.clone(), b.clone(), c.clone()],
            vec![c.clone(), a.clone(), b.clone()],
            vec![a.clone(), c.clone(), b.clone()],
        ] {
            let mut definition = IndexDefinition::new("orders", order);
            definition.fields = fields;

            let registry = IndexDefinitionRegistrar::new(&mm)
                .register_all(&[definition])
                .unwrap();

            assert!(registry.is_property_tracked(order, "customer"));
            assert!(!registry.is_property_tracked(order, "number"));
            assert!(!registry.is_property_tracked(order, "status"));
        }
    }

    #[test]
    fn test_conflict_between_winners_ignores_declaration_order() {
        let mm = shop();
        let low = MappingFieldDescriptor::new("label", path(&mm, "Order", "customer")).with_order(1);
        let a = MappingFieldDescriptor::new("label", path(&mm, "Order", "number")).with_order(5);
        let b = MappingFieldDescriptor::new("label", path(&mm, "Order", "status")).with_order(5);

        for fields in [
            vec![low.clone(), a.clone(), b.clone()],
            vec![b.clone(), a.clone(), low.clone()],
        ] {
            let mut definition = IndexDefinition::new("orders", mm.class_id("Order").unwrap());
            definition.fields = fields;

            let err = IndexDefinitionRegistrar::new(&mm)
                .register_all(&[definition])
                .unwrap_err();

            assert_eq!(err, RegistrationError::conflicting_field("orders", "label", 5));
        }
    }

    #[test]
    fn test_identical_duplicates_collapse() {
        let mm = shop();
        let field = MappingFieldDescriptor::new("label", path(&mm, "Order", "number"));
        let (_, registry) = order_index(vec![field.clone(), field]);

        assert_eq!(registry.stats().watched_properties, 1);
    }

    #[test]
    fn test_foreign_root_is_rejected() {
        let mm = shop();
        let mut definition = IndexDefinition::new("orders", mm.class_id("Order").unwrap());
        definition.fields = vec![MappingFieldDescriptor::new(
            "login",
            path(&mm, "Account", "login"),
        )];

        let err = IndexDefinitionRegistrar::new(&mm)
            .register_all(&[definition])
            .unwrap_err();

        assert!(matches!(err, RegistrationError::ForeignRoot { .. }));
    }

    #[test]
    fn test_missing_path_is_rejected() {
        let mm = shop();
        let mut field = MappingFieldDescriptor::standalone("broken");
        field.standalone = false;
        let mut definition = IndexDefinition::new("orders", mm.class_id("Order").unwrap());
        definition.fields = vec![field];

        let err = IndexDefinitionRegistrar::new(&mm)
            .register_all(&[definition])
            .unwrap_err();

        assert!(matches!(err, RegistrationError::MissingPath { .. }));
    }

    #[test]
    fn test_precomputed_instance_names_replace_provider() {
        let mm = shop();
        let (_, registry) = order_index(vec![MappingFieldDescriptor::new(
            "customer",
            path(&mm, "Order", "customer"),
        )
        .with_instance_name_properties(vec![path(&mm, "Customer", "account.login")])]);

        let customer = mm.class_id("Customer").unwrap();
        let account = mm.class_id("Account").unwrap();
        assert!(!registry.is_property_tracked(customer, "firstName"));
        assert!(registry.is_property_tracked(customer, "account"));
        assert!(registry.is_property_tracked(account, "login"));
    }
}
