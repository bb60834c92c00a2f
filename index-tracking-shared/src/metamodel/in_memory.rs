//! Arena-backed metamodel implementing every collaborator interface.

use std::collections::HashMap;
use tracing::debug;

use crate::errors::MetamodelError;
use crate::interfaces::{EmbeddingClassifier, InstanceNameProvider, MetamodelProvider};
use crate::types::metamodel::{ClassId, MetaClass};
use crate::types::property_path::PropertyPath;

/// Frozen metamodel. Built once by [`MetamodelBuilder`](super::MetamodelBuilder).
///
/// Instance-name related paths are flattened at build time so the lookup
/// made for every reference field during registration is a plain clone.
#[derive(Debug, Clone)]
pub struct InMemoryMetamodel {
    classes: Vec<MetaClass>,
    by_name: HashMap<String, ClassId>,
    instance_names: Vec<Vec<PropertyPath>>,
}

impl InMemoryMetamodel {
    pub(super) fn new(
        classes: Vec<MetaClass>,
        by_name: HashMap<String, ClassId>,
    ) -> Result<Self, MetamodelError> {
        let mut metamodel = Self {
            instance_names: vec![Vec::new(); classes.len()],
            classes,
            by_name,
        };

        let mut instance_names = Vec::with_capacity(metamodel.classes.len());
        for class in &metamodel.classes {
            let mut visiting = vec![class.id];
            instance_names.push(metamodel.flatten_instance_name(class.id, &mut visiting)?);
        }
        metamodel.instance_names = instance_names;

        debug!(
            class_count = metamodel.classes.len(),
            "In-memory metamodel built"
        );
        Ok(metamodel)
    }

    /// Id of the class with the given name.
    pub fn class_id(&self, name: &str) -> Option<ClassId> {
        self.by_name.get(name).copied()
    }

    /// All classes in id order.
    pub fn classes(&self) -> impl Iterator<Item = &MetaClass> {
        self.classes.iter()
    }

    /// Expand the instance name of `class` into paths rooted at it, following
    /// references into the display names of the referenced classes.
    ///
    /// `visiting` holds the classes on the current expansion stack; a
    /// reference back into one of them contributes only its own hop.
    fn flatten_instance_name(
        &self,
        class: ClassId,
        visiting: &mut Vec<ClassId>,
    ) -> Result<Vec<PropertyPath>, MetamodelError> {
        let Some(meta) = self.classes.get(class.index()) else {
            return Ok(Vec::new());
        };

        let mut paths = Vec::new();
        for name in &meta.instance_name {
            let path = PropertyPath::resolve(self, class, &[name])?;
            let last = path.last();
            let target = last.range.as_class().filter(|target| {
                !self.is_embedded(class, &last.property) && !visiting.contains(target)
            });

            let mut nested = Vec::new();
            if let Some(target) = target {
                visiting.push(target);
                nested = self.flatten_instance_name(target, visiting)?;
                visiting.pop();
            }

            for suffix in &nested {
                let extended = path.extend(suffix)?;
                if !paths.contains(&extended) {
                    paths.push(extended);
                }
            }
            if !paths.contains(&path) {
                paths.push(path);
            }
        }
        Ok(paths)
    }
}

impl MetamodelProvider for InMemoryMetamodel {
    fn class(&self, id: ClassId) -> Option<&MetaClass> {
        self.classes.get(id.index())
    }

    fn class_by_name(&self, name: &str) -> Option<&MetaClass> {
        self.class_id(name).and_then(|id| self.classes.get(id.index()))
    }

    fn class_count(&self) -> usize {
        self.classes.len()
    }
}

impl EmbeddingClassifier for InMemoryMetamodel {
    fn is_embedded(&self, class: ClassId, property: &str) -> bool {
        self.property(class, property)
            .map(|p| p.embedded)
            .unwrap_or(false)
    }
}

impl InstanceNameProvider for InMemoryMetamodel {
    fn instance_name_related_properties(&self, class: ClassId) -> Vec<PropertyPath> {
        self.instance_names
            .get(class.index())
            .cloned()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metamodel::MetamodelBuilder;

    fn dotted(paths: &[PropertyPath]) -> Vec<String> {
        paths.iter().map(|p| p.dotted()).collect()
    }

    #[test]
    fn test_instance_name_flattens_nested_references() {
        let mut builder = MetamodelBuilder::new();
        builder
            .class("Employee")
            .datatype("lastName", "string")
            .reference("department", "Department")
            .instance_name(&["lastName", "department"]);
        builder
            .class("Department")
            .datatype("code", "string")
            .instance_name(&["code"]);
        let mm = builder.build().unwrap();

        let employee = mm.class_id("Employee").unwrap();
        let paths = mm.instance_name_related_properties(employee);

        assert_eq!(
            dotted(&paths),
            vec!["lastName", "department.code", "department"]
        );
        assert!(paths.iter().all(|p| p.root_class() == employee));
    }

    #[test]
    fn test_instance_name_cycle_is_cut() {
        let mut builder = MetamodelBuilder::new();
        builder
            .class("Node")
            .datatype("label", "string")
            .reference("parent", "Node")
            .instance_name(&["label", "parent"]);
        let mm = builder.build().unwrap();

        let node = mm.class_id("Node").unwrap();
        assert_eq!(
            dotted(&mm.instance_name_related_properties(node)),
            vec!["label", "parent"]
        );
    }

    #[test]
    fn test_embedding_classifier() {
        let mut builder = MetamodelBuilder::new();
        builder
            .class("Customer")
            .embedded("address", "Address")
            .reference("account", "Account");
        builder.class("Address").datatype("zip", "string");
        builder.class("Account");
        let mm = builder.build().unwrap();

        let customer = mm.class_id("Customer").unwrap();
        assert!(mm.is_embedded(customer, "address"));
        assert!(!mm.is_embedded(customer, "account"));
        assert!(!mm.is_embedded(customer, "missing"));
    }

    #[test]
    fn test_class_without_instance_name_has_no_related_properties() {
        let mut builder = MetamodelBuilder::new();
        builder.class("Tag").datatype("value", "string");
        let mm = builder.build().unwrap();

        let tag = mm.class_id("Tag").unwrap();
        assert!(mm.instance_name_related_properties(tag).is_empty());
        assert!(mm.instance_name_related_properties(ClassId(42)).is_empty());
    }
}
