//! Metamodel declarations and builder.

use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use tracing::debug;

use super::in_memory::InMemoryMetamodel;
use crate::errors::MetamodelError;
use crate::types::metamodel::{Cardinality, ClassId, MetaClass, MetaProperty, Range};

/// Declared range of a property, with reference targets named by class name.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeDeclaration {
    Datatype(String),
    Enum(String),
    Class {
        target: String,
        #[serde(default)]
        cardinality: Cardinality,
    },
}

/// Declared property.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PropertyDeclaration {
    pub name: String,
    pub range: RangeDeclaration,
    #[serde(default)]
    pub embedded: bool,
}

/// Declared class.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClassDeclaration {
    pub name: String,
    #[serde(default)]
    pub properties: Vec<PropertyDeclaration>,
    /// Properties the instance name is computed from.
    #[serde(default)]
    pub instance_name: Vec<String>,
}

/// Fluent builder for a single class declaration.
#[derive(Debug)]
pub struct ClassBuilder {
    declaration: ClassDeclaration,
}

impl ClassBuilder {
    fn push(&mut self, name: &str, range: RangeDeclaration, embedded: bool) -> &mut Self {
        self.declaration.properties.push(PropertyDeclaration {
            name: name.to_string(),
            range,
            embedded,
        });
        self
    }

    /// Declare a scalar property.
    pub fn datatype(&mut self, name: &str, datatype: &str) -> &mut Self {
        self.push(name, RangeDeclaration::Datatype(datatype.to_string()), false)
    }

    /// Declare an enum-valued property.
    pub fn enumeration(&mut self, name: &str, enumeration: &str) -> &mut Self {
        self.push(name, RangeDeclaration::Enum(enumeration.to_string()), false)
    }

    /// Declare a to-one reference.
    pub fn reference(&mut self, name: &str, target: &str) -> &mut Self {
        let range = RangeDeclaration::Class {
            target: target.to_string(),
            cardinality: Cardinality::One,
        };
        self.push(name, range, false)
    }

    /// Declare a to-many reference.
    pub fn collection(&mut self, name: &str, target: &str) -> &mut Self {
        let range = RangeDeclaration::Class {
            target: target.to_string(),
            cardinality: Cardinality::Many,
        };
        self.push(name, range, false)
    }

    /// Declare an embedded value object.
    pub fn embedded(&mut self, name: &str, target: &str) -> &mut Self {
        let range = RangeDeclaration::Class {
            target: target.to_string(),
            cardinality: Cardinality::One,
        };
        self.push(name, range, true)
    }

    /// Set the properties the instance name is computed from.
    pub fn instance_name(&mut self, properties: &[&str]) -> &mut Self {
        self.declaration.instance_name = properties.iter().map(|p| p.to_string()).collect();
        self
    }
}

/// Collects class declarations and freezes them into an [`InMemoryMetamodel`].
///
/// # Example
///
/// ```
/// use index_tracking_shared::MetamodelBuilder;
///
/// let mut builder = MetamodelBuilder::new();
/// builder
///     .class("Order")
///     .datatype("number", "string")
///     .reference("customer", "Customer");
/// builder
///     .class("Customer")
///     .datatype("name", "string")
///     .instance_name(&["name"]);
///
/// let metamodel = builder.build().unwrap();
/// assert_eq!(metamodel.class_id("Customer").map(|id| id.0), Some(1));
/// ```
#[derive(Debug, Default)]
pub struct MetamodelBuilder {
    classes: Vec<ClassBuilder>,
}

impl MetamodelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from already deserialized declarations.
    pub fn from_declarations(declarations: Vec<ClassDeclaration>) -> Self {
        Self {
            classes: declarations
                .into_iter()
                .map(|declaration| ClassBuilder { declaration })
                .collect(),
        }
    }

    /// Declare a new class. Ids follow declaration order.
    pub fn class(&mut self, name: &str) -> &mut ClassBuilder {
        self.classes.push(ClassBuilder {
            declaration: ClassDeclaration {
                name: name.to_string(),
                properties: Vec::new(),
                instance_name: Vec::new(),
            },
        });
        let last = self.classes.len() - 1;
        &mut self.classes[last]
    }

    /// Validate all declarations and assign class ids.
    ///
    /// # Errors
    ///
    /// Duplicate class or property names, references to undeclared classes,
    /// embedded flags on non-class properties, and instance names that refer
    /// to undeclared properties.
    pub fn build(self) -> Result<InMemoryMetamodel, MetamodelError> {
        let mut ids: HashMap<String, ClassId> = HashMap::with_capacity(self.classes.len());
        for (index, class) in self.classes.iter().enumerate() {
            let name = &class.declaration.name;
            if ids.insert(name.clone(), ClassId(index as u32)).is_some() {
                return Err(MetamodelError::DuplicateClass(name.clone()));
            }
        }

        let mut classes = Vec::with_capacity(self.classes.len());
        for (index, class) in self.classes.into_iter().enumerate() {
            let declaration = class.declaration;
            let id = ClassId(index as u32);

            let mut seen = HashSet::new();
            let mut properties = Vec::with_capacity(declaration.properties.len());
            for property in declaration.properties {
                if !seen.insert(property.name.clone()) {
                    return Err(MetamodelError::DuplicateProperty {
                        class: declaration.name.clone(),
                        property: property.name,
                    });
                }

                let range = match property.range {
                    RangeDeclaration::Datatype(datatype) => Range::Datatype(datatype),
                    RangeDeclaration::Enum(enumeration) => Range::Enum(enumeration),
                    RangeDeclaration::Class {
                        target,
                        cardinality,
                    } => {
                        let target = *ids
                            .get(&target)
                            .ok_or_else(|| MetamodelError::unknown_class(target.as_str()))?;
                        Range::Class {
                            target,
                            cardinality,
                        }
                    }
                };

                if property.embedded && !range.is_class() {
                    return Err(MetamodelError::not_a_reference(
                        &declaration.name,
                        &property.name,
                        format!("{}.{}", declaration.name, property.name),
                    ));
                }

                properties.push(MetaProperty {
                    name: property.name,
                    domain: id,
                    range,
                    embedded: property.embedded,
                });
            }

            if let Some(missing) = declaration
                .instance_name
                .iter()
                .find(|name| !seen.contains(*name))
            {
                return Err(MetamodelError::UnknownInstanceNameProperty {
                    class: declaration.name.clone(),
                    property: missing.clone(),
                });
            }

            classes.push(MetaClass {
                id,
                name: declaration.name,
                properties,
                instance_name: declaration.instance_name,
            });
        }

        debug!(class_count = classes.len(), "Metamodel declarations validated");
        InMemoryMetamodel::new(classes, ids)
    }
}
