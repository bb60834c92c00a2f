//! Loader module for index definitions.
//!
//! Reads a JSON definitions document holding the metamodel declarations and
//! the already-resolved index mappings, and turns it into a
//! [`DefinitionSet`] the registrar can consume.
//!
//! ```json
//! {
//!   "classes": [
//!     { "name": "Order", "properties": [
//!         { "name": "number", "range": { "datatype": "string" } },
//!         { "name": "customer", "range": { "class": { "target": "Customer" } } }
//!     ] },
//!     { "name": "Customer", "properties": [
//!         { "name": "name", "range": { "datatype": "string" } }
//!     ], "instance_name": ["name"] }
//!   ],
//!   "indexes": [
//!     { "name": "orders", "entity": "Order", "fields": [
//!         { "name": "number", "path": "number" },
//!         { "name": "customer", "path": "customer", "extractor": "instance_name" },
//!         { "name": "score", "standalone": true }
//!     ] }
//!   ]
//! }
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, instrument};

use index_tracking_shared::metamodel::ClassDeclaration;
use index_tracking_shared::{
    ClassId, IndexDefinition, InMemoryMetamodel, MappingFieldDescriptor, MetamodelBuilder,
    MetamodelError, MetamodelProvider, PropertyPath, ValueExtractor,
};

use crate::errors::RegistrationError;
use crate::facade::{DefinitionSet, DefinitionSource};

/// Serialized field declaration.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldDocument {
    pub name: String,
    /// Dotted path relative to the index root; absent for standalone fields.
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub standalone: bool,
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub extractor: ValueExtractor,
    #[serde(default)]
    pub config: serde_json::Value,
    /// Dotted paths relative to the referenced class.
    #[serde(default)]
    pub instance_name_properties: Option<Vec<String>>,
}

/// Serialized index definition.
#[derive(Debug, Clone, Deserialize)]
pub struct IndexDocument {
    pub name: String,
    /// Name of the root entity class.
    pub entity: String,
    #[serde(default)]
    pub fields: Vec<FieldDocument>,
}

/// The whole definitions document.
#[derive(Debug, Clone, Deserialize)]
pub struct DefinitionsDocument {
    pub classes: Vec<ClassDeclaration>,
    #[serde(default)]
    pub indexes: Vec<IndexDocument>,
}

impl DefinitionsDocument {
    /// Parse a document from JSON text.
    pub fn from_json(json: &str) -> Result<Self, RegistrationError> {
        serde_json::from_str(json).map_err(|e| {
            RegistrationError::definition_source(format!("Invalid definitions document: {}", e))
        })
    }

    /// Build the metamodel and resolve every declared path against it.
    ///
    /// # Errors
    ///
    /// * [`RegistrationError::InvalidMetamodel`] - the class declarations are inconsistent
    /// * [`RegistrationError::UnknownRoot`] - an index names an undeclared class
    /// * [`RegistrationError::Metamodel`] - a field path does not resolve
    pub fn into_definition_set(self) -> Result<DefinitionSet, RegistrationError> {
        let metamodel = MetamodelBuilder::from_declarations(self.classes).build()?;

        let indexes = self
            .indexes
            .into_iter()
            .map(|index| resolve_index(&metamodel, index))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(index_count = indexes.len(), "Definitions document resolved");
        Ok(DefinitionSet {
            metamodel: Arc::new(metamodel),
            indexes,
        })
    }
}

fn resolve_index(
    metamodel: &InMemoryMetamodel,
    index: IndexDocument,
) -> Result<IndexDefinition, RegistrationError> {
    let root = metamodel
        .class_id(&index.entity)
        .ok_or_else(|| RegistrationError::UnknownRoot {
            index: index.name.clone(),
            class: index.entity.clone(),
        })?;

    let mut definition = IndexDefinition::new(&index.name, root);
    for field in index.fields {
        let descriptor = resolve_field(metamodel, root, &field)
            .map_err(|e| RegistrationError::metamodel(&index.name, &field.name, e))?;
        definition.fields.push(descriptor);
    }
    Ok(definition)
}

fn resolve_field(
    metamodel: &InMemoryMetamodel,
    root: ClassId,
    field: &FieldDocument,
) -> Result<MappingFieldDescriptor, MetamodelError> {
    let path = field
        .path
        .as_deref()
        .map(|dotted| PropertyPath::parse(metamodel, root, dotted))
        .transpose()?;

    let instance_name_properties = match (&field.instance_name_properties, &path) {
        (Some(names), Some(path)) => {
            let last = path.last();
            let target = last.range.as_class().ok_or_else(|| {
                MetamodelError::not_a_reference(
                    metamodel.class_name(last.domain),
                    &last.property,
                    path.describe(metamodel),
                )
            })?;
            let related = names
                .iter()
                .map(|dotted| PropertyPath::parse(metamodel, target, dotted))
                .collect::<Result<Vec<_>, _>>()?;
            Some(related)
        }
        _ => None,
    };

    Ok(MappingFieldDescriptor {
        field_name: field.name.clone(),
        path,
        standalone: field.standalone,
        order: field.order,
        extractor: field.extractor,
        config: field.config.clone(),
        instance_name_properties,
    })
}

/// Definition source reading a JSON document from disk on every load.
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DefinitionSource for JsonFileSource {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn load(&self) -> Result<DefinitionSet, RegistrationError> {
        let json = std::fs::read_to_string(&self.path).map_err(|e| {
            RegistrationError::definition_source(format!(
                "Failed to read {}: {}",
                self.path.display(),
                e
            ))
        })?;
        DefinitionsDocument::from_json(&json)?.into_definition_set()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCUMENT: &str = r#"{
        "classes": [
            { "name": "Order", "properties": [
                { "name": "number", "range": { "datatype": "string" } },
                { "name": "customer", "range": { "class": { "target": "Customer" } } }
            ] },
            { "name": "Customer", "properties": [
                { "name": "name", "range": { "datatype": "string" } },
                { "name": "email", "range": { "datatype": "string" } }
            ], "instance_name": ["name"] }
        ],
        "indexes": [
            { "name": "orders", "entity": "Order", "fields": [
                { "name": "number", "path": "number", "config": { "type": "keyword" } },
                { "name": "customer", "path": "customer", "extractor": "instance_name",
                  "instance_name_properties": ["email"], "order": 2 },
                { "name": "score", "standalone": true }
            ] }
        ]
    }"#;

    #[test]
    fn test_document_resolves_paths() {
        let set = DefinitionsDocument::from_json(DOCUMENT)
            .unwrap()
            .into_definition_set()
            .unwrap();

        assert_eq!(set.indexes.len(), 1);
        let fields = &set.indexes[0].fields;
        assert_eq!(fields.len(), 3);
        assert_eq!(fields[0].config, serde_json::json!({ "type": "keyword" }));
        assert_eq!(fields[1].extractor, ValueExtractor::InstanceName);
        assert_eq!(fields[1].order, 2);
        assert_eq!(
            fields[1]
                .instance_name_properties
                .as_ref()
                .map(|paths| paths.iter().map(|p| p.dotted()).collect::<Vec<_>>()),
            Some(vec!["email".to_string()])
        );
        assert!(fields[2].standalone);
        assert!(fields[2].path.is_none());
    }

    #[test]
    fn test_document_rejects_unknown_property() {
        let json = DOCUMENT.replace(r#""path": "number""#, r#""path": "customer.phone""#);

        let err = DefinitionsDocument::from_json(&json)
            .unwrap()
            .into_definition_set()
            .unwrap_err();

        assert!(matches!(
            err,
            RegistrationError::Metamodel {
                source: MetamodelError::UnknownProperty { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_document_rejects_unknown_root() {
        let json = DOCUMENT.replace(r#""entity": "Order""#, r#""entity": "Invoice""#);

        let err = DefinitionsDocument::from_json(&json)
            .unwrap()
            .into_definition_set()
            .unwrap_err();

        assert!(matches!(err, RegistrationError::UnknownRoot { .. }));
    }

    #[test]
    fn test_malformed_json_is_a_source_error() {
        let err = DefinitionsDocument::from_json("{ not json").unwrap_err();
        assert!(matches!(err, RegistrationError::SourceError(_)));
    }

    #[test]
    fn test_missing_file_is_a_source_error() {
        let source = JsonFileSource::new("/nonexistent/definitions.json");
        assert!(matches!(source.load(), Err(RegistrationError::SourceError(_))));
    }
}
