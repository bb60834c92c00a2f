//! Index mapping types.
//!
//! These are the already-resolved inputs produced by the index-definition
//! loader: one [`IndexDefinition`] per search index, each holding the
//! [`MappingFieldDescriptor`]s that bind document fields to property paths.

use serde::{Deserialize, Serialize};

use crate::types::metamodel::ClassId;
use crate::types::property_path::PropertyPath;

/// How a field value is derived from the property it reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueExtractor {
    /// The raw property value.
    #[default]
    PropertyValue,
    /// The display name of the referenced instance.
    InstanceName,
    /// The identifier of the referenced instance.
    Identifier,
}

/// Binds one index field to the property path it is computed from.
#[derive(Debug, Clone, PartialEq)]
pub struct MappingFieldDescriptor {
    pub field_name: String,
    /// `None` only for standalone fields.
    pub path: Option<PropertyPath>,
    /// Standalone fields are computed without a backing property and never
    /// take part in dependency tracking.
    pub standalone: bool,
    /// Precedence when several declarations map the same field.
    pub order: i32,
    pub extractor: ValueExtractor,
    /// Opaque field configuration handed through to the field-mapping layer.
    pub config: serde_json::Value,
    /// Instance-name related paths, rooted at the referenced class, when the
    /// loader already computed them for a reference mapped by display name.
    pub instance_name_properties: Option<Vec<PropertyPath>>,
}

impl MappingFieldDescriptor {
    /// A field reading the value at `path`.
    pub fn new(field_name: impl Into<String>, path: PropertyPath) -> Self {
        Self {
            field_name: field_name.into(),
            path: Some(path),
            standalone: false,
            order: 0,
            extractor: ValueExtractor::PropertyValue,
            config: serde_json::Value::Null,
            instance_name_properties: None,
        }
    }

    /// A field with no backing property path.
    pub fn standalone(field_name: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            path: None,
            standalone: true,
            order: 0,
            extractor: ValueExtractor::PropertyValue,
            config: serde_json::Value::Null,
            instance_name_properties: None,
        }
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    pub fn with_extractor(mut self, extractor: ValueExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_config(mut self, config: serde_json::Value) -> Self {
        self.config = config;
        self
    }

    pub fn with_instance_name_properties(mut self, properties: Vec<PropertyPath>) -> Self {
        self.instance_name_properties = Some(properties);
        self
    }

    /// The path to track, or `None` when the field is excluded from tracking.
    pub fn tracked_path(&self) -> Option<&PropertyPath> {
        if self.standalone {
            None
        } else {
            self.path.as_ref()
        }
    }
}

/// A search index defined for a root entity class.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexDefinition {
    pub name: String,
    pub root: ClassId,
    pub fields: Vec<MappingFieldDescriptor>,
}

impl IndexDefinition {
    pub fn new(name: impl Into<String>, root: ClassId) -> Self {
        Self {
            name: name.into(),
            root,
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, field: MappingFieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }
}
