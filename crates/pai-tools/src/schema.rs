//! Typed JSON-schema trees for tool parameters.
//!
//! Only the subset the realtime API needs is modelled: objects with required
//! and optional properties, arrays, strings and numbers. Serialising a [`Schema`] yields the exact JSON the service
//! expects under `tools[].parameters`.

use serde::Serialize;
use std::collections::BTreeMap;

/// A parameter schema node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Schema {
    /// A JSON object with named properties.
    Object(ObjectSchema),
    /// A homogeneous JSON array.
    Array {
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        items: Box<Schema>,
    },
    String {
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    /// A JSON number.
    Number {
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
}

impl Schema {
    pub fn string(description: impl Into<String>) -> Self {
        Self::String {
            description: Some(description.into()),
        }
    }

    pub fn number(description: impl Into<String>) -> Self {
        Self::Number {
            description: Some(description.into()),
        }
    }

    pub fn array(items: Schema, description: impl Into<String>) -> Self {
        Self::Array {
            description: Some(description.into()),
            items: Box::new(items),
        }
    }

    /// Returns the object body if this node is an object.
    pub fn as_object(&self) -> Option<&ObjectSchema> {
        match self {
            Self::Object(object) => Some(object),
            _ => None,
        }
    }
}

impl From<ObjectSchema> for Schema {
    fn from(object: ObjectSchema) -> Self {
        Self::Object(object)
    }
}

/// Body of an object schema. Built with [`ObjectSchema::required`] and
/// [`ObjectSchema::optional`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ObjectSchema {
    pub properties: BTreeMap<String, Schema>,
    pub required: Vec<String>,
}

impl ObjectSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a property the caller must always supply.
    pub fn required(mut self, name: &str, schema: Schema) -> Self {
        self.properties.insert(name.to_string(), schema);
        self.required.push(name.to_string());
        self
    }

    /// Adds a property the caller may omit.
    pub fn optional(mut self, name: &str, schema: Schema) -> Self {
        self.properties.insert(name.to_string(), schema);
        self
    }

    /// Returns `true` if `name` is listed as required.
    pub fn is_required(&self, name: &str) -> bool {
        self.required.iter().any(|r| r == name)
    }
}
