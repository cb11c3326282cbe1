//! Tool records stored in the catalog.

use serde::{Deserialize, Serialize};

/// A callable tool descriptor as held by the catalog.
///
/// `name` is the catalog key: adding a record whose name is already live
/// replaces the previous record. `namespace` names the owning server and is
/// routing metadata only; it is stripped before tools are handed to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolRecord {
    pub name: String,
    #[serde(default, alias = "desc")]
    pub description: String,
    #[serde(default, alias = "params", alias = "input_schema")]
    pub parameter_schema: serde_json::Value,
    #[serde(
        default,
        alias = "server",
        alias = "owning_namespace",
        skip_serializing_if = "Option::is_none"
    )]
    pub namespace: Option<String>,
}

impl ToolRecord {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameter_schema: serde_json::Value::Object(Default::default()),
            namespace: None,
        }
    }

    pub fn parameter_schema(mut self, schema: serde_json::Value) -> Self {
        self.parameter_schema = schema;
        self
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Text indexed for both dense and sparse retrieval: name and
    /// description, without the parameter schema.
    pub fn searchable_text(&self) -> String {
        format!("{} {}", self.name, self.description)
    }

    /// Rough token footprint of the record when sent to a model.
    pub fn estimated_tokens(&self) -> usize {
        estimate_tokens(&self.name, &self.description, &self.parameter_schema)
    }
}

pub(crate) fn estimate_tokens(name: &str, description: &str, schema: &serde_json::Value) -> usize {
    let name_tokens = name.len() / 4;
    let desc_tokens = description.len() / 4;
    let schema_tokens = schema.to_string().len() / 4;
    name_tokens + desc_tokens + schema_tokens + 20
}
