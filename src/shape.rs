//! Grouping retrieved tools by namespace.
//!
//! Both retrieval strategies return their tools through [`group_by_namespace`],
//! so callers see the same shape regardless of which one ran.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::catalog::{ToolRecord, estimate_tokens};

/// Bucket for tools that carry no namespace.
pub const DEFAULT_NAMESPACE: &str = "default";

/// A tool as exposed to callers: the record without its namespace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicTool {
    pub name: String,
    pub description: String,
    pub parameter_schema: serde_json::Value,
}

impl PublicTool {
    pub fn estimated_tokens(&self) -> usize {
        estimate_tokens(&self.name, &self.description, &self.parameter_schema)
    }
}

impl From<ToolRecord> for PublicTool {
    fn from(record: ToolRecord) -> Self {
        Self {
            name: record.name,
            description: record.description,
            parameter_schema: record.parameter_schema,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NamespaceGroup {
    pub namespace: String,
    pub tools: Vec<PublicTool>,
}

/// Tools grouped by owning namespace.
///
/// Namespaces appear in the order their first tool was ranked, and tools
/// keep their relative rank order within a namespace. Serializes as a JSON
/// object `{namespace: [tool, ...]}`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupedTools {
    groups: Vec<NamespaceGroup>,
}

impl GroupedTools {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, namespace: &str, tool: PublicTool) {
        match self.groups.iter_mut().find(|g| g.namespace == namespace) {
            Some(group) => group.tools.push(tool),
            None => self.groups.push(NamespaceGroup {
                namespace: namespace.to_string(),
                tools: vec![tool],
            }),
        }
    }

    pub fn get(&self, namespace: &str) -> Option<&[PublicTool]> {
        self.groups
            .iter()
            .find(|g| g.namespace == namespace)
            .map(|g| g.tools.as_slice())
    }

    pub fn contains_namespace(&self, namespace: &str) -> bool {
        self.get(namespace).is_some()
    }

    pub fn namespaces(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|g| g.namespace.as_str())
    }

    pub fn groups(&self) -> &[NamespaceGroup] {
        &self.groups
    }

    /// All tools, namespace by namespace.
    pub fn tools(&self) -> impl Iterator<Item = &PublicTool> {
        self.groups.iter().flat_map(|g| g.tools.iter())
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.tools().map(|t| t.name.clone()).collect()
    }

    /// Number of tools across all namespaces.
    pub fn len(&self) -> usize {
        self.groups.iter().map(|g| g.tools.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn estimated_tokens(&self) -> usize {
        self.tools().map(PublicTool::estimated_tokens).sum()
    }
}

impl Serialize for GroupedTools {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.groups.len()))?;
        for group in &self.groups {
            map.serialize_entry(&group.namespace, &group.tools)?;
        }
        map.end()
    }
}

/// Group records by namespace, stripping the namespace from each tool.
pub fn group_by_namespace(records: impl IntoIterator<Item = ToolRecord>) -> GroupedTools {
    let mut grouped = GroupedTools::new();
    for mut record in records {
        let namespace = record
            .namespace
            .take()
            .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());
        grouped.push(&namespace, PublicTool::from(record));
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn records() -> Vec<ToolRecord> {
        vec![
            ToolRecord::new("get_weather", "Current weather").namespace("weather-mcp"),
            ToolRecord::new("send_email", "Send an email").namespace("communication-mcp"),
            ToolRecord::new("get_forecast", "Forecast").namespace("weather-mcp"),
            ToolRecord::new("calculate", "Math"),
        ]
    }

    #[test]
    fn test_groups_by_namespace_in_rank_order() {
        let grouped = group_by_namespace(records());

        let namespaces: Vec<_> = grouped.namespaces().collect();
        assert_eq!(namespaces, vec!["weather-mcp", "communication-mcp", DEFAULT_NAMESPACE]);

        let weather: Vec<_> = grouped
            .get("weather-mcp")
            .unwrap()
            .iter()
            .map(|t| t.name.as_str())
            .collect();
        assert_eq!(weather, vec!["get_weather", "get_forecast"]);
        assert_eq!(grouped.len(), 4);
    }

    #[test]
    fn test_missing_namespace_goes_to_default() {
        let grouped = group_by_namespace(records());
        assert_eq!(grouped.get(DEFAULT_NAMESPACE).unwrap()[0].name, "calculate");
    }

    #[test]
    fn test_serialized_shape_has_no_namespace_field() {
        let grouped = group_by_namespace(records());
        let value = serde_json::to_value(&grouped).unwrap();

        let tool = &value["weather-mcp"][0];
        assert_eq!(tool["name"], json!("get_weather"));
        assert!(tool.get("namespace").is_none());
        assert!(tool.get("server").is_none());
        assert!(tool.get("parameter_schema").is_some());
    }

    #[test]
    fn test_empty_grouping() {
        let grouped = group_by_namespace(Vec::new());
        assert!(grouped.is_empty());
        assert_eq!(grouped.len(), 0);
        assert_eq!(serde_json::to_value(&grouped).unwrap(), json!({}));
    }

    #[test]
    fn test_estimated_tokens_sums_tools() {
        let grouped = group_by_namespace(records());
        let expected: usize = grouped.tools().map(|t| t.estimated_tokens()).sum();
        assert_eq!(grouped.estimated_tokens(), expected);
        assert!(expected >= 80);
    }
}
