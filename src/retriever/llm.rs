//! Language-model tool selection.
//!
//! The selector keeps its own copy of the catalog, hands the model the query
//! and the candidate tools, and maps the names it answers with back to
//! records. Building the prompt and talking to the model is the job of the
//! [`SelectionModel`] implementation.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use tracing::Instrument;

use super::{Retriever, Selection};
use crate::Result;
use crate::catalog::ToolRecord;
use crate::config::{MAX_TOP_K, MIN_TOP_K, RetrievalConfig};
use crate::shape::group_by_namespace;

fn code_fence_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"```(?:json)?[ \t]*\r?\n?([\s\S]*?)```").expect("valid code fence regex")
    })
}

/// What the model is asked to choose from.
#[derive(Debug, Clone, Copy)]
pub struct SelectionRequest<'a> {
    pub query: &'a str,
    /// Maximum number of tools to select.
    pub k: usize,
    /// The full catalog, in catalog order.
    pub tools: &'a [ToolRecord],
}

/// A language model asked to pick tools.
///
/// Returns the model's raw text. Transport or backend failures should be
/// returned as [`Error::SelectionModel`](crate::Error::SelectionModel); they propagate to the caller.
/// Unparseable text is handled by [`LlmSelector`].
#[async_trait]
pub trait SelectionModel: Send + Sync {
    fn name(&self) -> &str;

    async fn select(&self, request: SelectionRequest<'_>) -> Result<String>;
}

/// Extract tool names from a model response.
///
/// Accepts `{"selected_tools": [...]}`, `{"tools": [...]}`, a bare JSON
/// array, or either form inside a Markdown code fence. An object with
/// neither key selects nothing. Non-string entries are skipped.
pub fn parse_selection(content: &str) -> Result<Vec<String>> {
    let content = content.trim();
    let value: Value = match serde_json::from_str(content) {
        Ok(value) => value,
        Err(err) => match code_fence_regex().captures(content).and_then(|c| c.get(1)) {
            Some(inner) => serde_json::from_str(inner.as_str().trim())?,
            None => return Err(err.into()),
        },
    };

    let names = match value {
        Value::Object(mut map) => map
            .remove("selected_tools")
            .or_else(|| map.remove("tools"))
            .unwrap_or_else(|| Value::Array(Vec::new())),
        other => other,
    };

    let items: Vec<Value> = serde_json::from_value(names)?;
    Ok(items
        .into_iter()
        .filter_map(|item| match item {
            Value::String(name) => Some(name),
            _ => None,
        })
        .collect())
}

/// Tool selection delegated to a language model.
///
/// Catalog operations differ from [`HybridRetriever`](super::HybridRetriever):
/// [`populate`](Self::populate) replaces the catalog.
pub struct LlmSelector {
    model: Arc<dyn SelectionModel>,
    tools: Vec<ToolRecord>,
    positions: HashMap<String, usize>,
    default_k: usize,
    filter_tools: bool,
}

impl LlmSelector {
    pub fn new(model: Arc<dyn SelectionModel>) -> Self {
        let defaults = RetrievalConfig::default();
        Self {
            model,
            tools: Vec::new(),
            positions: HashMap::new(),
            default_k: defaults.top_k(),
            filter_tools: defaults.filter_tools(),
        }
    }

    /// Take `top_k` and `filter_tools` from `config`.
    pub fn from_config(model: Arc<dyn SelectionModel>, config: &RetrievalConfig) -> Self {
        Self::new(model)
            .default_k(config.top_k())
            .filter_tools(config.filter_tools())
    }

    pub fn default_k(mut self, k: usize) -> Self {
        self.default_k = k.clamp(MIN_TOP_K, MAX_TOP_K);
        self
    }

    pub fn filter_tools(mut self, enabled: bool) -> Self {
        self.filter_tools = enabled;
        self
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Replace the catalog.
    pub fn populate(&mut self, records: Vec<ToolRecord>) {
        self.tools.clear();
        self.positions.clear();
        self.add(records);
        tracing::info!(tools = self.tools.len(), "Populated selector catalog");
    }

    /// Insert or update tools by name.
    pub fn add(&mut self, records: Vec<ToolRecord>) {
        for record in records {
            match self.positions.get(&record.name) {
                Some(&pos) => self.tools[pos] = record,
                None => {
                    self.positions.insert(record.name.clone(), self.tools.len());
                    self.tools.push(record);
                }
            }
        }
    }

    /// Remove tools by name, ignoring unknown names.
    pub fn remove<I, N>(&mut self, names: I) -> usize
    where
        I: IntoIterator<Item = N>,
        N: AsRef<str>,
    {
        let names: HashSet<String> = names
            .into_iter()
            .map(|n| n.as_ref().to_string())
            .collect();
        let before = self.tools.len();
        self.tools.retain(|tool| !names.contains(&tool.name));
        let removed = before - self.tools.len();
        if removed > 0 {
            self.positions = self
                .tools
                .iter()
                .enumerate()
                .map(|(i, tool)| (tool.name.clone(), i))
                .collect();
        }
        removed
    }

    pub fn tools(&self) -> &[ToolRecord] {
        &self.tools
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Select up to `k` tools for `query`.
    pub async fn select(&self, query: &str, k: usize) -> Result<Selection> {
        if !self.filter_tools {
            return Ok(Selection::UseFullCatalog);
        }
        if self.tools.is_empty() {
            return Ok(Selection::Tools(Default::default()));
        }
        if k >= self.tools.len() {
            return Ok(Selection::Tools(group_by_namespace(self.tools.iter().cloned())));
        }

        let request = SelectionRequest {
            query,
            k,
            tools: &self.tools,
        };
        let response = self.model.select(request).await?;

        let records = match parse_selection(&response) {
            Ok(names) => self.resolve(names, k),
            Err(err) => {
                tracing::warn!(
                    model = self.model.name(),
                    error = %err,
                    k,
                    "Unparseable tool selection, falling back to first k tools"
                );
                self.tools.iter().take(k).cloned().collect()
            }
        };

        tracing::debug!(query = %query, selected = records.len(), "Model selected tools");
        Ok(Selection::Tools(group_by_namespace(records)))
    }

    // Known names only, first occurrence wins, at most `k`.
    fn resolve(&self, names: Vec<String>, k: usize) -> Vec<ToolRecord> {
        let mut seen = HashSet::new();
        names
            .into_iter()
            .filter(|name| seen.insert(name.clone()))
            .filter_map(|name| {
                self.positions
                    .get(&name)
                    .map(|&pos| self.tools[pos].clone())
            })
            .take(k)
            .collect()
    }
}

#[async_trait]
impl Retriever for LlmSelector {
    fn name(&self) -> &str {
        "llm"
    }

    async fn retrieve(&self, query: &str, k: Option<usize>) -> Result<Selection> {
        let span = tracing::debug_span!("tools_rag.retrieve", retriever = "llm");
        let k = k
            .map(|k| k.clamp(MIN_TOP_K, MAX_TOP_K))
            .unwrap_or(self.default_k);
        self.select(query, k).instrument(span).await
    }
}

impl std::fmt::Debug for LlmSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmSelector")
            .field("model", &self.model.name())
            .field("tools", &self.tools.len())
            .field("default_k", &self.default_k)
            .field("filter_tools", &self.filter_tools)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_selected_tools_object() {
        let names = parse_selection(r#"{"selected_tools": ["get_weather", "send_email"]}"#).unwrap();
        assert_eq!(names, vec!["get_weather", "send_email"]);
    }

    #[test]
    fn test_parse_tools_key_and_bare_array() {
        assert_eq!(parse_selection(r#"{"tools": ["a"]}"#).unwrap(), vec!["a"]);
        assert_eq!(parse_selection(r#"  ["a", "b"]  "#).unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn test_parse_prefers_selected_tools() {
        let names = parse_selection(r#"{"tools": ["x"], "selected_tools": ["y"]}"#).unwrap();
        assert_eq!(names, vec!["y"]);
    }

    #[test]
    fn test_parse_object_without_known_key() {
        assert!(parse_selection(r#"{"answer": "none"}"#).unwrap().is_empty());
    }

    #[test]
    fn test_parse_code_fences() {
        let fenced = "Here you go:\n```json\n{\"selected_tools\": [\"get_weather\"]}\n```";
        assert_eq!(parse_selection(fenced).unwrap(), vec!["get_weather"]);

        let plain = "```\n[\"send_email\"]\n```";
        assert_eq!(parse_selection(plain).unwrap(), vec!["send_email"]);
    }

    #[test]
    fn test_parse_skips_non_strings() {
        let names = parse_selection(r#"["a", 3, null, "b"]"#).unwrap();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(parse_selection("I think get_weather is best").is_err());
        assert!(parse_selection("42").is_err());
        assert!(parse_selection(r#"{"selected_tools": null}"#).is_err());
        assert!(parse_selection("```json\n{broken\n```").is_err());
    }
}
