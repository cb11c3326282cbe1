//! LLM Selector Tests
//!
//! Tests for the language-model selector against a scripted model: catalog
//! operations, response parsing, graceful fallback and error propagation.
//!
//! Run: cargo nextest run --test llm_selector_tests

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tools_rag::{
    Error, LlmSelector, RetrievalConfig, Retriever, Selection, SelectionModel, SelectionRequest,
    ToolRecord,
};

/// Replays a fixed response and counts calls.
struct ScriptedModel {
    response: std::result::Result<String, String>,
    calls: AtomicUsize,
}

impl ScriptedModel {
    fn answering(response: &str) -> Arc<Self> {
        Arc::new(Self {
            response: Ok(response.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            response: Err(message.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SelectionModel for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn select(&self, request: SelectionRequest<'_>) -> tools_rag::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert!(request.k < request.tools.len());
        self.response.clone().map_err(Error::SelectionModel)
    }
}

fn catalog() -> Vec<ToolRecord> {
    vec![
        ToolRecord::new("get_weather", "Get current weather").namespace("weather-mcp"),
        ToolRecord::new("get_forecast", "Get weather forecast").namespace("weather-mcp"),
        ToolRecord::new("send_email", "Send an email").namespace("mail"),
        ToolRecord::new("search_wiki", "Search Wikipedia"),
    ]
}

fn selector(model: Arc<ScriptedModel>) -> LlmSelector {
    let mut selector = LlmSelector::new(model);
    selector.populate(catalog());
    selector
}

// =============================================================================
// Catalog operations
// =============================================================================

mod catalog_tests {
    use super::*;

    #[test]
    fn test_populate_replaces() {
        let mut selector = selector(ScriptedModel::answering("[]"));
        selector.populate(vec![ToolRecord::new("only_tool", "The only tool")]);
        assert_eq!(selector.len(), 1);
        assert_eq!(selector.tools()[0].name, "only_tool");
    }

    #[test]
    fn test_add_upserts() {
        let mut selector = selector(ScriptedModel::answering("[]"));
        selector.add(vec![
            ToolRecord::new("send_email", "Send mail with attachments").namespace("mail"),
            ToolRecord::new("read_file", "Read a file"),
        ]);
        assert_eq!(selector.len(), 5);
        assert_eq!(selector.tools()[2].description, "Send mail with attachments");
    }

    #[test]
    fn test_remove_ignores_unknown() {
        let mut selector = selector(ScriptedModel::answering("[]"));
        assert_eq!(selector.remove(["get_forecast", "missing"]), 1);
        assert_eq!(selector.len(), 3);
        assert_eq!(selector.remove(["missing"]), 0);
    }
}

// =============================================================================
// Selection
// =============================================================================

mod selection_tests {
    use super::*;

    #[tokio::test]
    async fn test_selects_named_tools_grouped() {
        let model = ScriptedModel::answering(r#"{"selected_tools": ["send_email", "get_weather"]}"#);
        let selector = selector(model.clone());

        let selection = selector.select("email me the weather", 2).await.unwrap();
        let tools = selection.tools().unwrap();
        assert_eq!(tools.tool_names(), vec!["send_email", "get_weather"]);
        assert!(tools.contains_namespace("mail"));
        assert!(tools.contains_namespace("weather-mcp"));
        assert_eq!(model.calls(), 1);
    }

    #[tokio::test]
    async fn test_unknown_and_duplicate_names_dropped() {
        let model = ScriptedModel::answering(
            r#"["made_up_tool", "get_weather", "get_weather", "search_wiki", "send_email"]"#,
        );
        let selector = selector(model);

        let selection = selector.select("weather", 2).await.unwrap();
        assert_eq!(selection.tool_names(), vec!["get_weather", "search_wiki"]);
        let tools = selection.tools().unwrap();
        assert!(tools.contains_namespace("default"));
    }

    #[tokio::test]
    async fn test_fenced_response() {
        let model = ScriptedModel::answering(
            "Sure!\n```json\n{\"tools\": [\"get_forecast\"]}\n```\nLet me know.",
        );
        let selection = selector(model).select("forecast", 1).await.unwrap();
        assert_eq!(selection.tool_names(), vec!["get_forecast"]);
    }

    #[tokio::test]
    async fn test_malformed_response_falls_back_to_first_k() {
        let model = ScriptedModel::answering("I would pick the weather tool.");
        let selection = selector(model).select("weather", 2).await.unwrap();
        assert_eq!(selection.tool_names(), vec!["get_weather", "get_forecast"]);
    }

    #[tokio::test]
    async fn test_model_error_propagates() {
        let model = ScriptedModel::failing("connection refused");
        let err = selector(model).select("weather", 2).await.unwrap_err();
        assert!(matches!(err, Error::SelectionModel(_)));
        assert!(err.is_backend_error());
    }

    #[tokio::test]
    async fn test_k_covering_catalog_skips_model() {
        let model = ScriptedModel::answering("not json");
        let selector = selector(model.clone());

        let selection = selector.select("anything", 10).await.unwrap();
        assert_eq!(selection.tools().unwrap().len(), 4);
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test]
    async fn test_empty_catalog() {
        let model = ScriptedModel::answering("[]");
        let selector = LlmSelector::new(model.clone());

        let selection = selector.select("weather", 3).await.unwrap();
        assert_eq!(selection, Selection::Tools(Default::default()));
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test]
    async fn test_filtering_disabled_returns_sentinel() {
        let config = RetrievalConfig::builder().filter_tools(false).build().unwrap();
        let model = ScriptedModel::answering("[]");
        let mut selector = LlmSelector::from_config(model.clone(), &config);
        selector.populate(catalog());

        let selection = selector.retrieve("weather", Some(1)).await.unwrap();
        assert!(selection.is_full_catalog());
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test]
    async fn test_retriever_uses_default_k() {
        let model = ScriptedModel::answering(r#"["get_weather", "get_forecast", "send_email"]"#);
        let mut selector = LlmSelector::new(model).default_k(2);
        selector.populate(catalog());

        let retriever: &dyn Retriever = &selector;
        assert_eq!(retriever.name(), "llm");
        let selection = retriever.retrieve("weather", None).await.unwrap();
        assert_eq!(selection.tool_names(), vec!["get_weather", "get_forecast"]);
    }
}
