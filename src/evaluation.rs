//! Retrieval quality measurement against labelled queries.
//!
//! A case pairs a query with the tool that should be retrieved for it, or
//! with `None` for queries no tool answers. Reports only hold numbers;
//! rendering them is left to the caller.

use serde::{Deserialize, Serialize};

use crate::Result;
use crate::retriever::{Retriever, Selection};

/// 1-based position of `expected` in `retrieved`.
///
/// Returns `-1` when `expected` is `None` or not present.
pub fn calculate_rank(expected: Option<&str>, retrieved: &[String]) -> i32 {
    let Some(expected) = expected else {
        return -1;
    };
    retrieved
        .iter()
        .position(|name| name == expected)
        .and_then(|i| i32::try_from(i + 1).ok())
        .unwrap_or(-1)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationCase {
    pub query: String,
    /// Tool that should be retrieved; `None` for negative cases.
    pub expected: Option<String>,
}

impl EvaluationCase {
    pub fn positive(query: impl Into<String>, expected: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            expected: Some(expected.into()),
        }
    }

    pub fn negative(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            expected: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub query: String,
    pub expected: Option<String>,
    /// Names grouped by namespace, in rank order within each namespace.
    pub retrieved: Vec<String>,
    /// 1-based rank of `expected`, `-1` if missing or negative.
    pub rank: i32,
}

impl EvaluationResult {
    pub fn is_negative(&self) -> bool {
        self.expected.is_none()
    }

    pub fn is_hit(&self) -> bool {
        self.rank > 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub retriever: String,
    pub results: Vec<EvaluationResult>,
}

impl EvaluationReport {
    pub fn positives(&self) -> impl Iterator<Item = &EvaluationResult> {
        self.results.iter().filter(|r| !r.is_negative())
    }

    pub fn negatives(&self) -> impl Iterator<Item = &EvaluationResult> {
        self.results.iter().filter(|r| r.is_negative())
    }

    pub fn hits(&self) -> usize {
        self.positives().filter(|r| r.is_hit()).count()
    }

    /// Share of positive cases whose expected tool was retrieved.
    pub fn hit_rate(&self) -> f64 {
        let total = self.positives().count();
        if total == 0 {
            return 0.0;
        }
        self.hits() as f64 / total as f64
    }

    /// Mean rank over hits; `0.0` when nothing was found.
    pub fn average_rank(&self) -> f64 {
        let ranks: Vec<f64> = self
            .positives()
            .filter(|r| r.is_hit())
            .map(|r| f64::from(r.rank))
            .collect();
        if ranks.is_empty() {
            return 0.0;
        }
        ranks.iter().sum::<f64>() / ranks.len() as f64
    }

    pub fn misses(&self) -> Vec<&EvaluationResult> {
        self.positives().filter(|r| !r.is_hit()).collect()
    }

    /// Negative cases for which nothing was retrieved.
    pub fn negatives_filtered(&self) -> usize {
        self.negatives().filter(|r| r.retrieved.is_empty()).count()
    }
}

/// Run every case through `retriever` with its default `k`.
///
/// When the retriever answers with [`Selection::UseFullCatalog`],
/// `full_catalog` stands in as the ranked list.
pub async fn evaluate(
    retriever: &dyn Retriever,
    cases: &[EvaluationCase],
    full_catalog: &[String],
) -> Result<EvaluationReport> {
    let mut results = Vec::with_capacity(cases.len());

    for case in cases {
        let retrieved = match retriever.retrieve(&case.query, None).await? {
            Selection::Tools(tools) => tools.tool_names(),
            Selection::UseFullCatalog => full_catalog.to_vec(),
        };
        let rank = calculate_rank(case.expected.as_deref(), &retrieved);
        results.push(EvaluationResult {
            query: case.query.clone(),
            expected: case.expected.clone(),
            retrieved,
            rank,
        });
    }

    let report = EvaluationReport {
        retriever: retriever.name().to_string(),
        results,
    };
    tracing::info!(
        retriever = %report.retriever,
        cases = report.results.len(),
        hits = report.hits(),
        hit_rate = report.hit_rate(),
        "Evaluation finished"
    );
    Ok(report)
}
