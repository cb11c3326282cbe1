//! BM25 keyword ranking over the catalog corpus.

use std::collections::HashMap;

const K1: f64 = 1.5;
const B: f64 = 0.75;

#[derive(Debug, Clone, PartialEq)]
pub struct SparseHit {
    pub id: String,
    pub score: f64,
}

/// Keyword ranker rebuilt from the full corpus on every catalog mutation.
///
/// There is no incremental update path: [`SparseRanker::rebuild`] discards
/// all previous state, so the ranker always reflects exactly the corpus it
/// was last given.
#[derive(Debug, Default)]
pub struct SparseRanker {
    ids: Vec<String>,
    term_freqs: Vec<HashMap<String, usize>>,
    doc_lens: Vec<usize>,
    avg_doc_len: f64,
    idf: HashMap<String, f64>,
}

impl SparseRanker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whitespace tokenization, lowercased. No stemming or stopwords.
    pub fn tokenize(text: &str) -> Vec<String> {
        text.split_whitespace().map(str::to_lowercase).collect()
    }

    /// Replace the corpus. `ids[i]` identifies `documents[i]`.
    pub fn rebuild(&mut self, ids: &[String], documents: &[String]) {
        debug_assert_eq!(ids.len(), documents.len());

        self.ids = ids.to_vec();
        self.term_freqs = Vec::with_capacity(documents.len());
        self.doc_lens = Vec::with_capacity(documents.len());

        let mut doc_freqs: HashMap<String, usize> = HashMap::new();
        for doc in documents {
            let tokens = Self::tokenize(doc);
            self.doc_lens.push(tokens.len());

            let mut tf: HashMap<String, usize> = HashMap::new();
            for token in tokens {
                *tf.entry(token).or_default() += 1;
            }
            for term in tf.keys() {
                *doc_freqs.entry(term.clone()).or_default() += 1;
            }
            self.term_freqs.push(tf);
        }

        let n = documents.len() as f64;
        self.avg_doc_len = if documents.is_empty() {
            0.0
        } else {
            self.doc_lens.iter().sum::<usize>() as f64 / n
        };
        self.idf = doc_freqs
            .into_iter()
            .map(|(term, df)| {
                let df = df as f64;
                (term, (1.0 + (n - df + 0.5) / (df + 0.5)).ln())
            })
            .collect();

        tracing::debug!(
            documents = self.ids.len(),
            terms = self.idf.len(),
            "Sparse ranker rebuilt"
        );
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Raw BM25 score of every document, in corpus order.
    ///
    /// Empty corpus yields an empty list.
    pub fn score(&self, query: &str) -> Vec<SparseHit> {
        let query_terms = Self::tokenize(query);

        self.ids
            .iter()
            .enumerate()
            .map(|(i, id)| SparseHit {
                id: id.clone(),
                score: self.bm25_score(i, &query_terms),
            })
            .collect()
    }

    /// Scores divided by the maximum score, so the best match is `1.0`.
    ///
    /// When no document scores above zero the divisor is `1.0`.
    pub fn normalized_scores(&self, query: &str) -> Vec<SparseHit> {
        let mut hits = self.score(query);
        let max = hits.iter().map(|h| h.score).fold(f64::NEG_INFINITY, f64::max);
        let divisor = if max > 0.0 { max } else { 1.0 };
        for hit in &mut hits {
            hit.score /= divisor;
        }
        hits
    }

    /// Best `k` documents by normalized score; ties keep corpus order.
    pub fn top_k(&self, query: &str, k: usize) -> Vec<SparseHit> {
        self.top_k_matching(query, k, |_| true)
    }

    /// Like [`top_k`](Self::top_k), considering only documents whose id
    /// passes `keep`. Normalization still runs over the whole corpus.
    pub fn top_k_matching<F>(&self, query: &str, k: usize, keep: F) -> Vec<SparseHit>
    where
        F: Fn(&str) -> bool,
    {
        let mut hits = self.normalized_scores(query);
        hits.retain(|hit| keep(&hit.id));
        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(k);
        hits
    }

    fn bm25_score(&self, doc: usize, query_terms: &[String]) -> f64 {
        let tf_map = &self.term_freqs[doc];
        let doc_len = self.doc_lens[doc] as f64;
        let avg_doc_len = self.avg_doc_len.max(1.0);

        let mut score = 0.0;
        for term in query_terms {
            let Some(&tf) = tf_map.get(term) else {
                continue;
            };
            let tf = tf as f64;
            let idf = self.idf.get(term).copied().unwrap_or(0.0);
            let numerator = tf * (K1 + 1.0);
            let denominator = tf + K1 * (1.0 - B + B * (doc_len / avg_doc_len));
            score += idf * (numerator / denominator);
        }
        score
    }
}
