use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::PipelineError;

/// Document-frequency thresholds applied before the vocabulary is finalized.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VectorizerConfig {
    /// Tokens appearing in more than this fraction of documents are dropped
    /// (near-universal terms carry no signal).
    pub max_df: f64,
    /// Tokens appearing in fewer than this many documents are dropped
    /// (rare noise and typos).
    pub min_df: u32,
}

impl Default for VectorizerConfig {
    fn default() -> Self {
        VectorizerConfig {
            max_df: 0.90,
            min_df: 5,
        }
    }
}

/// Ordered token -> dense column index map, finalized once from a training
/// corpus and read-only afterwards.
///
/// Indices are dense `0..len` in lexicographic token order, so a vocabulary
/// fit twice on the same corpus is identical. Per-token document frequency
/// and the corpus document count are kept for IDF weighting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vocabulary {
    #[serde(with = "indexmap::map::serde_seq")]
    index: IndexMap<String, u32>,
    /// Document frequency per column, parallel to `index` order.
    doc_freq: Vec<u32>,
    doc_count: u64,
}

impl Vocabulary {
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Column index for a token, `None` if it was never seen (or pruned) at
    /// fit time.
    pub fn get(&self, token: &str) -> Option<u32> {
        self.index.get(token).copied()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.index.contains_key(token)
    }

    /// Token at a column index.
    pub fn token_at(&self, index: u32) -> Option<&str> {
        self.index
            .get_index(index as usize)
            .map(|(token, _)| token.as_str())
    }

    /// Number of training documents the column's token appeared in.
    pub fn doc_freq(&self, index: u32) -> u32 {
        self.doc_freq.get(index as usize).copied().unwrap_or(0)
    }

    /// Number of documents the vocabulary was fit over.
    pub fn doc_count(&self) -> u64 {
        self.doc_count
    }
}

/// Accumulates document frequencies over a training corpus, then applies the
/// thresholds and freezes the vocabulary.
#[derive(Debug, Default)]
pub struct VocabularyBuilder {
    doc_freq: HashMap<String, u32>,
    doc_count: u64,
}

impl VocabularyBuilder {
    pub fn new() -> Self {
        VocabularyBuilder::default()
    }

    /// Count one document. A token contributes at most once per document.
    pub fn add_document(&mut self, tokens: &[String]) {
        self.doc_count += 1;
        let unique: HashSet<&str> = tokens.iter().map(|t| t.as_str()).collect();
        for token in unique {
            *self.doc_freq.entry(token.to_string()).or_insert(0) += 1;
        }
    }

    /// Apply thresholds and assign indices in lexicographic order.
    ///
    /// Errors with `EmptyCorpus` if no document was added or every token was
    /// pruned: an empty vocabulary cannot support any downstream transform.
    pub fn finish(self, config: &VectorizerConfig) -> Result<Vocabulary, PipelineError> {
        if self.doc_count == 0 {
            return Err(PipelineError::EmptyCorpus);
        }
        let max_count = (config.max_df * self.doc_count as f64).floor() as u64;
        let mut kept: Vec<(String, u32)> = self
            .doc_freq
            .into_iter()
            .filter(|&(_, df)| df >= config.min_df && (df as u64) <= max_count)
            .collect();
        kept.sort_by(|a, b| a.0.cmp(&b.0));

        if kept.is_empty() {
            return Err(PipelineError::EmptyCorpus);
        }

        let mut index = IndexMap::with_capacity(kept.len());
        let mut doc_freq = Vec::with_capacity(kept.len());
        for (i, (token, df)) in kept.into_iter().enumerate() {
            index.insert(token, i as u32);
            doc_freq.push(df);
        }
        debug!(
            vocab = index.len(),
            docs = self.doc_count,
            "vocabulary finalized"
        );
        Ok(Vocabulary {
            index,
            doc_freq,
            doc_count: self.doc_count,
        })
    }
}
