use std::fmt;

use ndarray::Array1;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::document::Sentiment;

/// Divide each topic row by its Euclidean norm. All-zero rows stay zero, so
/// degenerate documents rank with zero similarity instead of NaN.
pub fn normalize_rows(rows: &mut [Array1<f64>]) {
    for row in rows.iter_mut() {
        let norm = row.dot(row).sqrt();
        if norm > 0.0 {
            *row /= norm;
        }
    }
}

/// One labeled reference document with its unit-length topic vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefEntry {
    pub text: String,
    pub label: Sentiment,
    topic_vec: Array1<f64>,
}

impl RefEntry {
    pub fn new(text: String, label: Sentiment, topic_vec: Array1<f64>) -> Self {
        RefEntry {
            text,
            label,
            topic_vec,
        }
    }
}

/// A single ranked result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hit {
    pub text: String,
    /// Cosine similarity; in [0, 1] for non-negative unit vectors.
    pub score: f64,
    pub label: Sentiment,
}

/// Ranked results, descending by score.
#[derive(Debug, Clone, Default)]
pub struct Hits {
    pub list: Vec<Hit>,
}

impl Hits {
    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Hit> {
        self.list.iter()
    }
}

impl fmt::Display for Hits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Hits [")?;
        for hit in &self.list {
            let preview: String = hit.text.chars().take(60).collect();
            writeln!(f, "    {:.4} [{}] {}", hit.score, hit.label, preview)?;
        }
        write!(f, "]")
    }
}

/// Ranks a query topic vector against a precomputed, length-normalized
/// labeled reference corpus.
///
/// Read-only after construction; concurrent `rank` calls share one instance.
/// The caller must normalize the query the same way as the reference rows
/// (see `normalize_rows`) or the dot products are not cosines — the ranker
/// cannot detect a violation of that contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarityRanker {
    entries: Vec<RefEntry>,
}

impl SimilarityRanker {
    pub fn new(entries: Vec<RefEntry>) -> Self {
        SimilarityRanker { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Score every reference row by dot product and return the `top_n` best,
    /// descending. Equal scores preserve corpus order (stable sort); `top_n`
    /// beyond the corpus size returns the whole corpus; an empty corpus
    /// returns empty `Hits`.
    pub fn rank(&self, query: &Array1<f64>, top_n: usize) -> Hits {
        let mut list: Vec<Hit> = self
            .entries
            .par_iter()
            .map(|entry| Hit {
                text: entry.text.clone(),
                score: entry.topic_vec.dot(query),
                label: entry.label,
            })
            .collect();
        // NaN scores cannot be ordered meaningfully; drop them.
        list.retain(|hit| !hit.score.is_nan());
        list.sort_by(|a, b| b.score.total_cmp(&a.score));
        list.truncate(top_n);
        Hits { list }
    }
}
