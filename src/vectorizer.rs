use std::collections::BTreeMap;
use std::marker::PhantomData;

use rayon::prelude::*;
use tracing::debug;

use crate::error::PipelineError;
use crate::sparse::SparseVec;
use crate::tokenizer::Tokenize;
use crate::vocab::{VectorizerConfig, Vocabulary, VocabularyBuilder};

/// Weighting strategy applied to a raw count row.
///
/// Pluggable so the classifier variant (TF-IDF) and the topic-model variant
/// (raw counts) share one fit/transform implementation.
pub trait Weighting: Send + Sync {
    fn weigh(counts: SparseVec, vocab: &Vocabulary) -> SparseVec;
}

/// Raw term counts, used by the topic model (NMF requires non-negative
/// counts, not signed or centered weights).
#[derive(Debug)]
pub struct CountWeighting;

impl Weighting for CountWeighting {
    fn weigh(counts: SparseVec, _vocab: &Vocabulary) -> SparseVec {
        counts
    }
}

/// Smoothed TF-IDF with L2 row normalization, used by the classifier.
///
/// idf(t) = ln((1 + n_docs) / (1 + df(t))) + 1
#[derive(Debug)]
pub struct TfidfWeighting;

impl Weighting for TfidfWeighting {
    fn weigh(mut counts: SparseVec, vocab: &Vocabulary) -> SparseVec {
        let n_docs = vocab.doc_count() as f64;
        counts.map_values(|index, count| {
            let df = vocab.doc_freq(index) as f64;
            count * (((1.0 + n_docs) / (1.0 + df)).ln() + 1.0)
        });
        let norm = counts.l2_norm();
        if norm > 0.0 {
            counts.scale(1.0 / norm);
        }
        counts
    }
}

/// Converts documents into sparse feature rows over a fixed vocabulary.
///
/// `fit` learns the vocabulary once (offline); `transform` pushes any
/// document through it. Unknown tokens are silently dropped at transform
/// time: they were never seen at fit time and have no column.
///
/// After `fit` the vectorizer is read-only, so transforms may run
/// concurrently against a shared instance.
#[derive(Debug)]
pub struct Vectorizer<W, T>
where
    W: Weighting,
    T: Tokenize,
{
    tokenizer: T,
    config: VectorizerConfig,
    vocab: Option<Vocabulary>,
    _weighting: PhantomData<W>,
}

/// Raw-count vectorizer feeding the topic model.
pub type CountVectorizer<T> = Vectorizer<CountWeighting, T>;
/// TF-IDF vectorizer feeding the classifier.
pub type TfidfVectorizer<T> = Vectorizer<TfidfWeighting, T>;

impl<W, T> Vectorizer<W, T>
where
    W: Weighting,
    T: Tokenize,
{
    pub fn new(tokenizer: T, config: VectorizerConfig) -> Self {
        Vectorizer {
            tokenizer,
            config,
            vocab: None,
            _weighting: PhantomData,
        }
    }

    /// Rehydrate a fitted vectorizer from persisted parts.
    pub fn from_parts(tokenizer: T, config: VectorizerConfig, vocab: Vocabulary) -> Self {
        Vectorizer {
            tokenizer,
            config,
            vocab: Some(vocab),
            _weighting: PhantomData,
        }
    }

    pub fn config(&self) -> &VectorizerConfig {
        &self.config
    }

    /// The fitted vocabulary, or `NotFitted`.
    pub fn vocab(&self) -> Result<&Vocabulary, PipelineError> {
        self.vocab.as_ref().ok_or(PipelineError::NotFitted)
    }

    /// Vocabulary size (feature-row width).
    pub fn dim(&self) -> Result<usize, PipelineError> {
        Ok(self.vocab()?.len())
    }

    /// Learn the vocabulary from a training corpus.
    ///
    /// Empty corpora, or corpora whose tokens are all pruned by the
    /// document-frequency thresholds, abort with `EmptyCorpus`.
    pub fn fit<S>(&mut self, corpus: &[S]) -> Result<(), PipelineError>
    where
        S: AsRef<str> + Sync,
    {
        if corpus.is_empty() {
            return Err(PipelineError::EmptyCorpus);
        }
        let token_lists: Vec<Vec<String>> = corpus
            .par_iter()
            .map(|text| self.tokenizer.tokenize(text.as_ref()))
            .collect();
        let mut builder = VocabularyBuilder::new();
        for tokens in &token_lists {
            builder.add_document(tokens);
        }
        let vocab = builder.finish(&self.config)?;
        debug!(vocab = vocab.len(), docs = corpus.len(), "vectorizer fitted");
        self.vocab = Some(vocab);
        Ok(())
    }

    /// Transform one document into a weighted feature row.
    ///
    /// A document with no known tokens yields an empty row; downstream
    /// ranking degrades to near-zero similarity rather than failing.
    pub fn transform(&self, text: &str) -> Result<SparseVec, PipelineError> {
        let vocab = self.vocab()?;
        let tokens = self.tokenizer.tokenize(text);
        Ok(W::weigh(count_row(vocab, &tokens), vocab))
    }

    /// Batch transform; row order matches input order.
    pub fn transform_corpus<S>(&self, corpus: &[S]) -> Result<Vec<SparseVec>, PipelineError>
    where
        S: AsRef<str> + Sync,
    {
        let vocab = self.vocab()?;
        Ok(corpus
            .par_iter()
            .map(|text| {
                let tokens = self.tokenizer.tokenize(text.as_ref());
                W::weigh(count_row(vocab, &tokens), vocab)
            })
            .collect())
    }
}

/// Accumulate token counts into a sorted sparse row.
fn count_row(vocab: &Vocabulary, tokens: &[String]) -> SparseVec {
    let mut counts: BTreeMap<u32, f64> = BTreeMap::new();
    for token in tokens {
        if let Some(index) = vocab.get(token) {
            *counts.entry(index).or_insert(0.0) += 1.0;
        }
    }
    SparseVec::from_sorted(counts.into_iter().collect())
}
