/// This crate is a similarity ranking and sentiment analysis engine for
/// public docket comments.
///
/// Two components are fit once over a training corpus (offline): a
/// vocabulary-based vectorizer and an NMF topic model. At query time a new
/// comment runs through the same fitted vectorizer -> topic model ->
/// normalize -> cosine ranking path against a precomputed labeled corpus,
/// and a TF-IDF + logistic-regression pipeline classifies its stance.
pub mod classify;
pub mod document;
pub mod error;
pub mod pipeline;
pub mod rank;
pub mod sparse;
pub mod tokenizer;
pub mod topics;
pub mod vectorizer;
pub mod vocab;

/// Similarity pipeline
/// Count vectorizer -> NMF topic model -> cosine ranking against a labeled
/// reference corpus. Fit once offline; the query path (`find_similar`) is
/// read-only and safe to call concurrently.
///
/// # Serialization
/// Supported via `save`/`load`. The tokenizer is not part of the blob and is
/// supplied again at load time; `SimilarityPipelineData` is the serializable
/// form.
pub use pipeline::{SimilarityPipeline, SimilarityPipelineData};

/// Sentiment pipeline
/// TF-IDF vectorizer -> binary logistic regression. `classify` returns the
/// predicted stance and its confidence.
///
/// # Serialization
/// Supported via `save`/`load`, same tokenizer convention as the similarity
/// pipeline.
pub use pipeline::{SentimentPipeline, SentimentPipelineData};

/// Pluggable tokenization strategy and its default implementation:
/// lowercase, split on non-alphanumeric boundaries, stop-word filter,
/// Snowball stemming. Both vectorizer variants take a `Tokenize`
/// implementation as a type parameter so fit-time and query-time
/// normalization cannot diverge.
pub use tokenizer::{LemmaTokenizer, Tokenize};

/// Documents and their binary stance label (0 = Opposed, 1 = Supportive).
pub use document::{Document, Sentiment};

/// Ranked similarity results: `Hits` holds the descending-by-score list,
/// `Hit` one entry (comment text, cosine score, label).
pub use rank::{Hit, Hits};

/// Error type shared by the whole pipeline. Usage errors (`NotFitted`) and
/// fatal training errors (`EmptyCorpus`) are distinct from degenerate
/// query-time input, which never errors.
pub use error::PipelineError;
