use rust_stemmers::{Algorithm, Stemmer};

/// Pluggable tokenization strategy.
///
/// Both vectorizer variants take this as a type parameter, so the same
/// normalization is guaranteed at fit time and at query time. Implementations
/// must be deterministic: the same input always yields the same sequence.
pub trait Tokenize: Send + Sync {
    fn tokenize(&self, text: &str) -> Vec<String>;
}

/// English stop words: the common Lucene set extended with pronouns.
///
/// The pronouns matter for this corpus; lemmatizing pipelines normalize them
/// to a non-alphanumeric sentinel and drop them, so "we oppose" and "I oppose"
/// must reduce to the same feature.
const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "if", "in", "into", "is", "it",
    "no", "not", "of", "on", "or", "such", "that", "the", "their", "then", "there", "these",
    "they", "this", "to", "was", "will", "with", "i", "we", "you", "he", "she", "me", "us", "him",
    "her", "them", "my", "our", "your", "his", "hers", "its", "ours", "yours", "theirs",
];

#[inline]
fn is_stop_word(token: &str) -> bool {
    // Linear scan; the set is small enough that a hash lookup would lose.
    STOP_WORDS.contains(&token)
}

/// Default tokenizer: lowercase, split on non-alphanumeric boundaries, drop
/// stop words and one-character fragments, reduce each survivor to its base
/// form with a Snowball English stemmer.
///
/// Empty input yields an empty sequence, never an error.
pub struct LemmaTokenizer {
    stemmer: Stemmer,
}

impl LemmaTokenizer {
    pub fn new() -> Self {
        LemmaTokenizer {
            stemmer: Stemmer::create(Algorithm::English),
        }
    }
}

impl Default for LemmaTokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tokenize for LemmaTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        text.to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|s| s.len() >= 2)
            .filter(|s| !is_stop_word(s))
            .map(|s| self.stemmer.stem(s).into_owned())
            .collect()
    }
}
