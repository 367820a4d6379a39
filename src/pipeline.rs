use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::classify::{LogisticConfig, LogisticModel};
use crate::document::{Document, Sentiment};
use crate::error::PipelineError;
use crate::rank::{normalize_rows, Hits, RefEntry, SimilarityRanker};
use crate::tokenizer::Tokenize;
use crate::topics::{NmfConfig, NmfModel};
use crate::vectorizer::{CountVectorizer, TfidfVectorizer, Vectorizer};
use crate::vocab::{VectorizerConfig, Vocabulary};

/// Default number of similar comments to surface.
pub const DEFAULT_TOP_N: usize = 5;

/// Count vectorizer -> NMF -> cosine ranking against a labeled corpus.
///
/// `fit` and `index` run once offline; `find_similar` is the query path and
/// takes `&self` only, so queries may run concurrently against one fitted
/// instance.
pub struct SimilarityPipeline<T: Tokenize> {
    vectorizer: CountVectorizer<T>,
    nmf: NmfModel,
    ranker: Option<SimilarityRanker>,
}

impl<T: Tokenize> SimilarityPipeline<T> {
    pub fn new(tokenizer: T, vectorizer_config: VectorizerConfig, nmf_config: NmfConfig) -> Self {
        SimilarityPipeline {
            vectorizer: Vectorizer::new(tokenizer, vectorizer_config),
            nmf: NmfModel::new(nmf_config),
            ranker: None,
        }
    }

    /// Fit vocabulary and topic factors over the training corpus.
    pub fn fit<S>(&mut self, corpus: &[S]) -> Result<(), PipelineError>
    where
        S: AsRef<str> + Sync,
    {
        self.vectorizer.fit(corpus)?;
        let rows = self.vectorizer.transform_corpus(corpus)?;
        self.nmf.fit(&rows, self.vectorizer.dim()?)?;
        info!(docs = corpus.len(), "similarity pipeline fitted");
        Ok(())
    }

    /// Precompute unit-length topic vectors for the labeled reference corpus.
    ///
    /// Documents without a label are skipped; similarity results are only
    /// meaningful with a label attached.
    pub fn index(&mut self, labeled: &[Document]) -> Result<(), PipelineError> {
        let labeled_docs: Vec<(&str, Sentiment)> = labeled
            .iter()
            .filter_map(|doc| doc.label.map(|label| (doc.text.as_str(), label)))
            .collect();
        if labeled_docs.len() < labeled.len() {
            debug!(
                skipped = labeled.len() - labeled_docs.len(),
                "unlabeled documents skipped from reference corpus"
            );
        }
        let texts: Vec<&str> = labeled_docs.iter().map(|(text, _)| *text).collect();
        let rows = self.vectorizer.transform_corpus(&texts)?;
        let mut topic_vecs = self.nmf.transform_corpus(&rows)?;
        normalize_rows(&mut topic_vecs);

        let entries = labeled_docs
            .into_iter()
            .zip(topic_vecs)
            .map(|((text, label), vec)| RefEntry::new(text.to_string(), label, vec))
            .collect();
        self.ranker = Some(SimilarityRanker::new(entries));
        Ok(())
    }

    /// Rank the reference corpus by cosine similarity to `text` and return
    /// the `top_n` most similar labeled comments.
    ///
    /// A degenerate query (empty text, no known tokens) scores zero against
    /// everything and returns the reference corpus in its original order.
    pub fn find_similar(&self, text: &str, top_n: usize) -> Result<Hits, PipelineError> {
        let ranker = self.ranker.as_ref().ok_or(PipelineError::NotFitted)?;
        let row = self.vectorizer.transform(text)?;
        let mut query = vec![self.nmf.transform(&row)?];
        normalize_rows(&mut query);
        Ok(ranker.rank(&query[0], top_n))
    }

    /// Strongest vocabulary terms of one latent topic.
    pub fn topic_terms(&self, topic: usize, n: usize) -> Result<Vec<(String, f64)>, PipelineError> {
        self.nmf.top_terms(self.vectorizer.vocab()?, topic, n)
    }

    pub fn n_topics(&self) -> usize {
        self.nmf.n_topics()
    }

    /// Serializable snapshot, excluding the tokenizer.
    pub fn to_data(&self) -> Result<SimilarityPipelineData, PipelineError> {
        Ok(SimilarityPipelineData {
            vectorizer_config: *self.vectorizer.config(),
            vocabulary: self.vectorizer.vocab()?.clone(),
            nmf: self.nmf.clone(),
            ranker: self.ranker.clone(),
        })
    }

    /// Encode the fitted pipeline as an opaque blob.
    pub fn save(&self) -> Result<Vec<u8>, PipelineError> {
        Ok(serde_cbor::to_vec(&self.to_data()?)?)
    }

    /// Decode a blob produced by `save`, re-supplying a tokenizer equivalent
    /// to the one used at fit time.
    pub fn load(blob: &[u8], tokenizer: T) -> Result<Self, PipelineError> {
        let data: SimilarityPipelineData = serde_cbor::from_slice(blob)?;
        Ok(data.into_pipeline(tokenizer))
    }
}

/// Persisted form of `SimilarityPipeline`: everything but the tokenizer,
/// which is not serializable and is supplied again at load time.
#[derive(Serialize, Deserialize)]
pub struct SimilarityPipelineData {
    pub vectorizer_config: VectorizerConfig,
    pub vocabulary: Vocabulary,
    pub nmf: NmfModel,
    pub ranker: Option<SimilarityRanker>,
}

impl SimilarityPipelineData {
    pub fn into_pipeline<T: Tokenize>(self, tokenizer: T) -> SimilarityPipeline<T> {
        SimilarityPipeline {
            vectorizer: Vectorizer::from_parts(tokenizer, self.vectorizer_config, self.vocabulary),
            nmf: self.nmf,
            ranker: self.ranker,
        }
    }
}

/// TF-IDF vectorizer -> logistic regression sentiment classifier.
pub struct SentimentPipeline<T: Tokenize> {
    vectorizer: TfidfVectorizer<T>,
    model: LogisticModel,
}

impl<T: Tokenize> SentimentPipeline<T> {
    pub fn new(
        tokenizer: T,
        vectorizer_config: VectorizerConfig,
        logistic_config: LogisticConfig,
    ) -> Self {
        SentimentPipeline {
            vectorizer: Vectorizer::new(tokenizer, vectorizer_config),
            model: LogisticModel::new(logistic_config),
        }
    }

    /// Fit the vectorizer and classifier on a labeled training set.
    pub fn fit<S>(&mut self, texts: &[S], labels: &[Sentiment]) -> Result<(), PipelineError>
    where
        S: AsRef<str> + Sync,
    {
        if texts.len() != labels.len() {
            return Err(PipelineError::LabelMismatch {
                texts: texts.len(),
                labels: labels.len(),
            });
        }
        self.vectorizer.fit(texts)?;
        let rows = self.vectorizer.transform_corpus(texts)?;
        self.model.fit(&rows, labels, self.vectorizer.dim()?)?;
        info!(docs = texts.len(), "sentiment pipeline fitted");
        Ok(())
    }

    /// Predicted stance and confidence (the larger class probability).
    pub fn classify(&self, text: &str) -> Result<(Sentiment, f64), PipelineError> {
        let row = self.vectorizer.transform(text)?;
        self.model.predict(&row)
    }

    pub fn to_data(&self) -> Result<SentimentPipelineData, PipelineError> {
        Ok(SentimentPipelineData {
            vectorizer_config: *self.vectorizer.config(),
            vocabulary: self.vectorizer.vocab()?.clone(),
            model: self.model.clone(),
        })
    }

    pub fn save(&self) -> Result<Vec<u8>, PipelineError> {
        Ok(serde_cbor::to_vec(&self.to_data()?)?)
    }

    pub fn load(blob: &[u8], tokenizer: T) -> Result<Self, PipelineError> {
        let data: SentimentPipelineData = serde_cbor::from_slice(blob)?;
        Ok(data.into_pipeline(tokenizer))
    }
}

/// Persisted form of `SentimentPipeline`, tokenizer excluded.
#[derive(Serialize, Deserialize)]
pub struct SentimentPipelineData {
    pub vectorizer_config: VectorizerConfig,
    pub vocabulary: Vocabulary,
    pub model: LogisticModel,
}

impl SentimentPipelineData {
    pub fn into_pipeline<T: Tokenize>(self, tokenizer: T) -> SentimentPipeline<T> {
        SentimentPipeline {
            vectorizer: Vectorizer::from_parts(tokenizer, self.vectorizer_config, self.vocabulary),
            model: self.model,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::LemmaTokenizer;

    fn loose() -> VectorizerConfig {
        VectorizerConfig {
            max_df: 1.0,
            min_df: 1,
        }
    }

    fn small_nmf(k: usize) -> NmfConfig {
        NmfConfig {
            n_topics: k,
            ..NmfConfig::default()
        }
    }

    fn wetlands_pipeline() -> SimilarityPipeline<LemmaTokenizer> {
        let corpus = [
            "clean water is important",
            "we oppose this regulation",
            "protect our wetlands",
        ];
        let labeled = vec![
            Document::labeled(corpus[0], Sentiment::Supportive),
            Document::labeled(corpus[1], Sentiment::Opposed),
            Document::labeled(corpus[2], Sentiment::Supportive),
        ];
        let mut pipeline = SimilarityPipeline::new(LemmaTokenizer::new(), loose(), small_nmf(3));
        pipeline.fit(&corpus).unwrap();
        pipeline.index(&labeled).unwrap();
        pipeline
    }

    #[test]
    fn find_similar_before_fit_fails_fast() {
        let pipeline = SimilarityPipeline::new(LemmaTokenizer::new(), loose(), small_nmf(2));
        assert!(matches!(
            pipeline.find_similar("wetlands", 5),
            Err(PipelineError::NotFitted)
        ));
    }

    #[test]
    fn query_surfaces_matching_supportive_comment() {
        let pipeline = wetlands_pipeline();
        let hits = pipeline.find_similar("we must protect wetlands", 5).unwrap();

        // top_n beyond the corpus returns the whole corpus, sorted
        assert_eq!(hits.len(), 3);
        for window in hits.list.windows(2) {
            assert!(window[0].score >= window[1].score);
        }
        // the shared-vocabulary supportive comment dominates
        assert_eq!(hits.list[0].text, "protect our wetlands");
        assert_eq!(hits.list[0].label, Sentiment::Supportive);
        assert!(hits.list[0].score > 0.9);
        // the opposing comment shares no terms with the query
        let opposed = hits
            .iter()
            .find(|h| h.label == Sentiment::Opposed)
            .unwrap();
        assert!(opposed.score < 0.2);
        // cosine under non-negative unit vectors stays in [0, 1]
        for hit in hits.iter() {
            assert!(hit.score >= -1e-9 && hit.score <= 1.0 + 1e-9);
        }
    }

    #[test]
    fn empty_query_is_degenerate_not_an_error() {
        let pipeline = wetlands_pipeline();
        let hits = pipeline.find_similar("", 5).unwrap();
        assert_eq!(hits.len(), 3);
        assert!(hits.iter().all(|h| h.score == 0.0));
        // zero scores everywhere: corpus order preserved
        assert_eq!(hits.list[0].text, "clean water is important");
        assert_eq!(hits.list[2].text, "protect our wetlands");
    }

    #[test]
    fn top_n_truncates_results() {
        let pipeline = wetlands_pipeline();
        let hits = pipeline.find_similar("protect wetlands", 1).unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn unlabeled_documents_are_skipped_from_reference() {
        let corpus = ["clean water", "dirty air", "protect wetlands"];
        let mut pipeline = SimilarityPipeline::new(LemmaTokenizer::new(), loose(), small_nmf(2));
        pipeline.fit(&corpus).unwrap();
        pipeline
            .index(&[
                Document::labeled("clean water", Sentiment::Supportive),
                Document::new("dirty air"),
            ])
            .unwrap();
        let hits = pipeline.find_similar("clean water", 5).unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn similarity_blob_roundtrip_preserves_results() {
        let pipeline = wetlands_pipeline();
        let blob = pipeline.save().unwrap();
        let restored =
            SimilarityPipeline::load(&blob, LemmaTokenizer::new()).unwrap();

        let query = "we must protect wetlands";
        let before = pipeline.find_similar(query, 5).unwrap();
        let after = restored.find_similar(query, 5).unwrap();
        assert_eq!(before.len(), after.len());
        for (a, b) in before.iter().zip(after.iter()) {
            assert_eq!(a.text, b.text);
            assert_eq!(a.label, b.label);
            assert!((a.score - b.score).abs() < 1e-12);
        }
    }

    #[test]
    fn topic_terms_come_from_vocabulary() {
        let pipeline = wetlands_pipeline();
        let vocab = ["clean", "import", "oppos", "protect", "regul", "water", "wetland"];
        for topic in 0..pipeline.n_topics() {
            for (term, weight) in pipeline.topic_terms(topic, 3).unwrap() {
                assert!(vocab.contains(&term.as_str()), "unexpected term {term}");
                assert!(weight >= 0.0);
            }
        }
    }

    fn sentiment_training() -> (Vec<&'static str>, Vec<Sentiment>) {
        let texts = vec![
            "I support clean water and protecting wetlands",
            "clean water is vital, we support the protections",
            "protect wetlands and waterways for clean water",
            "we support strong clean water protections",
            "I oppose this burdensome regulation and overreach",
            "this regulation is government overreach, we oppose it",
            "oppose the burdensome rule, regulation hurts farms",
            "we oppose the overreach of this burdensome regulation",
        ];
        let labels = vec![
            Sentiment::Supportive,
            Sentiment::Supportive,
            Sentiment::Supportive,
            Sentiment::Supportive,
            Sentiment::Opposed,
            Sentiment::Opposed,
            Sentiment::Opposed,
            Sentiment::Opposed,
        ];
        (texts, labels)
    }

    #[test]
    fn sentiment_pipeline_classifies_held_out_text() {
        let (texts, labels) = sentiment_training();
        let mut pipeline =
            SentimentPipeline::new(LemmaTokenizer::new(), loose(), LogisticConfig::default());
        pipeline.fit(&texts, &labels).unwrap();

        let (label, confidence) = pipeline
            .classify("please protect our clean water and wetlands")
            .unwrap();
        assert_eq!(label, Sentiment::Supportive);
        assert!(confidence > 0.5 && confidence <= 1.0);

        let (label, confidence) = pipeline
            .classify("this is burdensome overreach and I oppose it")
            .unwrap();
        assert_eq!(label, Sentiment::Opposed);
        assert!(confidence > 0.5 && confidence <= 1.0);
    }

    #[test]
    fn sentiment_label_mismatch_rejected() {
        let (texts, _) = sentiment_training();
        let mut pipeline =
            SentimentPipeline::new(LemmaTokenizer::new(), loose(), LogisticConfig::default());
        assert!(matches!(
            pipeline.fit(&texts, &[Sentiment::Opposed]),
            Err(PipelineError::LabelMismatch { .. })
        ));
    }

    #[test]
    fn sentiment_blob_roundtrip_preserves_prediction() {
        let (texts, labels) = sentiment_training();
        let mut pipeline =
            SentimentPipeline::new(LemmaTokenizer::new(), loose(), LogisticConfig::default());
        pipeline.fit(&texts, &labels).unwrap();

        let blob = pipeline.save().unwrap();
        let restored = SentimentPipeline::load(&blob, LemmaTokenizer::new()).unwrap();

        let text = "we support protecting clean water";
        let (label_a, conf_a) = pipeline.classify(text).unwrap();
        let (label_b, conf_b) = restored.classify(text).unwrap();
        assert_eq!(label_a, label_b);
        assert!((conf_a - conf_b).abs() < 1e-12);
    }

    #[test]
    fn classify_before_fit_fails_fast() {
        let pipeline =
            SentimentPipeline::new(LemmaTokenizer::new(), loose(), LogisticConfig::default());
        assert!(matches!(
            pipeline.classify("clean water"),
            Err(PipelineError::NotFitted)
        ));
    }
}
