use thiserror::Error;

/// Errors produced by the fit/transform/rank pipeline.
///
/// Query-time degenerate input (empty document, all-zero feature row) is not
/// an error: it degrades to an empty row and near-zero similarity scores.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// transform/query was called before fit. Caller bug, fails fast.
    #[error("model is not fitted yet")]
    NotFitted,

    /// The training corpus was empty, or the document-frequency thresholds
    /// eliminated every token. Fatal for the offline fit.
    #[error("training corpus is empty or produced an empty vocabulary")]
    EmptyCorpus,

    /// Texts and labels disagree in length at training time.
    #[error("label mismatch: {texts} texts but {labels} labels")]
    LabelMismatch { texts: usize, labels: usize },

    /// Model blob encode/decode failure.
    #[error("model blob codec error: {0}")]
    Codec(#[from] serde_cbor::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
