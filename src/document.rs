use std::fmt;

use serde::{Deserialize, Serialize};

/// Binary stance of a comment toward the proposed rule change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sentiment {
    Opposed,
    Supportive,
}

impl Sentiment {
    /// Class index as used by the training data (0 = Opposed, 1 = Supportive).
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Sentiment::Opposed),
            1 => Some(Sentiment::Supportive),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Opposed => "Opposed",
            Sentiment::Supportive => "Supportive",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raw comment. Immutable once ingested.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Optional unique ID, as assigned by whatever produced the corpus.
    pub id: Option<String>,
    pub text: String,
    pub label: Option<Sentiment>,
}

impl Document {
    /// An unlabeled document.
    pub fn new(text: impl Into<String>) -> Self {
        Document {
            id: None,
            text: text.into(),
            label: None,
        }
    }

    /// A labeled document.
    pub fn labeled(text: impl Into<String>, label: Sentiment) -> Self {
        Document {
            id: None,
            text: text.into(),
            label: Some(label),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}
