use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::document::Sentiment;
use crate::error::PipelineError;
use crate::sparse::SparseVec;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LogisticConfig {
    /// Inverse regularization strength; larger means weaker L2 penalty.
    pub c: f64,
    pub learning_rate: f64,
    pub epochs: usize,
}

impl Default for LogisticConfig {
    fn default() -> Self {
        LogisticConfig {
            c: 5.0,
            learning_rate: 0.5,
            epochs: 500,
        }
    }
}

/// Binary logistic-regression classifier over TF-IDF rows.
///
/// Trained by deterministic full-batch gradient descent (no shuffling, no
/// stochastic init), so refitting identical input reproduces the weights.
/// Predicts the probability of `Sentiment::Supportive`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticModel {
    config: LogisticConfig,
    weights: Option<Vec<f64>>,
    bias: f64,
}

impl LogisticModel {
    pub fn new(config: LogisticConfig) -> Self {
        LogisticModel {
            config,
            weights: None,
            bias: 0.0,
        }
    }

    /// Fit on feature rows of width `dim` with parallel labels.
    pub fn fit(
        &mut self,
        rows: &[SparseVec],
        labels: &[Sentiment],
        dim: usize,
    ) -> Result<(), PipelineError> {
        if rows.is_empty() || dim == 0 {
            return Err(PipelineError::EmptyCorpus);
        }
        if rows.len() != labels.len() {
            return Err(PipelineError::LabelMismatch {
                texts: rows.len(),
                labels: labels.len(),
            });
        }
        let n = rows.len() as f64;
        let targets: Vec<f64> = labels
            .iter()
            .map(|label| match label {
                Sentiment::Opposed => 0.0,
                Sentiment::Supportive => 1.0,
            })
            .collect();
        let lambda = 1.0 / (self.config.c * n);
        let lr = self.config.learning_rate;

        let mut weights = vec![0.0; dim];
        let mut bias = 0.0;
        for epoch in 0..self.config.epochs {
            let mut grad_w = vec![0.0; dim];
            let mut grad_b = 0.0;
            let mut loss = 0.0;
            for (row, &target) in rows.iter().zip(&targets) {
                let p = sigmoid(bias + row.dot_dense(&weights));
                let err = p - target;
                for (index, value) in row.iter() {
                    grad_w[index as usize] += err * value;
                }
                grad_b += err;
                // clamped log-loss, for progress logging only
                let p = p.clamp(1e-12, 1.0 - 1e-12);
                loss -= target * p.ln() + (1.0 - target) * (1.0 - p).ln();
            }
            for (w, g) in weights.iter_mut().zip(&grad_w) {
                *w -= lr * (g / n + lambda * *w);
            }
            bias -= lr * grad_b / n;
            if epoch % 100 == 0 {
                debug!(epoch, loss = loss / n, "logistic fit progress");
            }
        }
        self.weights = Some(weights);
        self.bias = bias;
        Ok(())
    }

    /// Probability that the document is `Supportive`.
    pub fn predict_proba(&self, row: &SparseVec) -> Result<f64, PipelineError> {
        let weights = self.weights.as_ref().ok_or(PipelineError::NotFitted)?;
        Ok(sigmoid(self.bias + row.dot_dense(weights)))
    }

    /// Predicted label with its confidence (the larger class probability).
    pub fn predict(&self, row: &SparseVec) -> Result<(Sentiment, f64), PipelineError> {
        let p = self.predict_proba(row)?;
        if p >= 0.5 {
            Ok((Sentiment::Supportive, p))
        } else {
            Ok((Sentiment::Opposed, 1.0 - p))
        }
    }
}

#[inline]
fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}
