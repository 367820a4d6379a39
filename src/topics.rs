use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::PipelineError;
use crate::sparse::SparseVec;
use crate::vocab::Vocabulary;

/// Guard against division by zero in the multiplicative updates.
const EPS: f64 = 1e-10;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NmfConfig {
    /// Number of latent topics (k).
    pub n_topics: usize,
    /// Maximum multiplicative-update iterations at fit time.
    pub max_iter: usize,
    /// Relative reconstruction-error improvement below which fit stops early.
    pub tol: f64,
    /// Seed for the uniform factor initialization; fixed so repeated fits on
    /// identical input are reproducible.
    pub seed: u64,
}

impl Default for NmfConfig {
    fn default() -> Self {
        NmfConfig {
            n_topics: 8,
            max_iter: 200,
            tol: 1e-4,
            seed: 42,
        }
    }
}

/// Non-negative matrix factorization topic model.
///
/// `fit` factors the count matrix V (docs x terms) into W (docs x topics) and
/// H (topics x terms) by Lee & Seung multiplicative updates and keeps H;
/// `transform` projects new documents into the learned topic space with H
/// held fixed. Every output entry is >= 0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NmfModel {
    config: NmfConfig,
    /// Topic-term factor H, present once fitted.
    components: Option<Array2<f64>>,
}

impl NmfModel {
    pub fn new(config: NmfConfig) -> Self {
        NmfModel {
            config,
            components: None,
        }
    }

    pub fn n_topics(&self) -> usize {
        self.config.n_topics
    }

    fn components(&self) -> Result<&Array2<f64>, PipelineError> {
        self.components.as_ref().ok_or(PipelineError::NotFitted)
    }

    /// Factor a corpus of sparse count rows of width `dim`.
    ///
    /// All-zero rows are tolerated: their document-topic weights decay to
    /// zero instead of breaking the update.
    pub fn fit(&mut self, rows: &[SparseVec], dim: usize) -> Result<(), PipelineError> {
        if rows.is_empty() || dim == 0 {
            return Err(PipelineError::EmptyCorpus);
        }
        let n_docs = rows.len();
        let k = self.config.n_topics;

        let mut v = Array2::<f64>::zeros((n_docs, dim));
        for (i, row) in rows.iter().enumerate() {
            for (j, value) in row.iter() {
                v[[i, j as usize]] = value;
            }
        }

        // Uniform positive init scaled to the data magnitude, seeded for
        // reproducibility.
        let mean = v.mean().unwrap_or(0.0);
        let scale = (mean / k as f64).sqrt().max(EPS);
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut w = Array2::from_shape_fn((n_docs, k), |_| rng.random::<f64>() * scale + EPS);
        let mut h = Array2::from_shape_fn((k, dim), |_| rng.random::<f64>() * scale + EPS);

        let mut prev_err = f64::INFINITY;
        let mut iterations = self.config.max_iter;
        for iter in 0..self.config.max_iter {
            // H <- H * (W^T V) / (W^T W H)
            let wt = w.t();
            let numer = wt.dot(&v);
            let denom = wt.dot(&w).dot(&h).mapv(|x| x + EPS);
            h = &h * &numer / &denom;

            // W <- W * (V H^T) / (W H H^T)
            let ht = h.t();
            let numer = v.dot(&ht);
            let denom = w.dot(&h).dot(&ht).mapv(|x| x + EPS);
            w = &w * &numer / &denom;

            if self.config.tol > 0.0 && (iter + 1) % 10 == 0 {
                let err = reconstruction_error(&v, &w, &h);
                let improvement = (prev_err - err) / prev_err.max(EPS);
                debug!(iter = iter + 1, err, "nmf fit progress");
                if improvement.abs() < self.config.tol {
                    iterations = iter + 1;
                    break;
                }
                prev_err = err;
            }
        }
        debug!(
            docs = n_docs,
            terms = dim,
            topics = k,
            iterations,
            "nmf fitted"
        );
        self.components = Some(h);
        Ok(())
    }

    /// Project one count row into topic space, H held fixed.
    ///
    /// Solves the per-document non-negative least-squares problem by
    /// multiplicative updates on the document's topic weights; the whole
    /// corpus is not re-fit. An all-zero row yields a (near-)zero vector.
    pub fn transform(&self, row: &SparseVec) -> Result<Array1<f64>, PipelineError> {
        let h = self.components()?;
        let k = h.nrows();
        let dim = h.ncols();
        let v = Array1::from(row.to_dense(dim));

        // w <- w * (H v) / (H H^T w)
        let numer = h.dot(&v);
        let hht = h.dot(&h.t());
        let mut w = Array1::from_elem(k, 1.0 / k as f64);
        for _ in 0..self.config.max_iter {
            let denom = hht.dot(&w).mapv(|x| x + EPS);
            w = &w * &numer / &denom;
        }
        Ok(w)
    }

    /// Batch projection; row order matches input order.
    pub fn transform_corpus(&self, rows: &[SparseVec]) -> Result<Vec<Array1<f64>>, PipelineError> {
        rows.par_iter().map(|row| self.transform(row)).collect()
    }

    /// Strongest terms of one topic, for inspection. An out-of-range topic
    /// yields an empty list.
    pub fn top_terms(
        &self,
        vocab: &Vocabulary,
        topic: usize,
        n: usize,
    ) -> Result<Vec<(String, f64)>, PipelineError> {
        let h = self.components()?;
        if topic >= h.nrows() {
            return Ok(Vec::new());
        }
        let mut indexed: Vec<(usize, f64)> = h.row(topic).iter().copied().enumerate().collect();
        indexed.sort_by(|a, b| b.1.total_cmp(&a.1));
        Ok(indexed
            .into_iter()
            .take(n)
            .filter_map(|(i, weight)| {
                vocab
                    .token_at(i as u32)
                    .map(|token| (token.to_string(), weight))
            })
            .collect())
    }
}

fn reconstruction_error(v: &Array2<f64>, w: &Array2<f64>, h: &Array2<f64>) -> f64 {
    let diff = v - &w.dot(h);
    diff.iter().map(|x| x * x).sum::<f64>().sqrt()
}
