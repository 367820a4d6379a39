use serde::{Deserialize, Serialize};

/// Sparse feature row: (column index, value) pairs sorted by index.
///
/// Rows are produced by the vectorizer and consumed by the topic model and
/// the classifier. An empty row is the well-defined result of a degenerate
/// document, not an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseVec {
    entries: Vec<(u32, f64)>,
}

impl SparseVec {
    pub fn new() -> Self {
        SparseVec::default()
    }

    /// Build from pairs already sorted by index, no duplicates.
    pub fn from_sorted(entries: Vec<(u32, f64)>) -> Self {
        debug_assert!(entries.windows(2).all(|w| w[0].0 < w[1].0));
        SparseVec { entries }
    }

    /// Number of stored (non-zero) entries.
    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.entries.iter().copied()
    }

    /// Largest stored column index.
    pub fn max_index(&self) -> Option<u32> {
        self.entries.last().map(|&(i, _)| i)
    }

    /// Dot product against a dense weight slice. Indices past the end of the
    /// slice contribute nothing.
    pub fn dot_dense(&self, dense: &[f64]) -> f64 {
        self.entries
            .iter()
            .filter_map(|&(i, v)| dense.get(i as usize).map(|w| v * w))
            .sum()
    }

    pub fn l2_norm(&self) -> f64 {
        self.entries
            .iter()
            .map(|&(_, v)| v * v)
            .sum::<f64>()
            .sqrt()
    }

    pub fn scale(&mut self, factor: f64) {
        for (_, v) in &mut self.entries {
            *v *= factor;
        }
    }

    /// Rewrite each stored value in place.
    pub fn map_values<F>(&mut self, mut f: F)
    where
        F: FnMut(u32, f64) -> f64,
    {
        for (i, v) in &mut self.entries {
            *v = f(*i, *v);
        }
    }

    /// Expand to a dense row of the given width. Indices beyond `dim` are
    /// ignored (they cannot occur for rows produced against a fit vocabulary).
    pub fn to_dense(&self, dim: usize) -> Vec<f64> {
        let mut dense = vec![0.0; dim];
        for &(i, v) in &self.entries {
            if let Some(slot) = dense.get_mut(i as usize) {
                *slot = v;
            }
        }
        dense
    }
}
