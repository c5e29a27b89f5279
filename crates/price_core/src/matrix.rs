//! Sparse row-major feature matrix
//!
//! One-hot output is almost entirely zeros, so each row stores only its
//! non-zero `(column, value)` entries, sorted by column index.

/// Row-major sparse matrix of encoded features
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureMatrix {
    n_cols: usize,
    rows: Vec<Vec<(usize, f64)>>,
}

impl FeatureMatrix {
    pub fn new(n_cols: usize) -> Self {
        Self {
            n_cols,
            rows: Vec::new(),
        }
    }

    /// Build from dense rows, dropping zeros.
    pub fn from_dense(n_cols: usize, dense: &[Vec<f64>]) -> Self {
        let mut matrix = Self::new(n_cols);
        for row in dense {
            matrix.push_row(
                row.iter()
                    .enumerate()
                    .filter(|(_, v)| **v != 0.0)
                    .map(|(c, &v)| (c, v))
                    .collect(),
            );
        }
        matrix
    }

    /// Append a row. Entries are sorted by column; out-of-range columns are dropped.
    pub fn push_row(&mut self, mut entries: Vec<(usize, f64)>) {
        entries.retain(|&(c, _)| c < self.n_cols);
        entries.sort_by_key(|&(c, _)| c);
        self.rows.push(entries);
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, idx: usize) -> &[(usize, f64)] {
        &self.rows[idx]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[(usize, f64)]> {
        self.rows.iter().map(Vec::as_slice)
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        sparse_value(&self.rows[row], col)
    }

    /// Total stored entries
    pub fn nnz(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }
}

/// Value of `col` in a sorted sparse row (zero when absent).
pub fn sparse_value(row: &[(usize, f64)], col: usize) -> f64 {
    row.binary_search_by_key(&col, |&(c, _)| c)
        .map(|idx| row[idx].1)
        .unwrap_or(0.0)
}
