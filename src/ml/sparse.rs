//! Compressed sparse row matrix holding one TF-IDF vector per catalog row.

use serde::{Deserialize, Serialize};

use super::error::{ArtifactError, ArtifactResult};

const ARTIFACT: &str = "tfidf_matrix";

/// Borrowed view of one matrix row. Column indices are strictly increasing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SparseRow<'a> {
    pub indices: &'a [usize],
    pub values: &'a [f64],
}

impl SparseRow<'_> {
    /// Dot product of two rows, merging on column index
    pub fn dot(&self, other: &SparseRow<'_>) -> f64 {
        let mut sum = 0.0;
        let (mut i, mut j) = (0, 0);
        while i < self.indices.len() && j < other.indices.len() {
            match self.indices[i].cmp(&other.indices[j]) {
                std::cmp::Ordering::Equal => {
                    sum += self.values[i] * other.values[j];
                    i += 1;
                    j += 1;
                }
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
            }
        }
        sum
    }

    pub fn squared_norm(&self) -> f64 {
        self.values.iter().map(|v| v * v).sum()
    }

    pub fn nnz(&self) -> usize {
        self.indices.len()
    }
}

/// On-disk layout, the same four arrays scipy keeps for a CSR matrix
#[derive(Debug, Deserialize)]
struct RawCsr {
    shape: (usize, usize),
    indptr: Vec<usize>,
    indices: Vec<usize>,
    data: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCsr")]
pub struct CsrMatrix {
    shape: (usize, usize),
    indptr: Vec<usize>,
    indices: Vec<usize>,
    data: Vec<f64>,
}

impl TryFrom<RawCsr> for CsrMatrix {
    type Error = ArtifactError;

    fn try_from(raw: RawCsr) -> ArtifactResult<Self> {
        CsrMatrix::new(raw.shape, raw.indptr, raw.indices, raw.data)
    }
}

impl CsrMatrix {
    /// Builds a matrix from raw CSR arrays, validating the structure and
    /// sorting column indices within each row.
    pub fn new(
        shape: (usize, usize),
        indptr: Vec<usize>,
        indices: Vec<usize>,
        data: Vec<f64>,
    ) -> ArtifactResult<Self> {
        let mut matrix = Self {
            shape,
            indptr,
            indices,
            data,
        };
        matrix.validate()?;
        matrix.sort_indices()?;
        Ok(matrix)
    }

    /// Builds a matrix from per-row `(column, value)` entries
    pub fn from_rows(ncols: usize, rows: Vec<Vec<(usize, f64)>>) -> ArtifactResult<Self> {
        let mut indptr = Vec::with_capacity(rows.len() + 1);
        let mut indices = Vec::new();
        let mut data = Vec::new();
        indptr.push(0);
        let nrows = rows.len();
        for row in rows {
            for (col, value) in row {
                indices.push(col);
                data.push(value);
            }
            indptr.push(indices.len());
        }
        Self::new((nrows, ncols), indptr, indices, data)
    }

    pub fn nrows(&self) -> usize {
        self.shape.0
    }

    pub fn ncols(&self) -> usize {
        self.shape.1
    }

    pub fn nnz(&self) -> usize {
        self.data.len()
    }

    pub fn row(&self, i: usize) -> Option<SparseRow<'_>> {
        if i >= self.nrows() {
            return None;
        }
        let (start, end) = (self.indptr[i], self.indptr[i + 1]);
        Some(SparseRow {
            indices: &self.indices[start..end],
            values: &self.data[start..end],
        })
    }

    pub fn rows(&self) -> impl Iterator<Item = SparseRow<'_>> + '_ {
        self.indptr.windows(2).map(move |w| SparseRow {
            indices: &self.indices[w[0]..w[1]],
            values: &self.data[w[0]..w[1]],
        })
    }

    fn validate(&self) -> ArtifactResult<()> {
        let (nrows, ncols) = self.shape;
        if self.indptr.len().checked_sub(1) != Some(nrows) {
            return Err(ArtifactError::malformed(
                ARTIFACT,
                format!(
                    "indptr has {} entries for {} rows",
                    self.indptr.len(),
                    nrows
                ),
            ));
        }
        if self.indices.len() != self.data.len() {
            return Err(ArtifactError::malformed(
                ARTIFACT,
                format!(
                    "{} column indices but {} values",
                    self.indices.len(),
                    self.data.len()
                ),
            ));
        }
        if self.indptr[0] != 0 || self.indptr[nrows] != self.data.len() {
            return Err(ArtifactError::malformed(
                ARTIFACT,
                "indptr must start at 0 and end at nnz",
            ));
        }
        if self.indptr.windows(2).any(|w| w[0] > w[1]) {
            return Err(ArtifactError::malformed(ARTIFACT, "indptr is not monotone"));
        }
        if let Some(&col) = self.indices.iter().find(|&&c| c >= ncols) {
            return Err(ArtifactError::malformed(
                ARTIFACT,
                format!("column index {} out of range for {} columns", col, ncols),
            ));
        }
        if self.data.iter().any(|v| !v.is_finite()) {
            return Err(ArtifactError::malformed(ARTIFACT, "non-finite value"));
        }
        Ok(())
    }

    fn sort_indices(&mut self) -> ArtifactResult<()> {
        for r in 0..self.nrows() {
            let (start, end) = (self.indptr[r], self.indptr[r + 1]);
            let cols = &self.indices[start..end];
            if cols.windows(2).all(|w| w[0] < w[1]) {
                continue;
            }

            let mut entries: Vec<(usize, f64)> = cols
                .iter()
                .copied()
                .zip(self.data[start..end].iter().copied())
                .collect();
            entries.sort_by_key(|&(col, _)| col);
            if entries.windows(2).any(|w| w[0].0 == w[1].0) {
                return Err(ArtifactError::malformed(
                    ARTIFACT,
                    format!("row {} repeats a column index", r),
                ));
            }
            for (offset, (col, value)) in entries.into_iter().enumerate() {
                self.indices[start + offset] = col;
                self.data[start + offset] = value;
            }
        }
        Ok(())
    }
}
