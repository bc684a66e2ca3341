use ndarray::{Array2, ArrayView2};

use crate::{GcnErr, Result};

/// A square sparse matrix in compressed sparse row layout. Column indices are sorted within
/// every row and never repeated.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseMatrix {
    n: usize,
    indptr: Vec<usize>,
    indices: Vec<usize>,
    values: Vec<f32>,
}

impl SparseMatrix {
    /// Creates a new `SparseMatrix` from one list of `(column, value)` entries per row.
    ///
    /// # Arguments
    /// * `rows` - The entries of each row, in any order, without repeated columns.
    ///
    /// # Returns
    /// The matrix, or an error if a column is out of range or repeated within a row.
    pub fn from_rows(rows: Vec<Vec<(usize, f32)>>) -> Result<Self> {
        let n = rows.len();
        let mut indptr = Vec::with_capacity(n + 1);
        let mut indices = Vec::new();
        let mut values = Vec::new();
        indptr.push(0);

        for (i, mut row) in rows.into_iter().enumerate() {
            row.sort_by_key(|&(j, _)| j);

            for (k, &(j, v)) in row.iter().enumerate() {
                if j >= n {
                    return Err(GcnErr::SizeMismatch {
                        what: "sparse column",
                        got: j,
                        expected: n,
                    });
                }
                if k > 0 && row[k - 1].0 == j {
                    return Err(GcnErr::DuplicateEntry { row: i, column: j });
                }

                indices.push(j);
                values.push(v);
            }

            indptr.push(indices.len());
        }

        Ok(Self {
            n,
            indptr,
            indices,
            values,
        })
    }

    /// Returns the amount of rows (and columns).
    pub fn nrows(&self) -> usize {
        self.n
    }

    /// Returns the amount of stored entries.
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Iterates the stored `(column, value)` entries of row `i`.
    pub fn row(&self, i: usize) -> impl Iterator<Item = (usize, f32)> + '_ {
        let span = self.indptr[i]..self.indptr[i + 1];
        self.indices[span.clone()]
            .iter()
            .copied()
            .zip(self.values[span].iter().copied())
    }

    /// Returns the value at `(i, j)`, zero when the entry is not stored.
    pub fn get(&self, i: usize, j: usize) -> f32 {
        let span = self.indptr[i]..self.indptr[i + 1];
        match self.indices[span.clone()].binary_search(&j) {
            Ok(k) => self.values[span.start + k],
            Err(_) => 0.0,
        }
    }

    /// Returns the sum of every row.
    pub fn row_sums(&self) -> Vec<f32> {
        (0..self.n).map(|i| self.row(i).map(|(_, v)| v).sum()).collect()
    }

    /// Whether `A[i][j] == A[j][i]` holds for every stored entry.
    pub fn is_symmetric(&self) -> bool {
        (0..self.n).all(|i| self.row(i).all(|(j, v)| self.get(j, i) == v))
    }

    /// Returns a matrix with the same sparsity pattern and every entry `(i, j)` replaced by
    /// `f(i, j, value)`.
    pub fn map_entries<F>(&self, mut f: F) -> Self
    where
        F: FnMut(usize, usize, f32) -> f32,
    {
        let mut values = Vec::with_capacity(self.values.len());

        for i in 0..self.n {
            values.extend(self.row(i).map(|(j, v)| f(i, j, v)));
        }

        Self {
            values,
            ..self.clone()
        }
    }

    /// Multiplies this matrix by a dense one, `self · x`.
    ///
    /// # Returns
    /// The dense product or a `SizeMismatch` if `x` doesn't have one row per column of `self`.
    pub fn dot(&self, x: ArrayView2<f32>) -> Result<Array2<f32>> {
        if x.nrows() != self.n {
            return Err(GcnErr::SizeMismatch {
                what: "sparse product rows",
                got: x.nrows(),
                expected: self.n,
            });
        }

        let mut out = Array2::zeros((self.n, x.ncols()));

        for (i, mut out_row) in out.outer_iter_mut().enumerate() {
            for (j, v) in self.row(i) {
                out_row.scaled_add(v, &x.row(j));
            }
        }

        Ok(out)
    }

    /// Expands this matrix into a dense one.
    pub fn to_dense(&self) -> Array2<f32> {
        let mut dense = Array2::zeros((self.n, self.n));

        for i in 0..self.n {
            for (j, v) in self.row(i) {
                dense[[i, j]] = v;
            }
        }

        dense
    }
}
