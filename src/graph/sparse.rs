use num_traits::Float;
use std::fmt::Debug;

use crate::error::{KspError, Result};

/// Row-major compressed sparse matrix.
///
/// The entries of row `r` are stored in `columns[offsets[r]..offsets[r + 1]]`
/// and `values[offsets[r]..offsets[r + 1]]`, sorted by column.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseMatrix<T> {
    column_count: usize,
    offsets: Vec<usize>,
    columns: Vec<usize>,
    values: Vec<T>,
}

impl<T: Float + Debug> SparseMatrix<T> {
    /// Builds a matrix from `(row, column, value)` triplets in any order.
    ///
    /// # Errors
    /// * `MalformedModel` if an index is out of range, a value is not finite
    ///   or a position is given twice
    pub fn from_triplets<I>(rows: usize, columns: usize, entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (usize, usize, T)>,
    {
        let mut builder = SparseMatrixBuilder::new(rows, columns);
        for (r, c, v) in entries {
            builder.add_entry(r, c, v);
        }
        builder.build()
    }

    /// Builds a matrix from dense rows, skipping zero entries.
    pub fn from_dense(rows: &[Vec<T>]) -> Result<Self> {
        let columns = rows.first().map_or(0, |r| r.len());
        if let Some(r) = rows.iter().position(|r| r.len() != columns) {
            return Err(KspError::malformed(format!(
                "row {} has {} columns, expected {}",
                r,
                rows[r].len(),
                columns
            )));
        }
        Self::from_triplets(
            rows.len(),
            columns,
            rows.iter().enumerate().flat_map(|(r, row)| {
                row.iter()
                    .enumerate()
                    .filter(|(_, v)| !v.is_zero())
                    .map(move |(c, &v)| (r, c, v))
            }),
        )
    }

    pub fn row_count(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn column_count(&self) -> usize {
        self.column_count
    }

    pub fn entry_count(&self) -> usize {
        self.values.len()
    }

    pub fn is_square(&self) -> bool {
        self.row_count() == self.column_count
    }

    /// Iterates over the `(column, value)` pairs of a row in column order.
    /// An out-of-range row is empty.
    pub fn row(&self, row: usize) -> impl Iterator<Item = (usize, T)> + '_ {
        let (start, end) = match (self.offsets.get(row), self.offsets.get(row + 1)) {
            (Some(&s), Some(&e)) => (s, e),
            _ => (0, 0),
        };
        self.columns[start..end]
            .iter()
            .copied()
            .zip(self.values[start..end].iter().copied())
    }

    pub fn get(&self, row: usize, column: usize) -> Option<T> {
        self.row(row).find(|&(c, _)| c == column).map(|(_, v)| v)
    }
}

/// Collects entries before compressing them into a [`SparseMatrix`].
#[derive(Debug, Clone)]
pub struct SparseMatrixBuilder<T> {
    rows: usize,
    columns: usize,
    entries: Vec<(usize, usize, T)>,
}

impl<T: Float + Debug> SparseMatrixBuilder<T> {
    pub fn new(rows: usize, columns: usize) -> Self {
        SparseMatrixBuilder {
            rows,
            columns,
            entries: Vec::new(),
        }
    }

    pub fn add_entry(&mut self, row: usize, column: usize, value: T) -> &mut Self {
        self.entries.push((row, column, value));
        self
    }

    pub fn build(&self) -> Result<SparseMatrix<T>> {
        let mut entries = self.entries.clone();
        for &(r, c, v) in &entries {
            if r >= self.rows || c >= self.columns {
                return Err(KspError::malformed(format!(
                    "entry ({}, {}) outside a {}x{} matrix",
                    r, c, self.rows, self.columns
                )));
            }
            if !v.is_finite() {
                return Err(KspError::malformed(format!(
                    "entry ({}, {}) is not finite: {:?}",
                    r, c, v
                )));
            }
        }
        entries.sort_by_key(|&(r, c, _)| (r, c));
        if let Some(w) = entries
            .windows(2)
            .find(|w| (w[0].0, w[0].1) == (w[1].0, w[1].1))
        {
            return Err(KspError::malformed(format!(
                "entry ({}, {}) given twice",
                w[0].0, w[0].1
            )));
        }

        let mut offsets = vec![0usize; self.rows + 1];
        for &(r, _, _) in &entries {
            offsets[r + 1] += 1;
        }
        for i in 1..=self.rows {
            offsets[i] += offsets[i - 1];
        }

        Ok(SparseMatrix {
            column_count: self.columns,
            offsets,
            columns: entries.iter().map(|&(_, c, _)| c).collect(),
            values: entries.iter().map(|&(_, _, v)| v).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_are_sorted_by_column() {
        let m = SparseMatrix::from_triplets(3, 3, vec![(0, 2, 0.5), (0, 1, 0.5), (2, 2, 1.0)])
            .unwrap();
        assert_eq!(m.row_count(), 3);
        assert_eq!(m.entry_count(), 3);
        assert_eq!(m.row(0).collect::<Vec<_>>(), vec![(1, 0.5), (2, 0.5)]);
        assert_eq!(m.row(1).count(), 0);
        assert_eq!(m.row(7).count(), 0);
        assert_eq!(m.get(2, 2), Some(1.0));
        assert_eq!(m.get(1, 2), None);
    }

    #[test]
    fn test_from_dense_skips_zeros() {
        let m = SparseMatrix::from_dense(&[vec![0.0, 1.0], vec![0.25, 0.75]]).unwrap();
        assert!(m.is_square());
        assert_eq!(m.entry_count(), 3);
        assert_eq!(m.row(0).collect::<Vec<_>>(), vec![(1, 1.0)]);
    }

    #[test]
    fn test_from_dense_ragged() {
        let result = SparseMatrix::from_dense(&[vec![1.0, 0.0], vec![1.0]]);
        assert!(matches!(result, Err(KspError::MalformedModel(_))));
    }

    #[test]
    fn test_invalid_entries() {
        let out_of_range = SparseMatrix::from_triplets(2, 2, vec![(0, 2, 1.0)]);
        assert!(matches!(out_of_range, Err(KspError::MalformedModel(_))));

        let duplicate = SparseMatrix::from_triplets(2, 2, vec![(0, 1, 0.5), (0, 1, 0.5)]);
        assert!(matches!(duplicate, Err(KspError::MalformedModel(_))));

        let nan = SparseMatrix::from_triplets(2, 2, vec![(1, 1, f64::NAN)]);
        assert!(matches!(nan, Err(KspError::MalformedModel(_))));
    }

    #[test]
    fn test_builder() {
        let mut builder = SparseMatrixBuilder::new(2, 2);
        builder.add_entry(1, 0, 1.0f32).add_entry(0, 0, 1.0);
        let m = builder.build().unwrap();
        assert_eq!(m.get(1, 0), Some(1.0));
        assert_eq!(m.get(0, 0), Some(1.0));
    }
}
