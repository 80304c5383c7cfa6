//! Sparse matrix storage.
//!
//! Matrices are assembled as (row, col, value) triplets and handed to solvers
//! in CSR (Compressed Sparse Row) format.

use crate::error::{Error, Result};
use nalgebra_sparse::coo::CooMatrix;
use nalgebra_sparse::csr::CsrMatrix as NalgebraCsr;

/// Compressed Sparse Row matrix.
pub type CsrMatrix = NalgebraCsr<f64>;

/// Builder for a sparse matrix from triplets (COO format).
pub struct TripletMatrix {
    n_rows: usize,
    n_cols: usize,
    rows: Vec<usize>,
    cols: Vec<usize>,
    values: Vec<f64>,
}

impl TripletMatrix {
    /// Create a new triplet matrix builder.
    pub fn new(n_rows: usize, n_cols: usize) -> Self {
        Self::with_capacity(n_rows, n_cols, 0)
    }

    /// Create with estimated capacity.
    pub fn with_capacity(n_rows: usize, n_cols: usize, nnz_estimate: usize) -> Self {
        Self {
            n_rows,
            n_cols,
            rows: Vec::with_capacity(nnz_estimate),
            cols: Vec::with_capacity(nnz_estimate),
            values: Vec::with_capacity(nnz_estimate),
        }
    }

    /// Add a value at (row, col). Duplicates are summed during conversion,
    /// exact zeros are not stored.
    pub fn add(&mut self, row: usize, col: usize, value: f64) {
        debug_assert!(row < self.n_rows, "Row index out of bounds");
        debug_assert!(col < self.n_cols, "Column index out of bounds");

        if value != 0.0 {
            self.rows.push(row);
            self.cols.push(col);
            self.values.push(value);
        }
    }

    /// Add a row of band entries given as (column offset from the diagonal, value).
    ///
    /// Entries whose column would fall outside the matrix are skipped.
    pub fn add_band_row(&mut self, row: usize, entries: &[(isize, f64)]) {
        for &(offset, value) in entries {
            let col = row as isize + offset;
            if col >= 0 && (col as usize) < self.n_cols {
                self.add(row, col as usize, value);
            }
        }
    }

    /// Number of stored triplets.
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    /// Convert to CSR format, summing duplicate entries.
    pub fn to_csr(self) -> Result<CsrMatrix> {
        let coo = CooMatrix::try_from_triplets(
            self.n_rows,
            self.n_cols,
            self.rows,
            self.cols,
            self.values,
        )
        .map_err(|e| Error::Matrix(format!("invalid triplet data: {}", e)))?;

        Ok(CsrMatrix::from(&coo))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::DMatrix;

    #[test]
    fn test_triplet_to_csr() {
        let mut triplet = TripletMatrix::new(3, 3);
        triplet.add(0, 0, 1.0);
        triplet.add(1, 1, 2.0);
        triplet.add(2, 2, 3.0);
        triplet.add(0, 1, 0.5);
        triplet.add(1, 0, 0.5);

        let csr = triplet.to_csr().unwrap();
        assert_eq!(csr.nrows(), 3);
        assert_eq!(csr.ncols(), 3);
        assert_eq!(csr.nnz(), 5);
    }

    #[test]
    fn test_duplicate_summation() {
        let mut triplet = TripletMatrix::new(2, 2);
        triplet.add(0, 0, 1.0);
        triplet.add(0, 0, 2.0);
        triplet.add(0, 0, 3.0);

        let dense = DMatrix::from(&triplet.to_csr().unwrap());
        assert!((dense[(0, 0)] - 6.0).abs() < 1e-10);
    }

    #[test]
    fn test_zeros_not_stored() {
        let mut triplet = TripletMatrix::new(2, 2);
        triplet.add(0, 0, 0.0);
        triplet.add(1, 1, -0.0);
        assert_eq!(triplet.nnz(), 0);
    }

    #[test]
    fn test_band_row_clips_to_matrix() {
        let mut triplet = TripletMatrix::new(4, 4);
        triplet.add_band_row(0, &[(-2, 9.0), (-1, 9.0), (0, 4.0), (1, -1.0), (2, -0.5)]);
        triplet.add_band_row(3, &[(-2, -0.5), (-1, -1.0), (0, 4.0), (1, 9.0), (2, 9.0)]);

        let dense = DMatrix::from(&triplet.to_csr().unwrap());
        assert_eq!(dense[(0, 0)], 4.0);
        assert_eq!(dense[(0, 1)], -1.0);
        assert_eq!(dense[(0, 2)], -0.5);
        assert_eq!(dense[(3, 1)], -0.5);
        assert_eq!(dense[(3, 2)], -1.0);
        assert_eq!(dense[(3, 3)], 4.0);
        assert_eq!(dense.iter().filter(|&&v| v == 9.0).count(), 0);
    }
}
