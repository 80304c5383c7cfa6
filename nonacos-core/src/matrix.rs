//! Banded matrix construction from the finalized stencil.
//!
//! Only interior volumes are unknowns. Row `i` of the matrix belongs to volume
//! `i + 1`; the boundary volumes `0` and `n - 1` were eliminated by the
//! boundary closures.
//!
//! ```text
//! 0     1     2     3     4     5  <-- volumes
//! o--|--x--|--x--|--x--|--x--|--o
//!       0     1     2     3        <-- unknowns
//!
//! Γ = 1, Δx = 0.25, Dirichlet on both walls:
//!
//!      0   1   2   3
//! 0 [ 12  -4   0   0 ]
//! 1 [ -4   8  -4   0 ]
//! 2 [  0  -4   8  -4 ]
//! 3 [  0   0  -4  12 ]
//! ```
//!
//! Interior rows carry the full 5-point band. The first and last two rows drop
//! the couplings that reach into the eliminated boundary volumes.

use crate::coefficients::{CoefficientStore, Stencil};
use crate::error::{Error, Result};
use crate::sparse::{CsrMatrix, TripletMatrix};
use log::{debug, trace};
use nalgebra::DMatrix;

/// Half-bandwidth of the assembled matrix.
pub const BANDWIDTH: usize = 2;

/// Smallest matrix order for which the boundary rows do not overlap.
pub const MIN_UNKNOWNS: usize = 4;

/// Writes finalized coefficients into an `N×N` banded matrix, `N = volume_count - 2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatrixBuilder {
    n: usize,
}

impl MatrixBuilder {
    /// Create a builder for a mesh of `volume_count` volumes.
    pub fn new(volume_count: usize) -> Result<Self> {
        let n = volume_count.saturating_sub(2);
        if n < MIN_UNKNOWNS {
            return Err(Error::InvalidSize(format!(
                "matrix needs at least {} unknowns ({} volumes), got {} volumes",
                MIN_UNKNOWNS,
                MIN_UNKNOWNS + 2,
                volume_count
            )));
        }
        Ok(Self { n })
    }

    /// Matrix order (number of interior unknowns).
    pub fn order(&self) -> usize {
        self.n
    }

    fn checked_stencil<'a>(&self, store: &'a CoefficientStore) -> Result<&'a Stencil> {
        let s = store.stencil()?;
        if s.len() != self.n + 2 {
            return Err(Error::InvalidSize(format!(
                "matrix of order {} needs {} volumes, coefficients hold {}",
                self.n,
                self.n + 2,
                s.len()
            )));
        }
        Ok(s)
    }

    /// Assemble the sparse system matrix.
    pub fn build(&self, store: &CoefficientStore) -> Result<CsrMatrix> {
        let s = self.checked_stencil(store)?;
        let n = self.n;
        let mut triplet = TripletMatrix::with_capacity(n, n, n * (2 * BANDWIDTH + 1));

        // First unknown: its west couplings were folded into aP and Su.
        triplet.add_band_row(0, &[(0, s.ap[1]), (1, -s.ae[1]), (2, -s.aee[1])]);
        // Second unknown: aWW reaches the boundary volume and was moved to Su.
        triplet.add_band_row(
            1,
            &[(-1, -s.aw[2]), (0, s.ap[2]), (1, -s.ae[2]), (2, -s.aee[2])],
        );

        for i in 2..n - 2 {
            let v = i + 1;
            trace!("row {} <- volume {}", i, v);
            triplet.add_band_row(
                i,
                &[
                    (-2, -s.aww[v]),
                    (-1, -s.aw[v]),
                    (0, s.ap[v]),
                    (1, -s.ae[v]),
                    (2, -s.aee[v]),
                ],
            );
        }

        // Mirror of rows 0 and 1 at the east wall.
        triplet.add_band_row(
            n - 2,
            &[
                (-2, -s.aww[n - 1]),
                (-1, -s.aw[n - 1]),
                (0, s.ap[n - 1]),
                (1, -s.ae[n - 1]),
            ],
        );
        triplet.add_band_row(n - 1, &[(-2, -s.aww[n]), (-1, -s.aw[n]), (0, s.ap[n])]);

        debug!("built {}x{} banded matrix with {} entries", n, n, triplet.nnz());
        triplet.to_csr()
    }

    /// Assemble the system matrix in dense form.
    pub fn build_dense(&self, store: &CoefficientStore) -> Result<DMatrix<f64>> {
        Ok(DMatrix::from(&self.build(store)?))
    }

    /// Right-hand side for the interior unknowns, `Su[1..=N]`.
    pub fn rhs(&self, store: &CoefficientStore) -> Result<Vec<f64>> {
        let s = self.checked_stencil(store)?;
        Ok(s.su[1..=self.n].to_vec())
    }
}
