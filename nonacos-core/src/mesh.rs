//! Uniform 1D finite volume mesh.
//!
//! Faces ("nodes") are evenly spaced over `[0, L]`. Every pair of adjacent faces
//! bounds one interior control volume, and each wall carries a zero-width
//! boundary volume:
//!
//! ```text
//! 0     1     2     3     4     5     <-- volumes
//! o--|--x--|--x--|--x--|--x--|--o
//!    0     1     2     3     4        <-- faces (nodes)
//! ```

use crate::error::{Error, Result};

/// Uniform 1D mesh of `nodes` faces over a domain of given length.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh1D {
    nodes: usize,
    length: f64,
    delta: f64,
}

impl Mesh1D {
    /// Create a uniform mesh.
    ///
    /// # Errors
    ///
    /// Returns an error for fewer than 3 faces (the two-deep stencil needs at
    /// least 4 volumes) or a non-positive length.
    pub fn uniform(nodes: usize, length: f64) -> Result<Self> {
        if nodes < 3 {
            return Err(Error::Mesh(format!(
                "at least 3 nodes are required, got {}",
                nodes
            )));
        }
        if length <= 0.0 || !length.is_finite() {
            return Err(Error::Mesh(format!(
                "domain length must be positive and finite, got {}",
                length
            )));
        }
        Ok(Self {
            nodes,
            length,
            delta: length / (nodes - 1) as f64,
        })
    }

    /// Number of faces.
    pub fn nodes(&self) -> usize {
        self.nodes
    }

    /// Number of control volumes, including the two boundary volumes.
    pub fn volumes(&self) -> usize {
        self.nodes + 1
    }

    /// Number of interior volumes (the unknowns of the linear system).
    pub fn interior_volumes(&self) -> usize {
        self.nodes - 1
    }

    /// Domain length.
    pub fn length(&self) -> f64 {
        self.length
    }

    /// Uniform width of an interior volume.
    pub fn delta(&self) -> f64 {
        self.delta
    }

    /// Volume-centre coordinates, with the boundary volumes sitting on the walls.
    pub fn centroids(&self) -> Vec<f64> {
        let mut x = Vec::with_capacity(self.volumes());
        x.push(0.0);
        x.extend((1..self.nodes).map(|i| (i as f64 - 0.5) * self.delta));
        x.push(self.length);
        x
    }
}
