//! Core value types for the 1D finite volume stencil.
//!
//! This module defines the small types shared by the assemblers:
//! - Domain walls and the boundary conditions imposed on them
//! - Per-volume stencil weights produced by an interpolation scheme

use std::fmt;

/// One of the two ends of the 1D domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Wall {
    /// x = 0, next to volume 1.
    Left,
    /// x = L, next to volume n-2.
    Right,
}

impl Wall {
    /// Index of the first interior volume adjacent to this wall.
    pub(crate) fn adjacent_volume(self, volume_count: usize) -> usize {
        match self {
            Wall::Left => 1,
            Wall::Right => volume_count - 2,
        }
    }

    /// Index of the second interior volume away from this wall.
    pub(crate) fn second_volume(self, volume_count: usize) -> usize {
        match self {
            Wall::Left => 2,
            Wall::Right => volume_count - 3,
        }
    }
}

impl fmt::Display for Wall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Wall::Left => write!(f, "LEFT_WALL"),
            Wall::Right => write!(f, "RIGHT_WALL"),
        }
    }
}

/// Boundary condition imposed at a wall.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoundaryCondition {
    /// Fixed value of the transported quantity.
    Dirichlet { value: f64 },
    /// Fixed gradient (flux per unit diffusivity) across the wall.
    Neumann { flux: f64 },
}

impl BoundaryCondition {
    /// Fixed-value condition.
    pub fn dirichlet(value: f64) -> Self {
        Self::Dirichlet { value }
    }

    /// Fixed-flux condition.
    pub fn neumann(flux: f64) -> Self {
        Self::Neumann { flux }
    }
}

impl Default for BoundaryCondition {
    fn default() -> Self {
        Self::Dirichlet { value: 0.0 }
    }
}

/// Neighbour coefficients contributed to a single volume by one term.
///
/// `east_east` and `west_west` are only non-zero for schemes that reach two
/// volumes upstream.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StencilWeights {
    pub east: f64,
    pub west: f64,
    pub east_east: f64,
    pub west_west: f64,
}

impl StencilWeights {
    /// Weights for a compact (nearest-neighbour) stencil.
    pub fn compact(east: f64, west: f64) -> Self {
        Self {
            east,
            west,
            east_east: 0.0,
            west_west: 0.0,
        }
    }

    /// Sum of all neighbour weights.
    ///
    /// This is the amount added to the central coefficient, before any mass
    /// imbalance correction.
    pub fn sum(&self) -> f64 {
        self.east + self.west + self.east_east + self.west_west
    }
}

/// Positive part, `max(x, 0)`.
#[inline]
pub fn positive(x: f64) -> f64 {
    x.max(0.0)
}
