//! NoNacos Core - Numerical Objects for Natural Convection Systems
//!
//! Finite volume discretization of the 1D advection-diffusion equation:
//! - Coefficient storage with Dirichlet and Neumann boundary closures
//! - Constant-diffusivity diffusion stencil
//! - Advection stencils: central difference, first/second-order upwind, QUICK
//! - Banded sparse matrix construction (CSR format)
//!
//! # Architecture
//!
//! Every simulation owns one [`CoefficientStore`]. Assemblers add their
//! contributions to it in a fixed order, boundary closures finish the edges and
//! [`MatrixBuilder`] reads the result:
//!
//! ```text
//! Mesh1D -> CoefficientStore::allocate
//!        -> DiffusionAssembler -> AdvectionAssembler -> sources
//!        -> apply_dirichlet / apply_neumann
//!        -> MatrixBuilder -> (CsrMatrix, rhs) -> external solver
//! ```
//!
//! [`TransportProblem`] runs the whole pipeline from a [`TransportConfig`].
//!
//! # Example
//!
//! ```
//! use nonacos_core::{
//!     AdvectionAssembler, AdvectionScheme, CoefficientStore, DiffusionAssembler,
//!     MatrixBuilder, Wall,
//! };
//!
//! let (n, dx) = (8, 0.1);
//! let mut coef = CoefficientStore::allocated(n, dx)?;
//! DiffusionAssembler::new(n, 0.1, dx)?.assemble(&mut coef)?;
//! AdvectionAssembler::new(n, 1.0, dx)?
//!     .with_velocity(1.0)?
//!     .assemble(AdvectionScheme::Upwind2, &mut coef)?;
//! coef.apply_dirichlet(Wall::Left, 1.0)?;
//! coef.apply_dirichlet(Wall::Right, 0.0)?;
//!
//! let builder = MatrixBuilder::new(n)?;
//! let a = builder.build(&coef)?;
//! let b = builder.rhs(&coef)?;
//! assert_eq!(a.nrows(), 6);
//! assert_eq!(b.len(), 6);
//! # Ok::<(), nonacos_core::Error>(())
//! ```

pub mod types;
pub mod mesh;
pub mod coefficients;
pub mod diffusion;
pub mod advection;
pub mod sparse;
pub mod matrix;
pub mod problem;
pub mod error;

pub use types::{BoundaryCondition, StencilWeights, Wall};
pub use mesh::Mesh1D;
pub use coefficients::{CoefficientStore, Stencil};
pub use diffusion::DiffusionAssembler;
pub use advection::{AdvectionAssembler, AdvectionScheme, VelocityField};
pub use sparse::CsrMatrix;
pub use matrix::MatrixBuilder;
pub use problem::{assemble_batch, AssembledSystem, TransportConfig, TransportProblem};
pub use error::{Error, Result};
