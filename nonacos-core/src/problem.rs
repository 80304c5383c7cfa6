//! End-to-end assembly of a 1D transport problem.
//!
//! Runs every stage in the order the coefficient contract requires:
//! 1. Diffusion
//! 2. Advection (optional)
//! 3. Volumetric sources
//! 4. Boundary closures
//! 5. Matrix and right-hand side
//!
//! Each problem owns its own [`CoefficientStore`], so independent problems can
//! be assembled in parallel with [`assemble_batch`].

use crate::advection::{AdvectionAssembler, AdvectionScheme, VelocityField};
use crate::coefficients::CoefficientStore;
use crate::diffusion::DiffusionAssembler;
use crate::error::{Error, Result};
use crate::matrix::MatrixBuilder;
use crate::mesh::Mesh1D;
use crate::sparse::CsrMatrix;
use crate::types::{BoundaryCondition, Wall};
use log::debug;
use rayon::prelude::*;

/// Physical and numerical parameters of a transport problem.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportConfig {
    /// Diffusivity Γ.
    pub diffusivity: f64,
    /// Density ρ.
    pub density: f64,
    /// Face velocities.
    pub velocity: VelocityField,
    /// Advection scheme; `None` for pure diffusion.
    pub scheme: Option<AdvectionScheme>,
    /// Uniform volumetric source q.
    pub source: f64,
    /// Implicit source coefficient Sp.
    pub source_linearization: f64,
    /// Condition at x = 0.
    pub left: BoundaryCondition,
    /// Condition at x = L.
    pub right: BoundaryCondition,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            diffusivity: 1.0,
            density: 1.0,
            velocity: VelocityField::default(),
            scheme: None,
            source: 0.0,
            source_linearization: 0.0,
            left: BoundaryCondition::default(),
            right: BoundaryCondition::default(),
        }
    }
}

impl TransportConfig {
    /// Check that all parameters are physically meaningful.
    pub fn validate(&self) -> Result<()> {
        if self.diffusivity < 0.0 || !self.diffusivity.is_finite() {
            return Err(Error::InvalidParameter(format!(
                "diffusivity must be non-negative and finite, got {}",
                self.diffusivity
            )));
        }
        if self.density < 0.0 || !self.density.is_finite() {
            return Err(Error::InvalidParameter(format!(
                "density must be non-negative and finite, got {}",
                self.density
            )));
        }
        if !self.source.is_finite() || !self.source_linearization.is_finite() {
            return Err(Error::InvalidParameter("source terms must be finite".into()));
        }
        for (wall, bc) in [(Wall::Left, self.left), (Wall::Right, self.right)] {
            let v = match bc {
                BoundaryCondition::Dirichlet { value } => value,
                BoundaryCondition::Neumann { flux } => flux,
            };
            if !v.is_finite() {
                return Err(Error::InvalidParameter(format!(
                    "{} boundary value must be finite",
                    wall
                )));
            }
        }
        Ok(())
    }
}

/// Assembled system ready for a linear solver.
#[derive(Debug, Clone)]
pub struct AssembledSystem {
    /// Final coefficients, for explicit drivers that work on the stencil directly.
    pub coefficients: CoefficientStore,
    /// System matrix over the interior unknowns.
    pub matrix: CsrMatrix,
    /// Right-hand side; entry `i` belongs to volume `i + 1`.
    pub rhs: Vec<f64>,
    /// Number of unknowns.
    pub n_unknowns: usize,
}

/// A mesh together with the parameters of the equation solved on it.
#[derive(Debug, Clone)]
pub struct TransportProblem {
    mesh: Mesh1D,
    config: TransportConfig,
    builder: MatrixBuilder,
}

impl TransportProblem {
    /// Validate `config` against `mesh`.
    ///
    /// Second-order schemes can only be closed by fixed-value walls, so a
    /// Neumann wall combined with one is rejected with [`Error::SchemeMismatch`].
    pub fn new(mesh: Mesh1D, config: TransportConfig) -> Result<Self> {
        config.validate()?;
        let builder = MatrixBuilder::new(mesh.volumes())?;
        if let Some(scheme) = config.scheme.filter(|s| s.uses_far_neighbours()) {
            for (wall, bc) in [(Wall::Left, config.left), (Wall::Right, config.right)] {
                if matches!(bc, BoundaryCondition::Neumann { .. }) {
                    return Err(Error::SchemeMismatch(format!(
                        "{} needs a fixed-value closure, {} is a Neumann wall",
                        scheme, wall
                    )));
                }
            }
        }
        if let VelocityField::Faces(u) = &config.velocity {
            if u.len() != mesh.volumes() - 1 {
                return Err(Error::InvalidSize(format!(
                    "mesh has {} faces, velocity field has {}",
                    mesh.volumes() - 1,
                    u.len()
                )));
            }
        }
        Ok(Self {
            mesh,
            config,
            builder,
        })
    }

    pub fn mesh(&self) -> &Mesh1D {
        &self.mesh
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Run stages 1-4 and return the closed coefficients.
    pub fn coefficients(&self) -> Result<CoefficientStore> {
        let cfg = &self.config;
        let n = self.mesh.volumes();
        let dx = self.mesh.delta();

        let mut store = CoefficientStore::allocated(n, dx)?;

        DiffusionAssembler::new(n, cfg.diffusivity, dx)?.assemble(&mut store)?;

        if let Some(scheme) = cfg.scheme {
            AdvectionAssembler::new(n, cfg.density, dx)?
                .with_velocity(cfg.velocity.clone())?
                .assemble_checked(scheme, cfg.diffusivity, &mut store)?;
        }

        if cfg.source != 0.0 {
            store.add_source(cfg.source)?;
        }
        if cfg.source_linearization != 0.0 {
            store.add_source_linearization(cfg.source_linearization)?;
        }

        store.apply_boundary(Wall::Left, cfg.left)?;
        store.apply_boundary(Wall::Right, cfg.right)?;
        Ok(store)
    }

    /// Assemble the full linear system.
    pub fn assemble(&self) -> Result<AssembledSystem> {
        let coefficients = self.coefficients()?;
        let matrix = self.builder.build(&coefficients)?;
        let rhs = self.builder.rhs(&coefficients)?;
        debug!(
            "assembled transport problem: {} unknowns, scheme {:?}",
            self.builder.order(),
            self.config.scheme
        );
        Ok(AssembledSystem {
            coefficients,
            matrix,
            rhs,
            n_unknowns: self.builder.order(),
        })
    }
}

/// Assemble independent problems in parallel.
///
/// Results are returned in input order.
pub fn assemble_batch(problems: &[TransportProblem]) -> Vec<Result<AssembledSystem>> {
    problems.par_iter().map(TransportProblem::assemble).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::DMatrix;

    #[test]
    fn test_default_problem_is_pure_diffusion() {
        let mesh = Mesh1D::uniform(5, 1.0).unwrap();
        let system = TransportProblem::new(mesh, TransportConfig::default())
            .unwrap()
            .assemble()
            .unwrap();

        assert_eq!(system.n_unknowns, 4);
        let a = DMatrix::from(&system.matrix);
        assert_relative_eq!(a[(0, 0)], 12.0, epsilon = 1e-12);
        assert_relative_eq!(a[(1, 1)], 8.0, epsilon = 1e-12);
        assert_relative_eq!(a[(0, 1)], -4.0, epsilon = 1e-12);
        assert!(system.rhs.iter().all(|&b| b == 0.0));
        assert_eq!(system.coefficients.scheme(), None);
    }

    #[test]
    fn test_sources_and_boundaries_reach_rhs() {
        let mesh = Mesh1D::uniform(5, 1.0).unwrap();
        let config = TransportConfig {
            source: 100.0,
            left: BoundaryCondition::dirichlet(2.0),
            right: BoundaryCondition::dirichlet(1.0),
            ..Default::default()
        };
        let system = TransportProblem::new(mesh, config).unwrap().assemble().unwrap();
        // q·Δx = 25, wall terms 2·(Γ/Δx)·φb
        assert_relative_eq!(system.rhs[0], 25.0 + 16.0, epsilon = 1e-12);
        assert_relative_eq!(system.rhs[1], 25.0, epsilon = 1e-12);
        assert_relative_eq!(system.rhs[3], 25.0 + 8.0, epsilon = 1e-12);
    }

    #[test]
    fn test_batch_matches_sequential() {
        let problems: Vec<TransportProblem> = AdvectionScheme::ALL
            .iter()
            .map(|&scheme| {
                let config = TransportConfig {
                    diffusivity: 0.1,
                    velocity: VelocityField::Uniform(1.0),
                    scheme: Some(scheme),
                    left: BoundaryCondition::dirichlet(1.0),
                    ..Default::default()
                };
                TransportProblem::new(Mesh1D::uniform(12, 1.0).unwrap(), config).unwrap()
            })
            .collect();

        let batch = assemble_batch(&problems);
        assert_eq!(batch.len(), problems.len());
        for (problem, result) in problems.iter().zip(batch) {
            let parallel = result.unwrap();
            let sequential = problem.assemble().unwrap();
            assert_eq!(parallel.rhs, sequential.rhs);
            assert_eq!(
                DMatrix::from(&parallel.matrix),
                DMatrix::from(&sequential.matrix)
            );
            assert_eq!(parallel.coefficients.scheme(), problem.config().scheme);
        }
    }

    #[test]
    fn test_rejects_invalid_config() {
        let mesh = Mesh1D::uniform(8, 1.0).unwrap();
        let config = TransportConfig {
            diffusivity: -1.0,
            ..Default::default()
        };
        assert!(matches!(
            TransportProblem::new(mesh.clone(), config),
            Err(Error::InvalidParameter(_))
        ));

        let config = TransportConfig {
            right: BoundaryCondition::neumann(f64::NAN),
            ..Default::default()
        };
        assert!(TransportProblem::new(mesh.clone(), config).is_err());

        let config = TransportConfig {
            velocity: VelocityField::Faces(vec![1.0; 3]),
            scheme: Some(AdvectionScheme::Upwind1),
            ..Default::default()
        };
        assert!(matches!(
            TransportProblem::new(mesh, config),
            Err(Error::InvalidSize(_))
        ));
    }

    #[test]
    fn test_neumann_wall_with_wide_scheme_is_rejected() {
        for scheme in AdvectionScheme::ALL {
            for (left, right) in [
                (BoundaryCondition::neumann(0.0), BoundaryCondition::dirichlet(1.5)),
                (BoundaryCondition::dirichlet(1.5), BoundaryCondition::neumann(0.0)),
            ] {
                let config = TransportConfig {
                    velocity: VelocityField::Uniform(1.0),
                    scheme: Some(scheme),
                    left,
                    right,
                    ..Default::default()
                };
                let result = TransportProblem::new(Mesh1D::uniform(21, 1.0).unwrap(), config);
                if scheme.uses_far_neighbours() {
                    assert!(matches!(result, Err(Error::SchemeMismatch(_))));
                } else {
                    assert!(result.unwrap().assemble().is_ok());
                }
            }
        }
    }

    #[test]
    fn test_mesh_too_coarse_for_matrix() {
        // 4 faces -> 5 volumes -> 3 unknowns
        let mesh = Mesh1D::uniform(4, 1.0).unwrap();
        assert!(matches!(
            TransportProblem::new(mesh, TransportConfig::default()),
            Err(Error::InvalidSize(_))
        ));
    }
}
