//! Convective term assembly.
//!
//! The convective flux `ρ·u·φ` at each face is interpolated with one of four
//! schemes. With `F⁺(x) = max(x, 0)` splitting the mass flux by direction, each
//! scheme yields neighbour weights for volume `i` from the velocities at its
//! west face `u[i-1]` and east face `u[i]`:
//!
//! | scheme              | order | stencil              |
//! |---------------------|-------|----------------------|
//! | Central difference  | 1     | W, E                 |
//! | Upwind (1st order)  | 1     | W, E                 |
//! | Upwind (2nd order)  | 2     | WW, W, E, EE         |
//! | QUICK               | 3     | WW, W, E, EE         |
//!
//! Central differencing does no flux limiting and is only stable for cell
//! Péclet numbers below 2. First-order upwind is always bounded but diffusive.
//! The wide schemes need the second-neighbour boundary closure in
//! [`CoefficientStore::apply_dirichlet`].

use crate::coefficients::{CoefficientStore, MIN_VOLUMES};
use crate::error::{Error, Result};
use crate::types::{positive, StencilWeights};
use log::{debug, warn};
use std::fmt;

/// Cell Péclet number above which central differencing loses boundedness.
pub const CENTRAL_DIFFERENCE_PECLET_LIMIT: f64 = 2.0;

/// Interpolation scheme for the convective term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdvectionScheme {
    /// Linear interpolation between neighbours.
    CentralDifference,
    /// First-order upwind.
    Upwind1,
    /// Second-order upwind.
    Upwind2,
    /// Quadratic Upstream Interpolation for Convective Kinematics.
    Quick,
}

impl AdvectionScheme {
    /// All supported schemes.
    pub const ALL: [AdvectionScheme; 4] = [
        AdvectionScheme::CentralDifference,
        AdvectionScheme::Upwind1,
        AdvectionScheme::Upwind2,
        AdvectionScheme::Quick,
    ];

    /// Nominal order of accuracy.
    pub fn order(self) -> usize {
        match self {
            AdvectionScheme::CentralDifference | AdvectionScheme::Upwind1 => 1,
            AdvectionScheme::Upwind2 => 2,
            AdvectionScheme::Quick => 3,
        }
    }

    /// Whether the stencil reaches two volumes away (aEE/aWW).
    pub fn uses_far_neighbours(self) -> bool {
        matches!(self, AdvectionScheme::Upwind2 | AdvectionScheme::Quick)
    }

    /// Neighbour weights for a volume with west face velocity `u_west` and
    /// east face velocity `u_east`.
    pub fn weights(self, density: f64, u_west: f64, u_east: f64) -> StencilWeights {
        let rho = density;
        // Mass flux entering from the west and from the east
        let in_w = positive(rho * u_west);
        let in_e = positive(-rho * u_east);

        match self {
            AdvectionScheme::CentralDifference => {
                StencilWeights::compact(-0.5 * rho * u_east, 0.5 * rho * u_west)
            }
            AdvectionScheme::Upwind1 => StencilWeights::compact(in_e, in_w),
            AdvectionScheme::Upwind2 => StencilWeights {
                east: 1.5 * in_e + 0.5 * positive(-rho * u_west),
                west: 1.5 * in_w + 0.5 * positive(rho * u_east),
                east_east: -0.5 * in_e,
                west_west: -0.5 * in_w,
            },
            AdvectionScheme::Quick => StencilWeights {
                east: -0.375 * positive(rho * u_east)
                    + 0.75 * in_e
                    + 0.125 * positive(-rho * u_west),
                west: 0.125 * positive(rho * u_east) + 0.75 * in_w
                    - 0.375 * positive(-rho * u_west),
                east_east: -0.125 * in_e,
                west_west: -0.125 * in_w,
            },
        }
    }
}

impl fmt::Display for AdvectionScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AdvectionScheme::CentralDifference => "central difference",
            AdvectionScheme::Upwind1 => "first-order upwind",
            AdvectionScheme::Upwind2 => "second-order upwind",
            AdvectionScheme::Quick => "QUICK",
        };
        f.write_str(name)
    }
}

/// Face velocities, uniform or per face.
#[derive(Debug, Clone, PartialEq)]
pub enum VelocityField {
    /// Same velocity on every face.
    Uniform(f64),
    /// One velocity per face, `volume_count - 1` entries.
    Faces(Vec<f64>),
}

impl Default for VelocityField {
    fn default() -> Self {
        VelocityField::Uniform(0.0)
    }
}

impl From<f64> for VelocityField {
    fn from(u: f64) -> Self {
        VelocityField::Uniform(u)
    }
}

impl From<Vec<f64>> for VelocityField {
    fn from(u: Vec<f64>) -> Self {
        VelocityField::Faces(u)
    }
}

impl From<&[f64]> for VelocityField {
    fn from(u: &[f64]) -> Self {
        VelocityField::Faces(u.to_vec())
    }
}

/// Assembles the convective contribution into a [`CoefficientStore`].
#[derive(Debug, Clone)]
pub struct AdvectionAssembler {
    volume_count: usize,
    density: f64,
    spacing: f64,
    velocity: Vec<f64>,
}

impl AdvectionAssembler {
    /// Create an assembler with zero velocity on every face.
    pub fn new(volume_count: usize, density: f64, spacing: f64) -> Result<Self> {
        if volume_count < MIN_VOLUMES {
            return Err(Error::InvalidSize(format!(
                "at least {} volumes are required, got {}",
                MIN_VOLUMES, volume_count
            )));
        }
        if density < 0.0 || !density.is_finite() {
            return Err(Error::InvalidParameter(format!(
                "density must be non-negative and finite, got {}",
                density
            )));
        }
        if spacing <= 0.0 || !spacing.is_finite() {
            return Err(Error::InvalidParameter(format!(
                "spacing must be positive and finite, got {}",
                spacing
            )));
        }
        Ok(Self {
            volume_count,
            density,
            spacing,
            velocity: vec![0.0; volume_count - 1],
        })
    }

    /// Set the face velocities, broadcasting a uniform value to every face.
    pub fn set_velocity(&mut self, field: impl Into<VelocityField>) -> Result<()> {
        let n_faces = self.volume_count - 1;
        let velocity = match field.into() {
            VelocityField::Uniform(u) => vec![u; n_faces],
            VelocityField::Faces(u) => {
                if u.len() != n_faces {
                    return Err(Error::InvalidSize(format!(
                        "expected {} face velocities, got {}",
                        n_faces,
                        u.len()
                    )));
                }
                u
            }
        };
        if let Some(bad) = velocity.iter().find(|u| !u.is_finite()) {
            return Err(Error::InvalidParameter(format!(
                "face velocity must be finite, got {}",
                bad
            )));
        }
        self.velocity = velocity;
        Ok(())
    }

    /// Builder-style [`set_velocity`](Self::set_velocity).
    pub fn with_velocity(mut self, field: impl Into<VelocityField>) -> Result<Self> {
        self.set_velocity(field)?;
        Ok(self)
    }

    /// Face velocities.
    pub fn velocity(&self) -> &[f64] {
        &self.velocity
    }

    pub fn density(&self) -> f64 {
        self.density
    }

    pub fn volume_count(&self) -> usize {
        self.volume_count
    }

    /// Largest cell Péclet number `ρ|u|Δx/Γ` over all faces.
    ///
    /// Infinite for a non-zero velocity with zero diffusivity.
    pub fn max_cell_peclet(&self, diffusivity: f64) -> f64 {
        let max_flux = self
            .velocity
            .iter()
            .fold(0.0_f64, |acc, u| acc.max((self.density * u).abs()));
        if max_flux == 0.0 {
            0.0
        } else if diffusivity <= 0.0 {
            f64::INFINITY
        } else {
            max_flux * self.spacing / diffusivity
        }
    }

    /// Add the convective contribution of `scheme` to every interior volume.
    ///
    /// `aP` receives the sum of the new neighbour weights plus the mass
    /// imbalance `ρ(u[i] - u[i-1])` of the volume.
    pub fn assemble(&self, scheme: AdvectionScheme, store: &mut CoefficientStore) -> Result<()> {
        let s = store.stencil_mut()?;
        if s.len() != self.volume_count {
            return Err(Error::InvalidSize(format!(
                "advection configured for {} volumes but coefficients hold {}",
                self.volume_count,
                s.len()
            )));
        }

        let rho = self.density;
        let u = &self.velocity;
        for i in s.interior() {
            let w = scheme.weights(rho, u[i - 1], u[i]);
            s.ae[i] += w.east;
            s.aw[i] += w.west;
            s.aee[i] += w.east_east;
            s.aww[i] += w.west_west;
            s.ap[i] += w.sum() + rho * (u[i] - u[i - 1]);
        }

        store.record_scheme(scheme);
        debug!(
            "assembled {} advection over {} volumes (rho = {})",
            scheme, self.volume_count, rho
        );
        Ok(())
    }

    /// [`assemble`](Self::assemble), warning when central differencing is used
    /// above its stable cell Péclet number for the given diffusivity.
    pub fn assemble_checked(
        &self,
        scheme: AdvectionScheme,
        diffusivity: f64,
        store: &mut CoefficientStore,
    ) -> Result<()> {
        if scheme == AdvectionScheme::CentralDifference {
            let pe = self.max_cell_peclet(diffusivity);
            if pe > CENTRAL_DIFFERENCE_PECLET_LIMIT {
                warn!(
                    "central difference with cell Peclet number {:.3} > {}; expect oscillations",
                    pe, CENTRAL_DIFFERENCE_PECLET_LIMIT
                );
            }
        }
        self.assemble(scheme, store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn assembled(scheme: AdvectionScheme, velocity: impl Into<VelocityField>) -> CoefficientStore {
        let mut store = CoefficientStore::allocated(6, 1.0).unwrap();
        let adv = AdvectionAssembler::new(6, 1.0, 1.0)
            .unwrap()
            .with_velocity(velocity)
            .unwrap();
        adv.assemble(scheme, &mut store).unwrap();
        store
    }

    #[test]
    fn test_upwind1_positive_flow_couples_west_only() {
        let store = assembled(AdvectionScheme::Upwind1, 1.0);
        let s = store.stencil().unwrap();
        for i in 1..5 {
            assert_relative_eq!(s.aw[i], 1.0);
            assert_relative_eq!(s.ae[i], 0.0);
            assert_relative_eq!(s.ap[i], 1.0);
        }
        // Boundary volumes untouched
        assert_eq!(s.aw[0], 0.0);
        assert_eq!(s.aw[5], 0.0);
    }

    #[test]
    fn test_upwind1_negative_flow_couples_east_only() {
        let store = assembled(AdvectionScheme::Upwind1, -2.0);
        let s = store.stencil().unwrap();
        for i in 1..5 {
            assert_relative_eq!(s.ae[i], 2.0);
            assert_relative_eq!(s.aw[i], 0.0);
        }
    }

    #[test]
    fn test_central_difference_is_conservative() {
        for u in [-3.0, 0.5, 1.0, 7.25] {
            let w = AdvectionScheme::CentralDifference.weights(1.3, u, u);
            assert_relative_eq!(w.sum(), 0.0, epsilon = 1e-14);
        }
        let store = assembled(AdvectionScheme::CentralDifference, 2.0);
        let s = store.stencil().unwrap();
        for i in 1..5 {
            assert_relative_eq!(s.ae[i], -1.0);
            assert_relative_eq!(s.aw[i], 1.0);
            assert_relative_eq!(s.ap[i], 0.0, epsilon = 1e-14);
        }
    }

    #[test]
    fn test_upwind2_positive_flow() {
        let store = assembled(AdvectionScheme::Upwind2, 1.0);
        let s = store.stencil().unwrap();
        for i in 1..5 {
            assert_relative_eq!(s.aw[i], 2.0);
            assert_relative_eq!(s.ae[i], 0.0);
            assert_relative_eq!(s.aww[i], -0.5);
            assert_relative_eq!(s.aee[i], 0.0);
            assert_relative_eq!(s.ap[i], 1.5);
        }
        assert!(store.far_neighbours_populated());
    }

    #[test]
    fn test_quick_weights_both_directions() {
        let w = AdvectionScheme::Quick.weights(1.0, 1.0, 1.0);
        assert_relative_eq!(w.east, -0.375);
        assert_relative_eq!(w.west, 0.875);
        assert_relative_eq!(w.east_east, 0.0);
        assert_relative_eq!(w.west_west, -0.125);

        let w = AdvectionScheme::Quick.weights(1.0, -1.0, -1.0);
        assert_relative_eq!(w.east, 0.875);
        assert_relative_eq!(w.west, -0.375);
        assert_relative_eq!(w.east_east, -0.125);
        assert_relative_eq!(w.west_west, 0.0);
    }

    #[test]
    fn test_mass_imbalance_enters_central_coefficient() {
        let u = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let store = assembled(AdvectionScheme::Upwind1, u.clone());
        let s = store.stencil().unwrap();
        for i in 1..5 {
            assert_relative_eq!(s.aw[i], u[i - 1]);
            assert_relative_eq!(s.ap[i], u[i - 1] + (u[i] - u[i - 1]));
        }
    }

    #[test]
    fn test_contributions_accumulate() {
        let mut store = CoefficientStore::allocated(6, 1.0).unwrap();
        let adv = AdvectionAssembler::new(6, 1.0, 1.0)
            .unwrap()
            .with_velocity(1.0)
            .unwrap();
        adv.assemble(AdvectionScheme::Upwind1, &mut store).unwrap();
        adv.assemble(AdvectionScheme::Upwind1, &mut store).unwrap();
        assert_relative_eq!(store.west_coef().unwrap()[3], 2.0);
        assert_eq!(store.scheme(), Some(AdvectionScheme::Upwind1));
    }

    #[test]
    fn test_velocity_length_mismatch() {
        let mut adv = AdvectionAssembler::new(6, 1.0, 1.0).unwrap();
        assert!(matches!(
            adv.set_velocity(vec![1.0, 2.0]),
            Err(Error::InvalidSize(_))
        ));
        assert!(adv.set_velocity(vec![0.0; 5]).is_ok());
        assert!(matches!(
            adv.set_velocity(f64::NAN),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_unallocated_and_mismatched_store() {
        let adv = AdvectionAssembler::new(6, 1.0, 1.0).unwrap();
        let mut store = CoefficientStore::new(6, 1.0).unwrap();
        assert_eq!(
            adv.assemble(AdvectionScheme::Quick, &mut store).unwrap_err(),
            Error::UnallocatedState
        );

        let mut store = CoefficientStore::allocated(8, 1.0).unwrap();
        assert!(matches!(
            adv.assemble(AdvectionScheme::Quick, &mut store),
            Err(Error::InvalidSize(_))
        ));
    }

    #[test]
    fn test_cell_peclet() {
        let adv = AdvectionAssembler::new(6, 2.0, 0.5)
            .unwrap()
            .with_velocity(vec![1.0, -3.0, 0.5, 0.0, 2.0])
            .unwrap();
        assert_relative_eq!(adv.max_cell_peclet(0.5), 6.0);
        assert!(adv.max_cell_peclet(0.0).is_infinite());

        let still = AdvectionAssembler::new(6, 2.0, 0.5).unwrap();
        assert_eq!(still.max_cell_peclet(0.0), 0.0);
    }

    #[test]
    fn test_scheme_properties() {
        assert_eq!(AdvectionScheme::Quick.order(), 3);
        assert!(!AdvectionScheme::Upwind1.uses_far_neighbours());
        assert!(AdvectionScheme::Upwind2.uses_far_neighbours());
        assert_eq!(AdvectionScheme::ALL.len(), 4);
    }
}
