//! Diffusive term assembly.
//!
//! Central-difference discretization of `∂/∂x(Γ ∂φ/∂x)` for a constant
//! diffusivity Γ on a uniform mesh.

use crate::coefficients::{CoefficientStore, MIN_VOLUMES};
use crate::error::{Error, Result};
use log::debug;

/// Assembles the diffusive contribution into a [`CoefficientStore`].
#[derive(Debug, Clone, PartialEq)]
pub struct DiffusionAssembler {
    volume_count: usize,
    diffusivity: f64,
    spacing: f64,
}

impl DiffusionAssembler {
    /// Create a diffusion assembler.
    ///
    /// # Errors
    ///
    /// Returns an error for fewer than 4 volumes, a negative or non-finite
    /// diffusivity, or a non-positive spacing.
    pub fn new(volume_count: usize, diffusivity: f64, spacing: f64) -> Result<Self> {
        if volume_count < MIN_VOLUMES {
            return Err(Error::InvalidSize(format!(
                "at least {} volumes are required, got {}",
                MIN_VOLUMES, volume_count
            )));
        }
        if diffusivity < 0.0 || !diffusivity.is_finite() {
            return Err(Error::InvalidParameter(format!(
                "diffusivity must be non-negative and finite, got {}",
                diffusivity
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
            diffusivity,
            spacing,
        })
    }

    pub fn diffusivity(&self) -> f64 {
        self.diffusivity
    }

    /// Face conductance `Γ/Δx`.
    pub fn conductance(&self) -> f64 {
        self.diffusivity / self.spacing
    }

    /// Add `Γ/Δx` to `aE` and `aW`, then `aE + aW` to `aP`, on every interior volume.
    pub fn assemble(&self, store: &mut CoefficientStore) -> Result<()> {
        let s = store.stencil_mut()?;
        if s.len() != self.volume_count {
            return Err(Error::InvalidSize(format!(
                "diffusion configured for {} volumes but coefficients hold {}",
                self.volume_count,
                s.len()
            )));
        }

        let d = self.conductance();
        for i in s.interior() {
            s.ae[i] += d;
            s.aw[i] += d;
            s.ap[i] += s.ae[i] + s.aw[i];
        }

        debug!(
            "assembled diffusion over {} volumes (gamma/dx = {})",
            self.volume_count, d
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_unit_diffusion_stencil() {
        let mut store = CoefficientStore::allocated(6, 1.0).unwrap();
        DiffusionAssembler::new(6, 1.0, 1.0)
            .unwrap()
            .assemble(&mut store)
            .unwrap();

        let s = store.stencil().unwrap();
        assert_eq!(s.ae, vec![0.0, 1.0, 1.0, 1.0, 1.0, 0.0]);
        assert_eq!(s.aw, vec![0.0, 1.0, 1.0, 1.0, 1.0, 0.0]);
        assert_eq!(s.ap, vec![0.0, 2.0, 2.0, 2.0, 2.0, 0.0]);
        assert!(s.aee.iter().chain(s.aww.iter()).all(|&v| v == 0.0));
    }

    #[test]
    fn test_conductance_scaling() {
        let mut store = CoefficientStore::allocated(6, 0.25).unwrap();
        let diff = DiffusionAssembler::new(6, 1.0, 0.25).unwrap();
        assert_relative_eq!(diff.conductance(), 4.0);
        diff.assemble(&mut store).unwrap();
        assert_relative_eq!(store.central_coef().unwrap()[3], 8.0);
    }

    #[test]
    fn test_central_uses_accumulated_neighbours() {
        // aP picks up the full aE + aW, including earlier contributions.
        let mut store = CoefficientStore::allocated(5, 1.0).unwrap();
        store.east_coef_mut().unwrap()[2] = 0.5;
        DiffusionAssembler::new(5, 2.0, 1.0)
            .unwrap()
            .assemble(&mut store)
            .unwrap();
        assert_relative_eq!(store.central_coef().unwrap()[2], 4.5);
        assert_relative_eq!(store.central_coef().unwrap()[1], 4.0);
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(matches!(
            DiffusionAssembler::new(3, 1.0, 1.0),
            Err(Error::InvalidSize(_))
        ));
        assert!(DiffusionAssembler::new(6, -1.0, 1.0).is_err());
        assert!(DiffusionAssembler::new(6, 1.0, 0.0).is_err());
    }

    #[test]
    fn test_unallocated_store() {
        let mut store = CoefficientStore::new(6, 1.0).unwrap();
        let diff = DiffusionAssembler::new(6, 1.0, 1.0).unwrap();
        assert_eq!(diff.assemble(&mut store).unwrap_err(), Error::UnallocatedState);
    }
}
