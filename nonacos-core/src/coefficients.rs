//! Coefficient storage for the finite volume stencil.
//!
//! A [`CoefficientStore`] owns the six per-volume arrays every term of the
//! discretized equation accumulates into:
//!
//! ```text
//! aP·φP = aE·φE + aW·φW + aEE·φEE + aWW·φWW + Su
//! ```
//!
//! Assemblers add to the arrays, never overwrite them. Accumulation must happen
//! in a fixed order: diffusion, advection, sources, then the boundary closures
//! in this module, and only then is the store handed to
//! [`MatrixBuilder`](crate::matrix::MatrixBuilder). Boundary corrections assume
//! every other term is already in place.
//!
//! Volumes `0` and `n - 1` are zero-width boundary volumes. They are eliminated
//! by the boundary closures and never receive coefficients.

use crate::advection::AdvectionScheme;
use crate::error::{Error, Result};
use crate::types::{BoundaryCondition, Wall};
use log::debug;
use std::ops::Range;

/// Smallest number of volumes for which the two-deep stencil is well defined.
pub const MIN_VOLUMES: usize = 4;

/// The six coefficient arrays, always of identical length.
///
/// Outside the crate the arrays are reachable as slices only, so their lengths
/// cannot drift apart:
///
/// ```compile_fail
/// use nonacos_core::CoefficientStore;
///
/// let mut store = CoefficientStore::allocated(6, 1.0).unwrap();
/// store.stencil_mut().unwrap().su.truncate(3);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Stencil {
    pub(crate) ap: Vec<f64>,
    pub(crate) ae: Vec<f64>,
    pub(crate) aw: Vec<f64>,
    pub(crate) aee: Vec<f64>,
    pub(crate) aww: Vec<f64>,
    pub(crate) su: Vec<f64>,
}

impl Stencil {
    fn zeros(n: usize) -> Self {
        Self {
            ap: vec![0.0; n],
            ae: vec![0.0; n],
            aw: vec![0.0; n],
            aee: vec![0.0; n],
            aww: vec![0.0; n],
            su: vec![0.0; n],
        }
    }

    /// Number of volumes.
    pub fn len(&self) -> usize {
        self.ap.len()
    }

    /// Always false for an allocated stencil.
    pub fn is_empty(&self) -> bool {
        self.ap.is_empty()
    }

    /// Range of interior volume indices, `1..n-1`.
    pub fn interior(&self) -> Range<usize> {
        1..self.len() - 1
    }

    /// Central coefficient.
    pub fn ap(&self) -> &[f64] {
        &self.ap
    }

    /// East neighbour.
    pub fn ae(&self) -> &[f64] {
        &self.ae
    }

    /// West neighbour.
    pub fn aw(&self) -> &[f64] {
        &self.aw
    }

    /// Second east neighbour.
    pub fn aee(&self) -> &[f64] {
        &self.aee
    }

    /// Second west neighbour.
    pub fn aww(&self) -> &[f64] {
        &self.aww
    }

    /// Explicit source (right-hand side).
    pub fn su(&self) -> &[f64] {
        &self.su
    }

    pub fn ap_mut(&mut self) -> &mut [f64] {
        &mut self.ap
    }

    pub fn ae_mut(&mut self) -> &mut [f64] {
        &mut self.ae
    }

    pub fn aw_mut(&mut self) -> &mut [f64] {
        &mut self.aw
    }

    pub fn aee_mut(&mut self) -> &mut [f64] {
        &mut self.aee
    }

    pub fn aww_mut(&mut self) -> &mut [f64] {
        &mut self.aww
    }

    pub fn su_mut(&mut self) -> &mut [f64] {
        &mut self.su
    }
}

/// Per-simulation coefficient state.
///
/// Created with the mesh geometry, then sized by [`allocate`](Self::allocate).
/// Every accessor and correction returns [`Error::UnallocatedState`] until then.
#[derive(Debug, Clone)]
pub struct CoefficientStore {
    volume_count: usize,
    spacing: f64,
    stencil: Option<Stencil>,
    scheme: Option<AdvectionScheme>,
    far_populated: bool,
}

impl CoefficientStore {
    /// Create an unallocated store for the given geometry.
    pub fn new(volume_count: usize, spacing: f64) -> Result<Self> {
        check_spacing(spacing)?;
        Ok(Self {
            volume_count,
            spacing,
            stencil: None,
            scheme: None,
            far_populated: false,
        })
    }

    /// Create a store and allocate it for `volume_count` volumes.
    pub fn allocated(volume_count: usize, spacing: f64) -> Result<Self> {
        let mut store = Self::new(volume_count, spacing)?;
        store.allocate(volume_count)?;
        Ok(store)
    }

    /// (Re)initialize all six arrays to `n` zeros.
    ///
    /// Any previous contributions and the recorded advection scheme are discarded.
    pub fn allocate(&mut self, n: usize) -> Result<()> {
        if n < MIN_VOLUMES {
            return Err(Error::InvalidSize(format!(
                "at least {} volumes are required, got {}",
                MIN_VOLUMES, n
            )));
        }
        self.volume_count = n;
        self.stencil = Some(Stencil::zeros(n));
        self.scheme = None;
        self.far_populated = false;
        debug!("allocated coefficient arrays for {} volumes", n);
        Ok(())
    }

    /// Update the volume count without reallocating.
    pub fn set_volume_count(&mut self, n: usize) {
        self.volume_count = n;
    }

    /// Update the volume width without reallocating.
    pub fn set_spacing(&mut self, spacing: f64) -> Result<()> {
        check_spacing(spacing)?;
        self.spacing = spacing;
        Ok(())
    }

    pub fn volume_count(&self) -> usize {
        self.volume_count
    }

    pub fn spacing(&self) -> f64 {
        self.spacing
    }

    pub fn is_allocated(&self) -> bool {
        self.stencil.is_some()
    }

    /// Advection scheme that last accumulated into this store, if any.
    pub fn scheme(&self) -> Option<AdvectionScheme> {
        self.scheme
    }

    /// Whether a scheme reaching two neighbours away has written `aee`/`aww`.
    pub fn far_neighbours_populated(&self) -> bool {
        self.far_populated
    }

    /// All six arrays.
    pub fn stencil(&self) -> Result<&Stencil> {
        self.stencil.as_ref().ok_or(Error::UnallocatedState)
    }

    /// All six arrays, mutably.
    pub fn stencil_mut(&mut self) -> Result<&mut Stencil> {
        self.stencil.as_mut().ok_or(Error::UnallocatedState)
    }

    pub fn central_coef(&self) -> Result<&[f64]> {
        Ok(self.stencil()?.ap())
    }

    pub fn east_coef(&self) -> Result<&[f64]> {
        Ok(self.stencil()?.ae())
    }

    pub fn west_coef(&self) -> Result<&[f64]> {
        Ok(self.stencil()?.aw())
    }

    pub fn east_east_coef(&self) -> Result<&[f64]> {
        Ok(self.stencil()?.aee())
    }

    pub fn west_west_coef(&self) -> Result<&[f64]> {
        Ok(self.stencil()?.aww())
    }

    pub fn source_term(&self) -> Result<&[f64]> {
        Ok(self.stencil()?.su())
    }

    pub fn central_coef_mut(&mut self) -> Result<&mut [f64]> {
        Ok(self.stencil_mut()?.ap_mut())
    }

    pub fn east_coef_mut(&mut self) -> Result<&mut [f64]> {
        Ok(self.stencil_mut()?.ae_mut())
    }

    pub fn west_coef_mut(&mut self) -> Result<&mut [f64]> {
        Ok(self.stencil_mut()?.aw_mut())
    }

    pub fn east_east_coef_mut(&mut self) -> Result<&mut [f64]> {
        Ok(self.stencil_mut()?.aee_mut())
    }

    pub fn west_west_coef_mut(&mut self) -> Result<&mut [f64]> {
        Ok(self.stencil_mut()?.aww_mut())
    }

    pub fn source_term_mut(&mut self) -> Result<&mut [f64]> {
        Ok(self.stencil_mut()?.su_mut())
    }

    /// Record that `scheme` has accumulated into the arrays.
    pub(crate) fn record_scheme(&mut self, scheme: AdvectionScheme) {
        self.scheme = Some(scheme);
        if scheme.uses_far_neighbours() {
            self.far_populated = true;
        }
    }

    /// Check that the arrays can be closed for `scheme`.
    ///
    /// A second-order closure on arrays that never saw a second-order scheme
    /// produces wrong results without failing, so it is rejected here.
    pub fn require_closure(&self, scheme: AdvectionScheme) -> Result<()> {
        self.stencil()?;
        if scheme.uses_far_neighbours() && !self.far_populated {
            return Err(Error::SchemeMismatch(format!(
                "{} closure requested but aEE/aWW were never assembled",
                scheme
            )));
        }
        Ok(())
    }

    /// Fixed-value closure at `wall`.
    ///
    /// The boundary value and the fictitious node beyond it are eliminated: their
    /// known contributions move into `su`, and the second volume from the wall
    /// loses the coupling that reached past the wall. For compact schemes the
    /// far-neighbour terms are zero and only the adjacent volume changes.
    pub fn apply_dirichlet(&mut self, wall: Wall, value: f64) -> Result<()> {
        let s = self.stencil_mut()?;
        let n = s.len();
        let p = wall.adjacent_volume(n);
        let q = wall.second_volume(n);

        match wall {
            Wall::Left => {
                let (aw, aww) = (s.aw[p], s.aww[p]);
                s.ap[p] += aw + 3.0 * aww;
                s.su[p] += (2.0 * aw + 4.0 * aww) * value;

                let aww = s.aww[q];
                s.aw[q] -= aww;
                s.su[q] += 2.0 * aww * value;
            }
            Wall::Right => {
                let (ae, aee) = (s.ae[p], s.aee[p]);
                s.ap[p] += ae + 3.0 * aee;
                s.su[p] += (2.0 * ae + 4.0 * aee) * value;

                let aee = s.aee[q];
                s.ae[q] -= aee;
                s.su[q] += 2.0 * aee * value;
            }
        }

        debug!("applied Dirichlet {} = {} at volume {}", wall, value, p);
        Ok(())
    }

    /// Fixed-flux closure at `wall`.
    ///
    /// Removes the coupling to the boundary volume and replaces it with the
    /// known flux, scaled by the volume width.
    ///
    /// Only compact stencils can be closed this way. Once a second-order scheme
    /// has written `aee`/`aww`, the couplings that reach the boundary volume and
    /// beyond it have no fixed-flux elimination and this returns
    /// [`Error::SchemeMismatch`].
    pub fn apply_neumann(&mut self, wall: Wall, flux: f64) -> Result<()> {
        self.stencil()?;
        if self.far_populated {
            return Err(Error::SchemeMismatch(format!(
                "Neumann closure at {} cannot eliminate aEE/aWW couplings of {}",
                wall,
                self.scheme
                    .map_or_else(|| "second-order advection".to_string(), |s| s.to_string())
            )));
        }

        let spacing = self.spacing;
        let s = self.stencil_mut()?;
        let p = wall.adjacent_volume(s.len());

        match wall {
            Wall::Left => {
                let aw = s.aw[p];
                s.ap[p] -= aw;
                s.su[p] -= aw * flux * spacing;
            }
            Wall::Right => {
                let ae = s.ae[p];
                s.ap[p] -= ae;
                s.su[p] += ae * flux * spacing;
            }
        }

        debug!("applied Neumann {} flux = {} at volume {}", wall, flux, p);
        Ok(())
    }

    /// Apply either kind of boundary condition.
    pub fn apply_boundary(&mut self, wall: Wall, condition: BoundaryCondition) -> Result<()> {
        match condition {
            BoundaryCondition::Dirichlet { value } => self.apply_dirichlet(wall, value),
            BoundaryCondition::Neumann { flux } => self.apply_neumann(wall, flux),
        }
    }

    /// Uniform volumetric source: `su += q·Δx` on every interior volume.
    pub fn add_source(&mut self, q: f64) -> Result<()> {
        let dx = self.spacing;
        let s = self.stencil_mut()?;
        let range = s.interior();
        for su in &mut s.su[range] {
            *su += q * dx;
        }
        Ok(())
    }

    /// Implicit source linearization: `aP -= Sp·Δx` on every interior volume.
    pub fn add_source_linearization(&mut self, sp: f64) -> Result<()> {
        let dx = self.spacing;
        let s = self.stencil_mut()?;
        let range = s.interior();
        for ap in &mut s.ap[range] {
            *ap -= sp * dx;
        }
        Ok(())
    }
}

fn check_spacing(spacing: f64) -> Result<()> {
    if spacing <= 0.0 || !spacing.is_finite() {
        return Err(Error::InvalidParameter(format!(
            "spacing must be positive and finite, got {}",
            spacing
        )));
    }
    Ok(())
}
