//! # Background model interface
//!
//! The background analytic ionosphere (typically an IRI-type climatology) is an
//! external collaborator. It provides, for the run's date, grid and time array:
//!
//! - the layer parameters of F2, F1 and E as `T × G` matrices,
//! - the modified dip latitude of every grid point,
//! - its own density profile.
//!
//! Implementors of [`BackgroundModel`] only have to produce the
//! [`BackgroundState`]; the default [`BackgroundModel::build_profile`] builds
//! the profile with the crate's [`EdpBuilder`].
use nalgebra::DMatrix;

use crate::{
    constants::{Degree, Hour, Kilometer, Sfu},
    grid::Grid,
    irtam_errors::IrtamError,
    profile::{edp_builder::EdpBuilder, Profile},
    surface::{SurfaceField, SurfaceParameterSet},
    time::CalendarDate,
};

/// F2 layer parameters, each `T × G`.
#[derive(Debug, Clone, PartialEq)]
pub struct F2Layer {
    /// Peak density (m⁻³)
    pub nm: DMatrix<f64>,
    /// Critical frequency (MHz)
    pub fo: DMatrix<f64>,
    /// Peak height (km)
    pub hm: DMatrix<f64>,
    /// Bottomside thickness (km)
    pub b0: DMatrix<f64>,
    /// Bottomside shape
    pub b1: DMatrix<f64>,
    /// Topside thickness (km)
    pub b_top: DMatrix<f64>,
}

/// F1 layer parameters, each `T × G`. `nm` is NaN where the layer is absent.
#[derive(Debug, Clone, PartialEq)]
pub struct F1Layer {
    pub nm: DMatrix<f64>,
    pub hm: DMatrix<f64>,
    pub b_bot: DMatrix<f64>,
    /// Probability of occurrence
    pub p: DMatrix<f64>,
}

/// E layer parameters, each `T × G`.
#[derive(Debug, Clone, PartialEq)]
pub struct ELayer {
    pub nm: DMatrix<f64>,
    pub hm: DMatrix<f64>,
    pub b_bot: DMatrix<f64>,
    pub b_top: DMatrix<f64>,
}

/// Output of the background model for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct BackgroundState {
    pub f2: F2Layer,
    pub f1: F1Layer,
    pub e: ELayer,
    /// Modified dip latitude of every grid point (degrees).
    pub modip: Vec<Degree>,
}

impl BackgroundState {
    /// Check that every layer matrix is `nt × ng` and that modip has `ng` values.
    pub fn check_shape(&self, nt: usize, ng: usize) -> Result<(), IrtamError> {
        let matrices: [(&str, &DMatrix<f64>); 14] = [
            ("F2 Nm", &self.f2.nm),
            ("F2 fo", &self.f2.fo),
            ("F2 hm", &self.f2.hm),
            ("F2 B0", &self.f2.b0),
            ("F2 B1", &self.f2.b1),
            ("F2 B_top", &self.f2.b_top),
            ("F1 Nm", &self.f1.nm),
            ("F1 hm", &self.f1.hm),
            ("F1 B_bot", &self.f1.b_bot),
            ("F1 P", &self.f1.p),
            ("E Nm", &self.e.nm),
            ("E hm", &self.e.hm),
            ("E B_bot", &self.e.b_bot),
            ("E B_top", &self.e.b_top),
        ];
        for (name, m) in matrices {
            if m.shape() != (nt, ng) {
                return Err(IrtamError::BackgroundModelError(format!(
                    "{name} has shape {:?}, expected {:?}",
                    m.shape(),
                    (nt, ng)
                )));
            }
        }
        if self.modip.len() != ng {
            return Err(IrtamError::BackgroundModelError(format!(
                "modip has {} values, expected {ng}",
                self.modip.len()
            )));
        }
        Ok(())
    }

    /// The background values of the four IRTAM characteristics, all unobserved.
    pub fn surface_parameters(&self) -> SurfaceParameterSet {
        SurfaceParameterSet {
            fof2: SurfaceField::unobserved(self.f2.fo.clone()),
            hmf2: SurfaceField::unobserved(self.f2.hm.clone()),
            b0: SurfaceField::unobserved(self.f2.b0.clone()),
            b1: SurfaceField::unobserved(self.f2.b1.clone()),
        }
    }
}

/// Background analytic ionosphere model.
pub trait BackgroundModel {
    /// Layer parameters and modip for `times` hours after midnight of `date`.
    fn background(
        &self,
        date: &CalendarDate,
        grid: &Grid,
        times: &[Hour],
        f107: Sfu,
    ) -> Result<BackgroundState, IrtamError>;

    /// Density profile of a background state at `altitudes`.
    fn build_profile(
        &self,
        state: &BackgroundState,
        altitudes: &[Kilometer],
    ) -> Result<Profile, IrtamError> {
        EdpBuilder::default().build(&state.f2, &state.f1, &state.e, altitudes)
    }
}
