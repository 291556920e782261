//! # Electron density profiles
//!
//! A [`Profile`] holds the density (m⁻³) on a (time × altitude × grid point)
//! cube, stored as one `altitude × grid` matrix per time step.
//!
//! ## See also
//! ------------
//! * [`edp_builder::EdpBuilder`] – Construction from layer parameters.
//! * [`shape_functions`] – Epstein and Ramakrishnan–Rawer layer shapes.
pub mod edp_builder;
pub mod shape_functions;

use nalgebra::DMatrix;

use crate::{constants::Kilometer, irtam_errors::IrtamError};

/// Check an altitude array: non-empty, finite and strictly increasing.
pub fn validate_altitudes(altitudes: &[Kilometer]) -> Result<(), IrtamError> {
    if altitudes.is_empty() {
        return Err(IrtamError::InvalidAltitudeInput("empty altitude array".into()));
    }
    if let Some(i) = altitudes.iter().position(|h| !h.is_finite()) {
        return Err(IrtamError::InvalidAltitudeInput(format!(
            "non-finite altitude at index {i}"
        )));
    }
    if let Some(i) = altitudes.windows(2).position(|w| w[1] <= w[0]) {
        return Err(IrtamError::InvalidAltitudeInput(format!(
            "altitudes must be strictly increasing: {} then {} at index {}",
            altitudes[i],
            altitudes[i + 1],
            i + 1
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    altitudes: Vec<Kilometer>,
    slices: Vec<DMatrix<f64>>,
}

impl Profile {
    /// Assemble a profile from per-time `altitude × grid` slices.
    ///
    /// Return
    /// ------
    /// * The profile, or [`IrtamError::InvalidAltitudeInput`] if the altitudes are
    ///   invalid or a slice does not have one row per altitude, or
    ///   [`IrtamError::InvalidGridOrTimeInput`] if slices disagree on the grid size.
    pub fn new(altitudes: Vec<Kilometer>, slices: Vec<DMatrix<f64>>) -> Result<Self, IrtamError> {
        validate_altitudes(&altitudes)?;
        let ng = slices.first().map_or(0, |s| s.ncols());
        for (t, slice) in slices.iter().enumerate() {
            if slice.nrows() != altitudes.len() {
                return Err(IrtamError::InvalidAltitudeInput(format!(
                    "time step {t} has {} altitude rows, expected {}",
                    slice.nrows(),
                    altitudes.len()
                )));
            }
            if slice.ncols() != ng {
                return Err(IrtamError::InvalidGridOrTimeInput(format!(
                    "time step {t} has {} grid columns, expected {ng}",
                    slice.ncols()
                )));
            }
        }
        Ok(Profile { altitudes, slices })
    }

    pub fn altitudes(&self) -> &[Kilometer] {
        &self.altitudes
    }

    /// (time steps, altitudes, grid points)
    pub fn shape(&self) -> (usize, usize, usize) {
        let ng = self.slices.first().map_or(0, |s| s.ncols());
        (self.slices.len(), self.altitudes.len(), ng)
    }

    /// Density at time step `t` as an `altitude × grid` matrix.
    pub fn slice(&self, t: usize) -> &DMatrix<f64> {
        &self.slices[t]
    }

    pub fn slices(&self) -> &[DMatrix<f64>] {
        &self.slices
    }

    /// Density at (time step, altitude index, grid point).
    pub fn density(&self, t: usize, a: usize, g: usize) -> f64 {
        self.slices[t][(a, g)]
    }
}
