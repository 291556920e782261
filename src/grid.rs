//! Horizontal grid and time-array validation.
//!
//! A [`Grid`] is a flattened list of points; index `i` of every (time × grid)
//! product refers to `(lon[i], lat[i])`.
use serde::{Deserialize, Serialize};

use crate::{
    constants::{Degree, Hour},
    irtam_errors::IrtamError,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    lon: Vec<Degree>,
    lat: Vec<Degree>,
}

impl Grid {
    /// Build a validated grid from equal-length longitude and latitude arrays (degrees).
    ///
    /// Return
    /// ------
    /// * The grid, or [`IrtamError::InvalidGridOrTimeInput`] on a length mismatch,
    ///   an empty grid, a non-finite coordinate or a latitude outside [-90, 90].
    pub fn new(lon: Vec<Degree>, lat: Vec<Degree>) -> Result<Self, IrtamError> {
        let grid = Grid { lon, lat };
        grid.validate()?;
        Ok(grid)
    }

    /// Regular global grid, longitude varying fastest.
    ///
    /// Longitudes run from -180 to 180 and latitudes from -90 to 90, both inclusive.
    pub fn regular(dlon: Degree, dlat: Degree) -> Result<Self, IrtamError> {
        if !(dlon > 0.0 && dlat > 0.0 && dlon.is_finite() && dlat.is_finite()) {
            return Err(IrtamError::InvalidGridOrTimeInput(format!(
                "grid resolution must be positive, got {dlon} x {dlat}"
            )));
        }
        let axis = |start: f64, end: f64, step: f64| -> Vec<f64> {
            let n = ((end - start) / step + 1e-9).floor() as usize;
            (0..=n).map(|i| start + i as f64 * step).collect()
        };
        let lons = axis(-180.0, 180.0, dlon);
        let lats = axis(-90.0, 90.0, dlat);

        let mut lon = Vec::with_capacity(lons.len() * lats.len());
        let mut lat = Vec::with_capacity(lons.len() * lats.len());
        for &phi in &lats {
            for &lambda in &lons {
                lon.push(lambda);
                lat.push(phi);
            }
        }
        Grid::new(lon, lat)
    }

    pub fn validate(&self) -> Result<(), IrtamError> {
        if self.lon.len() != self.lat.len() {
            return Err(IrtamError::InvalidGridOrTimeInput(format!(
                "longitude and latitude lengths differ: {} != {}",
                self.lon.len(),
                self.lat.len()
            )));
        }
        if self.lon.is_empty() {
            return Err(IrtamError::InvalidGridOrTimeInput("empty grid".into()));
        }
        if let Some(i) = self.lon.iter().position(|v| !v.is_finite()) {
            return Err(IrtamError::InvalidGridOrTimeInput(format!(
                "non-finite longitude at index {i}"
            )));
        }
        if let Some(i) = self
            .lat
            .iter()
            .position(|v| !v.is_finite() || v.abs() > 90.0)
        {
            return Err(IrtamError::InvalidGridOrTimeInput(format!(
                "invalid latitude {} at index {i}",
                self.lat[i]
            )));
        }
        Ok(())
    }

    pub fn lon(&self) -> &[Degree] {
        &self.lon
    }

    pub fn lat(&self) -> &[Degree] {
        &self.lat
    }

    pub fn len(&self) -> usize {
        self.lon.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lon.is_empty()
    }
}

/// Check a time array of decimal UT hours: non-empty and finite.
pub fn validate_times(times: &[Hour]) -> Result<(), IrtamError> {
    if times.is_empty() {
        return Err(IrtamError::InvalidGridOrTimeInput("empty time array".into()));
    }
    if let Some(i) = times.iter().position(|t| !t.is_finite()) {
        return Err(IrtamError::InvalidGridOrTimeInput(format!(
            "non-finite time value at index {i}"
        )));
    }
    Ok(())
}
