//! Modified dip latitude (modip).
//!
//! The harmonic expansion uses modip μ, defined from the magnetic inclination
//! I and the geographic latitude φ by `tan μ = I / √cos φ` (Rawer, 1963).
//! Background models normally provide μ from a full geomagnetic field model;
//! [`dipole_modip`] is a centered-dipole approximation for callers without one.
use serde::{Deserialize, Serialize};

use crate::constants::{Degree, Radian, RADEG};

/// North geomagnetic pole of a centered dipole.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeomagneticPole {
    pub lat: Degree,
    pub lon: Degree,
}

impl Default for GeomagneticPole {
    /// IGRF-13 dipole pole at epoch 2020.
    fn default() -> Self {
        GeomagneticPole {
            lat: 80.65,
            lon: -72.68,
        }
    }
}

/// Modip from the inclination `inclination` (radians) at geographic latitude `lat` (degrees).
///
/// Written with `atan2` so that cos φ = 0 at the poles yields ±90°.
pub fn modified_dip(inclination: Radian, lat: Degree) -> Degree {
    let cos_phi = (lat * RADEG).cos().max(0.0);
    inclination.atan2(cos_phi.sqrt()) / RADEG
}

/// Inclination of a centered dipole field at (lon, lat), in radians.
pub fn dipole_inclination(lon: Degree, lat: Degree, pole: &GeomagneticPole) -> Radian {
    let (phi, lambda) = (lat * RADEG, lon * RADEG);
    let (phi_p, lambda_p) = (pole.lat * RADEG, pole.lon * RADEG);

    let sin_mlat = (phi.sin() * phi_p.sin() + phi.cos() * phi_p.cos() * (lambda - lambda_p).cos())
        .clamp(-1.0, 1.0);
    let cos_mlat = (1.0 - sin_mlat * sin_mlat).sqrt();

    (2.0 * sin_mlat).atan2(cos_mlat)
}

/// Modip of every grid point under a centered dipole field.
pub fn dipole_modip(lon: &[Degree], lat: &[Degree], pole: &GeomagneticPole) -> Vec<Degree> {
    lon.iter()
        .zip(lat)
        .map(|(&lon, &lat)| modified_dip(dipole_inclination(lon, lat, pole), lat))
        .collect()
}
