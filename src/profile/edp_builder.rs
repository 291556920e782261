//! # Electron density profile builder
//!
//! Builds vertical profiles from E, F1 and F2 layer parameters:
//!
//! - F2 topside: Epstein layer with height-dependent thickness,
//! - F2 bottomside: Ramakrishnan & Rawer function of (NmF2, hmF2, B0, B1),
//! - E and F1: Epstein layers, blended between the E peak and the next peak
//!   above with quartic drop-off factors.
//!
//! Densities at or below 1 m⁻³ are floored to 1.
//!
//! [`EdpBuilder::merge_layers`] derives the F2/F1 parameters that depend on the
//! reconciled characteristics (NmF2 from foF2, hmF1 on the new bottomside,
//! B_F1_bot, optionally the F2 topside thickness).
use itertools::iproduct;
use log::debug;
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::{
    background::{BackgroundState, ELayer, F1Layer, F2Layer},
    constants::{Kilometer, MegaHertz, Sfu, FREQ_TO_NM},
    irtam_errors::IrtamError,
    profile::{
        shape_functions::{epstein, epstein_top, ramakrishnan_rawer},
        validate_altitudes, Profile,
    },
    surface::SurfaceParameterSet,
};

/// Replacement for non-positive F1 bottomside thickness (km).
const DEFAULT_B_F1_BOT: Kilometer = 10.0;
/// Replacement for non-positive F2 topside thickness (km).
const DEFAULT_B_F2_TOP: Kilometer = 30.0;
/// Height resolution of [`find_hmf1`] (km).
const HMF1_TOLERANCE: Kilometer = 1e-6;

/// Peak density (m⁻³) of a layer with critical frequency `fo` (MHz).
///
/// Non-positive results become 1.
pub fn freq_to_nm(fo: MegaHertz) -> f64 {
    let nm = FREQ_TO_NM * fo * fo;
    if nm <= 0.0 {
        1.0
    } else {
        nm
    }
}

/// Effective sunspot number from the F10.7 solar flux.
pub fn f107_to_r12(f107: Sfu) -> f64 {
    ((167273.0 + (f107 - 63.7) * 1123.6).sqrt() - 408.99).max(0.0)
}

/// F2 topside thickness (km) recomputed from foF2, hmF2, B0 and F10.7.
///
/// B0 stands in for the Epstein bottomside thickness of the topside formula.
pub fn f2_top_thickness(
    fo_f2: MegaHertz,
    hm_f2: Kilometer,
    b0: Kilometer,
    f107: Sfu,
) -> Kilometer {
    let r12 = f107_to_r12(f107);
    let k = 3.22 - 0.0538 * fo_f2 - 0.00664 * hm_f2 + 0.113 * hm_f2 / b0 + 0.00257 * r12;
    let x = (k * b0 - 150.0) / 100.0;
    (100.0 * x + 150.0) / (0.041163 * x * x - 0.183981 * x + 1.424472)
}

/// Height of the F1 peak on a Ramakrishnan & Rawer F2 bottomside.
///
/// The bottomside grows monotonically from the ground to hmF2, so the height
/// where it reaches `nm_f1` is found by bisection on [0, hmF2].
///
/// Return
/// ------
/// * `None` if an input is not finite or the bottomside never reaches `nm_f1`.
pub fn find_hmf1(
    b0: Kilometer,
    b1: f64,
    nm_f2: f64,
    hm_f2: Kilometer,
    nm_f1: f64,
) -> Option<Kilometer> {
    let inputs = [b0, b1, nm_f2, hm_f2, nm_f1];
    if !inputs.iter().all(|v| v.is_finite()) || b0 <= 0.0 || hm_f2 <= 0.0 {
        return None;
    }

    let excess = |h: Kilometer| ramakrishnan_rawer(nm_f2, hm_f2, b0, b1, h) - nm_f1;
    let (mut low, mut high) = (0.0, hm_f2);
    if excess(low) > 0.0 || excess(high) < 0.0 {
        return None;
    }

    while high - low > HMF1_TOLERANCE {
        let mid = 0.5 * (low + high);
        if excess(mid) < 0.0 {
            low = mid;
        } else {
            high = mid;
        }
    }
    Some(0.5 * (low + high))
}

/// F1 bottomside thickness from the F1 and E peak heights.
pub fn b_f1_bot(hm_f1: Kilometer, hm_e: Kilometer) -> Kilometer {
    0.5 * (hm_f1 - hm_e)
}

/// Layer parameters of a single profile column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerParameters {
    pub nm_f2: f64,
    pub nm_f1: f64,
    pub nm_e: f64,
    pub hm_f2: Kilometer,
    pub hm_f1: Kilometer,
    pub hm_e: Kilometer,
    pub b0: Kilometer,
    pub b1: f64,
    pub b_f2_top: Kilometer,
    pub b_f1_bot: Kilometer,
    pub b_e_bot: Kilometer,
    pub b_e_top: Kilometer,
}

impl LayerParameters {
    /// Parameters of cell (t, g) of the layer matrices.
    pub fn at(f2: &F2Layer, f1: &F1Layer, e: &ELayer, t: usize, g: usize) -> Self {
        let i = (t, g);
        LayerParameters {
            nm_f2: f2.nm[i],
            nm_f1: f1.nm[i],
            nm_e: e.nm[i],
            hm_f2: f2.hm[i],
            hm_f1: f1.hm[i],
            hm_e: e.hm[i],
            b0: f2.b0[i],
            b1: f2.b1[i],
            b_f2_top: f2.b_top[i],
            b_f1_bot: f1.b_bot[i],
            b_e_bot: e.b_bot[i],
            b_e_top: e.b_top[i],
        }
    }

    /// Electron density (m⁻³) at altitude `h` (km).
    pub fn density(&self, h: Kilometer) -> f64 {
        let b_f1_bot = if self.b_f1_bot <= 0.0 {
            DEFAULT_B_F1_BOT
        } else {
            self.b_f1_bot
        };
        let b_f2_top = if self.b_f2_top <= 0.0 {
            DEFAULT_B_F2_TOP
        } else {
            self.b_f2_top
        };

        let a_f2 = 4.0 * self.nm_f2;
        let a_f1 = 4.0 * self.nm_f1;
        let a_e = 4.0 * self.nm_e;

        let rr = |h: Kilometer| ramakrishnan_rawer(self.nm_f2, self.hm_f2, self.b0, self.b1, h);
        let f1_present = self.nm_f1.is_finite();

        let (mut f2, mut f1, mut e) = (0.0, 0.0, 0.0);

        if h >= self.hm_f2 {
            f2 = epstein_top(a_f2, self.hm_f2, b_f2_top, h);
        }
        if h <= self.hm_e {
            e = epstein(a_e, self.hm_e, self.b_e_bot, h);
        }

        if f1_present {
            if h < self.hm_f2 && h >= self.hm_f1 {
                f2 = rr(h);
            }
            if h > self.hm_e && h < self.hm_f1 {
                let span = self.hm_f1 - self.hm_e;
                let drop_e = 1.0 - ((h - self.hm_e) / span).powi(4);
                let drop_f1 = 1.0 - ((self.hm_f1 - h) / span).powi(4);
                e = epstein(a_e, self.hm_e, self.b_e_top, h) * drop_e;
                f1 = epstein(a_f1, self.hm_f1, b_f1_bot, h) * drop_f1;
            }
        } else if h < self.hm_f2 && h > self.hm_e {
            let span = self.hm_f2 - self.hm_e;
            let drop_e = 1.0 - ((h - self.hm_e) / span).powi(4);
            let drop_f2 = 1.0 - ((self.hm_f2 - h) / span).powi(4);
            e = epstein(a_e, self.hm_e, self.b_e_top, h) * drop_e;
            f2 = rr(h) * drop_f2;
        }

        let density = f2 + f1 + e;
        if density <= 1.0 {
            1.0
        } else {
            density
        }
    }
}

/// How the F2 topside thickness of merged layers is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum TopsideThickness {
    /// Keep the background model's value.
    #[default]
    Background,
    /// Recompute from the reconciled foF2, hmF2 and B0.
    Recomputed { f107: Sfu },
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EdpBuilder {
    pub topside: TopsideThickness,
}

impl EdpBuilder {
    pub fn new(topside: TopsideThickness) -> Self {
        EdpBuilder { topside }
    }

    /// Build the profile of layer matrices at `altitudes`.
    ///
    /// Return
    /// ------
    /// * The profile, [`IrtamError::InvalidAltitudeInput`] for invalid altitudes, or
    ///   [`IrtamError::BackgroundModelError`] if the layer matrices disagree in shape.
    pub fn build(
        &self,
        f2: &F2Layer,
        f1: &F1Layer,
        e: &ELayer,
        altitudes: &[Kilometer],
    ) -> Result<Profile, IrtamError> {
        validate_altitudes(altitudes)?;

        let (nt, ng) = f2.nm.shape();
        let shapes = [
            f2.hm.shape(),
            f2.b0.shape(),
            f2.b1.shape(),
            f2.b_top.shape(),
            f1.nm.shape(),
            f1.hm.shape(),
            f1.b_bot.shape(),
            e.nm.shape(),
            e.hm.shape(),
            e.b_bot.shape(),
            e.b_top.shape(),
        ];
        if shapes.iter().any(|s| *s != (nt, ng)) {
            return Err(IrtamError::BackgroundModelError(
                "layer parameter matrices have inconsistent shapes".into(),
            ));
        }

        let slices = (0..nt)
            .map(|t| {
                let columns: Vec<LayerParameters> =
                    (0..ng).map(|g| LayerParameters::at(f2, f1, e, t, g)).collect();
                DMatrix::from_fn(altitudes.len(), ng, |a, g| columns[g].density(altitudes[a]))
            })
            .collect();

        Profile::new(altitudes.to_vec(), slices)
    }

    /// F2 and F1 layers consistent with the reconciled characteristics.
    ///
    /// Cells where no characteristic comes from observations keep the
    /// background layers unchanged. Elsewhere:
    ///
    /// - foF2, hmF2, B0, B1 are the reconciled values and NmF2 follows from foF2,
    /// - where an F1 layer exists, hmF1 is moved to the height where the new F2
    ///   bottomside reaches NmF1 and B_F1_bot is recomputed from it,
    /// - the F2 topside thickness follows [`TopsideThickness`].
    pub fn merge_layers(
        &self,
        reconciled: &SurfaceParameterSet,
        background: &BackgroundState,
    ) -> (F2Layer, F1Layer) {
        let mut f2 = background.f2.clone();
        let mut f1 = background.f1.clone();
        let observed = reconciled.any_valid();
        let mut moved_f1 = 0usize;

        let (nt, ng) = observed.shape();
        for i in iproduct!(0..nt, 0..ng) {
            if !observed[i] {
                continue;
            }
            let fo = reconciled.fof2.values()[i];
            let hm = reconciled.hmf2.values()[i];
            let b0 = reconciled.b0.values()[i];
            let b1 = reconciled.b1.values()[i];
            let nm = freq_to_nm(fo);

            f2.fo[i] = fo;
            f2.nm[i] = nm;
            f2.hm[i] = hm;
            f2.b0[i] = b0;
            f2.b1[i] = b1;
            if let TopsideThickness::Recomputed { f107 } = self.topside {
                let b_top = f2_top_thickness(fo, hm, b0, f107);
                f2.b_top[i] = if b_top.is_finite() && b_top > 0.0 {
                    b_top
                } else {
                    DEFAULT_B_F2_TOP
                };
            }

            if let Some(hm_f1) = find_hmf1(b0, b1, nm, hm, f1.nm[i]) {
                f1.hm[i] = hm_f1;
                f1.b_bot[i] = b_f1_bot(hm_f1, background.e.hm[i]);
                moved_f1 += 1;
            }
        }

        debug!("Recomputed hmF1 in {moved_f1} cells");
        (f2, f1)
    }
}
