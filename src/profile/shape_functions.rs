//! Layer shape functions of the electron density profile.
use crate::constants::Kilometer;

/// Exponent bound of [`fexp`].
const FEXP_LIMIT: f64 = 80.0;

/// Shape factor of the NeQuick topside thickness correction.
const TOPSIDE_G: f64 = 0.125;
/// Upper bound of the NeQuick topside thickness correction.
const TOPSIDE_R: f64 = 100.0;

/// `exp(x)` with `x` clamped to ±80, keeping the result finite.
pub fn fexp(x: f64) -> f64 {
    x.clamp(-FEXP_LIMIT, FEXP_LIMIT).exp()
}

/// Epstein layer of amplitude `a` (4·Nm), peak height `hm` and thickness `b`.
///
/// ```text
/// N(h) = A e^α / (1 + e^α)²,   α = (h − hm) / B
/// ```
pub fn epstein(a: f64, hm: Kilometer, b: Kilometer, h: Kilometer) -> f64 {
    let e = fexp((h - hm) / b);
    a * e / ((1.0 + e) * (1.0 + e))
}

/// Epstein topside whose thickness grows with height (NeQuick formulation).
///
/// ```text
/// z = Δh / (B (1 + r g Δh / (r B + g Δh))),   Δh = h − hm,  g = 0.125, r = 100
/// ```
pub fn epstein_top(a: f64, hm: Kilometer, b: Kilometer, h: Kilometer) -> f64 {
    let dh = h - hm;
    let z = dh / (b * (1.0 + TOPSIDE_R * TOPSIDE_G * dh / (TOPSIDE_R * b + TOPSIDE_G * dh)));
    let e = fexp(z);
    a * e / ((1.0 + e) * (1.0 + e))
}

/// Ramakrishnan & Rawer F2 bottomside (as in IRI).
///
/// ```text
/// N(h) = NmF2 exp(−sign(x)|x|^B1) / cosh(x),   x = (hmF2 − h) / B0
/// ```
pub fn ramakrishnan_rawer(
    nm_f2: f64,
    hm_f2: Kilometer,
    b0: Kilometer,
    b1: f64,
    h: Kilometer,
) -> f64 {
    let x = (hm_f2 - h) / b0;
    nm_f2 * fexp(-(x.signum() * x.abs().powf(b1))) / x.cosh()
}
