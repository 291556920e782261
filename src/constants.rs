//! # Constants and type definitions for IRTAM
//!
//! This module centralizes the **expansion orders**, **unit conversions** and
//! **type aliases** shared by the coefficient parser, the harmonic synthesis
//! engine and the profile builder.
//!
//! ## Overview
//!
//! - Sizes of the CCIR / IRTAM harmonic expansions
//! - Coefficient cadence
//! - Physical conversion factors (critical frequency ↔ peak density)
//! - Unit aliases used across the crate

// -------------------------------------------------------------------------------------------------
// Unit conversions
// -------------------------------------------------------------------------------------------------

/// Degrees → radians
pub const RADEG: f64 = std::f64::consts::PI / 180.0;

/// Minutes in a day
pub const MINUTES_PER_DAY: i64 = 1440;

// -------------------------------------------------------------------------------------------------
// Harmonic expansion sizes
// -------------------------------------------------------------------------------------------------

/// Highest power of sin(modip) for each longitude harmonic (Jones & Gallet 1965, foF2 table).
pub const QM_F0F2: [usize; 9] = [12, 12, 9, 5, 2, 1, 1, 1, 1];

/// Number of geographic functions of the foF2 expansion.
pub const NK_F0F2: usize = 76;

/// Number of diurnal functions of the CCIR foF2 expansion.
pub const NJ_F0F2: usize = 13;

/// Number of geographic functions of the IRTAM expansion (same as CCIR).
pub const NK_IRTAM: usize = 76;

/// Number of diurnal functions of the IRTAM expansion (CCIR + time-of-validity term).
pub const NJ_IRTAM: usize = 14;

/// Number of coefficients stored in the CCIR-like block of an IRTAM file.
pub const CCIR_BLOCK_LEN: usize = NJ_F0F2 * NK_F0F2;

/// Total number of coefficients in an IRTAM file.
pub const IRTAM_COEFF_COUNT: usize = CCIR_BLOCK_LEN + NK_IRTAM;

/// Offset (minutes) added to the time-of-validity diurnal term.
pub const TOV_MINUTES_OFFSET: f64 = 720.0;

// -------------------------------------------------------------------------------------------------
// Coefficient cadence
// -------------------------------------------------------------------------------------------------

/// Cadence of IRTAM coefficient sets in minutes.
pub const CADENCE_MINUTES: i64 = 15;

/// Cadence of IRTAM coefficient sets in seconds.
pub const CADENCE_SECONDS: i64 = CADENCE_MINUTES * 60;

// -------------------------------------------------------------------------------------------------
// Physics
// -------------------------------------------------------------------------------------------------

/// NmF2 [m⁻³] = FREQ_TO_NM · foF2² [MHz²]
pub const FREQ_TO_NM: f64 = 0.124e11;

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Angle in degrees
pub type Degree = f64;
/// Angle in radians
pub type Radian = f64;
/// Distance in kilometers
pub type Kilometer = f64;
/// Decimal hours of universal time
pub type Hour = f64;
/// Frequency in megahertz
pub type MegaHertz = f64;
/// Solar flux index in solar flux units
pub type Sfu = f64;
