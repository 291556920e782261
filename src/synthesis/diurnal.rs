use nalgebra::DMatrix;

use crate::constants::{Hour, NJ_IRTAM, RADEG, TOV_MINUTES_OFFSET};

/// Time arguments of one row of the diurnal basis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiurnalArgument {
    /// Universal time in decimal hours.
    pub ut_hours: Hour,
    /// Signed minutes elapsed from the time of validity of the coefficients.
    pub minutes_from_tov: f64,
}

/// Hour angle of the CCIR Fourier series, in radians within [-π, π).
fn hour_angle(ut_hours: Hour) -> f64 {
    ((15.0 * ut_hours).rem_euclid(360.0) - 180.0) * RADEG
}

/// Diurnal functions of the IRTAM expansion, one row per argument.
///
/// ```text
/// D[0]      = 1
/// D[1]      = minutes from time of validity + 720
/// D[2k]     = cos(kT)        k = 1..6
/// D[2k + 1] = sin(kT)
/// ```
///
/// with `T = 15·UT − 180` degrees.
pub fn diurnal_functions(args: &[DiurnalArgument]) -> DMatrix<f64> {
    let mut d = DMatrix::zeros(args.len(), NJ_IRTAM);
    let harmonics = (NJ_IRTAM - 2) / 2;

    for (row, arg) in args.iter().enumerate() {
        let t = hour_angle(arg.ut_hours);
        d[(row, 0)] = 1.0;
        d[(row, 1)] = arg.minutes_from_tov + TOV_MINUTES_OFFSET;
        for k in 1..=harmonics {
            let (s, c) = (k as f64 * t).sin_cos();
            d[(row, 2 * k)] = c;
            d[(row, 2 * k + 1)] = s;
        }
    }
    d
}

#[cfg(test)]
mod diurnal_test {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn test_noon_row() {
        let d = diurnal_functions(&[DiurnalArgument {
            ut_hours: 12.0,
            minutes_from_tov: 0.0,
        }]);
        assert_eq!(d.shape(), (1, NJ_IRTAM));
        assert_eq!(d[(0, 0)], 1.0);
        assert_eq!(d[(0, 1)], 720.0);
        // T = 0 at noon UT
        for k in 1..=6 {
            assert_abs_diff_eq!(d[(0, 2 * k)], 1.0, epsilon = 1e-12);
            assert_abs_diff_eq!(d[(0, 2 * k + 1)], 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_midnight_row() {
        let d = diurnal_functions(&[DiurnalArgument {
            ut_hours: 0.0,
            minutes_from_tov: -7.5,
        }]);
        assert_eq!(d[(0, 1)], 712.5);
        // T = -180°
        assert_abs_diff_eq!(d[(0, 2)], -1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(d[(0, 4)], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_periodic_in_ut() {
        let args = [6.25, 30.25, -17.75].map(|ut_hours| DiurnalArgument {
            ut_hours,
            minutes_from_tov: 0.0,
        });
        let d = diurnal_functions(&args);
        for j in 0..NJ_IRTAM {
            assert_abs_diff_eq!(d[(0, j)], d[(1, j)], epsilon = 1e-12);
            assert_abs_diff_eq!(d[(0, j)], d[(2, j)], epsilon = 1e-12);
        }
    }
}
