use nalgebra::DMatrix;

use crate::constants::{Degree, NK_F0F2, QM_F0F2, RADEG};

/// Assemble the geographic coordinate functions of the CCIR foF2 expansion.
///
/// For every grid point the column holds, in order:
///
/// ```text
/// sin(μ)^i                                   i < QM[0]
/// sin(μ)^i cos(φ)^j cos(jλ), sin(μ)^i cos(φ)^j sin(jλ)   j ≥ 1, i < QM[j]
/// ```
///
/// where μ is the modified dip latitude, φ the geographic latitude and λ the
/// longitude (Jones & Gallet, 1965).
///
/// Arguments
/// ---------
/// * `lon`, `lat`, `modip`: equal-length arrays in degrees
///
/// Returns
/// --------
/// * `G`, a `76 × n` matrix, one column per grid point.
///
/// Only products of sines and cosines appear, so the poles need no special
/// care: cos(φ) vanishes there and every longitude term drops out.
pub fn geographic_functions(lon: &[Degree], lat: &[Degree], modip: &[Degree]) -> DMatrix<f64> {
    let n = lon.len();
    let mut g = DMatrix::zeros(NK_F0F2, n);

    for p in 0..n {
        let sin_mu = (modip[p] * RADEG).sin();
        let cos_phi = (lat[p] * RADEG).cos();
        let lambda = lon[p] * RADEG;

        let mut col = g.column_mut(p);

        let mut sin_pow = 1.0;
        for i in 0..QM_F0F2[0] {
            col[i] = sin_pow;
            sin_pow *= sin_mu;
        }

        let mut k = QM_F0F2[0];
        let mut cos_pow = 1.0;
        for (j, &qm) in QM_F0F2.iter().enumerate().skip(1) {
            cos_pow *= cos_phi;
            let (sin_j, cos_j) = (j as f64 * lambda).sin_cos();
            let mut sin_pow = 1.0;
            for _ in 0..qm {
                col[k] = sin_pow * cos_pow * cos_j;
                col[k + 1] = sin_pow * cos_pow * sin_j;
                sin_pow *= sin_mu;
                k += 2;
            }
        }
    }
    g
}

#[cfg(test)]
mod geographic_test {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn test_function_count() {
        let count = QM_F0F2[0] + 2 * QM_F0F2[1..].iter().sum::<usize>();
        assert_eq!(count, NK_F0F2);
    }

    #[test]
    fn test_equator_values() {
        let g = geographic_functions(&[90.0], &[0.0], &[0.0]);
        // sin(μ) = 0: only the i = 0 terms survive
        assert_eq!(g[(0, 0)], 1.0);
        assert_eq!(g[(1, 0)], 0.0);
        // j = 1, i = 0: cos(φ) cos(λ), cos(φ) sin(λ)
        assert_abs_diff_eq!(g[(12, 0)], 0.0, epsilon = 1e-15);
        assert_abs_diff_eq!(g[(13, 0)], 1.0, epsilon = 1e-15);
        // j = 1, i = 1 vanishes
        assert_abs_diff_eq!(g[(14, 0)], 0.0, epsilon = 1e-15);
    }

    #[test]
    fn test_powers_of_modip() {
        let g = geographic_functions(&[0.0], &[30.0], &[30.0]);
        for i in 0..12 {
            assert_abs_diff_eq!(g[(i, 0)], 0.5f64.powi(i as i32), epsilon = 1e-14);
        }
    }

    #[test]
    fn test_pole_and_wrap() {
        let g = geographic_functions(
            &[-180.0, 180.0, 37.0],
            &[90.0, 90.0, -90.0],
            &[90.0, 90.0, -90.0],
        );
        assert!(g.iter().all(|v| v.is_finite()));
        for k in 0..NK_F0F2 {
            assert_abs_diff_eq!(g[(k, 0)], g[(k, 1)], epsilon = 1e-12);
        }
        // longitude terms vanish at the pole
        for k in QM_F0F2[0]..NK_F0F2 {
            assert_abs_diff_eq!(g[(k, 2)], 0.0, epsilon = 1e-15);
        }
    }
}
