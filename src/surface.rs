//! Surface parameter maps shaped (time × grid point).
use nalgebra::DMatrix;

use crate::coefficients::IrtamParameter;

/// Range B0 (km) is clamped to after synthesis, as in IRI.
pub const IRI_B0_LIMITS: (f64, f64) = (1.0, 350.0);
/// Range B1 is clamped to after synthesis, as in IRI.
pub const IRI_B1_LIMITS: (f64, f64) = (1.0, 6.0);

/// One parameter map with its validity mask.
///
/// `valid[(t, g)]` is true when `values[(t, g)]` comes from observations.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceField {
    values: DMatrix<f64>,
    valid: DMatrix<bool>,
}

impl SurfaceField {
    /// # Panics
    /// If `values` and `valid` have different shapes.
    pub fn new(values: DMatrix<f64>, valid: DMatrix<bool>) -> Self {
        assert_eq!(
            values.shape(),
            valid.shape(),
            "values and validity mask must have the same shape"
        );
        SurfaceField { values, valid }
    }

    /// A field whose mask is entirely false (background values).
    pub fn unobserved(values: DMatrix<f64>) -> Self {
        let valid = DMatrix::from_element(values.nrows(), values.ncols(), false);
        SurfaceField { values, valid }
    }

    pub fn values(&self) -> &DMatrix<f64> {
        &self.values
    }

    pub fn valid(&self) -> &DMatrix<bool> {
        &self.valid
    }

    /// (time steps, grid points)
    pub fn shape(&self) -> (usize, usize) {
        self.values.shape()
    }

    pub fn valid_count(&self) -> usize {
        self.valid.iter().filter(|v| **v).count()
    }

    /// Clamp every value into `[lo, hi]`; NaN stays NaN.
    pub fn clamp(&mut self, (lo, hi): (f64, f64)) {
        self.values.apply(|v| *v = v.clamp(lo, hi));
    }

    pub fn into_parts(self) -> (DMatrix<f64>, DMatrix<bool>) {
        (self.values, self.valid)
    }
}

/// The four IRTAM characteristics on a common (time × grid) shape.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceParameterSet {
    pub fof2: SurfaceField,
    pub hmf2: SurfaceField,
    pub b0: SurfaceField,
    pub b1: SurfaceField,
}

impl SurfaceParameterSet {
    pub fn get(&self, parameter: IrtamParameter) -> &SurfaceField {
        match parameter {
            IrtamParameter::FoF2 => &self.fof2,
            IrtamParameter::HmF2 => &self.hmf2,
            IrtamParameter::B0 => &self.b0,
            IrtamParameter::B1 => &self.b1,
        }
    }

    pub fn get_mut(&mut self, parameter: IrtamParameter) -> &mut SurfaceField {
        match parameter {
            IrtamParameter::FoF2 => &mut self.fof2,
            IrtamParameter::HmF2 => &mut self.hmf2,
            IrtamParameter::B0 => &mut self.b0,
            IrtamParameter::B1 => &mut self.b1,
        }
    }

    /// Shape shared by the four fields, `None` if they disagree.
    pub fn shape(&self) -> Option<(usize, usize)> {
        let shape = self.fof2.shape();
        IrtamParameter::ALL
            .iter()
            .all(|p| self.get(*p).shape() == shape)
            .then_some(shape)
    }

    /// Clamp B0 and B1 to the IRI ranges.
    pub fn apply_iri_limits(&mut self) {
        self.b0.clamp(IRI_B0_LIMITS);
        self.b1.clamp(IRI_B1_LIMITS);
    }

    /// Cells where at least one parameter comes from observations.
    pub fn any_valid(&self) -> DMatrix<bool> {
        let (nt, ng) = self.fof2.shape();
        DMatrix::from_fn(nt, ng, |t, g| {
            IrtamParameter::ALL
                .iter()
                .any(|p| self.get(*p).valid.get((t, g)).copied().unwrap_or(false))
        })
    }
}

#[cfg(test)]
mod surface_test {
    use super::*;

    fn field(values: &[f64]) -> SurfaceField {
        SurfaceField::new(
            DMatrix::from_row_slice(1, values.len(), values),
            DMatrix::from_element(1, values.len(), true),
        )
    }

    #[test]
    fn test_iri_limits() {
        let mut set = SurfaceParameterSet {
            fof2: field(&[0.05, 12.0, f64::NAN]),
            hmf2: field(&[300.0, 300.0, 300.0]),
            b0: field(&[0.2, 500.0, f64::NAN]),
            b1: field(&[0.5, 3.0, 9.0]),
        };
        set.apply_iri_limits();

        assert_eq!(set.b0.values().as_slice()[..2], [1.0, 350.0]);
        assert!(set.b0.values()[(0, 2)].is_nan());
        assert_eq!(set.b1.values().as_slice(), &[1.0, 3.0, 6.0]);
        // foF2 is not clamped
        assert_eq!(set.fof2.values()[(0, 0)], 0.05);
        assert_eq!(set.shape(), Some((1, 3)));
    }

    #[test]
    fn test_any_valid() {
        let mut set = SurfaceParameterSet {
            fof2: SurfaceField::unobserved(DMatrix::zeros(1, 2)),
            hmf2: SurfaceField::unobserved(DMatrix::zeros(1, 2)),
            b0: SurfaceField::unobserved(DMatrix::zeros(1, 2)),
            b1: SurfaceField::unobserved(DMatrix::zeros(1, 2)),
        };
        set.b1 = SurfaceField::new(
            DMatrix::zeros(1, 2),
            DMatrix::from_row_slice(1, 2, &[false, true]),
        );
        let any = set.any_valid();
        assert!(!any[(0, 0)]);
        assert!(any[(0, 1)]);
    }
}
