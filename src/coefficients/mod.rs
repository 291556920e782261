//! # IRTAM coefficient records
//!
//! An IRTAM coefficient set is the matrix `U` of a CCIR-like spherical-harmonic
//! expansion, valid for one 15-minute epoch and one characteristic among
//! foF2, hmF2, B0 and B1. This module defines:
//!
//! - [`IrtamParameter`] – the four characteristics and their archive names,
//! - [`ExpansionOrder`] – the (diurnal × geographic) size of `U`,
//! - [`CoefficientRecord`] – an immutable, validated `U` matrix keyed by
//!   (parameter, epoch).
//!
//! ## Coefficient ordering
//!
//! A file carries 1064 numbers. The first 988 form the CCIR block, a 13 × 76
//! matrix stored column-major (diurnal index fastest). The last 76 are the
//! additional IRTAM diurnal row. The 14 × 76 IRTAM matrix is
//!
//! ```text
//! row 0      <- CCIR row 0
//! row 1      <- additional row (time-of-validity term)
//! rows 2..14 <- CCIR rows 1..13
//! ```
//!
//! ## See also
//! ------------
//! * [`parser`] – Text decoding of coefficient files.
//! * [`store::CoefficientStore`] – Per-run cache of records.
//! * [`crate::synthesis::HarmonicSynthesizer`] – Evaluation of `U` on a grid.
pub mod layout;
pub mod parser;
pub mod source;
pub mod store;

use std::{fmt, str::FromStr};

use camino::Utf8Path;
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::{
    constants::{CCIR_BLOCK_LEN, IRTAM_COEFF_COUNT, NJ_F0F2, NJ_IRTAM, NK_F0F2, NK_IRTAM},
    irtam_errors::IrtamError,
    time::CoeffEpoch,
};

use parser::{parse_coefficients, ParseCoeffError};

/// Ionospheric characteristics mapped by IRTAM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IrtamParameter {
    /// F2 critical frequency (MHz)
    FoF2,
    /// F2 peak height (km)
    HmF2,
    /// Bottomside thickness (km)
    B0,
    /// Bottomside shape (dimensionless)
    B1,
}

impl IrtamParameter {
    pub const ALL: [IrtamParameter; 4] = [
        IrtamParameter::FoF2,
        IrtamParameter::HmF2,
        IrtamParameter::B0,
        IrtamParameter::B1,
    ];

    /// Name used by the GAMBIT archive queries (`charName`).
    pub fn name(&self) -> &'static str {
        match self {
            IrtamParameter::FoF2 => "foF2",
            IrtamParameter::HmF2 => "hmF2",
            IrtamParameter::B0 => "B0",
            IrtamParameter::B1 => "B1",
        }
    }

    /// Tag used in coefficient file names (B0/B1 files carry an `in` suffix).
    pub fn file_tag(&self) -> &'static str {
        match self {
            IrtamParameter::FoF2 => "foF2",
            IrtamParameter::HmF2 => "hmF2",
            IrtamParameter::B0 => "B0in",
            IrtamParameter::B1 => "B1in",
        }
    }
}

impl fmt::Display for IrtamParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for IrtamParameter {
    type Err = IrtamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fof2" => Ok(IrtamParameter::FoF2),
            "hmf2" => Ok(IrtamParameter::HmF2),
            "b0" | "b0in" => Ok(IrtamParameter::B0),
            "b1" | "b1in" => Ok(IrtamParameter::B1),
            _ => Err(IrtamError::UnknownParameter(s.to_string())),
        }
    }
}

/// Size of a harmonic expansion: `nj` diurnal functions by `nk` geographic functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExpansionOrder {
    pub nj: usize,
    pub nk: usize,
}

impl ExpansionOrder {
    pub const CCIR: ExpansionOrder = ExpansionOrder {
        nj: NJ_F0F2,
        nk: NK_F0F2,
    };

    pub const IRTAM: ExpansionOrder = ExpansionOrder {
        nj: NJ_IRTAM,
        nk: NK_IRTAM,
    };

    pub fn coefficient_count(&self) -> usize {
        self.nj * self.nk
    }
}

/// Validated IRTAM coefficient matrix for one (parameter, epoch).
#[derive(Debug, Clone, PartialEq)]
pub struct CoefficientRecord {
    parameter: IrtamParameter,
    epoch: CoeffEpoch,
    matrix: DMatrix<f64>,
}

impl CoefficientRecord {
    /// Build a record from an already assembled `nj × nk` matrix.
    ///
    /// Return
    /// ------
    /// * The record, or [`IrtamError::MalformedCoefficientFile`] if the matrix
    ///   is not 14 × 76 or holds non-finite values.
    pub fn new(
        parameter: IrtamParameter,
        epoch: CoeffEpoch,
        matrix: DMatrix<f64>,
    ) -> Result<Self, IrtamError> {
        let order = ExpansionOrder::IRTAM;
        if matrix.shape() != (order.nj, order.nk) {
            return Err(IrtamError::MalformedCoefficientFile {
                origin: format!("{parameter} {epoch}"),
                reason: format!(
                    "expected a {}x{} matrix, got {}x{}",
                    order.nj,
                    order.nk,
                    matrix.nrows(),
                    matrix.ncols()
                ),
            });
        }
        if matrix.iter().any(|v| !v.is_finite()) {
            return Err(IrtamError::MalformedCoefficientFile {
                origin: format!("{parameter} {epoch}"),
                reason: "non-finite coefficient".into(),
            });
        }
        Ok(CoefficientRecord {
            parameter,
            epoch,
            matrix,
        })
    }

    /// Build a record from the flat file ordering (CCIR block followed by the additional row).
    ///
    /// Arguments
    /// ---------
    /// * `parameter`, `epoch`: identity of the record
    /// * `values`: the 1064 coefficients in file order
    ///
    /// Return
    /// ------
    /// * The record, or [`IrtamError::MalformedCoefficientFile`] on a count mismatch.
    pub fn from_values(
        parameter: IrtamParameter,
        epoch: CoeffEpoch,
        values: &[f64],
    ) -> Result<Self, IrtamError> {
        if values.len() != IRTAM_COEFF_COUNT {
            return Err(IrtamError::MalformedCoefficientFile {
                origin: format!("{parameter} {epoch}"),
                reason: ParseCoeffError::WrongCoefficientCount {
                    expected: IRTAM_COEFF_COUNT,
                    found: values.len(),
                }
                .to_string(),
            });
        }

        let ccir = ExpansionOrder::CCIR;
        let (main, additional) = values.split_at(CCIR_BLOCK_LEN);
        let ccir_block = DMatrix::from_column_slice(ccir.nj, ccir.nk, main);

        let mut matrix = DMatrix::zeros(NJ_IRTAM, NK_IRTAM);
        matrix.row_mut(0).copy_from(&ccir_block.row(0));
        for (k, value) in additional.iter().enumerate() {
            matrix[(1, k)] = *value;
        }
        matrix
            .rows_mut(2, ccir.nj - 1)
            .copy_from(&ccir_block.rows(1, ccir.nj - 1));

        CoefficientRecord::new(parameter, epoch, matrix)
    }

    /// Decode the text of a coefficient file and check it against the expected key.
    ///
    /// Arguments
    /// ---------
    /// * `text`: full content of the file
    /// * `origin`: description used in error messages (usually the path)
    /// * `parameter`, `epoch`: expected identity; header metadata, when present, must agree
    pub fn from_text(
        text: &str,
        origin: &str,
        parameter: IrtamParameter,
        epoch: CoeffEpoch,
    ) -> Result<Self, IrtamError> {
        let malformed = |err: ParseCoeffError| IrtamError::MalformedCoefficientFile {
            origin: origin.to_string(),
            reason: err.to_string(),
        };

        let parsed = parse_coefficients(text).map_err(malformed)?;
        parsed.header.check(parameter, epoch).map_err(malformed)?;

        CoefficientRecord::from_values(parameter, epoch, &parsed.values).map_err(|e| match e {
            IrtamError::MalformedCoefficientFile { reason, .. } => {
                IrtamError::MalformedCoefficientFile {
                    origin: origin.to_string(),
                    reason,
                }
            }
            other => other,
        })
    }

    /// Read and decode a coefficient file from disk.
    pub fn read_file(
        path: &Utf8Path,
        parameter: IrtamParameter,
        epoch: CoeffEpoch,
    ) -> Result<Self, IrtamError> {
        let text = std::fs::read_to_string(path)?;
        CoefficientRecord::from_text(&text, path.as_str(), parameter, epoch)
    }

    /// Read a coefficient file whose (parameter, epoch) key is taken from its
    /// standard file name.
    pub fn read_named_file(path: &Utf8Path) -> Result<Self, IrtamError> {
        let (parameter, epoch) = path
            .file_name()
            .and_then(layout::parse_file_name)
            .ok_or_else(|| IrtamError::MalformedCoefficientFile {
                origin: path.to_string(),
                reason: "not an IRTAM coefficient file name".into(),
            })?;
        CoefficientRecord::read_file(path, parameter, epoch)
    }

    /// Flat file ordering of the coefficients, inverse of [`CoefficientRecord::from_values`].
    pub fn to_values(&self) -> Vec<f64> {
        let ccir = ExpansionOrder::CCIR;
        let mut values = Vec::with_capacity(IRTAM_COEFF_COUNT);
        for k in 0..ccir.nk {
            values.push(self.matrix[(0, k)]);
            for j in 2..NJ_IRTAM {
                values.push(self.matrix[(j, k)]);
            }
        }
        values.extend(self.matrix.row(1).iter());
        values
    }

    /// Serialize the record in the ASCII coefficient file format.
    pub fn to_asc(&self) -> String {
        parser::write_coefficients(self.parameter, &self.epoch, &self.to_values())
    }

    pub fn parameter(&self) -> IrtamParameter {
        self.parameter
    }

    pub fn epoch(&self) -> CoeffEpoch {
        self.epoch
    }

    pub fn order(&self) -> ExpansionOrder {
        ExpansionOrder::IRTAM
    }

    /// The `nj × nk` coefficient matrix `U`.
    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.matrix
    }
}

#[cfg(test)]
mod coefficients_test {
    use super::*;

    fn epoch() -> CoeffEpoch {
        CoeffEpoch::new(2022, 1, 1, 0, 15).unwrap()
    }

    #[test]
    fn test_parameter_names() {
        assert_eq!(IrtamParameter::B0.file_tag(), "B0in");
        assert_eq!(IrtamParameter::B0.name(), "B0");
        assert_eq!("B1in".parse::<IrtamParameter>().unwrap(), IrtamParameter::B1);
        assert_eq!("FOF2".parse::<IrtamParameter>().unwrap(), IrtamParameter::FoF2);
        assert_eq!(
            "bad".parse::<IrtamParameter>(),
            Err(IrtamError::UnknownParameter("bad".into()))
        );
    }

    #[test]
    fn test_expansion_order() {
        assert_eq!(ExpansionOrder::CCIR.coefficient_count(), CCIR_BLOCK_LEN);
        assert_eq!(
            ExpansionOrder::IRTAM.coefficient_count(),
            IRTAM_COEFF_COUNT
        );
    }

    #[test]
    fn test_from_values_layout() {
        let values: Vec<f64> = (0..IRTAM_COEFF_COUNT).map(|i| i as f64).collect();
        let record =
            CoefficientRecord::from_values(IrtamParameter::FoF2, epoch(), &values).unwrap();
        let u = record.matrix();

        // CCIR block is column-major with the diurnal index fastest
        assert_eq!(u[(0, 0)], 0.0);
        assert_eq!(u[(2, 0)], 1.0);
        assert_eq!(u[(13, 0)], 12.0);
        assert_eq!(u[(0, 1)], 13.0);
        assert_eq!(u[(13, 75)], 987.0);
        // the additional row sits at index 1
        assert_eq!(u[(1, 0)], 988.0);
        assert_eq!(u[(1, 75)], 1063.0);

        assert_eq!(record.to_values(), values);
    }

    #[test]
    fn test_from_values_wrong_count() {
        let err = CoefficientRecord::from_values(IrtamParameter::HmF2, epoch(), &[1.0; 988])
            .unwrap_err();
        assert!(matches!(err, IrtamError::MalformedCoefficientFile { .. }));
        assert!(err.to_string().contains("expected 1064"));
    }

    #[test]
    fn test_new_rejects_bad_shape() {
        let err = CoefficientRecord::new(IrtamParameter::B0, epoch(), DMatrix::zeros(13, 76))
            .unwrap_err();
        assert!(matches!(err, IrtamError::MalformedCoefficientFile { .. }));
    }
}
