use thiserror::Error;

use crate::{coefficients::IrtamParameter, time::CoeffEpoch};

#[derive(Error, Debug)]
pub enum IrtamError {
    #[error("IRTAM coefficients unavailable for {parameter} at {epoch}: {reason}")]
    CoefficientUnavailable {
        parameter: IrtamParameter,
        epoch: CoeffEpoch,
        reason: String,
    },

    #[error("Malformed IRTAM coefficient file {origin}: {reason}")]
    MalformedCoefficientFile { origin: String, reason: String },

    #[error("Invalid grid or time input: {0}")]
    InvalidGridOrTimeInput(String),

    #[error("Invalid altitude input: {0}")]
    InvalidAltitudeInput(String),

    #[error("Invalid coefficient source: {0}")]
    InvalidCoefficientSource(String),

    #[error("Unknown IRTAM parameter: {0}")]
    UnknownParameter(String),

    #[error("Invalid coefficient epoch: {0}")]
    InvalidEpoch(String),

    #[error("Background model failure: {0}")]
    BackgroundModelError(String),

    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),

    #[error("UTF-8 Path error: {0}")]
    Utf8PathError(String),

    #[cfg(feature = "download")]
    #[error("HTTP ureq error: {0}")]
    UreqHttpError(#[from] ureq::Error),
}

impl PartialEq for IrtamError {
    fn eq(&self, other: &Self) -> bool {
        use IrtamError::*;
        match (self, other) {
            (
                CoefficientUnavailable {
                    parameter: p1,
                    epoch: e1,
                    reason: r1,
                },
                CoefficientUnavailable {
                    parameter: p2,
                    epoch: e2,
                    reason: r2,
                },
            ) => p1 == p2 && e1 == e2 && r1 == r2,
            (
                MalformedCoefficientFile {
                    origin: o1,
                    reason: r1,
                },
                MalformedCoefficientFile {
                    origin: o2,
                    reason: r2,
                },
            ) => o1 == o2 && r1 == r2,
            (InvalidGridOrTimeInput(a), InvalidGridOrTimeInput(b)) => a == b,
            (InvalidAltitudeInput(a), InvalidAltitudeInput(b)) => a == b,
            (InvalidCoefficientSource(a), InvalidCoefficientSource(b)) => a == b,
            (UnknownParameter(a), UnknownParameter(b)) => a == b,
            (InvalidEpoch(a), InvalidEpoch(b)) => a == b,
            (BackgroundModelError(a), BackgroundModelError(b)) => a == b,
            (Utf8PathError(a), Utf8PathError(b)) => a == b,

            // Not comparable: equal if same variant
            (IoError(_), IoError(_)) => true,
            #[cfg(feature = "download")]
            (UreqHttpError(_), UreqHttpError(_)) => true,

            _ => false,
        }
    }
}
