//! # IRTAM coefficient file parser
//!
//! Decodes the ASCII coefficient files distributed by the GAMBIT archive.
//!
//! ## Format
//! -----------------
//! - Lines starting with `#` belong to the header. Two pieces of metadata are
//!   recognized there, both optional:
//!   * the characteristic, after a `charName`, `Characteristic` or `Parameter` key
//!     (`foF2`, `hmF2`, `B0`, `B0in`, `B1`, `B1in`),
//!   * the validity time, on a line whose key is exactly `Time`, `Epoch` or
//!     `Validity time`, written `YYYY.MM.DDTHH:MM:SS` or `YYYY-MM-DDTHH:MM:SS`.
//!     Other timestamps (creation, generation) are ignored, and an unusable
//!     validity time is logged and dropped, leaving the key of the request
//!     as the only reference.
//! - Every other non-blank line holds whitespace-separated floating-point
//!   numbers. Fortran `D` exponents are accepted.
//!
//! The parser is pure: it never touches the file system and has no shared state.
//!
//! ## See also
//! ------------
//! * [`crate::coefficients::CoefficientRecord::from_text`] – Validation of the decoded values.
//! * [`write_coefficients`] – Inverse operation.
use std::sync::LazyLock;

use nom::{
    character::complete::{multispace0, multispace1},
    multi::separated_list0,
    number::complete::double,
    sequence::preceded,
    IResult, Parser,
};
use log::warn;
use regex::Regex;
use thiserror::Error;

use crate::{coefficients::IrtamParameter, constants::IRTAM_COEFF_COUNT, time::CoeffEpoch};

/// Number of values written per body line by [`write_coefficients`].
const VALUES_PER_LINE: usize = 4;

static PARAMETER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:charName|characteristic|parameter)\s*[:=]?\s*(foF2|hmF2|B0in|B1in|B0|B1)\b")
        .expect("parameter regex is valid")
});

static TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)^#\s*(?:time|epoch|valid(?:ity)?[ _]?time)\s*[:=]?\s*",
        r"(\d{4})[.\-](\d{2})[.\-](\d{2})T(\d{2}):(\d{2}):(\d{2})",
    ))
    .expect("time regex is valid")
});

/// Line-level decoding errors for coefficient files.
///
/// Variants
/// -----------------
/// * `InvalidNumber` – A body field is not a finite floating-point number.
/// * `WrongCoefficientCount` – The body does not hold the expected number of values.
/// * `HeaderMismatch` – Header metadata disagrees with the requested key.
#[derive(Error, Debug, PartialEq)]
pub enum ParseCoeffError {
    #[error("line {line}: invalid numeric field '{field}'")]
    InvalidNumber { line: usize, field: String },
    #[error("wrong coefficient count: expected {expected}, found {found}")]
    WrongCoefficientCount { expected: usize, found: usize },
    #[error("header mismatch: {0}")]
    HeaderMismatch(String),
}

/// Metadata recovered from the `#` header lines.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoefficientHeader {
    pub parameter: Option<IrtamParameter>,
    pub epoch: Option<CoeffEpoch>,
    pub lines: Vec<String>,
}

impl CoefficientHeader {
    /// Check the header metadata against an expected (parameter, epoch) key.
    ///
    /// Missing metadata is accepted; present metadata must match.
    pub fn check(
        &self,
        parameter: IrtamParameter,
        epoch: CoeffEpoch,
    ) -> Result<(), ParseCoeffError> {
        if let Some(found) = self.parameter {
            if found != parameter {
                return Err(ParseCoeffError::HeaderMismatch(format!(
                    "file holds {found}, expected {parameter}"
                )));
            }
        }
        if let Some(found) = self.epoch {
            if found != epoch {
                return Err(ParseCoeffError::HeaderMismatch(format!(
                    "file is valid at {found}, expected {epoch}"
                )));
            }
        }
        Ok(())
    }

    fn scan(&mut self, line: &str) {
        if self.parameter.is_none() {
            if let Some(caps) = PARAMETER_RE.captures(line) {
                self.parameter = caps[1].parse().ok();
            }
        }
        if self.epoch.is_none() {
            if let Some(caps) = TIME_RE.captures(line) {
                match header_epoch(&caps) {
                    Ok(epoch) => self.epoch = Some(epoch),
                    Err(err) => warn!("Ignoring header time: {err}"),
                }
            }
        }
        self.lines.push(line.to_string());
    }
}

fn header_epoch(caps: &regex::Captures) -> Result<CoeffEpoch, ParseCoeffError> {
    let field = |i: usize| -> Result<u32, ParseCoeffError> {
        caps[i]
            .parse::<u32>()
            .map_err(|_| ParseCoeffError::HeaderMismatch(format!("bad time field '{}'", &caps[i])))
    };
    let (year, month, day) = (field(1)?, field(2)?, field(3)?);
    let (hour, minute, second) = (field(4)?, field(5)?, field(6)?);

    if second != 0 {
        return Err(ParseCoeffError::HeaderMismatch(format!(
            "header time '{}' is not on the coefficient cadence",
            &caps[0]
        )));
    }
    CoeffEpoch::new(year as i32, month as u8, day as u8, hour as u8, minute as u8).map_err(|e| {
        ParseCoeffError::HeaderMismatch(format!("header time '{}': {e}", &caps[0]))
    })
}

/// Header metadata plus the flat list of body values, in file order.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedCoefficients {
    pub header: CoefficientHeader,
    pub values: Vec<f64>,
}

fn parse_values(input: &str) -> IResult<&str, Vec<f64>> {
    preceded(multispace0, separated_list0(multispace1, double)).parse(input)
}

/// Parse one body line into its numeric fields.
fn parse_body_line(line: &str, line_number: usize) -> Result<Vec<f64>, ParseCoeffError> {
    let normalized = line.replace(['D', 'd'], "E");

    let invalid = |field: &str| ParseCoeffError::InvalidNumber {
        line: line_number,
        field: field.split_whitespace().next().unwrap_or(field).to_string(),
    };

    let (rest, values) = parse_values(&normalized).map_err(|_| invalid(line.trim()))?;
    if !rest.trim().is_empty() {
        return Err(invalid(rest.trim()));
    }
    if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
        return Err(invalid(&bad.to_string()));
    }
    Ok(values)
}

/// Decode the full text of a coefficient file.
///
/// Arguments
/// -----------------
/// * `text`: the file content
///
/// Return
/// ----------
/// * The header metadata and all body values, or a [`ParseCoeffError`] naming
///   the offending line. The coefficient count is checked against the IRTAM
///   expansion size.
pub fn parse_coefficients(text: &str) -> Result<ParsedCoefficients, ParseCoeffError> {
    let mut header = CoefficientHeader::default();
    let mut values = Vec::with_capacity(IRTAM_COEFF_COUNT);

    for (index, line) in text.lines().enumerate() {
        if line.starts_with('#') {
            header.scan(line);
        } else if !line.trim().is_empty() {
            values.extend(parse_body_line(line, index + 1)?);
        }
    }

    if values.len() != IRTAM_COEFF_COUNT {
        return Err(ParseCoeffError::WrongCoefficientCount {
            expected: IRTAM_COEFF_COUNT,
            found: values.len(),
        });
    }

    Ok(ParsedCoefficients { header, values })
}

/// Write coefficients in the ASCII file format understood by [`parse_coefficients`].
pub fn write_coefficients(parameter: IrtamParameter, epoch: &CoeffEpoch, values: &[f64]) -> String {
    let mut out = String::new();
    out.push_str("#START_HEADER\n");
    out.push_str(&format!("# charName: {}\n", parameter.name()));
    out.push_str(&format!("# Time: {}\n", epoch.query_stamp()));
    out.push_str(&format!("# Coefficients: {}\n", values.len()));
    out.push_str("#END_HEADER\n");

    for chunk in values.chunks(VALUES_PER_LINE) {
        let line = chunk
            .iter()
            .map(|v| format!("{v:>24.16e}"))
            .collect::<Vec<_>>()
            .join(" ");
        out.push_str(&line);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod parser_test {
    use super::*;

    fn body(count: usize) -> String {
        (0..count)
            .map(|i| format!("{:.3}", i as f64 * 0.5))
            .collect::<Vec<_>>()
            .chunks(8)
            .map(|c| c.join(" "))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_parse_header_and_body() {
        let text = format!(
            "#START_HEADER\n# charName: hmF2\n# Time: 2021.01.01T01:15:00\n#END_HEADER\n{}\n",
            body(IRTAM_COEFF_COUNT)
        );
        let parsed = parse_coefficients(&text).unwrap();
        assert_eq!(parsed.header.parameter, Some(IrtamParameter::HmF2));
        assert_eq!(
            parsed.header.epoch,
            Some(CoeffEpoch::new(2021, 1, 1, 1, 15).unwrap())
        );
        assert_eq!(parsed.header.lines.len(), 4);
        assert_eq!(parsed.values.len(), IRTAM_COEFF_COUNT);
        assert_eq!(parsed.values[3], 1.5);
    }

    #[test]
    fn test_parse_without_metadata() {
        let text = format!("# generic comment\n\n{}", body(IRTAM_COEFF_COUNT));
        let parsed = parse_coefficients(&text).unwrap();
        assert_eq!(parsed.header.parameter, None);
        assert_eq!(parsed.header.epoch, None);
    }

    #[test]
    fn test_fortran_exponent() {
        assert_eq!(
            parse_body_line("  1.5D+02 -2.0d-01   3E1", 1).unwrap(),
            vec![150.0, -0.2, 30.0]
        );
    }

    #[test]
    fn test_invalid_field() {
        let err = parse_body_line("1.0 2.0 abc 4.0", 7).unwrap_err();
        assert_eq!(
            err,
            ParseCoeffError::InvalidNumber {
                line: 7,
                field: "abc".into()
            }
        );
    }

    #[test]
    fn test_wrong_count() {
        let err = parse_coefficients(&body(1000)).unwrap_err();
        assert_eq!(
            err,
            ParseCoeffError::WrongCoefficientCount {
                expected: IRTAM_COEFF_COUNT,
                found: 1000
            }
        );
    }

    #[test]
    fn test_header_check() {
        let epoch = CoeffEpoch::new(2021, 1, 1, 1, 15).unwrap();
        let header = CoefficientHeader {
            parameter: Some(IrtamParameter::B0),
            epoch: Some(epoch),
            lines: vec![],
        };
        assert!(header.check(IrtamParameter::B0, epoch).is_ok());
        assert!(header.check(IrtamParameter::B1, epoch).is_err());
        let other = CoeffEpoch::new(2021, 1, 1, 1, 30).unwrap();
        assert!(header.check(IrtamParameter::B0, other).is_err());
    }

    #[test]
    fn test_off_cadence_header_time_is_ignored() {
        let text = format!("# Time: 2021.01.01T01:10:00\n{}", body(IRTAM_COEFF_COUNT));
        let parsed = parse_coefficients(&text).unwrap();
        assert_eq!(parsed.header.epoch, None);
        assert_eq!(parsed.values.len(), IRTAM_COEFF_COUNT);
    }

    #[test]
    fn test_creation_time_is_not_validity_time() {
        let text = format!(
            "#START_HEADER\n# Creation time: 2021-01-02T08:13:27\n\
             # Generated: 2021.01.02T08:13:27\n\
             # Time: 2021.01.01T01:15:00\n#END_HEADER\n{}",
            body(IRTAM_COEFF_COUNT)
        );
        let parsed = parse_coefficients(&text).unwrap();
        assert_eq!(
            parsed.header.epoch,
            Some(CoeffEpoch::new(2021, 1, 1, 1, 15).unwrap())
        );

        let no_validity = format!(
            "# Creation time: 2021-01-02T08:13:27\n{}",
            body(IRTAM_COEFF_COUNT)
        );
        assert_eq!(parse_coefficients(&no_validity).unwrap().header.epoch, None);
    }

    #[test]
    fn test_write_then_parse() {
        let epoch = CoeffEpoch::new(2022, 6, 30, 23, 45).unwrap();
        let values: Vec<f64> = (0..IRTAM_COEFF_COUNT)
            .map(|i| (i as f64 * 0.37).sin() * 10f64.powi((i % 7) as i32 - 3))
            .collect();
        let text = write_coefficients(IrtamParameter::B1, &epoch, &values);
        let parsed = parse_coefficients(&text).unwrap();
        assert_eq!(parsed.header.parameter, Some(IrtamParameter::B1));
        assert_eq!(parsed.header.epoch, Some(epoch));
        for (a, b) in parsed.values.iter().zip(values.iter()) {
            approx::assert_relative_eq!(a, b, max_relative = 1e-15);
        }
    }
}
