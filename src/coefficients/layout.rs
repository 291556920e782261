//! On-disk naming of coefficient files.
//!
//! Files are named `IRTAM_<tag>_COEFFS_<YYYYMMDD>_<HHMMSS>.ASC` and, with the
//! dated layout, stored under `<root>/<YYYY>/<MMDD>/`.
use std::sync::LazyLock;

use camino::{Utf8Path, Utf8PathBuf};
use directories::BaseDirs;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{coefficients::IrtamParameter, irtam_errors::IrtamError, time::CoeffEpoch};

static FILE_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^IRTAM_(foF2|hmF2|B0in|B1in)_COEFFS_(\d{4})(\d{2})(\d{2})_(\d{2})(\d{2})00\.ASC$")
        .expect("file name regex is valid")
});

/// Directory layout of a coefficient root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DirectoryLayout {
    /// `<root>/<YYYY>/<MMDD>/<file>`
    #[default]
    Dated,
    /// `<root>/<file>`
    Flat,
}

impl DirectoryLayout {
    pub fn from_subdirs(use_subdirs: bool) -> Self {
        if use_subdirs {
            DirectoryLayout::Dated
        } else {
            DirectoryLayout::Flat
        }
    }
}

/// File name of the coefficients of `parameter` at `epoch`.
pub fn coefficient_file_name(parameter: IrtamParameter, epoch: &CoeffEpoch) -> String {
    format!(
        "IRTAM_{}_COEFFS_{}.ASC",
        parameter.file_tag(),
        epoch.file_stamp()
    )
}

/// Full path of the coefficients of `parameter` at `epoch` under `root`.
pub fn coefficient_path(
    root: &Utf8Path,
    layout: DirectoryLayout,
    parameter: IrtamParameter,
    epoch: &CoeffEpoch,
) -> Utf8PathBuf {
    let file_name = coefficient_file_name(parameter, epoch);
    match layout {
        DirectoryLayout::Dated => root
            .join(epoch.year_dir())
            .join(epoch.month_day_dir())
            .join(file_name),
        DirectoryLayout::Flat => root.join(file_name),
    }
}

/// Recover (parameter, epoch) from a coefficient file name.
pub fn parse_file_name(file_name: &str) -> Option<(IrtamParameter, CoeffEpoch)> {
    let caps = FILE_NAME_RE.captures(file_name)?;
    let parameter = caps[1].parse().ok()?;
    let epoch = CoeffEpoch::new(
        caps[2].parse().ok()?,
        caps[3].parse().ok()?,
        caps[4].parse().ok()?,
        caps[5].parse().ok()?,
        caps[6].parse().ok()?,
    )
    .ok()?;
    Some((parameter, epoch))
}

/// Default coefficient root: `<user cache dir>/irtam_cache/coeffs`.
pub fn default_coefficient_dir() -> Result<Utf8PathBuf, IrtamError> {
    let base_dir = BaseDirs::new().ok_or_else(|| {
        IrtamError::InvalidCoefficientSource("cannot find the user base directory".into())
    })?;
    let cache_path = Utf8Path::from_path(base_dir.cache_dir()).ok_or_else(|| {
        IrtamError::Utf8PathError(format!("{}", base_dir.cache_dir().display()))
    })?;
    Ok(cache_path.join("irtam_cache").join("coeffs"))
}

#[cfg(test)]
mod layout_test {
    use super::*;

    fn epoch() -> CoeffEpoch {
        CoeffEpoch::new(2021, 1, 1, 1, 0).unwrap()
    }

    #[test]
    fn test_file_names() {
        assert_eq!(
            coefficient_file_name(IrtamParameter::B0, &epoch()),
            "IRTAM_B0in_COEFFS_20210101_010000.ASC"
        );
        assert_eq!(
            coefficient_file_name(IrtamParameter::FoF2, &epoch()),
            "IRTAM_foF2_COEFFS_20210101_010000.ASC"
        );
    }

    #[test]
    fn test_dated_layout() {
        let path = coefficient_path(
            Utf8Path::new("test"),
            DirectoryLayout::Dated,
            IrtamParameter::HmF2,
            &epoch(),
        );
        assert_eq!(
            path,
            Utf8PathBuf::from("test/2021/0101/IRTAM_hmF2_COEFFS_20210101_010000.ASC")
        );
    }

    #[test]
    fn test_flat_layout() {
        let path = coefficient_path(
            Utf8Path::new("test"),
            DirectoryLayout::Flat,
            IrtamParameter::B1,
            &epoch(),
        );
        assert_eq!(
            path,
            Utf8PathBuf::from("test/IRTAM_B1in_COEFFS_20210101_010000.ASC")
        );
        assert!(!path.as_str().contains("2021/"));
    }

    #[test]
    fn test_parse_file_name() {
        for parameter in IrtamParameter::ALL {
            let name = coefficient_file_name(parameter, &epoch());
            assert_eq!(parse_file_name(&name), Some((parameter, epoch())));
        }
        assert_eq!(parse_file_name("IRTAM_foF2_COEFFS_20210101_011000.ASC"), None);
        assert_eq!(parse_file_name("notes.txt"), None);
    }
}
