//! # Coefficient retrieval
//!
//! A [`CoefficientSource`] makes sure the coefficient file of a given
//! (parameter, epoch) exists locally and returns its path. The crate ships two
//! sources:
//!
//! - [`LocalDirectory`] – files must already be on disk,
//! - [`GambitArchive`] (feature `download`) – missing files are fetched from the
//!   GAMBIT archive of the Lowell GIRO Data Center and written under the root.
//!
//! Sources are usually built from a [`CoefficientSourceConfig`], which can itself
//! be parsed from a short descriptor:
//!
//! ```rust
//! use irtam::coefficients::source::CoefficientSourceConfig;
//!
//! let config = CoefficientSourceConfig::try_from("local:/data/irtam").unwrap();
//! assert!(!config.allow_download);
//! assert!(config.use_subdirs);
//! ```
use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    coefficients::{
        layout::{coefficient_path, default_coefficient_dir, DirectoryLayout},
        IrtamParameter,
    },
    irtam_errors::IrtamError,
    time::CoeffEpoch,
};

/// Base URL of the GAMBIT coefficient service.
pub const GAMBIT_URL: &str = "https://lgdc.uml.edu/rix/gambit-coeffs";

/// Retrieval collaborator: ensures a coefficient file exists locally.
pub trait CoefficientSource {
    /// Return the local path of the coefficients of `parameter` at `epoch`.
    ///
    /// Errors are reported as [`IrtamError::CoefficientUnavailable`] when the
    /// file cannot be found or retrieved.
    fn fetch(&self, parameter: IrtamParameter, epoch: &CoeffEpoch)
        -> Result<Utf8PathBuf, IrtamError>;
}

/// Coefficients already present in a local directory.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalDirectory {
    root: Utf8PathBuf,
    layout: DirectoryLayout,
}

impl LocalDirectory {
    pub fn new(root: impl Into<Utf8PathBuf>, layout: DirectoryLayout) -> Self {
        LocalDirectory {
            root: root.into(),
            layout,
        }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }
}

impl CoefficientSource for LocalDirectory {
    fn fetch(
        &self,
        parameter: IrtamParameter,
        epoch: &CoeffEpoch,
    ) -> Result<Utf8PathBuf, IrtamError> {
        let path = coefficient_path(&self.root, self.layout, parameter, epoch);
        if path.is_file() {
            debug!("Found coefficient file {path}");
            Ok(path)
        } else {
            Err(IrtamError::CoefficientUnavailable {
                parameter,
                epoch: *epoch,
                reason: format!("unknown IRTAM coefficient file: {path}"),
            })
        }
    }
}

#[cfg(feature = "download")]
pub use gambit::GambitArchive;

#[cfg(feature = "download")]
mod gambit {
    use std::{fs, time::Duration};

    use camino::Utf8PathBuf;
    use log::{info, warn};
    use ureq::Agent;

    use super::{CoefficientSource, GAMBIT_URL};
    use crate::{
        coefficients::{
            layout::{coefficient_path, DirectoryLayout},
            IrtamParameter,
        },
        irtam_errors::IrtamError,
        time::CoeffEpoch,
    };

    /// Coefficients fetched on demand from the GAMBIT archive.
    ///
    /// Existing files are reused unless `overwrite` is set.
    #[derive(Debug, Clone)]
    pub struct GambitArchive {
        root: Utf8PathBuf,
        layout: DirectoryLayout,
        overwrite: bool,
        http_client: Agent,
    }

    impl GambitArchive {
        pub fn new(root: impl Into<Utf8PathBuf>, layout: DirectoryLayout, overwrite: bool) -> Self {
            let config = Agent::config_builder()
                .timeout_global(Some(Duration::from_secs(10)))
                .build();
            GambitArchive {
                root: root.into(),
                layout,
                overwrite,
                http_client: config.into(),
            }
        }

        /// Query URL of the coefficients of `parameter` at `epoch`.
        pub fn query_url(parameter: IrtamParameter, epoch: &CoeffEpoch) -> String {
            format!(
                "{GAMBIT_URL}?charName={}&time={}",
                parameter.name(),
                epoch.query_stamp()
            )
        }

        fn download(&self, url: &str) -> Result<String, IrtamError> {
            let mut response = self.http_client.get(url).call()?;
            Ok(response.body_mut().read_to_string()?)
        }
    }

    impl CoefficientSource for GambitArchive {
        fn fetch(
            &self,
            parameter: IrtamParameter,
            epoch: &CoeffEpoch,
        ) -> Result<Utf8PathBuf, IrtamError> {
            let path = coefficient_path(&self.root, self.layout, parameter, epoch);
            let unavailable = |reason: String| IrtamError::CoefficientUnavailable {
                parameter,
                epoch: *epoch,
                reason,
            };

            if path.is_file() {
                if !self.overwrite {
                    return Ok(path);
                }
                info!("Overwriting IRTAM parameter coefficient file: {path}");
            }

            if let Some(dir) = path.parent() {
                if !dir.is_dir() {
                    fs::create_dir_all(dir).map_err(|e| {
                        unavailable(format!("cannot create coefficient directory {dir}: {e}"))
                    })?;
                    info!("Created coefficient directory: {dir}");
                }
            }

            let url = GambitArchive::query_url(parameter, epoch);
            info!("Downloading coefficients from GAMBIT for: {parameter} at {epoch}");

            let body = self
                .download(&url)
                .map_err(|e| unavailable(format!("request {url} failed: {e}")))?;

            if !body.contains("START_HEADER") {
                let msg = format!(
                    "Bad IRTAM coefficient query: {url}\nRemote message: {}",
                    body.trim()
                );
                warn!("{msg}");
                return Err(unavailable(msg));
            }

            fs::write(&path, body)
                .map_err(|e| unavailable(format!("cannot write {path}: {e}")))?;
            info!("Saved as: {path}");
            Ok(path)
        }
    }

}

/// User-facing description of where coefficients come from.
///
/// Fields
/// -----------------
/// * `directory` – Coefficient root, `None` for the default cache directory.
/// * `use_subdirs` – Store files under `YYYY/MMDD` subdirectories.
/// * `allow_download` – Fetch missing files from GAMBIT (requires the `download` feature).
/// * `overwrite` – Re-download files that already exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoefficientSourceConfig {
    #[serde(default)]
    pub directory: Option<Utf8PathBuf>,
    #[serde(default = "default_use_subdirs")]
    pub use_subdirs: bool,
    #[serde(default)]
    pub allow_download: bool,
    #[serde(default)]
    pub overwrite: bool,
}

fn default_use_subdirs() -> bool {
    true
}

impl Default for CoefficientSourceConfig {
    fn default() -> Self {
        CoefficientSourceConfig {
            directory: None,
            use_subdirs: default_use_subdirs(),
            allow_download: false,
            overwrite: false,
        }
    }
}

impl CoefficientSourceConfig {
    /// Local, read-only coefficient directory with the dated layout.
    pub fn local(directory: impl Into<Utf8PathBuf>) -> Self {
        CoefficientSourceConfig {
            directory: Some(directory.into()),
            ..Default::default()
        }
    }

    pub fn layout(&self) -> DirectoryLayout {
        DirectoryLayout::from_subdirs(self.use_subdirs)
    }

    /// Coefficient root, falling back to the default cache directory.
    pub fn root(&self) -> Result<Utf8PathBuf, IrtamError> {
        match &self.directory {
            Some(dir) if !dir.as_str().is_empty() => Ok(dir.clone()),
            _ => default_coefficient_dir(),
        }
    }

    /// Build the retrieval collaborator described by this configuration.
    pub fn build(&self) -> Result<Box<dyn CoefficientSource>, IrtamError> {
        let root = self.root()?;

        if self.allow_download {
            #[cfg(feature = "download")]
            {
                return Ok(Box::new(GambitArchive::new(
                    root,
                    self.layout(),
                    self.overwrite,
                )));
            }

            #[cfg(not(feature = "download"))]
            {
                return Err(IrtamError::InvalidCoefficientSource(
                    "coefficient download requested but the download feature is disabled".into(),
                ));
            }
        }

        Ok(Box::new(LocalDirectory::new(root, self.layout())))
    }
}

impl TryFrom<&str> for CoefficientSourceConfig {
    type Error = IrtamError;

    /// Parse `local`, `local:<dir>`, `gambit` or `gambit:<dir>`.
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let (kind, dir) = match value.split_once(':') {
            Some((kind, dir)) => (kind, Some(dir.trim())),
            None => (value, None),
        };
        let directory = dir.filter(|d| !d.is_empty()).map(Utf8PathBuf::from);

        match kind.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(CoefficientSourceConfig {
                directory,
                ..Default::default()
            }),
            "gambit" => Ok(CoefficientSourceConfig {
                directory,
                allow_download: true,
                ..Default::default()
            }),
            _ => Err(IrtamError::InvalidCoefficientSource(value.to_string())),
        }
    }
}
