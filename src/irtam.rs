//! # IRTAM run orchestration
//!
//! [`IrtamRun`] sequences a full reconstruction for one calendar date:
//!
//! 1. validation of the grid and time array,
//! 2. background state and background profile from the [`BackgroundModel`],
//! 3. resolution of the 15-minute coefficient epoch of every time step,
//! 4. harmonic synthesis of foF2, hmF2, B0 and B1,
//! 5. IRI limits, reconciliation with the background, derived layer
//!    parameters and the reconciled profile.
//!
//! Missing or malformed coefficient files never abort a run: the affected
//! time steps fall back to the background model and are reported in
//! [`RunDiagnostics`]. Grid, time and altitude errors are fatal.
//!
//! ## Typical usage
//!
//! ```rust, no_run
//! use irtam::{
//!     coefficients::{source::CoefficientSourceConfig, store::CoefficientStore},
//!     irtam::{IrtamRun, RunConfig},
//! };
//! # use irtam::background::BackgroundModel;
//! # fn model() -> Box<dyn BackgroundModel> { unimplemented!() }
//!
//! let config: RunConfig = unimplemented!("read from a file");
//! let mut store = CoefficientStore::from_config(&config.source).unwrap();
//! let output = IrtamRun::new(config).run(model().as_ref(), &mut store).unwrap();
//!
//! for parameter in output.diagnostics.reconcile.degraded() {
//!     eprintln!("{parameter} fell back to the background model");
//! }
//! ```
use std::collections::{BTreeMap, BTreeSet};

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::{
    background::{BackgroundModel, BackgroundState},
    coefficients::{
        source::CoefficientSourceConfig,
        store::{CoefficientStore, StoreStats},
        IrtamParameter,
    },
    constants::{Hour, Kilometer, Sfu},
    grid::{validate_times, Grid},
    irtam_errors::IrtamError,
    profile::{
        edp_builder::{EdpBuilder, TopsideThickness},
        Profile,
    },
    reconcile::{reconcile, PlausibilityTable, ReconcileReport},
    surface::SurfaceParameterSet,
    synthesis::{diurnal_arguments, HarmonicSynthesizer, TimeOfValidity},
    time::{CalendarDate, CoeffEpoch},
};

/// Inputs of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub date: CalendarDate,
    /// Decimal UT hours after midnight of `date`.
    pub times: Vec<Hour>,
    pub grid: Grid,
    pub altitudes: Vec<Kilometer>,
    /// F10.7 solar flux (sfu).
    pub f107: Sfu,
    #[serde(default)]
    pub source: CoefficientSourceConfig,
    #[serde(default)]
    pub time_of_validity: TimeOfValidity,
    #[serde(default)]
    pub plausibility: PlausibilityTable,
    /// Recompute the F2 topside thickness from the reconciled parameters.
    #[serde(default)]
    pub recompute_topside: bool,
}

/// Coefficient availability of one parameter over the run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochDiagnostics {
    /// Distinct epochs requested.
    pub requested: usize,
    /// Epochs whose coefficients could not be retrieved.
    pub missing: BTreeSet<CoeffEpoch>,
    /// Epochs whose coefficient file could not be decoded.
    pub malformed: BTreeSet<CoeffEpoch>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunDiagnostics {
    pub epochs: BTreeMap<IrtamParameter, EpochDiagnostics>,
    pub reconcile: ReconcileReport,
    pub store: StoreStats,
}

impl RunDiagnostics {
    pub fn missing_count(&self, parameter: IrtamParameter) -> usize {
        self.epochs.get(&parameter).map_or(0, |d| d.missing.len())
    }

    pub fn malformed_count(&self, parameter: IrtamParameter) -> usize {
        self.epochs.get(&parameter).map_or(0, |d| d.malformed.len())
    }

    /// True if any epoch of any parameter failed.
    pub fn has_failures(&self) -> bool {
        self.epochs
            .values()
            .any(|d| !d.missing.is_empty() || !d.malformed.is_empty())
    }
}

/// Products of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutput {
    /// Background model layers.
    pub background: BackgroundState,
    /// Background layers with the F2 and F1 parameters replaced after reconciliation.
    pub reconciled: BackgroundState,
    /// Reconciled foF2, hmF2, B0 and B1 with their observation masks.
    pub parameters: SurfaceParameterSet,
    pub background_profile: Profile,
    pub reconciled_profile: Profile,
    pub diagnostics: RunDiagnostics,
}

#[derive(Debug, Clone)]
pub struct IrtamRun {
    config: RunConfig,
}

impl IrtamRun {
    pub fn new(config: RunConfig) -> Self {
        IrtamRun { config }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    fn topside(&self) -> TopsideThickness {
        if self.config.recompute_topside {
            TopsideThickness::Recomputed {
                f107: self.config.f107,
            }
        } else {
            TopsideThickness::Background
        }
    }

    /// Execute the run.
    ///
    /// Arguments
    /// ---------
    /// * `model`: background ionosphere model
    /// * `store`: coefficient store, usually fresh for every run
    ///
    /// Return
    /// ------
    /// * The run products, or the first fatal error: invalid grid/time input,
    ///   invalid altitudes, or a background model failure.
    pub fn run<M: BackgroundModel + ?Sized>(
        &self,
        model: &M,
        store: &mut CoefficientStore,
    ) -> Result<RunOutput, IrtamError> {
        let cfg = &self.config;
        cfg.grid.validate()?;
        validate_times(&cfg.times)?;
        let (nt, ng) = (cfg.times.len(), cfg.grid.len());

        info!(
            "IRTAM run for {}: {nt} time steps on {ng} grid points",
            cfg.date
        );

        let epochs = cfg
            .times
            .iter()
            .map(|t| CoeffEpoch::from_decimal_hours(&cfg.date, *t))
            .collect::<Result<Vec<_>, _>>()?;

        let background = model.background(&cfg.date, &cfg.grid, &cfg.times, cfg.f107)?;
        background.check_shape(nt, ng)?;
        let background_profile = model.build_profile(&background, &cfg.altitudes)?;
        if background_profile.shape() != (nt, cfg.altitudes.len(), ng) {
            return Err(IrtamError::BackgroundModelError(format!(
                "background profile has shape {:?}, expected {:?}",
                background_profile.shape(),
                (nt, cfg.altitudes.len(), ng)
            )));
        }

        let synthesizer = HarmonicSynthesizer::new(&cfg.grid, &background.modip)?;
        let args = diurnal_arguments(&cfg.date, &cfg.times, &epochs, cfg.time_of_validity);

        let mut diagnostics = RunDiagnostics::default();
        let mut synthesize = |parameter: IrtamParameter| {
            let mut epoch_report = EpochDiagnostics {
                requested: epochs.iter().collect::<BTreeSet<_>>().len(),
                ..Default::default()
            };

            let records = store
                .resolve_many(parameter, &epochs)
                .into_iter()
                .zip(&epochs)
                .map(|(result, epoch)| match result {
                    Ok(record) => Some(record),
                    Err(IrtamError::MalformedCoefficientFile { .. }) => {
                        epoch_report.malformed.insert(*epoch);
                        None
                    }
                    Err(_) => {
                        epoch_report.missing.insert(*epoch);
                        None
                    }
                })
                .collect::<Vec<_>>();

            if !epoch_report.missing.is_empty() || !epoch_report.malformed.is_empty() {
                warn!(
                    "{parameter}: {} missing and {} malformed coefficient epochs out of {}",
                    epoch_report.missing.len(),
                    epoch_report.malformed.len(),
                    epoch_report.requested
                );
            }
            diagnostics.epochs.insert(parameter, epoch_report);

            synthesizer.synthesize_epochs(&records, &args)
        };

        let mut observed = SurfaceParameterSet {
            fof2: synthesize(IrtamParameter::FoF2),
            hmf2: synthesize(IrtamParameter::HmF2),
            b0: synthesize(IrtamParameter::B0),
            b1: synthesize(IrtamParameter::B1),
        };
        observed.apply_iri_limits();

        let (parameters, report) = reconcile(
            &observed,
            &background.surface_parameters(),
            &cfg.plausibility,
        );
        diagnostics.reconcile = report;
        diagnostics.store = store.stats();

        let builder = EdpBuilder::new(self.topside());
        let (f2, f1) = builder.merge_layers(&parameters, &background);
        let reconciled = BackgroundState {
            f2,
            f1,
            e: background.e.clone(),
            modip: background.modip.clone(),
        };

        let merged = builder.build(&reconciled.f2, &reconciled.f1, &reconciled.e, &cfg.altitudes)?;
        let reconciled_profile = keep_background_columns(
            &merged,
            &background_profile,
            &parameters.any_valid(),
        )?;

        info!(
            "IRTAM run for {} done: {} coefficient fetches, {} failures",
            cfg.date, diagnostics.store.fetches, diagnostics.store.failures
        );

        Ok(RunOutput {
            background,
            reconciled,
            parameters,
            background_profile,
            reconciled_profile,
            diagnostics,
        })
    }
}

/// Copy the background profile into every column without an observed parameter.
fn keep_background_columns(
    merged: &Profile,
    background: &Profile,
    observed: &nalgebra::DMatrix<bool>,
) -> Result<Profile, IrtamError> {
    let slices = merged
        .slices()
        .iter()
        .zip(background.slices())
        .enumerate()
        .map(|(t, (merged, background))| {
            let mut slice = merged.clone();
            for g in (0..slice.ncols()).filter(|g| !observed[(t, *g)]) {
                slice.column_mut(g).copy_from(&background.column(g));
            }
            slice
        })
        .collect();
    Profile::new(merged.altitudes().to_vec(), slices)
}
