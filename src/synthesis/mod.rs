//! # Harmonic synthesis
//!
//! Evaluation of IRTAM coefficient matrices on a grid for a batch of times.
//!
//! For one coefficient matrix `U` (14 × 76), the field at every (time, point)
//! cell is
//!
//! ```text
//! F = (D · U) · G        D: T × 14 diurnal functions
//!                        G: 76 × n geographic functions
//! ```
//!
//! `G` depends only on the grid and is assembled once in
//! [`HarmonicSynthesizer::new`]. Each epoch then costs two matrix products
//! over the time rows that share it, so a full day on a few thousand points
//! stays in O(n × T × 76).
//!
//! ## See also
//! ------------
//! * [`geographic::geographic_functions`] – Assembly of `G`.
//! * [`diurnal::diurnal_functions`] – Assembly of `D`.
//! * [`modip`] – Modified dip latitude, the spatial argument of `G`.
pub mod diurnal;
pub mod geographic;
pub mod modip;

use std::sync::Arc;

use itertools::Itertools;
use log::debug;
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::{
    coefficients::CoefficientRecord,
    constants::{Degree, Hour},
    grid::Grid,
    irtam_errors::IrtamError,
    surface::SurfaceField,
    time::{CalendarDate, CoeffEpoch},
};

pub use diurnal::DiurnalArgument;
use diurnal::diurnal_functions;
use geographic::geographic_functions;

/// Reference instant of the time-of-validity diurnal term.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum TimeOfValidity {
    /// The epoch of the coefficient set in use.
    #[default]
    Epoch,
    /// A fixed UT (decimal hours) on the run date.
    Fixed(Hour),
}

impl TimeOfValidity {
    /// Minutes from the time of validity to `time` hours after midnight of `date`.
    pub fn minutes_from_tov(&self, date: &CalendarDate, time: Hour, epoch: &CoeffEpoch) -> f64 {
        match self {
            TimeOfValidity::Epoch => epoch.minutes_until(date.instant(time)),
            TimeOfValidity::Fixed(tov) => (time - tov) * 60.0,
        }
    }
}

/// Diurnal arguments of a time array whose steps resolve to `epochs`.
pub fn diurnal_arguments(
    date: &CalendarDate,
    times: &[Hour],
    epochs: &[CoeffEpoch],
    tov: TimeOfValidity,
) -> Vec<DiurnalArgument> {
    times
        .iter()
        .zip(epochs)
        .map(|(&time, epoch)| DiurnalArgument {
            ut_hours: time,
            minutes_from_tov: tov.minutes_from_tov(date, time, epoch),
        })
        .collect()
}

/// Evaluator of IRTAM expansions on a fixed grid.
#[derive(Debug, Clone)]
pub struct HarmonicSynthesizer {
    g: DMatrix<f64>,
}

impl HarmonicSynthesizer {
    /// Assemble the geographic functions of `grid`.
    ///
    /// Arguments
    /// ---------
    /// * `grid`: validated horizontal grid
    /// * `modip`: modified dip latitude (degrees) of every grid point
    ///
    /// Return
    /// ------
    /// * The synthesizer, or [`IrtamError::InvalidGridOrTimeInput`] if `modip`
    ///   does not match the grid or holds non-finite values.
    pub fn new(grid: &Grid, modip: &[Degree]) -> Result<Self, IrtamError> {
        if modip.len() != grid.len() {
            return Err(IrtamError::InvalidGridOrTimeInput(format!(
                "modip has {} values for a grid of {} points",
                modip.len(),
                grid.len()
            )));
        }
        if let Some(i) = modip.iter().position(|m| !m.is_finite()) {
            return Err(IrtamError::InvalidGridOrTimeInput(format!(
                "non-finite modip at index {i}"
            )));
        }

        Ok(HarmonicSynthesizer {
            g: geographic_functions(grid.lon(), grid.lat(), modip),
        })
    }

    /// Number of grid points.
    pub fn npoints(&self) -> usize {
        self.g.ncols()
    }

    /// The geographic function matrix `G` (76 × n).
    pub fn geographic(&self) -> &DMatrix<f64> {
        &self.g
    }

    /// Evaluate one coefficient set for every argument: a `T × n` matrix.
    pub fn synthesize(&self, record: &CoefficientRecord, args: &[DiurnalArgument]) -> DMatrix<f64> {
        let d = diurnal_functions(args);
        (d * record.matrix()) * &self.g
    }

    /// Evaluate a time array where each step has its own coefficient set.
    ///
    /// `records[t]` is the set resolved for step `t`, `None` when it could not be
    /// obtained. Steps sharing an epoch are evaluated together. Missing steps are
    /// filled with NaN and flagged invalid.
    pub fn synthesize_epochs(
        &self,
        records: &[Option<Arc<CoefficientRecord>>],
        args: &[DiurnalArgument],
    ) -> SurfaceField {
        let (nt, ng) = (args.len(), self.npoints());
        let mut values = DMatrix::from_element(nt, ng, f64::NAN);
        let mut valid = DMatrix::from_element(nt, ng, false);

        let groups = records
            .iter()
            .enumerate()
            .take(nt)
            .filter_map(|(t, record)| record.as_ref().map(|r| (r.epoch(), t)))
            .into_group_map();

        for rows in groups.into_values() {
            let Some(record) = records[rows[0]].as_ref() else {
                continue;
            };
            let group_args: Vec<DiurnalArgument> = rows.iter().map(|&t| args[t]).collect();
            let block = self.synthesize(record, &group_args);

            debug!(
                "Synthesized {} at {} for {} time steps",
                record.parameter(),
                record.epoch(),
                rows.len()
            );

            for (r, &t) in rows.iter().enumerate() {
                values.row_mut(t).copy_from(&block.row(r));
                valid.row_mut(t).fill(true);
            }
        }

        SurfaceField::new(values, valid)
    }
}
