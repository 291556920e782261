//! # Parameter reconciliation
//!
//! Cell-by-cell merge of synthesized (observation-derived) parameters with the
//! background model's values. An observed cell is kept only if its mask is set
//! and its value lies within the parameter's [`Bounds`]; every other cell takes
//! the background value unchanged.
//!
//! Reconciliation never fails. A parameter without a single accepted cell is
//! reported as fully degraded in the [`ReconcileReport`].
use std::collections::BTreeMap;

use log::warn;
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::{
    coefficients::IrtamParameter,
    surface::{SurfaceField, SurfaceParameterSet},
};

/// Closed plausibility interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    pub const fn new(min: f64, max: f64) -> Self {
        Bounds { min, max }
    }

    /// True for finite values within `[min, max]`.
    pub fn contains(&self, value: f64) -> bool {
        value.is_finite() && value >= self.min && value <= self.max
    }
}

/// Plausibility bounds of each parameter.
///
/// Defaults follow the ranges accepted by IRI: foF2 in [0.1, 30] MHz,
/// hmF2 in [100, 1000] km, B0 in [1, 350] km and B1 in [1, 6].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlausibilityTable {
    pub fof2: Bounds,
    pub hmf2: Bounds,
    pub b0: Bounds,
    pub b1: Bounds,
}

impl Default for PlausibilityTable {
    fn default() -> Self {
        PlausibilityTable {
            fof2: Bounds::new(0.1, 30.0),
            hmf2: Bounds::new(100.0, 1000.0),
            b0: Bounds::new(1.0, 350.0),
            b1: Bounds::new(1.0, 6.0),
        }
    }
}

impl PlausibilityTable {
    pub fn get(&self, parameter: IrtamParameter) -> Bounds {
        match parameter {
            IrtamParameter::FoF2 => self.fof2,
            IrtamParameter::HmF2 => self.hmf2,
            IrtamParameter::B0 => self.b0,
            IrtamParameter::B1 => self.b1,
        }
    }
}

/// Cell counts of one reconciled parameter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterReport {
    /// Observed cells kept.
    pub accepted: usize,
    /// Observed cells replaced because they were outside the bounds.
    pub rejected: usize,
    /// Cells without an observed value.
    pub missing: usize,
    /// No observed cell was kept.
    pub fully_degraded: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReconcileReport {
    pub parameters: BTreeMap<IrtamParameter, ParameterReport>,
}

impl ReconcileReport {
    pub fn get(&self, parameter: IrtamParameter) -> Option<&ParameterReport> {
        self.parameters.get(&parameter)
    }

    /// Parameters that fell back entirely to the background model.
    pub fn degraded(&self) -> Vec<IrtamParameter> {
        self.parameters
            .iter()
            .filter(|(_, r)| r.fully_degraded)
            .map(|(p, _)| *p)
            .collect()
    }
}

fn reconcile_field(
    parameter: IrtamParameter,
    observed: &SurfaceField,
    background: &DMatrix<f64>,
    bounds: Bounds,
) -> (SurfaceField, ParameterReport) {
    let mut values = background.clone();
    let (nt, ng) = background.shape();
    let mut valid = DMatrix::from_element(nt, ng, false);
    let mut report = ParameterReport::default();

    if observed.shape() != background.shape() {
        warn!(
            "{parameter}: observed shape {:?} differs from background shape {:?}, \
             using background only",
            observed.shape(),
            background.shape()
        );
        report.missing = nt * ng;
        report.fully_degraded = true;
        return (SurfaceField::new(values, valid), report);
    }

    for ((out, ok), (value, mask)) in values
        .iter_mut()
        .zip(valid.iter_mut())
        .zip(observed.values().iter().zip(observed.valid().iter()))
    {
        if !*mask {
            report.missing += 1;
        } else if bounds.contains(*value) {
            *out = *value;
            *ok = true;
            report.accepted += 1;
        } else {
            report.rejected += 1;
        }
    }

    report.fully_degraded = report.accepted == 0;
    if report.fully_degraded {
        warn!("{parameter}: no usable observed value, background model used everywhere");
    }

    (SurfaceField::new(values, valid), report)
}

/// Merge observed and background parameters.
///
/// Arguments
/// ---------
/// * `observed`: synthesized parameters with their availability masks
/// * `background`: background model parameters (masks are ignored)
/// * `bounds`: plausibility table
///
/// Returns
/// --------
/// * The reconciled set, whose masks mark the cells taken from `observed`,
///   and the per-parameter report.
pub fn reconcile(
    observed: &SurfaceParameterSet,
    background: &SurfaceParameterSet,
    bounds: &PlausibilityTable,
) -> (SurfaceParameterSet, ReconcileReport) {
    let mut report = ReconcileReport::default();

    let mut merge = |parameter: IrtamParameter| {
        let (field, parameter_report) = reconcile_field(
            parameter,
            observed.get(parameter),
            background.get(parameter).values(),
            bounds.get(parameter),
        );
        report.parameters.insert(parameter, parameter_report);
        field
    };

    let reconciled = SurfaceParameterSet {
        fof2: merge(IrtamParameter::FoF2),
        hmf2: merge(IrtamParameter::HmF2),
        b0: merge(IrtamParameter::B0),
        b1: merge(IrtamParameter::B1),
    };
    (reconciled, report)
}
