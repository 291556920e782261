#![allow(dead_code)]

use camino::{Utf8Path, Utf8PathBuf};
use irtam::{
    background::{BackgroundModel, BackgroundState, ELayer, F1Layer, F2Layer},
    coefficients::{
        layout::{coefficient_path, DirectoryLayout},
        CoefficientRecord, IrtamParameter,
    },
    constants::{Hour, Sfu, NJ_IRTAM, NK_IRTAM},
    grid::Grid,
    profile::edp_builder::freq_to_nm,
    synthesis::modip::{dipole_modip, GeomagneticPole},
    time::{CalendarDate, CoeffEpoch},
    IrtamError,
};
use nalgebra::DMatrix;
use tempfile::TempDir;

/// Background model returning the same layer parameters everywhere.
#[derive(Debug, Clone)]
pub struct UniformBackground {
    pub fof2: f64,
    pub hmf2: f64,
    pub b0: f64,
    pub b1: f64,
    pub with_f1: bool,
}

impl Default for UniformBackground {
    fn default() -> Self {
        UniformBackground {
            fof2: 6.0,
            hmf2: 300.0,
            b0: 100.0,
            b1: 2.0,
            with_f1: true,
        }
    }
}

impl BackgroundModel for UniformBackground {
    fn background(
        &self,
        _date: &CalendarDate,
        grid: &Grid,
        times: &[Hour],
        _f107: Sfu,
    ) -> Result<BackgroundState, IrtamError> {
        let (nt, ng) = (times.len(), grid.len());
        let fill = |v: f64| DMatrix::from_element(nt, ng, v);
        let nm_f1 = if self.with_f1 { 2.0e11 } else { f64::NAN };

        Ok(BackgroundState {
            f2: F2Layer {
                nm: fill(freq_to_nm(self.fof2)),
                fo: fill(self.fof2),
                hm: fill(self.hmf2),
                b0: fill(self.b0),
                b1: fill(self.b1),
                b_top: fill(40.0),
            },
            f1: F1Layer {
                nm: fill(nm_f1),
                hm: fill(200.0),
                b_bot: fill(20.0),
                p: fill(if self.with_f1 { 1.0 } else { 0.0 }),
            },
            e: ELayer {
                nm: fill(1.0e11),
                hm: fill(110.0),
                b_bot: fill(5.0),
                b_top: fill(7.0),
            },
            modip: dipole_modip(grid.lon(), grid.lat(), &GeomagneticPole::default()),
        })
    }
}

pub fn temp_root() -> (TempDir, Utf8PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
    (dir, root)
}

/// Record whose only non-zero coefficient is the constant term.
pub fn constant_record(
    parameter: IrtamParameter,
    epoch: CoeffEpoch,
    value: f64,
) -> CoefficientRecord {
    let mut u = DMatrix::zeros(NJ_IRTAM, NK_IRTAM);
    u[(0, 0)] = value;
    CoefficientRecord::new(parameter, epoch, u).unwrap()
}

/// Write `record` where a local source with `layout` expects it.
pub fn write_record(
    root: &Utf8Path,
    layout: DirectoryLayout,
    record: &CoefficientRecord,
) -> Utf8PathBuf {
    let path = coefficient_path(root, layout, record.parameter(), &record.epoch());
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, record.to_asc()).unwrap();
    path
}

/// Typical quiet-time values of the four characteristics.
pub fn constant_value(parameter: IrtamParameter) -> f64 {
    match parameter {
        IrtamParameter::FoF2 => 9.0,
        IrtamParameter::HmF2 => 350.0,
        IrtamParameter::B0 => 120.0,
        IrtamParameter::B1 => 2.5,
    }
}

/// Write constant records of every parameter at every epoch.
pub fn write_constant_records(root: &Utf8Path, layout: DirectoryLayout, epochs: &[CoeffEpoch]) {
    for epoch in epochs {
        for parameter in IrtamParameter::ALL {
            write_record(
                root,
                layout,
                &constant_record(parameter, *epoch, constant_value(parameter)),
            );
        }
    }
}

pub fn small_grid() -> Grid {
    Grid::new(
        vec![-180.0, -75.0, 0.0, 60.0, 180.0],
        vec![-90.0, -12.0, 0.0, 45.0, 90.0],
    )
    .unwrap()
}
