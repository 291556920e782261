use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use irtam::{
    coefficients::{CoefficientRecord, IrtamParameter},
    constants::{NJ_IRTAM, NK_IRTAM},
    grid::Grid,
    synthesis::{
        modip::{dipole_modip, GeomagneticPole},
        DiurnalArgument, HarmonicSynthesizer,
    },
    time::CoeffEpoch,
};
use nalgebra::DMatrix;

fn random_record(rng: &mut StdRng, epoch: CoeffEpoch) -> CoefficientRecord {
    let u = DMatrix::from_fn(NJ_IRTAM, NK_IRTAM, |_, _| rng.random_range(-1.0..1.0));
    CoefficientRecord::new(IrtamParameter::FoF2, epoch, u).unwrap()
}

/// 5° × 5° global grid, 15-minute steps over a full day.
fn setup() -> (Grid, Vec<f64>, Vec<DiurnalArgument>) {
    let grid = Grid::regular(5.0, 5.0).unwrap();
    let modip = dipole_modip(grid.lon(), grid.lat(), &GeomagneticPole::default());
    let args = (0..96)
        .map(|i| DiurnalArgument {
            ut_hours: i as f64 * 0.25,
            minutes_from_tov: 0.0,
        })
        .collect();
    (grid, modip, args)
}

fn bench_geographic(c: &mut Criterion) {
    let (grid, modip, _) = setup();
    c.bench_function("harmonic_synthesis/geographic_functions", |b| {
        b.iter(|| HarmonicSynthesizer::new(black_box(&grid), black_box(&modip)).unwrap())
    });
}

fn bench_single_epoch(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(0x1A7A);
    let (grid, modip, args) = setup();
    let synth = HarmonicSynthesizer::new(&grid, &modip).unwrap();
    let record = random_record(&mut rng, CoeffEpoch::new(2022, 3, 1, 12, 0).unwrap());

    c.bench_function("harmonic_synthesis/single_epoch_96_steps", |b| {
        b.iter(|| synth.synthesize(black_box(&record), black_box(&args)))
    });
}

fn bench_per_step_epochs(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(0xBEEF);
    let (grid, modip, args) = setup();
    let synth = HarmonicSynthesizer::new(&grid, &modip).unwrap();

    c.bench_function("harmonic_synthesis/96_epochs", |b| {
        b.iter_batched(
            || {
                (0..96u8)
                    .map(|i| {
                        let epoch = CoeffEpoch::new(2022, 3, 1, i / 4, (i % 4) * 15).unwrap();
                        Some(Arc::new(random_record(&mut rng, epoch)))
                    })
                    .collect::<Vec<_>>()
            },
            |records| synth.synthesize_epochs(black_box(&records), black_box(&args)),
            BatchSize::LargeInput,
        )
    });
}

criterion_group!(
    benches,
    bench_geographic,
    bench_single_epoch,
    bench_per_step_epochs
);
criterion_main!(benches);
