mod common;

use approx::assert_relative_eq;
use common::{temp_root, write_record};
use irtam::{
    coefficients::{
        layout::{coefficient_path, DirectoryLayout},
        source::{CoefficientSource, CoefficientSourceConfig, LocalDirectory},
        store::CoefficientStore,
        CoefficientRecord, IrtamParameter,
    },
    constants::{IRTAM_COEFF_COUNT, NJ_IRTAM, NK_IRTAM},
    time::CoeffEpoch,
    IrtamError,
};
use nalgebra::DMatrix;
use rand::{rngs::StdRng, Rng, SeedableRng};

fn random_record(parameter: IrtamParameter, epoch: CoeffEpoch, seed: u64) -> CoefficientRecord {
    let mut rng = StdRng::seed_from_u64(seed);
    let u = DMatrix::from_fn(NJ_IRTAM, NK_IRTAM, |_, _| rng.random_range(-50.0..50.0));
    CoefficientRecord::new(parameter, epoch, u).unwrap()
}

#[test]
fn test_written_file_reads_back() {
    let (_dir, root) = temp_root();
    let epoch = CoeffEpoch::new(2021, 12, 31, 23, 45).unwrap();
    let record = random_record(IrtamParameter::HmF2, epoch, 42);
    let path = write_record(&root, DirectoryLayout::Dated, &record);

    assert!(path
        .as_str()
        .ends_with("2021/1231/IRTAM_hmF2_COEFFS_20211231_234500.ASC"));

    let read = CoefficientRecord::read_file(&path, IrtamParameter::HmF2, epoch).unwrap();
    for (a, b) in read.matrix().iter().zip(record.matrix().iter()) {
        assert_relative_eq!(*a, *b, max_relative = 1e-15);
    }

    let named = CoefficientRecord::read_named_file(&path).unwrap();
    assert_eq!(named.parameter(), IrtamParameter::HmF2);
    assert_eq!(named.epoch(), epoch);
}

#[test]
fn test_header_mismatch_is_malformed() {
    let (_dir, root) = temp_root();
    let written = CoeffEpoch::new(2022, 1, 1, 0, 0).unwrap();
    let record = random_record(IrtamParameter::B0, written, 7);
    let path = write_record(&root, DirectoryLayout::Flat, &record);

    let err = CoefficientRecord::read_file(&path, IrtamParameter::B1, written).unwrap_err();
    assert!(matches!(err, IrtamError::MalformedCoefficientFile { .. }));

    let other = CoeffEpoch::new(2022, 1, 1, 0, 15).unwrap();
    let err = CoefficientRecord::read_file(&path, IrtamParameter::B0, other).unwrap_err();
    assert!(err.to_string().contains("header mismatch"));
}

#[test]
fn test_headerless_fortran_file() {
    let (_dir, root) = temp_root();
    let epoch = CoeffEpoch::new(2022, 5, 10, 14, 30).unwrap();
    let path = coefficient_path(&root, DirectoryLayout::Flat, IrtamParameter::FoF2, &epoch);

    let body = (0..IRTAM_COEFF_COUNT)
        .map(|i| format!("{:.6}D+00", i as f64 / 1000.0))
        .collect::<Vec<_>>()
        .chunks(5)
        .map(|c| c.join("  "))
        .collect::<Vec<_>>()
        .join("\n");
    std::fs::write(&path, body).unwrap();

    let record = CoefficientRecord::read_file(&path, IrtamParameter::FoF2, epoch).unwrap();
    assert_relative_eq!(record.matrix()[(1, 0)], 0.988);
    assert_relative_eq!(record.matrix()[(2, 0)], 0.001);
}

#[test]
fn test_creation_timestamp_in_header() {
    let (_dir, root) = temp_root();
    let epoch = CoeffEpoch::new(2022, 5, 10, 14, 30).unwrap();
    let record = random_record(IrtamParameter::B1, epoch, 5);
    let path = coefficient_path(&root, DirectoryLayout::Flat, IrtamParameter::B1, &epoch);

    let text = record.to_asc().replacen(
        "#START_HEADER\n",
        "#START_HEADER\n# Creation time: 2022-05-10T14:41:07\n",
        1,
    );
    std::fs::write(&path, text).unwrap();

    let read = CoefficientRecord::read_named_file(&path).unwrap();
    assert_eq!(read.epoch(), epoch);
    assert_eq!(read.matrix(), record.matrix());
}

#[test]
fn test_truncated_file_reports_counts() {
    let (_dir, root) = temp_root();
    let epoch = CoeffEpoch::new(2022, 5, 10, 14, 30).unwrap();
    let path = coefficient_path(&root, DirectoryLayout::Flat, IrtamParameter::FoF2, &epoch);
    std::fs::write(&path, "#START_HEADER\n#END_HEADER\n1.0 2.0 3.0\n").unwrap();

    let err = CoefficientRecord::read_file(&path, IrtamParameter::FoF2, epoch).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("expected 1064"));
    assert!(message.contains("found 3"));
}

#[test]
fn test_local_source_layouts() {
    let (_dir, root) = temp_root();
    let epoch = CoeffEpoch::new(2023, 7, 4, 9, 15).unwrap();
    let record = random_record(IrtamParameter::B1, epoch, 3);
    write_record(&root, DirectoryLayout::Flat, &record);

    let flat = LocalDirectory::new(root.clone(), DirectoryLayout::Flat);
    assert!(flat.fetch(IrtamParameter::B1, &epoch).is_ok());

    let dated = LocalDirectory::new(root, DirectoryLayout::Dated);
    assert!(matches!(
        dated.fetch(IrtamParameter::B1, &epoch),
        Err(IrtamError::CoefficientUnavailable { .. })
    ));
}

#[test]
fn test_store_from_descriptor() {
    let (_dir, root) = temp_root();
    let epoch = CoeffEpoch::new(2023, 7, 4, 9, 15).unwrap();
    let record = random_record(IrtamParameter::FoF2, epoch, 11);
    write_record(&root, DirectoryLayout::Dated, &record);

    let config = CoefficientSourceConfig::try_from(format!("local:{root}").as_str()).unwrap();
    let mut store = CoefficientStore::from_config(&config).unwrap();

    // 09:22:30 is the tie between 09:15 and 09:30
    let instant = hifitime::Epoch::from_gregorian_utc(2023, 7, 4, 9, 22, 29, 0);
    let resolved = store.resolve(IrtamParameter::FoF2, instant).unwrap();
    assert_eq!(resolved.epoch(), epoch);

    let tie = hifitime::Epoch::from_gregorian_utc(2023, 7, 4, 9, 22, 30, 0);
    assert!(store.resolve(IrtamParameter::FoF2, tie).is_err());
    assert_eq!(store.stats().fetches, 2);
}
