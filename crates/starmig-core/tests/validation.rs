use std::fs;

use tempfile::TempDir;

use starmig_core::error::PipelineError;
use starmig_core::validation::validate_csv_extract;

#[test]
fn preflight_names_the_missing_column() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("extract.csv");
    fs::write(&path, "City,State\nSpringfield,Illinois\n").unwrap();

    let err = validate_csv_extract(
        &path,
        "city_demographics_dim",
        &["City", "State", "State Code"],
    )
    .unwrap_err();

    match err {
        PipelineError::MissingColumn { table, column } => {
            assert_eq!(table, "city_demographics_dim");
            assert_eq!(column, "State Code");
        }
        other => panic!("expected MissingColumn, got {other}"),
    }
}

#[test]
fn preflight_accepts_complete_headers() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("extract.csv");
    fs::write(&path, "City,State,State Code\nSpringfield,Illinois,IL\n").unwrap();

    validate_csv_extract(&path, "city_demographics_dim", &["City", "State Code"]).unwrap();
}

#[test]
fn preflight_surfaces_missing_files_as_io_errors() {
    let dir = TempDir::new().unwrap();
    let err = validate_csv_extract(
        &dir.path().join("absent.csv"),
        "city_demographics_dim",
        &["City"],
    )
    .unwrap_err();

    assert!(matches!(err, PipelineError::Csv(_)));
}
