use std::fs::{self, File};
use std::path::Path;

use chrono::NaiveDate;
use polars::io::parquet::write::ParquetWriter;
use polars::prelude::*;
use tempfile::TempDir;

use starmig_core::error::PipelineError;
use starmig_core::sources::SourceContext;
use starmig_core::warehouse::{all_builders, TableBuilder};

fn builder(name: &str) -> &'static dyn TableBuilder {
    all_builders()
        .iter()
        .copied()
        .find(|builder| builder.table_name() == name)
        .unwrap()
}

fn sas_offset(date: NaiveDate) -> f64 {
    let epoch = NaiveDate::from_ymd_opt(1960, 1, 1).unwrap();
    (date - epoch).num_days() as f64
}

fn engine_days(date: NaiveDate) -> i32 {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
    (date - epoch).num_days() as i32
}

/// Writes a one-part parquet immigration source with rows of
/// (cicid, arrdate, depdate), every column floating-point as in the real
/// extract.
fn write_immigration_source(root: &Path, rows: &[(f64, f64, Option<f64>)]) {
    let dir = root.join("sas_data");
    fs::create_dir_all(&dir).unwrap();

    let mut df = DataFrame::new(vec![
        Series::new("cicid".into(), rows.iter().map(|row| row.0).collect::<Vec<_>>()).into(),
        Series::new("i94visa".into(), vec![7.0f64; rows.len()]).into(),
        Series::new("arrdate".into(), rows.iter().map(|row| row.1).collect::<Vec<_>>()).into(),
        Series::new("depdate".into(), rows.iter().map(|row| row.2).collect::<Vec<_>>()).into(),
    ])
    .unwrap();

    let file = File::create(dir.join("part-0000.parquet")).unwrap();
    ParquetWriter::new(file).finish(&mut df).unwrap();
}

fn write_visa_extract(root: &Path) {
    fs::write(
        root.join("I94VISA.csv"),
        "Code,Visa_type\n1,Business\n2,Pleasure\n3,Student\n",
    )
    .unwrap();
}

fn write_mode_extract(root: &Path, with_extra_mode: bool) {
    let mut content = String::from("Code,Mode\n1,Air\n2,Sea\n3,Land\n9,Not reported\n");
    if with_extra_mode {
        content.push_str("10,Teleport\n");
    }
    fs::write(root.join("I94MODE_output.csv"), content).unwrap();
}

#[test]
fn builders_register_in_execution_order() {
    let names: Vec<&str> = all_builders()
        .iter()
        .map(|builder| builder.table_name())
        .collect();
    assert_eq!(
        names,
        [
            "city_demographics_dim",
            "race_counts_dim",
            "temperature_dim",
            "visa_and_mode_dim",
            "date_dim",
            "immigration_fact",
        ]
    );
}

#[test]
fn city_demographics_zero_fills_and_dedups() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("city_demographics_cleaned.csv"),
        "City,State,Median Age,Male Population,Female Population,Total Population,Number of Veterans,Foreign-born,Average Household Size,State Code\n\
         Springfield,Illinois,34.1,1000,1100,2100,150,300,2.5,IL\n\
         Springfield,Illinois,34.1,1000,1100,2100,150,300,2.5,IL\n\
         Shelbyville,Illinois,,,,,,,,IL\n",
    )
    .unwrap();

    let df = builder("city_demographics_dim")
        .build(&SourceContext::new(dir.path()))
        .unwrap();
    assert_eq!(df.height(), 2);

    let shelbyville = df
        .lazy()
        .filter(col("city").eq(lit("Shelbyville")))
        .collect()
        .unwrap();
    assert_eq!(shelbyville.height(), 1);
    assert_eq!(
        shelbyville
            .column("male_population")
            .unwrap()
            .i32()
            .unwrap()
            .get(0),
        Some(0)
    );
    assert_eq!(
        shelbyville
            .column("average_household_size")
            .unwrap()
            .f64()
            .unwrap()
            .get(0),
        Some(0.0)
    );
    // median_age is not on the fill list and stays missing.
    assert_eq!(shelbyville.column("median_age").unwrap().null_count(), 1);
}

#[test]
fn race_counts_renames_count_to_race_population() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("race_counts.csv"),
        "City,State,Race,Count\nSpringfield,Illinois,White,1500\nSpringfield,Illinois,Asian,400\n",
    )
    .unwrap();

    let df = builder("race_counts_dim")
        .build(&SourceContext::new(dir.path()))
        .unwrap();
    assert_eq!(df.height(), 2);
    assert_eq!(
        df.column("race_population").unwrap().dtype(),
        &DataType::Int32
    );
}

#[test]
fn an_empty_extract_aborts_the_run() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("race_counts.csv"), "City,State,Race,Count\n").unwrap();

    let err = builder("race_counts_dim")
        .build(&SourceContext::new(dir.path()))
        .unwrap_err();
    assert!(matches!(
        err,
        PipelineError::DataAbsent {
            table: "race_counts_dim"
        }
    ));
}

#[test]
fn temperature_dimension_resolves_country_codes() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("GlobalTemperature_clean.csv"),
        "dt,AverageTemperature,AverageTemperatureUncertainty,Country\n\
         2013-01-01,5.2,0.3,china\n\
         2013-01-01,5.2,0.3,china\n\
         2013-02-01,7.9,0.2,atlantis\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("I94COUNTRY_output.csv"),
        "Code,Country\n582,\"CHINA, PRC\"\n332,Iceland\n",
    )
    .unwrap();

    let df = builder("temperature_dim")
        .build(&SourceContext::new(dir.path()))
        .unwrap();
    assert_eq!(df.height(), 2);

    let china = df
        .clone()
        .lazy()
        .filter(col("country").eq(lit("China")))
        .collect()
        .unwrap();
    assert_eq!(china.height(), 1);
    assert_eq!(
        china.column("country_code").unwrap().i32().unwrap().get(0),
        Some(582)
    );
    let years = china
        .column("temp_year")
        .unwrap()
        .cast(&DataType::Int32)
        .unwrap();
    assert_eq!(years.i32().unwrap().get(0), Some(2013));
    let months = china
        .column("temp_month")
        .unwrap()
        .cast(&DataType::Int32)
        .unwrap();
    assert_eq!(months.i32().unwrap().get(0), Some(1));

    // Unmatched categories survive the left join with a null code.
    let unmatched = df
        .lazy()
        .filter(col("country").eq(lit("Atlantis")))
        .collect()
        .unwrap();
    assert_eq!(unmatched.height(), 1);
    assert_eq!(unmatched.column("country_code").unwrap().null_count(), 1);
}

#[test]
fn visa_mode_junk_dimension_is_a_cross_product() {
    let dir = TempDir::new().unwrap();
    write_visa_extract(dir.path());
    write_mode_extract(dir.path(), false);

    let df = builder("visa_and_mode_dim")
        .build(&SourceContext::new(dir.path()))
        .unwrap();
    assert_eq!(df.height(), 12);

    let names: Vec<&str> = df
        .get_column_names()
        .iter()
        .map(|name| name.as_str())
        .collect();
    assert_eq!(names, ["visa_code", "visa_type", "mode_code", "mode"]);
    assert_eq!(df.column("visa_code").unwrap().dtype(), &DataType::Int32);
    assert_eq!(df.column("mode_code").unwrap().dtype(), &DataType::Int32);
}

#[test]
fn a_fifth_transport_mode_is_schema_drift() {
    let dir = TempDir::new().unwrap();
    write_visa_extract(dir.path());
    write_mode_extract(dir.path(), true);

    let err = builder("visa_and_mode_dim")
        .build(&SourceContext::new(dir.path()))
        .unwrap_err();
    match err {
        PipelineError::SchemaDrift {
            table,
            column,
            expected,
            found,
        } => {
            assert_eq!(table, "visa_and_mode_dim");
            assert_eq!(column, "mode");
            assert_eq!(expected, 4);
            assert_eq!(found, 5);
        }
        other => panic!("expected SchemaDrift, got {other}"),
    }
}

#[test]
fn date_dimension_unions_and_expands_the_axis() {
    let dir = TempDir::new().unwrap();
    let jan1 = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    let jan2 = NaiveDate::from_ymd_opt(2020, 1, 2).unwrap();
    let jan3 = NaiveDate::from_ymd_opt(2020, 1, 3).unwrap();
    write_immigration_source(
        dir.path(),
        &[
            (1.0, sas_offset(jan1), Some(sas_offset(jan2))),
            (2.0, sas_offset(jan2), Some(sas_offset(jan3))),
        ],
    );

    let df = builder("date_dim")
        .build(&SourceContext::new(dir.path()))
        .unwrap();
    assert_eq!(df.height(), 3);

    let df = df
        .lazy()
        .sort(["migration_date"], Default::default())
        .collect()
        .unwrap();
    let dates = df.column("migration_date").unwrap().date().unwrap();
    assert_eq!(dates.get(0), Some(engine_days(jan1)));
    assert_eq!(dates.get(1), Some(engine_days(jan2)));
    assert_eq!(dates.get(2), Some(engine_days(jan3)));

    let attr = |name: &str| {
        df.column(name)
            .unwrap()
            .cast(&DataType::Int32)
            .unwrap()
            .i32()
            .unwrap()
            .get(0)
    };
    // 2020-01-01 was a Wednesday in ISO week 1.
    assert_eq!(attr("year"), Some(2020));
    assert_eq!(attr("month"), Some(1));
    assert_eq!(attr("day_of_month"), Some(1));
    assert_eq!(attr("day_of_week"), Some(3));
    assert_eq!(attr("day_of_year"), Some(1));
    assert_eq!(attr("week_of_year"), Some(1));
    assert_eq!(attr("quarter"), Some(1));
}

#[test]
fn immigration_fact_casts_floats_and_materializes_dates() {
    let dir = TempDir::new().unwrap();
    let jan1 = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    let jan2 = NaiveDate::from_ymd_opt(2020, 1, 2).unwrap();
    write_immigration_source(
        dir.path(),
        &[
            (1.0, sas_offset(jan1), Some(sas_offset(jan2))),
            (1.0, sas_offset(jan1), Some(sas_offset(jan2))),
            (3.0, 0.0, None),
        ],
    );

    let df = builder("immigration_fact")
        .build(&SourceContext::new(dir.path()))
        .unwrap();
    assert_eq!(df.height(), 2);

    assert_eq!(df.column("cicid").unwrap().dtype(), &DataType::Int32);
    assert_eq!(df.column("i94visa").unwrap().dtype(), &DataType::Int32);
    assert_eq!(df.column("arrival_date").unwrap().dtype(), &DataType::Date);

    // Offset zero is the epoch itself.
    let epoch_row = df
        .lazy()
        .filter(col("cicid").eq(lit(3)))
        .collect()
        .unwrap();
    assert_eq!(epoch_row.height(), 1);
    let arrival = epoch_row.column("arrival_date").unwrap().date().unwrap();
    assert_eq!(
        arrival.get(0),
        Some(engine_days(NaiveDate::from_ymd_opt(1960, 1, 1).unwrap()))
    );
    assert_eq!(epoch_row.column("departure_date").unwrap().null_count(), 1);
    assert_eq!(
        epoch_row.column("i94visa").unwrap().i32().unwrap().get(0),
        Some(7)
    );
}

#[test]
fn fact_requires_the_day_offset_columns() {
    let dir = TempDir::new().unwrap();
    let sas = dir.path().join("sas_data");
    fs::create_dir_all(&sas).unwrap();
    let mut df =
        DataFrame::new(vec![Series::new("cicid".into(), vec![1.0f64]).into()]).unwrap();
    ParquetWriter::new(File::create(sas.join("part-0000.parquet")).unwrap())
        .finish(&mut df)
        .unwrap();

    let err = builder("immigration_fact")
        .build(&SourceContext::new(dir.path()))
        .unwrap_err();
    match err {
        PipelineError::MissingColumn { table, column } => {
            assert_eq!(table, "immigration_fact");
            assert_eq!(column, "arrdate");
        }
        other => panic!("expected MissingColumn, got {other}"),
    }
}
