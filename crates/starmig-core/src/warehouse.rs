use std::sync::Arc;

use once_cell::sync::Lazy;
use polars::prelude::*;
use starmig_bucket::{BucketStore, LocalBucketStore, S3BucketStore};
use tracing::{info, warn};

use crate::config::WarehouseConfig;
use crate::dedup::drop_exact_duplicates;
use crate::error::{PipelineError, Result};
use crate::outputs;
use crate::quality::{ensure_cardinality, ensure_non_empty, CardinalityCheck};
use crate::reference::{resolve_reference, COUNTRY_ALIASES};
use crate::schema::normalize;
use crate::sources::SourceContext;
use crate::tables;
use crate::validation::validate_csv_extract;

/// Builds one published table from the raw extracts. Builders run in
/// registration order and own their output exclusively for the run; the
/// first failure halts the whole run with no partial publication.
pub trait TableBuilder: Send + Sync {
    fn table_name(&self) -> &'static str;
    fn build(&self, sources: &SourceContext) -> Result<DataFrame>;
}

static BUILDERS: Lazy<Vec<&'static dyn TableBuilder>> = Lazy::new(|| {
    vec![
        &CityDemographicsBuilder as &dyn TableBuilder,
        &RaceCountsBuilder,
        &TemperatureBuilder,
        &VisaModeBuilder,
        &DateDimensionBuilder,
        &ImmigrationFactBuilder,
    ]
});

pub fn all_builders() -> &'static [&'static dyn TableBuilder] {
    BUILDERS.as_slice()
}

/// Process-wide run state: acquired once per run, dropped at run end.
pub struct Warehouse {
    sources: SourceContext,
    store: Arc<dyn BucketStore>,
    key_prefix: String,
}

impl Warehouse {
    /// Builds the storage backend and source context for one run. With AWS
    /// settings the destination root is a key prefix inside the configured
    /// bucket; without them it is a directory on the local filesystem.
    pub async fn bootstrap(config: WarehouseConfig) -> Result<Self> {
        let (store, key_prefix): (Arc<dyn BucketStore>, String) = match &config.aws {
            Some(aws) => (
                Arc::new(S3BucketStore::new(aws.to_s3_config()).await?),
                config.destination_root.clone(),
            ),
            None => (
                Arc::new(LocalBucketStore::new(config.destination_root.clone())),
                String::new(),
            ),
        };

        Ok(Self {
            sources: SourceContext::new(config.source_root),
            store,
            key_prefix,
        })
    }

    /// Sequences the table builders and publishes each gated result,
    /// overwriting the previous object at the same key.
    pub async fn run(&self) -> Result<()> {
        for builder in all_builders() {
            info!(table = builder.table_name(), "building table");
            let df = builder.build(&self.sources)?;
            outputs::publish_table(
                self.store.as_ref(),
                &self.key_prefix,
                builder.table_name(),
                &df,
            )
            .await?;
        }
        Ok(())
    }
}

struct CityDemographicsBuilder;

impl TableBuilder for CityDemographicsBuilder {
    fn table_name(&self) -> &'static str {
        "city_demographics_dim"
    }

    fn build(&self, sources: &SourceContext) -> Result<DataFrame> {
        let schema = tables::city_demographics();
        validate_csv_extract(
            &sources.extract_path(tables::CITY_DEMOGRAPHICS_EXTRACT),
            self.table_name(),
            &schema.source_columns(),
        )?;

        let raw = sources.csv_extract(tables::CITY_DEMOGRAPHICS_EXTRACT)?;
        let lf = normalize(raw, &schema)?;
        let df = drop_exact_duplicates(lf).collect()?;

        ensure_non_empty(&df, self.table_name())?;
        Ok(df)
    }
}

struct RaceCountsBuilder;

impl TableBuilder for RaceCountsBuilder {
    fn table_name(&self) -> &'static str {
        "race_counts_dim"
    }

    fn build(&self, sources: &SourceContext) -> Result<DataFrame> {
        let schema = tables::race_counts();
        validate_csv_extract(
            &sources.extract_path(tables::RACE_COUNTS_EXTRACT),
            self.table_name(),
            &schema.source_columns(),
        )?;

        let raw = sources.csv_extract(tables::RACE_COUNTS_EXTRACT)?;
        let lf = normalize(raw, &schema)?;
        let df = drop_exact_duplicates(lf).collect()?;

        ensure_non_empty(&df, self.table_name())?;
        Ok(df)
    }
}

struct TemperatureBuilder;

impl TableBuilder for TemperatureBuilder {
    fn table_name(&self) -> &'static str {
        "temperature_dim"
    }

    fn build(&self, sources: &SourceContext) -> Result<DataFrame> {
        let schema = tables::temperature();
        let codes_schema = tables::country_codes();
        validate_csv_extract(
            &sources.extract_path(tables::TEMPERATURE_EXTRACT),
            self.table_name(),
            &schema.source_columns(),
        )?;
        validate_csv_extract(
            &sources.extract_path(tables::COUNTRY_CODES_EXTRACT),
            self.table_name(),
            &codes_schema.source_columns(),
        )?;

        let raw = sources.csv_extract(tables::TEMPERATURE_EXTRACT)?;
        let lf = normalize(raw, &schema)?.with_columns([
            col("record_date").dt().year().alias("temp_year"),
            col("record_date").dt().month().alias("temp_month"),
        ]);

        let codes = normalize(
            sources.csv_extract(tables::COUNTRY_CODES_EXTRACT)?,
            &codes_schema,
        )?;
        let lf = resolve_reference(
            lf,
            "country",
            codes,
            "country",
            "country_code",
            &COUNTRY_ALIASES,
        );

        let df = drop_exact_duplicates(lf).collect()?;
        ensure_non_empty(&df, self.table_name())?;

        let unmatched = df.column("country_code")?.null_count();
        if unmatched > 0 {
            warn!(
                table = self.table_name(),
                unmatched, "categories without a reference code"
            );
        }

        Ok(df)
    }
}

struct VisaModeBuilder;

impl TableBuilder for VisaModeBuilder {
    fn table_name(&self) -> &'static str {
        "visa_and_mode_dim"
    }

    fn build(&self, sources: &SourceContext) -> Result<DataFrame> {
        let visa_schema = tables::visa_categories();
        let mode_schema = tables::travel_modes();
        validate_csv_extract(
            &sources.extract_path(tables::VISA_CATEGORIES_EXTRACT),
            self.table_name(),
            &visa_schema.source_columns(),
        )?;
        validate_csv_extract(
            &sources.extract_path(tables::TRAVEL_MODES_EXTRACT),
            self.table_name(),
            &mode_schema.source_columns(),
        )?;

        let visas = normalize(
            sources.csv_extract(tables::VISA_CATEGORIES_EXTRACT)?,
            &visa_schema,
        )?;
        let modes = normalize(
            sources.csv_extract(tables::TRAVEL_MODES_EXTRACT)?,
            &mode_schema,
        )?;

        let df = drop_exact_duplicates(visas.cross_join(modes, None)).collect()?;

        ensure_non_empty(&df, self.table_name())?;
        ensure_cardinality(
            &df,
            self.table_name(),
            CardinalityCheck {
                column: "visa_type",
                expected: tables::EXPECTED_VISA_TYPES,
            },
        )?;
        ensure_cardinality(
            &df,
            self.table_name(),
            CardinalityCheck {
                column: "mode",
                expected: tables::EXPECTED_TRAVEL_MODES,
            },
        )?;

        Ok(df)
    }
}

struct DateDimensionBuilder;

impl TableBuilder for DateDimensionBuilder {
    fn table_name(&self) -> &'static str {
        "date_dim"
    }

    fn build(&self, sources: &SourceContext) -> Result<DataFrame> {
        let events = event_dates(
            sources.parquet_extract(tables::IMMIGRATION_SOURCE)?,
            self.table_name(),
        )?;
        let arrivals = events
            .clone()
            .select([col("arrival_date").alias("migration_date")]);
        let departures = events.select([col("departure_date").alias("migration_date")]);

        let axis = concat(&[arrivals, departures], UnionArgs::default())?;
        let axis = drop_exact_duplicates(axis.drop_nulls(None)).with_columns([
            col("migration_date").dt().year().alias("year"),
            col("migration_date").dt().month().alias("month"),
            col("migration_date").dt().day().alias("day_of_month"),
            col("migration_date").dt().weekday().alias("day_of_week"),
            col("migration_date").dt().ordinal_day().alias("day_of_year"),
            col("migration_date").dt().week().alias("week_of_year"),
            col("migration_date").dt().quarter().alias("quarter"),
        ]);

        let df = axis.collect()?;
        ensure_non_empty(&df, self.table_name())?;
        Ok(df)
    }
}

struct ImmigrationFactBuilder;

impl TableBuilder for ImmigrationFactBuilder {
    fn table_name(&self) -> &'static str {
        "immigration_fact"
    }

    fn build(&self, sources: &SourceContext) -> Result<DataFrame> {
        let mut lf = sources.parquet_extract(tables::IMMIGRATION_SOURCE)?;
        let schema = lf.collect_schema()?;

        // The source over-types integral measures as floating-point.
        let integral: Vec<Expr> = schema
            .iter()
            .filter(|(_, dtype)| matches!(dtype, DataType::Float32 | DataType::Float64))
            .map(|(name, _)| col(name.as_str()).cast(DataType::Int32))
            .collect();
        let lf = if integral.is_empty() {
            lf
        } else {
            lf.with_columns(integral)
        };

        let lf = event_dates(lf, self.table_name())?;
        let df = drop_exact_duplicates(lf).collect()?;

        ensure_non_empty(&df, self.table_name())?;
        Ok(df)
    }
}

/// Materializes the day-offset arrival/departure columns into calendar dates.
fn event_dates(lf: LazyFrame, table: &'static str) -> Result<LazyFrame> {
    let mut lf = lf;
    let schema = lf.collect_schema()?;
    for column in ["arrdate", "depdate"] {
        if schema.get(column).is_none() {
            return Err(PipelineError::MissingColumn {
                table,
                column: column.to_string(),
            });
        }
    }

    Ok(lf.with_columns([
        offset_to_date("arrdate").alias("arrival_date"),
        offset_to_date("depdate").alias("departure_date"),
    ]))
}

/// Day offsets count from 1960-01-01; the engine's dates count from
/// 1970-01-01.
fn offset_to_date(column: &str) -> Expr {
    (col(column).cast(DataType::Int32) - lit(tables::SAS_EPOCH_OFFSET_DAYS)).cast(DataType::Date)
}
