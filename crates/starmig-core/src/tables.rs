//! Declarative schemas for every extract feeding the warehouse.

use crate::schema::{ColumnSpec, ColumnType, TableSchema};

pub const CITY_DEMOGRAPHICS_EXTRACT: &str = "city_demographics_cleaned.csv";
pub const RACE_COUNTS_EXTRACT: &str = "race_counts.csv";
pub const TEMPERATURE_EXTRACT: &str = "GlobalTemperature_clean.csv";
pub const COUNTRY_CODES_EXTRACT: &str = "I94COUNTRY_output.csv";
pub const VISA_CATEGORIES_EXTRACT: &str = "I94VISA.csv";
pub const TRAVEL_MODES_EXTRACT: &str = "I94MODE_output.csv";
pub const IMMIGRATION_SOURCE: &str = "sas_data";

/// Distinct visa categories the upstream vocabulary is allowed to contain.
pub const EXPECTED_VISA_TYPES: usize = 3;
/// Distinct transport modes the upstream vocabulary is allowed to contain.
pub const EXPECTED_TRAVEL_MODES: usize = 4;

/// Days between 1960-01-01 (the immigration source's day-offset epoch) and
/// 1970-01-01 (the engine's date origin).
pub const SAS_EPOCH_OFFSET_DAYS: i32 = 3653;

fn column(source: &'static str, name: &'static str, dtype: ColumnType) -> ColumnSpec {
    ColumnSpec {
        source,
        name,
        dtype,
    }
}

pub fn city_demographics() -> TableSchema {
    TableSchema {
        table: "city_demographics_dim",
        columns: vec![
            column("City", "city", ColumnType::Str),
            column("State", "state", ColumnType::Str),
            column("Median Age", "median_age", ColumnType::Float),
            column("Male Population", "male_population", ColumnType::Int),
            column("Female Population", "female_population", ColumnType::Int),
            column("Total Population", "total_population", ColumnType::Int),
            column("Number of Veterans", "number_of_veterans", ColumnType::Int),
            column("Foreign-born", "foreign_born", ColumnType::Int),
            column(
                "Average Household Size",
                "average_household_size",
                ColumnType::Float,
            ),
            column("State Code", "state_code", ColumnType::Str),
        ],
        zero_fill: vec![
            "male_population",
            "female_population",
            "total_population",
            "number_of_veterans",
            "average_household_size",
        ],
    }
}

pub fn race_counts() -> TableSchema {
    TableSchema {
        table: "race_counts_dim",
        columns: vec![
            column("City", "city", ColumnType::Str),
            column("State", "state", ColumnType::Str),
            column("Race", "race", ColumnType::Str),
            column("Count", "race_population", ColumnType::Int),
        ],
        zero_fill: vec![],
    }
}

pub fn temperature() -> TableSchema {
    TableSchema {
        table: "temperature_dim",
        columns: vec![
            column("dt", "record_date", ColumnType::Date),
            column("AverageTemperature", "average_temperature", ColumnType::Float),
            column(
                "AverageTemperatureUncertainty",
                "average_temperature_uncertainty",
                ColumnType::Float,
            ),
            column("Country", "country", ColumnType::Str),
        ],
        zero_fill: vec![],
    }
}

pub fn country_codes() -> TableSchema {
    TableSchema {
        table: "country_codes",
        columns: vec![
            column("Code", "country_code", ColumnType::Int),
            column("Country", "country", ColumnType::Str),
        ],
        zero_fill: vec![],
    }
}

pub fn visa_categories() -> TableSchema {
    TableSchema {
        table: "visa_categories",
        columns: vec![
            column("Code", "visa_code", ColumnType::Int),
            column("Visa_type", "visa_type", ColumnType::Str),
        ],
        zero_fill: vec![],
    }
}

pub fn travel_modes() -> TableSchema {
    TableSchema {
        table: "travel_modes",
        columns: vec![
            column("Code", "mode_code", ColumnType::Int),
            column("Mode", "mode", ColumnType::Str),
        ],
        zero_fill: vec![],
    }
}
