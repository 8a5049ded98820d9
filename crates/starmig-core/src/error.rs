// crates/starmig-core/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars operation failed: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Object store error: {0}")]
    Store(#[from] starmig_bucket::BucketError),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("{table}: declared column '{column}' is absent from the source extract")]
    MissingColumn { table: &'static str, column: String },

    #[error("{table}: published table contains no rows")]
    DataAbsent { table: &'static str },

    #[error("{table}: column '{column}' has {found} distinct values, expected {expected}")]
    SchemaDrift {
        table: &'static str,
        column: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("alias map conflict: '{0}' is both a substitution source and a substitution target")]
    AliasConflict(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
