use polars::prelude::DataFrame;

use crate::error::{PipelineError, Result};

/// An exact distinct-count expectation for a controlled-vocabulary column.
#[derive(Debug, Clone, Copy)]
pub struct CardinalityCheck {
    pub column: &'static str,
    pub expected: usize,
}

/// A candidate table must hold at least one row to publish.
pub fn ensure_non_empty(df: &DataFrame, table: &'static str) -> Result<()> {
    if df.height() == 0 {
        return Err(PipelineError::DataAbsent { table });
    }
    Ok(())
}

/// A controlled-vocabulary column must hold exactly the expected number of
/// distinct values; anything else means the upstream vocabulary drifted and
/// downstream joins would corrupt silently.
pub fn ensure_cardinality(
    df: &DataFrame,
    table: &'static str,
    check: CardinalityCheck,
) -> Result<()> {
    let found = df
        .column(check.column)?
        .as_materialized_series()
        .n_unique()?;
    if found != check.expected {
        return Err(PipelineError::SchemaDrift {
            table,
            column: check.column,
            expected: check.expected,
            found,
        });
    }
    Ok(())
}
