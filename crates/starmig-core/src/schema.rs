use polars::prelude::*;

use crate::error::{PipelineError, Result};

/// Declared target type for a normalized column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Int,
    Float,
    Date,
    Str,
}

impl ColumnType {
    pub fn dtype(self) -> DataType {
        match self {
            ColumnType::Int => DataType::Int32,
            ColumnType::Float => DataType::Float64,
            ColumnType::Date => DataType::Date,
            ColumnType::Str => DataType::String,
        }
    }
}

/// One (source column, canonical name, target type) triple.
#[derive(Debug, Clone)]
pub struct ColumnSpec {
    pub source: &'static str,
    pub name: &'static str,
    pub dtype: ColumnType,
}

/// Declarative normalization rules for one extract: the ordered column
/// triples plus the columns whose missing values become zero.
#[derive(Debug, Clone)]
pub struct TableSchema {
    pub table: &'static str,
    pub columns: Vec<ColumnSpec>,
    pub zero_fill: Vec<&'static str>,
}

impl TableSchema {
    pub fn source_columns(&self) -> Vec<&'static str> {
        self.columns.iter().map(|spec| spec.source).collect()
    }
}

/// Casts, renames, and fills a raw extract according to its declared schema.
///
/// This is a projection: only declared columns survive, under their canonical
/// names. A cell that does not convert to the declared type becomes null; the
/// quality gate decides whether the aggregate result is still acceptable. A
/// declared source column missing from the extract is a configuration error,
/// not a silent skip.
pub fn normalize(lf: LazyFrame, schema: &TableSchema) -> Result<LazyFrame> {
    let mut lf = lf;
    let present = lf.collect_schema()?;
    for spec in &schema.columns {
        if present.get(spec.source).is_none() {
            return Err(PipelineError::MissingColumn {
                table: schema.table,
                column: spec.source.to_string(),
            });
        }
    }

    let projection: Vec<Expr> = schema
        .columns
        .iter()
        .map(|spec| cast_expr(spec).alias(spec.name))
        .collect();
    let mut lf = lf.select(projection);

    if !schema.zero_fill.is_empty() {
        let fills: Vec<Expr> = schema
            .zero_fill
            .iter()
            .map(|name| col(*name).fill_null(lit(0)))
            .collect();
        lf = lf.with_columns(fills);
    }

    Ok(lf)
}

fn cast_expr(spec: &ColumnSpec) -> Expr {
    match spec.dtype {
        ColumnType::Date => col(spec.source).str().to_date(StrptimeOptions {
            format: Some("%Y-%m-%d".into()),
            strict: false,
            ..Default::default()
        }),
        other => col(spec.source).cast(other.dtype()),
    }
}
