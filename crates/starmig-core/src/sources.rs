use std::fs::File;
use std::path::PathBuf;

use polars::prelude::*;

use crate::error::Result;

/// Read-only access to the extract files feeding one warehouse run.
#[derive(Debug, Clone)]
pub struct SourceContext {
    root: PathBuf,
}

impl SourceContext {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn extract_path(&self, file: &str) -> PathBuf {
        self.root.join(file)
    }

    /// Reads a CSV extract with schema inference disabled, so every column
    /// arrives string-typed and typing stays the normalizer's decision.
    pub fn csv_extract(&self, file: &str) -> Result<LazyFrame> {
        let handle = File::open(self.extract_path(file))?;
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .into_reader_with_file_handle(handle)
            .finish()?;
        Ok(df.lazy())
    }

    /// Scans a directory of parquet files as one lazy dataset.
    pub fn parquet_extract(&self, dir: &str) -> Result<LazyFrame> {
        let pattern = self.extract_path(dir).join("*.parquet");
        let lf = LazyFrame::scan_parquet(pattern, ScanArgsParquet::default())?;
        Ok(lf)
    }
}
