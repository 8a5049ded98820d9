// crates/starmig-core/src/validation.rs

use std::path::Path;

use crate::error::{PipelineError, Result};

/// Structural pre-flight check on a raw CSV extract: the header row must
/// exist and carry every declared source column. Runs before the engine
/// parses the file, so a misconfigured extract fails with the offending
/// column name instead of a parse error.
pub fn validate_csv_extract(path: &Path, table: &'static str, required: &[&str]) -> Result<()> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let headers = reader.headers()?;
    if headers.is_empty() {
        return Err(PipelineError::Configuration(format!(
            "{}: extract {} has no header row",
            table,
            path.display()
        )));
    }

    for name in required {
        if !headers.iter().any(|header| header == *name) {
            return Err(PipelineError::MissingColumn {
                table,
                column: name.to_string(),
            });
        }
    }

    Ok(())
}
