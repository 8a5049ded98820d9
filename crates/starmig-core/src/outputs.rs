use std::io::Cursor;

use bytes::Bytes;
use polars::io::parquet::write::{ParquetCompression, ParquetWriter, StatisticsOptions};
use polars::prelude::DataFrame;
use starmig_bucket::BucketStore;
use tracing::info;

use crate::error::Result;

const PARQUET_CONTENT_TYPE: &str = "application/vnd.apache.parquet";

/// Serializes a gated table to parquet and overwrites its object at the
/// destination.
pub async fn publish_table(
    store: &dyn BucketStore,
    key_prefix: &str,
    table: &str,
    df: &DataFrame,
) -> Result<()> {
    let bytes = parquet_bytes(df)?;
    let key = table_key(key_prefix, table);
    store
        .put_object(&key, Bytes::from(bytes), PARQUET_CONTENT_TYPE)
        .await?;
    info!(table, key = %key, rows = df.height(), "published table");
    Ok(())
}

/// Object key for a published table under the destination prefix.
pub fn table_key(key_prefix: &str, table: &str) -> String {
    let prefix = key_prefix.trim_matches('/');
    if prefix.is_empty() {
        format!("{table}.parquet")
    } else {
        format!("{prefix}/{table}.parquet")
    }
}

fn parquet_bytes(df: &DataFrame) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    {
        let mut cursor = Cursor::new(&mut buffer);
        let mut clone = df.clone();
        ParquetWriter::new(&mut cursor)
            .with_compression(ParquetCompression::Zstd(None))
            .with_statistics(StatisticsOptions::default())
            .finish(&mut clone)?;
    }
    Ok(buffer)
}
