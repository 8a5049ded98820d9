use polars::prelude::*;

/// Removes rows that are exact duplicates across all columns, keeping the
/// first occurrence so output order follows input order.
pub fn drop_exact_duplicates(lf: LazyFrame) -> LazyFrame {
    lf.unique_stable(None, UniqueKeepStrategy::First)
}
