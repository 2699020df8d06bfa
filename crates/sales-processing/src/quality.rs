//! Missing-value reporting.
//!
//! Counted over the canonical table BEFORE filtering, so rows that the
//! numeric-range conditions silently drop (null never satisfies a range)
//! still show up in the data-quality view.

use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Null count for one canonical column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingCount {
    pub column: String,
    pub missing: usize,
}

/// Per-column null counts, in canonical column order.
pub fn missing_report(df: &DataFrame) -> Vec<MissingCount> {
    df.get_columns()
        .iter()
        .map(|col| MissingCount {
            column: col.name().to_string(),
            missing: col.null_count(),
        })
        .collect()
}
