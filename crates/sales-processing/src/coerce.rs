//! Lossy-to-null coercion of canonical columns.
//!
//! Coercion is total: an element that cannot be converted becomes null, never
//! an error. Nulls then flow through derivation, filtering, and aggregation
//! under the usual dataframe semantics (null-propagating arithmetic,
//! null-skipping sums, null never satisfying a comparison).

use crate::error::Result;
use crate::schema::{DATE, PRICE, PRODUCT, QUANTITY, REGION, REVENUE};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use tracing::debug;

/// Date-only formats accepted by [`parse_date_str`].
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d/%m/%Y", "%d-%m-%Y", "%Y%m%d",
];

/// Datetime formats accepted by [`parse_date_str`]; the time part is dropped.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Parse a single string as a calendar date, trying each known format.
pub fn parse_date_str(s: &str) -> Option<NaiveDate> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, fmt) {
            return Some(date);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(dt.date());
        }
    }
    None
}

/// Days since the Unix epoch, the physical representation of a Date column.
pub fn date_to_days(date: NaiveDate) -> i32 {
    (date - NaiveDate::default()).num_days() as i32
}

/// Inverse of [`date_to_days`].
pub fn days_to_date(days: i32) -> NaiveDate {
    NaiveDate::default() + Duration::days(days as i64)
}

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Coerce any column to Float64, element-wise, unparsable values to null.
///
/// Numeric dtypes cast losslessly; string elements are trimmed and parsed;
/// anything else falls back to an all-null column of the same length.
pub fn to_numeric(series: &Series) -> Result<Series> {
    let name = series.name().clone();
    match series.dtype() {
        dtype if is_numeric_dtype(dtype) => Ok(series.cast(&DataType::Float64)?),
        DataType::String => {
            let str_series = series.str()?;
            let mut values: Vec<Option<f64>> = Vec::with_capacity(str_series.len());
            for opt_val in str_series.into_iter() {
                values.push(opt_val.and_then(|v| {
                    let trimmed = v.trim();
                    if trimmed.is_empty() {
                        None
                    } else {
                        trimmed.parse::<f64>().ok()
                    }
                }));
            }
            Ok(Series::new(name, values))
        }
        dtype => {
            debug!("Cannot coerce dtype {dtype} to numeric, producing nulls");
            let values: Vec<Option<f64>> = vec![None; series.len()];
            Ok(Series::new(name, values))
        }
    }
}

/// Coerce any column to a Date column, element-wise, unparsable values to null.
pub fn to_date(series: &Series) -> Result<Series> {
    let name = series.name().clone();
    match series.dtype() {
        DataType::Date => Ok(series.clone()),
        DataType::Datetime(_, _) => Ok(series.cast(&DataType::Date)?),
        DataType::String => {
            let str_series = series.str()?;
            let mut days: Vec<Option<i32>> = Vec::with_capacity(str_series.len());
            for opt_val in str_series.into_iter() {
                days.push(opt_val.and_then(parse_date_str).map(date_to_days));
            }
            Ok(Series::new(name, days).cast(&DataType::Date)?)
        }
        dtype => {
            debug!("Cannot coerce dtype {dtype} to date, producing nulls");
            let days: Vec<Option<i32>> = vec![None; series.len()];
            Ok(Series::new(name, days).cast(&DataType::Date)?)
        }
    }
}

/// Element-wise `Price * Quantity`; null when either operand is null.
pub fn derive_revenue(price: &Series, quantity: &Series) -> Result<Series> {
    let price = price.f64()?;
    let quantity = quantity.f64()?;
    let mut values: Vec<Option<f64>> = Vec::with_capacity(price.len());
    for (p, q) in price.into_iter().zip(quantity.into_iter()) {
        values.push(match (p, q) {
            (Some(p), Some(q)) => Some(p * q),
            _ => None,
        });
    }
    Ok(Series::new(REVENUE.into(), values))
}

/// Coerce a projected canonical table in place: `Price` and `Quantity` to
/// Float64, `Revenue` appended, `Date` (when present) to a Date column.
pub fn coerce_canonical(mut df: DataFrame) -> Result<DataFrame> {
    let price = to_numeric(df.column(PRICE)?.as_materialized_series())?;
    df.replace(PRICE, price)?;

    let quantity = to_numeric(df.column(QUANTITY)?.as_materialized_series())?;
    df.replace(QUANTITY, quantity)?;

    let revenue = derive_revenue(
        df.column(PRICE)?.as_materialized_series(),
        df.column(QUANTITY)?.as_materialized_series(),
    )?;
    df.with_column(revenue)?;

    let has_date = df.get_column_names().iter().any(|n| n.as_str() == DATE);
    if has_date {
        let date = to_date(df.column(DATE)?.as_materialized_series())?;
        df.replace(DATE, date)?;
        // Revenue sits before Date in the canonical column order
        df = df.select([REGION, PRODUCT, PRICE, QUANTITY, REVENUE, DATE])?;
    }

    Ok(df)
}

/// Read a Date column as days-since-epoch values for row-wise processing.
pub fn date_days(series: &Series) -> Result<Vec<Option<i32>>> {
    let physical = series.cast(&DataType::Int32)?;
    Ok(physical.i32()?.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_numeric_from_strings() {
        let series = Series::new("Price".into(), &["2", " 3.5 ", "abc", ""]);
        let result = to_numeric(&series).unwrap();
        let values: Vec<Option<f64>> = result.f64().unwrap().into_iter().collect();
        assert_eq!(values, vec![Some(2.0), Some(3.5), None, None]);
    }

    #[test]
    fn test_to_numeric_preserves_nulls() {
        let series = Series::new("Price".into(), &[Some("1.5"), None]);
        let result = to_numeric(&series).unwrap();
        let values: Vec<Option<f64>> = result.f64().unwrap().into_iter().collect();
        assert_eq!(values, vec![Some(1.5), None]);
    }

    #[test]
    fn test_to_numeric_casts_integers() {
        let series = Series::new("Quantity".into(), &[10i64, 5]);
        let result = to_numeric(&series).unwrap();
        assert_eq!(result.dtype(), &DataType::Float64);
        let values: Vec<Option<f64>> = result.f64().unwrap().into_iter().collect();
        assert_eq!(values, vec![Some(10.0), Some(5.0)]);
    }

    #[test]
    fn test_to_numeric_unsupported_dtype_goes_null() {
        let series = Series::new("Price".into(), &[true, false]);
        let result = to_numeric(&series).unwrap();
        assert_eq!(result.null_count(), 2);
    }

    #[test]
    fn test_parse_date_str_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(parse_date_str("2024-03-05"), Some(expected));
        assert_eq!(parse_date_str("2024/03/05"), Some(expected));
        assert_eq!(parse_date_str("03/05/2024"), Some(expected));
        assert_eq!(parse_date_str("2024-03-05 13:45:00"), Some(expected));
        assert_eq!(parse_date_str("not a date"), None);
        assert_eq!(parse_date_str(""), None);
    }

    #[test]
    fn test_date_days_roundtrip() {
        let date = NaiveDate::from_ymd_opt(2023, 11, 30).unwrap();
        assert_eq!(days_to_date(date_to_days(date)), date);
        assert_eq!(date_to_days(NaiveDate::default()), 0);
    }

    #[test]
    fn test_to_date_from_strings() {
        let series = Series::new("Date".into(), &["2024-01-15", "junk", "2024-02-01"]);
        let result = to_date(&series).unwrap();
        assert_eq!(result.dtype(), &DataType::Date);
        assert_eq!(result.null_count(), 1);
    }

    #[test]
    fn test_derive_revenue_null_propagation() {
        let price = Series::new("Price".into(), &[Some(2.0), None, Some(4.0)]);
        let quantity = Series::new("Quantity".into(), &[Some(10.0), Some(5.0), None]);
        let revenue = derive_revenue(&price, &quantity).unwrap();
        let values: Vec<Option<f64>> = revenue.f64().unwrap().into_iter().collect();
        assert_eq!(values, vec![Some(20.0), None, None]);
    }
}
