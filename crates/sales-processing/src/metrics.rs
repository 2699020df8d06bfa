//! KPI reductions over the filtered table.
//!
//! Sums skip nulls (an empty table sums to 0); means are `None` when there
//! are no non-null values, so an undefined average is distinguishable from a
//! true zero and renders as "n/a" instead of `NaN`.

use crate::error::Result;
use crate::schema::{PRICE, QUANTITY, REVENUE};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// The four scalar summary metrics of the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kpis {
    /// Null-skipping sum of `Revenue`.
    pub total_revenue: f64,
    /// Null-skipping sum of `Quantity`.
    pub total_units: f64,
    /// Mean of non-null `Price` values; `None` when there are none.
    pub avg_price: Option<f64>,
    /// Mean of non-null `Quantity` values; `None` when there are none.
    pub avg_units: Option<f64>,
}

impl Kpis {
    /// Compute KPIs over a coerced (typically filtered) canonical table.
    pub fn compute(df: &DataFrame) -> Result<Self> {
        Ok(Self {
            total_revenue: sum_column(df, REVENUE)?,
            total_units: sum_column(df, QUANTITY)?,
            avg_price: mean_column(df, PRICE)?,
            avg_units: mean_column(df, QUANTITY)?,
        })
    }
}

fn sum_column(df: &DataFrame, column: &str) -> Result<f64> {
    let values = df.column(column)?.as_materialized_series();
    Ok(values.f64()?.into_iter().flatten().sum())
}

fn mean_column(df: &DataFrame, column: &str) -> Result<Option<f64>> {
    let values = df.column(column)?.as_materialized_series();
    let mut sum = 0.0;
    let mut count = 0usize;
    for v in values.f64()?.into_iter().flatten() {
        sum += v;
        count += 1;
    }
    Ok((count > 0).then(|| sum / count as f64))
}

/// Format a monetary-style value: thousands separators, two decimal places.
pub fn format_amount(value: f64) -> String {
    format_grouped(value, 2)
}

/// Format a unit count: thousands separators, no decimal places.
pub fn format_count(value: f64) -> String {
    format_grouped(value, 0)
}

/// Format an optional metric, rendering an absent value as "n/a".
pub fn format_optional(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) => format_grouped(v, decimals),
        None => "n/a".to_string(),
    }
}

fn format_grouped(value: f64, decimals: usize) -> String {
    let formatted = format!("{value:.decimals$}");
    let (number, fraction) = match formatted.split_once('.') {
        Some((n, f)) => (n, Some(f)),
        None => (formatted.as_str(), None),
    };
    let (sign, digits) = match number.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", number),
    };

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    match fraction {
        Some(f) => format!("{sign}{grouped}.{f}"),
        None => format!("{sign}{grouped}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(price: &[Option<f64>], quantity: &[Option<f64>], revenue: &[Option<f64>]) -> DataFrame {
        DataFrame::new(vec![
            Column::from(Series::new(PRICE.into(), price)),
            Column::from(Series::new(QUANTITY.into(), quantity)),
            Column::from(Series::new(REVENUE.into(), revenue)),
        ])
        .unwrap()
    }

    #[test]
    fn test_kpis_skip_nulls() {
        let df = table(
            &[Some(2.0), None, Some(4.0)],
            &[Some(10.0), Some(5.0), None],
            &[Some(20.0), None, None],
        );
        let kpis = Kpis::compute(&df).unwrap();
        assert_eq!(kpis.total_revenue, 20.0);
        assert_eq!(kpis.total_units, 15.0);
        assert_eq!(kpis.avg_price, Some(3.0));
        assert_eq!(kpis.avg_units, Some(7.5));
    }

    #[test]
    fn test_kpis_empty_table() {
        let df = table(&[], &[], &[]);
        let kpis = Kpis::compute(&df).unwrap();
        assert_eq!(kpis.total_revenue, 0.0);
        assert_eq!(kpis.total_units, 0.0);
        assert_eq!(kpis.avg_price, None);
        assert_eq!(kpis.avg_units, None);
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(1234567.891), "1,234,567.89");
        assert_eq!(format_amount(0.0), "0.00");
        assert_eq!(format_amount(-1234.5), "-1,234.50");
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(1500.0), "1,500");
        assert_eq!(format_count(42.0), "42");
    }

    #[test]
    fn test_format_optional() {
        assert_eq!(format_optional(Some(12.5), 2), "12.50");
        assert_eq!(format_optional(None, 2), "n/a");
    }
}
