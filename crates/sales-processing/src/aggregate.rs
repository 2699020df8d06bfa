//! Revenue aggregation: grouped sums for the bar charts and the monthly
//! trend for the line chart.
//!
//! Group keys that are null are dropped. Null revenue contributes 0 to its
//! group, so a group whose revenue is entirely null still appears with a
//! zero sum.

use crate::coerce::{date_days, days_to_date};
use crate::error::Result;
use crate::schema::{DATE, REVENUE};
use chrono::{Datelike, NaiveDate};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

/// One bar of a grouped-revenue chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupRevenue {
    /// Group key: a region or product value.
    pub key: String,
    /// Null-skipping sum of `Revenue` within the group.
    pub revenue: f64,
}

/// One point of the monthly revenue trend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    /// First day of the calendar month.
    pub month: NaiveDate,
    /// Null-skipping sum of `Revenue` within the month.
    pub revenue: f64,
}

/// Sum `Revenue` per distinct value of `key_column`, sorted by revenue
/// descending with a lexical tie-break on the key, optionally truncated to
/// the first `top_n` groups.
pub fn revenue_by(df: &DataFrame, key_column: &str, top_n: Option<usize>) -> Result<Vec<GroupRevenue>> {
    let keys = df.column(key_column)?.as_materialized_series().clone();
    let keys = keys.cast(&DataType::String)?;
    let revenue = df.column(REVENUE)?.as_materialized_series();

    let mut sums: HashMap<String, f64> = HashMap::new();
    for (key, rev) in keys.str()?.into_iter().zip(revenue.f64()?.into_iter()) {
        if let Some(key) = key {
            *sums.entry(key.to_string()).or_insert(0.0) += rev.unwrap_or(0.0);
        }
    }

    let mut groups: Vec<GroupRevenue> = sums
        .into_iter()
        .map(|(key, revenue)| GroupRevenue { key, revenue })
        .collect();
    groups.sort_by(|a, b| {
        b.revenue
            .partial_cmp(&a.revenue)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.key.cmp(&b.key))
    });

    if let Some(n) = top_n {
        groups.truncate(n);
    }
    Ok(groups)
}

/// Sum `Revenue` per calendar month over rows with a non-null `Date`,
/// sorted by month ascending. Empty when no row has a usable date.
pub fn monthly_trend(df: &DataFrame) -> Result<Vec<TrendPoint>> {
    let days = date_days(df.column(DATE)?.as_materialized_series())?;
    let revenue = df.column(REVENUE)?.as_materialized_series();

    let mut sums: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for (day, rev) in days.into_iter().zip(revenue.f64()?.into_iter()) {
        let Some(day) = day else { continue };
        if let Some(month) = days_to_date(day).with_day(1) {
            *sums.entry(month).or_insert(0.0) += rev.unwrap_or(0.0);
        }
    }

    Ok(sums
        .into_iter()
        .map(|(month, revenue)| TrendPoint { month, revenue })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coerce::date_to_days;
    use crate::schema::PRODUCT;

    fn product_table(rows: &[(Option<&str>, Option<f64>)]) -> DataFrame {
        let products: Vec<Option<String>> =
            rows.iter().map(|(p, _)| p.map(|s| s.to_string())).collect();
        let revenue: Vec<Option<f64>> = rows.iter().map(|(_, r)| *r).collect();
        DataFrame::new(vec![
            Column::from(Series::new(PRODUCT.into(), products)),
            Column::from(Series::new(REVENUE.into(), revenue)),
        ])
        .unwrap()
    }

    #[test]
    fn test_revenue_by_sorts_descending() {
        let df = product_table(&[
            (Some("A"), Some(30.0)),
            (Some("B"), Some(20.0)),
            (Some("B"), Some(30.0)),
            (Some("C"), Some(10.0)),
        ]);
        let groups = revenue_by(&df, PRODUCT, None).unwrap();
        let keys: Vec<&str> = groups.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["B", "A", "C"]);
        assert_eq!(groups[0].revenue, 50.0);
    }

    #[test]
    fn test_revenue_by_top_n_truncates() {
        let df = product_table(&[
            (Some("A"), Some(30.0)),
            (Some("B"), Some(50.0)),
            (Some("C"), Some(10.0)),
        ]);
        let groups = revenue_by(&df, PRODUCT, Some(1)).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].key, "B");
        assert_eq!(groups[0].revenue, 50.0);
    }

    #[test]
    fn test_revenue_by_lexical_tie_break() {
        let df = product_table(&[
            (Some("Zed"), Some(10.0)),
            (Some("Alp"), Some(10.0)),
        ]);
        let groups = revenue_by(&df, PRODUCT, None).unwrap();
        let keys: Vec<&str> = groups.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["Alp", "Zed"]);
    }

    #[test]
    fn test_revenue_by_drops_null_keys_and_zeroes_null_revenue() {
        let df = product_table(&[
            (None, Some(99.0)),
            (Some("A"), None),
        ]);
        let groups = revenue_by(&df, PRODUCT, None).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].key, "A");
        assert_eq!(groups[0].revenue, 0.0);
    }

    #[test]
    fn test_monthly_trend_ascending_no_duplicates() {
        let to_day = |y, m, d| Some(date_to_days(NaiveDate::from_ymd_opt(y, m, d).unwrap()));
        let days: Vec<Option<i32>> = vec![
            to_day(2024, 2, 10),
            to_day(2024, 1, 5),
            to_day(2024, 2, 20),
            None,
        ];
        let df = DataFrame::new(vec![
            Column::from(
                Series::new(DATE.into(), days)
                    .cast(&DataType::Date)
                    .unwrap(),
            ),
            Column::from(Series::new(
                REVENUE.into(),
                &[Some(5.0), Some(7.0), Some(11.0), Some(100.0)],
            )),
        ])
        .unwrap();

        let trend = monthly_trend(&df).unwrap();
        assert_eq!(trend.len(), 2);
        assert_eq!(trend[0].month, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(trend[0].revenue, 7.0);
        assert_eq!(trend[1].month, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(trend[1].revenue, 16.0);
    }

    #[test]
    fn test_monthly_trend_empty_when_no_dates() {
        let df = DataFrame::new(vec![
            Column::from(
                Series::new(DATE.into(), vec![None::<i32>, None])
                    .cast(&DataType::Date)
                    .unwrap(),
            ),
            Column::from(Series::new(REVENUE.into(), &[Some(1.0), Some(2.0)])),
        ])
        .unwrap();

        let trend = monthly_trend(&df).unwrap();
        assert!(trend.is_empty());
    }
}
