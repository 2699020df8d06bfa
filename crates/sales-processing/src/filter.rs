//! Filtering of the canonical table.
//!
//! A row is kept iff every condition holds. A null field referenced by a
//! condition fails that condition: null is never a member of a value set and
//! never satisfies a range, so rows with unparsable Price/Quantity are
//! excluded even at the default (full observed) bounds.

use crate::coerce::{date_days, date_to_days, days_to_date};
use crate::error::Result;
use crate::schema::{DATE, PRICE, PRODUCT, QUANTITY, REGION};
use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use tracing::debug;

/// Observed value sets and bounds of a canonical table, used to seed default
/// filters and to drive selection widgets in a hosting UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterDomain {
    /// Sorted distinct non-null region values.
    pub regions: Vec<String>,
    /// Sorted distinct non-null product values.
    pub products: Vec<String>,
    /// Observed (min, max) price; (0.0, 0.0) when the column is all-null.
    pub price: (f64, f64),
    /// Observed (min, max) quantity; (0.0, 0.0) when the column is all-null.
    pub quantity: (f64, f64),
    /// Observed (min, max) date among non-null dates, when a date column exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dates: Option<(NaiveDate, NaiveDate)>,
}

impl FilterDomain {
    /// Compute the domain of a coerced canonical table.
    pub fn from_table(df: &DataFrame) -> Result<Self> {
        let regions = distinct_strings(df, REGION)?;
        let products = distinct_strings(df, PRODUCT)?;
        let price = observed_range(df, PRICE)?.unwrap_or((0.0, 0.0));
        let quantity = observed_range(df, QUANTITY)?.unwrap_or((0.0, 0.0));

        let dates = if has_column(df, DATE) {
            observed_date_range(df)?
        } else {
            None
        };

        Ok(Self {
            regions,
            products,
            price,
            quantity,
            dates,
        })
    }
}

/// User-chosen filter conditions over the canonical table.
///
/// [`FilterSpec::from_domain`] yields the no-op defaults: every observed
/// region and product selected, the full observed numeric ranges, and no
/// date restriction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    /// Region values to include.
    pub regions: Vec<String>,
    /// Product values to include.
    pub products: Vec<String>,
    /// Inclusive (min, max) price bounds.
    pub price: (f64, f64),
    /// Inclusive (min, max) quantity bounds.
    pub quantity: (f64, f64),
    /// Inclusive (start, end) date bounds; `None` disables the date condition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dates: Option<(NaiveDate, NaiveDate)>,
}

impl FilterSpec {
    /// Default spec over a domain: selects everything observed.
    pub fn from_domain(domain: &FilterDomain) -> Self {
        Self {
            regions: domain.regions.clone(),
            products: domain.products.clone(),
            price: domain.price,
            quantity: domain.quantity,
            dates: None,
        }
    }
}

/// Apply a filter spec to a coerced canonical table, preserving row order.
pub fn apply(df: &DataFrame, spec: &FilterSpec) -> Result<DataFrame> {
    let mut keep = vec![true; df.height()];

    mask_membership(df, REGION, &spec.regions, &mut keep)?;
    mask_membership(df, PRODUCT, &spec.products, &mut keep)?;
    mask_range(df, PRICE, spec.price, &mut keep)?;
    mask_range(df, QUANTITY, spec.quantity, &mut keep)?;

    // The date condition is active only when a date column was mapped.
    if let Some((start, end)) = spec.dates
        && has_column(df, DATE)
    {
        mask_date_range(df, (start, end), &mut keep)?;
    }

    let mask = Series::new("keep".into(), keep);
    let filtered = df.filter(mask.bool()?)?;
    debug!(
        "Filter kept {} of {} rows",
        filtered.height(),
        df.height()
    );
    Ok(filtered)
}

fn has_column(df: &DataFrame, name: &str) -> bool {
    df.get_column_names().iter().any(|n| n.as_str() == name)
}

/// AND the mask with `value ∈ selected`; null values never match.
fn mask_membership(
    df: &DataFrame,
    column: &str,
    selected: &[String],
    keep: &mut [bool],
) -> Result<()> {
    let selected: HashSet<&str> = selected.iter().map(|s| s.as_str()).collect();
    let values = df.column(column)?.as_materialized_series().clone();
    // Non-string dimension columns (numeric codes etc.) compare by display form.
    let values = values.cast(&DataType::String)?;
    for (i, opt_val) in values.str()?.into_iter().enumerate() {
        keep[i] &= opt_val.is_some_and(|v| selected.contains(v));
    }
    Ok(())
}

/// AND the mask with `lo <= value <= hi`; null values never match.
fn mask_range(df: &DataFrame, column: &str, (lo, hi): (f64, f64), keep: &mut [bool]) -> Result<()> {
    let values = df.column(column)?.as_materialized_series();
    for (i, opt_val) in values.f64()?.into_iter().enumerate() {
        keep[i] &= opt_val.is_some_and(|v| v >= lo && v <= hi);
    }
    Ok(())
}

/// AND the mask with `start <= date <= end`; null dates never match.
fn mask_date_range(
    df: &DataFrame,
    (start, end): (NaiveDate, NaiveDate),
    keep: &mut [bool],
) -> Result<()> {
    let (lo, hi) = (date_to_days(start), date_to_days(end));
    let days = date_days(df.column(DATE)?.as_materialized_series())?;
    for (i, opt_day) in days.into_iter().enumerate() {
        keep[i] &= opt_day.is_some_and(|d| d >= lo && d <= hi);
    }
    Ok(())
}

/// Sorted distinct non-null values of a string-like column.
fn distinct_strings(df: &DataFrame, column: &str) -> Result<Vec<String>> {
    let values = df.column(column)?.as_materialized_series().clone();
    let values = values.cast(&DataType::String)?;
    let mut distinct = BTreeSet::new();
    for opt_val in values.str()?.into_iter().flatten() {
        distinct.insert(opt_val.to_string());
    }
    Ok(distinct.into_iter().collect())
}

/// Observed (min, max) of a Float64 column, `None` when all-null.
fn observed_range(df: &DataFrame, column: &str) -> Result<Option<(f64, f64)>> {
    let values = df.column(column)?.as_materialized_series();
    let mut range: Option<(f64, f64)> = None;
    for v in values.f64()?.into_iter().flatten() {
        range = Some(match range {
            Some((lo, hi)) => (lo.min(v), hi.max(v)),
            None => (v, v),
        });
    }
    Ok(range)
}

/// Observed (min, max) of the Date column, `None` when all-null.
fn observed_date_range(df: &DataFrame) -> Result<Option<(NaiveDate, NaiveDate)>> {
    let days = date_days(df.column(DATE)?.as_materialized_series())?;
    let mut range: Option<(i32, i32)> = None;
    for d in days.into_iter().flatten() {
        range = Some(match range {
            Some((lo, hi)) => (lo.min(d), hi.max(d)),
            None => (d, d),
        });
    }
    Ok(range.map(|(lo, hi)| (days_to_date(lo), days_to_date(hi))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coerce::coerce_canonical;
    use crate::schema::REVENUE;

    fn sample_table() -> DataFrame {
        let df = DataFrame::new(vec![
            Column::from(Series::new(
                REGION.into(),
                &[Some("East"), Some("West"), Some("East"), None],
            )),
            Column::from(Series::new(
                PRODUCT.into(),
                &["Pen", "Pen", "Ink", "Ink"],
            )),
            Column::from(Series::new(
                PRICE.into(),
                &["2", "abc", "4", "1"],
            )),
            Column::from(Series::new(
                QUANTITY.into(),
                &["10", "5", "3", "2"],
            )),
        ])
        .unwrap();
        coerce_canonical(df).unwrap()
    }

    #[test]
    fn test_domain_from_table() {
        let df = sample_table();
        let domain = FilterDomain::from_table(&df).unwrap();
        assert_eq!(domain.regions, vec!["East", "West"]);
        assert_eq!(domain.products, vec!["Ink", "Pen"]);
        assert_eq!(domain.price, (1.0, 4.0));
        assert_eq!(domain.quantity, (2.0, 10.0));
        assert!(domain.dates.is_none());
    }

    #[test]
    fn test_default_filter_drops_null_price_and_null_region() {
        let df = sample_table();
        let domain = FilterDomain::from_table(&df).unwrap();
        let spec = FilterSpec::from_domain(&domain);

        let filtered = apply(&df, &spec).unwrap();
        // "abc" price fails the range; null region fails membership
        assert_eq!(filtered.height(), 2);
        assert_eq!(filtered.column(REVENUE).unwrap().null_count(), 0);
    }

    #[test]
    fn test_narrow_price_range_excludes_outside_rows() {
        let df = sample_table();
        let domain = FilterDomain::from_table(&df).unwrap();
        let mut spec = FilterSpec::from_domain(&domain);
        spec.price = (1.5, 2.5);

        let filtered = apply(&df, &spec).unwrap();
        assert_eq!(filtered.height(), 1);
        let price: Vec<Option<f64>> = filtered
            .column(PRICE)
            .unwrap()
            .as_materialized_series()
            .f64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(price, vec![Some(2.0)]);
    }

    #[test]
    fn test_membership_filter() {
        let df = sample_table();
        let domain = FilterDomain::from_table(&df).unwrap();
        let mut spec = FilterSpec::from_domain(&domain);
        spec.products = vec!["Ink".to_string()];

        let filtered = apply(&df, &spec).unwrap();
        assert_eq!(filtered.height(), 1); // East/Ink/4/3 — the null-region Ink row is gone
    }

    #[test]
    fn test_filter_is_idempotent() {
        let df = sample_table();
        let domain = FilterDomain::from_table(&df).unwrap();
        let mut spec = FilterSpec::from_domain(&domain);
        spec.price = (1.0, 2.0);

        let once = apply(&df, &spec).unwrap();
        let twice = apply(&once, &spec).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_filter_preserves_row_order() {
        let df = sample_table();
        let domain = FilterDomain::from_table(&df).unwrap();
        let spec = FilterSpec::from_domain(&domain);

        let filtered = apply(&df, &spec).unwrap();
        let regions: Vec<Option<&str>> = filtered
            .column(REGION)
            .unwrap()
            .as_materialized_series()
            .str()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(regions, vec![Some("East"), Some("East")]);
    }
}
