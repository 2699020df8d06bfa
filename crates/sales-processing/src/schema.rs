//! Column roles, header normalization, and the mapping from arbitrary source
//! headers onto the canonical sales schema.
//!
//! The canonical table carries at most six columns, in this order:
//! `Region`, `Product`, `Price`, `Quantity`, `Revenue`, `Date` — where
//! `Revenue` is derived downstream and `Date` is present only when mapped.

use crate::error::{Result, SalesError};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// Canonical column name for the region dimension.
pub const REGION: &str = "Region";
/// Canonical column name for the product dimension.
pub const PRODUCT: &str = "Product";
/// Canonical column name for the unit price measure.
pub const PRICE: &str = "Price";
/// Canonical column name for the unit count measure.
pub const QUANTITY: &str = "Quantity";
/// Canonical column name for the derived revenue measure.
pub const REVENUE: &str = "Revenue";
/// Canonical column name for the optional date dimension.
pub const DATE: &str = "Date";

/// The semantic role a source column is mapped onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    Region,
    Product,
    Price,
    Quantity,
    Date,
}

impl ColumnRole {
    /// The canonical column name this role produces.
    pub fn canonical_name(&self) -> &'static str {
        match self {
            Self::Region => REGION,
            Self::Product => PRODUCT,
            Self::Price => PRICE,
            Self::Quantity => QUANTITY,
            Self::Date => DATE,
        }
    }

    /// The four roles every mapping must assign.
    pub fn required() -> [ColumnRole; 4] {
        [Self::Region, Self::Product, Self::Price, Self::Quantity]
    }
}

/// Assignment from canonical roles to source column names.
///
/// Two roles may share a source column; the canonical projection copies the
/// column once per role. `date` is optional — when `None`, the pipeline runs
/// without the date filter and the monthly trend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub region: String,
    pub product: String,
    pub price: String,
    pub quantity: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl ColumnMapping {
    /// Infer a default mapping from the (normalized) headers: an exact-name
    /// match on the canonical name wins, otherwise the first column.
    /// The date role defaults to unmapped.
    pub fn infer(headers: &[String]) -> Result<Self> {
        let first = headers.first().ok_or(SalesError::EmptyDataset)?;

        let pick = |canonical: &str| -> String {
            headers
                .iter()
                .find(|h| h.as_str() == canonical)
                .unwrap_or(first)
                .clone()
        };

        let mapping = Self {
            region: pick(REGION),
            product: pick(PRODUCT),
            price: pick(PRICE),
            quantity: pick(QUANTITY),
            date: None,
        };
        debug!("Inferred column mapping: {:?}", mapping);
        Ok(mapping)
    }

    /// The source column assigned to a role, if any.
    pub fn source_for(&self, role: ColumnRole) -> Option<&str> {
        match role {
            ColumnRole::Region => Some(&self.region),
            ColumnRole::Product => Some(&self.product),
            ColumnRole::Price => Some(&self.price),
            ColumnRole::Quantity => Some(&self.quantity),
            ColumnRole::Date => self.date.as_deref(),
        }
    }

    /// Whether a date column is mapped.
    pub fn has_date(&self) -> bool {
        self.date.is_some()
    }

    /// The four required (role, source column) pairs, in canonical order.
    fn required_pairs(&self) -> [(ColumnRole, &str); 4] {
        [
            (ColumnRole::Region, self.region.as_str()),
            (ColumnRole::Product, self.product.as_str()),
            (ColumnRole::Price, self.price.as_str()),
            (ColumnRole::Quantity, self.quantity.as_str()),
        ]
    }

    /// Check every mapped source column exists in the dataset.
    pub fn validate(&self, df: &DataFrame) -> Result<()> {
        let headers: HashSet<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        for (_, source) in self.required_pairs() {
            if !headers.contains(source) {
                return Err(SalesError::ColumnNotFound(source.to_string()));
            }
        }
        if let Some(date_col) = &self.date
            && !headers.contains(date_col)
        {
            return Err(SalesError::ColumnNotFound(date_col.clone()));
        }
        Ok(())
    }
}

/// Trim leading/trailing whitespace off header names, preserving order.
///
/// Column names must stay unique for the dataframe layer: if a trimmed name
/// would collide with one already taken, the original name is kept instead.
pub fn normalize_headers<S: AsRef<str>>(names: &[S]) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::with_capacity(names.len());
    let mut out = Vec::with_capacity(names.len());

    for name in names {
        let original = name.as_ref();
        let trimmed = original.trim();
        let chosen = if seen.contains(trimmed) {
            original.to_string()
        } else {
            trimmed.to_string()
        };
        seen.insert(chosen.clone());
        out.push(chosen);
    }
    out
}

/// Apply [`normalize_headers`] to a DataFrame's column names.
pub fn normalize_columns(mut df: DataFrame) -> Result<DataFrame> {
    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();
    let normalized = normalize_headers(&names);
    if normalized != names {
        debug!("Normalized column headers: {:?}", normalized);
        df.set_column_names(normalized)?;
    }
    Ok(df)
}

/// Project the raw table onto canonical columns per the mapping.
///
/// The output has columns `Region`, `Product`, `Price`, `Quantity` (and
/// `Date` when mapped), in that order, with source values untouched —
/// coercion happens downstream.
pub fn project_canonical(df: &DataFrame, mapping: &ColumnMapping) -> Result<DataFrame> {
    mapping.validate(df)?;

    let mut columns: Vec<Column> = Vec::with_capacity(5);
    for (role, source) in mapping.required_pairs() {
        let series = df
            .column(source)?
            .as_materialized_series()
            .clone()
            .with_name(role.canonical_name().into());
        columns.push(Column::from(series));
    }
    if let Some(date_col) = &mapping.date {
        let series = df
            .column(date_col)?
            .as_materialized_series()
            .clone()
            .with_name(DATE.into());
        columns.push(Column::from(series));
    }

    Ok(DataFrame::new(columns)?)
}
