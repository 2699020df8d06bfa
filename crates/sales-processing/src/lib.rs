//! Sales Analytics Processing Pipeline
//!
//! A CSV-driven sales analytics library built with Rust and Polars.
//!
//! # Overview
//!
//! The pipeline takes a raw tabular dataset plus user-chosen column mappings
//! and filter ranges, and produces the artifacts of a sales dashboard:
//!
//! - **Canonical projection**: arbitrary source headers mapped onto the
//!   Region / Product / Price / Quantity (/ Date) roles
//! - **Coercion**: unparsable numbers and dates become nulls, never errors
//! - **Filtering**: conjunctive category, range, and date conditions where
//!   null never matches
//! - **KPIs**: total revenue, units sold, average price, average units/row
//! - **Aggregates**: revenue by product (top-N) and by region, plus an
//!   optional monthly trend
//! - **Data quality**: per-column missing-value counts
//! - **Export**: the filtered table as CSV
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use sales_processing::{ColumnMapping, FilterSpec, SalesPipeline, io};
//!
//! let raw = io::read_csv_path("sales.csv")?;
//! let headers: Vec<String> = raw
//!     .get_column_names()
//!     .iter()
//!     .map(|s| s.to_string())
//!     .collect();
//! let mapping = ColumnMapping::infer(&headers)?;
//!
//! let pipeline = SalesPipeline::builder().build()?;
//! let report = pipeline.process(raw, &mapping, None)?;
//!
//! println!("Revenue: {:.2}", report.kpis.total_revenue);
//! for group in &report.by_product {
//!     println!("{}: {:.2}", group.key, group.revenue);
//! }
//! std::fs::write("filtered_sales.csv", report.export_csv()?)?;
//! ```
//!
//! # Missing-value semantics
//!
//! The pipeline reproduces dataframe missing-value behavior exactly:
//! arithmetic propagates nulls, sums skip them, and a null never satisfies a
//! set-membership or range condition — so rows with an unparsable price drop
//! out of the filtered table even at the default (full observed) bounds,
//! while the missing-value report still counts them.

pub mod aggregate;
pub mod cache;
pub mod coerce;
pub mod config;
pub mod error;
pub mod export;
pub mod filter;
pub mod io;
pub mod metrics;
pub mod pipeline;
pub mod quality;
pub mod schema;

// Re-exports for convenient access
pub use aggregate::{GroupRevenue, TrendPoint};
pub use cache::TableCache;
pub use config::{ConfigValidationError, PipelineConfig, PipelineConfigBuilder, TOP_N_MAX, TOP_N_MIN};
pub use error::{Result as SalesResult, ResultExt, SalesError};
pub use filter::{FilterDomain, FilterSpec};
pub use metrics::Kpis;
pub use pipeline::{canonical_table, SalesPipeline, SalesPipelineBuilder, SalesReport};
pub use quality::MissingCount;
pub use schema::{ColumnMapping, ColumnRole};
