//! The sales pipeline: a pure function from (raw table, column mapping,
//! filter spec) to the dashboard artifacts.
//!
//! Every call recomputes from scratch — there is no incremental state, so a
//! hosting UI can simply re-run the pipeline whenever any input changes.

use crate::aggregate::{self, GroupRevenue, TrendPoint};
use crate::coerce;
use crate::config::PipelineConfig;
use crate::error::{Result, SalesError};
use crate::export;
use crate::filter::{self, FilterDomain, FilterSpec};
use crate::metrics::Kpis;
use crate::quality::{self, MissingCount};
use crate::schema::{self, ColumnMapping, PRODUCT, REGION};
use polars::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

/// The sales analytics pipeline.
///
/// # Example
///
/// ```rust,ignore
/// use sales_processing::{ColumnMapping, PipelineConfig, SalesPipeline};
///
/// let pipeline = SalesPipeline::builder()
///     .config(PipelineConfig::builder().top_n(15).build()?)
///     .build()?;
///
/// let raw = sales_processing::io::read_csv_path("sales.csv")?;
/// let headers: Vec<String> = raw
///     .get_column_names()
///     .iter()
///     .map(|s| s.to_string())
///     .collect();
/// let mapping = ColumnMapping::infer(&headers)?;
/// let report = pipeline.process(raw, &mapping, None)?;
///
/// println!("Total revenue: {}", report.kpis.total_revenue);
/// ```
#[derive(Debug)]
pub struct SalesPipeline {
    config: PipelineConfig,
}

// The pipeline is handed to worker threads by GUI hosts.
static_assertions::assert_impl_all!(SalesPipeline: Send);

impl SalesPipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> SalesPipelineBuilder {
        SalesPipelineBuilder::default()
    }

    /// The active configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the full pipeline.
    ///
    /// When `filters` is `None`, the defaults derived from the observed
    /// domain apply (no net filtering beyond the null-fails-range rule).
    pub fn process(
        &self,
        raw: DataFrame,
        mapping: &ColumnMapping,
        filters: Option<&FilterSpec>,
    ) -> Result<SalesReport> {
        info!(
            "Running sales pipeline over {} rows x {} columns",
            raw.height(),
            raw.width()
        );

        let canonical = canonical_table(raw, mapping)?;
        let rows_total = canonical.height();

        let missing = quality::missing_report(&canonical);
        let domain = FilterDomain::from_table(&canonical)?;

        let default_spec;
        let spec = match filters {
            Some(spec) => spec,
            None => {
                default_spec = FilterSpec::from_domain(&domain);
                &default_spec
            }
        };

        let filtered = filter::apply(&canonical, spec)?;
        debug!("{} of {} rows pass the filters", filtered.height(), rows_total);

        let kpis = Kpis::compute(&filtered)?;
        let by_product = aggregate::revenue_by(&filtered, PRODUCT, Some(self.config.top_n))?;
        let by_region = aggregate::revenue_by(&filtered, REGION, None)?;
        let trend = if mapping.has_date() {
            Some(aggregate::monthly_trend(&filtered)?)
        } else {
            None
        };

        info!(
            "Pipeline complete: revenue {:.2} over {} filtered rows",
            kpis.total_revenue,
            filtered.height()
        );

        Ok(SalesReport {
            rows_total,
            rows_filtered: filtered.height(),
            kpis,
            by_product,
            by_region,
            trend,
            missing,
            domain,
            filtered,
        })
    }
}

/// Normalize headers, project onto canonical roles, and coerce measures.
///
/// Exposed so callers can derive a [`FilterDomain`] (to seed filter widgets)
/// before running [`SalesPipeline::process`] with explicit filters.
pub fn canonical_table(raw: DataFrame, mapping: &ColumnMapping) -> Result<DataFrame> {
    let raw = schema::normalize_columns(raw)?;
    let projected = schema::project_canonical(&raw, mapping)?;
    coerce::coerce_canonical(projected)
}

/// Builder for [`SalesPipeline`].
#[derive(Debug, Default)]
pub struct SalesPipelineBuilder {
    config: Option<PipelineConfig>,
}

impl SalesPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Build the pipeline, validating the configuration.
    pub fn build(self) -> Result<SalesPipeline> {
        let config = self.config.unwrap_or_default();
        config
            .validate()
            .map_err(|e| SalesError::InvalidConfig(e.to_string()))?;
        Ok(SalesPipeline { config })
    }
}

/// Everything one pipeline run produces.
#[derive(Debug, Clone, Serialize)]
pub struct SalesReport {
    /// Rows in the canonical table before filtering.
    pub rows_total: usize,
    /// Rows remaining after filtering.
    pub rows_filtered: usize,
    /// Scalar summary metrics over the filtered table.
    pub kpis: Kpis,
    /// Revenue by product, descending, truncated to the configured top-N.
    pub by_product: Vec<GroupRevenue>,
    /// Revenue by region, descending.
    pub by_region: Vec<GroupRevenue>,
    /// Monthly revenue trend; `None` when no date column is mapped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend: Option<Vec<TrendPoint>>,
    /// Null counts per canonical column, computed before filtering.
    pub missing: Vec<MissingCount>,
    /// Observed value sets and bounds, for seeding filter widgets.
    pub domain: FilterDomain,
    /// The filtered canonical table (preview + export artifact).
    #[serde(skip)]
    pub filtered: DataFrame,
}

impl SalesReport {
    /// Serialize the filtered table to CSV bytes.
    pub fn export_csv(&self) -> Result<Vec<u8>> {
        export::to_csv_bytes(&self.filtered)
    }
}
