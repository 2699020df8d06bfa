//! CLI entry point for the sales analytics pipeline.

use anyhow::{anyhow, Result};
use clap::Parser;
use sales_processing::{
    canonical_table, coerce, io, metrics, ColumnMapping, FilterDomain, FilterSpec, PipelineConfig,
    SalesPipeline, SalesReport,
};
use chrono::NaiveDate;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    version,
    about = "CSV sales analytics: filters, KPIs, and revenue rankings",
    long_about = "Analyze a sales CSV with column mapping, filtering, KPIs, revenue\n\
                  rankings, and a monthly trend.\n\n\
                  EXAMPLES:\n  \
                  # Auto-detect columns, print the dashboard, export filtered rows\n  \
                  sales-processing -i sales.csv\n\n  \
                  # Custom column mapping with a date column\n  \
                  sales-processing -i sales.csv --region-col Territory --date-col OrderDate\n\n  \
                  # Filtered run, machine-readable output\n  \
                  sales-processing -i sales.csv --regions East,West --price-min 10 --json\n\n  \
                  # Preview mapping and observed ranges without processing\n  \
                  sales-processing -i sales.csv --dry-run"
)]
struct Args {
    /// Path to the CSV file to analyze
    #[arg(short, long)]
    input: String,

    /// Output path for the filtered CSV export
    ///
    /// Defaults to the configured export file name in the current directory
    #[arg(short, long)]
    output: Option<String>,

    /// Skip writing the filtered CSV export
    #[arg(long)]
    no_export: bool,

    /// Source column for the Region role (default: exact match or first column)
    #[arg(long)]
    region_col: Option<String>,

    /// Source column for the Product role
    #[arg(long)]
    product_col: Option<String>,

    /// Source column for the Price role
    #[arg(long)]
    price_col: Option<String>,

    /// Source column for the Quantity role
    #[arg(long)]
    quantity_col: Option<String>,

    /// Source column for the optional Date role
    #[arg(long)]
    date_col: Option<String>,

    /// Comma-separated region values to include (default: all)
    #[arg(long, value_delimiter = ',')]
    regions: Option<Vec<String>>,

    /// Comma-separated product values to include (default: all)
    #[arg(long, value_delimiter = ',')]
    products: Option<Vec<String>>,

    /// Lower price bound (default: observed minimum)
    #[arg(long)]
    price_min: Option<f64>,

    /// Upper price bound (default: observed maximum)
    #[arg(long)]
    price_max: Option<f64>,

    /// Lower quantity bound (default: observed minimum)
    #[arg(long)]
    qty_min: Option<f64>,

    /// Upper quantity bound (default: observed maximum)
    #[arg(long)]
    qty_max: Option<f64>,

    /// Start of the date range (requires --date-col), e.g. 2024-01-01
    #[arg(long)]
    date_start: Option<String>,

    /// End of the date range (requires --date-col)
    #[arg(long)]
    date_end: Option<String>,

    /// Number of products kept in the revenue ranking (5-30)
    #[arg(long, default_value = "10")]
    top_n: usize,

    /// Preview the column mapping and observed ranges without processing
    #[arg(long)]
    dry_run: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show errors and the final summary)
    #[arg(short, long)]
    quiet: bool,

    /// Output the report as JSON to stdout instead of the text dashboard
    ///
    /// Disables all logs; only the JSON report is written to stdout
    #[arg(long)]
    json: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level, args.quiet, args.json);

    if !std::path::Path::new(&args.input).exists() {
        return Err(anyhow!("Input file not found: {}", args.input));
    }

    info!("Loading dataset from: {}", args.input);
    let raw = io::read_csv_path(&args.input)?;
    info!("Dataset loaded: {} rows x {} columns", raw.height(), raw.width());

    let mapping = resolve_mapping(&args, &raw)?;

    if args.dry_run {
        return run_dry_run(&args, raw, &mapping);
    }

    let config = PipelineConfig::builder().top_n(args.top_n).build()?;
    let pipeline = SalesPipeline::builder().config(config).build()?;

    // Filters are seeded from the observed domain, then overridden per flag.
    let canonical = canonical_table(raw.clone(), &mapping)?;
    let domain = FilterDomain::from_table(&canonical)?;
    let filters = resolve_filters(&args, &domain)?;

    let report = pipeline.process(raw, &mapping, Some(&filters))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_dashboard(&report, &mapping);
    }

    if !args.no_export {
        let path = args
            .output
            .clone()
            .unwrap_or_else(|| pipeline.config().export_file_name.clone());
        sales_processing::export::write_csv(&report.filtered, &path)?;
        if !args.json {
            println!("Filtered data written to {path}");
        }
    }

    Ok(())
}

/// Build the column mapping: inferred defaults, overridden per flag.
fn resolve_mapping(args: &Args, raw: &polars::prelude::DataFrame) -> Result<ColumnMapping> {
    let raw_headers: Vec<String> = raw
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();
    let headers = sales_processing::schema::normalize_headers(&raw_headers);

    let mut mapping = ColumnMapping::infer(&headers)?;
    if let Some(col) = &args.region_col {
        mapping.region = col.clone();
    }
    if let Some(col) = &args.product_col {
        mapping.product = col.clone();
    }
    if let Some(col) = &args.price_col {
        mapping.price = col.clone();
    }
    if let Some(col) = &args.quantity_col {
        mapping.quantity = col.clone();
    }
    mapping.date = args.date_col.clone();
    Ok(mapping)
}

/// Build the filter spec: domain defaults, overridden per flag.
fn resolve_filters(args: &Args, domain: &FilterDomain) -> Result<FilterSpec> {
    let mut spec = FilterSpec::from_domain(domain);

    if let Some(regions) = &args.regions {
        spec.regions = regions.clone();
    }
    if let Some(products) = &args.products {
        spec.products = products.clone();
    }
    if let Some(min) = args.price_min {
        spec.price.0 = min;
    }
    if let Some(max) = args.price_max {
        spec.price.1 = max;
    }
    if let Some(min) = args.qty_min {
        spec.quantity.0 = min;
    }
    if let Some(max) = args.qty_max {
        spec.quantity.1 = max;
    }

    if args.date_start.is_some() || args.date_end.is_some() {
        if args.date_col.is_none() {
            return Err(anyhow!("--date-start/--date-end require --date-col"));
        }
        let observed = domain
            .dates
            .ok_or_else(|| anyhow!("No parsable dates in the mapped date column"))?;
        let start = parse_date_arg(args.date_start.as_deref(), observed.0)?;
        let end = parse_date_arg(args.date_end.as_deref(), observed.1)?;
        spec.dates = Some((start, end));
    }

    Ok(spec)
}

fn parse_date_arg(value: Option<&str>, default: NaiveDate) -> Result<NaiveDate> {
    match value {
        Some(s) => {
            coerce::parse_date_str(s).ok_or_else(|| anyhow!("Unrecognized date: '{s}'"))
        }
        None => Ok(default),
    }
}

/// Preview what the pipeline will do without processing.
///
/// Uses `println!` intentionally: this output is the point of --dry-run and
/// should be visible regardless of log level.
fn run_dry_run(args: &Args, raw: polars::prelude::DataFrame, mapping: &ColumnMapping) -> Result<()> {
    println!("\n{}", "=".repeat(80));
    println!("DRY RUN - Preview of pipeline inputs");
    println!("{}\n", "=".repeat(80));

    println!("DATASET OVERVIEW");
    println!("{}", "-".repeat(40));
    println!("  File: {}", args.input);
    println!("  Rows: {}", raw.height());
    println!("  Columns: {}", raw.width());
    println!();

    println!("COLUMN MAPPING");
    println!("{}", "-".repeat(40));
    println!("  Region   <- {}", mapping.region);
    println!("  Product  <- {}", mapping.product);
    println!("  Price    <- {}", mapping.price);
    println!("  Quantity <- {}", mapping.quantity);
    match &mapping.date {
        Some(col) => println!("  Date     <- {col}"),
        None => println!("  Date     <- (none)"),
    }
    println!();

    let canonical = canonical_table(raw, mapping)?;
    let domain = FilterDomain::from_table(&canonical)?;

    println!("OBSERVED FILTER DOMAIN");
    println!("{}", "-".repeat(40));
    println!("  Regions:  {} distinct", domain.regions.len());
    println!("  Products: {} distinct", domain.products.len());
    println!("  Price:    {:.2} .. {:.2}", domain.price.0, domain.price.1);
    println!("  Quantity: {:.2} .. {:.2}", domain.quantity.0, domain.quantity.1);
    if let Some((start, end)) = domain.dates {
        println!("  Dates:    {start} .. {end}");
    }
    println!();

    println!("{}", "=".repeat(80));
    println!("To run the analysis, rerun without --dry-run");
    println!("{}", "=".repeat(80));

    Ok(())
}

/// Print the text dashboard (default output).
fn print_dashboard(report: &SalesReport, mapping: &ColumnMapping) {
    println!();
    println!("{}", "=".repeat(80));
    println!("SALES DASHBOARD");
    println!("{}", "=".repeat(80));
    println!();

    println!(
        "Rows: {} of {} pass the active filters",
        report.rows_filtered, report.rows_total
    );
    println!();

    println!("KEY METRICS");
    println!("{}", "-".repeat(40));
    println!("  Revenue:         {}", metrics::format_amount(report.kpis.total_revenue));
    println!("  Units Sold:      {}", metrics::format_count(report.kpis.total_units));
    println!("  Avg Price:       {}", metrics::format_optional(report.kpis.avg_price, 2));
    println!("  Avg Units / Row: {}", metrics::format_optional(report.kpis.avg_units, 2));
    println!();

    println!("DATA QUALITY (missing values per column)");
    println!("{}", "-".repeat(40));
    for entry in &report.missing {
        println!("  {:<10} {}", entry.column, entry.missing);
    }
    println!();

    println!("TOP PRODUCTS BY REVENUE");
    println!("{}", "-".repeat(40));
    if report.by_product.is_empty() {
        println!("  (no rows)");
    }
    for group in &report.by_product {
        println!("  {:<24} {}", group.key, metrics::format_amount(group.revenue));
    }
    println!();

    println!("REVENUE BY REGION");
    println!("{}", "-".repeat(40));
    if report.by_region.is_empty() {
        println!("  (no rows)");
    }
    for group in &report.by_region {
        println!("  {:<24} {}", group.key, metrics::format_amount(group.revenue));
    }
    println!();

    if let Some(trend) = &report.trend {
        println!("MONTHLY REVENUE TREND");
        println!("{}", "-".repeat(40));
        if trend.is_empty() {
            println!("  (no rows with a usable date)");
        }
        for point in trend {
            println!("  {}  {}", point.month, metrics::format_amount(point.revenue));
        }
        println!();
    } else if mapping.date.is_none() {
        println!("(map a date column with --date-col to see the monthly trend)");
        println!();
    }

    println!("PREVIEW");
    println!("{}", "-".repeat(40));
    println!("{}", report.filtered);
}
