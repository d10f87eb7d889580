//! COTLab CLI: fetch Commitments of Traders reports and explore net positions.
//!
//! Commands:
//! - `fetch`: load a report, print a summary, optionally save it as CSV
//! - `markets`: list (or search) the markets in a report
//! - `columns`: column classification and summary statistics
//! - `net`: net positions per trader category for one market

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use cotlab_core::data::{RecordSource, ReqwestClient, SourceAdapter, SourceSpec};
use cotlab_core::domain::{format_number, Dataset, TraderCategory};
use cotlab_core::{
    classify, derive, describe, is_cot_dataset, list_markets, normalize_with_summary,
    search_markets, CotConfig, NetPositionSeries,
};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "cotlab",
    about = "COTLab CLI: CFTC Commitments of Traders data and net positions"
)]
struct Cli {
    /// Path to a TOML config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log verbosity (-v debug, -vv trace). Overrides RUST_LOG.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a report and print rows, columns and markets.
    Fetch {
        #[command(flatten)]
        source: SourceArgs,

        /// Write the normalized dataset to this CSV file.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// List the markets in a report.
    Markets {
        #[command(flatten)]
        source: SourceArgs,

        /// Case-insensitive substring filter.
        #[arg(long)]
        search: Option<String>,
    },
    /// Classify columns and describe the numeric ones.
    Columns {
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Print net positions (long minus short) for one market.
    Net {
        #[command(flatten)]
        source: SourceArgs,

        /// Exact market name, as listed by `cotlab markets`.
        #[arg(long)]
        market: String,

        /// Write the series to this CSV file instead of printing it.
        #[arg(long)]
        csv: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum SourceKind {
    /// CFTC public reporting JSON API.
    Api,
    /// CFTC full-history CSV download.
    Bulk,
    /// Any CSV URL (requires --url).
    Csv,
    /// One year from the CFTC historical archives (requires --year).
    History,
}

#[derive(Args, Debug, Clone)]
struct SourceArgs {
    /// Where to load the report from.
    #[arg(long, value_enum, default_value_t = SourceKind::Api)]
    source: SourceKind,

    /// legacy_fut, legacy_combined, disaggregated_fut or tff_fut.
    #[arg(long, default_value = "legacy_fut")]
    report_type: String,

    /// Report year for --source history.
    #[arg(long)]
    year: Option<i32>,

    /// CSV location for --source csv.
    #[arg(long)]
    url: Option<String>,

    /// Row limit for --source api. Defaults to the configured limit.
    #[arg(long)]
    limit: Option<usize>,

    /// Load a local CSV file instead of fetching (offline).
    #[arg(long)]
    from_file: Option<PathBuf>,
}

impl SourceArgs {
    fn to_spec(&self, config: &CotConfig) -> Result<SourceSpec> {
        if let Some(path) = &self.from_file {
            return Ok(SourceSpec::csv_file(path));
        }
        let spec = match self.source {
            SourceKind::Api => SourceSpec::cftc_api(
                &self.report_type,
                self.limit.unwrap_or(config.cftc.default_limit),
                config.cftc.default_order.clone(),
            )?,
            SourceKind::Bulk => SourceSpec::bulk_csv(&self.report_type)?,
            SourceKind::Csv => {
                let Some(url) = &self.url else {
                    bail!("--url is required with --source csv");
                };
                SourceSpec::csv_url(url.clone())
            }
            SourceKind::History => {
                let Some(year) = self.year else {
                    bail!("--year is required with --source history");
                };
                SourceSpec::historical_year(year, &self.report_type)?
            }
        };
        Ok(spec)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => CotConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => CotConfig::default(),
    };
    let client = ReqwestClient::new(&config.http.user_agent)?;
    let adapter = SourceAdapter::new(client, config);

    match cli.command {
        Commands::Fetch { source, output } => run_fetch(&adapter, &source, output.as_deref()),
        Commands::Markets { source, search } => run_markets(&adapter, &source, search.as_deref()),
        Commands::Columns { source } => run_columns(&adapter, &source),
        Commands::Net {
            source,
            market,
            csv,
        } => run_net(&adapter, &source, &market, csv.as_deref()),
    }
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load(adapter: &SourceAdapter<ReqwestClient>, source: &SourceArgs) -> Result<Dataset> {
    let spec = source.to_spec(adapter.config())?;
    tracing::debug!(source = %spec.describe(), "loading dataset");
    adapter
        .load(&spec)
        .with_context(|| format!("failed to load {}", spec.describe()))
}

fn run_fetch(
    adapter: &SourceAdapter<ReqwestClient>,
    source: &SourceArgs,
    output: Option<&Path>,
) -> Result<()> {
    let spec = source.to_spec(adapter.config())?;
    let fetched = adapter
        .fetch(&spec)
        .with_context(|| format!("failed to load {}", spec.describe()))?;
    let (dataset, summary) = normalize_with_summary(fetched);

    println!("Source:   {}", spec.describe());
    if let SourceSpec::CftcApi { report_type, .. }
    | SourceSpec::BulkCsv { report_type }
    | SourceSpec::HistoricalYear { report_type, .. } = &spec
    {
        println!("Report:   {}", report_type.description());
    }
    println!("Rows:     {}", dataset.row_count());
    println!("Columns:  {}", dataset.column_count());
    if summary.dropped_rows > 0 {
        println!("Dropped:  {} blank rows", summary.dropped_rows);
    }
    println!("Numeric:  {} columns promoted", summary.promoted.len());
    if is_cot_dataset(&dataset) {
        println!("Markets:  {}", list_markets(&dataset).len());
    } else {
        println!("Markets:  n/a (not a COT report)");
    }

    if let Some(path) = output {
        let file = File::create(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        dataset.write_csv(BufWriter::new(file))?;
        println!("Saved to {}", path.display());
    }
    Ok(())
}

fn run_markets(
    adapter: &SourceAdapter<ReqwestClient>,
    source: &SourceArgs,
    search: Option<&str>,
) -> Result<()> {
    let dataset = load(adapter, source)?;
    if !is_cot_dataset(&dataset) {
        bail!("dataset has no market and position columns");
    }
    let markets = list_markets(&dataset);
    let found = search_markets(&markets, search.unwrap_or(""));
    if found.fell_back {
        eprintln!(
            "No markets match {:?}; showing all {}",
            search.unwrap_or(""),
            markets.len()
        );
    }
    for market in &found.matches {
        println!("{market}");
    }
    Ok(())
}

fn run_columns(adapter: &SourceAdapter<ReqwestClient>, source: &SourceArgs) -> Result<()> {
    let dataset = load(adapter, source)?;
    let partition = classify(&dataset);

    println!("Numeric ({}):", partition.numeric.len());
    for name in &partition.numeric {
        println!("  {name}");
    }
    println!("Categorical ({}):", partition.categorical.len());
    for name in &partition.categorical {
        println!("  {name}");
    }
    println!("Datetime ({}):", partition.datetime.len());
    for name in &partition.datetime {
        println!("  {name}");
    }

    let stats = describe(&dataset);
    if stats.is_empty() {
        return Ok(());
    }
    let width = stats.iter().map(|s| s.column.len()).max().unwrap_or(0).max(6);
    println!();
    println!(
        "{:<width$} {:>7} {:>14} {:>14} {:>14} {:>14} {:>14}",
        "column", "count", "mean", "std", "min", "median", "max"
    );
    for s in &stats {
        println!(
            "{:<width$} {:>7} {:>14} {:>14} {:>14} {:>14} {:>14}",
            s.column,
            s.count,
            cell(s.mean),
            cell(s.std),
            cell(s.min),
            cell(s.median),
            cell(s.max),
        );
    }
    Ok(())
}

fn run_net(
    adapter: &SourceAdapter<ReqwestClient>,
    source: &SourceArgs,
    market: &str,
    csv: Option<&Path>,
) -> Result<()> {
    let dataset = load(adapter, source)?;
    let series = derive(&dataset, market)?;
    if let Some(note) = &series.degraded {
        eprintln!(
            "Warning: {} could not be parsed as dates ({}); rows are in report order",
            note.column, note.reason
        );
    }

    match csv {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            series.write_csv(BufWriter::new(file))?;
            println!("Saved {} rows to {}", series.len(), path.display());
        }
        None => print_series(&series),
    }
    Ok(())
}

fn print_series(series: &NetPositionSeries) {
    println!("{}", series.market);
    print!("{:<12}", "date");
    for category in TraderCategory::ALL {
        print!(" {:>18}", category.label());
    }
    println!();
    for point in &series.points {
        print!("{:<12}", point.date_label());
        for category in TraderCategory::ALL {
            print!(" {:>18}", cell(point.net(category)));
        }
        println!();
    }

    if let (Some(latest), Some((lo, hi))) = (series.latest(), series.extent()) {
        println!();
        println!("Latest ({}):", latest.date_label());
        for category in TraderCategory::ALL {
            println!(
                "  {:<18} {:>12} {}",
                category.label(),
                cell(latest.net(category)),
                bar(latest.net(category), lo, hi)
            );
        }
    }
}

fn cell(value: Option<f64>) -> String {
    match value {
        Some(v) if v.fract() == 0.0 => format_number(v),
        Some(v) => format!("{v:.2}"),
        None => "-".to_string(),
    }
}

/// Horizontal bar scaled to the series extent, left of `|` for short.
fn bar(value: Option<f64>, lo: f64, hi: f64) -> String {
    let half = 20;
    let Some(v) = value else {
        return String::new();
    };
    let scale = lo.abs().max(hi.abs());
    if scale == 0.0 {
        return format!("{:half$}|", "");
    }
    let len = ((v.abs() / scale) * half as f64).round() as usize;
    if v < 0.0 {
        format!("{:>half$}|", "#".repeat(len))
    } else {
        format!("{:half$}|{}", "", "#".repeat(len))
    }
}
