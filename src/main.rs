//! CLI entry point for the BIXI trip statistics tool.
//!
//! Provides subcommands for listing the available years, analyzing a year,
//! rendering the dashboard, exporting station GeoJSON, and appending yearly
//! summaries to a CSV file.

use anyhow::Result;
use bixi_stats::analyzers::{AnalysisCache, YearSummary, available_years, default_year};
use bixi_stats::config::AppConfig;
use bixi_stats::output::{
    append_record, print_pretty, render_dashboard, render_unavailable, write_geojson, write_json,
};
use clap::{Parser, Subcommand};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "bixi_stats")]
#[command(about = "Yearly statistics for BIXI Montréal trip data", long_about = None)]
struct Cli {
    /// Directory containing one subdirectory per year
    #[arg(long, global = true, value_name = "DIR")]
    data_root: Option<PathBuf>,

    /// JSON configuration file
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the years available under the data root
    Years,
    /// Compute the statistics for one year
    Analyze {
        #[arg(short, long)]
        year: String,

        /// Print the full result as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Render the dashboard for a year (the default year when omitted)
    Dashboard {
        #[arg(short, long)]
        year: Option<String>,
    },
    /// Write a year's stations as a GeoJSON FeatureCollection
    Stations {
        #[arg(short, long)]
        year: String,

        #[arg(short, long, default_value = "stations.geojson")]
        output: String,
    },
    /// Append one summary row per year to a CSV file
    Export {
        /// CSV file to append results to
        #[arg(short, long, default_value = "summary.csv")]
        output: String,

        /// Years to export (all available years when omitted)
        #[arg(short, long)]
        year: Vec<String>,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    let cli = Cli::parse();

    let mut config = AppConfig::from_env();
    if let Some(path) = &cli.config {
        config = config.merge_file(path)?;
    }
    let config = config.with_data_root(cli.data_root.clone());

    // Logging setup: colored stderr + JSON rolling log file
    let log_dir = Path::new(&config.log_file_path)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&config.log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("bixi_stats.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    info!(data_root = %config.data_root.display(), "Configuration loaded");
    let cache = AnalysisCache::new(&config.data_root);

    match cli.command {
        Commands::Years => {
            let years = available_years(cache.data_root())?;
            let selected = default_year(&years, &config.default_year);
            for year in &years {
                let marker = if Some(year.as_str()) == selected {
                    " (default)"
                } else {
                    ""
                };
                println!("{year}{marker}");
            }
            info!(count = years.len(), "Years listed");
        }
        Commands::Analyze { year, json } => {
            let analysis = cache.get_or_analyze(&year)?;
            if json {
                write_json(std::io::stdout().lock(), &analysis)?;
            } else {
                print_pretty(&analysis);
                print!("{}", render_dashboard(&analysis));
            }
        }
        Commands::Dashboard { year } => {
            let year = match year {
                Some(year) => year,
                None => {
                    let years = available_years(cache.data_root())?;
                    match default_year(&years, &config.default_year) {
                        Some(year) => year.to_string(),
                        None => {
                            warn!("No year directories found");
                            return Ok(());
                        }
                    }
                }
            };

            match cache.get_or_analyze(&year) {
                Ok(analysis) => print!("{}", render_dashboard(&analysis)),
                Err(e) => {
                    error!(year = %year, error = %e, "Failed to load year");
                    println!("{}", render_unavailable(&e));
                }
            }
        }
        Commands::Stations { year, output } => {
            let analysis = cache.get_or_analyze(&year)?;
            write_geojson(&output, &analysis)?;
            info!(year = %year, output = %output, stations = analysis.station_count(), "Stations exported");
        }
        Commands::Export { output, year } => {
            let years = if year.is_empty() {
                available_years(cache.data_root())?
            } else {
                year
            };

            let mut exported = 0;
            for year in &years {
                match cache.get_or_analyze(year) {
                    Ok(analysis) => {
                        append_record(&output, &YearSummary::from(analysis.as_ref()))?;
                        exported += 1;
                    }
                    Err(e) => error!(year = %year, error = %e, "Skipping year"),
                }
            }

            info!(exported, requested = years.len(), output = %output, "Export complete");
        }
    }

    Ok(())
}
