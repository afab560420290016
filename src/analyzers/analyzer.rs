use crate::analyzers::aggregate::aggregate_year;
use crate::analyzers::error::AnalysisError;
use crate::analyzers::types::YearlyAnalysis;
use crate::parser::{parse_stations, parse_trips};
use crate::stats::TripStats;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// File-name prefix of the station inventory; every other CSV is a trip log.
pub const STATION_FILE_PREFIX: &str = "Stations";

/// Name of the station inventory for `year`, e.g. `Stations_2014.csv`.
pub fn station_file_name(year: &str) -> String {
    format!("{}_{}.csv", STATION_FILE_PREFIX, year)
}

/// Loads `<data_root>/<year>` and computes its statistics.
///
/// Trip files are concatenated in file-name order. Any failure aborts the
/// whole analysis; there is never a partial result.
#[tracing::instrument(skip(data_root), fields(data_root = %data_root.display()))]
pub fn analyze(data_root: &Path, year: &str) -> Result<YearlyAnalysis, AnalysisError> {
    let year_dir = data_root.join(year);
    if !year_dir.is_dir() {
        return Err(AnalysisError::DirectoryNotFound {
            year: year.to_string(),
            path: year_dir,
        });
    }

    let station_path = year_dir.join(station_file_name(year));
    if !station_path.is_file() {
        return Err(AnalysisError::StationFileMissing { path: station_path });
    }
    let stations = parse_stations(&station_path)?;
    debug!(stations = stations.len(), "Station inventory loaded");

    let trip_files = list_trip_files(&year_dir)?;
    if trip_files.is_empty() {
        return Err(AnalysisError::NoTripFiles { path: year_dir });
    }

    let mut trips = Vec::new();
    for path in &trip_files {
        trips.extend(parse_trips(path)?);
    }

    let stats = TripStats::from_trips(&trips);
    if stats.unknown_membership > 0 {
        warn!(
            rows = stats.unknown_membership,
            "Trips with an is_member flag other than 0 or 1"
        );
    }

    let analysis = aggregate_year(year, stations, &stats)?;

    info!(
        files = trip_files.len(),
        trips = analysis.trip_count,
        stations = analysis.station_count(),
        "Year analyzed"
    );
    Ok(analysis)
}

/// Lists the years available under `data_root`: its subdirectory names, sorted.
pub fn available_years(data_root: &Path) -> Result<Vec<String>> {
    let mut years = Vec::new();

    let entries = fs::read_dir(data_root)
        .with_context(|| format!("Failed to read data root {}", data_root.display()))?;

    for entry in entries {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            if let Some(dir_name) = entry.file_name().to_str() {
                years.push(dir_name.to_string());
            }
        }
    }

    years.sort();
    Ok(years)
}

/// Picks the year shown first: `preferred` when available, else the earliest.
pub fn default_year<'a>(years: &'a [String], preferred: &str) -> Option<&'a str> {
    years
        .iter()
        .find(|y| y.as_str() == preferred)
        .or_else(|| years.first())
        .map(String::as_str)
}

fn list_trip_files(year_dir: &Path) -> Result<Vec<PathBuf>, AnalysisError> {
    let mut files = Vec::new();

    let entries = fs::read_dir(year_dir).map_err(|e| AnalysisError::io(year_dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| AnalysisError::io(year_dir, e))?;
        let path = entry.path();

        if path.extension().and_then(|e| e.to_str()) != Some("csv") {
            continue;
        }

        let is_station_file = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(STATION_FILE_PREFIX));

        if !is_station_file && path.is_file() {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}
