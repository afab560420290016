//! Presentation of yearly analyses.
//!
//! Supports a text dashboard, JSON and GeoJSON serialization, and a CSV
//! summary export.

use anyhow::Result;
use serde_json::{Value, json};
use tracing::debug;

use crate::analyzers::error::AnalysisError;
use crate::analyzers::types::{YearSummary, YearlyAnalysis};
use csv::WriterBuilder;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

const BAR_WIDTH: usize = 40;

/// Logs an analysis using Rust's debug pretty-print format.
pub fn print_pretty(analysis: &YearlyAnalysis) {
    debug!("{:#?}", analysis);
}

/// Writes an analysis as pretty-printed JSON followed by a newline.
pub fn write_json<W: Write>(mut writer: W, analysis: &YearlyAnalysis) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, analysis)?;
    writeln!(writer)?;
    Ok(())
}

/// The single message shown instead of a dashboard when a year cannot be loaded.
pub fn render_unavailable(err: &AnalysisError) -> String {
    format!("Error loading data: {err}")
}

/// Renders the four metric cards, the period bar chart, and a station summary.
pub fn render_dashboard(analysis: &YearlyAnalysis) -> String {
    Dashboard(analysis).to_string()
}

/// Text dashboard of one year, rendered through [`fmt::Display`].
pub struct Dashboard<'a>(pub &'a YearlyAnalysis);

impl fmt::Display for Dashboard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let analysis = self.0;

        writeln!(f, "BIXI Montréal {}", analysis.year)?;
        writeln!(f)?;
        writeln!(f, "General statistics")?;
        writeln!(
            f,
            "  Average trip duration  {:.1} min",
            analysis.avg_duration_minutes
        )?;
        writeln!(f, "  Loop trips             {:.1}%", analysis.loop_percent)?;
        writeln!(
            f,
            "  Member trips           {}",
            format_thousands(analysis.members)
        )?;
        writeln!(
            f,
            "  Casual trips           {}",
            format_thousands(analysis.casuals)
        )?;
        writeln!(f)?;

        writeln!(f, "Trips by period")?;
        for (bucket, percent) in analysis.periods_descending() {
            let filled = ((percent / 100.0) * BAR_WIDTH as f64).round() as usize;
            writeln!(
                f,
                "  {:>7} {:<width$} {:>5.1}%",
                bucket.label(),
                "█".repeat(filled.min(BAR_WIDTH)),
                percent,
                width = BAR_WIDTH
            )?;
        }
        writeln!(f)?;

        writeln!(
            f,
            "Stations {} ({} in {})",
            analysis.year,
            format_thousands(analysis.station_count()),
            analysis.crs
        )?;
        if let Some(bounds) = station_bounds(analysis) {
            writeln!(
                f,
                "  longitude {:.4} .. {:.4}, latitude {:.4} .. {:.4}",
                bounds.min_lon, bounds.max_lon, bounds.min_lat, bounds.max_lat
            )?;
        }

        Ok(())
    }
}

/// Bounding box of a year's stations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_lon: f64,
    pub max_lon: f64,
    pub min_lat: f64,
    pub max_lat: f64,
}

pub fn station_bounds(analysis: &YearlyAnalysis) -> Option<Bounds> {
    let first = analysis.stations.first()?;
    let start = Bounds {
        min_lon: first.longitude,
        max_lon: first.longitude,
        min_lat: first.latitude,
        max_lat: first.latitude,
    };

    Some(analysis.stations.iter().fold(start, |b, s| Bounds {
        min_lon: b.min_lon.min(s.longitude),
        max_lon: b.max_lon.max(s.longitude),
        min_lat: b.min_lat.min(s.latitude),
        max_lat: b.max_lat.max(s.latitude),
    }))
}

/// Formats a count with `,` thousands separators.
pub fn format_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Builds a GeoJSON `FeatureCollection` of the stations, one Point per row.
pub fn stations_geojson(analysis: &YearlyAnalysis) -> Value {
    let features: Vec<Value> = analysis
        .stations
        .iter()
        .map(|station| {
            json!({
                "type": "Feature",
                "geometry": {
                    "type": "Point",
                    "coordinates": [station.geometry.x, station.geometry.y],
                },
                "properties": {
                    "code": station.code,
                    "name": station.name,
                },
            })
        })
        .collect();

    json!({
        "type": "FeatureCollection",
        "crs": {
            "type": "name",
            "properties": { "name": analysis.crs },
        },
        "features": features,
    })
}

/// Writes the station GeoJSON to `path`, replacing any existing file.
pub fn write_geojson(path: &str, analysis: &YearlyAnalysis) -> Result<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, &stations_geojson(analysis))?;
    debug!(path, stations = analysis.station_count(), "GeoJSON written");
    Ok(())
}

/// Appends a [`YearSummary`] record as a row to a CSV file.
///
/// Creates the file with headers if it does not already exist.
pub fn append_record(path: &str, summary: &YearSummary) -> Result<()> {
    let file_exists = Path::new(path).exists();
    debug!(path, file_exists, "Appending CSV record");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists) // IMPORTANT when appending
        .from_writer(file);

    writer.serialize(summary)?;
    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::types::{CRS_WGS84, PeriodBucket, Station};
    use std::collections::BTreeMap;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn sample() -> YearlyAnalysis {
        let periods = BTreeMap::from([
            (PeriodBucket::Night, 4.0),
            (PeriodBucket::Morning, 31.0),
            (PeriodBucket::Afternoon, 41.0),
            (PeriodBucket::Evening, 24.0),
        ]);
        YearlyAnalysis {
            year: "2014".into(),
            crs: CRS_WGS84,
            stations: vec![
                Station::new(Some("6209".into()), "Milton / Clark".into(), -73.57062, 45.51252),
                Station::new(None, "Métro Jean-Drapeau".into(), -73.5345, 45.5123),
            ],
            trip_count: 3_136_276,
            avg_duration_minutes: 13.62,
            loop_percent: 2.04,
            members: 2_576_621,
            casuals: 559_655,
            periods,
        }
    }

    fn temp_path(dir: &TempDir, name: &str) -> String {
        dir.path().join(name).display().to_string()
    }

    #[test]
    fn test_print_pretty_does_not_panic() {
        print_pretty(&sample());
    }

    #[test]
    fn test_write_json_contains_bucket_labels() {
        let mut buf = Vec::new();
        write_json(&mut buf, &sample()).unwrap();

        let value: Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value["periods"]["12h-18h"], 41.0);
        assert_eq!(value["members"], 2_576_621);
        assert_eq!(value["stations"][0]["geometry"]["x"], -73.57062);
    }

    #[test]
    fn test_format_thousands() {
        assert_eq!(format_thousands(0), "0");
        assert_eq!(format_thousands(999), "999");
        assert_eq!(format_thousands(1000), "1,000");
        assert_eq!(format_thousands(2_576_621), "2,576,621");
    }

    #[test]
    fn test_dashboard_sections() {
        let text = render_dashboard(&sample());

        assert!(text.contains("13.6 min"));
        assert!(text.contains("2.0%"));
        assert!(text.contains("2,576,621"));
        assert!(text.contains("559,655"));

        let afternoon = text.find("12h-18h").unwrap();
        let night = text.find("0h-6h").unwrap();
        assert!(afternoon < night, "bars are sorted descending");

        assert!(text.contains("Stations 2014 (2 in EPSG:4326)"));
    }

    #[test]
    fn test_dashboard_display_matches_render() {
        let analysis = sample();
        let text = format!("{}", Dashboard(&analysis));

        assert_eq!(text, render_dashboard(&analysis));
        assert!(text.starts_with("BIXI Montréal 2014\n\nGeneral statistics\n"));
        assert_eq!(text.lines().filter(|l| l.contains('%')).count(), 5);
    }

    #[test]
    fn test_render_unavailable() {
        let err = AnalysisError::NoTripFiles {
            path: PathBuf::from("bixi_data/2013"),
        };
        assert_eq!(
            render_unavailable(&err),
            "Error loading data: no trip files found in bixi_data/2013"
        );
    }

    #[test]
    fn test_station_bounds() {
        let bounds = station_bounds(&sample()).unwrap();
        assert_eq!(bounds.min_lon, -73.57062);
        assert_eq!(bounds.max_lon, -73.5345);
        assert_eq!(bounds.min_lat, 45.5123);

        let mut empty = sample();
        empty.stations.clear();
        assert!(station_bounds(&empty).is_none());
    }

    #[test]
    fn test_geojson_points_are_lon_lat() {
        let geo = stations_geojson(&sample());

        assert_eq!(geo["type"], "FeatureCollection");
        assert_eq!(geo["crs"]["properties"]["name"], "EPSG:4326");
        assert_eq!(geo["features"].as_array().unwrap().len(), 2);
        assert_eq!(
            geo["features"][0]["geometry"]["coordinates"],
            json!([-73.57062, 45.51252])
        );
        assert_eq!(geo["features"][1]["properties"]["code"], Value::Null);
    }

    #[test]
    fn test_write_geojson_file() {
        let dir = TempDir::new().unwrap();
        let path = temp_path(&dir, "stations_2014.geojson");

        write_geojson(&path, &sample()).unwrap();

        let value: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["features"][1]["properties"]["name"], "Métro Jean-Drapeau");
    }

    #[test]
    fn test_append_record_writes_header_once() {
        let dir = TempDir::new().unwrap();
        let path = temp_path(&dir, "summary.csv");

        let summary = YearSummary::from(&sample());
        append_record(&path, &summary).unwrap();
        append_record(&path, &summary).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("year,station_count,trip_count"));
        assert!(lines[0].ends_with("0h-6h,6h-12h,12h-18h,18h-24h"));
        assert!(lines[1].starts_with("2014,2,3136276"));
    }
}
