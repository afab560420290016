//! CSV readers for station inventories and trip logs.

use chrono::{DateTime, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::Deserialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::analyzers::error::AnalysisError;
use crate::analyzers::types::{Membership, Station, Trip};

const STATION_COLUMNS: &[&str] = &["name", "longitude", "latitude"];

const TRIP_COLUMNS: &[&str] = &[
    "start_date",
    "end_date",
    "duration_sec",
    "start_station_code",
    "end_station_code",
    "is_member",
];

const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

#[derive(Debug, Deserialize)]
struct StationRecord {
    #[serde(default, alias = "pk")]
    code: Option<String>,
    name: String,
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Deserialize)]
struct TripRecord {
    start_date: String,
    end_date: String,
    duration_sec: Option<f64>,
    start_station_code: String,
    end_station_code: String,
    is_member: String,
}

/// Reads a station inventory.
///
/// The file is read comma-separated first. When that yields a single header
/// column containing a `;`, it is read again with `;` as the separator.
pub fn parse_stations(path: &Path) -> Result<Vec<Station>, AnalysisError> {
    let delimiter = sniff_delimiter(path)?;
    debug!(path = %path.display(), delimiter = %char::from(delimiter), "Reading station file");

    let malformed = |reason: String| AnalysisError::StationFileMalformed {
        path: path.to_path_buf(),
        reason,
    };

    let mut rdr = open_reader(path, delimiter)?;
    let headers = rdr.headers().map_err(|e| malformed(e.to_string()))?.clone();
    require_columns(&headers, STATION_COLUMNS, path)?;

    let mut stations = Vec::new();
    for result in rdr.deserialize() {
        let record: StationRecord = result.map_err(|e| malformed(e.to_string()))?;
        stations.push(Station::new(
            record.code.filter(|c| !c.is_empty()),
            record.name,
            record.longitude,
            record.latitude,
        ));
    }

    Ok(stations)
}

/// Reads one trip-log fragment, keeping row order.
pub fn parse_trips(path: &Path) -> Result<Vec<Trip>, AnalysisError> {
    let malformed = |reason: String| AnalysisError::TripFileMalformed {
        path: path.to_path_buf(),
        reason,
    };

    let mut rdr = open_reader(path, b',')?;
    let headers = rdr.headers().map_err(|e| malformed(e.to_string()))?.clone();
    require_columns(&headers, TRIP_COLUMNS, path)?;

    let mut trips = Vec::new();
    for (index, result) in rdr.deserialize().enumerate() {
        let record: TripRecord = result.map_err(|e| malformed(e.to_string()))?;
        let row = index + 1;

        trips.push(Trip {
            start_date: timestamp_at(path, row, &record.start_date)?,
            end_date: timestamp_at(path, row, &record.end_date)?,
            duration_sec: record.duration_sec,
            start_station_code: record.start_station_code,
            end_station_code: record.end_station_code,
            membership: Membership::from_cell(&record.is_member),
        });
    }

    debug!(path = %path.display(), rows = trips.len(), "Trip file parsed");
    Ok(trips)
}

/// Parses a trip timestamp as local wall-clock time.
///
/// Accepts `YYYY-MM-DD HH:MM[:SS[.fff]]`, the same with a `T` separator, and
/// RFC 3339 (the offset is dropped, keeping the local reading).
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();

    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.naive_local())
        })
}

fn timestamp_at(path: &Path, row: usize, raw: &str) -> Result<NaiveDateTime, AnalysisError> {
    parse_timestamp(raw).ok_or_else(|| AnalysisError::InvalidTimestamp {
        path: path.to_path_buf(),
        row,
        value: raw.to_string(),
    })
}

fn sniff_delimiter(path: &Path) -> Result<u8, AnalysisError> {
    let mut rdr = open_reader(path, b',')?;
    let headers = rdr
        .headers()
        .map_err(|e| AnalysisError::StationFileMalformed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    if headers.len() == 1 && headers.get(0).is_some_and(|h| h.contains(';')) {
        Ok(b';')
    } else {
        Ok(b',')
    }
}

fn open_reader(path: &Path, delimiter: u8) -> Result<csv::Reader<File>, AnalysisError> {
    let file = File::open(path).map_err(|e| AnalysisError::io(path, e))?;
    Ok(ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(Trim::All)
        .from_reader(file))
}

fn require_columns(
    headers: &StringRecord,
    required: &[&str],
    path: &Path,
) -> Result<(), AnalysisError> {
    match required
        .iter()
        .find(|column| !headers.iter().any(|h| h == **column))
    {
        Some(column) => Err(AnalysisError::ColumnMissing {
            path: PathBuf::from(path),
            column: column.to_string(),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_parse_stations_comma() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "Stations_2014.csv",
            "code,name,latitude,longitude\n\
             6209,Milton / Clark,45.51252,-73.57062\n\
             6436,Côte St-Antoine / Clarke,45.486452,-73.595234\n",
        );

        let stations = parse_stations(&path).unwrap();

        assert_eq!(stations.len(), 2);
        assert_eq!(stations[0].code.as_deref(), Some("6209"));
        assert_eq!(stations[0].name, "Milton / Clark");
        assert_eq!(stations[1].geometry.x, -73.595234);
        assert_eq!(stations[1].geometry.y, 45.486452);
    }

    #[test]
    fn test_parse_stations_semicolon_fallback() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "Stations_2019.csv",
            "pk;name;latitude;longitude\n\
             1;Gare Lucien-L'Allier, rue Argyle;45.49;-73.57\n\
             2;Dézéry / Ste-Catherine;45.54;-73.55\n\
             3;Métro Jean-Drapeau;45.51;-73.53\n",
        );

        let stations = parse_stations(&path).unwrap();

        assert_eq!(stations.len(), 3);
        assert_eq!(stations[0].code.as_deref(), Some("1"));
        assert_eq!(stations[0].name, "Gare Lucien-L'Allier, rue Argyle");
        assert_eq!(stations[2].longitude, -73.53);
    }

    #[test]
    fn test_parse_stations_missing_column() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "Stations_2014.csv", "code,name,latitude\n1,A,45.5\n");

        let err = parse_stations(&path).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::ColumnMissing { ref column, .. } if column == "longitude"
        ));
    }

    #[test]
    fn test_parse_stations_bad_coordinate() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "Stations_2014.csv",
            "code,name,latitude,longitude\n1,A,north,-73.5\n",
        );

        let err = parse_stations(&path).unwrap_err();
        assert!(matches!(err, AnalysisError::StationFileMalformed { .. }));
    }

    #[test]
    fn test_parse_stations_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = parse_stations(&dir.path().join("Stations_2014.csv")).unwrap_err();
        assert!(matches!(err, AnalysisError::Io { .. }));
    }

    #[test]
    fn test_parse_trips_ignores_extra_columns() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "OD_2014-04.csv",
            "start_date,start_station_code,end_date,end_station_code,duration_sec,is_member,extra\n\
             2014-04-15 00:01,6209,2014-04-15 00:18,6436,1061,1,x\n\
             2014-04-15 07:30:12,6436,2014-04-15 07:40:00,6436,588,0,y\n",
        );

        let trips = parse_trips(&path).unwrap();

        assert_eq!(trips.len(), 2);
        assert_eq!(trips[0].start_date.hour(), 0);
        assert_eq!(trips[0].membership, Membership::Member);
        assert!(!trips[0].is_loop());
        assert_eq!(trips[1].start_date.hour(), 7);
        assert_eq!(trips[1].membership, Membership::Casual);
        assert!(trips[1].is_loop());
    }

    #[test]
    fn test_parse_trips_blank_flag_and_duration() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "OD_2014-07.csv",
            "start_date,start_station_code,end_date,end_station_code,duration_sec,is_member\n\
             2014-07-01 09:00,6209,2014-07-01 09:10,6436,600,\n\
             2014-07-01 10:00,6209,2014-07-01 10:10,6436,,1\n",
        );

        let trips = parse_trips(&path).unwrap();

        assert_eq!(trips.len(), 2);
        assert_eq!(trips[0].membership, Membership::Unknown);
        assert_eq!(trips[0].duration_sec, Some(600.0));
        assert_eq!(trips[1].membership, Membership::Member);
        assert_eq!(trips[1].duration_sec, None);
    }

    #[test]
    fn test_parse_trips_non_numeric_duration_is_malformed() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "OD_2014-08.csv",
            "start_date,start_station_code,end_date,end_station_code,duration_sec,is_member\n\
             2014-08-01 09:00,6209,2014-08-01 09:10,6436,ten minutes,1\n",
        );

        let err = parse_trips(&path).unwrap_err();
        assert!(matches!(err, AnalysisError::TripFileMalformed { .. }));
    }

    #[test]
    fn test_parse_trips_invalid_timestamp_reports_row() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "OD_2014-05.csv",
            "start_date,start_station_code,end_date,end_station_code,duration_sec,is_member\n\
             2014-05-01 10:00,1,2014-05-01 10:10,2,600,1\n\
             yesterday,1,2014-05-01 10:10,2,600,1\n",
        );

        let err = parse_trips(&path).unwrap_err();
        match err {
            AnalysisError::InvalidTimestamp { row, value, .. } => {
                assert_eq!(row, 2);
                assert_eq!(value, "yesterday");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_trips_missing_column() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "OD_2014-06.csv",
            "start_date,start_station_code,end_date,end_station_code,duration_sec\n",
        );

        let err = parse_trips(&path).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::ColumnMissing { ref column, .. } if column == "is_member"
        ));
    }

    #[test]
    fn test_parse_timestamp_formats() {
        assert!(parse_timestamp("2014-04-15 00:01").is_some());
        assert!(parse_timestamp("2019-04-14 07:55:22").is_some());
        assert!(parse_timestamp("2019-04-14 07:55:22.123").is_some());
        assert!(parse_timestamp("2019-04-14T07:55:22").is_some());
        assert_eq!(
            parse_timestamp("2019-04-14T07:55:22-04:00").map(|t| t.hour()),
            Some(7)
        );
        assert!(parse_timestamp("14/04/2019").is_none());
    }
}
