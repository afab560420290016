//! Data types shared by the loading and aggregation pipeline.

use chrono::{NaiveDateTime, Timelike};
use serde::Serialize;
use std::collections::BTreeMap;

/// Coordinate reference system every station geometry is expressed in.
pub const CRS_WGS84: &str = "EPSG:4326";

/// A point geometry in WGS84: `x` is longitude, `y` is latitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// One row of a yearly station inventory.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Station {
    pub code: Option<String>,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub geometry: Point,
}

impl Station {
    pub fn new(code: Option<String>, name: String, longitude: f64, latitude: f64) -> Self {
        Station {
            code,
            name,
            latitude,
            longitude,
            geometry: Point {
                x: longitude,
                y: latitude,
            },
        }
    }
}

/// Membership flag of a trip, as recorded in the `is_member` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Membership {
    Member,
    Casual,
    /// Anything other than `0` or `1`, blank included. Counted as neither.
    Unknown,
}

impl Membership {
    pub fn from_flag(flag: f64) -> Self {
        if flag == 1.0 {
            Membership::Member
        } else if flag == 0.0 {
            Membership::Casual
        } else {
            Membership::Unknown
        }
    }

    /// Reads a raw `is_member` cell; empty or non-numeric cells are `Unknown`.
    pub fn from_cell(raw: &str) -> Self {
        raw.trim()
            .parse::<f64>()
            .map_or(Membership::Unknown, Membership::from_flag)
    }
}

/// A single trip-log row.
#[derive(Debug, Clone, PartialEq)]
pub struct Trip {
    pub start_date: NaiveDateTime,
    pub end_date: NaiveDateTime,
    /// `None` when the cell is blank; such trips are left out of the mean.
    pub duration_sec: Option<f64>,
    pub start_station_code: String,
    pub end_station_code: String,
    pub membership: Membership,
}

impl Trip {
    /// A loop trip ends at the station it started from.
    pub fn is_loop(&self) -> bool {
        self.start_station_code == self.end_station_code
    }

    pub fn period(&self) -> PeriodBucket {
        PeriodBucket::from_hour(self.start_date.hour())
    }
}

/// Time-of-day bucket of a trip start, half-open with the lower bound inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum PeriodBucket {
    #[serde(rename = "0h-6h")]
    Night,
    #[serde(rename = "6h-12h")]
    Morning,
    #[serde(rename = "12h-18h")]
    Afternoon,
    #[serde(rename = "18h-24h")]
    Evening,
}

impl PeriodBucket {
    pub const ALL: [PeriodBucket; 4] = [
        PeriodBucket::Night,
        PeriodBucket::Morning,
        PeriodBucket::Afternoon,
        PeriodBucket::Evening,
    ];

    /// Buckets an hour of day. `hour` comes from a valid timestamp, so it is
    /// always in `0..24`.
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            0..6 => PeriodBucket::Night,
            6..12 => PeriodBucket::Morning,
            12..18 => PeriodBucket::Afternoon,
            _ => PeriodBucket::Evening,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PeriodBucket::Night => "0h-6h",
            PeriodBucket::Morning => "6h-12h",
            PeriodBucket::Afternoon => "12h-18h",
            PeriodBucket::Evening => "18h-24h",
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Everything the dashboard needs for one year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearlyAnalysis {
    pub year: String,
    pub crs: &'static str,
    pub stations: Vec<Station>,
    pub trip_count: usize,
    pub avg_duration_minutes: f64,
    pub loop_percent: f64,
    pub members: usize,
    pub casuals: usize,
    pub periods: BTreeMap<PeriodBucket, f64>,
}

impl YearlyAnalysis {
    pub fn station_count(&self) -> usize {
        self.stations.len()
    }

    pub fn period_percent(&self, bucket: PeriodBucket) -> f64 {
        self.periods.get(&bucket).copied().unwrap_or(0.0)
    }

    /// Period shares ordered from the largest to the smallest.
    pub fn periods_descending(&self) -> Vec<(PeriodBucket, f64)> {
        let mut shares: Vec<_> = self.periods.iter().map(|(b, p)| (*b, *p)).collect();
        shares.sort_by(|a, b| b.1.total_cmp(&a.1));
        shares
    }
}

/// Flat per-year row written by the CSV summary export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearSummary {
    pub year: String,
    pub station_count: usize,
    pub trip_count: usize,
    pub avg_duration_minutes: f64,
    pub loop_percent: f64,
    pub members: usize,
    pub casuals: usize,
    #[serde(rename = "0h-6h")]
    pub night_percent: f64,
    #[serde(rename = "6h-12h")]
    pub morning_percent: f64,
    #[serde(rename = "12h-18h")]
    pub afternoon_percent: f64,
    #[serde(rename = "18h-24h")]
    pub evening_percent: f64,
}

impl From<&YearlyAnalysis> for YearSummary {
    fn from(analysis: &YearlyAnalysis) -> Self {
        YearSummary {
            year: analysis.year.clone(),
            station_count: analysis.station_count(),
            trip_count: analysis.trip_count,
            avg_duration_minutes: analysis.avg_duration_minutes,
            loop_percent: analysis.loop_percent,
            members: analysis.members,
            casuals: analysis.casuals,
            night_percent: analysis.period_percent(PeriodBucket::Night),
            morning_percent: analysis.period_percent(PeriodBucket::Morning),
            afternoon_percent: analysis.period_percent(PeriodBucket::Afternoon),
            evening_percent: analysis.period_percent(PeriodBucket::Evening),
        }
    }
}
