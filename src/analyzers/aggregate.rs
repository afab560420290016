use crate::analyzers::error::AnalysisError;
use crate::analyzers::types::{CRS_WGS84, PeriodBucket, Station, YearlyAnalysis};
use crate::stats::TripStats;
use std::collections::BTreeMap;

/// Turns a year's station inventory and trip counts into a [`YearlyAnalysis`].
///
/// A year with no trips, or with no recorded durations, is an error rather
/// than a bundle of NaN statistics.
pub fn aggregate_year(
    year: &str,
    stations: Vec<Station>,
    stats: &TripStats,
) -> Result<YearlyAnalysis, AnalysisError> {
    if stats.total_trips == 0 {
        return Err(AnalysisError::EmptyTripSet {
            year: year.to_string(),
        });
    }
    let mean_duration_sec = stats
        .mean_duration_sec()
        .ok_or_else(|| AnalysisError::NoDurations {
            year: year.to_string(),
        })?;

    let periods: BTreeMap<PeriodBucket, f64> = PeriodBucket::ALL
        .iter()
        .map(|bucket| (*bucket, stats.period_pct(*bucket)))
        .collect();

    Ok(YearlyAnalysis {
        year: year.to_string(),
        crs: CRS_WGS84,
        stations,
        trip_count: stats.total_trips,
        avg_duration_minutes: mean_duration_sec / 60.0,
        loop_percent: stats.loop_pct(),
        members: stats.members,
        casuals: stats.casuals,
        periods,
    })
}
