use serde::Serialize;

use crate::analyzers::types::{Membership, PeriodBucket, Trip};

/// Raw counts gathered in a single pass over a year's trips.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct TripStats {
    pub total_trips: usize,
    // trips with a recorded duration, and the sum of those durations
    pub timed_trips: usize,
    pub total_duration_sec: f64,

    pub loops: usize,

    // membership
    pub members: usize,
    pub casuals: usize,
    pub unknown_membership: usize,

    // trips started in each period, indexed by `PeriodBucket::index`
    pub period_counts: [usize; 4],
}

impl TripStats {
    pub fn from_trips<'a>(trips: impl IntoIterator<Item = &'a Trip>) -> Self {
        let mut s = TripStats::default();

        for trip in trips {
            s.total_trips += 1;
            if let Some(duration) = trip.duration_sec {
                s.timed_trips += 1;
                s.total_duration_sec += duration;
            }

            if trip.is_loop() {
                s.loops += 1;
            }

            match trip.membership {
                Membership::Member => s.members += 1,
                Membership::Casual => s.casuals += 1,
                Membership::Unknown => s.unknown_membership += 1,
            }

            s.period_counts[trip.period().index()] += 1;
        }

        s
    }

    pub fn pct(part: usize, total: usize) -> f64 {
        if total == 0 {
            0.0
        } else {
            (part as f64 / total as f64) * 100.0
        }
    }

    pub fn loop_pct(&self) -> f64 {
        Self::pct(self.loops, self.total_trips)
    }

    pub fn period_pct(&self, bucket: PeriodBucket) -> f64 {
        Self::pct(self.period_counts[bucket.index()], self.total_trips)
    }

    /// Mean trip duration in seconds over the trips that record one,
    /// `None` when none do.
    pub fn mean_duration_sec(&self) -> Option<f64> {
        if self.timed_trips == 0 {
            None
        } else {
            Some(self.total_duration_sec / self.timed_trips as f64)
        }
    }
}
