//! Yearly trip data aggregation.
//!
//! This module locates a year's station inventory and trip logs, merges the
//! trip logs, derives the dashboard statistics, and memoizes the result per
//! year.

pub mod aggregate;
pub mod analyzer;
pub mod cache;
pub mod error;
pub mod types;

pub use analyzer::{analyze, available_years, default_year};
pub use cache::AnalysisCache;
pub use error::AnalysisError;
pub use types::{PeriodBucket, Station, Trip, YearSummary, YearlyAnalysis};
