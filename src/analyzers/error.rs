use std::path::PathBuf;
use thiserror::Error;

/// Every way a yearly analysis can fail.
///
/// The dashboard collapses all of these into one "data unavailable" message;
/// the variants exist so logs and callers can tell the causes apart.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("no data directory for year {year} at {}", .path.display())]
    DirectoryNotFound { year: String, path: PathBuf },

    #[error("station file not found: {}", .path.display())]
    StationFileMissing { path: PathBuf },

    #[error("malformed station file {}: {reason}", .path.display())]
    StationFileMalformed { path: PathBuf, reason: String },

    #[error("malformed trip file {}: {reason}", .path.display())]
    TripFileMalformed { path: PathBuf, reason: String },

    #[error("no trip files found in {}", .path.display())]
    NoTripFiles { path: PathBuf },

    #[error("column '{column}' missing from {}", .path.display())]
    ColumnMissing { path: PathBuf, column: String },

    #[error("invalid timestamp '{value}' in {} (row {row})", .path.display())]
    InvalidTimestamp {
        path: PathBuf,
        row: usize,
        value: String,
    },

    #[error("no trips recorded for year {year}")]
    EmptyTripSet { year: String },

    #[error("no trip durations recorded for year {year}")]
    NoDurations { year: String },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl AnalysisError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AnalysisError::Io {
            path: path.into(),
            source,
        }
    }
}
