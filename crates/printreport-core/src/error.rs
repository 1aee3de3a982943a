//! Error types for ingestion and report generation

use chrono::NaiveDate;
use thiserror::Error;

/// Failure to turn an uploaded file into a dataset.
///
/// Per-row problems (bad dates, bad page counts) never show up here; they are
/// absorbed by the normalizer and counted in [`crate::IngestStats`].
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("input file is empty")]
    Empty,

    #[error("missing required column '{0}'")]
    MissingColumn(String),

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure of a single export call.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Start date must be before end date ({start} > {end})")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("Data not loaded")]
    NoDataset,

    #[error("dataset has no '{0}' column")]
    MissingColumn(String),

    #[error("page total overflowed in {panel} panel")]
    Overflow { panel: &'static str },

    #[error("period bucket for {0} falls outside the supported calendar")]
    DateOutOfRange(NaiveDate),
}

impl ReportError {
    /// True for errors raised before any aggregation work starts.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidRange { .. } | Self::NoDataset)
    }
}
