#![deny(clippy::all)]

mod aggregator;
mod error;
pub mod identity;
pub mod ingest;
pub mod layout;
pub mod store;

pub use aggregator::*;
pub use error::{IngestError, ReportError};
pub use identity::MappedRecord;
pub use ingest::{Dataset, IngestStats, RawRecord};
pub use layout::{GridCell, Panel, ReportGrid};
pub use store::{DatasetHandle, DatasetStore};

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

pub const DATE_COLUMN: &str = "Date";
pub const USER_COLUMN: &str = "User Name";
pub const PAGES_COLUMN: &str = "Print Pages";

/// Label format shared by every period panel.
pub const LABEL_DATE_FORMAT: &str = "%d/%m/%Y";

/// One normalized row of the print log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintJobRecord {
    pub timestamp: NaiveDateTime,
    pub user_name: String,
    pub page_count: u64,
}

/// Inclusive export window. Both bounds sit at start-of-day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ReportError> {
        if start > end {
            return Err(ReportError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// A record is inside the window when `start 00:00 <= ts <= end 00:00`.
    pub fn contains(&self, timestamp: &NaiveDateTime) -> bool {
        let lower = self.start.and_time(chrono::NaiveTime::MIN);
        let upper = self.end.and_time(chrono::NaiveTime::MIN);
        *timestamp >= lower && *timestamp <= upper
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodPages {
    pub period: String,
    pub pages: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPages {
    /// `None` is the anonymous bucket.
    pub user_name: Option<String>,
    pub pages: u64,
}

/// Four independent panels plus the grand total.
///
/// The panels have unrelated lengths; use [`Report::grid`] to lay them out
/// side by side for rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub daily: Vec<PeriodPages>,
    pub weekly: Vec<PeriodPages>,
    pub monthly: Vec<PeriodPages>,
    pub users: Vec<UserPages>,
    pub total_pages: u64,
}

impl Report {
    pub fn is_empty(&self) -> bool {
        self.daily.is_empty()
            && self.weekly.is_empty()
            && self.monthly.is_empty()
            && self.users.is_empty()
    }

    pub fn grid(&self) -> ReportGrid {
        layout::assemble_grid(self)
    }
}

/// Run one export over a loaded dataset.
///
/// The dataset is never modified; the identity map is applied to a copy of the
/// in-range records only.
pub fn generate_report(dataset: &Dataset, range: &DateRange) -> Result<Report, ReportError> {
    if !dataset.has_column(USER_COLUMN) {
        return Err(ReportError::MissingColumn(USER_COLUMN.to_string()));
    }

    let filtered = filter_records_for_range(&dataset.records, range);
    tracing::debug!(
        dataset = %dataset.name,
        start = %range.start(),
        end = %range.end(),
        in_range = filtered.len(),
        total = dataset.records.len(),
        "filtered records for export"
    );

    let mapped = identity::apply_identity_map(filtered);
    aggregator::build_report(&mapped)
}

fn filter_records_for_range(records: &[PrintJobRecord], range: &DateRange) -> Vec<PrintJobRecord> {
    records
        .iter()
        .filter(|r| range.contains(&r.timestamp))
        .cloned()
        .collect()
}
