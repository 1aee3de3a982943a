//! Print log ingestion
//!
//! Reads a comma-separated print log, decoding every field as Latin-1 so that
//! any byte sequence is accepted, and normalizes each row into a
//! [`PrintJobRecord`]. Rows with an unparseable `Date` are dropped; unusable
//! page counts become 0. Neither is an error.

use crate::{IngestError, PrintJobRecord, DATE_COLUMN, PAGES_COLUMN, USER_COLUMN};
use chrono::{NaiveDate, NaiveDateTime};
use std::io::Read;
use std::path::Path;

const RECORD_DATE_FORMAT: &str = "%d/%m/%Y";
const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
/// 2^64. Larger values would saturate to `u64::MAX` on conversion.
const PAGE_COUNT_LIMIT: f64 = 18_446_744_073_709_551_616.0;

/// One untyped CSV row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    pub date: String,
    /// `None` when the file has no `User Name` column.
    pub user_name: Option<String>,
    pub print_pages: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub rows_read: usize,
    pub rows_dropped: usize,
}

/// The normalized content of one uploaded file.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Input file name without extension.
    pub name: String,
    /// Header names as they appeared in the file, trimmed.
    pub columns: Vec<String>,
    pub records: Vec<PrintJobRecord>,
    pub stats: IngestStats,
}

impl Dataset {
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }
}

/// Decode ISO-8859-1 bytes. Every byte maps to the code point of equal value.
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Read the header row and all data rows of a print log.
pub fn read_raw_records<R: Read>(reader: R) -> Result<(Vec<String>, Vec<RawRecord>), IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let columns: Vec<String> = reader
        .byte_headers()?
        .iter()
        .map(|h| decode_latin1(h).trim().to_string())
        .collect();

    if columns.iter().all(|c| c.is_empty()) {
        return Err(IngestError::Empty);
    }

    let position = |name: &str| columns.iter().position(|c| c == name);
    let date_idx =
        position(DATE_COLUMN).ok_or_else(|| IngestError::MissingColumn(DATE_COLUMN.to_string()))?;
    let pages_idx = position(PAGES_COLUMN)
        .ok_or_else(|| IngestError::MissingColumn(PAGES_COLUMN.to_string()))?;
    let user_idx = position(USER_COLUMN);

    let mut rows = Vec::new();
    for record in reader.byte_records() {
        let record = record?;
        let field = |idx: usize| record.get(idx).map(decode_latin1).unwrap_or_default();

        rows.push(RawRecord {
            date: field(date_idx),
            user_name: user_idx.map(field),
            print_pages: field(pages_idx),
        });
    }

    Ok((columns, rows))
}

/// Turn raw rows into typed records, dropping rows whose date does not parse.
pub fn normalize_records(raw: Vec<RawRecord>) -> (Vec<PrintJobRecord>, IngestStats) {
    let mut stats = IngestStats {
        rows_read: raw.len(),
        rows_dropped: 0,
    };

    let records: Vec<PrintJobRecord> = raw
        .into_iter()
        .filter_map(|row| {
            let Some(timestamp) = parse_record_date(&row.date) else {
                tracing::debug!(date = %row.date, "dropping row with unparseable date");
                stats.rows_dropped += 1;
                return None;
            };
            Some(PrintJobRecord {
                timestamp,
                user_name: row.user_name.unwrap_or_default(),
                page_count: parse_page_count(&row.print_pages),
            })
        })
        .collect();

    (records, stats)
}

/// Parse a `DD/MM/YYYY` date into a midnight timestamp.
///
/// The year must be exactly four digits; chrono's `%Y` alone would also take
/// `24`, `0` or `+2024`.
pub fn parse_record_date(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    let (_, year) = text.rsplit_once('/')?;
    if year.len() != 4 || !year.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    NaiveDate::parse_from_str(text, RECORD_DATE_FORMAT)
        .ok()
        .map(|d| d.and_time(chrono::NaiveTime::MIN))
}

/// Coerce a page count cell. Anything that is not a non-negative number
/// below 2^64 yields 0; fractional values are truncated.
pub fn parse_page_count(text: &str) -> u64 {
    let text = text.trim();
    if let Ok(pages) = text.parse::<u64>() {
        return pages;
    }
    match text.parse::<f64>() {
        Ok(value) if (0.0..PAGE_COUNT_LIMIT).contains(&value) => value.trunc() as u64,
        _ => 0,
    }
}

/// Load a dataset from raw file bytes.
pub fn load_dataset(name: &str, bytes: &[u8]) -> Result<Dataset, IngestError> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let (columns, raw) = read_raw_records(bytes)?;
    let (records, stats) = normalize_records(raw);

    tracing::info!(
        dataset = name,
        rows = stats.rows_read,
        dropped = stats.rows_dropped,
        "loaded print log"
    );

    Ok(Dataset {
        name: name.to_string(),
        columns,
        records,
        stats,
    })
}

/// Load a dataset from a file; the dataset is named after the file stem.
pub fn load_dataset_from_path(path: &Path) -> Result<Dataset, IngestError> {
    let bytes = std::fs::read(path)?;
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    load_dataset(&name, &bytes)
}
