//! Period and per-user aggregation of print jobs
//!
//! Every panel re-partitions the same filtered record set, so the panel sums
//! always equal the report total.

use crate::identity::MappedRecord;
use crate::{PeriodPages, Report, ReportError, UserPages, LABEL_DATE_FORMAT};
use chrono::{Datelike, Duration, Months, NaiveDate};
use std::collections::{BTreeMap, HashMap};

/// Aggregate pages per calendar day, labelled `DD/MM/YYYY`.
pub fn aggregate_by_day(records: &[MappedRecord]) -> Result<Vec<PeriodPages>, ReportError> {
    let buckets = bucket_pages(records, "daily", |date| Ok(date))?;

    Ok(buckets
        .into_iter()
        .map(|(day, pages)| PeriodPages {
            period: day.format(LABEL_DATE_FORMAT).to_string(),
            pages,
        })
        .collect())
}

/// Aggregate pages per Monday-first week, labelled `start - start+6`.
pub fn aggregate_by_week(records: &[MappedRecord]) -> Result<Vec<PeriodPages>, ReportError> {
    let buckets = bucket_pages(records, "weekly", week_start)?;

    buckets
        .into_iter()
        .map(|(start, pages)| {
            let end = start
                .checked_add_signed(Duration::days(6))
                .ok_or(ReportError::DateOutOfRange(start))?;
            Ok(PeriodPages {
                period: range_label(start, end),
                pages,
            })
        })
        .collect()
}

/// Aggregate pages per calendar month, labelled `first - last`.
pub fn aggregate_by_month(records: &[MappedRecord]) -> Result<Vec<PeriodPages>, ReportError> {
    let buckets = bucket_pages(records, "monthly", month_start)?;

    buckets
        .into_iter()
        .map(|(start, pages)| {
            let end = month_end(start)?;
            Ok(PeriodPages {
                period: range_label(start, end),
                pages,
            })
        })
        .collect()
}

/// Aggregate pages per user in first-appearance order.
///
/// Anonymized records form one trailing bucket with no name.
pub fn aggregate_by_user(records: &[MappedRecord]) -> Result<Vec<UserPages>, ReportError> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut users: Vec<UserPages> = Vec::new();
    let mut anonymous: Option<u64> = None;

    for record in records {
        let slot = match record.user_name.as_deref() {
            Some(name) => {
                let pos = *index.entry(name).or_insert_with(|| {
                    users.push(UserPages {
                        user_name: Some(name.to_string()),
                        pages: 0,
                    });
                    users.len() - 1
                });
                &mut users[pos].pages
            }
            None => anonymous.get_or_insert(0),
        };
        *slot = slot
            .checked_add(record.page_count)
            .ok_or(ReportError::Overflow { panel: "users" })?;
    }

    if let Some(pages) = anonymous {
        users.push(UserPages {
            user_name: None,
            pages,
        });
    }

    Ok(users)
}

pub fn calculate_total(records: &[MappedRecord]) -> Result<u64, ReportError> {
    records.iter().try_fold(0u64, |acc, r| {
        acc.checked_add(r.page_count)
            .ok_or(ReportError::Overflow { panel: "total" })
    })
}

/// Build all four panels and the total from one mapped record set.
pub fn build_report(records: &[MappedRecord]) -> Result<Report, ReportError> {
    let report = Report {
        daily: aggregate_by_day(records)?,
        weekly: aggregate_by_week(records)?,
        monthly: aggregate_by_month(records)?,
        users: aggregate_by_user(records)?,
        total_pages: calculate_total(records)?,
    };

    tracing::debug!(
        days = report.daily.len(),
        weeks = report.weekly.len(),
        months = report.monthly.len(),
        users = report.users.len(),
        total_pages = report.total_pages,
        "built report"
    );

    Ok(report)
}

/// Monday of the week containing `date`.
pub fn week_start(date: NaiveDate) -> Result<NaiveDate, ReportError> {
    let offset = i64::from(date.weekday().num_days_from_monday());
    date.checked_sub_signed(Duration::days(offset))
        .ok_or(ReportError::DateOutOfRange(date))
}

pub fn month_start(date: NaiveDate) -> Result<NaiveDate, ReportError> {
    date.with_day(1).ok_or(ReportError::DateOutOfRange(date))
}

pub fn month_end(date: NaiveDate) -> Result<NaiveDate, ReportError> {
    month_start(date)?
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .ok_or(ReportError::DateOutOfRange(date))
}

// =============================================================================
// Internal helpers
// =============================================================================

fn bucket_pages<F>(
    records: &[MappedRecord],
    panel: &'static str,
    key: F,
) -> Result<BTreeMap<NaiveDate, u64>, ReportError>
where
    F: Fn(NaiveDate) -> Result<NaiveDate, ReportError>,
{
    let mut buckets: BTreeMap<NaiveDate, u64> = BTreeMap::new();

    for record in records {
        let bucket = key(record.timestamp.date())?;
        let entry = buckets.entry(bucket).or_insert(0);
        *entry = entry
            .checked_add(record.page_count)
            .ok_or(ReportError::Overflow { panel })?;
    }

    Ok(buckets)
}

fn range_label(start: NaiveDate, end: NaiveDate) -> String {
    format!(
        "{} - {}",
        start.format(LABEL_DATE_FORMAT),
        end.format(LABEL_DATE_FORMAT)
    )
}
