//! Sentinel user-name rewriting
//!
//! Print logs use placeholder values in the `User Name` column for jobs that
//! did not come from a named account. The table below maps each placeholder
//! to its canonical form before per-user grouping.

use crate::PrintJobRecord;
use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityRule {
    Rename(&'static str),
    /// Drop the name but keep counting the pages.
    Anonymize,
}

pub const IDENTITY_RULES: &[(&str, IdentityRule)] = &[
    ("-", IdentityRule::Rename("Photo Copy")),
    ("?", IdentityRule::Anonymize),
    ("support", IdentityRule::Rename("pronto")),
];

static RULE_LOOKUP: Lazy<HashMap<&'static str, IdentityRule>> =
    Lazy::new(|| IDENTITY_RULES.iter().copied().collect());

/// A filtered record after identity mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedRecord {
    pub timestamp: NaiveDateTime,
    /// `None` for anonymized rows.
    pub user_name: Option<String>,
    pub page_count: u64,
}

/// Resolve a raw user name. Matching is exact: no trimming, no case folding.
///
/// An empty cell (or a row too short to reach the column) carries no name
/// and lands in the anonymous bucket alongside `?`.
pub fn map_user_name(raw: &str) -> Option<String> {
    if raw.is_empty() {
        return None;
    }
    match RULE_LOOKUP.get(raw) {
        Some(IdentityRule::Rename(canonical)) => Some((*canonical).to_string()),
        Some(IdentityRule::Anonymize) => None,
        None => Some(raw.to_string()),
    }
}

pub fn apply_identity_map(records: Vec<PrintJobRecord>) -> Vec<MappedRecord> {
    records
        .into_iter()
        .map(|r| MappedRecord {
            user_name: map_user_name(&r.user_name),
            timestamp: r.timestamp,
            page_count: r.page_count,
        })
        .collect()
}
