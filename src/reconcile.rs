use std::collections::HashSet;

use chrono::{Local, NaiveDate};

use crate::models::{CompletionStatus, NormalizedRecord, TodayEntry};

/// The caller's local calendar date, read fresh on every call.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn records_on(records: &[NormalizedRecord], day: NaiveDate) -> Vec<NormalizedRecord> {
    records
        .iter()
        .filter(|record| record.day() == day)
        .cloned()
        .collect()
}

/// Splits the roster into players who submitted in `today_records` and those
/// still pending, both in roster order. Any submission counts, scored or not.
pub fn reconcile(roster: &[String], today_records: &[NormalizedRecord]) -> CompletionStatus {
    let present: HashSet<&str> = today_records
        .iter()
        .map(|record| record.entity_name.as_str())
        .collect();

    let (completed, pending): (Vec<String>, Vec<String>) = roster
        .iter()
        .cloned()
        .partition(|name| present.contains(name.as_str()));

    let rostered: HashSet<&str> = roster.iter().map(String::as_str).collect();
    let mut seen = HashSet::new();
    let unrostered = today_records
        .iter()
        .map(|record| record.entity_name.as_str())
        .filter(|name| !rostered.contains(name) && seen.insert(*name))
        .map(str::to_string)
        .collect();

    CompletionStatus {
        completed,
        pending,
        unrostered,
    }
}

/// Every same-day submission, highest level first and unscored ones last.
/// Repeat submissions by one player are all listed.
pub fn today_board(today_records: &[NormalizedRecord]) -> Vec<TodayEntry> {
    let mut entries: Vec<TodayEntry> = today_records
        .iter()
        .map(|record| TodayEntry {
            entity_name: record.entity_name.clone(),
            level: record.level,
        })
        .collect();

    // Stable sort: ties keep submission order.
    entries.sort_by(|a, b| match (a.level, b.level) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
    entries
}
