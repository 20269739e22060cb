use chrono::{Datelike, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::models::{NormalizeStats, NormalizedRecord, RawRow};

pub const MIN_LEVEL: u32 = 1;
pub const MAX_LEVEL: u32 = 10;

// Day-first shapes are tried before ISO so "05/03/2024" is always 5 March.
const DATETIME_FORMATS: &[&str] = &[
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%d-%m-%Y %H:%M",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y", "%Y-%m-%d"];

// `%Y` takes any width, so "04/03/24" would otherwise land in year 24.
const MIN_YEAR: i32 = 1000;

static DIGIT_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]+").expect("valid digit regex"));

pub fn normalize(rows: &[RawRow]) -> Vec<NormalizedRecord> {
    normalize_with_stats(rows).0
}

/// Coerces raw rows into records, keeping input order. Rows without a
/// parseable timestamp or a name are dropped; rows without digits in the
/// response are kept unscored.
pub fn normalize_with_stats(rows: &[RawRow]) -> (Vec<NormalizedRecord>, NormalizeStats) {
    let mut stats = NormalizeStats::default();
    let mut records = Vec::with_capacity(rows.len());

    for (index, row) in rows.iter().enumerate() {
        let Some(timestamp) = parse_timestamp(&row.timestamp) else {
            debug!(row = index, timestamp = %row.timestamp, "dropping row with unparseable timestamp");
            stats.dropped_timestamp += 1;
            continue;
        };

        let entity_name = row.entity_name.trim();
        if entity_name.is_empty() {
            debug!(row = index, "dropping row without a name");
            stats.dropped_name += 1;
            continue;
        }

        let level = extract_level(&row.response);
        if level.is_none() {
            stats.unscored += 1;
        }

        records.push(NormalizedRecord {
            timestamp,
            entity_name: entity_name.to_string(),
            level,
        });
        stats.kept += 1;
    }

    (records, stats)
}

pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .filter(|parsed| parsed.year() >= MIN_YEAR)
}

/// First contiguous run of ASCII digits in `response`.
///
/// `None` means the response carried no number at all (or one too large to
/// hold); it is never reported as zero. The value is not range checked here,
/// see [`clamp_level`].
pub fn extract_level(response: &str) -> Option<u32> {
    DIGIT_RUN
        .find(response)
        .and_then(|digits| digits.as_str().parse().ok())
}

pub fn clamp_level(level: u32) -> u32 {
    level.clamp(MIN_LEVEL, MAX_LEVEL)
}
