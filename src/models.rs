use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

/// One line of the published feed, columns taken by position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    pub timestamp: String,
    pub entity_name: String,
    pub response: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedRecord {
    pub timestamp: NaiveDateTime,
    pub entity_name: String,
    pub level: Option<u32>,
}

impl NormalizedRecord {
    pub fn day(&self) -> NaiveDate {
        self.timestamp.date()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyAggregate {
    pub day: NaiveDate,
    pub mean_level: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CompletionStatus {
    pub completed: Vec<String>,
    pub pending: Vec<String>,
    /// Names submitted today that are not on the roster.
    pub unrostered: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WindowSummary {
    pub records: Vec<NormalizedRecord>,
    pub daily: Vec<DailyAggregate>,
}

impl WindowSummary {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty() && self.daily.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerSummary {
    pub entity_name: String,
    pub entries: usize,
    pub scored: usize,
    pub mean_level: Option<f64>,
    pub max_level: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TodayEntry {
    pub entity_name: String,
    pub level: Option<u32>,
}

/// Per-cycle counters from the normalizer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NormalizeStats {
    pub kept: usize,
    pub dropped_timestamp: usize,
    pub dropped_name: usize,
    pub unscored: usize,
}
