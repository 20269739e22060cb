use std::collections::{BTreeMap, BTreeSet, HashMap};

use anyhow::{bail, Context};
use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::models::{DailyAggregate, NormalizedRecord, PlayerSummary, WindowSummary};

pub const DEFAULT_WINDOW_DAYS: i64 = 7;

/// Inclusive calendar range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> anyhow::Result<Self> {
        if start > end {
            bail!("window start {start} is after end {end}");
        }
        Ok(Self { start, end })
    }

    /// `days` back from `today`, today included.
    pub fn ending_on(today: NaiveDate, days: i64) -> anyhow::Result<Self> {
        let start = Duration::try_days(days.max(0))
            .and_then(|span| today.checked_sub_signed(span))
            .with_context(|| format!("a window of {days} days before {today} is out of range"))?;
        Ok(Self { start, end: today })
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }
}

/// Filters `records` to `window`, and to `entity_filter` when given.
///
/// The daily means ignore `entity_filter` and cover every scored record in the
/// window, so the chart always shows the whole squad's load.
pub fn aggregate(
    records: &[NormalizedRecord],
    window: DateWindow,
    entity_filter: Option<&BTreeSet<String>>,
) -> WindowSummary {
    let in_window: Vec<&NormalizedRecord> = records
        .iter()
        .filter(|record| window.contains(record.day()))
        .collect();

    let daily = daily_means(in_window.iter().copied());

    let records = in_window
        .into_iter()
        .filter(|record| entity_filter.map_or(true, |names| names.contains(&record.entity_name)))
        .cloned()
        .collect();

    WindowSummary { records, daily }
}

pub fn daily_means<'a>(records: impl IntoIterator<Item = &'a NormalizedRecord>) -> Vec<DailyAggregate> {
    let mut totals: BTreeMap<NaiveDate, (u64, usize)> = BTreeMap::new();

    for record in records {
        let Some(level) = record.level else {
            continue;
        };
        let entry = totals.entry(record.day()).or_insert((0, 0));
        entry.0 += u64::from(level);
        entry.1 += 1;
    }

    totals
        .into_iter()
        .map(|(day, (total, count))| DailyAggregate {
            day,
            mean_level: total as f64 / count as f64,
        })
        .collect()
}

pub fn summarize_players(records: &[NormalizedRecord]) -> Vec<PlayerSummary> {
    let mut map: HashMap<&str, (usize, usize, u64, Option<u32>)> = HashMap::new();

    for record in records {
        let entry = map.entry(record.entity_name.as_str()).or_insert((0, 0, 0, None));
        entry.0 += 1;
        if let Some(level) = record.level {
            entry.1 += 1;
            entry.2 += u64::from(level);
            entry.3 = Some(entry.3.map_or(level, |max| max.max(level)));
        }
    }

    let mut summaries: Vec<PlayerSummary> = map
        .into_iter()
        .map(|(name, (entries, scored, total, max_level))| PlayerSummary {
            entity_name: name.to_string(),
            entries,
            scored,
            mean_level: if scored == 0 {
                None
            } else {
                Some(total as f64 / scored as f64)
            },
            max_level,
        })
        .collect();

    summaries.sort_by(|a, b| {
        let by_mean = b
            .mean_level
            .unwrap_or(f64::NEG_INFINITY)
            .partial_cmp(&a.mean_level.unwrap_or(f64::NEG_INFINITY))
            .unwrap_or(std::cmp::Ordering::Equal);
        by_mean.then_with(|| a.entity_name.cmp(&b.entity_name))
    });
    summaries
}

/// Chart axis label, e.g. `04/03 Mon`. Display only, never a grouping key.
pub fn day_label(day: NaiveDate) -> String {
    day.format("%d/%m %a").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(day: NaiveDate, hour: u32, name: &str, level: Option<u32>) -> NormalizedRecord {
        NormalizedRecord {
            timestamp: day.and_hms_opt(hour, 0, 0).unwrap(),
            entity_name: name.to_string(),
            level,
        }
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let window = DateWindow::new(date(2024, 3, 1), date(2024, 3, 7)).unwrap();
        let records = vec![
            record(date(2024, 2, 29), 23, "A", Some(5)),
            record(date(2024, 3, 1), 0, "B", Some(6)),
            record(date(2024, 3, 7), 23, "C", Some(7)),
            record(date(2024, 3, 8), 0, "D", Some(8)),
        ];

        let summary = aggregate(&records, window, None);
        let names: Vec<&str> = summary.records.iter().map(|r| r.entity_name.as_str()).collect();
        assert_eq!(names, vec!["B", "C"]);
    }

    #[test]
    fn empty_window_is_not_an_error() {
        let window = DateWindow::new(date(2024, 3, 1), date(2024, 3, 7)).unwrap();
        let records = vec![record(date(2024, 4, 2), 9, "A", Some(5))];
        let summary = aggregate(&records, window, None);
        assert!(summary.is_empty());
    }

    #[test]
    fn reversed_window_is_rejected() {
        assert!(DateWindow::new(date(2024, 3, 7), date(2024, 3, 1)).is_err());
    }

    #[test]
    fn default_window_spans_back_from_today() {
        let window = DateWindow::ending_on(date(2024, 3, 8), DEFAULT_WINDOW_DAYS).unwrap();
        assert_eq!(window.start, date(2024, 3, 1));
        assert_eq!(window.end, date(2024, 3, 8));
    }

    #[test]
    fn oversized_day_span_is_an_error() {
        let err = DateWindow::ending_on(date(2024, 3, 8), 200_000_000).unwrap_err();
        assert!(err.to_string().contains("out of range"));
        assert!(DateWindow::ending_on(date(2024, 3, 8), i64::MAX).is_err());
    }

    #[test]
    fn daily_mean_ignores_entity_filter() {
        let window = DateWindow::new(date(2024, 3, 1), date(2024, 3, 2)).unwrap();
        let records = vec![
            record(date(2024, 3, 1), 8, "A", Some(4)),
            record(date(2024, 3, 1), 9, "B", Some(8)),
            record(date(2024, 3, 2), 9, "B", Some(6)),
        ];
        let filter: BTreeSet<String> = ["A".to_string()].into_iter().collect();

        let summary = aggregate(&records, window, Some(&filter));
        assert_eq!(summary.records.len(), 1);
        assert_eq!(summary.records[0].entity_name, "A");
        assert_eq!(summary.daily.len(), 2);
        assert!((summary.daily[0].mean_level - 6.0).abs() < 0.001);
        assert!((summary.daily[1].mean_level - 6.0).abs() < 0.001);
    }

    #[test]
    fn daily_mean_skips_unscored_and_sorts_by_date() {
        let records = vec![
            record(date(2024, 3, 2), 9, "A", Some(3)),
            record(date(2024, 3, 1), 9, "B", None),
            record(date(2024, 3, 1), 10, "C", Some(9)),
            record(date(2024, 3, 1), 11, "D", Some(6)),
        ];
        let daily = daily_means(&records);
        assert_eq!(daily.len(), 2);
        assert_eq!(daily[0].day, date(2024, 3, 1));
        assert!((daily[0].mean_level - 7.5).abs() < 0.001);
        assert_eq!(daily[1].day, date(2024, 3, 2));
    }

    #[test]
    fn player_summaries_rank_by_mean() {
        let records = vec![
            record(date(2024, 3, 1), 8, "A", Some(4)),
            record(date(2024, 3, 2), 8, "A", Some(6)),
            record(date(2024, 3, 1), 9, "B", Some(9)),
            record(date(2024, 3, 1), 9, "C", None),
        ];
        let summaries = summarize_players(&records);
        let names: Vec<&str> = summaries.iter().map(|s| s.entity_name.as_str()).collect();
        assert_eq!(names, vec!["B", "A", "C"]);
        assert_eq!(summaries[1].entries, 2);
        assert_eq!(summaries[1].max_level, Some(6));
        assert!((summaries[1].mean_level.unwrap() - 5.0).abs() < 0.001);
        assert_eq!(summaries[2].mean_level, None);
    }

    #[test]
    fn labels_are_day_first() {
        assert_eq!(day_label(date(2024, 3, 4)), "04/03 Mon");
    }
}
