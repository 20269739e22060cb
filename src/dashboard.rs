use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use crate::feed::{FeedFetcher, FeedSource};
use crate::models::{
    CompletionStatus, NormalizeStats, PlayerSummary, RawRow, TodayEntry, WindowSummary,
};
use crate::normalize::normalize_with_stats;
use crate::reconcile::{reconcile, records_on, today_board};
use crate::window::{aggregate, summarize_players, DateWindow};

/// Everything one render cycle shows, rebuilt from the feed every time.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub today: NaiveDate,
    pub window: DateWindow,
    pub summary: WindowSummary,
    pub players: Vec<PlayerSummary>,
    pub board: Vec<TodayEntry>,
    pub status: CompletionStatus,
    pub stats: NormalizeStats,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FeedState {
    Ready(Dashboard),
    Unavailable { reason: String },
}

pub struct CycleRequest<'a> {
    pub roster: &'a [String],
    pub window: DateWindow,
    pub players: Option<&'a BTreeSet<String>>,
    pub today: NaiveDate,
}

pub fn build_dashboard(rows: &[RawRow], request: &CycleRequest<'_>) -> Dashboard {
    let (records, stats) = normalize_with_stats(rows);
    let summary = aggregate(&records, request.window, request.players);
    let players = summarize_players(&summary.records);

    let today_records = records_on(&records, request.today);
    let board = today_board(&today_records);
    let status = reconcile(request.roster, &today_records);

    Dashboard {
        today: request.today,
        window: request.window,
        summary,
        players,
        board,
        status,
        stats,
    }
}

/// Fetch, normalize, aggregate, reconcile. Whole-feed failures come back as
/// [`FeedState::Unavailable`]; the next cycle is the retry.
pub async fn run_cycle(
    fetcher: &FeedFetcher,
    source: &FeedSource,
    request: &CycleRequest<'_>,
) -> FeedState {
    match fetcher.load(source).await {
        Ok(rows) => {
            let dashboard = build_dashboard(&rows, request);
            info!(
                rows = rows.len(),
                kept = dashboard.stats.kept,
                dropped = dashboard.stats.dropped_timestamp + dashboard.stats.dropped_name,
                completed = dashboard.status.completed.len(),
                pending = dashboard.status.pending.len(),
                "dashboard refreshed"
            );
            FeedState::Ready(dashboard)
        }
        Err(err) => {
            warn!(error = %err, "feed unavailable");
            FeedState::Unavailable {
                reason: err.to_string(),
            }
        }
    }
}
