use std::fmt::Write;

use crate::dashboard::{Dashboard, FeedState};
use crate::links::FormTarget;
use crate::models::{DailyAggregate, TodayEntry};
use crate::normalize::{clamp_level, MAX_LEVEL};
use crate::view::View;
use crate::window::day_label;

const BAR_CELLS_PER_LEVEL: f64 = 2.0;

pub const UNAVAILABLE_NOTICE: &str = "Syncing with the data source... data is temporarily unavailable.";

pub fn mean_bar(mean_level: f64) -> String {
    let capped = mean_level.clamp(0.0, f64::from(MAX_LEVEL));
    "#".repeat((capped * BAR_CELLS_PER_LEVEL).round() as usize)
}

fn level_text(level: Option<u32>) -> String {
    match level {
        Some(level) => clamp_level(level).to_string(),
        None => "-".to_string(),
    }
}

fn chart_lines(output: &mut String, daily: &[DailyAggregate]) {
    let width = (f64::from(MAX_LEVEL) * BAR_CELLS_PER_LEVEL) as usize;
    for day in daily {
        let _ = writeln!(
            output,
            "{} | {:<width$} {:.1}",
            day_label(day.day),
            mean_bar(day.mean_level),
            day.mean_level,
        );
    }
}

fn board_lines(output: &mut String, board: &[TodayEntry], bullet: &str) {
    for entry in board {
        let _ = writeln!(
            output,
            "{bullet}{} ({})",
            entry.entity_name,
            level_text(entry.level)
        );
    }
}

/// Today's checklist for the terminal.
pub fn status_text(state: &FeedState) -> String {
    let dashboard = match state {
        FeedState::Ready(dashboard) => dashboard,
        FeedState::Unavailable { .. } => return format!("{UNAVAILABLE_NOTICE}\n"),
    };

    let mut output = String::new();
    let _ = writeln!(output, "Submissions for {}:", dashboard.today.format("%d/%m/%Y"));
    if dashboard.board.is_empty() {
        let _ = writeln!(output, "  Nobody has submitted yet.");
    } else {
        board_lines(&mut output, &dashboard.board, "  ");
    }

    let _ = writeln!(output);
    if dashboard.status.pending.is_empty() {
        let _ = writeln!(output, "The whole squad has submitted today.");
    } else {
        let _ = writeln!(
            output,
            "Pending ({}): {}",
            dashboard.status.pending.len(),
            dashboard.status.pending.join(", ")
        );
    }

    if !dashboard.status.unrostered.is_empty() {
        let _ = writeln!(
            output,
            "Not on the roster: {}",
            dashboard.status.unrostered.join(", ")
        );
    }

    output
}

/// Daily means and the (player filtered) submissions in the window.
pub fn trend_text(state: &FeedState) -> String {
    let dashboard = match state {
        FeedState::Ready(dashboard) => dashboard,
        FeedState::Unavailable { .. } => return format!("{UNAVAILABLE_NOTICE}\n"),
    };

    let mut output = String::new();
    let _ = writeln!(
        output,
        "Effort trend {} to {}:",
        dashboard.window.start, dashboard.window.end
    );

    if dashboard.summary.is_empty() {
        let _ = writeln!(output, "No submissions in this window.");
        return output;
    }

    chart_lines(&mut output, &dashboard.summary.daily);

    let _ = writeln!(output);
    if dashboard.summary.records.is_empty() {
        let _ = writeln!(output, "No submissions from the selected players.");
    }
    for record in &dashboard.summary.records {
        let _ = writeln!(
            output,
            "{}  {}  {}",
            day_label(record.day()),
            record.entity_name,
            level_text(record.level)
        );
    }

    output
}

pub fn roster_text(roster: &[String], form: &FormTarget) -> String {
    let mut output = String::new();
    for name in roster {
        let _ = writeln!(output, "{name}\t{}", form.deep_link(name));
    }
    output
}

/// The panel lists every player's form link; a form view shows just one.
pub fn view_text(view: &View, roster: &[String], form: &FormTarget) -> String {
    match view {
        View::Panel => roster_text(roster, form),
        View::FormView { entity_name, url } => {
            format!("RPE form for {entity_name}:\n{url}\n")
        }
    }
}

/// Markdown version of the whole dashboard.
pub fn build_report(state: &FeedState, roster: &[String], form: &FormTarget) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# RPE Dashboard");
    let _ = writeln!(output);
    let _ = writeln!(output, "## Individual RPE Forms");
    for name in roster {
        let _ = writeln!(output, "- [{name}]({})", form.deep_link(name));
    }

    let dashboard = match state {
        FeedState::Ready(dashboard) => dashboard,
        FeedState::Unavailable { .. } => {
            let _ = writeln!(output);
            let _ = writeln!(output, "> {UNAVAILABLE_NOTICE}");
            return output;
        }
    };

    trend_section(&mut output, dashboard);
    today_section(&mut output, dashboard);
    output
}

fn trend_section(output: &mut String, dashboard: &Dashboard) {
    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "## Effort Trend ({} to {})",
        dashboard.window.start, dashboard.window.end
    );

    if dashboard.summary.daily.is_empty() {
        let _ = writeln!(output, "No scored submissions in this window.");
    } else {
        let _ = writeln!(output, "```");
        chart_lines(output, &dashboard.summary.daily);
        let _ = writeln!(output, "```");
    }

    if !dashboard.players.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "| Player | Entries | Mean RPE | Max RPE |");
        let _ = writeln!(output, "| --- | ---: | ---: | ---: |");
        for player in &dashboard.players {
            let _ = writeln!(
                output,
                "| {} | {} | {} | {} |",
                player.entity_name,
                player.entries,
                player
                    .mean_level
                    .map(|mean| format!("{mean:.1}"))
                    .unwrap_or_else(|| "-".to_string()),
                level_text(player.max_level)
            );
        }
    }
}

fn today_section(output: &mut String, dashboard: &Dashboard) {
    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "## Today's Submissions ({})",
        dashboard.today.format("%d/%m/%Y")
    );

    let _ = writeln!(output, "### Completed");
    if dashboard.board.is_empty() {
        let _ = writeln!(output, "Nobody has submitted yet.");
    } else {
        board_lines(output, &dashboard.board, "- ");
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "### Pending");
    if dashboard.status.pending.is_empty() {
        let _ = writeln!(output, "The whole squad has submitted today.");
    } else {
        let _ = writeln!(output, "{}", dashboard.status.pending.join(", "));
    }

    if !dashboard.status.unrostered.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(
            output,
            "Submitted but not on the roster: {}",
            dashboard.status.unrostered.join(", ")
        );
    }
}
