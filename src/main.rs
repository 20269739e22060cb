use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use tracing::warn;

use rpe_dashboard::config::{Config, Overrides};
use rpe_dashboard::dashboard::{run_cycle, CycleRequest, FeedState};
use rpe_dashboard::feed::FeedFetcher;
use rpe_dashboard::reconcile::today;
use rpe_dashboard::view::View;
use rpe_dashboard::window::{DateWindow, DEFAULT_WINDOW_DAYS};
use rpe_dashboard::{logging, report};

#[derive(Parser)]
#[command(name = "rpe-dashboard")]
#[command(about = "RPE submission dashboard for the squad", long_about = None)]
struct Cli {
    #[command(flatten)]
    source: SourceArgs,
    /// Log debug detail, including dropped feed rows
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SourceArgs {
    /// Published CSV export to poll
    #[arg(long, global = true)]
    feed_url: Option<String>,
    /// Read a saved CSV export instead of fetching
    #[arg(long, global = true)]
    feed_file: Option<PathBuf>,
    /// Roster file, one name per line
    #[arg(long, global = true)]
    roster: Option<PathBuf>,
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,
}

impl SourceArgs {
    fn overrides(&self) -> Overrides {
        Overrides {
            feed_url: self.feed_url.clone(),
            feed_file: self.feed_file.clone(),
            roster_file: self.roster.clone(),
            timeout_secs: self.timeout_secs,
        }
    }
}

#[derive(Args)]
struct WindowArgs {
    /// First day of the window (YYYY-MM-DD)
    #[arg(long)]
    start: Option<NaiveDate>,
    /// Last day of the window (YYYY-MM-DD), defaults to today
    #[arg(long)]
    end: Option<NaiveDate>,
    /// Days back from the end when --start is not given
    #[arg(long, default_value_t = DEFAULT_WINDOW_DAYS, conflicts_with = "start")]
    days: i64,
    /// Only list these players (repeatable); daily means still cover everyone
    #[arg(long = "player")]
    players: Vec<String>,
}

impl WindowArgs {
    fn window(&self, today: NaiveDate) -> anyhow::Result<DateWindow> {
        anyhow::ensure!(self.days >= 0, "--days cannot be negative");
        let end = self.end.unwrap_or(today);
        match self.start {
            Some(start) => DateWindow::new(start, end),
            None => DateWindow::ending_on(end, self.days).context("--days out of range"),
        }
    }

    fn player_filter(&self, roster: &[String]) -> Option<BTreeSet<String>> {
        if self.players.is_empty() {
            return None;
        }
        for name in &self.players {
            if !roster.contains(name) {
                warn!(player = %name, "filtering on a name that is not on the roster");
            }
        }
        Some(self.players.iter().cloned().collect())
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Show today's submissions and who is still pending
    Status {
        #[arg(long)]
        json: bool,
    },
    /// Show daily mean RPE over a date window
    Trend {
        #[command(flatten)]
        window: WindowArgs,
        #[arg(long)]
        json: bool,
    },
    /// Write the full dashboard as markdown
    Report {
        #[command(flatten)]
        window: WindowArgs,
        #[arg(long, default_value = "rpe-report.md")]
        out: PathBuf,
    },
    /// List the roster with each player's form link
    Roster,
    /// Open the RPE form for one player
    Open {
        name: String,
        /// Wait for Enter, then return to the roster panel
        #[arg(long)]
        wait: bool,
    },
}

fn print_state(state: &FeedState, json: bool, render: fn(&FeedState) -> String) -> anyhow::Result<()> {
    if json {
        let text = serde_json::to_string_pretty(state).context("failed to encode dashboard")?;
        println!("{text}");
    } else {
        print!("{}", render(state));
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let config = Config::load(&cli.source.overrides())?;

    match cli.command {
        Commands::Roster => {
            print!("{}", report::view_text(&View::default(), &config.roster, &config.form));
        }
        Commands::Open { name, wait } => {
            let view = View::default().select(&config.roster, &config.form, &name)?;
            print!("{}", report::view_text(&view, &config.roster, &config.form));
            if wait {
                println!("Press Enter to go back to the panel.");
                let mut line = String::new();
                std::io::stdin()
                    .read_line(&mut line)
                    .context("failed to read from stdin")?;
                let view = view.back();
                print!("{}", report::view_text(&view, &config.roster, &config.form));
            }
        }
        Commands::Status { json } => {
            let today = today();
            let fetcher = FeedFetcher::new(config.fetch_timeout)?;
            let request = CycleRequest {
                roster: &config.roster,
                window: DateWindow::ending_on(today, DEFAULT_WINDOW_DAYS)?,
                players: None,
                today,
            };
            let state = run_cycle(&fetcher, &config.feed, &request).await;
            print_state(&state, json, report::status_text)?;
        }
        Commands::Trend { window, json } => {
            let today = today();
            let players = window.player_filter(&config.roster);
            let fetcher = FeedFetcher::new(config.fetch_timeout)?;
            let request = CycleRequest {
                roster: &config.roster,
                window: window.window(today)?,
                players: players.as_ref(),
                today,
            };
            let state = run_cycle(&fetcher, &config.feed, &request).await;
            print_state(&state, json, report::trend_text)?;
        }
        Commands::Report { window, out } => {
            let today = today();
            let players = window.player_filter(&config.roster);
            let fetcher = FeedFetcher::new(config.fetch_timeout)?;
            let request = CycleRequest {
                roster: &config.roster,
                window: window.window(today)?,
                players: players.as_ref(),
                today,
            };
            let state = run_cycle(&fetcher, &config.feed, &request).await;
            let report = report::build_report(&state, &config.roster, &config.form);
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write report to {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
