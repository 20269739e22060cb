use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use tracing::warn;

use crate::feed::FeedSource;
use crate::links::FormTarget;

pub const DEFAULT_FEED_URL: &str = "https://docs.google.com/spreadsheets/d/e/2PACX-1vSfpsb_RZQoF-5qBGjDCUuaCsvYBGG9zopQHjurVmIjIV-JkoeXp6DW3zixUTvARYfGQnnplHhjhdij/pub?output=csv";
pub const DEFAULT_FORM_URL: &str = "https://docs.google.com/forms/d/e/1FAIpQLSdfKHr_Ia197fDJysfVVEy1YZQfIpOCFR7iLKKArOVBdukPzw/viewform?usp=pp_url";
pub const DEFAULT_FORM_QUESTION_ID: &str = "1935706063";
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;

pub const DEFAULT_ROSTER: &[&str] = &[
    "EDDIE ROBERTS",
    "OMAR CORDOBA",
    "LUIS ASPRILLA",
    "DANIEL APARICIO",
    "ORMAN DAVIS",
    "RICHARD PERALTA",
    "JIMAR SANCHEZ",
    "KEVIN GALVAN",
    "JORGE GUTIERREZ",
    "JUAN HALL",
    "JAVIER RIVERA",
    "GILBER MURILLO",
    "ABDUL KNIGHT",
    "RICARDO PHILLIPS",
    "GIOVANI HERBERT",
    "HECTOR HURTADO",
    "ARIEL ARROYO",
    "JOVANY WELCH",
    "GUSTAVO HERRERA",
    "KIDIR BARRIA",
    "ANGEL CAICEDO",
    "SAED DIAZ",
    "KILISER LENIS",
];

pub const ENV_FEED_URL: &str = "RPE_FEED_URL";
pub const ENV_FORM_URL: &str = "RPE_FORM_URL";
pub const ENV_FORM_QUESTION_ID: &str = "RPE_FORM_ENTRY";
pub const ENV_FETCH_TIMEOUT_SECS: &str = "RPE_FETCH_TIMEOUT_SECS";
pub const ENV_ROSTER_FILE: &str = "RPE_ROSTER_FILE";

/// Values given on the command line; they win over the environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub feed_url: Option<String>,
    pub feed_file: Option<PathBuf>,
    pub roster_file: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub feed: FeedSource,
    pub form: FormTarget,
    pub roster: Vec<String>,
    pub fetch_timeout: Duration,
}

impl Config {
    pub fn load(overrides: &Overrides) -> anyhow::Result<Self> {
        Self::resolve(overrides, |name| std::env::var(name).ok())
    }

    pub fn resolve(
        overrides: &Overrides,
        env: impl Fn(&str) -> Option<String>,
    ) -> anyhow::Result<Self> {
        let lookup = |name: &str| env(name).filter(|value| !value.trim().is_empty());

        let feed = match (&overrides.feed_file, &overrides.feed_url) {
            (Some(path), _) => FeedSource::File(path.clone()),
            (None, Some(url)) => FeedSource::Remote(url.clone()),
            (None, None) => FeedSource::Remote(
                lookup(ENV_FEED_URL).unwrap_or_else(|| DEFAULT_FEED_URL.to_string()),
            ),
        };

        let form_url = lookup(ENV_FORM_URL).unwrap_or_else(|| DEFAULT_FORM_URL.to_string());
        let question_id =
            lookup(ENV_FORM_QUESTION_ID).unwrap_or_else(|| DEFAULT_FORM_QUESTION_ID.to_string());
        let form = FormTarget::new(&form_url, &question_id)?;

        let timeout_secs = match overrides.timeout_secs {
            Some(secs) => secs,
            None => match lookup(ENV_FETCH_TIMEOUT_SECS) {
                Some(raw) => raw
                    .trim()
                    .parse()
                    .with_context(|| format!("{ENV_FETCH_TIMEOUT_SECS} must be whole seconds, got {raw:?}"))?,
                None => DEFAULT_FETCH_TIMEOUT_SECS,
            },
        };
        anyhow::ensure!(timeout_secs > 0, "fetch timeout must be at least one second");

        let roster_file = overrides
            .roster_file
            .clone()
            .or_else(|| lookup(ENV_ROSTER_FILE).map(PathBuf::from));
        let roster = match roster_file {
            Some(path) => {
                let text = std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read roster file {}", path.display()))?;
                parse_roster(&text)
                    .with_context(|| format!("invalid roster file {}", path.display()))?
            }
            None => DEFAULT_ROSTER.iter().map(|name| name.to_string()).collect(),
        };

        Ok(Self {
            feed,
            form,
            roster,
            fetch_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

/// One name per line. Blank lines and `#` comments are skipped; a repeated
/// name keeps its first position.
pub fn parse_roster(text: &str) -> anyhow::Result<Vec<String>> {
    let mut roster: Vec<String> = Vec::new();

    for line in text.lines() {
        let name = line.trim();
        if name.is_empty() || name.starts_with('#') {
            continue;
        }
        if roster.iter().any(|existing| existing == name) {
            warn!(name, "duplicate roster entry ignored");
            continue;
        }
        roster.push(name.to_string());
    }

    anyhow::ensure!(!roster.is_empty(), "roster has no names");
    Ok(roster)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn defaults_reproduce_the_squad_setup() {
        let config = Config::resolve(&Overrides::default(), env_from(&[])).unwrap();
        assert_eq!(config.roster.len(), 23);
        assert_eq!(config.roster[0], "EDDIE ROBERTS");
        assert_eq!(config.feed, FeedSource::Remote(DEFAULT_FEED_URL.to_string()));
        assert_eq!(config.fetch_timeout, Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS));
        let link = config.form.deep_link("JUAN HALL");
        assert!(link.as_str().ends_with("entry.1935706063=JUAN+HALL"));
    }

    #[test]
    fn flags_beat_environment() {
        let overrides = Overrides {
            feed_url: Some("https://flag.example.com/feed.csv".to_string()),
            timeout_secs: Some(3),
            ..Overrides::default()
        };
        let env = env_from(&[
            (ENV_FEED_URL, "https://env.example.com/feed.csv"),
            (ENV_FETCH_TIMEOUT_SECS, "30"),
        ]);
        let config = Config::resolve(&overrides, env).unwrap();
        assert_eq!(
            config.feed,
            FeedSource::Remote("https://flag.example.com/feed.csv".to_string())
        );
        assert_eq!(config.fetch_timeout, Duration::from_secs(3));
    }

    #[test]
    fn feed_file_wins_over_url() {
        let overrides = Overrides {
            feed_url: Some("https://flag.example.com/feed.csv".to_string()),
            feed_file: Some(PathBuf::from("snapshot.csv")),
            ..Overrides::default()
        };
        let config = Config::resolve(&overrides, env_from(&[])).unwrap();
        assert_eq!(config.feed, FeedSource::File(PathBuf::from("snapshot.csv")));
    }

    #[test]
    fn environment_fills_gaps() {
        let env = env_from(&[
            (ENV_FEED_URL, "https://env.example.com/feed.csv"),
            (ENV_FETCH_TIMEOUT_SECS, " 6 "),
            (ENV_FORM_URL, "https://forms.example.com/viewform"),
            (ENV_FORM_QUESTION_ID, "77"),
        ]);
        let config = Config::resolve(&Overrides::default(), env).unwrap();
        assert_eq!(
            config.feed,
            FeedSource::Remote("https://env.example.com/feed.csv".to_string())
        );
        assert_eq!(config.fetch_timeout, Duration::from_secs(6));
        assert_eq!(
            config.form.deep_link("A B").as_str(),
            "https://forms.example.com/viewform?entry.77=A+B"
        );
    }

    #[test]
    fn bad_timeout_is_reported() {
        let env = env_from(&[(ENV_FETCH_TIMEOUT_SECS, "soon")]);
        assert!(Config::resolve(&Overrides::default(), env).is_err());
        let zero = Overrides {
            timeout_secs: Some(0),
            ..Overrides::default()
        };
        assert!(Config::resolve(&zero, env_from(&[])).is_err());
    }

    #[test]
    fn roster_file_skips_comments_and_repeats() {
        let roster = parse_roster("# porteros\nEDDIE ROBERTS\n\n  JUAN HALL  \nEDDIE ROBERTS\n").unwrap();
        assert_eq!(roster, vec!["EDDIE ROBERTS".to_string(), "JUAN HALL".to_string()]);
    }

    #[test]
    fn empty_roster_is_rejected() {
        assert!(parse_roster("# nobody yet\n\n").is_err());
    }

    #[test]
    fn missing_roster_file_is_an_error() {
        let overrides = Overrides {
            roster_file: Some(PathBuf::from("/no/such/roster.txt")),
            ..Overrides::default()
        };
        assert!(Config::resolve(&overrides, env_from(&[])).is_err());
    }
}
