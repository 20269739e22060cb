use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use chrono::Utc;
use reqwest::{Client, StatusCode, Url};
use thiserror::Error;
use tracing::{debug, info};

use crate::models::RawRow;

const CACHE_BUST_PARAM: &str = "t";

static LAST_CACHE_STAMP: AtomicI64 = AtomicI64::new(0);

type UrlParseError = <Url as std::str::FromStr>::Err;

#[derive(Debug, Error)]
pub enum FetchFailure {
    #[error("invalid feed url {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: UrlParseError,
    },
    #[error("feed request timed out after {0:?}")]
    Timeout(Duration),
    #[error("feed request failed: {0}")]
    Network(#[source] reqwest::Error),
    #[error("feed returned HTTP {0}")]
    Status(StatusCode),
    #[error("failed to read feed file {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Whole-feed failures. Per-row problems never surface here.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error(transparent)]
    Fetch(#[from] FetchFailure),
    #[error("malformed feed: {0}")]
    Parse(#[from] csv::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedSource {
    Remote(String),
    File(PathBuf),
}

pub struct FeedFetcher {
    client: Client,
    timeout: Duration,
}

impl FeedFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FeedError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(FetchFailure::Network)?;
        Ok(Self { client, timeout })
    }

    pub fn with_client(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// GET the feed with a fresh cache-busting parameter and return the raw body.
    pub async fn fetch(&self, source_url: &str) -> Result<Vec<u8>, FeedError> {
        let url = cache_busted_url(source_url, next_cache_stamp(Utc::now().timestamp_millis()))?;
        debug!(%url, "fetching feed");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| self.classify(err))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchFailure::Status(status).into());
        }

        let body = response.bytes().await.map_err(|err| self.classify(err))?;
        info!(bytes = body.len(), "feed fetched");
        Ok(body.to_vec())
    }

    pub async fn load(&self, source: &FeedSource) -> Result<Vec<RawRow>, FeedError> {
        let body = match source {
            FeedSource::Remote(url) => self.fetch(url).await?,
            FeedSource::File(path) => read_feed_file(path)?,
        };
        parse_feed(&body)
    }

    fn classify(&self, err: reqwest::Error) -> FetchFailure {
        if err.is_timeout() {
            FetchFailure::Timeout(self.timeout)
        } else {
            FetchFailure::Network(err)
        }
    }
}

/// Returns a stamp that is never lower than `now_millis` and always above any
/// stamp handed out before in this process.
pub fn next_cache_stamp(now_millis: i64) -> i64 {
    let mut previous = LAST_CACHE_STAMP.load(Ordering::Relaxed);
    loop {
        let next = now_millis.max(previous + 1);
        match LAST_CACHE_STAMP.compare_exchange_weak(
            previous,
            next,
            Ordering::Relaxed,
            Ordering::Relaxed,
        ) {
            Ok(_) => return next,
            Err(actual) => previous = actual,
        }
    }
}

pub fn cache_busted_url(source_url: &str, stamp: i64) -> Result<Url, FetchFailure> {
    let mut url = Url::parse(source_url).map_err(|source| FetchFailure::InvalidUrl {
        url: source_url.to_string(),
        source,
    })?;

    // Only re-serialize the query when a stale stamp has to go; otherwise the
    // configured URL stays byte for byte.
    if url.query_pairs().any(|(key, _)| key == CACHE_BUST_PARAM) {
        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| key != CACHE_BUST_PARAM)
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();
        url.query_pairs_mut().clear().extend_pairs(kept);
    }

    url.query_pairs_mut()
        .append_pair(CACHE_BUST_PARAM, &stamp.to_string());
    Ok(url)
}

pub fn read_feed_file(path: &Path) -> Result<Vec<u8>, FetchFailure> {
    debug!(path = %path.display(), "reading feed file");
    std::fs::read(path).map_err(|source| FetchFailure::File {
        path: path.to_path_buf(),
        source,
    })
}

/// Splits a CSV body into positional rows. The header row is skipped whatever
/// it says, short rows read missing cells as empty.
pub fn parse_feed(body: &[u8]) -> Result<Vec<RawRow>, FeedError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(body);

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        rows.push(RawRow {
            timestamp: record.get(0).unwrap_or_default().to_string(),
            entity_name: record.get(1).unwrap_or_default().to_string(),
            response: record.get(2).unwrap_or_default().to_string(),
        });
    }

    Ok(rows)
}
