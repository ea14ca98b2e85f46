//! Client for the carrier's rate sheet.
//!
//! - Reads the sheet rows either from the HTTP export endpoint or from a local JSON file.
//! - Keeps the last remote payload on disk and falls back to it when the endpoint is down.

use std::{
    fmt,
    path::PathBuf,
    time::{Duration, SystemTime},
};

use reqwest::{Client, Url};
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::{LoadError, RateTable};
use crate::infra::cache::{
    default_snapshot_path, load_snapshot, save_snapshot, RatesSnapshot, RATES_SNAPSHOT_TTL,
};

/// Overrides the configured rate source at startup.
pub const RATE_SOURCE_ENV: &str = "CARRIER_RATES_URL";
const USER_AGENT: &str = concat!("carrier-quote/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum RateSourceError {
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("rate source is empty")]
    EmptyLocation,
    #[error("not a local file URL: {0}")]
    NotAFilePath(String),
    #[error("http request error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("rate payload is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),
    #[error(transparent)]
    Load(#[from] LoadError),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RateLocation {
    Remote(Url),
    File(PathBuf),
}

impl RateLocation {
    /// `http(s)://` and `file://` URLs are taken as such; anything else is a file path.
    pub fn parse(raw: &str) -> Result<Self, RateSourceError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(RateSourceError::EmptyLocation);
        }

        let lowered = trimmed.to_ascii_lowercase();
        if lowered.starts_with("http://") || lowered.starts_with("https://") {
            return Ok(Self::Remote(Url::parse(trimmed)?));
        }
        if lowered.starts_with("file://") {
            let url = Url::parse(trimmed)?;
            return url
                .to_file_path()
                .map(Self::File)
                .map_err(|_| RateSourceError::NotAFilePath(trimmed.to_string()));
        }
        Ok(Self::File(PathBuf::from(trimmed)))
    }
}

impl fmt::Display for RateLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateLocation::Remote(url) => write!(f, "{url}"),
            RateLocation::File(path) => write!(f, "{}", path.display()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CacheStatus {
    Fresh,
    Cached,
    Stale,
}

pub struct LoadedRates {
    pub table: RateTable,
    pub origin: String,
    pub fetched_at: SystemTime,
    pub status: CacheStatus,
}

#[derive(Clone)]
pub struct RateSourceClient {
    http: Client,
    location: RateLocation,
    snapshot_path: Option<PathBuf>,
    ttl: Duration,
}

impl RateSourceClient {
    pub fn new(location: RateLocation) -> Result<Self, RateSourceError> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            location,
            snapshot_path: Some(default_snapshot_path()),
            ttl: RATES_SNAPSHOT_TTL,
        })
    }

    /// `None` disables the on-disk snapshot.
    #[cfg(test)]
    pub fn with_snapshot_path(mut self, path: Option<PathBuf>) -> Self {
        self.snapshot_path = path;
        self
    }

    pub fn location(&self) -> &RateLocation {
        &self.location
    }

    /// Loads the rate table.
    ///
    /// Local files are always read fresh. For remote sources a snapshot younger
    /// than the TTL is used unless `force_refresh` is set; if the request fails
    /// or returns something that is not a row list, any snapshot of the same
    /// source is served as stale.
    pub async fn load(&self, force_refresh: bool) -> Result<LoadedRates, RateSourceError> {
        match &self.location {
            RateLocation::File(path) => self.load_file(path.clone()).await,
            RateLocation::Remote(url) => self.load_remote(url.clone(), force_refresh).await,
        }
    }

    async fn load_file(&self, path: PathBuf) -> Result<LoadedRates, RateSourceError> {
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| RateSourceError::Io {
                path: path.clone(),
                source,
            })?;
        let payload: serde_json::Value = serde_json::from_str(&content)?;
        let table = RateTable::load(&payload)?;
        info!(path = %path.display(), records = table.len(), "loaded rates from file");

        Ok(LoadedRates {
            table,
            origin: self.location.to_string(),
            fetched_at: SystemTime::now(),
            status: CacheStatus::Fresh,
        })
    }

    async fn load_remote(
        &self,
        url: Url,
        force_refresh: bool,
    ) -> Result<LoadedRates, RateSourceError> {
        let origin = self.location.to_string();
        let snapshot = self.snapshot_for(&origin);

        if !force_refresh {
            if let Some(snapshot) = snapshot.as_ref().filter(|s| !s.is_expired(self.ttl)) {
                info!(origin = %origin, age = %snapshot.age_string(), "using rates snapshot");
                return from_snapshot(snapshot, CacheStatus::Cached);
            }
        }

        let fetched = self
            .fetch(url)
            .await
            .and_then(|payload| Ok((RateTable::load(&payload)?, payload)));

        match fetched {
            Ok((table, payload)) => {
                info!(origin = %origin, records = table.len(), "fetched rates");
                if let Some(path) = &self.snapshot_path {
                    if let Err(e) = save_snapshot(path, &RatesSnapshot::new(&origin, payload)) {
                        warn!(error = %e, "failed to save rates snapshot");
                    }
                }
                Ok(LoadedRates {
                    table,
                    origin,
                    fetched_at: SystemTime::now(),
                    status: CacheStatus::Fresh,
                })
            }
            Err(error) => {
                if let Some(snapshot) = snapshot.as_ref() {
                    warn!(
                        origin = %origin,
                        error = %error,
                        age = %snapshot.age_string(),
                        "rate source unusable, serving stale snapshot"
                    );
                    return from_snapshot(snapshot, CacheStatus::Stale);
                }
                Err(error)
            }
        }
    }

    async fn fetch(&self, url: Url) -> Result<serde_json::Value, RateSourceError> {
        info!(url = %url, "requesting rate sheet");
        let response = self.http.get(url).send().await?.error_for_status()?;
        Ok(response.json::<serde_json::Value>().await?)
    }

    fn snapshot_for(&self, origin: &str) -> Option<RatesSnapshot> {
        let path = self.snapshot_path.as_ref()?;
        load_snapshot(path).filter(|snapshot| snapshot.origin == origin)
    }
}

fn from_snapshot(
    snapshot: &RatesSnapshot,
    status: CacheStatus,
) -> Result<LoadedRates, RateSourceError> {
    Ok(LoadedRates {
        table: RateTable::load(&snapshot.payload)?,
        origin: snapshot.origin.clone(),
        fetched_at: snapshot.fetched_at(),
        status,
    })
}
