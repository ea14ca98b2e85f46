//! On-disk snapshot of the last rate payload, with TTL tracking.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::OnceLock,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

const SNAPSHOT_FILENAME: &str = "rates_snapshot.json";

/// Snapshot TTL: 24 hours. The carrier republishes its sheet rarely.
pub const RATES_SNAPSHOT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Raw rate payload as last received, kept so the table can be rebuilt offline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatesSnapshot {
    /// Source the payload was fetched from.
    pub origin: String,
    /// Unix timestamp (seconds) when the payload was fetched.
    pub cached_at: u64,
    pub payload: serde_json::Value,
}

impl RatesSnapshot {
    pub fn new(origin: impl Into<String>, payload: serde_json::Value) -> Self {
        let cached_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self {
            origin: origin.into(),
            cached_at,
            payload,
        }
    }

    pub fn is_expired(&self, ttl: Duration) -> bool {
        self.age() > ttl
    }

    pub fn age(&self) -> Duration {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Duration::from_secs(now.saturating_sub(self.cached_at))
    }

    pub fn fetched_at(&self) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(self.cached_at)
    }

    /// Human-readable age string.
    pub fn age_string(&self) -> String {
        let secs = self.age().as_secs();
        if secs < 60 {
            format!("{secs}s")
        } else if secs < 3600 {
            format!("{}m", secs / 60)
        } else if secs < 86400 {
            format!("{}h", secs / 3600)
        } else {
            format!("{}d", secs / 86400)
        }
    }
}

/// Snapshot location in the local data directory.
pub fn default_snapshot_path() -> PathBuf {
    static PATH: OnceLock<PathBuf> = OnceLock::new();
    PATH.get_or_init(|| {
        let base = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("carrier-quote");
        let _ = fs::create_dir_all(&base);
        base.join(SNAPSHOT_FILENAME)
    })
    .clone()
}

/// Reads the snapshot at `path`, if present and parseable.
pub fn load_snapshot(path: &Path) -> Option<RatesSnapshot> {
    if !path.exists() {
        debug!(path = %path.display(), "no rates snapshot");
        return None;
    }

    match fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str::<RatesSnapshot>(&content) {
            Ok(snapshot) => {
                debug!(
                    path = %path.display(),
                    origin = %snapshot.origin,
                    age = %snapshot.age_string(),
                    "loaded rates snapshot"
                );
                Some(snapshot)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to parse rates snapshot");
                None
            }
        },
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read rates snapshot");
            None
        }
    }
}

pub fn save_snapshot(path: &Path, snapshot: &RatesSnapshot) -> Result<(), std::io::Error> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string(snapshot)?; // compact, the sheet has thousands of rows
    fs::write(path, content)?;
    info!(
        path = %path.display(),
        origin = %snapshot.origin,
        "saved rates snapshot"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn snapshot_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(SNAPSHOT_FILENAME);
        let snapshot = RatesSnapshot::new("http://rates.test/api", json!([{ "region": "LIMA" }]));

        save_snapshot(&path, &snapshot).unwrap();
        let loaded = load_snapshot(&path).unwrap();

        assert_eq!(loaded.origin, "http://rates.test/api");
        assert_eq!(loaded.cached_at, snapshot.cached_at);
        assert_eq!(loaded.payload, snapshot.payload);
    }

    #[test]
    fn missing_or_corrupt_snapshot_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SNAPSHOT_FILENAME);
        assert!(load_snapshot(&path).is_none());

        fs::write(&path, "{ not json").unwrap();
        assert!(load_snapshot(&path).is_none());
    }

    #[test]
    fn expiry_follows_ttl() {
        let mut snapshot = RatesSnapshot::new("origin", json!([]));
        assert!(!snapshot.is_expired(RATES_SNAPSHOT_TTL));

        snapshot.cached_at = snapshot.cached_at.saturating_sub(2 * 24 * 60 * 60);
        assert!(snapshot.is_expired(RATES_SNAPSHOT_TTL));
        assert_eq!(snapshot.age_string(), "2d");
    }
}
