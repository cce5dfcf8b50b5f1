//! Revalidation record
//!
//! Remembers when each route was last generated so that `generate` and the
//! server only rebuild routes older than the revalidation interval. Stored
//! as JSON in `.spacetraveling-cache/routes.json`.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// Cache directory name, relative to the site base directory
pub const CACHE_DIR: &str = ".spacetraveling-cache";
const CACHE_FILE: &str = "routes.json";

/// Generation record of one route
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteRecord {
    /// Unix time of the last generation attempt
    pub generated_at: u64,
    /// Hash of the rendered output; `None` when the source reported the route missing
    pub hash: Option<u64>,
}

impl RouteRecord {
    pub fn is_missing(&self) -> bool {
        self.hash.is_none()
    }
}

/// All route records of a site
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RevalidationCache {
    #[serde(default)]
    routes: BTreeMap<String, RouteRecord>,
}

impl RevalidationCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn path(base_dir: &Path) -> PathBuf {
        base_dir.join(CACHE_DIR).join(CACHE_FILE)
    }

    /// Load the record, starting empty when it is absent or unreadable
    pub fn load(base_dir: &Path) -> Self {
        let path = Self::path(base_dir);
        if !path.exists() {
            return Self::new();
        }

        match fs::read_to_string(&path)
            .map_err(anyhow::Error::from)
            .and_then(|content| Ok(serde_json::from_str::<Self>(&content)?))
        {
            Ok(cache) => cache,
            Err(e) => {
                tracing::warn!("Ignoring unreadable cache {:?}: {}", path, e);
                Self::new()
            }
        }
    }

    /// Persist the record
    pub fn save(&self, base_dir: &Path) -> Result<()> {
        let path = Self::path(base_dir);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, serde_json::to_string_pretty(self)?)?;
        tracing::debug!("Saved {} route records to {:?}", self.routes.len(), path);
        Ok(())
    }

    pub fn get(&self, route: &str) -> Option<&RouteRecord> {
        self.routes.get(route)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// A route is stale when it was never generated or is at least `interval` old
    pub fn is_stale(&self, route: &str, now: u64, interval: Duration) -> bool {
        match self.routes.get(route) {
            Some(record) => now.saturating_sub(record.generated_at) >= interval.as_secs(),
            None => true,
        }
    }

    /// Whether a fresh record says the source has no such route
    pub fn is_known_missing(&self, route: &str, now: u64, interval: Duration) -> bool {
        self.routes
            .get(route)
            .is_some_and(|r| r.is_missing())
            && !self.is_stale(route, now, interval)
    }

    /// Record a successful generation. Returns whether the output changed.
    pub fn record(&mut self, route: &str, hash: u64, now: u64) -> bool {
        let previous = self.routes.insert(
            route.to_string(),
            RouteRecord {
                generated_at: now,
                hash: Some(hash),
            },
        );
        previous.and_then(|r| r.hash) != Some(hash)
    }

    /// Record that the source reported the route missing
    pub fn record_missing(&mut self, route: &str, now: u64) {
        self.routes.insert(
            route.to_string(),
            RouteRecord {
                generated_at: now,
                hash: None,
            },
        );
    }

    /// Drop the record of a route whose output was deleted
    pub fn forget(&mut self, route: &str) {
        self.routes.remove(route);
    }

    /// Hash previously recorded for a route
    pub fn hash_of(&self, route: &str) -> Option<u64> {
        self.routes.get(route).and_then(|r| r.hash)
    }
}

/// Calculate a hash for rendered content
pub fn hash_content(content: &str) -> u64 {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    hasher.finish()
}

/// Current time as a unix timestamp
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
