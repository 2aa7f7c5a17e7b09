//! Cache manager for persisting forecast responses to disk
//!
//! Provides a `CacheManager` that stores raw response bodies as JSON files,
//! one file per request URL, so a later run can render a city without the
//! network.

use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::debug;

/// Suffix source for temporary files, unique within this process
static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Wrapper struct for a cached response stored on disk
#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    /// URL the body was fetched from
    url: String,
    /// The raw response body
    body: String,
    /// When the response was cached
    cached_at: DateTime<Utc>,
}

/// A response body read back from the cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
    /// The raw response body
    pub body: String,
    /// When the response was originally cached
    pub cached_at: DateTime<Utc>,
}

/// Lookup of previously seen responses, keyed by request URL
#[async_trait]
pub trait ResponseCache: Send + Sync {
    /// Returns the cached response for `url`, if there is one
    async fn lookup(&self, url: &str) -> Option<CachedResponse>;

    /// Records `body` as the latest response for `url`
    async fn store(&self, url: &str, body: &str) -> io::Result<()>;
}

/// Manages reading and writing cached responses to disk
///
/// Entries live in an XDG-compliant cache directory
/// (`~/.cache/weatherwatch/responses/` on Linux). There is no expiry: any
/// entry is better than nothing when the network is down, and the fetcher
/// decides whether a cached body may be shown.
#[derive(Debug, Clone)]
pub struct CacheManager {
    /// Directory where cache files are stored
    cache_dir: PathBuf,
}

impl CacheManager {
    /// Creates a new CacheManager using the XDG cache directory
    ///
    /// Returns `None` if the cache directory cannot be determined (e.g., no home directory).
    pub fn new() -> Option<Self> {
        let project_dirs = ProjectDirs::from("", "", "weatherwatch")?;
        let cache_dir = project_dirs.cache_dir().join("responses");
        Some(Self { cache_dir })
    }

    /// Creates a new CacheManager with a custom cache directory
    pub fn with_dir(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    /// Returns the path to a cache file for the given URL
    fn cache_path(&self, url: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", file_stem(url)))
    }

    /// Writes a response body to the cache
    ///
    /// The entry is written to a temporary file and renamed into place, so a
    /// concurrent reader sees either the old entry or the new one.
    pub async fn write(&self, url: &str, body: &str) -> io::Result<()> {
        fs::create_dir_all(&self.cache_dir).await?;

        let entry = CacheEntry {
            url: url.to_string(),
            body: body.to_string(),
            cached_at: Utc::now(),
        };
        let json = serde_json::to_string(&entry)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let path = self.cache_path(url);
        // One temp file per write, so concurrent writers of a URL never share one
        let tmp_path = path.with_extension(format!(
            "json.{}.{}.tmp",
            std::process::id(),
            TMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        fs::write(&tmp_path, json).await?;
        fs::rename(&tmp_path, &path).await
    }

    /// Reads a response from the cache
    ///
    /// Returns `None` if the entry doesn't exist, cannot be parsed, or was
    /// written for a different URL that maps to the same file name.
    pub async fn read(&self, url: &str) -> Option<CachedResponse> {
        let path = self.cache_path(url);
        let content = fs::read_to_string(&path).await.ok()?;
        let entry: CacheEntry = match serde_json::from_str(&content) {
            Ok(entry) => entry,
            Err(e) => {
                debug!(?path, error = %e, "Ignoring unreadable cache entry");
                return None;
            }
        };

        if entry.url != url {
            return None;
        }

        Some(CachedResponse {
            body: entry.body,
            cached_at: entry.cached_at,
        })
    }
}

#[async_trait]
impl ResponseCache for CacheManager {
    async fn lookup(&self, url: &str) -> Option<CachedResponse> {
        self.read(url).await
    }

    async fn store(&self, url: &str, body: &str) -> io::Result<()> {
        self.write(url, body).await
    }
}

/// Maps a URL to a file-name-safe stem
fn file_stem(url: &str) -> String {
    url.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}
