//! Runtime configuration resolved from the command line and environment
//!
//! `Config` is built once in `main` from the parsed `Cli`. Anything left
//! unset falls back to the platform data and cache directories.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use directories::ProjectDirs;

use crate::cache::{CacheManager, ResponseCache, WriteThrough};
use crate::cli::{Cli, CliError};
use crate::data::{FetchError, ForecastClient, ForecastSource};
use crate::fetcher::SnapshotFetcher;

/// File name of the watch-list database inside the data directory
pub const DB_FILE: &str = "weatherwatch.sqlite3";

/// Settings shared by every command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Base URL of the forecast endpoint
    pub base_url: String,
    /// Watch-list database location
    pub db_path: PathBuf,
    /// Explicit response cache directory; the platform cache dir when `None`
    pub cache_dir: Option<PathBuf>,
    /// Whether the response cache is read and filled
    pub use_cache: bool,
    /// Limit on each live request
    pub live_timeout: Duration,
}

impl Config {
    /// Resolves the configuration for a parsed command line
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let db_path = match &cli.db {
            Some(path) => path.clone(),
            None => ProjectDirs::from("", "", "weatherwatch")
                .map(|dirs| dirs.data_dir().join(DB_FILE))
                .ok_or(CliError::NoDataDir)?,
        };

        Ok(Self {
            base_url: cli.base_url.clone(),
            db_path,
            cache_dir: cli.cache_dir.clone(),
            use_cache: !cli.no_cache,
            live_timeout: Duration::from_secs(cli.timeout),
        })
    }

    /// The on-disk response cache, or `None` when disabled or no cache
    /// directory can be determined
    pub fn response_cache(&self) -> Option<CacheManager> {
        if !self.use_cache {
            return None;
        }
        match &self.cache_dir {
            Some(dir) => Some(CacheManager::with_dir(dir.clone())),
            None => CacheManager::new(),
        }
    }

    /// Builds the fetcher: live requests go through the HTTP client, and
    /// successful bodies are written through to the response cache
    pub fn snapshot_fetcher(&self) -> Result<SnapshotFetcher, FetchError> {
        let client: Arc<dyn ForecastSource> =
            Arc::new(ForecastClient::with_timeout(self.live_timeout)?);

        let fetcher = match self.response_cache() {
            Some(manager) => {
                let cache: Arc<dyn ResponseCache> = Arc::new(manager);
                let live = Arc::new(WriteThrough::new(client, Arc::clone(&cache)));
                SnapshotFetcher::new(&self.base_url, live, Some(cache))
            }
            None => SnapshotFetcher::new(&self.base_url, client, None),
        };
        Ok(fetcher)
    }
}
