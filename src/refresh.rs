//! Periodic refresh for `watch` mode
//!
//! Re-fetches every displayed city on a fixed interval until a shutdown
//! signal arrives.

use std::future::Future;
use std::time::Duration;

use tracing::info;

use crate::app::App;
use crate::dispatch::Renderer;
use crate::store::KvStore;

/// Configuration for the refresh loop
#[derive(Debug, Clone)]
pub struct RefreshConfig {
    /// Time between refreshes
    pub interval: Duration,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(300), // 5 minutes
        }
    }
}

/// Refreshes `app` every `config.interval` until `shutdown` completes
///
/// The first refresh happens one interval after the call; the caller is
/// expected to have rendered the initial cards already. A refresh still in
/// flight when `shutdown` completes is abandoned. Returns the number of
/// refresh cycles that finished.
pub async fn run<S, R, F>(app: &mut App<S, R>, config: RefreshConfig, shutdown: F) -> usize
where
    S: KvStore,
    R: Renderer,
    F: Future<Output = ()>,
{
    let mut interval = tokio::time::interval(config.interval);
    // Skip the first tick (immediate)
    interval.tick().await;

    tokio::pin!(shutdown);
    let mut cycles = 0;

    loop {
        tokio::select! {
            _ = interval.tick() => {
                // A slow cycle must not hold up shutdown
                tokio::select! {
                    rendered = app.refresh_all() => {
                        cycles += 1;
                        info!(cycle = cycles, rendered, "Refresh completed");
                    }
                    _ = &mut shutdown => {
                        info!("Shutdown during refresh");
                        break;
                    }
                }
            }
            _ = &mut shutdown => {
                break;
            }
        }
    }

    cycles
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;

    use crate::data::{FetchError, ForecastSource};
    use crate::dispatch::RecordingRenderer;
    use crate::fetcher::SnapshotFetcher;
    use crate::store::SqliteStore;

    struct Unreachable;

    #[async_trait]
    impl ForecastSource for Unreachable {
        async fn fetch(&self, _url: &str) -> Result<String, FetchError> {
            Err(FetchError::Status(503))
        }
    }

    fn test_app() -> App<SqliteStore, RecordingRenderer> {
        let fetcher = SnapshotFetcher::new("http://forecast.test", Arc::new(Unreachable), None);
        App::new(SqliteStore::in_memory(), fetcher, RecordingRenderer::default())
    }

    #[test]
    fn test_refresh_config_default() {
        let config = RefreshConfig::default();
        assert_eq!(config.interval, Duration::from_secs(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_refreshes_on_interval_until_shutdown() {
        let mut app = test_app();
        app.start().await;

        let config = RefreshConfig {
            interval: Duration::from_secs(60),
        };
        let cycles = run(&mut app, config, tokio::time::sleep(Duration::from_secs(150))).await;

        assert_eq!(cycles, 2);
    }

    /// Live endpoint that never answers
    struct Hanging;

    #[async_trait]
    impl ForecastSource for Hanging {
        async fn fetch(&self, _url: &str) -> Result<String, FetchError> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_interrupts_refresh_in_flight() {
        let fetcher = SnapshotFetcher::new("http://forecast.test", Arc::new(Hanging), None);
        let mut app = App::new(SqliteStore::in_memory(), fetcher, RecordingRenderer::default());
        app.start().await;

        let config = RefreshConfig {
            interval: Duration::from_secs(60),
        };
        let started = tokio::time::Instant::now();
        let cycles = run(&mut app, config, tokio::time::sleep(Duration::from_secs(90))).await;

        assert_eq!(cycles, 0);
        assert!(started.elapsed() < Duration::from_secs(120));
    }

    #[tokio::test]
    async fn test_run_stops_immediately_on_ready_shutdown() {
        let mut app = test_app();
        let cycles = run(&mut app, RefreshConfig::default(), async {}).await;
        assert_eq!(cycles, 0);
    }
}
