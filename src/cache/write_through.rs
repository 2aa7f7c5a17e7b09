//! Forecast source decorator that records successful responses
//!
//! Sits between the fetcher and the network the way an intercepting offline
//! proxy would: every 200 body passes through unchanged and is also stored in
//! the response cache under its request URL.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::ResponseCache;
use crate::data::{FetchError, ForecastSource};

/// Wraps a `ForecastSource` and writes every successful body to a `ResponseCache`
pub struct WriteThrough {
    inner: Arc<dyn ForecastSource>,
    cache: Arc<dyn ResponseCache>,
}

impl WriteThrough {
    pub fn new(inner: Arc<dyn ForecastSource>, cache: Arc<dyn ResponseCache>) -> Self {
        Self { inner, cache }
    }
}

#[async_trait]
impl ForecastSource for WriteThrough {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let body = self.inner.fetch(url).await?;

        // A failed cache write only costs offline availability
        match self.cache.store(url, &body).await {
            Ok(()) => debug!(%url, "Stored response in cache"),
            Err(e) => warn!(%url, error = %e, "Failed to store response in cache"),
        }

        Ok(body)
    }
}
