//! Application wiring for weatherwatch
//!
//! `App` ties the watch list, the snapshot fetcher and the render dispatcher
//! together and implements the user-facing flows: startup, adding and
//! removing a city, and refreshing everything on screen.

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::data::{City, Snapshot};
use crate::dispatch::{Dispatcher, Renderer};
use crate::fetcher::SnapshotFetcher;
use crate::store::KvStore;
use crate::watchlist::{Commit, Loaded, Origin, WatchListError, WatchListManager};

/// Main application struct
pub struct App<S, R> {
    /// The watched cities and their persistence
    watch_list: WatchListManager<S>,
    /// Cache-then-network snapshot source
    fetcher: SnapshotFetcher,
    /// Hands snapshots to the presentation layer
    dispatcher: Dispatcher<R>,
}

impl<S: KvStore, R: Renderer> App<S, R> {
    pub fn new(store: S, fetcher: SnapshotFetcher, renderer: R) -> Self {
        Self {
            watch_list: WatchListManager::new(store),
            fetcher,
            dispatcher: Dispatcher::new(renderer),
        }
    }

    pub fn watch_list(&self) -> &WatchListManager<S> {
        &self.watch_list
    }

    pub fn renderer(&self) -> &R {
        self.dispatcher.renderer()
    }

    pub fn into_renderer(self) -> R {
        self.dispatcher.into_renderer()
    }

    /// Loads the watch list without fetching anything
    pub async fn load(&mut self) -> Loaded {
        self.watch_list.load().await
    }

    /// Loads the watch list and puts a card on screen for every city
    ///
    /// On first run the seeded city is shown with the bundled sample
    /// forecast and no request is made. Otherwise every restored city is
    /// fetched, and this returns once all of those fetches have finished.
    pub async fn start(&mut self) -> Loaded {
        let loaded = self.load().await;

        match loaded.origin {
            Origin::Seeded => {
                debug!("Showing sample forecast for seeded city");
                self.dispatcher
                    .renderer_mut()
                    .render_snapshot(Snapshot::placeholder());
            }
            Origin::Persisted | Origin::Memory => {
                let rendered = self.fetch_cities(&loaded.cities).await;
                info!(cities = loaded.cities.len(), rendered, "Startup fetch finished");
            }
        }

        loaded
    }

    /// Adds `city` to the watch list and fetches its forecast
    ///
    /// A duplicate key is rejected before anything is fetched.
    pub async fn add_city(&mut self, city: City) -> Result<Commit, WatchListError> {
        let commit = self.watch_list.add(city.clone()).await?;
        self.fetch_cities(std::slice::from_ref(&city)).await;
        Ok(commit)
    }

    /// Drops the card for `key`, then removes it from the watch list
    pub async fn remove_city(&mut self, key: &str) -> Commit {
        self.dispatcher.renderer_mut().discard(key);
        self.watch_list.remove(key).await
    }

    /// Fetches every city that currently has a card on screen
    ///
    /// Labels come from the watch list; a displayed key that is no longer
    /// watched is labelled with its key. Returns the number of snapshots
    /// rendered.
    pub async fn refresh_all(&mut self) -> usize {
        let cities: Vec<City> = self
            .dispatcher
            .renderer()
            .displayed_keys()
            .into_iter()
            .map(|key| match self.watch_list.get(&key) {
                Some(city) => city.clone(),
                None => City::new(key.clone(), key),
            })
            .collect();

        debug!(count = cities.len(), "Refreshing displayed cities");
        self.fetch_cities(&cities).await
    }

    /// Starts a fetch per city on one channel and renders until all finish
    async fn fetch_cities(&mut self, cities: &[City]) -> usize {
        let (tx, rx) = mpsc::unbounded_channel();
        for city in cities {
            self.fetcher.fetch_into(&city.key, &city.label, tx.clone());
        }
        drop(tx);
        self.dispatcher.drain(rx).await
    }
}
