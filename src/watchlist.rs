//! Watch-list manager
//!
//! Owns the in-memory, ordered list of watched cities and mirrors every
//! change into the durable store. The in-memory list is the source of truth
//! for the running session; the store only decides what survives a restart.
//! Store failures never escape this module: the first one switches the
//! manager to memory-only mode for the rest of the session.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::data::{default_city, City};
use crate::store::{KvStore, StoreError};

/// Fixed key under which the serialized list is stored
pub const WATCH_LIST_KEY: &str = "selectedCities";

/// Errors surfaced to the user by watch-list mutations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WatchListError {
    /// The city is already on the watch list
    #[error("{0} is already on the watch list")]
    DuplicateKey(String),
}

/// Whether a mutation reached the durable store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commit {
    /// The change is persisted
    Durable,
    /// The change holds for this session only
    Ephemeral,
    /// Nothing changed, nothing was written
    Unchanged,
}

/// Where the list returned by `load` came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Read back from the store
    Persisted,
    /// The store held no list and the default city was seeded. Whether the
    /// seed reached the store is reported by `is_durable`.
    Seeded,
    /// The store is unavailable; the list lives in memory only
    Memory,
}

/// Result of `load`
#[derive(Debug, Clone, PartialEq)]
pub struct Loaded {
    pub cities: Vec<City>,
    pub origin: Origin,
}

/// Owns the watch list and keeps the store in step with it
pub struct WatchListManager<S> {
    store: S,
    cities: Vec<City>,
    durable: bool,
    load_attempted: bool,
}

impl<S: KvStore> WatchListManager<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            cities: Vec::new(),
            durable: true,
            load_attempted: false,
        }
    }

    /// Current in-memory list, in display order
    pub fn cities(&self) -> &[City] {
        &self.cities
    }

    /// Whether mutations are still being persisted
    pub fn is_durable(&self) -> bool {
        self.durable
    }

    /// Looks up a watched city by key
    pub fn get(&self, key: &str) -> Option<&City> {
        self.cities.iter().find(|city| city.key == key)
    }

    /// Whether `key` is on the list (exact, case-sensitive)
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Reads the persisted list, seeding the default city if none is stored
    ///
    /// Calling this again without a mutation in between returns the same
    /// list. Once the store has failed, the in-memory list is returned as is.
    pub async fn load(&mut self) -> Loaded {
        self.load_attempted = true;
        if !self.durable {
            return self.loaded(Origin::Memory);
        }

        match self.store.get(WATCH_LIST_KEY).await {
            Ok(Some(bytes)) => match serde_json::from_slice::<Vec<City>>(&bytes) {
                Ok(cities) => {
                    debug!(count = cities.len(), "Watch list restored");
                    self.cities = cities;
                    self.loaded(Origin::Persisted)
                }
                Err(e) => {
                    // Leave the unreadable record alone rather than overwrite it
                    warn!(error = %e, "Stored watch list is unreadable, keeping changes in memory");
                    self.durable = false;
                    self.cities.clear();
                    self.loaded(Origin::Memory)
                }
            },
            Ok(None) => {
                let seed = default_city();
                info!(key = %seed.key, "No stored watch list, seeding default city");
                self.cities = vec![seed];
                self.persist().await;
                self.loaded(Origin::Seeded)
            }
            Err(e) => {
                self.degrade(&e);
                self.cities.clear();
                self.loaded(Origin::Memory)
            }
        }
    }

    /// Appends a city, unless its key is already watched
    pub async fn add(&mut self, city: City) -> Result<Commit, WatchListError> {
        self.ensure_loaded().await;
        if self.contains(&city.key) {
            return Err(WatchListError::DuplicateKey(city.key));
        }

        info!(key = %city.key, label = %city.label, "Adding city");
        self.cities.push(city);
        Ok(self.persist().await)
    }

    /// Removes the city with `key`. Absent keys are a no-op.
    pub async fn remove(&mut self, key: &str) -> Commit {
        self.ensure_loaded().await;
        let Some(index) = self.cities.iter().position(|city| city.key == key) else {
            debug!(%key, "Remove of unwatched city ignored");
            return Commit::Unchanged;
        };

        info!(%key, "Removing city");
        self.cities.remove(index);
        self.persist().await
    }

    /// Mutations apply to the stored list, so it is read first if nobody has yet
    async fn ensure_loaded(&mut self) {
        if !self.load_attempted {
            self.load().await;
        }
    }

    fn loaded(&self, origin: Origin) -> Loaded {
        Loaded {
            cities: self.cities.clone(),
            origin,
        }
    }

    /// Writes the current list to the store, awaiting the write before returning
    async fn persist(&mut self) -> Commit {
        if !self.durable {
            return Commit::Ephemeral;
        }

        let bytes = match serde_json::to_vec(&self.cities) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(error = %e, "Failed to serialize watch list");
                return Commit::Ephemeral;
            }
        };

        match self.store.put(WATCH_LIST_KEY, &bytes).await {
            Ok(()) => Commit::Durable,
            Err(e) => {
                self.degrade(&e);
                Commit::Ephemeral
            }
        }
    }

    fn degrade(&mut self, error: &StoreError) {
        warn!(error = %error, "Watch-list store unavailable, changes will not be saved");
        self.durable = false;
    }
}
