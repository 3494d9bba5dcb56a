//! Cache coordinator for city-scoped route and station lists

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::InFlight;
use crate::data::{ApiResult, Route, Station, TransitApi};
use crate::store::{keys, Settings, StoreResult};

/// A cached list together with the city it belongs to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    /// City the items were fetched for; the entry is only valid for this city
    pub city_id: i64,
    pub items: Vec<T>,
    /// When the items were fetched
    pub cached_at: DateTime<Utc>,
}

/// The lists held by the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKind {
    Routes,
    Stations,
}

impl CacheKind {
    fn key(self) -> &'static str {
        match self {
            CacheKind::Routes => keys::CACHED_ROUTES,
            CacheKind::Stations => keys::CACHED_STATIONS,
        }
    }
}

/// Decides between the local cache and the network for routes and stations
///
/// Each list is a single-slot cache: it holds the items of exactly one city
/// and is replaced wholesale when another city is loaded. A failed fetch
/// leaves the stored entry untouched.
pub struct CacheCoordinator {
    api: Arc<dyn TransitApi>,
    settings: Settings,
    route_fetches: InFlight<i64, Vec<Route>>,
    station_fetches: InFlight<i64, Vec<Station>>,
}

impl CacheCoordinator {
    pub fn new(api: Arc<dyn TransitApi>, settings: Settings) -> Self {
        Self {
            api,
            settings,
            route_fetches: InFlight::new(),
            station_fetches: InFlight::new(),
        }
    }

    /// Returns the routes of `city_id`, from cache when valid
    pub async fn routes(&self, city_id: i64) -> ApiResult<Vec<Route>> {
        if let Some(routes) = self.cached(CacheKind::Routes, city_id) {
            return Ok(routes);
        }

        let api = Arc::clone(&self.api);
        let fetch = async move { api.routes(city_id).await };
        self.route_fetches
            .run(city_id, self.fetch_and_store(CacheKind::Routes, city_id, fetch))
            .await
    }

    /// Returns the stations of `city_id`, from cache when valid
    pub async fn stations(&self, city_id: i64) -> ApiResult<Vec<Station>> {
        if let Some(stations) = self.cached(CacheKind::Stations, city_id) {
            return Ok(stations);
        }

        let api = Arc::clone(&self.api);
        let fetch = async move { api.stations(city_id).await };
        self.station_fetches
            .run(city_id, self.fetch_and_store(CacheKind::Stations, city_id, fetch))
            .await
    }

    /// Persists the selected city, invalidating both lists when it changes
    pub fn select_city(&self, city_id: i64) -> StoreResult<()> {
        if self.settings.selected_city_id() != Some(city_id) {
            info!(city_id, "selected city changed, invalidating cache");
            self.invalidate()?;
        }
        self.settings.set_selected_city_id(city_id)
    }

    /// Drops both cached lists and the city marker
    pub fn invalidate(&self) -> StoreResult<()> {
        let store = self.settings.store();
        store.remove(keys::CACHED_ROUTES)?;
        store.remove(keys::CACHED_STATIONS)?;
        store.remove(keys::CACHED_CITY_ID)
    }

    /// City of the most recent successful write-through
    pub fn city_marker(&self) -> Option<i64> {
        self.settings.store().read(keys::CACHED_CITY_ID)
    }

    /// The stored route entry, whichever city it belongs to
    pub fn cached_routes_entry(&self) -> Option<CacheEntry<Route>> {
        self.settings.store().read(keys::CACHED_ROUTES)
    }

    /// The stored station entry, whichever city it belongs to
    pub fn cached_stations_entry(&self) -> Option<CacheEntry<Station>> {
        self.settings.store().read(keys::CACHED_STATIONS)
    }

    /// Returns the stored items of `kind` if they belong to `city_id`
    ///
    /// Empty lists are treated as a miss so an empty response is re-fetched.
    fn cached<T: DeserializeOwned>(&self, kind: CacheKind, city_id: i64) -> Option<Vec<T>> {
        let entry: CacheEntry<T> = self.settings.store().read(kind.key())?;
        if entry.city_id != city_id || entry.items.is_empty() {
            debug!(?kind, city_id, cached_city = entry.city_id, "cache miss");
            return None;
        }
        debug!(?kind, city_id, count = entry.items.len(), "cache hit");
        Some(entry.items)
    }

    /// Wraps `fetch` so a successful result is written to the store
    fn fetch_and_store<T, F>(
        &self,
        kind: CacheKind,
        city_id: i64,
        fetch: F,
    ) -> impl Future<Output = ApiResult<Vec<T>>> + Send + 'static
    where
        T: Serialize + Send + 'static,
        F: Future<Output = ApiResult<Vec<T>>> + Send + 'static,
    {
        let settings = self.settings.clone();
        async move {
            let items = fetch.await?;
            info!(?kind, city_id, count = items.len(), "fetched from network");

            let entry = CacheEntry {
                city_id,
                items,
                cached_at: Utc::now(),
            };
            let store = settings.store();
            if let Err(e) = store
                .write(kind.key(), &entry)
                .and_then(|()| store.write(keys::CACHED_CITY_ID, &city_id))
            {
                warn!(?kind, city_id, error = %e, "failed to write cache");
            }
            Ok(entry.items)
        }
    }
}
