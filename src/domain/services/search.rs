//! Search pipeline: origin, provider query, filter, rank, truncate

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;

use crate::config::SearchConfig;
use crate::domain::models::{Coordinate, FilterSpec, Place, SortPolicy, TimeSlot};
use crate::domain::services::location::{LocationProvider, distance_km};
use crate::domain::services::ranking::{
    apply_filters, radius_meters, sort_places, truncate_results,
};
use crate::infrastructure::MaybeSend;
use crate::infrastructure::api::{NearbyRequest, PlaceSearchProvider};
use crate::infrastructure::sensor::LocationSensor;
use crate::infrastructure::storage::KeyValueStore;
use crate::shared::logging::{
    log_location_fallback, log_provider_error, log_search_result, log_search_start,
    log_search_superseded,
};
use crate::shared::{LocationError, SearchError};

/// Where a search is centred
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait OriginSource: MaybeSend {
    async fn origin(&self) -> Result<Coordinate, LocationError>;

    /// Used when [`OriginSource::origin`] fails
    fn fallback(&self) -> Coordinate;
}

/// A fixed, already known origin
#[derive(Debug, Clone, Copy)]
pub struct FixedOrigin(pub Coordinate);

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl OriginSource for FixedOrigin {
    async fn origin(&self) -> Result<Coordinate, LocationError> {
        Ok(self.0)
    }

    fn fallback(&self) -> Coordinate {
        self.0
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl<S: LocationSensor, K: KeyValueStore> OriginSource for LocationProvider<S, K> {
    async fn origin(&self) -> Result<Coordinate, LocationError> {
        self.resolve().await
    }

    fn fallback(&self) -> Coordinate {
        self.default_coordinate()
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl<T: OriginSource + ?Sized> OriginSource for Arc<T> {
    async fn origin(&self) -> Result<Coordinate, LocationError> {
        (**self).origin().await
    }

    fn fallback(&self) -> Coordinate {
        (**self).fallback()
    }
}

/// Runs searches against a place provider.
///
/// Each call takes a new generation token; a call whose token is no longer the
/// latest when the provider answers returns [`SearchError::Superseded`].
pub struct SearchEngine<P, O> {
    provider: P,
    origin: O,
    config: SearchConfig,
    generation: AtomicU64,
}

impl<P: PlaceSearchProvider, O: OriginSource> SearchEngine<P, O> {
    pub fn new(provider: P, origin: O, config: SearchConfig) -> Self {
        Self {
            provider,
            origin,
            config,
            generation: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Search with the default relevance ordering
    pub async fn search(&self, filters: &FilterSpec) -> Result<Vec<Place>, SearchError> {
        self.search_with_policy(filters, SortPolicy::Relevance).await
    }

    pub async fn search_with_policy(
        &self,
        filters: &FilterSpec,
        policy: SortPolicy,
    ) -> Result<Vec<Place>, SearchError> {
        let token = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let filters = filters.clone().normalized();
        let radius_m = radius_meters(filters.distance_band);
        log_search_start(token, &filters, radius_m);

        let origin = match self.origin.origin().await {
            Ok(origin) => origin,
            Err(e) => {
                let fallback = self.origin.fallback();
                log_location_fallback(&e.to_string(), fallback);
                fallback
            }
        };
        self.ensure_latest(token)?;

        let request = NearbyRequest {
            origin,
            radius_m,
            category: self.config.category.clone(),
            language: self.config.language.clone(),
            open_now_only: filters.time_slot == TimeSlot::Open,
        };

        let raw = self.provider.nearby(&request).await.map_err(|e| {
            log_provider_error("places", &e.to_string());
            SearchError::Provider(e)
        })?;
        self.ensure_latest(token)?;

        let fetched = raw.len();
        let places: Vec<Place> = raw
            .into_iter()
            .map(|r| {
                let distance = distance_km(origin, r.coordinate);
                Place::from_raw(r, distance)
            })
            .collect();

        let filtered = apply_filters(places, &filters);
        let filtered_count = filtered.len();
        let sorted = sort_places(filtered, policy, &self.config.weights);
        let results = truncate_results(sorted, self.config.min_results, self.config.max_results);

        log_search_result(token, fetched, filtered_count, results.len());
        Ok(results)
    }

    /// Re-order an existing result view without touching the provider
    pub fn sort(&self, places: Vec<Place>, policy: SortPolicy) -> Vec<Place> {
        sort_places(places, policy, &self.config.weights)
    }

    /// Invalidate every search currently in flight
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    fn ensure_latest(&self, token: u64) -> Result<(), SearchError> {
        let latest = self.generation.load(Ordering::SeqCst);
        if latest != token {
            log_search_superseded(token, latest);
            return Err(SearchError::Superseded);
        }
        Ok(())
    }
}
