//! Browser wiring: localStorage, the Geolocation API and the proxy server

use std::sync::Arc;

use crate::config::AppConfig;
use crate::domain::services::{
    LocationProvider, PreferenceStore, RecommendationAssistant, RestaurantFinder, SearchEngine,
};
use crate::infrastructure::api::{ProxyClient, ProxyHealth};
use crate::infrastructure::sensor::BrowserGeolocation;
use crate::infrastructure::storage::{KeyValueStore, LocalStorageStore, MemoryStore};

pub type BrowserStore = Arc<dyn KeyValueStore>;
pub type BrowserLocation = LocationProvider<BrowserGeolocation, BrowserStore>;
pub type BrowserFinder =
    RestaurantFinder<ProxyClient, Arc<BrowserLocation>, BrowserStore, ProxyClient>;

/// Everything the result page needs, sharing one preference store
pub struct BrowserServices {
    pub finder: BrowserFinder,
    pub location: Arc<BrowserLocation>,
}

/// localStorage when the browser allows it, otherwise an in-memory store
/// that lasts for the page's lifetime
pub fn open_store() -> BrowserStore {
    match LocalStorageStore::open() {
        Ok(store) => Arc::new(store),
        Err(e) => {
            tracing::warn!("localStorage unavailable, preferences will not persist: {}", e);
            Arc::new(MemoryStore::new())
        }
    }
}

/// Build the services against the proxy at `base_url` (empty for same origin).
/// Asks the proxy once whether it can generate; if not, the assistant runs local-only.
pub async fn browser_services(base_url: &str, config: &AppConfig) -> BrowserServices {
    let client = ProxyClient::new(base_url);
    let health = client.health().await;
    if let Err(e) = &health {
        tracing::warn!("Proxy health check failed: {}", e);
    }
    let generator = ProxyHealth::assistant_enabled(&health).then(|| client.clone());
    if generator.is_none() {
        tracing::info!("Proxy has no generation key, assistant runs local-only");
    }
    let preferences = Arc::new(PreferenceStore::new(open_store(), config.history_capacity));

    let location = Arc::new(LocationProvider::new(
        BrowserGeolocation,
        Arc::clone(&preferences),
        config.fix,
        config.default_center,
    ));

    let finder = RestaurantFinder::new(
        SearchEngine::new(client, Arc::clone(&location), config.search.clone()),
        preferences,
        RecommendationAssistant::new(generator, config.generation),
    );

    BrowserServices { finder, location }
}
