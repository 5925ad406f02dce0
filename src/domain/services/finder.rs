//! Wires the services together the way the result page uses them

use std::sync::Arc;

use crate::domain::models::{FilterSpec, Place, Recommendation, SortPolicy, UserSignals};
use crate::domain::services::assistant::RecommendationAssistant;
use crate::domain::services::preferences::PreferenceStore;
use crate::domain::services::search::{OriginSource, SearchEngine};
use crate::infrastructure::api::{GenerationProvider, PlaceSearchProvider};
use crate::infrastructure::storage::KeyValueStore;
use crate::shared::SearchError;

/// Search, persistence and assistant behind one handle
pub struct RestaurantFinder<P, O, K, G> {
    engine: SearchEngine<P, O>,
    preferences: Arc<PreferenceStore<K>>,
    assistant: RecommendationAssistant<G>,
}

impl<P, O, K, G> RestaurantFinder<P, O, K, G>
where
    P: PlaceSearchProvider,
    O: OriginSource,
    K: KeyValueStore,
    G: GenerationProvider,
{
    pub fn new(
        engine: SearchEngine<P, O>,
        preferences: Arc<PreferenceStore<K>>,
        assistant: RecommendationAssistant<G>,
    ) -> Self {
        Self {
            engine,
            preferences,
            assistant,
        }
    }

    pub fn engine(&self) -> &SearchEngine<P, O> {
        &self.engine
    }

    pub fn preferences(&self) -> &PreferenceStore<K> {
        &self.preferences
    }

    pub fn assistant(&self) -> &RecommendationAssistant<G> {
        &self.assistant
    }

    /// Filters to pre-populate the form with
    pub fn initial_filters(&self) -> FilterSpec {
        self.preferences.load_preferences().unwrap_or_default()
    }

    /// Run a search and record it: the filters become the preference
    /// snapshot and a history entry is added once results arrive.
    pub async fn search(&self, filters: &FilterSpec) -> Result<Vec<Place>, SearchError> {
        self.search_with_policy(filters, SortPolicy::Relevance).await
    }

    pub async fn search_with_policy(
        &self,
        filters: &FilterSpec,
        policy: SortPolicy,
    ) -> Result<Vec<Place>, SearchError> {
        self.preferences.save_preferences(filters);
        let results = self.engine.search_with_policy(filters, policy).await?;
        self.preferences.save_search(filters, results.len());
        Ok(results)
    }

    /// Favorites and recent history as assistant input
    pub fn user_signals(&self) -> UserSignals {
        UserSignals {
            favorites: self.preferences.favorites(),
            history: self.preferences.get_history(self.preferences.history_capacity()),
        }
    }

    pub async fn recommend(&self, places: &[Place]) -> Vec<Recommendation> {
        self.assistant.recommend(places, &self.user_signals()).await
    }

    /// Parse a spoken command and run the resulting search
    pub async fn voice_search(
        &self,
        transcript: &str,
    ) -> Result<(FilterSpec, Vec<Place>), SearchError> {
        let filters = self.assistant.parse_voice_command(transcript).await;
        let results = self.search(&filters).await?;
        Ok((filters, results))
    }
}
