use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;

use super::{ApiError, ProxyState};
use crate::domain::models::{Coordinate, FilterSpec, Place, SortPolicy};
use crate::domain::services::search::{FixedOrigin, SearchEngine};
use crate::shared::SearchError;
use crate::shared::logging::log_proxy_request;

/// Body of `POST /api/search`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    #[serde(default)]
    pub filters: FilterSpec,
    /// Falls back to the configured default centre
    #[serde(default)]
    pub origin: Option<Coordinate>,
    #[serde(default)]
    pub sort: Option<SortPolicy>,
}

impl From<SearchError> for ApiError {
    fn from(error: SearchError) -> Self {
        match error {
            SearchError::Provider(e) => ApiError::from(e),
            SearchError::Superseded => ApiError::new(StatusCode::CONFLICT, error.to_string()),
        }
    }
}

/// POST /api/search
/// Full filter, rank and truncate pipeline run on the server
pub async fn search_handler(
    State(state): State<ProxyState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<Vec<Place>>, ApiError> {
    log_proxy_request("search", false);

    let origin = request.origin.unwrap_or(state.default_center);
    let engine = SearchEngine::new(
        Arc::clone(&state.places),
        FixedOrigin(origin),
        state.search.clone(),
    );

    let places = engine
        .search_with_policy(&request.filters, request.sort.unwrap_or_default())
        .await?;

    Ok(Json(places))
}

#[cfg(test)]
mod tests {
    use super::super::build_router;
    use super::super::test_support::{decode, json_post, send, state};
    use super::*;
    use crate::shared::ProviderError;
    use crate::testing::{ScriptedPlaces, raw_place};

    fn candidates() -> Vec<crate::domain::models::RawPlace> {
        vec![
            raw_place("far", "Far Diner", &["restaurant"], Some(2), Some(4.8), (0.02, 0.0), None),
            raw_place("near", "Near Cafe", &["cafe"], Some(1), Some(4.2), (0.001, 0.0), None),
            raw_place("low", "Low Bistro", &["restaurant"], Some(2), Some(2.5), (0.002, 0.0), None),
        ]
    }

    #[tokio::test]
    async fn test_search_runs_pipeline_with_sort() {
        let places = ScriptedPlaces::new(vec![Ok(candidates())]);
        let router = build_router(state(places.clone(), None));

        let body = serde_json::json!({
            "filters": {"distance": "3km", "minRating": 4.0},
            "sort": "distance"
        });
        let (status, body) = send(router, json_post("/api/search", &body)).await;
        assert_eq!(status, StatusCode::OK);

        let results: Vec<Place> = decode(&body);
        let ids: Vec<_> = results.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["near", "far"]);
        assert_eq!(places.last_request().unwrap().radius_m, 3000);
    }

    #[tokio::test]
    async fn test_search_uses_given_origin() {
        let places = ScriptedPlaces::new(vec![Ok(Vec::new())]);
        let router = build_router(state(places.clone(), None));

        let body = serde_json::json!({"origin": {"lat": 35.0, "lng": 139.0}});
        let (status, _) = send(router, json_post("/api/search", &body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(places.last_request().unwrap().origin, Coordinate::new(35.0, 139.0));
    }

    #[tokio::test]
    async fn test_search_provider_failure_is_bad_gateway() {
        let error = ProviderError::bad_status("OVER_QUERY_LIMIT", "");
        let places = ScriptedPlaces::new(vec![Err(error)]);
        let router = build_router(state(places, None));

        let (status, body) = send(router, json_post("/api/search", &serde_json::json!({}))).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        let json: serde_json::Value = decode(&body);
        assert_eq!(json["status"], "OVER_QUERY_LIMIT");
    }

    #[test]
    fn test_superseded_maps_to_conflict() {
        assert_eq!(ApiError::from(SearchError::Superseded).status, StatusCode::CONFLICT);
    }
}
