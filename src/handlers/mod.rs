//! JSON proxy in front of the place and generation providers
//!
//! Provider API keys stay on the server; the browser build talks to these
//! routes through `infrastructure::api::ProxyClient`.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};

use crate::config::{AppConfig, SearchConfig, ServerConfig};
use crate::domain::models::Coordinate;
use crate::infrastructure::api::{
    ApiErrorBody, GeminiClient, GenerationProvider, GooglePlacesClient, PlaceDetailProvider,
    PlaceSearchProvider, ProxyHealth,
};
use crate::infrastructure::cache::DetailsCache;
use crate::shared::ProviderError;

pub mod generate;
pub mod places;
pub mod search;

pub use generate::{GENERATE_BODY_LIMIT, generate_handler};
pub use places::{nearby_handler, photo_handler, place_details_handler};
pub use search::search_handler;

/// Shared state for every proxy route
#[derive(Clone)]
pub struct ProxyState {
    pub places: Arc<dyn PlaceSearchProvider>,
    pub details: Arc<dyn PlaceDetailProvider>,
    /// `None` when no usable generation key is configured
    pub generator: Option<Arc<dyn GenerationProvider>>,
    pub cache: Arc<DetailsCache>,
    pub search: SearchConfig,
    pub default_center: Coordinate,
}

impl ProxyState {
    pub fn new(
        places: Arc<dyn PlaceSearchProvider>,
        details: Arc<dyn PlaceDetailProvider>,
        generator: Option<Arc<dyn GenerationProvider>>,
        app: &AppConfig,
    ) -> Self {
        Self {
            places,
            details,
            generator,
            cache: Arc::new(DetailsCache::default()),
            search: app.search.clone(),
            default_center: app.default_center,
        }
    }

    /// Build the real provider clients from server configuration
    pub fn from_config(server: &ServerConfig, app: &AppConfig) -> Self {
        let places = Arc::new(GooglePlacesClient::new(
            server.places_api_key.clone(),
            server.language.clone(),
        ));
        let generator = server.generation_api_key.as_ref().map(|key| {
            Arc::new(GeminiClient::new(key.clone(), server.generation_model.clone()))
                as Arc<dyn GenerationProvider>
        });

        let mut app = app.clone();
        app.search.language = server.language.clone();

        Self::new(places.clone(), places, generator, &app)
    }
}

/// Error response: status code plus `{error, status}` body
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ApiErrorBody,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            status,
            body: ApiErrorBody {
                error: error.into(),
                status: None,
            },
        }
    }
}

impl From<ProviderError> for ApiError {
    fn from(error: ProviderError) -> Self {
        Self {
            status: StatusCode::BAD_GATEWAY,
            body: ApiErrorBody {
                error: error.to_string(),
                status: error.status().map(str::to_string),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// GET /api/health
pub async fn health_handler(State(state): State<ProxyState>) -> Json<ProxyHealth> {
    Json(ProxyHealth {
        status: "ok".to_string(),
        assistant: state.generator.is_some(),
    })
}

/// All proxy routes with state attached
pub fn build_router(state: ProxyState) -> Router {
    // NOTE: Axum 0.8 uses {param} syntax instead of :param
    Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/places/nearby", post(nearby_handler))
        .route("/api/places/{place_id}", get(place_details_handler))
        .route("/api/photos/{photo_ref}", get(photo_handler))
        .route("/api/search", post(search_handler))
        .route(
            "/api/generate",
            post(generate_handler).layer(DefaultBodyLimit::max(GENERATE_BODY_LIMIT)),
        )
        .with_state(state)
}

#[cfg(test)]
pub(crate) mod test_support {
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use serde::de::DeserializeOwned;
    use tower::ServiceExt;

    use super::*;
    use crate::testing::{ScriptedGenerator, ScriptedPlaces};

    pub fn state(places: ScriptedPlaces, generator: Option<ScriptedGenerator>) -> ProxyState {
        ProxyState::new(
            Arc::new(places.clone()),
            Arc::new(places),
            generator.map(|g| Arc::new(g) as Arc<dyn GenerationProvider>),
            &AppConfig::default(),
        )
    }

    pub async fn send(router: Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    pub fn json_post(uri: &str, body: &serde_json::Value) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    pub fn decode<T: DeserializeOwned>(body: &[u8]) -> T {
        serde_json::from_slice(body).unwrap()
    }
}
