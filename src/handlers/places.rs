use axum::{
    Json,
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use super::{ApiError, ProxyState};
use crate::domain::models::{DETAIL_FIELDS, PlaceDetails, RawPlace};
use crate::domain::services::format::DEFAULT_PHOTO_WIDTH;
use crate::infrastructure::api::NearbyRequest;
use crate::shared::logging::{log_provider_error, log_proxy_request};

/// Largest width the photo endpoint accepts
const MAX_PHOTO_WIDTH: u32 = 1600;

/// POST /api/places/nearby
/// Forward a nearby search to the place provider
pub async fn nearby_handler(
    State(state): State<ProxyState>,
    Json(request): Json<NearbyRequest>,
) -> Result<Json<Vec<RawPlace>>, ApiError> {
    log_proxy_request("places/nearby", false);

    let places = state.places.nearby(&request).await.map_err(|e| {
        log_provider_error("places", &e.to_string());
        ApiError::from(e)
    })?;

    Ok(Json(places))
}

/// GET /api/places/{place_id}
/// Place details, cached for five minutes
pub async fn place_details_handler(
    State(state): State<ProxyState>,
    Path(place_id): Path<String>,
) -> Result<Json<PlaceDetails>, ApiError> {
    if let Some(details) = state.cache.get(&place_id) {
        log_proxy_request("places/details", true);
        return Ok(Json(details));
    }
    log_proxy_request("places/details", false);

    let details = state
        .details
        .details(&place_id, DETAIL_FIELDS)
        .await
        .map_err(|e| {
            tracing::error!(place_id = %place_id, "Failed to get place details: {}", e);
            ApiError::from(e)
        })?;

    state.cache.insert(details.clone());
    Ok(Json(details))
}

#[derive(Debug, Deserialize)]
pub struct PhotoQuery {
    pub maxwidth: Option<u32>,
}

/// GET /api/photos/{photo_ref}?maxwidth=N
/// Stream a place photo through the server
pub async fn photo_handler(
    State(state): State<ProxyState>,
    Path(photo_ref): Path<String>,
    Query(query): Query<PhotoQuery>,
) -> Result<Response, ApiError> {
    log_proxy_request("photos", false);
    let max_width = query
        .maxwidth
        .unwrap_or(DEFAULT_PHOTO_WIDTH)
        .clamp(1, MAX_PHOTO_WIDTH);

    let photo = state
        .details
        .photo(&photo_ref, max_width)
        .await
        .map_err(|e| {
            log_provider_error("photos", &e.to_string());
            ApiError::from(e)
        })?;

    Ok(([(header::CONTENT_TYPE, photo.content_type)], photo.bytes).into_response())
}
