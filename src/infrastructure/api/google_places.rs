//! Google Places web service client (nearby search, details, photos)

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{NearbyRequest, PlaceDetailProvider, PlaceSearchProvider};
use crate::domain::models::{
    Coordinate, OpeningHours, PlaceDetails, PlacePhoto, PlaceReview, RawPlace,
};
use crate::shared::ProviderError;

const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api/place";

/// Places client holding the server-side API key
#[derive(Clone)]
pub struct GooglePlacesClient {
    client: Client,
    api_key: String,
    language: String,
    base_url: String,
}

impl GooglePlacesClient {
    pub fn new(api_key: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            language: language.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<T, ProviderError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let response = self
            .client
            .get(&url)
            .query(query)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| ProviderError::Unreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::bad_status(
                status.as_u16().to_string(),
                status.canonical_reason().unwrap_or("request failed"),
            ));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))
    }
}

// Wire format of the Places web service

#[derive(Debug, Deserialize)]
struct WireLatLng {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Deserialize)]
struct WireGeometry {
    location: WireLatLng,
}

#[derive(Debug, Deserialize)]
struct WirePhoto {
    photo_reference: String,
}

#[derive(Debug, Default, Deserialize)]
struct WireOpeningHours {
    #[serde(default)]
    open_now: Option<bool>,
    #[serde(default)]
    weekday_text: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct WireNearbyPlace {
    place_id: String,
    name: String,
    #[serde(default)]
    types: Vec<String>,
    #[serde(default)]
    price_level: Option<u8>,
    geometry: WireGeometry,
    #[serde(default)]
    vicinity: Option<String>,
    #[serde(default)]
    rating: Option<f64>,
    #[serde(default)]
    user_ratings_total: Option<u32>,
    #[serde(default)]
    opening_hours: Option<WireOpeningHours>,
    #[serde(default)]
    photos: Vec<WirePhoto>,
}

#[derive(Debug, Deserialize)]
struct NearbyResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    results: Vec<WireNearbyPlace>,
}

#[derive(Debug, Deserialize)]
struct WireReview {
    author_name: String,
    #[serde(default)]
    rating: Option<f64>,
    #[serde(default)]
    text: String,
    #[serde(default)]
    relative_time_description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireDetails {
    #[serde(default)]
    name: String,
    #[serde(default)]
    formatted_address: Option<String>,
    #[serde(default)]
    formatted_phone_number: Option<String>,
    #[serde(default)]
    website: Option<String>,
    #[serde(default)]
    opening_hours: Option<WireOpeningHours>,
    #[serde(default)]
    rating: Option<f64>,
    #[serde(default)]
    user_ratings_total: Option<u32>,
    #[serde(default)]
    price_level: Option<u8>,
    #[serde(default)]
    reviews: Vec<WireReview>,
    #[serde(default)]
    photos: Vec<WirePhoto>,
    #[serde(default)]
    geometry: Option<WireGeometry>,
}

#[derive(Debug, Deserialize)]
struct DetailsResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    result: Option<WireDetails>,
}

impl From<WireNearbyPlace> for RawPlace {
    fn from(place: WireNearbyPlace) -> Self {
        RawPlace {
            id: place.place_id,
            name: place.name,
            category_tags: place.types,
            price_level: place.price_level,
            coordinate: Coordinate::new(place.geometry.location.lat, place.geometry.location.lng),
            address: place.vicinity.unwrap_or_default(),
            rating: place.rating,
            review_count: place.user_ratings_total,
            open_now: place.opening_hours.and_then(|h| h.open_now),
            photo_refs: place.photos.into_iter().map(|p| p.photo_reference).collect(),
        }
    }
}

fn nearby_places(response: NearbyResponse) -> Result<Vec<RawPlace>, ProviderError> {
    match response.status.as_str() {
        "OK" => Ok(response.results.into_iter().map(RawPlace::from).collect()),
        "ZERO_RESULTS" => Ok(Vec::new()),
        _ => Err(ProviderError::bad_status(
            response.status,
            response.error_message.unwrap_or_default(),
        )),
    }
}

fn place_details(place_id: &str, response: DetailsResponse) -> Result<PlaceDetails, ProviderError> {
    if response.status != "OK" {
        return Err(ProviderError::bad_status(
            response.status,
            response.error_message.unwrap_or_default(),
        ));
    }
    let result = response
        .result
        .ok_or_else(|| ProviderError::InvalidResponse("details response without result".into()))?;

    Ok(PlaceDetails {
        id: place_id.to_string(),
        name: result.name,
        address: result.formatted_address,
        phone: result.formatted_phone_number,
        website: result.website,
        opening_hours: result.opening_hours.map(|h| OpeningHours {
            open_now: h.open_now,
            weekday_text: h.weekday_text,
        }),
        rating: result.rating,
        review_count: result.user_ratings_total,
        price_level: result.price_level,
        reviews: result
            .reviews
            .into_iter()
            .map(|r| PlaceReview {
                author_name: r.author_name,
                rating: r.rating,
                text: r.text,
                relative_time: r.relative_time_description,
            })
            .collect(),
        photo_refs: result.photos.into_iter().map(|p| p.photo_reference).collect(),
        coordinate: result
            .geometry
            .map(|g| Coordinate::new(g.location.lat, g.location.lng)),
    })
}

#[async_trait]
impl PlaceSearchProvider for GooglePlacesClient {
    async fn nearby(&self, request: &NearbyRequest) -> Result<Vec<RawPlace>, ProviderError> {
        let mut query = vec![
            ("location", request.origin.to_query_value()),
            ("radius", request.radius_m.to_string()),
            ("type", request.category.clone()),
            ("language", request.language.clone()),
        ];
        if request.open_now_only {
            query.push(("opennow", "true".to_string()));
        }

        let response: NearbyResponse = self.get_json("nearbysearch/json", &query).await?;
        nearby_places(response)
    }
}

#[async_trait]
impl PlaceDetailProvider for GooglePlacesClient {
    async fn details(
        &self,
        place_id: &str,
        fields: &[&str],
    ) -> Result<PlaceDetails, ProviderError> {
        let query = [
            ("place_id", place_id.to_string()),
            ("fields", fields.join(",")),
            ("language", self.language.clone()),
        ];
        let response: DetailsResponse = self.get_json("details/json", &query).await?;
        place_details(place_id, response)
    }

    async fn photo(&self, photo_ref: &str, max_width: u32) -> Result<PlacePhoto, ProviderError> {
        let url = format!("{}/photo", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("maxwidth", max_width.to_string()),
                ("photo_reference", photo_ref.to_string()),
                ("key", self.api_key.clone()),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::Unreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::bad_status(
                status.as_u16().to_string(),
                "photo request failed",
            ));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("image/jpeg")
            .to_string();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        Ok(PlacePhoto {
            content_type,
            bytes: bytes.to_vec(),
        })
    }
}
