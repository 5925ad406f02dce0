use serde::{Deserialize, Serialize};

use super::coordinate::Coordinate;
use super::filter::{DEFAULT_PRICE_LEVEL, MAX_PRICE_LEVEL, MIN_PRICE_LEVEL};

/// Place record as returned by the place search provider, before normalization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPlace {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category_tags: Vec<String>,
    #[serde(default)]
    pub price_level: Option<u8>,
    pub coordinate: Coordinate,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub review_count: Option<u32>,
    #[serde(default)]
    pub open_now: Option<bool>,
    #[serde(default)]
    pub photo_refs: Vec<String>,
}

/// One normalized search result. Built once per search response and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    pub id: String,
    pub name: String,
    pub category_tags: Vec<String>,
    pub price_level: u8,
    pub coordinate: Coordinate,
    pub address: String,
    pub rating: f64,
    pub review_count: u32,
    pub open_now: Option<bool>,
    pub distance_km: f64,
    pub photo_refs: Vec<String>,
}

impl Place {
    /// Normalize a provider record; `distance_km` is the distance from `origin`.
    pub fn from_raw(raw: RawPlace, distance_km: f64) -> Self {
        let price_level = match raw.price_level {
            Some(level) if (MIN_PRICE_LEVEL..=MAX_PRICE_LEVEL).contains(&level) => level,
            _ => DEFAULT_PRICE_LEVEL,
        };
        let rating = raw
            .rating
            .filter(|r| r.is_finite())
            .map(|r| r.clamp(0.0, 5.0))
            .unwrap_or(0.0);

        Self {
            id: raw.id,
            name: raw.name,
            category_tags: raw.category_tags,
            price_level,
            coordinate: raw.coordinate,
            address: raw.address,
            rating,
            review_count: raw.review_count.unwrap_or(0),
            open_now: raw.open_now,
            distance_km: distance_km.max(0.0),
            photo_refs: raw.photo_refs,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open_now == Some(true)
    }
}

/// Fields requested from the place detail provider
pub const DETAIL_FIELDS: &[&str] = &[
    "name",
    "formatted_address",
    "formatted_phone_number",
    "opening_hours",
    "website",
    "photos",
    "rating",
    "user_ratings_total",
    "price_level",
    "reviews",
    "geometry",
];

/// Opening hours as reported by the detail provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpeningHours {
    #[serde(default)]
    pub open_now: Option<bool>,
    #[serde(default)]
    pub weekday_text: Vec<String>,
}

/// A single user review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceReview {
    pub author_name: String,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub relative_time: Option<String>,
}

/// Extended record from the place detail provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceDetails {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub opening_hours: Option<OpeningHours>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub review_count: Option<u32>,
    #[serde(default)]
    pub price_level: Option<u8>,
    #[serde(default)]
    pub reviews: Vec<PlaceReview>,
    #[serde(default)]
    pub photo_refs: Vec<String>,
    #[serde(default)]
    pub coordinate: Option<Coordinate>,
}

/// Photo bytes fetched through the provider
#[derive(Debug, Clone, PartialEq)]
pub struct PlacePhoto {
    pub content_type: String,
    pub bytes: Vec<u8>,
}
