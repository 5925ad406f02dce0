use serde::{Deserialize, Serialize};

use super::coordinate::Coordinate;
use super::filter::FilterSpec;
use super::place::Place;

/// A place the user saved. At most one record per place id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteRecord {
    pub id: String,
    pub name: String,
    pub address: String,
    pub rating: f64,
    pub review_count: u32,
    pub price_level: u8,
    pub coordinate: Coordinate,
    /// Milliseconds since the Unix epoch
    pub saved_at: i64,
}

impl FavoriteRecord {
    pub fn from_place(place: &Place, saved_at: i64) -> Self {
        Self {
            id: place.id.clone(),
            name: place.name.clone(),
            address: place.address.clone(),
            rating: place.rating,
            review_count: place.review_count,
            price_level: place.price_level,
            coordinate: place.coordinate,
            saved_at,
        }
    }
}

/// One completed search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    /// `search_<timestamp>`, suffixed when two searches share a millisecond
    pub id: String,
    pub filters: FilterSpec,
    pub result_count: usize,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
}

impl HistoryRecord {
    pub fn new(filters: FilterSpec, result_count: usize, timestamp: i64) -> Self {
        Self {
            id: format!("search_{}", timestamp),
            filters,
            result_count,
            timestamp,
        }
    }
}
