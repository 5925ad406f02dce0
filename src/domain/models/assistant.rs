use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::filter::{CuisineType, DEFAULT_PRICE_LEVEL};
use super::place::Place;
use super::records::{FavoriteRecord, HistoryRecord};

/// Supported image formats
pub const SUPPORTED_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp", "image/gif"];

/// Maximum image size in bytes (10MB)
pub const MAX_IMAGE_SIZE: usize = 10 * 1024 * 1024;

/// Image handed to the assistant for recognition
#[derive(Debug, Clone, PartialEq)]
pub struct ImageInput {
    pub bytes: Vec<u8>,
    pub media_type: String,
}

impl ImageInput {
    pub fn new(bytes: Vec<u8>, media_type: impl Into<String>) -> Self {
        Self {
            bytes,
            media_type: media_type.into(),
        }
    }

    /// Check media type and size before anything is sent out
    pub fn validate(&self) -> Result<(), String> {
        if !SUPPORTED_IMAGE_TYPES.contains(&self.media_type.as_str()) {
            return Err(format!("unsupported media type {}", self.media_type));
        }
        if self.bytes.is_empty() {
            return Err("empty image".to_string());
        }
        if self.bytes.len() > MAX_IMAGE_SIZE {
            return Err(format!("image is {} bytes, limit is {}", self.bytes.len(), MAX_IMAGE_SIZE));
        }
        Ok(())
    }
}

/// Activity signals the recommender personalizes on
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserSignals {
    pub favorites: Vec<FavoriteRecord>,
    pub history: Vec<HistoryRecord>,
}

/// Condensed view of [`UserSignals`] used in prompts
#[derive(Debug, Clone, PartialEq)]
pub struct PreferenceSummary {
    pub cuisines: Vec<CuisineType>,
    pub average_price_level: f64,
    pub favorite_count: usize,
}

impl UserSignals {
    pub fn is_empty(&self) -> bool {
        self.favorites.is_empty() && self.history.is_empty()
    }

    pub fn summarize(&self) -> PreferenceSummary {
        let cuisines: BTreeSet<CuisineType> = self
            .history
            .iter()
            .flat_map(|h| h.filters.cuisine_types.iter().copied())
            .collect();

        let average_price_level = if self.favorites.is_empty() {
            f64::from(DEFAULT_PRICE_LEVEL)
        } else {
            let total: u32 = self.favorites.iter().map(|f| u32::from(f.price_level)).sum();
            f64::from(total) / self.favorites.len() as f64
        };

        PreferenceSummary {
            cuisines: cuisines.into_iter().collect(),
            average_price_level,
            favorite_count: self.favorites.len(),
        }
    }
}

impl PreferenceSummary {
    pub fn describe(&self) -> String {
        let cuisines = if self.cuisines.is_empty() {
            "unknown".to_string()
        } else {
            self.cuisines
                .iter()
                .map(|c| c.id())
                .collect::<Vec<_>>()
                .join(", ")
        };
        format!(
            "Preferred cuisines: {}. Average price level: {}. Saved favorites: {}.",
            cuisines,
            self.average_price_level.round(),
            self.favorite_count
        )
    }
}

/// A recommended place with the assistant's rationale, if any
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub place: Place,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Who said a chat line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub message: String,
}

/// Structured result of food image recognition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageTags {
    pub cuisine_type: String,
    pub dish_name: String,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub style: String,
}

/// One stop of the user's day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItineraryItem {
    pub time: String,
    pub location: String,
    pub activity: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MealSuggestion {
    pub time: String,
    pub meal: String,
    pub restaurant: String,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealPlan {
    pub meal_plan: Vec<MealSuggestion>,
}

/// One meal the user already had today
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealLogEntry {
    pub time: String,
    pub restaurant: String,
    pub cuisine_type: String,
}

/// Nutrition assessment of a restaurant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub health_score: u8,
    #[serde(default)]
    pub pros: Vec<String>,
    #[serde(default)]
    pub cons: Vec<String>,
    #[serde(default)]
    pub suggestion: String,
}

impl HealthReport {
    /// Used when the assistant is absent or fails
    pub fn fallback() -> Self {
        Self {
            health_score: 5,
            pros: Vec::new(),
            cons: Vec::new(),
            suggestion: "資料不足".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BusyLevel {
    Low,
    Medium,
    High,
}

/// Predicted crowding at a given time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusyForecast {
    pub busy_level: BusyLevel,
    /// Estimated wait in minutes
    pub wait_time: u32,
    #[serde(default)]
    pub recommendation: String,
    #[serde(default)]
    pub better_times: Vec<String>,
}

impl BusyForecast {
    pub fn fallback() -> Self {
        Self {
            busy_level: BusyLevel::Medium,
            wait_time: 15,
            recommendation: "正常時段".to_string(),
            better_times: Vec::new(),
        }
    }
}
