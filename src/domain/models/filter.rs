//! Search constraints collected from the filter form (or a voice command)

use std::collections::BTreeSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Supported cuisine categories and the keywords used to match them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CuisineType {
    Chinese,
    Japanese,
    Italian,
    American,
    Thai,
    Korean,
    Healthy,
    Cafe,
    Breakfast,
    Hotpot,
}

impl CuisineType {
    pub const ALL: [CuisineType; 10] = [
        CuisineType::Chinese,
        CuisineType::Japanese,
        CuisineType::Italian,
        CuisineType::American,
        CuisineType::Thai,
        CuisineType::Korean,
        CuisineType::Healthy,
        CuisineType::Cafe,
        CuisineType::Breakfast,
        CuisineType::Hotpot,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            CuisineType::Chinese => "chinese",
            CuisineType::Japanese => "japanese",
            CuisineType::Italian => "italian",
            CuisineType::American => "american",
            CuisineType::Thai => "thai",
            CuisineType::Korean => "korean",
            CuisineType::Healthy => "healthy",
            CuisineType::Cafe => "cafe",
            CuisineType::Breakfast => "breakfast",
            CuisineType::Hotpot => "hotpot",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            CuisineType::Chinese => "中式料理",
            CuisineType::Japanese => "日式料理",
            CuisineType::Italian => "義式料理",
            CuisineType::American => "美式料理",
            CuisineType::Thai => "泰式料理",
            CuisineType::Korean => "韓式料理",
            CuisineType::Healthy => "健康餐",
            CuisineType::Cafe => "咖啡廳",
            CuisineType::Breakfast => "早午餐",
            CuisineType::Hotpot => "火鍋",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            CuisineType::Chinese => "🥟",
            CuisineType::Japanese => "🍣",
            CuisineType::Italian => "🍝",
            CuisineType::American => "🍔",
            CuisineType::Thai => "🍜",
            CuisineType::Korean | CuisineType::Hotpot => "🍲",
            CuisineType::Healthy => "🥗",
            CuisineType::Cafe => "☕",
            CuisineType::Breakfast => "🥞",
        }
    }

    /// Lowercase keywords matched against category tags and place names
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            CuisineType::Chinese => &["chinese", "taiwanese"],
            CuisineType::Japanese => &["japanese", "sushi", "ramen"],
            CuisineType::Italian => &["italian", "pizza", "pasta"],
            CuisineType::American => &["american", "burger", "steak"],
            CuisineType::Thai => &["thai"],
            CuisineType::Korean => &["korean", "bbq"],
            CuisineType::Healthy => &[
                "salad", "healthy", "organic", "vegan", "vegetarian", "輕食", "沙拉", "健康", "有機",
                "素食",
            ],
            CuisineType::Cafe => &["cafe", "coffee", "dessert"],
            CuisineType::Breakfast => &["breakfast", "brunch"],
            CuisineType::Hotpot => &["hot pot", "hotpot"],
        }
    }
}

impl std::fmt::Display for CuisineType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl FromStr for CuisineType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CuisineType::ALL
            .into_iter()
            .find(|c| c.id() == s.to_lowercase())
            .ok_or_else(|| format!("Unknown cuisine type: {}", s))
    }
}

/// Price level bounds (1 = cheapest, 4 = most expensive)
pub const MIN_PRICE_LEVEL: u8 = 1;
pub const MAX_PRICE_LEVEL: u8 = 4;

/// Price level assumed when the provider does not report one
pub const DEFAULT_PRICE_LEVEL: u8 = 2;

/// Display symbol for a price level
pub fn price_symbol(level: u8) -> &'static str {
    match level {
        1 => "$",
        2 => "$$",
        3 => "$$$",
        4 => "$$$$",
        _ => "$$",
    }
}

/// Search radius band. Unknown values read from storage or a generated
/// reply fall back to the 3 km band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DistanceBand {
    OneKm,
    #[default]
    ThreeKm,
    FiveKm,
    TenKm,
}

impl DistanceBand {
    pub fn as_str(&self) -> &'static str {
        match self {
            DistanceBand::OneKm => "1km",
            DistanceBand::ThreeKm => "3km",
            DistanceBand::FiveKm => "5km",
            DistanceBand::TenKm => "10km",
        }
    }

    pub fn kilometers(&self) -> f64 {
        match self {
            DistanceBand::OneKm => 1.0,
            DistanceBand::ThreeKm => 3.0,
            DistanceBand::FiveKm => 5.0,
            DistanceBand::TenKm => 10.0,
        }
    }

    /// Search radius in meters
    pub fn radius_meters(&self) -> u32 {
        match self {
            DistanceBand::OneKm => 1000,
            DistanceBand::ThreeKm => 3000,
            DistanceBand::FiveKm => 5000,
            DistanceBand::TenKm => 10000,
        }
    }
}

impl From<String> for DistanceBand {
    fn from(value: String) -> Self {
        match value.trim().to_lowercase().as_str() {
            "1km" => DistanceBand::OneKm,
            "5km" => DistanceBand::FiveKm,
            "10km" => DistanceBand::TenKm,
            _ => DistanceBand::ThreeKm,
        }
    }
}

impl From<DistanceBand> for String {
    fn from(band: DistanceBand) -> Self {
        band.as_str().to_string()
    }
}

/// Opening time constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeSlot {
    #[default]
    All,
    Open,
    Lunch,
    Dinner,
}

impl TimeSlot {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeSlot::All => "all",
            TimeSlot::Open => "open",
            TimeSlot::Lunch => "lunch",
            TimeSlot::Dinner => "dinner",
        }
    }
}

/// Result ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortPolicy {
    Rating,
    Distance,
    Reviews,
    #[default]
    Relevance,
}

impl FromStr for SortPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "rating" => Ok(SortPolicy::Rating),
            "distance" => Ok(SortPolicy::Distance),
            "reviews" => Ok(SortPolicy::Reviews),
            "relevance" => Ok(SortPolicy::Relevance),
            _ => Err(format!("Unknown sort policy: {}", s)),
        }
    }
}

/// The user's current search constraints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterSpec {
    pub cuisine_types: BTreeSet<CuisineType>,
    pub price_levels: BTreeSet<u8>,
    #[serde(rename = "distance", alias = "distanceBand")]
    pub distance_band: DistanceBand,
    pub min_rating: f64,
    pub min_reviews: u32,
    pub time_slot: TimeSlot,
}

impl Default for FilterSpec {
    fn default() -> Self {
        Self {
            cuisine_types: BTreeSet::new(),
            price_levels: BTreeSet::new(),
            distance_band: DistanceBand::default(),
            min_rating: 0.0,
            min_reviews: 0,
            time_slot: TimeSlot::default(),
        }
    }
}

impl FilterSpec {
    pub fn with_cuisines(mut self, cuisines: impl IntoIterator<Item = CuisineType>) -> Self {
        self.cuisine_types.extend(cuisines);
        self
    }

    pub fn with_price_levels(mut self, levels: impl IntoIterator<Item = u8>) -> Self {
        self.price_levels.extend(levels);
        self
    }

    pub fn with_distance(mut self, band: DistanceBand) -> Self {
        self.distance_band = band;
        self
    }

    pub fn with_min_rating(mut self, rating: f64) -> Self {
        self.min_rating = rating;
        self
    }

    pub fn with_min_reviews(mut self, reviews: u32) -> Self {
        self.min_reviews = reviews;
        self
    }

    pub fn with_time_slot(mut self, slot: TimeSlot) -> Self {
        self.time_slot = slot;
        self
    }

    /// Drop out-of-range price levels and clamp the rating into [0, 5]
    pub fn normalized(mut self) -> Self {
        self.price_levels
            .retain(|level| (MIN_PRICE_LEVEL..=MAX_PRICE_LEVEL).contains(level));
        self.min_rating = if self.min_rating.is_finite() {
            self.min_rating.clamp(0.0, 5.0)
        } else {
            0.0
        };
        self
    }
}
