//! Local keyword parser for spoken search commands

use crate::domain::models::{CuisineType, DistanceBand, FilterSpec, TimeSlot};

const CUISINE_KEYWORDS: &[(&str, CuisineType)] = &[
    ("日本", CuisineType::Japanese),
    ("日式", CuisineType::Japanese),
    ("壽司", CuisineType::Japanese),
    ("拉麵", CuisineType::Japanese),
    ("中式", CuisineType::Chinese),
    ("中餐", CuisineType::Chinese),
    ("中國", CuisineType::Chinese),
    ("義大利", CuisineType::Italian),
    ("義式", CuisineType::Italian),
    ("披薩", CuisineType::Italian),
    ("義大利麵", CuisineType::Italian),
    ("美式", CuisineType::American),
    ("美國", CuisineType::American),
    ("漢堡", CuisineType::American),
    ("韓式", CuisineType::Korean),
    ("韓國", CuisineType::Korean),
    ("烤肉", CuisineType::Korean),
    ("泰式", CuisineType::Thai),
    ("泰國", CuisineType::Thai),
    ("健康", CuisineType::Healthy),
    ("輕食", CuisineType::Healthy),
    ("沙拉", CuisineType::Healthy),
];

const CHEAP: &[&str] = &["便宜", "經濟", "平價"];
const UPSCALE: &[&str] = &["高檔", "高級"];
const NEARBY: &[&str] = &["附近", "很近"];
const FAR: &[&str] = &["遠一點", "不限"];
const HIGHLY_RATED: &[&str] = &["高評分", "好評"];
const OPEN_NOW: &[&str] = &["營業中", "現在開"];

/// Minimum rating implied by "highly rated" phrases
pub const HIGHLY_RATED_MIN: f64 = 4.5;

fn mentions(text: &str, phrases: &[&str]) -> bool {
    phrases.iter().any(|p| text.contains(p))
}

/// Turn a transcript into filters using fixed keyword tables.
///
/// Always succeeds; anything not mentioned keeps its default.
pub fn parse_local(text: &str) -> FilterSpec {
    let mut filters = FilterSpec::default().with_cuisines(
        CUISINE_KEYWORDS
            .iter()
            .filter(|(keyword, _)| text.contains(keyword))
            .map(|&(_, cuisine)| cuisine),
    );

    if mentions(text, CHEAP) {
        filters = filters.with_price_levels([1, 2]);
    } else if mentions(text, UPSCALE) {
        filters = filters.with_price_levels([3, 4]);
    }

    if mentions(text, NEARBY) {
        filters = filters.with_distance(DistanceBand::OneKm);
    } else if mentions(text, FAR) {
        filters = filters.with_distance(DistanceBand::TenKm);
    }

    if mentions(text, HIGHLY_RATED) {
        filters = filters.with_min_rating(HIGHLY_RATED_MIN);
    }

    if mentions(text, OPEN_NOW) {
        filters = filters.with_time_slot(TimeSlot::Open);
    }

    filters
}
