//! Pure filtering, ordering and truncation of search results

use std::cmp::Ordering;

use crate::config::RankingWeights;
use crate::domain::models::{CuisineType, DistanceBand, FilterSpec, Place, SortPolicy, TimeSlot};
use crate::shared::logging::log_time_slot_passthrough;

/// Search radius for a distance band
pub fn radius_meters(band: DistanceBand) -> u32 {
    band.radius_meters()
}

/// Any keyword of `cuisine` appears in a category tag or in the name (case-insensitive)
pub fn matches_cuisine(place: &Place, cuisine: CuisineType) -> bool {
    let name = place.name.to_lowercase();
    let tags: Vec<String> = place.category_tags.iter().map(|t| t.to_lowercase()).collect();

    cuisine.keywords().iter().any(|keyword| {
        let keyword = keyword.to_lowercase();
        name.contains(&keyword) || tags.iter().any(|tag| tag.contains(&keyword))
    })
}

/// Whether a single place satisfies every active predicate in `filters`
pub fn satisfies(place: &Place, filters: &FilterSpec) -> bool {
    if !filters.cuisine_types.is_empty()
        && !filters
            .cuisine_types
            .iter()
            .any(|&cuisine| matches_cuisine(place, cuisine))
    {
        return false;
    }
    if !filters.price_levels.is_empty() && !filters.price_levels.contains(&place.price_level) {
        return false;
    }
    if filters.min_rating > 0.0 && place.rating < filters.min_rating {
        return false;
    }
    if filters.min_reviews > 0 && place.review_count < filters.min_reviews {
        return false;
    }
    true
}

/// Keep the places satisfying every active predicate, preserving order.
///
/// Lunch and dinner slots pass everything through: nearby results carry no
/// per-slot opening hours.
pub fn apply_filters(places: Vec<Place>, filters: &FilterSpec) -> Vec<Place> {
    if matches!(filters.time_slot, TimeSlot::Lunch | TimeSlot::Dinner) {
        log_time_slot_passthrough(filters.time_slot.as_str());
    }
    places
        .into_iter()
        .filter(|place| satisfies(place, filters))
        .collect()
}

/// `rating * w_rating - distance_km * w_distance`
pub fn relevance_score(place: &Place, weights: &RankingWeights) -> f64 {
    place.rating * weights.rating - place.distance_km * weights.distance
}

fn compare(a: &Place, b: &Place, policy: SortPolicy, weights: &RankingWeights) -> Ordering {
    match policy {
        SortPolicy::Rating => b.rating.total_cmp(&a.rating),
        SortPolicy::Distance => a.distance_km.total_cmp(&b.distance_km),
        SortPolicy::Reviews => b.review_count.cmp(&a.review_count),
        // Unknown open state counts as closed here
        SortPolicy::Relevance => b.is_open().cmp(&a.is_open()).then_with(|| {
            relevance_score(b, weights).total_cmp(&relevance_score(a, weights))
        }),
    }
}

/// Stable sort; ties keep the provider's order
pub fn sort_places(
    mut places: Vec<Place>,
    policy: SortPolicy,
    weights: &RankingWeights,
) -> Vec<Place> {
    places.sort_by(|a, b| compare(a, b, policy, weights));
    places
}

/// Keep `clamp(len, min, max)` results, or all of them when fewer than `min` exist
pub fn truncate_results(mut places: Vec<Place>, min: usize, max: usize) -> Vec<Place> {
    let count = places.len().clamp(min, max.max(min)).min(places.len());
    places.truncate(count);
    places
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::place;

    fn weights() -> RankingWeights {
        RankingWeights::default()
    }

    fn with_open(mut p: Place, open: Option<bool>) -> Place {
        p.open_now = open;
        p
    }

    fn sample() -> Vec<Place> {
        let mut places = vec![
            place("a", 4.1, 2.0),
            place("b", 4.8, 0.5),
            place("c", 4.1, 1.0),
            place("d", 3.2, 0.2),
            place("e", 4.8, 3.0),
        ];
        places[0].review_count = 30;
        places[1].review_count = 300;
        places[2].review_count = 30;
        places[3].review_count = 1200;
        places[4].review_count = 5;
        places
    }

    fn ids(places: &[Place]) -> Vec<&str> {
        places.iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn test_sort_by_rating_is_monotonic_and_stable() {
        let sorted = sort_places(sample(), SortPolicy::Rating, &weights());
        assert!(sorted.windows(2).all(|w| w[0].rating >= w[1].rating));
        // b and e tie at 4.8, a and c tie at 4.1: provider order kept
        assert_eq!(ids(&sorted), vec!["b", "e", "a", "c", "d"]);
    }

    #[test]
    fn test_sort_by_distance_ascending() {
        let sorted = sort_places(sample(), SortPolicy::Distance, &weights());
        assert!(sorted.windows(2).all(|w| w[0].distance_km <= w[1].distance_km));
    }

    #[test]
    fn test_sort_by_reviews_is_stable() {
        let sorted = sort_places(sample(), SortPolicy::Reviews, &weights());
        assert!(sorted.windows(2).all(|w| w[0].review_count >= w[1].review_count));
        assert_eq!(ids(&sorted), vec!["d", "b", "a", "c", "e"]);
    }

    #[test]
    fn test_relevance_puts_open_places_first() {
        let places = vec![
            with_open(place("closed-great", 5.0, 0.1), Some(false)),
            with_open(place("unknown-great", 4.9, 0.1), None),
            with_open(place("open-poor", 2.0, 9.0), Some(true)),
            with_open(place("open-good", 4.0, 1.0), Some(true)),
        ];
        let sorted = sort_places(places, SortPolicy::Relevance, &weights());
        assert_eq!(
            ids(&sorted),
            vec!["open-good", "open-poor", "closed-great", "unknown-great"]
        );
    }

    #[test]
    fn test_relevance_score_weights() {
        let p = place("x", 4.0, 2.0);
        assert!((relevance_score(&p, &weights()) - (4.0 * 1.2 - 2.0 * 0.1)).abs() < 1e-9);
    }

    #[test]
    fn test_filters_are_a_subset_and_each_kept_place_matches() {
        let filters = FilterSpec::default()
            .with_price_levels([2])
            .with_min_rating(4.0)
            .with_min_reviews(10);
        let input = sample();
        let filtered = apply_filters(input.clone(), &filters);

        assert!(filtered.len() <= input.len());
        assert!(filtered.iter().all(|p| satisfies(p, &filters)));
        assert_eq!(ids(&filtered), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_cuisine_matches_tags_or_name() {
        let mut by_tag = place("t", 4.0, 1.0);
        by_tag.category_tags = vec!["Japanese_Restaurant".into()];
        let mut by_name = place("n", 4.0, 1.0);
        by_name.name = "Ichiran RAMEN".into();
        by_name.category_tags = Vec::new();
        let other = place("o", 4.0, 1.0);

        assert!(matches_cuisine(&by_tag, CuisineType::Japanese));
        assert!(matches_cuisine(&by_name, CuisineType::Japanese));
        assert!(!matches_cuisine(&other, CuisineType::Japanese));

        let mut salad = place("s", 4.0, 1.0);
        salad.name = "綠色沙拉吧".into();
        assert!(matches_cuisine(&salad, CuisineType::Healthy));
    }

    #[test]
    fn test_cuisines_are_or_within_category() {
        let mut sushi = place("sushi", 4.0, 1.0);
        sushi.name = "Sushi Express".into();
        let mut pizza = place("pizza", 4.0, 1.0);
        pizza.name = "Pizza Hut".into();
        let plain = place("plain", 4.0, 1.0);

        let filters =
            FilterSpec::default().with_cuisines([CuisineType::Japanese, CuisineType::Italian]);
        let filtered = apply_filters(vec![sushi, pizza, plain], &filters);
        assert_eq!(ids(&filtered), vec!["sushi", "pizza"]);
    }

    #[test]
    fn test_meal_slots_pass_through() {
        let filters = FilterSpec::default().with_time_slot(TimeSlot::Dinner);
        assert_eq!(apply_filters(sample(), &filters).len(), 5);
    }

    #[test]
    fn test_truncation_bounds() {
        for len in 0..9 {
            let places: Vec<Place> = (0..len).map(|i| place(&i.to_string(), 4.0, 1.0)).collect();
            let out = truncate_results(places, 3, 5);
            if len < 3 {
                assert_eq!(out.len(), len);
            } else {
                assert!((3..=5).contains(&out.len()));
            }
        }
    }

    #[test]
    fn test_radius_lookup() {
        assert_eq!(radius_meters(DistanceBand::OneKm), 1000);
        assert_eq!(radius_meters(DistanceBand::default()), 3000);
    }
}
