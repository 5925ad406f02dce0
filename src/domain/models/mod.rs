// Domain models (plain data)
// Pure Rust, no framework dependencies

pub mod assistant;
pub mod coordinate;
pub mod filter;
pub mod place;
pub mod records;
pub mod theme;

pub use assistant::*;
pub use coordinate::Coordinate;
pub use filter::{
    CuisineType, DEFAULT_PRICE_LEVEL, DistanceBand, FilterSpec, MAX_PRICE_LEVEL, MIN_PRICE_LEVEL,
    SortPolicy, TimeSlot, price_symbol,
};
pub use place::{
    DETAIL_FIELDS, OpeningHours, Place, PlaceDetails, PlacePhoto, PlaceReview, RawPlace,
};
pub use records::{FavoriteRecord, HistoryRecord};
pub use theme::Theme;
