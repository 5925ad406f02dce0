// Business logic services
// Framework-agnostic, every collaborator injected

pub mod assistant;
pub mod finder;
pub mod format;
pub mod location;
pub mod preferences;
pub mod ranking;
pub mod reply;
pub mod search;
pub mod voice;

pub use assistant::{CHAT_APOLOGY, RecommendationAssistant};
pub use finder::RestaurantFinder;
pub use location::{EARTH_RADIUS_KM, LocationProvider, distance_km, is_within_radius};
pub use preferences::{BoundedHistory, DEFAULT_HISTORY_LIMIT, PreferenceStore};
pub use ranking::{apply_filters, relevance_score, sort_places, truncate_results};
pub use reply::extract_json;
pub use search::{FixedOrigin, OriginSource, SearchEngine};
