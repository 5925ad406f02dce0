//! Server-side cache for place details

use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::domain::models::PlaceDetails;

/// Details TTL: 5 minutes - after that, ask the provider again
pub const DETAILS_TTL: Duration = Duration::from_secs(300);

/// Cached details with timestamp for TTL
struct CachedDetails {
    details: PlaceDetails,
    cached_at: Instant,
}

/// Thread-safe details cache keyed by place id
pub struct DetailsCache {
    entries: DashMap<String, CachedDetails>,
    ttl: Duration,
}

impl Default for DetailsCache {
    fn default() -> Self {
        Self::new(DETAILS_TTL)
    }
}

impl DetailsCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Get from cache if not expired
    pub fn get(&self, place_id: &str) -> Option<PlaceDetails> {
        // Only drops the entry if it is still expired under the shard lock
        self.entries
            .remove_if(place_id, |_, entry| entry.cached_at.elapsed() >= self.ttl);
        self.entries
            .get(place_id)
            .map(|entry| entry.details.clone())
    }

    /// Insert fresh details and sweep every expired entry
    pub fn insert(&self, details: PlaceDetails) {
        self.entries
            .retain(|_, entry| entry.cached_at.elapsed() < self.ttl);
        self.entries.insert(
            details.id.clone(),
            CachedDetails {
                details,
                cached_at: Instant::now(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
